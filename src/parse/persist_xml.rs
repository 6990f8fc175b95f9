//! Bewaarde status van een procedurele parachute als `<PROCEDURAL_CHUTE>`
//! element. Schrijven, lezen en opnieuw schrijven levert identieke tekst op.

use quick_xml::de::from_str;
use quick_xml::se::to_string_with_root;
use serde::{Deserialize, Serialize};

use crate::chute::{ChuteParameters, ChuteTemplate, ProceduralChute};
use crate::geom::Vec3;

use super::{ParseResult, strip_xml_preamble};

/// Naam van het root-element.
pub const ROOT: &str = "PROCEDURAL_CHUTE";

/// Alle velden die tussen sessies bewaard blijven.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    #[serde(rename = "@size")]
    pub size: usize,
    #[serde(rename = "@lastSize")]
    pub last_size: usize,
    #[serde(rename = "@caseID")]
    pub case_id: usize,
    #[serde(rename = "@lastCaseID")]
    pub last_case_id: usize,
    #[serde(rename = "@planets")]
    pub planet: usize,
    #[serde(rename = "@presetID")]
    pub preset_id: usize,
    #[serde(rename = "@originalSize", skip_serializing_if = "Option::is_none")]
    pub original_size: Option<String>,
    #[serde(rename = "@top")]
    pub top: f64,
    #[serde(rename = "@bottom")]
    pub bottom: f64,
    #[serde(rename = "@debut")]
    pub debut: f64,
    #[serde(rename = "@initiated")]
    pub initiated: bool,
    #[serde(rename = "@mustGoDown")]
    pub must_go_down: bool,
    #[serde(rename = "@deployOnGround")]
    pub deploy_on_ground: bool,
    #[serde(rename = "@secondaryChute")]
    pub secondary_chute: bool,
    #[serde(rename = "@timer")]
    pub timer: String,
    #[serde(rename = "@cutSpeed")]
    pub cut_speed: String,
    #[serde(rename = "@spares")]
    pub spares: String,
    #[serde(rename = "@landingAlt")]
    pub landing_alt: String,
    #[serde(rename = "CHUTE", skip_serializing_if = "Vec::is_empty")]
    pub chutes: Vec<PersistedChute>,
}

/// Parameters van één parachute. Ontbrekende attributen krijgen de
/// standaardwaarden van [`ChuteParameters`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedChute {
    #[serde(rename = "@material")]
    pub material: String,
    #[serde(rename = "@preDeployedDiameter")]
    pub pre_deployed_diameter: String,
    #[serde(rename = "@deployedDiameter")]
    pub deployed_diameter: String,
    #[serde(rename = "@minIsPressure")]
    pub min_is_pressure: bool,
    #[serde(rename = "@minDeployment")]
    pub min_deployment: String,
    #[serde(rename = "@minPressure")]
    pub min_pressure: String,
    #[serde(rename = "@deploymentAlt")]
    pub deployment_alt: String,
    #[serde(rename = "@cutAlt")]
    pub cut_alt: String,
    #[serde(rename = "@preDeploymentSpeed")]
    pub pre_deployment_speed: String,
    #[serde(rename = "@deploymentSpeed")]
    pub deployment_speed: String,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::from(&ProceduralChute::default())
    }
}

impl Default for PersistedChute {
    fn default() -> Self {
        Self::from(&ChuteParameters::default())
    }
}

impl From<&ChuteParameters> for PersistedChute {
    fn from(params: &ChuteParameters) -> Self {
        Self {
            material: params.material.clone(),
            pre_deployed_diameter: params.pre_deployed_diameter.clone(),
            deployed_diameter: params.deployed_diameter.clone(),
            min_is_pressure: params.min_is_pressure,
            min_deployment: params.min_deployment.clone(),
            min_pressure: params.min_pressure.clone(),
            deployment_alt: params.deployment_alt.clone(),
            cut_alt: params.cut_alt.clone(),
            pre_deployment_speed: params.pre_deployment_speed.clone(),
            deployment_speed: params.deployment_speed.clone(),
        }
    }
}

impl From<PersistedChute> for ChuteParameters {
    fn from(chute: PersistedChute) -> Self {
        Self {
            material: chute.material,
            pre_deployed_diameter: chute.pre_deployed_diameter,
            deployed_diameter: chute.deployed_diameter,
            min_is_pressure: chute.min_is_pressure,
            min_deployment: chute.min_deployment,
            min_pressure: chute.min_pressure,
            deployment_alt: chute.deployment_alt,
            cut_alt: chute.cut_alt,
            pre_deployment_speed: chute.pre_deployment_speed,
            deployment_speed: chute.deployment_speed,
        }
    }
}

impl From<&ProceduralChute> for PersistedState {
    fn from(chute: &ProceduralChute) -> Self {
        Self {
            size: chute.size,
            last_size: chute.last_size,
            case_id: chute.case_id,
            last_case_id: chute.last_case_id,
            planet: chute.planet,
            preset_id: chute.preset_id,
            original_size: chute.original_size.map(|v| v.to_string()),
            top: chute.top,
            bottom: chute.bottom,
            debut: chute.debut,
            initiated: chute.initiated,
            must_go_down: chute.must_go_down,
            deploy_on_ground: chute.deploy_on_ground,
            secondary_chute: chute.secondary_chute,
            timer: chute.timer.clone(),
            cut_speed: chute.cut_speed.clone(),
            spares: chute.spares.clone(),
            landing_alt: chute.landing_alt.clone(),
            chutes: chute
                .chutes
                .iter()
                .map(|t| PersistedChute::from(&t.params))
                .collect(),
        }
    }
}

impl PersistedState {
    /// Zet de bewaarde velden terug op een procedurele parachute.
    pub fn restore(self, chute: &mut ProceduralChute) -> ParseResult<()> {
        chute.original_size = self
            .original_size
            .as_deref()
            .map(str::parse::<Vec3>)
            .transpose()?;
        chute.size = self.size;
        chute.last_size = self.last_size;
        chute.case_id = self.case_id;
        chute.last_case_id = self.last_case_id;
        chute.planet = self.planet;
        chute.preset_id = self.preset_id;
        chute.top = self.top;
        chute.bottom = self.bottom;
        chute.debut = self.debut;
        chute.initiated = self.initiated;
        chute.must_go_down = self.must_go_down;
        chute.deploy_on_ground = self.deploy_on_ground;
        chute.secondary_chute = self.secondary_chute;
        chute.timer = self.timer;
        chute.cut_speed = self.cut_speed;
        chute.spares = self.spares;
        chute.landing_alt = self.landing_alt;
        if !self.chutes.is_empty() {
            chute.chutes = self
                .chutes
                .into_iter()
                .enumerate()
                .map(|(index, params)| ChuteTemplate::new(index, params.into()))
                .collect();
        }
        Ok(())
    }
}

/// Schrijf de status van een procedurele parachute.
pub fn to_xml(chute: &ProceduralChute) -> ParseResult<String> {
    Ok(to_string_with_root(ROOT, &PersistedState::from(chute))?)
}

/// Lees een eerder geschreven status.
pub fn from_xml(input: &str) -> ParseResult<PersistedState> {
    Ok(from_str(strip_xml_preamble(input))?)
}

#[cfg(test)]
mod tests {
    use super::{PersistedState, from_xml, to_xml};
    use crate::chute::{ChuteParameters, ChuteTemplate, ProceduralChute};
    use crate::geom::Vec3;

    fn sample() -> ProceduralChute {
        let mut chute = ProceduralChute::new().with_texture_library("RealChute");
        chute.size = 2;
        chute.last_size = 1;
        chute.case_id = 1;
        chute.planet = 3;
        chute.original_size = Some(Vec3::new(1.0, 1.25, 1.0));
        chute.top = 0.35;
        chute.bottom = -0.125;
        chute.debut = 1.25;
        chute.initiated = true;
        chute.must_go_down = true;
        chute.timer = "2s".to_owned();
        chute.cut_speed = "0.5".to_owned();
        chute.spares = String::new();
        chute.chutes = vec![ChuteTemplate::new(
            0,
            ChuteParameters {
                material: "Kevlar".to_owned(),
                ..ChuteParameters::default()
            },
        )];
        chute
    }

    #[test]
    fn save_load_save_is_identical() {
        let first = to_xml(&sample()).expect("serialized");
        assert!(first.starts_with("<PROCEDURAL_CHUTE"));

        let state = from_xml(&first).expect("parsed");
        let mut restored = ProceduralChute::new();
        state.restore(&mut restored).expect("restored");
        let second = to_xml(&restored).expect("serialized again");

        assert_eq!(first, second);
        assert_eq!(restored.original_size, Some(Vec3::new(1.0, 1.25, 1.0)));
        assert_eq!(restored.chutes[0].params.material, "Kevlar");
        assert_eq!(restored.spares, "");
    }

    #[test]
    fn missing_original_size_stays_missing() {
        let xml = to_xml(&ProceduralChute::new()).unwrap();
        assert!(!xml.contains("originalSize"));
        let state = from_xml(&xml).unwrap();
        assert_eq!(state.original_size, None);
        assert_eq!(state.landing_alt, "0");
    }

    #[test]
    fn missing_attributes_take_defaults() {
        let xml = r#"<PROCEDURAL_CHUTE size="1"><CHUTE deployedDiameter="12"/></PROCEDURAL_CHUTE>"#;
        let state = from_xml(xml).expect("parsed");
        assert_eq!(state.size, 1);
        assert!(!state.initiated);
        assert_eq!(state.landing_alt, "0");
        assert_eq!(state.chutes[0].deployed_diameter, "12");
        assert_eq!(state.chutes[0].material, "Nylon");

        let expected = PersistedState {
            size: 1,
            chutes: state.chutes.clone(),
            ..PersistedState::default()
        };
        assert_eq!(state, expected);
    }

    #[test]
    fn rejects_unreadable_original_size() {
        let state = from_xml(r#"<PROCEDURAL_CHUTE originalSize="1, x, 1"/>"#).unwrap();
        assert!(state.restore(&mut ProceduralChute::new()).is_err());
    }
}
