//! Bewerkbare parameters van een enkele parachute en hun validatie.

use crate::catalog::Body;
use crate::engine::validation::{
    ChuteParameter, Field, ValidationError, in_range, parse_number, parse_with_empty,
};

use super::ParachuteCue;

/// Standaard maximale diameter van een volledig ontplooide koepel, in meters.
pub const DEFAULT_MAX_DIAMETER: f64 = 70.0;

/// Parameters zoals ingevoerd: getallen blijven tekst tot ze gecommit worden.
#[derive(Debug, Clone, PartialEq)]
pub struct ChuteParameters {
    pub material: String,
    pub pre_deployed_diameter: String,
    pub deployed_diameter: String,
    pub min_is_pressure: bool,
    pub min_deployment: String,
    pub min_pressure: String,
    pub deployment_alt: String,
    pub cut_alt: String,
    pub pre_deployment_speed: String,
    pub deployment_speed: String,
}

impl Default for ChuteParameters {
    fn default() -> Self {
        Self {
            material: "Nylon".to_owned(),
            pre_deployed_diameter: "1".to_owned(),
            deployed_diameter: "25".to_owned(),
            min_is_pressure: false,
            min_deployment: "25000".to_owned(),
            min_pressure: "0.01".to_owned(),
            deployment_alt: "700".to_owned(),
            cut_alt: String::new(),
            pre_deployment_speed: "2".to_owned(),
            deployment_speed: "6".to_owned(),
        }
    }
}

impl ChuteParameters {
    /// Tekstvelden op basis van de gecommitte waarden van een koepel.
    #[must_use]
    pub fn from_cue(cue: &ParachuteCue) -> Self {
        Self {
            material: cue.material.clone(),
            pre_deployed_diameter: cue.pre_deployed_diameter.to_string(),
            deployed_diameter: cue.deployed_diameter.to_string(),
            min_is_pressure: cue.min_is_pressure,
            min_deployment: cue.min_deployment.to_string(),
            min_pressure: cue.min_pressure.to_string(),
            deployment_alt: cue.deployment_alt.to_string(),
            cut_alt: if cue.cut_alt < 0.0 {
                String::new()
            } else {
                cue.cut_alt.to_string()
            },
            pre_deployment_speed: cue.pre_deployment_speed.to_string(),
            deployment_speed: cue.deployment_speed.to_string(),
        }
    }
}

/// Een parachute binnen een procedurele module.
#[derive(Debug, Clone, PartialEq)]
pub struct ChuteTemplate {
    /// Positie binnen de module; index 0 is de hoofdparachute.
    pub index: usize,
    pub params: ChuteParameters,
    pub max_diameter: f64,
}

impl ChuteTemplate {
    #[must_use]
    pub fn new(index: usize, params: ChuteParameters) -> Self {
        Self {
            index,
            params,
            max_diameter: DEFAULT_MAX_DIAMETER,
        }
    }

    #[must_use]
    pub fn from_cue(index: usize, cue: &ParachuteCue) -> Self {
        Self::new(index, ChuteParameters::from_cue(cue))
    }

    /// Alle fouten van deze parachute, in vaste volgorde.
    #[must_use]
    pub fn errors(&self, body: &Body) -> Vec<ValidationError> {
        let p = &self.params;
        let mut errors = Vec::new();
        let mut check = |ok: bool, parameter: ChuteParameter| {
            if !ok {
                errors.push(ValidationError::new(Field::ChuteSpecific {
                    chute: self.index,
                    parameter,
                }));
            }
        };

        check(
            number_in(&p.pre_deployed_diameter, 0.5, self.max_diameter / 2.0),
            ChuteParameter::PreDeployedDiameter,
        );
        check(
            number_in(&p.deployed_diameter, 1.0, self.max_diameter),
            ChuteParameter::DeployedDiameter,
        );
        if p.min_is_pressure {
            check(
                number_in(&p.min_pressure, 0.0001, body.surface_pressure),
                ChuteParameter::PreDeploymentPressure,
            );
        } else {
            check(
                number_in(&p.min_deployment, 100.0, body.max_altitude),
                ChuteParameter::PreDeploymentAltitude,
            );
        }
        check(
            number_in(&p.deployment_alt, 10.0, body.max_altitude),
            ChuteParameter::DeploymentAltitude,
        );
        check(
            parse_with_empty(&p.cut_alt).is_some_and(|v| in_range(v, -1.0, body.max_altitude)),
            ChuteParameter::CutAltitude,
        );
        check(
            number_in(&p.pre_deployment_speed, 0.5, 5.0),
            ChuteParameter::PreDeploymentSpeed,
        );
        check(
            number_in(&p.deployment_speed, 1.0, 10.0),
            ChuteParameter::DeploymentSpeed,
        );

        errors
    }

    /// Neem de parameters uit een preset over.
    pub fn apply_parameters(&mut self, params: &ChuteParameters) {
        self.params = params.clone();
    }

    /// Schrijf de (gevalideerde) tekstvelden naar de koepel. Een veld dat toch
    /// niet leesbaar is laat de huidige waarde staan.
    pub fn apply_changes(&self, cue: &mut ParachuteCue) {
        let p = &self.params;
        cue.material.clone_from(&p.material);
        cue.min_is_pressure = p.min_is_pressure;
        commit(&p.pre_deployed_diameter, &mut cue.pre_deployed_diameter);
        commit(&p.deployed_diameter, &mut cue.deployed_diameter);
        commit(&p.min_deployment, &mut cue.min_deployment);
        commit(&p.min_pressure, &mut cue.min_pressure);
        commit(&p.deployment_alt, &mut cue.deployment_alt);
        if let Some(value) = parse_with_empty(&p.cut_alt) {
            cue.cut_alt = value;
        }
        commit(&p.pre_deployment_speed, &mut cue.pre_deployment_speed);
        commit(&p.deployment_speed, &mut cue.deployment_speed);
    }
}

fn number_in(text: &str, min: f64, max: f64) -> bool {
    parse_number(text).is_some_and(|v| in_range(v, min, max))
}

fn commit(text: &str, target: &mut f64) {
    if let Some(value) = parse_number(text) {
        *target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::{ChuteParameters, ChuteTemplate};
    use crate::catalog::Body;
    use crate::chute::ParachuteCue;
    use crate::engine::validation::{ChuteParameter, Field};

    fn parameters_of(template: &ChuteTemplate, body: &Body) -> Vec<ChuteParameter> {
        template
            .errors(body)
            .into_iter()
            .filter_map(|error| match error.field {
                Field::ChuteSpecific { parameter, .. } => Some(parameter),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn defaults_are_valid_on_kerbin() {
        let template = ChuteTemplate::new(0, ChuteParameters::default());
        assert!(template.errors(&Body::kerbin()).is_empty());
    }

    #[test]
    fn reports_every_parameter_in_order() {
        let params = ChuteParameters {
            pre_deployed_diameter: "40".to_owned(),
            deployed_diameter: "0".to_owned(),
            min_deployment: "50".to_owned(),
            deployment_alt: "x".to_owned(),
            cut_alt: "-5".to_owned(),
            pre_deployment_speed: "9".to_owned(),
            deployment_speed: "0.1".to_owned(),
            ..ChuteParameters::default()
        };
        let template = ChuteTemplate::new(1, params);

        assert_eq!(
            parameters_of(&template, &Body::kerbin()),
            vec![
                ChuteParameter::PreDeployedDiameter,
                ChuteParameter::DeployedDiameter,
                ChuteParameter::PreDeploymentAltitude,
                ChuteParameter::DeploymentAltitude,
                ChuteParameter::CutAltitude,
                ChuteParameter::PreDeploymentSpeed,
                ChuteParameter::DeploymentSpeed,
            ]
        );
    }

    #[test]
    fn pressure_mode_checks_surface_pressure() {
        let params = ChuteParameters {
            min_is_pressure: true,
            min_pressure: "200".to_owned(),
            min_deployment: "nonsense".to_owned(),
            ..ChuteParameters::default()
        };
        let template = ChuteTemplate::new(0, params);

        assert_eq!(
            parameters_of(&template, &Body::kerbin()),
            vec![ChuteParameter::PreDeploymentPressure]
        );
        let eve = Body::new("Eve", 90_000.0, 506.625);
        assert!(template.errors(&eve).is_empty());
    }

    #[test]
    fn apply_changes_writes_parsed_values() {
        let mut cue = ParachuteCue::new("canopy");
        let params = ChuteParameters {
            material: "Kevlar".to_owned(),
            deployed_diameter: "12.5".to_owned(),
            cut_alt: String::new(),
            ..ChuteParameters::default()
        };
        ChuteTemplate::new(0, params).apply_changes(&mut cue);

        assert_eq!(cue.material, "Kevlar");
        assert!((cue.deployed_diameter - 12.5).abs() < 1e-12);
        assert!((cue.cut_alt + 1.0).abs() < 1e-12);
        assert_eq!(
            ChuteParameters::from_cue(&cue).deployed_diameter,
            "12.5"
        );
    }
}
