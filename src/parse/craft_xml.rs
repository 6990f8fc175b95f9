//! Parser voor `<craft>` documenten: onderdelen, hun polen, de aansturende
//! module, de procedurele status en de onderlinge bevestigingen.

use std::collections::HashMap;

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::assembly::{Assembly, AttachPoint, Part, PartId};
use crate::chute::{ChuteModule, ChuteTemplate, ParachuteCue, ProceduralChute};
use crate::geom::Vec3;

use super::persist_xml::{PersistedChute, PersistedState};
use super::{ParseError, ParseResult, expect_root};

/// Een ingelezen voertuig: de assemblage plus de labels uit het document.
#[derive(Debug, Clone, Default)]
pub struct Craft {
    pub name: String,
    pub assembly: Assembly,
    labels: Vec<(String, PartId)>,
}

impl Craft {
    /// Handle van het onderdeel met het gegeven `id`-attribuut.
    #[must_use]
    pub fn id(&self, label: &str) -> Option<PartId> {
        self.labels
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, id)| *id)
    }

    #[must_use]
    pub fn label(&self, id: PartId) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, part)| *part == id)
            .map(|(name, _)| name.as_str())
    }

    /// Labels in documentvolgorde.
    pub fn labels(&self) -> impl Iterator<Item = (&str, PartId)> {
        self.labels.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// Leest een voertuigdocument.
pub fn parse_str(input: &str) -> ParseResult<Craft> {
    let body = expect_root(input, "craft")?;
    let document: CraftDocument = from_str(body)?;
    log::debug!(
        "voertuig `{}`: {} onderdelen, {} bevestigingen",
        document.name,
        document.parts.len(),
        document.attachments.len()
    );

    let mut assembly = Assembly::new();
    let mut by_label: HashMap<String, PartId> = HashMap::new();
    let mut labels = Vec::with_capacity(document.parts.len());

    for xml in document.parts {
        let label = xml.id.clone();
        let part = xml.into_part()?;
        let id = assembly.add_part(part);
        if by_label.insert(label.clone(), id).is_some() {
            return Err(ParseError::Craft(format!("dubbel onderdeel-id `{label}`")));
        }
        labels.push((label, id));
    }

    let lookup = |label: &str| {
        by_label
            .get(label)
            .copied()
            .ok_or_else(|| ParseError::Craft(format!("onbekend onderdeel `{label}`")))
    };

    for attach in &document.attachments {
        let child = lookup(&attach.child)?;
        let parent = lookup(&attach.parent)?;
        match (attach.mode.as_str(), &attach.child_point, &attach.parent_point) {
            ("surface", _, _) => assembly.attach_surface(child, parent)?,
            ("stack" | "", Some(child_point), Some(parent_point)) => assembly.attach_stack(
                child,
                parse_point(child_point)?,
                parent,
                parse_point(parent_point)?,
            )?,
            (mode, _, _) => {
                return Err(ParseError::Craft(format!(
                    "bevestiging `{}` -> `{}` met modus `{mode}` mist polen",
                    attach.child, attach.parent
                )));
            }
        }
    }

    for group in &document.symmetry {
        let ids = group
            .parts
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(lookup)
            .collect::<ParseResult<Vec<_>>>()?;
        assembly.set_symmetry(&ids)?;
    }

    Ok(Craft {
        name: document.name,
        assembly,
        labels,
    })
}

fn parse_point(text: &str) -> ParseResult<AttachPoint> {
    match text.trim().to_ascii_lowercase().as_str() {
        "top" => Ok(AttachPoint::Top),
        "bottom" => Ok(AttachPoint::Bottom),
        other => Err(ParseError::Craft(format!("onbekende pool `{other}`"))),
    }
}

fn parse_vec(text: Option<&str>, fallback: Vec3) -> ParseResult<Vec3> {
    text.map_or(Ok(fallback), |t| Ok(t.parse::<Vec3>()?))
}

#[derive(Debug, Deserialize)]
struct CraftDocument {
    #[serde(default, rename = "@name")]
    name: String,
    #[serde(default, rename = "part")]
    parts: Vec<XmlPart>,
    #[serde(default, rename = "attach")]
    attachments: Vec<XmlAttach>,
    #[serde(default, rename = "symmetry")]
    symmetry: Vec<XmlSymmetry>,
}

#[derive(Debug, Deserialize)]
struct XmlPart {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@position")]
    position: Option<String>,
    #[serde(default, rename = "@scale")]
    scale: Option<String>,
    #[serde(default, rename = "@surfaceNode")]
    surface_node: Option<String>,
    #[serde(default, rename = "node")]
    nodes: Vec<XmlNode>,
    #[serde(default)]
    module: Option<XmlModule>,
    #[serde(default)]
    procedural: Option<XmlProcedural>,
}

impl XmlPart {
    fn into_part(self) -> ParseResult<Part> {
        let mut part = Part::new(self.name)
            .with_position(parse_vec(self.position.as_deref(), Vec3::ZERO)?)
            .with_model_scale(parse_vec(self.scale.as_deref(), Vec3::ONE)?)
            .with_surface_node(parse_vec(self.surface_node.as_deref(), Vec3::ZERO)?);

        for node in self.nodes {
            let point = parse_point(&node.point)?;
            part = part.with_node(point, node.offset.parse::<Vec3>()?, node.radius);
            if let (Some(original), Some(attach)) =
                (node.original.as_deref(), part.attachments.get_mut(point))
            {
                attach.original_offset = original.parse::<Vec3>()?;
            }
        }

        if let Some(module) = self.module {
            part = part.with_module(module.into_module()?);
        }
        if let Some(procedural) = self.procedural {
            part = part.with_procedural(procedural.into_chute()?);
        }
        Ok(part)
    }
}

#[derive(Debug, Deserialize)]
struct XmlNode {
    #[serde(rename = "@point")]
    point: String,
    #[serde(rename = "@offset")]
    offset: String,
    #[serde(default, rename = "@original")]
    original: Option<String>,
    #[serde(default = "unit_radius", rename = "@radius")]
    radius: f64,
}

fn unit_radius() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct XmlModule {
    #[serde(default, rename = "@caseMass")]
    case_mass: f64,
    #[serde(default, rename = "@timer")]
    timer: f64,
    #[serde(default, rename = "@cutSpeed")]
    cut_speed: Option<f64>,
    #[serde(default, rename = "@spareChutes")]
    spare_chutes: Option<i32>,
    #[serde(default, rename = "@mustGoDown")]
    must_go_down: bool,
    #[serde(default, rename = "@deployOnGround")]
    deploy_on_ground: bool,
    #[serde(default, rename = "@secondaryChute")]
    secondary_chute: bool,
    #[serde(default, rename = "parachute")]
    parachutes: Vec<XmlParachute>,
}

impl XmlModule {
    fn into_module(self) -> ParseResult<ChuteModule> {
        let defaults = ChuteModule::default();
        Ok(ChuteModule {
            case_mass: self.case_mass,
            timer: self.timer,
            cut_speed: self.cut_speed.unwrap_or(defaults.cut_speed),
            spare_chutes: self.spare_chutes.unwrap_or(defaults.spare_chutes),
            must_go_down: self.must_go_down,
            deploy_on_ground: self.deploy_on_ground,
            secondary_chute: self.secondary_chute,
            parachutes: self
                .parachutes
                .into_iter()
                .map(XmlParachute::into_cue)
                .collect::<ParseResult<Vec<_>>>()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct XmlParachute {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@offset")]
    offset: Option<String>,
    #[serde(default, rename = "@material")]
    material: Option<String>,
    #[serde(default, rename = "@preDeployedDiameter")]
    pre_deployed_diameter: Option<f64>,
    #[serde(default, rename = "@deployedDiameter")]
    deployed_diameter: Option<f64>,
    #[serde(default, rename = "@minIsPressure")]
    min_is_pressure: Option<bool>,
    #[serde(default, rename = "@minDeployment")]
    min_deployment: Option<f64>,
    #[serde(default, rename = "@minPressure")]
    min_pressure: Option<f64>,
    #[serde(default, rename = "@deploymentAlt")]
    deployment_alt: Option<f64>,
    #[serde(default, rename = "@cutAlt")]
    cut_alt: Option<f64>,
    #[serde(default, rename = "@preDeploymentSpeed")]
    pre_deployment_speed: Option<f64>,
    #[serde(default, rename = "@deploymentSpeed")]
    deployment_speed: Option<f64>,
}

impl XmlParachute {
    fn into_cue(self) -> ParseResult<ParachuteCue> {
        let mut cue = ParachuteCue::new(self.name)
            .with_offset(parse_vec(self.offset.as_deref(), Vec3::ZERO)?);
        if let Some(material) = self.material {
            cue.material = material;
        }
        if let Some(value) = self.min_is_pressure {
            cue.min_is_pressure = value;
        }
        let numbers = [
            (self.pre_deployed_diameter, &mut cue.pre_deployed_diameter),
            (self.deployed_diameter, &mut cue.deployed_diameter),
            (self.min_deployment, &mut cue.min_deployment),
            (self.min_pressure, &mut cue.min_pressure),
            (self.deployment_alt, &mut cue.deployment_alt),
            (self.cut_alt, &mut cue.cut_alt),
            (self.pre_deployment_speed, &mut cue.pre_deployment_speed),
            (self.deployment_speed, &mut cue.deployment_speed),
        ];
        for (value, target) in numbers {
            if let Some(value) = value {
                *target = value;
            }
        }
        Ok(cue)
    }
}

#[derive(Debug, Deserialize)]
struct XmlProcedural {
    #[serde(default = "no_library", rename = "@textureLibrary")]
    texture_library: String,
    #[serde(default = "cone", rename = "@type")]
    kind: String,
    #[serde(default = "no_library", rename = "@currentCase")]
    current_case: String,
    #[serde(default, rename = "PROCEDURAL_CHUTE")]
    state: Option<PersistedState>,
    #[serde(default, rename = "CHUTE")]
    chutes: Vec<PersistedChute>,
}

fn no_library() -> String {
    crate::catalog::cases::NO_LIBRARY.to_owned()
}

fn cone() -> String {
    "Cone".to_owned()
}

impl XmlProcedural {
    fn into_chute(self) -> ParseResult<ProceduralChute> {
        let mut chute = ProceduralChute::new()
            .with_texture_library(self.texture_library)
            .with_kind(self.kind)
            .with_case(self.current_case);
        chute.chutes = self
            .chutes
            .into_iter()
            .enumerate()
            .map(|(index, params)| ChuteTemplate::new(index, params.into()))
            .collect();
        if let Some(state) = self.state {
            state.restore(&mut chute)?;
        }
        Ok(chute)
    }
}

#[derive(Debug, Deserialize)]
struct XmlAttach {
    #[serde(rename = "@child")]
    child: String,
    #[serde(rename = "@parent")]
    parent: String,
    #[serde(default, rename = "@mode")]
    mode: String,
    #[serde(default, rename = "@childPoint")]
    child_point: Option<String>,
    #[serde(default, rename = "@parentPoint")]
    parent_point: Option<String>,
}

#[derive(Debug, Deserialize)]
struct XmlSymmetry {
    #[serde(rename = "@parts")]
    parts: String,
}

#[cfg(test)]
mod tests {
    use super::parse_str;
    use crate::assembly::{AttachMode, AttachPoint};
    use crate::geom::Vec3;

    const CRAFT: &str = r#"<craft name="Lander">
  <part id="pod" name="mk1pod" position="0, 1, 0">
    <node point="bottom" offset="0, -0.4, 0"/>
  </part>
  <part id="chute" name="RC_stack" position="0, 0.4, 0">
    <node point="top" offset="0, 0.2, 0" radius="1.25"/>
    <node point="bottom" offset="0, -0.2, 0"/>
    <module caseMass="0.1" timer="2" spareChutes="-1">
      <parachute name="canopy" offset="0, 0.1, 0" deployedDiameter="30"/>
    </module>
    <procedural textureLibrary="RealChute" currentCase="Blue">
      <PROCEDURAL_CHUTE size="1" initiated="true" originalSize="1, 1, 1" timer="2s"/>
    </procedural>
  </part>
  <part id="left" name="strut" position="0.6, 0.4, 0" surfaceNode="-0.1, 0, 0"/>
  <part id="right" name="strut" position="-0.6, 0.4, 0" surfaceNode="0.1, 0, 0"/>
  <attach child="chute" childPoint="top" parent="pod" parentPoint="bottom"/>
  <attach child="left" parent="chute" mode="surface"/>
  <attach child="right" parent="chute" mode="surface"/>
  <symmetry parts="left, right"/>
</craft>"#;

    #[test]
    fn builds_the_assembly() {
        let craft = parse_str(CRAFT).expect("craft parsed");
        assert_eq!(craft.name, "Lander");
        assert_eq!(craft.assembly.part_count(), 4);

        let pod = craft.id("pod").unwrap();
        let chute = craft.id("chute").unwrap();
        let left = craft.id("left").unwrap();
        assert_eq!(craft.assembly.root(), Some(pod));
        assert_eq!(craft.label(chute), Some("chute"));

        let link = craft.assembly.parent_of(chute).unwrap();
        assert_eq!(link.parent, pod);
        assert_eq!(
            link.mode,
            AttachMode::Stack {
                parent_point: AttachPoint::Bottom
            }
        );
        assert_eq!(craft.assembly.parent_of(left).unwrap().mode, AttachMode::Surface);
        assert_eq!(
            craft.assembly.part(left).unwrap().symmetry_counterparts(),
            [craft.id("right").unwrap()]
        );

        let part = craft.assembly.part(chute).unwrap();
        let top = part.attachments.top.as_ref().unwrap();
        assert!((top.radius - 1.25).abs() < 1e-12);
        let module = part.module.as_ref().unwrap();
        assert_eq!(module.spare_chutes, -1);
        assert!((module.parachutes[0].deployed_diameter - 30.0).abs() < 1e-12);
        let state = part.procedural.as_ref().unwrap();
        assert_eq!(state.size, 1);
        assert_eq!(state.original_size, Some(Vec3::ONE));
        assert_eq!(state.current_case, "Blue");
    }

    #[test]
    fn unknown_references_are_errors() {
        let craft = r#"<craft><part id="a" name="x"/><attach child="a" parent="b" mode="surface"/></craft>"#;
        assert!(parse_str(craft).is_err());

        let occupied = r#"<craft>
  <part id="a" name="x"><node point="bottom" offset="0, -1, 0"/></part>
  <part id="b" name="y"><node point="top" offset="0, 1, 0"/></part>
  <part id="c" name="z"><node point="top" offset="0, 1, 0"/></part>
  <attach child="b" childPoint="top" parent="a" parentPoint="bottom"/>
  <attach child="c" childPoint="top" parent="a" parentPoint="bottom"/>
</craft>"#;
        assert!(parse_str(occupied).is_err());
    }
}
