//! Parser voor `<realchute>` configuratiedocumenten: maten, hemellichamen,
//! texturenbibliotheken en presets.

use quick_xml::de::from_str;
use serde::Deserialize;

use crate::catalog::{Body, BodyTable, CaseCatalog, CaseConfig, CaseLibrary, SizeCatalog, SizeRecord};
use crate::chute::ChuteParameters;
use crate::engine::{Preset, PresetLibrary};
use crate::geom::Vec3;

use super::persist_xml::PersistedChute;
use super::{ParseResult, expect_root};

/// Alle catalogi die een sessie nodig heeft.
#[derive(Debug, Clone, Default)]
pub struct ConfigSet {
    pub sizes: SizeCatalog,
    pub bodies: BodyTable,
    pub cases: CaseLibrary,
    pub presets: PresetLibrary,
}

/// Leest een configuratiedocument in een nieuwe [`ConfigSet`].
pub fn parse_str(input: &str) -> ParseResult<ConfigSet> {
    let mut set = ConfigSet::default();
    load_into(input, &mut set)?;
    Ok(set)
}

/// Voegt een configuratiedocument toe aan een bestaande set.
///
/// Maten volgen de catalogusregel (eerste registratie wint). Een document met
/// hemellichamen vervangt de hele tabel; bibliotheken en presets met dezelfde
/// naam worden vervangen.
pub fn load_into(input: &str, set: &mut ConfigSet) -> ParseResult<()> {
    let body = expect_root(input, "realchute")?;
    let document: RealChuteDocument = from_str(body)?;
    log::debug!(
        "configuratie: {} maatlijsten, {} lichamen, {} bibliotheken, {} presets",
        document.sizes.len(),
        document.bodies.as_ref().map_or(0, |b| b.bodies.len()),
        document.textures.len(),
        document.presets.as_ref().map_or(0, |p| p.presets.len())
    );

    for list in document.sizes {
        let records = list
            .sizes
            .into_iter()
            .map(XmlSize::into_record)
            .collect::<ParseResult<Vec<_>>>()?;
        set.sizes.register(&list.archetype, records);
    }

    if let Some(bodies) = document.bodies.filter(|b| !b.bodies.is_empty()) {
        set.bodies = BodyTable::new(
            bodies
                .bodies
                .into_iter()
                .map(|b| Body::new(b.name, b.max_altitude, b.pressure.unwrap_or(101.325)))
                .collect(),
        );
    }

    for library in document.textures {
        let cases = library
            .cases
            .into_iter()
            .map(|case| CaseConfig {
                name: case.name,
                types: case
                    .types
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect(),
                texture_url: case.texture,
            })
            .collect();
        set.cases.insert(CaseCatalog::new(library.name, cases));
    }

    if let Some(presets) = document.presets {
        for preset in presets.presets {
            set.presets.add(preset.into_preset());
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct RealChuteDocument {
    #[serde(default)]
    sizes: Vec<XmlSizeList>,
    #[serde(default)]
    bodies: Option<XmlBodies>,
    #[serde(default)]
    textures: Vec<XmlTextures>,
    #[serde(default)]
    presets: Option<XmlPresets>,
}

#[derive(Debug, Deserialize)]
struct XmlSizeList {
    #[serde(rename = "@archetype")]
    archetype: String,
    #[serde(default, rename = "size")]
    sizes: Vec<XmlSize>,
}

#[derive(Debug, Deserialize)]
struct XmlSize {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@scale")]
    scale: String,
    #[serde(rename = "@top")]
    top: String,
    #[serde(default, rename = "@topRadius")]
    top_radius: f64,
    #[serde(rename = "@bottom")]
    bottom: String,
    #[serde(default, rename = "@bottomRadius")]
    bottom_radius: f64,
    #[serde(default, rename = "@caseMass")]
    case_mass: f64,
    #[serde(default, rename = "@cost")]
    cost: f64,
}

impl XmlSize {
    fn into_record(self) -> ParseResult<SizeRecord> {
        Ok(SizeRecord {
            scale: self.scale.parse::<Vec3>()?,
            top_offset: self.top.parse::<Vec3>()?,
            top_radius: self.top_radius,
            bottom_offset: self.bottom.parse::<Vec3>()?,
            bottom_radius: self.bottom_radius,
            case_mass: self.case_mass,
            cost: self.cost,
            size_id: self.id,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct XmlBodies {
    #[serde(default, rename = "body")]
    bodies: Vec<XmlBody>,
}

#[derive(Debug, Deserialize)]
struct XmlBody {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@maxAltitude")]
    max_altitude: f64,
    #[serde(default, rename = "@pressure")]
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct XmlTextures {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "case")]
    cases: Vec<XmlCase>,
}

#[derive(Debug, Deserialize)]
struct XmlCase {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@types")]
    types: String,
    #[serde(default, rename = "@texture")]
    texture: String,
}

#[derive(Debug, Default, Deserialize)]
struct XmlPresets {
    #[serde(default, rename = "preset")]
    presets: Vec<XmlPreset>,
}

#[derive(Debug, Deserialize)]
struct XmlPreset {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@description")]
    description: String,
    #[serde(default = "no_library", rename = "@textureLibrary")]
    texture_library: String,
    #[serde(rename = "@size")]
    size: String,
    #[serde(default, rename = "@cutSpeed")]
    cut_speed: String,
    #[serde(default, rename = "@timer")]
    timer: String,
    #[serde(default, rename = "@mustGoDown")]
    must_go_down: bool,
    #[serde(default, rename = "@deployOnGround")]
    deploy_on_ground: bool,
    #[serde(default, rename = "@spares")]
    spares: String,
    #[serde(default, rename = "@case")]
    case: String,
    #[serde(default, rename = "@body")]
    body: String,
    #[serde(default, rename = "chute")]
    chutes: Vec<PersistedChute>,
}

fn no_library() -> String {
    crate::catalog::cases::NO_LIBRARY.to_owned()
}

impl XmlPreset {
    fn into_preset(self) -> Preset {
        Preset {
            name: self.name,
            description: self.description,
            texture_library: self.texture_library,
            size_id: self.size,
            cut_speed: self.cut_speed,
            timer: self.timer,
            must_go_down: self.must_go_down,
            deploy_on_ground: self.deploy_on_ground,
            spares: self.spares,
            case_name: self.case,
            body_name: self.body,
            chutes: self.chutes.into_iter().map(ChuteParameters::from).collect(),
        }
    }
}
