//! Procedurele parachutestatus en het deel van de aansturende module dat de
//! motor leest en schrijft.

pub mod template;

use crate::assembly::{AttachPoint, Part};
use crate::catalog::{BodyTable, CaseLibrary, SizeRecord, cases::NO_LIBRARY};
use crate::engine::validation::{parse_number, parse_time, parse_with_empty};
use crate::geom::Vec3;

pub use template::{ChuteParameters, ChuteTemplate};

/// Visueel object van een enkele parachute, met de gecommitte parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParachuteCue {
    pub name: String,
    /// Positie ten opzichte van de oorsprong van het onderdeel.
    pub offset: Vec3,
    pub material: String,
    pub pre_deployed_diameter: f64,
    pub deployed_diameter: f64,
    pub min_is_pressure: bool,
    pub min_deployment: f64,
    pub min_pressure: f64,
    pub deployment_alt: f64,
    /// -1 betekent geen automatische afsnijding.
    pub cut_alt: f64,
    pub pre_deployment_speed: f64,
    pub deployment_speed: f64,
}

impl ParachuteCue {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: Vec3::ZERO,
            material: "Nylon".to_owned(),
            pre_deployed_diameter: 1.0,
            deployed_diameter: 25.0,
            min_is_pressure: false,
            min_deployment: 25_000.0,
            min_pressure: 0.01,
            deployment_alt: 700.0,
            cut_alt: -1.0,
            pre_deployment_speed: 2.0,
            deployment_speed: 6.0,
        }
    }

    #[must_use]
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

/// De aansturende parachutemodule, beperkt tot wat de motor nodig heeft.
#[derive(Debug, Clone, PartialEq)]
pub struct ChuteModule {
    pub case_mass: f64,
    /// Ontplooiingsvertraging in seconden.
    pub timer: f64,
    pub cut_speed: f64,
    /// -1 betekent onbeperkt.
    pub spare_chutes: i32,
    pub must_go_down: bool,
    pub deploy_on_ground: bool,
    pub secondary_chute: bool,
    pub parachutes: Vec<ParachuteCue>,
}

impl Default for ChuteModule {
    fn default() -> Self {
        Self {
            case_mass: 0.0,
            timer: 0.0,
            cut_speed: 0.5,
            spare_chutes: 5,
            must_go_down: false,
            deploy_on_ground: false,
            secondary_chute: false,
            parachutes: Vec::new(),
        }
    }
}

/// Procedurele maatstatus van een parachutekast.
///
/// De numerieke velden die de gebruiker bewerkt blijven tekst tot een commit;
/// alleen dan worden ze naar de [`ChuteModule`] geschreven.
#[derive(Debug, Clone, PartialEq)]
pub struct ProceduralChute {
    pub texture_library: String,
    /// Archetype-type waarmee kasten gefilterd worden.
    pub kind: String,
    /// Kastnaam uit de configuratie, gebruikt bij eerste initialisatie.
    pub current_case: String,

    pub case_id: usize,
    pub last_case_id: usize,
    pub size: usize,
    pub last_size: usize,
    pub planet: usize,
    pub preset_id: usize,
    /// Modelschaal bij eerste initialisatie; wordt nooit herberekend.
    pub original_size: Option<Vec3>,
    pub top: f64,
    pub bottom: f64,
    pub debut: f64,
    pub initiated: bool,
    pub must_go_down: bool,
    pub deploy_on_ground: bool,
    pub secondary_chute: bool,
    pub timer: String,
    pub cut_speed: String,
    pub spares: String,
    pub landing_alt: String,

    pub chutes: Vec<ChuteTemplate>,
}

impl Default for ProceduralChute {
    fn default() -> Self {
        Self {
            texture_library: NO_LIBRARY.to_owned(),
            kind: "Cone".to_owned(),
            current_case: NO_LIBRARY.to_owned(),
            case_id: 0,
            last_case_id: 0,
            size: 0,
            last_size: 0,
            planet: 0,
            preset_id: 0,
            original_size: None,
            top: 0.0,
            bottom: 0.0,
            debut: 0.0,
            initiated: false,
            must_go_down: false,
            deploy_on_ground: false,
            secondary_chute: false,
            timer: String::new(),
            cut_speed: String::new(),
            spares: String::new(),
            landing_alt: "0".to_owned(),
            chutes: Vec::new(),
        }
    }
}

impl ProceduralChute {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_texture_library(mut self, library: impl Into<String>) -> Self {
        self.texture_library = library.into();
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    #[must_use]
    pub fn with_case(mut self, case: impl Into<String>) -> Self {
        self.current_case = case.into();
        self
    }

    /// Er staat een maatwijziging klaar die nog niet gepropageerd is.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.size != self.last_size
    }

    /// Modelschaal die bij de huidige maat hoort.
    #[must_use]
    pub fn target_scale(&self, sizes: &[SizeRecord]) -> Option<Vec3> {
        let base = self.original_size?;
        sizes.get(self.size).map(|record| base.scale(record.scale))
    }

    /// Kosten van de huidige maat; 0 zonder maten.
    #[must_use]
    pub fn module_cost(&self, sizes: &[SizeRecord]) -> f64 {
        sizes.get(self.size).map_or(0.0, |record| record.cost)
    }

    /// Neem de instellingen van het origineel over op een symmetrische kloon.
    pub fn copy_from_original(&mut self, original: &Self) {
        self.preset_id = original.preset_id;
        self.planet = original.planet;
        self.size = original.size;
        self.case_id = original.case_id;
        self.must_go_down = original.must_go_down;
        self.deploy_on_ground = original.deploy_on_ground;
        self.timer.clone_from(&original.timer);
        self.cut_speed.clone_from(&original.cut_speed);
        self.spares.clone_from(&original.spares);

        for template in &mut self.chutes {
            if let Some(source) = original.chutes.get(template.index) {
                template.params.clone_from(&source.params);
            }
        }
    }

    /// Kopieer de deelbare velden naar een symmetrische tegenhanger. De maat
    /// wordt niet als `last_size` meegegeven; de tegenhanger propageert zelf.
    pub fn copy_to_counterpart(&self, counterpart: &mut Self) {
        counterpart.copy_from_original(self);
        counterpart.landing_alt.clone_from(&self.landing_alt);
        counterpart.secondary_chute = self.secondary_chute;
    }

    /// Schrijf de tekstvelden naar de module. Veronderstelt dat de validatie
    /// al geslaagd is; onleesbare velden laten de huidige waarde staan.
    #[allow(clippy::cast_possible_truncation)]
    pub fn commit(&self, module: &mut ChuteModule) {
        module.must_go_down = self.must_go_down;
        module.deploy_on_ground = self.deploy_on_ground;
        if let Some(timer) = parse_time(&self.timer) {
            module.timer = timer;
        }
        if let Some(cut_speed) = parse_number(&self.cut_speed) {
            module.cut_speed = cut_speed;
        }
        if let Some(spares) = parse_with_empty(&self.spares) {
            module.spare_chutes = spares.round() as i32;
        }

        for template in &self.chutes {
            if let Some(cue) = module.parachutes.get_mut(template.index) {
                template.apply_changes(cue);
            }
        }
    }
}

/// Eerste activatie van een onderdeel met procedurele module.
///
/// Legt de basisafmetingen vast als dat nog niet gebeurd is en vult de
/// tekstvelden vanuit de module. Geeft `true` terug als het onderdeel nu pas
/// geïnitialiseerd werd.
pub fn initialize(part: &mut Part, bodies: &BodyTable, cases: &CaseLibrary) -> bool {
    let Part {
        name,
        model_scale,
        attachments,
        module,
        procedural,
        ..
    } = part;
    let Some(chute) = procedural.as_mut() else {
        return false;
    };

    if let Some(module) = module.as_ref() {
        chute.secondary_chute = module.secondary_chute;
        if chute.chutes.is_empty() {
            chute.chutes = module
                .parachutes
                .iter()
                .enumerate()
                .map(|(index, cue)| ChuteTemplate::from_cue(index, cue))
                .collect();
        }
    }

    if let Some(node) = attachments.get(AttachPoint::Top) {
        chute.top = node.original_offset.y;
    }
    if let Some(node) = attachments.get(AttachPoint::Bottom) {
        chute.bottom = node.original_offset.y;
    }
    if chute.debut == 0.0 {
        chute.debut = model_scale.y;
    }

    if chute.initiated {
        return false;
    }

    chute.planet = bodies.default_index();
    if let Some(catalog) = cases.get(&chute.texture_library) {
        if let Some(index) = catalog.index_of(&chute.current_case) {
            chute.case_id = index;
        }
        chute.last_case_id = chute.case_id;
    }

    if let Some(module) = module.as_ref() {
        chute.must_go_down = module.must_go_down;
        chute.deploy_on_ground = module.deploy_on_ground;
        chute.timer = format!("{}s", module.timer);
        chute.cut_speed = module.cut_speed.to_string();
        if module.spare_chutes != -1 {
            chute.spares = module.spare_chutes.to_string();
        }
    }

    chute.original_size = Some(*model_scale);
    chute.initiated = true;
    log::debug!("procedurele parachute `{name}` geïnitialiseerd");
    true
}
