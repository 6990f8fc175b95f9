//! Opgeslagen presets en de commit die bewerkte velden in de parachutemodule
//! schrijft.
//!
//! Beide ingangen delen één validatiepoort. Bij een preset controleert die de
//! velden zoals ze *voor* het schrijven zijn; een preset wordt dus geweigerd
//! zolang de huidige velden ongeldig zijn, ook als de preset ze zou herstellen.

use thiserror::Error;

use crate::assembly::{Assembly, Part, PartId};
use crate::catalog::{BodyTable, CaseLibrary, SizeCatalog, SizeRecord, cases::NO_LIBRARY};
use crate::chute::{ChuteParameters, ProceduralChute};

use super::propagation::{Resize, ResizeError, ResizeOutcome, ResizeResult};
use super::validation::{ValidationAggregator, ValidationError};

/// Benoemde momentopname van alle bewerkbare velden.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub texture_library: String,
    pub size_id: String,
    pub cut_speed: String,
    pub timer: String,
    pub must_go_down: bool,
    pub deploy_on_ground: bool,
    pub spares: String,
    pub case_name: String,
    pub body_name: String,
    pub chutes: Vec<ChuteParameters>,
}

impl Preset {
    /// Leg de huidige velden van een procedurele parachute vast onder een nieuwe naam.
    #[must_use]
    pub fn from_chute(
        name: impl Into<String>,
        description: impl Into<String>,
        chute: &ProceduralChute,
        sizes: &[SizeRecord],
        bodies: &BodyTable,
        cases: &CaseLibrary,
    ) -> Self {
        let case_name = cases
            .get(&chute.texture_library)
            .and_then(|catalog| catalog.get(chute.case_id))
            .map(|case| case.name.clone())
            .unwrap_or_default();

        Self {
            name: name.into(),
            description: description.into(),
            texture_library: chute.texture_library.clone(),
            size_id: sizes
                .get(chute.size)
                .map(|record| record.size_id.clone())
                .unwrap_or_default(),
            cut_speed: chute.cut_speed.clone(),
            timer: chute.timer.clone(),
            must_go_down: chute.must_go_down,
            deploy_on_ground: chute.deploy_on_ground,
            spares: chute.spares.clone(),
            case_name,
            body_name: bodies
                .get(chute.planet)
                .map(|body| body.name.clone())
                .unwrap_or_default(),
            chutes: chute.chutes.iter().map(|t| t.params.clone()).collect(),
        }
    }
}

/// Presets in toevoegvolgorde; namen zijn uniek.
#[derive(Debug, Clone, Default)]
pub struct PresetLibrary {
    presets: Vec<Preset>,
}

impl PresetLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voeg een preset toe; een bestaande preset met dezelfde naam wordt vervangen.
    pub fn add(&mut self, preset: Preset) {
        if let Some(existing) = self.presets.iter_mut().find(|p| p.name == preset.name) {
            log::debug!("preset `{}` vervangen", preset.name);
            *existing = preset;
        } else {
            self.presets.push(preset);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// Presets die op een onderdeel passen: de maat moet bestaan voor het
    /// archetype (als dat maten heeft) en de preset moet precies evenveel
    /// parachutes beschrijven.
    #[must_use]
    pub fn relevant(&self, sizes: &[SizeRecord], chute_count: usize) -> Vec<&Preset> {
        self.presets
            .iter()
            .filter(|preset| {
                sizes.is_empty() || sizes.iter().any(|record| record.size_id == preset.size_id)
            })
            .filter(|preset| preset.chutes.len() == chute_count)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preset> {
        self.presets.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

/// Melding aan de host dat de assemblage gewijzigd is.
pub trait AssemblyListener {
    fn assembly_modified(&mut self, part: PartId);
}

impl<F: FnMut(PartId)> AssemblyListener for F {
    fn assembly_modified(&mut self, part: PartId) {
        self(part);
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error("ongeldige velden: {}", join_errors(.0))]
    ValidationFailed(Vec<ValidationError>),
    #[error("onderdeel {0} bestaat niet (meer) in de assemblage")]
    UnknownPart(PartId),
    #[error("onderdeel {0} heeft geen procedurele parachute")]
    NotProcedural(PartId),
    #[error(transparent)]
    Resize(#[from] ResizeError),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wat een preset of commit gedaan heeft.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyReport {
    /// Uitkomst van de herschaling van het onderdeel zelf, als die plaatsvond.
    pub resize: Option<ResizeOutcome>,
    /// Herschalingsresultaat per levende symmetrische tegenhanger.
    pub counterparts: Vec<(PartId, ResizeResult)>,
    pub stale_counterparts: Vec<PartId>,
    /// Gevuld als een preset geschreven is maar de commitpoort niet haalde.
    pub commit_errors: Vec<ValidationError>,
}

impl ApplyReport {
    #[must_use]
    pub fn committed(&self) -> bool {
        self.commit_errors.is_empty()
    }
}

/// Past presets toe en commit bewerkte velden.
pub struct PresetApplier<'a, R: Resize> {
    resizer: &'a R,
    catalog: &'a SizeCatalog,
    bodies: &'a BodyTable,
    cases: &'a CaseLibrary,
}

impl<'a, R: Resize> PresetApplier<'a, R> {
    #[must_use]
    pub fn new(
        resizer: &'a R,
        catalog: &'a SizeCatalog,
        bodies: &'a BodyTable,
        cases: &'a CaseLibrary,
    ) -> Self {
        Self {
            resizer,
            catalog,
            bodies,
            cases,
        }
    }

    /// Schrijf `preset` op het onderdeel, herschaal één keer als de maat
    /// veranderde en commit het resultaat in de parachutemodule.
    pub fn apply(
        &self,
        assembly: &mut Assembly,
        id: PartId,
        preset: &Preset,
        listener: &mut impl AssemblyListener,
    ) -> Result<ApplyReport, ApplyError> {
        let part = assembly.part(id).ok_or(ApplyError::UnknownPart(id))?;
        let chute = procedural(part, id)?;
        self.gate(chute)?;

        let sizes = self.catalog.sizes(&part.name);
        let size = match sizes.iter().position(|record| record.size_id == preset.size_id) {
            Some(index) => index,
            None => {
                match self.catalog.closest_size_id(&part.name, &preset.size_id) {
                    Some(closest) => log::warn!(
                        "maat `{}` van preset `{}` is onbekend voor `{}`; bedoelde je `{closest}`?",
                        preset.size_id,
                        preset.name,
                        part.name
                    ),
                    None => log::warn!(
                        "maat `{}` van preset `{}` is onbekend voor `{}`",
                        preset.size_id,
                        preset.name,
                        part.name
                    ),
                }
                chute.size
            }
        };
        let size_changed = size != chute.size;
        if size_changed && chute.original_size.is_none() {
            return Err(ResizeError::NotInitialized(id).into());
        }
        let case_id = self.preset_case(chute, preset);
        let planet = self.bodies.index_of(&preset.body_name);
        let name = part.name.clone();

        let Some(chute) = assembly.part_mut(id).and_then(|p| p.procedural.as_mut()) else {
            return Err(ApplyError::NotProcedural(id));
        };
        chute.cut_speed.clone_from(&preset.cut_speed);
        chute.timer.clone_from(&preset.timer);
        chute.must_go_down = preset.must_go_down;
        chute.deploy_on_ground = preset.deploy_on_ground;
        chute.spares.clone_from(&preset.spares);
        chute.size = size;
        if let Some(case_id) = case_id {
            chute.case_id = case_id;
        }
        if let Some(planet) = planet {
            chute.planet = planet;
        }
        for template in &mut chute.chutes {
            if let Some(params) = preset.chutes.get(template.index) {
                template.apply_parameters(params);
            }
        }

        let resize = if size_changed {
            Some(self.resizer.apply_resize(assembly, id, size)?)
        } else {
            None
        };

        let mut report = match self.apply_changes(assembly, id, false, listener) {
            Ok(report) => report,
            Err(ApplyError::ValidationFailed(errors)) => {
                log::warn!(
                    "preset `{}` op `{name}` geschreven maar niet gecommit: {}",
                    preset.name,
                    join_errors(&errors)
                );
                ApplyReport {
                    commit_errors: errors,
                    ..ApplyReport::default()
                }
            }
            Err(err) => return Err(err),
        };
        report.resize = resize;
        log::debug!("preset `{}` toegepast op `{name}`", preset.name);
        Ok(report)
    }

    /// Commit de bewerkte velden in de parachutemodule en kopieer ze
    /// desgewenst naar elke symmetrische tegenhanger.
    pub fn apply_changes(
        &self,
        assembly: &mut Assembly,
        id: PartId,
        to_symmetry: bool,
        listener: &mut impl AssemblyListener,
    ) -> Result<ApplyReport, ApplyError> {
        let part = assembly.part(id).ok_or(ApplyError::UnknownPart(id))?;
        let chute = procedural(part, id)?.clone();
        self.gate(&chute)?;
        let counterparts = if to_symmetry {
            part.symmetry_counterparts().to_vec()
        } else {
            Vec::new()
        };

        if let Some(module) = assembly.part_mut(id).and_then(|p| p.module.as_mut()) {
            chute.commit(module);
        }

        let mut report = ApplyReport::default();
        for counterpart in counterparts {
            let Some(part) = assembly.part_mut(counterpart) else {
                log::warn!("symmetrische tegenhanger {counterpart} van {id} bestaat niet meer");
                report.stale_counterparts.push(counterpart);
                continue;
            };
            let Some(state) = part.procedural.as_mut() else {
                continue;
            };
            chute.copy_to_counterpart(state);

            let result = self.resizer.apply_resize(assembly, counterpart, chute.size);
            if let Err(err) = &result {
                log::warn!("symmetrische tegenhanger {counterpart} niet herschaald: {err}");
            }
            report.counterparts.push((counterpart, result));

            if let Some(part) = assembly.part_mut(counterpart) {
                let Part {
                    module, procedural, ..
                } = part;
                if let (Some(module), Some(state)) = (module.as_mut(), procedural.as_ref()) {
                    state.commit(module);
                }
            }
        }

        listener.assembly_modified(id);
        Ok(report)
    }

    fn gate(&self, chute: &ProceduralChute) -> Result<(), ApplyError> {
        let errors = ValidationAggregator::new(self.bodies).gate_errors(chute);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApplyError::ValidationFailed(errors))
        }
    }

    fn preset_case(&self, chute: &ProceduralChute, preset: &Preset) -> Option<usize> {
        let library = self.cases.get(&chute.texture_library)?;
        let same_library = chute.texture_library == preset.texture_library;
        let known_case =
            chute.texture_library != NO_LIBRARY && library.contains(&preset.case_name);
        if (same_library || known_case) && !library.is_empty() && !preset.case_name.is_empty() {
            library.index_of(&preset.case_name)
        } else {
            None
        }
    }
}

fn procedural(part: &Part, id: PartId) -> Result<&ProceduralChute, ApplyError> {
    part.procedural
        .as_ref()
        .ok_or(ApplyError::NotProcedural(id))
}
