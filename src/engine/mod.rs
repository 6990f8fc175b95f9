//! De motor: schaalberekening, propagatie, validatie en presets, plus de
//! per-frame controle op openstaande maatwijzigingen.

pub mod preset;
pub mod propagation;
pub mod scale;
pub mod validation;

use crate::assembly::{Assembly, PartId};
use crate::catalog::{BodyTable, CaseLibrary, SizeCatalog, archetype_key};
use crate::chute;
use crate::geom::Tolerance;

pub use preset::{ApplyError, ApplyReport, AssemblyListener, Preset, PresetApplier, PresetLibrary};
pub use propagation::{
    IgnoreReason, Link, PropagationEngine, Resize, ResizeError, ResizeOutcome, ResizeReport,
    ResizeResult, Role, StaleReference,
};
pub use scale::{ScaleResolution, ScaleResolver};
pub use validation::{ChuteParameter, Field, Scope, ValidationAggregator, ValidationError};

/// Wat een frame-update gedaan heeft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub resized: Vec<(PartId, ResizeOutcome)>,
    pub errors: Vec<(PartId, ResizeError)>,
    /// Onderdelen waarvan de host de kasttextuur moet verversen.
    pub case_changes: Vec<PartId>,
}

/// Voer alle openstaande maatwijzigingen door.
///
/// Een onderdeel wordt alleen herschaald als `size` afwijkt van `last_size`
/// of als de modelschaal niet (meer) bij de huidige maat past.
pub fn update(assembly: &mut Assembly, catalog: &SizeCatalog) -> FrameReport {
    let pending: Vec<(PartId, usize)> = assembly
        .parts()
        .filter_map(|(id, part)| {
            let chute = part.procedural.as_ref()?;
            let sizes = catalog.sizes(&part.name);
            if sizes.is_empty() {
                return None;
            }
            let off_scale = chute
                .target_scale(sizes)
                .is_some_and(|target| !part.model_scale.approx_eq(target, Tolerance::DEFAULT));
            (chute.is_dirty() || off_scale).then_some((id, chute.size))
        })
        .collect();

    let engine = PropagationEngine::new(catalog);
    let mut report = FrameReport::default();
    for (id, size) in pending {
        match engine.apply_resize(assembly, id, size) {
            Ok(outcome) => report.resized.push((id, outcome)),
            Err(err) => {
                log::warn!("maatwijziging van {id} mislukt: {err}");
                report.errors.push((id, err));
            }
        }
    }

    let ids: Vec<PartId> = assembly.parts().map(|(id, _)| id).collect();
    for id in ids {
        if let Some(chute) = assembly.part_mut(id).and_then(|p| p.procedural.as_mut()) {
            if chute.last_case_id != chute.case_id {
                chute.last_case_id = chute.case_id;
                report.case_changes.push(id);
            }
        }
    }

    report
}

/// Initialiseer alle procedurele onderdelen na het laden.
///
/// Symmetrische klonen (naam met `(Clone)(Clone)`) nemen eerst de instellingen
/// van hun origineel over en verliezen daarna het achtervoegsel. Geeft de
/// onderdelen terug die nu voor het eerst geïnitialiseerd zijn.
pub fn initialize_all(
    assembly: &mut Assembly,
    bodies: &BodyTable,
    cases: &CaseLibrary,
) -> Vec<PartId> {
    const DOUBLE_CLONE: &str = "(Clone)(Clone)";

    let clones: Vec<(PartId, Option<PartId>)> = assembly
        .parts()
        .filter(|(_, part)| part.name.contains(DOUBLE_CLONE))
        .map(|(id, part)| {
            let original = part.symmetry_counterparts().iter().copied().find(|other| {
                assembly
                    .part(*other)
                    .is_some_and(|p| !p.name.contains(DOUBLE_CLONE))
            });
            (id, original)
        })
        .collect();

    for (clone, original) in clones {
        let source = original
            .and_then(|id| assembly.part(id))
            .and_then(|p| p.procedural.clone());
        if let Some(part) = assembly.part_mut(clone) {
            if let (Some(source), Some(state)) = (source.as_ref(), part.procedural.as_mut()) {
                state.copy_from_original(source);
            }
            part.name = archetype_key(&part.name);
        }
    }

    let ids: Vec<PartId> = assembly.parts().map(|(id, _)| id).collect();
    ids.into_iter()
        .filter(|id| {
            assembly
                .part_mut(*id)
                .is_some_and(|part| chute::initialize(part, bodies, cases))
        })
        .collect()
}
