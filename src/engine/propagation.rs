//! Herschalen van een procedureel onderdeel en het doorgeven van de
//! verschuivingen aan alles wat eraan vastzit.
//!
//! Alle verschuivingen worden eerst verzameld en pas daarna in één keer
//! toegepast. `last_size` wordt als laatste bijgewerkt, zodat een afgebroken
//! aanroep de assemblage ongewijzigd laat.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::assembly::traverse;
use crate::assembly::{Assembly, AttachMode, AttachPoint, Part, PartId};
use crate::catalog::SizeCatalog;
use crate::geom::{Tolerance, Vec3};

use super::scale::{ScaleResolution, ScaleResolver};

/// Hoe het onderdeel aan zijn ouder hangt; bepaalt welk punt stil blijft staan.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    /// Geen (levende) ouder: de oorsprong blijft staan.
    Root,
    /// De ouder zit op de onderste pool.
    AnchoredAtBottom,
    /// De ouder zit op de bovenste pool.
    AnchoredAtTop,
    /// De ouder zit op geen van beide polen; de polen blijven onaangeroerd.
    SurfaceMounted,
}

/// Soort verwijzing die niet meer resolveerde.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Link {
    Parent,
    Node(AttachPoint),
    Child,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => f.write_str("ouder"),
            Self::Node(point) => write!(f, "{point}-punt"),
            Self::Child => f.write_str("kind"),
        }
    }
}

/// Een verouderde verwijzing die overgeslagen is.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct StaleReference {
    pub holder: PartId,
    pub target: PartId,
    pub link: Link,
}

/// Wat een geslaagde herschaling gedaan heeft.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeReport {
    pub part: PartId,
    pub from: usize,
    pub to: usize,
    pub role: Role,
    pub scale: Vec3,
    pub top_delta: Vec3,
    pub bottom_delta: Vec3,
    /// Toegepaste verschuivingen per onderdeel, inclusief het onderdeel zelf.
    pub moved: Vec<(PartId, Vec3)>,
    pub stale: Vec<StaleReference>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum IgnoreReason {
    EmptyCatalog,
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResizeOutcome {
    Applied(ResizeReport),
    /// De maat was al toegepast.
    Unchanged,
    Ignored(IgnoreReason),
}

impl ResizeOutcome {
    #[must_use]
    pub fn report(&self) -> Option<&ResizeReport> {
        match self {
            Self::Applied(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResizeError {
    #[error("onderdeel {0} bestaat niet (meer) in de assemblage")]
    UnknownPart(PartId),
    #[error("onderdeel {0} heeft geen procedurele parachute")]
    NotProcedural(PartId),
    #[error("onderdeel {0} heeft nog geen basisafmetingen")]
    NotInitialized(PartId),
}

pub type ResizeResult = Result<ResizeOutcome, ResizeError>;

/// Alles wat een maatwijziging kan doorvoeren.
pub trait Resize {
    fn apply_resize(&self, assembly: &mut Assembly, part: PartId, size: usize) -> ResizeResult;
}

/// Voert maatwijzigingen door tegen een vaste maatcatalogus.
#[derive(Debug, Clone, Copy)]
pub struct PropagationEngine<'a> {
    catalog: &'a SizeCatalog,
}

/// Verzamelde wijzigingen voor één onderdeel, nog niet toegepast.
struct Plan {
    from: usize,
    to: usize,
    role: Role,
    resolution: ScaleResolution,
    ratio: Vec3,
    pivot: Vec3,
    poles: Vec<(AttachPoint, Vec3, f64)>,
    case_mass: f64,
    moves: Vec<(PartId, Vec3)>,
    stale: Vec<StaleReference>,
}

impl<'a> PropagationEngine<'a> {
    #[must_use]
    pub fn new(catalog: &'a SizeCatalog) -> Self {
        Self { catalog }
    }

    fn plan(&self, assembly: &Assembly, id: PartId, to: usize) -> Result<Result<Plan, ResizeOutcome>, ResizeError> {
        let part = assembly.part(id).ok_or(ResizeError::UnknownPart(id))?;
        let chute = part
            .procedural
            .as_ref()
            .ok_or(ResizeError::NotProcedural(id))?;

        let sizes = self.catalog.sizes(&part.name);
        if sizes.is_empty() {
            log::debug!("geen maten voor `{}`", part.name);
            return Ok(Err(ResizeOutcome::Ignored(IgnoreReason::EmptyCatalog)));
        }
        if to >= sizes.len() {
            log::warn!(
                "maatindex {to} valt buiten de {} maten van `{}`",
                sizes.len(),
                part.name
            );
            return Ok(Err(ResizeOutcome::Ignored(IgnoreReason::IndexOutOfRange {
                index: to,
                len: sizes.len(),
            })));
        }
        let base = chute.original_size.ok_or(ResizeError::NotInitialized(id))?;

        let mut from = chute.last_size;
        if from >= sizes.len() {
            log::warn!("vorige maatindex {from} van {id} is ongeldig, behandeld als {to}");
            from = to;
        }

        let (old, new) = (&sizes[from], &sizes[to]);
        let resolution = ScaleResolver::resolve(old, new, base);
        if from == to && part.model_scale.approx_eq(resolution.scale, Tolerance::DEFAULT) {
            return Ok(Err(ResizeOutcome::Unchanged));
        }
        let ratio = ScaleResolver::ratio(old, new, base);

        let mut stale = Vec::new();
        let role = resolve_role(assembly, id, part, &mut stale);

        let parent = part.parent().map(|link| link.parent);
        let mut staged = Staging::new(id);
        let mut poles = Vec::new();
        // Een verouderde ouder is al als `Link::Parent` gemeld.
        let pole_neighbour = |point: AttachPoint, stale: &mut Vec<StaleReference>| {
            let target = part.attachments.get(point)?.attached?;
            if assembly.contains(target) {
                return Some(target);
            }
            if Some(target) != parent {
                stale.push(StaleReference {
                    holder: id,
                    target,
                    link: Link::Node(point),
                });
            }
            None
        };

        let (pivot, pole_shifts) = match role {
            Role::Root => (
                Vec3::ZERO,
                [
                    (AttachPoint::Top, resolution.top_delta),
                    (AttachPoint::Bottom, resolution.bottom_delta),
                ],
            ),
            Role::AnchoredAtBottom => (
                -resolution.bottom_delta,
                [
                    (AttachPoint::Top, resolution.top_delta - resolution.bottom_delta),
                    (AttachPoint::Bottom, Vec3::ZERO),
                ],
            ),
            Role::AnchoredAtTop => (
                -resolution.top_delta,
                [
                    (AttachPoint::Bottom, resolution.bottom_delta - resolution.top_delta),
                    (AttachPoint::Top, Vec3::ZERO),
                ],
            ),
            Role::SurfaceMounted => (Vec3::ZERO, [(AttachPoint::Top, Vec3::ZERO); 2]),
        };

        if role != Role::SurfaceMounted {
            for (point, shift) in pole_shifts {
                if part.attachments.get(point).is_none() {
                    continue;
                }
                let (offset, radius) = match point {
                    AttachPoint::Top => (new.top_offset, new.top_radius),
                    AttachPoint::Bottom => (new.bottom_offset, new.bottom_radius),
                };
                poles.push((point, offset, radius));

                match pole_neighbour(point, &mut stale) {
                    Some(neighbour) if Some(neighbour) != parent => {
                        staged.subtree(assembly, neighbour, shift, &mut stale);
                    }
                    _ => {}
                }
            }
        }

        for child in part.children() {
            let Some(child_part) = assembly.part(*child) else {
                stale.push(StaleReference {
                    holder: id,
                    target: *child,
                    link: Link::Child,
                });
                continue;
            };
            let surface = child_part
                .parent()
                .is_some_and(|link| link.parent == id && link.mode == AttachMode::Surface);
            if !surface {
                continue;
            }

            let axial = child_part.position - part.position;
            let lateral = child_part.position + child_part.surface_node - part.position;
            let shift = Vec3::new(
                lateral.x * (ratio.x - 1.0),
                axial.y * (ratio.y - 1.0),
                lateral.z * (ratio.z - 1.0),
            ) + pivot;
            staged.subtree(assembly, *child, shift, &mut stale);
        }

        let mut moves = Vec::with_capacity(staged.moves.len() + 1);
        if pivot != Vec3::ZERO {
            moves.push((id, pivot));
        }
        moves.extend(staged.moves);

        Ok(Ok(Plan {
            from,
            to,
            role,
            resolution,
            ratio,
            pivot,
            poles,
            case_mass: new.case_mass,
            moves,
            stale,
        }))
    }
}

impl Resize for PropagationEngine<'_> {
    fn apply_resize(&self, assembly: &mut Assembly, id: PartId, size: usize) -> ResizeResult {
        let plan = match self.plan(assembly, id, size)? {
            Ok(plan) => plan,
            Err(outcome) => {
                if outcome == ResizeOutcome::Unchanged {
                    if let Some(chute) = assembly.part_mut(id).and_then(|p| p.procedural.as_mut()) {
                        chute.size = size;
                    }
                }
                return Ok(outcome);
            }
        };

        for reference in &plan.stale {
            log::warn!(
                "verouderde {} {} van onderdeel {} overgeslagen",
                reference.link,
                reference.target,
                reference.holder
            );
        }

        if let Some(part) = assembly.part_mut(id) {
            commit_part(part, &plan);
        }
        for (target, shift) in &plan.moves {
            if *target == id {
                continue;
            }
            if let Some(part) = assembly.part_mut(*target) {
                part.position += *shift;
            }
        }
        if let Some(chute) = assembly.part_mut(id).and_then(|p| p.procedural.as_mut()) {
            chute.last_size = plan.to;
        }

        log::debug!(
            "onderdeel {id} herschaald van maat {} naar {} ({:?}, {} verschuivingen)",
            plan.from,
            plan.to,
            plan.role,
            plan.moves.len()
        );

        Ok(ResizeOutcome::Applied(ResizeReport {
            part: id,
            from: plan.from,
            to: plan.to,
            role: plan.role,
            scale: plan.resolution.scale,
            top_delta: plan.resolution.top_delta,
            bottom_delta: plan.resolution.bottom_delta,
            moved: plan.moves,
            stale: plan.stale,
        }))
    }
}

fn commit_part(part: &mut Part, plan: &Plan) {
    part.model_scale = plan.resolution.scale;
    part.position += plan.pivot;
    for (point, offset, radius) in &plan.poles {
        if let Some(node) = part.attachments.get_mut(*point) {
            node.offset = *offset;
            node.radius = *radius;
        }
    }
    if let Some(module) = part.module.as_mut() {
        module.case_mass = plan.case_mass;
        for cue in &mut module.parachutes {
            cue.offset = cue.offset.scale(plan.ratio);
        }
    }
    if let Some(chute) = part.procedural.as_mut() {
        chute.size = plan.to;
    }
}

fn resolve_role(
    assembly: &Assembly,
    id: PartId,
    part: &Part,
    stale: &mut Vec<StaleReference>,
) -> Role {
    let Some(link) = part.parent() else {
        return Role::Root;
    };
    if !assembly.contains(link.parent) {
        stale.push(StaleReference {
            holder: id,
            target: link.parent,
            link: Link::Parent,
        });
        return Role::Root;
    }

    let holds_parent = |point: AttachPoint| {
        part.attachments
            .get(point)
            .is_some_and(|node| node.attached == Some(link.parent))
    };
    if holds_parent(AttachPoint::Bottom) {
        Role::AnchoredAtBottom
    } else if holds_parent(AttachPoint::Top) {
        Role::AnchoredAtTop
    } else {
        Role::SurfaceMounted
    }
}

/// Verschuivingen per onderdeel; elk onderdeel wordt hooguit één keer verplaatst.
struct Staging {
    seen: HashSet<PartId>,
    moves: Vec<(PartId, Vec3)>,
}

impl Staging {
    fn new(origin: PartId) -> Self {
        Self {
            seen: HashSet::from([origin]),
            moves: Vec::new(),
        }
    }

    fn subtree(
        &mut self,
        assembly: &Assembly,
        start: PartId,
        shift: Vec3,
        stale: &mut Vec<StaleReference>,
    ) {
        let subtree = traverse::with_descendants(assembly, start);
        for id in subtree.ids {
            if self.seen.insert(id) {
                self.moves.push((id, shift));
            }
        }
        stale.extend(subtree.stale.into_iter().map(|(holder, target)| StaleReference {
            holder,
            target,
            link: Link::Child,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SizeRecord;
    use crate::chute::{ChuteModule, ParachuteCue, ProceduralChute};

    const EPS: f64 = 1e-9;

    fn assert_vec_close(actual: Vec3, expected: Vec3) {
        assert!(
            actual.approx_eq(expected, Tolerance::new(EPS)),
            "verwacht {expected}, kreeg {actual}"
        );
    }

    fn record(id: &str, factor: f64, mass: f64) -> SizeRecord {
        SizeRecord {
            top_radius: factor,
            bottom_radius: factor,
            case_mass: mass,
            ..SizeRecord::uniform(id, Vec3::new(factor, factor, factor), 0.2 * factor)
        }
    }

    fn catalog() -> SizeCatalog {
        let mut catalog = SizeCatalog::new();
        catalog.register(
            "RC_stack",
            vec![record("1x", 1.0, 0.1), record("2x", 2.0, 0.2), record("3x", 3.0, 0.3)],
        );
        catalog
    }

    fn stack_part(name: &str, position: Vec3, half: f64) -> Part {
        Part::new(name)
            .with_position(position)
            .with_node(AttachPoint::Top, Vec3::new(0.0, half, 0.0), 1.0)
            .with_node(AttachPoint::Bottom, Vec3::new(0.0, -half, 0.0), 1.0)
    }

    fn chute(position: Vec3) -> Part {
        let mut procedural = ProceduralChute::new();
        procedural.original_size = Some(Vec3::ONE);
        procedural.initiated = true;
        stack_part("RC_stack", position, 0.2)
            .with_module(ChuteModule {
                parachutes: vec![ParachuteCue::new("canopy").with_offset(Vec3::new(0.0, 0.1, 0.0))],
                ..ChuteModule::default()
            })
            .with_procedural(procedural)
    }

    struct Rig {
        assembly: Assembly,
        tank: PartId,
        chute: PartId,
        below: PartId,
        radial: PartId,
    }

    /// Tank bovenaan (root), parachute eronder aan zijn bovenste pool, een
    /// hitteschild aan de onderste pool en een radiaal onderdeel op de zijkant.
    fn hanging_rig() -> Rig {
        let mut assembly = Assembly::new();
        let tank = assembly.add_part(stack_part("tank", Vec3::new(0.0, 0.7, 0.0), 0.5));
        let chute = assembly.add_part(chute(Vec3::ZERO));
        let below = assembly.add_part(stack_part("shield", Vec3::new(0.0, -0.3, 0.0), 0.1));
        let radial = assembly.add_part(
            Part::new("radial")
                .with_position(Vec3::new(0.5, 0.05, 0.0))
                .with_surface_node(Vec3::new(-0.1, 0.0, 0.0)),
        );
        assembly
            .attach_stack(chute, AttachPoint::Top, tank, AttachPoint::Bottom)
            .unwrap();
        assembly
            .attach_stack(below, AttachPoint::Top, chute, AttachPoint::Bottom)
            .unwrap();
        assembly.attach_surface(radial, chute).unwrap();
        Rig {
            assembly,
            tank,
            chute,
            below,
            radial,
        }
    }

    fn position(assembly: &Assembly, id: PartId) -> Vec3 {
        assembly.part(id).unwrap().position
    }

    #[test]
    fn top_anchored_keeps_top_pole_in_place() {
        let mut rig = hanging_rig();
        let catalog = catalog();
        let engine = PropagationEngine::new(&catalog);
        let top_before = rig.assembly.part(rig.chute).unwrap().node_position(AttachPoint::Top).unwrap();

        let outcome = engine.apply_resize(&mut rig.assembly, rig.chute, 1).unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.role, Role::AnchoredAtTop);
        assert!(report.stale.is_empty());

        let part = rig.assembly.part(rig.chute).unwrap();
        assert_vec_close(part.node_position(AttachPoint::Top).unwrap(), top_before);
        assert_vec_close(part.position, Vec3::new(0.0, -0.2, 0.0));
        assert_vec_close(part.model_scale, Vec3::new(2.0, 2.0, 2.0));
        assert!((part.attachments.bottom.as_ref().unwrap().radius - 2.0).abs() < EPS);

        // De onderbuur volgt de onderste pool.
        let bottom_pole = part.node_position(AttachPoint::Bottom).unwrap();
        let shield = rig.assembly.part(rig.below).unwrap();
        assert_vec_close(shield.node_position(AttachPoint::Top).unwrap(), bottom_pole);

        assert_vec_close(position(&rig.assembly, rig.radial), Vec3::new(0.9, -0.1, 0.0));
        assert_vec_close(position(&rig.assembly, rig.tank), Vec3::new(0.0, 0.7, 0.0));

        let module = part.module.as_ref().unwrap();
        assert!((module.case_mass - 0.2).abs() < EPS);
        assert_vec_close(module.parachutes[0].offset, Vec3::new(0.0, 0.2, 0.0));
        let state = part.procedural.as_ref().unwrap();
        assert_eq!((state.size, state.last_size), (1, 1));
    }

    #[test]
    fn bottom_anchored_keeps_bottom_pole_in_place() {
        let mut assembly = Assembly::new();
        let base = assembly.add_part(stack_part("base", Vec3::new(0.0, -0.7, 0.0), 0.5));
        let chute = assembly.add_part(chute(Vec3::ZERO));
        let nose = assembly.add_part(stack_part("nose", Vec3::new(0.0, 0.3, 0.0), 0.1));
        assembly
            .attach_stack(chute, AttachPoint::Bottom, base, AttachPoint::Top)
            .unwrap();
        assembly
            .attach_stack(nose, AttachPoint::Bottom, chute, AttachPoint::Top)
            .unwrap();
        let catalog = catalog();
        let bottom_before = assembly.part(chute).unwrap().node_position(AttachPoint::Bottom).unwrap();

        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut assembly, chute, 2)
            .unwrap();
        assert_eq!(outcome.report().unwrap().role, Role::AnchoredAtBottom);

        let part = assembly.part(chute).unwrap();
        assert_vec_close(part.node_position(AttachPoint::Bottom).unwrap(), bottom_before);
        let top_pole = part.node_position(AttachPoint::Top).unwrap();
        let nose_part = assembly.part(nose).unwrap();
        assert_vec_close(nose_part.node_position(AttachPoint::Bottom).unwrap(), top_pole);
        assert_vec_close(position(&assembly, base), Vec3::new(0.0, -0.7, 0.0));
    }

    #[test]
    fn root_keeps_its_origin() {
        let mut assembly = Assembly::new();
        let chute = assembly.add_part(chute(Vec3::new(1.0, 2.0, 3.0)));
        let up = assembly.add_part(stack_part("up", Vec3::new(1.0, 2.3, 3.0), 0.1));
        let down = assembly.add_part(stack_part("down", Vec3::new(1.0, 1.7, 3.0), 0.1));
        let deep = assembly.add_part(stack_part("deep", Vec3::new(1.0, 1.5, 3.0), 0.1));
        assembly
            .attach_stack(up, AttachPoint::Bottom, chute, AttachPoint::Top)
            .unwrap();
        assembly
            .attach_stack(down, AttachPoint::Top, chute, AttachPoint::Bottom)
            .unwrap();
        assembly
            .attach_stack(deep, AttachPoint::Top, down, AttachPoint::Bottom)
            .unwrap();
        let catalog = catalog();

        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut assembly, chute, 1)
            .unwrap();
        assert_eq!(outcome.report().unwrap().role, Role::Root);

        assert_vec_close(position(&assembly, chute), Vec3::new(1.0, 2.0, 3.0));
        assert_vec_close(position(&assembly, up), Vec3::new(1.0, 2.5, 3.0));
        assert_vec_close(position(&assembly, down), Vec3::new(1.0, 1.5, 3.0));
        assert_vec_close(position(&assembly, deep), Vec3::new(1.0, 1.3, 3.0));
    }

    #[test]
    fn second_resize_to_same_size_is_unchanged() {
        let mut rig = hanging_rig();
        let catalog = catalog();
        let engine = PropagationEngine::new(&catalog);

        engine.apply_resize(&mut rig.assembly, rig.chute, 2).unwrap();
        let snapshot: Vec<Vec3> = rig.assembly.parts().map(|(_, p)| p.position).collect();

        let outcome = engine.apply_resize(&mut rig.assembly, rig.chute, 2).unwrap();
        assert_eq!(outcome, ResizeOutcome::Unchanged);
        let after: Vec<Vec3> = rig.assembly.parts().map(|(_, p)| p.position).collect();
        assert_eq!(snapshot, after);
    }

    #[test]
    fn missing_base_dimensions_mutate_nothing() {
        let mut rig = hanging_rig();
        if let Some(chute) = rig
            .assembly
            .part_mut(rig.chute)
            .and_then(|p| p.procedural.as_mut())
        {
            chute.original_size = None;
        }
        let catalog = catalog();
        let before: Vec<(Vec3, Vec3)> = rig
            .assembly
            .parts()
            .map(|(_, p)| (p.position, p.model_scale))
            .collect();

        let result = PropagationEngine::new(&catalog).apply_resize(&mut rig.assembly, rig.chute, 1);
        assert_eq!(result, Err(ResizeError::NotInitialized(rig.chute)));

        let after: Vec<(Vec3, Vec3)> = rig
            .assembly
            .parts()
            .map(|(_, p)| (p.position, p.model_scale))
            .collect();
        assert_eq!(before, after);
        let state = rig.assembly.part(rig.chute).unwrap().procedural.as_ref().unwrap();
        assert_eq!((state.size, state.last_size), (0, 0));
    }

    #[test]
    fn stale_neighbours_are_reported_and_skipped() {
        let mut rig = hanging_rig();
        rig.assembly.remove_part(rig.below);
        let catalog = catalog();

        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut rig.assembly, rig.chute, 1)
            .unwrap();
        let report = outcome.report().unwrap();

        assert!(report.stale.contains(&StaleReference {
            holder: rig.chute,
            target: rig.below,
            link: Link::Node(AttachPoint::Bottom),
        }));
        assert!(report.stale.iter().any(|s| s.link == Link::Child));
        assert_vec_close(position(&rig.assembly, rig.radial), Vec3::new(0.9, -0.1, 0.0));
    }

    #[test]
    fn stale_parent_makes_the_part_root() {
        let mut rig = hanging_rig();
        rig.assembly.remove_part(rig.tank);
        let catalog = catalog();

        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut rig.assembly, rig.chute, 1)
            .unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.role, Role::Root);
        let parent_refs: Vec<Link> = report
            .stale
            .iter()
            .filter(|s| s.target == rig.tank)
            .map(|s| s.link)
            .collect();
        assert_eq!(parent_refs, vec![Link::Parent]);
        assert_vec_close(position(&rig.assembly, rig.chute), Vec3::ZERO);
    }

    /// Root met een boven- en onderbuur; maatcatalogus die alleen X en Z verdubbelt.
    fn widening_root() -> (Assembly, PartId, PartId, PartId, SizeCatalog) {
        let narrow = SizeRecord::uniform("narrow", Vec3::ONE, 1.0);
        let wide = SizeRecord::uniform("wide", Vec3::new(2.0, 1.0, 2.0), 1.0);
        let mut catalog = SizeCatalog::new();
        catalog.register("RC_stack", vec![narrow, wide]);

        let mut procedural = ProceduralChute::new();
        procedural.original_size = Some(Vec3::ONE);
        procedural.initiated = true;
        let mut assembly = Assembly::new();
        let chute = assembly.add_part(stack_part("RC_stack", Vec3::ZERO, 1.0).with_procedural(procedural));
        let up = assembly.add_part(stack_part("up", Vec3::new(0.0, 1.5, 0.0), 0.5));
        let down = assembly.add_part(stack_part("down", Vec3::new(0.0, -1.5, 0.0), 0.5));
        assembly
            .attach_stack(up, AttachPoint::Bottom, chute, AttachPoint::Top)
            .unwrap();
        assembly
            .attach_stack(down, AttachPoint::Top, chute, AttachPoint::Bottom)
            .unwrap();
        (assembly, chute, up, down, catalog)
    }

    #[test]
    fn widening_a_root_moves_no_pole() {
        let (mut assembly, chute, up, down, catalog) = widening_root();

        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut assembly, chute, 1)
            .unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.role, Role::Root);
        assert_vec_close(report.scale, Vec3::new(2.0, 1.0, 2.0));
        assert_vec_close(report.top_delta, Vec3::ZERO);
        assert_vec_close(report.bottom_delta, Vec3::ZERO);
        assert!(report.stale.is_empty());

        assert_vec_close(assembly.part(chute).unwrap().model_scale, Vec3::new(2.0, 1.0, 2.0));
        assert_vec_close(position(&assembly, chute), Vec3::ZERO);
        assert_vec_close(position(&assembly, up), Vec3::new(0.0, 1.5, 0.0));
        assert_vec_close(position(&assembly, down), Vec3::new(0.0, -1.5, 0.0));
    }

    #[test]
    fn widening_a_root_with_a_removed_top_neighbour() {
        let (mut assembly, chute, up, down, catalog) = widening_root();
        assembly.remove_part(up);

        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut assembly, chute, 1)
            .unwrap();
        let report = outcome.report().unwrap();
        assert!(report.stale.contains(&StaleReference {
            holder: chute,
            target: up,
            link: Link::Node(AttachPoint::Top),
        }));
        assert_vec_close(assembly.part(chute).unwrap().model_scale, Vec3::new(2.0, 1.0, 2.0));
        assert_vec_close(report.top_delta, Vec3::ZERO);
        assert_vec_close(position(&assembly, down), Vec3::new(0.0, -1.5, 0.0));
    }

    #[test]
    fn removed_top_neighbour_still_moves_the_bottom_side() {
        let mut assembly = Assembly::new();
        let chute = assembly.add_part(chute(Vec3::ZERO));
        let up = assembly.add_part(stack_part("up", Vec3::new(0.0, 0.3, 0.0), 0.1));
        let down = assembly.add_part(stack_part("down", Vec3::new(0.0, -0.3, 0.0), 0.1));
        assembly
            .attach_stack(up, AttachPoint::Bottom, chute, AttachPoint::Top)
            .unwrap();
        assembly
            .attach_stack(down, AttachPoint::Top, chute, AttachPoint::Bottom)
            .unwrap();
        assembly.remove_part(up);
        let catalog = catalog();

        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut assembly, chute, 1)
            .unwrap();
        let report = outcome.report().unwrap();
        assert_eq!(report.role, Role::Root);
        assert!(report.stale.contains(&StaleReference {
            holder: chute,
            target: up,
            link: Link::Node(AttachPoint::Top),
        }));
        assert_vec_close(assembly.part(chute).unwrap().model_scale, Vec3::new(2.0, 2.0, 2.0));
        assert_vec_close(position(&assembly, down), Vec3::new(0.0, -0.5, 0.0));
        let bottom_pole = assembly.part(chute).unwrap().node_position(AttachPoint::Bottom).unwrap();
        assert_vec_close(
            assembly.part(down).unwrap().node_position(AttachPoint::Top).unwrap(),
            bottom_pole,
        );
    }

    #[test]
    fn out_of_range_and_empty_catalog_are_ignored() {
        let mut rig = hanging_rig();
        let catalog = catalog();
        let outcome = PropagationEngine::new(&catalog)
            .apply_resize(&mut rig.assembly, rig.chute, 7)
            .unwrap();
        assert_eq!(
            outcome,
            ResizeOutcome::Ignored(IgnoreReason::IndexOutOfRange { index: 7, len: 3 })
        );

        let empty = SizeCatalog::new();
        let outcome = PropagationEngine::new(&empty)
            .apply_resize(&mut rig.assembly, rig.chute, 1)
            .unwrap();
        assert_eq!(outcome, ResizeOutcome::Ignored(IgnoreReason::EmptyCatalog));
        assert_vec_close(position(&rig.assembly, rig.below), Vec3::new(0.0, -0.3, 0.0));
    }
}
