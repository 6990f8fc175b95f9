//! Onderdelen binnen een assemblage en hun bevestigingspunten.

use std::fmt;

use crate::chute::{ChuteModule, ProceduralChute};
use crate::geom::Vec3;

/// Zwakke verwijzing naar een onderdeel: slotindex plus generatie.
///
/// Een handle blijft alleen geldig zolang het slot dezelfde generatie draagt;
/// na het verwijderen van het onderdeel resolveert hij niet meer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PartId {
    index: u32,
    generation: u32,
}

impl PartId {
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Een van de twee polen van een onderdeel.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttachPoint {
    Top,
    Bottom,
}

impl AttachPoint {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }
}

impl fmt::Display for AttachPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("top"),
            Self::Bottom => f.write_str("bottom"),
        }
    }
}

/// Starre bevestiging op een pool.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachNode {
    /// Huidige positie ten opzichte van de oorsprong van het onderdeel.
    pub offset: Vec3,
    /// Positie zoals geladen, voordat er ooit geschaald werd.
    pub original_offset: Vec3,
    /// Vrije straal rond het punt.
    pub radius: f64,
    /// Buur die op dit punt vastzit; kan verouderd zijn.
    pub attached: Option<PartId>,
}

impl AttachNode {
    #[must_use]
    pub fn new(offset: Vec3, radius: f64) -> Self {
        Self {
            offset,
            original_offset: offset,
            radius,
            attached: None,
        }
    }
}

/// De twee polen van een onderdeel. Een onderdeel hoeft niet beide te hebben.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentPointSet {
    pub top: Option<AttachNode>,
    pub bottom: Option<AttachNode>,
}

impl AttachmentPointSet {
    #[must_use]
    pub fn get(&self, point: AttachPoint) -> Option<&AttachNode> {
        match point {
            AttachPoint::Top => self.top.as_ref(),
            AttachPoint::Bottom => self.bottom.as_ref(),
        }
    }

    pub fn get_mut(&mut self, point: AttachPoint) -> Option<&mut AttachNode> {
        match point {
            AttachPoint::Top => self.top.as_mut(),
            AttachPoint::Bottom => self.bottom.as_mut(),
        }
    }

    /// Geeft de pool terug waarop `neighbour` vastzit, als die er is.
    #[must_use]
    pub fn point_holding(&self, neighbour: PartId) -> Option<AttachPoint> {
        [AttachPoint::Top, AttachPoint::Bottom]
            .into_iter()
            .find(|point| self.get(*point).and_then(|node| node.attached) == Some(neighbour))
    }
}

/// Hoe een onderdeel aan zijn ouder hangt.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttachMode {
    /// Pool-op-pool, met de pool van de ouder die gebruikt wordt.
    Stack { parent_point: AttachPoint },
    /// Zijdelings op het oppervlak van de ouder.
    Surface,
}

/// Verwijzing van een onderdeel naar zijn ouder.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParentLink {
    pub parent: PartId,
    pub mode: AttachMode,
}

/// Onderdeel binnen de assemblage.
#[derive(Debug, Clone, Default)]
pub struct Part {
    /// Archetype-naam, sleutel in de maatcatalogus.
    pub name: String,
    /// Positie van de oorsprong in assemblagecoördinaten.
    pub position: Vec3,
    /// Lokale schaal van het model.
    pub model_scale: Vec3,
    pub attachments: AttachmentPointSet,
    /// Oppervlaktebevestigingspunt, lokaal.
    pub surface_node: Vec3,
    /// Aansturende parachutemodule, indien aanwezig.
    pub module: Option<ChuteModule>,
    /// Procedurele maatstatus, indien het onderdeel herschaalbaar is.
    pub procedural: Option<ProceduralChute>,
    pub(crate) parent: Option<ParentLink>,
    pub(crate) children: Vec<PartId>,
    pub(crate) symmetry: Vec<PartId>,
}

impl Part {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_scale: Vec3::ONE,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_model_scale(mut self, scale: Vec3) -> Self {
        self.model_scale = scale;
        self
    }

    #[must_use]
    pub fn with_node(mut self, point: AttachPoint, offset: Vec3, radius: f64) -> Self {
        let node = Some(AttachNode::new(offset, radius));
        match point {
            AttachPoint::Top => self.attachments.top = node,
            AttachPoint::Bottom => self.attachments.bottom = node,
        }
        self
    }

    #[must_use]
    pub fn with_surface_node(mut self, offset: Vec3) -> Self {
        self.surface_node = offset;
        self
    }

    #[must_use]
    pub fn with_module(mut self, module: ChuteModule) -> Self {
        self.module = Some(module);
        self
    }

    #[must_use]
    pub fn with_procedural(mut self, procedural: ProceduralChute) -> Self {
        self.procedural = Some(procedural);
        self
    }

    #[must_use]
    pub fn parent(&self) -> Option<ParentLink> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[PartId] {
        &self.children
    }

    #[must_use]
    pub fn symmetry_counterparts(&self) -> &[PartId] {
        &self.symmetry
    }

    /// Wereldpositie van een pool, indien aanwezig.
    #[must_use]
    pub fn node_position(&self, point: AttachPoint) -> Option<Vec3> {
        self.attachments
            .get(point)
            .map(|node| self.position + node.offset)
    }
}
