//! De assemblage: een arena van onderdelen met zwakke verwijzingen.
//!
//! De host mag de boom tussen twee frames wijzigen (verwijderen, herbevestigen,
//! spiegelen). Verwijzingen tussen onderdelen zijn daarom generatie-handles die
//! bij elk gebruik opnieuw gecontroleerd worden.

pub mod part;
pub mod traverse;

use thiserror::Error;

use crate::geom::Vec3;

pub use part::{AttachMode, AttachNode, AttachPoint, AttachmentPointSet, ParentLink, Part, PartId};

/// Fouten die kunnen optreden bij het opbouwen van de assemblage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("onderdeel {0} bestaat niet (meer) in de assemblage")]
    UnknownPart(PartId),
    #[error("onderdeel {part} heeft geen {point}-punt")]
    MissingAttachNode { part: PartId, point: AttachPoint },
    #[error("het {point}-punt van onderdeel {part} is al bezet")]
    NodeOccupied { part: PartId, point: AttachPoint },
    #[error("onderdeel {0} hangt al aan een ouder")]
    AlreadyAttached(PartId),
    #[error("onderdeel {0} kan niet aan zichzelf of een eigen afstammeling hangen")]
    WouldCreateCycle(PartId),
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    part: Option<Part>,
}

/// Arena met alle onderdelen van een voertuig.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl Assembly {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Voeg een onderdeel toe en geef de handle terug. Vrijgekomen slots worden
    /// hergebruikt met een verhoogde generatie.
    pub fn add_part(&mut self, part: Part) -> PartId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.part = Some(part);
            return PartId::new(index, slot.generation);
        }

        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            part: Some(part),
        });
        PartId::new(index, 0)
    }

    /// Verwijder een onderdeel. Verwijzingen die andere onderdelen nog naar dit
    /// onderdeel hebben blijven staan en worden daarmee verouderd.
    pub fn remove_part(&mut self, id: PartId) -> Option<Part> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }

        let part = slot.part.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        log::debug!("onderdeel {id} verwijderd");
        Some(part)
    }

    /// Controleer of een handle nog naar een levend onderdeel wijst.
    #[must_use]
    pub fn contains(&self, id: PartId) -> bool {
        self.part(id).is_some()
    }

    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.part.as_ref())
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.part.as_mut())
    }

    /// Alle levende onderdelen in slotvolgorde.
    pub fn parts(&self) -> impl Iterator<Item = (PartId, &Part)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.part.as_ref().map(|part| {
                (
                    PartId::new(u32::try_from(index).unwrap_or(u32::MAX), slot.generation),
                    part,
                )
            })
        })
    }

    #[must_use]
    pub fn part_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.part.is_some()).count()
    }

    /// Het eerste onderdeel zonder ouder.
    #[must_use]
    pub fn root(&self) -> Option<PartId> {
        self.parts()
            .find(|(_, part)| part.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Ruwe ouderverwijzing; kan naar een verwijderd onderdeel wijzen.
    #[must_use]
    pub fn parent_of(&self, id: PartId) -> Option<ParentLink> {
        self.part(id).and_then(Part::parent)
    }

    /// Ruwe kindverwijzingen; elk element kan verouderd zijn.
    #[must_use]
    pub fn children_of(&self, id: PartId) -> &[PartId] {
        self.part(id).map_or(&[], Part::children)
    }

    /// Levende kinderen die op het oppervlak van `id` hangen.
    #[must_use]
    pub fn surface_children(&self, id: PartId) -> Vec<PartId> {
        self.children_of(id)
            .iter()
            .copied()
            .filter(|child| {
                self.part(*child)
                    .and_then(Part::parent)
                    .is_some_and(|link| link.parent == id && link.mode == AttachMode::Surface)
            })
            .collect()
    }

    /// Controleer een handle; `None` als het onderdeel verdwenen is.
    #[must_use]
    pub fn resolve(&self, id: PartId) -> Option<PartId> {
        self.contains(id).then_some(id)
    }

    /// Hang `child` met zijn `child_point` aan het `parent_point` van `parent`.
    pub fn attach_stack(
        &mut self,
        child: PartId,
        child_point: AttachPoint,
        parent: PartId,
        parent_point: AttachPoint,
    ) -> Result<(), AssemblyError> {
        self.check_attachable(child, parent)?;
        self.check_free_node(child, child_point)?;
        self.check_free_node(parent, parent_point)?;

        if let Some(node) = self
            .part_mut(child)
            .and_then(|part| part.attachments.get_mut(child_point))
        {
            node.attached = Some(parent);
        }
        if let Some(node) = self
            .part_mut(parent)
            .and_then(|part| part.attachments.get_mut(parent_point))
        {
            node.attached = Some(child);
        }

        self.link(child, parent, AttachMode::Stack { parent_point });
        Ok(())
    }

    /// Hang `child` zijdelings op het oppervlak van `parent`.
    pub fn attach_surface(&mut self, child: PartId, parent: PartId) -> Result<(), AssemblyError> {
        self.check_attachable(child, parent)?;
        self.link(child, parent, AttachMode::Surface);
        Ok(())
    }

    /// Koppel een onderdeel netjes los van zijn ouder.
    pub fn detach(&mut self, child: PartId) -> Result<(), AssemblyError> {
        let link = self
            .part(child)
            .ok_or(AssemblyError::UnknownPart(child))?
            .parent;
        let Some(link) = link else {
            return Ok(());
        };

        if let Some(parent) = self.part_mut(link.parent) {
            parent.children.retain(|id| *id != child);
            if let Some(point) = parent.attachments.point_holding(child) {
                if let Some(node) = parent.attachments.get_mut(point) {
                    node.attached = None;
                }
            }
        }

        if let Some(part) = self.part_mut(child) {
            part.parent = None;
            if let Some(point) = part.attachments.point_holding(link.parent) {
                if let Some(node) = part.attachments.get_mut(point) {
                    node.attached = None;
                }
            }
        }

        Ok(())
    }

    /// Markeer een groep onderdelen als elkaars symmetrische tegenhangers.
    pub fn set_symmetry(&mut self, group: &[PartId]) -> Result<(), AssemblyError> {
        if let Some(missing) = group.iter().find(|id| !self.contains(**id)) {
            return Err(AssemblyError::UnknownPart(*missing));
        }

        for id in group {
            let others: Vec<PartId> = group.iter().copied().filter(|other| other != id).collect();
            if let Some(part) = self.part_mut(*id) {
                part.symmetry = others;
            }
        }
        Ok(())
    }

    /// Verschuif een enkel onderdeel.
    pub fn translate(&mut self, id: PartId, delta: Vec3) -> Result<(), AssemblyError> {
        let part = self.part_mut(id).ok_or(AssemblyError::UnknownPart(id))?;
        part.position += delta;
        Ok(())
    }

    fn link(&mut self, child: PartId, parent: PartId, mode: AttachMode) {
        if let Some(part) = self.part_mut(child) {
            part.parent = Some(ParentLink { parent, mode });
        }
        if let Some(part) = self.part_mut(parent) {
            part.children.push(child);
        }
    }

    fn check_attachable(&self, child: PartId, parent: PartId) -> Result<(), AssemblyError> {
        let child_part = self.part(child).ok_or(AssemblyError::UnknownPart(child))?;
        if !self.contains(parent) {
            return Err(AssemblyError::UnknownPart(parent));
        }
        if child_part.parent.is_some() {
            return Err(AssemblyError::AlreadyAttached(child));
        }
        if child == parent || traverse::descendants(self, child).ids.contains(&parent) {
            return Err(AssemblyError::WouldCreateCycle(child));
        }
        Ok(())
    }

    fn check_free_node(&self, part: PartId, point: AttachPoint) -> Result<(), AssemblyError> {
        let node = self
            .part(part)
            .ok_or(AssemblyError::UnknownPart(part))?
            .attachments
            .get(point)
            .ok_or(AssemblyError::MissingAttachNode { part, point })?;

        match node.attached {
            Some(existing) if self.contains(existing) => {
                Err(AssemblyError::NodeOccupied { part, point })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pole_part(name: &str) -> Part {
        Part::new(name)
            .with_node(AttachPoint::Top, Vec3::Y, 1.25)
            .with_node(AttachPoint::Bottom, -Vec3::Y, 1.25)
    }

    #[test]
    fn removed_handles_no_longer_resolve() {
        let mut assembly = Assembly::new();
        let id = assembly.add_part(pole_part("a"));
        assert!(assembly.contains(id));

        assert!(assembly.remove_part(id).is_some());
        assert!(!assembly.contains(id));

        let reused = assembly.add_part(pole_part("b"));
        assert_eq!(reused.index(), id.index());
        assert_ne!(reused.generation(), id.generation());
        assert!(assembly.part(id).is_none());
        assert_eq!(assembly.part(reused).map(|p| p.name.as_str()), Some("b"));
    }

    #[test]
    fn stack_attachment_links_both_sides() {
        let mut assembly = Assembly::new();
        let root = assembly.add_part(pole_part("root"));
        let child = assembly.add_part(pole_part("child"));

        assembly
            .attach_stack(child, AttachPoint::Top, root, AttachPoint::Bottom)
            .unwrap();

        let link = assembly.parent_of(child).unwrap();
        assert_eq!(link.parent, root);
        assert_eq!(
            link.mode,
            AttachMode::Stack {
                parent_point: AttachPoint::Bottom
            }
        );
        assert_eq!(assembly.children_of(root), [child]);
        assert_eq!(
            assembly.part(root).unwrap().attachments.bottom.as_ref().unwrap().attached,
            Some(child)
        );
        assert_eq!(
            assembly.part(child).unwrap().attachments.point_holding(root),
            Some(AttachPoint::Top)
        );
        assert_eq!(assembly.root(), Some(root));
    }

    #[test]
    fn occupied_and_missing_nodes_are_rejected() {
        let mut assembly = Assembly::new();
        let root = assembly.add_part(pole_part("root"));
        let first = assembly.add_part(pole_part("first"));
        let second = assembly.add_part(pole_part("second"));
        let bare = assembly.add_part(Part::new("bare"));

        assembly
            .attach_stack(first, AttachPoint::Top, root, AttachPoint::Bottom)
            .unwrap();
        assert_eq!(
            assembly.attach_stack(second, AttachPoint::Top, root, AttachPoint::Bottom),
            Err(AssemblyError::NodeOccupied {
                part: root,
                point: AttachPoint::Bottom
            })
        );
        assert_eq!(
            assembly.attach_stack(bare, AttachPoint::Top, root, AttachPoint::Top),
            Err(AssemblyError::MissingAttachNode {
                part: bare,
                point: AttachPoint::Top
            })
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let mut assembly = Assembly::new();
        let root = assembly.add_part(pole_part("root"));
        let child = assembly.add_part(pole_part("child"));
        assembly.attach_surface(child, root).unwrap();

        assert_eq!(
            assembly.attach_surface(root, child),
            Err(AssemblyError::WouldCreateCycle(root))
        );
    }

    #[test]
    fn surface_children_skip_stack_and_stale_children() {
        let mut assembly = Assembly::new();
        let root = assembly.add_part(pole_part("root"));
        let stacked = assembly.add_part(pole_part("stacked"));
        let radial = assembly.add_part(pole_part("radial"));
        let gone = assembly.add_part(pole_part("gone"));
        assembly
            .attach_stack(stacked, AttachPoint::Top, root, AttachPoint::Bottom)
            .unwrap();
        assembly.attach_surface(radial, root).unwrap();
        assembly.attach_surface(gone, root).unwrap();
        assembly.remove_part(gone);

        assert_eq!(assembly.surface_children(root), vec![radial]);
        assert_eq!(assembly.resolve(radial), Some(radial));
        assert_eq!(assembly.resolve(gone), None);
    }

    #[test]
    fn detach_clears_both_sides() {
        let mut assembly = Assembly::new();
        let root = assembly.add_part(pole_part("root"));
        let child = assembly.add_part(pole_part("child"));
        assembly
            .attach_stack(child, AttachPoint::Bottom, root, AttachPoint::Top)
            .unwrap();

        assembly.detach(child).unwrap();

        assert!(assembly.parent_of(child).is_none());
        assert!(assembly.children_of(root).is_empty());
        assert!(assembly.part(root).unwrap().attachments.top.as_ref().unwrap().attached.is_none());
    }

    #[test]
    fn symmetry_groups_exclude_self() {
        let mut assembly = Assembly::new();
        let a = assembly.add_part(pole_part("a"));
        let b = assembly.add_part(pole_part("b"));
        let c = assembly.add_part(pole_part("c"));

        assembly.set_symmetry(&[a, b, c]).unwrap();
        assert_eq!(assembly.part(a).unwrap().symmetry_counterparts(), [b, c]);
        assert_eq!(assembly.part(c).unwrap().symmetry_counterparts(), [a, b]);
    }
}
