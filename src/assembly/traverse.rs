//! Doorlopen van deelbomen.

use std::collections::HashSet;

use super::{Assembly, PartId};

/// Resultaat van het verzamelen van alle afstammelingen van een onderdeel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Subtree {
    /// Levende afstammelingen in diepte-eerst volgorde, zonder de wortel.
    pub ids: Vec<PartId>,
    /// Kindverwijzingen die niet meer resolveren: `(houder, kind)`.
    pub stale: Vec<(PartId, PartId)>,
}

/// Verzamel alle afstammelingen van `root` (exclusief `root` zelf).
///
/// Verouderde kindverwijzingen worden overgeslagen en gerapporteerd. Een
/// onderdeel wordt hooguit een keer bezocht, ook als de host de boom in een
/// inconsistente staat achterliet.
#[must_use]
pub fn descendants(assembly: &Assembly, root: PartId) -> Subtree {
    let mut subtree = Subtree::default();
    let mut visited: HashSet<PartId> = HashSet::new();
    visited.insert(root);

    let mut stack: Vec<PartId> = assembly.children_of(root).iter().rev().copied().collect();
    let mut holders: Vec<PartId> = vec![root; stack.len()];

    while let Some(id) = stack.pop() {
        let holder = holders.pop().unwrap_or(root);
        if !assembly.contains(id) {
            subtree.stale.push((holder, id));
            continue;
        }
        if !visited.insert(id) {
            continue;
        }

        subtree.ids.push(id);
        for child in assembly.children_of(id).iter().rev() {
            stack.push(*child);
            holders.push(id);
        }
    }

    subtree
}

/// Verzamel `root` en al zijn afstammelingen.
#[must_use]
pub fn with_descendants(assembly: &Assembly, root: PartId) -> Subtree {
    let mut subtree = descendants(assembly, root);
    if assembly.contains(root) {
        subtree.ids.insert(0, root);
    } else {
        subtree.ids.clear();
    }
    subtree
}
