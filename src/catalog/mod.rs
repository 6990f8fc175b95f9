//! Maatcatalogus per archetype, plus de tabellen met hemellichamen en kasten.
//!
//! Een catalogus wordt eenmaal per sessie gevuld en daarna alleen gelezen. Hij
//! wordt expliciet doorgegeven aan iedereen die hem nodig heeft.

pub mod bodies;
pub mod cases;

use std::collections::HashMap;

use crate::geom::Vec3;

pub use bodies::{Body, BodyTable};
pub use cases::{CaseCatalog, CaseConfig, CaseLibrary};

/// Een discrete maat van een archetype. Alle offsets binnen een lijst delen
/// het lokale frame van index 0.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeRecord {
    pub size_id: String,
    pub scale: Vec3,
    pub top_offset: Vec3,
    pub top_radius: f64,
    pub bottom_offset: Vec3,
    pub bottom_radius: f64,
    pub case_mass: f64,
    pub cost: f64,
}

impl SizeRecord {
    /// Maat met identieke schaal en symmetrische polen op `+/- half_height`.
    #[must_use]
    pub fn uniform(size_id: impl Into<String>, scale: Vec3, half_height: f64) -> Self {
        Self {
            size_id: size_id.into(),
            scale,
            top_offset: Vec3::new(0.0, half_height, 0.0),
            top_radius: 1.0,
            bottom_offset: Vec3::new(0.0, -half_height, 0.0),
            bottom_radius: 1.0,
            case_mass: 0.0,
            cost: 0.0,
        }
    }
}

/// Geordende maatlijsten per archetype.
#[derive(Debug, Clone, Default)]
pub struct SizeCatalog {
    entries: HashMap<String, Vec<SizeRecord>>,
}

impl SizeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registreer de maten van een archetype. De eerste niet-lege registratie
    /// wint; latere registraties voor hetzelfde archetype worden genegeerd.
    pub fn register(&mut self, archetype: &str, sizes: Vec<SizeRecord>) -> bool {
        if sizes.is_empty() {
            return false;
        }

        let key = archetype_key(archetype);
        if self.entries.contains_key(&key) {
            log::debug!("maten voor `{key}` waren al geregistreerd");
            return false;
        }

        log::debug!("{} maten geregistreerd voor `{key}`", sizes.len());
        self.entries.insert(key, sizes);
        true
    }

    /// Maten van een archetype; leeg als er geen alternatieve maten zijn.
    #[must_use]
    pub fn sizes(&self, archetype: &str) -> &[SizeRecord] {
        self.entries
            .get(&archetype_key(archetype))
            .map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn get(&self, archetype: &str, index: usize) -> Option<&SizeRecord> {
        self.sizes(archetype).get(index)
    }

    #[must_use]
    pub fn index_of(&self, archetype: &str, size_id: &str) -> Option<usize> {
        self.sizes(archetype)
            .iter()
            .position(|record| record.size_id == size_id)
    }

    /// Het maat-id dat het dichtst bij `size_id` ligt, voor foutmeldingen.
    #[must_use]
    pub fn closest_size_id(&self, archetype: &str, size_id: &str) -> Option<&str> {
        self.sizes(archetype)
            .iter()
            .map(|record| (levenshtein::levenshtein(&record.size_id, size_id), record))
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, record)| record.size_id.as_str())
    }

    pub fn archetypes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normaliseer een onderdeelnaam naar de catalogussleutel. Gekloonde
/// onderdelen dragen een of meer `(Clone)` achtervoegsels.
#[must_use]
pub fn archetype_key(name: &str) -> String {
    let mut key = name.trim();
    while let Some(stripped) = key.strip_suffix("(Clone)") {
        key = stripped.trim_end();
    }
    key.to_owned()
}
