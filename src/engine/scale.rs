//! Zuivere afbeelding van een maatwijziging op doelschaal en pooldelta's.

use crate::catalog::SizeRecord;
use crate::geom::Vec3;

/// Doelschaal van het model en hoe ver elke pool verschuift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleResolution {
    pub scale: Vec3,
    pub top_delta: Vec3,
    pub bottom_delta: Vec3,
}

/// Resolver zonder toestand. Alle pooloffsets van een archetype delen het
/// assenstelsel van de eerste maat, dus de delta's zijn gewone verschillen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScaleResolver;

impl ScaleResolver {
    #[must_use]
    pub fn resolve(old: &SizeRecord, new: &SizeRecord, base: Vec3) -> ScaleResolution {
        ScaleResolution {
            scale: base.scale(new.scale),
            top_delta: new.top_offset - old.top_offset,
            bottom_delta: new.bottom_offset - old.bottom_offset,
        }
    }

    /// Nieuwe geaccumuleerde schaal gedeeld door de vorige, per as. Een as
    /// met vorige schaal nul geeft 1.
    #[must_use]
    pub fn ratio(old: &SizeRecord, new: &SizeRecord, base: Vec3) -> Vec3 {
        base.scale(new.scale).ratio(base.scale(old.scale))
    }
}
