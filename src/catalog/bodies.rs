//! Tabel met hemellichamen waarop geland kan worden.

/// Een hemellichaam met de grenzen die voor validatie nodig zijn.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub name: String,
    /// Hoogste punt van de atmosfeer, in meters.
    pub max_altitude: f64,
    /// Luchtdruk op zeeniveau, in kPa.
    pub surface_pressure: f64,
}

impl Body {
    #[must_use]
    pub fn new(name: impl Into<String>, max_altitude: f64, surface_pressure: f64) -> Self {
        Self {
            name: name.into(),
            max_altitude,
            surface_pressure,
        }
    }

    #[must_use]
    pub fn kerbin() -> Self {
        Self::new(BodyTable::DEFAULT_BODY, 70_000.0, 101.325)
    }
}

/// Geordende lijst van hemellichamen; de index wordt als `planet` bewaard.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyTable {
    bodies: Vec<Body>,
}

impl BodyTable {
    /// Lichaam dat bij eerste initialisatie geselecteerd wordt.
    pub const DEFAULT_BODY: &'static str = "Kerbin";

    #[must_use]
    pub fn new(bodies: Vec<Body>) -> Self {
        Self { bodies }
    }

    /// De standaardlichamen met een atmosfeer.
    #[must_use]
    pub fn stock() -> Self {
        Self::new(vec![
            Body::kerbin(),
            Body::new("Eve", 90_000.0, 506.625),
            Body::new("Duna", 50_000.0, 6.755),
            Body::new("Jool", 200_000.0, 1519.88),
            Body::new("Laythe", 50_000.0, 60.795),
        ])
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }

    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bodies.iter().position(|body| body.name == name)
    }

    /// Index van het standaardlichaam, of 0 als het niet in de tabel staat.
    #[must_use]
    pub fn default_index(&self) -> usize {
        self.index_of(Self::DEFAULT_BODY).unwrap_or(0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl Default for BodyTable {
    fn default() -> Self {
        Self::stock()
    }
}
