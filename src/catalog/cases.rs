//! Kasttexturen per texturenbibliotheek. Alleen namen en types; het laden van
//! de texturen zelf is aan de host.

use std::collections::HashMap;

/// Naam van de bibliotheek die aangeeft dat een onderdeel geen texturen kent.
pub const NO_LIBRARY: &str = "none";

/// Een kast met de archetype-types waarop hij past.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseConfig {
    pub name: String,
    pub types: Vec<String>,
    pub texture_url: String,
}

/// Eén texturenbibliotheek.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseCatalog {
    pub name: String,
    cases: Vec<CaseConfig>,
}

impl CaseCatalog {
    #[must_use]
    pub fn new(name: impl Into<String>, cases: Vec<CaseConfig>) -> Self {
        Self {
            name: name.into(),
            cases,
        }
    }

    #[must_use]
    pub fn index_of(&self, case_name: &str) -> Option<usize> {
        self.cases.iter().position(|case| case.name == case_name)
    }

    #[must_use]
    pub fn contains(&self, case_name: &str) -> bool {
        self.index_of(case_name).is_some()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&CaseConfig> {
        self.cases.get(index)
    }

    /// Kastnamen die bij het gegeven type passen.
    pub fn names_for_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.cases
            .iter()
            .filter(move |case| case.types.iter().any(|t| t == kind))
            .map(|case| case.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Alle bekende texturenbibliotheken, op naam.
#[derive(Debug, Clone, Default)]
pub struct CaseLibrary {
    libraries: HashMap<String, CaseCatalog>,
}

impl CaseLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, catalog: CaseCatalog) {
        self.libraries.insert(catalog.name.clone(), catalog);
    }

    /// De bibliotheek met de gegeven naam; `"none"` levert nooit iets op.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CaseCatalog> {
        if name == NO_LIBRARY {
            return None;
        }
        self.libraries.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::{CaseCatalog, CaseConfig, CaseLibrary};

    fn case(name: &str, types: &[&str]) -> CaseConfig {
        CaseConfig {
            name: name.to_owned(),
            types: types.iter().map(|t| (*t).to_owned()).collect(),
            texture_url: format!("RealChute/Parts/{name}"),
        }
    }

    #[test]
    fn filters_cases_by_type() {
        let catalog = CaseCatalog::new(
            "RealChute",
            vec![case("Blue", &["Cone", "Box"]), case("Stack", &["Stack"])],
        );
        let cone: Vec<&str> = catalog.names_for_type("Cone").collect();
        assert_eq!(cone, vec!["Blue"]);
        assert_eq!(catalog.index_of("Stack"), Some(1));
    }

    #[test]
    fn none_library_is_never_resolved() {
        let mut library = CaseLibrary::new();
        library.insert(CaseCatalog::new("none", vec![case("Blue", &["Cone"])]));
        library.insert(CaseCatalog::new("RealChute", Vec::new()));
        assert!(library.get("none").is_none());
        assert!(library.get("RealChute").is_some());
    }
}
