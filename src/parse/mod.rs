//! Inlezen en wegschrijven van de XML-documenten: configuratie, voertuig en
//! bewaarde status.

pub mod config_xml;
pub mod craft_xml;
pub mod persist_xml;

use thiserror::Error;

use crate::assembly::AssemblyError;
use crate::geom::ParseVec3Error;

/// Result type voor alle parsers in deze module.
pub type ParseResult<T> = Result<T, ParseError>;

/// Beschrijft fouten tijdens het parsen.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Het XML-document kon niet gelezen of geschreven worden.
    #[error("XML fout: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// Een vector-attribuut was onleesbaar.
    #[error("ongeldige vector: {0}")]
    Vector(#[from] ParseVec3Error),
    /// Het voertuig verwijst naar iets dat niet bestaat.
    #[error("ongeldige voertuigreferentie: {0}")]
    Craft(String),
    /// Onbekend documenttype.
    #[error("onbekend document: {0}")]
    Document(String),
}

impl From<AssemblyError> for ParseError {
    fn from(err: AssemblyError) -> Self {
        Self::Craft(err.to_string())
    }
}

/// Verwijder BOM, witruimte en een eventuele `<?xml ...?>` declaratie.
pub(crate) fn strip_xml_preamble(input: &str) -> &str {
    let trimmed = input.trim_start_matches(|c: char| c == '\u{feff}' || c.is_whitespace());
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(idx) = rest.find("?>") {
            return rest[idx + 2..].trim_start();
        }
    }
    trimmed
}

/// Controleer dat het document met de verwachte root begint.
pub(crate) fn expect_root<'a>(input: &'a str, root: &str) -> ParseResult<&'a str> {
    let body = strip_xml_preamble(input);
    let prefix: String = body.chars().take(root.len() + 1).collect::<String>().to_lowercase();
    if prefix.starts_with(&format!("<{root}")) {
        Ok(body)
    } else {
        Err(ParseError::Document(format!("geen <{root}> root gevonden")))
    }
}
