//! Validatie van de bewerkbare tekstvelden.
//!
//! Validatie stopt nooit bij de eerste fout: elk ongeldig veld levert precies
//! één fout op, in declaratievolgorde, zodat de host de volledige lijst toont.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::{Body, BodyTable};
use crate::chute::ProceduralChute;

pub const TIMER_RANGE: (f64, f64) = (0.0, 3600.0);
pub const SPARES_RANGE: (f64, f64) = (-1.0, 10.0);
pub const CUT_SPEED_RANGE: (f64, f64) = (0.01, 100.0);

/// Parameter van één parachutesjabloon die niet door de validatie kwam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChuteParameter {
    PreDeployedDiameter,
    DeployedDiameter,
    PreDeploymentPressure,
    PreDeploymentAltitude,
    DeploymentAltitude,
    CutAltitude,
    PreDeploymentSpeed,
    DeploymentSpeed,
}

impl ChuteParameter {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreDeployedDiameter => "Predeployed diameter",
            Self::DeployedDiameter => "Deployed diameter",
            Self::PreDeploymentPressure => "Predeployment pressure",
            Self::PreDeploymentAltitude => "Predeployment altitude",
            Self::DeploymentAltitude => "Deployment altitude",
            Self::CutAltitude => "Autocut altitude",
            Self::PreDeploymentSpeed => "Predeployment speed",
            Self::DeploymentSpeed => "Deployment speed",
        }
    }
}

/// Het veld waar een fout bij hoort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Timer,
    SpareCount,
    CutSpeed,
    LandingAltitude,
    ChuteSpecific {
        chute: usize,
        parameter: ChuteParameter,
    },
}

impl Field {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Timer => "Deployment timer",
            Self::SpareCount => "Spare chutes",
            Self::CutSpeed => "Autocut speed",
            Self::LandingAltitude => "Landing altitude",
            Self::ChuteSpecific { parameter, .. } => parameter.label(),
        }
    }
}

/// Eén benoemde invoerfout. Wordt op verzoek herberekend, nooit opgeslagen.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: Field) -> Self {
        Self {
            field,
            message: field.label().to_owned(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Welke groep fouten verzameld wordt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    General,
    Primary,
    Secondary,
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(Self::General),
            "primary" | "main" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            other => Err(format!("onbekende validatiegroep `{other}`")),
        }
    }
}

/// Verzamelt veldfouten van een procedurele parachute en zijn sjablonen.
#[derive(Debug, Clone, Copy)]
pub struct ValidationAggregator<'a> {
    bodies: &'a BodyTable,
}

impl<'a> ValidationAggregator<'a> {
    #[must_use]
    pub fn new(bodies: &'a BodyTable) -> Self {
        Self { bodies }
    }

    /// Fouten van één groep. Primary en Secondary bevatten allebei elk
    /// parachutesjabloon, in sjabloonvolgorde.
    #[must_use]
    pub fn errors(&self, chute: &ProceduralChute, scope: Scope) -> Vec<ValidationError> {
        let body = self.body(chute);
        match scope {
            Scope::General => general_errors(chute, &body),
            Scope::Primary | Scope::Secondary => chute
                .chutes
                .iter()
                .flat_map(|template| template.errors(&body))
                .collect(),
        }
    }

    /// De vereniging die elke commit bewaakt: eerst de algemene fouten, dan
    /// die van de sjablonen. Secondary herhaalt dezelfde sjablonen en voegt
    /// hier dus niets toe, met of zonder tweede parachute.
    #[must_use]
    pub fn gate_errors(&self, chute: &ProceduralChute) -> Vec<ValidationError> {
        let mut errors = self.errors(chute, Scope::General);
        errors.extend(self.errors(chute, Scope::Primary));
        errors
    }

    fn body(&self, chute: &ProceduralChute) -> Body {
        self.bodies
            .get(chute.planet)
            .cloned()
            .unwrap_or_else(Body::kerbin)
    }
}

fn general_errors(chute: &ProceduralChute, body: &Body) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !parse_time(&chute.timer).is_some_and(|t| in_range(t, TIMER_RANGE.0, TIMER_RANGE.1)) {
        errors.push(ValidationError::new(Field::Timer));
    }

    let spares_ok = parse_with_empty(&chute.spares)
        .is_some_and(|v| in_range(v, SPARES_RANGE.0, SPARES_RANGE.1) && is_whole(v));
    if !spares_ok {
        errors.push(ValidationError::new(Field::SpareCount));
    }

    if !parse_number(&chute.cut_speed)
        .is_some_and(|v| in_range(v, CUT_SPEED_RANGE.0, CUT_SPEED_RANGE.1))
    {
        errors.push(ValidationError::new(Field::CutSpeed));
    }

    if !parse_number(&chute.landing_alt).is_some_and(|v| in_range(v, 0.0, body.max_altitude)) {
        errors.push(ValidationError::new(Field::LandingAltitude));
    }

    errors
}

/// Een eindig getal; witruimte eromheen mag.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Als [`parse_number`], maar een leeg veld betekent "onbeperkt" (-1).
#[must_use]
pub fn parse_with_empty(text: &str) -> Option<f64> {
    if text.trim().is_empty() {
        Some(-1.0)
    } else {
        parse_number(text)
    }
}

/// Seconden uit een kaal getal of een getal met eenheid `s`, `m`/`min` of `h`.
#[must_use]
pub fn parse_time(text: &str) -> Option<f64> {
    static TIME: OnceLock<Regex> = OnceLock::new();

    if let Some(seconds) = parse_number(text) {
        return Some(seconds);
    }

    let pattern = TIME.get_or_init(|| {
        Regex::new(r"(?i)^\s*(-?\d+(?:\.\d+)?)\s*(s|m|min|h)\s*$").expect("geldige tijdregex")
    });
    let captures = pattern.captures(text)?;
    let value = parse_number(captures.get(1)?.as_str())?;
    let multiplier = match captures.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "s" => 1.0,
        "m" | "min" => 60.0,
        "h" => 3600.0,
        _ => return None,
    };
    Some(value * multiplier)
}

#[must_use]
pub fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

#[must_use]
pub fn is_whole(value: f64) -> bool {
    value.fract() == 0.0
}
