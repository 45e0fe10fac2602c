//! User-facing migration options, resolved once at the CLI boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::application::error::{ApplicationError, ApplicationResult};

/// Soil resistance formulation wired into the surface evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoilResistanceModel {
    SakaguckiZeng,
    Sellers,
}

impl SoilResistanceModel {
    /// Evaluator type string the simulator expects.
    pub fn evaluator_type(self) -> &'static str {
        match self {
            Self::SakaguckiZeng => "sakagucki-zeng soil resistance",
            Self::Sellers => "sellers soil resistance",
        }
    }
}

impl FromStr for SoilResistanceModel {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sakagucki-zeng" => Ok(Self::SakaguckiZeng),
            "sellers" => Ok(Self::Sellers),
            _ => Err(ApplicationError::InvalidOption {
                option: "soil resistance model".to_string(),
                value: s.to_string(),
                expected: "one of: sakagucki-zeng, sellers",
            }),
        }
    }
}

impl fmt::Display for SoilResistanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SakaguckiZeng => write!(f, "sakagucki-zeng"),
            Self::Sellers => write!(f, "sellers"),
        }
    }
}

/// Relative permeability evaluator variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelPermModel {
    /// Standard WRM-based relative permeability
    WrmRelPerm,
    /// Frozen-soil variant used for arctic runs
    BrooksCoreyFrozen,
}

impl RelPermModel {
    pub fn evaluator_type(self) -> &'static str {
        match self {
            Self::WrmRelPerm => "WRM rel perm",
            Self::BrooksCoreyFrozen => "Brooks-Corey based high frozen rel perm",
        }
    }
}

/// Desiccated zone thickness setting.
///
/// A bare number applies one thickness everywhere, a sequence matches soil
/// types positionally, and `name=value` pairs match them by name.
#[derive(Debug, Clone, PartialEq)]
pub enum DesiccatedZone {
    Uniform(f64),
    PerIndex(Vec<f64>),
    PerName(BTreeMap<String, f64>),
}

impl Default for DesiccatedZone {
    fn default() -> Self {
        Self::Uniform(0.1)
    }
}

impl DesiccatedZone {
    /// Parse raw CLI tokens: bare numbers, or `name=value` pairs throughout.
    pub fn parse_args(tokens: &[String]) -> ApplicationResult<Self> {
        if tokens.is_empty() {
            return Err(ApplicationError::InvalidOption {
                option: "desiccated zone thickness".to_string(),
                value: String::new(),
                expected: "at least one value",
            });
        }

        if tokens.iter().any(|t| t.contains('=')) {
            let mut by_name = BTreeMap::new();
            for token in tokens {
                let (name, raw) = token.split_once('=').ok_or_else(|| invalid_token(token))?;
                let value = parse_thickness(raw)?;
                if by_name.insert(name.to_string(), value).is_some() {
                    return Err(ApplicationError::InvalidOption {
                        option: "desiccated zone thickness".to_string(),
                        value: token.clone(),
                        expected: "each soil type at most once",
                    });
                }
            }
            return Ok(Self::PerName(by_name));
        }

        let values = tokens
            .iter()
            .map(|t| parse_thickness(t))
            .collect::<ApplicationResult<Vec<f64>>>()?;
        if values.len() == 1 {
            Ok(Self::Uniform(values[0]))
        } else {
            Ok(Self::PerIndex(values))
        }
    }
}

fn invalid_token(token: &str) -> ApplicationError {
    ApplicationError::InvalidOption {
        option: "desiccated zone thickness".to_string(),
        value: token.to_string(),
        expected: "a number in meters, or name=value pairs",
    }
}

fn parse_thickness(raw: &str) -> ApplicationResult<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| invalid_token(raw))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ApplicationError::InvalidOption {
            option: "desiccated zone thickness".to_string(),
            value: raw.to_string(),
            expected: "a non-negative thickness in meters",
        });
    }
    Ok(value)
}

/// Options threaded through one migration run.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOptions {
    pub soil_resistance: SoilResistanceModel,
    pub desiccated_zone: DesiccatedZone,
    /// Arctic runs get the frozen rel perm evaluator plus derived
    /// Brooks-Corey parameters per soil type.
    pub arctic: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            soil_resistance: SoilResistanceModel::SakaguckiZeng,
            desiccated_zone: DesiccatedZone::default(),
            arctic: false,
        }
    }
}
