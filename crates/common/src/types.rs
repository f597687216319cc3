//! Common types used across the Greeks service
//!
//! These are the values that flow from the pricing engine into the cache
//! and out to subscribers.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Option type (Call or Put)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Right to buy the underlying
    Call,
    /// Right to sell the underlying
    Put,
}

impl OptionType {
    /// Parse from the single-letter flag used in contract identifiers
    pub fn from_flag(flag: char) -> Option<Self> {
        match flag {
            'C' => Some(OptionType::Call),
            'P' => Some(OptionType::Put),
            _ => None,
        }
    }

    /// Single-letter flag used in contract identifiers
    pub fn flag(&self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

/// JSON has no NaN or infinity; serde_json writes them as `null`, so read
/// `null` back as NaN.
fn nan_if_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Option Greeks
///
/// Theta is decay per calendar day, vega is per one volatility point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: ∂V/∂S (rate of change with spot)
    #[serde(deserialize_with = "nan_if_null")]
    pub delta: f64,
    /// Gamma: ∂²V/∂S² (curvature of delta)
    #[serde(deserialize_with = "nan_if_null")]
    pub gamma: f64,
    /// Theta: ∂V/∂t per calendar day
    #[serde(deserialize_with = "nan_if_null")]
    pub theta: f64,
    /// Vega: ∂V/∂σ per 1% move in volatility
    #[serde(deserialize_with = "nan_if_null")]
    pub vega: f64,
    /// Rho: ∂V/∂r (sensitivity to interest rate)
    #[serde(deserialize_with = "nan_if_null")]
    pub rho: f64,
}

impl Greeks {
    /// All-zero Greeks, used for expired or degenerate contracts
    pub const fn zero() -> Self {
        Self {
            delta: 0.0,
            gamma: 0.0,
            theta: 0.0,
            vega: 0.0,
            rho: 0.0,
        }
    }

    /// Returns true if every field is a finite number
    pub fn is_finite(&self) -> bool {
        self.delta.is_finite()
            && self.gamma.is_finite()
            && self.theta.is_finite()
            && self.vega.is_finite()
            && self.rho.is_finite()
    }
}

/// Point-in-time copy of every cached entry, keyed by contract identifier
pub type Snapshot = BTreeMap<String, Greeks>;
