// 🔁 Staged Transforms
// Pending numeric changes, stored as data and interpreted on fold.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::DocumentConfig;
use crate::document::Node;
use crate::error::{PriceDataError, Result};

// ============================================================================
// SHIFT METHOD
// ============================================================================

/// How `stage_shift` interprets its amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftMethod {
    /// value + amount ("width" shift)
    Absolute,
    /// value * (1 + amount)
    Relative,
    /// value * exp(amount)
    Log,
}

impl ShiftMethod {
    pub fn code(&self) -> &'static str {
        match self {
            ShiftMethod::Absolute => "w",
            ShiftMethod::Relative => "r",
            ShiftMethod::Log => "l",
        }
    }
}

impl FromStr for ShiftMethod {
    type Err = PriceDataError;

    /// Case-insensitive prefix match: "w..." / "r..." / "l...".
    fn from_str(method: &str) -> Result<Self> {
        let normalized = method.trim().to_lowercase();

        if normalized.starts_with('w') {
            Ok(ShiftMethod::Absolute)
        } else if normalized.starts_with('r') {
            Ok(ShiftMethod::Relative)
        } else if normalized.starts_with('l') {
            Ok(ShiftMethod::Log)
        } else {
            Err(PriceDataError::InvalidArgument(format!(
                "invalid shift method '{}', options=['w', 'r', 'l']",
                method
            )))
        }
    }
}

// ============================================================================
// TRANSFORM
// ============================================================================

/// One staged change to a record's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    AbsoluteShift { delta: f64 },
    RelativeShift { rate: f64 },
    LogShift { rate: f64 },
    SetValue { value: f64, kind: String },
}

impl Transform {
    pub fn shift(amount: f64, method: ShiftMethod) -> Transform {
        match method {
            ShiftMethod::Absolute => Transform::AbsoluteShift { delta: amount },
            ShiftMethod::Relative => Transform::RelativeShift { rate: amount },
            ShiftMethod::Log => Transform::LogShift { rate: amount },
        }
    }

    /// Apply this transform to `node` in place.
    ///
    /// Shifts read the node's current numeric value, so every transform
    /// composes with whatever ran before it in the chain.
    pub fn apply(&self, name: &str, node: &mut Node, config: &DocumentConfig) -> Result<()> {
        let next = match self {
            Transform::SetValue { value, kind } => {
                if node.has_attribute(&config.kind_key) {
                    node.set_attribute(&config.kind_key, kind.as_str())?;
                } else {
                    debug!(
                        record = name,
                        kind = %kind,
                        column = %config.kind_key,
                        "no kind column, kind label not recorded"
                    );
                }
                *value
            }
            Transform::AbsoluteShift { delta } => read_value(name, node, config)? + delta,
            Transform::RelativeShift { rate } => read_value(name, node, config)? * (1.0 + rate),
            Transform::LogShift { rate } => read_value(name, node, config)? * rate.exp(),
        };

        node.set_attribute(&config.value_key, format_value(next))
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::AbsoluteShift { delta } => write!(f, "{:+}", delta),
            Transform::RelativeShift { rate } => write!(f, "x(1{:+})", rate),
            Transform::LogShift { rate } => write!(f, "xexp({})", rate),
            Transform::SetValue { value, kind } => write!(f, "={} [{}]", value, kind),
        }
    }
}

/// Parse the numeric value attribute of a record node.
pub fn read_value(name: &str, node: &Node, config: &DocumentConfig) -> Result<f64> {
    let raw = node.attribute(&config.value_key).unwrap_or("");
    raw.trim()
        .parse::<f64>()
        .map_err(|_| PriceDataError::NumericConversion {
            name: name.to_string(),
            value: raw.to_string(),
        })
}

/// Shortest round-trip text for `value`, keeping one decimal on integral
/// values so `2.0` stays `2.0` rather than `2`.
pub fn format_value(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
