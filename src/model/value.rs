//! Breakpoint values and their resolution into media lengths.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::media::Length;
use crate::{Error, Result};

/// Sub-pixel amount subtracted from an upper bound so adjacent spans never
/// share a width.
pub const EXCLUSIVE_EPSILON_PX: f64 = 0.2;

/// The lower bound declared for one breakpoint.
///
/// - `Px`: a bare number, interpreted as CSS pixels
/// - `Length`: an opaque dimensioned CSS length (`"40rem"`), never validated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BreakpointValue {
    Px(f64),
    Length(String),
}

// ============================================================================
// Unit resolution
// ============================================================================

impl BreakpointValue {
    /// The length used in a `min-width` clause: `400px`, or the string verbatim.
    pub fn min_length(&self) -> Length {
        match self {
            BreakpointValue::Px(px) => Length::Px(*px),
            BreakpointValue::Length(raw) => Length::Raw(raw.clone()),
        }
    }

    /// The length used in a `max-width` clause that must exclude this value:
    /// `699.8px` for `700`, `calc(70rem - 0.2px)` for `"70rem"`.
    pub fn max_exclusive(&self, epsilon_px: f64) -> Length {
        match self {
            BreakpointValue::Px(px) => Length::Px(px - epsilon_px),
            BreakpointValue::Length(raw) => Length::Calc {
                base: Box::new(Length::Raw(raw.clone())),
                minus_px: epsilon_px,
            },
        }
    }

    pub fn as_px(&self) -> Option<f64> {
        match self {
            BreakpointValue::Px(px) => Some(*px),
            BreakpointValue::Length(_) => None,
        }
    }
}

impl fmt::Display for BreakpointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakpointValue::Px(px) => write!(f, "{px}"),
            BreakpointValue::Length(raw) => f.write_str(raw),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<f64> for BreakpointValue {
    fn from(px: f64) -> Self { BreakpointValue::Px(px) }
}

impl From<i32> for BreakpointValue {
    fn from(px: i32) -> Self { BreakpointValue::Px(px as f64) }
}

impl From<u32> for BreakpointValue {
    fn from(px: u32) -> Self { BreakpointValue::Px(px as f64) }
}

impl From<&str> for BreakpointValue {
    fn from(raw: &str) -> Self { BreakpointValue::Length(raw.to_string()) }
}

impl From<String> for BreakpointValue {
    fn from(raw: String) -> Self { BreakpointValue::Length(raw) }
}

impl TryFrom<&serde_json::Value> for BreakpointValue {
    type Error = Error;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(BreakpointValue::Px)
                .ok_or_else(|| Error::InvalidBreakpointValue(n.to_string())),
            serde_json::Value::String(s) => Ok(BreakpointValue::Length(s.clone())),
            other => Err(Error::InvalidBreakpointValue(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for BreakpointValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ValueVisitor;

        impl Visitor<'_> for ValueVisitor {
            type Value = BreakpointValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a pixel number or a CSS length string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
                Ok(BreakpointValue::Px(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
                Ok(BreakpointValue::Px(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
                Ok(BreakpointValue::Px(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(BreakpointValue::Length(v.to_string()))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
