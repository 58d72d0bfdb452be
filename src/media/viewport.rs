//! Viewport state and width-feature evaluation.

use serde::{Deserialize, Serialize};

use super::ast::{Length, MediaCondition, MediaQuery, WidthFeature};
use super::lexer::split_dimension;
use crate::{Error, Result};

/// Browser default for `font-size` on the root element.
pub const DEFAULT_ROOT_FONT_SIZE_PX: f64 = 16.0;

/// The state a width-only media query is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width in CSS pixels.
    pub width: f64,
    /// Root font size in CSS pixels; `rem` and `em` resolve against it.
    pub root_font_size: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Viewport {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            root_font_size: DEFAULT_ROOT_FONT_SIZE_PX,
        }
    }

    pub fn with_root_font_size(mut self, px: f64) -> Self {
        self.root_font_size = px;
        self
    }

    /// OR over the query's conditions. Every condition is resolved, so a bad
    /// length fails even when an earlier condition already matched.
    pub fn matches(&self, query: &MediaQuery) -> Result<bool> {
        let mut matched = false;
        for condition in &query.conditions {
            matched |= self.matches_condition(condition)?;
        }
        Ok(matched)
    }

    /// AND over the condition's features; `all` matches.
    pub fn matches_condition(&self, condition: &MediaCondition) -> Result<bool> {
        let mut matched = true;
        for feature in &condition.features {
            matched &= self.matches_feature(feature)?;
        }
        Ok(matched)
    }

    pub fn matches_feature(&self, feature: &WidthFeature) -> Result<bool> {
        Ok(match feature {
            WidthFeature::Min(length) => self.width >= self.resolve(length)?,
            WidthFeature::Max(length) => self.width <= self.resolve(length)?,
        })
    }

    /// Resolve a length to CSS pixels.
    pub fn resolve(&self, length: &Length) -> Result<f64> {
        match length {
            Length::Px(px) => Ok(*px),
            Length::Raw(raw) => {
                let (value, unit) = split_dimension(raw)
                    .ok_or_else(|| Error::UnsupportedLength(raw.clone()))?;
                match unit.to_ascii_lowercase().as_str() {
                    "px" => Ok(value),
                    "rem" | "em" => Ok(value * self.root_font_size),
                    "" if value == 0.0 => Ok(0.0),
                    _ => Err(Error::UnsupportedLength(raw.clone())),
                }
            }
            Length::Calc { base, minus_px } => Ok(self.resolve(base)? - minus_px),
        }
    }
}
