//! Media condition AST
//!
//! These types represent width-only media queries. They are pure data with a
//! canonical `Display`: the planner builds them, `Display` turns them into the
//! strings environments evaluate, and the parser reads those strings back.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A CSS length as it appears inside a width feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Length {
    /// Pixels: `400px`, `699.8px`.
    Px(f64),
    /// Any other dimension, kept verbatim: `40rem`.
    Raw(String),
    /// `calc(<base> - <minus_px>px)`. A negative `minus_px` renders as `+`.
    Calc { base: Box<Length>, minus_px: f64 },
}

impl Length {
    /// The pixel magnitude, when this length is a plain pixel value.
    pub fn as_px(&self) -> Option<f64> {
        match self {
            Length::Px(px) => Some(*px),
            _ => None,
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(px) => write!(f, "{px}px"),
            Length::Raw(raw) => f.write_str(raw),
            Length::Calc { base, minus_px } if *minus_px < 0.0 => {
                write!(f, "calc({base} + {}px)", -minus_px)
            }
            Length::Calc { base, minus_px } => write!(f, "calc({base} - {minus_px}px)"),
        }
    }
}

/// A single `(min-width: ..)` or `(max-width: ..)` test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WidthFeature {
    /// Inclusive lower bound.
    Min(Length),
    /// Inclusive upper bound (exclusivity comes from the epsilon baked into the length).
    Max(Length),
}

impl WidthFeature {
    pub fn length(&self) -> &Length {
        match self {
            WidthFeature::Min(length) | WidthFeature::Max(length) => length,
        }
    }

    pub fn is_min(&self) -> bool {
        matches!(self, WidthFeature::Min(_))
    }

    /// Same feature name (`min-width` vs `max-width`), regardless of length.
    pub fn same_kind(&self, other: &WidthFeature) -> bool {
        self.is_min() == other.is_min()
    }
}

impl fmt::Display for WidthFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidthFeature::Min(length) => write!(f, "(min-width: {length})"),
            WidthFeature::Max(length) => write!(f, "(max-width: {length})"),
        }
    }
}

/// Conjunction of width features. Renders as `a and b`; no features renders `all`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaCondition {
    pub features: SmallVec<[WidthFeature; 2]>,
}

impl MediaCondition {
    /// The condition that matches every viewport.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_features(features: impl IntoIterator<Item = WidthFeature>) -> Self {
        Self {
            features: features.into_iter().collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.features.is_empty()
    }

    /// The only feature of a one-feature condition.
    pub fn single(&self) -> Option<&WidthFeature> {
        match self.features.as_slice() {
            [feature] => Some(feature),
            _ => None,
        }
    }
}

impl fmt::Display for MediaCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.features.is_empty() {
            return f.write_str("all");
        }
        for (i, feature) in self.features.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{feature}")?;
        }
        Ok(())
    }
}

/// Disjunction of conditions (a CSS media query list). No conditions renders
/// `not all` and never matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaQuery {
    pub conditions: Vec<MediaCondition>,
}

impl MediaQuery {
    /// The query that matches nothing.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(condition: MediaCondition) -> Self {
        Self {
            conditions: vec![condition],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Distinct rendered condition strings, in order of first appearance.
    pub fn condition_strings(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let text = condition.to_string();
            if !out.contains(&text) {
                out.push(text);
            }
        }
        out
    }
}

impl fmt::Display for MediaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("not all");
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{condition}")?;
        }
        Ok(())
    }
}
