//! Query planner: turns normalized breakpoint pairs into media conditions.
//!
//! The planner is environment-agnostic. It produces a `MediaQuery` that the
//! execution layer renders and hands to an `Environment`.

use serde::{Deserialize, Serialize};

use crate::media::{Length, MediaCondition, MediaQuery, WidthFeature};
use crate::model::{BreakpointMap, Direction, EXCLUSIVE_EPSILON_PX};
use crate::{Error, Result};

// ============================================================================
// Options
// ============================================================================

/// How the entries of a multi-entry query combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// Every entry must hold; all features land in one condition joined by `and`.
    #[default]
    All,
    /// Any entry may hold; one condition per entry, joined as a query list.
    Any,
}

/// Planning configuration, bound into `Breakpoints` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub combine: Combine,
    /// Merge redundant features and conditions before evaluation.
    pub flatten: bool,
    /// Pixels subtracted from exclusive upper bounds.
    pub epsilon_px: f64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            combine: Combine::All,
            flatten: true,
            epsilon_px: EXCLUSIVE_EPSILON_PX,
        }
    }
}

// ============================================================================
// Condition building
// ============================================================================

/// Build the condition for one breakpoint and direction.
///
/// - `up`: `(min-width: own)`
/// - `only`: `(min-width: own) and (max-width: next - ε)`, or just the lower
///   clause for the last breakpoint
/// - `down`: `(max-width: next - ε)`; the last breakpoint has no ceiling and
///   yields `all`
pub fn build_condition(
    map: &BreakpointMap,
    name: &str,
    direction: Direction,
    epsilon_px: f64,
) -> Result<MediaCondition> {
    let lower = map
        .get(name)
        .ok_or_else(|| Error::UnknownBreakpoint(name.to_string()))?;
    let upper = map.next(name).map(|(_, next)| next.max_exclusive(epsilon_px));

    let mut condition = MediaCondition::all();
    if matches!(direction, Direction::Up | Direction::Only) {
        condition.features.push(WidthFeature::Min(lower.min_length()));
    }
    if matches!(direction, Direction::Down | Direction::Only) {
        if let Some(upper) = upper {
            condition.features.push(WidthFeature::Max(upper));
        }
    }

    tracing::trace!(breakpoint = name, %direction, condition = %condition, "built condition");
    Ok(condition)
}

/// Create a media query from normalized pairs.
pub fn plan(
    map: &BreakpointMap,
    pairs: &[(String, Direction)],
    options: &QueryOptions,
) -> Result<MediaQuery> {
    if pairs.is_empty() {
        return Ok(MediaQuery::none());
    }

    match options.combine {
        Combine::All => {
            let mut combined = MediaCondition::all();
            for (name, direction) in pairs {
                let condition = build_condition(map, name, *direction, options.epsilon_px)?;
                combined.features.extend(condition.features);
            }
            Ok(MediaQuery::single(combined))
        }
        Combine::Any => {
            let conditions = pairs
                .iter()
                .map(|(name, direction)| build_condition(map, name, *direction, options.epsilon_px))
                .collect::<Result<Vec<_>>>()?;
            Ok(MediaQuery { conditions })
        }
    }
}

// ============================================================================
// Flattening
// ============================================================================

/// Merge redundant features and conditions without changing what matches.
///
/// Inside a condition (AND): identical features collapse, and among pixel
/// bounds of one kind only the tightest survives. Across conditions (OR):
/// identical conditions collapse, `all` absorbs everything, and among
/// single-bound pixel conditions of one kind only the loosest survives.
/// Survivors keep the position of their first occurrence.
pub fn optimize(query: MediaQuery) -> MediaQuery {
    let before = query.conditions.len();
    let mut conditions: Vec<MediaCondition> = Vec::with_capacity(before);

    for condition in query.conditions.into_iter().map(flatten_condition) {
        if condition.is_all() {
            return MediaQuery::single(condition);
        }
        if conditions.contains(&condition) {
            continue;
        }
        if let Some(feature) = condition.single().filter(|f| f.length().as_px().is_some()) {
            let slot = conditions.iter_mut().find(|existing| {
                existing
                    .single()
                    .is_some_and(|other| other.same_kind(feature) && other.length().as_px().is_some())
            });
            if let Some(existing) = slot {
                if loosens(feature, &existing.features[0]) {
                    *existing = condition;
                }
                continue;
            }
        }
        conditions.push(condition);
    }

    tracing::debug!(before, after = conditions.len(), "flattened media query");
    MediaQuery { conditions }
}

fn flatten_condition(condition: MediaCondition) -> MediaCondition {
    let mut out = MediaCondition::all();
    for feature in condition.features {
        if out.features.contains(&feature) {
            continue;
        }
        if feature.length().as_px().is_some() {
            let slot = out
                .features
                .iter_mut()
                .find(|existing| existing.same_kind(&feature) && existing.length().as_px().is_some());
            if let Some(existing) = slot {
                if tightens(&feature, existing) {
                    *existing = feature;
                }
                continue;
            }
        }
        out.features.push(feature);
    }
    out
}

/// `candidate` narrows the range allowed by `existing` (same kind, both pixels).
fn tightens(candidate: &WidthFeature, existing: &WidthFeature) -> bool {
    match (px(candidate), px(existing)) {
        (Some(new), Some(old)) if candidate.is_min() => new > old,
        (Some(new), Some(old)) => new < old,
        _ => false,
    }
}

/// `candidate` widens the range allowed by `existing` (same kind, both pixels).
fn loosens(candidate: &WidthFeature, existing: &WidthFeature) -> bool {
    match (px(candidate), px(existing)) {
        (Some(new), Some(old)) if candidate.is_min() => new < old,
        (Some(new), Some(old)) => new > old,
        _ => false,
    }
}

fn px(feature: &WidthFeature) -> Option<f64> {
    match feature.length() {
        Length::Px(px) => Some(*px),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn condition(map: &BreakpointMap, name: &str, direction: Direction) -> String {
        build_condition(map, name, direction, EXCLUSIVE_EPSILON_PX)
            .unwrap()
            .to_string()
    }

    fn planned(map: &BreakpointMap, pairs: &[(&str, Direction)], combine: Combine) -> MediaQuery {
        let pairs: Vec<(String, Direction)> =
            pairs.iter().map(|(n, d)| (n.to_string(), *d)).collect();
        let options = QueryOptions { combine, ..QueryOptions::default() };
        plan(map, &pairs, &options).unwrap()
    }

    #[test]
    fn test_directions_on_default_map() {
        let map = BreakpointMap::preset();
        assert_eq!(condition(&map, "md", Direction::Up), "(min-width: 768px)");
        assert_eq!(condition(&map, "md", Direction::Down), "(max-width: 991.8px)");
        assert_eq!(
            condition(&map, "md", Direction::Only),
            "(min-width: 768px) and (max-width: 991.8px)"
        );
        assert_eq!(condition(&map, "xs", Direction::Up), "(min-width: 0px)");
        assert_eq!(condition(&map, "xs", Direction::Down), "(max-width: 575.8px)");
    }

    #[test]
    fn test_last_breakpoint_has_no_ceiling() {
        let map = BreakpointMap::preset();
        assert_eq!(condition(&map, "xxl", Direction::Only), "(min-width: 1600px)");
        assert_eq!(condition(&map, "xl", Direction::Only), "(min-width: 1200px) and (max-width: 1599.8px)");
        assert_eq!(condition(&map, "xxl", Direction::Down), "all");
    }

    #[test]
    fn test_string_units_use_calc() {
        let map = BreakpointMap::new().with("xs", 0).with("sm", "40rem").with("md", "70rem");
        assert_eq!(
            condition(&map, "sm", Direction::Only),
            "(min-width: 40rem) and (max-width: calc(70rem - 0.2px))"
        );
    }

    #[test]
    fn test_unknown_breakpoint() {
        let err = build_condition(&BreakpointMap::preset(), "huge", Direction::Up, 0.2).unwrap_err();
        assert!(matches!(err, Error::UnknownBreakpoint(name) if name == "huge"));
    }

    #[test]
    fn test_plan_all_concatenates_in_pair_order() {
        let map = BreakpointMap::preset();
        let query = planned(&map, &[("md", Direction::Down), ("sm", Direction::Up)], Combine::All);
        assert_eq!(query.to_string(), "(max-width: 991.8px) and (min-width: 576px)");
    }

    #[test]
    fn test_plan_any_lists_conditions() {
        let map = BreakpointMap::preset();
        let query = planned(&map, &[("md", Direction::Down), ("sm", Direction::Up)], Combine::Any);
        assert_eq!(query.to_string(), "(max-width: 991.8px), (min-width: 576px)");
    }

    #[test]
    fn test_plan_empty() {
        let query = planned(&BreakpointMap::preset(), &[], Combine::All);
        assert!(query.is_empty());
    }

    #[test]
    fn test_flatten_equal_breakpoints() {
        let map = BreakpointMap::new().with("sm", 400).with("md", 400);
        for combine in [Combine::All, Combine::Any] {
            let query = planned(&map, &[("sm", Direction::Up), ("md", Direction::Up)], combine);
            assert_eq!(optimize(query).to_string(), "(min-width: 400px)");
        }
    }

    #[test]
    fn test_flatten_all_keeps_tightest() {
        let map = BreakpointMap::preset();
        let query = planned(
            &map,
            &[("sm", Direction::Up), ("md", Direction::Up), ("lg", Direction::Down), ("md", Direction::Down)],
            Combine::All,
        );
        assert_eq!(
            optimize(query).to_string(),
            "(min-width: 768px) and (max-width: 991.8px)"
        );
    }

    #[test]
    fn test_flatten_any_keeps_loosest() {
        let map = BreakpointMap::preset();
        let query = planned(
            &map,
            &[("md", Direction::Up), ("sm", Direction::Up), ("xs", Direction::Down), ("md", Direction::Down)],
            Combine::Any,
        );
        assert_eq!(optimize(query).to_string(), "(min-width: 576px), (max-width: 991.8px)");
    }

    #[test]
    fn test_flatten_any_all_absorbs() {
        let map = BreakpointMap::preset();
        let query = planned(&map, &[("md", Direction::Only), ("xxl", Direction::Down)], Combine::Any);
        assert_eq!(optimize(query).to_string(), "all");
    }

    #[test]
    fn test_flatten_keeps_mixed_units() {
        let map = BreakpointMap::new().with("sm", 400).with("md", "50rem");
        let query = planned(&map, &[("sm", Direction::Up), ("md", Direction::Up)], Combine::All);
        assert_eq!(optimize(query).to_string(), "(min-width: 400px) and (min-width: 50rem)");
    }

    #[test]
    fn test_options_from_partial_json() {
        let options: QueryOptions = serde_json::from_str(r#"{"combine": "any"}"#).unwrap();
        assert_eq!(options.combine, Combine::Any);
        assert!(options.flatten);
        assert_eq!(options.epsilon_px, EXCLUSIVE_EPSILON_PX);
    }
}
