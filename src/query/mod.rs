//! Breakpoint queries and their normalization into `(name, Direction)` pairs.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::Direction;
use crate::{Error, Result};

/// Normalized query: breakpoint names with their directions, in query order.
pub type Pairs = SmallVec<[(String, Direction); 4]>;

/// The raw value of one mapping entry: `true`, `"up"`, `"down"`, ...
///
/// Kept unvalidated so queries built from untrusted JSON can be rejected at
/// normalization with the offending entry named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Directive {
    Flag(bool),
    Keyword(String),
    /// Any other JSON value; never a valid direction.
    Other(serde_json::Value),
}

impl Directive {
    /// `true` means the exact span; keywords map to their direction.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Directive::Flag(true) => Some(Direction::Only),
            Directive::Flag(false) => None,
            Directive::Keyword(keyword) => Direction::from_keyword(keyword),
            Directive::Other(_) => None,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Flag(flag) => write!(f, "{flag}"),
            Directive::Keyword(keyword) => write!(f, "'{keyword}'"),
            Directive::Other(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for Directive {
    fn from(flag: bool) -> Self { Directive::Flag(flag) }
}

impl From<&str> for Directive {
    fn from(keyword: &str) -> Self { Directive::Keyword(keyword.to_string()) }
}

impl From<Direction> for Directive {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Only => Directive::Flag(true),
            other => Directive::Keyword(other.as_str().to_string()),
        }
    }
}

/// What the caller asks about.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// `'md'`: exactly the named breakpoint's span.
    Breakpoint(String),
    /// `('md', 'up')`: one breakpoint with an explicit direction.
    Directed(String, Direction),
    /// `{ md: 'down', sm: 'up' }`: several entries, in the mapping's own order.
    Map(Vec<(String, Directive)>),
}

impl Query {
    pub fn only(name: impl Into<String>) -> Self {
        Query::Breakpoint(name.into())
    }

    pub fn up(name: impl Into<String>) -> Self {
        Query::Directed(name.into(), Direction::Up)
    }

    pub fn down(name: impl Into<String>) -> Self {
        Query::Directed(name.into(), Direction::Down)
    }

    /// Parse `"md"` or `{"md": "down", "sm": "up"}`, keeping key order.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<&str> for Query {
    fn from(name: &str) -> Self { Query::Breakpoint(name.to_string()) }
}

impl From<String> for Query {
    fn from(name: String) -> Self { Query::Breakpoint(name) }
}

impl<K, D> FromIterator<(K, D)> for Query
where
    K: Into<String>,
    D: Into<Directive>,
{
    fn from_iter<I: IntoIterator<Item = (K, D)>>(iter: I) -> Self {
        Query::Map(iter.into_iter().map(|(k, d)| (k.into(), d.into())).collect())
    }
}

/// Expand a query into ordered `(name, direction)` pairs.
///
/// Fails on the first entry whose directive is not `true`, `"up"`, `"down"`
/// or `"only"`; nothing is built for a query that fails here.
pub fn normalize(query: &Query) -> Result<Pairs> {
    let mut pairs = Pairs::new();
    match query {
        Query::Breakpoint(name) => pairs.push((name.clone(), Direction::Only)),
        Query::Directed(name, direction) => pairs.push((name.clone(), *direction)),
        Query::Map(entries) => {
            for (name, directive) in entries {
                let direction = directive.direction().ok_or_else(|| Error::InvalidQuery {
                    breakpoint: name.clone(),
                    directive: directive.to_string(),
                })?;
                pairs.push((name.clone(), direction));
            }
        }
    }
    Ok(pairs)
}

// ============================================================================
// Serde (order-preserving)
// ============================================================================

impl<'de> Deserialize<'de> for Query {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct QueryVisitor;

        impl<'de> Visitor<'de> for QueryVisitor {
            type Value = Query;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a breakpoint name or a map of breakpoint directions")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
                Ok(Query::Breakpoint(v.to_string()))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, directive)) = access.next_entry::<String, Directive>()? {
                    entries.push((name, directive));
                }
                Ok(Query::Map(entries))
            }
        }

        deserializer.deserialize_any(QueryVisitor)
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Query::Breakpoint(name) => serializer.serialize_str(name),
            Query::Directed(name, direction) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, &Directive::from(*direction))?;
                map.end()
            }
            Query::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, directive) in entries {
                    map.serialize_entry(name, directive)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &Query) -> Vec<(String, Direction)> {
        normalize(query).unwrap().into_vec()
    }

    #[test]
    fn test_single_name_means_only() {
        assert_eq!(pairs(&Query::from("md")), vec![("md".to_string(), Direction::Only)]);
    }

    #[test]
    fn test_directed_name() {
        assert_eq!(pairs(&Query::up("sm")), vec![("sm".to_string(), Direction::Up)]);
    }

    #[test]
    fn test_map_keeps_entry_order() {
        let query: Query = [("md", Directive::from("down")), ("sm", Directive::from("up")), ("xs", true.into())]
            .into_iter()
            .collect();
        assert_eq!(pairs(&query), vec![
            ("md".to_string(), Direction::Down),
            ("sm".to_string(), Direction::Up),
            ("xs".to_string(), Direction::Only),
        ]);
    }

    #[test]
    fn test_unrecognized_directive_fails() {
        let query: Query = [("md", Directive::from("sideways"))].into_iter().collect();
        let err = normalize(&query).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidQuery { ref breakpoint, ref directive } if breakpoint == "md" && directive == "'sideways'"
        ));

        let disabled: Query = [("sm", false)].into_iter().collect();
        assert!(normalize(&disabled).is_err());
    }

    #[test]
    fn test_empty_map_has_no_pairs() {
        assert!(normalize(&Query::Map(Vec::new())).unwrap().is_empty());
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Query::from_json(r#""md""#).unwrap(), Query::only("md"));
        let query = Query::from_json(r#"{"md": "down", "sm": "up", "lg": true}"#).unwrap();
        assert_eq!(query, Query::Map(vec![
            ("md".into(), Directive::from("down")),
            ("sm".into(), Directive::from("up")),
            ("lg".into(), Directive::Flag(true)),
        ]));
        assert!(matches!(Query::from_json("42"), Err(Error::Json(_))));
    }

    #[test]
    fn test_json_directive_of_wrong_type_is_an_invalid_query() {
        let query = Query::from_json(r#"{"sm": "up", "md": 5}"#).unwrap();
        let err = normalize(&query).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidQuery { ref breakpoint, ref directive } if breakpoint == "md" && directive == "5"
        ));
    }

    #[test]
    fn test_serialize_directed_as_map() {
        let json = serde_json::to_string(&Query::down("md")).unwrap();
        assert_eq!(json, r#"{"md":"down"}"#);
        let only = serde_json::to_string(&Query::Directed("lg".into(), Direction::Only)).unwrap();
        assert_eq!(only, r#"{"lg":true}"#);
    }
}
