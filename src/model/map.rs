//! BreakpointMap: ordered breakpoint declarations.

use std::fmt;

use hashbrown::HashMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::BreakpointValue;
use crate::{Error, Result};

/// Ordered mapping from breakpoint name to its lower bound.
///
/// Order is declaration order, never re-sorted: it defines which breakpoint is
/// "next" when computing exclusive upper bounds. Values are expected to be
/// ascending in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BreakpointMap {
    entries: Vec<(String, BreakpointValue)>,
    /// name → position in `entries`
    index: HashMap<String, usize>,
}

impl BreakpointMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default grid preset: `xs 0`, `sm 576`, `md 768`, `lg 992`,
    /// `xl 1200`, `xxl 1600` pixels.
    pub fn preset() -> Self {
        [
            ("xs", 0),
            ("sm", 576),
            ("md", 768),
            ("lg", 992),
            ("xl", 1200),
            ("xxl", 1600),
        ]
        .into_iter()
        .collect()
    }

    /// Insert or replace a breakpoint. Replacing keeps the original position.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<BreakpointValue>,
    ) -> Option<BreakpointValue> {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<BreakpointValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&BreakpointValue> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// The breakpoint declared right after `name`, if any.
    pub fn next(&self, name: &str) -> Option<(&str, &BreakpointValue)> {
        let pos = self.position(name)?;
        self.entries
            .get(pos + 1)
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BreakpointValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON object such as `{"xs": 0, "sm": "40rem"}`, keeping key order.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Entries<serde_json::Value> = serde_json::from_str(json)?;
        let mut map = Self::new();
        for (name, value) in raw.0 {
            let value = BreakpointValue::try_from(&value)
                .map_err(|_| Error::InvalidBreakpointValue(format!("{name}: {value}")))?;
            map.insert(name, value);
        }
        Ok(map)
    }

    /// Adjacent pixel pairs that decrease in declaration order.
    pub fn descending_pairs(&self) -> Vec<(&str, &str)> {
        self.entries
            .windows(2)
            .filter_map(|pair| {
                let (lo_name, lo) = &pair[0];
                let (hi_name, hi) = &pair[1];
                match (lo.as_px(), hi.as_px()) {
                    (Some(lo), Some(hi)) if hi < lo => Some((lo_name.as_str(), hi_name.as_str())),
                    _ => None,
                }
            })
            .collect()
    }
}


impl<K, V> FromIterator<(K, V)> for BreakpointMap
where
    K: Into<String>,
    V: Into<BreakpointValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

// ============================================================================
// Serde (order-preserving)
// ============================================================================

/// Object entries in document order.
struct Entries<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of breakpoint names")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(std::marker::PhantomData))
    }
}

impl<'de> Deserialize<'de> for BreakpointMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = Entries::<BreakpointValue>::deserialize(deserializer)?;
        Ok(entries.0.into_iter().collect())
    }
}

impl Serialize for BreakpointMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
