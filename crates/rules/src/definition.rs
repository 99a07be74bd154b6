//! Serializable rule set definitions.
//!
//! These types mirror the on-disk rule format. They carry no compiled state and
//! are cheap to clone, compare and round-trip through YAML or JSON. Maps whose
//! declaration order matters (currencies, periods, seniority levels) are held in
//! an [`OrderedTable`] so that "first declared wins" semantics survive
//! deserialization.
//!
//! ```yaml
//! currencies:
//!   AED: ["dhs", "dirham"]
//! range_patterns:
//!   - "<num> - <num> <currency>"
//!   - { pattern: "from <num>", bound: min }
//! seniority:
//!   detection_strategy: first_match
//!   levels:
//!     senior: ["senior", "sr"]
//! ```
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Uncompiled rule set, as loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSetDefinition {
    /// Currency code to alias list. The code itself always matches.
    pub currencies: OrderedTable<Vec<String>>,
    /// Salary templates, tried in order.
    pub range_patterns: Vec<PatternDefinition>,
    /// Experience templates, tried in order.
    pub experience_patterns: Vec<PatternDefinition>,
    /// Canonical period label to keywords, e.g. `per month: [monthly]`.
    pub periods: OrderedTable<Vec<String>>,
    pub negotiable_keywords: Vec<String>,
    pub seniority: SeniorityDefinition,
}

/// A single pattern entry: either a bare template or a template with a bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternDefinition {
    Template(String),
    Detailed {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bound: Option<Bound>,
    },
}

impl PatternDefinition {
    pub fn template(&self) -> &str {
        match self {
            PatternDefinition::Template(template) => template,
            PatternDefinition::Detailed { pattern, .. } => pattern,
        }
    }

    pub fn bound(&self) -> Option<Bound> {
        match self {
            PatternDefinition::Template(_) => None,
            PatternDefinition::Detailed { bound, .. } => *bound,
        }
    }

    pub fn with_bound(pattern: impl Into<String>, bound: Bound) -> Self {
        PatternDefinition::Detailed {
            pattern: pattern.into(),
            bound: Some(bound),
        }
    }
}

impl From<&str> for PatternDefinition {
    fn from(value: &str) -> Self {
        PatternDefinition::Template(value.to_string())
    }
}

/// How the numbers captured by a template map onto a min/max pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Two numbers: min then max.
    Range,
    /// One number, lower bound only ("from 5000").
    Min,
    /// One number, upper bound only ("up to 5000").
    Max,
    /// One number used as both bounds.
    Exact,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Bound::Range => "range",
            Bound::Min => "min",
            Bound::Max => "max",
            Bound::Exact => "exact",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeniorityDefinition {
    pub detection_strategy: DetectionStrategy,
    /// Level name to keywords. Level names are matched against the
    /// classification vocabulary by the listing crate.
    pub levels: OrderedTable<Vec<String>>,
    /// Experience hints used when an experience phrase only names a level.
    pub years: OrderedTable<YearsHint>,
}

/// Which level wins when keywords of several levels occur in one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionStrategy {
    /// The first level, in declaration order, with any keyword present.
    #[default]
    FirstMatch,
    /// The level owning the longest keyword present; ties go to declaration order.
    LongestKeyword,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearsHint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u8>,
}

/// A string-keyed map that remembers insertion order.
///
/// Re-inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedTable<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedTable<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedTable<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = OrderedTable::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}

impl<V: Serialize> Serialize for OrderedTable<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedTable<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TableVisitor(PhantomData))
    }
}

struct TableVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for TableVisitor<V> {
    type Value = OrderedTable<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = OrderedTable::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            table.insert(key, value);
        }
        Ok(table)
    }

    // `currencies:` with no value in YAML.
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedTable::new())
    }
}
