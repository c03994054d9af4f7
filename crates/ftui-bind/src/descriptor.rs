#![forbid(unsafe_code)]

//! Declarative binding maps.
//!
//! A view describes its bindings as an ordered map from descriptor keys
//! to values:
//!
//! | Key                      | Meaning                                      |
//! |--------------------------|----------------------------------------------|
//! | `selector`               | text of the matched elements                 |
//! | `[attr]selector`         | `attr` of the matched elements               |
//! | `[@attr]selector`        | bidirectional on the configured default event |
//! | `[event@attr]selector`   | bidirectional on `event`                     |
//!
//! Values are expression strings, property specs, or (under a collection
//! root) nested maps applied to every member.

use crate::error::BindError;
use crate::expression::clean_name;
use crate::property::{Computed, PropertySpec};

/// A parsed descriptor key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub selector: String,
    pub attribute: String,
    /// UI event for bidirectional bindings.
    pub event: Option<String>,
}

impl Descriptor {
    /// Parse `key`; `default_event` applies to `[@attr]` keys.
    pub fn parse(key: &str, default_event: &str) -> Result<Self, BindError> {
        let Some(rest) = key.strip_prefix('[') else {
            return Ok(Self {
                selector: key.trim().to_string(),
                attribute: String::new(),
                event: None,
            });
        };
        let Some((inner, selector)) = rest.split_once(']') else {
            return Err(BindError::InvalidDescriptor {
                descriptor: key.to_string(),
            });
        };
        let (attribute, event) = match inner.split_once('@') {
            Some((event, attribute)) => {
                let event = clean_name(event);
                let event = if event.is_empty() {
                    default_event.to_string()
                } else {
                    event
                };
                (clean_name(attribute), Some(event))
            }
            None => (clean_name(inner), None),
        };
        Ok(Self {
            selector: selector.trim().to_string(),
            attribute,
            event,
        })
    }

    /// This descriptor scoped to the `n`th (1-based) element of type
    /// under `parent`.
    #[must_use]
    pub fn scoped(&self, parent: &str, n: usize) -> Self {
        Self {
            selector: format!("{parent}:nth-of-type({n}) {}", self.selector)
                .trim()
                .to_string(),
            attribute: self.attribute.clone(),
            event: self.event.clone(),
        }
    }
}

/// A value in a [`BindingMap`].
#[derive(Debug, Clone)]
pub enum MapValue {
    /// Expression string, compiled at attach time.
    Expression(String),
    /// Computed or structured property.
    Property(PropertySpec),
    /// Per-member map under a collection root.
    Nested(BindingMap),
}

impl From<&str> for MapValue {
    fn from(expr: &str) -> Self {
        Self::Expression(expr.to_string())
    }
}

impl From<String> for MapValue {
    fn from(expr: String) -> Self {
        Self::Expression(expr)
    }
}

impl From<PropertySpec> for MapValue {
    fn from(spec: PropertySpec) -> Self {
        Self::Property(spec)
    }
}

impl From<Computed> for MapValue {
    fn from(computed: Computed) -> Self {
        Self::Property(PropertySpec::Computed(computed))
    }
}

impl From<BindingMap> for MapValue {
    fn from(map: BindingMap) -> Self {
        Self::Nested(map)
    }
}

/// Ordered descriptor-to-value map.
#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    entries: Vec<(String, MapValue)>,
}

impl BindingMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`BindingMap::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MapValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`, keeping its original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MapValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MapValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MapValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<MapValue>> FromIterator<(K, V)> for BindingMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Locate an index marker `[k]` inside a value, returning the cleaned key
/// and the value with the marker removed.
#[must_use]
pub fn split_index_marker(value: &str) -> Option<(String, String)> {
    let open = value.find('[')?;
    let close = open + value[open..].find(']')?;
    let inner = &value[open + 1..close];
    if inner.is_empty() || inner.contains('[') {
        return None;
    }
    let mut rest = String::with_capacity(value.len());
    rest.push_str(&value[..open]);
    rest.push_str(&value[close + 1..]);
    Some((clean_name(inner), rest))
}

#[cfg(feature = "serde")]
mod json {
    //! JSON decoding that keeps document order.
    //!
    //! Strings become expressions, objects with a string `property` and
    //! only `property`/`negate`/`triggers` keys become structured
    //! properties, and any other object becomes a nested map.

    use std::fmt;

    use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

    use super::{BindingMap, MapValue};
    use crate::error::BindError;
    use crate::property::PropertySpec;

    enum Raw {
        Str(String),
        Bool(bool),
        List(Vec<Raw>),
        Map(Vec<(String, Raw)>),
    }

    struct RawVisitor;

    impl<'de> Visitor<'de> for RawVisitor {
        type Value = Raw;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a binding expression, flag, list or map")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Raw, E> {
            Ok(Raw::Str(v.to_string()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Raw, E> {
            Ok(Raw::Str(v))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Raw, E> {
            Ok(Raw::Bool(v))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Raw, A::Error> {
            let mut items = Vec::new();
            while let Some(item) = seq.next_element::<Raw>()? {
                items.push(item);
            }
            Ok(Raw::List(items))
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Raw, A::Error> {
            let mut entries = Vec::new();
            while let Some((key, value)) = map.next_entry::<String, Raw>()? {
                entries.push((key, value));
            }
            Ok(Raw::Map(entries))
        }
    }

    impl<'de> Deserialize<'de> for Raw {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(RawVisitor)
        }
    }

    fn is_structured(entries: &[(String, Raw)]) -> bool {
        entries
            .iter()
            .any(|(k, v)| k == "property" && matches!(v, Raw::Str(_)))
            && entries
                .iter()
                .all(|(k, _)| matches!(k.as_str(), "property" | "negate" | "triggers"))
    }

    fn structured(key: &str, entries: Vec<(String, Raw)>) -> Result<PropertySpec, String> {
        let mut spec = None;
        let mut negate = false;
        let mut triggers = None;
        for (name, value) in entries {
            match (name.as_str(), value) {
                ("property", Raw::Str(field)) => spec = Some(PropertySpec::Field(field)),
                ("negate", Raw::Bool(flag)) => negate = flag,
                ("triggers", Raw::List(items)) => {
                    let mut names = Vec::with_capacity(items.len());
                    for item in items {
                        let Raw::Str(name) = item else {
                            return Err(format!("'{key}': triggers must be strings"));
                        };
                        names.push(name);
                    }
                    triggers = Some(names);
                }
                (other, _) => return Err(format!("'{key}': invalid '{other}' entry")),
            }
        }
        let property = spec.ok_or_else(|| format!("'{key}': missing property"))?;
        Ok(PropertySpec::Structured {
            property: Box::new(property),
            negate,
            triggers,
        })
    }

    fn to_map(entries: Vec<(String, Raw)>) -> Result<BindingMap, String> {
        let mut map = BindingMap::new();
        for (key, value) in entries {
            let value = match value {
                Raw::Str(expr) => MapValue::Expression(expr),
                Raw::Map(inner) if is_structured(&inner) => {
                    MapValue::Property(structured(&key, inner)?)
                }
                Raw::Map(inner) => MapValue::Nested(to_map(inner)?),
                Raw::Bool(_) | Raw::List(_) => {
                    return Err(format!("'{key}': expected a string or an object"));
                }
            };
            map.insert(key, value);
        }
        Ok(map)
    }

    impl<'de> Deserialize<'de> for BindingMap {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            match Raw::deserialize(deserializer)? {
                Raw::Map(entries) => to_map(entries).map_err(de::Error::custom),
                _ => Err(de::Error::custom("binding map must be an object")),
            }
        }
    }

    impl BindingMap {
        /// Decode a map from JSON, keeping document order.
        pub fn from_json(json: &str) -> Result<Self, BindError> {
            serde_json::from_str(json).map_err(|err| BindError::Config(err.to_string()))
        }
    }
}
