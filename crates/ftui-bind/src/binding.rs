#![forbid(unsafe_code)]

//! The unit linking one record accessor to one element attribute.
//!
//! A [`Binding`] is immutable once built: re-binding the same
//! `(selector, attribute)` key replaces it. A bidirectional binding owns
//! the guard of its delegated UI listener, so dropping the binding
//! detaches the listener.

use crate::property::Accessor;
use crate::reactive::Subscription;
use crate::record::{ChangeSet, RecordRef};
use crate::tree::Dimension;
use crate::value::Value;

/// Semantic class of an attribute key.
///
/// | Key(s)                                          | Class        |
/// |-------------------------------------------------|--------------|
/// | `""`, `text`                                    | `Text`       |
/// | `html`                                          | `Html`       |
/// | `value`, `val`                                  | `Value`      |
/// | `width`, `height`                               | `Dimension`  |
/// | `selected`, `checked`, `readonly`, `disabled`   | `Property`   |
/// | `display`, `visible`                            | `Visibility` |
/// | anything else                                   | `Generic`    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Text,
    Html,
    Value,
    Dimension(Dimension),
    Property(String),
    Visibility,
    Generic(String),
}

impl Attribute {
    #[must_use]
    pub fn classify(key: &str) -> Self {
        match key {
            "" | "text" => Self::Text,
            "html" => Self::Html,
            "value" | "val" => Self::Value,
            "width" => Self::Dimension(Dimension::Width),
            "height" => Self::Dimension(Dimension::Height),
            "selected" | "checked" | "readonly" | "disabled" => Self::Property(key.to_string()),
            "display" | "visible" => Self::Visibility,
            other => Self::Generic(other.to_string()),
        }
    }
}

/// Registry key of a binding within one record's entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub selector: String,
    pub attribute: String,
}

impl BindingKey {
    pub fn new(selector: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attribute: attribute.into(),
        }
    }
}

/// One live binding.
pub struct Binding {
    pub(crate) record: RecordRef,
    pub(crate) accessor: Accessor,
    pub(crate) negate: bool,
    pub(crate) triggers: Option<Vec<String>>,
    pub(crate) key: BindingKey,
    pub(crate) attribute: Attribute,
    pub(crate) event: Option<String>,
    pub(crate) listener: Option<Subscription>,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("record", &self.record.id())
            .field("accessor", &self.accessor)
            .field("negate", &self.negate)
            .field("triggers", &self.triggers)
            .field("key", &self.key)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

impl Binding {
    #[must_use]
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    #[must_use]
    pub fn record(&self) -> &RecordRef {
        &self.record
    }

    /// Accessor result with negation applied.
    #[must_use]
    pub fn value(&self) -> Value {
        let raw = self.accessor.evaluate(&*self.record);
        if self.negate {
            Value::Bool(!raw.truthy())
        } else {
            raw
        }
    }

    /// Whether a change to `changed` should re-render this binding.
    #[must_use]
    pub fn is_triggered_by(&self, changed: &ChangeSet) -> bool {
        self.triggers
            .as_deref()
            .is_none_or(|triggers| changed.intersects(triggers))
    }

    #[must_use]
    pub fn info(&self) -> BindingInfo {
        BindingInfo {
            selector: self.key.selector.clone(),
            attribute: self.key.attribute.clone(),
            triggers: self.triggers.clone(),
            negate: self.negate,
            event: self.event.clone(),
        }
    }
}

/// Read-only snapshot of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub selector: String,
    pub attribute: String,
    pub triggers: Option<Vec<String>>,
    pub negate: bool,
    /// UI event name for bidirectional bindings.
    pub event: Option<String>,
}

impl BindingInfo {
    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.event.is_some()
    }
}
