#![forbid(unsafe_code)]

//! The observable-record capability the binder depends on.
//!
//! The binder never owns records and never assumes a concrete record type.
//! Anything that can read, write and test fields, report a stable
//! identity, and notify about field changes and explicit re-render
//! requests can be bound. [`crate::reactive::Record`] is the bundled
//! implementation.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::reactive::Subscription;
use crate::value::Value;

/// Identity of a record, stable for the record's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Field names touched by one change notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    fields: SmallVec<[String; 4]>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A change set naming a single field.
    #[must_use]
    pub fn single(field: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.insert(field);
        set
    }

    /// Add a field; duplicates are ignored.
    pub fn insert(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.contains(&field) {
            self.fields.push(field);
        }
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Whether any of `fields` changed.
    #[must_use]
    pub fn intersects<S: AsRef<str>>(&self, fields: &[S]) -> bool {
        fields.iter().any(|f| self.contains(f.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

/// Callback receiving field-change notifications.
pub type ChangeListener = Box<dyn Fn(&ChangeSet)>;

/// Callback receiving explicit re-render requests.
pub type RenderListener = Box<dyn Fn()>;

/// Capability set of a bindable record.
///
/// Implementations use interior mutability: writes go through `&self` so
/// that a UI event handler holding only a shared handle can write back.
/// Notifications must be delivered synchronously and must tolerate a
/// listener writing to the same record while being notified.
pub trait ObservableRecord {
    /// Stable identity of this record.
    fn id(&self) -> RecordId;

    /// Current value of `field`, `Value::Undefined` when absent.
    fn get(&self, field: &str) -> Value;

    /// Write `field`. Emits a change notification when the stored value
    /// changes.
    fn set(&self, field: &str, value: Value);

    /// Whether `field` currently holds a value other than `Undefined`.
    fn has(&self, field: &str) -> bool;

    /// Whether the record can still be observed. Destroyed records are
    /// rejected by the binder.
    fn is_observable(&self) -> bool {
        true
    }

    /// Subscribe to field changes.
    fn on_change(&self, listener: ChangeListener) -> Subscription;

    /// Subscribe to explicit re-render requests, which are independent of
    /// field changes.
    fn on_render_request(&self, listener: RenderListener) -> Subscription;
}

/// Shared handle to a bindable record.
pub type RecordRef = Rc<dyn ObservableRecord>;

impl fmt::Debug for dyn ObservableRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({})", self.id())
    }
}
