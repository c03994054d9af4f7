#![forbid(unsafe_code)]

//! Shared field map with change notification.
//!
//! # Design
//!
//! [`Record`] is always handled through `Rc<Record>`; every field lives in
//! a `RefCell` so that any holder of the handle can write. When a write
//! changes a stored value (determined by `PartialEq`), the record bumps its
//! version and notifies change listeners in registration order with the
//! set of changed field names.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per notifying write (a batch write
//!    through [`Record::set_many`] counts once).
//! 2. Writing a value equal to the stored one is a no-op.
//! 3. Writing `Value::Undefined` removes the field.
//! 4. No internal borrow is held while listeners run, so a listener may
//!    write back into the same record.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Write after `destroy()` | Ignored (traced) |
//! | Validator rejects a write | Value kept; render request emitted |
//! | Validator transforms a write | Transformed value stored and notified |

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::reactive::subscription::{Listeners, Subscription};
use crate::record::{ChangeListener, ChangeSet, ObservableRecord, RecordId, RenderListener};
use crate::value::Value;

/// Field validator: returns the value to store, or a rejection reason.
pub type Validator = Box<dyn Fn(&str, &Value) -> Result<Value, String>>;

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

fn next_record_id() -> RecordId {
    RecordId(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
}

/// An observable key-value record.
pub struct Record {
    id: RecordId,
    fields: RefCell<BTreeMap<String, Value>>,
    version: Cell<u64>,
    alive: Cell<bool>,
    validator: RefCell<Option<Validator>>,
    changes: Listeners<ChangeSet>,
    render_requests: Listeners<()>,
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("fields", &self.fields.borrow())
            .field("version", &self.version.get())
            .field("alive", &self.alive.get())
            .finish()
    }
}

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Self::with_fields(std::iter::empty::<(String, Value)>())
    }

    /// Create a record holding `fields`. `Undefined` values are skipped.
    #[must_use]
    pub fn with_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Rc<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_undefined())
            .collect();
        Rc::new(Self {
            id: next_record_id(),
            fields: RefCell::new(fields),
            version: Cell::new(0),
            alive: Cell::new(true),
            validator: RefCell::new(None),
            changes: Listeners::new(),
            render_requests: Listeners::new(),
        })
    }

    /// Install a validator consulted on every write.
    pub fn set_validator(
        &self,
        validator: impl Fn(&str, &Value) -> Result<Value, String> + 'static,
    ) {
        *self.validator.borrow_mut() = Some(Box::new(validator));
    }

    pub fn clear_validator(&self) {
        self.validator.borrow_mut().take();
    }

    /// Write several fields and emit a single change notification naming
    /// every field that actually changed.
    pub fn set_many<K, V>(&self, fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        if !self.alive.get() {
            trace!(record = %self.id, "write to destroyed record ignored");
            return;
        }
        let mut changed = ChangeSet::new();
        let mut rejected = false;
        for (field, value) in fields {
            let field = field.into();
            match self.validate(&field, value.into()) {
                Some(value) => {
                    if self.store(&field, value) {
                        changed.insert(field);
                    }
                }
                None => rejected = true,
            }
        }
        if !changed.is_empty() {
            self.version.set(self.version.get() + 1);
            self.changes.emit(&changed);
        }
        if rejected {
            self.render_requests.emit(&());
        }
    }

    /// Remove a field, notifying if it was present.
    pub fn unset(&self, field: &str) {
        self.set(field, Value::Undefined);
    }

    /// Ask every bound view to re-render this record without any field
    /// having changed.
    pub fn trigger_render(&self) {
        self.render_requests.emit(&());
    }

    /// Mark the record as no longer observable and drop its listeners.
    pub fn destroy(&self) {
        debug!(record = %self.id, "record destroyed");
        self.alive.set(false);
        self.changes.clear();
        self.render_requests.clear();
    }

    /// Number of notifying writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Live change listeners.
    #[must_use]
    pub fn change_listener_count(&self) -> usize {
        self.changes.live_count()
    }

    /// Live render-request listeners.
    #[must_use]
    pub fn render_listener_count(&self) -> usize {
        self.render_requests.live_count()
    }

    fn validate(&self, field: &str, value: Value) -> Option<Value> {
        let validator = self.validator.borrow();
        let Some(validate) = validator.as_ref() else {
            return Some(value);
        };
        match validate(field, &value) {
            Ok(accepted) => Some(accepted),
            Err(reason) => {
                debug!(record = %self.id, field, %reason, "write rejected by validator");
                None
            }
        }
    }

    /// Store a value, returning whether anything changed.
    fn store(&self, field: &str, value: Value) -> bool {
        let mut fields = self.fields.borrow_mut();
        if value.is_undefined() {
            return fields.remove(field).is_some();
        }
        match fields.get(field) {
            Some(existing) if *existing == value => false,
            _ => {
                fields.insert(field.to_string(), value);
                true
            }
        }
    }
}

impl ObservableRecord for Record {
    fn id(&self) -> RecordId {
        self.id
    }

    fn get(&self, field: &str) -> Value {
        self.fields
            .borrow()
            .get(field)
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    fn set(&self, field: &str, value: Value) {
        self.set_many([(field, value)]);
    }

    fn has(&self, field: &str) -> bool {
        self.fields.borrow().contains_key(field)
    }

    fn is_observable(&self) -> bool {
        self.alive.get()
    }

    fn on_change(&self, listener: ChangeListener) -> Subscription {
        self.changes.subscribe(move |changed| listener(changed))
    }

    fn on_render_request(&self, listener: RenderListener) -> Subscription {
        self.render_requests.subscribe(move |()| listener())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Rc<Record> {
        Record::with_fields([
            ("firstName", Value::from("Joe")),
            ("lastName", Value::from("Smith")),
            ("age", Value::from(30)),
        ])
    }

    #[test]
    fn get_set_basic() {
        let record = person();
        assert_eq!(record.get("firstName"), Value::from("Joe"));
        assert_eq!(record.version(), 0);

        record.set("firstName", Value::from("Ann"));
        assert_eq!(record.get("firstName"), Value::from("Ann"));
        assert_eq!(record.version(), 1);
    }

    #[test]
    fn same_value_is_noop() {
        let record = person();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = record.on_change(Box::new(move |_| count_clone.set(count_clone.get() + 1)));

        record.set("age", Value::from(30));
        assert_eq!(count.get(), 0);
        assert_eq!(record.version(), 0);
    }

    #[test]
    fn notification_names_changed_fields() {
        let record = person();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = record.on_change(Box::new(move |changed| {
            seen_clone
                .borrow_mut()
                .push(changed.iter().map(str::to_string).collect::<Vec<_>>());
        }));

        record.set_many([
            ("firstName", Value::from("Ann")),
            ("lastName", Value::from("Smith")),
            ("age", Value::from(31)),
        ]);
        assert_eq!(*seen.borrow(), vec![vec!["firstName".to_string(), "age".to_string()]]);
        assert_eq!(record.version(), 1);
    }

    #[test]
    fn unset_removes_field() {
        let record = person();
        assert!(record.has("age"));
        record.unset("age");
        assert!(!record.has("age"));
        assert_eq!(record.get("age"), Value::Undefined);
        assert_eq!(record.version(), 1);

        record.unset("age");
        assert_eq!(record.version(), 1);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(person().id(), person().id());
    }

    #[test]
    fn listener_may_write_back() {
        let record = person();
        let weak = Rc::downgrade(&record);
        let _sub = record.on_change(Box::new(move |changed| {
            if changed.contains("firstName")
                && let Some(record) = weak.upgrade()
            {
                let upper = record.get("firstName").to_display_string().to_uppercase();
                record.set("firstName", Value::from(upper));
            }
        }));

        record.set("firstName", Value::from("ann"));
        assert_eq!(record.get("firstName"), Value::from("ANN"));
        assert_eq!(record.version(), 2);
    }

    #[test]
    fn validator_transforms() {
        let record = person();
        record.set_validator(|field, value| {
            if field == "lastName" {
                Ok(Value::from(value.to_display_string().trim().to_string()))
            } else {
                Ok(value.clone())
            }
        });
        record.set("lastName", Value::from("  Doe "));
        assert_eq!(record.get("lastName"), Value::from("Doe"));
    }

    #[test]
    fn validator_rejection_requests_render() {
        let record = person();
        record.set_validator(|_, value| {
            if value.to_number() < 0.0 {
                Err("negative".to_string())
            } else {
                Ok(value.clone())
            }
        });
        let renders = Rc::new(Cell::new(0u32));
        let renders_clone = Rc::clone(&renders);
        let _sub = record.on_render_request(Box::new(move || renders_clone.set(renders_clone.get() + 1)));

        record.set("age", Value::from(-4));
        assert_eq!(record.get("age"), Value::from(30));
        assert_eq!(renders.get(), 1);
        assert_eq!(record.version(), 0);
    }

    #[test]
    fn destroy_detaches_everything() {
        let record = person();
        let _sub = record.on_change(Box::new(|_| {}));
        assert_eq!(record.change_listener_count(), 1);

        record.destroy();
        assert!(!record.is_observable());
        assert_eq!(record.change_listener_count(), 0);

        record.set("age", Value::from(99));
        assert_eq!(record.get("age"), Value::from(30));
    }
}
