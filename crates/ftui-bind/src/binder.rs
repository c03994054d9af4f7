#![forbid(unsafe_code)]

//! The binder facade.
//!
//! # Design
//!
//! A [`Binder`] owns one binding registry and renders into one element
//! tree. It is a cheap handle over shared state: record and collection
//! listeners capture a `Weak` reference to that state, so dropping the
//! last `Binder` handle silences every callback even if the records
//! outlive it.
//!
//! # Invariants
//!
//! 1. The binder listens to a record iff the record has at least one
//!    binding here.
//! 2. At most one binding exists per `(record, selector, attribute)`.
//! 3. Within one change notification, affected bindings render in
//!    registration order before the notifying write returns.
//! 4. No registry borrow is held while rendering or while dropping
//!    listener guards, so renders and UI callbacks may re-enter the binder.
//!
//! # Failure Modes
//!
//! | Condition                          | Behavior                              |
//! |------------------------------------|---------------------------------------|
//! | Record destroyed                   | `BindError::InvalidRecord`            |
//! | Computed accessor bound two-way    | `BindError::InvalidBindingCombination` |
//! | Trigger field missing on record    | `warn!`, binding still created        |
//! | Unbind of an unknown binding       | `warn!`, no-op                        |
//! | Selector resolves to no element    | `warn!`, render skipped               |
//! | Any map entry invalid on attach    | error, previous bindings kept         |

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::binding::{Attribute, Binding, BindingInfo, BindingKey};
use crate::config::BinderConfig;
use crate::descriptor::{BindingMap, Descriptor};
use crate::error::BindError;
use crate::expand::{expand, property_of};
use crate::property::{Normalized, PropertySpec};
use crate::reactive::{CollectionRef, Subscription};
use crate::record::{ChangeSet, RecordId, RecordRef};
use crate::registry::{BindingRegistry, RegistryEntry};
use crate::render::render_binding;
use crate::sync::SyncContext;
use crate::tree::{TreeRef, UiEvent};

/// Whether and how a binding writes UI changes back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TwoWay {
    #[default]
    Off,
    /// Bidirectional on the binder's configured default event.
    DefaultEvent,
    /// Bidirectional on the named event.
    Event(String),
}

/// Where and how to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    pub selector: String,
    pub attribute: String,
    pub two_way: TwoWay,
    pub auto_render: bool,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            selector: String::new(),
            attribute: String::new(),
            two_way: TwoWay::Off,
            auto_render: true,
        }
    }
}

impl BindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Write UI changes back on the default event.
    #[must_use]
    pub fn two_way(mut self) -> Self {
        self.two_way = TwoWay::DefaultEvent;
        self
    }

    /// Write UI changes back on `event`.
    #[must_use]
    pub fn two_way_on(mut self, event: impl Into<String>) -> Self {
        self.two_way = TwoWay::Event(event.into());
        self
    }

    #[must_use]
    pub fn auto_render(mut self, enabled: bool) -> Self {
        self.auto_render = enabled;
        self
    }

    fn from_descriptor(descriptor: Descriptor, auto_render: bool) -> Self {
        Self {
            selector: descriptor.selector,
            attribute: descriptor.attribute,
            two_way: descriptor.event.map_or(TwoWay::Off, TwoWay::Event),
            auto_render,
        }
    }
}

/// What a declarative map is attached to.
#[derive(Clone, Default)]
pub enum BindingSource {
    Record(RecordRef),
    Collection(CollectionRef),
    #[default]
    None,
}

impl std::fmt::Debug for BindingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Record(record) => write!(f, "Record({})", record.id()),
            Self::Collection(collection) => write!(f, "Collection(len={})", collection.len()),
            Self::None => f.write_str("None"),
        }
    }
}

impl From<RecordRef> for BindingSource {
    fn from(record: RecordRef) -> Self {
        Self::Record(record)
    }
}

impl From<CollectionRef> for BindingSource {
    fn from(collection: CollectionRef) -> Self {
        Self::Collection(collection)
    }
}

/// A validated binding waiting to be registered.
struct PreparedBinding {
    record: RecordRef,
    normalized: Normalized,
    event: Option<String>,
    key: BindingKey,
    auto_render: bool,
}

struct BinderShared {
    tree: TreeRef,
    config: BinderConfig,
    registry: RefCell<BindingRegistry>,
    collection_listeners: RefCell<Vec<Subscription>>,
}

impl BinderShared {
    fn on_record_change(&self, id: RecordId, changed: &ChangeSet) {
        let bindings = self.registry.borrow().bindings_of(id);
        if bindings.is_empty() {
            warn!(record = %id, "no bindings found for changed record");
            return;
        }
        for binding in bindings.iter().filter(|b| b.is_triggered_by(changed)) {
            render_binding(&*self.tree, binding);
        }
    }

    fn on_render_request(&self, id: RecordId) {
        let bindings = self.registry.borrow().bindings_of(id);
        trace!(record = %id, bindings = bindings.len(), "forced re-render");
        for binding in &bindings {
            render_binding(&*self.tree, binding);
        }
    }

    fn unbind_all(&self, id: Option<RecordId>) {
        let closed: Vec<RegistryEntry> = {
            let mut registry = self.registry.borrow_mut();
            match id {
                Some(id) => registry.close(id).into_iter().collect(),
                None => registry.close_all(),
            }
        };
        for entry in &closed {
            debug!(
                record = %entry.record.id(),
                bindings = entry.bindings.len(),
                "detached record listeners"
            );
        }
        drop(closed);
    }

    fn detach(&self) {
        self.unbind_all(None);
        let listeners = std::mem::take(&mut *self.collection_listeners.borrow_mut());
        if !listeners.is_empty() {
            debug!(count = listeners.len(), "detached collection listeners");
        }
        drop(listeners);
    }
}

/// Binds observable records to elements of one tree.
#[derive(Clone)]
pub struct Binder {
    shared: Rc<BinderShared>,
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder")
            .field("config", &self.shared.config)
            .field("records", &self.shared.registry.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Binder {
    /// A binder rendering into `tree` with default configuration.
    pub fn new(tree: TreeRef) -> Self {
        Self::with_config(tree, BinderConfig::default())
    }

    pub fn with_config(tree: TreeRef, config: BinderConfig) -> Self {
        Self {
            shared: Rc::new(BinderShared {
                tree,
                config,
                registry: RefCell::new(BindingRegistry::default()),
                collection_listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn tree(&self) -> &TreeRef {
        &self.shared.tree
    }

    /// Bind `property` of `record` to the elements `options` selects.
    ///
    /// Replaces any binding under the same `(selector, attribute)` key for
    /// this record, and renders immediately when `options.auto_render`.
    pub fn bind(
        &self,
        record: &RecordRef,
        property: impl Into<PropertySpec>,
        options: BindOptions,
    ) -> Result<&Self, BindError> {
        let prepared = self.prepare(record, property.into(), options)?;
        self.commit(prepared);
        Ok(self)
    }

    /// Validate a binding without touching the registry or the tree.
    fn prepare(
        &self,
        record: &RecordRef,
        property: PropertySpec,
        options: BindOptions,
    ) -> Result<PreparedBinding, BindError> {
        if !record.is_observable() {
            return Err(BindError::InvalidRecord { record: record.id() });
        }
        let normalized = property.normalize()?;

        let event = match options.two_way {
            TwoWay::Off => None,
            TwoWay::DefaultEvent => Some(self.shared.config.default_event.clone()),
            TwoWay::Event(event) => Some(event),
        };
        if event.is_some() && normalized.accessor.is_function() {
            return Err(BindError::InvalidBindingCombination {
                selector: options.selector,
                attribute: options.attribute,
            });
        }

        Ok(PreparedBinding {
            record: Rc::clone(record),
            normalized,
            event,
            key: BindingKey::new(options.selector, options.attribute),
            auto_render: options.auto_render,
        })
    }

    /// Register a validated binding. Infallible.
    fn commit(&self, prepared: PreparedBinding) {
        let PreparedBinding {
            record,
            normalized,
            event,
            key,
            auto_render,
        } = prepared;
        let id = record.id();

        if self.shared.config.warn_missing_triggers
            && let Some(triggers) = &normalized.triggers
        {
            for field in triggers.iter().filter(|f| !record.has(f)) {
                warn!(record = %id, %field, "binding to undefined record field");
            }
        }

        if !self.shared.registry.borrow().contains(id) {
            self.listen(&record);
        }

        let attribute = Attribute::classify(&key.attribute);
        let listener = match (&event, normalized.accessor.field()) {
            (Some(event), Some(field)) => {
                let context = SyncContext {
                    record: Rc::clone(&record),
                    field: field.to_string(),
                    attribute: attribute.clone(),
                    negate: normalized.negate,
                };
                Some(self.shared.tree.delegate(
                    event,
                    &key.selector,
                    Box::new(move |ui_event: &UiEvent| context.handle(ui_event)),
                ))
            }
            _ => None,
        };

        let binding = Rc::new(Binding {
            record,
            accessor: normalized.accessor,
            negate: normalized.negate,
            triggers: normalized.triggers,
            key,
            attribute,
            event,
            listener,
        });
        let replaced = self
            .shared
            .registry
            .borrow_mut()
            .insert(id, Rc::clone(&binding));
        if replaced.is_some() {
            trace!(
                record = %id,
                selector = %binding.key.selector,
                attribute = %binding.key.attribute,
                "replaced binding"
            );
        }
        drop(replaced);

        if auto_render {
            render_binding(&*self.shared.tree, &binding);
        }
    }

    fn listen(&self, record: &RecordRef) {
        let id = record.id();
        let weak: Weak<BinderShared> = Rc::downgrade(&self.shared);
        let on_change = record.on_change(Box::new(move |changed: &ChangeSet| {
            if let Some(shared) = weak.upgrade() {
                shared.on_record_change(id, changed);
            }
        }));
        let weak: Weak<BinderShared> = Rc::downgrade(&self.shared);
        let on_render = record.on_render_request(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_render_request(id);
            }
        }));
        debug!(record = %id, "attached record listeners");
        self.shared.registry.borrow_mut().open(
            id,
            RegistryEntry::new(Rc::clone(record), on_change, on_render),
        );
    }

    /// Remove the binding under `(selector, attribute)` for `record`.
    ///
    /// Dropping the record's last binding stops listening to it. Unknown
    /// bindings only warn.
    pub fn unbind(&self, record: RecordId, selector: &str, attribute: &str) -> &Self {
        let key = BindingKey::new(selector, attribute);
        let outcome = {
            let mut registry = self.shared.registry.borrow_mut();
            if registry.contains(record) {
                registry.remove(record, &key).ok_or(true)
            } else {
                Err(false)
            }
        };
        match outcome {
            Ok((binding, closed)) => {
                trace!(record = %record, selector, attribute, "unbound");
                if closed.is_some() {
                    debug!(record = %record, "detached record listeners");
                }
                drop(binding);
                drop(closed);
            }
            Err(true) => warn!(
                record = %record,
                selector,
                attribute,
                "could not unbind: no matching binding"
            ),
            Err(false) => warn!(record = %record, "could not unbind: record has no active bindings"),
        }
        self
    }

    /// Remove every binding of `record`, or of every record when `None`.
    /// Idempotent.
    pub fn unbind_all(&self, record: Option<RecordId>) -> &Self {
        self.shared.unbind_all(record);
        self
    }

    /// Re-render the bindings of `record`, or of every record when `None`.
    pub fn render_bindings(&self, record: Option<RecordId>) -> &Self {
        let bindings = {
            let registry = self.shared.registry.borrow();
            match record {
                Some(id) => registry.bindings_of(id),
                None => registry.all_bindings(),
            }
        };
        for binding in &bindings {
            render_binding(&*self.shared.tree, binding);
        }
        self
    }

    /// Bind a declarative map to `source`, replacing everything bound so
    /// far. `auto_render` defaults to the configured value.
    ///
    /// A `None` source or an empty map is a no-op. Every entry is
    /// validated before anything is detached, so on error the previous
    /// bindings stay in place and nothing from `map` is bound.
    pub fn attach_bindings(
        &self,
        source: &BindingSource,
        map: &BindingMap,
        auto_render: Option<bool>,
    ) -> Result<&Self, BindError> {
        if map.is_empty() || matches!(source, BindingSource::None) {
            return Ok(self);
        }
        let auto_render = auto_render.unwrap_or(self.shared.config.auto_render);
        match source {
            BindingSource::Record(record) => {
                let prepared = self.prepare_record(record, map, auto_render)?;
                self.detach_bindings();
                prepared.into_iter().for_each(|p| self.commit(p));
            }
            BindingSource::Collection(collection) => {
                let prepared = self.prepare_collection(collection, map, auto_render)?;
                self.detach_bindings();
                prepared.into_iter().for_each(|p| self.commit(p));
                self.listen_collection(collection);
            }
            BindingSource::None => {}
        }
        Ok(self)
    }

    fn prepare_record(
        &self,
        record: &RecordRef,
        map: &BindingMap,
        auto_render: bool,
    ) -> Result<Vec<PreparedBinding>, BindError> {
        let default_event = &self.shared.config.default_event;
        map.iter()
            .map(|(key, value)| {
                let descriptor = Descriptor::parse(key, default_event)?;
                let property = property_of(key, value)?;
                self.prepare(
                    record,
                    property,
                    BindOptions::from_descriptor(descriptor, auto_render),
                )
            })
            .collect()
    }

    fn prepare_collection(
        &self,
        collection: &CollectionRef,
        map: &BindingMap,
        auto_render: bool,
    ) -> Result<Vec<PreparedBinding>, BindError> {
        let plan = expand(&**collection, map, &self.shared.config.default_event)?;
        debug!(
            members = collection.len(),
            bindings = plan.len(),
            "expanded collection bindings"
        );
        plan.into_iter()
            .map(|planned| {
                self.prepare(
                    &planned.record,
                    planned.property,
                    BindOptions::from_descriptor(planned.descriptor, auto_render),
                )
            })
            .collect()
    }

    fn listen_collection(&self, collection: &CollectionRef) {
        let weak = Rc::downgrade(&self.shared);
        let on_remove = collection.on_remove(Box::new(move |member: &RecordRef| {
            if let Some(shared) = weak.upgrade() {
                debug!(record = %member.id(), "collection member removed");
                shared.unbind_all(Some(member.id()));
            }
        }));
        let weak = Rc::downgrade(&self.shared);
        let on_reset = collection.on_reset(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                debug!("collection reset; detaching bindings");
                shared.detach();
            }
        }));
        self.shared
            .collection_listeners
            .borrow_mut()
            .extend([on_remove, on_reset]);
    }

    /// Remove every binding and stop listening to attached collections.
    pub fn detach_bindings(&self) -> &Self {
        self.shared.detach();
        self
    }

    /// Keys of every live binding, record by record.
    pub(crate) fn binding_keys(&self) -> Vec<(RecordId, BindingKey)> {
        self.shared
            .registry
            .borrow()
            .all_bindings()
            .iter()
            .map(|binding| (binding.record.id(), binding.key.clone()))
            .collect()
    }

    /// Remove exactly the bindings under `keys`, skipping any already
    /// gone, and drop the collection listeners when `collections`.
    pub(crate) fn release(&self, keys: &[(RecordId, BindingKey)], collections: bool) {
        let removed: Vec<_> = {
            let mut registry = self.shared.registry.borrow_mut();
            keys.iter()
                .filter_map(|(id, key)| registry.remove(*id, key))
                .collect()
        };
        debug!(bindings = removed.len(), "released bindings");
        drop(removed);
        if collections {
            let listeners = std::mem::take(&mut *self.shared.collection_listeners.borrow_mut());
            drop(listeners);
        }
    }

    /// Number of bindings for `record`.
    #[must_use]
    pub fn binding_count(&self, record: RecordId) -> usize {
        self.shared
            .registry
            .borrow()
            .entry(record)
            .map_or(0, |entry| entry.bindings.len())
    }

    /// Snapshot of `record`'s bindings in registration order.
    #[must_use]
    pub fn bindings(&self, record: RecordId) -> Vec<BindingInfo> {
        self.shared
            .registry
            .borrow()
            .bindings_of(record)
            .iter()
            .map(|binding| binding.info())
            .collect()
    }

    /// Whether the binder listens to `record`.
    #[must_use]
    pub fn is_observing(&self, record: RecordId) -> bool {
        self.shared.registry.borrow().contains(record)
    }

    /// Records with at least one binding.
    #[must_use]
    pub fn records(&self) -> Vec<RecordId> {
        self.shared.registry.borrow().ids()
    }

    /// Live collection listener guards.
    #[must_use]
    pub fn collection_listener_count(&self) -> usize {
        self.shared.collection_listeners.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessTree, NodeSpec};
    use crate::reactive::{Collection, Record};
    use crate::record::ObservableRecord;
    use crate::tree::Element;
    use crate::value::Value;

    fn fixture() -> (Rc<HeadlessTree>, Binder) {
        let tree = HeadlessTree::new(
            NodeSpec::new("div")
                .child(NodeSpec::new("span").id("name"))
                .child(NodeSpec::new("input").id("age")),
        );
        let binder = Binder::new(tree.clone());
        (tree, binder)
    }

    fn text(tree: &HeadlessTree, selector: &str) -> String {
        tree.first(selector).map(|e| e.text()).unwrap_or_default()
    }

    #[test]
    fn bind_renders_and_follows_changes() {
        let (tree, binder) = fixture();
        let record: RecordRef = Record::with_fields([("name", Value::from("Joe"))]);
        let Ok(_) = binder.bind(&record, "name", BindOptions::new().selector("#name")) else {
            panic!("bind failed");
        };
        assert_eq!(text(&tree, "#name"), "Joe");
        record.set("name", Value::from("Ann"));
        assert_eq!(text(&tree, "#name"), "Ann");
    }

    #[test]
    fn auto_render_off_defers() {
        let (tree, binder) = fixture();
        let record: RecordRef = Record::with_fields([("name", Value::from("Joe"))]);
        assert!(
            binder
                .bind(
                    &record,
                    "name",
                    BindOptions::new().selector("#name").auto_render(false),
                )
                .is_ok()
        );
        assert_eq!(text(&tree, "#name"), "");
        binder.render_bindings(Some(record.id()));
        assert_eq!(text(&tree, "#name"), "Joe");
    }

    #[test]
    fn destroyed_record_is_invalid() {
        let (_tree, binder) = fixture();
        let record = Record::new();
        record.destroy();
        let record: RecordRef = record;
        assert!(matches!(
            binder.bind(&record, "x", BindOptions::new()),
            Err(BindError::InvalidRecord { .. })
        ));
        assert!(!binder.is_observing(record.id()));
    }

    #[test]
    fn computed_two_way_is_rejected() {
        let (_tree, binder) = fixture();
        let record: RecordRef = Record::new();
        let result = binder.bind(
            &record,
            PropertySpec::computed(|_| Value::Null),
            BindOptions::new().selector("#age").two_way(),
        );
        assert!(matches!(
            result,
            Err(BindError::InvalidBindingCombination { .. })
        ));
        assert!(!binder.is_observing(record.id()));
    }

    #[test]
    fn unbind_last_binding_stops_listening() {
        let (_tree, binder) = fixture();
        let record = Record::with_fields([("name", Value::from("Joe"))]);
        let as_ref: RecordRef = record.clone();
        assert!(
            binder
                .bind(&as_ref, "name", BindOptions::new().selector("#name"))
                .is_ok()
        );
        assert_eq!(record.change_listener_count(), 1);
        assert_eq!(record.render_listener_count(), 1);
        binder.unbind(record.id(), "#name", "");
        assert_eq!(record.change_listener_count(), 0);
        assert_eq!(record.render_listener_count(), 0);
        assert!(!binder.is_observing(record.id()));
        // Second unbind only warns.
        binder.unbind(record.id(), "#name", "");
    }

    #[test]
    fn unbind_removes_delegated_listener() {
        let (tree, binder) = fixture();
        let record: RecordRef = Record::with_fields([("age", Value::from(1))]);
        assert!(
            binder
                .bind(
                    &record,
                    "age",
                    BindOptions::new().selector("#age").attribute("value").two_way(),
                )
                .is_ok()
        );
        assert_eq!(tree.delegation_count(), 1);
        binder.unbind(record.id(), "#age", "value");
        assert_eq!(tree.delegation_count(), 0);
    }

    #[test]
    fn dropping_binder_silences_listeners() {
        let (tree, binder) = fixture();
        let record: RecordRef = Record::with_fields([("name", Value::from("Joe"))]);
        assert!(
            binder
                .bind(&record, "name", BindOptions::new().selector("#name"))
                .is_ok()
        );
        drop(binder);
        record.set("name", Value::from("Ann"));
        assert_eq!(text(&tree, "#name"), "Joe");
    }

    #[test]
    fn independent_binders_over_one_record() {
        let (tree_a, binder_a) = fixture();
        let (tree_b, binder_b) = fixture();
        let record: RecordRef = Record::with_fields([("name", Value::from("Joe"))]);
        assert!(
            binder_a
                .bind(&record, "name", BindOptions::new().selector("#name"))
                .is_ok()
        );
        assert!(
            binder_b
                .bind(&record, "name", BindOptions::new().selector("#name"))
                .is_ok()
        );
        binder_a.unbind_all(None);
        record.set("name", Value::from("Ann"));
        assert_eq!(text(&tree_a, "#name"), "Joe");
        assert_eq!(text(&tree_b, "#name"), "Ann");
    }

    #[test]
    fn attach_with_no_source_is_noop() {
        let (_tree, binder) = fixture();
        let map = BindingMap::new().with("#name", "{name}");
        let Ok(_) = binder.attach_bindings(&BindingSource::None, &map, None) else {
            panic!("attach should succeed");
        };
        assert!(binder.records().is_empty());
    }

    #[test]
    fn failed_attach_keeps_previous_bindings() {
        let (tree, binder) = fixture();
        let record: RecordRef = Record::with_fields([("name", Value::from("Joe"))]);
        let Ok(_) = binder.bind(&record, "name", BindOptions::new().selector("#name")) else {
            panic!("bind failed");
        };

        let map = BindingMap::new()
            .with("[title]#age", "{name}")
            .with("#age", "{name");
        assert!(matches!(
            binder.attach_bindings(&BindingSource::Record(Rc::clone(&record)), &map, None),
            Err(BindError::ExpressionCompile(_))
        ));

        let selectors: Vec<_> = binder
            .bindings(record.id())
            .into_iter()
            .map(|info| info.selector)
            .collect();
        assert_eq!(selectors, ["#name"]);
        assert_eq!(tree.first("#age").and_then(|e| e.attribute("title")), None);
        record.set("name", Value::from("Ann"));
        assert_eq!(text(&tree, "#name"), "Ann");
    }

    #[test]
    fn failed_collection_attach_keeps_previous_bindings() {
        let (_tree, binder) = fixture();
        let record: RecordRef = Record::with_fields([("name", Value::from("Joe"))]);
        let Ok(_) = binder.bind(&record, "name", BindOptions::new().selector("#name")) else {
            panic!("bind failed");
        };
        let member: RecordRef = Record::with_fields([("id", Value::from("m"))]);
        let collection = Collection::with_members([member]);
        let map = BindingMap::new().with(
            "li",
            BindingMap::new()
                .with("a", "{id}")
                .with("[@value]input", PropertySpec::computed(|_| Value::Null)),
        );
        assert!(matches!(
            binder.attach_bindings(&BindingSource::Collection(collection), &map, None),
            Err(BindError::InvalidBindingCombination { .. })
        ));
        assert_eq!(binder.records(), [record.id()]);
        assert_eq!(binder.collection_listener_count(), 0);
    }

    #[test]
    fn attach_rejects_nested_map_on_record() {
        let (_tree, binder) = fixture();
        let record: RecordRef = Record::new();
        let map = BindingMap::new().with("ul", BindingMap::new().with("a", "{x}"));
        assert!(matches!(
            binder.attach_bindings(&BindingSource::Record(record), &map, None),
            Err(BindError::InvalidMapValue { .. })
        ));
    }
}
