#![forbid(unsafe_code)]

//! A view-like consumer composing a [`Binder`].
//!
//! `BoundView` holds a binding source and a declarative map and forwards
//! its lifecycle to the binder:
//!
//! | View      | Binder                                   |
//! |-----------|------------------------------------------|
//! | `mount`   | `attach_bindings(source, map, false)`    |
//! | `render`  | `render_bindings(None)`                  |
//! | `unmount` | removes what `mount` attached           |
//!
//! # Invariants
//!
//! 1. Mounting replaces every binding on the binder, as
//!    `attach_bindings` does.
//! 2. Unmounting (and dropping) removes only the bindings the last
//!    successful mount created. Bindings added to a shared binder
//!    afterwards survive, and an unmounted view releases nothing.

use std::cell::{Cell, RefCell};

use crate::binder::{Binder, BindingSource};
use crate::binding::BindingKey;
use crate::config::BinderConfig;
use crate::descriptor::BindingMap;
use crate::error::BindError;
use crate::record::RecordId;
use crate::tree::TreeRef;

#[derive(Debug)]
pub struct BoundView {
    binder: Binder,
    source: BindingSource,
    bindings: BindingMap,
    owned: RefCell<Vec<(RecordId, BindingKey)>>,
    owns_collection: Cell<bool>,
}

impl BoundView {
    pub fn new(tree: TreeRef, source: impl Into<BindingSource>, bindings: BindingMap) -> Self {
        Self::with_binder(Binder::new(tree), source, bindings)
    }

    pub fn with_config(
        tree: TreeRef,
        config: BinderConfig,
        source: impl Into<BindingSource>,
        bindings: BindingMap,
    ) -> Self {
        Self::with_binder(Binder::with_config(tree, config), source, bindings)
    }

    pub fn with_binder(
        binder: Binder,
        source: impl Into<BindingSource>,
        bindings: BindingMap,
    ) -> Self {
        Self {
            binder,
            source: source.into(),
            bindings,
            owned: RefCell::new(Vec::new()),
            owns_collection: Cell::new(false),
        }
    }

    #[must_use]
    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    #[must_use]
    pub fn source(&self) -> &BindingSource {
        &self.source
    }

    /// Replace the source. Takes effect on the next `mount`.
    pub fn set_source(&mut self, source: impl Into<BindingSource>) {
        self.source = source.into();
    }

    /// Replace the map. Takes effect on the next `mount`.
    pub fn set_bindings(&mut self, bindings: BindingMap) {
        self.bindings = bindings;
    }

    /// Attach the declarative map without rendering; call
    /// [`BoundView::render`] to paint. Re-mounting detaches first.
    pub fn mount(&self) -> Result<&Self, BindError> {
        self.binder
            .attach_bindings(&self.source, &self.bindings, Some(false))?;
        if !self.bindings.is_empty() && !matches!(self.source, BindingSource::None) {
            *self.owned.borrow_mut() = self.binder.binding_keys();
            self.owns_collection
                .set(matches!(self.source, BindingSource::Collection(_)));
        }
        Ok(self)
    }

    /// Whether a mount is currently in effect.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.owned.borrow().is_empty() || self.owns_collection.get()
    }

    pub fn render(&self) -> &Self {
        self.binder.render_bindings(None);
        self
    }

    pub fn unmount(&self) -> &Self {
        let owned = std::mem::take(&mut *self.owned.borrow_mut());
        let collections = self.owns_collection.replace(false);
        if !owned.is_empty() || collections {
            self.binder.release(&owned, collections);
        }
        self
    }
}

impl Drop for BoundView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessTree, NodeSpec};
    use crate::binder::BindOptions;
    use crate::reactive::{Collection, Record};
    use crate::record::{ObservableRecord, RecordRef};
    use crate::tree::Element;
    use crate::value::Value;
    use std::rc::Rc;

    fn tree() -> Rc<HeadlessTree> {
        HeadlessTree::new(NodeSpec::new("div").child(NodeSpec::new("h1").id("title")))
    }

    #[test]
    fn mount_then_render() {
        let tree = tree();
        let record: RecordRef = Record::with_fields([("title", Value::from("Hello"))]);
        let view = BoundView::new(
            tree.clone(),
            Rc::clone(&record),
            BindingMap::new().with("#title", "{title}"),
        );
        let Ok(_) = view.mount() else {
            panic!("mount failed");
        };
        let title = || tree.first("#title").map(|e| e.text()).unwrap_or_default();
        assert_eq!(title(), "");
        view.render();
        assert_eq!(title(), "Hello");
        record.set("title", Value::from("Bye"));
        assert_eq!(title(), "Bye");
        view.unmount();
        record.set("title", Value::from("Gone"));
        assert_eq!(title(), "Bye");
    }

    #[test]
    fn mount_without_source_is_noop() {
        let view = BoundView::new(
            tree(),
            BindingSource::None,
            BindingMap::new().with("#title", "{title}"),
        );
        assert!(view.mount().is_ok());
        assert!(view.binder().records().is_empty());
    }

    #[test]
    fn remount_does_not_duplicate() {
        let record: RecordRef = Record::with_fields([("title", Value::from("x"))]);
        let view = BoundView::new(
            tree(),
            Rc::clone(&record),
            BindingMap::new().with("#title", "{title}"),
        );
        assert!(view.mount().is_ok());
        assert!(view.mount().is_ok());
        assert_eq!(view.binder().binding_count(record.id()), 1);
    }

    #[test]
    fn dropping_unmounted_view_keeps_shared_bindings() {
        let tree = tree();
        let binder = Binder::new(tree.clone());
        let record: RecordRef = Record::with_fields([("title", Value::from("x"))]);
        let Ok(_) = binder.bind(&record, "title", BindOptions::new().selector("#title")) else {
            panic!("bind failed");
        };

        let view = BoundView::with_binder(binder.clone(), BindingSource::None, BindingMap::new());
        assert!(view.mount().is_ok());
        assert!(!view.is_mounted());
        drop(view);

        assert!(binder.is_observing(record.id()));
        record.set("title", Value::from("y"));
        assert_eq!(tree.first("#title").map(|e| e.text()).as_deref(), Some("y"));
    }

    #[test]
    fn unmount_releases_only_what_mount_attached() {
        let tree = tree();
        let binder = Binder::new(tree.clone());
        let mounted: RecordRef = Record::with_fields([("title", Value::from("a"))]);
        let view = BoundView::with_binder(
            binder.clone(),
            Rc::clone(&mounted),
            BindingMap::new().with("#title", "{title}"),
        );
        assert!(view.mount().is_ok());
        assert!(view.is_mounted());

        let outside: RecordRef = Record::with_fields([("label", Value::from("b"))]);
        assert!(
            binder
                .bind(&outside, "label", BindOptions::new().selector("h1"))
                .is_ok()
        );

        view.unmount();
        assert!(!view.is_mounted());
        assert!(!binder.is_observing(mounted.id()));
        assert!(binder.is_observing(outside.id()));
        outside.set("label", Value::from("c"));
        assert_eq!(tree.first("h1").map(|e| e.text()).as_deref(), Some("c"));
    }

    #[test]
    fn unmount_drops_collection_listeners() {
        let member: RecordRef = Record::with_fields([("title", Value::from("t"))]);
        let collection = Collection::with_members([member]);
        let view = BoundView::new(
            tree(),
            BindingSource::Collection(collection),
            BindingMap::new().with("div", BindingMap::new().with("h1", "{title}")),
        );
        assert!(view.mount().is_ok());
        assert_eq!(view.binder().collection_listener_count(), 2);
        view.unmount();
        assert_eq!(view.binder().collection_listener_count(), 0);
        assert!(view.binder().records().is_empty());
    }

    #[test]
    fn drop_detaches() {
        let record = Record::with_fields([("title", Value::from("x"))]);
        let as_ref: RecordRef = record.clone();
        let view = BoundView::new(
            tree(),
            as_ref,
            BindingMap::new().with("#title", "{title}"),
        );
        assert!(view.mount().is_ok());
        assert_eq!(record.change_listener_count(), 1);
        drop(view);
        assert_eq!(record.change_listener_count(), 0);
    }
}
