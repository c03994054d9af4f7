#![forbid(unsafe_code)]

//! Ordered collection of records with structural change notification.
//!
//! Members are looked up either by identity (the member's `"id"` field or
//! its [`RecordId`]) or by position. Structural changes are reported on two
//! channels: `remove` (one member left, carrying the member) and `reset`
//! (membership replaced wholesale).

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::reactive::subscription::{Listeners, Subscription};
use crate::record::{RecordId, RecordRef};

/// Callback receiving a removed member.
pub type RemoveListener = Box<dyn Fn(&RecordRef)>;

/// Callback receiving reset notifications.
pub type ResetListener = Box<dyn Fn()>;

/// Capability set of an ordered record collection.
pub trait RecordCollection {
    /// Members in order.
    fn members(&self) -> Vec<RecordRef>;

    /// Member at `index`.
    fn at(&self, index: usize) -> Option<RecordRef> {
        self.members().into_iter().nth(index)
    }

    /// Identity lookup: a member whose `"id"` field or record id renders
    /// as `key`.
    fn find(&self, key: &str) -> Option<RecordRef> {
        self.members().into_iter().find(|member| {
            member.id().to_string() == key
                || (member.has("id") && member.get("id").to_display_string() == key)
        })
    }

    fn len(&self) -> usize {
        self.members().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to member removal.
    fn on_remove(&self, listener: RemoveListener) -> Subscription;

    /// Subscribe to membership reset.
    fn on_reset(&self, listener: ResetListener) -> Subscription;
}

/// Shared handle to a record collection.
pub type CollectionRef = Rc<dyn RecordCollection>;

/// The bundled [`RecordCollection`] implementation.
#[derive(Default)]
pub struct Collection {
    members: RefCell<Vec<RecordRef>>,
    removed: Listeners<RecordRef>,
    resets: Listeners<()>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<RecordId> = self.members.borrow().iter().map(|m| m.id()).collect();
        f.debug_struct("Collection").field("members", &ids).finish()
    }
}

impl Collection {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Create a collection holding `members` in order.
    #[must_use]
    pub fn with_members(members: impl IntoIterator<Item = RecordRef>) -> Rc<Self> {
        let collection = Self::new();
        *collection.members.borrow_mut() = members.into_iter().collect();
        collection
    }

    /// Append a member. Adding does not notify; bindings for new members
    /// are created when the owner re-attaches.
    pub fn add(&self, member: RecordRef) {
        self.members.borrow_mut().push(member);
    }

    /// Remove the member with identity `id`, notifying remove listeners.
    pub fn remove(&self, id: RecordId) -> Option<RecordRef> {
        let removed = {
            let mut members = self.members.borrow_mut();
            let index = members.iter().position(|m| m.id() == id)?;
            members.remove(index)
        };
        debug!(record = %id, "collection member removed");
        self.removed.emit(&removed);
        Some(removed)
    }

    /// Replace every member, notifying reset listeners.
    pub fn reset(&self, members: impl IntoIterator<Item = RecordRef>) {
        *self.members.borrow_mut() = members.into_iter().collect();
        debug!(len = self.members.borrow().len(), "collection reset");
        self.resets.emit(&());
    }

    /// Reorder members in place without notifying. Bindings expanded
    /// before the reorder keep their positions until re-attached.
    pub fn reorder(&self, order: impl FnOnce(&mut Vec<RecordRef>)) {
        order(&mut self.members.borrow_mut());
    }
}

impl RecordCollection for Collection {
    fn members(&self) -> Vec<RecordRef> {
        self.members.borrow().clone()
    }

    fn at(&self, index: usize) -> Option<RecordRef> {
        self.members.borrow().get(index).cloned()
    }

    fn len(&self) -> usize {
        self.members.borrow().len()
    }

    fn on_remove(&self, listener: RemoveListener) -> Subscription {
        self.removed.subscribe(move |member| listener(member))
    }

    fn on_reset(&self, listener: ResetListener) -> Subscription {
        self.resets.subscribe(move |()| listener())
    }
}
