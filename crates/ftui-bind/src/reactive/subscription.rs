#![forbid(unsafe_code)]

//! Listener lists with RAII unsubscription.
//!
//! # Design
//!
//! A [`Listeners<A>`] stores callbacks as `Weak` references; the matching
//! strong `Rc` lives inside the [`Subscription`] handed back to the
//! subscriber. Dropping the guard makes the weak entry dead, and dead
//! entries are pruned lazily on the next [`Listeners::emit`].
//!
//! # Re-entrancy
//!
//! `emit` upgrades the live callbacks into a local vector and releases its
//! internal borrow before invoking any of them. A callback may therefore
//! subscribe, drop its own guard, or cause another emission on the same
//! list without tripping `RefCell` borrow rules. A callback whose guard is
//! dropped mid-emission still finishes the current call; it is simply not
//! invoked on later emissions.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type CallbackRc<A> = Rc<dyn Fn(&A)>;
type CallbackWeak<A> = Weak<dyn Fn(&A)>;

/// An ordered list of weakly held listeners receiving `&A`.
pub struct Listeners<A: ?Sized + 'static> {
    callbacks: RefCell<Vec<CallbackWeak<A>>>,
}

impl<A: ?Sized + 'static> Default for Listeners<A> {
    fn default() -> Self {
        Self {
            callbacks: RefCell::new(Vec::new()),
        }
    }
}

impl<A: ?Sized + 'static> std::fmt::Debug for Listeners<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.callbacks.borrow().len())
            .finish()
    }
}

impl<A: ?Sized + 'static> Listeners<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered for as long as the
    /// returned [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl Fn(&A) + 'static) -> Subscription {
        let strong: CallbackRc<A> = Rc::new(callback);
        self.callbacks.borrow_mut().push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Invoke every live callback in registration order.
    pub fn emit(&self, arg: &A) {
        let live: Vec<CallbackRc<A>> = {
            let mut callbacks = self.callbacks.borrow_mut();
            callbacks.retain(|w| w.strong_count() > 0);
            callbacks.iter().filter_map(Weak::upgrade).collect()
        };
        for cb in &live {
            cb(arg);
        }
    }

    /// Number of registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Number of callbacks whose guard is still alive.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.callbacks
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    /// Forget every callback. Outstanding guards become inert.
    pub fn clear(&self) {
        self.callbacks.borrow_mut().clear();
    }
}

/// RAII guard for a registered listener.
///
/// Dropping the `Subscription` drops the strong reference to the callback,
/// so the weak entry in the owning list no longer upgrades.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl Subscription {
    /// Keep `guard` alive until this subscription is dropped.
    ///
    /// Collaborators that store listeners weakly hand the strong half in
    /// here.
    pub fn new<G: std::any::Any>(guard: G) -> Self {
        Self {
            _guard: Box::new(guard),
        }
    }

    /// A guard that keeps nothing alive. Used by collaborators that have
    /// no listener to attach.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(())
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn emit_reaches_subscribers_in_order() {
        let listeners: Listeners<u32> = Listeners::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_a = Rc::clone(&log);
        let _a = listeners.subscribe(move |v| log_a.borrow_mut().push(('A', *v)));
        let log_b = Rc::clone(&log);
        let _b = listeners.subscribe(move |v| log_b.borrow_mut().push(('B', *v)));

        listeners.emit(&7);
        assert_eq!(*log.borrow(), vec![('A', 7), ('B', 7)]);
    }

    #[test]
    fn dropping_guard_unsubscribes() {
        let listeners: Listeners<()> = Listeners::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let sub = listeners.subscribe(move |()| count_clone.set(count_clone.get() + 1));
        listeners.emit(&());
        drop(sub);
        listeners.emit(&());

        assert_eq!(count.get(), 1);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn dead_entries_pruned_lazily() {
        let listeners: Listeners<()> = Listeners::new();
        let _keep = listeners.subscribe(|()| {});
        let gone = listeners.subscribe(|()| {});
        drop(gone);

        assert_eq!(listeners.len(), 2);
        assert_eq!(listeners.live_count(), 1);
        listeners.emit(&());
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn callback_may_emit_reentrantly() {
        let listeners: Rc<Listeners<u32>> = Rc::new(Listeners::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let inner = Rc::downgrade(&listeners);
        let seen_clone = Rc::clone(&seen);
        let _sub = listeners.subscribe(move |v| {
            seen_clone.borrow_mut().push(*v);
            if *v == 0
                && let Some(list) = inner.upgrade()
            {
                list.emit(&1);
            }
        });

        listeners.emit(&0);
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn callback_may_drop_its_own_guard() {
        let listeners: Listeners<()> = Listeners::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0u32));

        let slot_clone = Rc::clone(&slot);
        let count_clone = Rc::clone(&count);
        let sub = listeners.subscribe(move |()| {
            count_clone.set(count_clone.get() + 1);
            slot_clone.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        listeners.emit(&());
        listeners.emit(&());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn clear_makes_guards_inert() {
        let listeners: Listeners<()> = Listeners::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = listeners.subscribe(move |()| count_clone.set(count_clone.get() + 1));

        listeners.clear();
        listeners.emit(&());
        assert_eq!(count.get(), 0);
        assert!(listeners.is_empty());
    }
}
