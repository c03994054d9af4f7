#![forbid(unsafe_code)]

//! Reference observable records and collections.
//!
//! The binder only needs the [`ObservableRecord`](crate::record::ObservableRecord)
//! and [`RecordCollection`] capabilities; this module provides ready-made
//! single-threaded implementations of both:
//!
//! - [`Record`]: a shared field map with change and render-request
//!   notifications, optional write validation, and explicit destruction.
//! - [`Collection`]: an ordered member list with `remove` / `reset`
//!   notifications.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! # Architecture
//!
//! Listener lists hold `Weak` callbacks whose strong halves live in the
//! returned [`Subscription`]s. Dead entries are pruned lazily during
//! notification.
//!
//! # Invariants
//!
//! 1. Listeners are notified in registration order.
//! 2. Writing a value equal to the current one notifies nobody.
//! 3. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//! 4. Notification never holds an internal borrow across a callback.

pub mod collection;
pub mod record;
pub mod subscription;

pub use collection::{Collection, CollectionRef, RecordCollection, RemoveListener, ResetListener};
pub use record::{Record, Validator};
pub use subscription::{Listeners, Subscription};
