#![forbid(unsafe_code)]

//! Declarative two-way bindings between observable records and UI trees.
//!
//! A [`Binder`] links record fields (or expressions over them) to element
//! attributes selected within one tree root. Bindings re-render when their
//! trigger fields change and, when bidirectional, write UI edits back into
//! the record.
//!
//! # Example
//!
//! ```
//! use ftui_bind::headless::{HeadlessTree, NodeSpec};
//! use ftui_bind::tree::Element;
//! use ftui_bind::{BindOptions, Binder, ObservableRecord, Record, RecordRef, Value, parse};
//!
//! let tree = HeadlessTree::new(NodeSpec::new("div").child(NodeSpec::new("span").id("name")));
//! let binder = Binder::new(tree.clone());
//! let person: RecordRef = Record::with_fields([
//!     ("firstName", Value::from("Joe")),
//!     ("lastName", Value::from("Smith")),
//! ]);
//!
//! let Ok(expr) = parse("{firstName} {lastName}") else { unreachable!() };
//! assert!(binder.bind(&person, expr, BindOptions::new().selector("#name")).is_ok());
//! let Some(span) = tree.first("#name") else { unreachable!() };
//! assert_eq!(span.text(), "Joe Smith");
//!
//! person.set("lastName", Value::from("Doe"));
//! assert_eq!(span.text(), "Joe Doe");
//! ```

pub mod binder;
pub mod binding;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod expand;
pub mod expression;
pub mod headless;
pub mod property;
pub mod reactive;
pub mod record;
mod registry;
pub mod render;
pub mod sync;
pub mod tree;
pub mod value;
pub mod view;

pub use binder::{BindOptions, Binder, BindingSource, TwoWay};
pub use binding::{Attribute, BindingInfo, BindingKey};
pub use config::BinderConfig;
pub use descriptor::{BindingMap, Descriptor, MapValue};
pub use error::BindError;
pub use expression::{CompiledExpression, ExpressionError, ExpressionErrorKind, parse};
pub use property::{Accessor, Computed, PropertySpec};
pub use reactive::{Collection, CollectionRef, Record, RecordCollection, Subscription};
pub use record::{ChangeSet, ObservableRecord, RecordId, RecordRef};
pub use tree::{Element, ElementRef, ElementTree, TreeRef, UiEvent};
pub use value::{Value, ValueKind};
pub use view::BoundView;
