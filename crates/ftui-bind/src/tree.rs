#![forbid(unsafe_code)]

//! The UI element-tree capability the binder renders into.
//!
//! A binder is scoped to one root. It asks the tree for the elements a
//! selector resolves to within that root, writes values through
//! [`Element`], and subscribes delegated event handlers for bidirectional
//! bindings. [`crate::headless::HeadlessTree`] is the bundled in-memory
//! implementation.

use std::rc::Rc;

use crate::reactive::Subscription;

/// Numeric layout dimension of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Width,
    Height,
}

/// One element of the UI tree.
///
/// All accessors go through `&self`; implementations use interior
/// mutability so an element handle can be shared with event handlers.
pub trait Element {
    /// Plain text content.
    fn text(&self) -> String;
    fn set_text(&self, text: &str);

    /// Rich (markup) content.
    fn html(&self) -> String;
    fn set_html(&self, html: &str);

    /// Editable value.
    fn value(&self) -> String;
    fn set_value(&self, value: &str);

    /// Boolean property such as `checked` or `disabled`.
    fn property(&self, name: &str) -> bool;
    fn set_property(&self, name: &str, on: bool);

    /// Effective visibility.
    fn is_visible(&self) -> bool;
    fn set_visible(&self, visible: bool);

    /// Generic attribute.
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);
    fn remove_attribute(&self, name: &str);

    /// Numeric layout dimension.
    fn dimension(&self, dimension: Dimension) -> f64;
    fn set_dimension(&self, dimension: Dimension, value: f64);
}

/// Shared handle to an element.
pub type ElementRef = Rc<dyn Element>;

/// A UI event delivered to a delegated handler.
pub struct UiEvent {
    /// Event name, e.g. `"change"` or `"keyup"`.
    pub name: String,
    /// The element matching the handler's selector that the event is
    /// currently passing through.
    pub current_target: ElementRef,
}

impl std::fmt::Debug for UiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiEvent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Delegated event handler.
pub type EventHandler = Box<dyn Fn(&UiEvent)>;

/// Capability set of a UI tree rooted at one element.
pub trait ElementTree {
    /// Elements matching `selector` below the root, in document order.
    /// The empty selector resolves to the root itself.
    fn query(&self, selector: &str) -> Vec<ElementRef>;

    /// Subscribe `handler` to `event` on elements matching `selector`
    /// (the root itself when `selector` is empty). The handler stays
    /// attached while the returned guard lives.
    fn delegate(&self, event: &str, selector: &str, handler: EventHandler) -> Subscription;
}

/// Shared handle to a UI tree.
pub type TreeRef = Rc<dyn ElementTree>;
