#![forbid(unsafe_code)]

//! Writes a binding's value into the elements its selector resolves to.

use tracing::{trace, warn};

use crate::binding::{Attribute, Binding};
use crate::tree::{Element, ElementTree};
use crate::value::Value;

/// Render one binding.
///
/// An empty query result is logged and skipped.
pub fn render_binding(tree: &dyn ElementTree, binding: &Binding) {
    let elements = tree.query(&binding.key.selector);
    if elements.is_empty() {
        warn!(
            record = %binding.record.id(),
            selector = %binding.key.selector,
            attribute = %binding.key.attribute,
            "could not bind value: no such element found"
        );
        return;
    }
    let value = binding.value();
    trace!(
        record = %binding.record.id(),
        selector = %binding.key.selector,
        attribute = %binding.key.attribute,
        %value,
        targets = elements.len(),
        "render binding"
    );
    for element in &elements {
        apply(element.as_ref(), &binding.attribute, &value);
    }
}

/// Apply `value` to one element per the attribute table.
pub fn apply(element: &dyn Element, attribute: &Attribute, value: &Value) {
    match attribute {
        Attribute::Text => element.set_text(&value.to_display_or_empty()),
        Attribute::Html => element.set_html(&value.to_display_or_empty()),
        Attribute::Value => element.set_value(&value.to_display_or_empty()),
        Attribute::Dimension(dimension) => {
            if value.is_undefined() {
                return;
            }
            let n = value.to_number();
            if n.is_finite() {
                element.set_dimension(*dimension, n);
            }
        }
        Attribute::Property(name) => element.set_property(name, value.truthy()),
        Attribute::Visibility => element.set_visible(value.truthy()),
        Attribute::Generic(name) => {
            if value.is_undefined() {
                element.remove_attribute(name);
            } else {
                element.set_attribute(name, &value.to_display_string());
            }
        }
    }
}
