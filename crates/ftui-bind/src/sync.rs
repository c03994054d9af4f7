#![forbid(unsafe_code)]

//! UI-to-record write-back for bidirectional bindings.
//!
//! The delegated handler captures a [`SyncContext`] when the binding is
//! created, so a UI event never consults the registry. The write goes
//! through [`ObservableRecord::set`] and re-enters the normal change path;
//! renders never emit UI events, so there is no feedback loop.

use tracing::trace;

use crate::binding::Attribute;
use crate::record::RecordRef;
use crate::tree::{Element, UiEvent};
use crate::value::{Value, ValueKind, parse_float_prefix};

/// Everything the write-back path needs.
pub struct SyncContext {
    pub(crate) record: RecordRef,
    pub(crate) field: String,
    pub(crate) attribute: Attribute,
    pub(crate) negate: bool,
}

impl SyncContext {
    /// Read the event target, coerce, and write into the record.
    pub fn handle(&self, event: &UiEvent) {
        let raw = read(event.current_target.as_ref(), &self.attribute);
        let current = self.record.get(&self.field);
        let value = coerce(raw, current.kind(), self.negate);
        trace!(
            record = %self.record.id(),
            field = %self.field,
            event = %event.name,
            %value,
            "sync from ui"
        );
        self.record.set(&self.field, value);
    }
}

/// Inverse of the render table.
#[must_use]
pub fn read(element: &dyn Element, attribute: &Attribute) -> Value {
    match attribute {
        Attribute::Text | Attribute::Html => Value::String(element.text()),
        Attribute::Value => Value::String(element.value()),
        Attribute::Dimension(dimension) => Value::Number(element.dimension(*dimension)),
        Attribute::Property(name) => Value::Bool(element.property(name)),
        Attribute::Visibility => Value::Bool(element.is_visible()),
        Attribute::Generic(name) => element.attribute(name).map_or(Value::Undefined, Value::String),
    }
}

/// Coerce a UI value to the kind the field currently holds.
#[must_use]
pub fn coerce(raw: Value, current: ValueKind, negate: bool) -> Value {
    match current {
        ValueKind::Number => match raw {
            Value::Number(n) => Value::Number(n),
            other => Value::Number(parse_float_prefix(&other.to_display_string())),
        },
        ValueKind::Bool => Value::Bool(raw.truthy() != negate),
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessTree, NodeSpec};
    use crate::reactive::Record;
    use crate::record::ObservableRecord;
    use std::rc::Rc;

    #[test]
    fn number_fields_parse_float_prefix() {
        assert_eq!(
            coerce(Value::from("42"), ValueKind::Number, false),
            Value::from(42)
        );
        assert_eq!(
            coerce(Value::from("12.5px"), ValueKind::Number, false),
            Value::from(12.5)
        );
        let Value::Number(n) = coerce(Value::from("abc"), ValueKind::Number, false) else {
            panic!("number expected");
        };
        assert!(n.is_nan());
    }

    #[test]
    fn bool_fields_apply_negation() {
        assert_eq!(
            coerce(Value::from(true), ValueKind::Bool, true),
            Value::from(false)
        );
        assert_eq!(
            coerce(Value::from("on"), ValueKind::Bool, false),
            Value::from(true)
        );
        assert_eq!(
            coerce(Value::from(""), ValueKind::Bool, true),
            Value::from(true)
        );
    }

    #[test]
    fn other_fields_pass_through() {
        assert_eq!(
            coerce(Value::from("x"), ValueKind::String, true),
            Value::from("x")
        );
        assert_eq!(
            coerce(Value::Undefined, ValueKind::Undefined, false),
            Value::Undefined
        );
    }

    #[test]
    fn read_inverts_render_table() {
        let tree = HeadlessTree::new(
            NodeSpec::new("input")
                .value("7")
                .text("label")
                .attr("title", "t")
                .prop("checked", true)
                .size(10.0, 20.0),
        );
        let root = tree.root();
        assert_eq!(read(&root, &Attribute::Value), Value::from("7"));
        assert_eq!(read(&root, &Attribute::Html), Value::from("label"));
        assert_eq!(
            read(&root, &Attribute::Property("checked".into())),
            Value::from(true)
        );
        assert_eq!(
            read(&root, &Attribute::Dimension(crate::tree::Dimension::Height)),
            Value::from(20)
        );
        assert_eq!(read(&root, &Attribute::Visibility), Value::from(true));
        assert_eq!(
            read(&root, &Attribute::Generic("title".into())),
            Value::from("t")
        );
        assert_eq!(
            read(&root, &Attribute::Generic("missing".into())),
            Value::Undefined
        );
    }

    #[test]
    fn handle_writes_coerced_value() {
        let record = Record::with_fields([("age", Value::from(30))]);
        let tree = HeadlessTree::new(NodeSpec::new("input").value("42"));
        let context = SyncContext {
            record: Rc::clone(&record) as RecordRef,
            field: "age".into(),
            attribute: Attribute::Value,
            negate: false,
        };
        context.handle(&UiEvent {
            name: "change".into(),
            current_target: Rc::new(tree.root()),
        });
        assert_eq!(record.get("age"), Value::from(42));
    }
}
