#![forbid(unsafe_code)]

//! Property specifications and their normalized accessor form.
//!
//! A binding reads its value through an [`Accessor`]: a plain field, a
//! host-supplied computed function, or one of the two compiled expression
//! shapes produced by [`crate::expression::parse`]. Hosts describe what to
//! bind with a [`PropertySpec`], which `bind` normalizes once into a
//! [`Normalized`] accessor, negation flag and trigger list.

use std::fmt;
use std::rc::Rc;

use crate::error::BindError;
use crate::expression::{CompiledExpression, Program, Template};
use crate::record::ObservableRecord;
use crate::value::Value;

/// A host-supplied computed value.
#[derive(Clone)]
pub struct Computed(Rc<dyn Fn(&dyn ObservableRecord) -> Value>);

impl Computed {
    pub fn new(f: impl Fn(&dyn ObservableRecord) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn call(&self, record: &dyn ObservableRecord) -> Value {
        (self.0)(record)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(..)")
    }
}

/// How a binding obtains its raw value from the record.
#[derive(Debug, Clone)]
pub enum Accessor {
    /// Direct read of one field.
    Field(String),
    /// Compiled operator expression, e.g. `{a} > {b}`.
    Expression(Rc<Program>),
    /// Compiled string template, e.g. `{firstName} {lastName}`.
    Template(Rc<Template>),
    /// Host-supplied function.
    Computed(Computed),
}

impl Accessor {
    /// Evaluate against `record`.
    #[must_use]
    pub fn evaluate(&self, record: &dyn ObservableRecord) -> Value {
        match self {
            Self::Field(field) => record.get(field),
            Self::Expression(program) => program.evaluate(record),
            Self::Template(template) => Value::String(template.render(record)),
            Self::Computed(computed) => computed.call(record),
        }
    }

    /// The field a bidirectional binding writes back to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Whether the accessor is function-like (has no single field to
    /// write back to).
    #[must_use]
    pub fn is_function(&self) -> bool {
        !matches!(self, Self::Field(_))
    }
}

/// What a host asks to bind.
#[derive(Debug, Clone)]
pub enum PropertySpec {
    /// A plain field name.
    Field(String),
    /// A computed function; re-renders on any change unless triggers are
    /// given through [`PropertySpec::Structured`].
    Computed(Computed),
    /// An accessor with explicit negation and triggers.
    Structured {
        property: Box<PropertySpec>,
        negate: bool,
        triggers: Option<Vec<String>>,
    },
    /// An already compiled expression.
    Compiled(CompiledExpression),
}

impl PropertySpec {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn computed(f: impl Fn(&dyn ObservableRecord) -> Value + 'static) -> Self {
        Self::Computed(Computed::new(f))
    }

    /// Wrap this spec with a negation flag.
    #[must_use]
    pub fn negated(self) -> Self {
        match self {
            Self::Structured {
                property, triggers, ..
            } => Self::Structured {
                property,
                negate: true,
                triggers,
            },
            other => Self::Structured {
                property: Box::new(other),
                negate: true,
                triggers: None,
            },
        }
    }

    /// Wrap this spec with an explicit trigger list.
    #[must_use]
    pub fn with_triggers<S: Into<String>>(self, triggers: impl IntoIterator<Item = S>) -> Self {
        let triggers = Some(triggers.into_iter().map(Into::into).collect());
        match self {
            Self::Structured {
                property, negate, ..
            } => Self::Structured {
                property,
                negate,
                triggers,
            },
            other => Self::Structured {
                property: Box::new(other),
                negate: false,
                triggers,
            },
        }
    }

    /// Resolve into a single accessor, negation flag and trigger list.
    ///
    /// Fails with [`BindError::InvalidPropertySpec`] when the accessor is
    /// an empty field name or a structured spec nests another structured
    /// or compiled spec.
    pub fn normalize(self) -> Result<Normalized, BindError> {
        match self {
            Self::Field(name) => {
                let accessor = field_accessor(name)?;
                let triggers = accessor.field().map(|f| vec![f.to_string()]);
                Ok(Normalized {
                    accessor,
                    negate: false,
                    triggers,
                })
            }
            Self::Computed(computed) => Ok(Normalized {
                accessor: Accessor::Computed(computed),
                negate: false,
                triggers: None,
            }),
            Self::Compiled(compiled) => Ok(Normalized {
                accessor: compiled.accessor,
                negate: compiled.negate,
                triggers: Some(compiled.triggers),
            }),
            Self::Structured {
                property,
                negate,
                triggers,
            } => {
                let accessor = match *property {
                    Self::Field(name) => field_accessor(name)?,
                    Self::Computed(computed) => Accessor::Computed(computed),
                    Self::Structured { .. } | Self::Compiled(_) => {
                        return Err(BindError::InvalidPropertySpec {
                            reason: "structured property must wrap a field name or a function"
                                .to_string(),
                        });
                    }
                };
                let triggers = triggers.or_else(|| accessor.field().map(|f| vec![f.to_string()]));
                Ok(Normalized {
                    accessor,
                    negate,
                    triggers,
                })
            }
        }
    }
}

fn field_accessor(name: String) -> Result<Accessor, BindError> {
    if name.trim().is_empty() {
        return Err(BindError::InvalidPropertySpec {
            reason: "field name is empty".to_string(),
        });
    }
    Ok(Accessor::Field(name))
}

impl From<&str> for PropertySpec {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<String> for PropertySpec {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}

impl From<Computed> for PropertySpec {
    fn from(computed: Computed) -> Self {
        Self::Computed(computed)
    }
}

impl From<CompiledExpression> for PropertySpec {
    fn from(compiled: CompiledExpression) -> Self {
        Self::Compiled(compiled)
    }
}

/// A property spec after normalization. `triggers == None` re-renders on
/// any change.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub accessor: Accessor,
    pub negate: bool,
    pub triggers: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Record;

    #[test]
    fn field_triggers_on_itself() {
        let Ok(normalized) = PropertySpec::from("label").normalize() else {
            panic!("field spec must normalize");
        };
        assert_eq!(normalized.accessor.field(), Some("label"));
        assert_eq!(normalized.triggers, Some(vec!["label".to_string()]));
        assert!(!normalized.negate);
    }

    #[test]
    fn computed_triggers_on_anything() {
        let Ok(normalized) = PropertySpec::computed(|_| Value::Null).normalize() else {
            panic!("computed spec must normalize");
        };
        assert!(normalized.accessor.is_function());
        assert!(normalized.triggers.is_none());
    }

    #[test]
    fn structured_keeps_explicit_triggers() {
        let spec = PropertySpec::computed(|r| r.get("label"))
            .with_triggers(["flag", "number"])
            .negated();
        let Ok(normalized) = spec.normalize() else {
            panic!("structured spec must normalize");
        };
        assert!(normalized.negate);
        assert_eq!(
            normalized.triggers,
            Some(vec!["flag".to_string(), "number".to_string()])
        );
    }

    #[test]
    fn structured_field_defaults_triggers() {
        let Ok(normalized) = PropertySpec::field("enabled").negated().normalize() else {
            panic!("structured spec must normalize");
        };
        assert_eq!(normalized.triggers, Some(vec!["enabled".to_string()]));
    }

    #[test]
    fn empty_field_is_invalid() {
        let result = PropertySpec::from("  ").normalize();
        assert!(matches!(result, Err(BindError::InvalidPropertySpec { .. })));
    }

    #[test]
    fn nested_structured_is_invalid() {
        let nested = PropertySpec::Structured {
            property: Box::new(PropertySpec::field("a").negated()),
            negate: false,
            triggers: None,
        };
        assert!(matches!(
            nested.normalize(),
            Err(BindError::InvalidPropertySpec { .. })
        ));
    }

    #[test]
    fn accessor_evaluates_computed() {
        let record = Record::with_fields([("label", Value::from("foo"))]);
        let accessor = Accessor::Computed(Computed::new(|r| {
            Value::from(format!("{}bar", r.get("label")))
        }));
        assert_eq!(accessor.evaluate(&*record), Value::from("foobar"));
    }
}
