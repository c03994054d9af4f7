#![forbid(unsafe_code)]

//! Collection expansion: one binding set per collection member.
//!
//! # Design
//!
//! [`expand`] turns a binding map scoped to a collection into a flat plan
//! of `(member, descriptor, property)` triples without touching the
//! registry. For each top-level `parent => value` entry:
//!
//! | Value                                   | Plan                                              |
//! |-----------------------------------------|---------------------------------------------------|
//! | string with index marker `[k]`          | one binding on member `k`, key parsed as descriptor |
//! | string or property without marker       | treated as `{ "": value }`                        |
//! | nested map                              | every inner entry, for every member               |
//!
//! Inner descriptors are scoped as `{parent}:nth-of-type({i + 1}) {inner}`.
//!
//! # Failure Modes
//!
//! | Condition                             | Error                             |
//! |---------------------------------------|-----------------------------------|
//! | marker matches no member              | [`BindError::NoSuchMember`]       |
//! | nested map inside a nested map        | [`BindError::InvalidMapValue`]    |
//! | malformed key                         | [`BindError::InvalidDescriptor`]  |
//! | malformed expression                  | [`BindError::ExpressionCompile`]  |

use crate::descriptor::{BindingMap, Descriptor, MapValue, split_index_marker};
use crate::error::BindError;
use crate::expression::parse;
use crate::property::PropertySpec;
use crate::reactive::RecordCollection;
use crate::record::RecordRef;

/// One binding the expansion asks for.
#[derive(Debug, Clone)]
pub struct PlannedBinding {
    pub record: RecordRef,
    pub descriptor: Descriptor,
    pub property: PropertySpec,
}

/// Resolve a marker key: identity lookup first, then position when the
/// key is numeric.
pub fn resolve_member(
    collection: &dyn RecordCollection,
    key: &str,
) -> Result<RecordRef, BindError> {
    collection
        .find(key)
        .or_else(|| {
            key.parse::<usize>()
                .ok()
                .and_then(|index| collection.at(index))
        })
        .ok_or_else(|| BindError::NoSuchMember {
            key: key.to_string(),
        })
}

/// Convert a map value bound to a single record into a property spec.
pub(crate) fn property_of(descriptor: &str, value: &MapValue) -> Result<PropertySpec, BindError> {
    match value {
        MapValue::Expression(expr) => Ok(PropertySpec::Compiled(parse(expr)?)),
        MapValue::Property(spec) => Ok(spec.clone()),
        MapValue::Nested(_) => Err(BindError::InvalidMapValue {
            descriptor: descriptor.to_string(),
            reason: "nested maps are only valid under a collection".to_string(),
        }),
    }
}

/// Plan the bindings `map` produces over `collection`'s current members.
pub fn expand(
    collection: &dyn RecordCollection,
    map: &BindingMap,
    default_event: &str,
) -> Result<Vec<PlannedBinding>, BindError> {
    let members = collection.members();
    let mut plan = Vec::new();

    for (parent, value) in map.iter() {
        if let MapValue::Expression(expr) = value
            && let Some((key, rest)) = split_index_marker(expr)
        {
            let record = resolve_member(collection, &key)?;
            plan.push(PlannedBinding {
                record,
                descriptor: Descriptor::parse(parent, default_event)?,
                property: PropertySpec::Compiled(parse(&rest)?),
            });
            continue;
        }

        let inner: Vec<(Descriptor, PropertySpec)> = match value {
            MapValue::Nested(inner) => inner
                .iter()
                .map(|(key, value)| {
                    Ok((
                        Descriptor::parse(key, default_event)?,
                        property_of(key, value)?,
                    ))
                })
                .collect::<Result<_, BindError>>()?,
            single => vec![(
                Descriptor::parse("", default_event)?,
                property_of(parent, single)?,
            )],
        };

        for (index, member) in members.iter().enumerate() {
            for (descriptor, property) in &inner {
                plan.push(PlannedBinding {
                    record: member.clone(),
                    descriptor: descriptor.scoped(parent, index + 1),
                    property: property.clone(),
                });
            }
        }
    }
    Ok(plan)
}
