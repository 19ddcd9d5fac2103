//! Field classification.
//!
//! `classify_field` maps a field's declared type, cardinality, and owning
//! context into a [`FieldPlan`], the single tagged variant every generator
//! pattern-matches over. Classification is deterministic and total over
//! well-formed input; anything it cannot place aborts the whole file.

use crate::config::{CodegenOptions, DateMode, LongMode, OneofMode};
use crate::error::{GenerateError, GenerateResult};
use crate::schema::{
    Cardinality, FieldSchema, FieldType, MessageSchema, ScalarType, SchemaRegistry, WellKnownType,
    well_known_type,
};

/// Representation of one value of a field.
///
/// For repeated and map fields this describes the element/entry value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueShape {
    /// Scalar other than a 64-bit integer.
    Scalar(ScalarType),

    /// 64-bit integer with its configured representation.
    Long { scalar: ScalarType, mode: LongMode },

    /// Enum reference.
    Enum { name: String, string_repr: bool },

    /// Plain nested message.
    Message(String),

    /// Temporal instant with its configured representation.
    Timestamp { mode: DateMode, type_name: String },

    /// External-identifier wrapper, optionally mapped to a structured type.
    ObjectId { structured: bool, type_name: String },

    /// Dynamic JSON value, unwrapped.
    AnyValue(String),

    /// Dynamic JSON object, unwrapped.
    StructValue(String),

    /// Dynamic JSON array, unwrapped.
    ListValue(String),

    /// Path list rendered as a comma-joined string in JSON.
    FieldMask(String),

    /// Scalar wrapper message, unwrapped to `T | undefined`.
    Wrapper { scalar: ScalarType, type_name: String },
}

impl ValueShape {
    /// Whether a repeated field of this shape uses packed encoding.
    pub fn packable(&self) -> bool {
        match self {
            Self::Scalar(scalar) => scalar.packable(),
            Self::Long { .. } | Self::Enum { .. } => true,
            _ => false,
        }
    }

    /// Whether one value of this shape is length-delimited on the wire.
    pub fn wire_type(&self) -> u32 {
        match self {
            Self::Scalar(scalar) => scalar.wire_type(),
            Self::Long { scalar, .. } => scalar.wire_type(),
            Self::Enum { .. } => 0,
            _ => 2,
        }
    }

    /// Whether values of this shape carry presence (encode checks `unset`
    /// rather than comparing against a default).
    pub fn has_presence(&self) -> bool {
        !matches!(self, Self::Scalar(_) | Self::Long { .. } | Self::Enum { .. })
    }
}

/// Cardinality of a plan, after representation decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanKind {
    /// One value; `optional` means explicit presence tracking.
    Singular { optional: bool },

    /// Sequence of values; packed per the element shape.
    Repeated { packed: bool },

    /// Mapping encoded as synthetic entry submessages.
    Map {
        key: ScalarType,
        value: Box<ValueShape>,
        entry_type: String,
    },

    /// Member of a oneof represented as a discriminated union.
    OneofMember { oneof_index: usize, oneof_name: String },
}

/// The classified plan for one field, consumed by every generator.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPlan {
    pub number: u32,
    pub shape: ValueShape,
    pub kind: PlanKind,
}

impl FieldPlan {
    /// Wire tag for one value of this field: `(number << 3) | wire_type`.
    ///
    /// Repeated packed runs and map entries use the length-delimited tag
    /// instead.
    pub fn tag(&self) -> u32 {
        let wire_type = match &self.kind {
            PlanKind::Map { .. } => 2,
            PlanKind::Repeated { packed: true, .. } => 2,
            _ => self.shape.wire_type(),
        };
        (self.number << 3) | wire_type
    }
}

/// Classify one field of `message` into its [`FieldPlan`].
///
/// Decision order: oneof-union membership, then map-entry shape, then
/// well-known kind, then generic scalar/enum/message crossed with
/// cardinality.
pub fn classify_field(
    field: &FieldSchema,
    message: &MessageSchema,
    registry: &SchemaRegistry<'_>,
    options: &CodegenOptions,
) -> GenerateResult<FieldPlan> {
    if let Some(index) = field.oneof_index {
        let oneof = message.oneofs.get(index).ok_or_else(|| GenerateError::MalformedOneof {
            message: message.name.clone(),
            field: field.name.clone(),
            index,
        })?;
        if options.oneof == OneofMode::Unions {
            let shape = classify_shape(&field.field_type, field, message, registry, options)?;
            return Ok(FieldPlan {
                number: field.number,
                shape,
                kind: PlanKind::OneofMember {
                    oneof_index: index,
                    oneof_name: oneof.name.clone(),
                },
            });
        }
    }

    if field.cardinality == Cardinality::Repeated {
        if let FieldType::Message(type_name) = &field.field_type {
            if let Some(entry) = registry.message(type_name).filter(|m| m.map_entry) {
                return classify_map(field, message, entry, registry, options);
            }
        }
        let shape = classify_shape(&field.field_type, field, message, registry, options)?;
        let packed = shape.packable();
        return Ok(FieldPlan {
            number: field.number,
            shape,
            kind: PlanKind::Repeated { packed },
        });
    }

    let shape = classify_shape(&field.field_type, field, message, registry, options)?;
    let optional = field.cardinality == Cardinality::Optional || field.in_oneof();
    Ok(FieldPlan {
        number: field.number,
        shape,
        kind: PlanKind::Singular { optional },
    })
}

/// Classify a map field through its synthetic entry message.
fn classify_map(
    field: &FieldSchema,
    message: &MessageSchema,
    entry: &MessageSchema,
    registry: &SchemaRegistry<'_>,
    options: &CodegenOptions,
) -> GenerateResult<FieldPlan> {
    let malformed = || GenerateError::MalformedMapEntry {
        message: message.name.clone(),
        field: field.name.clone(),
        entry: entry.name.clone(),
    };

    let (key_field, value_field) = entry.map_entry_fields().ok_or_else(|| malformed())?;
    let key = match &key_field.field_type {
        FieldType::Scalar(scalar) if map_key_scalar(*scalar) => *scalar,
        _ => return Err(malformed()),
    };
    let value = classify_shape(&value_field.field_type, field, message, registry, options)?;

    Ok(FieldPlan {
        number: field.number,
        shape: ValueShape::Message(entry.name.clone()),
        kind: PlanKind::Map {
            key,
            value: Box::new(value),
            entry_type: entry.name.clone(),
        },
    })
}

/// Map keys are integral or string scalars; anything else is malformed.
fn map_key_scalar(scalar: ScalarType) -> bool {
    scalar == ScalarType::String || scalar == ScalarType::Bool || scalar.is_whole_number()
}

/// Classify the value shape of a declared type.
fn classify_shape(
    field_type: &FieldType,
    field: &FieldSchema,
    message: &MessageSchema,
    registry: &SchemaRegistry<'_>,
    options: &CodegenOptions,
) -> GenerateResult<ValueShape> {
    let unresolved = |type_name: &str| GenerateError::UnresolvedTypeRef {
        message: message.name.clone(),
        field: field.name.clone(),
        type_name: type_name.to_string(),
    };

    match field_type {
        FieldType::Scalar(scalar) if scalar.is_long() => Ok(ValueShape::Long {
            scalar: *scalar,
            mode: options.long,
        }),
        FieldType::Scalar(scalar) => Ok(ValueShape::Scalar(*scalar)),
        FieldType::Enum(name) => {
            registry.enum_schema(name).ok_or_else(|| unresolved(name))?;
            Ok(ValueShape::Enum {
                name: name.clone(),
                string_repr: options.string_enums,
            })
        }
        FieldType::Message(name) => {
            let target = registry.message(name).ok_or_else(|| unresolved(name))?;
            if target.map_entry {
                // An entry shape is only meaningful behind a repeated field.
                return Err(GenerateError::UnsupportedFieldKind {
                    message: message.name.clone(),
                    field: field.name.clone(),
                });
            }
            Ok(match well_known_type(name) {
                Some(WellKnownType::Timestamp) => ValueShape::Timestamp {
                    mode: options.date,
                    type_name: name.clone(),
                },
                Some(WellKnownType::Value) => ValueShape::AnyValue(name.clone()),
                Some(WellKnownType::Struct) => ValueShape::StructValue(name.clone()),
                Some(WellKnownType::ListValue) => ValueShape::ListValue(name.clone()),
                Some(WellKnownType::FieldMask) => ValueShape::FieldMask(name.clone()),
                Some(WellKnownType::ObjectId) => ValueShape::ObjectId {
                    structured: options.structured_object_id,
                    type_name: name.clone(),
                },
                Some(WellKnownType::Wrapper(scalar)) => ValueShape::Wrapper {
                    scalar,
                    type_name: name.clone(),
                },
                None => ValueShape::Message(name.clone()),
            })
        }
    }
}
