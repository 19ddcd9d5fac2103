//! Resolved schema model consumed by the generators.
//!
//! The loader hands us a fully resolved graph: type references are
//! fully qualified, nested types are flattened with dotted names, and
//! synthetic map-entry messages carry the `map_entry` flag. Nothing in
//! this module mutates the graph; generation reads it by name lookup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proto scalar types, each with fixed wire-level behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
}

impl ScalarType {
    /// The wire type used for a single value of this scalar:
    /// 0 varint, 1 64-bit fixed, 2 length-delimited, 5 32-bit fixed.
    pub const fn wire_type(self) -> u32 {
        match self {
            Self::Int32
            | Self::Int64
            | Self::Uint32
            | Self::Uint64
            | Self::Sint32
            | Self::Sint64
            | Self::Bool => 0,
            Self::Fixed64 | Self::Sfixed64 | Self::Double => 1,
            Self::String | Self::Bytes => 2,
            Self::Fixed32 | Self::Sfixed32 | Self::Float => 5,
        }
    }

    /// The `protobufjs/minimal` Reader/Writer method for this scalar.
    ///
    /// The method names match the proto type names exactly.
    pub const fn codec_method(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Float => "float",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    /// Whether a repeated field of this scalar uses packed encoding.
    pub const fn packable(self) -> bool {
        !matches!(self, Self::String | Self::Bytes)
    }

    /// Whether this scalar is a 64-bit integer on the wire.
    pub const fn is_long(self) -> bool {
        matches!(
            self,
            Self::Int64 | Self::Uint64 | Self::Sint64 | Self::Fixed64 | Self::Sfixed64
        )
    }

    /// Whether this scalar is an integral type (long or not).
    pub const fn is_whole_number(self) -> bool {
        !matches!(self, Self::Double | Self::Float | Self::Bool | Self::String | Self::Bytes)
    }
}

/// Declared type of a field in the resolved graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Scalar(ScalarType),
    /// Fully-qualified enum name.
    Enum(String),
    /// Fully-qualified message name.
    Message(String),
}

/// Field cardinality as declared in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Singular,
    /// Explicit presence tracking (proto3 `optional`).
    Optional,
    Repeated,
}

/// A single field of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,

    /// Field number, unique within the owning message.
    pub number: u32,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub cardinality: Cardinality,

    /// Index into the owning message's oneof list, if any.
    #[serde(default)]
    pub oneof_index: Option<usize>,
}

impl FieldSchema {
    /// Whether this field belongs to a oneof group.
    pub const fn in_oneof(&self) -> bool {
        self.oneof_index.is_some()
    }
}

/// A oneof group; member fields reference it by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneofSchema {
    pub name: String,
}

/// A message definition with a fully-qualified dotted name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSchema {
    /// Fully-qualified name, e.g. `pkg.Outer.Inner`.
    pub name: String,

    #[serde(default)]
    pub fields: Vec<FieldSchema>,

    #[serde(default)]
    pub oneofs: Vec<OneofSchema>,

    /// Synthetic two-field `key`/`value` message backing a map field.
    #[serde(default)]
    pub map_entry: bool,
}

impl MessageSchema {
    /// The `key` (number 1) and `value` (number 2) fields of a map entry.
    ///
    /// Returns `None` unless this message is flagged `map_entry` and has
    /// exactly the synthetic shape.
    pub fn map_entry_fields(&self) -> Option<(&FieldSchema, &FieldSchema)> {
        if !self.map_entry || self.fields.len() != 2 {
            return None;
        }
        let key = self.fields.iter().find(|f| f.number == 1)?;
        let value = self.fields.iter().find(|f| f.number == 2)?;
        Some((key, value))
    }
}

/// A named enum value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

/// An enum definition with a fully-qualified dotted name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumSchema {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl EnumSchema {
    /// The default value: the entry numbered 0, or the first declared.
    pub fn zero_value(&self) -> Option<&EnumValue> {
        self.values
            .iter()
            .find(|v| v.number == 0)
            .or_else(|| self.values.first())
    }
}

/// One generation unit: the types destined for a single output module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Output module path without extension, e.g. `user/profile`.
    pub module: String,

    /// Proto package of the contained types, possibly empty.
    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub messages: Vec<MessageSchema>,

    #[serde(default)]
    pub enums: Vec<EnumSchema>,
}

/// Name lookup over the resolved schema graph.
///
/// Cross-references between generators are resolved here, never by
/// generation-time sequencing.
#[derive(Debug, Default)]
pub struct SchemaRegistry<'a> {
    messages: BTreeMap<&'a str, &'a MessageSchema>,
    enums: BTreeMap<&'a str, &'a EnumSchema>,
}

impl<'a> SchemaRegistry<'a> {
    /// Index every type of every file by fully-qualified name.
    pub fn new(files: &'a [SchemaFile]) -> Self {
        let mut registry = Self::default();
        for file in files {
            for message in &file.messages {
                registry.messages.insert(message.name.as_str(), message);
            }
            for enum_schema in &file.enums {
                registry.enums.insert(enum_schema.name.as_str(), enum_schema);
            }
        }
        registry
    }

    pub fn message(&self, name: &str) -> Option<&'a MessageSchema> {
        self.messages.get(trim_leading_dot(name)).copied()
    }

    pub fn enum_schema(&self, name: &str) -> Option<&'a EnumSchema> {
        self.enums.get(trim_leading_dot(name)).copied()
    }
}

/// Schema types with bespoke cross-format representation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownType {
    /// `google.protobuf.Timestamp`.
    Timestamp,
    /// `google.protobuf.Value` — any JSON value, unwrapped.
    Value,
    /// `google.protobuf.Struct` — a JSON object, unwrapped.
    Struct,
    /// `google.protobuf.ListValue` — a JSON array, unwrapped.
    ListValue,
    /// `google.protobuf.FieldMask` — comma-joined path list in JSON.
    FieldMask,
    /// Byte-string identifier wrapper, optionally mapped to a structured
    /// identifier type.
    ObjectId,
    /// `google.protobuf.*Value` scalar wrapper, unwrapped to `T | undefined`.
    Wrapper(ScalarType),
}

/// Well-known type mapping by fully-qualified name.
struct WellKnownMapping {
    name: &'static str,
    kind: WellKnownType,
}

const WELL_KNOWN_MAPPINGS: &[WellKnownMapping] = &[
    WellKnownMapping {
        name: "google.protobuf.Timestamp",
        kind: WellKnownType::Timestamp,
    },
    WellKnownMapping {
        name: "google.protobuf.Value",
        kind: WellKnownType::Value,
    },
    WellKnownMapping {
        name: "google.protobuf.Struct",
        kind: WellKnownType::Struct,
    },
    WellKnownMapping {
        name: "google.protobuf.ListValue",
        kind: WellKnownType::ListValue,
    },
    WellKnownMapping {
        name: "google.protobuf.FieldMask",
        kind: WellKnownType::FieldMask,
    },
    WellKnownMapping {
        name: "google.protobuf.DoubleValue",
        kind: WellKnownType::Wrapper(ScalarType::Double),
    },
    WellKnownMapping {
        name: "google.protobuf.FloatValue",
        kind: WellKnownType::Wrapper(ScalarType::Float),
    },
    WellKnownMapping {
        name: "google.protobuf.Int64Value",
        kind: WellKnownType::Wrapper(ScalarType::Int64),
    },
    WellKnownMapping {
        name: "google.protobuf.UInt64Value",
        kind: WellKnownType::Wrapper(ScalarType::Uint64),
    },
    WellKnownMapping {
        name: "google.protobuf.Int32Value",
        kind: WellKnownType::Wrapper(ScalarType::Int32),
    },
    WellKnownMapping {
        name: "google.protobuf.UInt32Value",
        kind: WellKnownType::Wrapper(ScalarType::Uint32),
    },
    WellKnownMapping {
        name: "google.protobuf.BoolValue",
        kind: WellKnownType::Wrapper(ScalarType::Bool),
    },
    WellKnownMapping {
        name: "google.protobuf.StringValue",
        kind: WellKnownType::Wrapper(ScalarType::String),
    },
    WellKnownMapping {
        name: "google.protobuf.BytesValue",
        kind: WellKnownType::Wrapper(ScalarType::Bytes),
    },
];

/// Detect a well-known type by fully-qualified name.
///
/// `ObjectId` is matched by trailing path segment so user packages can
/// place it anywhere.
pub fn well_known_type(name: &str) -> Option<WellKnownType> {
    let name = trim_leading_dot(name);
    if let Some(mapping) = WELL_KNOWN_MAPPINGS.iter().find(|m| m.name == name) {
        return Some(mapping.kind);
    }
    if name == "ObjectId" || name.ends_with(".ObjectId") {
        return Some(WellKnownType::ObjectId);
    }
    None
}

fn trim_leading_dot(name: &str) -> &str {
    name.strip_prefix('.').unwrap_or(name)
}
