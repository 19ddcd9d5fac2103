//! Generation options.
//!
//! One immutable [`CodegenOptions`] record is created per generation run
//! and threaded by reference into every generator call. Generators only
//! ever read it.

use crate::error::{GenerateError, GenerateResult};
use serde::{Deserialize, Serialize};

/// How oneof groups are represented in generated types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OneofMode {
    /// Each member is an independent optional property.
    #[default]
    Properties,
    /// One property holding a `{ $case, value }` discriminated union.
    Unions,
}

/// How 64-bit integers are represented in generated types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LongMode {
    /// JavaScript number, range-checked at decode time.
    #[default]
    Number,
    /// Decimal string.
    String,
    /// Native bigint.
    Bigint,
}

/// How `google.protobuf.Timestamp` fields are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateMode {
    /// Native `Date`.
    #[default]
    Date,
    /// ISO-8601 string.
    String,
    /// The raw wrapper message, untouched.
    Timestamp,
}

/// Which fields get true `?` optional properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionalsMode {
    /// Every field is always present, defaulted when absent.
    #[default]
    None,
    /// Message-typed fields are optional, scalars stay defaulted.
    Messages,
    /// Every field is optional (absent key allowed).
    All,
}

/// JSON key casing for the canonical JSON mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonNameMode {
    /// lowerCamelCase of the declared name.
    #[default]
    LowerCamel,
    /// Declared names kept verbatim.
    Keep,
}

/// The full representation matrix conditioning all generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodegenOptions {
    #[serde(default)]
    pub oneof: OneofMode,

    #[serde(default)]
    pub long: LongMode,

    #[serde(default)]
    pub date: DateMode,

    #[serde(default)]
    pub optionals: OptionalsMode,

    /// Capture unknown wire fields by tag and re-emit them on encode.
    #[serde(default)]
    pub unknown_fields: bool,

    /// Embed a `$type` literal discriminant per message.
    #[serde(default)]
    pub type_tags: bool,

    /// Map the ObjectId byte-string wrapper to a structured identifier type.
    #[serde(default)]
    pub structured_object_id: bool,

    #[serde(default)]
    pub json_field_names: JsonNameMode,

    /// Represent enums as string literal unions instead of numeric enums.
    #[serde(default)]
    pub string_enums: bool,
}

impl CodegenOptions {
    /// Reject option combinations with no valid representation.
    ///
    /// Runs before any text is emitted for the affected file.
    pub fn validate(&self) -> GenerateResult<()> {
        if self.oneof == OneofMode::Unions && self.optionals == OptionalsMode::All {
            return Err(GenerateError::ConfigConflict(
                "oneof=unions cannot be combined with optionals=all: the union property \
                 would be both absence-optional and discriminant-driven"
                    .to_string(),
            ));
        }
        if self.string_enums && self.type_tags {
            return Err(GenerateError::ConfigConflict(
                "string_enums cannot be combined with type_tags: numeric reflection tags \
                 cannot be embedded alongside string-literal enum members"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
