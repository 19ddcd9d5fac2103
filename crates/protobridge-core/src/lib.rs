//! protobridge-core - Schema-driven TypeScript codec generation
//!
//! This crate turns a resolved schema graph plus a generation-options
//! record into matched codec procedures per message:
//! - [`SchemaFile`] / [`SchemaRegistry`] for the resolved input graph
//! - [`CodegenOptions`] for the representation matrix
//! - [`classify::classify_field`] for per-field classification
//! - [`emit::generate_file`] for the generated text fragments
//!
//! Generation is a pure function of `(schema, options)`: single-threaded,
//! no I/O, and byte-identical output for identical input.

pub mod classify;
mod config;
mod error;
pub mod emit;
mod schema;

pub use config::{
    CodegenOptions, DateMode, JsonNameMode, LongMode, OneofMode, OptionalsMode,
};
pub use error::{GenerateError, GenerateResult};
pub use schema::{
    Cardinality, EnumSchema, EnumValue, FieldSchema, FieldType, MessageSchema, OneofSchema,
    ScalarType, SchemaFile, SchemaRegistry, WellKnownType, well_known_type,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::emit::{FileArtifacts, HelperSet, MessageArtifacts, RuntimeHelper, generate_file};
    pub use crate::{
        CodegenOptions, DateMode, EnumSchema, FieldSchema, FieldType, GenerateError,
        GenerateResult, JsonNameMode, LongMode, MessageSchema, OneofMode, OptionalsMode,
        ScalarType, SchemaFile, SchemaRegistry,
    };
}
