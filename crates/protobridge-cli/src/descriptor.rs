//! Descriptor-set loading.
//!
//! The generator consumes an already resolved schema graph: a JSON
//! descriptor set whose type references are fully qualified and whose
//! nested types are flattened with dotted names. Producing that file is
//! the schema loader's job, not ours.

use anyhow::{Context, Result};
use protobridge_core::{SchemaFile, SchemaRegistry};
use serde::Deserialize;
use std::path::Path;

/// A resolved descriptor set: one entry per output module.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorSet {
    pub files: Vec<SchemaFile>,
}

impl DescriptorSet {
    /// Load a descriptor set from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read descriptor set: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    /// Parse a descriptor set from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse descriptor set")
    }

    /// Index every contained type by fully-qualified name.
    pub fn registry(&self) -> SchemaRegistry<'_> {
        SchemaRegistry::new(&self.files)
    }

    /// The module defining a fully-qualified type name, if any.
    pub fn module_of(&self, type_name: &str) -> Option<&str> {
        let type_name = type_name.strip_prefix('.').unwrap_or(type_name);
        self.files
            .iter()
            .find(|file| {
                file.messages.iter().any(|m| m.name == type_name)
                    || file.enums.iter().any(|e| e.name == type_name)
            })
            .map(|file| file.module.as_str())
    }
}
