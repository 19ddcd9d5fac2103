//! Manifest parsing and validation

use anyhow::{Context, Result};
use protobridge_core::CodegenOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// protobridge.toml manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub project: ProjectSection,

    #[serde(default)]
    pub codegen: CodegenOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSection {
    pub name: String,
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Descriptor-set path, relative to the manifest.
    #[serde(default)]
    pub schema: Option<String>,

    /// Output directory for generated modules, relative to the manifest.
    #[serde(default)]
    pub out_dir: Option<String>,
}

impl Manifest {
    /// Load manifest from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read manifest: {:?}", path.as_ref()))?;

        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse manifest")
    }

    /// Validate the manifest
    pub fn validate(&self) -> Result<()> {
        if self.project.name.is_empty() {
            anyhow::bail!("Project name cannot be empty");
        }

        if self.project.version.is_empty() {
            anyhow::bail!("Project version cannot be empty");
        }

        if !self.project.version.contains('.') {
            anyhow::bail!("Project version should be in semver format (e.g. 1.0.0)");
        }

        self.codegen
            .validate()
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;

        Ok(())
    }
}

/// Check command implementation
pub fn check(manifest_path: Option<String>) -> Result<()> {
    let path = manifest_path.unwrap_or_else(|| "protobridge.toml".to_string());

    println!("Checking manifest: {path}");

    let manifest = Manifest::from_file(&path)?;
    manifest.validate()?;

    println!(
        "✓ Project: {} v{}",
        manifest.project.name, manifest.project.version
    );
    println!("✓ Codegen options are consistent");

    Ok(())
}
