//! Generate command implementation

use anyhow::{Context, Result};
use protobridge_core::CodegenOptions;
use protobridge_core::emit::generate_file;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::assemble::assemble_module;
use crate::descriptor::DescriptorSet;
use crate::manifest::Manifest;

/// Run generation for every module of a descriptor set.
pub fn run(
    schema: Option<String>,
    out_dir: Option<String>,
    manifest_path: Option<String>,
) -> Result<()> {
    let manifest = match &manifest_path {
        Some(path) => Some(Manifest::from_file(path)?),
        None => Path::new("protobridge.toml")
            .exists()
            .then(|| Manifest::from_file("protobridge.toml"))
            .transpose()?,
    };
    if let Some(manifest) = &manifest {
        manifest.validate()?;
    }

    let schema = schema
        .or_else(|| manifest.as_ref().and_then(|m| m.project.schema.clone()))
        .context("No descriptor set given; pass --schema or set project.schema in the manifest")?;
    let out_dir = out_dir
        .or_else(|| manifest.as_ref().and_then(|m| m.project.out_dir.clone()))
        .unwrap_or_else(|| "generated".to_string());
    let options = manifest.as_ref().map(|m| m.codegen).unwrap_or_default();
    options
        .validate()
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let set = DescriptorSet::from_file(&schema)?;
    let written = generate_all(&set, &options, Path::new(&out_dir))?;

    println!("✓ Generated {} module(s) into {out_dir}", written.len());
    for path in &written {
        println!("  {}", path.display());
    }

    Ok(())
}

/// Generate and write every module; fails before writing anything if any
/// module fails to generate.
pub fn generate_all(
    set: &DescriptorSet,
    options: &CodegenOptions,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let registry = set.registry();

    // Generate everything first so one bad module aborts the run with no
    // partial output tree.
    let mut modules = Vec::with_capacity(set.files.len());
    for file in &set.files {
        let artifacts = generate_file(file, &registry, options).with_context(|| {
            format!("Failed to generate module {}", file.module)
        })?;
        let text = assemble_module(file, &artifacts, set, options);
        modules.push((file.module.clone(), text));
    }

    let mut written = Vec::with_capacity(modules.len());
    for (module, text) in modules {
        let path = out_dir.join(format!("{module}.ts"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {parent:?}"))?;
        }
        std::fs::write(&path, text).with_context(|| format!("Failed to write {path:?}"))?;
        written.push(path);
    }

    info!(modules = written.len(), "generation complete");
    Ok(written)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    const SET: &str = r#"{
        "files": [
            {
                "module": "orders/order",
                "package": "orders",
                "messages": [
                    {
                        "name": "orders.Order",
                        "fields": [
                            { "name": "id", "number": 1, "type": { "scalar": "int64" } },
                            { "name": "note", "number": 2, "type": { "scalar": "string" } }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn generate_all___writes_one_module_per_file() {
        let set = DescriptorSet::from_json(SET).unwrap();
        let dir = std::env::temp_dir().join("protobridge-generate-test");
        let _ = std::fs::remove_dir_all(&dir);

        let written =
            generate_all(&set, &CodegenOptions::default(), &dir).unwrap();

        assert_eq!(written.len(), 1);
        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("export interface Order {"));
        assert!(text.contains("export const Order = {"));
        assert!(text.contains("function longToNumber"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn generate_all___aborts_whole_run_on_unresolved_reference() {
        let broken = r#"{
            "files": [
                {
                    "module": "broken/holder",
                    "package": "broken",
                    "messages": [
                        {
                            "name": "broken.Holder",
                            "fields": [
                                { "name": "ghost", "number": 1, "type": { "message": "broken.Ghost" } }
                            ]
                        }
                    ]
                }
            ]
        }"#;
        let set = DescriptorSet::from_json(broken).unwrap();
        let dir = std::env::temp_dir().join("protobridge-generate-abort-test");
        let _ = std::fs::remove_dir_all(&dir);

        let error = generate_all(&set, &CodegenOptions::default(), &dir).unwrap_err();

        assert!(format!("{error:#}").contains("broken/holder"));
        assert!(!dir.exists());
    }
}
