//! Output module assembly.
//!
//! Takes the opaque fragments the core produced for one schema file and
//! lays them out as a final TypeScript module: header, imports, type
//! declarations, codec objects, then exactly the demanded runtime helper
//! bodies. Everything is ordered deterministically so repeated runs diff
//! clean.

use std::collections::{BTreeMap, BTreeSet};

use protobridge_core::emit::{FileArtifacts, MessageArtifacts, naming, runtime};
use protobridge_core::{CodegenOptions, SchemaFile};

use crate::descriptor::DescriptorSet;

/// Assemble one generated module into final source text.
pub fn assemble_module(
    file: &SchemaFile,
    artifacts: &FileArtifacts,
    set: &DescriptorSet,
    options: &CodegenOptions,
) -> String {
    let mut out = String::new();
    out.push_str("/* eslint-disable */\n");

    let helpers = artifacts.helpers.collect();
    let needs_long = helpers.iter().any(|h| h.needs_long());
    let needs_mongodb = helpers.iter().any(|h| h.needs_object_id_runtime());

    if needs_long {
        out.push_str("import Long from \"long\";\n");
        out.push_str("import { configure, Reader, util, Writer } from \"protobufjs/minimal\";\n");
    } else if !artifacts.messages.is_empty() {
        out.push_str("import { Reader, Writer } from \"protobufjs/minimal\";\n");
    }
    if needs_mongodb {
        out.push_str("import * as mongodb from \"mongodb\";\n");
    }
    for (path, names) in cross_module_imports(file, artifacts, set, options) {
        let names: Vec<String> = names.into_iter().collect();
        out.push_str(&format!("import {{ {} }} from \"{path}\";\n", names.join(", ")));
    }

    if !file.package.is_empty() {
        out.push_str(&format!(
            "\nexport const protobufPackage = \"{}\";\n",
            file.package
        ));
    }

    for enum_artifacts in &artifacts.enums {
        out.push('\n');
        out.push_str(&enum_artifacts.decl);
        out.push('\n');
        out.push_str(&enum_artifacts.from_json);
        out.push('\n');
        out.push_str(&enum_artifacts.to_json);
        if let Some(to_number) = &enum_artifacts.to_number {
            out.push('\n');
            out.push_str(to_number);
        }
    }

    for message in &artifacts.messages {
        out.push('\n');
        out.push_str(&message.interface_decl);
    }

    for message in &artifacts.messages {
        out.push('\n');
        out.push_str(&message.create_base);
        out.push('\n');
        out.push_str(&codec_object(message, options));
    }

    if needs_long {
        out.push('\n');
        out.push_str(&runtime::long_runtime_patch());
    }
    for helper in helpers {
        out.push('\n');
        out.push_str(&runtime::render(helper, options));
    }

    out
}

/// The `export const <Type> = { ... }` codec object for one message.
fn codec_object(message: &MessageArtifacts, options: &CodegenOptions) -> String {
    let mut properties = Vec::new();
    if options.type_tags {
        properties.push(format!("  $type: \"{}\" as const", message.type_name));
    }
    for fragment in [
        Some(&message.encode),
        Some(&message.decode),
        Some(&message.from_json),
        Some(&message.to_json),
        Some(&message.from_partial),
        message.wrap.as_ref(),
        message.unwrap.as_ref(),
    ]
    .into_iter()
    .flatten()
    {
        properties.push(indent(fragment));
    }

    format!(
        "export const {} = {{\n{},\n}};\n",
        message.local_name,
        properties.join(",\n\n")
    )
}

/// Indent a fragment two spaces for placement inside the codec object.
fn indent(fragment: &str) -> String {
    fragment
        .trim_end()
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Imports for types defined in other modules of the same run.
fn cross_module_imports(
    file: &SchemaFile,
    artifacts: &FileArtifacts,
    set: &DescriptorSet,
    options: &CodegenOptions,
) -> BTreeMap<String, BTreeSet<String>> {
    let registry = set.registry();
    let mut imports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    let mut refs = BTreeSet::new();
    for message in &artifacts.messages {
        refs.extend(message.type_refs.iter().cloned());
    }
    // The timestamp helpers construct and consume the wrapper type even
    // when no field keeps it in memory.
    if artifacts
        .helpers
        .collect()
        .iter()
        .any(|h| h.ident().contains("Timestamp"))
    {
        refs.insert("google.protobuf.Timestamp".to_string());
    }

    for type_ref in refs {
        let Some(module) = set.module_of(&type_ref) else {
            continue;
        };
        if module == file.module {
            continue;
        }
        let path = relative_module_path(&file.module, module);
        let names = imports.entry(path).or_default();
        let local = naming::local_type_name(&type_ref);
        if registry.enum_schema(&type_ref).is_some() {
            names.insert(naming::enum_converter_name(&local, "FromJSON"));
            names.insert(naming::enum_converter_name(&local, "ToJSON"));
            if options.string_enums {
                names.insert(naming::enum_converter_name(&local, "ToNumber"));
            }
        }
        names.insert(local);
    }

    imports
}

/// Relative import specifier from one module path to another.
fn relative_module_path(from: &str, to: &str) -> String {
    let from_dirs: Vec<&str> = {
        let mut parts: Vec<&str> = from.split('/').collect();
        parts.pop();
        parts
    };
    let to_parts: Vec<&str> = to.split('/').collect();

    let common = from_dirs
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_dirs.len() - common;
    let mut path = String::new();
    if ups == 0 {
        path.push_str("./");
    } else {
        for _ in 0..ups {
            path.push_str("../");
        }
    }
    path.push_str(&to_parts[common..].join("/"));
    path
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use protobridge_core::emit::generate_file;
    use test_case::test_case;

    const SET: &str = r#"{
        "files": [
            {
                "module": "user/profile",
                "package": "user",
                "messages": [
                    {
                        "name": "user.Profile",
                        "fields": [
                            { "name": "id", "number": 1, "type": { "scalar": "int32" } },
                            { "name": "name", "number": 2, "type": { "scalar": "string" } },
                            { "name": "role", "number": 3, "type": { "enum": "shared.Role" } }
                        ]
                    }
                ],
                "enums": []
            },
            {
                "module": "shared/role",
                "package": "shared",
                "enums": [
                    {
                        "name": "shared.Role",
                        "values": [
                            { "name": "ROLE_UNSPECIFIED", "number": 0 },
                            { "name": "ROLE_ADMIN", "number": 1 }
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test_case("user/profile", "shared/role", "../shared/role")]
    #[test_case("profile", "role", "./role")]
    #[test_case("a/b/c", "a/b/d", "./d")]
    #[test_case("a/b/c", "x", "../../x")]
    #[test_case("a/b", "a/b", "./b")]
    fn relative_module_path___walks_directory_levels(from: &str, to: &str, expected: &str) {
        assert_eq!(relative_module_path(from, to), expected);
    }

    #[test]
    fn assemble_module___orders_sections_deterministically() {
        let set = DescriptorSet::from_json(SET).unwrap();
        let registry = set.registry();
        let options = CodegenOptions::default();
        let artifacts = generate_file(&set.files[0], &registry, &options).unwrap();

        let first = assemble_module(&set.files[0], &artifacts, &set, &options);
        let second = assemble_module(&set.files[0], &artifacts, &set, &options);

        assert_eq!(first, second);
        assert!(first.starts_with("/* eslint-disable */\n"));

        let imports = first.find("import { Reader, Writer }").unwrap();
        let package = first.find("export const protobufPackage = \"user\";").unwrap();
        let interface = first.find("export interface Profile {").unwrap();
        let codec = first.find("export const Profile = {").unwrap();
        assert!(imports < package && package < interface && interface < codec);
    }

    #[test]
    fn assemble_module___imports_cross_module_enum_with_converters() {
        let set = DescriptorSet::from_json(SET).unwrap();
        let registry = set.registry();
        let options = CodegenOptions::default();
        let artifacts = generate_file(&set.files[0], &registry, &options).unwrap();

        let module = assemble_module(&set.files[0], &artifacts, &set, &options);

        assert!(module.contains(
            "import { Role, roleFromJSON, roleToJSON } from \"../shared/role\";"
        ));
    }

    #[test]
    fn assemble_module___emits_only_demanded_helpers() {
        let set = DescriptorSet::from_json(SET).unwrap();
        let registry = set.registry();
        let options = CodegenOptions::default();
        let artifacts = generate_file(&set.files[0], &registry, &options).unwrap();

        let module = assemble_module(&set.files[0], &artifacts, &set, &options);

        // Scalar-only message: presence checks yes, byte/long helpers no.
        assert!(module.contains("function isSet(value: any): boolean {"));
        assert!(!module.contains("function bytesFromBase64"));
        assert!(!module.contains("function longToNumber"));
        assert!(!module.contains("import Long"));
    }

    #[test]
    fn assemble_module___enum_only_module___skips_wire_imports() {
        let set = DescriptorSet::from_json(SET).unwrap();
        let registry = set.registry();
        let options = CodegenOptions::default();
        let artifacts = generate_file(&set.files[1], &registry, &options).unwrap();

        let module = assemble_module(&set.files[1], &artifacts, &set, &options);

        assert!(!module.contains("protobufjs/minimal"));
        assert!(module.contains("export enum Role {"));
        assert!(module.contains("export function roleFromJSON"));
    }

    #[test]
    fn codec_object___type_tags___lead_with_discriminant() {
        let set = DescriptorSet::from_json(SET).unwrap();
        let registry = set.registry();
        let options = CodegenOptions {
            type_tags: true,
            ..CodegenOptions::default()
        };
        let artifacts = generate_file(&set.files[0], &registry, &options).unwrap();

        let module = assemble_module(&set.files[0], &artifacts, &set, &options);

        assert!(module.contains("export const Profile = {\n  $type: \"user.Profile\" as const,"));
    }
}
