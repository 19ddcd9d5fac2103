//! Codec generation from classified schema types.
//!
//! The generation pipeline:
//!
//! ```text
//! SchemaFile
//!     ↓
//!  [classify] per field → FieldPlan
//!     ↓
//!  ├─→ [decl]    → interface / enum declarations
//!  ├─→ [base]    → createBase + fromPartial
//!  ├─→ [binary]  → encode + decode
//!  └─→ [json]    → toJSON + fromJSON
//!     ↓
//!  MessageArtifacts (opaque text fragments + helper demands)
//! ```
//!
//! Every generator consumes the same plans and the same options record,
//! so the four procedures stay mutually consistent: whatever encode
//! produces, decode accepts; whatever toJSON produces, fromJSON accepts.
//! The assembler downstream owns final file layout; fragments returned
//! here carry no imports or indentation context.

pub mod base;
pub mod binary;
pub mod decl;
pub mod helpers;
pub mod json;
pub mod naming;
pub mod runtime;
pub mod values;

use std::collections::BTreeSet;

use tracing::debug;

use crate::classify::{FieldPlan, PlanKind, ValueShape, classify_field};
use crate::config::{CodegenOptions, OneofMode};
use crate::error::GenerateResult;
use crate::schema::{MessageSchema, SchemaFile, SchemaRegistry, WellKnownType, well_known_type};

pub use decl::EnumArtifacts;
pub use helpers::{HelperSet, RuntimeHelper};

/// The generated fragments for one message.
///
/// Procedure fragments are method properties for the message's codec
/// object; `interface_decl` and `create_base` stand alone at module
/// level.
#[derive(Debug, Clone)]
pub struct MessageArtifacts {
    pub type_name: String,
    pub local_name: String,
    pub interface_decl: String,
    pub create_base: String,
    pub encode: String,
    pub decode: String,
    pub from_json: String,
    pub to_json: String,
    pub from_partial: String,
    /// `wrap`/`unwrap` statics, only when the message itself is a
    /// dynamic well-known type.
    pub wrap: Option<String>,
    pub unwrap: Option<String>,
    /// Fully-qualified names of every type the fragments reference.
    pub type_refs: BTreeSet<String>,
}

/// The generated fragments for one output module.
#[derive(Debug, Clone)]
pub struct FileArtifacts {
    pub module: String,
    pub messages: Vec<MessageArtifacts>,
    pub enums: Vec<EnumArtifacts>,
    pub helpers: HelperSet,
}

/// Generate every type of one schema file.
///
/// Fails atomically: the first classification or configuration error
/// aborts the whole file with no partial output.
pub fn generate_file(
    file: &SchemaFile,
    registry: &SchemaRegistry<'_>,
    options: &CodegenOptions,
) -> GenerateResult<FileArtifacts> {
    options.validate()?;

    let mut helpers = HelperSet::new();
    let mut messages = Vec::with_capacity(file.messages.len());
    for message in &file.messages {
        messages.push(generate_message(message, registry, options, &mut helpers)?);
    }
    let enums = file
        .enums
        .iter()
        .map(|e| decl::generate_enum(e, options))
        .collect();

    runtime::expand_demands(&mut helpers, options);
    debug!(module = %file.module, messages = messages.len(), "generated module fragments");

    Ok(FileArtifacts {
        module: file.module.clone(),
        messages,
        enums,
        helpers,
    })
}

/// Generate the five codec procedures plus declarations for one message.
pub fn generate_message(
    message: &MessageSchema,
    registry: &SchemaRegistry<'_>,
    options: &CodegenOptions,
    helpers: &mut HelperSet,
) -> GenerateResult<MessageArtifacts> {
    debug!(message = %message.name, "generating codecs");

    let plans: Vec<FieldPlan> = message
        .fields
        .iter()
        .map(|field| classify_field(field, message, registry, options))
        .collect::<GenerateResult<_>>()?;

    let (wrap, unwrap) = match well_known_type(&message.name) {
        Some(WellKnownType::Struct) => (
            Some(wrap_struct(&naming::local_type_name(&message.name))),
            Some(unwrap_struct(&naming::local_type_name(&message.name))),
        ),
        Some(WellKnownType::Value) => (
            Some(wrap_value(&naming::local_type_name(&message.name), options)),
            Some(unwrap_value(&naming::local_type_name(&message.name), options)),
        ),
        Some(WellKnownType::ListValue) => (
            Some(wrap_list_value(&naming::local_type_name(&message.name))),
            Some(unwrap_list_value(&naming::local_type_name(&message.name))),
        ),
        _ => (None, None),
    };

    Ok(MessageArtifacts {
        type_name: message.name.clone(),
        local_name: naming::local_type_name(&message.name),
        interface_decl: decl::generate_interface(message, &plans, options)?,
        create_base: base::generate_create_base(message, &plans, options, registry)?,
        encode: binary::generate_encode(message, &plans, options, registry, helpers)?,
        decode: binary::generate_decode(message, &plans, options, helpers)?,
        from_json: json::generate_from_json(message, &plans, options, registry, helpers)?,
        to_json: json::generate_to_json(message, &plans, options, registry, helpers)?,
        from_partial: base::generate_from_partial(message, &plans, options, registry, helpers)?,
        wrap,
        unwrap,
        type_refs: collect_type_refs(&plans),
    })
}

/// Every fully-qualified type name the plans reach.
fn collect_type_refs(plans: &[FieldPlan]) -> BTreeSet<String> {
    let mut refs = BTreeSet::new();
    for plan in plans {
        collect_shape_refs(&plan.shape, &mut refs);
        if let PlanKind::Map { value, entry_type, .. } = &plan.kind {
            refs.insert(entry_type.clone());
            collect_shape_refs(value, &mut refs);
        }
    }
    refs
}

fn collect_shape_refs(shape: &ValueShape, refs: &mut BTreeSet<String>) {
    match shape {
        ValueShape::Enum { name, .. }
        | ValueShape::Message(name)
        | ValueShape::AnyValue(name)
        | ValueShape::StructValue(name)
        | ValueShape::ListValue(name)
        | ValueShape::FieldMask(name)
        | ValueShape::Timestamp { type_name: name, .. }
        | ValueShape::ObjectId { type_name: name, .. }
        | ValueShape::Wrapper { type_name: name, .. } => {
            refs.insert(name.clone());
        }
        ValueShape::Scalar(_) | ValueShape::Long { .. } => {}
    }
}

fn wrap_struct(local: &str) -> String {
    let mut code = String::new();
    code.push_str(&format!(
        "wrap(object: {{ [key: string]: any }} | undefined): {local} {{\n"
    ));
    code.push_str(&format!("  const struct = createBase{local}();\n"));
    code.push_str("  if (object !== undefined) {\n");
    code.push_str("    Object.keys(object).forEach((key) => {\n");
    code.push_str("      struct.fields[key] = object[key];\n");
    code.push_str("    });\n");
    code.push_str("  }\n");
    code.push_str("  return struct;\n");
    code.push_str("}\n");
    code
}

fn unwrap_struct(local: &str) -> String {
    let mut code = String::new();
    code.push_str(&format!(
        "unwrap(message: {local}): {{ [key: string]: any }} {{\n"
    ));
    code.push_str("  const object: { [key: string]: any } = {};\n");
    code.push_str("  Object.keys(message.fields).forEach((key) => {\n");
    code.push_str("    object[key] = message.fields[key];\n");
    code.push_str("  });\n");
    code.push_str("  return object;\n");
    code.push_str("}\n");
    code
}

fn wrap_value(local: &str, options: &CodegenOptions) -> String {
    let assign = |case: &str, value: &str| {
        if options.oneof == OneofMode::Unions {
            format!("result.kind = {{ $case: \"{case}\", {case}: {value} }};")
        } else {
            format!("result.{case} = {value};")
        }
    };
    let mut code = String::new();
    code.push_str(&format!("wrap(value: any): {local} {{\n"));
    code.push_str(&format!("  const result = createBase{local}();\n"));
    code.push_str("  if (value === null) {\n");
    code.push_str(&format!(
        "    {}\n",
        assign("nullValue", "NullValue.NULL_VALUE")
    ));
    code.push_str("  } else if (typeof value === \"boolean\") {\n");
    code.push_str(&format!("    {}\n", assign("boolValue", "value")));
    code.push_str("  } else if (typeof value === \"number\") {\n");
    code.push_str(&format!("    {}\n", assign("numberValue", "value")));
    code.push_str("  } else if (typeof value === \"string\") {\n");
    code.push_str(&format!("    {}\n", assign("stringValue", "value")));
    code.push_str("  } else if (Array.isArray(value)) {\n");
    code.push_str(&format!("    {}\n", assign("listValue", "value")));
    code.push_str("  } else if (typeof value === \"object\") {\n");
    code.push_str(&format!("    {}\n", assign("structValue", "value")));
    code.push_str("  } else if (typeof value !== \"undefined\") {\n");
    code.push_str("    throw new globalThis.Error(\"Unsupported any value type: \" + typeof value);\n");
    code.push_str("  }\n");
    code.push_str("  return result;\n");
    code.push_str("}\n");
    code
}

fn unwrap_value(local: &str, options: &CodegenOptions) -> String {
    let mut code = String::new();
    code.push_str(&format!(
        "unwrap(message: {local}): string | number | boolean | Object | null | Array<any> | undefined {{\n"
    ));
    if options.oneof == OneofMode::Unions {
        code.push_str("  if (message.kind?.$case === \"nullValue\") {\n");
        code.push_str("    return null;\n");
        for case in ["numberValue", "stringValue", "boolValue", "structValue", "listValue"] {
            code.push_str(&format!("  }} else if (message.kind?.$case === \"{case}\") {{\n"));
            code.push_str(&format!("    return message.kind?.{case};\n"));
        }
        code.push_str("  } else {\n");
        code.push_str("    return undefined;\n");
        code.push_str("  }\n");
    } else {
        for case in ["stringValue", "numberValue", "boolValue", "structValue", "listValue"] {
            code.push_str(&format!("  if (message?.{case} !== undefined) {{\n"));
            code.push_str(&format!("    return message.{case};\n"));
            code.push_str("  }\n");
        }
        code.push_str("  if (message?.nullValue !== undefined) {\n");
        code.push_str("    return null;\n");
        code.push_str("  }\n");
        code.push_str("  return undefined;\n");
    }
    code.push_str("}\n");
    code
}

fn wrap_list_value(local: &str) -> String {
    let mut code = String::new();
    code.push_str(&format!("wrap(value: Array<any> | undefined): {local} {{\n"));
    code.push_str(&format!("  const result = createBase{local}();\n"));
    code.push_str("  result.values = value ?? [];\n");
    code.push_str("  return result;\n");
    code.push_str("}\n");
    code
}

fn unwrap_list_value(local: &str) -> String {
    let mut code = String::new();
    code.push_str(&format!("unwrap(message: {local}): Array<any> {{\n"));
    code.push_str("  return message.values;\n");
    code.push_str("}\n");
    code
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::config::LongMode;
    use crate::schema::{Cardinality, FieldSchema, FieldType, ScalarType};

    fn simple_file() -> SchemaFile {
        SchemaFile {
            module: "simple".to_string(),
            package: "pkg".to_string(),
            messages: vec![MessageSchema {
                name: "pkg.Simple".to_string(),
                fields: vec![
                    FieldSchema {
                        name: "id".to_string(),
                        number: 1,
                        field_type: FieldType::Scalar(ScalarType::Int32),
                        cardinality: Cardinality::Singular,
                        oneof_index: None,
                    },
                    FieldSchema {
                        name: "total".to_string(),
                        number: 2,
                        field_type: FieldType::Scalar(ScalarType::Int64),
                        cardinality: Cardinality::Singular,
                        oneof_index: None,
                    },
                ],
                oneofs: vec![],
                map_entry: false,
            }],
            enums: vec![],
        }
    }

    #[test]
    fn generate_file___produces_all_five_procedures() {
        let file = simple_file();
        let files = vec![file.clone()];
        let registry = SchemaRegistry::new(&files);

        let artifacts = generate_file(&file, &registry, &CodegenOptions::default()).unwrap();

        assert_eq!(artifacts.messages.len(), 1);
        let message = &artifacts.messages[0];
        assert_eq!(message.local_name, "Simple");
        assert!(message.interface_decl.contains("export interface Simple"));
        assert!(message.create_base.contains("function createBaseSimple"));
        assert!(message.encode.starts_with("encode("));
        assert!(message.decode.starts_with("decode("));
        assert!(message.from_json.starts_with("fromJSON("));
        assert!(message.to_json.starts_with("toJSON("));
        assert!(message.from_partial.starts_with("fromPartial("));
        assert!(message.wrap.is_none());
    }

    #[test]
    fn generate_file___is_deterministic() {
        let file = simple_file();
        let files = vec![file.clone()];
        let registry = SchemaRegistry::new(&files);
        let options = CodegenOptions::default();

        let first = generate_file(&file, &registry, &options).unwrap();
        let second = generate_file(&file, &registry, &options).unwrap();

        assert_eq!(first.messages[0].encode, second.messages[0].encode);
        assert_eq!(first.messages[0].decode, second.messages[0].decode);
        assert_eq!(first.messages[0].from_json, second.messages[0].from_json);
        assert_eq!(first.messages[0].to_json, second.messages[0].to_json);
        assert_eq!(first.helpers.collect(), second.helpers.collect());
    }

    #[test]
    fn generate_file___collects_only_demanded_helpers() {
        let file = simple_file();
        let files = vec![file.clone()];
        let registry = SchemaRegistry::new(&files);

        let artifacts = generate_file(&file, &registry, &CodegenOptions::default()).unwrap();

        // int64 in number mode needs the overflow check; nothing in the
        // file touches bytes or timestamps.
        assert!(artifacts.helpers.contains(RuntimeHelper::LongToNumber));
        assert!(artifacts.helpers.contains(RuntimeHelper::IsSet));
        assert!(!artifacts.helpers.contains(RuntimeHelper::BytesFromBase64));
        assert!(!artifacts.helpers.contains(RuntimeHelper::FromTimestamp));
    }

    #[test]
    fn generate_file___rejects_conflicting_options_before_emitting() {
        let file = simple_file();
        let files = vec![file.clone()];
        let registry = SchemaRegistry::new(&files);
        let options = CodegenOptions {
            oneof: OneofMode::Unions,
            optionals: crate::config::OptionalsMode::All,
            ..CodegenOptions::default()
        };

        let result = generate_file(&file, &registry, &options);

        assert!(matches!(
            result,
            Err(crate::error::GenerateError::ConfigConflict(_))
        ));
    }

    #[test]
    fn generate_file___long_mode_changes_demanded_helper() {
        let file = simple_file();
        let files = vec![file.clone()];
        let registry = SchemaRegistry::new(&files);
        let options = CodegenOptions {
            long: LongMode::Bigint,
            ..CodegenOptions::default()
        };

        let artifacts = generate_file(&file, &registry, &options).unwrap();

        assert!(artifacts.helpers.contains(RuntimeHelper::LongToBigint));
        assert!(!artifacts.helpers.contains(RuntimeHelper::LongToNumber));
    }

    #[test]
    fn generate_message___struct_type___gets_wrap_and_unwrap() {
        let entry = MessageSchema {
            name: "google.protobuf.Struct.FieldsEntry".to_string(),
            fields: vec![
                FieldSchema {
                    name: "key".to_string(),
                    number: 1,
                    field_type: FieldType::Scalar(ScalarType::String),
                    cardinality: Cardinality::Singular,
                    oneof_index: None,
                },
                FieldSchema {
                    name: "value".to_string(),
                    number: 2,
                    field_type: FieldType::Message("google.protobuf.Value".to_string()),
                    cardinality: Cardinality::Singular,
                    oneof_index: None,
                },
            ],
            oneofs: vec![],
            map_entry: true,
        };
        let value = MessageSchema {
            name: "google.protobuf.Value".to_string(),
            fields: vec![],
            oneofs: vec![],
            map_entry: false,
        };
        let strukt = MessageSchema {
            name: "google.protobuf.Struct".to_string(),
            fields: vec![FieldSchema {
                name: "fields".to_string(),
                number: 1,
                field_type: FieldType::Message("google.protobuf.Struct.FieldsEntry".to_string()),
                cardinality: Cardinality::Repeated,
                oneof_index: None,
            }],
            oneofs: vec![],
            map_entry: false,
        };
        let files = vec![SchemaFile {
            module: "google/protobuf/struct".to_string(),
            package: "google.protobuf".to_string(),
            messages: vec![strukt.clone(), entry, value],
            enums: vec![],
        }];
        let registry = SchemaRegistry::new(&files);
        let mut helpers = HelperSet::new();

        let artifacts =
            generate_message(&strukt, &registry, &CodegenOptions::default(), &mut helpers)
                .unwrap();

        let wrap = artifacts.wrap.unwrap();
        assert!(wrap.contains("struct.fields[key] = object[key];"));
        let unwrap = artifacts.unwrap.unwrap();
        assert!(unwrap.contains("object[key] = message.fields[key];"));
    }
}
