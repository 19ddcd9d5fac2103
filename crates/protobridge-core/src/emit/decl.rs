//! Type-surface declarations: message interfaces and enums.
//!
//! The codec procedures target these shapes; interfaces honor the oneof
//! and optional representation options, enums come with the converter
//! functions the JSON codec dispatches through.

use crate::classify::{FieldPlan, PlanKind};
use crate::config::{CodegenOptions, OptionalsMode};
use crate::error::GenerateResult;
use crate::schema::{EnumSchema, MessageSchema};

use super::naming;
use super::values;

/// Generate the `export interface` declaration for a message.
pub fn generate_interface(
    message: &MessageSchema,
    plans: &[FieldPlan],
    options: &CodegenOptions,
) -> GenerateResult<String> {
    let local = naming::local_type_name(&message.name);
    let mut code = String::new();
    code.push_str(&format!("export interface {local} {{\n"));

    if options.type_tags {
        code.push_str(&format!("  $type: \"{}\";\n", message.name));
    }

    let mut emitted_oneofs = Vec::new();
    for (field, plan) in message.fields.iter().zip(plans) {
        if let PlanKind::OneofMember { oneof_index, oneof_name } = &plan.kind {
            if emitted_oneofs.contains(oneof_index) {
                continue;
            }
            emitted_oneofs.push(*oneof_index);
            code.push_str(&oneof_union_property(message, plans, *oneof_index, oneof_name));
            continue;
        }
        code.push_str(&format!("  {};\n", property_decl(field.name.as_str(), plan, options)));
    }

    code.push_str("}\n");
    Ok(code)
}

/// One `name: type` property declaration.
fn property_decl(field_name: &str, plan: &FieldPlan, options: &CodegenOptions) -> String {
    let prop = naming::property_name(field_name);
    match &plan.kind {
        PlanKind::Repeated { .. } => {
            let question = if options.optionals == OptionalsMode::All { "?" } else { "" };
            format!("{prop}{question}: {}[]", values::ts_type(&plan.shape))
        }
        PlanKind::Map { key, value, .. } => {
            let question = if options.optionals == OptionalsMode::All { "?" } else { "" };
            let key_type = values::map_key_ts_type(*key, options);
            format!(
                "{prop}{question}: {{ [key: {key_type}]: {} }}",
                values::ts_type(value)
            )
        }
        PlanKind::Singular { optional } => {
            let presence = *optional || plan.shape.has_presence();
            let question = *optional
                || options.optionals == OptionalsMode::All
                || (options.optionals == OptionalsMode::Messages && plan.shape.has_presence());
            format!(
                "{prop}{}: {}{}",
                if question { "?" } else { "" },
                values::ts_type(&plan.shape),
                if presence { " | undefined" } else { "" }
            )
        }
        // Union members are emitted by `oneof_union_property`.
        PlanKind::OneofMember { .. } => String::new(),
    }
}

/// The single discriminated-union property for a oneof group.
fn oneof_union_property(
    message: &MessageSchema,
    plans: &[FieldPlan],
    oneof_index: usize,
    oneof_name: &str,
) -> String {
    let prop = naming::property_name(oneof_name);
    let arms: Vec<String> = message
        .fields
        .iter()
        .zip(plans)
        .filter(|(_, plan)| {
            matches!(&plan.kind, PlanKind::OneofMember { oneof_index: i, .. } if *i == oneof_index)
        })
        .map(|(field, plan)| {
            let member = naming::property_name(&field.name);
            format!(
                "{{ $case: \"{member}\"; {member}: {} }}",
                values::ts_type(&plan.shape)
            )
        })
        .collect();
    format!("  {prop}?: {};\n", arms.join(" | "))
}

/// Enum declaration plus converters referenced by the JSON codec.
#[derive(Debug, Clone)]
pub struct EnumArtifacts {
    pub local_name: String,
    pub decl: String,
    pub from_json: String,
    pub to_json: String,
    /// Only produced for string-literal enums; the binary codec needs it.
    pub to_number: Option<String>,
}

/// Generate the enum declaration and its converter functions.
pub fn generate_enum(enum_schema: &EnumSchema, options: &CodegenOptions) -> EnumArtifacts {
    let local = naming::local_type_name(&enum_schema.name);
    EnumArtifacts {
        decl: enum_decl(enum_schema, &local, options),
        from_json: enum_from_json(enum_schema, &local),
        to_json: enum_to_json(enum_schema, &local),
        to_number: options
            .string_enums
            .then(|| enum_to_number(enum_schema, &local)),
        local_name: local,
    }
}

fn enum_decl(enum_schema: &EnumSchema, local: &str, options: &CodegenOptions) -> String {
    let mut code = String::new();
    code.push_str(&format!("export enum {local} {{\n"));
    for value in &enum_schema.values {
        if options.string_enums {
            code.push_str(&format!("  {0} = \"{0}\",\n", value.name));
        } else {
            code.push_str(&format!("  {} = {},\n", value.name, value.number));
        }
    }
    if options.string_enums {
        code.push_str("  UNRECOGNIZED = \"UNRECOGNIZED\",\n");
    } else {
        code.push_str("  UNRECOGNIZED = -1,\n");
    }
    code.push_str("}\n");
    code
}

fn enum_from_json(enum_schema: &EnumSchema, local: &str) -> String {
    let name = naming::enum_converter_name(local, "FromJSON");
    let mut code = String::new();
    code.push_str(&format!("export function {name}(object: any): {local} {{\n"));
    code.push_str("  switch (object) {\n");
    for value in &enum_schema.values {
        code.push_str(&format!("    case {}:\n", value.number));
        code.push_str(&format!("    case \"{}\":\n", value.name));
        code.push_str(&format!("      return {local}.{};\n", value.name));
    }
    code.push_str("    case -1:\n");
    code.push_str("    case \"UNRECOGNIZED\":\n");
    code.push_str("    default:\n");
    code.push_str(&format!("      return {local}.UNRECOGNIZED;\n"));
    code.push_str("  }\n");
    code.push_str("}\n");
    code
}

fn enum_to_json(enum_schema: &EnumSchema, local: &str) -> String {
    let name = naming::enum_converter_name(local, "ToJSON");
    let mut code = String::new();
    code.push_str(&format!("export function {name}(object: {local}): string {{\n"));
    code.push_str("  switch (object) {\n");
    for value in &enum_schema.values {
        code.push_str(&format!("    case {local}.{}:\n", value.name));
        code.push_str(&format!("      return \"{}\";\n", value.name));
    }
    code.push_str(&format!("    case {local}.UNRECOGNIZED:\n"));
    code.push_str("    default:\n");
    code.push_str("      return \"UNRECOGNIZED\";\n");
    code.push_str("  }\n");
    code.push_str("}\n");
    code
}

fn enum_to_number(enum_schema: &EnumSchema, local: &str) -> String {
    let name = naming::enum_converter_name(local, "ToNumber");
    let mut code = String::new();
    code.push_str(&format!("export function {name}(object: {local}): number {{\n"));
    code.push_str("  switch (object) {\n");
    for value in &enum_schema.values {
        code.push_str(&format!("    case {local}.{}:\n", value.name));
        code.push_str(&format!("      return {};\n", value.number));
    }
    code.push_str(&format!("    case {local}.UNRECOGNIZED:\n"));
    code.push_str("    default:\n");
    code.push_str("      return -1;\n");
    code.push_str("  }\n");
    code.push_str("}\n");
    code
}
