//! Zero-value factory and partial-merge generation.
//!
//! `createBase<Type>` is the decode and merge seed: decoding an empty
//! payload reproduces it exactly. `fromPartial` recursively merges a
//! sparse input over that seed and is idempotent; oneof and optional
//! fields fall back to `undefined`, never to a scalar zero.

use crate::classify::{FieldPlan, PlanKind, ValueShape};
use crate::config::{CodegenOptions, DateMode};
use crate::error::GenerateResult;
use crate::schema::{MessageSchema, SchemaRegistry};

use super::helpers::{HelperSet, RuntimeHelper};
use super::naming;
use super::values;

/// Generate the `createBase<Type>` zero-value factory.
pub fn generate_create_base(
    message: &MessageSchema,
    plans: &[FieldPlan],
    options: &CodegenOptions,
    registry: &SchemaRegistry<'_>,
) -> GenerateResult<String> {
    let local = naming::local_type_name(&message.name);
    let mut entries = Vec::new();

    if options.type_tags {
        entries.push(format!("$type: \"{}\"", message.name));
    }

    let mut emitted_oneofs = Vec::new();
    for (field, plan) in message.fields.iter().zip(plans) {
        if let PlanKind::OneofMember { oneof_index, oneof_name } = &plan.kind {
            if !emitted_oneofs.contains(oneof_index) {
                emitted_oneofs.push(*oneof_index);
                entries.push(format!("{}: undefined", naming::property_name(oneof_name)));
            }
            continue;
        }
        let prop = naming::property_name(&field.name);
        let zero = match &plan.kind {
            PlanKind::Repeated { .. } => "[]".to_string(),
            PlanKind::Map { .. } => "{}".to_string(),
            PlanKind::Singular { optional: true } => "undefined".to_string(),
            _ => values::zero_value(&plan.shape, registry)?,
        };
        entries.push(format!("{prop}: {zero}"));
    }

    Ok(format!(
        "function createBase{local}(): {local} {{\n  return {{ {} }};\n}}\n",
        entries.join(", ")
    ))
}

/// Generate the `fromPartial` merge procedure body.
pub fn generate_from_partial(
    message: &MessageSchema,
    plans: &[FieldPlan],
    options: &CodegenOptions,
    registry: &SchemaRegistry<'_>,
    helpers: &mut HelperSet,
) -> GenerateResult<String> {
    let local = naming::local_type_name(&message.name);
    let deep_partial = helpers.demand(RuntimeHelper::DeepPartial);
    let param = if message.fields.is_empty() { "_" } else { "object" };

    let mut code = String::new();
    code.push_str(&format!(
        "fromPartial({param}: {deep_partial}<{local}>): {local} {{\n"
    ));
    code.push_str(&format!("  const message = createBase{local}();\n"));

    for (field, plan) in message.fields.iter().zip(plans) {
        let prop = naming::property_name(&field.name);
        match &plan.kind {
            PlanKind::Map { key, value, .. } => {
                let key_type = values::map_key_ts_type(*key, options);
                let value_type = values::ts_type(value);
                let key_expr = values::map_key_cast(*key, options, "key");
                let converted = merge_snippet(value, "value");
                code.push_str(&format!(
                    "  message.{prop} = Object.entries(object.{prop} ?? {{}}).reduce<{{ [key: {key_type}]: {value_type} }}>((acc, [key, value]) => {{\n"
                ));
                code.push_str("    if (value !== undefined) {\n");
                code.push_str(&format!("      acc[{key_expr}] = {converted};\n"));
                code.push_str("    }\n");
                code.push_str("    return acc;\n");
                code.push_str("  }, {});\n");
            }
            PlanKind::Repeated { .. } => {
                let converted = merge_snippet(&plan.shape, "e");
                code.push_str(&format!(
                    "  message.{prop} = object.{prop}?.map((e) => {converted}) || [];\n"
                ));
            }
            PlanKind::OneofMember { oneof_name, .. } => {
                let group = naming::property_name(oneof_name);
                let converted = merge_snippet(&plan.shape, &format!("object.{group}.{prop}"));
                code.push_str(&format!(
                    "  if (\n    object.{group}?.$case === \"{prop}\" &&\n    object.{group}?.{prop} !== undefined &&\n    object.{group}?.{prop} !== null\n  ) {{\n"
                ));
                code.push_str(&format!(
                    "    message.{group} = {{ $case: \"{prop}\", {prop}: {converted} }};\n"
                ));
                code.push_str("  }\n");
            }
            PlanKind::Singular { optional } => {
                let fallback = if *optional {
                    "undefined".to_string()
                } else {
                    values::zero_value(&plan.shape, registry)?
                };
                let converted = merge_snippet(&plan.shape, &format!("object.{prop}"));
                if converted == format!("object.{prop}") {
                    code.push_str(&format!(
                        "  message.{prop} = object.{prop} ?? {fallback};\n"
                    ));
                } else {
                    code.push_str(&format!(
                        "  message.{prop} = (object.{prop} !== undefined && object.{prop} !== null)\n    ? {converted}\n    : {fallback};\n"
                    ));
                }
            }
        }
    }

    code.push_str("  return message;\n");
    code.push_str("}\n");
    Ok(code)
}

/// The per-value merge conversion; the identity snippet means the value
/// is a primitive copied as-is.
fn merge_snippet(shape: &ValueShape, from: &str) -> String {
    match shape {
        ValueShape::Scalar(_)
        | ValueShape::Long { .. }
        | ValueShape::Enum { .. }
        | ValueShape::AnyValue(_)
        | ValueShape::StructValue(_)
        | ValueShape::ListValue(_)
        | ValueShape::Wrapper { .. } => from.to_string(),
        ValueShape::Timestamp { mode, type_name } => match mode {
            DateMode::Date | DateMode::String => from.to_string(),
            DateMode::Timestamp => {
                format!("{}.fromPartial({from})", naming::local_type_name(type_name))
            }
        },
        ValueShape::ObjectId {
            structured,
            type_name,
        } => {
            if *structured {
                from.to_string()
            } else {
                format!("{}.fromPartial({from})", naming::local_type_name(type_name))
            }
        }
        ValueShape::Message(name) | ValueShape::FieldMask(name) => {
            format!("{}.fromPartial({from})", naming::local_type_name(name))
        }
    }
}
