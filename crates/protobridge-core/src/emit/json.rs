//! Canonical-JSON codec generation.
//!
//! `fromJSON` is total for any object input: absent or null fields fall
//! back to the configured default and never error. `toJSON` suppresses
//! keys whose value equals the field default, except inside an active
//! oneof branch, mirroring the binary encoder's suppression rule exactly.

use crate::classify::{FieldPlan, PlanKind, ValueShape};
use crate::config::{CodegenOptions, DateMode, LongMode};
use crate::error::GenerateResult;
use crate::schema::{MessageSchema, ScalarType, SchemaRegistry};

use super::helpers::{HelperSet, RuntimeHelper};
use super::naming;
use super::values;

/// Generate the `fromJSON` procedure body.
pub fn generate_from_json(
    message: &MessageSchema,
    plans: &[FieldPlan],
    options: &CodegenOptions,
    registry: &SchemaRegistry<'_>,
    helpers: &mut HelperSet,
) -> GenerateResult<String> {
    let local = naming::local_type_name(&message.name);
    let param = if message.fields.is_empty() { "_" } else { "object" };

    let mut code = String::new();
    code.push_str(&format!("fromJSON({param}: any): {local} {{\n"));
    code.push_str("  return {\n");

    if options.type_tags {
        code.push_str(&format!("    $type: {local}.$type,\n"));
    }

    let mut emitted_oneofs = Vec::new();
    for (field, plan) in message.fields.iter().zip(plans) {
        let prop = naming::property_name(&field.name);
        let json = naming::json_name(&field.name, options.json_field_names);
        match &plan.kind {
            PlanKind::OneofMember { oneof_index, oneof_name } => {
                if emitted_oneofs.contains(oneof_index) {
                    continue;
                }
                emitted_oneofs.push(*oneof_index);
                code.push_str(&oneof_from_json(
                    message, plans, *oneof_index, oneof_name, options, helpers,
                ));
            }
            PlanKind::Map { key, value, .. } => {
                let is_object = helpers.demand(RuntimeHelper::IsObject);
                let key_type = values::map_key_ts_type(*key, options);
                let value_type = values::ts_type(value);
                let key_expr = values::map_key_cast(*key, options, "key");
                let converted = read_snippet(value, "value", options, helpers);
                code.push_str(&format!("    {prop}: {is_object}(object.{json})\n"));
                code.push_str(&format!(
                    "      ? Object.entries(object.{json}).reduce<{{ [key: {key_type}]: {value_type} }}>((acc, [key, value]) => {{\n"
                ));
                code.push_str(&format!("          acc[{key_expr}] = {converted};\n"));
                code.push_str("          return acc;\n");
                code.push_str("        }, {})\n");
                code.push_str("      : {},\n");
            }
            PlanKind::Repeated { .. } => {
                let converted = read_snippet(&plan.shape, "e", options, helpers);
                if converted == "e" {
                    code.push_str(&format!(
                        "    {prop}: Array.isArray(object?.{json}) ? [...object.{json}] : [],\n"
                    ));
                } else {
                    code.push_str(&format!(
                        "    {prop}: Array.isArray(object?.{json}) ? object.{json}.map((e: any) => {converted}) : [],\n"
                    ));
                }
            }
            PlanKind::Singular { optional } => {
                code.push_str(&singular_from_json(
                    &prop, &json, plan, *optional, options, registry, helpers,
                )?);
            }
        }
    }

    code.push_str("  };\n");
    code.push_str("}\n");
    Ok(code)
}

/// One singular field entry of the `fromJSON` object literal.
fn singular_from_json(
    prop: &str,
    json: &str,
    plan: &FieldPlan,
    optional: bool,
    options: &CodegenOptions,
    registry: &SchemaRegistry<'_>,
    helpers: &mut HelperSet,
) -> GenerateResult<String> {
    // The dynamic shapes are presence-checked by their JSON type rather
    // than by isSet, matching their unwrapped representation.
    match &plan.shape {
        ValueShape::AnyValue(_) => {
            let is_set = helpers.demand(RuntimeHelper::IsSet);
            return Ok(format!(
                "    {prop}: {is_set}(object?.{json}) ? object.{json} : undefined,\n"
            ));
        }
        ValueShape::StructValue(_) => {
            let is_object = helpers.demand(RuntimeHelper::IsObject);
            return Ok(format!(
                "    {prop}: {is_object}(object.{json}) ? object.{json} : undefined,\n"
            ));
        }
        ValueShape::ListValue(_) => {
            return Ok(format!(
                "    {prop}: Array.isArray(object.{json}) ? [...object.{json}] : undefined,\n"
            ));
        }
        _ => {}
    }

    let is_set = helpers.demand(RuntimeHelper::IsSet);
    let converted = read_snippet(&plan.shape, &format!("object.{json}"), options, helpers);
    let fallback = if optional || plan.shape.has_presence() {
        "undefined".to_string()
    } else {
        values::zero_value(&plan.shape, registry)?
    };
    Ok(format!(
        "    {prop}: {is_set}(object.{json}) ? {converted} : {fallback},\n"
    ))
}

/// The first-match-wins ternary chain for a discriminated-union oneof.
fn oneof_from_json(
    message: &MessageSchema,
    plans: &[FieldPlan],
    oneof_index: usize,
    oneof_name: &str,
    options: &CodegenOptions,
    helpers: &mut HelperSet,
) -> String {
    let group = naming::property_name(oneof_name);
    let is_set = helpers.demand(RuntimeHelper::IsSet);
    let members: Vec<(String, String, String)> = message
        .fields
        .iter()
        .zip(plans)
        .filter(|(_, plan)| {
            matches!(&plan.kind, PlanKind::OneofMember { oneof_index: i, .. } if *i == oneof_index)
        })
        .map(|(field, plan)| {
            let member = naming::property_name(&field.name);
            let json = naming::json_name(&field.name, options.json_field_names);
            let converted =
                read_snippet(&plan.shape, &format!("object.{json}"), options, helpers);
            (member, json, converted)
        })
        .collect();

    let mut code = format!("    {group}:");
    let mut indent = "      ".to_string();
    for (member, json, converted) in &members {
        code.push_str(&format!(
            " {is_set}(object.{json})\n{indent}? {{ $case: \"{member}\", {member}: {converted} }}\n{indent}:"
        ));
        indent.push_str("  ");
    }
    code.push_str(" undefined,\n");
    code
}

/// The JSON-to-memory conversion for one value at `from`.
fn read_snippet(
    shape: &ValueShape,
    from: &str,
    options: &CodegenOptions,
    helpers: &mut HelperSet,
) -> String {
    match shape {
        ValueShape::Scalar(scalar) => scalar_from_json(*scalar, from, helpers),
        ValueShape::Long { mode, .. } => match mode {
            LongMode::Number => format!("Number({from})"),
            LongMode::String => format!("String({from})"),
            LongMode::Bigint => format!("BigInt({from})"),
        },
        ValueShape::Enum { name, .. } => {
            let converter =
                naming::enum_converter_name(&naming::local_type_name(name), "FromJSON");
            format!("{converter}({from})")
        }
        ValueShape::Message(name) => {
            format!("{}.fromJSON({from})", naming::local_type_name(name))
        }
        ValueShape::Timestamp { mode, .. } => match mode {
            DateMode::String => format!("String({from})"),
            DateMode::Date | DateMode::Timestamp => {
                let from_json = helpers.demand(RuntimeHelper::FromJsonTimestamp);
                format!("{from_json}({from})")
            }
        },
        ValueShape::ObjectId {
            structured,
            type_name,
        } => {
            if *structured {
                let from_json = helpers.demand(RuntimeHelper::FromJsonObjectId);
                format!("{from_json}({from})")
            } else {
                format!("{}.fromJSON({from})", naming::local_type_name(type_name))
            }
        }
        ValueShape::AnyValue(_) | ValueShape::StructValue(_) => from.to_string(),
        ValueShape::ListValue(_) => format!("[...{from}]"),
        ValueShape::FieldMask(type_name) => {
            let type_field = if options.type_tags {
                format!("$type: \"{type_name}\", ")
            } else {
                String::new()
            };
            format!(
                "{{ {type_field}paths: String({from}) === \"\" ? [] : String({from}).split(\",\") }}"
            )
        }
        ValueShape::Wrapper { scalar, .. } => {
            if scalar.is_long() {
                return match options.long {
                    LongMode::Number => format!("Number({from})"),
                    LongMode::String => format!("String({from})"),
                    LongMode::Bigint => format!("BigInt({from})"),
                };
            }
            scalar_from_json(*scalar, from, helpers)
        }
    }
}

fn scalar_from_json(scalar: ScalarType, from: &str, helpers: &mut HelperSet) -> String {
    match scalar {
        ScalarType::Bool => format!("Boolean({from})"),
        ScalarType::String => format!("String({from})"),
        ScalarType::Bytes => {
            let from_base64 = helpers.demand(RuntimeHelper::BytesFromBase64);
            format!("{from_base64}({from})")
        }
        _ => format!("Number({from})"),
    }
}

/// Generate the `toJSON` procedure body.
pub fn generate_to_json(
    message: &MessageSchema,
    plans: &[FieldPlan],
    options: &CodegenOptions,
    registry: &SchemaRegistry<'_>,
    helpers: &mut HelperSet,
) -> GenerateResult<String> {
    let local = naming::local_type_name(&message.name);
    let param = if message.fields.is_empty() { "_" } else { "message" };

    let mut code = String::new();
    code.push_str(&format!("toJSON({param}: {local}): unknown {{\n"));
    code.push_str("  const obj: any = {};\n");

    for (field, plan) in message.fields.iter().zip(plans) {
        let prop = naming::property_name(&field.name);
        let json = naming::json_name(&field.name, options.json_field_names);
        match &plan.kind {
            PlanKind::OneofMember { oneof_name, .. } => {
                // Active oneof branches are never default-suppressed.
                let group = naming::property_name(oneof_name);
                let converted = write_snippet(
                    &plan.shape,
                    &format!("message.{group}.{prop}"),
                    options,
                    helpers,
                );
                code.push_str(&format!(
                    "  if (message.{group}?.$case === \"{prop}\") {{\n    obj.{json} = {converted};\n  }}\n"
                ));
            }
            PlanKind::Map { value, .. } => {
                let converted = write_snippet(value, "v", options, helpers);
                code.push_str(&format!("  if (message.{prop}) {{\n"));
                code.push_str(&format!(
                    "    const entries = Object.entries(message.{prop});\n"
                ));
                code.push_str("    if (entries.length > 0) {\n");
                code.push_str(&format!("      obj.{json} = {{}};\n"));
                code.push_str("      entries.forEach(([k, v]) => {\n");
                code.push_str(&format!("        obj.{json}[k] = {converted};\n"));
                code.push_str("      });\n");
                code.push_str("    }\n");
                code.push_str("  }\n");
            }
            PlanKind::Repeated { .. } => {
                let converted = write_snippet(&plan.shape, "e", options, helpers);
                code.push_str(&format!("  if (message.{prop}?.length) {{\n"));
                code.push_str(&format!(
                    "    obj.{json} = message.{prop}.map((e) => {converted});\n"
                ));
                code.push_str("  }\n");
            }
            PlanKind::Singular { optional } => {
                let place = format!("message.{prop}");
                let converted = write_snippet(&plan.shape, &place, options, helpers);
                let check = if *optional || plan.shape.has_presence() {
                    format!("{place} !== undefined")
                } else {
                    values::not_default_check(&plan.shape, &place, options, registry)?
                };
                code.push_str(&format!(
                    "  if ({check}) {{\n    obj.{json} = {converted};\n  }}\n"
                ));
            }
        }
    }

    code.push_str("  return obj;\n");
    code.push_str("}\n");
    Ok(code)
}

/// The memory-to-JSON conversion for one value at `from`.
fn write_snippet(
    shape: &ValueShape,
    from: &str,
    options: &CodegenOptions,
    helpers: &mut HelperSet,
) -> String {
    match shape {
        ValueShape::Scalar(scalar) => scalar_to_json(*scalar, from, helpers),
        ValueShape::Long { mode, .. } => match mode {
            LongMode::Number => format!("Math.round({from})"),
            LongMode::String => from.to_string(),
            LongMode::Bigint => format!("{from}.toString()"),
        },
        ValueShape::Enum { name, .. } => {
            let converter = naming::enum_converter_name(&naming::local_type_name(name), "ToJSON");
            format!("{converter}({from})")
        }
        ValueShape::Message(name) => {
            format!("{}.toJSON({from})", naming::local_type_name(name))
        }
        ValueShape::Timestamp { mode, .. } => match mode {
            DateMode::Date => format!("{from}.toISOString()"),
            DateMode::String => from.to_string(),
            DateMode::Timestamp => {
                let from_timestamp = helpers.demand(RuntimeHelper::FromTimestamp);
                format!("{from_timestamp}({from}).toISOString()")
            }
        },
        ValueShape::ObjectId {
            structured,
            type_name,
        } => {
            if *structured {
                format!("{from}.toString()")
            } else {
                format!("{}.toJSON({from})", naming::local_type_name(type_name))
            }
        }
        ValueShape::AnyValue(_) | ValueShape::StructValue(_) | ValueShape::ListValue(_) => {
            from.to_string()
        }
        ValueShape::FieldMask(_) => format!("{from}.paths.join(\",\")"),
        ValueShape::Wrapper { scalar, .. } => {
            if scalar.is_long() {
                return match options.long {
                    LongMode::Number => format!("Math.round({from})"),
                    LongMode::String => from.to_string(),
                    LongMode::Bigint => format!("{from}.toString()"),
                };
            }
            scalar_to_json(*scalar, from, helpers)
        }
    }
}

fn scalar_to_json(scalar: ScalarType, from: &str, helpers: &mut HelperSet) -> String {
    match scalar {
        ScalarType::Bytes => {
            let to_base64 = helpers.demand(RuntimeHelper::Base64FromBytes);
            format!("{to_base64}({from})")
        }
        _ if scalar.is_whole_number() => format!("Math.round({from})"),
        _ => from.to_string(),
    }
}
