//! Binary wire codec generation.
//!
//! Tags are `(field_number << 3) | wire_type`, varint-encoded; wire types
//! 0 varint, 1 64-bit fixed, 2 length-delimited, 5 32-bit fixed. Encode
//! writes fields in declaration order and skips representation defaults,
//! except oneof members (driven by the union discriminant) and
//! presence-bearing values. Decode is a tag loop that accepts packed
//! fields in both packed and individually-tagged form.

use crate::classify::{FieldPlan, PlanKind, ValueShape};
use crate::config::{CodegenOptions, DateMode, LongMode, OptionalsMode};
use crate::error::GenerateResult;
use crate::schema::{MessageSchema, ScalarType, SchemaRegistry};

use super::helpers::{HelperSet, RuntimeHelper};
use super::naming;
use super::values;

/// Generate the `encode` procedure body.
pub fn generate_encode(
    message: &MessageSchema,
    plans: &[FieldPlan],
    options: &CodegenOptions,
    registry: &SchemaRegistry<'_>,
    helpers: &mut HelperSet,
) -> GenerateResult<String> {
    let local = naming::local_type_name(&message.name);
    let all_optional = options.optionals == OptionalsMode::All;
    let param = if message.fields.is_empty() && !options.unknown_fields {
        "_"
    } else {
        "message"
    };

    let mut code = String::new();
    code.push_str(&format!(
        "encode({param}: {local}, writer: Writer = Writer.create()): Writer {{\n"
    ));

    for (field, plan) in message.fields.iter().zip(plans) {
        let prop = naming::property_name(&field.name);
        match &plan.kind {
            PlanKind::OneofMember { oneof_name, .. } => {
                let group = naming::property_name(oneof_name);
                let place = format!("message.{group}.{prop}");
                let snippet = write_snippet(plan.tag(), &plan.shape, &place, options, helpers);
                code.push_str(&format!(
                    "  if (message.{group}?.$case === \"{prop}\") {{\n    {snippet};\n  }}\n"
                ));
            }
            PlanKind::Map { value, entry_type, .. } => {
                let entry_local = naming::local_type_name(entry_type);
                let tag = plan.tag();
                let type_field = if options.type_tags {
                    format!("$type: \"{entry_type}\", ")
                } else {
                    String::new()
                };
                let source = if all_optional {
                    format!("message.{prop} || {{}}")
                } else {
                    format!("message.{prop}")
                };
                code.push_str(&format!(
                    "  Object.entries({source}).forEach(([key, value]) => {{\n"
                ));
                let entry_write = format!(
                    "{entry_local}.encode({{ {type_field}key: key as any, value }}, writer.uint32({tag}).fork()).ldelim()"
                );
                if matches!(value.as_ref(), ValueShape::Wrapper { .. }) {
                    code.push_str("    if (value !== undefined) {\n");
                    code.push_str(&format!("      {entry_write};\n"));
                    code.push_str("    }\n");
                } else {
                    code.push_str(&format!("    {entry_write};\n"));
                }
                code.push_str("  });\n");
            }
            PlanKind::Repeated { packed: true } => {
                let tag = plan.tag();
                let guard = if all_optional {
                    format!("message.{prop} !== undefined && message.{prop}.length !== 0")
                } else {
                    format!("message.{prop}.length !== 0")
                };
                let element = packed_element_write(&plan.shape, "v");
                code.push_str(&format!("  if ({guard}) {{\n"));
                code.push_str(&format!("    writer.uint32({tag}).fork();\n"));
                code.push_str(&format!("    for (const v of message.{prop}) {{\n"));
                code.push_str(&format!("      {element};\n"));
                code.push_str("    }\n");
                code.push_str("    writer.ldelim();\n");
                code.push_str("  }\n");
            }
            PlanKind::Repeated { packed: false } => {
                let snippet = write_snippet(plan.tag(), &plan.shape, "v!", options, helpers);
                let loop_body = format!(
                    "  for (const v of message.{prop}) {{\n    {snippet};\n  }}\n"
                );
                if all_optional {
                    code.push_str(&format!(
                        "  if (message.{prop} !== undefined && message.{prop}.length !== 0) {{\n"
                    ));
                    for line in loop_body.lines() {
                        code.push_str(&format!("  {line}\n"));
                    }
                    code.push_str("  }\n");
                } else {
                    code.push_str(&loop_body);
                }
            }
            PlanKind::Singular { optional } => {
                let place = format!("message.{prop}");
                let snippet = write_snippet(plan.tag(), &plan.shape, &place, options, helpers);
                let check = if *optional || plan.shape.has_presence() {
                    format!("{place} !== undefined")
                } else {
                    values::not_default_check(&plan.shape, &place, options, registry)?
                };
                code.push_str(&format!("  if ({check}) {{\n    {snippet};\n  }}\n"));
            }
        }
    }

    if options.unknown_fields {
        code.push_str("  if (\"_unknownFields\" in message) {\n");
        code.push_str("    const unknownFields = (message as any)._unknownFields;\n");
        code.push_str("    for (const key of Object.keys(unknownFields)) {\n");
        code.push_str("      const vals = unknownFields[key] as Uint8Array[];\n");
        code.push_str("      for (const value of vals) {\n");
        code.push_str("        writer.uint32(parseInt(key, 10));\n");
        code.push_str("        (writer as any)._push(\n");
        code.push_str("          (val: Uint8Array, buf: Uint8Array, pos: number) => buf.set(val, pos),\n");
        code.push_str("          value.length,\n");
        code.push_str("          value,\n");
        code.push_str("        );\n");
        code.push_str("      }\n");
        code.push_str("    }\n");
        code.push_str("  }\n");
    }

    code.push_str("  return writer;\n");
    code.push_str("}\n");
    Ok(code)
}

/// One tagged write of a single value at `place`.
fn write_snippet(
    tag: u32,
    shape: &ValueShape,
    place: &str,
    options: &CodegenOptions,
    helpers: &mut HelperSet,
) -> String {
    match shape {
        ValueShape::Scalar(scalar) => {
            format!("writer.uint32({tag}).{}({place})", scalar.codec_method())
        }
        ValueShape::Long { scalar, mode } => {
            let method = scalar.codec_method();
            match mode {
                LongMode::Bigint => {
                    format!("writer.uint32({tag}).{method}({place}.toString())")
                }
                LongMode::Number | LongMode::String => {
                    format!("writer.uint32({tag}).{method}({place})")
                }
            }
        }
        ValueShape::Enum { name, string_repr } => {
            if *string_repr {
                let to_number =
                    naming::enum_converter_name(&naming::local_type_name(name), "ToNumber");
                format!("writer.uint32({tag}).int32({to_number}({place}))")
            } else {
                format!("writer.uint32({tag}).int32({place})")
            }
        }
        ValueShape::Message(name) | ValueShape::FieldMask(name) => {
            let local = naming::local_type_name(name);
            format!("{local}.encode({place}, writer.uint32({tag}).fork()).ldelim()")
        }
        ValueShape::Timestamp { mode, type_name } => {
            let local = naming::local_type_name(type_name);
            match mode {
                DateMode::Timestamp => {
                    format!("{local}.encode({place}, writer.uint32({tag}).fork()).ldelim()")
                }
                DateMode::Date | DateMode::String => {
                    let to_timestamp = helpers.demand(RuntimeHelper::ToTimestamp);
                    format!(
                        "{local}.encode({to_timestamp}({place}), writer.uint32({tag}).fork()).ldelim()"
                    )
                }
            }
        }
        ValueShape::ObjectId {
            structured,
            type_name,
        } => {
            let local = naming::local_type_name(type_name);
            if *structured {
                let to_proto = helpers.demand(RuntimeHelper::ToProtoObjectId);
                format!(
                    "{local}.encode({to_proto}({place}), writer.uint32({tag}).fork()).ldelim()"
                )
            } else {
                format!("{local}.encode({place}, writer.uint32({tag}).fork()).ldelim()")
            }
        }
        ValueShape::AnyValue(name) | ValueShape::StructValue(name) | ValueShape::ListValue(name) => {
            let local = naming::local_type_name(name);
            format!(
                "{local}.encode({local}.wrap({place}), writer.uint32({tag}).fork()).ldelim()"
            )
        }
        ValueShape::Wrapper { type_name, .. } => {
            let local = naming::local_type_name(type_name);
            let type_field = if options.type_tags {
                format!("$type: \"{type_name}\", ")
            } else {
                String::new()
            };
            format!(
                "{local}.encode({{ {type_field}value: {place}! }}, writer.uint32({tag}).fork()).ldelim()"
            )
        }
    }
}

/// One untagged element write inside a packed run.
fn packed_element_write(shape: &ValueShape, place: &str) -> String {
    match shape {
        ValueShape::Scalar(scalar) => format!("writer.{}({place})", scalar.codec_method()),
        ValueShape::Long { scalar, mode } => {
            let method = scalar.codec_method();
            match mode {
                LongMode::Bigint => format!("writer.{method}({place}.toString())"),
                LongMode::Number | LongMode::String => format!("writer.{method}({place})"),
            }
        }
        ValueShape::Enum { name, string_repr } => {
            if *string_repr {
                let to_number =
                    naming::enum_converter_name(&naming::local_type_name(name), "ToNumber");
                format!("writer.int32({to_number}({place}))")
            } else {
                format!("writer.int32({place})")
            }
        }
        // Packed runs only hold varint/fixed scalars; the classifier never
        // marks other shapes packed.
        _ => format!("writer.int32({place})"),
    }
}

/// Generate the `decode` procedure body.
pub fn generate_decode(
    message: &MessageSchema,
    plans: &[FieldPlan],
    options: &CodegenOptions,
    helpers: &mut HelperSet,
) -> GenerateResult<String> {
    let local = naming::local_type_name(&message.name);
    let all_optional = options.optionals == OptionalsMode::All;
    let assert = if all_optional { "!" } else { "" };

    let mut code = String::new();
    code.push_str(&format!(
        "decode(input: Reader | Uint8Array, length?: number): {local} {{\n"
    ));
    code.push_str("  const reader = input instanceof Reader ? input : new Reader(input);\n");
    code.push_str("  let end = length === undefined ? reader.len : reader.pos + length;\n");
    code.push_str(&format!("  const message = createBase{local}();\n"));
    if options.unknown_fields {
        code.push_str("  (message as any)._unknownFields = {};\n");
    }
    code.push_str("  while (reader.pos < end) {\n");
    code.push_str("    const tag = reader.uint32();\n");
    code.push_str("    switch (tag >>> 3) {\n");

    for (field, plan) in message.fields.iter().zip(plans) {
        let prop = naming::property_name(&field.name);
        code.push_str(&format!("      case {}:\n", plan.number));
        match &plan.kind {
            PlanKind::Map { entry_type, .. } => {
                let entry_local = naming::local_type_name(entry_type);
                let var = format!("entry{}", plan.number);
                code.push_str(&format!(
                    "        const {var} = {entry_local}.decode(reader, reader.uint32());\n"
                ));
                code.push_str(&format!("        if ({var}.value !== undefined) {{\n"));
                code.push_str(&format!(
                    "          message.{prop}{assert}[{var}.key] = {var}.value;\n"
                ));
                code.push_str("        }\n");
            }
            PlanKind::Repeated { packed: true } => {
                let snippet = read_snippet(&plan.shape, helpers);
                code.push_str("        if ((tag & 7) === 2) {\n");
                code.push_str("          const end2 = reader.uint32() + reader.pos;\n");
                code.push_str("          while (reader.pos < end2) {\n");
                code.push_str(&format!(
                    "            message.{prop}{assert}.push({snippet});\n"
                ));
                code.push_str("          }\n");
                code.push_str("        } else {\n");
                code.push_str(&format!(
                    "          message.{prop}{assert}.push({snippet});\n"
                ));
                code.push_str("        }\n");
            }
            PlanKind::Repeated { packed: false } => {
                let snippet = read_snippet(&plan.shape, helpers);
                code.push_str(&format!(
                    "        message.{prop}{assert}.push({snippet});\n"
                ));
            }
            PlanKind::OneofMember { oneof_name, .. } => {
                let group = naming::property_name(oneof_name);
                let snippet = read_snippet(&plan.shape, helpers);
                code.push_str(&format!(
                    "        message.{group} = {{ $case: \"{prop}\", {prop}: {snippet} }};\n"
                ));
            }
            PlanKind::Singular { .. } => {
                let snippet = read_snippet(&plan.shape, helpers);
                code.push_str(&format!("        message.{prop} = {snippet};\n"));
            }
        }
        code.push_str("        break;\n");
    }

    if options.unknown_fields {
        code.push_str("      default: {\n");
        code.push_str("        const startPos = reader.pos;\n");
        code.push_str("        reader.skipType(tag & 7);\n");
        code.push_str("        const unknownFields = (message as any)._unknownFields;\n");
        code.push_str(
            "        unknownFields[tag] = [...(unknownFields[tag] || []), reader.buf.slice(startPos, reader.pos)];\n",
        );
        code.push_str("        break;\n");
        code.push_str("      }\n");
    } else {
        code.push_str("      default:\n");
        code.push_str("        reader.skipType(tag & 7);\n");
        code.push_str("        break;\n");
    }

    code.push_str("    }\n");
    code.push_str("  }\n");
    code.push_str("  return message;\n");
    code.push_str("}\n");
    Ok(code)
}

/// One read of a single wire value.
fn read_snippet(shape: &ValueShape, helpers: &mut HelperSet) -> String {
    match shape {
        ValueShape::Scalar(ScalarType::Bytes) => "reader.bytes()".to_string(),
        ValueShape::Scalar(scalar) => format!("reader.{}()", scalar.codec_method()),
        ValueShape::Long { scalar, mode } => {
            let read = format!("reader.{}() as Long", scalar.codec_method());
            let helper = match mode {
                LongMode::Number => helpers.demand(RuntimeHelper::LongToNumber),
                LongMode::String => helpers.demand(RuntimeHelper::LongToString),
                LongMode::Bigint => helpers.demand(RuntimeHelper::LongToBigint),
            };
            format!("{helper}({read})")
        }
        ValueShape::Enum { name, string_repr } => {
            if *string_repr {
                let from_json =
                    naming::enum_converter_name(&naming::local_type_name(name), "FromJSON");
                format!("{from_json}(reader.int32())")
            } else {
                "reader.int32() as any".to_string()
            }
        }
        ValueShape::Message(name) | ValueShape::FieldMask(name) => {
            format!("{}.decode(reader, reader.uint32())", naming::local_type_name(name))
        }
        ValueShape::Timestamp { mode, type_name } => {
            let local = naming::local_type_name(type_name);
            match mode {
                DateMode::Timestamp => format!("{local}.decode(reader, reader.uint32())"),
                DateMode::Date | DateMode::String => {
                    let from_timestamp = helpers.demand(RuntimeHelper::FromTimestamp);
                    format!("{from_timestamp}({local}.decode(reader, reader.uint32()))")
                }
            }
        }
        ValueShape::ObjectId {
            structured,
            type_name,
        } => {
            let local = naming::local_type_name(type_name);
            if *structured {
                let from_proto = helpers.demand(RuntimeHelper::FromProtoObjectId);
                format!("{from_proto}({local}.decode(reader, reader.uint32()))")
            } else {
                format!("{local}.decode(reader, reader.uint32())")
            }
        }
        ValueShape::AnyValue(name) | ValueShape::StructValue(name) | ValueShape::ListValue(name) => {
            let local = naming::local_type_name(name);
            format!("{local}.unwrap({local}.decode(reader, reader.uint32()))")
        }
        ValueShape::Wrapper { type_name, .. } => {
            format!(
                "{}.decode(reader, reader.uint32()).value",
                naming::local_type_name(type_name)
            )
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::classify::classify_field;
    use crate::config::OneofMode;
    use crate::schema::{Cardinality, FieldSchema, FieldType, OneofSchema, SchemaFile};

    fn field(name: &str, number: u32, field_type: FieldType) -> FieldSchema {
        FieldSchema {
            name: name.to_string(),
            number,
            field_type,
            cardinality: Cardinality::Singular,
            oneof_index: None,
        }
    }

    fn message_of(fields: Vec<FieldSchema>) -> MessageSchema {
        MessageSchema {
            name: "pkg.Simple".to_string(),
            fields,
            oneofs: vec![],
            map_entry: false,
        }
    }

    fn generate(
        message: &MessageSchema,
        registry: &SchemaRegistry<'_>,
        options: &CodegenOptions,
    ) -> (String, String, HelperSet) {
        let plans: Vec<FieldPlan> = message
            .fields
            .iter()
            .map(|f| classify_field(f, message, registry, options).unwrap())
            .collect();
        let mut helpers = HelperSet::new();
        let encode = generate_encode(message, &plans, options, registry, &mut helpers).unwrap();
        let decode = generate_decode(message, &plans, options, &mut helpers).unwrap();
        (encode, decode, helpers)
    }

    #[test]
    fn generate_encode___varint_field_one___uses_tag_eight() {
        let message = message_of(vec![field("id", 1, FieldType::Scalar(ScalarType::Int32))]);
        let registry = SchemaRegistry::default();

        let (encode, decode, _) = generate(&message, &registry, &CodegenOptions::default());

        // (1 << 3) | 0 = 8, so {id: 150} serializes as 08 96 01.
        assert!(encode.contains("if (message.id !== 0) {"));
        assert!(encode.contains("writer.uint32(8).int32(message.id);"));
        assert!(decode.contains("case 1:"));
        assert!(decode.contains("message.id = reader.int32();"));
    }

    #[test]
    fn generate_encode___string_field_two___uses_tag_eighteen() {
        let message = message_of(vec![field("name", 2, FieldType::Scalar(ScalarType::String))]);
        let registry = SchemaRegistry::default();

        let (encode, _, _) = generate(&message, &registry, &CodegenOptions::default());

        // (2 << 3) | 2 = 18, so {name: "abc"} serializes as 12 03 61 62 63.
        assert!(encode.contains("if (message.name !== \"\") {"));
        assert!(encode.contains("writer.uint32(18).string(message.name);"));
    }

    #[test]
    fn generate_decode___packed_repeated___accepts_both_forms() {
        let mut values = field("values", 4, FieldType::Scalar(ScalarType::Int32));
        values.cardinality = Cardinality::Repeated;
        let message = message_of(vec![values]);
        let registry = SchemaRegistry::default();

        let (encode, decode, _) = generate(&message, &registry, &CodegenOptions::default());

        // (4 << 3) | 2 = 34 for the packed run.
        assert!(encode.contains("writer.uint32(34).fork();"));
        assert!(decode.contains("if ((tag & 7) === 2) {"));
        assert!(decode.contains("const end2 = reader.uint32() + reader.pos;"));
        // Unpacked fallback pushes a single value for the scalar wire type.
        assert!(decode.contains("} else {\n          message.values.push(reader.int32());"));
    }

    #[test]
    fn generate_encode___unpacked_repeated_strings___tag_per_element() {
        let mut tags = field("tags", 3, FieldType::Scalar(ScalarType::String));
        tags.cardinality = Cardinality::Repeated;
        let message = message_of(vec![tags]);
        let registry = SchemaRegistry::default();

        let (encode, _, _) = generate(&message, &registry, &CodegenOptions::default());

        assert!(encode.contains("for (const v of message.tags) {"));
        assert!(encode.contains("writer.uint32(26).string(v!);"));
        assert!(!encode.contains("fork()"));
    }

    #[test]
    fn generate_codecs___long_number_mode___demand_overflow_checked_helper() {
        let message = message_of(vec![field("total", 1, FieldType::Scalar(ScalarType::Int64))]);
        let registry = SchemaRegistry::default();

        let (encode, decode, helpers) = generate(&message, &registry, &CodegenOptions::default());

        assert!(encode.contains("writer.uint32(8).int64(message.total);"));
        assert!(decode.contains("message.total = longToNumber(reader.int64() as Long);"));
        assert!(helpers.contains(RuntimeHelper::LongToNumber));
    }

    #[test]
    fn generate_codecs___oneof_union___dispatches_on_case() {
        let mut success = field("success", 1, FieldType::Scalar(ScalarType::String));
        success.oneof_index = Some(0);
        let mut error = field("error", 2, FieldType::Scalar(ScalarType::String));
        error.oneof_index = Some(0);
        let message = MessageSchema {
            name: "pkg.Response".to_string(),
            fields: vec![success, error],
            oneofs: vec![OneofSchema {
                name: "result".to_string(),
            }],
            map_entry: false,
        };
        let registry = SchemaRegistry::default();
        let options = CodegenOptions {
            oneof: OneofMode::Unions,
            ..CodegenOptions::default()
        };

        let (encode, decode, _) = generate(&message, &registry, &options);

        assert!(encode.contains("if (message.result?.$case === \"success\") {"));
        assert!(encode.contains("writer.uint32(10).string(message.result.success);"));
        assert!(decode.contains(
            "message.result = { $case: \"success\", success: reader.string() };"
        ));
        assert!(decode.contains(
            "message.result = { $case: \"error\", error: reader.string() };"
        ));
    }

    #[test]
    fn generate_codecs___map_field___routes_through_entry_codec() {
        let entry = MessageSchema {
            name: "pkg.Simple.AttributesEntry".to_string(),
            fields: vec![
                field("key", 1, FieldType::Scalar(ScalarType::String)),
                field("value", 2, FieldType::Scalar(ScalarType::String)),
            ],
            oneofs: vec![],
            map_entry: true,
        };
        let files = vec![SchemaFile {
            module: "simple".to_string(),
            package: "pkg".to_string(),
            messages: vec![entry],
            enums: vec![],
        }];
        let registry = SchemaRegistry::new(&files);
        let mut attributes = field(
            "attributes",
            3,
            FieldType::Message("pkg.Simple.AttributesEntry".to_string()),
        );
        attributes.cardinality = Cardinality::Repeated;
        let message = message_of(vec![attributes]);

        let (encode, decode, _) = generate(&message, &registry, &CodegenOptions::default());

        assert!(encode.contains("Object.entries(message.attributes).forEach(([key, value]) => {"));
        assert!(encode.contains(
            "Simple_AttributesEntry.encode({ key: key as any, value }, writer.uint32(26).fork()).ldelim();"
        ));
        // Duplicate wire entries overwrite: last entry wins.
        assert!(decode.contains("const entry3 = Simple_AttributesEntry.decode(reader, reader.uint32());"));
        assert!(decode.contains("message.attributes[entry3.key] = entry3.value;"));
    }

    #[test]
    fn generate_codecs___unknown_fields___capture_and_reemit_after_known() {
        let message = message_of(vec![field("id", 1, FieldType::Scalar(ScalarType::Int32))]);
        let registry = SchemaRegistry::default();
        let options = CodegenOptions {
            unknown_fields: true,
            ..CodegenOptions::default()
        };

        let (encode, decode, _) = generate(&message, &registry, &options);

        assert!(decode.contains("(message as any)._unknownFields = {};"));
        assert!(decode.contains("reader.buf.slice(startPos, reader.pos)"));
        // Re-emission happens after every known field write.
        let known = encode.find("writer.uint32(8).int32(message.id)").unwrap();
        let unknown = encode.find("if (\"_unknownFields\" in message) {").unwrap();
        assert!(known < unknown);
    }

    #[test]
    fn generate_decode___empty_payload___returns_base_instance() {
        let message = message_of(vec![field("id", 1, FieldType::Scalar(ScalarType::Int32))]);
        let registry = SchemaRegistry::default();

        let (_, decode, _) = generate(&message, &registry, &CodegenOptions::default());

        assert!(decode.contains("const message = createBaseSimple();"));
        assert!(decode.contains("while (reader.pos < end) {"));
        assert!(decode.contains("return message;"));
    }
}
