//! Representation tables shared by the generators.
//!
//! Maps a classified value shape onto its TypeScript type, its zero
//! value, and its not-default presence check, all conditioned by the
//! options record. Every generator routes through these so the four
//! procedures agree on what counts as "present".

use crate::classify::ValueShape;
use crate::config::{CodegenOptions, DateMode, LongMode, OptionalsMode};
use crate::error::{GenerateError, GenerateResult};
use crate::schema::{ScalarType, SchemaRegistry};

use super::naming;

/// The TypeScript type for one value of `shape`, without presence suffix.
pub fn ts_type(shape: &ValueShape) -> String {
    match shape {
        ValueShape::Scalar(scalar) => scalar_ts_type(*scalar).to_string(),
        ValueShape::Long { mode, .. } => match mode {
            LongMode::Number => "number".to_string(),
            LongMode::String => "string".to_string(),
            LongMode::Bigint => "bigint".to_string(),
        },
        ValueShape::Enum { name, .. } | ValueShape::Message(name) => naming::local_type_name(name),
        ValueShape::Timestamp { mode, type_name } => match mode {
            DateMode::Date => "Date".to_string(),
            DateMode::String => "string".to_string(),
            DateMode::Timestamp => naming::local_type_name(type_name),
        },
        ValueShape::ObjectId {
            structured,
            type_name,
        } => {
            if *structured {
                "mongodb.ObjectId".to_string()
            } else {
                naming::local_type_name(type_name)
            }
        }
        ValueShape::AnyValue(_) => "any".to_string(),
        ValueShape::StructValue(_) => "{ [key: string]: any }".to_string(),
        ValueShape::ListValue(_) => "Array<any>".to_string(),
        ValueShape::FieldMask(type_name) => naming::local_type_name(type_name),
        ValueShape::Wrapper { scalar, .. } => scalar_ts_type(*scalar).to_string(),
    }
}

const fn scalar_ts_type(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Bool => "boolean",
        ScalarType::String => "string",
        ScalarType::Bytes => "Uint8Array",
        _ => "number",
    }
}

/// The zero value used as decode/merge seed for one value of `shape`.
///
/// Shapes with presence have no scalar zero; their zero is `undefined`.
pub fn zero_value(shape: &ValueShape, registry: &SchemaRegistry<'_>) -> GenerateResult<String> {
    let value = match shape {
        ValueShape::Scalar(ScalarType::Bool) => "false".to_string(),
        ValueShape::Scalar(ScalarType::String) => "\"\"".to_string(),
        ValueShape::Scalar(ScalarType::Bytes) => "new Uint8Array()".to_string(),
        ValueShape::Scalar(_) => "0".to_string(),
        ValueShape::Long { mode, .. } => match mode {
            LongMode::Number => "0".to_string(),
            LongMode::String => "\"0\"".to_string(),
            LongMode::Bigint => "BigInt(\"0\")".to_string(),
        },
        ValueShape::Enum { name, string_repr } => {
            if *string_repr {
                let (local, zero) = enum_zero_member(name, registry)?;
                format!("{local}.{zero}")
            } else {
                "0".to_string()
            }
        }
        _ => "undefined".to_string(),
    };
    Ok(value)
}

/// The encode/toJSON suppression check: true when `place` must be written.
///
/// Mirrored exactly between the binary and JSON encoders so both agree on
/// what counts as "present".
pub fn not_default_check(
    shape: &ValueShape,
    place: &str,
    options: &CodegenOptions,
    registry: &SchemaRegistry<'_>,
) -> GenerateResult<String> {
    let check = match shape {
        ValueShape::Scalar(ScalarType::Bool) => format!("{place} === true"),
        ValueShape::Scalar(ScalarType::String) => format!("{place} !== \"\""),
        ValueShape::Scalar(ScalarType::Bytes) => format!("{place}.length !== 0"),
        ValueShape::Scalar(_) => format!("{place} !== 0"),
        ValueShape::Long { mode, .. } => match mode {
            LongMode::Number => format!("{place} !== 0"),
            LongMode::String => format!("{place} !== \"0\""),
            LongMode::Bigint => format!("{place} !== BigInt(\"0\")"),
        },
        ValueShape::Enum { name, string_repr } => {
            if *string_repr {
                let (local, zero) = enum_zero_member(name, registry)?;
                format!("{place} !== {local}.{zero}")
            } else {
                format!("{place} !== 0")
            }
        }
        _ => format!("{place} !== undefined"),
    };
    if options.optionals == OptionalsMode::All && !shape.has_presence() {
        return Ok(format!("{place} !== undefined && {check}"));
    }
    Ok(check)
}

/// Resolve an enum's local name and zero member.
pub fn enum_zero_member(
    name: &str,
    registry: &SchemaRegistry<'_>,
) -> GenerateResult<(String, String)> {
    let enum_schema = registry
        .enum_schema(name)
        .ok_or_else(|| GenerateError::UnresolvedTypeRef {
            message: name.to_string(),
            field: name.to_string(),
            type_name: name.to_string(),
        })?;
    let zero = enum_schema
        .zero_value()
        .ok_or_else(|| GenerateError::UnsupportedFieldKind {
            message: enum_schema.name.clone(),
            field: "<empty enum>".to_string(),
        })?;
    Ok((naming::local_type_name(name), zero.name.clone()))
}

/// The TypeScript index-signature key type for a map key scalar.
pub fn map_key_ts_type(key: ScalarType, options: &CodegenOptions) -> &'static str {
    if key.is_long() {
        return match options.long {
            LongMode::Number => "number",
            // bigint cannot appear in an index signature.
            LongMode::String | LongMode::Bigint => "string",
        };
    }
    if key.is_whole_number() { "number" } else { "string" }
}

/// Wrap a string map key back into its typed form in reduce callbacks.
pub fn map_key_cast(key: ScalarType, options: &CodegenOptions, variable: &str) -> String {
    if map_key_ts_type(key, options) == "number" {
        format!("Number({variable})")
    } else {
        variable.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::config::CodegenOptions;
    use crate::schema::{EnumSchema, EnumValue, SchemaFile};
    use test_case::test_case;

    fn empty_registry() -> SchemaRegistry<'static> {
        SchemaRegistry::default()
    }

    #[test_case(ValueShape::Scalar(ScalarType::Int32), "number")]
    #[test_case(ValueShape::Scalar(ScalarType::Bool), "boolean")]
    #[test_case(ValueShape::Scalar(ScalarType::String), "string")]
    #[test_case(ValueShape::Scalar(ScalarType::Bytes), "Uint8Array")]
    #[test_case(ValueShape::AnyValue("google.protobuf.Value".into()), "any")]
    fn ts_type___maps_scalars(shape: ValueShape, expected: &str) {
        assert_eq!(ts_type(&shape), expected);
    }

    #[test_case(LongMode::Number, "number", "0")]
    #[test_case(LongMode::String, "string", "\"0\"")]
    #[test_case(LongMode::Bigint, "bigint", "BigInt(\"0\")")]
    fn long_mode___drives_type_and_zero(mode: LongMode, ty: &str, zero: &str) {
        let shape = ValueShape::Long {
            scalar: ScalarType::Int64,
            mode,
        };
        assert_eq!(ts_type(&shape), ty);
        assert_eq!(zero_value(&shape, &empty_registry()).unwrap(), zero);
    }

    #[test]
    fn not_default_check___mirrors_zero_values() {
        let options = CodegenOptions::default();
        let registry = empty_registry();

        let check = |shape: &ValueShape| not_default_check(shape, "message.x", &options, &registry);

        assert_eq!(
            check(&ValueShape::Scalar(ScalarType::Int32)).unwrap(),
            "message.x !== 0"
        );
        assert_eq!(
            check(&ValueShape::Scalar(ScalarType::Bool)).unwrap(),
            "message.x === true"
        );
        assert_eq!(
            check(&ValueShape::Scalar(ScalarType::Bytes)).unwrap(),
            "message.x.length !== 0"
        );
        assert_eq!(
            check(&ValueShape::Message("pkg.Sub".into())).unwrap(),
            "message.x !== undefined"
        );
    }

    #[test]
    fn not_default_check___optionals_all___adds_undefined_guard() {
        let options = CodegenOptions {
            optionals: OptionalsMode::All,
            ..CodegenOptions::default()
        };

        let check = not_default_check(
            &ValueShape::Scalar(ScalarType::Int32),
            "message.x",
            &options,
            &empty_registry(),
        )
        .unwrap();

        assert_eq!(check, "message.x !== undefined && message.x !== 0");
    }

    #[test]
    fn zero_value___string_enums___use_zero_member() {
        let files = vec![SchemaFile {
            module: "status".to_string(),
            package: "pkg".to_string(),
            messages: vec![],
            enums: vec![EnumSchema {
                name: "pkg.Status".to_string(),
                values: vec![
                    EnumValue {
                        name: "STATUS_UNSPECIFIED".to_string(),
                        number: 0,
                    },
                    EnumValue {
                        name: "STATUS_ACTIVE".to_string(),
                        number: 1,
                    },
                ],
            }],
        }];
        let registry = SchemaRegistry::new(&files);
        let shape = ValueShape::Enum {
            name: "pkg.Status".to_string(),
            string_repr: true,
        };

        let zero = zero_value(&shape, &registry).unwrap();

        assert_eq!(zero, "Status.STATUS_UNSPECIFIED");
    }

    #[test_case(ScalarType::String, "string")]
    #[test_case(ScalarType::Int32, "number")]
    #[test_case(ScalarType::Bool, "string")]
    fn map_key_ts_type___follows_key_scalar(key: ScalarType, expected: &str) {
        assert_eq!(map_key_ts_type(key, &CodegenOptions::default()), expected);
    }

    #[test]
    fn map_key_cast___wraps_numeric_keys() {
        let options = CodegenOptions::default();

        assert_eq!(map_key_cast(ScalarType::Int32, &options, "key"), "Number(key)");
        assert_eq!(map_key_cast(ScalarType::String, &options, "key"), "key");
    }
}
