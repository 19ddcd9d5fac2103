//! Shared runtime helper bodies.
//!
//! The generators only record helper identifiers; these are the bodies
//! the assembler materializes once per output file, conditioned by the
//! same options record that shaped the demanding code.

use crate::config::{CodegenOptions, DateMode, LongMode, OneofMode};

use super::helpers::{HelperSet, RuntimeHelper};

/// Close a demand set over helper-to-helper references.
///
/// Some helper bodies call other helpers (e.g. `fromJsonTimestamp` calls
/// `fromTimestamp`); the assembler needs the full closure before it
/// renders.
pub fn expand_demands(helpers: &mut HelperSet, options: &CodegenOptions) {
    loop {
        let mut added = false;
        for helper in helpers.collect() {
            for dep in dependencies(helper, options) {
                if !helpers.contains(dep) {
                    helpers.demand(dep);
                    added = true;
                }
            }
        }
        if !added {
            break;
        }
    }
}

fn dependencies(helper: RuntimeHelper, options: &CodegenOptions) -> Vec<RuntimeHelper> {
    match helper {
        RuntimeHelper::FromJsonTimestamp => match options.date {
            DateMode::Date => vec![RuntimeHelper::FromTimestamp],
            DateMode::Timestamp => vec![RuntimeHelper::ToTimestamp],
            DateMode::String => vec![],
        },
        RuntimeHelper::FromJsonObjectId => vec![RuntimeHelper::FromProtoObjectId],
        _ => vec![],
    }
}

/// Render the body of one helper.
pub fn render(helper: RuntimeHelper, options: &CodegenOptions) -> String {
    match helper {
        RuntimeHelper::BytesFromBase64 => BYTES_FROM_BASE64.to_string(),
        RuntimeHelper::Base64FromBytes => BASE64_FROM_BYTES.to_string(),
        RuntimeHelper::LongToString => LONG_TO_STRING.to_string(),
        RuntimeHelper::LongToNumber => LONG_TO_NUMBER.to_string(),
        RuntimeHelper::LongToBigint => LONG_TO_BIGINT.to_string(),
        RuntimeHelper::ToTimestamp => to_timestamp(options),
        RuntimeHelper::FromTimestamp => from_timestamp(options),
        RuntimeHelper::FromJsonTimestamp => from_json_timestamp(options),
        RuntimeHelper::FromJsonObjectId => FROM_JSON_OBJECT_ID.to_string(),
        RuntimeHelper::FromProtoObjectId => FROM_PROTO_OBJECT_ID.to_string(),
        RuntimeHelper::ToProtoObjectId => TO_PROTO_OBJECT_ID.to_string(),
        RuntimeHelper::IsSet => IS_SET.to_string(),
        RuntimeHelper::IsObject => IS_OBJECT.to_string(),
        RuntimeHelper::DeepPartial => deep_partial(options),
    }
}

/// The `protobufjs` Long/util patch emitted whenever the `Long` class is
/// imported; without it 64-bit reads come back as `{ low, high }` pairs.
pub fn long_runtime_patch() -> String {
    "if (util.Long !== Long) {\n  util.Long = Long as any;\n  configure();\n}\n".to_string()
}

const BYTES_FROM_BASE64: &str = r#"const atob: (b64: string) => string =
  globalThis.atob || ((b64) => globalThis.Buffer.from(b64, "base64").toString("binary"));
function bytesFromBase64(b64: string): Uint8Array {
  const bin = atob(b64);
  const arr = new Uint8Array(bin.length);
  for (let i = 0; i < bin.length; ++i) {
    arr[i] = bin.charCodeAt(i);
  }
  return arr;
}
"#;

const BASE64_FROM_BYTES: &str = r#"const btoa: (bin: string) => string =
  globalThis.btoa || ((bin) => globalThis.Buffer.from(bin, "binary").toString("base64"));
function base64FromBytes(arr: Uint8Array): string {
  const bin: string[] = [];
  for (const byte of arr) {
    bin.push(String.fromCharCode(byte));
  }
  return btoa(bin.join(""));
}
"#;

const LONG_TO_STRING: &str = r#"function longToString(long: Long): string {
  return long.toString();
}
"#;

const LONG_TO_NUMBER: &str = r#"function longToNumber(long: Long): number {
  if (long.gt(Number.MAX_SAFE_INTEGER)) {
    throw new globalThis.Error("Value is larger than Number.MAX_SAFE_INTEGER");
  }
  if (long.lt(Number.MIN_SAFE_INTEGER)) {
    throw new globalThis.Error("Value is smaller than Number.MIN_SAFE_INTEGER");
  }
  return long.toNumber();
}
"#;

const LONG_TO_BIGINT: &str = r#"function longToBigint(long: Long): bigint {
  return BigInt(long.toString());
}
"#;

fn timestamp_type_field(options: &CodegenOptions) -> &'static str {
    if options.type_tags {
        "$type: \"google.protobuf.Timestamp\", "
    } else {
        ""
    }
}

fn to_timestamp(options: &CodegenOptions) -> String {
    let type_field = timestamp_type_field(options);
    let seconds = match options.long {
        LongMode::Number => "Math.trunc(date.getTime() / 1_000)",
        LongMode::String => "Math.trunc(date.getTime() / 1_000).toString()",
        LongMode::Bigint => "BigInt(Math.trunc(date.getTime() / 1_000))",
    };
    let (param, preamble) = match options.date {
        DateMode::String => ("dateStr: string", "  const date = new Date(dateStr);\n"),
        _ => ("date: Date", ""),
    };
    let mut code = String::new();
    code.push_str(&format!("function toTimestamp({param}): Timestamp {{\n"));
    code.push_str(preamble);
    code.push_str(&format!("  const seconds = {seconds};\n"));
    code.push_str("  const nanos = (date.getTime() % 1_000) * 1_000_000;\n");
    code.push_str(&format!("  return {{ {type_field}seconds, nanos }};\n"));
    code.push_str("}\n");
    code
}

fn from_timestamp(options: &CodegenOptions) -> String {
    let seconds = match options.long {
        LongMode::Number => "t.seconds",
        LongMode::String | LongMode::Bigint => "Number(t.seconds)",
    };
    let (ret, result) = match options.date {
        DateMode::String => ("string", "new Date(millis).toISOString()"),
        _ => ("Date", "new Date(millis)"),
    };
    let mut code = String::new();
    code.push_str(&format!("function fromTimestamp(t: Timestamp): {ret} {{\n"));
    code.push_str(&format!("  let millis = ({seconds} || 0) * 1_000;\n"));
    code.push_str("  millis += (t.nanos || 0) / 1_000_000;\n");
    code.push_str(&format!("  return {result};\n"));
    code.push_str("}\n");
    code
}

fn from_json_timestamp(options: &CodegenOptions) -> String {
    match options.date {
        DateMode::Date | DateMode::String => r#"function fromJsonTimestamp(o: any): Date {
  if (o instanceof Date) {
    return o;
  } else if (typeof o === "string") {
    return new Date(o);
  } else {
    return fromTimestamp(Timestamp.fromJSON(o));
  }
}
"#
        .to_string(),
        DateMode::Timestamp => r#"function fromJsonTimestamp(o: any): Timestamp {
  if (o instanceof Date) {
    return toTimestamp(o);
  } else if (typeof o === "string") {
    return toTimestamp(new Date(o));
  } else {
    return Timestamp.fromJSON(o);
  }
}
"#
        .to_string(),
    }
}

const FROM_JSON_OBJECT_ID: &str = r#"function fromJsonObjectId(o: any): mongodb.ObjectId {
  if (o instanceof mongodb.ObjectId) {
    return o;
  } else if (typeof o === "string") {
    return new mongodb.ObjectId(o);
  } else {
    return fromProtoObjectId(ObjectId.fromJSON(o));
  }
}
"#;

const FROM_PROTO_OBJECT_ID: &str = r#"function fromProtoObjectId(oid: ObjectId): mongodb.ObjectId {
  return new mongodb.ObjectId(oid.value);
}
"#;

const TO_PROTO_OBJECT_ID: &str = r#"function toProtoObjectId(oid: mongodb.ObjectId): ObjectId {
  const value = oid.toString();
  return { value };
}
"#;

const IS_SET: &str = r#"function isSet(value: any): boolean {
  return value !== null && value !== undefined;
}
"#;

const IS_OBJECT: &str = r#"function isObject(value: any): boolean {
  return typeof value === "object" && value !== null;
}
"#;

fn deep_partial(options: &CodegenOptions) -> String {
    let oneof_case = if options.oneof == OneofMode::Unions {
        "\n      : T extends { $case: string }\n        ? { [K in keyof Omit<T, \"$case\">]?: DeepPartial<T[K]> } & { $case: T[\"$case\"] }"
    } else {
        ""
    };
    let keys = if options.type_tags {
        "Exclude<keyof T, \"$type\">"
    } else {
        "keyof T"
    };
    let mut code = String::new();
    code.push_str(
        "type Builtin = Date | Function | Uint8Array | string | number | boolean | bigint | undefined;\n",
    );
    code.push_str("type DeepPartial<T> = T extends Builtin\n");
    code.push_str("  ? T\n");
    code.push_str("  : T extends Array<infer U>\n");
    code.push_str("    ? Array<DeepPartial<U>>\n");
    code.push_str("    : T extends ReadonlyArray<infer U>\n");
    code.push_str(&format!("      ? ReadonlyArray<DeepPartial<U>>{oneof_case}\n"));
    code.push_str("      : T extends {}\n");
    code.push_str(&format!("        ? {{ [K in {keys}]?: DeepPartial<T[K]> }}\n"));
    code.push_str("        : Partial<T>;\n");
    code
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use test_case::test_case;

    #[test]
    fn render___long_to_number___guards_safe_integer_range() {
        let body = render(RuntimeHelper::LongToNumber, &CodegenOptions::default());

        assert!(body.contains("long.gt(Number.MAX_SAFE_INTEGER)"));
        assert!(body.contains("long.lt(Number.MIN_SAFE_INTEGER)"));
        assert!(body.contains("throw new globalThis.Error"));
    }

    #[test_case(LongMode::Number, "Math.trunc(date.getTime() / 1_000)")]
    #[test_case(LongMode::String, "Math.trunc(date.getTime() / 1_000).toString()")]
    #[test_case(LongMode::Bigint, "BigInt(Math.trunc(date.getTime() / 1_000))")]
    fn render___to_timestamp___seconds_follow_long_mode(mode: LongMode, expected: &str) {
        let options = CodegenOptions {
            long: mode,
            ..CodegenOptions::default()
        };

        let body = render(RuntimeHelper::ToTimestamp, &options);

        assert!(body.contains(expected));
    }

    #[test]
    fn render___from_json_timestamp___raw_mode_returns_wrapper() {
        let options = CodegenOptions {
            date: DateMode::Timestamp,
            ..CodegenOptions::default()
        };

        let body = render(RuntimeHelper::FromJsonTimestamp, &options);

        assert!(body.contains("function fromJsonTimestamp(o: any): Timestamp {"));
        assert!(body.contains("return Timestamp.fromJSON(o);"));
    }

    #[test]
    fn expand_demands___pulls_in_referenced_helpers() {
        let mut helpers = HelperSet::new();
        helpers.demand(RuntimeHelper::FromJsonTimestamp);

        expand_demands(&mut helpers, &CodegenOptions::default());

        assert!(helpers.contains(RuntimeHelper::FromTimestamp));
    }

    #[test]
    fn expand_demands___object_id___closes_over_proto_conversion() {
        let mut helpers = HelperSet::new();
        helpers.demand(RuntimeHelper::FromJsonObjectId);

        expand_demands(&mut helpers, &CodegenOptions::default());

        assert!(helpers.contains(RuntimeHelper::FromProtoObjectId));
    }

    #[test]
    fn render___deep_partial___adds_case_arm_for_unions() {
        let options = CodegenOptions {
            oneof: OneofMode::Unions,
            ..CodegenOptions::default()
        };

        let body = render(RuntimeHelper::DeepPartial, &options);

        assert!(body.contains("T extends { $case: string }"));

        let plain = render(RuntimeHelper::DeepPartial, &CodegenOptions::default());
        assert!(!plain.contains("$case"));
    }
}
