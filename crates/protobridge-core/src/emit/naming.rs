//! Naming convention utilities for code generation.
//!
//! Converts between the schema's declared names (snake_case fields,
//! dotted fully-qualified types) and the generated TypeScript surface
//! (camelCase properties, underscore-joined local type names, configured
//! JSON keys).

use crate::config::JsonNameMode;

/// Convert snake_case to camelCase.
pub fn to_camel_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = false;

    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Capitalize the first letter of a string.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lowercase the first letter of a string.
///
/// Used for enum converter function names: `Foo_Status` becomes the
/// `foo_StatusFromJSON` family.
pub fn uncapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// The local TypeScript name of a fully-qualified type.
///
/// Package segments are lowercase by proto convention; the local name is
/// the capitalized tail joined with underscores, so `pkg.Outer.Inner`
/// becomes `Outer_Inner`.
pub fn local_type_name(fully_qualified: &str) -> String {
    let name = fully_qualified.strip_prefix('.').unwrap_or(fully_qualified);
    let segments: Vec<&str> = name.split('.').collect();
    let first_type = segments
        .iter()
        .position(|s| s.chars().next().is_some_and(char::is_uppercase))
        .unwrap_or(segments.len().saturating_sub(1));
    segments[first_type..].join("_")
}

/// The generated property name for a declared field name.
pub fn property_name(field_name: &str) -> String {
    to_camel_case(field_name)
}

/// The canonical-JSON key for a declared field name.
pub fn json_name(field_name: &str, mode: JsonNameMode) -> String {
    match mode {
        JsonNameMode::LowerCamel => to_camel_case(field_name),
        JsonNameMode::Keep => field_name.to_string(),
    }
}

/// The converter function name for an enum, e.g. `fooStatusFromJSON`.
pub fn enum_converter_name(local_enum_name: &str, suffix: &str) -> String {
    format!("{}{}", uncapitalize(local_enum_name), suffix)
}
