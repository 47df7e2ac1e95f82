//! Raw string → typed value coercion.
//!
//! Coercion is permissive: malformed numbers become `null` (the JSON
//! rendering of not-a-number) and anything other than `"true"` is `false`.
//! Strictness belongs to validation layers above the mapper.

use crate::sanitize::Sanitizer;
use formbind_model::{FieldKind, PrimitiveKind, SchemaError, SchemaResult, TypeDefinition};
use serde_json::{Number, Value};

/// Coerces one raw value for `field` of `def`.
///
/// Returns `Ok(None)` when the raw value is absent or empty.
pub fn coerce(
    raw: Option<&str>,
    field: &str,
    kind: &FieldKind,
    def: &TypeDefinition,
    sanitizer: &dyn Sanitizer,
) -> SchemaResult<Option<Value>> {
    let primitive = match kind {
        FieldKind::Primitive(primitive) => *primitive,
        other => {
            return Err(SchemaError::NotPrimitive {
                field: field.to_string(),
                kind: other.name(),
            });
        }
    };
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let value = match primitive {
        PrimitiveKind::Integer => parse_integer(raw),
        PrimitiveKind::Number => parse_number(raw),
        PrimitiveKind::Boolean => Value::Bool(raw == "true"),
        PrimitiveKind::String if def.is_html(field) => {
            Value::String(sanitizer.sanitize_html(&sanitizer.unescape(raw)))
        }
        PrimitiveKind::String => Value::String(sanitizer.escape(raw)),
    };
    Ok(Some(value))
}

/// Base-10 leading-integer parse: whitespace and a sign are accepted,
/// anything after the digits is ignored. No digits → `null`.
pub fn parse_integer(raw: &str) -> Value {
    let trimmed = raw.trim_start();
    let (negative, rest) = split_sign(trimmed);
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return Value::Null;
    }
    let digits = &rest[..digits_len];
    match digits.parse::<i64>() {
        Ok(n) => Value::from(if negative { -n } else { n }),
        // Too wide for i64: fall back to the nearest float.
        Err(_) => {
            let f: f64 = digits.parse().unwrap_or(f64::INFINITY);
            float_value(if negative { -f } else { f })
        }
    }
}

/// Leading floating point parse (`"2.5kg"` → `2.5`, `"1e3"` → `1000`).
/// No number, or a non-finite one → `null`.
pub fn parse_number(raw: &str) -> Value {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return Value::Null;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    match trimmed[..end].parse::<f64>() {
        Ok(f) => float_value(f),
        Err(_) => Value::Null,
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s)
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Integral floats are stored as integers so `"10"` and `"10.0"` agree.
fn float_value(f: f64) -> Value {
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Value::from(f as i64);
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::HtmlSanitizer;
    use formbind_model::FieldDef;
    use serde_json::json;
    use std::sync::Arc;

    fn post_def() -> TypeDefinition {
        TypeDefinition::builder("Post")
            .field("title", FieldDef::string())
            .field("body", FieldDef::string())
            .html("body")
            .build()
    }

    fn run(raw: Option<&str>, field: &str, kind: FieldKind) -> SchemaResult<Option<Value>> {
        coerce(raw, field, &kind, &post_def(), &HtmlSanitizer)
    }

    fn prim(kind: PrimitiveKind) -> FieldKind {
        FieldKind::Primitive(kind)
    }

    #[test]
    fn absent_or_empty_is_none() {
        for kind in [
            PrimitiveKind::String,
            PrimitiveKind::Number,
            PrimitiveKind::Integer,
            PrimitiveKind::Boolean,
        ] {
            assert_eq!(run(None, "title", prim(kind)).unwrap(), None);
            assert_eq!(run(Some(""), "title", prim(kind)).unwrap(), None);
        }
    }

    #[test]
    fn integer_parsing() {
        assert_eq!(parse_integer("42"), json!(42));
        assert_eq!(parse_integer("  -7"), json!(-7));
        assert_eq!(parse_integer("+5"), json!(5));
        assert_eq!(parse_integer("3.9"), json!(3));
        assert_eq!(parse_integer("12abc"), json!(12));
        assert_eq!(parse_integer("0x1F"), json!(0));
        assert_eq!(parse_integer("abc"), Value::Null);
        assert_eq!(parse_integer("-"), Value::Null);
    }

    #[test]
    fn integer_overflow_falls_back_to_float() {
        assert_eq!(parse_integer("99999999999999999999"), json!(1e20));
    }

    #[test]
    fn number_parsing() {
        assert_eq!(parse_number("2.5"), json!(2.5));
        assert_eq!(parse_number("2.5kg"), json!(2.5));
        assert_eq!(parse_number(" .5"), json!(0.5));
        assert_eq!(parse_number("1e3"), json!(1000));
        assert_eq!(parse_number("1e"), json!(1));
        assert_eq!(parse_number("-0.25"), json!(-0.25));
        assert_eq!(parse_number("10.0"), json!(10));
        assert_eq!(parse_number("."), Value::Null);
        assert_eq!(parse_number("abc"), Value::Null);
        assert_eq!(parse_number("1e999"), Value::Null);
    }

    #[test]
    fn boolean_is_literal_true_only() {
        let b = prim(PrimitiveKind::Boolean);
        assert_eq!(run(Some("true"), "x", b.clone()).unwrap(), Some(json!(true)));
        assert_eq!(run(Some("TRUE"), "x", b.clone()).unwrap(), Some(json!(false)));
        assert_eq!(run(Some("1"), "x", b.clone()).unwrap(), Some(json!(false)));
        assert_eq!(run(Some("on"), "x", b).unwrap(), Some(json!(false)));
    }

    #[test]
    fn plain_string_is_escaped() {
        let out = run(Some("<i>hi</i>"), "title", prim(PrimitiveKind::String)).unwrap();
        assert_eq!(out, Some(json!("&lt;i&gt;hi&lt;&#x2F;i&gt;")));
    }

    #[test]
    fn html_string_is_unescaped_then_sanitized() {
        let out = run(
            Some("&lt;i&gt;hi&lt;/i&gt;<script>x()</script>"),
            "body",
            prim(PrimitiveKind::String),
        )
        .unwrap();
        assert_eq!(out, Some(json!("<i>hi</i>")));
    }

    #[test]
    fn array_kind_is_schema_error() {
        let err = run(Some("x"), "tags", FieldDef::array(FieldDef::string()).kind).unwrap_err();
        assert!(matches!(err, SchemaError::NotPrimitive { kind: "array", .. }));
    }

    #[test]
    fn custom_kind_is_schema_error() {
        let address = Arc::new(TypeDefinition::builder("Address").build());
        let err = run(Some("x"), "address", FieldKind::Custom(address)).unwrap_err();
        assert!(matches!(err, SchemaError::NotPrimitive { kind: "custom", .. }));
    }
}
