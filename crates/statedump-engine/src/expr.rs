//! Expression rendering for primitives and construction forms.
//!
//! These helpers are the stateless half of the serializer: they turn a
//! primitive (under a shadowing snapshot) or a class intrinsic into
//! source text. Picking between construction and reference is the
//! dumper's job.
//!
//! A shadowed global identifier cannot be spelled by name, so the
//! corresponding literals fall back to parenthesized expressions that
//! evaluate to the same value: `(void 0)`, `(0/0)`, `(1/0)`, `(-1/0)`.

use chrono::{DateTime, SecondsFormat};

use crate::object_model::Value;
use crate::quote;

// ---------------------------------------------------------------------------
// ShadowSnapshot
// ---------------------------------------------------------------------------

/// Which of the special global names are shadowed at the current dump
/// cursor. Computed once per rendered expression by the dumper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadowSnapshot {
    pub undefined: bool,
    pub nan: bool,
    pub infinity: bool,
}

// ---------------------------------------------------------------------------
// Primitive rendering
// ---------------------------------------------------------------------------

pub fn undefined_expr(shadow: &ShadowSnapshot) -> &'static str {
    if shadow.undefined {
        "(void 0)"
    } else {
        "undefined"
    }
}

pub fn number_expr(n: f64, shadow: &ShadowSnapshot) -> String {
    if n.is_nan() {
        return if shadow.nan { "(0/0)" } else { "NaN" }.to_string();
    }
    if n.is_infinite() {
        return match (n > 0.0, shadow.infinity) {
            (true, false) => "Infinity".to_string(),
            (true, true) => "(1/0)".to_string(),
            (false, false) => "-Infinity".to_string(),
            (false, true) => "(-1/0)".to_string(),
        };
    }
    quote::number_literal(n)
}

/// Render a primitive value; `None` when the value is an object
/// reference and the caller must consult the interned state.
pub fn primitive_expr(value: &Value, shadow: &ShadowSnapshot) -> Option<String> {
    match value {
        Value::Undefined => Some(undefined_expr(shadow).to_string()),
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_expr(*n, shadow)),
        Value::Str(s) => Some(quote::quote_string(s)),
        Value::Object(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Construction forms
// ---------------------------------------------------------------------------

/// `new Date('…')` from the epoch, ISO 8601 with millisecond precision.
/// `None` when the epoch is outside the representable range.
pub fn date_expr(epoch_ms: i64) -> Option<String> {
    let datetime = DateTime::from_timestamp_millis(epoch_ms)?;
    Some(format!(
        "new Date('{}')",
        datetime.to_rfc3339_opts(SecondsFormat::Millis, true)
    ))
}

/// Literal `/pattern/flags` form.
pub fn regexp_expr(pattern: &str, flags: &str) -> String {
    format!("/{pattern}/{flags}")
}

/// Sentinel construction the target interpreter resolves by key.
pub fn builtin_expr(key: &str) -> String {
    format!("new {}", quote::quote_string(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_primitives() {
        let shadow = ShadowSnapshot::default();
        assert_eq!(
            primitive_expr(&Value::Undefined, &shadow).as_deref(),
            Some("undefined")
        );
        assert_eq!(primitive_expr(&Value::Null, &shadow).as_deref(), Some("null"));
        assert_eq!(
            primitive_expr(&Value::Bool(true), &shadow).as_deref(),
            Some("true")
        );
        assert_eq!(
            primitive_expr(&Value::Number(-0.0), &shadow).as_deref(),
            Some("-0")
        );
        assert_eq!(
            primitive_expr(&Value::Str("hi".into()), &shadow).as_deref(),
            Some("'hi'")
        );
        assert!(primitive_expr(&Value::Object(crate::object_model::ObjectId::new(0)), &shadow).is_none());
    }

    #[test]
    fn special_numbers_respect_shadowing() {
        let clear = ShadowSnapshot::default();
        let shadowed = ShadowSnapshot {
            undefined: true,
            nan: true,
            infinity: true,
        };
        assert_eq!(number_expr(f64::NAN, &clear), "NaN");
        assert_eq!(number_expr(f64::NAN, &shadowed), "(0/0)");
        assert_eq!(number_expr(f64::INFINITY, &clear), "Infinity");
        assert_eq!(number_expr(f64::INFINITY, &shadowed), "(1/0)");
        assert_eq!(number_expr(f64::NEG_INFINITY, &clear), "-Infinity");
        assert_eq!(number_expr(f64::NEG_INFINITY, &shadowed), "(-1/0)");
        assert_eq!(undefined_expr(&shadowed), "(void 0)");
    }

    #[test]
    fn date_renders_iso_8601() {
        assert_eq!(
            date_expr(0).as_deref(),
            Some("new Date('1970-01-01T00:00:00.000Z')")
        );
        assert_eq!(
            date_expr(1_500_000_000_123).as_deref(),
            Some("new Date('2017-07-14T02:40:00.123Z')")
        );
    }

    #[test]
    fn regexp_and_builtin_forms() {
        assert_eq!(regexp_expr("a+b", "gi"), "/a+b/gi");
        assert_eq!(builtin_expr("Object.prototype"), "new 'Object.prototype'");
    }
}
