use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-call mapping options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    /// Replace existing values. When false, an existing truthy value is kept.
    pub overwrite: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

impl MapOptions {
    /// Options that only fill fields which are absent or falsy.
    pub fn keep_existing() -> Self {
        Self { overwrite: false }
    }

    /// Whether a write over `existing` should go ahead.
    pub(crate) fn permits_write(&self, existing: Option<&Value>) -> bool {
        self.overwrite || !existing.is_some_and(is_truthy)
    }
}

/// Form truthiness: `null`, `false`, `0` and `""` are falsy; containers are truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overwrite_defaults_to_true() {
        assert!(MapOptions::default().overwrite);
        let parsed: MapOptions = serde_json::from_str("{}").unwrap();
        assert!(parsed.overwrite);
    }

    #[test]
    fn deserializes_overwrite_false() {
        let parsed: MapOptions = serde_json::from_str(r#"{"overwrite": false}"#).unwrap();
        assert_eq!(parsed, MapOptions::keep_existing());
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn keep_existing_only_writes_over_falsy() {
        let opts = MapOptions::keep_existing();
        assert!(opts.permits_write(None));
        assert!(opts.permits_write(Some(&json!(""))));
        assert!(!opts.permits_write(Some(&json!("set"))));
        assert!(MapOptions::default().permits_write(Some(&json!("set"))));
    }
}
