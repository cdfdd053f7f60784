//! The registry-owned state store shared between tools and executions.
//!
//! The store outlives individual script runs and is the canonical channel
//! for tool-to-tool and run-to-run communication. Keys may carry metadata
//! (a description and a custom formatter) independently of whether a value
//! is present; formatters only run when one is.

use chrono::{SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use nuwa_core::Value;
use std::fmt;

/// Per-key formatter used when rendering state for the prompt builder.
pub type StateFormatter = Box<dyn Fn(&Value) -> String + Send + Sync>;

/// Descriptive metadata attached to a state key.
#[derive(Default)]
pub struct StateMetadata {
    pub description: Option<String>,
    pub formatter: Option<StateFormatter>,
}

impl StateMetadata {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            formatter: None,
        }
    }
}

impl fmt::Debug for StateMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMetadata")
            .field("description", &self.description)
            .field("formatter", &self.formatter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Mapping from string key to `Value`, plus per-key metadata.
#[derive(Debug, Default)]
pub struct StateStore {
    values: IndexMap<String, Value>,
    metadata: IndexMap<String, StateMetadata>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value. Metadata previously registered for the key is kept.
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    /// Store a value together with its metadata.
    pub fn set_with_metadata(&mut self, key: &str, value: Value, metadata: StateMetadata) {
        self.values.insert(key.to_string(), value);
        self.metadata.insert(key.to_string(), metadata);
    }

    /// Declare metadata for a key that may not have a value yet.
    pub fn register_metadata(&mut self, key: &str, metadata: StateMetadata) {
        self.metadata.insert(key.to_string(), metadata);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn all(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Drop all values and all metadata.
    pub fn clear(&mut self) {
        self.values.clear();
        self.metadata.clear();
    }

    /// Human-readable rendering for the prompt builder: one line per key
    /// with a value, `key: formattedValue (description)`. Uses the per-key
    /// formatter when registered, else the default formatter.
    pub fn format_for_prompt(&self) -> String {
        let mut lines = Vec::with_capacity(self.values.len());
        for (key, value) in &self.values {
            let meta = self.metadata.get(key);
            let formatted = match meta.and_then(|m| m.formatter.as_ref()) {
                Some(custom) => custom(value),
                None => default_format(key, value),
            };
            match meta.and_then(|m| m.description.as_deref()) {
                Some(description) => lines.push(format!("{}: {} ({})", key, formatted, description)),
                None => lines.push(format!("{}: {}", key, formatted)),
            }
        }
        lines.join("\n")
    }
}

/// Default state rendering: keys that look temporal (`time`/`date` in the
/// name) holding an integral number in the plausible epoch-millisecond
/// range render as `<raw> (<ISO-8601>)`; everything else renders as JSON.
fn default_format(key: &str, value: &Value) -> String {
    if let Value::Number(n) = value {
        let key = key.to_lowercase();
        if (key.contains("time") || key.contains("date"))
            && value.is_integer()
            && (1e11..1e14).contains(n)
        {
            if let Some(ts) = Utc.timestamp_millis_opt(*n as i64).single() {
                return format!(
                    "{} ({})",
                    value,
                    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
                );
            }
        }
    }
    value.to_json_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_set_preserves_metadata() {
        let mut store = StateStore::new();
        store.register_metadata("mood", StateMetadata::described("agent mood"));
        store.set("mood", Value::String("calm".into()));
        assert_eq!(store.format_for_prompt(), "mood: \"calm\" (agent mood)");

        store.set("mood", Value::String("bold".into()));
        assert_eq!(store.format_for_prompt(), "mood: \"bold\" (agent mood)");
    }

    #[test]
    fn test_metadata_without_value_renders_nothing() {
        let mut store = StateStore::new();
        store.register_metadata("pending", StateMetadata::described("declared only"));
        assert_eq!(store.format_for_prompt(), "");
        assert!(!store.has("pending"));
    }

    #[test]
    fn test_custom_formatter_wins() {
        let mut store = StateStore::new();
        store.set_with_metadata(
            "balance",
            Value::Number(12.5),
            StateMetadata {
                description: Some("account balance".into()),
                formatter: Some(Box::new(|v| format!("${}", v))),
            },
        );
        assert_eq!(store.format_for_prompt(), "balance: $12.5 (account balance)");
    }

    #[test]
    fn test_default_formatter_renders_epoch_millis() {
        let mut store = StateStore::new();
        store.set("last_update_time", Value::Number(1700000000000.0));
        let line = store.format_for_prompt();
        assert!(line.starts_with("last_update_time: 1700000000000 (2023-11-14T"));
        assert!(line.ends_with("Z)"));
    }

    #[test]
    fn test_default_formatter_leaves_small_numbers_alone() {
        let mut store = StateStore::new();
        store.set("retry_time", Value::Number(30.0));
        assert_eq!(store.format_for_prompt(), "retry_time: 30.0");
    }

    #[test]
    fn test_clear_drops_values_and_metadata() {
        let mut store = StateStore::new();
        store.set_with_metadata("k", Value::Null, StateMetadata::described("d"));
        store.clear();
        store.set("k", Value::Bool(true));
        assert_eq!(store.format_for_prompt(), "k: true");
    }
}
