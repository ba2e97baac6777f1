//! Parameter Store
//!
//! The shared store holding the current value of every parameter. Widgets read
//! and write values by parameter name; the engine re-initializes values from
//! the definition's selection when value lists change.

use indexmap::IndexMap;
use serde_json::Value;

/// Read access to parameter values, handed to widget constructors.
pub trait ParameterAccess {
    /// Get the current value of a parameter
    fn get_parameter_value(&self, name: &str) -> Option<&Value>;
}

/// A store of parameter values keyed by parameter name.
///
/// # Example
///
/// ```rust,ignore
/// let mut store = ParameterStore::new();
///
/// store.set("region", json!("East"));
/// store.set("products", json!(["A", "B"]));
///
/// let region = store.get("region"); // Some(&json!("East"))
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    /// Values by parameter name, in insertion order
    values: IndexMap<String, Value>,
}

impl ParameterStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by parameter name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set a value.
    ///
    /// Returns `true` when the stored value actually changed.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if self.values.get(name) == Some(&value) {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }
}

impl ParameterAccess for ParameterStore {
    fn get_parameter_value(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_set_basic() {
        let mut store = ParameterStore::new();

        store.set("region", json!("East"));
        assert_eq!(store.get("region"), Some(&json!("East")));

        store.set("products", json!(["A", "B"]));
        assert_eq!(store.get("products").and_then(|v| v.as_array()).map(|a| a.len()), Some(2));
        assert!(store.get("year").is_none());
    }

    #[test]
    fn test_set_reports_change() {
        let mut store = ParameterStore::new();

        assert!(store.set("region", json!("East")));
        assert!(!store.set("region", json!("East")));
        assert!(store.set("region", json!("West")));
        assert_eq!(store.get("region"), Some(&json!("West")));
    }

    #[test]
    fn test_parameter_access() {
        let mut store = ParameterStore::new();
        store.set("year", json!("2024"));

        let access: &dyn ParameterAccess = &store;
        assert_eq!(access.get_parameter_value("year"), Some(&json!("2024")));
    }
}
