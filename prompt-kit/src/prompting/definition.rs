//! Parameter Definition Model
//!
//! Rust types for the parameter definition the report server sends on every
//! prompt round trip. Definitions are deserialized with serde_json.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Name of the system parameter that toggles the whole prompt UI.
pub const SHOW_PARAMETERS: &str = "showParameters";

/// Attribute naming the control kind a parameter is rendered with.
pub const RENDER_TYPE_ATTRIBUTE: &str = "parameter-render-type";

/// Lenient string deserializer: accepts strings, numbers and booleans.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let val = Option::<Value>::deserialize(d)?;
    Ok(match val {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    })
}

fn default_type() -> String {
    "java.lang.String".to_string()
}

/// The full parameter definition for one report.
///
/// # Example JSON
///
/// ```text
/// {
///   "promptNeeded": true,
///   "paginate": true,
///   "totalPages": 10,
///   "page": 0,
///   "autoSubmitUI": true,
///   "parameterGroups": [
///     {
///       "name": "parameters",
///       "parameters": [
///         {
///           "name": "region",
///           "type": "java.lang.String",
///           "strict": true,
///           "list": true,
///           "attributes": {"parameter-render-type": "dropdown"},
///           "values": [{"value": "East", "label": "East", "selected": true}]
///         }
///       ]
///     }
///   ],
///   "errors": {"region": ["Region is required"]}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDefinition {
    /// Whether the report cannot run until the user answers the prompt
    #[serde(default)]
    pub prompt_needed: bool,

    /// Whether the report output is paginated
    #[serde(default)]
    pub paginate: bool,

    #[serde(default)]
    pub total_pages: i64,

    /// Current page, zero based
    #[serde(default)]
    pub page: i64,

    /// Explicit auto-submit setting; overrides `auto_submit_ui` when present
    #[serde(default)]
    pub auto_submit: Option<bool>,

    /// Auto-submit default configured for the UI
    #[serde(default, rename = "autoSubmitUI")]
    pub auto_submit_ui: bool,

    /// Layout hint for group panels
    #[serde(default)]
    pub layout: Option<String>,

    #[serde(default)]
    pub parameter_groups: Vec<ParameterGroup>,

    /// Validation errors by parameter name
    #[serde(default)]
    pub errors: IndexMap<String, Vec<String>>,
}

impl ParameterDefinition {
    /// Parse a definition from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Iterate over every parameter of every group, in order
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameter_groups.iter().flat_map(|g| g.parameters.iter())
    }

    /// Look up a parameter by name
    pub fn get_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters().find(|p| p.name == name)
    }

    /// Look up a group by name
    pub fn get_group(&self, name: &str) -> Option<&ParameterGroup> {
        self.parameter_groups.iter().find(|g| g.name == name)
    }

    /// Find the group that owns a parameter
    pub fn group_of(&self, param_name: &str) -> Option<&ParameterGroup> {
        self.parameter_groups
            .iter()
            .find(|g| g.parameters.iter().any(|p| p.name == param_name))
    }

    /// Validation errors for a parameter (empty when there are none)
    pub fn errors_for(&self, param_name: &str) -> &[String] {
        self.errors
            .get(param_name)
            .map(|e| e.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the parameter UI should be shown at all.
    ///
    /// Only a `showParameters` parameter with `"false"` selected hides it.
    pub fn show_parameter_ui(&self) -> bool {
        match self.get_parameter(SHOW_PARAMETERS) {
            Some(p) => !p.is_selected_value("false"),
            None => true,
        }
    }

    /// Whether auto-submit may be turned on
    pub fn allow_auto_submit(&self) -> bool {
        self.auto_submit.unwrap_or(self.auto_submit_ui)
    }
}

/// An ordered group of parameters rendered together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterGroup {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ParameterGroup {
    pub fn new(name: impl Into<String>) -> Self {
        ParameterGroup {
            name: name.into(),
            label: None,
            parameters: Vec::new(),
        }
    }

    /// Copy of the group header without its parameters
    pub fn header(&self) -> ParameterGroup {
        ParameterGroup {
            name: self.name.clone(),
            label: self.label.clone(),
            parameters: Vec::new(),
        }
    }
}

/// A single report parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    /// Java-style value type, e.g. `java.lang.Integer`
    #[serde(rename = "type", default = "default_type")]
    pub param_type: String,

    /// Only values from `values` are accepted
    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub multi_select: bool,

    /// Whether the parameter picks from a value list
    #[serde(default)]
    pub list: bool,

    #[serde(default)]
    pub mandatory: bool,

    #[serde(default)]
    pub values: Vec<ParameterValue>,

    /// Rendering hints (`hidden`, `label`, `parameter-render-type`, ...)
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,

    /// Insertion hint set by the differ: name of the preceding sibling
    #[serde(skip)]
    pub after: Option<String>,

    /// Set by the differ when the parameter's error list changed
    #[serde(skip)]
    pub is_error_changed: bool,

    /// Set by the differ for explicitly nulled parameters
    #[serde(skip)]
    pub force_update: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Parameter {
            name: name.into(),
            param_type: default_type(),
            strict: false,
            multi_select: false,
            list: false,
            mandatory: false,
            values: Vec::new(),
            attributes: IndexMap::new(),
            after: None,
            is_error_changed: false,
            force_update: false,
        }
    }

    /// Append a candidate value
    pub fn with_value(mut self, value: &str, label: &str, selected: bool) -> Self {
        self.values.push(ParameterValue {
            value: value.to_string(),
            label: label.to_string(),
            selected,
            value_type: None,
        });
        self
    }

    /// Set a string attribute
    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Get an attribute as a string
    pub fn attribute(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Whether an attribute is set to `true` (boolean or string)
    pub fn attribute_flag(&self, key: &str) -> bool {
        match self.attributes.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.attribute_flag("hidden")
    }

    /// Display label, falling back to the parameter name
    pub fn label(&self) -> String {
        self.attribute("label").unwrap_or_else(|| self.name.clone())
    }

    pub fn render_type(&self) -> Option<String> {
        self.attribute(RENDER_TYPE_ATTRIBUTE)
    }

    /// Raw values of the selected candidates, in order
    pub fn selected_values(&self) -> Vec<String> {
        self.values
            .iter()
            .filter(|v| v.selected)
            .map(|v| v.value.clone())
            .collect()
    }

    pub fn is_selected_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.selected && v.value == value)
    }

    /// A strict parameter without candidates cannot be answered yet
    pub fn is_waiting_for_values(&self) -> bool {
        self.strict && self.values.is_empty()
    }

    /// Whether the parameter gets a panel in the widget tree
    pub fn is_renderable(&self) -> bool {
        !self.is_hidden() && !self.is_waiting_for_values()
    }
}

/// A candidate value of a parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    /// Raw value in transport format
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,

    #[serde(default)]
    pub selected: bool,

    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
}

impl ParameterValue {
    /// Label shown to the user, falling back to the raw value
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.value
        } else {
            &self.label
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definition() {
        let json = r#"{
            "promptNeeded": true,
            "paginate": true,
            "totalPages": 4,
            "autoSubmitUI": true,
            "parameterGroups": [{
                "name": "parameters",
                "parameters": [{
                    "name": "year",
                    "type": "java.lang.Integer",
                    "strict": true,
                    "attributes": {"parameter-render-type": "dropdown", "hidden": false},
                    "values": [
                        {"value": 2023, "label": "2023"},
                        {"value": 2024, "label": "2024", "selected": true}
                    ]
                }]
            }],
            "errors": {"year": ["Pick a year"]}
        }"#;

        let defn = ParameterDefinition::from_json(json).unwrap();
        assert!(defn.prompt_needed);
        assert_eq!(defn.total_pages, 4);
        assert!(defn.allow_auto_submit());

        let year = defn.get_parameter("year").unwrap();
        assert_eq!(year.param_type, "java.lang.Integer");
        assert_eq!(year.selected_values(), vec!["2024".to_string()]);
        assert_eq!(year.render_type().as_deref(), Some("dropdown"));
        assert!(!year.is_hidden());
        assert_eq!(defn.errors_for("year"), &["Pick a year".to_string()]);
        assert!(defn.errors_for("missing").is_empty());
    }

    #[test]
    fn test_show_parameter_ui() {
        let mut defn = ParameterDefinition::default();
        assert!(defn.show_parameter_ui());

        let mut group = ParameterGroup::new("system");
        group.parameters.push(
            Parameter::new(SHOW_PARAMETERS)
                .with_value("true", "true", false)
                .with_value("false", "false", true),
        );
        defn.parameter_groups.push(group);
        assert!(!defn.show_parameter_ui());
    }

    #[test]
    fn test_allow_auto_submit_prefers_explicit_flag() {
        let defn = ParameterDefinition {
            auto_submit: Some(false),
            auto_submit_ui: true,
            ..Default::default()
        };
        assert!(!defn.allow_auto_submit());
    }

    #[test]
    fn test_renderable() {
        let hidden = Parameter::new("h").with_attribute("hidden", "true");
        assert!(!hidden.is_renderable());

        let mut waiting = Parameter::new("w");
        waiting.strict = true;
        assert!(waiting.is_waiting_for_values());
        assert!(!waiting.is_renderable());

        let plain = Parameter::new("p");
        assert!(plain.is_renderable());
        assert_eq!(plain.label(), "p");
    }

    #[test]
    fn test_group_of() {
        let mut group = ParameterGroup::new("g1");
        group.parameters.push(Parameter::new("a"));
        let defn = ParameterDefinition {
            parameter_groups: vec![group],
            ..Default::default()
        };
        assert_eq!(defn.group_of("a").map(|g| g.name.as_str()), Some("g1"));
        assert!(defn.group_of("b").is_none());
    }
}
