//! Prompt State
//!
//! The public state object of a prompt panel. Read-only fields are derived
//! from the current definition; the mutable ones can only change through
//! [`validate_state`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::definition::ParameterDefinition;

/// Snapshot of the panel state.
///
/// # Example JSON
///
/// ```text
/// {
///   "promptNeeded": false,
///   "paginate": true,
///   "totalPages": 10,
///   "showParameterUI": true,
///   "allowAutoSubmit": true,
///   "parametersChanged": false,
///   "autoSubmit": true,
///   "page": 0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptState {
    pub prompt_needed: bool,
    pub paginate: bool,
    pub total_pages: i64,
    #[serde(rename = "showParameterUI")]
    pub show_parameter_ui: bool,
    pub allow_auto_submit: bool,
    pub parameters_changed: bool,
    pub auto_submit: bool,
    pub page: i64,
}

impl PromptState {
    /// Combine a definition with the mutable flags held by the controller
    pub fn new(definition: &ParameterDefinition, parameters_changed: bool, auto_submit: bool) -> Self {
        PromptState {
            prompt_needed: definition.prompt_needed,
            paginate: definition.paginate,
            total_pages: definition.total_pages,
            show_parameter_ui: definition.show_parameter_ui(),
            allow_auto_submit: definition.allow_auto_submit(),
            parameters_changed,
            auto_submit,
            page: definition.page,
        }
    }

    /// Value of one field as JSON
    pub fn get(&self, field: StateField) -> Value {
        match field {
            StateField::PromptNeeded => Value::from(self.prompt_needed),
            StateField::Paginate => Value::from(self.paginate),
            StateField::TotalPages => Value::from(self.total_pages),
            StateField::ShowParameterUi => Value::from(self.show_parameter_ui),
            StateField::AllowAutoSubmit => Value::from(self.allow_auto_submit),
            StateField::ParametersChanged => Value::from(self.parameters_changed),
            StateField::AutoSubmit => Value::from(self.auto_submit),
            StateField::Page => Value::from(self.page),
        }
    }
}

/// Name of a state field, as reported to state-change callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    PromptNeeded,
    Paginate,
    TotalPages,
    ShowParameterUi,
    AllowAutoSubmit,
    ParametersChanged,
    AutoSubmit,
    Page,
}

impl StateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateField::PromptNeeded => "promptNeeded",
            StateField::Paginate => "paginate",
            StateField::TotalPages => "totalPages",
            StateField::ShowParameterUi => "showParameterUI",
            StateField::AllowAutoSubmit => "allowAutoSubmit",
            StateField::ParametersChanged => "parametersChanged",
            StateField::AutoSubmit => "autoSubmit",
            StateField::Page => "page",
        }
    }

    /// Fields derived from the definition that callers may not set
    pub fn read_only() -> &'static [StateField] {
        &[
            StateField::PromptNeeded,
            StateField::Paginate,
            StateField::TotalPages,
            StateField::ShowParameterUi,
            StateField::AllowAutoSubmit,
        ]
    }

    /// Fields reported when a new definition is installed
    pub fn definition_fields() -> &'static [StateField] {
        &[
            StateField::PromptNeeded,
            StateField::Paginate,
            StateField::TotalPages,
            StateField::ShowParameterUi,
            StateField::AllowAutoSubmit,
            StateField::Page,
        ]
    }
}

/// Rejected `set_state` input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateValidationError {
    #[error("The input parameter 'state' is incorrect. It should be an object.")]
    NotAnObject,

    /// `names` holds the offending keys; the message lists every read-only property.
    #[error("Not possible to change the following read-only properties: {}.", read_only_list())]
    ReadOnlyProperty { names: Vec<String> },

    #[error("Unexpected value '{value}' for '{name}'. Must be boolean type.")]
    IncorrectBooleanType { name: String, value: String },

    #[error("Not possible to set 'autoSubmit'. It's limited by the 'allowAutoSubmit' flag.")]
    AutoSubmitNotAllowed,

    #[error("Unexpected value '{value}' for 'page'. Must be a number type.")]
    IncorrectNumberType { value: String },

    #[error("Not possible to set page '{page}'. The pagination should be activated.")]
    PaginationNotActivated { page: i64 },

    #[error("Not possible to set page '{page}'. The correct value should be between 0 and {last_page}.")]
    IncorrectPageValue { page: i64, last_page: i64 },
}

fn read_only_list() -> String {
    StateField::read_only()
        .iter()
        .map(StateField::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

/// Validated mutable fields of a `set_state` call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatePatch {
    pub parameters_changed: Option<bool>,
    pub auto_submit: Option<bool>,
    pub page: Option<i64>,
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn boolean_field(
    state: &serde_json::Map<String, Value>,
    field: StateField,
) -> Result<Option<bool>, StateValidationError> {
    match state.get(field.as_str()) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(StateValidationError::IncorrectBooleanType {
            name: field.as_str().to_string(),
            value: display(other),
        }),
    }
}

/// Check a partial state against the current definition.
///
/// `null` fields count as absent, except that any read-only key is rejected
/// whatever its value.
pub fn validate_state(state: &Value, definition: &ParameterDefinition) -> Result<StatePatch, StateValidationError> {
    let Value::Object(state) = state else {
        return Err(StateValidationError::NotAnObject);
    };

    let read_only: Vec<String> = StateField::read_only()
        .iter()
        .map(StateField::as_str)
        .filter(|name| state.contains_key(*name))
        .map(str::to_string)
        .collect();
    if !read_only.is_empty() {
        return Err(StateValidationError::ReadOnlyProperty { names: read_only });
    }

    let parameters_changed = boolean_field(state, StateField::ParametersChanged)?;
    let auto_submit = boolean_field(state, StateField::AutoSubmit)?;
    if auto_submit.is_some() && !definition.allow_auto_submit() {
        return Err(StateValidationError::AutoSubmitNotAllowed);
    }

    let page = match state.get(StateField::Page.as_str()) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let number = value
                .as_i64()
                .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .ok_or_else(|| StateValidationError::IncorrectNumberType { value: display(value) })?;
            Some(number)
        }
    };
    if let Some(page) = page {
        if !definition.paginate {
            return Err(StateValidationError::PaginationNotActivated { page });
        }
        if page < 0 || page >= definition.total_pages {
            return Err(StateValidationError::IncorrectPageValue {
                page,
                last_page: definition.total_pages - 1,
            });
        }
    }

    Ok(StatePatch {
        parameters_changed,
        auto_submit,
        page,
    })
}
