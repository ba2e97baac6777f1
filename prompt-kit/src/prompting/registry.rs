//! Widget Registry
//!
//! Maps widget roles to constructor functions. The render engine asks the
//! registry (through [`WidgetFactory`]) for every node it puts in the tree.

use std::collections::HashMap;

use super::definition::{Parameter, ParameterDefinition, ParameterGroup};
use super::node::{ERROR_CLASS, ValueOption, WidgetNode};
use super::store::ParameterAccess;

/// Kind of input control, from the `parameter-render-type` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    DropDown,
    List,
    Radio,
    CheckBox,
    ToggleButton,
    TextBox,
    MultiLine,
    DatePicker,
    Autocomplete,
}

impl ControlKind {
    /// Get the render type name
    pub fn name(&self) -> &'static str {
        match self {
            ControlKind::DropDown => "dropdown",
            ControlKind::List => "list",
            ControlKind::Radio => "radio",
            ControlKind::CheckBox => "checkbox",
            ControlKind::ToggleButton => "togglebutton",
            ControlKind::TextBox => "textbox",
            ControlKind::MultiLine => "multi-line",
            ControlKind::DatePicker => "datepicker",
            ControlKind::Autocomplete => "autocomplete",
        }
    }

    /// Parse from a render type name
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "dropdown" => Some(ControlKind::DropDown),
            "list" => Some(ControlKind::List),
            "radio" => Some(ControlKind::Radio),
            "checkbox" => Some(ControlKind::CheckBox),
            "togglebutton" => Some(ControlKind::ToggleButton),
            "textbox" => Some(ControlKind::TextBox),
            "multi-line" => Some(ControlKind::MultiLine),
            "datepicker" => Some(ControlKind::DatePicker),
            "autocomplete" => Some(ControlKind::Autocomplete),
            _ => None,
        }
    }

    /// Control kind for a parameter; unknown or missing types render as a text box
    pub fn for_parameter(param: &Parameter) -> Self {
        param
            .render_type()
            .and_then(|t| Self::from_str(&t.to_ascii_lowercase()))
            .unwrap_or(ControlKind::TextBox)
    }

    /// Get all control kinds
    pub fn all() -> &'static [ControlKind] {
        &[
            ControlKind::DropDown,
            ControlKind::List,
            ControlKind::Radio,
            ControlKind::CheckBox,
            ControlKind::ToggleButton,
            ControlKind::TextBox,
            ControlKind::MultiLine,
            ControlKind::DatePicker,
            ControlKind::Autocomplete,
        ]
    }
}

/// Role of a node in the prompt tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetRole {
    PromptPanel,
    GroupPanel,
    ParameterPanel,
    Label,
    ErrorLabel,
    Submit,
    SubmitPanel,
    Control(ControlKind),
}

impl WidgetRole {
    /// Get the role name
    pub fn name(&self) -> &'static str {
        match self {
            WidgetRole::PromptPanel => "prompt-panel",
            WidgetRole::GroupPanel => "group-panel",
            WidgetRole::ParameterPanel => "parameter-panel",
            WidgetRole::Label => "label",
            WidgetRole::ErrorLabel => "error-label",
            WidgetRole::Submit => "submit",
            WidgetRole::SubmitPanel => "submit-panel",
            WidgetRole::Control(kind) => kind.name(),
        }
    }
}

/// Everything a constructor may need to build one node.
pub struct BuildOptions<'a> {
    /// Read access to current parameter values
    pub engine: &'a dyn ParameterAccess,

    pub definition: Option<&'a ParameterDefinition>,
    pub param: Option<&'a Parameter>,
    pub group: Option<&'a ParameterGroup>,

    /// Message for error labels
    pub error_message: Option<&'a str>,

    /// Pre-built children for panels
    pub children: Vec<WidgetNode>,

    /// Id of the owning prompt panel
    pub panel_guid: &'a str,

    /// Released controls available for reuse
    pub cache: &'a mut WidgetCache,
}

impl<'a> BuildOptions<'a> {
    pub fn new(engine: &'a dyn ParameterAccess, panel_guid: &'a str, cache: &'a mut WidgetCache) -> Self {
        BuildOptions {
            engine,
            definition: None,
            param: None,
            group: None,
            error_message: None,
            children: Vec::new(),
            panel_guid,
            cache,
        }
    }

    pub fn definition(mut self, definition: &'a ParameterDefinition) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn param(mut self, param: &'a Parameter) -> Self {
        self.param = Some(param);
        self
    }

    pub fn group(mut self, group: &'a ParameterGroup) -> Self {
        self.group = Some(group);
        self
    }

    pub fn error_message(mut self, message: &'a str) -> Self {
        self.error_message = Some(message);
        self
    }

    pub fn children(mut self, children: Vec<WidgetNode>) -> Self {
        self.children = children;
        self
    }
}

/// Builds widget nodes for the render engine.
///
/// Returning `None` means "no widget": the engine skips the node silently.
pub trait WidgetFactory {
    fn build(&self, options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode>;

    /// Value array a control for `param` would carry
    fn values_array(&self, param: &Parameter) -> Vec<ValueOption> {
        value_options(param)
    }
}

/// Constructor function registered for a role
pub type WidgetConstructor = fn(BuildOptions<'_>, WidgetRole) -> Option<WidgetNode>;

/// Cache of released controls keyed by parameter name and role.
///
/// Owned by the render engine; filled when a control whose parameter sets
/// `cacheComponent` is removed from the tree.
#[derive(Debug, Clone, Default)]
pub struct WidgetCache {
    nodes: HashMap<(String, WidgetRole), WidgetNode>,
}

impl WidgetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a released node. Nodes without a parameter are ignored.
    pub fn insert(&mut self, node: WidgetNode) {
        if let Some(param) = node.param.clone() {
            self.nodes.insert((param, node.role), node);
        }
    }

    /// Remove and return the cached node for a parameter and role
    pub fn take(&mut self, param: &str, role: WidgetRole) -> Option<WidgetNode> {
        self.nodes.remove(&(param.to_string(), role))
    }

    pub fn contains(&self, param: &str, role: WidgetRole) -> bool {
        self.nodes.contains_key(&(param.to_string(), role))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

/// Registry of widget constructors.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = WidgetRegistry::with_standard_catalog();
///
/// // Replace the dropdown with a custom constructor
/// registry.register(WidgetRole::Control(ControlKind::DropDown), build_fancy_dropdown);
/// ```
#[derive(Debug, Clone)]
pub struct WidgetRegistry {
    constructors: HashMap<WidgetRole, WidgetConstructor>,
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        WidgetRegistry {
            constructors: HashMap::new(),
        }
    }

    /// Create a registry with the standard constructors for every role
    pub fn with_standard_catalog() -> Self {
        let mut registry = Self::new();

        registry.register(WidgetRole::PromptPanel, build_prompt_panel);
        registry.register(WidgetRole::GroupPanel, build_group_panel);
        registry.register(WidgetRole::ParameterPanel, build_parameter_panel);
        registry.register(WidgetRole::Label, build_label);
        registry.register(WidgetRole::ErrorLabel, build_error_label);
        registry.register(WidgetRole::Submit, build_submit);
        registry.register(WidgetRole::SubmitPanel, build_submit_panel);
        for kind in ControlKind::all() {
            registry.register(WidgetRole::Control(*kind), build_control);
        }

        registry
    }

    /// Register a constructor, replacing any previous one for the role
    pub fn register(&mut self, role: WidgetRole, constructor: WidgetConstructor) {
        self.constructors.insert(role, constructor);
    }

    /// Get the constructor for a role.
    ///
    /// Control roles without their own entry fall back to the text box.
    pub fn get(&self, role: WidgetRole) -> Option<WidgetConstructor> {
        self.constructors.get(&role).copied().or_else(|| match role {
            WidgetRole::Control(_) => self
                .constructors
                .get(&WidgetRole::Control(ControlKind::TextBox))
                .copied(),
            _ => None,
        })
    }

    /// Check if a role has a constructor
    pub fn is_registered(&self, role: WidgetRole) -> bool {
        self.get(role).is_some()
    }
}

impl WidgetFactory for WidgetRegistry {
    fn build(&self, options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
        match self.get(role) {
            Some(constructor) => constructor(options, role),
            None => {
                ::log::warn!("No widget constructor registered for role '{}'", role.name());
                None
            }
        }
    }
}

// ============================================================================
// Standard catalog
// ============================================================================

/// Value array of a control, in definition order
pub fn value_options(param: &Parameter) -> Vec<ValueOption> {
    param
        .values
        .iter()
        .map(|v| ValueOption {
            value: v.value.clone(),
            label: v.display_label().to_string(),
        })
        .collect()
}

fn build_prompt_panel(options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
    Some(
        WidgetNode::new(role, options.panel_guid)
            .with_css_class("prompt-panel")
            .with_children(options.children),
    )
}

fn build_group_panel(options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
    let group = options.group?;
    let mut node = WidgetNode::new(role, &group.name)
        .with_label(group.label.clone().unwrap_or_else(|| group.name.clone()))
        .with_css_class("parameter-wrapper")
        .with_children(options.children);
    if let Some(layout) = options.definition.and_then(|d| d.layout.as_deref()) {
        node.add_css_class(layout);
    }
    Some(node)
}

fn build_parameter_panel(options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
    let param = options.param?;
    let mut node = WidgetNode::new(role, &param.name)
        .with_param(&param.name)
        .with_css_class("parameter")
        .with_children(options.children);
    if options
        .definition
        .is_some_and(|d| !d.errors_for(&param.name).is_empty())
    {
        node.add_css_class(ERROR_CLASS);
    }
    Some(node)
}

fn build_label(options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
    let param = options.param?;
    Some(
        WidgetNode::new(role, format!("{}_param_label", param.name))
            .with_label(param.label())
            .with_css_class("parameter-label"),
    )
}

fn build_error_label(options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
    let param = options.param?;
    let message = options.error_message?;
    Some(
        WidgetNode::new(role, format!("{}_param_error", param.name))
            .with_label(message)
            .with_css_class("error-label"),
    )
}

fn submit_node(panel_guid: &str) -> WidgetNode {
    WidgetNode::new(WidgetRole::Submit, format!("{panel_guid}_submit"))
        .with_label("View Report")
        .with_css_class("submit")
}

fn build_submit(options: BuildOptions<'_>, _role: WidgetRole) -> Option<WidgetNode> {
    Some(submit_node(options.panel_guid))
}

fn build_submit_panel(options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
    Some(
        WidgetNode::new(role, format!("{}_submit_panel", options.panel_guid))
            .with_css_class("submit-panel")
            .with_children(vec![submit_node(options.panel_guid)]),
    )
}

fn build_control(options: BuildOptions<'_>, role: WidgetRole) -> Option<WidgetNode> {
    let param = options.param?;

    if param.is_waiting_for_values() {
        ::log::debug!("Parameter '{}' has no values yet, skipping control", param.name);
        return None;
    }

    let cached = if param.attribute_flag("cacheComponent") {
        options.cache.take(&param.name, role)
    } else {
        None
    };
    let mut node = cached.unwrap_or_else(|| WidgetNode::new(role, &param.name).with_param(&param.name));
    fill_control(&mut node, param);
    Some(node)
}

/// Write a parameter's values and styling into a control, new or cached.
///
/// Only the node id and UI state of a cached control survive.
fn fill_control(node: &mut WidgetNode, param: &Parameter) {
    node.values = value_options(param);
    node.multi_select = param.multi_select;
    node.listeners = vec![param.name.clone()];
    node.css_class = "parameter-control".to_string();
    if param.attribute_flag("addClearIcon") {
        node.add_css_class("clear-icon");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompting::store::ParameterStore;

    #[test]
    fn test_role_names() {
        assert_eq!(WidgetRole::SubmitPanel.name(), "submit-panel");
        assert_eq!(WidgetRole::Control(ControlKind::MultiLine).name(), "multi-line");
        for kind in ControlKind::all() {
            assert_eq!(ControlKind::from_str(kind.name()), Some(*kind));
        }
    }

    #[test]
    fn test_control_kind_fallback() {
        let param = Parameter::new("a").with_attribute("parameter-render-type", "slider");
        assert_eq!(ControlKind::for_parameter(&param), ControlKind::TextBox);

        let param = Parameter::new("a").with_attribute("parameter-render-type", "DropDown");
        assert_eq!(ControlKind::for_parameter(&param), ControlKind::DropDown);
    }

    #[test]
    fn test_standard_catalog() {
        let registry = WidgetRegistry::with_standard_catalog();
        assert!(registry.is_registered(WidgetRole::PromptPanel));
        assert!(registry.is_registered(WidgetRole::Control(ControlKind::DatePicker)));

        let empty = WidgetRegistry::new();
        assert!(!empty.is_registered(WidgetRole::Label));
    }

    #[test]
    fn test_control_roles_fall_back_to_textbox() {
        let mut registry = WidgetRegistry::new();
        registry.register(WidgetRole::Control(ControlKind::TextBox), build_control);

        let store = ParameterStore::new();
        let mut cache = WidgetCache::new();
        let param = Parameter::new("a").with_value("1", "One", true);
        let node = registry
            .build(
                BuildOptions::new(&store, "guid", &mut cache).param(&param),
                WidgetRole::Control(ControlKind::Radio),
            )
            .unwrap();
        assert_eq!(node.role, WidgetRole::Control(ControlKind::Radio));
        assert_eq!(node.values, vec![ValueOption { value: "1".into(), label: "One".into() }]);
    }

    #[test]
    fn test_strict_parameter_without_values_has_no_control() {
        let registry = WidgetRegistry::with_standard_catalog();
        let store = ParameterStore::new();
        let mut cache = WidgetCache::new();
        let mut param = Parameter::new("dep");
        param.strict = true;

        let node = registry.build(
            BuildOptions::new(&store, "guid", &mut cache).param(&param),
            WidgetRole::Control(ControlKind::DropDown),
        );
        assert!(node.is_none());
    }

    #[test]
    fn test_cached_control_is_reused() {
        let registry = WidgetRegistry::with_standard_catalog();
        let store = ParameterStore::new();
        let mut cache = WidgetCache::new();
        let role = WidgetRole::Control(ControlKind::TextBox);
        let param = Parameter::new("a").with_attribute("cacheComponent", "true");

        let first = registry
            .build(BuildOptions::new(&store, "guid", &mut cache).param(&param), role)
            .unwrap();
        let first_id = first.id;
        cache.insert(first);
        assert!(cache.contains("a", role));

        let second = registry
            .build(BuildOptions::new(&store, "guid", &mut cache).param(&param), role)
            .unwrap();
        assert_eq!(second.id, first_id);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cached_control_takes_new_values() {
        let registry = WidgetRegistry::with_standard_catalog();
        let store = ParameterStore::new();
        let mut cache = WidgetCache::new();
        let role = WidgetRole::Control(ControlKind::TextBox);
        let old = Parameter::new("a")
            .with_attribute("cacheComponent", "true")
            .with_attribute("addClearIcon", "true")
            .with_value("East", "East", true);

        let first = registry
            .build(BuildOptions::new(&store, "guid", &mut cache).param(&old), role)
            .unwrap();
        let first_id = first.id;
        cache.insert(first);

        let mut new = Parameter::new("a")
            .with_attribute("cacheComponent", "true")
            .with_value("West", "West", true)
            .with_value("North", "North", false);
        new.multi_select = true;
        let second = registry
            .build(BuildOptions::new(&store, "guid", &mut cache).param(&new), role)
            .unwrap();

        assert_eq!(second.id, first_id);
        assert_eq!(second.values, value_options(&new));
        assert!(second.multi_select);
        assert!(!second.has_css_class("clear-icon"));
        assert_eq!(second.listeners, vec!["a".to_string()]);
    }

    #[test]
    fn test_submit_panel_contains_submit() {
        let registry = WidgetRegistry::with_standard_catalog();
        let store = ParameterStore::new();
        let mut cache = WidgetCache::new();

        let node = registry
            .build(BuildOptions::new(&store, "guid", &mut cache), WidgetRole::SubmitPanel)
            .unwrap();
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].role, WidgetRole::Submit);
    }
}
