//! Widget Tree
//!
//! The live tree of widget nodes owned by the render engine. Nodes are created
//! by a [`WidgetFactory`](super::registry::WidgetFactory) and handed to the
//! toolkit through the [`WidgetHost`](super::engine::WidgetHost) callbacks.

use uuid::Uuid;

use super::registry::WidgetRole;

/// Css class carried by parameter panels with validation errors.
pub const ERROR_CLASS: &str = "error";

/// One entry of a control's value array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueOption {
    pub value: String,
    pub label: String,
}

/// Scroll position of a scrollable node
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

/// A node of the rendered prompt tree.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetNode {
    /// Unique instance id, fresh for every built node
    pub id: Uuid,

    /// Node name: the group name for group panels, the parameter name for
    /// parameter panels and controls
    pub name: String,

    pub role: WidgetRole,

    /// Name of the parameter this node represents
    pub param: Option<String>,

    /// Display text (label, error message, group caption)
    pub label: String,

    /// Value array of a control
    pub values: Vec<ValueOption>,

    pub multi_select: bool,

    pub children: Vec<WidgetNode>,

    /// Space separated css classes
    pub css_class: String,

    /// Parameters whose value changes should update this node
    pub listeners: Vec<String>,

    // UI state reported by the toolkit
    pub has_focus: bool,
    pub top_visible_index: Option<usize>,
    pub scroll: Option<ScrollOffset>,

    // Restore hints written by the engine
    pub auto_focus: bool,
    pub auto_top_value: Option<usize>,
}

impl WidgetNode {
    /// Create a bare node with a fresh id
    pub fn new(role: WidgetRole, name: impl Into<String>) -> Self {
        WidgetNode {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            param: None,
            label: String::new(),
            values: Vec::new(),
            multi_select: false,
            children: Vec::new(),
            css_class: String::new(),
            listeners: Vec::new(),
            has_focus: false,
            top_visible_index: None,
            scroll: None,
            auto_focus: false,
            auto_top_value: None,
        }
    }

    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_children(mut self, children: Vec<WidgetNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_css_class(mut self, class: &str) -> Self {
        self.add_css_class(class);
        self
    }

    pub fn is_parameter_panel(&self) -> bool {
        self.role == WidgetRole::ParameterPanel
    }

    pub fn is_group_panel(&self) -> bool {
        self.role == WidgetRole::GroupPanel
    }

    pub fn is_control(&self) -> bool {
        matches!(self.role, WidgetRole::Control(_))
    }

    pub fn has_css_class(&self, class: &str) -> bool {
        self.css_class.split_whitespace().any(|c| c == class)
    }

    /// Add a css class if not already present. Returns `true` when added.
    pub fn add_css_class(&mut self, class: &str) -> bool {
        if self.has_css_class(class) {
            return false;
        }
        if !self.css_class.is_empty() {
            self.css_class.push(' ');
        }
        self.css_class.push_str(class);
        true
    }

    /// Remove a css class. Returns `true` when removed.
    pub fn remove_css_class(&mut self, class: &str) -> bool {
        if !self.has_css_class(class) {
            return false;
        }
        self.css_class = self
            .css_class
            .split_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        true
    }

    pub fn has_error_style(&self) -> bool {
        self.has_css_class(ERROR_CLASS)
    }

    /// Visit this node and all descendants in pre-order
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a WidgetNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Mutable pre-order visit
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut WidgetNode)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    /// Find the node representing a parameter.
    ///
    /// With `panel` set, returns the parameter panel; otherwise the first
    /// node referencing the parameter that is not a panel (normally the
    /// control).
    pub fn find_param(&self, name: &str, panel: bool) -> Option<&WidgetNode> {
        if self.param.as_deref() == Some(name) && self.is_parameter_panel() == panel {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_param(name, panel))
    }

    pub fn find_param_mut(&mut self, name: &str, panel: bool) -> Option<&mut WidgetNode> {
        if self.param.as_deref() == Some(name) && self.is_parameter_panel() == panel {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|c| c.find_param_mut(name, panel))
    }

    /// Index of the direct child group panel with the given name
    pub fn group_index(&self, group: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| c.is_group_panel() && c.name == group)
    }

    /// Index of the direct child parameter panel for a parameter
    pub fn panel_index(&self, param: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|c| c.is_parameter_panel() && c.param.as_deref() == Some(param))
    }

    /// Index of the submit panel among the direct children
    pub fn submit_panel_index(&self) -> Option<usize> {
        self.children
            .iter()
            .position(|c| c.role == WidgetRole::SubmitPanel)
    }

    /// The control child of a parameter panel
    pub fn control(&self) -> Option<&WidgetNode> {
        self.children.iter().find(|c| c.is_control())
    }

    pub fn control_mut(&mut self) -> Option<&mut WidgetNode> {
        self.children.iter_mut().find(|c| c.is_control())
    }

    /// Error message texts shown by a parameter panel, in order
    pub fn error_messages(&self) -> Vec<&str> {
        self.children
            .iter()
            .filter(|c| c.role == WidgetRole::ErrorLabel)
            .map(|c| c.label.as_str())
            .collect()
    }

    /// Number of nodes in this subtree, including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(WidgetNode::count).sum::<usize>()
    }

    /// Shape of the subtree, ignoring instance ids and UI state
    pub fn structure(&self) -> NodeShape {
        NodeShape {
            role: self.role,
            name: self.name.clone(),
            param: self.param.clone(),
            label: self.label.clone(),
            values: self.values.clone(),
            multi_select: self.multi_select,
            css_class: self.css_class.clone(),
            children: self.children.iter().map(WidgetNode::structure).collect(),
        }
    }

    /// Indented one-line-per-node outline, for logs
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(0, &mut out);
        out
    }

    fn write_outline(&self, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.role.name());
        if !self.name.is_empty() {
            out.push_str(&format!(" '{}'", self.name));
        }
        if !self.label.is_empty() && self.label != self.name {
            out.push_str(&format!(" \"{}\"", self.label));
        }
        if !self.values.is_empty() {
            let values: Vec<&str> = self.values.iter().map(|v| v.label.as_str()).collect();
            out.push_str(&format!(" [{}]", values.join(", ")));
        }
        if !self.css_class.is_empty() {
            out.push_str(&format!(" .{}", self.css_class));
        }
        out.push('\n');
        for child in &self.children {
            child.write_outline(depth + 1, out);
        }
    }
}

/// Structural view of a widget subtree, used to compare trees.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeShape {
    pub role: WidgetRole,
    pub name: String,
    pub param: Option<String>,
    pub label: String,
    pub values: Vec<ValueOption>,
    pub multi_select: bool,
    pub css_class: String,
    pub children: Vec<NodeShape>,
}
