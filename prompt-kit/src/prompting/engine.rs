//! Panel Render Engine
//!
//! Owns the live widget tree and the parameter store. Builds the full prompt
//! panel from a definition and reconciles it against definition diffs.
//!
//! # Reconciliation
//!
//! ```text
//!  ParameterDiff
//!       ↓
//!  capture_ui_state ── UiStateSnapshot
//!       ↓                     │
//!  remove → add → change      │
//!       ↓                     │
//!  restore_ui_state ←─────────┘
//! ```

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;
use uuid::Uuid;

use super::definition::{Parameter, ParameterDefinition, ParameterGroup};
use super::differ::{GroupAddition, ParameterDiff};
use super::node::{ERROR_CLASS, ScrollOffset, WidgetNode};
use super::registry::{BuildOptions, ControlKind, WidgetCache, WidgetFactory, WidgetRole};
use super::store::{ParameterAccess, ParameterStore};
use super::ui_state::{UiStateSnapshot, apply_scroll, capture_ui_state, restore_ui_state};
use super::value::values_differ;

/// Notifications from the engine to the widget toolkit.
///
/// Every method defaults to a no-op.
pub trait WidgetHost {
    /// A node entered the tree
    fn on_mount(&mut self, _node: &WidgetNode) {}

    /// A node must redraw from its current state
    fn on_update(&mut self, _node: &WidgetNode) {}

    /// A node left the tree
    fn on_release(&mut self, _node: &WidgetNode) {}

    /// The root panel was left without children
    fn on_clear(&mut self, _root: &WidgetNode) {}

    fn focus(&mut self, _node: &WidgetNode) {}

    fn restore_top_index(&mut self, _node: &WidgetNode, _index: usize) {}

    fn scroll_to(&mut self, _node: &WidgetNode, _offset: ScrollOffset) {}

    fn set_progress_visible(&mut self, _visible: bool) {}
}

/// Host that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl WidgetHost for NoopHost {}

/// Options passed along with a submit
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubmitOptions {
    /// The submit was triggered by the first render
    pub is_init: bool,
}

/// Events queued by the engine for the controller
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Ready,
    PostInit,
    Submit(SubmitOptions),
    ParameterChanged { name: String, value: Value },
}

/// Builds nodes through the factory for one definition.
struct Builder<'a> {
    factory: &'a dyn WidgetFactory,
    store: &'a ParameterStore,
    cache: &'a mut WidgetCache,
    guid: &'a str,
    definition: &'a ParameterDefinition,
}

impl Builder<'_> {
    fn build(
        &mut self,
        role: WidgetRole,
        param: Option<&Parameter>,
        group: Option<&ParameterGroup>,
        error_message: Option<&str>,
        children: Vec<WidgetNode>,
    ) -> Option<WidgetNode> {
        let mut options = BuildOptions::new(self.store, self.guid, &mut *self.cache)
            .definition(self.definition)
            .children(children);
        options.param = param;
        options.group = group;
        options.error_message = error_message;
        self.factory.build(options, role)
    }

    /// Label, error labels and control for one parameter.
    ///
    /// `None` when the factory produces no control.
    fn parameter_panel(&mut self, param: &Parameter) -> Option<WidgetNode> {
        let role = WidgetRole::Control(ControlKind::for_parameter(param));
        let Some(control) = self.build(role, Some(param), None, None, Vec::new()) else {
            ::log::debug!("No control for parameter '{}', skipping panel", param.name);
            return None;
        };

        let mut children = Vec::new();
        children.extend(self.build(WidgetRole::Label, Some(param), None, None, Vec::new()));
        let definition = self.definition;
        for message in definition.errors_for(&param.name) {
            children.extend(self.build(
                WidgetRole::ErrorLabel,
                Some(param),
                None,
                Some(message.as_str()),
                Vec::new(),
            ));
        }
        children.push(control);

        self.build(WidgetRole::ParameterPanel, Some(param), None, None, children)
    }

    /// Group panel holding the renderable parameters; `None` when empty
    fn group_panel<'p>(
        &mut self,
        group: &ParameterGroup,
        params: impl IntoIterator<Item = &'p Parameter>,
    ) -> Option<WidgetNode> {
        let panels: Vec<WidgetNode> = params
            .into_iter()
            .filter(|p| p.is_renderable())
            .filter_map(|p| self.parameter_panel(p))
            .collect();
        if panels.is_empty() {
            return None;
        }
        self.build(WidgetRole::GroupPanel, None, Some(group), None, panels)
    }
}

/// Notify the host of a new subtree, parent before children.
fn mount(node: &WidgetNode, host: &mut dyn WidgetHost) {
    host.on_mount(node);
    host.on_update(node);
    for child in &node.children {
        mount(child, host);
    }
}

/// Release a detached subtree, children first.
///
/// Controls go into `cache` when one is given.
fn release(mut node: WidgetNode, host: &mut dyn WidgetHost, mut cache: Option<&mut WidgetCache>) {
    for child in std::mem::take(&mut node.children) {
        release(child, host, cache.as_deref_mut());
    }
    host.on_release(&node);
    if node.is_control() {
        if let Some(cache) = cache {
            cache.insert(node);
        }
    }
}

/// Write a parameter's selection into the store
fn initialize_value(store: &mut ParameterStore, param: &Parameter) -> bool {
    let selected = param.selected_values();
    let value = if param.multi_select {
        Value::Array(selected.into_iter().map(Value::String).collect())
    } else {
        selected
            .into_iter()
            .next()
            .map(Value::String)
            .unwrap_or_else(|| Value::String(String::new()))
    };
    store.set(&param.name, value)
}

/// Position of the group holding a parameter panel, and of the panel in it.
///
/// The named group is searched first, then every group.
fn locate_panel(root: &WidgetNode, group: &str, param: &str) -> Option<(usize, usize)> {
    if let Some(gi) = root.group_index(group) {
        if let Some(pi) = root.children[gi].panel_index(param) {
            return Some((gi, pi));
        }
    }
    root.children.iter().enumerate().find_map(|(gi, g)| {
        if g.is_group_panel() {
            g.panel_index(param).map(|pi| (gi, pi))
        } else {
            None
        }
    })
}

/// Where a new group panel goes among the root's children.
///
/// Groups keep definition order and always precede the submit panel.
fn group_insert_position(root: &WidgetNode, definition: &ParameterDefinition, group: &str) -> usize {
    let order = |name: &str| definition.parameter_groups.iter().position(|g| g.name == name);
    let target = order(group);

    for (i, child) in root.children.iter().enumerate() {
        if child.role == WidgetRole::SubmitPanel {
            return i;
        }
        if child.is_group_panel() {
            if let (Some(target), Some(existing)) = (target, order(&child.name)) {
                if existing > target {
                    return i;
                }
            }
        }
    }
    root.children.len()
}

/// Where a new parameter panel goes inside an existing group panel.
fn panel_insert_position(
    group_node: &WidgetNode,
    definition: &ParameterDefinition,
    group: &str,
    param: &Parameter,
) -> usize {
    if let Some(after) = &param.after {
        if let Some(i) = group_node.panel_index(after) {
            return i + 1;
        }
    }

    let siblings = definition
        .get_group(group)
        .map(|g| g.parameters.as_slice())
        .unwrap_or(&[]);
    let Some(own) = siblings.iter().position(|p| p.name == param.name) else {
        return 0;
    };
    siblings[..own]
        .iter()
        .rev()
        .find_map(|p| group_node.panel_index(&p.name))
        .map_or(0, |i| i + 1)
}

/// The render engine for one prompt panel.
///
/// # Example
///
/// ```rust,ignore
/// let mut engine = RenderEngine::new(
///     Box::new(WidgetRegistry::with_standard_catalog()),
///     Box::new(NoopHost),
/// );
///
/// engine.create_prompt_panel(&first);
/// engine.apply_diff(&second, &diff(&first, &second, &[]), true);
///
/// for event in engine.take_events() {
///     // ...
/// }
/// ```
pub struct RenderEngine {
    guid: String,
    root: Option<WidgetNode>,
    store: ParameterStore,
    factory: Box<dyn WidgetFactory>,
    host: Box<dyn WidgetHost>,
    cache: WidgetCache,
    auto_submit: Option<bool>,
    restore_list_position: bool,
    events: Vec<EngineEvent>,
}

impl RenderEngine {
    pub fn new(factory: Box<dyn WidgetFactory>, host: Box<dyn WidgetHost>) -> Self {
        RenderEngine {
            guid: Uuid::new_v4().to_string(),
            root: None,
            store: ParameterStore::new(),
            factory,
            host,
            cache: WidgetCache::new(),
            auto_submit: None,
            restore_list_position: true,
            events: Vec::new(),
        }
    }

    /// Enable or disable restoring multi-select list positions
    pub fn with_restore_list_position(mut self, enabled: bool) -> Self {
        self.restore_list_position = enabled;
        self
    }

    /// Id of this panel instance
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// The live widget tree, if built
    pub fn widget_tree(&self) -> Option<&WidgetNode> {
        self.root.as_ref()
    }

    /// Mutable tree access for the toolkit to report UI state
    pub fn widget_tree_mut(&mut self) -> Option<&mut WidgetNode> {
        self.root.as_mut()
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn cache(&self) -> &WidgetCache {
        &self.cache
    }

    pub fn auto_submit(&self) -> Option<bool> {
        self.auto_submit
    }

    pub fn set_auto_submit(&mut self, auto_submit: bool) {
        self.auto_submit = Some(auto_submit);
    }

    /// Drain the queued events
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Full panel
    // ========================================================================

    /// Build and mount the whole tree for a definition.
    ///
    /// Any previous tree is released and the widget cache is cleared.
    pub fn create_prompt_panel(&mut self, definition: &ParameterDefinition) {
        if let Some(old) = self.root.take() {
            release(old, &mut *self.host, None);
        }
        self.cache.clear();

        for param in definition.parameters() {
            initialize_value(&mut self.store, param);
        }

        let mut builder = Builder {
            factory: &*self.factory,
            store: &self.store,
            cache: &mut self.cache,
            guid: &self.guid,
            definition,
        };

        let mut children: Vec<WidgetNode> = definition
            .parameter_groups
            .iter()
            .filter_map(|g| builder.group_panel(g, &g.parameters))
            .collect();
        if !children.is_empty() {
            children.extend(builder.build(WidgetRole::SubmitPanel, None, None, None, Vec::new()));
        }

        let Some(root) = builder.build(WidgetRole::PromptPanel, None, None, None, children) else {
            ::log::warn!("Widget factory produced no prompt panel");
            return;
        };
        ::log::debug!("Created prompt panel {} with {} nodes", self.guid, root.count());

        mount(&root, &mut *self.host);
        self.root = Some(root);
        self.events.push(EngineEvent::PostInit);
        self.events.push(EngineEvent::Ready);
    }

    /// Re-synchronize every widget with the definition.
    ///
    /// Store values that no longer match the selection are re-initialized and
    /// every node gets an update pass. Returns the scroll offset to restore
    /// once layout has settled.
    pub fn update_prompt_panel(&mut self, definition: &ParameterDefinition) -> Option<ScrollOffset> {
        for param in definition.parameters() {
            if values_differ(self.store.get(&param.name), &param.selected_values(), &param.param_type) {
                initialize_value(&mut self.store, param);
            }
        }

        let snapshot = self.capture_ui_state();
        let root = self.root.as_mut()?;
        let host = &mut *self.host;
        root.walk(&mut |node| host.on_update(node));
        restore_ui_state(root, &snapshot, host, true)
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Snapshot of focus, list positions and scroll of the current tree
    pub fn capture_ui_state(&self) -> UiStateSnapshot {
        self.root
            .as_ref()
            .map(|root| capture_ui_state(root, self.restore_list_position))
            .unwrap_or_default()
    }

    /// Restore a snapshot; see [`restore_ui_state`]
    pub fn restore_ui_state(&mut self, snapshot: &UiStateSnapshot, is_refresh: bool) -> Option<ScrollOffset> {
        let root = self.root.as_mut()?;
        restore_ui_state(root, snapshot, &mut *self.host, is_refresh)
    }

    /// Scroll the root panel, used for deferred scroll restores
    pub fn restore_scroll(&mut self, offset: ScrollOffset) {
        if let Some(root) = self.root.as_mut() {
            apply_scroll(root, offset, &mut *self.host);
        }
    }

    /// Apply a diff to the live tree: remove, add, then change.
    ///
    /// An empty diff does nothing. Returns the scroll offset still to be
    /// restored on the refresh path.
    pub fn apply_diff(
        &mut self,
        definition: &ParameterDefinition,
        diff: &ParameterDiff,
        is_refresh: bool,
    ) -> Option<ScrollOffset> {
        if diff.is_empty() {
            return None;
        }

        let snapshot = self.capture_ui_state();
        self.remove_components_by_diff(&diff.to_remove);
        self.add_components_by_diff(definition, &diff.to_add);
        self.change_components_by_diff(definition, &diff.to_change_data);
        ::log::debug!(
            "Reconciled panel {}: {} removed, {} added, {} changed",
            self.guid,
            diff.to_remove.values().map(Vec::len).sum::<usize>(),
            diff.to_add.values().map(|a| a.params.len()).sum::<usize>(),
            diff.to_change_data.values().map(Vec::len).sum::<usize>(),
        );

        self.restore_ui_state(&snapshot, is_refresh)
    }

    /// Detach and release the panels of removed parameters.
    pub fn remove_components_by_diff(&mut self, to_remove: &IndexMap<String, Vec<Parameter>>) {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        let host = &mut *self.host;
        let mut removed: Vec<&str> = Vec::new();

        for (group_name, params) in to_remove {
            for param in params {
                let Some((gi, pi)) = locate_panel(root, group_name, &param.name) else {
                    ::log::debug!("No panel for removed parameter '{}'", param.name);
                    continue;
                };

                let panel = root.children[gi].children.remove(pi);
                let group = if root.children[gi].children.is_empty() {
                    Some(root.children.remove(gi))
                } else {
                    None
                };
                let submit = if root.children.len() == 1 && root.submit_panel_index() == Some(0) {
                    Some(root.children.remove(0))
                } else {
                    None
                };

                let cache = if param.attribute_flag("cacheComponent") {
                    Some(&mut self.cache)
                } else {
                    None
                };
                release(panel, host, cache);
                for node in group.into_iter().chain(submit) {
                    release(node, host, None);
                }
                removed.push(&param.name);
            }
        }

        if !removed.is_empty() {
            root.walk_mut(&mut |node| node.listeners.retain(|l| !removed.contains(&l.as_str())));
        }
        if root.children.is_empty() {
            host.on_clear(root);
        }
    }

    /// Build and insert panels for added parameters.
    pub fn add_components_by_diff(
        &mut self,
        definition: &ParameterDefinition,
        to_add: &IndexMap<String, GroupAddition>,
    ) {
        for param in to_add.values().flat_map(|a| a.params.iter()) {
            initialize_value(&mut self.store, param);
        }

        let host = &mut *self.host;
        let mut builder = Builder {
            factory: &*self.factory,
            store: &self.store,
            cache: &mut self.cache,
            guid: &self.guid,
            definition,
        };

        if self.root.is_none() {
            let Some(root) = builder.build(WidgetRole::PromptPanel, None, None, None, Vec::new()) else {
                ::log::warn!("Widget factory produced no prompt panel");
                return;
            };
            mount(&root, host);
            self.root = Some(root);
        }
        let Some(root) = self.root.as_mut() else {
            return;
        };

        for (group_name, addition) in to_add {
            match root.group_index(group_name) {
                None => {
                    let Some(group_node) = builder.group_panel(&addition.group, &addition.params) else {
                        continue;
                    };
                    let position = group_insert_position(root, definition, group_name);
                    mount(&group_node, host);
                    root.children.insert(position, group_node);
                }
                Some(gi) => {
                    for param in &addition.params {
                        let Some(panel) = builder.parameter_panel(param) else {
                            continue;
                        };
                        let group_node = &mut root.children[gi];
                        let position = panel_insert_position(group_node, definition, group_name, param);
                        mount(&panel, host);
                        group_node.children.insert(position, panel);
                    }
                }
            }
        }

        let has_groups = root.children.iter().any(WidgetNode::is_group_panel);
        if has_groups && root.submit_panel_index().is_none() {
            if let Some(submit) = builder.build(WidgetRole::SubmitPanel, None, None, None, Vec::new()) {
                mount(&submit, host);
                root.children.push(submit);
            }
        }
    }

    /// Refresh errors and values of changed parameters.
    ///
    /// Each group with an updated parameter gets one update pass.
    pub fn change_components_by_diff(
        &mut self,
        definition: &ParameterDefinition,
        to_change: &IndexMap<String, Vec<Parameter>>,
    ) {
        let Some(root) = self.root.as_mut() else {
            return;
        };
        let host = &mut *self.host;
        let mut updated_groups = BTreeSet::new();

        for (group_name, params) in to_change {
            for param in params {
                let Some((gi, pi)) = locate_panel(root, group_name, &param.name) else {
                    ::log::warn!("Changed parameter '{}' has no panel", param.name);
                    continue;
                };
                let panel = &mut root.children[gi].children[pi];
                let mut updated = false;

                if param.is_error_changed {
                    let mut builder = Builder {
                        factory: &*self.factory,
                        store: &self.store,
                        cache: &mut self.cache,
                        guid: &self.guid,
                        definition,
                    };
                    updated |= reconcile_error_labels(
                        panel,
                        param,
                        definition.errors_for(&param.name),
                        &mut builder,
                        host,
                    );
                }

                let values = self.factory.values_array(param);
                let Some(control) = panel.control_mut() else {
                    ::log::warn!("Panel for '{}' has no control", param.name);
                    continue;
                };

                if control.values != values || param.force_update {
                    control.values = values;
                    initialize_value(&mut self.store, param);
                    updated = true;
                } else if values_differ(
                    self.store.get(&param.name),
                    &param.selected_values(),
                    &param.param_type,
                ) {
                    initialize_value(&mut self.store, param);
                    updated = true;
                }

                if updated {
                    updated_groups.insert(gi);
                }
            }
        }

        for gi in updated_groups {
            root.children[gi].walk(&mut |node| host.on_update(node));
        }
    }

    // ========================================================================
    // Parameter values
    // ========================================================================

    pub fn get_parameter_value(&self, name: &str) -> Option<&Value> {
        self.store.get(name)
    }

    /// Set a value and update every node listening to the parameter
    pub fn set_parameter_value(&mut self, name: &str, value: Value) {
        if !self.store.set(name, value) {
            return;
        }
        if let Some(root) = self.root.as_ref() {
            let host = &mut *self.host;
            root.walk(&mut |node| {
                if node.listeners.iter().any(|l| l == name) {
                    host.on_update(node);
                }
            });
        }
    }

    /// Write a parameter's current selection into the store
    pub fn initialize_parameter_value(&mut self, param: &Parameter) {
        initialize_value(&mut self.store, param);
    }

    /// A widget changed its value
    pub fn control_changed(&mut self, name: &str, value: Value) {
        self.set_parameter_value(name, value.clone());
        self.events.push(EngineEvent::ParameterChanged {
            name: name.to_string(),
            value,
        });
    }

    pub fn submit(&mut self, options: SubmitOptions) {
        self.events.push(EngineEvent::Submit(options));
    }

    /// Record which parameter's control holds focus
    pub fn focus_parameter(&mut self, name: &str) {
        if let Some(root) = self.root.as_mut() {
            root.walk_mut(&mut |node| {
                if node.is_control() {
                    node.has_focus = node.param.as_deref() == Some(name);
                }
            });
        }
    }

    pub fn set_progress_visible(&mut self, visible: bool) {
        self.host.set_progress_visible(visible);
    }
}

impl ParameterAccess for RenderEngine {
    fn get_parameter_value(&self, name: &str) -> Option<&Value> {
        self.store.get(name)
    }
}

/// Make a panel's error labels match `errors`, in order.
///
/// Labels whose text is still listed are kept, stale ones released and
/// missing ones built. Returns `true` when the panel changed.
fn reconcile_error_labels(
    panel: &mut WidgetNode,
    param: &Parameter,
    errors: &[String],
    builder: &mut Builder<'_>,
    host: &mut dyn WidgetHost,
) -> bool {
    let before: Vec<String> = panel.error_messages().into_iter().map(str::to_string).collect();

    let (mut pool, rest): (Vec<WidgetNode>, Vec<WidgetNode>) = std::mem::take(&mut panel.children)
        .into_iter()
        .partition(|c| c.role == WidgetRole::ErrorLabel);
    panel.children = rest;

    let mut ordered = Vec::with_capacity(errors.len());
    for message in errors {
        if let Some(i) = pool.iter().position(|n| n.label == *message) {
            ordered.push(pool.remove(i));
        } else if let Some(node) =
            builder.build(WidgetRole::ErrorLabel, Some(param), None, Some(message.as_str()), Vec::new())
        {
            mount(&node, host);
            ordered.push(node);
        }
    }
    for stale in pool {
        release(stale, host, None);
    }

    let at = panel
        .children
        .iter()
        .position(|c| c.role == WidgetRole::Label)
        .map_or(0, |i| i + 1);
    panel.children.splice(at..at, ordered);

    let class_changed = if errors.is_empty() {
        panel.remove_css_class(ERROR_CLASS)
    } else {
        panel.add_css_class(ERROR_CLASS)
    };

    class_changed || panel.error_messages() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompting::differ::diff;
    use crate::prompting::registry::WidgetRegistry;
    use serde_json::json;

    fn engine() -> RenderEngine {
        RenderEngine::new(Box::new(WidgetRegistry::with_standard_catalog()), Box::new(NoopHost))
    }

    fn definition(json: serde_json::Value) -> ParameterDefinition {
        serde_json::from_value(json).unwrap()
    }

    fn sample() -> ParameterDefinition {
        definition(json!({
            "parameterGroups": [{
                "name": "main",
                "parameters": [
                    {"name": "region", "values": [{"value": "East", "label": "East", "selected": true}]},
                    {"name": "hidden", "attributes": {"hidden": "true"},
                     "values": [{"value": "x", "selected": true}]},
                    {"name": "city", "strict": true}
                ]
            }]
        }))
    }

    #[test]
    fn test_create_prompt_panel() {
        let mut engine = engine();
        engine.create_prompt_panel(&sample());

        let root = engine.widget_tree().unwrap();
        assert_eq!(root.role, WidgetRole::PromptPanel);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[1].role, WidgetRole::SubmitPanel);

        let group = &root.children[0];
        assert_eq!(group.children.len(), 1);
        assert_eq!(group.children[0].param.as_deref(), Some("region"));

        assert_eq!(engine.get_parameter_value("region"), Some(&json!("East")));
        assert_eq!(engine.get_parameter_value("hidden"), Some(&json!("x")));
        assert_eq!(engine.take_events(), vec![EngineEvent::PostInit, EngineEvent::Ready]);
    }

    #[test]
    fn test_empty_diff_is_noop() {
        let mut engine = engine();
        let defn = sample();
        engine.create_prompt_panel(&defn);
        engine.take_events();
        let before = engine.widget_tree().unwrap().clone();

        let scroll = engine.apply_diff(&defn, &diff(&defn, &defn, &[]), true);
        assert!(scroll.is_none());
        assert_eq!(engine.widget_tree(), Some(&before));
        assert!(engine.take_events().is_empty());
    }

    #[test]
    fn test_removing_last_parameter_drops_group_and_submit() {
        let mut engine = engine();
        let old = sample();
        engine.create_prompt_panel(&old);

        let new = definition(json!({"parameterGroups": [{"name": "main", "parameters": []}]}));
        engine.apply_diff(&new, &diff(&old, &new, &[]), false);

        assert!(engine.widget_tree().unwrap().children.is_empty());
    }

    #[test]
    fn test_control_changed_queues_event() {
        let mut engine = engine();
        engine.create_prompt_panel(&sample());
        engine.take_events();

        engine.control_changed("region", json!("West"));
        assert_eq!(engine.get_parameter_value("region"), Some(&json!("West")));
        assert_eq!(
            engine.take_events(),
            vec![EngineEvent::ParameterChanged {
                name: "region".to_string(),
                value: json!("West"),
            }]
        );
    }

    #[test]
    fn test_multi_select_initializes_array() {
        let mut engine = engine();
        let mut param = Parameter::new("products")
            .with_value("A", "A", true)
            .with_value("B", "B", false)
            .with_value("C", "C", true);
        param.multi_select = true;

        engine.initialize_parameter_value(&param);
        assert_eq!(engine.get_parameter_value("products"), Some(&json!(["A", "C"])));
    }
}
