//! Prompt Panel
//!
//! The controller of one parameter prompt. It owns the current definition,
//! feeds definition diffs to the [`RenderEngine`], runs the refresh cycle
//! against a [`DefinitionSource`] and reports lifecycle callbacks to the
//! embedding application.
//!
//! # Refresh cycle
//!
//! ```text
//! control_changed ──→ parameter_changed ──→ schedule refresh (latest wins)
//!                                                  ↓  next turn
//!                                           DefinitionSource::fetch
//!                                                  ↓  resolved
//!                              refresh(defn) ──→ diff ──→ init ──→ update
//! ```

use std::collections::HashMap;
use std::time::Instant;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use super::config::PromptPanelConfig;
use super::definition::{Parameter, ParameterDefinition};
use super::differ::{ParameterDiff, diff};
use super::engine::{EngineEvent, RenderEngine, SubmitOptions, WidgetHost};
use super::error::{PromptError, PromptResult};
use super::node::{ScrollOffset, WidgetNode};
use super::registry::WidgetFactory;
use super::scheduler::{DeferredTask, EventLoop, RefreshRequest};
use super::source::{DefinitionSource, FetchRequest};
use super::state::{PromptState, StateField, validate_state};
use super::value::{NumberParser, PlainNumberParser, is_empty_value, is_number_type};

type Callback = Box<dyn FnMut()>;
type ParameterChangedCallback = Box<dyn FnMut(&str, &Value)>;
type StateChangedCallback = Box<dyn FnMut(StateField, &Value, &Value)>;
type SubmitCallback = Box<dyn FnMut(SubmitOptions)>;
type ErrorCallback = Box<dyn FnMut(&PromptError)>;

/// Callbacks registered by the embedding application
#[derive(Default)]
struct Callbacks {
    parameter_changed: HashMap<String, ParameterChangedCallback>,
    before_render: Option<Callback>,
    after_render: Option<Callback>,
    before_update: Option<Callback>,
    after_update: Option<Callback>,
    state_changed: Option<StateChangedCallback>,
    submit: Option<SubmitCallback>,
    ready: Option<Callback>,
    post_init: Vec<Callback>,
    error: Option<ErrorCallback>,
}

fn fire(callback: &mut Option<Callback>) {
    if let Some(callback) = callback {
        callback();
    }
}

/// A parameter prompt bound to one destination element.
///
/// # Example
///
/// ```rust,ignore
/// let mut panel = PromptPanel::new(
///     "promptPanel",
///     Some(definition),
///     Box::new(WidgetRegistry::with_standard_catalog()),
///     Box::new(NoopHost),
///     Box::new(source),
///     PromptPanelConfig::default(),
/// )?;
///
/// panel.on_submit(|options| println!("submit, init: {}", options.is_init));
/// panel.init();
///
/// // From the widget toolkit:
/// panel.control_changed("region", json!("West"));
///
/// // From the application's main loop:
/// panel.run_until_stalled();
/// ```
pub struct PromptPanel {
    destination_id: String,
    definition: Option<ParameterDefinition>,
    engine: RenderEngine,
    source: Box<dyn DefinitionSource>,
    number_parser: Box<dyn NumberParser>,
    config: PromptPanelConfig,
    event_loop: EventLoop,
    callbacks: Callbacks,

    /// Diff waiting for the next `init`
    pending_diff: Option<ParameterDiff>,

    /// Parameters emptied by the user since the last refresh
    nulled: Vec<String>,

    is_refresh: bool,
    is_force_refresh: bool,

    /// The next refresh was caused by a parameter change
    submit_after_refresh: bool,

    parameters_changed: bool,
}

impl PromptPanel {
    /// Create a panel.
    ///
    /// Fails when `destination_id` is empty.
    pub fn new(
        destination_id: impl Into<String>,
        definition: Option<ParameterDefinition>,
        factory: Box<dyn WidgetFactory>,
        host: Box<dyn WidgetHost>,
        source: Box<dyn DefinitionSource>,
        config: PromptPanelConfig,
    ) -> PromptResult<Self> {
        let destination_id = destination_id.into();
        if destination_id.is_empty() {
            return Err(PromptError::MissingDestination);
        }

        let engine = RenderEngine::new(factory, host).with_restore_list_position(config.restore_list_position);
        let mut panel = PromptPanel {
            destination_id,
            definition: None,
            engine,
            source,
            number_parser: Box::new(PlainNumberParser),
            config,
            event_loop: EventLoop::new(),
            callbacks: Callbacks::default(),
            pending_diff: None,
            nulled: Vec::new(),
            is_refresh: false,
            is_force_refresh: false,
            submit_after_refresh: false,
            parameters_changed: false,
        };
        if let Some(definition) = definition {
            panel.set_param_defn(definition);
        }
        Ok(panel)
    }

    /// Replace the number parser used by [`get_parameter_values`](Self::get_parameter_values)
    pub fn with_number_parser(mut self, parser: Box<dyn NumberParser>) -> Self {
        self.number_parser = parser;
        self
    }

    pub fn destination_id(&self) -> &str {
        &self.destination_id
    }

    pub fn config(&self) -> &PromptPanelConfig {
        &self.config
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    // ========================================================================
    // Definition
    // ========================================================================

    /// The current definition
    pub fn get_param_defn(&self) -> PromptResult<&ParameterDefinition> {
        self.definition.as_ref().ok_or(PromptError::DefinitionNotSet)
    }

    /// Install a definition and report the state fields it changes
    pub fn set_param_defn(&mut self, definition: ParameterDefinition) {
        let previous = self.definition.take().map(|d| self.state_of(&d));

        if self.engine.auto_submit().is_none() {
            self.set_auto_submit(definition.allow_auto_submit());
        }

        let current = self.state_of(&definition);
        self.definition = Some(definition);

        for field in StateField::definition_fields() {
            let old = previous.as_ref().map_or(Value::Null, |s| s.get(*field));
            let new = current.get(*field);
            if old != new {
                self.state_changed(*field, &old, &new);
            }
        }
    }

    pub fn auto_submit(&self) -> bool {
        self.engine.auto_submit().unwrap_or(false)
    }

    pub fn set_auto_submit(&mut self, auto_submit: bool) {
        let previous = self.engine.auto_submit();
        self.engine.set_auto_submit(auto_submit);
        if previous != Some(auto_submit) {
            let old = previous.map_or(Value::Null, Value::Bool);
            self.state_changed(StateField::AutoSubmit, &old, &Value::Bool(auto_submit));
        }
    }

    fn state_of(&self, definition: &ParameterDefinition) -> PromptState {
        PromptState::new(definition, self.parameters_changed, self.auto_submit())
    }

    /// Diff against the current definition, install `definition` and re-run `init`
    pub fn refresh(&mut self, definition: ParameterDefinition) {
        if let Some(current) = &self.definition {
            self.pending_diff = Some(diff(current, &definition, &self.nulled));
        }
        self.is_refresh = true;
        self.set_param_defn(definition);
        self.nulled.clear();
        self.init();
    }

    /// Render the panel, or apply the pending diff on a refresh.
    ///
    /// Without a definition nothing runs, not even the update callbacks.
    pub fn init(&mut self) {
        let Some(definition) = self.definition.take() else {
            ::log::warn!("Prompt panel '{}' initialized without a definition", self.destination_id);
            return;
        };
        fire(&mut self.callbacks.before_update);

        let mut deferred_scroll = None;
        let first_render = !self.is_refresh && definition.show_parameter_ui();
        if first_render {
            fire(&mut self.callbacks.before_render);
            self.engine.create_prompt_panel(&definition);
            fire(&mut self.callbacks.after_render);
        } else if let Some(pending) = self.pending_diff.take() {
            deferred_scroll = self.update(&definition, &pending);
            if self.is_force_refresh {
                deferred_scroll = self.engine.update_prompt_panel(&definition).or(deferred_scroll);
            }
        }

        let auto_submit = self.auto_submit() && !definition.prompt_needed;
        let submit_after_refresh = std::mem::take(&mut self.submit_after_refresh);
        let was_refresh = self.is_refresh;
        self.definition = Some(definition);
        self.pending_diff = None;
        self.is_refresh = false;
        self.is_force_refresh = false;

        if auto_submit && first_render {
            self.engine.submit(SubmitOptions { is_init: true });
        } else if auto_submit && was_refresh && submit_after_refresh {
            self.engine.submit(SubmitOptions { is_init: false });
        }
        self.dispatch_engine_events();

        if let Some(offset) = deferred_scroll {
            self.defer_scroll(offset);
        }

        fire(&mut self.callbacks.after_update);
    }

    /// Apply a diff, wrapped in the render callbacks when it is not empty
    fn update(&mut self, definition: &ParameterDefinition, diff: &ParameterDiff) -> Option<ScrollOffset> {
        if diff.is_empty() {
            return None;
        }
        fire(&mut self.callbacks.before_render);
        let scroll = self.engine.apply_diff(definition, diff, true);
        fire(&mut self.callbacks.after_render);
        scroll
    }

    fn defer_scroll(&mut self, offset: ScrollOffset) {
        let at = Instant::now() + self.config.scroll_restore_delay();
        self.event_loop.defer(at, DeferredTask::RestoreScroll(offset));
    }

    fn dispatch_engine_events(&mut self) {
        for event in self.engine.take_events() {
            match event {
                EngineEvent::Ready => fire(&mut self.callbacks.ready),
                EngineEvent::PostInit => {
                    for callback in &mut self.callbacks.post_init {
                        callback();
                    }
                }
                EngineEvent::Submit(options) => {
                    if let Some(callback) = self.callbacks.submit.as_mut() {
                        callback(options);
                    }
                }
                EngineEvent::ParameterChanged { name, value } => self.parameter_changed(&name, &value),
            }
        }
    }

    // ========================================================================
    // Parameter changes and refresh
    // ========================================================================

    /// A parameter value changed in the UI.
    ///
    /// Runs the callback registered for `name` (or the `""` wildcard), tracks
    /// emptied list parameters and schedules a refresh for the next turn.
    pub fn parameter_changed(&mut self, name: &str, value: &Value) {
        let key = if self.callbacks.parameter_changed.contains_key(name) {
            name
        } else {
            ""
        };
        if let Some(callback) = self.callbacks.parameter_changed.get_mut(key) {
            callback(name, value);
        }

        let is_list = self
            .definition
            .as_ref()
            .and_then(|d| d.get_parameter(name))
            .is_some_and(|p| p.list);
        if is_list && is_empty_value(value) && !self.nulled.iter().any(|n| n == name) {
            self.nulled.push(name.to_string());
        }

        self.event_loop.schedule_refresh(RefreshRequest::default());
        self.submit_after_refresh = true;

        if !self.parameters_changed {
            self.parameters_changed = true;
            self.state_changed(StateField::ParametersChanged, &Value::Bool(false), &Value::Bool(true));
        }
    }

    /// Ask the definition source for the next definition.
    ///
    /// Any fetch still in flight is superseded. The result is picked up on a
    /// later turn.
    pub fn refresh_prompt(&mut self, force: bool) {
        self.is_force_refresh = force;
        let request = FetchRequest {
            parameter_values: self.get_parameter_values(),
            force,
        };
        let fetch = self.source.fetch(request);
        self.event_loop.start_fetch(fetch);
    }

    fn complete_fetch(&mut self, result: anyhow::Result<Option<ParameterDefinition>>) {
        match result {
            Ok(Some(definition)) => self.refresh(definition),
            Ok(None) => {
                self.is_force_refresh = false;
                self.submit_after_refresh = false;
            }
            Err(e) => {
                self.is_force_refresh = false;
                self.submit_after_refresh = false;
                ::log::error!("Failed to refresh prompt '{}': {e:#}", self.destination_id);
                let error = PromptError::Fetch(e);
                if let Some(callback) = self.callbacks.error.as_mut() {
                    callback(&error);
                }
            }
        }
    }

    /// Run turns until nothing is left to do right now
    pub fn run_until_stalled(&mut self) {
        self.advance_to(Instant::now());
    }

    /// Run turns, firing deferred tasks due at `now`
    pub fn advance_to(&mut self, now: Instant) {
        loop {
            let mut progressed = false;

            if let Some(request) = self.event_loop.take_refresh() {
                self.refresh_prompt(request.force);
                progressed = true;
            }

            if let Some(result) = self.event_loop.poll_fetch() {
                self.complete_fetch(result);
                progressed = true;
            }

            for task in self.event_loop.take_due(now) {
                match task {
                    DeferredTask::RestoreScroll(offset) => self.engine.restore_scroll(offset),
                }
                progressed = true;
            }

            if !progressed {
                break;
            }
        }
    }

    /// Nothing is scheduled, fetching or deferred
    pub fn is_idle(&self) -> bool {
        self.event_loop.is_idle()
    }

    /// Earliest deadline of a deferred task
    pub fn next_deadline(&self) -> Option<Instant> {
        self.event_loop.next_deadline()
    }

    pub fn is_fetching(&self) -> bool {
        self.event_loop.is_fetching()
    }

    /// Current values by parameter name, as sent to the server.
    ///
    /// Unset and empty values are skipped, multi-select scalars are wrapped in
    /// arrays and number-typed values are parsed.
    pub fn get_parameter_values(&self) -> IndexMap<String, Value> {
        let mut values = IndexMap::new();
        let Some(definition) = &self.definition else {
            return values;
        };

        for param in definition.parameters() {
            let value = match self.engine.get_parameter_value(&param.name) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) if s.is_empty() => continue,
                Some(value) => value.clone(),
            };
            let value = match value {
                Value::Array(_) => value,
                scalar if param.multi_select => Value::Array(vec![scalar]),
                scalar => scalar,
            };
            values.insert(param.name.clone(), self.parse_numbers(param, value));
        }
        values
    }

    fn parse_numbers(&self, param: &Parameter, value: Value) -> Value {
        if !is_number_type(&param.param_type) {
            return value;
        }
        match value {
            Value::Array(items) => Value::Array(items.into_iter().map(|v| self.parse_numbers(param, v)).collect()),
            Value::String(text) => match self.number_parser.parse(&text, &self.config.locale) {
                Ok(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Value::from(n as i64),
                Ok(n) => Number::from_f64(n).map_or(Value::String(text), Value::Number),
                Err(e) => {
                    ::log::debug!("Keeping raw value for '{}': {e}", param.name);
                    Value::String(text)
                }
            },
            other => other,
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn get_state(&self) -> PromptResult<PromptState> {
        Ok(self.state_of(self.get_param_defn()?))
    }

    /// Apply a partial state after validating it against the definition
    pub fn set_state(&mut self, state: &Value) -> PromptResult<()> {
        let patch = validate_state(state, self.get_param_defn()?)?;

        if let Some(changed) = patch.parameters_changed {
            let previous = self.parameters_changed;
            self.parameters_changed = changed;
            if previous != changed {
                self.state_changed(StateField::ParametersChanged, &Value::Bool(previous), &Value::Bool(changed));
            }
        }

        if let Some(auto_submit) = patch.auto_submit {
            self.set_auto_submit(auto_submit);
        }

        if let Some(page) = patch.page {
            let previous = self.definition.as_mut().map(|d| std::mem::replace(&mut d.page, page));
            if let Some(previous) = previous.filter(|p| *p != page) {
                self.state_changed(StateField::Page, &Value::from(previous), &Value::from(page));
            }
        }

        Ok(())
    }

    fn state_changed(&mut self, field: StateField, old: &Value, new: &Value) {
        if let Some(callback) = self.callbacks.state_changed.as_mut() {
            callback(field, old, new);
        }
    }

    // ========================================================================
    // Callback registration
    // ========================================================================

    /// Register a callback for changes of one parameter; `""` matches any
    /// parameter without its own callback
    pub fn on_parameter_changed(&mut self, name: impl Into<String>, callback: impl FnMut(&str, &Value) + 'static) {
        self.callbacks
            .parameter_changed
            .insert(name.into(), Box::new(callback));
    }

    pub fn on_before_render(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.before_render = Some(Box::new(callback));
    }

    pub fn on_after_render(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.after_render = Some(Box::new(callback));
    }

    pub fn on_before_update(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.before_update = Some(Box::new(callback));
    }

    pub fn on_after_update(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.after_update = Some(Box::new(callback));
    }

    pub fn on_state_changed(&mut self, callback: impl FnMut(StateField, &Value, &Value) + 'static) {
        self.callbacks.state_changed = Some(Box::new(callback));
    }

    pub fn on_submit(&mut self, callback: impl FnMut(SubmitOptions) + 'static) {
        self.callbacks.submit = Some(Box::new(callback));
    }

    pub fn on_ready(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.ready = Some(Box::new(callback));
    }

    /// Add a callback run after the panel is first built
    pub fn on_post_init(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.post_init.push(Box::new(callback));
    }

    /// Register the callback that receives refresh failures
    pub fn on_error(&mut self, callback: impl FnMut(&PromptError) + 'static) {
        self.callbacks.error = Some(Box::new(callback));
    }

    // ========================================================================
    // Engine pass-through
    // ========================================================================

    pub fn get_parameter_value(&self, name: &str) -> Option<&Value> {
        self.engine.get_parameter_value(name)
    }

    pub fn set_parameter_value(&mut self, name: &str, value: Value) {
        self.engine.set_parameter_value(name, value);
    }

    /// Entry point for widgets reporting a new value
    pub fn control_changed(&mut self, name: &str, value: Value) {
        self.engine.control_changed(name, value);
        self.dispatch_engine_events();
    }

    pub fn submit(&mut self, options: SubmitOptions) {
        self.engine.submit(options);
        self.dispatch_engine_events();
    }

    pub fn show_progress_indicator(&mut self) {
        self.engine.set_progress_visible(true);
    }

    pub fn hide_progress_indicator(&mut self) {
        self.engine.set_progress_visible(false);
    }

    pub fn focus_parameter(&mut self, name: &str) {
        self.engine.focus_parameter(name);
    }

    pub fn widget_tree(&self) -> Option<&WidgetNode> {
        self.engine.widget_tree()
    }

    pub fn widget_tree_mut(&mut self) -> Option<&mut WidgetNode> {
        self.engine.widget_tree_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompting::engine::NoopHost;
    use crate::prompting::registry::WidgetRegistry;
    use crate::prompting::source::NoopSource;
    use serde_json::json;

    fn panel(definition: Option<ParameterDefinition>) -> PromptPanel {
        PromptPanel::new(
            "prompt",
            definition,
            Box::new(WidgetRegistry::with_standard_catalog()),
            Box::new(NoopHost),
            Box::new(NoopSource),
            PromptPanelConfig::default(),
        )
        .unwrap()
    }

    fn definition(json: Value) -> ParameterDefinition {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_missing_destination() {
        let result = PromptPanel::new(
            "",
            None,
            Box::new(WidgetRegistry::with_standard_catalog()),
            Box::new(NoopHost),
            Box::new(NoopSource),
            PromptPanelConfig::default(),
        );
        assert!(matches!(result, Err(PromptError::MissingDestination)));
    }

    #[test]
    fn test_definition_not_set() {
        let panel = panel(None);
        assert!(matches!(panel.get_param_defn(), Err(PromptError::DefinitionNotSet)));
        assert!(matches!(panel.get_state(), Err(PromptError::DefinitionNotSet)));
    }

    #[test]
    fn test_init_without_definition_fires_nothing() {
        let mut panel = panel(None);
        let fired = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let before = fired.clone();
        panel.on_before_update(move || before.borrow_mut().push("before_update"));
        let after = fired.clone();
        panel.on_after_update(move || after.borrow_mut().push("after_update"));

        panel.init();

        assert!(fired.borrow().is_empty());
        assert!(panel.widget_tree().is_none());
    }

    #[test]
    fn test_parameters_changed_fires_once_until_reset() {
        let defn = definition(json!({
            "parameterGroups": [{"name": "main", "parameters": [
                {"name": "region", "values": [{"value": "East", "selected": true}]}
            ]}]
        }));
        let mut panel = panel(Some(defn));
        panel.init();

        let events = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = events.clone();
        panel.on_state_changed(move |field, old, new| {
            if field == StateField::ParametersChanged {
                sink.borrow_mut().push((old.clone(), new.clone()));
            }
        });

        panel.control_changed("region", json!("West"));
        panel.control_changed("region", json!("North"));
        assert_eq!(*events.borrow(), vec![(json!(false), json!(true))]);

        panel.set_state(&json!({"parametersChanged": false})).unwrap();
        panel.control_changed("region", json!("South"));
        assert_eq!(
            *events.borrow(),
            vec![
                (json!(false), json!(true)),
                (json!(true), json!(false)),
                (json!(false), json!(true)),
            ]
        );
        assert!(panel.get_state().unwrap().parameters_changed);
    }

    #[test]
    fn test_auto_submit_initialized_from_definition() {
        let panel = panel(Some(definition(json!({"autoSubmitUI": true}))));
        assert!(panel.auto_submit());
        assert!(panel.get_state().unwrap().allow_auto_submit);
    }

    #[test]
    fn test_get_parameter_values() {
        let defn = definition(json!({
            "parameterGroups": [{
                "name": "main",
                "parameters": [
                    {"name": "year", "type": "java.lang.Integer",
                     "values": [{"value": "2024", "selected": true}]},
                    {"name": "rate", "type": "java.lang.Double",
                     "values": [{"value": "1.5", "selected": true}]},
                    {"name": "bad", "type": "java.lang.Double",
                     "values": [{"value": "n/a", "selected": true}]},
                    {"name": "tags", "multiSelect": true,
                     "values": [{"value": "a", "selected": true}]},
                    {"name": "empty"}
                ]
            }]
        }));
        let mut panel = panel(Some(defn));
        panel.init();
        panel.set_parameter_value("tags", json!("a"));

        let values = panel.get_parameter_values();
        assert_eq!(values["year"], json!(2024));
        assert_eq!(values["rate"], json!(1.5));
        assert_eq!(values["bad"], json!("n/a"));
        assert_eq!(values["tags"], json!(["a"]));
        assert!(!values.contains_key("empty"));
    }
}
