//! Common imports for embedding a prompt panel.

pub use crate::prompting::{
    DefinitionSource, FetchRequest, NoopHost, NoopSource, NumberParser, ParameterDefinition, PromptError,
    PromptPanel, PromptPanelConfig, PromptResult, SubmitOptions, WidgetFactory, WidgetHost, WidgetNode,
    WidgetRegistry,
};
