//! Parameter Prompt Panel
//!
//! A report server describes the parameters of a report as a
//! [`ParameterDefinition`]. This module renders that definition as a widget
//! tree and keeps the tree in step with every new definition the server
//! returns, without rebuilding widgets that did not change.
//!
//! # Architecture
//!
//! ```text
//! Parameter definition JSON
//!        ↓
//!   PromptPanel ←──── DefinitionSource (async fetch)
//!        ↓
//!   diff(old, new) ── ParameterDiff
//!        ↓
//!   RenderEngine
//!        │
//! ┌──────┴──────┐
//! │             │
//! ParameterStore  WidgetNode tree ←── WidgetFactory
//!                       ↓
//!                  WidgetHost (toolkit)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use prompt_kit::prompting::*;
//!
//! let definition = ParameterDefinition::from_json(json)?;
//! let mut panel = PromptPanel::new(
//!     "promptPanel",
//!     Some(definition),
//!     Box::new(WidgetRegistry::with_standard_catalog()),
//!     Box::new(NoopHost),
//!     Box::new(NoopSource),
//!     PromptPanelConfig::default(),
//! )?;
//! panel.init();
//! println!("{}", panel.widget_tree().map(|t| t.outline()).unwrap_or_default());
//! ```

mod config;
mod definition;
mod differ;
mod engine;
mod error;
mod node;
mod panel;
mod registry;
mod scheduler;
mod source;
mod state;
mod store;
mod ui_state;
mod value;

pub use config::*;
pub use definition::*;
pub use differ::*;
pub use engine::*;
pub use error::*;
pub use node::*;
pub use panel::*;
pub use registry::*;
pub use scheduler::*;
pub use source::*;
pub use state::*;
pub use store::*;
pub use ui_state::*;
pub use value::*;
