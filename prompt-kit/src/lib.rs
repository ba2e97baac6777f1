//! # Description
//!
//! Prompt Kit is a Rust crate for rendering report parameter prompts. It turns
//! the parameter definition sent by a report server into a widget tree and
//! reconciles that tree incrementally as the user changes values and the
//! server answers with new definitions.
//!
//! # Features
//!
//! - Definition differ producing remove, add and change sets.
//! - Pluggable widget factory with a standard control catalog.
//! - Reconciliation that keeps focus, list positions and scroll.
//! - Prompt controller with debounced refresh and validated public state.
//!
//! The crate owns no UI toolkit: widgets are plain nodes, and the embedding
//! toolkit follows along through [`prompting::WidgetHost`].

pub mod prompting;

pub mod prelude;
