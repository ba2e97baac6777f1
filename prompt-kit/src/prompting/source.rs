//! Definition Source
//!
//! The collaborator that fetches the next parameter definition from the
//! report server. Fetches are plain futures polled by the panel's event loop.

use futures::FutureExt;
use indexmap::IndexMap;
use serde_json::Value;

use super::scheduler::FetchFuture;

/// Request for the next definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchRequest {
    /// Current parameter values by name
    pub parameter_values: IndexMap<String, Value>,

    /// The caller asked for a full widget resynchronization
    pub force: bool,
}

/// Fetches parameter definitions.
///
/// Resolving to `Ok(None)` means the current definition is still valid.
pub trait DefinitionSource {
    fn fetch(&mut self, request: FetchRequest) -> FetchFuture;
}

/// Source that never produces a new definition
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSource;

impl DefinitionSource for NoopSource {
    fn fetch(&mut self, _request: FetchRequest) -> FetchFuture {
        futures::future::ready(Ok(None)).boxed_local()
    }
}

/// Source backed by a closure
pub struct FnSource<F>(pub F);

impl<F> DefinitionSource for FnSource<F>
where
    F: FnMut(FetchRequest) -> FetchFuture,
{
    fn fetch(&mut self, request: FetchRequest) -> FetchFuture {
        (self.0)(request)
    }
}

/// Wrap a closure as a [`DefinitionSource`]
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: FnMut(FetchRequest) -> FetchFuture,
{
    FnSource(f)
}
