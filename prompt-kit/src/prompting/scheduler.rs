//! Cooperative Scheduler
//!
//! Everything runs on the caller's thread. The controller drives the
//! [`EventLoop`] in turns; each turn runs the pending refresh, polls the
//! in-flight definition fetch and fires deferred tasks that are due.
//!
//! Rapid parameter changes coalesce in a single-slot cell where the latest
//! request wins, so a burst of changes within one turn costs one refresh.

use std::task::{Context, Poll};
use std::time::Instant;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;

use super::definition::ParameterDefinition;
use super::node::ScrollOffset;

/// Future resolving to the next definition, or `None` when nothing changed
pub type FetchFuture = LocalBoxFuture<'static, anyhow::Result<Option<ParameterDefinition>>>;

/// A cell holding at most one pending value; scheduling replaces it.
#[derive(Debug, Clone)]
pub struct PendingSlot<T> {
    pending: Option<T>,
}

impl<T> Default for PendingSlot<T> {
    fn default() -> Self {
        PendingSlot { pending: None }
    }
}

impl<T> PendingSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a value, cancelling the pending one.
    ///
    /// Returns the value that was replaced.
    pub fn schedule(&mut self, value: T) -> Option<T> {
        self.pending.replace(value)
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A debounced request to fetch the next definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshRequest {
    /// Resynchronize every widget after the diff is applied
    pub force: bool,
}

/// One-shot work scheduled for later
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeferredTask {
    RestoreScroll(ScrollOffset),
}

/// The single-threaded event loop of a prompt panel.
#[derive(Default)]
pub struct EventLoop {
    refresh: PendingSlot<RefreshRequest>,
    in_flight: Option<FetchFuture>,
    deferred: Vec<(Instant, DeferredTask)>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a refresh for the next turn.
    ///
    /// A forced request stays forced when a later one replaces it.
    /// Returns `true` when a pending request was coalesced.
    pub fn schedule_refresh(&mut self, request: RefreshRequest) -> bool {
        let force = request.force || self.refresh.peek().is_some_and(|previous| previous.force);
        let coalesced = self.refresh.schedule(RefreshRequest { force }).is_some();
        if coalesced {
            ::log::debug!("Coalescing refresh request");
        }
        coalesced
    }

    pub fn take_refresh(&mut self) -> Option<RefreshRequest> {
        self.refresh.take()
    }

    /// Start a fetch; any fetch still in flight is dropped.
    ///
    /// Returns `true` when a fetch was superseded.
    pub fn start_fetch(&mut self, fetch: FetchFuture) -> bool {
        let superseded = self.in_flight.replace(fetch).is_some();
        if superseded {
            ::log::debug!("Superseding in-flight definition fetch");
        }
        superseded
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Poll the in-flight fetch once without blocking
    pub fn poll_fetch(&mut self) -> Option<anyhow::Result<Option<ParameterDefinition>>> {
        let fetch = self.in_flight.as_mut()?;
        let mut cx = Context::from_waker(noop_waker_ref());
        match fetch.poll_unpin(&mut cx) {
            Poll::Ready(result) => {
                self.in_flight = None;
                Some(result)
            }
            Poll::Pending => None,
        }
    }

    /// Run `task` once `at` has passed
    pub fn defer(&mut self, at: Instant, task: DeferredTask) {
        self.deferred.push((at, task));
    }

    /// Remove and return the tasks due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredTask> {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.deferred = pending;
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, task)| task).collect()
    }

    /// Earliest deadline among deferred tasks
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deferred.iter().map(|(at, _)| *at).min()
    }

    /// Nothing is scheduled, fetching or deferred
    pub fn is_idle(&self) -> bool {
        !self.refresh.is_pending() && self.in_flight.is_none() && self.deferred.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use std::time::Duration;

    #[test]
    fn test_pending_slot_latest_wins() {
        let mut slot = PendingSlot::new();
        assert!(slot.schedule(1).is_none());
        assert_eq!(slot.schedule(2), Some(1));
        assert_eq!(slot.schedule(3), Some(2));
        assert_eq!(slot.peek(), Some(&3));
        assert_eq!(slot.take(), Some(3));
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_refresh_keeps_force() {
        let mut event_loop = EventLoop::new();
        assert!(!event_loop.schedule_refresh(RefreshRequest { force: true }));
        assert!(event_loop.schedule_refresh(RefreshRequest { force: false }));
        assert_eq!(event_loop.take_refresh(), Some(RefreshRequest { force: true }));
        assert!(event_loop.take_refresh().is_none());
    }

    #[test]
    fn test_poll_fetch() {
        let mut event_loop = EventLoop::new();
        let (tx, rx) = oneshot::channel::<ParameterDefinition>();
        event_loop.start_fetch(
            async move {
                let defn = rx.await?;
                Ok::<_, anyhow::Error>(Some(defn))
            }
            .boxed_local(),
        );

        assert!(event_loop.poll_fetch().is_none());
        assert!(event_loop.is_fetching());

        tx.send(ParameterDefinition::default()).unwrap();
        let result = event_loop.poll_fetch().unwrap();
        assert!(result.unwrap().is_some());
        assert!(!event_loop.is_fetching());
        assert!(event_loop.is_idle());
    }

    #[test]
    fn test_new_fetch_supersedes_old() {
        let mut event_loop = EventLoop::new();
        assert!(!event_loop.start_fetch(futures::future::pending().boxed_local()));
        assert!(event_loop.start_fetch(futures::future::ready(Ok(None)).boxed_local()));
        assert!(matches!(event_loop.poll_fetch(), Some(Ok(None))));
    }

    #[test]
    fn test_deferred_tasks() {
        let mut event_loop = EventLoop::new();
        let now = Instant::now();
        let first = DeferredTask::RestoreScroll(ScrollOffset { top: 1.0, left: 0.0 });
        let second = DeferredTask::RestoreScroll(ScrollOffset { top: 2.0, left: 0.0 });
        event_loop.defer(now + Duration::from_millis(100), second);
        event_loop.defer(now + Duration::from_millis(50), first);

        assert!(event_loop.take_due(now).is_empty());
        assert_eq!(event_loop.next_deadline(), Some(now + Duration::from_millis(50)));
        assert_eq!(event_loop.take_due(now + Duration::from_millis(200)), vec![first, second]);
        assert!(event_loop.is_idle());
    }
}
