//! Logging and observability facilities for Horizon Roster.
//!
//! This module provides:
//! - Target names for the `tracing` integration
//! - An injected [`Observer`] hook, a no-op unless the application installs one
//! - Performance tracing spans for profiling
//!
//! # Tracing Integration
//!
//! Horizon Roster uses the `tracing` crate for instrumentation and never
//! prints on its own. To see logs, install a subscriber in the application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_roster=debug")
//!     .init();
//! ```
//!
//! # Observer Hook
//!
//! Components that want structured events delivered somewhere other than a
//! log take an `Arc<dyn Observer<E>>`. The default is [`NoopObserver`].
//!
//! ```
//! use std::sync::Arc;
//! use horizon_roster_core::logging::{Observer, RecordingObserver};
//!
//! let recorder = Arc::new(RecordingObserver::<u32>::new());
//! let hook: Arc<dyn Observer<u32>> = recorder.clone();
//! hook.observe(&7);
//! assert_eq!(recorder.events(), vec![7]);
//! ```

use std::fmt;
use std::marker::PhantomData;

use parking_lot::Mutex;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_roster_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_roster_core::signal";
    /// Record store target.
    pub const STORE: &str = "horizon_roster::store";
    /// Row binding target.
    pub const BINDING: &str = "horizon_roster::binding";
    /// Recycling adapter target.
    pub const ADAPTER: &str = "horizon_roster::adapter";
    /// Application controller target.
    pub const CONTROLLER: &str = "horizon_roster::controller";
    /// Configuration loading target.
    pub const CONFIG: &str = "horizon_roster::config";
    /// Performance span target.
    pub const PERF: &str = "horizon_roster::perf";
}

/// Receives structured events from an instrumented component.
pub trait Observer<E>: Send + Sync {
    /// Called synchronously at the point the event happens.
    fn observe(&self, event: &E);
}

/// The default observer. Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<E> Observer<E> for NoopObserver {
    fn observe(&self, _event: &E) {}
}

/// Forwards every event to `tracing` at debug level under a fixed target.
pub struct TracingObserver<E> {
    target: &'static str,
    _marker: PhantomData<fn(&E)>,
}

impl<E> TracingObserver<E> {
    /// Create an observer logging under the crate's core target.
    pub fn new() -> Self {
        Self::with_target(targets::CORE)
    }

    /// Create an observer with a descriptive target label.
    pub fn with_target(target: &'static str) -> Self {
        Self {
            target,
            _marker: PhantomData,
        }
    }
}

impl<E> Default for TracingObserver<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> Observer<E> for TracingObserver<E> {
    fn observe(&self, event: &E) {
        // tracing targets must be static at the callsite, so the label rides as a field.
        tracing::debug!(target: targets::CORE, source = self.target, ?event, "observed");
    }
}

/// Collects every observed event. Intended for tests and diagnostics.
pub struct RecordingObserver<E> {
    events: Mutex<Vec<E>>,
}

impl<E: Clone> RecordingObserver<E> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// A copy of all events observed so far.
    pub fn events(&self) -> Vec<E> {
        self.events.lock().clone()
    }

    /// Number of events observed so far.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain and return the observed events.
    pub fn take(&self) -> Vec<E> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl<E: Clone> Default for RecordingObserver<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send> Observer<E> for RecordingObserver<E> {
    fn observe(&self, event: &E) {
        self.events.lock().push(event.clone());
    }
}

/// A performance measurement span.
///
/// Creates a tracing span that measures the duration of an operation.
/// The span is automatically closed when this struct is dropped.
///
/// ```ignore
/// use horizon_roster_core::logging::PerfSpan;
///
/// fn reconcile() {
///     let _span = PerfSpan::new("reconcile");
///     // ... work ...
/// } // Span closes here
/// ```
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
