//! Core systems for Horizon Roster.
//!
//! This crate provides the foundational pieces the roster's model/view layer
//! is built from:
//!
//! - **Signal/Slot System**: Synchronous, ordered, reentrancy-safe notification
//! - **Property System**: Values with compare-and-set change detection
//! - **Logging**: `tracing` targets, performance spans and an injected
//!   observer hook
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_roster_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Suppressing Programmatic Writes
//!
//! ```
//! use horizon_roster_core::{Property, Signal};
//!
//! let text = Property::new(String::new());
//! let text_changed = Signal::<String>::new();
//! text_changed.connect(|t| panic!("programmatic write echoed: {t}"));
//!
//! {
//!     let _block = text_changed.block_scoped();
//!     if text.set("Ivy".to_string()) {
//!         text_changed.emit(text.get());
//!     }
//! }
//! assert_eq!(text.get(), "Ivy");
//! ```

pub mod logging;
pub mod property;
pub mod signal;

pub use logging::{NoopObserver, Observer, PerfSpan, RecordingObserver, TracingObserver};
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal, SignalBlocker};
