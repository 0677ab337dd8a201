//! Signal/slot system for Horizon Roster.
//!
//! This module provides a type-safe signal/slot mechanism for communication
//! between the record store, row bindings and the list adapter. Signals are
//! emitted when state changes, and connected slots (callbacks) are invoked
//! synchronously on the emitting thread.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The main signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//! - [`SignalBlocker`] - RAII guard that suppresses emission while alive
//!
//! # Ordering and Reentrancy
//!
//! Slots run in the order they were connected. The connection list is
//! snapshotted before any slot runs and no lock is held while a slot
//! executes, so a slot may connect, disconnect or emit again (even on the
//! signal that is currently emitting). A nested emission is delivered to
//! every slot before the outer emission moves on to its next slot, which
//! gives a strict pre-order traversal of the connection list.
//!
//! A slot that is disconnected while an emission is in flight is not invoked
//! for the remainder of that emission.
//!
//! # Example
//!
//! ```
//! use horizon_roster_core::Signal;
//!
//! // Create a signal that passes a string argument
//! let text_changed = Signal::<String>::new();
//!
//! // Connect a slot (closure)
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! // Emit the signal
//! text_changed.emit("Hello, World!".to_string());
//!
//! // Disconnect when done
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Connection storage. `order` keeps registration order because slotmap
/// iteration follows slot position, which is reused after removals.
struct Connections<Args> {
    slots: SlotMap<ConnectionId, Slot<Args>>,
    order: Vec<ConnectionId>,
}

impl<Args> Connections<Args> {
    fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    fn remove(&mut self, id: ConnectionId) -> bool {
        if self.slots.remove(id).is_some() {
            self.order.retain(|existing| *existing != id);
            true
        } else {
            false
        }
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// When a signal is emitted, all connected slots are invoked with a reference
/// to the provided arguments, in connection order.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Related Types
///
/// - [`ConnectionId`] - Returned by [`connect`](Self::connect), used to disconnect
/// - [`ConnectionGuard`] - RAII-style connection that auto-disconnects on drop
/// - [`SignalBlocker`] - Temporarily suppresses emission
/// - [`crate::Property`] - Often paired with signals for change notification
pub struct Signal<Args> {
    connections: Arc<Mutex<Connections<Args>>>,
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(Connections::new())),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_roster_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        let id = connections.slots.insert(Arc::new(slot));
        connections.order.push(id);
        id
    }

    /// Connect a slot with automatic disconnection when the guard is dropped.
    ///
    /// The guard only holds a weak reference to the signal's connection
    /// list, so dropping it after the signal is gone is harmless.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            connections: Arc::downgrade(&self.connections),
            id,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id)
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let mut connections = self.connections.lock();
        connections.slots.clear();
        connections.order.clear();
    }

    /// Returns `true` if the given connection is still attached.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.lock().slots.contains_key(id)
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` will do nothing. Prefer
    /// [`SignalBlocker`] when the block should be scoped.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Block this signal until the returned guard is dropped.
    pub fn block_scoped(&self) -> SignalBlocker<'_, Args> {
        SignalBlocker::new(self)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// If the signal is blocked, this does nothing.
    #[tracing::instrument(skip_all, target = "horizon_roster_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let snapshot: Vec<(ConnectionId, Slot<Args>)> = {
            let connections = self.connections.lock();
            connections
                .order
                .iter()
                .filter_map(|id| connections.slots.get(*id).map(|slot| (*id, slot.clone())))
                .collect()
        };
        tracing::trace!(
            target: targets::SIGNAL,
            connection_count = snapshot.len(),
            "emitting signal"
        );

        for (id, slot) in snapshot {
            // An earlier slot may have disconnected this one.
            if !self.is_connected(id) {
                continue;
            }
            slot(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_scoped`]. Useful for tying a connection's
/// lifetime to the object that owns the slot's captured state.
///
/// # Example
///
/// ```
/// use horizon_roster_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);  // counter = 42
/// }
/// signal.emit(43);  // Nothing happens - connection was dropped
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<Args> {
    connections: Weak<Mutex<Connections<Args>>>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    /// The ID of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns `true` while both the signal and the connection are alive.
    pub fn is_connected(&self) -> bool {
        self.connections
            .upgrade()
            .is_some_and(|connections| connections.lock().slots.contains_key(self.id))
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(connections) = self.connections.upgrade() {
            connections.lock().remove(self.id);
        }
    }
}

impl<Args> std::fmt::Debug for ConnectionGuard<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Suppresses emission of a signal for as long as it is alive.
///
/// The previous blocked state is restored on drop, so blockers nest.
///
/// ```
/// use horizon_roster_core::Signal;
///
/// let signal = Signal::<i32>::new();
/// {
///     let _outer = signal.block_scoped();
///     {
///         let _inner = signal.block_scoped();
///     }
///     assert!(signal.is_blocked());
/// }
/// assert!(!signal.is_blocked());
/// ```
pub struct SignalBlocker<'a, Args: 'static> {
    signal: &'a Signal<Args>,
    previous: bool,
}

impl<'a, Args: 'static> SignalBlocker<'a, Args> {
    /// Block `signal` until this guard is dropped.
    pub fn new(signal: &'a Signal<Args>) -> Self {
        let previous = signal.is_blocked();
        signal.set_blocked(true);
        Self { signal, previous }
    }
}

impl<Args: 'static> Drop for SignalBlocker<'_, Args> {
    fn drop(&mut self) {
        self.signal.set_blocked(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_edits_reach_every_subscriber() {
        let edited = Signal::<(usize, String)>::new();
        let store_log = Arc::new(Mutex::new(Vec::new()));
        let view_rows = Arc::new(Mutex::new(Vec::new()));

        let log = store_log.clone();
        edited.connect(move |(row, text)| log.lock().push(format!("{row}:{text}")));
        let rows = view_rows.clone();
        edited.connect(move |(row, _)| rows.lock().push(*row));

        edited.emit((0, "Ivana".to_string()));
        edited.emit((3, "Hopper".to_string()));

        assert_eq!(*store_log.lock(), vec!["0:Ivana", "3:Hopper"]);
        assert_eq!(*view_rows.lock(), vec![0, 3]);
    }

    #[test]
    fn test_unsubscribed_view_stops_refreshing() {
        let changed = Signal::<usize>::new();
        let refreshed = Arc::new(AtomicUsize::new(0));
        let audited = Arc::new(AtomicUsize::new(0));

        let count = refreshed.clone();
        let view = changed.connect(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });
        let count = audited.clone();
        changed.connect(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        changed.emit(2);
        assert!(changed.disconnect(view));
        assert!(!changed.disconnect(view));
        changed.emit(4);

        assert_eq!(refreshed.load(Ordering::SeqCst), 1);
        assert_eq!(audited.load(Ordering::SeqCst), 2);
        assert_eq!(changed.connection_count(), 1);
    }

    #[test]
    fn test_programmatic_write_is_not_echoed() {
        let text_changed = Signal::<String>::new();
        let echoed = Arc::new(Mutex::new(Vec::new()));

        let sink = echoed.clone();
        text_changed.connect(move |text| sink.lock().push(text.clone()));

        text_changed.set_blocked(true);
        text_changed.emit("Brown".to_string());
        text_changed.set_blocked(false);
        text_changed.emit("Browning".to_string());

        assert_eq!(*echoed.lock(), vec!["Browning"]);
    }

    #[test]
    fn test_reset_detaches_every_subscriber() {
        let changed = Signal::<usize>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            changed.connect(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        changed.emit(0);
        changed.disconnect_all();
        changed.emit(1);

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(changed.connection_count(), 0);
    }

    #[test]
    fn test_blocker_nests_and_restores() {
        let signal = Signal::<i32>::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = count.clone();
        signal.connect(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        {
            let _outer = signal.block_scoped();
            {
                let _inner = SignalBlocker::new(&signal);
                signal.emit(1);
            }
            assert!(signal.is_blocked());
            signal.emit(2);
        }

        assert!(!signal.is_blocked());
        signal.emit(3);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slots_run_in_connection_order() {
        let signal = Signal::<()>::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut ids = Vec::new();
        for n in 0..4 {
            let order_clone = order.clone();
            ids.push(signal.connect(move |_| order_clone.lock().push(n)));
        }

        // Freeing a slot must not let the next connection jump the queue.
        signal.disconnect(ids[1]);
        let order_clone = order.clone();
        signal.connect(move |_| order_clone.lock().push(4));

        signal.emit(());
        assert_eq!(*order.lock(), vec![0, 2, 3, 4]);
    }

    #[test]
    fn test_reentrant_emit_is_preorder() {
        let signal = Arc::new(Signal::<u32>::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let log_a = log.clone();
        let weak = Arc::downgrade(&signal);
        signal.connect(move |&depth| {
            log_a.lock().push(("a", depth));
            if depth == 0 {
                if let Some(signal) = weak.upgrade() {
                    signal.emit(1);
                }
            }
        });

        let log_b = log.clone();
        signal.connect(move |&depth| {
            log_b.lock().push(("b", depth));
        });

        signal.emit(0);
        assert_eq!(*log.lock(), vec![("a", 0), ("a", 1), ("b", 1), ("b", 0)]);
    }

    #[test]
    fn test_disconnect_during_emit_skips_slot() {
        let signal = Arc::new(Signal::<()>::new());
        let called = Arc::new(AtomicBool::new(false));
        let victim = Arc::new(Mutex::new(None));

        let weak = Arc::downgrade(&signal);
        let victim_clone = victim.clone();
        signal.connect(move |_| {
            if let (Some(signal), Some(id)) = (weak.upgrade(), *victim_clone.lock()) {
                signal.disconnect(id);
            }
        });

        let called_clone = called.clone();
        let id = signal.connect(move |_| called_clone.store(true, Ordering::SeqCst));
        *victim.lock() = Some(id);

        signal.emit(());
        assert!(!called.load(Ordering::SeqCst));
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn test_connect_during_emit_waits_for_next_emit() {
        let signal = Arc::new(Signal::<()>::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&signal);
        let late = late_calls.clone();
        let connected = Arc::new(AtomicBool::new(false));
        signal.connect(move |_| {
            if connected.swap(true, Ordering::SeqCst) {
                return;
            }
            if let Some(signal) = weak.upgrade() {
                let late = late.clone();
                signal.connect(move |_| {
                    late.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        signal.emit(());
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        signal.emit(());
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_connection_guard() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        {
            let received_clone = received.clone();
            let guard = signal.connect_scoped(move |&value| {
                received_clone.lock().push(value);
            });
            assert!(guard.is_connected());
            signal.emit(1);
        }

        signal.emit(2);
        assert_eq!(*received.lock(), vec![1]);
    }

    #[test]
    fn test_guard_outliving_signal() {
        let signal = Signal::<i32>::new();
        let guard = signal.connect_scoped(|_| {});
        drop(signal);
        assert!(!guard.is_connected());
        drop(guard);
    }
}
