//! Structured events reported through the injected observer hook.
//!
//! Install an observer with [`RecordStore::set_observer`] or
//! [`ViewRecyclingAdapter::set_observer`]. The default observer does
//! nothing, so the library has no output side effects of its own.
//!
//! [`RecordStore::set_observer`]: crate::model::RecordStore::set_observer
//! [`ViewRecyclingAdapter::set_observer`]: crate::view::ViewRecyclingAdapter::set_observer

use std::sync::Arc;

use horizon_roster_core::{NoopObserver, Observer};

use crate::model::{ChangeNotification, FieldId};

/// Something noteworthy that happened while keeping views in sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The store emitted a notification.
    Notified(ChangeNotification),
    /// A store edit matched the current value and was dropped without notifying.
    EditSuppressed { index: usize },
    /// A binding rejected unparsable input and reverted its control.
    EditRejected { index: usize, field: FieldId },
    /// The adapter created a new binding for `row`.
    BindingCreated { row: usize },
    /// The adapter moved a binding from one row to another. `from` is `None`
    /// when the binding came from the spare list.
    BindingRecycled { from: Option<usize>, to: usize },
    /// The adapter dropped the binding for `row` from its pool.
    BindingEvicted { row: usize },
    /// Editing of `row` was cancelled because the row went away.
    EditingCancelled { row: usize },
    /// A stale row index was absorbed instead of surfacing to the host.
    RaceAbsorbed { row: usize },
}

/// Shared handle type for the observer hook.
pub type SyncObserver = Arc<dyn Observer<SyncEvent>>;

/// The default, silent observer.
pub fn noop_observer() -> SyncObserver {
    Arc::new(NoopObserver)
}
