//! Prelude module for Horizon Roster.
//!
//! ```
//! use horizon_roster::prelude::*;
//! ```

// ============================================================================
// Signal/Slot and Property System
// ============================================================================

pub use horizon_roster_core::{ConnectionGuard, ConnectionId, Property, Signal, SignalBlocker};

// ============================================================================
// Observability
// ============================================================================

pub use crate::observe::{SyncEvent, SyncObserver};
pub use horizon_roster_core::{NoopObserver, Observer, RecordingObserver, TracingObserver};

// ============================================================================
// Model
// ============================================================================

pub use crate::model::{
    sample_records, ChangeListener, ChangeNotification, FieldId, FieldValue, Record, RecordStore,
};

// ============================================================================
// View
// ============================================================================

pub use crate::view::{
    CheckInput, ControlAction, ControlActionListener, FieldControls, FieldEditedListener,
    HostTableModel, ItemBinding, RecordListController, RefreshRequest, RowBinding, RowSlotState,
    TextInput, ViewRecyclingAdapter,
};

// ============================================================================
// Configuration and Errors
// ============================================================================

pub use crate::config::{AdapterConfig, RosterConfig};
pub use crate::error::Error;
