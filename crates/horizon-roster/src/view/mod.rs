//! The view side of the roster: controls, row bindings and the recycling
//! adapter a host list widget talks to.
//!
//! # Core Types
//!
//! - `TextInput` / `CheckInput`: What a field control must offer
//! - `ItemBinding`: Drives one row's controls from one record
//! - `ViewRecyclingAdapter`: Pools bindings and turns store notifications
//!   into host refresh requests
//! - `HostTableModel`: The shape a host widget consumes
//! - `RecordListController`: Routes edits from bindings into the store
//!
//! # Wiring
//!
//! ```
//! use std::sync::Arc;
//! use horizon_roster::config::AdapterConfig;
//! use horizon_roster::model::{sample_records, RecordStore};
//! use horizon_roster::view::{RecordListController, ViewRecyclingAdapter};
//!
//! let store = Arc::new(RecordStore::from_records(sample_records()));
//! let controller = Arc::new(RecordListController::new(store.clone()));
//! let adapter = ViewRecyclingAdapter::with_listener(store.clone(), AdapterConfig::default(), controller);
//!
//! let editor = adapter.begin_edit(0).unwrap();
//! editor.controls().first_name.set_text("Ivana");
//! assert_eq!(store.get(0).unwrap().first_name(), "Ivana");
//! ```

mod adapter;
mod binding;
mod controller;
mod controls;
mod host;

pub use adapter::{BindingFactory, RowSlotState, ViewRecyclingAdapter};
pub use binding::{
    ControlAction, ControlActionListener, ControlEvent, FieldEdit, FieldEditedListener, ItemBinding,
    RowBinding,
};
pub use controller::RecordListController;
pub use controls::{CheckBox, CheckInput, FieldControls, TextField, TextInput};
pub use host::{HostTableModel, RefreshRequest};
