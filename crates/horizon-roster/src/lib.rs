//! Horizon Roster - an observable record list kept in sync with editable,
//! recycled list rows.
//!
//! The crate is built from three pieces:
//!
//! - [`model::RecordStore`]: the single source of truth. Every mutation is
//!   compare-and-swap: an edit that leaves a record unchanged notifies no one.
//! - [`view::ItemBinding`]: drives one row's controls. Programmatic writes are
//!   never reported as user edits.
//! - [`view::ViewRecyclingAdapter`]: pools bindings for a virtualized host
//!   widget and turns store notifications into refresh requests.
//!
//! Together these close the edit loop (control, controller, store, adapter,
//! binding, control) without echoes.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_roster::prelude::*;
//!
//! let store = Arc::new(RecordStore::from_records(sample_records()));
//! let controller = Arc::new(RecordListController::new(store.clone()));
//! let adapter = ViewRecyclingAdapter::with_listener(store.clone(), AdapterConfig::default(), controller);
//!
//! let refreshes = Arc::new(parking_lot::Mutex::new(Vec::new()));
//! let sink = refreshes.clone();
//! adapter.refresh_requested().connect(move |r| sink.lock().push(*r));
//!
//! let editor = adapter.begin_edit(1).unwrap();
//! editor.controls().age.set_text("26");
//!
//! assert_eq!(store.get(1).unwrap().age(), 26);
//! assert_eq!(*refreshes.lock(), vec![RefreshRequest::Cell { row: 1 }]);
//! ```

pub use horizon_roster_core::*;

pub mod config;
pub mod error;
pub mod model;
pub mod observe;
pub mod prelude;
pub mod view;

pub use error::{Error, Result};
