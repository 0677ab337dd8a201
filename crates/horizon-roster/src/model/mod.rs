//! The data side of the roster.
//!
//! This module holds the authoritative record list and the protocol it uses
//! to tell views what changed.
//!
//! # Core Types
//!
//! - `Record`: One immutable person entry with structural equality
//! - `FieldId` / `FieldValue`: The closed set of editable fields
//! - `RecordStore`: The observable, ordered collection of records
//! - `ChangeNotification`: What part of the store changed
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────┐  ChangeNotification  ┌──────────────────────┐
//! │ RecordStore │─────────────────────>│ ViewRecyclingAdapter │
//! └─────────────┘                      └──────────────────────┘
//!        ^                                        │ bind
//!        │ replace_field / delete / ...           v
//! ┌──────────────────────┐   FieldEdit    ┌─────────────┐
//! │ RecordListController │<───────────────│ ItemBinding │
//! └──────────────────────┘                └─────────────┘
//! ```
//!
//! Edits flow up through listener traits; values flow down through `bind`.
//! The store only notifies when a value actually changed, and bindings never
//! report their own programmatic writes, so the loop is closed without
//! echoes.

mod field;
mod notification;
mod record;
mod sample;
mod store;

pub use field::{FieldId, FieldValue};
pub use notification::{ChangeKind, ChangeListener, ChangeNotification};
pub use record::{Record, RecordBuilder};
pub use sample::sample_records;
pub use store::{RecordStore, RecordsSnapshot};
