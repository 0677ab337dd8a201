//! The application controller that routes row edits into the store.

use std::sync::Arc;

use horizon_roster_core::logging::targets;

use super::binding::{ControlActionListener, FieldEditedListener};
use crate::error::{Error, Result};
use crate::model::{FieldId, RecordStore};

/// Routes field edits and control actions from row bindings into a
/// [`RecordStore`].
///
/// Stale rows and unparsable values are logged and dropped here instead of
/// travelling back into the UI.
#[derive(Debug, Clone)]
pub struct RecordListController {
    store: Arc<RecordStore>,
}

impl RecordListController {
    /// Create a controller writing into `store`.
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// The store edits are written to.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Append a blank record for a new member. Returns its row.
    pub fn add_member(&self) -> usize {
        let row = self.store.append_default();
        tracing::debug!(target: targets::CONTROLLER, row, "added member");
        row
    }

    fn absorb<T>(&self, operation: &'static str, index: usize, result: Result<T>) {
        match result {
            Ok(_) => {}
            Err(error @ Error::IndexOutOfRange { .. }) => {
                tracing::warn!(target: targets::CONTROLLER, operation, index, %error, "stale row, ignoring");
            }
            Err(error) => {
                tracing::debug!(target: targets::CONTROLLER, operation, index, %error, "edit not applied");
            }
        }
    }
}

impl FieldEditedListener for RecordListController {
    fn on_field_edited(&self, index: usize, field: FieldId, raw_value: &str) {
        self.absorb("replace_field", index, self.store.replace_field(index, field, raw_value));
    }
}

impl ControlActionListener for RecordListController {
    fn on_add_membership(&self, index: usize) {
        self.absorb("add_membership", index, self.store.add_membership(index));
    }

    fn on_remove_membership(&self, index: usize) {
        self.absorb("remove_membership", index, self.store.remove_membership(index));
    }

    fn on_delete(&self, index: usize) {
        self.absorb("delete", index, self.store.delete(index));
    }
}
