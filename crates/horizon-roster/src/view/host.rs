//! The contract between the adapter and a host list/grid widget.

use horizon_roster_core::Signal;

use crate::model::{ChangeNotification, Record};

/// One refresh the host widget must perform.
///
/// Every [`ChangeNotification`] maps onto exactly one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshRequest {
    /// Repaint a single row.
    Cell { row: usize },
    /// Repaint rows `first..=last`.
    Rows { first: usize, last: usize },
    /// Rows `first..=last` were added.
    RowsInserted { first: usize, last: usize },
    /// Rows formerly at `first..=last` are gone.
    RowsDeleted { first: usize, last: usize },
    /// Re-read every row.
    Reload,
    /// Rebuild the widget's row structure, then re-read every row.
    StructureReload,
}

impl From<ChangeNotification> for RefreshRequest {
    fn from(notification: ChangeNotification) -> Self {
        match notification {
            ChangeNotification::ItemChanged(row) => Self::Cell { row },
            ChangeNotification::RangeChanged { first, last } => Self::Rows { first, last },
            ChangeNotification::ItemInserted(row) => Self::RowsInserted { first: row, last: row },
            ChangeNotification::RangeInserted { first, last } => Self::RowsInserted { first, last },
            ChangeNotification::ItemDeleted(row) => Self::RowsDeleted { first: row, last: row },
            ChangeNotification::RangeDeleted { first, last } => Self::RowsDeleted { first, last },
            ChangeNotification::DatasetReset => Self::Reload,
            ChangeNotification::StructureChanged => Self::StructureReload,
        }
    }
}

/// What a virtualized list or grid widget needs from its model.
///
/// The roster is a single-column table whose cells hold whole records; the
/// host renders each cell with a row binding.
pub trait HostTableModel {
    /// Number of rows to lay out.
    fn row_count(&self) -> usize;

    /// Number of columns.
    fn column_count(&self) -> usize {
        1
    }

    /// Header text for `column`.
    fn column_name(&self, column: usize) -> Option<&'static str> {
        (column == 0).then_some("Records")
    }

    /// The value to show at (`row`, `column`), or `None` for a placeholder
    /// or an unknown column.
    fn value_at(&self, row: usize, column: usize) -> Option<Record>;

    /// Whether the host may open an editor on the cell.
    fn is_editable(&self, row: usize, column: usize) -> bool;

    /// The host finished editing a cell and hands back the edited value.
    ///
    /// Stale rows are absorbed; the host is never handed an error.
    fn on_commit(&self, row: usize, column: usize, value: Record);

    /// Where the host subscribes for refresh requests.
    fn refresh_requested(&self) -> &Signal<RefreshRequest>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_notification_maps_to_one_request() {
        let cases = [
            (ChangeNotification::ItemChanged(2), RefreshRequest::Cell { row: 2 }),
            (
                ChangeNotification::RangeChanged { first: 1, last: 3 },
                RefreshRequest::Rows { first: 1, last: 3 },
            ),
            (
                ChangeNotification::ItemInserted(0),
                RefreshRequest::RowsInserted { first: 0, last: 0 },
            ),
            (
                ChangeNotification::RangeDeleted { first: 4, last: 5 },
                RefreshRequest::RowsDeleted { first: 4, last: 5 },
            ),
            (ChangeNotification::DatasetReset, RefreshRequest::Reload),
            (ChangeNotification::StructureChanged, RefreshRequest::StructureReload),
        ];
        for (notification, expected) in cases {
            assert_eq!(RefreshRequest::from(notification), expected);
        }
    }
}
