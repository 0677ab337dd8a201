//! The change notification protocol emitted by the record store.

use std::ops::RangeInclusive;

/// Describes what part of a [`RecordStore`](super::RecordStore) changed.
///
/// Ranges are inclusive on both ends. Indices refer to post-mutation
/// positions for inserts and changes, and to the position a row had at the
/// moment it was removed for deletes. Every notification is delivered after
/// the mutation has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeNotification {
    /// One record was replaced with an unequal value.
    ItemChanged(usize),
    /// Records in `first..=last` may have changed.
    RangeChanged { first: usize, last: usize },
    /// One record was inserted.
    ItemInserted(usize),
    /// Records were inserted at `first..=last`.
    RangeInserted { first: usize, last: usize },
    /// One record was removed.
    ItemDeleted(usize),
    /// Records formerly at `first..=last` were removed.
    RangeDeleted { first: usize, last: usize },
    /// The whole contents were replaced.
    DatasetReset,
    /// The shape of the data changed; views should rebuild everything.
    StructureChanged,
}

/// The coarse category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Values changed in place.
    Update,
    /// Rows were added.
    Insert,
    /// Rows were removed.
    Delete,
    /// Everything must be reloaded.
    Reset,
}

impl ChangeNotification {
    /// The category of this notification.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::ItemChanged(_) | Self::RangeChanged { .. } => ChangeKind::Update,
            Self::ItemInserted(_) | Self::RangeInserted { .. } => ChangeKind::Insert,
            Self::ItemDeleted(_) | Self::RangeDeleted { .. } => ChangeKind::Delete,
            Self::DatasetReset | Self::StructureChanged => ChangeKind::Reset,
        }
    }

    /// The inclusive row range affected, or `None` for whole-dataset events.
    pub fn rows(&self) -> Option<RangeInclusive<usize>> {
        match *self {
            Self::ItemChanged(index) | Self::ItemInserted(index) | Self::ItemDeleted(index) => {
                Some(index..=index)
            }
            Self::RangeChanged { first, last }
            | Self::RangeInserted { first, last }
            | Self::RangeDeleted { first, last } => Some(first..=last),
            Self::DatasetReset | Self::StructureChanged => None,
        }
    }

    /// Number of rows covered by the notification, `None` for resets.
    pub fn row_span(&self) -> Option<usize> {
        self.rows().map(|rows| rows.end() - rows.start() + 1)
    }

    /// Returns `true` if `row` lies inside the affected range. Resets cover
    /// every row.
    pub fn covers(&self, row: usize) -> bool {
        self.rows().is_none_or(|rows| rows.contains(&row))
    }

    /// Builds the most specific update notification for `first..=last`.
    pub(crate) fn changed(first: usize, last: usize) -> Self {
        if first == last {
            Self::ItemChanged(first)
        } else {
            Self::RangeChanged { first, last }
        }
    }

    /// Builds the most specific insert notification for `first..=last`.
    pub(crate) fn inserted(first: usize, last: usize) -> Self {
        if first == last {
            Self::ItemInserted(first)
        } else {
            Self::RangeInserted { first, last }
        }
    }

    /// Builds the most specific delete notification for `first..=last`.
    pub(crate) fn deleted(first: usize, last: usize) -> Self {
        if first == last {
            Self::ItemDeleted(first)
        } else {
            Self::RangeDeleted { first, last }
        }
    }
}

/// A subscriber to store notifications.
///
/// Handlers run synchronously on the mutating thread, after the mutation is
/// applied and before the mutating call returns. A handler may read the
/// store and may mutate it again; nested notifications are delivered to all
/// subscribers before the outer notification reaches the next subscriber.
pub trait ChangeListener: Send + Sync {
    /// Called once per notification.
    fn on_change(&self, notification: &ChangeNotification);
}

impl<F> ChangeListener for F
where
    F: Fn(&ChangeNotification) + Send + Sync,
{
    fn on_change(&self, notification: &ChangeNotification) {
        self(notification)
    }
}
