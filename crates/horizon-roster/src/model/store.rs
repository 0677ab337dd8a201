//! The single source of truth for roster records.
//!
//! `RecordStore` owns an ordered list of [`Record`]s and a signal that
//! announces every mutation with a [`ChangeNotification`]. All mutation goes
//! through the store's own methods; readers only ever receive immutable
//! snapshots.
//!
//! # Compare-and-swap with notify
//!
//! Every edit builds a candidate record and compares it with the current
//! one. Equal candidates are dropped without a notification. This is what
//! keeps a two-way binding from looping: a view that echoes the value it was
//! just given back into the store produces no further notification.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_roster::model::{ChangeNotification, FieldId, Record, RecordStore};
//!
//! let store = RecordStore::from_records(vec![
//!     Record::new("Ivy", "Brown", 22, true),
//!     Record::new("Tim", "Berners-Lee", 25, false),
//! ]);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! store.changed().connect(move |n| sink.lock().push(*n));
//!
//! assert!(store.replace_field(0, FieldId::Age, "23").unwrap());
//! assert!(!store.replace_field(0, FieldId::Age, "23").unwrap());
//! assert_eq!(*seen.lock(), vec![ChangeNotification::ItemChanged(0)]);
//! ```

use std::sync::Arc;

use horizon_roster_core::{logging::targets, ConnectionId, Signal};
use parking_lot::RwLock;

use super::field::FieldId;
use super::notification::{ChangeListener, ChangeNotification};
use super::record::Record;
use crate::error::{Error, Result};
use crate::observe::{noop_observer, SyncEvent, SyncObserver};

/// An immutable view of the store's contents at one point in time.
pub type RecordsSnapshot = Arc<Vec<Record>>;

/// The authoritative, observable, ordered collection of records.
///
/// Indices are dense in `[0, count)`. An index observed by a subscriber is
/// valid until the next mutating call; subscribers see every notification in
/// order, so they can always track how indices moved.
pub struct RecordStore {
    records: RwLock<RecordsSnapshot>,
    changed: Signal<ChangeNotification>,
    observer: RwLock<SyncObserver>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    /// Creates a store holding `records`, without notifying anyone.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records: RwLock::new(Arc::new(records)),
            changed: Signal::new(),
            observer: RwLock::new(noop_observer()),
        }
    }

    /// Installs the observability hook.
    pub fn set_observer(&self, observer: SyncObserver) {
        *self.observer.write() = observer;
    }

    // -------------------------------------------------------------------------
    // Reading
    // -------------------------------------------------------------------------

    /// A read-only snapshot of every record, in display order.
    ///
    /// The snapshot does not follow later mutations; ask again after a
    /// notification.
    pub fn get_all(&self) -> RecordsSnapshot {
        self.records.read().clone()
    }

    /// A copy of the record at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Record> {
        self.records.read().get(index).cloned()
    }

    /// Number of records.
    pub fn count(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    // -------------------------------------------------------------------------
    // Subscribers
    // -------------------------------------------------------------------------

    /// The notification signal. Slots run in connection order.
    pub fn changed(&self) -> &Signal<ChangeNotification> {
        &self.changed
    }

    /// Registers a listener. Returns the id to pass to [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<L>(&self, listener: Arc<L>) -> ConnectionId
    where
        L: ChangeListener + ?Sized + 'static,
    {
        self.changed.connect(move |notification| listener.on_change(notification))
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: ConnectionId) -> bool {
        self.changed.disconnect(id)
    }

    // -------------------------------------------------------------------------
    // Field edits
    // -------------------------------------------------------------------------

    /// Parses `raw` for `field` and stores the result at `index` if it differs
    /// from the current record.
    ///
    /// Returns `Ok(true)` when the record changed and `ItemChanged(index)` was
    /// emitted, `Ok(false)` for a no-op edit.
    ///
    /// # Errors
    ///
    /// - [`Error::IndexOutOfRange`] if `index >= count()`
    /// - [`Error::InvalidFieldValue`] if `raw` does not parse for `field`;
    ///   nothing is stored or emitted
    pub fn replace_field(&self, index: usize, field: FieldId, raw: &str) -> Result<bool> {
        self.swap_if_changed(index, |current| current.with_raw_field(field, raw))
    }

    /// Sets the membership flag at `index`, notifying only on change.
    pub fn set_membership(&self, index: usize, is_member: bool) -> Result<bool> {
        self.swap_if_changed(index, |current| Ok(current.with_membership(is_member)))
    }

    /// Marks the record at `index` as a member.
    pub fn add_membership(&self, index: usize) -> Result<bool> {
        self.set_membership(index, true)
    }

    /// Clears the membership flag of the record at `index`.
    pub fn remove_membership(&self, index: usize) -> Result<bool> {
        self.set_membership(index, false)
    }

    /// Replaces the whole record at `index` if it differs from `record`.
    ///
    /// Used by editors that collect every field and submit once.
    pub fn replace_whole(&self, index: usize, record: Record) -> Result<bool> {
        self.swap_if_changed(index, move |_| Ok(record))
    }

    /// Replaces `records.len()` consecutive records starting at `first`.
    ///
    /// Only records that differ are written. Emits one notification spanning
    /// the first to the last changed index, or nothing if none changed.
    /// Returns the number of records that changed.
    pub fn replace_range(&self, first: usize, records: Vec<Record>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let changed = {
            let mut guard = self.records.write();
            let count = guard.len();
            let last = match first.checked_add(records.len() - 1) {
                Some(last) if last < count => last,
                Some(last) => return Err(Error::index_out_of_range(last, count)),
                None => return Err(Error::index_out_of_range(first, count)),
            };

            let changed: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(offset, record)| guard[first + offset] != **record)
                .map(|(offset, _)| first + offset)
                .collect();

            if !changed.is_empty() {
                let contents = Arc::make_mut(&mut guard);
                for (offset, record) in records.into_iter().enumerate() {
                    contents[first + offset] = record;
                }
            }
            changed
        };

        match (changed.first(), changed.last()) {
            (Some(&lo), Some(&hi)) => {
                self.notify(ChangeNotification::changed(lo, hi));
                Ok(changed.len())
            }
            _ => {
                self.observe(SyncEvent::EditSuppressed { index: first });
                Ok(0)
            }
        }
    }

    fn swap_if_changed<F>(&self, index: usize, edit: F) -> Result<bool>
    where
        F: FnOnce(&Record) -> Result<Record>,
    {
        let changed = {
            let mut guard = self.records.write();
            let count = guard.len();
            let current = guard
                .get(index)
                .ok_or_else(|| Error::index_out_of_range(index, count))?;
            let candidate = edit(current)?;
            if *current == candidate {
                false
            } else {
                Arc::make_mut(&mut guard)[index] = candidate;
                true
            }
        };

        if changed {
            self.notify(ChangeNotification::ItemChanged(index));
        } else {
            tracing::trace!(target: targets::STORE, index, "edit matches current record, not notifying");
            self.observe(SyncEvent::EditSuppressed { index });
        }
        Ok(changed)
    }

    // -------------------------------------------------------------------------
    // Structural edits
    // -------------------------------------------------------------------------

    /// Inserts `record` at `index`, shifting later records up.
    ///
    /// Emits `ItemInserted(index)`. `index == count()` appends.
    pub fn insert(&self, index: usize, record: Record) -> Result<()> {
        {
            let mut guard = self.records.write();
            let count = guard.len();
            if index > count {
                return Err(Error::index_out_of_range(index, count));
            }
            Arc::make_mut(&mut guard).insert(index, record);
        }
        self.notify(ChangeNotification::ItemInserted(index));
        Ok(())
    }

    /// Inserts `records` starting at `index`, in order.
    ///
    /// Emits the most specific insert notification; an empty list is a no-op.
    pub fn insert_all(&self, index: usize, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let inserted = records.len();
        {
            let mut guard = self.records.write();
            let count = guard.len();
            if index > count {
                return Err(Error::index_out_of_range(index, count));
            }
            Arc::make_mut(&mut guard).splice(index..index, records);
        }
        self.notify(ChangeNotification::inserted(index, index + inserted - 1));
        Ok(())
    }

    /// Appends `record`, returning its index.
    pub fn append(&self, record: Record) -> usize {
        let index = {
            let mut guard = self.records.write();
            let index = guard.len();
            Arc::make_mut(&mut guard).push(record);
            index
        };
        self.notify(ChangeNotification::ItemInserted(index));
        index
    }

    /// Appends a record with default values, returning its index.
    pub fn append_default(&self) -> usize {
        self.append(Record::default())
    }

    /// Removes and returns the record at `index`, shifting later records down.
    ///
    /// Emits `ItemDeleted(index)`.
    pub fn delete(&self, index: usize) -> Result<Record> {
        let removed = {
            let mut guard = self.records.write();
            let count = guard.len();
            if index >= count {
                return Err(Error::index_out_of_range(index, count));
            }
            Arc::make_mut(&mut guard).remove(index)
        };
        self.notify(ChangeNotification::ItemDeleted(index));
        Ok(removed)
    }

    /// Removes the records in `first..=last`, returning them in order.
    pub fn delete_range(&self, first: usize, last: usize) -> Result<Vec<Record>> {
        if first > last {
            return Err(Error::InvalidRange { first, last });
        }
        let removed: Vec<Record> = {
            let mut guard = self.records.write();
            let count = guard.len();
            if last >= count {
                return Err(Error::index_out_of_range(last, count));
            }
            Arc::make_mut(&mut guard).drain(first..=last).collect()
        };
        self.notify(ChangeNotification::deleted(first, last));
        Ok(removed)
    }

    /// Replaces the entire contents and emits `DatasetReset`, even if the new
    /// contents equal the old ones.
    pub fn reset(&self, records: Vec<Record>) {
        *self.records.write() = Arc::new(records);
        self.notify(ChangeNotification::DatasetReset);
    }

    /// Tells subscribers the shape of the data changed and views must be
    /// rebuilt from scratch.
    pub fn notify_structure_changed(&self) {
        self.notify(ChangeNotification::StructureChanged);
    }

    // -------------------------------------------------------------------------
    // Notification
    // -------------------------------------------------------------------------

    fn notify(&self, notification: ChangeNotification) {
        tracing::trace!(
            target: targets::STORE,
            ?notification,
            subscribers = self.changed.connection_count(),
            "notifying"
        );
        self.observe(SyncEvent::Notified(notification));
        self.changed.emit(notification);
    }

    fn observe(&self, event: SyncEvent) {
        let observer = self.observer.read().clone();
        observer.observe(&event);
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("records", &self.records.read())
            .field("subscribers", &self.changed.connection_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(RecordStore: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_roster_core::RecordingObserver;
    use parking_lot::Mutex;

    fn ivy() -> Record {
        Record::new("Ivy", "Brown", 22, true)
    }

    fn tim() -> Record {
        Record::new("Tim", "Berners-Lee", 25, false)
    }

    fn ada() -> Record {
        Record::new("Ada", "Lovelace", 20, true)
    }

    fn recording_store(records: Vec<Record>) -> (RecordStore, Arc<Mutex<Vec<ChangeNotification>>>) {
        let store = RecordStore::from_records(records);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.changed().connect(move |n| sink.lock().push(*n));
        (store, seen)
    }

    #[test]
    fn test_replace_field_changes_only_that_field() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);

        assert!(store.replace_field(0, FieldId::Age, "23").unwrap());

        assert_eq!(*seen.lock(), vec![ChangeNotification::ItemChanged(0)]);
        assert_eq!(store.get(0).unwrap(), Record::new("Ivy", "Brown", 23, true));
        assert_eq!(store.get(1).unwrap(), tim());
    }

    #[test]
    fn test_replace_field_equal_value_is_silent() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);
        let before = store.get_all();

        assert!(!store.replace_field(0, FieldId::Age, "22").unwrap());
        assert!(!store.replace_field(1, FieldId::LastName, "Berners-Lee").unwrap());

        assert!(seen.lock().is_empty());
        assert!(Arc::ptr_eq(&before, &store.get_all()));
    }

    #[test]
    fn test_replace_field_invalid_age() {
        let (store, seen) = recording_store(vec![ivy()]);

        let err = store.replace_field(0, FieldId::Age, "twenty").unwrap_err();
        assert!(matches!(err, Error::InvalidFieldValue { field: FieldId::Age, .. }));
        assert!(seen.lock().is_empty());
        assert_eq!(store.get(0).unwrap(), ivy());
    }

    #[test]
    fn test_empty_age_coerces_to_zero() {
        let (store, _) = recording_store(vec![ivy()]);
        assert!(store.replace_field(0, FieldId::Age, "").unwrap());
        assert_eq!(store.get(0).unwrap().age(), 0);
    }

    #[test]
    fn test_membership_compare_and_swap() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);

        assert!(!store.add_membership(0).unwrap());
        assert!(store.add_membership(1).unwrap());
        assert!(store.remove_membership(0).unwrap());
        assert!(!store.set_membership(0, false).unwrap());

        assert_eq!(
            *seen.lock(),
            vec![ChangeNotification::ItemChanged(1), ChangeNotification::ItemChanged(0)]
        );
        assert!(store.get(1).unwrap().is_member());
        assert!(!store.get(0).unwrap().is_member());
    }

    #[test]
    fn test_replace_whole() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);

        assert!(!store.replace_whole(1, tim()).unwrap());
        assert!(store.replace_whole(1, ada()).unwrap());
        assert!(store.replace_whole(2, ada()).unwrap_err().is_index_out_of_range());

        assert_eq!(*seen.lock(), vec![ChangeNotification::ItemChanged(1)]);
        assert_eq!(store.get(1).unwrap(), ada());
    }

    #[test]
    fn test_replace_range_reports_changed_span() {
        let (store, seen) = recording_store(vec![ivy(), tim(), ada(), ivy()]);

        // Only the middle two actually change.
        let changed = store
            .replace_range(0, vec![ivy(), ada(), tim(), ivy()])
            .unwrap();
        assert_eq!(changed, 2);

        // A range with a single real change collapses to the item variant.
        store.replace_range(2, vec![tim(), tim()]).unwrap();

        // All-equal ranges are silent.
        assert_eq!(store.replace_range(0, vec![ivy()]).unwrap(), 0);

        assert_eq!(
            *seen.lock(),
            vec![
                ChangeNotification::RangeChanged { first: 1, last: 2 },
                ChangeNotification::ItemChanged(3),
            ]
        );
        assert!(store.replace_range(3, vec![ivy(), ivy()]).is_err());
    }

    #[test]
    fn test_replace_range_far_past_end_is_out_of_range() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);

        let err = store
            .replace_range(usize::MAX, vec![Record::default(), Record::default()])
            .unwrap_err();

        assert!(err.is_index_out_of_range());
        assert_eq!(store.get_all().as_slice(), &[ivy(), tim()]);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_insert_shifts_later_records() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);

        store.insert(1, ada()).unwrap();

        assert_eq!(store.count(), 3);
        assert_eq!(store.get(1).unwrap().first_name(), "Ada");
        assert_eq!(store.get(2).unwrap().first_name(), "Tim");
        assert_eq!(store.get(0).unwrap(), ivy());
        assert_eq!(*seen.lock(), vec![ChangeNotification::ItemInserted(1)]);

        assert!(store.insert(5, ada()).unwrap_err().is_index_out_of_range());
    }

    #[test]
    fn test_insert_all_and_append() {
        let (store, seen) = recording_store(vec![ivy()]);

        store.insert_all(0, vec![tim(), ada()]).unwrap();
        store.insert_all(1, Vec::new()).unwrap();
        let appended = store.append_default();

        assert_eq!(appended, 3);
        assert_eq!(store.get(3).unwrap(), Record::default());
        assert_eq!(
            *seen.lock(),
            vec![
                ChangeNotification::RangeInserted { first: 0, last: 1 },
                ChangeNotification::ItemInserted(3),
            ]
        );
    }

    #[test]
    fn test_delete_shifts_down() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);

        let removed = store.delete(0).unwrap();

        assert_eq!(removed, ivy());
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(0).unwrap(), tim());
        assert_eq!(*seen.lock(), vec![ChangeNotification::ItemDeleted(0)]);

        assert!(matches!(
            store.delete(1),
            Err(Error::IndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_delete_range() {
        let (store, seen) = recording_store(vec![ivy(), tim(), ada()]);

        assert!(matches!(store.delete_range(2, 1), Err(Error::InvalidRange { .. })));
        assert!(store.delete_range(1, 3).is_err());

        let removed = store.delete_range(0, 1).unwrap();
        assert_eq!(removed, vec![ivy(), tim()]);
        assert_eq!(store.get_all().as_slice(), &[ada()]);
        assert_eq!(
            *seen.lock(),
            vec![ChangeNotification::RangeDeleted { first: 0, last: 1 }]
        );
    }

    #[test]
    fn test_reset_always_notifies_once() {
        let (store, seen) = recording_store(vec![ivy(), tim()]);

        store.reset(vec![ada()]);
        store.reset(vec![ada()]);

        assert_eq!(store.get_all().as_slice(), &[ada()]);
        assert_eq!(
            *seen.lock(),
            vec![ChangeNotification::DatasetReset, ChangeNotification::DatasetReset]
        );
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_mutation() {
        let store = RecordStore::from_records(vec![ivy()]);
        let snapshot = store.get_all();
        store.append(tim());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_subscribers_in_registration_order() {
        let store = RecordStore::from_records(vec![ivy()]);
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = order.clone();
        store.subscribe(Arc::new(move |_: &ChangeNotification| first.lock().push("first")));
        let second = order.clone();
        let id = store.subscribe(Arc::new(move |_: &ChangeNotification| second.lock().push("second")));

        store.notify_structure_changed();
        assert!(store.unsubscribe(id));
        store.notify_structure_changed();

        assert_eq!(*order.lock(), vec!["first", "second", "first"]);
    }

    #[test]
    fn test_reentrant_handler_sees_consistent_state() {
        let store = Arc::new(RecordStore::from_records(vec![ivy(), tim()]));
        let log = Arc::new(Mutex::new(Vec::new()));

        // The first subscriber reacts to a delete by appending a replacement.
        let weak = Arc::downgrade(&store);
        store.changed().connect(move |n| {
            if let (ChangeNotification::ItemDeleted(_), Some(store)) = (n, weak.upgrade()) {
                store.append(Record::default());
            }
        });

        let sink = log.clone();
        let weak = Arc::downgrade(&store);
        store.changed().connect(move |n| {
            let count = weak.upgrade().map(|s| s.count()).unwrap_or_default();
            sink.lock().push((*n, count));
        });

        store.delete(0).unwrap();

        // The nested insert reaches the second subscriber before the delete does.
        assert_eq!(
            *log.lock(),
            vec![
                (ChangeNotification::ItemInserted(1), 2),
                (ChangeNotification::ItemDeleted(0), 2),
            ]
        );
    }

    #[test]
    fn test_observer_sees_notifications_and_suppressions() {
        let store = RecordStore::from_records(vec![ivy()]);
        let recorder = Arc::new(RecordingObserver::<SyncEvent>::new());
        store.set_observer(recorder.clone());

        store.replace_field(0, FieldId::FirstName, "Ivy").unwrap();
        store.replace_field(0, FieldId::FirstName, "Ivana").unwrap();

        assert_eq!(
            recorder.events(),
            vec![
                SyncEvent::EditSuppressed { index: 0 },
                SyncEvent::Notified(ChangeNotification::ItemChanged(0)),
            ]
        );
    }
}
