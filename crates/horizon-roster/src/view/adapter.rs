//! The recycling adapter between a [`RecordStore`] and a virtualized host widget.
//!
//! The adapter keeps a bounded pool of row bindings keyed by row. Hosts ask
//! for a binding per visible row; the adapter reuses the row's pooled binding
//! when it has one, recycles the least recently used one when the pool is
//! full, and keeps every pooled binding's row and record in step with the
//! store's notifications.
//!
//! # Slot lifecycle
//!
//! ```text
//! Empty ──acquire──> Bound(row) ──ItemChanged(row)──> Bound(row) (rebound in place)
//!                        │
//!                        ├── rows inserted/deleted before it ──> Bound(row ± n)
//!                        ├── pool full, least recently used ──> Bound(other row)
//!                        └── row deleted / reset ──> spare list ──> Bound(other row)
//! ```
//!
//! A row being edited is never recycled for another row. If it is deleted,
//! `editing_cancelled` fires before the structural refresh and its binding
//! is destroyed rather than reused.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_roster::config::AdapterConfig;
//! use horizon_roster::model::{sample_records, RecordStore};
//! use horizon_roster::view::{HostTableModel, RowBinding, ViewRecyclingAdapter};
//!
//! let store = Arc::new(RecordStore::from_records(sample_records()));
//! let adapter = ViewRecyclingAdapter::headless(store.clone(), AdapterConfig::default());
//!
//! let binding = adapter.acquire_binding_for_row(2, false).unwrap();
//! assert_eq!(binding.bound_record().first_name(), "James");
//!
//! store.delete(0).unwrap();
//! assert_eq!(binding.bound_index(), 1);
//! assert_eq!(adapter.row_count(), 5);
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use horizon_roster_core::{logging::targets, ConnectionId, PerfSpan, Signal};
use parking_lot::{Mutex, RwLock};

use super::binding::{ControlActionListener, FieldEditedListener, ItemBinding, RowBinding};
use super::host::{HostTableModel, RefreshRequest};
use crate::config::AdapterConfig;
use crate::error::{Error, Result};
use crate::model::{ChangeNotification, Record, RecordStore};
use crate::observe::{noop_observer, SyncEvent, SyncObserver};

/// Creates a fresh binding for the given row.
pub type BindingFactory<B> = Box<dyn Fn(usize) -> B + Send + Sync>;

/// What the adapter currently holds for a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowSlotState {
    /// No binding is associated with the row.
    Empty,
    /// A pooled binding shows the row.
    Bound(usize),
    /// A pooled binding shows the row and the host is editing it.
    Editing(usize),
}

struct PooledSlot<B> {
    binding: Arc<B>,
    last_used: u64,
}

struct Pool<B> {
    slots: BTreeMap<usize, PooledSlot<B>>,
    spares: Vec<Arc<B>>,
    editing: Option<usize>,
    tick: u64,
}

impl<B> Pool<B> {
    fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            spares: Vec::new(),
            editing: None,
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// The least recently used row that may be taken from its binding.
    fn eviction_candidate(&self) -> Option<usize> {
        self.slots
            .iter()
            .filter(|(row, _)| Some(**row) != self.editing)
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(row, _)| *row)
    }

    fn park(&mut self, binding: Arc<B>, capacity: usize) {
        if self.spares.len() < capacity {
            self.spares.push(binding);
        }
    }
}

/// Outcome of the pool lookup in `acquire_binding_for_row`.
enum Lookup<B> {
    Pooled(Arc<B>),
    Recycled { binding: Arc<B>, from: Option<usize> },
    Create,
}

/// Pool changes computed under the lock, applied to bindings after it is released.
struct Reconcile<B> {
    rebind: Vec<(usize, Arc<B>)>,
    reindex: Vec<(usize, Arc<B>)>,
    evicted: Vec<usize>,
    cancelled: Option<(usize, Arc<B>)>,
    park: Vec<Arc<B>>,
}

impl<B> Reconcile<B> {
    fn new() -> Self {
        Self {
            rebind: Vec::new(),
            reindex: Vec::new(),
            evicted: Vec::new(),
            cancelled: None,
            park: Vec::new(),
        }
    }
}

struct AdapterInner<B: RowBinding> {
    store: Arc<RecordStore>,
    config: AdapterConfig,
    factory: BindingFactory<B>,
    pool: Mutex<Pool<B>>,
    refresh_requested: Signal<RefreshRequest>,
    editing_cancelled: Signal<usize>,
    observer: RwLock<SyncObserver>,
}

impl<B: RowBinding> AdapterInner<B> {
    fn observe(&self, event: SyncEvent) {
        let observer = self.observer.read().clone();
        observer.observe(&event);
    }

    fn on_change(&self, notification: &ChangeNotification) {
        let _span = PerfSpan::new("adapter_reconcile");
        let notification = *notification;
        let reconcile = match notification {
            ChangeNotification::ItemChanged(row) => self.collect_rebinds(row, row),
            ChangeNotification::RangeChanged { first, last } => self.collect_rebinds(first, last),
            ChangeNotification::ItemInserted(row) => self.shift_for_insert(row, 1),
            ChangeNotification::RangeInserted { first, last } => {
                self.shift_for_insert(first, last - first + 1)
            }
            ChangeNotification::ItemDeleted(row) => self.evict_deleted(row, row),
            ChangeNotification::RangeDeleted { first, last } => self.evict_deleted(first, last),
            ChangeNotification::DatasetReset | ChangeNotification::StructureChanged => {
                self.release_all()
            }
        };
        self.apply(reconcile);

        let request = RefreshRequest::from(notification);
        tracing::trace!(target: targets::ADAPTER, ?notification, ?request, "requesting refresh");
        self.refresh_requested.emit(request);
    }

    fn collect_rebinds(&self, first: usize, last: usize) -> Reconcile<B> {
        let pool = self.pool.lock();
        let mut reconcile = Reconcile::new();
        reconcile.rebind = pool
            .slots
            .range(first..=last)
            .map(|(row, slot)| (*row, slot.binding.clone()))
            .collect();
        reconcile
    }

    fn shift_for_insert(&self, first: usize, inserted: usize) -> Reconcile<B> {
        let mut pool = self.pool.lock();
        let mut reconcile = Reconcile::new();

        let moved = pool.slots.split_off(&first);
        for (row, slot) in moved {
            reconcile.reindex.push((row + inserted, slot.binding.clone()));
            pool.slots.insert(row + inserted, slot);
        }
        if let Some(editing) = pool.editing.filter(|row| *row >= first) {
            pool.editing = Some(editing + inserted);
        }
        reconcile
    }

    fn evict_deleted(&self, first: usize, last: usize) -> Reconcile<B> {
        let mut pool = self.pool.lock();
        let mut reconcile = Reconcile::new();
        let removed = last - first + 1;

        let mut tail = pool.slots.split_off(&first);
        let later = tail.split_off(&(last + 1));

        for (row, slot) in tail {
            reconcile.evicted.push(row);
            if pool.editing == Some(row) {
                // Its identity no longer matches any row; never reuse it.
                reconcile.cancelled = Some((row, slot.binding));
            } else {
                reconcile.park.push(slot.binding);
            }
        }
        if reconcile.cancelled.is_some() {
            pool.editing = None;
        }

        for (row, slot) in later {
            reconcile.reindex.push((row - removed, slot.binding.clone()));
            pool.slots.insert(row - removed, slot);
        }
        if let Some(editing) = pool.editing.filter(|row| *row > last) {
            pool.editing = Some(editing - removed);
        }
        reconcile
    }

    fn release_all(&self) -> Reconcile<B> {
        let mut pool = self.pool.lock();
        let mut reconcile = Reconcile::new();
        let editing = pool.editing.take();

        for (row, slot) in std::mem::take(&mut pool.slots) {
            reconcile.evicted.push(row);
            if editing == Some(row) {
                reconcile.cancelled = Some((row, slot.binding.clone()));
            }
            reconcile.park.push(slot.binding);
        }
        reconcile
    }

    /// Touch bindings with the pool lock released.
    fn apply(&self, reconcile: Reconcile<B>) {
        let Reconcile {
            rebind,
            reindex,
            evicted,
            cancelled,
            park,
        } = reconcile;

        if let Some((row, binding)) = cancelled {
            tracing::debug!(target: targets::ADAPTER, row, "row left the store while being edited, cancelling edit");
            binding.cancel_edit();
            binding.set_editable(false);
            self.observe(SyncEvent::EditingCancelled { row });
            self.editing_cancelled.emit(row);
        }

        for row in evicted {
            tracing::debug!(target: targets::ADAPTER, row, "evicted binding");
            self.observe(SyncEvent::BindingEvicted { row });
        }

        if !park.is_empty() {
            let mut pool = self.pool.lock();
            for binding in park {
                pool.park(binding, self.config.pool_capacity);
            }
        }

        for (row, binding) in reindex {
            binding.rebind_index(row);
        }

        if !rebind.is_empty() {
            let records = self.store.get_all();
            for (row, binding) in rebind {
                if let Some(record) = records.get(row) {
                    if binding.bound_record() != *record {
                        binding.bind(record);
                    }
                }
            }
        }
    }
}

/// Pools row bindings for a virtualized list over a [`RecordStore`] and
/// translates store notifications into host refresh requests.
///
/// Parameterized by the binding type; [`ItemBinding`] is the standard one.
pub struct ViewRecyclingAdapter<B: RowBinding = ItemBinding> {
    inner: Arc<AdapterInner<B>>,
    subscription: ConnectionId,
}

impl<B: RowBinding> ViewRecyclingAdapter<B> {
    /// Create an adapter over `store` that builds bindings with `factory`.
    ///
    /// The factory runs without any adapter lock held.
    pub fn new<F>(store: Arc<RecordStore>, config: AdapterConfig, factory: F) -> Self
    where
        F: Fn(usize) -> B + Send + Sync + 'static,
    {
        let config = AdapterConfig {
            pool_capacity: config.pool_capacity.max(1),
            ..config
        };
        let inner = Arc::new(AdapterInner {
            store: store.clone(),
            config,
            factory: Box::new(factory),
            pool: Mutex::new(Pool::new()),
            refresh_requested: Signal::new(),
            editing_cancelled: Signal::new(),
            observer: RwLock::new(noop_observer()),
        });

        let weak: Weak<AdapterInner<B>> = Arc::downgrade(&inner);
        let subscription = store.changed().connect(move |notification| {
            if let Some(inner) = weak.upgrade() {
                inner.on_change(notification);
            }
        });

        Self {
            inner,
            subscription,
        }
    }

    /// Install the observability hook. Bindings created from now on share it.
    pub fn set_observer(&self, observer: SyncObserver) {
        let pool = self.inner.pool.lock();
        for slot in pool.slots.values() {
            slot.binding.set_observer(observer.clone());
        }
        for binding in &pool.spares {
            binding.set_observer(observer.clone());
        }
        drop(pool);
        *self.inner.observer.write() = observer;
    }

    /// The store this adapter reflects.
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.inner.store
    }

    /// The adapter's settings.
    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    /// Emitted once per store notification, after the pool was reconciled.
    pub fn refresh_requested(&self) -> &Signal<RefreshRequest> {
        &self.inner.refresh_requested
    }

    /// Emitted with the row whose editing was cancelled because it left the
    /// store. Fires before the matching refresh request.
    pub fn editing_cancelled(&self) -> &Signal<usize> {
        &self.inner.editing_cancelled
    }

    /// The record to show at `index`, clamped to the last row.
    ///
    /// Returns `None` only when the store is empty.
    pub fn value_for_display(&self, index: usize) -> Option<Record> {
        let records = self.inner.store.get_all();
        let last = records.len().checked_sub(1)?;
        let row = index.min(last);
        if row != index {
            self.absorb_race(index);
        }
        records.get(row).cloned()
    }

    /// The binding showing row `index`, creating or recycling one if needed.
    ///
    /// Indices past the end are clamped to the last row, which absorbs hosts
    /// that ask for a row right after it was deleted. When `editable` is set
    /// the row becomes the editing row.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] when the store is empty.
    pub fn acquire_binding_for_row(&self, index: usize, editable: bool) -> Result<Arc<B>> {
        let records = self.inner.store.get_all();
        let count = records.len();
        let Some(last) = count.checked_sub(1) else {
            return Err(Error::index_out_of_range(index, count));
        };
        let row = index.min(last);
        if row != index {
            self.absorb_race(index);
        }
        let record = &records[row];

        let (lookup, previous_editor) = self.lookup(row, editable);
        if let Some(previous) = previous_editor {
            previous.cancel_edit();
            previous.set_editable(false);
        }

        let (binding, fresh) = match lookup {
            Lookup::Pooled(binding) => (binding, false),
            Lookup::Recycled { binding, from } => {
                tracing::trace!(target: targets::ADAPTER, ?from, to = row, "recycled binding");
                self.inner.observe(SyncEvent::BindingRecycled { from, to: row });
                // Uncommitted text belongs to the row it was typed on.
                binding.cancel_edit();
                (binding, false)
            }
            Lookup::Create => (self.create_binding(row, editable), true),
        };

        binding.set_editable(editable || self.inner.pool.lock().editing == Some(row));
        if binding.bound_index() != row {
            binding.rebind_index(row);
        }
        if fresh || binding.bound_record() != *record {
            binding.bind(record);
        }
        Ok(binding)
    }

    /// Find or free a binding for `row`. Also returns the binding that was
    /// editing another row, when `editable` moves the editing session.
    fn lookup(&self, row: usize, editable: bool) -> (Lookup<B>, Option<Arc<B>>) {
        let mut pool = self.inner.pool.lock();
        let tick = pool.next_tick();
        let mut previous_editor = None;
        if editable {
            if let Some(previous) = pool.editing.replace(row).filter(|previous| *previous != row) {
                previous_editor = pool.slots.get(&previous).map(|slot| slot.binding.clone());
            }
        }

        if let Some(slot) = pool.slots.get_mut(&row) {
            slot.last_used = tick;
            return (Lookup::Pooled(slot.binding.clone()), previous_editor);
        }

        let recycled = if pool.slots.len() >= self.inner.config.pool_capacity {
            pool.eviction_candidate()
                .and_then(|old| pool.slots.remove(&old).map(|slot| (Some(old), slot.binding)))
        } else {
            pool.spares.pop().map(|binding| (None, binding))
        };

        let lookup = match recycled {
            Some((from, binding)) => {
                pool.slots.insert(
                    row,
                    PooledSlot {
                        binding: binding.clone(),
                        last_used: tick,
                    },
                );
                Lookup::Recycled { binding, from }
            }
            None => Lookup::Create,
        };
        (lookup, previous_editor)
    }

    fn create_binding(&self, row: usize, editable: bool) -> Arc<B> {
        let binding = Arc::new((self.inner.factory)(row));
        binding.set_observer(self.inner.observer.read().clone());

        let evicted = {
            let mut pool = self.inner.pool.lock();
            let tick = pool.next_tick();
            // Only reached at capacity when every pooled row is being edited.
            let evicted = if pool.slots.len() >= self.inner.config.pool_capacity {
                pool.eviction_candidate()
                    .and_then(|old| pool.slots.remove(&old).map(|slot| (old, slot.binding)))
            } else {
                None
            };
            if let Some((_, parked)) = &evicted {
                pool.park(parked.clone(), self.inner.config.pool_capacity);
            }
            pool.slots.insert(
                row,
                PooledSlot {
                    binding: binding.clone(),
                    last_used: tick,
                },
            );
            evicted.map(|(old, _)| old)
        };
        if let Some(old) = evicted {
            self.inner.observe(SyncEvent::BindingEvicted { row: old });
        }

        tracing::trace!(target: targets::ADAPTER, row, editable, "created binding");
        self.inner.observe(SyncEvent::BindingCreated { row });
        binding
    }

    fn absorb_race(&self, index: usize) {
        tracing::warn!(target: targets::ADAPTER, index, "row past the end requested, clamping");
        self.inner.observe(SyncEvent::RaceAbsorbed { row: index });
    }

    /// Start editing `row`. Same as acquiring an editable binding.
    pub fn begin_edit(&self, row: usize) -> Result<Arc<B>> {
        self.acquire_binding_for_row(row, true)
    }

    /// The host finished editing `index`; store `record` there.
    ///
    /// Returns whether the store changed. Ends the editing session for
    /// `index` whatever the outcome.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if the row no longer exists.
    pub fn commit_edit(&self, index: usize, record: Record) -> Result<bool> {
        let binding = self.end_edit(index);
        let result = self.inner.store.replace_whole(index, record);
        if let Some(binding) = binding {
            binding.cancel_edit();
            binding.set_editable(false);
        }
        result
    }

    /// Abandon the current editing session, restoring the row's controls.
    ///
    /// Returns the row that was being edited.
    pub fn cancel_edit(&self) -> Option<usize> {
        let (row, binding) = {
            let mut pool = self.inner.pool.lock();
            let row = pool.editing.take()?;
            (row, pool.slots.get(&row).map(|slot| slot.binding.clone()))
        };
        if let Some(binding) = binding {
            binding.cancel_edit();
            binding.set_editable(false);
        }
        Some(row)
    }

    fn end_edit(&self, index: usize) -> Option<Arc<B>> {
        let mut pool = self.inner.pool.lock();
        if pool.editing == Some(index) {
            pool.editing = None;
        }
        pool.slots.get(&index).map(|slot| slot.binding.clone())
    }

    /// The row currently being edited, if any.
    pub fn editing_row(&self) -> Option<usize> {
        self.inner.pool.lock().editing
    }

    /// What the pool holds for `row`.
    pub fn slot_state(&self, row: usize) -> RowSlotState {
        let pool = self.inner.pool.lock();
        match (pool.editing == Some(row), pool.slots.contains_key(&row)) {
            (true, true) => RowSlotState::Editing(row),
            (_, true) => RowSlotState::Bound(row),
            _ => RowSlotState::Empty,
        }
    }

    /// The pooled binding for `row`, without creating one.
    pub fn pooled_binding(&self, row: usize) -> Option<Arc<B>> {
        self.inner
            .pool
            .lock()
            .slots
            .get(&row)
            .map(|slot| slot.binding.clone())
    }

    /// Number of bindings associated with rows.
    pub fn pool_len(&self) -> usize {
        self.inner.pool.lock().slots.len()
    }

    /// Number of released bindings waiting for reuse.
    pub fn spare_len(&self) -> usize {
        self.inner.pool.lock().spares.len()
    }
}

impl ViewRecyclingAdapter<ItemBinding> {
    /// An adapter building headless [`ItemBinding`]s.
    pub fn headless(store: Arc<RecordStore>, config: AdapterConfig) -> Self {
        Self::new(store, config, |_| ItemBinding::headless())
    }

    /// An adapter building headless [`ItemBinding`]s routed to `listener`.
    pub fn with_listener<L>(store: Arc<RecordStore>, config: AdapterConfig, listener: Arc<L>) -> Self
    where
        L: FieldEditedListener + ControlActionListener + 'static,
    {
        Self::new(store, config, move |_| {
            let binding = ItemBinding::headless();
            binding.attach(listener.clone());
            binding
        })
    }
}

impl<B: RowBinding> HostTableModel for ViewRecyclingAdapter<B> {
    fn row_count(&self) -> usize {
        let count = self.inner.store.count();
        if count == 0 && self.inner.config.placeholder_row {
            1
        } else {
            count
        }
    }

    fn value_at(&self, row: usize, column: usize) -> Option<Record> {
        if column != 0 {
            return None;
        }
        self.value_for_display(row)
    }

    fn is_editable(&self, row: usize, column: usize) -> bool {
        column == 0 && row < self.inner.store.count()
    }

    fn on_commit(&self, row: usize, column: usize, value: Record) {
        if column != 0 {
            return;
        }
        match self.commit_edit(row, value) {
            Ok(_) => {}
            Err(error) if error.is_index_out_of_range() => {
                tracing::warn!(target: targets::ADAPTER, row, %error, "commit for a row that no longer exists");
                self.inner.observe(SyncEvent::RaceAbsorbed { row });
            }
            Err(error) => {
                tracing::warn!(target: targets::ADAPTER, row, %error, "commit rejected");
            }
        }
    }

    fn refresh_requested(&self) -> &Signal<RefreshRequest> {
        &self.inner.refresh_requested
    }
}

impl<B: RowBinding> Drop for ViewRecyclingAdapter<B> {
    fn drop(&mut self) {
        self.inner.store.unsubscribe(self.subscription);
    }
}

impl<B: RowBinding> std::fmt::Debug for ViewRecyclingAdapter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pool = self.inner.pool.lock();
        f.debug_struct("ViewRecyclingAdapter")
            .field("config", &self.inner.config)
            .field("rows", &pool.slots.keys().collect::<Vec<_>>())
            .field("spares", &pool.spares.len())
            .field("editing", &pool.editing)
            .finish()
    }
}

static_assertions::assert_impl_all!(ViewRecyclingAdapter<ItemBinding>: Send, Sync);
