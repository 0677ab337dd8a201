//! Row bindings: the live glue between one record and one row's controls.
//!
//! Values flow down through [`RowBinding::bind`]; user edits flow up through
//! the [`FieldEditedListener`] and [`ControlActionListener`] contracts. The
//! two directions never mix:
//!
//! - `bind` writes only the fields whose shown value differs, with each
//!   control's change signal blocked, so a programmatic write is never
//!   reported as an edit.
//! - A user edit is validated where it happens. Text that does not parse is
//!   reverted in the control and goes no further.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_roster::model::{FieldId, Record};
//! use horizon_roster::view::{ItemBinding, RowBinding};
//!
//! let binding = ItemBinding::headless();
//! binding.rebind_index(3);
//! binding.bind(&Record::new("Ada", "Lovelace", 20, true));
//!
//! let edits = Arc::new(Mutex::new(Vec::new()));
//! let sink = edits.clone();
//! binding.field_edited().connect(move |edit| sink.lock().push(edit.clone()));
//!
//! binding.controls().age.set_text("21");
//! let edit = edits.lock()[0].clone();
//! assert_eq!((edit.index, edit.field, edit.value.as_str()), (3, FieldId::Age, "21"));
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use horizon_roster_core::{logging::targets, ConnectionGuard, Property, Signal};
use parking_lot::{Mutex, RwLock};

use super::controls::{FieldControls, TextInput};
use crate::error::Result;
use crate::model::{FieldId, Record};
use crate::observe::{noop_observer, SyncEvent, SyncObserver};

/// A user edit of one text field, tagged with the row it happened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEdit {
    /// The row the binding was showing when the edit happened.
    pub index: usize,
    /// The edited field.
    pub field: FieldId,
    /// The raw control text.
    pub value: String,
}

/// Actions a row's controls can request besides typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    AddMembership,
    RemoveMembership,
    Delete,
}

/// A control action tagged with the row it happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    pub index: usize,
    pub action: ControlAction,
}

/// Receives text edits from row bindings.
pub trait FieldEditedListener: Send + Sync {
    /// A user changed `field` on row `index` to `raw_value`.
    fn on_field_edited(&self, index: usize, field: FieldId, raw_value: &str);
}

/// Receives control actions from row bindings.
pub trait ControlActionListener: Send + Sync {
    fn on_add_membership(&self, index: usize);
    fn on_remove_membership(&self, index: usize);
    fn on_delete(&self, index: usize);
}

/// The contract a recycling adapter needs from its per-row binding type.
pub trait RowBinding: Send + Sync + 'static {
    /// Show `record`. Must not report the write as a user edit, and must not
    /// discard uncommitted edits to fields `record` leaves unchanged.
    fn bind(&self, record: &Record);

    /// The record most recently passed to [`bind`](Self::bind).
    fn bound_record(&self) -> Record;

    /// The row this binding tags its upward events with.
    fn bound_index(&self) -> usize;

    /// Repoint the binding at another row. Pair with `bind` when the record
    /// at the new row differs.
    fn rebind_index(&self, index: usize);

    /// Read the controls back into a record.
    fn collect_edits(&self) -> Result<Record>;

    /// Whether user edits should be accepted.
    fn set_editable(&self, _editable: bool) {}

    /// Drop any uncommitted edit and show the bound record again.
    fn cancel_edit(&self) {}

    /// Install the observability hook.
    fn set_observer(&self, _observer: SyncObserver) {}
}

struct BindingShared {
    controls: FieldControls,
    index: AtomicUsize,
    editable: AtomicBool,
    bound: Property<Record>,
    pending: Mutex<Option<Record>>,
    field_edited: Signal<FieldEdit>,
    control_action: Signal<ControlEvent>,
    edit_rejected: Signal<FieldEdit>,
    observer: RwLock<SyncObserver>,
}

impl BindingShared {
    /// The value user edits are validated against.
    fn edit_base(&self) -> Record {
        self.pending
            .lock()
            .clone()
            .unwrap_or_else(|| self.bound.get())
    }

    /// Write the fields in which `record` differs from `previous`.
    /// Returns how many controls were written.
    fn push_changed(&self, previous: &Record, record: &Record) -> usize {
        let mut written = 0;
        for field in FieldId::ALL {
            if previous.field(field) != record.field(field) {
                self.write_text(field, record);
                written += 1;
            }
        }
        if previous.is_member() != record.is_member() {
            self.write_member(record.is_member());
            written += 1;
        }
        written
    }

    /// Write every field of `record`, whatever the controls show.
    fn push_all(&self, record: &Record) {
        for field in FieldId::ALL {
            self.write_text(field, record);
        }
        self.write_member(record.is_member());
    }

    fn write_text(&self, field: FieldId, record: &Record) {
        let control = self.controls.text(field);
        let _block = control.text_changed().block_scoped();
        control.set_text(&record.field_text(field));
    }

    fn write_member(&self, checked: bool) {
        let member = &self.controls.member;
        let _block = member.toggled().block_scoped();
        member.set_checked(checked);
    }

    fn on_text_edited(&self, field: FieldId, text: &str) {
        let index = self.index.load(Ordering::SeqCst);
        let base = self.edit_base();

        if !self.editable.load(Ordering::SeqCst) {
            tracing::debug!(target: targets::BINDING, index, %field, "row is read-only, reverting edit");
            self.write_text(field, &base);
            return;
        }

        let edit = FieldEdit {
            index,
            field,
            value: text.to_string(),
        };
        match base.with_raw_field(field, text) {
            Ok(candidate) => {
                self.set_pending(candidate);
                tracing::trace!(target: targets::BINDING, index, %field, "forwarding edit");
                self.field_edited.emit(edit);
            }
            Err(error) => {
                tracing::debug!(target: targets::BINDING, index, %field, %error, "rejected edit");
                self.write_text(field, &base);
                self.observe(SyncEvent::EditRejected { index, field });
                self.edit_rejected.emit(edit);
            }
        }
    }

    fn on_member_toggled(&self, checked: bool) {
        let index = self.index.load(Ordering::SeqCst);
        let base = self.edit_base();

        if !self.editable.load(Ordering::SeqCst) {
            self.write_member(base.is_member());
            return;
        }

        self.set_pending(base.with_membership(checked));
        let action = if checked {
            ControlAction::AddMembership
        } else {
            ControlAction::RemoveMembership
        };
        self.control_action.emit(ControlEvent { index, action });
    }

    /// An edit that matches the bound record leaves nothing pending.
    fn set_pending(&self, candidate: Record) {
        let bound = self.bound.get();
        *self.pending.lock() = (candidate != bound).then_some(candidate);
    }

    /// Fold a change of the bound record into the user's uncommitted edit.
    /// Fields the change touched take the incoming value.
    fn merge_into_pending(&self, previous: &Record, record: &Record) {
        let mut pending = self.pending.lock();
        let Some(edit) = pending.take() else {
            return;
        };
        let mut merged = FieldId::ALL.into_iter().fold(edit, |merged, field| {
            let incoming = record.field(field);
            if previous.field(field) != incoming {
                merged.with_field(incoming)
            } else {
                merged
            }
        });
        if previous.is_member() != record.is_member() {
            merged = merged.with_membership(record.is_member());
        }
        if merged != *record {
            *pending = Some(merged);
        }
    }

    fn observe(&self, event: SyncEvent) {
        let observer = self.observer.read().clone();
        observer.observe(&event);
    }
}

/// The standard [`RowBinding`], driving a [`FieldControls`] set.
///
/// A binding starts out editable, showing `Record::default()` at row 0.
pub struct ItemBinding {
    shared: Arc<BindingShared>,
    _text_connections: Vec<ConnectionGuard<String>>,
    _toggle_connection: ConnectionGuard<bool>,
}

impl ItemBinding {
    /// Create a binding driving `controls`.
    pub fn new(controls: FieldControls) -> Self {
        let shared = Arc::new(BindingShared {
            controls,
            index: AtomicUsize::new(0),
            editable: AtomicBool::new(true),
            bound: Property::new(Record::default()),
            pending: Mutex::new(None),
            field_edited: Signal::new(),
            control_action: Signal::new(),
            edit_rejected: Signal::new(),
            observer: RwLock::new(noop_observer()),
        });
        shared.push_all(&Record::default());

        let text_connections = FieldId::ALL
            .into_iter()
            .map(|field| {
                let weak: Weak<BindingShared> = Arc::downgrade(&shared);
                shared
                    .controls
                    .text(field)
                    .text_changed()
                    .connect_scoped(move |text| {
                        if let Some(shared) = weak.upgrade() {
                            shared.on_text_edited(field, text);
                        }
                    })
            })
            .collect();

        let weak = Arc::downgrade(&shared);
        let toggle_connection = shared.controls.member.toggled().connect_scoped(move |checked| {
            if let Some(shared) = weak.upgrade() {
                shared.on_member_toggled(*checked);
            }
        });

        Self {
            shared,
            _text_connections: text_connections,
            _toggle_connection: toggle_connection,
        }
    }

    /// Create a binding over fresh headless controls.
    pub fn headless() -> Self {
        Self::new(FieldControls::headless())
    }

    /// The controls this binding drives.
    pub fn controls(&self) -> &FieldControls {
        &self.shared.controls
    }

    /// Emitted for every accepted user edit.
    pub fn field_edited(&self) -> &Signal<FieldEdit> {
        &self.shared.field_edited
    }

    /// Emitted for every control action.
    pub fn control_action(&self) -> &Signal<ControlEvent> {
        &self.shared.control_action
    }

    /// Emitted when a user edit failed validation and was reverted.
    pub fn edit_rejected(&self) -> &Signal<FieldEdit> {
        &self.shared.edit_rejected
    }

    /// The edited but not yet acknowledged record, if the user has typed
    /// something the bound record does not hold yet.
    pub fn pending_edit(&self) -> Option<Record> {
        self.shared.pending.lock().clone()
    }

    /// Whether user edits are currently accepted.
    pub fn is_editable(&self) -> bool {
        self.shared.editable.load(Ordering::SeqCst)
    }

    /// Forward a control action upward, tagged with the current row.
    pub fn on_control_action(&self, action: ControlAction) {
        let index = self.bound_index();
        tracing::trace!(target: targets::BINDING, index, ?action, "control action");
        self.shared.control_action.emit(ControlEvent { index, action });
    }

    /// Route this binding's edits and actions to `listener`.
    ///
    /// The connections live as long as the binding.
    pub fn attach<L>(&self, listener: Arc<L>)
    where
        L: FieldEditedListener + ControlActionListener + ?Sized + 'static,
    {
        let edits = listener.clone();
        self.shared
            .field_edited
            .connect(move |edit| edits.on_field_edited(edit.index, edit.field, &edit.value));
        self.shared.control_action.connect(move |event| match event.action {
            ControlAction::AddMembership => listener.on_add_membership(event.index),
            ControlAction::RemoveMembership => listener.on_remove_membership(event.index),
            ControlAction::Delete => listener.on_delete(event.index),
        });
    }
}

impl RowBinding for ItemBinding {
    fn bind(&self, record: &Record) {
        let previous = self.shared.bound.get();
        let written = self.shared.push_changed(&previous, record);
        self.shared.bound.set(record.clone());
        self.shared.merge_into_pending(&previous, record);
        tracing::trace!(
            target: targets::BINDING,
            index = self.bound_index(),
            written,
            "bound record"
        );
    }

    fn bound_record(&self) -> Record {
        self.shared.bound.get()
    }

    fn bound_index(&self) -> usize {
        self.shared.index.load(Ordering::SeqCst)
    }

    fn rebind_index(&self, index: usize) {
        let previous = self.shared.index.swap(index, Ordering::SeqCst);
        if previous != index {
            tracing::trace!(target: targets::BINDING, from = previous, to = index, "rebound index");
        }
    }

    fn collect_edits(&self) -> Result<Record> {
        let controls = &self.shared.controls;
        FieldId::ALL.into_iter().try_fold(
            Record::default().with_membership(controls.member.is_checked()),
            |record, field| record.with_raw_field(field, &controls.text(field).text()),
        )
    }

    fn set_editable(&self, editable: bool) {
        self.shared.editable.store(editable, Ordering::SeqCst);
    }

    fn cancel_edit(&self) {
        *self.shared.pending.lock() = None;
        let bound = self.shared.bound.get();
        self.shared.push_all(&bound);
    }

    fn set_observer(&self, observer: SyncObserver) {
        *self.shared.observer.write() = observer;
    }
}

impl Default for ItemBinding {
    fn default() -> Self {
        Self::headless()
    }
}

impl std::fmt::Debug for ItemBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemBinding")
            .field("index", &self.bound_index())
            .field("bound", &self.shared.bound.get())
            .field("pending", &self.pending_edit())
            .field("editable", &self.is_editable())
            .finish()
    }
}

static_assertions::assert_impl_all!(ItemBinding: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::controls::{CheckBox, TextField};
    use horizon_roster_core::RecordingObserver;

    /// Counts programmatic writes so tests can see which fields `bind` touched.
    #[derive(Default)]
    struct CountingField {
        inner: TextField,
        writes: AtomicUsize,
    }

    impl TextInput for CountingField {
        fn text(&self) -> String {
            self.inner.text()
        }

        fn set_text(&self, text: &str) {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set_text(text);
        }

        fn text_changed(&self) -> &Signal<String> {
            self.inner.text_changed()
        }
    }

    fn counting_binding() -> (ItemBinding, [Arc<CountingField>; 3]) {
        let fields = [
            Arc::new(CountingField::default()),
            Arc::new(CountingField::default()),
            Arc::new(CountingField::default()),
        ];
        let controls = FieldControls {
            first_name: fields[0].clone(),
            last_name: fields[1].clone(),
            age: fields[2].clone(),
            member: Arc::new(CheckBox::new()),
        };
        (ItemBinding::new(controls), fields)
    }

    fn record_edits(binding: &ItemBinding) -> Arc<Mutex<Vec<FieldEdit>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        binding.field_edited().connect(move |edit| sink.lock().push(edit.clone()));
        seen
    }

    #[test]
    fn test_bind_then_collect_round_trips() {
        let binding = ItemBinding::headless();
        for record in [
            Record::new("Ivy", "Brown", 22, true),
            Record::default(),
            Record::new("Tim", "Berners-Lee", 25, false),
        ] {
            binding.bind(&record);
            assert_eq!(binding.collect_edits().unwrap(), record);
        }
    }

    #[test]
    fn test_bind_writes_only_differing_fields() {
        let (binding, fields) = counting_binding();
        binding.bind(&Record::new("Ivy", "Brown", 22, true));
        let after_first: Vec<usize> = fields.iter().map(|f| f.writes.load(Ordering::SeqCst)).collect();

        binding.bind(&Record::new("Ivy", "Brown", 23, true));

        let deltas: Vec<usize> = fields
            .iter()
            .zip(after_first)
            .map(|(f, before)| f.writes.load(Ordering::SeqCst) - before)
            .collect();
        assert_eq!(deltas, vec![0, 0, 1]);
    }

    #[test]
    fn test_bind_is_not_reported_as_edit() {
        let binding = ItemBinding::headless();
        let edits = record_edits(&binding);
        let actions = Arc::new(Mutex::new(Vec::new()));
        let sink = actions.clone();
        binding.control_action().connect(move |e| sink.lock().push(*e));

        binding.bind(&Record::new("Ivy", "Brown", 22, true));
        binding.bind(&Record::new("Tim", "Berners-Lee", 25, false));

        assert!(edits.lock().is_empty());
        assert!(actions.lock().is_empty());
        assert!(!binding.controls().first_name.text_changed().is_blocked());
    }

    #[test]
    fn test_user_edit_is_forwarded_with_index() {
        let binding = ItemBinding::headless();
        binding.rebind_index(4);
        binding.bind(&Record::new("Ivy", "Brown", 22, true));
        let edits = record_edits(&binding);

        binding.controls().first_name.set_text("Ivana");

        assert_eq!(
            *edits.lock(),
            vec![FieldEdit { index: 4, field: FieldId::FirstName, value: "Ivana".into() }]
        );
        assert_eq!(
            binding.pending_edit(),
            Some(Record::new("Ivana", "Brown", 22, true))
        );
        // The bound record only changes when the store says so.
        assert_eq!(binding.bound_record().first_name(), "Ivy");
    }

    #[test]
    fn test_invalid_age_is_reverted_silently() {
        let binding = ItemBinding::headless();
        binding.bind(&Record::new("Ivy", "Brown", 22, true));
        let edits = record_edits(&binding);
        let rejected = Arc::new(Mutex::new(Vec::new()));
        let sink = rejected.clone();
        binding.edit_rejected().connect(move |e| sink.lock().push(e.value.clone()));
        let recorder = Arc::new(RecordingObserver::<SyncEvent>::new());
        binding.set_observer(recorder.clone());

        binding.controls().age.set_text("22x");

        assert!(edits.lock().is_empty());
        assert_eq!(*rejected.lock(), vec!["22x".to_string()]);
        assert_eq!(binding.controls().age.text(), "22");
        assert_eq!(
            recorder.events(),
            vec![SyncEvent::EditRejected { index: 0, field: FieldId::Age }]
        );
    }

    #[test]
    fn test_rejected_edit_reverts_to_pending_value() {
        let binding = ItemBinding::headless();
        binding.bind(&Record::new("Ivy", "Brown", 22, true));

        binding.controls().age.set_text("30");
        binding.controls().age.set_text("-1");

        assert_eq!(binding.controls().age.text(), "30");
        assert_eq!(binding.collect_edits().unwrap().age(), 30);
    }

    #[test]
    fn test_membership_toggle_emits_action() {
        let binding = ItemBinding::headless();
        binding.rebind_index(2);
        binding.bind(&Record::new("Tim", "Berners-Lee", 25, false));
        let actions = Arc::new(Mutex::new(Vec::new()));
        let sink = actions.clone();
        binding.control_action().connect(move |e| sink.lock().push(*e));

        binding.controls().member.set_checked(true);
        binding.on_control_action(ControlAction::Delete);

        assert_eq!(
            *actions.lock(),
            vec![
                ControlEvent { index: 2, action: ControlAction::AddMembership },
                ControlEvent { index: 2, action: ControlAction::Delete },
            ]
        );
    }

    #[test]
    fn test_read_only_binding_reverts_edits() {
        let binding = ItemBinding::headless();
        binding.bind(&Record::new("Ivy", "Brown", 22, true));
        binding.set_editable(false);
        let edits = record_edits(&binding);

        binding.controls().last_name.set_text("Green");
        binding.controls().member.set_checked(false);

        assert!(edits.lock().is_empty());
        assert_eq!(binding.controls().last_name.text(), "Brown");
        assert!(binding.controls().member.is_checked());
    }

    #[test]
    fn test_bind_merges_into_pending_edit() {
        let (binding, fields) = counting_binding();
        binding.bind(&Record::new("Ivy", "Brown", 22, true));
        binding.controls().first_name.set_text("Ivana");
        let first_name_writes = fields[0].writes.load(Ordering::SeqCst);

        binding.bind(&Record::new("Ivy", "Brown", 23, true));

        assert_eq!(fields[0].writes.load(Ordering::SeqCst), first_name_writes);
        assert_eq!(binding.controls().first_name.text(), "Ivana");
        assert_eq!(binding.controls().age.text(), "23");
        assert_eq!(
            binding.pending_edit(),
            Some(Record::new("Ivana", "Brown", 23, true))
        );

        // Once the store holds the edit, nothing is pending any more.
        binding.bind(&Record::new("Ivana", "Brown", 23, true));
        assert_eq!(binding.pending_edit(), None);
        assert_eq!(
            binding.collect_edits().unwrap(),
            Record::new("Ivana", "Brown", 23, true)
        );
    }

    #[test]
    fn test_typing_the_bound_value_leaves_nothing_pending() {
        let binding = ItemBinding::headless();
        binding.bind(&Record::new("Ivy", "Brown", 22, true));

        binding.controls().age.set_text("23");
        binding.controls().age.set_text("22");

        assert_eq!(binding.pending_edit(), None);
    }

    #[test]
    fn test_cancel_edit_restores_bound_record() {
        let binding = ItemBinding::headless();
        let ivy = Record::new("Ivy", "Brown", 22, true);
        binding.bind(&ivy);
        binding.controls().first_name.set_text("Ivana");

        binding.cancel_edit();

        assert_eq!(binding.pending_edit(), None);
        assert_eq!(binding.collect_edits().unwrap(), ivy);
    }

    #[test]
    fn test_attach_routes_to_listener() {
        #[derive(Default)]
        struct Log(Mutex<Vec<String>>);

        impl FieldEditedListener for Log {
            fn on_field_edited(&self, index: usize, field: FieldId, raw_value: &str) {
                self.0.lock().push(format!("edit {index} {field} {raw_value}"));
            }
        }

        impl ControlActionListener for Log {
            fn on_add_membership(&self, index: usize) {
                self.0.lock().push(format!("add {index}"));
            }
            fn on_remove_membership(&self, index: usize) {
                self.0.lock().push(format!("remove {index}"));
            }
            fn on_delete(&self, index: usize) {
                self.0.lock().push(format!("delete {index}"));
            }
        }

        let log = Arc::new(Log::default());
        let binding = ItemBinding::headless();
        binding.attach(log.clone());
        binding.rebind_index(1);
        binding.bind(&Record::new("Ada", "Lovelace", 20, true));

        binding.controls().last_name.set_text("King");
        binding.controls().member.set_checked(false);
        binding.on_control_action(ControlAction::Delete);

        assert_eq!(
            *log.0.lock(),
            vec!["edit 1 LAST_NAME King", "remove 1", "delete 1"]
        );
    }
}
