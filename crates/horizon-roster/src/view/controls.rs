//! Field input controls a row binding drives.
//!
//! A host toolkit plugs its own widgets in by implementing [`TextInput`] and
//! [`CheckInput`]. [`TextField`] and [`CheckBox`] are headless
//! implementations used when no toolkit is attached, and in tests.
//!
//! Controls report every content change through their change signal, no
//! matter whether the change came from a user or from code. Bindings tell
//! the two apart by blocking the signal around their own writes.

use std::sync::Arc;

use horizon_roster_core::{Property, Signal};

use crate::error::Result;
use crate::model::FieldId;

/// A single-line text control.
pub trait TextInput: Send + Sync {
    /// The text currently shown.
    fn text(&self) -> String;

    /// Replace the shown text. Emits [`text_changed`](Self::text_changed)
    /// if the text actually changed.
    fn set_text(&self, text: &str);

    /// Emitted with the new text whenever the content changes.
    fn text_changed(&self) -> &Signal<String>;
}

/// A boolean control.
pub trait CheckInput: Send + Sync {
    /// Whether the control is checked.
    fn is_checked(&self) -> bool;

    /// Set the checked state. Emits [`toggled`](Self::toggled) if it changed.
    fn set_checked(&self, checked: bool);

    /// Emitted with the new state whenever it changes.
    fn toggled(&self) -> &Signal<bool>;
}

/// A headless [`TextInput`].
#[derive(Default)]
pub struct TextField {
    text: Property<String>,
    text_changed: Signal<String>,
}

impl TextField {
    /// Create an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a field showing `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Property::new(text.into()),
            text_changed: Signal::new(),
        }
    }

    /// Clear all text.
    pub fn clear(&self) {
        self.set_text("");
    }
}

impl TextInput for TextField {
    fn text(&self) -> String {
        self.text.get()
    }

    fn set_text(&self, text: &str) {
        if self.text.set(text.to_string()) {
            self.text_changed.emit(text.to_string());
        }
    }

    fn text_changed(&self) -> &Signal<String> {
        &self.text_changed
    }
}

impl std::fmt::Debug for TextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextField").field("text", &self.text.get()).finish()
    }
}

/// A headless [`CheckInput`].
#[derive(Default)]
pub struct CheckBox {
    checked: Property<bool>,
    toggled: Signal<bool>,
}

impl CheckBox {
    /// Create an unchecked box.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the checked state.
    pub fn toggle(&self) {
        self.set_checked(!self.is_checked());
    }
}

impl CheckInput for CheckBox {
    fn is_checked(&self) -> bool {
        self.checked.get()
    }

    fn set_checked(&self, checked: bool) {
        if self.checked.set(checked) {
            self.toggled.emit(checked);
        }
    }

    fn toggled(&self) -> &Signal<bool> {
        &self.toggled
    }
}

impl std::fmt::Debug for CheckBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckBox").field("checked", &self.checked.get()).finish()
    }
}

/// The set of controls making up one row's editor.
#[derive(Clone)]
pub struct FieldControls {
    pub first_name: Arc<dyn TextInput>,
    pub last_name: Arc<dyn TextInput>,
    pub age: Arc<dyn TextInput>,
    pub member: Arc<dyn CheckInput>,
}

impl FieldControls {
    /// Controls backed by [`TextField`] and [`CheckBox`].
    pub fn headless() -> Self {
        Self {
            first_name: Arc::new(TextField::new()),
            last_name: Arc::new(TextField::new()),
            age: Arc::new(TextField::new()),
            member: Arc::new(CheckBox::new()),
        }
    }

    /// The text control editing `field`.
    pub fn text(&self, field: FieldId) -> &Arc<dyn TextInput> {
        match field {
            FieldId::FirstName => &self.first_name,
            FieldId::LastName => &self.last_name,
            FieldId::Age => &self.age,
        }
    }

    /// Look a text control up by the name its widget carries.
    pub fn by_widget_name(&self, name: &str) -> Result<&Arc<dyn TextInput>> {
        let field: FieldId = name.parse()?;
        Ok(self.text(field))
    }
}

impl Default for FieldControls {
    fn default() -> Self {
        Self::headless()
    }
}

impl std::fmt::Debug for FieldControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldControls")
            .field("first_name", &self.first_name.text())
            .field("last_name", &self.last_name.text())
            .field("age", &self.age.text())
            .field("member", &self.member.is_checked())
            .finish()
    }
}

static_assertions::assert_impl_all!(TextField: Send, Sync);
static_assertions::assert_impl_all!(FieldControls: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use parking_lot::Mutex;

    #[test]
    fn test_text_field_emits_only_on_change() {
        let field = TextField::with_text("Ivy");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        field.text_changed().connect(move |t| sink.lock().push(t.clone()));

        field.set_text("Ivy");
        field.set_text("Ivana");
        field.clear();

        assert_eq!(*seen.lock(), vec!["Ivana".to_string(), String::new()]);
    }

    #[test]
    fn test_check_box_toggle() {
        let check = CheckBox::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        check.toggled().connect(move |c| sink.lock().push(*c));

        check.toggle();
        check.set_checked(true);
        check.toggle();

        assert_eq!(*seen.lock(), vec![true, false]);
    }

    #[test]
    fn test_lookup_by_widget_name() {
        let controls = FieldControls::headless();
        controls.age.set_text("42");

        assert_eq!(controls.by_widget_name("AGE").unwrap().text(), "42");
        assert!(matches!(
            controls.by_widget_name("SHOE_SIZE"),
            Err(Error::UnknownField(name)) if name == "SHOE_SIZE"
        ));
    }
}
