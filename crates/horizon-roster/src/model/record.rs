//! The immutable record value held by the store.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::field::{FieldId, FieldValue};
use crate::error::Result;

/// One person in the roster.
///
/// Records are values: every change produces a new `Record` and equality is
/// structural over all four fields. Structural equality is what lets the
/// store skip no-op edits.
///
/// # Example
///
/// ```
/// use horizon_roster::model::{FieldId, Record};
///
/// let ivy = Record::new("Ivy", "Brown", 22, true);
/// let older = ivy.with_raw_field(FieldId::Age, "23").unwrap();
///
/// assert_eq!(older.age(), 23);
/// assert_eq!(older.first_name(), "Ivy");
/// assert_ne!(ivy, older);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    first_name: String,
    last_name: String,
    age: u32,
    is_member: bool,
}

impl Record {
    /// Creates a record from its four fields.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        age: u32,
        is_member: bool,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            age,
            is_member,
        }
    }

    /// Starts a builder with the default field values.
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The first name.
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// The last name.
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// The age in whole years.
    pub fn age(&self) -> u32 {
        self.age
    }

    /// Whether the person is a member.
    pub fn is_member(&self) -> bool {
        self.is_member
    }

    /// The typed value of a text field.
    pub fn field(&self, field: FieldId) -> FieldValue {
        match field {
            FieldId::FirstName => FieldValue::FirstName(self.first_name.clone()),
            FieldId::LastName => FieldValue::LastName(self.last_name.clone()),
            FieldId::Age => FieldValue::Age(self.age),
        }
    }

    /// The text a control shows for a field.
    pub fn field_text(&self, field: FieldId) -> String {
        self.field(field).to_string()
    }

    /// Returns a copy with one field replaced.
    pub fn with_field(&self, value: FieldValue) -> Self {
        let mut next = self.clone();
        match value {
            FieldValue::FirstName(first_name) => next.first_name = first_name,
            FieldValue::LastName(last_name) => next.last_name = last_name,
            FieldValue::Age(age) => next.age = age,
        }
        next
    }

    /// Parses `raw` for `field` and returns a copy with that field replaced.
    pub fn with_raw_field(&self, field: FieldId, raw: &str) -> Result<Self> {
        field.parse(raw).map(|value| self.with_field(value))
    }

    /// Returns a copy with the membership flag replaced.
    pub fn with_membership(&self, is_member: bool) -> Self {
        Self {
            is_member,
            ..self.clone()
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}){}",
            self.first_name,
            self.last_name,
            self.age,
            if self.is_member { " [member]" } else { "" }
        )
    }
}

/// Builder for [`Record`]. Unset fields default to `""`, `""`, `0`, `false`.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    /// Starts from the values of an existing record.
    pub fn based_on(mut self, record: &Record) -> Self {
        self.record = record.clone();
        self
    }

    /// Sets the first name.
    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.record.first_name = first_name.into();
        self
    }

    /// Sets the last name.
    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.record.last_name = last_name.into();
        self
    }

    /// Sets the age.
    pub fn age(mut self, age: u32) -> Self {
        self.record.age = age;
        self
    }

    /// Sets the membership flag.
    pub fn member(mut self, is_member: bool) -> Self {
        self.record.is_member = is_member;
        self
    }

    /// Finishes the record.
    pub fn build(self) -> Record {
        self.record
    }
}
