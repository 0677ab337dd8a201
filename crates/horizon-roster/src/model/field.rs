//! Field identities and typed field values.
//!
//! Fields are a closed set. String names only appear at the outermost
//! widget-naming layer, where [`FieldId::from_str`](std::str::FromStr) maps
//! them back onto the enum.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The editable text fields of a [`Record`](super::Record).
///
/// Membership is not listed: it is a boolean control driven by control
/// actions rather than typed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    /// The record's first name.
    FirstName,
    /// The record's last name.
    LastName,
    /// The record's age in whole years.
    Age,
}

impl FieldId {
    /// Every text field, in form order.
    pub const ALL: [FieldId; 3] = [FieldId::FirstName, FieldId::LastName, FieldId::Age];

    /// The name a widget carries to identify which field it edits.
    pub fn widget_name(self) -> &'static str {
        match self {
            Self::FirstName => "FIRST_NAME",
            Self::LastName => "LAST_NAME",
            Self::Age => "AGE",
        }
    }

    /// A human readable label for forms.
    pub fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Age => "Age",
        }
    }

    /// Parse raw control text into this field's typed value.
    ///
    /// Name fields accept any text. An empty age is read as 0; any other
    /// age text must be a non-negative integer.
    pub fn parse(self, raw: &str) -> Result<FieldValue> {
        match self {
            Self::FirstName => Ok(FieldValue::FirstName(raw.to_string())),
            Self::LastName => Ok(FieldValue::LastName(raw.to_string())),
            Self::Age => parse_age(raw).map(FieldValue::Age),
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.widget_name())
    }
}

impl FromStr for FieldId {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.widget_name() == name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }
}

fn parse_age(raw: &str) -> Result<u32> {
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>()
        .map_err(|_| Error::invalid_field_value(FieldId::Age, raw))
}

/// A typed value for one field. The variant carries the field identity, so
/// a value can never be applied to the wrong field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldValue {
    /// A first name.
    FirstName(String),
    /// A last name.
    LastName(String),
    /// An age.
    Age(u32),
}

impl FieldValue {
    /// The field this value belongs to.
    pub fn field(&self) -> FieldId {
        match self {
            Self::FirstName(_) => FieldId::FirstName,
            Self::LastName(_) => FieldId::LastName,
            Self::Age(_) => FieldId::Age,
        }
    }
}

/// Renders the value the way a text control displays it.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstName(text) | Self::LastName(text) => f.write_str(text),
            Self::Age(age) => write!(f, "{age}"),
        }
    }
}
