//! Field registry: declared field types and their comparators.
//!
//! A [`Schema`] is the table a screen supplies to describe its records: which
//! field names exist, whether each is numeric, a date or text, and which
//! fields take part in free-text search and named filters. The pipeline reads
//! fields through [`Record::get`] and orders them with [`FieldType::compare`].
//!
//! Schemas are plain data and deserialize from JSON, so a screen can ship its
//! table as configuration:
//!
//! ```
//! use farmbook_query::{FieldType, Schema};
//!
//! let schema: Schema = serde_json::from_str(r#"{
//!     "name": "egg-collection",
//!     "fields": {
//!         "date": { "type": "date" },
//!         "description": { "type": "text", "searchable": true },
//!         "quantity": { "type": "numeric" },
//!         "house": { "type": "text", "searchable": true, "filterable": true }
//!     }
//! }"#).unwrap();
//!
//! assert_eq!(schema.field_type("house").unwrap(), FieldType::Text);
//! assert!(schema.is_filterable("house"));
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use farmbook_core::{FieldValue, Record};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// The declared type of a field, which decides how it is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Currency-like number. Absent or unreadable values compare as zero.
    Numeric,
    /// Calendar date. Absent or unreadable values sort before every date.
    Date,
    /// Case-insensitive text in code-point order. Absent compares as `""`.
    Text,
}

impl FieldType {
    /// Compare two raw values of this type.
    ///
    /// This is a total order for every type: values are coerced first, and
    /// anything that fails to coerce collapses onto the type's absent value.
    #[must_use]
    pub fn compare(self, a: Option<&FieldValue<'_>>, b: Option<&FieldValue<'_>>) -> Ordering {
        match self {
            Self::Numeric => numeric_key(a).cmp(&numeric_key(b)),
            Self::Date => date_key(a).cmp(&date_key(b)),
            Self::Text => compare_text(&text_key(a), &text_key(b)),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Numeric => "numeric",
            Self::Date => "date",
            Self::Text => "text",
        })
    }
}

fn numeric_key(value: Option<&FieldValue<'_>>) -> Decimal {
    value
        .and_then(FieldValue::to_number)
        .unwrap_or(Decimal::ZERO)
}

fn date_key(value: Option<&FieldValue<'_>>) -> Option<NaiveDate> {
    value.and_then(FieldValue::to_date)
}

fn text_key<'v>(value: Option<&'v FieldValue<'_>>) -> Cow<'v, str> {
    value.map_or(Cow::Borrowed(""), FieldValue::as_text)
}

/// Case-insensitive comparison in code-point order.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Declaration of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// How the field compares.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether free-text search looks at this field.
    #[serde(default)]
    pub searchable: bool,
    /// Whether the field can be used as a named filter dimension.
    #[serde(default)]
    pub filterable: bool,
}

impl FieldDef {
    /// Declare a field of the given type, neither searchable nor filterable.
    #[must_use]
    pub const fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            searchable: false,
            filterable: false,
        }
    }

    /// Include the field in free-text search.
    #[must_use]
    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Allow the field as a named filter dimension.
    #[must_use]
    pub const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }
}

/// A named registry of field declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema name, e.g. `general-ledger`.
    pub name: String,
    /// Field declarations keyed by field name.
    pub fields: BTreeMap<String, FieldDef>,
}

impl Schema {
    /// Names accepted by [`Schema::preset`].
    pub const PRESETS: &'static [&'static str] = &[
        "general-ledger",
        "purchase-ledger",
        "sales",
        "feeding",
        "inventory",
    ];

    /// Create an empty schema.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Declare a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    /// Look up a field declaration.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// The declared type of a field.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnsupportedFieldType`] if the field is not declared.
    pub fn field_type(&self, name: &str) -> Result<FieldType, QueryError> {
        self.field(name)
            .map(|def| def.field_type)
            .ok_or_else(|| QueryError::UnsupportedFieldType(name.to_string()))
    }

    /// Compare two records on one field using its declared type.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnsupportedFieldType`] if the field is not declared.
    pub fn compare(&self, field: &str, a: &Record, b: &Record) -> Result<Ordering, QueryError> {
        let field_type = self.field_type(field)?;
        Ok(field_type.compare(a.get(field).as_ref(), b.get(field).as_ref()))
    }

    /// Fields included in free-text search.
    pub fn search_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.searchable)
            .map(|(name, _)| name.as_str())
    }

    /// Whether a field may be used as a named filter dimension.
    pub fn is_filterable(&self, name: &str) -> bool {
        self.field(name).is_some_and(|def| def.filterable)
    }

    /// Look up a built-in schema by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "general-ledger" => Some(Self::general_ledger()),
            "purchase-ledger" => Some(Self::purchase_ledger()),
            "sales" => Some(Self::sales()),
            "feeding" => Some(Self::feeding()),
            "inventory" => Some(Self::inventory()),
            _ => None,
        }
    }

    /// Journal lines: one debit or credit leg per record.
    pub fn general_ledger() -> Self {
        Self::new("general-ledger")
            .with_field("id", FieldDef::new(FieldType::Text))
            .with_field("date", FieldDef::new(FieldType::Date))
            .with_field(
                "reference",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "account",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field("category", FieldDef::new(FieldType::Text).filterable())
            .with_field("description", FieldDef::new(FieldType::Text).searchable())
            .with_field("debit", FieldDef::new(FieldType::Numeric))
            .with_field("credit", FieldDef::new(FieldType::Numeric))
    }

    /// Purchases on account, posted as ledger legs against suppliers.
    pub fn purchase_ledger() -> Self {
        Self::new("purchase-ledger")
            .with_field("id", FieldDef::new(FieldType::Text))
            .with_field("date", FieldDef::new(FieldType::Date))
            .with_field(
                "reference",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "supplier",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "account",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field("category", FieldDef::new(FieldType::Text).filterable())
            .with_field("description", FieldDef::new(FieldType::Text).searchable())
            .with_field("status", FieldDef::new(FieldType::Text).filterable())
            .with_field("dueDate", FieldDef::new(FieldType::Date))
            .with_field("debit", FieldDef::new(FieldType::Numeric))
            .with_field("credit", FieldDef::new(FieldType::Numeric))
            .with_field("quantity", FieldDef::new(FieldType::Numeric))
            .with_field("unitPrice", FieldDef::new(FieldType::Numeric))
    }

    /// Sales observations: product, buyer, quantity and price.
    pub fn sales() -> Self {
        Self::new("sales")
            .with_field("id", FieldDef::new(FieldType::Text))
            .with_field("date", FieldDef::new(FieldType::Date))
            .with_field(
                "category",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "buyer",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field("description", FieldDef::new(FieldType::Text).searchable())
            .with_field("status", FieldDef::new(FieldType::Text).filterable())
            .with_field("quantity", FieldDef::new(FieldType::Numeric))
            .with_field("unitPrice", FieldDef::new(FieldType::Numeric))
            .with_field("amount", FieldDef::new(FieldType::Numeric))
    }

    /// Feeding observations: feed type, animal group and cost.
    pub fn feeding() -> Self {
        Self::new("feeding")
            .with_field("id", FieldDef::new(FieldType::Text))
            .with_field("date", FieldDef::new(FieldType::Date))
            .with_field(
                "category",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "animalGroup",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "supplier",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field("description", FieldDef::new(FieldType::Text).searchable())
            .with_field("quantity", FieldDef::new(FieldType::Numeric))
            .with_field("unitPrice", FieldDef::new(FieldType::Numeric))
            .with_field("amount", FieldDef::new(FieldType::Numeric))
    }

    /// Stock movements: item category, location and stock value.
    pub fn inventory() -> Self {
        Self::new("inventory")
            .with_field("id", FieldDef::new(FieldType::Text))
            .with_field("date", FieldDef::new(FieldType::Date))
            .with_field(
                "category",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "location",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field(
                "supplier",
                FieldDef::new(FieldType::Text).searchable().filterable(),
            )
            .with_field("description", FieldDef::new(FieldType::Text).searchable())
            .with_field("expiryDate", FieldDef::new(FieldType::Date))
            .with_field("quantity", FieldDef::new(FieldType::Numeric))
            .with_field("unitPrice", FieldDef::new(FieldType::Numeric))
            .with_field("amount", FieldDef::new(FieldType::Numeric))
    }
}
