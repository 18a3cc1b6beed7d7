//! Record types: one ledger line or one analytics observation.
//!
//! A [`Record`] is immutable once built. Ledger lines carry an [`Entry`], which
//! is either a debit or a credit leg and never both; analytics observations
//! (sales, feeding, inventory) carry `amount`, `quantity` and `unit_price`
//! instead. Screen-specific columns live in [`Attributes`].
//!
//! Records deserialize from the camelCase JSON shape used by the backend:
//!
//! ```
//! use farmbook_core::Record;
//! use rust_decimal_macros::dec;
//!
//! let record: Record = serde_json::from_str(
//!     r#"{"id": 7, "date": "2024-03-02", "account": "Livestock",
//!         "description": "Heifer purchase", "debit": 500, "credit": null}"#,
//! ).unwrap();
//!
//! assert_eq!(record.debit(), Some(dec!(500)));
//! assert_eq!(record.credit(), None);
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::{self, Deserializer, IgnoredAny, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::RecordError;
use crate::value::{parse_date, FieldValue};

/// Opaque record identifier, unique within a collection.
///
/// Deserializes from either a JSON string or a JSON integer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl<'de> Visitor<'de> for IdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or integer record id")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                Ok(RecordId::from(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<RecordId, E> {
                Ok(RecordId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                Ok(RecordId(v.to_string()))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// One leg of a double-entry ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entry {
    /// Debit leg.
    Debit(Decimal),
    /// Credit leg.
    Credit(Decimal),
}

impl Entry {
    /// The leg's amount, regardless of side.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        match self {
            Self::Debit(n) | Self::Credit(n) => *n,
        }
    }

    /// The amount if this is a debit leg.
    #[must_use]
    pub const fn debit(&self) -> Option<Decimal> {
        match self {
            Self::Debit(n) => Some(*n),
            Self::Credit(_) => None,
        }
    }

    /// The amount if this is a credit leg.
    #[must_use]
    pub const fn credit(&self) -> Option<Decimal> {
        match self {
            Self::Credit(n) => Some(*n),
            Self::Debit(_) => None,
        }
    }
}

/// A screen-specific field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    /// Text value.
    Text(String),
    /// Numeric value.
    Number(Decimal),
    /// Boolean flag.
    Flag(bool),
}

impl Attribute {
    /// View the attribute as a field value.
    #[must_use]
    pub fn as_field_value(&self) -> FieldValue<'_> {
        match self {
            Self::Text(s) => FieldValue::text(s),
            Self::Number(n) => FieldValue::Number(*n),
            Self::Flag(b) => FieldValue::text(if *b { "true" } else { "false" }),
        }
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Decimal> for Attribute {
    fn from(n: Decimal) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for Attribute {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

/// Screen-specific fields keyed by name.
pub type Attributes = BTreeMap<String, Attribute>;

/// One row of tabular financial or operational data.
///
/// # Examples
///
/// ```
/// use farmbook_core::{NaiveDate, Record};
/// use rust_decimal_macros::dec;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
/// let line = Record::new("1", date, "Monthly feed purchase")
///     .with_reference("JV-1")
///     .with_account("Feed")
///     .with_debit(dec!(620));
///
/// assert_eq!(line.debit(), Some(dec!(620)));
/// assert!(line.is_ledger_line());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordRepr", into = "RecordRepr")]
pub struct Record {
    /// Unique identifier.
    pub id: RecordId,
    /// Calendar date of the record.
    pub date: NaiveDate,
    /// Transaction reference shared by the legs of one ledger transaction.
    pub reference: Option<String>,
    /// Ledger account.
    pub account: Option<String>,
    /// Category (feed type, product line, expense class).
    pub category: Option<String>,
    /// Supplier for purchases.
    pub supplier: Option<String>,
    /// Buyer for sales.
    pub buyer: Option<String>,
    /// Free-text label.
    pub description: String,
    /// Debit or credit leg for ledger lines.
    pub entry: Option<Entry>,
    /// Monetary amount for analytics records.
    pub amount: Option<Decimal>,
    /// Quantity for analytics records.
    pub quantity: Option<Decimal>,
    /// Unit price for analytics records.
    pub unit_price: Option<Decimal>,
    /// Screen-specific fields.
    pub attributes: Attributes,
}

impl Record {
    /// Create a record with the required fields; everything else is absent.
    #[must_use]
    pub fn new(id: impl Into<RecordId>, date: NaiveDate, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date,
            reference: None,
            account: None,
            category: None,
            supplier: None,
            buyer: None,
            description: description.into(),
            entry: None,
            amount: None,
            quantity: None,
            unit_price: None,
            attributes: Attributes::new(),
        }
    }

    /// Set the transaction reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Set the account.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the supplier.
    #[must_use]
    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    /// Set the buyer.
    #[must_use]
    pub fn with_buyer(mut self, buyer: impl Into<String>) -> Self {
        self.buyer = Some(buyer.into());
        self
    }

    /// Make this a debit leg.
    #[must_use]
    pub const fn with_debit(mut self, amount: Decimal) -> Self {
        self.entry = Some(Entry::Debit(amount));
        self
    }

    /// Make this a credit leg.
    #[must_use]
    pub const fn with_credit(mut self, amount: Decimal) -> Self {
        self.entry = Some(Entry::Credit(amount));
        self
    }

    /// Set the monetary amount.
    #[must_use]
    pub const fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set the unit price.
    #[must_use]
    pub const fn with_unit_price(mut self, unit_price: Decimal) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    /// Add a screen-specific attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The debit amount, if this is a debit leg.
    #[must_use]
    pub fn debit(&self) -> Option<Decimal> {
        self.entry.as_ref().and_then(Entry::debit)
    }

    /// The credit amount, if this is a credit leg.
    #[must_use]
    pub fn credit(&self) -> Option<Decimal> {
        self.entry.as_ref().and_then(Entry::credit)
    }

    /// Whether this record is a ledger line.
    #[must_use]
    pub const fn is_ledger_line(&self) -> bool {
        self.entry.is_some()
    }

    /// Look up a field by name.
    ///
    /// Built-in names are `id`, `date` (alias `timestamp`), `reference`,
    /// `account`, `category`, `supplier`, `buyer`, `description`, `debit`,
    /// `credit`, `amount`, `quantity` and `unitPrice`. Any other name reads
    /// from the attributes. Returns `None` when the field is absent.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<FieldValue<'_>> {
        match field {
            "id" => Some(FieldValue::text(self.id.as_str())),
            "date" | "timestamp" => Some(FieldValue::Date(self.date)),
            "reference" => self.reference.as_deref().map(FieldValue::text),
            "account" => self.account.as_deref().map(FieldValue::text),
            "category" => self.category.as_deref().map(FieldValue::text),
            "supplier" => self.supplier.as_deref().map(FieldValue::text),
            "buyer" => self.buyer.as_deref().map(FieldValue::text),
            "description" => Some(FieldValue::text(&self.description)),
            "debit" => self.debit().map(FieldValue::Number),
            "credit" => self.credit().map(FieldValue::Number),
            "amount" => self.amount.map(FieldValue::Number),
            "quantity" => self.quantity.map(FieldValue::Number),
            "unitPrice" => self.unit_price.map(FieldValue::Number),
            _ => self.attributes.get(field).map(Attribute::as_field_value),
        }
    }
}

impl AsRef<Self> for Record {
    fn as_ref(&self) -> &Self {
        self
    }
}

/// Wire shape of a record.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordRepr {
    id: RecordId,
    #[serde(alias = "timestamp")]
    date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    buyer: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    debit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credit: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit_price: Option<Decimal>,
    #[serde(flatten, deserialize_with = "scalar_attributes")]
    attributes: Attributes,
}

/// An unknown key's value as it appears on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttribute {
    Scalar(Attribute),
    Other(IgnoredAny),
}

/// Keep the scalar unknown keys; nulls, arrays and objects are dropped.
fn scalar_attributes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Attributes, D::Error> {
    let raw = BTreeMap::<String, RawAttribute>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| match value {
            RawAttribute::Scalar(attribute) => Some((key, attribute)),
            RawAttribute::Other(IgnoredAny) => None,
        })
        .collect())
}

impl TryFrom<RecordRepr> for Record {
    type Error = RecordError;

    fn try_from(repr: RecordRepr) -> Result<Self, Self::Error> {
        let Some(date) = parse_date(&repr.date) else {
            return Err(RecordError::InvalidDate {
                id: repr.id,
                value: repr.date,
            });
        };
        let entry = match (repr.debit, repr.credit) {
            (Some(_), Some(_)) => return Err(RecordError::BothLegs { id: repr.id }),
            (Some(debit), None) => Some(Entry::Debit(debit)),
            (None, Some(credit)) => Some(Entry::Credit(credit)),
            (None, None) => None,
        };
        Ok(Self {
            id: repr.id,
            date,
            reference: repr.reference,
            account: repr.account,
            category: repr.category,
            supplier: repr.supplier,
            buyer: repr.buyer,
            description: repr.description,
            entry,
            amount: repr.amount,
            quantity: repr.quantity,
            unit_price: repr.unit_price,
            attributes: repr.attributes,
        })
    }
}

impl From<Record> for RecordRepr {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            date: record.date.to_string(),
            reference: record.reference,
            account: record.account,
            category: record.category,
            supplier: record.supplier,
            buyer: record.buyer,
            description: record.description,
            debit: record.entry.as_ref().and_then(Entry::debit),
            credit: record.entry.as_ref().and_then(Entry::credit),
            amount: record.amount,
            quantity: record.quantity,
            unit_price: record.unit_price,
            attributes: record.attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_debit_and_credit_are_exclusive() {
        let debit = Record::new("1", date(2024, 1, 5), "Heifer").with_debit(dec!(500));
        assert_eq!(debit.debit(), Some(dec!(500)));
        assert_eq!(debit.credit(), None);

        let credit = debit.clone().with_credit(dec!(500));
        assert_eq!(credit.debit(), None);
        assert_eq!(credit.credit(), Some(dec!(500)));
    }

    #[test]
    fn test_get_builtin_and_attribute_fields() {
        let record = Record::new("9", date(2024, 2, 1), "Layers mash")
            .with_category("Feed")
            .with_quantity(dec!(40))
            .with_unit_price(dec!(55.5))
            .with_attribute("feedType", "Mash")
            .with_attribute("organic", true);

        assert_eq!(record.get("category"), Some(FieldValue::text("Feed")));
        assert_eq!(record.get("unitPrice"), Some(FieldValue::Number(dec!(55.5))));
        assert_eq!(
            record.get("timestamp"),
            Some(FieldValue::Date(date(2024, 2, 1)))
        );
        assert_eq!(record.get("feedType"), Some(FieldValue::text("Mash")));
        assert_eq!(record.get("organic"), Some(FieldValue::text("true")));
        assert_eq!(record.get("supplier"), None);
        assert_eq!(record.get("debit"), None);
        assert_eq!(record.get("nonexistent"), None);
    }

    #[test]
    fn test_deserialize_ledger_line() {
        let record: Record = serde_json::from_str(
            r#"{"id": "JV-1/1", "timestamp": "2024-03-02T09:30:00Z", "reference": "JV-1",
                "account": "Bank", "description": "Heifer purchase",
                "debit": null, "credit": 500}"#,
        )
        .unwrap();

        assert_eq!(record.id.as_str(), "JV-1/1");
        assert_eq!(record.date, date(2024, 3, 2));
        assert_eq!(record.entry, Some(Entry::Credit(dec!(500))));
        assert!(record.attributes.is_empty());
    }

    #[test]
    fn test_deserialize_collects_attributes() {
        let record: Record = serde_json::from_str(
            r#"{"id": 3, "date": "2024-03-02", "description": "Dairy meal",
                "quantity": 12, "unitPrice": "45.50", "feedType": "Meal",
                "bags": 4, "medicated": false, "notes": null}"#,
        )
        .unwrap();

        assert_eq!(record.id.as_str(), "3");
        assert_eq!(record.quantity, Some(dec!(12)));
        assert_eq!(record.unit_price, Some(dec!(45.50)));
        assert_eq!(record.attributes.get("feedType"), Some(&Attribute::from("Meal")));
        assert_eq!(record.attributes.get("bags"), Some(&Attribute::Number(dec!(4))));
        assert_eq!(record.attributes.get("medicated"), Some(&Attribute::Flag(false)));
        assert!(!record.attributes.contains_key("notes"));
        assert!(!record.is_ledger_line());
    }

    #[test]
    fn test_deserialize_skips_nested_values() {
        let record: Record = serde_json::from_str(
            r#"{"id": 1, "date": "2024-01-01", "debit": 5, "tags": ["x"],
                "createdBy": {"name": "Wanjiku", "role": "clerk"}, "batch": "B-7"}"#,
        )
        .unwrap();

        assert_eq!(record.debit(), Some(dec!(5)));
        assert_eq!(record.get("tags"), None);
        assert_eq!(record.get("createdBy"), None);
        assert_eq!(record.get("batch"), Some(FieldValue::text("B-7")));
        assert_eq!(record.attributes.len(), 1);

        let records: Vec<Record> = serde_json::from_str(
            r#"[{"id": 1, "date": "2024-01-01", "tags": []},
                {"id": 2, "date": "2024-01-02", "meta": {"source": "import"}}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_deserialize_rejects_both_legs() {
        let err = serde_json::from_str::<Record>(
            r#"{"id": "1", "date": "2024-03-02", "debit": 10, "credit": 10}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("both debit and credit"));
    }

    #[test]
    fn test_deserialize_rejects_bad_date() {
        let err = serde_json::from_str::<Record>(r#"{"id": "1", "date": "yesterday"}"#).unwrap_err();
        assert!(err.to_string().contains("unrecognised date"));
    }
}
