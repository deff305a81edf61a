use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::category::canonical_category;
use crate::errors::ValidationError;

/// A single logged spending event. Never mutated after the ledger assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: u64,
    pub amount: f64,
    pub category: String,
    pub item: String,
    #[serde(default)]
    pub vendor: Option<String>,
    /// `None` when the persisted value could not be read as a date; such
    /// records are kept but fall outside every analytics window.
    #[serde(default, with = "lenient_date")]
    pub date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Vendor with surrounding whitespace removed, if any is left.
    pub fn vendor_label(&self) -> Option<&str> {
        self.vendor
            .as_deref()
            .map(str::trim)
            .filter(|vendor| !vendor.is_empty())
    }

    /// Key used to cluster repeat purchases: vendor, else item, else category, lowercased.
    pub fn grouping_key(&self) -> String {
        let item = self.item.trim();
        let key = match self.vendor_label() {
            Some(vendor) => vendor,
            None if !item.is_empty() => item,
            None => self.category.as_str(),
        };
        key.to_lowercase()
    }
}

/// Caller-supplied fields for a new transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount: f64,
    pub category: String,
    pub item: String,
    pub vendor: Option<String>,
    /// Defaults to the clock's current date when absent.
    pub date: Option<NaiveDate>,
}

impl TransactionDraft {
    pub fn new(amount: f64, category: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            amount,
            category: category.into(),
            item: item.into(),
            vendor: None,
            date: None,
        }
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Checks the draft and returns a normalized copy: trimmed item, canonical
    /// category label, blank vendor dropped.
    pub fn validate(&self) -> Result<TransactionDraft, ValidationError> {
        let item = self.item.trim();
        if item.is_empty() {
            return Err(ValidationError::MissingItem);
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ValidationError::InvalidAmount(self.amount));
        }
        let category = canonical_category(&self.category)?;
        let vendor = self
            .vendor
            .as_deref()
            .map(str::trim)
            .filter(|vendor| !vendor.is_empty())
            .map(str::to_string);
        Ok(TransactionDraft {
            amount: self.amount,
            category: category.to_string(),
            item: item.to_string(),
            vendor,
            date: self.date,
        })
    }
}

/// Reads dates written as `YYYY-MM-DD` or as an RFC 3339 timestamp; anything
/// else deserializes to `None` instead of failing the whole ledger.
mod lenient_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const DATE_FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        let Some(serde_json::Value::String(text)) = raw else {
            return Ok(None);
        };
        let text = text.trim();
        let parsed = NaiveDate::parse_from_str(text, DATE_FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|stamp| stamp.date_naive())
            });
        if parsed.is_none() {
            tracing::debug!(value = text, "unreadable transaction date");
        }
        Ok(parsed)
    }
}
