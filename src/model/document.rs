use crate::error::Res;
use crate::model::{
    Account, Category, CreditCard, PendingTransaction, Record, RecurringTransaction, Resource,
    Transaction,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The version written into every saved document.
pub const DOCUMENT_VERSION: &str = "1.0.0";

/// Everything the application stores, as one JSON document.
///
/// ```json
/// {
///   "accounts": [],
///   "transactions": [],
///   "credit_cards": [],
///   "categories": [],
///   "recurring_transactions": [],
///   "pending_transactions": [],
///   "lastUpdated": "2025-03-01T12:00:00Z",
///   "version": "1.0.0"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Document {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub credit_cards: Vec<CreditCard>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub recurring_transactions: Vec<RecurringTransaction>,
    #[serde(default)]
    pub pending_transactions: Vec<PendingTransaction>,
    #[serde(
        rename = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

impl Default for Document {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            transactions: Vec::new(),
            credit_cards: Vec::new(),
            categories: Vec::new(),
            recurring_transactions: Vec::new(),
            pending_transactions: Vec::new(),
            last_updated: None,
            version: default_version(),
        }
    }
}

impl Document {
    /// Parses a document without giving up on partially bad data.
    ///
    /// The text must be a JSON object. A collection that is missing or is not an array becomes
    /// empty, and a record that does not parse is dropped. Each of these produces a warning
    /// message in the returned list.
    pub fn from_json_lenient(text: &str) -> Res<(Document, Vec<String>)> {
        let value: Value = serde_json::from_str(text).context("The data is not valid JSON")?;
        let Value::Object(mut map) = value else {
            anyhow::bail!("The data must be a JSON object with the financial collections");
        };

        let mut warnings = Vec::new();
        let mut doc = Document {
            accounts: take_collection(&mut map, &mut warnings),
            transactions: take_collection(&mut map, &mut warnings),
            credit_cards: take_collection(&mut map, &mut warnings),
            categories: take_collection(&mut map, &mut warnings),
            recurring_transactions: take_collection(&mut map, &mut warnings),
            pending_transactions: take_collection(&mut map, &mut warnings),
            ..Document::default()
        };

        if let Some(last_updated) = map.remove("lastUpdated") {
            match serde_json::from_value(last_updated) {
                Ok(v) => doc.last_updated = v,
                Err(e) => warnings.push(format!("Ignoring an unreadable 'lastUpdated': {e}")),
            }
        }
        if let Some(Value::String(version)) = map.remove("version") {
            doc.version = version;
        }

        Ok((doc, warnings))
    }

    /// The number of records in the collection for `resource`.
    pub fn count(&self, resource: Resource) -> usize {
        match resource {
            Resource::Accounts => self.accounts.len(),
            Resource::Transactions => self.transactions.len(),
            Resource::CreditCards => self.credit_cards.len(),
            Resource::Categories => self.categories.len(),
            Resource::RecurringTransactions => self.recurring_transactions.len(),
            Resource::PendingTransactions => self.pending_transactions.len(),
        }
    }

    /// Whether every collection is empty.
    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|&r| self.count(r) == 0)
    }
}

fn take_collection<R: Record>(map: &mut Map<String, Value>, warnings: &mut Vec<String>) -> Vec<R> {
    let key = R::RESOURCE.to_string();
    let items = match map.remove(&key) {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warnings.push(format!("'{key}' is not an array and was ignored"));
            return Vec::new();
        }
    };
    let mut records = Vec::with_capacity(items.len());
    for (ix, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<R>(item) {
            Ok(record) => records.push(record),
            Err(e) => warnings.push(format!("Skipped {key}[{ix}]: {e}")),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_skips_bad_records() {
        let text = r#"{
            "accounts": [
                {"id":"a1","name":"Carteira","type":"cash","balance":100},
                {"id":"a2","type":"cash"}
            ],
            "transactions": {"not":"an array"},
            "categories": null,
            "lastUpdated": "2025-03-01T12:00:00Z",
            "version": "0.9.0"
        }"#;
        let (doc, warnings) = Document::from_json_lenient(text).unwrap();
        assert_eq!(doc.accounts.len(), 1);
        assert!(doc.transactions.is_empty());
        assert!(doc.categories.is_empty());
        assert_eq!(doc.version, "0.9.0");
        assert!(doc.last_updated.is_some());
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("accounts[1]"));
        assert!(warnings[1].contains("'transactions' is not an array"));
    }

    #[test]
    fn test_lenient_rejects_non_object() {
        assert!(Document::from_json_lenient("[1,2,3]").is_err());
        assert!(Document::from_json_lenient("{nope").is_err());
    }

    #[test]
    fn test_empty_object_is_default_document() {
        let (doc, warnings) = Document::from_json_lenient("{}").unwrap();
        assert_eq!(doc, Document::default());
        assert!(warnings.is_empty());
        assert!(doc.is_empty());
    }
}
