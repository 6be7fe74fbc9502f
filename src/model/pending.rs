use crate::error::Res;
use crate::model::record::{ensure_not_blank, ensure_not_negative, impl_references};
use crate::model::{de, Amount, Document, Flow, PendingStatus, Record, Resource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bill to pay or an amount to receive on a due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingTransaction {
    pub id: String,
    pub description: String,
    pub amount: Amount,
    #[serde(deserialize_with = "de::date")]
    pub due_date: NaiveDate,
    #[serde(
        default,
        alias = "category",
        deserialize_with = "de::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
    #[serde(
        default,
        alias = "account",
        deserialize_with = "de::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_id: Option<String>,
    #[serde(rename = "type", default)]
    pub flow: Flow,
    #[serde(default)]
    pub status: PendingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PendingTransaction {
    pub fn is_pending(&self) -> bool {
        self.status == PendingStatus::Pending
    }

    /// Still pending and due before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date < today
    }
}

impl Record for PendingTransaction {
    const RESOURCE: Resource = Resource::PendingTransactions;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.pending_transactions
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.pending_transactions
    }

    fn validate(&self) -> Res<()> {
        ensure_not_blank("description", &self.description)?;
        ensure_not_negative("amount", self.amount)
    }

    impl_references!();
}

#[test]
fn test_pending_defaults_and_overdue() {
    let p: PendingTransaction = serde_json::from_str(
        r#"{"id":"p1","description":"Aluguel","amount":1800,"due_date":"2025-03-10",
            "type":"expense","category_id":"c1","account_id":""}"#,
    )
    .unwrap();
    assert_eq!(p.status, PendingStatus::Pending);
    assert!(p.account_id.is_none());
    let before = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let after = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    assert!(!p.is_overdue(before));
    assert!(p.is_overdue(after));
}
