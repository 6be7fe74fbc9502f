use crate::error::Res;
use crate::model::record::{ensure_not_blank, ensure_not_negative, impl_references};
use crate::model::{de, Amount, Document, Flow, Record, Resource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single income or expense.
///
/// `amount` is a magnitude; `flow` decides the sign. A transaction that is not `effectivated` is
/// scheduled or projected and does not count toward realized balances and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: Amount,
    #[serde(rename = "type", default)]
    pub flow: Flow,
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
    #[serde(alias = "transaction_date", deserialize_with = "de::date")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default = "effectivated_default", alias = "efetivada")]
    pub effectivated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields findash does not use, e.g. `installments` or `tags`. Saved back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Data written before the flag existed only held realized transactions.
fn effectivated_default() -> bool {
    true
}

impl Transaction {
    /// The amount with the sign of its flow: positive for income, negative for expenses.
    pub fn signed_amount(&self) -> Amount {
        match self.flow {
            Flow::Income => self.amount,
            Flow::Expense => -self.amount,
        }
    }
}

impl Record for Transaction {
    const RESOURCE: Resource = Resource::Transactions;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.transactions
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.transactions
    }

    fn validate(&self) -> Res<()> {
        ensure_not_blank("description", &self.description)?;
        ensure_not_negative("amount", self.amount)
    }

    impl_references!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_effectivated_defaults_to_true() {
        let t: Transaction = serde_json::from_str(
            r#"{"id":"t1","description":"Mercado","amount":87.43,"type":"expense","date":"2025-03-02"}"#,
        )
        .unwrap();
        assert!(t.effectivated);
        assert!(t.category_id.is_none());
    }

    #[test]
    fn test_legacy_field_names() {
        let t: Transaction = serde_json::from_str(
            r#"{"id":"t1","description":"Salário","amount":"R$ 5.000,00","type":"income",
                "category":"","account":"a1","transaction_date":"2025-03-05T00:00:00.000Z",
                "efetivada":false}"#,
        )
        .unwrap();
        assert!(!t.effectivated);
        assert_eq!(t.account_id.as_deref(), Some("a1"));
        assert!(t.category_id.is_none());
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(t.signed_amount().to_string(), "R$ 5.000,00");
    }

    #[test]
    fn test_serializes_current_field_names() {
        let t: Transaction = serde_json::from_str(
            r#"{"id":"t1","description":"Luz","amount":120,"type":"expense","date":"2025-03-02",
                "efetivada":true}"#,
        )
        .unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["effectivated"], serde_json::json!(true));
        assert_eq!(json["date"], serde_json::json!("2025-03-02"));
        assert!(json.get("efetivada").is_none());
        assert_eq!(t.signed_amount().to_string(), "-R$ 120,00");
    }

    #[test]
    fn test_negative_amount_is_invalid() {
        let t: Transaction = serde_json::from_str(
            r#"{"id":"t1","description":"Luz","amount":-5,"type":"expense","date":"2025-03-02"}"#,
        )
        .unwrap();
        assert!(t.validate().is_err());
    }
}
