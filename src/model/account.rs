use crate::error::Res;
use crate::model::record::ensure_not_blank;
use crate::model::{AccountType, Amount, Document, Record, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bank account, wallet or investment account.
///
/// `balance` is whatever the user last entered; it is never adjusted by transactions. See
/// `metrics::derived_balance` for a balance computed from `initial_balance` and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_balance: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields findash does not use, such as those written by other tools. Saved back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Account {
    const RESOURCE: Resource = Resource::Accounts;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.accounts
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.accounts
    }

    fn validate(&self) -> Res<()> {
        ensure_not_blank("name", &self.name)
    }
}

#[test]
fn test_account_deserialize_minimal() {
    let account: Account = serde_json::from_str(
        r#"{"id":"1","name":"Conta Corrente","type":"checking","balance":15420.5}"#,
    )
    .unwrap();
    assert_eq!(account.account_type, AccountType::Checking);
    assert_eq!(account.balance.to_string(), "R$ 15.420,50");
    assert!(account.initial_balance.is_none());
    assert!(account.validate().is_ok());
}
