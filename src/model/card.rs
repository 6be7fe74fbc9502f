use crate::error::Res;
use crate::model::record::{ensure_day_of_month, ensure_not_blank, ensure_not_negative};
use crate::model::{Amount, Document, Record, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A credit card with its limit, the amount currently used and its monthly billing days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreditCard {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_four: Option<String>,
    #[serde(default)]
    pub limit: Amount,
    #[serde(default, alias = "used")]
    pub current_balance: Amount,
    /// Day of the month the bill is due.
    #[serde(alias = "due_day")]
    pub due_date: u32,
    /// Day of the month the statement closes.
    #[serde(alias = "closing_day")]
    pub closing_date: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Unknown fields, saved back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreditCard {
    /// What is left of the limit. Negative when the card is over its limit.
    pub fn available(&self) -> Amount {
        self.limit - self.current_balance
    }
}

impl Record for CreditCard {
    const RESOURCE: Resource = Resource::CreditCards;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.credit_cards
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.credit_cards
    }

    fn validate(&self) -> Res<()> {
        ensure_not_blank("name", &self.name)?;
        ensure_not_negative("limit", self.limit)?;
        ensure_not_negative("current_balance", self.current_balance)?;
        ensure_day_of_month("due_date", self.due_date)?;
        ensure_day_of_month("closing_date", self.closing_date)?;
        if let Some(last_four) = &self.last_four {
            anyhow::ensure!(
                last_four.len() == 4 && last_four.chars().all(|c| c.is_ascii_digit()),
                "'last_four' must be exactly 4 digits, got '{last_four}'"
            );
        }
        Ok(())
    }
}
