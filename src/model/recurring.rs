use crate::error::Res;
use crate::model::record::{
    ensure_day_of_month, ensure_not_blank, ensure_not_negative, impl_references,
};
use crate::model::{de, Amount, Document, Flow, Frequency, Record, Resource};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A template that produces a transaction on a fixed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecurringTransaction {
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
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// 0 is Sunday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,
    #[serde(deserialize_with = "de::date")]
    pub start_date: NaiveDate,
    #[serde(
        default,
        deserialize_with = "de::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "active_default")]
    pub is_active: bool,
    #[serde(
        default,
        deserialize_with = "de::opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_date: Option<NaiveDate>,
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

fn active_default() -> bool {
    true
}

impl RecurringTransaction {
    /// The date of the next occurrence. A template that was never run starts at `start_date`.
    pub fn next_occurrence(&self) -> NaiveDate {
        self.next_date.unwrap_or(self.start_date)
    }

    /// Whether `date` is past the template's `end_date`.
    pub fn has_ended_by(&self, date: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| date > end)
    }
}

impl Record for RecurringTransaction {
    const RESOURCE: Resource = Resource::RecurringTransactions;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.recurring_transactions
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.recurring_transactions
    }

    fn validate(&self) -> Res<()> {
        ensure_not_blank("description", &self.description)?;
        ensure_not_negative("amount", self.amount)?;
        if let Some(day) = self.day_of_month {
            ensure_day_of_month("day_of_month", day)?;
        }
        if let Some(day) = self.day_of_week {
            anyhow::ensure!(
                day <= 6,
                "'day_of_week' must be between 0 (Sunday) and 6 (Saturday), got {day}"
            );
        }
        if let Some(end) = self.end_date {
            anyhow::ensure!(
                end >= self.start_date,
                "'end_date' {end} is before 'start_date' {}",
                self.start_date
            );
        }
        Ok(())
    }

    impl_references!();
}
