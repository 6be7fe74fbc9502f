use crate::error::Res;
use crate::model::record::{ensure_not_blank, ensure_not_negative};
use crate::model::{Amount, Document, Flow, Record, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A category that transactions are filed under, optionally with a monthly budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub flow: Flow,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Amount>,
    /// A value older versions tracked by hand. Reports compute spending from transactions and do
    /// not read this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spent: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    /// The budget, treating a missing budget as zero.
    pub fn budget_or_zero(&self) -> Amount {
        self.budget.unwrap_or_default()
    }
}

impl Record for Category {
    const RESOURCE: Resource = Resource::Categories;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.categories
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.categories
    }

    fn validate(&self) -> Res<()> {
        ensure_not_blank("name", &self.name)?;
        if let Some(budget) = self.budget {
            ensure_not_negative("budget", budget)?;
        }
        Ok(())
    }
}

#[test]
fn test_category_negative_budget_is_invalid() {
    let category: Category = serde_json::from_str(
        r##"{"id":"c1","name":"Alimentação","type":"expense","color":"#ef4444","budget":-1}"##,
    )
    .unwrap();
    let message = category.validate().unwrap_err().to_string();
    assert!(message.contains("budget"));
}
