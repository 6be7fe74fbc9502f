use crate::error::Res;
use crate::model::Document;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The collections held by the `Document`. The plain string form matches the collection's key in
/// the stored JSON, e.g. `credit_cards`.
#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Resource {
    Accounts,
    Transactions,
    #[value(alias = "credit-cards", alias = "cards")]
    CreditCards,
    Categories,
    #[value(alias = "recurring-transactions", alias = "recurring")]
    RecurringTransactions,
    #[value(alias = "pending-transactions", alias = "pending")]
    PendingTransactions,
}

serde_plain::derive_display_from_serialize!(Resource);
serde_plain::derive_fromstr_from_deserialize!(Resource);

impl Resource {
    /// Every resource, in the order the collections appear in the stored document.
    pub const ALL: [Resource; 6] = [
        Resource::Accounts,
        Resource::Transactions,
        Resource::CreditCards,
        Resource::Categories,
        Resource::RecurringTransactions,
        Resource::PendingTransactions,
    ];

    /// A human name for a single record of this resource, used in messages.
    pub fn singular(&self) -> &'static str {
        match self {
            Resource::Accounts => "account",
            Resource::Transactions => "transaction",
            Resource::CreditCards => "credit card",
            Resource::Categories => "category",
            Resource::RecurringTransactions => "recurring transaction",
            Resource::PendingTransactions => "pending transaction",
        }
    }
}

/// A record type stored in one of the `Document` collections.
///
/// The repository is generic over this trait. Records are created and patched as JSON objects and
/// then deserialized into the implementing type, which is what validates their shape; `validate`
/// adds the value checks that serde cannot express.
pub trait Record: Debug + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const RESOURCE: Resource;

    fn id(&self) -> &str;

    fn collection(doc: &Document) -> &Vec<Self>;

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self>;

    fn validate(&self) -> Res<()> {
        Ok(())
    }

    /// The id of the `target` record (an account or category) this record points at, if any.
    fn reference(&self, _target: Resource) -> Option<&str> {
        None
    }

    /// Clears the reference to `target`. Returns `true` if there was one.
    fn clear_reference(&mut self, _target: Resource) -> bool {
        false
    }
}

/// Implements the reference methods of `Record` for types with `account_id` and `category_id`.
macro_rules! impl_references {
    () => {
        fn reference(&self, target: $crate::model::Resource) -> Option<&str> {
            match target {
                $crate::model::Resource::Accounts => self.account_id.as_deref(),
                $crate::model::Resource::Categories => self.category_id.as_deref(),
                _ => None,
            }
        }

        fn clear_reference(&mut self, target: $crate::model::Resource) -> bool {
            match target {
                $crate::model::Resource::Accounts => self.account_id.take().is_some(),
                $crate::model::Resource::Categories => self.category_id.take().is_some(),
                _ => false,
            }
        }
    };
}

pub(crate) use impl_references;

/// Fails with a message naming `field` unless `day` is a valid day of the month.
pub(crate) fn ensure_day_of_month(field: &str, day: u32) -> Res<()> {
    anyhow::ensure!(
        (1..=31).contains(&day),
        "'{field}' must be a day of the month between 1 and 31, got {day}"
    );
    Ok(())
}

/// Fails with a message naming `field` if `amount` is negative.
pub(crate) fn ensure_not_negative(field: &str, amount: crate::model::Amount) -> Res<()> {
    anyhow::ensure!(
        !amount.is_negative(),
        "'{field}' cannot be negative, got {amount}"
    );
    Ok(())
}

pub(crate) fn ensure_not_blank(field: &str, value: &str) -> Res<()> {
    anyhow::ensure!(!value.trim().is_empty(), "'{field}' cannot be empty");
    Ok(())
}

#[test]
fn test_resource_strings() {
    use std::str::FromStr;
    assert_eq!(Resource::CreditCards.to_string(), "credit_cards");
    assert_eq!(
        Resource::from_str("pending_transactions").unwrap(),
        Resource::PendingTransactions
    );
    assert!(Resource::from_str("budgets").is_err());
}
