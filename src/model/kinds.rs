use serde::{Deserialize, Serialize};

/// Whether money comes in or goes out. Stored as the `type` field of transactions, categories and
/// pending or recurring transactions.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(Flow);
serde_plain::derive_fromstr_from_deserialize!(Flow);

impl Flow {
    /// The sign this flow contributes to a balance.
    pub fn sign(&self) -> i64 {
        match self {
            Flow::Income => 1,
            Flow::Expense => -1,
        }
    }
}

#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Checking,
    Savings,
    Investment,
    Cash,
    Credit,
}

serde_plain::derive_display_from_serialize!(AccountType);
serde_plain::derive_fromstr_from_deserialize!(AccountType);

/// The lifecycle of a pending transaction.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    #[default]
    Pending,
    Paid,
    // Older data spells it with two l's.
    #[serde(alias = "cancelled")]
    Canceled,
}

serde_plain::derive_display_from_serialize!(PendingStatus);
serde_plain::derive_fromstr_from_deserialize!(PendingStatus);

#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

serde_plain::derive_display_from_serialize!(Frequency);
serde_plain::derive_fromstr_from_deserialize!(Frequency);

#[test]
fn test_kinds_plain_strings() {
    use std::str::FromStr;
    assert_eq!(Flow::Income.to_string(), "income");
    assert_eq!(Frequency::from_str("yearly").unwrap(), Frequency::Yearly);
    assert_eq!(
        PendingStatus::from_str("cancelled").unwrap(),
        PendingStatus::Canceled
    );
    assert_eq!(AccountType::Investment.to_string(), "investment");
}
