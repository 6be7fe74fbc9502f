use crate::metrics::budget::percentage;
use crate::metrics::dates::days_until_due;
use crate::model::{Amount, CreditCard};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MEDIUM_PERCENT: i64 = 60;
const HIGH_PERCENT: i64 = 80;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    Low,
    Medium,
    High,
}

serde_plain::derive_display_from_serialize!(UsageLevel);

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct CardTotals {
    pub limit: Amount,
    pub used: Amount,
    pub available: Amount,
    pub usage_percentage: i64,
}

/// A card with its usage and the days left until its bill is due.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct CardSummary {
    pub id: String,
    pub name: String,
    pub limit: Amount,
    pub used: Amount,
    pub available: Amount,
    pub usage_percentage: i64,
    pub usage_level: UsageLevel,
    pub due_day: u32,
    pub days_until_due: i64,
}

/// `current` as a whole-number percentage of `limit`. 0 when the limit is 0.
pub fn credit_usage_percentage(current: Amount, limit: Amount) -> i64 {
    percentage(current, limit)
}

pub fn usage_level(percentage: i64) -> UsageLevel {
    if percentage >= HIGH_PERCENT {
        UsageLevel::High
    } else if percentage >= MEDIUM_PERCENT {
        UsageLevel::Medium
    } else {
        UsageLevel::Low
    }
}

pub fn card_totals(cards: &[CreditCard]) -> CardTotals {
    let limit: Amount = cards.iter().map(|c| c.limit).sum();
    let used: Amount = cards.iter().map(|c| c.current_balance).sum();
    CardTotals {
        limit,
        used,
        available: limit - used,
        usage_percentage: credit_usage_percentage(used, limit),
    }
}

/// A summary of every card, soonest due first.
pub fn card_summaries(cards: &[CreditCard], today: NaiveDate) -> Vec<CardSummary> {
    let mut summaries: Vec<CardSummary> = cards
        .iter()
        .map(|c| {
            let usage_percentage = credit_usage_percentage(c.current_balance, c.limit);
            CardSummary {
                id: c.id.clone(),
                name: c.name.clone(),
                limit: c.limit,
                used: c.current_balance,
                available: c.available(),
                usage_percentage,
                usage_level: usage_level(usage_percentage),
                due_day: c.due_date,
                days_until_due: days_until_due(c.due_date, today),
            }
        })
        .collect();
    summaries.sort_by_key(|s| s.days_until_due);
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_usage_percentage() {
        assert_eq!(
            credit_usage_percentage(Amount::from(4100), Amount::from(5000)),
            82
        );
        assert_eq!(credit_usage_percentage(Amount::from(10), Amount::ZERO), 0);
    }

    #[test]
    fn test_usage_level_thresholds() {
        assert_eq!(usage_level(59), UsageLevel::Low);
        assert_eq!(usage_level(60), UsageLevel::Medium);
        assert_eq!(usage_level(79), UsageLevel::Medium);
        assert_eq!(usage_level(80), UsageLevel::High);
        assert_eq!(usage_level(150), UsageLevel::High);
    }

    #[test]
    fn test_card_totals() {
        let doc = TestEnv::seed_document();
        let totals = card_totals(&doc.credit_cards);
        assert_eq!(totals.limit, Amount::from(8000));
        assert_eq!(totals.used, Amount::from(5000));
        assert_eq!(totals.available, Amount::from(3000));
        assert_eq!(totals.usage_percentage, 63);
    }

    #[test]
    fn test_card_summaries_sorted_by_due() {
        let doc = TestEnv::seed_document();
        let summaries = card_summaries(&doc.credit_cards, TestEnv::today());
        assert_eq!(summaries[0].name, "Itaú");
        assert_eq!(summaries[0].days_until_due, 13);
        assert_eq!(summaries[0].usage_level, UsageLevel::Low);
        assert_eq!(summaries[1].name, "Nubank");
        assert_eq!(summaries[1].days_until_due, 29);
        assert_eq!(summaries[1].usage_level, UsageLevel::High);
    }
}
