use crate::model::{Amount, Flow, Frequency, RecurringTransaction};
use rust_decimal::Decimal;
use serde::Serialize;

/// Average weeks in a month.
const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);
const DAYS_PER_MONTH: i64 = 30;
const MONTHS_PER_YEAR: i64 = 12;

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct RecurringTotals {
    pub income: Amount,
    pub expenses: Amount,
    pub net: Amount,
}

/// What the template amounts to per month, rounded to cents.
pub fn monthly_equivalent(recurring: &RecurringTransaction) -> Amount {
    let amount = recurring.amount.value();
    let monthly = match recurring.frequency {
        Frequency::Monthly => amount,
        Frequency::Yearly => amount / Decimal::from(MONTHS_PER_YEAR),
        Frequency::Weekly => amount.saturating_mul(WEEKS_PER_MONTH),
        Frequency::Daily => amount.saturating_mul(Decimal::from(DAYS_PER_MONTH)),
    };
    Amount::new(monthly).round_cents()
}

/// Monthly equivalents summed over the active templates.
pub fn recurring_monthly_totals(recurring: &[RecurringTransaction]) -> RecurringTotals {
    let mut totals = RecurringTotals::default();
    for r in recurring.iter().filter(|r| r.is_active) {
        match r.flow {
            Flow::Income => totals.income += monthly_equivalent(r),
            Flow::Expense => totals.expenses += monthly_equivalent(r),
        }
    }
    totals.net = totals.income - totals.expenses;
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use std::str::FromStr;

    fn with(frequency: Frequency, amount: &str) -> RecurringTransaction {
        let mut r = TestEnv::seed_document().recurring_transactions[0].clone();
        r.frequency = frequency;
        r.amount = Amount::from_str(amount).unwrap();
        r
    }

    #[test]
    fn test_monthly_equivalent() {
        assert_eq!(
            monthly_equivalent(&with(Frequency::Monthly, "100")),
            Amount::from(100)
        );
        assert_eq!(
            monthly_equivalent(&with(Frequency::Yearly, "1200")),
            Amount::from(100)
        );
        assert_eq!(
            monthly_equivalent(&with(Frequency::Yearly, "1000")).to_string(),
            "R$ 83,33"
        );
        assert_eq!(
            monthly_equivalent(&with(Frequency::Weekly, "25")).to_string(),
            "R$ 108,25"
        );
        assert_eq!(
            monthly_equivalent(&with(Frequency::Daily, "10")),
            Amount::from(300)
        );
    }

    #[test]
    fn test_recurring_totals_skip_inactive() {
        let doc = TestEnv::seed_document();
        let totals = recurring_monthly_totals(&doc.recurring_transactions);
        assert_eq!(totals.income, Amount::from(5000));
        assert_eq!(totals.expenses.to_string(), "R$ 55,90");
        assert_eq!(totals.net.to_string(), "R$ 4.944,10");
    }
}
