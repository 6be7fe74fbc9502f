use crate::metrics::balances::{transaction_totals, TransactionTotals};
use crate::metrics::YearMonth;
use crate::model::{Amount, Category, Flow, Transaction};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

const WARNING_PERCENT: i64 = 80;
const EXCEEDED_PERCENT: i64 = 100;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    Exceeded,
}

serde_plain::derive_display_from_serialize!(BudgetStatus);

/// One category's budget for a month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct BudgetLine {
    pub category_id: String,
    pub name: String,
    pub budget: Amount,
    pub spent: Amount,
    /// Negative when over budget.
    pub remaining: Amount,
    pub percentage: i64,
    pub status: BudgetStatus,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct BudgetReport {
    pub month: YearMonth,
    pub totals: TransactionTotals,
    pub total_budget: Amount,
    pub total_spent: Amount,
    pub lines: Vec<BudgetLine>,
}

/// `spent` as a whole-number percentage of `budget`, rounding halves up. 0 when there is no
/// budget.
pub fn budget_percentage(spent: Amount, budget: Amount) -> i64 {
    percentage(spent, budget)
}

pub(crate) fn percentage(part: Amount, whole: Amount) -> i64 {
    if whole.is_zero() {
        return 0;
    }
    // Out of range ratios saturate.
    let saturated = if part.is_negative() == whole.is_negative() {
        i64::MAX
    } else {
        i64::MIN
    };
    part.value()
        .checked_div(whole.value())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|p| {
            p.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .unwrap_or(saturated)
}

pub fn budget_status(percentage: i64) -> BudgetStatus {
    if percentage >= EXCEEDED_PERCENT {
        BudgetStatus::Exceeded
    } else if percentage >= WARNING_PERCENT {
        BudgetStatus::Warning
    } else {
        BudgetStatus::OnTrack
    }
}

/// What was spent in `category` during `month`: effectivated transactions of the category's type
/// filed under it.
pub fn category_spent(category: &Category, transactions: &[Transaction], month: YearMonth) -> Amount {
    transactions
        .iter()
        .filter(|t| {
            t.effectivated
                && t.flow == category.flow
                && t.category_id.as_deref() == Some(category.id.as_str())
                && month.contains(t.date)
        })
        .map(|t| t.amount)
        .sum()
}

/// Budget lines for every expense category that has a budget, plus the month's totals.
pub fn budget_report(
    categories: &[Category],
    transactions: &[Transaction],
    month: YearMonth,
) -> BudgetReport {
    let lines: Vec<BudgetLine> = categories
        .iter()
        .filter(|c| c.flow == Flow::Expense && c.budget.is_some())
        .map(|c| {
            let budget = c.budget_or_zero();
            let spent = category_spent(c, transactions, month);
            let percentage = budget_percentage(spent, budget);
            BudgetLine {
                category_id: c.id.clone(),
                name: c.name.clone(),
                budget,
                spent,
                remaining: budget - spent,
                percentage,
                status: budget_status(percentage),
            }
        })
        .collect();

    let totals = transaction_totals(
        transactions
            .iter()
            .filter(|t| t.effectivated && month.contains(t.date)),
    );

    BudgetReport {
        month,
        totals,
        total_budget: lines.iter().map(|l| l.budget).sum(),
        total_spent: lines.iter().map(|l| l.spent).sum(),
        lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    fn amount(n: i64) -> Amount {
        Amount::from(n)
    }

    #[test]
    fn test_budget_percentage_zero_budget() {
        assert_eq!(budget_percentage(amount(50), Amount::ZERO), 0);
        assert_eq!(budget_percentage(Amount::ZERO, Amount::ZERO), 0);
    }

    #[test]
    fn test_budget_percentage_rounds() {
        assert_eq!(budget_percentage(amount(850), amount(800)), 106);
        assert_eq!(budget_percentage(amount(900), amount(800)), 113);
        assert_eq!(budget_percentage(amount(1), amount(3)), 33);
    }

    #[test]
    fn test_budget_percentage_saturates() {
        let huge = Amount::new(Decimal::from_i128_with_scale(10_i128.pow(27), 0));
        let cent = Amount::new(Decimal::new(1, 2));
        assert_eq!(budget_percentage(huge, cent), i64::MAX);
        assert_eq!(budget_percentage(-huge, cent), i64::MIN);
        assert_eq!(budget_status(budget_percentage(huge, cent)), BudgetStatus::Exceeded);
    }

    #[test]
    fn test_budget_status_thresholds() {
        assert_eq!(budget_status(0), BudgetStatus::OnTrack);
        assert_eq!(budget_status(79), BudgetStatus::OnTrack);
        assert_eq!(budget_status(80), BudgetStatus::Warning);
        assert_eq!(budget_status(99), BudgetStatus::Warning);
        assert_eq!(budget_status(100), BudgetStatus::Exceeded);
    }

    #[test]
    fn test_category_spent_ignores_scheduled_and_other_months() {
        let doc = TestEnv::seed_document();
        let food = &doc.categories[0];
        let march: YearMonth = "2025-03".parse().unwrap();
        let feb: YearMonth = "2025-02".parse().unwrap();
        assert_eq!(category_spent(food, &doc.transactions, march), amount(850));
        assert_eq!(category_spent(food, &doc.transactions, feb), amount(900));
    }

    #[test]
    fn test_budget_report() {
        let doc = TestEnv::seed_document();
        let report = budget_report(
            &doc.categories,
            &doc.transactions,
            "2025-03".parse().unwrap(),
        );
        // The income category has no budget and is left out.
        let names: Vec<&str> = report.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Alimentação", "Transporte", "Lazer"]);

        let food = &report.lines[0];
        assert_eq!(food.percentage, 106);
        assert_eq!(food.status, BudgetStatus::Exceeded);
        assert_eq!(food.remaining, amount(-50));

        let transport = &report.lines[1];
        assert_eq!(transport.percentage, 40);
        assert_eq!(transport.status, BudgetStatus::OnTrack);

        let leisure = &report.lines[2];
        assert_eq!(leisure.percentage, 0);

        assert_eq!(report.totals.income, amount(5000));
        assert_eq!(report.totals.expenses, amount(970));
        assert_eq!(report.total_budget, amount(1100));
        assert_eq!(report.total_spent, amount(970));
    }
}
