use crate::metrics::YearMonth;
use crate::model::{Amount, Category, Flow, Transaction};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

/// Name used for transactions without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct MonthTrend {
    pub month: YearMonth,
    pub income: Amount,
    pub expenses: Amount,
    /// `income - expenses`
    pub savings: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category_id: Option<String>,
    pub name: String,
    pub total: Amount,
    /// Share of the total of all categories, rounded to two decimals.
    pub percentage: f64,
}

/// Effectivated income and expenses grouped by month, oldest first.
pub fn monthly_trends(transactions: &[Transaction]) -> Vec<MonthTrend> {
    let mut months: BTreeMap<YearMonth, (Amount, Amount)> = BTreeMap::new();
    for t in transactions.iter().filter(|t| t.effectivated) {
        let entry = months.entry(YearMonth::of(t.date)).or_default();
        match t.flow {
            Flow::Income => entry.0 += t.amount,
            Flow::Expense => entry.1 += t.amount,
        }
    }
    months
        .into_iter()
        .map(|(month, (income, expenses))| MonthTrend {
            month,
            income,
            expenses,
            savings: income - expenses,
        })
        .collect()
}

/// The change from `previous` to `current` in percent, rounded to two decimals. `None` when
/// `previous` is zero.
pub fn percent_change(previous: Amount, current: Amount) -> Option<f64> {
    if previous.is_zero() {
        return None;
    }
    Some(to_percent(
        (current - previous).value(),
        previous.value().abs(),
    ))
}

/// The share of `income` that was not spent, in percent. 0 when there was no income.
pub fn savings_rate(income: Amount, expenses: Amount) -> f64 {
    if income.is_zero() {
        return 0.0;
    }
    to_percent((income - expenses).value(), income.value())
}

/// Effectivated transactions of `flow` totalled per category, largest first. `month` limits the
/// transactions to one month.
pub fn category_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
    flow: Flow,
    month: Option<YearMonth>,
) -> Vec<CategoryShare> {
    let mut totals: BTreeMap<Option<&str>, Amount> = BTreeMap::new();
    for t in transactions.iter().filter(|t| {
        t.effectivated && t.flow == flow && month.map_or(true, |m| m.contains(t.date))
    }) {
        *totals.entry(t.category_id.as_deref()).or_default() += t.amount;
    }

    let grand_total: Amount = totals.values().sum();
    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(id, total)| {
            let name = id
                .and_then(|id| categories.iter().find(|c| c.id == id))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| id.unwrap_or(UNCATEGORIZED).to_string());
            let percentage = if grand_total.is_zero() {
                0.0
            } else {
                to_percent(total.value(), grand_total.value())
            };
            CategoryShare {
                category_id: id.map(str::to_string),
                name,
                total,
                percentage,
            }
        })
        .collect();
    shares.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
    shares
}

/// `part` as a percentage of `whole`, rounded to two decimals. Falls back to float arithmetic
/// when the ratio does not fit in a `Decimal`.
fn to_percent(part: Decimal, whole: Decimal) -> f64 {
    match part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(percent) => percent
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string()
            .parse()
            .unwrap_or_default(),
        None => {
            let part = part.to_f64().unwrap_or_default();
            let whole = whole.to_f64().unwrap_or(1.0);
            (part / whole * 10_000.0).round() / 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[test]
    fn test_monthly_trends() {
        let doc = TestEnv::seed_document();
        let trends = monthly_trends(&doc.transactions);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].month.to_string(), "2025-02");
        assert_eq!(trends[0].savings, Amount::from(4100));
        assert_eq!(trends[1].month.to_string(), "2025-03");
        assert_eq!(trends[1].expenses, Amount::from(970));
        assert_eq!(trends[1].savings, Amount::from(4030));
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(Amount::ZERO, Amount::from(10)), None);
        assert_eq!(
            percent_change(Amount::from(900), Amount::from(970)),
            Some(7.78)
        );
        assert_eq!(
            percent_change(Amount::from(200), Amount::from(100)),
            Some(-50.0)
        );
    }

    #[test]
    fn test_savings_rate() {
        assert_eq!(savings_rate(Amount::from(5000), Amount::from(970)), 80.6);
        assert_eq!(savings_rate(Amount::ZERO, Amount::from(970)), 0.0);
    }

    #[test]
    fn test_percentages_of_tiny_bases() {
        let cent = Amount::from_str("0.01").unwrap();
        let huge = Amount::from_str("10000000000000000000000000000").unwrap();
        assert!(savings_rate(cent, huge) < -1e31);
        assert!(percent_change(cent, huge).unwrap() > 1e31);
    }

    #[test]
    fn test_category_breakdown() {
        let doc = TestEnv::seed_document();
        let shares = category_breakdown(
            &doc.transactions,
            &doc.categories,
            Flow::Expense,
            Some("2025-03".parse().unwrap()),
        );
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].name, "Alimentação");
        assert_eq!(shares[0].total, Amount::from(850));
        assert_eq!(shares[0].percentage, 87.63);
        assert_eq!(shares[1].name, "Transporte");
        assert_eq!(shares[1].percentage, 12.37);

        let all_time = category_breakdown(&doc.transactions, &doc.categories, Flow::Expense, None);
        assert_eq!(all_time[0].total, Amount::from(1750));
    }

    #[test]
    fn test_category_breakdown_uncategorized() {
        let mut doc = TestEnv::seed_document();
        doc.transactions[4].effectivated = true;
        let shares = category_breakdown(
            &doc.transactions,
            &doc.categories,
            Flow::Expense,
            Some("2025-03".parse().unwrap()),
        );
        assert!(shares
            .iter()
            .any(|s| s.category_id.is_none() && s.name == UNCATEGORIZED));
    }
}
