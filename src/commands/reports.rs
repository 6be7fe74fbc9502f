//! Read-only reports computed from the document: `summary`, `budgets`, `cards`, `trends` and
//! `upcoming`.

use crate::commands::{open_repo, Out};
use crate::metrics::{
    self, BudgetReport, CardSummary, CardTotals, CategoryShare, Dashboard, MonthTrend,
    UpcomingItem, YearMonth,
};
use crate::model::Flow;
use crate::{Config, Result};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CardsReport {
    pub totals: CardTotals,
    pub cards: Vec<CardSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendsReport {
    /// Limits the breakdowns, not the monthly series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<YearMonth>,
    pub months: Vec<MonthTrend>,
    pub expense_breakdown: Vec<CategoryShare>,
    pub income_breakdown: Vec<CategoryShare>,
}

/// The dashboard for the month that contains `date`.
pub async fn summary(config: &Config, date: NaiveDate) -> Result<Out<Dashboard>> {
    let repo = open_repo(config).await?;
    let dashboard = metrics::dashboard(repo.document(), date);
    let message = format!(
        "Total balance {} across {} accounts, savings rate for {} is {}%",
        dashboard.total_balance,
        dashboard.accounts.len(),
        dashboard.month,
        dashboard.savings_rate
    );
    Ok(Out::new(message, dashboard))
}

pub async fn budgets(config: &Config, month: YearMonth) -> Result<Out<BudgetReport>> {
    let repo = open_repo(config).await?;
    let doc = repo.document();
    let report = metrics::budget_report(&doc.categories, &doc.transactions, month);
    let exceeded = report
        .lines
        .iter()
        .filter(|l| l.status == metrics::BudgetStatus::Exceeded)
        .count();
    let message = format!(
        "{} budgets for {month}, {exceeded} exceeded",
        report.lines.len()
    );
    Ok(Out::new(message, report))
}

pub async fn cards(config: &Config, date: NaiveDate) -> Result<Out<CardsReport>> {
    let repo = open_repo(config).await?;
    let cards = &repo.document().credit_cards;
    let report = CardsReport {
        totals: metrics::card_totals(cards),
        cards: metrics::card_summaries(cards, date),
    };
    let message = format!(
        "{} credit cards using {}% of {}",
        report.cards.len(),
        report.totals.usage_percentage,
        report.totals.limit
    );
    Ok(Out::new(message, report))
}

/// Monthly income and expenses, and the share of each category. `month` limits the category
/// shares to one month.
pub async fn trends(config: &Config, month: Option<YearMonth>) -> Result<Out<TrendsReport>> {
    let repo = open_repo(config).await?;
    let doc = repo.document();
    let report = TrendsReport {
        month,
        months: metrics::monthly_trends(&doc.transactions),
        expense_breakdown: metrics::category_breakdown(
            &doc.transactions,
            &doc.categories,
            Flow::Expense,
            month,
        ),
        income_breakdown: metrics::category_breakdown(
            &doc.transactions,
            &doc.categories,
            Flow::Income,
            month,
        ),
    };
    Ok(Out::new(
        format!("Trends over {} months", report.months.len()),
        report,
    ))
}

/// Pending transactions, recurring occurrences and card bills due within `days` of `date`.
/// Overdue pending transactions are included.
pub async fn upcoming(
    config: &Config,
    date: NaiveDate,
    days: u64,
) -> Result<Out<Vec<UpcomingItem>>> {
    let repo = open_repo(config).await?;
    let doc = repo.document();
    let items = metrics::upcoming(
        &doc.pending_transactions,
        &doc.recurring_transactions,
        &doc.credit_cards,
        date,
        days,
    );
    Ok(Out::new(
        format!("{} items due in the next {days} days", items.len()),
        items,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BudgetStatus;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_summary() {
        let env = TestEnv::with_seed().await;
        let out = summary(&env.config(), TestEnv::today()).await.unwrap();
        let dashboard = out.structure().unwrap();
        assert_eq!(dashboard.accounts.len(), 2);
        assert_eq!(dashboard.month, YearMonth::new(2025, 3).unwrap());
        assert!(out
            .message()
            .starts_with("Total balance R$ 40.420,50 across 2 accounts"));
    }

    #[tokio::test]
    async fn test_budgets() {
        let env = TestEnv::with_seed().await;
        let month = YearMonth::new(2025, 3).unwrap();
        let out = budgets(&env.config(), month).await.unwrap();
        let report = out.structure().unwrap();
        let food = report.lines.iter().find(|l| l.category_id == "c1").unwrap();
        assert_eq!(food.percentage, 106);
        assert_eq!(food.status, BudgetStatus::Exceeded);
        let leisure = report.lines.iter().find(|l| l.category_id == "c4").unwrap();
        assert_eq!(leisure.percentage, 0);
        assert_eq!(out.message(), "3 budgets for 2025-03, 1 exceeded");
    }

    #[tokio::test]
    async fn test_cards() {
        let env = TestEnv::with_seed().await;
        let out = cards(&env.config(), TestEnv::today()).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.cards.len(), 2);
        assert_eq!(report.totals.usage_percentage, 63);
        assert_eq!(out.message(), "2 credit cards using 63% of R$ 8.000,00");
    }

    #[tokio::test]
    async fn test_trends() {
        let env = TestEnv::with_seed().await;
        let march = YearMonth::new(2025, 3).unwrap();
        let out = trends(&env.config(), Some(march)).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.months.len(), 2);
        assert_eq!(report.expense_breakdown[0].name, "Alimentação");
        assert_eq!(report.income_breakdown.len(), 1);
    }

    #[tokio::test]
    async fn test_upcoming_on_empty_data() {
        let env = TestEnv::new().await;
        let out = upcoming(&env.config(), TestEnv::today(), 30).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
        assert_eq!(out.message(), "0 items due in the next 30 days");
    }
}
