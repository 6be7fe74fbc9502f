//! Figures derived from the document.
//!
//! Everything here is a pure function of its inputs. Nothing reads the clock: callers pass "today"
//! in, which keeps reports reproducible and lets the CLI take a `--date`.

mod balances;
mod budget;
mod cards;
mod dashboard;
mod dates;
mod pending;
mod recurring;
mod trends;

pub use balances::{
    derived_balance, projected_balance, total_balance, transaction_totals, TransactionTotals,
};
pub use budget::{
    budget_percentage, budget_report, budget_status, category_spent, BudgetLine, BudgetReport,
    BudgetStatus,
};
pub use cards::{
    card_summaries, card_totals, credit_usage_percentage, usage_level, CardSummary, CardTotals,
    UsageLevel,
};
pub use dashboard::{dashboard, AccountBalance, Dashboard};
pub use dates::{add_months, days_until, days_until_due, YearMonth};
pub use pending::{pending_summary, upcoming, PendingSummary, UpcomingItem, UpcomingKind};
pub use recurring::{monthly_equivalent, recurring_monthly_totals, RecurringTotals};
pub use trends::{
    category_breakdown, monthly_trends, percent_change, savings_rate, CategoryShare, MonthTrend,
    UNCATEGORIZED,
};
