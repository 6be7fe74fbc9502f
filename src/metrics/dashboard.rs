use crate::metrics::balances::{
    derived_balance, projected_balance, total_balance, transaction_totals, TransactionTotals,
};
use crate::metrics::budget::{budget_report, BudgetStatus};
use crate::metrics::cards::{card_totals, CardTotals};
use crate::metrics::pending::{pending_summary, PendingSummary};
use crate::metrics::recurring::{recurring_monthly_totals, RecurringTotals};
use crate::metrics::trends::{percent_change, savings_rate};
use crate::metrics::YearMonth;
use crate::model::{AccountType, Amount, Document, Transaction};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct AccountBalance {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// As entered by the user.
    pub balance: Amount,
    pub derived: Amount,
    pub projected: Amount,
}

/// The figures shown on the dashboard for the month that contains `date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub month: YearMonth,
    pub total_balance: Amount,
    pub accounts: Vec<AccountBalance>,
    pub month_totals: TransactionTotals,
    pub previous_month_totals: TransactionTotals,
    pub income_change: Option<f64>,
    pub expense_change: Option<f64>,
    pub savings_rate: f64,
    pub cards: CardTotals,
    pub recurring: RecurringTotals,
    pub pending: PendingSummary,
    pub budgets_exceeded: usize,
    pub budgets_warning: usize,
}

pub fn dashboard(doc: &Document, today: NaiveDate) -> Dashboard {
    let month = YearMonth::of(today);
    let month_totals = totals_for(&doc.transactions, month);
    let previous_month_totals = totals_for(&doc.transactions, month.previous());

    let accounts = doc
        .accounts
        .iter()
        .map(|a| AccountBalance {
            id: a.id.clone(),
            name: a.name.clone(),
            account_type: a.account_type,
            balance: a.balance,
            derived: derived_balance(a, &doc.transactions),
            projected: projected_balance(a, &doc.transactions),
        })
        .collect();

    let budgets = budget_report(&doc.categories, &doc.transactions, month);
    let count = |status: BudgetStatus| budgets.lines.iter().filter(|l| l.status == status).count();

    Dashboard {
        date: today,
        month,
        total_balance: total_balance(&doc.accounts),
        accounts,
        income_change: percent_change(previous_month_totals.income, month_totals.income),
        expense_change: percent_change(previous_month_totals.expenses, month_totals.expenses),
        savings_rate: savings_rate(month_totals.income, month_totals.expenses),
        month_totals,
        previous_month_totals,
        cards: card_totals(&doc.credit_cards),
        recurring: recurring_monthly_totals(&doc.recurring_transactions),
        pending: pending_summary(&doc.pending_transactions, today),
        budgets_exceeded: count(BudgetStatus::Exceeded),
        budgets_warning: count(BudgetStatus::Warning),
    }
}

fn totals_for(transactions: &[Transaction], month: YearMonth) -> TransactionTotals {
    transaction_totals(
        transactions
            .iter()
            .filter(|t| t.effectivated && month.contains(t.date)),
    )
}
