use crate::model::{Account, Amount, Flow, Transaction};
use serde::Serialize;

/// Income and expense sums over a set of transactions.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct TransactionTotals {
    pub income: Amount,
    pub expenses: Amount,
    /// `income - expenses`
    pub net: Amount,
}

/// The sum of the balances entered for `accounts`.
pub fn total_balance(accounts: &[Account]) -> Amount {
    accounts.iter().map(|a| a.balance).sum()
}

/// The account's `initial_balance` plus its effectivated transactions.
pub fn derived_balance(account: &Account, transactions: &[Transaction]) -> Amount {
    balance_from(account, transactions.iter().filter(|t| t.effectivated))
}

/// Like `derived_balance`, but scheduled transactions count too.
pub fn projected_balance(account: &Account, transactions: &[Transaction]) -> Amount {
    balance_from(account, transactions.iter())
}

fn balance_from<'a>(account: &Account, transactions: impl Iterator<Item = &'a Transaction>) -> Amount {
    let movement: Amount = transactions
        .filter(|t| t.account_id.as_deref() == Some(account.id.as_str()))
        .map(Transaction::signed_amount)
        .sum();
    account.initial_balance.unwrap_or_default() + movement
}

pub fn transaction_totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> TransactionTotals {
    let mut totals = TransactionTotals::default();
    for t in transactions {
        match t.flow {
            Flow::Income => totals.income += t.amount,
            Flow::Expense => totals.expenses += t.amount,
        }
    }
    totals.net = totals.income - totals.expenses;
    totals
}
