use crate::metrics::dates::{days_until, days_until_due};
use crate::model::{Amount, CreditCard, Flow, PendingTransaction, RecurringTransaction};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct PendingSummary {
    /// Pending income still to be received.
    pub receivable: Amount,
    /// Pending expenses still to be paid.
    pub payable: Amount,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub overdue_amount: Amount,
}

/// Where an upcoming item comes from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpcomingKind {
    Pending,
    Recurring,
    CreditCard,
}

serde_plain::derive_display_from_serialize!(UpcomingKind);

/// Something that is due on a given date.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct UpcomingItem {
    pub kind: UpcomingKind,
    pub id: String,
    pub description: String,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub flow: Flow,
    pub date: NaiveDate,
    /// Negative when overdue.
    pub days_until: i64,
}

/// Totals over the transactions that are still pending. Paid and canceled ones are ignored.
pub fn pending_summary(pending: &[PendingTransaction], today: NaiveDate) -> PendingSummary {
    let mut summary = PendingSummary::default();
    for p in pending.iter().filter(|p| p.is_pending()) {
        summary.pending_count += 1;
        match p.flow {
            Flow::Income => summary.receivable += p.amount,
            Flow::Expense => summary.payable += p.amount,
        }
        if p.is_overdue(today) {
            summary.overdue_count += 1;
            summary.overdue_amount += p.amount;
        }
    }
    summary
}

/// Everything due from now until `days` days after `today`, soonest first.
///
/// # Arguments
/// - `pending`: pending transactions, overdue ones included.
/// - `recurring`: active templates whose next occurrence falls in the window.
/// - `cards`: cards with a balance whose bill falls in the window.
pub fn upcoming(
    pending: &[PendingTransaction],
    recurring: &[RecurringTransaction],
    cards: &[CreditCard],
    today: NaiveDate,
    days: u64,
) -> Vec<UpcomingItem> {
    let horizon = today.checked_add_days(Days::new(days)).unwrap_or(today);
    let mut items = Vec::new();

    for p in pending
        .iter()
        .filter(|p| p.is_pending() && p.due_date <= horizon)
    {
        items.push(UpcomingItem {
            kind: UpcomingKind::Pending,
            id: p.id.clone(),
            description: p.description.clone(),
            amount: p.amount,
            flow: p.flow,
            date: p.due_date,
            days_until: days_until(p.due_date, today),
        });
    }

    for r in recurring.iter().filter(|r| r.is_active) {
        let next = r.next_occurrence();
        if next < today || next > horizon || r.has_ended_by(next) {
            continue;
        }
        items.push(UpcomingItem {
            kind: UpcomingKind::Recurring,
            id: r.id.clone(),
            description: r.description.clone(),
            amount: r.amount,
            flow: r.flow,
            date: next,
            days_until: days_until(next, today),
        });
    }

    for c in cards.iter().filter(|c| c.current_balance.is_positive()) {
        let days_until = days_until_due(c.due_date, today);
        let Some(date) = today.checked_add_days(Days::new(days_until.unsigned_abs())) else {
            continue;
        };
        if date > horizon {
            continue;
        }
        items.push(UpcomingItem {
            kind: UpcomingKind::CreditCard,
            id: c.id.clone(),
            description: c.name.clone(),
            amount: c.current_balance,
            flow: Flow::Expense,
            date,
            days_until,
        });
    }

    items.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.description.cmp(&b.description))
    });
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{date, TestEnv};

    #[test]
    fn test_pending_summary() {
        let doc = TestEnv::seed_document();
        let summary = pending_summary(&doc.pending_transactions, TestEnv::today());
        assert_eq!(summary.receivable, Amount::from(1500));
        assert_eq!(summary.payable, Amount::from(1800));
        assert_eq!(summary.pending_count, 2);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.overdue_amount, Amount::from(1800));
    }

    #[test]
    fn test_upcoming_month() {
        let doc = TestEnv::seed_document();
        let items = upcoming(
            &doc.pending_transactions,
            &doc.recurring_transactions,
            &doc.credit_cards,
            TestEnv::today(),
            30,
        );
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "r1", "p2", "k2", "r2", "k1"]);

        assert_eq!(items[0].days_until, -2);
        assert_eq!(items[1].kind, UpcomingKind::Recurring);
        assert_eq!(items[1].date, date("2025-03-15"));
        assert_eq!(items[3].kind, UpcomingKind::CreditCard);
        assert_eq!(items[3].amount, Amount::from(900));
        assert_eq!(items[5].date, date("2025-04-10"));
    }

    #[test]
    fn test_upcoming_week() {
        let doc = TestEnv::seed_document();
        let items = upcoming(
            &doc.pending_transactions,
            &doc.recurring_transactions,
            &doc.credit_cards,
            TestEnv::today(),
            7,
        );
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "r1"]);
    }
}
