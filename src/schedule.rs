//! Turning schedules into transactions.
//!
//! Recurring templates are advanced occurrence by occurrence and every occurrence that is due by
//! a given date becomes a scheduled (not effectivated) transaction. Pending transactions can be
//! settled, optionally recording the payment as an effectivated transaction.

use crate::error::{Error, ErrorType, Result};
use crate::metrics::{add_months, YearMonth};
use crate::model::{
    Frequency, PendingStatus, PendingTransaction, RecurringTransaction, Transaction,
};
use crate::repo::Repository;
use crate::utils;
use anyhow::anyhow;
use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

/// The most occurrences generated for one template in a single run.
pub const MAX_OCCURRENCES: usize = 366;

/// What a recurring run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub created: Vec<Transaction>,
    pub advanced: Vec<Advanced>,
    /// Templates switched off because they went past their end date.
    pub deactivated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advanced {
    pub id: String,
    pub next_date: NaiveDate,
}

/// The result of changing the status of a pending transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settled {
    pub pending: PendingTransaction,
    /// The transaction recorded for the payment, if one was requested.
    pub transaction: Option<Transaction>,
}

/// The occurrence that follows `from`.
///
/// Weekly templates with a `day_of_week` move to the next such weekday. Monthly and yearly
/// templates keep their `day_of_month`, moved back to the end of shorter months.
pub fn advance(recurring: &RecurringTransaction, from: NaiveDate) -> NaiveDate {
    match recurring.frequency {
        Frequency::Daily => from + Days::new(1),
        Frequency::Weekly => match recurring.day_of_week {
            Some(dow) => {
                let today = from.weekday().num_days_from_sunday();
                let mut ahead = (7 + dow % 7 - today) % 7;
                if ahead == 0 {
                    ahead = 7;
                }
                from + Days::new(u64::from(ahead))
            }
            None => from + Days::new(7),
        },
        Frequency::Monthly => keep_day(recurring, add_months(from, 1)),
        Frequency::Yearly => keep_day(recurring, add_months(from, 12)),
    }
}

fn keep_day(recurring: &RecurringTransaction, date: NaiveDate) -> NaiveDate {
    match recurring.day_of_month {
        Some(day) => YearMonth::of(date).day_clamped(day),
        None => date,
    }
}

/// The occurrences of an active template that are due on or before `today`, and the occurrence
/// that follows them. Occurrences past the template's end date are not due.
pub fn due_occurrences(
    recurring: &RecurringTransaction,
    today: NaiveDate,
) -> (Vec<NaiveDate>, NaiveDate) {
    let mut next = recurring.next_occurrence();
    let mut due = Vec::new();
    if !recurring.is_active {
        return (due, next);
    }
    while next <= today && !recurring.has_ended_by(next) && due.len() < MAX_OCCURRENCES {
        due.push(next);
        next = advance(recurring, next);
    }
    (due, next)
}

/// Creates a scheduled transaction for every due occurrence of every active template and moves
/// the templates' `next_date` forward. Nothing is written when nothing is due.
pub async fn run_recurring(repo: &mut Repository, today: NaiveDate) -> Result<RunReport> {
    let anything_due = repo.list::<RecurringTransaction>().iter().any(|r| {
        let (due, next) = due_occurrences(r, today);
        r.is_active && (!due.is_empty() || r.has_ended_by(next))
    });
    if !anything_due {
        debug!("No recurring transactions are due on {today}");
        return Ok(RunReport::default());
    }

    let report = repo
        .modify(|doc| {
            let mut report = RunReport::default();
            for r in doc.recurring_transactions.iter_mut().filter(|r| r.is_active) {
                let (due, next) = due_occurrences(r, today);
                for date in &due {
                    report.created.push(occurrence(r, *date));
                }
                if !due.is_empty() {
                    r.next_date = Some(next);
                    r.updated_at = Some(Utc::now());
                    report.advanced.push(Advanced {
                        id: r.id.clone(),
                        next_date: next,
                    });
                }
                if r.has_ended_by(next) {
                    r.is_active = false;
                    r.updated_at = Some(Utc::now());
                    report.deactivated.push(r.id.clone());
                }
            }
            doc.transactions.extend(report.created.iter().cloned());
            report
        })
        .await?;

    info!(
        "Created {} transactions from {} recurring transactions",
        report.created.len(),
        report.advanced.len()
    );
    Ok(report)
}

fn occurrence(recurring: &RecurringTransaction, date: NaiveDate) -> Transaction {
    let now = Utc::now();
    Transaction {
        id: utils::generate_id(),
        description: recurring.description.clone(),
        amount: recurring.amount,
        flow: recurring.flow,
        category_id: recurring.category_id.clone(),
        account_id: recurring.account_id.clone(),
        date,
        notes: recurring.notes.clone(),
        effectivated: false,
        created_at: Some(now),
        updated_at: Some(now),
        extra: Default::default(),
    }
}

/// Sets the status of the pending transaction with `id`.
///
/// # Arguments
/// - `record`: also record the payment as an effectivated transaction dated `today`. Only allowed
///   when the new status is `paid`.
///
/// # Errors
/// - `NotFound` when there is no such pending transaction.
/// - `Invalid` when `record` is set for a status other than `paid`, or the transaction was already
///   paid.
pub async fn settle_pending(
    repo: &mut Repository,
    id: &str,
    status: PendingStatus,
    record: bool,
    today: NaiveDate,
) -> Result<Settled> {
    let Some(pending) = repo.get::<PendingTransaction>(id).cloned() else {
        return Err(Error::new(
            ErrorType::NotFound,
            anyhow!("There is no pending transaction with id '{id}'"),
        ));
    };
    if record {
        if status != PendingStatus::Paid {
            return Err(Error::new(
                ErrorType::Invalid,
                anyhow!("Only a payment can be recorded, but the new status is '{status}'"),
            ));
        }
        if pending.status == PendingStatus::Paid {
            return Err(Error::new(
                ErrorType::Invalid,
                anyhow!("The pending transaction '{id}' is already paid"),
            ));
        }
    }

    let transaction = if record {
        let payment = Transaction {
            id: String::new(),
            description: pending.description.clone(),
            amount: pending.amount,
            flow: pending.flow,
            category_id: pending.category_id.clone(),
            account_id: pending.account_id.clone(),
            date: today,
            notes: pending.notes.clone(),
            effectivated: true,
            created_at: None,
            updated_at: None,
            extra: Default::default(),
        };
        Some(repo.insert(payment).await?)
    } else {
        None
    };

    let pending = repo
        .update::<PendingTransaction>(id, json!({ "status": status }))
        .await?
        .ok_or_else(|| {
            Error::new(
                ErrorType::NotFound,
                anyhow!("There is no pending transaction with id '{id}'"),
            )
        })?;

    Ok(Settled {
        pending,
        transaction,
    })
}
