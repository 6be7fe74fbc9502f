use crate::commands::{open_repo, Out};
use crate::model::PendingStatus;
use crate::schedule::{self, RunReport, Settled};
use crate::{Config, Result};
use chrono::NaiveDate;

/// Sets the status of a pending transaction. With `record`, the payment is also added as a
/// transaction dated `today`.
pub async fn pending_status(
    config: &Config,
    id: &str,
    status: PendingStatus,
    record: bool,
    today: NaiveDate,
) -> Result<Out<Settled>> {
    let mut repo = open_repo(config).await?;
    let settled = schedule::settle_pending(&mut repo, id, status, record, today).await?;
    let message = match &settled.transaction {
        Some(t) => format!(
            "Pending transaction '{id}' is now {status}, recorded as transaction '{}'",
            t.id
        ),
        None => format!("Pending transaction '{id}' is now {status}"),
    };
    Ok(Out::new(message, settled))
}

/// Creates the transactions of every recurring template that is due on or before `today`.
pub async fn recurring_run(config: &Config, today: NaiveDate) -> Result<Out<RunReport>> {
    let mut repo = open_repo(config).await?;
    let report = schedule::run_recurring(&mut repo, today).await?;
    let message = if report.created.is_empty() {
        "No recurring transactions are due".to_string()
    } else {
        format!(
            "Created {} transactions from {} recurring templates",
            report.created.len(),
            report.advanced.len()
        )
    };
    Ok(Out::new(message, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorType;
    use crate::test::{date, TestEnv};

    #[tokio::test]
    async fn test_recurring_run_twice() {
        let env = TestEnv::with_seed().await;
        let config = env.config();

        let out = recurring_run(&config, date("2025-03-20")).await.unwrap();
        assert_eq!(out.structure().unwrap().created.len(), 1);
        assert_eq!(
            out.message(),
            "Created 1 transactions from 1 recurring templates"
        );

        let out = recurring_run(&config, date("2025-03-20")).await.unwrap();
        assert!(out.structure().unwrap().created.is_empty());
        assert_eq!(out.message(), "No recurring transactions are due");
        assert_eq!(env.store().load().await.unwrap().transactions.len(), 8);
    }

    #[tokio::test]
    async fn test_pending_status() {
        let env = TestEnv::with_seed().await;
        let config = env.config();

        let today = TestEnv::today();
        let out = pending_status(&config, "p2", PendingStatus::Canceled, false, today)
            .await
            .unwrap();
        assert_eq!(out.message(), "Pending transaction 'p2' is now canceled");
        assert!(out.structure().unwrap().transaction.is_none());

        let out = pending_status(&config, "p1", PendingStatus::Paid, true, today)
            .await
            .unwrap();
        let recorded = out.structure().unwrap().transaction.clone().unwrap();
        assert!(recorded.effectivated);
        assert_eq!(recorded.date, today);

        let err = pending_status(&config, "nope", PendingStatus::Paid, false, today)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
    }
}
