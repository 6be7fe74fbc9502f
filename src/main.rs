use chrono::{Local, NaiveDate};
use clap::Parser;
use findash::args::{Args, CloudAction, Command};
use findash::metrics::YearMonth;
use findash::{commands, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().findash_home().path();

    // When FINDASH_IN_TEST_MODE is set and non-empty, cloud commands use a directory under the
    // findash home instead of Google Drive.
    let mode = Mode::from_env();
    let today = Local::now().date_naive();
    let or_today = |date: Option<NaiveDate>| date.unwrap_or(today);

    // Every command but init needs an initialized findash home.
    let load_config = || commands::config(home);

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args.client_secret())
            .await?
            .print(),

        Command::Auth(auth_args) => {
            let config = load_config().await?;
            if auth_args.verify() {
                commands::auth_verify(&config).await?.print()
            } else if auth_args.status() {
                commands::auth_status(&config).await?.print()
            } else {
                commands::auth(&config).await?.print()
            }
        }

        Command::SignOut => commands::sign_out(&load_config().await?).await?.print(),

        Command::List(a) => commands::list(&load_config().await?, a.resource())
            .await?
            .print(),

        Command::Get(a) => commands::get(&load_config().await?, a.resource(), a.id())
            .await?
            .print(),

        Command::Create(a) => commands::create(&load_config().await?, a.resource(), a.data())
            .await?
            .print(),

        Command::Update(a) => {
            let config = load_config().await?;
            let record = a.record();
            commands::update(&config, record.resource(), record.id(), a.data())
                .await?
                .print()
        }

        Command::Delete(a) => {
            let config = load_config().await?;
            let record = a.record();
            commands::delete(&config, record.resource(), record.id(), a.force())
                .await?
                .print()
        }

        Command::Export(a) => {
            let config = load_config().await?;
            commands::export(&config, a.out(), a.format(), today)
                .await?
                .print()
        }

        Command::Import(a) => commands::import(&load_config().await?, a.file())
            .await?
            .print(),

        Command::Clear => commands::clear(&load_config().await?).await?.print(),

        Command::Summary(a) => commands::summary(&load_config().await?, or_today(a.date()))
            .await?
            .print(),

        Command::Budgets(a) => {
            let config = load_config().await?;
            let month = a.month().unwrap_or_else(|| YearMonth::of(today));
            commands::budgets(&config, month).await?.print()
        }

        Command::Cards(a) => commands::cards(&load_config().await?, or_today(a.date()))
            .await?
            .print(),

        Command::Trends(a) => commands::trends(&load_config().await?, a.month())
            .await?
            .print(),

        Command::Upcoming(a) => {
            let config = load_config().await?;
            commands::upcoming(&config, or_today(a.date()), a.days())
                .await?
                .print()
        }

        Command::PendingStatus(a) => commands::pending_status(
            &load_config().await?,
            a.id(),
            a.status(),
            a.record(),
            or_today(a.date()),
        )
        .await?
        .print(),

        Command::RecurringRun(a) => {
            let config = load_config().await?;
            commands::recurring_run(&config, or_today(a.date()))
                .await?
                .print()
        }

        Command::Cloud(cloud_args) => {
            let config = load_config().await?;
            match cloud_args.action() {
                CloudAction::Push(a) => commands::cloud_push(&config, mode, or_today(a.date()))
                    .await?
                    .print(),
                CloudAction::Pull { id } => commands::cloud_pull(&config, mode, id.as_deref())
                    .await?
                    .print(),
                CloudAction::List => commands::cloud_list(&config, mode).await?.print(),
                CloudAction::Delete { id } => commands::cloud_delete(&config, mode, id)
                    .await?
                    .print(),
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use findash::ErrorType;

    fn args(home: &std::path::Path, command: &[&str]) -> Args {
        let home = home.to_string_lossy().to_string();
        let argv = ["findash", "--findash-home", home.as_str()];
        Args::parse_from(argv.iter().chain(command.iter()))
    }

    #[tokio::test]
    async fn test_commands_before_and_after_init() {
        let tmp = tempfile::TempDir::new().unwrap();
        let home = tmp.path().join("findash");

        let err = main_inner(args(&home, &["list", "accounts"]))
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);

        main_inner(args(&home, &["init"])).await.unwrap();
        main_inner(args(&home, &["list", "accounts"])).await.unwrap();

        let err = main_inner(args(&home, &["init"])).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
