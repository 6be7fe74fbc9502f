//! These structs provide the CLI interface for the findash CLI.

use crate::commands::ExportFormat;
use crate::metrics::YearMonth;
use crate::model::{PendingStatus, Resource};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// findash: a personal finance dashboard for the command line.
///
/// Keeps your accounts, transactions, credit cards, budget categories, recurring and pending
/// transactions in a single JSON file and reports on them: balances, budgets, card usage, trends
/// and what is due next.
///
/// Backups of the whole data file can be pushed to and pulled from Google Drive. You will need to
/// set up a Google OAuth client for this and pass its credentials to `findash init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. The data directory is $HOME/findash unless you
    /// pass --findash-home or set FINDASH_HOME.
    ///
    /// If you want cloud backups, download the OAuth client credentials of a Google Cloud project
    /// with the Drive API enabled and pass them as --client-secret. You can also copy the file to
    /// .secrets/client_secret.json later.
    Init(InitArgs),
    /// Sign in to Google Drive via OAuth.
    Auth(AuthArgs),
    /// Forget the saved Google Drive tokens.
    SignOut,
    /// List the records of one kind.
    List(ResourceArgs),
    /// Show one record.
    Get(RecordArgs),
    /// Create a record from a JSON object. A new id is assigned.
    Create(CreateArgs),
    /// Change a record. The keys in the JSON object replace the record's values.
    Update(UpdateArgs),
    /// Delete a record.
    Delete(DeleteArgs),
    /// Write all data to a file.
    Export(ExportArgs),
    /// Replace all data with the contents of a JSON file. The current data is backed up first.
    Import(ImportArgs),
    /// Delete all data. A backup is saved first.
    Clear,
    /// Balances, this month's totals, card usage, budgets and pending transactions.
    Summary(DateArgs),
    /// How each budget category is doing in a month.
    Budgets(BudgetsArgs),
    /// Credit card usage and due dates.
    Cards(DateArgs),
    /// Income and expenses per month, and the share of each category.
    Trends(TrendsArgs),
    /// Pending transactions, recurring transactions and card bills that are due soon.
    Upcoming(UpcomingArgs),
    /// Change the status of a pending transaction.
    PendingStatus(PendingStatusArgs),
    /// Create the transactions of the recurring templates that are due.
    RecurringRun(DateArgs),
    /// Push, pull and manage backups in Google Drive.
    Cloud(CloudArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where findash data and configuration is held. Defaults to ~/findash
    #[arg(long, env = "FINDASH_HOME", default_value_t = default_findash_home())]
    findash_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, findash_home: PathBuf) -> Self {
        Self {
            log_level,
            findash_home: findash_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn findash_home(&self) -> &DisplayPath {
        &self.findash_home
    }
}

/// (Not shown): Args for the `findash init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The path to your downloaded OAuth client credentials. This file will be copied to the
    /// default secrets location in the main data directory.
    #[arg(long)]
    client_secret: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(client_secret: Option<PathBuf>) -> Self {
        Self { client_secret }
    }

    pub fn client_secret(&self) -> Option<&Path> {
        self.client_secret.as_deref()
    }
}

/// (Not shown): Args for the `findash auth` command.
#[derive(Debug, Parser, Clone)]
pub struct AuthArgs {
    /// Verify and refresh authentication.
    #[arg(long, conflicts_with = "status")]
    verify: bool,

    /// Only report whether tokens are saved.
    #[arg(long)]
    status: bool,
}

impl AuthArgs {
    pub fn new(verify: bool, status: bool) -> Self {
        Self { verify, status }
    }

    pub fn verify(&self) -> bool {
        self.verify
    }

    pub fn status(&self) -> bool {
        self.status
    }
}

/// (Not shown): Args that name a kind of record.
#[derive(Debug, Parser, Clone)]
pub struct ResourceArgs {
    #[arg(value_enum)]
    resource: Resource,
}

impl ResourceArgs {
    pub fn new(resource: Resource) -> Self {
        Self { resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }
}

/// (Not shown): Args that name one record.
#[derive(Debug, Parser, Clone)]
pub struct RecordArgs {
    #[arg(value_enum)]
    resource: Resource,

    /// The id of the record.
    id: String,
}

impl RecordArgs {
    pub fn new(resource: Resource, id: impl Into<String>) -> Self {
        Self {
            resource,
            id: id.into(),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

/// (Not shown): Args for the `findash create` command.
#[derive(Debug, Parser, Clone)]
pub struct CreateArgs {
    #[arg(value_enum)]
    resource: Resource,

    /// The record as a JSON object, e.g. '{"name": "Wallet", "type": "cash", "balance": 100}'
    #[arg(long)]
    data: String,
}

impl CreateArgs {
    pub fn new(resource: Resource, data: impl Into<String>) -> Self {
        Self {
            resource,
            data: data.into(),
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn data(&self) -> &str {
        &self.data
    }
}

/// (Not shown): Args for the `findash update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    #[clap(flatten)]
    record: RecordArgs,

    /// The values to change as a JSON object, e.g. '{"balance": 250.75}'
    #[arg(long)]
    data: String,
}

impl UpdateArgs {
    pub fn new(record: RecordArgs, data: impl Into<String>) -> Self {
        Self {
            record,
            data: data.into(),
        }
    }

    pub fn record(&self) -> &RecordArgs {
        &self.record
    }

    pub fn data(&self) -> &str {
        &self.data
    }
}

/// (Not shown): Args for the `findash delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    #[clap(flatten)]
    record: RecordArgs,

    /// Delete an account or category even if other records use it. Those references are cleared.
    #[arg(long)]
    force: bool,
}

impl DeleteArgs {
    pub fn new(record: RecordArgs, force: bool) -> Self {
        Self { record, force }
    }

    pub fn record(&self) -> &RecordArgs {
        &self.record
    }

    pub fn force(&self) -> bool {
        self.force
    }
}

/// (Not shown): Args for the `findash export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// The file to write. Defaults to financial-dashboard-<date>.<format> in the current
    /// directory.
    #[arg(long)]
    out: Option<PathBuf>,

    /// `json` writes everything, `csv` writes the transactions.
    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    format: ExportFormat,
}

impl ExportArgs {
    pub fn new(out: Option<PathBuf>, format: ExportFormat) -> Self {
        Self { out, format }
    }

    pub fn out(&self) -> Option<&Path> {
        self.out.as_deref()
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }
}

/// (Not shown): Args for the `findash import` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportArgs {
    /// A .json file, usually one written by `findash export`.
    file: PathBuf,
}

impl ImportArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// (Not shown): Args for commands that depend on the current date.
#[derive(Debug, Parser, Clone)]
pub struct DateArgs {
    /// Use this date, YYYY-MM-DD, as today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl DateArgs {
    pub fn new(date: Option<NaiveDate>) -> Self {
        Self { date }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// (Not shown): Args for the `findash budgets` command.
#[derive(Debug, Parser, Clone)]
pub struct BudgetsArgs {
    /// The month, YYYY-MM. Defaults to the current month.
    #[arg(long)]
    month: Option<YearMonth>,
}

impl BudgetsArgs {
    pub fn new(month: Option<YearMonth>) -> Self {
        Self { month }
    }

    pub fn month(&self) -> Option<YearMonth> {
        self.month
    }
}

/// (Not shown): Args for the `findash trends` command.
#[derive(Debug, Parser, Clone)]
pub struct TrendsArgs {
    /// Limit the category shares to this month, YYYY-MM.
    #[arg(long)]
    month: Option<YearMonth>,
}

impl TrendsArgs {
    pub fn new(month: Option<YearMonth>) -> Self {
        Self { month }
    }

    pub fn month(&self) -> Option<YearMonth> {
        self.month
    }
}

/// (Not shown): Args for the `findash upcoming` command.
#[derive(Debug, Parser, Clone)]
pub struct UpcomingArgs {
    #[clap(flatten)]
    date: DateArgs,

    /// How many days ahead to look.
    #[arg(long, default_value_t = 30)]
    days: u64,
}

impl UpcomingArgs {
    pub fn new(date: Option<NaiveDate>, days: u64) -> Self {
        Self {
            date: DateArgs::new(date),
            days,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date.date()
    }

    pub fn days(&self) -> u64 {
        self.days
    }
}

/// (Not shown): Args for the `findash pending-status` command.
#[derive(Debug, Parser, Clone)]
pub struct PendingStatusArgs {
    /// The id of the pending transaction.
    id: String,

    #[arg(value_enum)]
    status: PendingStatus,

    /// Also record the payment as a transaction dated today. Only with `paid`.
    #[arg(long)]
    record: bool,

    #[clap(flatten)]
    date: DateArgs,
}

impl PendingStatusArgs {
    pub fn new(id: impl Into<String>, status: PendingStatus, record: bool) -> Self {
        Self {
            id: id.into(),
            status,
            record,
            date: DateArgs::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> PendingStatus {
        self.status
    }

    pub fn record(&self) -> bool {
        self.record
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date.date()
    }
}

/// (Not shown): Args for the `findash cloud` command.
#[derive(Debug, Parser, Clone)]
pub struct CloudArgs {
    #[command(subcommand)]
    action: CloudAction,
}

impl CloudArgs {
    pub fn new(action: CloudAction) -> Self {
        Self { action }
    }

    pub fn action(&self) -> &CloudAction {
        &self.action
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CloudAction {
    /// Upload all data as today's backup. An earlier backup from today is replaced.
    Push(DateArgs),
    /// Replace all local data with a backup. The local data is backed up first.
    Pull {
        /// The backup to restore. Defaults to the most recent one.
        #[arg(long)]
        id: Option<String>,
    },
    /// List the backups, most recent first.
    List,
    /// Delete a backup.
    Delete {
        /// The id of the backup, as shown by `findash cloud list`.
        id: String,
    },
}

fn default_findash_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("findash"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --findash-home or FINDASH_HOME instead of relying on the \
                default findash home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("findash")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
