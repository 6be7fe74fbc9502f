//! Command handlers for the findash CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod auth;
mod cloud;
mod data;
mod init;
mod records;
mod reports;
mod schedule;

use crate::error::{ErrorType, IntoResult};
use crate::repo::Repository;
use crate::store::Store;
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

pub use auth::{auth, auth_status, auth_verify, sign_out, AuthStatus};
pub use cloud::{cloud_delete, cloud_list, cloud_pull, cloud_push, PullReport, PushReport};
pub use data::{clear, export, import, ClearReport, ExportFormat, ExportReport};
pub use init::init;
pub use records::{create, delete, get, list, update};
pub use reports::{budgets, cards, summary, trends, upcoming, CardsReport, TrendsReport};
pub use schedule::{pending_status, recurring_run};

/// The output type for a command: a message for the user and, optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Logs the message with `info!` and prints the structured data, if any, to stdout as JSON.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            match serde_json::to_string_pretty(structure) {
                Ok(json) => println!("{json}"),
                Err(e) => debug!("Unable to serialize the command output: {e}"),
            }
        }
    }
}

/// Loads the configuration from the findash home directory.
pub async fn config(findash_home: &Path) -> Result<Config> {
    Config::load(findash_home)
        .await
        .pub_result(ErrorType::Config)
}

async fn open_repo(config: &Config) -> Result<Repository> {
    Repository::open(Store::new(config)).await
}
