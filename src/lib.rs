//! findash: a personal finance dashboard over a single local JSON document, with whole-document
//! backups to Google Drive.

mod api;
pub mod args;
pub mod backup;
pub mod commands;
mod config;
mod error;
pub mod metrics;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod store;
mod utils;

#[cfg(test)]
mod test;

pub use api::{Mode, RemoteFile};
pub use config::Config;
pub use error::{Error, ErrorType, Result};
