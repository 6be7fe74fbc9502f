use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file with default settings
/// - Copies `secret_file`, if given, into its default location in the data dir.
///
/// # Arguments
/// - `findash_home` - The directory that will be the root of data directory, e.g. `$HOME/findash`
/// - `secret_file` - The downloaded OAuth 2.0 client credentials JSON, needed only for cloud sync.
///
/// # Errors
/// - Returns an error if the directory was already initialized or any file operations fail.
pub async fn init(findash_home: &Path, secret_file: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(findash_home, secret_file)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the findash directory at {}",
        config.root().display()
    )
    .into())
}

#[tokio::test]
async fn test_init_twice_is_a_config_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let home = tmp.path().join("findash");
    let out = init(&home, None).await.unwrap();
    assert!(out.message().contains("Successfully created"));
    assert!(home.join("config.json").is_file());

    let err = init(&home, None).await.unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Config);
}
