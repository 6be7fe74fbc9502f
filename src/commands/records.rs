//! Generic record commands: `list`, `get`, `create`, `update` and `delete` for any resource.

use crate::commands::{open_repo, Out};
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::Resource;
use crate::repo::{DeletePolicy, Deleted};
use crate::{Config, Result};
use anyhow::{anyhow, Context};
use serde_json::Value;

pub async fn list(config: &Config, resource: Resource) -> Result<Out<Vec<Value>>> {
    let repo = open_repo(config).await?;
    let records = repo.list_values(resource)?;
    Ok(Out::new(
        format!("Found {} {resource}", records.len()),
        records,
    ))
}

/// # Errors
/// `NotFound` when there is no record with `id`.
pub async fn get(config: &Config, resource: Resource, id: &str) -> Result<Out<Value>> {
    let repo = open_repo(config).await?;
    let record = repo
        .get_value(resource, id)?
        .ok_or_else(|| not_found(resource, id))?;
    Ok(Out::new(format!("Found {} '{id}'", resource.singular()), record))
}

/// Creates a record from `data`, a JSON object. Any `id` in `data` is replaced.
pub async fn create(config: &Config, resource: Resource, data: &str) -> Result<Out<Value>> {
    let data = parse_object(data)?;
    let mut repo = open_repo(config).await?;
    let record = repo.create_value(resource, data).await?;
    let id = record.get("id").and_then(Value::as_str).unwrap_or_default();
    let message = format!("Created {} '{id}'", resource.singular());
    Ok(Out::new(message, record))
}

/// Merges the top-level keys of `data` into the record with `id`.
///
/// # Errors
/// `NotFound` when there is no record with `id`, `Invalid` when the result is not a valid record.
pub async fn update(
    config: &Config,
    resource: Resource,
    id: &str,
    data: &str,
) -> Result<Out<Value>> {
    let patch = parse_object(data)?;
    let mut repo = open_repo(config).await?;
    let record = repo
        .update_value(resource, id, patch)
        .await?
        .ok_or_else(|| not_found(resource, id))?;
    Ok(Out::new(
        format!("Updated {} '{id}'", resource.singular()),
        record,
    ))
}

/// Deletes the record with `id`. Accounts and categories that other records use are only deleted
/// with `force`, which clears those references.
pub async fn delete(
    config: &Config,
    resource: Resource,
    id: &str,
    force: bool,
) -> Result<Out<Deleted>> {
    let policy = if force {
        DeletePolicy::Nullify
    } else {
        DeletePolicy::Restrict
    };
    let mut repo = open_repo(config).await?;
    let deleted = repo
        .delete_value(resource, id, policy)
        .await?
        .ok_or_else(|| not_found(resource, id))?;
    let message = if deleted.nullified.is_empty() {
        format!("Deleted {} '{id}'", resource.singular())
    } else {
        format!(
            "Deleted {} '{id}' and cleared {} references to it",
            resource.singular(),
            deleted.nullified.len()
        )
    };
    Ok(Out::new(message, deleted))
}

fn parse_object(data: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(data)
        .context("The data is not valid JSON")
        .pub_result(ErrorType::Invalid)?;
    if !value.is_object() {
        return Err(Error::new(
            ErrorType::Invalid,
            anyhow!("The data must be a JSON object"),
        ));
    }
    Ok(value)
}

fn not_found(resource: Resource, id: &str) -> Error {
    Error::new(
        ErrorType::NotFound,
        anyhow!("There is no {} with id '{id}'", resource.singular()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_create_get_delete_every_resource() {
        let env = TestEnv::with_seed().await;
        let config = env.config();
        let samples = [
            (
                Resource::Accounts,
                r#"{"name":"Carteira","type":"cash","balance":"R$ 150,00"}"#,
            ),
            (
                Resource::Transactions,
                r#"{"description":"Padaria","amount":12.5,"type":"expense","category_id":"c1",
                    "account_id":"a1","date":"2025-03-12"}"#,
            ),
            (
                Resource::CreditCards,
                r#"{"name":"Inter","limit":2000,"current_balance":0,"due_date":5,
                    "closing_date":28}"#,
            ),
            (
                Resource::Categories,
                r##"{"name":"Saúde","type":"expense","color":"#10b981","budget":200}"##,
            ),
            (
                Resource::RecurringTransactions,
                r#"{"description":"Spotify","amount":21.9,"type":"expense","frequency":"monthly",
                    "day_of_month":20,"start_date":"2025-03-20"}"#,
            ),
            (
                Resource::PendingTransactions,
                r#"{"description":"IPVA","amount":900,"type":"expense","due_date":"2025-04-01"}"#,
            ),
        ];

        for (resource, data) in samples {
            let created = create(&config, resource, data).await.unwrap();
            let record = created.structure().unwrap().clone();
            let id = record["id"].as_str().unwrap().to_string();
            assert!(!id.is_empty());

            let fetched = get(&config, resource, &id).await.unwrap();
            assert_eq!(fetched.structure().unwrap(), &record);
            let input: Value = serde_json::from_str(data).unwrap();
            for key in input.as_object().unwrap().keys() {
                assert!(record.get(key).is_some(), "{resource} lost '{key}'");
            }

            delete(&config, resource, &id, false).await.unwrap();
            let err = get(&config, resource, &id).await.unwrap_err();
            assert_eq!(err.error_type(), ErrorType::NotFound);
        }
    }

    #[tokio::test]
    async fn test_update_missing_and_invalid() {
        let env = TestEnv::with_seed().await;
        let config = env.config();

        let err = update(&config, Resource::Accounts, "nope", r#"{"name":"X"}"#)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);

        let err = update(&config, Resource::Accounts, "a1", "[1,2]")
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Invalid);

        let out = update(&config, Resource::Accounts, "a1", r#"{"name":"Conta Nova"}"#)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap()["name"], "Conta Nova");
        assert_eq!(out.structure().unwrap()["bank"], "Banco do Brasil");
    }

    #[tokio::test]
    async fn test_delete_referenced_category_needs_force() {
        let env = TestEnv::with_seed().await;
        let config = env.config();

        let err = delete(&config, Resource::Categories, "c3", false)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Invalid);

        let out = delete(&config, Resource::Categories, "c3", true)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().nullified.len(), 1);
        let t4 = get(&config, Resource::Transactions, "t4").await.unwrap();
        assert!(t4.structure().unwrap().get("category_id").is_none());

        let err = delete(&config, Resource::Categories, "c3", true)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), ErrorType::NotFound);
    }

    #[tokio::test]
    async fn test_list() {
        let env = TestEnv::with_seed().await;
        let out = list(&env.config(), Resource::CreditCards).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 2);
        assert_eq!(out.message(), "Found 2 credit_cards");
    }
}
