//! The record repository: create, read, update and delete over the collections of the stored
//! `Document`.
//!
//! The repository holds the document in memory and writes the whole document back through the
//! `Store` after every change. There is a typed API, generic over `Record`, and a dynamic API over
//! `Resource` that works with `serde_json::Value` for the command line.

use crate::error::{Error, ErrorType, IntoResult, Res, Result};
use crate::model::{
    Account, Category, CreditCard, Document, PendingTransaction, Record, RecurringTransaction,
    Resource, Transaction,
};
use crate::store::Store;
use crate::utils;
use anyhow::{anyhow, bail, Context};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Keys a patch is not allowed to change.
const IMMUTABLE_KEYS: &[&str] = &["id", "created_at"];
/// The kinds of record that other records refer to.
const REFERENCE_TARGETS: [Resource; 2] = [Resource::Accounts, Resource::Categories];

/// What to do with records that point at an account or category being deleted.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Refuse to delete while anything refers to the record.
    #[default]
    Restrict,
    /// Clear the references, then delete.
    Nullify,
}

serde_plain::derive_display_from_serialize!(DeletePolicy);
serde_plain::derive_fromstr_from_deserialize!(DeletePolicy);

/// A record that refers to another record.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Referrer {
    pub resource: Resource,
    pub id: String,
}

/// The result of a delete.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Deleted {
    pub resource: Resource,
    pub id: String,
    /// Records whose reference to the deleted record was cleared.
    pub nullified: Vec<Referrer>,
}

/// Runs `$body` with `$R` bound to the record type of `$resource`.
macro_rules! with_record_type {
    ($resource:expr, $R:ident => $body:expr) => {
        match $resource {
            Resource::Accounts => {
                type $R = Account;
                $body
            }
            Resource::Transactions => {
                type $R = Transaction;
                $body
            }
            Resource::CreditCards => {
                type $R = CreditCard;
                $body
            }
            Resource::Categories => {
                type $R = Category;
                $body
            }
            Resource::RecurringTransactions => {
                type $R = RecurringTransaction;
                $body
            }
            Resource::PendingTransactions => {
                type $R = PendingTransaction;
                $body
            }
        }
    };
}

/// An open handle on the stored document.
#[derive(Debug)]
pub struct Repository {
    store: Store,
    doc: Document,
}

impl Repository {
    /// Loads the document from `store`.
    pub async fn open(store: Store) -> Result<Self> {
        let doc = store.load().await.pub_result(ErrorType::Storage)?;
        Ok(Self { store, doc })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn list<R: Record>(&self) -> &[R] {
        R::collection(&self.doc)
    }

    pub fn get<R: Record>(&self, id: &str) -> Option<&R> {
        R::collection(&self.doc).iter().find(|r| r.id() == id)
    }

    /// Creates a record from a JSON object.
    ///
    /// A new id and both timestamps are assigned, replacing any the caller supplied. The object
    /// must deserialize into `R`, pass `R::validate`, and refer only to existing accounts and
    /// categories.
    pub async fn create<R: Record>(&mut self, data: Value) -> Result<R> {
        let mut map = into_object::<R>(data).pub_result(ErrorType::Invalid)?;
        let now = now_value();
        map.insert("id".to_string(), Value::String(utils::generate_id()));
        map.insert("created_at".to_string(), now.clone());
        map.insert("updated_at".to_string(), now);
        let record = self.checked::<R>(map).pub_result(ErrorType::Invalid)?;

        R::collection_mut(&mut self.doc).push(record.clone());
        self.persist().await?;
        info!("Created {} '{}'", R::RESOURCE.singular(), record.id());
        Ok(record)
    }

    /// Adds an already-built record. An empty id is replaced with a generated one and missing
    /// timestamps are filled in; a non-empty id must not already exist.
    pub async fn insert<R: Record>(&mut self, record: R) -> Result<R> {
        let value = serde_json::to_value(&record)
            .context("Unable to serialize the record")
            .pub_result(ErrorType::Internal)?;
        let mut map = into_object::<R>(value).pub_result(ErrorType::Internal)?;

        let id = match map.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => {
                if self.get::<R>(id).is_some() {
                    return Err(Error::new(
                        ErrorType::Invalid,
                        anyhow!("A {} with id '{id}' already exists", R::RESOURCE.singular()),
                    ));
                }
                id.to_string()
            }
            _ => utils::generate_id(),
        };
        let now = now_value();
        map.insert("id".to_string(), Value::String(id));
        for key in ["created_at", "updated_at"] {
            if map.get(key).map_or(true, Value::is_null) {
                map.insert(key.to_string(), now.clone());
            }
        }
        let record = self.checked::<R>(map).pub_result(ErrorType::Invalid)?;

        R::collection_mut(&mut self.doc).push(record.clone());
        self.persist().await?;
        debug!("Inserted {} '{}'", R::RESOURCE.singular(), record.id());
        Ok(record)
    }

    /// Shallow-merges the top-level keys of `patch` into the record with `id`.
    ///
    /// Returns `None`, without writing anything, when there is no such record. `id` and
    /// `created_at` cannot be patched and `updated_at` is refreshed. The merged record is
    /// validated like a new one.
    pub async fn update<R: Record>(&mut self, id: &str, patch: Value) -> Result<Option<R>> {
        let Some(ix) = R::collection(&self.doc).iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let updated = self
            .merged::<R>(&R::collection(&self.doc)[ix], patch)
            .pub_result(ErrorType::Invalid)?;

        R::collection_mut(&mut self.doc)[ix] = updated.clone();
        self.persist().await?;
        info!("Updated {} '{id}'", R::RESOURCE.singular());
        Ok(Some(updated))
    }

    /// Deletes the record with `id`, refusing if other records refer to it.
    pub async fn delete<R: Record>(&mut self, id: &str) -> Result<bool> {
        Ok(self
            .delete_with::<R>(id, DeletePolicy::Restrict)
            .await?
            .is_some())
    }

    /// Deletes the record with `id`. Returns `None` if there was no such record.
    ///
    /// Transactions, pending transactions and recurring transactions can refer to accounts and
    /// categories. With `DeletePolicy::Restrict` deleting a referenced record is an error; with
    /// `DeletePolicy::Nullify` the references are cleared first.
    pub async fn delete_with<R: Record>(
        &mut self,
        id: &str,
        policy: DeletePolicy,
    ) -> Result<Option<Deleted>> {
        if self.get::<R>(id).is_none() {
            return Ok(None);
        }

        let referrers = self.referrers(R::RESOURCE, id);
        if !referrers.is_empty() && policy == DeletePolicy::Restrict {
            return Err(Error::new(
                ErrorType::Invalid,
                anyhow!(
                    "The {} '{id}' is used by {}. Delete or change those first, or use --force \
                    to clear the references",
                    R::RESOURCE.singular(),
                    describe(&referrers)
                ),
            ));
        }
        for referrer in &referrers {
            self.clear_reference(referrer, R::RESOURCE);
        }

        R::collection_mut(&mut self.doc).retain(|r| r.id() != id);
        self.persist().await?;
        info!("Deleted {} '{id}'", R::RESOURCE.singular());
        Ok(Some(Deleted {
            resource: R::RESOURCE,
            id: id.to_string(),
            nullified: referrers,
        }))
    }

    /// Replaces the whole document and saves it.
    pub async fn replace(&mut self, doc: Document) -> Result<()> {
        self.doc = doc;
        self.persist().await
    }

    /// Applies `f` to the in-memory document and saves it. Used by operations that change several
    /// records at once. Nothing is validated, so `f` must leave the records valid.
    pub(crate) async fn modify<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> T,
    {
        let out = f(&mut self.doc);
        self.persist().await?;
        Ok(out)
    }

    /// Records that refer to the `target` record with `id`.
    pub fn referrers(&self, target: Resource, id: &str) -> Vec<Referrer> {
        let mut found = Vec::new();
        collect_referrers(&self.doc.transactions, target, id, &mut found);
        collect_referrers(&self.doc.pending_transactions, target, id, &mut found);
        collect_referrers(&self.doc.recurring_transactions, target, id, &mut found);
        found
    }

    pub fn list_values(&self, resource: Resource) -> Result<Vec<Value>> {
        with_record_type!(resource, R => self
            .list::<R>()
            .iter()
            .map(to_value)
            .collect::<Res<Vec<Value>>>()
            .pub_result(ErrorType::Internal))
    }

    pub fn get_value(&self, resource: Resource, id: &str) -> Result<Option<Value>> {
        with_record_type!(resource, R => self
            .get::<R>(id)
            .map(to_value)
            .transpose()
            .pub_result(ErrorType::Internal))
    }

    pub async fn create_value(&mut self, resource: Resource, data: Value) -> Result<Value> {
        with_record_type!(resource, R => {
            let record = self.create::<R>(data).await?;
            to_value(&record).pub_result(ErrorType::Internal)
        })
    }

    pub async fn update_value(
        &mut self,
        resource: Resource,
        id: &str,
        patch: Value,
    ) -> Result<Option<Value>> {
        with_record_type!(resource, R => {
            let updated = self.update::<R>(id, patch).await?;
            updated.as_ref().map(to_value).transpose().pub_result(ErrorType::Internal)
        })
    }

    pub async fn delete_value(
        &mut self,
        resource: Resource,
        id: &str,
        policy: DeletePolicy,
    ) -> Result<Option<Deleted>> {
        with_record_type!(resource, R => self.delete_with::<R>(id, policy).await)
    }

    async fn persist(&mut self) -> Result<()> {
        self.store
            .save(&mut self.doc)
            .await
            .pub_result(ErrorType::Storage)
    }

    /// Deserializes and validates a record, and checks that its references exist.
    fn checked<R: Record>(&self, map: Map<String, Value>) -> Res<R> {
        let record = parsed::<R>(map)?;
        self.check_references(&record, &REFERENCE_TARGETS)?;
        Ok(record)
    }

    /// Only references the patch changes are checked. Records loaded with a dangling reference
    /// can still be edited otherwise.
    fn merged<R: Record>(&self, existing: &R, patch: Value) -> Res<R> {
        let mut map = into_object::<R>(to_value(existing)?)?;
        let Value::Object(patch) = patch else {
            bail!("An update must be given as a JSON object of the fields to change");
        };
        for (key, value) in patch {
            if IMMUTABLE_KEYS.contains(&key.as_str()) {
                debug!("Ignoring '{key}' in the update");
                continue;
            }
            map.insert(key, value);
        }
        map.insert("updated_at".to_string(), now_value());
        let record = parsed::<R>(map)?;
        let changed: Vec<Resource> = REFERENCE_TARGETS
            .into_iter()
            .filter(|&target| record.reference(target) != existing.reference(target))
            .collect();
        self.check_references(&record, &changed)?;
        Ok(record)
    }

    fn check_references<R: Record>(&self, record: &R, targets: &[Resource]) -> Res<()> {
        for &target in targets {
            let Some(id) = record.reference(target) else {
                continue;
            };
            let exists = match target {
                Resource::Accounts => self.get::<Account>(id).is_some(),
                Resource::Categories => self.get::<Category>(id).is_some(),
                _ => true,
            };
            if !exists {
                bail!("The {} '{id}' does not exist", target.singular());
            }
        }
        Ok(())
    }

    fn clear_reference(&mut self, referrer: &Referrer, target: Resource) {
        fn clear<R: Record>(items: &mut [R], id: &str, target: Resource) {
            for item in items.iter_mut().filter(|r| r.id() == id) {
                item.clear_reference(target);
            }
        }
        let doc = &mut self.doc;
        match referrer.resource {
            Resource::Transactions => clear(&mut doc.transactions, &referrer.id, target),
            Resource::PendingTransactions => {
                clear(&mut doc.pending_transactions, &referrer.id, target)
            }
            Resource::RecurringTransactions => {
                clear(&mut doc.recurring_transactions, &referrer.id, target)
            }
            _ => {}
        }
    }
}

fn collect_referrers<R: Record>(items: &[R], target: Resource, id: &str, out: &mut Vec<Referrer>) {
    out.extend(
        items
            .iter()
            .filter(|r| r.reference(target) == Some(id))
            .map(|r| Referrer {
                resource: R::RESOURCE,
                id: r.id().to_string(),
            }),
    );
}

fn describe(referrers: &[Referrer]) -> String {
    let mut counts: Vec<(Resource, usize)> = Vec::new();
    for r in referrers {
        match counts.iter_mut().find(|(res, _)| *res == r.resource) {
            Some((_, n)) => *n += 1,
            None => counts.push((r.resource, 1)),
        }
    }
    counts
        .iter()
        .map(|(resource, n)| format!("{n} {resource}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Deserializes and validates a record.
fn parsed<R: Record>(map: Map<String, Value>) -> Res<R> {
    let record: R = serde_json::from_value(Value::Object(map))
        .with_context(|| format!("The data is not a valid {}", R::RESOURCE.singular()))?;
    record
        .validate()
        .with_context(|| format!("The data is not a valid {}", R::RESOURCE.singular()))?;
    Ok(record)
}

fn into_object<R: Record>(value: Value) -> Res<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => bail!(
            "A {} must be given as a JSON object, got: {other}",
            R::RESOURCE.singular()
        ),
    }
}

fn to_value<R: Record>(record: &R) -> Res<Value> {
    serde_json::to_value(record).context("Unable to serialize the record")
}

fn now_value() -> Value {
    Value::String(Utc::now().to_rfc3339())
}
