//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::Document;
use crate::repo::Repository;
use crate::store::Store;
use crate::Config;
use chrono::NaiveDate;
use tempfile::TempDir;

/// A minimal OAuth client secret file with an acceptable redirect.
pub(crate) const CLIENT_SECRET: &str = r#"{
    "installed": {
        "client_id": "test-client-id",
        "client_secret": "test-secret",
        "redirect_uris": ["http://localhost"],
        "auth_uri": "https://accounts.google.com/o/oauth2/auth",
        "token_uri": "https://oauth2.googleapis.com/token"
    }
}"#;

/// Seed data. The dates are in February and March 2025; tests that need "today" use
/// `TestEnv::today()`, which is 2025-03-12.
const SEED: &str = r##"{
  "accounts": [
    {"id": "a1", "name": "Conta Corrente", "type": "checking", "balance": 15420.5,
     "initial_balance": 10000, "bank": "Banco do Brasil"},
    {"id": "a2", "name": "Poupança", "type": "savings", "balance": 25000}
  ],
  "transactions": [
    {"id": "t1", "description": "Salário", "amount": 5000, "type": "income",
     "category_id": "c2", "account_id": "a1", "date": "2025-03-05", "effectivated": true},
    {"id": "t2", "description": "Supermercado", "amount": 650, "type": "expense",
     "category_id": "c1", "account_id": "a1", "date": "2025-03-08", "effectivated": true},
    {"id": "t3", "description": "Restaurante", "amount": 200, "type": "expense",
     "category_id": "c1", "account_id": "a1", "date": "2025-03-15", "effectivated": true},
    {"id": "t4", "description": "Uber", "amount": 120, "type": "expense",
     "category_id": "c3", "account_id": "a1", "date": "2025-03-10", "effectivated": true},
    {"id": "t5", "description": "Conta de luz", "amount": 180, "type": "expense",
     "account_id": "a1", "date": "2025-03-20", "effectivated": false},
    {"id": "t6", "description": "Salário", "amount": 5000, "type": "income",
     "category_id": "c2", "account_id": "a1", "date": "2025-02-05", "effectivated": true},
    {"id": "t7", "description": "Supermercado", "amount": 900, "type": "expense",
     "category_id": "c1", "account_id": "a1", "date": "2025-02-10", "effectivated": true}
  ],
  "credit_cards": [
    {"id": "k1", "name": "Nubank", "last_four": "1234", "limit": 5000, "current_balance": 4100,
     "due_date": 10, "closing_date": 3, "brand": "Mastercard"},
    {"id": "k2", "name": "Itaú", "limit": 3000, "current_balance": 900,
     "due_date": 25, "closing_date": 18, "brand": "Visa"}
  ],
  "categories": [
    {"id": "c1", "name": "Alimentação", "type": "expense", "color": "#ef4444", "budget": 800},
    {"id": "c2", "name": "Salário", "type": "income", "color": "#22c55e"},
    {"id": "c3", "name": "Transporte", "type": "expense", "color": "#3b82f6", "budget": 300},
    {"id": "c4", "name": "Lazer", "type": "expense", "color": "#a855f7", "budget": 0}
  ],
  "recurring_transactions": [
    {"id": "r1", "description": "Netflix", "amount": 55.9, "type": "expense",
     "category_id": "c4", "account_id": "a1", "frequency": "monthly", "day_of_month": 15,
     "start_date": "2025-01-15", "is_active": true, "next_date": "2025-03-15"},
    {"id": "r2", "description": "Salário", "amount": 5000, "type": "income",
     "category_id": "c2", "account_id": "a1", "frequency": "monthly", "day_of_month": 5,
     "start_date": "2025-01-05", "is_active": true, "next_date": "2025-04-05"},
    {"id": "r3", "description": "Academia", "amount": 25, "type": "expense",
     "frequency": "weekly", "day_of_week": 1, "start_date": "2025-03-03", "is_active": false}
  ],
  "pending_transactions": [
    {"id": "p1", "description": "Aluguel", "amount": 1800, "due_date": "2025-03-10",
     "account_id": "a1", "type": "expense", "status": "pending"},
    {"id": "p2", "description": "Freelance", "amount": 1500, "due_date": "2025-03-25",
     "account_id": "a1", "type": "income", "status": "pending"},
    {"id": "p3", "description": "Internet", "amount": 100, "due_date": "2025-03-01",
     "type": "expense", "status": "paid"}
  ],
  "version": "1.0.0"
}"##;

/// Test environment that sets up a findash home directory with a `Config`.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub(crate) struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with an initialized home directory and no data.
    pub(crate) async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("findash");
        let secret_path = temp_dir.path().join("client_secret.json");
        std::fs::write(&secret_path, CLIENT_SECRET).unwrap();

        let config = Config::create(&root, Some(&secret_path)).await.unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Creates a test environment whose data file holds the seed document.
    pub(crate) async fn with_seed() -> Self {
        let env = Self::new().await;
        env.store()
            .save(&mut Self::seed_document())
            .await
            .unwrap();
        env
    }

    /// Returns a clone of the Config.
    pub(crate) fn config(&self) -> Config {
        self.config.clone()
    }

    pub(crate) fn store(&self) -> Store {
        Store::new(&self.config)
    }

    /// Opens a new repository on the environment's data file.
    pub(crate) async fn repo(&self) -> Repository {
        Repository::open(self.store()).await.unwrap()
    }

    pub(crate) fn seed_document() -> Document {
        serde_json::from_str(SEED).unwrap()
    }

    pub(crate) fn today() -> NaiveDate {
        date("2025-03-12")
    }
}

/// Parses `YYYY-MM-DD`.
pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
