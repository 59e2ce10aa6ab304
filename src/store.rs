//! Process-wide account cache.
//!
//! A name-keyed map of the most recently loaded accounts, warmed once at
//! startup and merged on every request that reloads the fixture. Responses
//! are always served from a fresh load, never from the cache; the cache
//! exists so the process carries the directory state between requests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::fixture::{self, Account, FixtureError, LoadedFixture};

/// Owns the fixture path and the account cache.
pub struct AccountStore {
    fixture_path: PathBuf,
    cache: Mutex<HashMap<String, Account>>,
}

impl AccountStore {
    pub fn new(fixture_path: impl Into<PathBuf>) -> Self {
        Self {
            fixture_path: fixture_path.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn fixture_path(&self) -> &Path {
        &self.fixture_path
    }

    /// Populate the cache from the fixture at startup. A failed load is
    /// logged and leaves the cache empty; the process still starts.
    pub async fn warm(&self) {
        match self.reload() {
            Ok(loaded) => {
                let cached = self.merge(&loaded.response.accounts).await;
                println!("warmed account cache with {} accounts", cached);
            }
            Err(err) => println!("cache warm skipped: {}", err),
        }
    }

    /// Load the fixture from disk, normalizing timestamps.
    pub fn reload(&self) -> Result<LoadedFixture, FixtureError> {
        fixture::load(&self.fixture_path)
    }

    /// Insert or replace accounts by name. Returns the cache size after
    /// the merge.
    pub async fn merge(&self, accounts: &[Account]) -> usize {
        let mut cache = self.cache.lock().await;
        for account in accounts {
            cache.insert(account.account_name.clone(), account.clone());
        }
        cache.len()
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn get(&self, name: &str) -> Option<Account> {
        self.cache.lock().await.get(name).cloned()
    }
}
