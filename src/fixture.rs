//! Account fixture model and loading.
//!
//! The backing file holds the same JSON shape the service returns, except
//! that `UpdatedAt` is a decimal string of Unix nanoseconds. Loading
//! rewrites it to RFC3339-nano UTC; responses never touch timestamps again.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One account record, serialized with the directory's wire names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Account {
    #[serde(rename = "AccountId")]
    pub account_id: String,
    #[serde(rename = "SpinnakerAccountName")]
    pub account_name: String,
    #[serde(rename = "Regions")]
    pub regions: Vec<String>,
    #[serde(rename = "SpinnakerStatus")]
    pub status: String,
    #[serde(rename = "SpinnakerAssumeRole")]
    pub assume_role: String,
    #[serde(rename = "SpinnakerProviders")]
    pub providers: Vec<String>,
    #[serde(rename = "CreatedAt")]
    pub created_at: String,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: String,
}

/// Pagination placeholder. `next_url` is always empty in practice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(rename = "NextUrl")]
    pub next_url: String,
}

/// The response body for `/hello`, and the shape of the backing file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountsResponse {
    #[serde(rename = "SpinnakerAccounts", default)]
    pub accounts: Vec<Account>,
    #[serde(rename = "Pagination", default)]
    pub pagination: Pagination,
}

/// Why a fixture load produced no data.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("failed to open fixture {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode fixture {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("account {account:?} has unparsable UpdatedAt {value:?}")]
    Timestamp { account: String, value: String },
}

/// A decoded fixture with its timestamps already normalized.
#[derive(Debug, Clone)]
pub struct LoadedFixture {
    pub response: AccountsResponse,
    /// Most recent `UpdatedAt` across all accounts; Unix epoch when the
    /// account list is empty.
    pub most_recent: DateTime<Utc>,
}

/// Load and decode the backing file, rewriting every account's `UpdatedAt`
/// from Unix nanoseconds to an RFC3339-nano UTC string.
///
/// A single bad timestamp fails the whole load; callers degrade to an
/// empty response.
pub fn load(path: &Path) -> Result<LoadedFixture, FixtureError> {
    let file = File::open(path).map_err(|source| FixtureError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let mut response: AccountsResponse = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| FixtureError::Decode {
            path: path.display().to_string(),
            source,
        })?;

    let mut most_recent = DateTime::<Utc>::UNIX_EPOCH;
    for account in &mut response.accounts {
        let nanos: i64 = account
            .updated_at
            .parse()
            .map_err(|_| FixtureError::Timestamp {
                account: account.account_name.clone(),
                value: account.updated_at.clone(),
            })?;

        let updated = DateTime::from_timestamp_nanos(nanos);
        account.updated_at = updated.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        if updated > most_recent {
            most_recent = updated;
        }
    }

    Ok(LoadedFixture {
        response,
        most_recent,
    })
}

/// Parse a client-supplied `UpdatedAt.gt` value.
///
/// A `+` timezone sign the client did not percent-escape arrives as a
/// space after form-urlencoded decoding; restore it before parsing.
pub fn parse_updated_after(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let restored = raw.replacen(' ', "+", 1);
    Ok(DateTime::parse_from_rfc3339(&restored)?.with_timezone(&Utc))
}
