//! URL record model
//!
//! A `UrlRecord` is the persisted view of a submitted address: how many times
//! it has been ingested and when it was first and last seen. Records are
//! stored as JSON under their address.
//!
//! This module also holds the read-modify-write applied on every successful
//! ingestion, shared by the ingestion pool and its tests.

use crate::store::{RecordStore, StorageError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while reading or writing a record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unable to fetch {address}: {source}")]
    Load {
        address: String,
        source: StorageError,
    },

    #[error("unable to store {address}: {source}")]
    Save {
        address: String,
        source: StorageError,
    },

    #[error("unable to marshal {address} into bytes: {source}")]
    Encode {
        address: String,
        source: serde_json::Error,
    },

    #[error("submission count for {address} is already at its maximum")]
    CountOverflow { address: String },

    #[error("unable to unmarshal bytes into URL record: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A tracked URL and its submission history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The URL; unique and used as the store key
    pub address: String,

    /// Number of times this address has been ingested
    pub submission_count: u64,

    /// Set once, on first ingestion
    pub created_at: DateTime<Utc>,

    /// Refreshed on every later ingestion
    pub updated_at: DateTime<Utc>,
}

impl UrlRecord {
    /// Creates the record for an address seen for the first time
    pub fn first_sighting(address: &str, now: DateTime<Utc>) -> Self {
        Self {
            address: address.to_string(),
            submission_count: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Counts one more ingestion of this address
    ///
    /// Leaves the record untouched if the count cannot grow any further.
    pub fn record_submission(&mut self, now: DateTime<Utc>) -> Result<(), RecordError> {
        self.submission_count = self
            .submission_count
            .checked_add(1)
            .ok_or_else(|| RecordError::CountOverflow {
                address: self.address.clone(),
            })?;
        self.updated_at = now;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        serde_json::to_vec(self).map_err(|source| RecordError::Encode {
            address: self.address.clone(),
            source,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RecordError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Applies one successful ingestion of `address` to the store
///
/// Reads the current record, creates it (count 1) if absent or increments
/// its count otherwise, and writes it back. The read and the write are not
/// atomic: two concurrent writers to the same address can lose an update.
///
/// # Returns
///
/// The record as written.
pub fn upsert_submission(
    store: &dyn RecordStore,
    address: &str,
    now: DateTime<Utc>,
) -> Result<UrlRecord, RecordError> {
    let existing = store.get(address).map_err(|source| RecordError::Load {
        address: address.to_string(),
        source,
    })?;

    let record = match existing {
        None => {
            tracing::info!(url = address, "first time we have seen url, storing it");
            UrlRecord::first_sighting(address, now)
        }
        Some(bytes) => {
            let mut record = UrlRecord::from_bytes(&bytes)?;
            record.record_submission(now)?;
            tracing::info!(
                url = address,
                submitted = record.submission_count,
                "seen url before, updating"
            );
            record
        }
    };

    let bytes = record.to_bytes()?;
    store.set(address, &bytes).map_err(|source| RecordError::Save {
        address: address.to_string(),
        source,
    })?;

    Ok(record)
}

/// Decodes every value in `values`, skipping the ones that fail
///
/// Returns the decoded records in input order alongside the number skipped.
pub fn decode_all(values: &[Vec<u8>]) -> (Vec<UrlRecord>, usize) {
    let mut records = Vec::with_capacity(values.len());
    let mut skipped = 0;

    for value in values {
        match UrlRecord::from_bytes(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Skipping undecodable record: {}", e);
                skipped += 1;
            }
        }
    }

    (records, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteRecordStore;
    use chrono::Duration;

    fn store() -> SqliteRecordStore {
        SqliteRecordStore::open_in_memory("urls").unwrap()
    }

    #[test]
    fn test_first_submission_creates_record() {
        let store = store();
        let now = Utc::now();

        let record = upsert_submission(&store, "http://a.test", now).unwrap();
        assert_eq!(record.submission_count, 1);
        assert_eq!(record.created_at, record.updated_at);

        let stored = UrlRecord::from_bytes(&store.get("http://a.test").unwrap().unwrap()).unwrap();
        assert_eq!(stored, record);
    }

    #[test]
    fn test_resubmission_increments_count() {
        let store = store();
        let first = Utc::now();
        let second = first + Duration::seconds(5);

        upsert_submission(&store, "http://a.test", first).unwrap();
        let record = upsert_submission(&store, "http://a.test", second).unwrap();

        assert_eq!(record.submission_count, 2);
        assert_eq!(record.created_at, first);
        assert_eq!(record.updated_at, second);
        assert!(record.updated_at > first);
    }

    #[test]
    fn test_existing_count_is_incremented_by_one() {
        let store = store();
        let created = Utc::now() - Duration::hours(1);
        let existing = UrlRecord {
            address: "http://b.test".to_string(),
            submission_count: 41,
            created_at: created,
            updated_at: created,
        };
        store
            .set(&existing.address, &existing.to_bytes().unwrap())
            .unwrap();

        let now = Utc::now();
        let record = upsert_submission(&store, "http://b.test", now).unwrap();

        assert_eq!(record.submission_count, 42);
        assert_eq!(record.created_at, created);
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn test_corrupt_record_is_not_overwritten() {
        let store = store();
        store.set("http://c.test", b"not json").unwrap();

        let result = upsert_submission(&store, "http://c.test", Utc::now());
        assert!(matches!(result, Err(RecordError::Decode(_))));
        assert_eq!(store.get("http://c.test").unwrap(), Some(b"not json".to_vec()));
    }

    #[test]
    fn test_saturated_count_is_left_alone() {
        let store = store();
        let created = Utc::now() - Duration::hours(1);
        let existing = UrlRecord {
            address: "http://max.test".to_string(),
            submission_count: u64::MAX,
            created_at: created,
            updated_at: created,
        };
        let bytes = existing.to_bytes().unwrap();
        store.set(&existing.address, &bytes).unwrap();

        let result = upsert_submission(&store, "http://max.test", Utc::now());

        assert!(matches!(result, Err(RecordError::CountOverflow { .. })));
        assert_eq!(store.get("http://max.test").unwrap(), Some(bytes));
    }

    #[test]
    fn test_disconnected_store_reports_load_error() {
        let store = store();
        store.disconnect().unwrap();

        let result = upsert_submission(&store, "http://d.test", Utc::now());
        assert!(matches!(result, Err(RecordError::Load { .. })));
    }

    #[test]
    fn test_decode_all_skips_bad_values() {
        let good = UrlRecord::first_sighting("http://a.test", Utc::now());
        let values = vec![good.to_bytes().unwrap(), b"{broken".to_vec()];

        let (records, skipped) = decode_all(&values);
        assert_eq!(records, vec![good]);
        assert_eq!(skipped, 1);
    }
}
