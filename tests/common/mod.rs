//! Shared helpers for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fetchrank::fetch::{Download, Downloader, FetchError};
use fetchrank::store::{RecordStore, SqliteRecordStore};
use fetchrank::UrlRecord;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Downloader double that records calls and tracks how many run at once
#[derive(Default)]
pub struct FakeDownloader {
    delay: Duration,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str) -> Result<Download, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }

        Ok(Download {
            status: 200,
            bytes: 0,
            elapsed: self.delay,
        })
    }
}

pub fn memory_store() -> Arc<SqliteRecordStore> {
    Arc::new(SqliteRecordStore::open_in_memory("urls").expect("Failed to open store"))
}

pub fn record(address: &str, submission_count: u64, at: DateTime<Utc>) -> UrlRecord {
    UrlRecord {
        address: address.to_string(),
        submission_count,
        created_at: at,
        updated_at: at,
    }
}

pub fn put(store: &dyn RecordStore, record: &UrlRecord) {
    store
        .set(&record.address, &record.to_bytes().expect("Failed to encode"))
        .expect("Failed to store record");
}

pub fn load(store: &dyn RecordStore, address: &str) -> Option<UrlRecord> {
    store
        .get(address)
        .expect("Failed to read store")
        .map(|bytes| UrlRecord::from_bytes(&bytes).expect("Failed to decode"))
}
