//! In-memory link store.
//!
//! The store is the only shared mutable state in the service. Every mutation goes
//! through a single `DashMap` shard guard, so readers never see a half-written record.

use crate::error::{AppError, AppResult};
use crate::models::{ClickEvent, LinkRecord, StatsResponse};
use crate::services::expiry;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::path::Path;
use tracing::{debug, info};

/// Authoritative mapping from short code to link record
#[derive(Debug, Default)]
pub struct LinkStore {
    links: DashMap<String, LinkRecord>,
}

impl LinkStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new record. Fails if the short code is already present.
    pub fn create(&self, record: LinkRecord) -> AppResult<()> {
        match self.links.entry(record.short_code.clone()) {
            Entry::Occupied(entry) => Err(AppError::DuplicateCode(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(short_code = %record.short_code, "Link stored");
                entry.insert(record);
                Ok(())
            }
        }
    }

    /// Get a copy of a record by short code
    pub fn lookup(&self, code: &str) -> Option<LinkRecord> {
        self.links.get(code).map(|entry| entry.value().clone())
    }

    /// Run `f` against a record without cloning its click history
    pub fn inspect<R>(&self, code: &str, f: impl FnOnce(&LinkRecord) -> R) -> Option<R> {
        self.links.get(code).map(|entry| f(entry.value()))
    }

    /// Check if a short code exists
    pub fn contains(&self, code: &str) -> bool {
        self.links.contains_key(code)
    }

    /// Append a click to an existing record.
    ///
    /// The event timestamp is raised to the previous click's timestamp if needed, so
    /// `clicks` stays in non-decreasing order when appends race.
    pub fn append_click(&self, code: &str, mut event: ClickEvent) -> AppResult<()> {
        let mut entry = self
            .links
            .get_mut(code)
            .ok_or_else(|| AppError::NotFound(code.to_string()))?;

        if let Some(last) = entry.clicks.last() {
            if event.timestamp < last.timestamp {
                event.timestamp = last.timestamp;
            }
        }
        entry.clicks.push(event);
        Ok(())
    }

    /// Snapshot of all records, oldest first
    pub fn list_all(&self) -> Vec<LinkRecord> {
        let mut records: Vec<LinkRecord> = self
            .links
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.short_code.cmp(&b.short_code))
        });
        records
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Aggregate counts as of `now`
    pub fn stats(&self, now: DateTime<Utc>) -> StatsResponse {
        let mut stats = StatsResponse {
            total_links: 0,
            total_clicks: 0,
            active_links: 0,
            expired_links: 0,
        };

        for entry in self.links.iter() {
            let record = entry.value();
            stats.total_links += 1;
            stats.total_clicks += record.clicks.len();
            if expiry::is_expired(record, now) {
                stats.expired_links += 1;
            } else {
                stats.active_links += 1;
            }
        }

        stats
    }

    /// Build a store from a JSON snapshot written by [`LinkStore::save_snapshot`].
    ///
    /// Duplicate short codes or zero validity in the file are rejected.
    pub fn load_snapshot(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let records: Vec<LinkRecord> = serde_json::from_slice(&data)?;

        let store = Self::new();
        for record in records {
            if record.validity_minutes == 0 {
                return Err(AppError::Configuration(format!(
                    "Snapshot {} holds link '{}' with zero validity",
                    path.display(),
                    record.short_code
                )));
            }
            store.create(record).map_err(|e| {
                AppError::Configuration(format!("Snapshot {} is corrupt: {}", path.display(), e))
            })?;
        }

        info!("Loaded {} link(s) from snapshot {}", store.len(), path.display());
        Ok(store)
    }

    /// Write all records to `path` as JSON. The file is replaced atomically.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> AppResult<usize> {
        let path = path.as_ref();
        let records = self.list_all();
        let data = serde_json::to_vec_pretty(&records)?;

        let mut tmp_path = path.as_os_str().to_owned();
        tmp_path.push(".tmp");
        std::fs::write(&tmp_path, data)?;
        std::fs::rename(&tmp_path, path)?;

        debug!("Saved {} link(s) to snapshot {}", records.len(), path.display());
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DIRECT_SOURCE, UNKNOWN_LOCATION};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn record(code: &str) -> LinkRecord {
        LinkRecord::new(code, "https://example.com", 30, t0())
    }

    fn click(at: DateTime<Utc>) -> ClickEvent {
        ClickEvent {
            timestamp: at,
            source: DIRECT_SOURCE.to_string(),
            location: UNKNOWN_LOCATION.to_string(),
        }
    }

    #[test]
    fn test_create_and_lookup() {
        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();

        let found = store.lookup("abc12").unwrap();
        assert_eq!(found.long_url, "https://example.com");
        assert!(found.clicks.is_empty());
        assert!(store.lookup("nope1").is_none());
    }

    #[test]
    fn test_create_rejects_duplicate() {
        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();

        let mut other = record("abc12");
        other.long_url = "https://other.example".into();
        let err = store.create(other).unwrap_err();

        assert!(matches!(err, AppError::DuplicateCode(code) if code == "abc12"));
        assert_eq!(store.lookup("abc12").unwrap().long_url, "https://example.com");
    }

    #[test]
    fn test_lookup_is_idempotent() {
        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();
        assert_eq!(store.lookup("abc12"), store.lookup("abc12"));
    }

    #[test]
    fn test_append_click() {
        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();

        store.append_click("abc12", click(t0())).unwrap();
        store
            .append_click("abc12", click(t0() + Duration::seconds(1)))
            .unwrap();

        let found = store.lookup("abc12").unwrap();
        assert_eq!(found.clicks.len(), 2);
        assert_eq!(found.created_at, t0());
    }

    #[test]
    fn test_append_click_missing_code() {
        let store = LinkStore::new();
        let err = store.append_click("nope1", click(t0())).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_append_click_keeps_order() {
        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();

        store
            .append_click("abc12", click(t0() + Duration::seconds(5)))
            .unwrap();
        store.append_click("abc12", click(t0())).unwrap();

        let clicks = store.lookup("abc12").unwrap().clicks;
        assert!(clicks[0].timestamp <= clicks[1].timestamp);
    }

    #[test]
    fn test_inspect_does_not_mutate() {
        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();

        let url = store.inspect("abc12", |r| r.long_url.clone());
        assert_eq!(url.as_deref(), Some("https://example.com"));
        assert!(store.inspect("nope1", |_| ()).is_none());
    }

    #[test]
    fn test_list_all_sorted() {
        let store = LinkStore::new();
        let mut later = record("zzzzz");
        later.created_at = t0() + Duration::minutes(1);
        store.create(later).unwrap();
        store.create(record("bbbbb")).unwrap();
        store.create(record("aaaaa")).unwrap();

        let codes: Vec<_> = store
            .list_all()
            .into_iter()
            .map(|r| r.short_code)
            .collect();
        assert_eq!(codes, vec!["aaaaa", "bbbbb", "zzzzz"]);
    }

    #[test]
    fn test_stats() {
        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();
        let mut short_lived = record("def34");
        short_lived.validity_minutes = 1;
        store.create(short_lived).unwrap();
        store.append_click("abc12", click(t0())).unwrap();

        let stats = store.stats(t0() + Duration::minutes(5));
        assert_eq!(stats.total_links, 2);
        assert_eq!(stats.total_clicks, 1);
        assert_eq!(stats.active_links, 1);
        assert_eq!(stats.expired_links, 1);
    }

    #[test]
    fn test_concurrent_creates_same_code() {
        let store = Arc::new(LinkStore::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.create(record("abc12")).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_clicks_are_all_kept() {
        let store = Arc::new(LinkStore::new());
        store.create(record("abc12")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for j in 0..25 {
                        let at = t0() + Duration::milliseconds(i * 100 + j);
                        store.append_click("abc12", click(at)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let clicks = store.lookup("abc12").unwrap().clicks;
        assert_eq!(clicks.len(), 200);
        assert!(clicks.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");

        let store = LinkStore::new();
        store.create(record("abc12")).unwrap();
        store.append_click("abc12", click(t0())).unwrap();
        assert_eq!(store.save_snapshot(&path).unwrap(), 1);

        let restored = LinkStore::load_snapshot(&path).unwrap();
        assert_eq!(restored.lookup("abc12"), store.lookup("abc12"));
    }

    #[test]
    fn test_snapshot_with_duplicates_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("links.json");
        let records = vec![record("abc12"), record("abc12")];
        std::fs::write(&path, serde_json::to_vec(&records).unwrap()).unwrap();

        let err = LinkStore::load_snapshot(&path).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
