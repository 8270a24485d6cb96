//! Incremental per-user contribution cache.
//!
//! Each user's live contributions are stored newest first as one JSON list.
//! A lookup fetches only revisions at or after the newest cached timestamp,
//! drops anything already cached, and writes back only when something new
//! arrived. For any valid prior state the result holds every revision once,
//! newest first.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::CacheStore;
use crate::AnalysisError;
use crate::model::{Contribution, RevisionId};
use crate::source::WikiSource;
use crate::timing::timed;

/// Key namespace for cached contribution lists.
pub const DEFAULT_NAMESPACE: &str = "spi.CacheableUserContribs";

/// Contribution lists cached in a [`CacheStore`].
#[derive(Debug)]
pub struct ContribCache<S> {
    store: S,
    namespace: String,
}

impl<S: CacheStore> ContribCache<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Store key for `user_name`: `"<namespace>.<user_name>"`.
    #[must_use]
    pub fn key(&self, user_name: &str) -> String {
        format!("{}.{user_name}", self.namespace)
    }

    /// All live contributions by `user_name`, newest first.
    ///
    /// # Errors
    ///
    /// Fetch failures from `source`, store failures, or failure to encode the
    /// updated list.
    pub fn get(
        &self,
        source: &dyn WikiSource,
        user_name: &str,
    ) -> Result<Vec<Contribution>, AnalysisError> {
        let key = self.key(user_name);
        let cached = self.read(&key)?;
        let boundary = cached.first().map(|c| c.timestamp);

        let fetched = timed("source.user_contributions", || {
            source.user_contributions(&[user_name.to_string()], boundary)
        })?;

        let known: HashSet<RevisionId> = cached.iter().map(|c| c.rev_id).collect();
        let mut seen = HashSet::new();
        let new: Vec<Contribution> = fetched
            .into_iter()
            .filter(|c| !known.contains(&c.rev_id) && seen.insert(c.rev_id))
            .collect();

        if new.is_empty() {
            debug!(key, count = cached.len(), "contribution cache up to date");
            return Ok(cached);
        }

        info!(
            key,
            new = new.len(),
            cached = cached.len(),
            "extending contribution cache"
        );
        let mut combined = new;
        combined.extend(cached);
        if !combined.is_sorted_by(|a, b| a.timestamp >= b.timestamp) {
            warn!(user = user_name, "source returned contributions out of order");
            combined.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }

        let encoded = serde_json::to_string(&combined)?;
        self.store.set(&key, &encoded)?;
        Ok(combined)
    }

    fn read(&self, key: &str) -> Result<Vec<Contribution>, AnalysisError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(list) => Ok(list),
            Err(err) => {
                warn!(key, %err, "discarding undecodable cache entry");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockLogEntry;
    use crate::cache::MemoryStore;
    use crate::model::{Comment, LogEvent};
    use crate::source::FetchError;
    use chrono::{DateTime, TimeZone, Utc};
    use std::cell::RefCell;

    fn contrib(rev_id: u64, day: u32) -> Contribution {
        Contribution {
            rev_id,
            timestamp: Utc
                .with_ymd_and_hms(2020, 1, day, 0, 0, 0)
                .single()
                .expect("valid date"),
            user_name: "Fred".into(),
            namespace: 0,
            title: format!("Page {rev_id}"),
            comment: Comment::from("c"),
            is_live: true,
            tags: vec![],
        }
    }

    /// Serves a fixed batch regardless of bounds and records each `end`.
    struct ScriptedSource {
        batch: Vec<Contribution>,
        ends: RefCell<Vec<Option<DateTime<Utc>>>>,
    }

    impl ScriptedSource {
        fn new(batch: Vec<Contribution>) -> Self {
            Self {
                batch,
                ends: RefCell::new(Vec::new()),
            }
        }
    }

    impl WikiSource for ScriptedSource {
        fn user_contributions(
            &self,
            _user_names: &[String],
            end: Option<DateTime<Utc>>,
        ) -> Result<Vec<Contribution>, FetchError> {
            self.ends.borrow_mut().push(end);
            Ok(self.batch.clone())
        }

        fn deleted_user_contributions(&self, _: &str) -> Result<Vec<Contribution>, FetchError> {
            Ok(vec![])
        }

        fn user_blocks(&self, _: &str) -> Result<Vec<BlockLogEntry>, FetchError> {
            Ok(vec![])
        }

        fn user_log_events(&self, _: &str) -> Result<Vec<LogEvent>, FetchError> {
            Ok(vec![])
        }

        fn page_creations(&self, _: &[String]) -> Result<Vec<Contribution>, FetchError> {
            Ok(vec![])
        }

        fn page_exists(&self, _: &str) -> Result<bool, FetchError> {
            Ok(false)
        }

        fn page_revisions(&self, _: &str, _: usize) -> Result<Vec<Contribution>, FetchError> {
            Ok(vec![])
        }
    }

    fn seeded(cached: &[Contribution]) -> ContribCache<MemoryStore> {
        let cache = ContribCache::new(MemoryStore::new());
        let raw = serde_json::to_string(cached).expect("encode");
        cache.store().set(&cache.key("Fred"), &raw).expect("seed");
        cache
    }

    fn ids(list: &[Contribution]) -> Vec<u64> {
        list.iter().map(|c| c.rev_id).collect()
    }

    fn stored(cache: &ContribCache<MemoryStore>) -> Option<Vec<Contribution>> {
        cache
            .store()
            .get(&cache.key("Fred"))
            .expect("get")
            .map(|raw| serde_json::from_str(&raw).expect("decode"))
    }

    #[test]
    fn key_uses_namespace() {
        let cache = ContribCache::new(MemoryStore::new());
        assert_eq!(cache.key("Fred"), "spi.CacheableUserContribs.Fred");
        let cache = cache.with_namespace("test");
        assert_eq!(cache.key("Fred"), "test.Fred");
    }

    #[test]
    fn cold_cache_fetches_everything() {
        let cache = ContribCache::new(MemoryStore::new());
        let source = ScriptedSource::new(vec![contrib(2, 2), contrib(1, 1)]);

        let result = cache.get(&source, "Fred").expect("get");
        assert_eq!(ids(&result), vec![2, 1]);
        assert_eq!(source.ends.borrow().as_slice(), &[None]);
        assert_eq!(stored(&cache).map(|l| ids(&l)), Some(vec![2, 1]));
    }

    #[test]
    fn boundary_record_is_not_duplicated() {
        let cache = seeded(&[contrib(103, 3)]);
        let source =
            ScriptedSource::new(vec![contrib(105, 5), contrib(104, 4), contrib(103, 3)]);

        let result = cache.get(&source, "Fred").expect("get");
        assert_eq!(ids(&result), vec![105, 104, 103]);
        assert_eq!(source.ends.borrow()[0], Some(contrib(103, 3).timestamp));
        assert_eq!(stored(&cache).map(|l| ids(&l)), Some(vec![105, 104, 103]));
    }

    #[test]
    fn no_new_records_leaves_cache_untouched() {
        let cache = seeded(&[contrib(103, 3), contrib(102, 2)]);
        let before = cache.store().get(&cache.key("Fred")).expect("get");
        let source = ScriptedSource::new(vec![contrib(103, 3)]);

        let result = cache.get(&source, "Fred").expect("get");
        assert_eq!(ids(&result), vec![103, 102]);
        assert_eq!(cache.store().get(&cache.key("Fred")).expect("get"), before);
    }

    #[test]
    fn empty_fetch_on_empty_cache_writes_nothing() {
        let cache = ContribCache::new(MemoryStore::new());
        let source = ScriptedSource::new(vec![]);
        assert!(cache.get(&source, "Fred").expect("get").is_empty());
        assert_eq!(cache.store().len().expect("len"), 0);
    }

    #[test]
    fn deep_overlap_is_deduplicated() {
        let cache = seeded(&[contrib(103, 3), contrib(102, 2)]);
        let source = ScriptedSource::new(vec![
            contrib(104, 4),
            contrib(103, 3),
            contrib(102, 2),
        ]);
        let result = cache.get(&source, "Fred").expect("get");
        assert_eq!(ids(&result), vec![104, 103, 102]);
    }

    #[test]
    fn out_of_order_batch_is_resorted() {
        let cache = seeded(&[contrib(101, 1)]);
        let source = ScriptedSource::new(vec![contrib(102, 2), contrib(103, 3)]);
        let result = cache.get(&source, "Fred").expect("get");
        assert_eq!(ids(&result), vec![103, 102, 101]);
    }

    #[test]
    fn undecodable_entry_is_treated_as_empty() {
        let cache = ContribCache::new(MemoryStore::new());
        cache
            .store()
            .set(&cache.key("Fred"), "not json")
            .expect("seed");
        let source = ScriptedSource::new(vec![contrib(1, 1)]);

        let result = cache.get(&source, "Fred").expect("get");
        assert_eq!(ids(&result), vec![1]);
        assert_eq!(source.ends.borrow().as_slice(), &[None]);
        assert_eq!(stored(&cache).map(|l| ids(&l)), Some(vec![1]));
    }
}
