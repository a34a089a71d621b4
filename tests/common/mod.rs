#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use news_analytics::application::jobs::JobRunnerSettings;
use news_analytics::application::services::IngestSettings;
use news_analytics::domain::entities::{
    AnalyticsSummary, DomainCount, Item, ItemFilter, KeywordCount, NewItem,
};
use news_analytics::domain::extraction::{Vocabulary, is_known_domain};
use news_analytics::domain::feed::{FeedItem, FeedSource, FetchError};
use news_analytics::domain::repositories::{AnalyticsRepository, ItemRepository, StorageError};
use news_analytics::infrastructure::events::{EventChannel, LocalEventChannel};
use news_analytics::state::AppState;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const TOPIC: &str = "new_story";

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Keyword and domain tallies shared by the in-memory repositories.
#[derive(Default)]
pub struct Counters {
    keywords: Mutex<HashMap<String, (i64, DateTime<Utc>)>>,
    domains: Mutex<HashMap<String, i64>>,
}

impl Counters {
    fn bump_keyword(&self, keyword: &str) {
        let mut keywords = lock(&self.keywords);
        let entry = keywords.entry(keyword.to_string()).or_insert((0, Utc::now()));
        entry.0 += 1;
        entry.1 = Utc::now();
    }

    fn bump_domain(&self, domain: &str) {
        if is_known_domain(domain) {
            *lock(&self.domains).entry(domain.to_string()).or_insert(0) += 1;
        }
    }
}

/// Item store keeping rows in memory with the same ordering and filter
/// rules as the PostgreSQL repository.
#[derive(Default)]
pub struct InMemoryItemRepository {
    items: Mutex<HashMap<i64, Item>>,
    failing_ids: Mutex<HashSet<i64>>,
    failing_keywords: Mutex<HashSet<String>>,
    counters: Arc<Counters>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every upsert of `id` fail with a storage error.
    pub fn fail_on(&self, id: i64) {
        lock(&self.failing_ids).insert(id);
    }

    /// Makes the next write counting `keyword` fail. Like the transactional
    /// store, the failed write leaves neither the row nor any counter behind.
    pub fn fail_keyword_once(&self, keyword: &str) {
        lock(&self.failing_keywords).insert(keyword.to_string());
    }

    pub fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn get(&self, id: i64) -> Option<Item> {
        lock(&self.items).get(&id).cloned()
    }

    fn matches(item: &Item, filter: &ItemFilter) -> bool {
        let keyword_ok = filter.keyword.as_ref().is_none_or(|k| {
            item.title.to_lowercase().contains(&k.to_lowercase())
        });
        let domain_ok = filter.domain.as_ref().is_none_or(|d| {
            item.link
                .as_ref()
                .is_some_and(|l| l.to_lowercase().contains(&d.to_lowercase()))
        });
        keyword_ok && domain_ok
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn upsert_item(&self, item: NewItem) -> Result<bool, StorageError> {
        if lock(&self.failing_ids).contains(&item.id) {
            return Err(StorageError::Unavailable(format!("write of {} refused", item.id)));
        }

        let mut items = lock(&self.items);
        if items.contains_key(&item.id) {
            return Ok(false);
        }
        items.insert(item.id, item.into_item(Utc::now()));
        Ok(true)
    }

    async fn insert_with_counters(
        &self,
        item: NewItem,
        keywords: Vec<String>,
        domain: Option<String>,
    ) -> Result<bool, StorageError> {
        if lock(&self.failing_ids).contains(&item.id) {
            return Err(StorageError::Unavailable(format!("write of {} refused", item.id)));
        }

        let mut items = lock(&self.items);
        if items.contains_key(&item.id) {
            return Ok(false);
        }

        {
            let mut failing = lock(&self.failing_keywords);
            if let Some(keyword) = keywords.iter().find(|k| failing.contains(*k)) {
                failing.remove(keyword);
                return Err(StorageError::Unavailable(format!("increment of {keyword} aborted")));
            }
        }

        items.insert(item.id, item.into_item(Utc::now()));
        for keyword in &keywords {
            self.counters.bump_keyword(keyword);
        }
        if let Some(domain) = domain {
            self.counters.bump_domain(&domain);
        }
        Ok(true)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, StorageError> {
        Ok(lock(&self.items).get(&id).cloned())
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StorageError> {
        let items = lock(&self.items);
        Ok(ids.iter().copied().filter(|id| items.contains_key(id)).collect())
    }

    async fn list(&self, filter: ItemFilter) -> Result<Vec<Item>, StorageError> {
        let mut rows: Vec<Item> = lock(&self.items)
            .values()
            .filter(|item| Self::matches(item, &filter))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.score.cmp(&a.score).then(b.id.cmp(&a.id)));

        Ok(rows
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: ItemFilter) -> Result<i64, StorageError> {
        let items = lock(&self.items);
        Ok(items.values().filter(|item| Self::matches(item, &filter)).count() as i64)
    }
}

/// Counter store backed by in-memory maps.
pub struct InMemoryAnalyticsRepository {
    counters: Arc<Counters>,
    items: Arc<InMemoryItemRepository>,
    unhealthy: AtomicBool,
}

impl InMemoryAnalyticsRepository {
    pub fn new(items: Arc<InMemoryItemRepository>) -> Self {
        Self {
            counters: items.counters(),
            items,
            unhealthy: AtomicBool::new(false),
        }
    }

    pub fn set_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }

    pub fn keyword_count(&self, keyword: &str) -> i64 {
        lock(&self.counters.keywords).get(keyword).map(|(c, _)| *c).unwrap_or(0)
    }

    pub fn domain_count(&self, domain: &str) -> i64 {
        lock(&self.counters.domains).get(domain).copied().unwrap_or(0)
    }

    pub fn domain_keys(&self) -> Vec<String> {
        lock(&self.counters.domains).keys().cloned().collect()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn increment_keyword(&self, keyword: &str) -> Result<(), StorageError> {
        self.check()?;
        self.counters.bump_keyword(keyword);
        Ok(())
    }

    async fn increment_domain(&self, domain: &str) -> Result<(), StorageError> {
        self.check()?;
        self.counters.bump_domain(domain);
        Ok(())
    }

    async fn top_keywords(&self, limit: i64) -> Result<Vec<KeywordCount>, StorageError> {
        self.check()?;
        let mut rows: Vec<KeywordCount> = lock(&self.counters.keywords)
            .iter()
            .map(|(keyword, (count, last_seen_at))| KeywordCount {
                keyword: keyword.clone(),
                count: *count,
                last_seen_at: *last_seen_at,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.keyword.cmp(&b.keyword)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn top_domains(&self, limit: i64) -> Result<Vec<DomainCount>, StorageError> {
        self.check()?;
        let mut rows: Vec<DomainCount> = lock(&self.counters.domains)
            .iter()
            .map(|(domain, count)| DomainCount {
                domain: domain.clone(),
                count: *count,
            })
            .collect();
        rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.domain.cmp(&b.domain)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn summary(&self) -> Result<AnalyticsSummary, StorageError> {
        self.check()?;
        Ok(AnalyticsSummary {
            total_items: self.items.len() as i64,
            total_keywords: lock(&self.counters.keywords).len() as i64,
            total_domains: lock(&self.counters.domains).len() as i64,
        })
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.check()
    }
}

/// Feed double serving a fixed id listing and item table.
#[derive(Default)]
pub struct ScriptedFeed {
    ids: Mutex<Vec<i64>>,
    items: Mutex<HashMap<i64, FeedItem>>,
    failing: Mutex<HashSet<i64>>,
    listing_down: AtomicBool,
    delay: Mutex<Option<Duration>>,
    item_delays: Mutex<HashMap<i64, Duration>>,
    fetches: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a story to both the listing and the item table.
    pub fn push_story(&self, id: i64, title: &str, url: Option<&str>) {
        lock(&self.ids).push(id);
        lock(&self.items).insert(id, story(id, title, url));
    }

    /// Adds a raw entry to both the listing and the item table.
    pub fn push_raw(&self, item: FeedItem) {
        lock(&self.ids).push(item.id);
        lock(&self.items).insert(item.id, item);
    }

    /// Lists `id` without serving its detail.
    pub fn push_missing(&self, id: i64) {
        lock(&self.ids).push(id);
    }

    /// Makes detail fetches of `id` fail with HTTP 503.
    pub fn fail_on(&self, id: i64) {
        lock(&self.failing).insert(id);
    }

    pub fn take_listing_down(&self) {
        self.listing_down.store(true, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Delays the detail fetch of `id` only; overrides [`Self::set_delay`].
    pub fn set_item_delay(&self, id: i64, delay: Duration) {
        lock(&self.item_delays).insert(id, delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn list_top_ids(&self, limit: usize) -> Result<Vec<i64>, FetchError> {
        if self.listing_down.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                resource: "topstories".to_string(),
                status: 503,
            });
        }
        Ok(lock(&self.ids).iter().copied().take(limit).collect())
    }

    async fn fetch_item(&self, id: i64) -> Result<FeedItem, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = lock(&self.item_delays)
            .get(&id)
            .copied()
            .or(*lock(&self.delay));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.failing).contains(&id) {
            return Err(FetchError::Status {
                resource: format!("item/{id}"),
                status: 503,
            });
        }

        lock(&self.items)
            .get(&id)
            .cloned()
            .ok_or(FetchError::Missing(id))
    }
}

pub fn story(id: i64, title: &str, url: Option<&str>) -> FeedItem {
    FeedItem {
        id,
        kind: Some("story".to_string()),
        title: Some(title.to_string()),
        url: url.map(str::to_string),
        time: Some(1_700_000_000 + id),
        score: Some(100 + id),
        descendants: Some(10),
        by: Some("tester".to_string()),
        ..Default::default()
    }
}

pub fn vocabulary() -> Vocabulary {
    Vocabulary::new(["AI", "ChatGPT", "Claude", "OpenAI", "LLM"])
}

/// Collaborators behind a test [`AppState`], kept for direct inspection.
pub struct TestContext {
    pub state: AppState,
    pub items: Arc<InMemoryItemRepository>,
    pub analytics: Arc<InMemoryAnalyticsRepository>,
    pub feed: Arc<ScriptedFeed>,
    pub events: Arc<LocalEventChannel>,
}

pub fn create_test_context() -> TestContext {
    create_test_context_with(JobRunnerSettings::default())
}

pub fn create_test_context_with(job_settings: JobRunnerSettings) -> TestContext {
    let items = Arc::new(InMemoryItemRepository::new());
    let analytics = Arc::new(InMemoryAnalyticsRepository::new(items.clone()));
    let feed = Arc::new(ScriptedFeed::new());
    let events = Arc::new(LocalEventChannel::new(64));

    let state = AppState::build(
        items.clone(),
        analytics.clone(),
        feed.clone(),
        events.clone() as Arc<dyn EventChannel>,
        Arc::new(vocabulary()),
        IngestSettings {
            topic: TOPIC.to_string(),
            fetch_concurrency: 4,
            default_limit: 50,
        },
        job_settings,
    );

    TestContext {
        state,
        items,
        analytics,
        feed,
        events,
    }
}

pub fn create_test_state() -> AppState {
    create_test_context().state
}
