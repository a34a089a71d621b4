//! Aggregate counter entities.

use chrono::{DateTime, Utc};

/// Number of items whose title matched a vocabulary keyword.
///
/// Keyed by the lower-cased keyword. Incremented at most once per item.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: i64,
    pub last_seen_at: DateTime<Utc>,
}

/// Number of items linking to a normalized host.
///
/// The `"unknown"` placeholder is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCount {
    pub domain: String,
    pub count: i64,
}

/// Row totals across the three analytics tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AnalyticsSummary {
    pub total_items: i64,
    pub total_keywords: i64,
    pub total_domains: i64,
}
