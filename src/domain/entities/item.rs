//! Item entity representing one ingested news entry.

use chrono::{DateTime, Utc};

/// A news entry persisted on first sighting.
///
/// Keyed by the feed's external id. Rows are written exactly once and never
/// updated afterwards: a re-fetch with a higher score or more comments is
/// ignored (first write wins).
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub link: Option<String>,
    pub published_at: DateTime<Utc>,
    pub score: i64,
    pub comment_count: i64,
    pub author: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl Item {
    /// Creates a new Item instance.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        title: String,
        link: Option<String>,
        published_at: DateTime<Utc>,
        score: i64,
        comment_count: i64,
        author: Option<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            link,
            published_at,
            score,
            comment_count,
            author,
            fetched_at,
        }
    }
}

/// Input data for persisting a new item.
///
/// `fetched_at` is assigned by the store at insertion time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub id: i64,
    pub title: String,
    pub link: Option<String>,
    pub published_at: DateTime<Utc>,
    pub score: i64,
    pub comment_count: i64,
    pub author: Option<String>,
}

impl NewItem {
    /// Converts into a persisted [`Item`] stamped with `fetched_at`.
    pub fn into_item(self, fetched_at: DateTime<Utc>) -> Item {
        Item {
            id: self.id,
            title: self.title,
            link: self.link,
            published_at: self.published_at,
            score: self.score,
            comment_count: self.comment_count,
            author: self.author,
            fetched_at,
        }
    }
}

impl From<&Item> for NewItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            link: item.link.clone(),
            published_at: item.published_at,
            score: item.score,
            comment_count: item.comment_count,
            author: item.author.clone(),
        }
    }
}

/// Filter criteria for item listings.
///
/// `keyword` matches a case-insensitive substring of the title, `domain` a
/// case-insensitive substring of the link.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub keyword: Option<String>,
    pub domain: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl ItemFilter {
    /// Creates a filter with pagination only.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            keyword: None,
            domain: None,
            offset,
            limit,
        }
    }

    /// Restricts results to titles containing `keyword`.
    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword.filter(|k| !k.trim().is_empty());
        self
    }

    /// Restricts results to links containing `domain`.
    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain.filter(|d| !d.trim().is_empty());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_new_item() -> NewItem {
        NewItem {
            id: 42,
            title: "Show HN: A tiny LLM".to_string(),
            link: Some("https://example.com/llm".to_string()),
            published_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            score: 120,
            comment_count: 33,
            author: Some("pg".to_string()),
        }
    }

    #[test]
    fn test_into_item_keeps_fields_and_stamps_fetch_time() {
        let fetched_at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 0).unwrap();
        let item = sample_new_item().into_item(fetched_at);

        assert_eq!(item.id, 42);
        assert_eq!(item.title, "Show HN: A tiny LLM");
        assert_eq!(item.score, 120);
        assert_eq!(item.comment_count, 33);
        assert_eq!(item.fetched_at, fetched_at);
    }

    #[test]
    fn test_new_item_from_item_drops_fetch_time() {
        let new_item = sample_new_item();
        let item = new_item.clone().into_item(Utc::now());

        assert_eq!(NewItem::from(&item), new_item);
    }

    #[test]
    fn test_filter_ignores_blank_values() {
        let filter = ItemFilter::new(0, 25)
            .with_keyword(Some("  ".to_string()))
            .with_domain(Some("github.com".to_string()));

        assert!(filter.keyword.is_none());
        assert_eq!(filter.domain.as_deref(), Some("github.com"));
        assert_eq!(filter.limit, 25);
    }
}
