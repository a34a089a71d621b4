//! DTOs for analytics and dashboard endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::api::dto::items::ItemResponse;
use crate::application::services::Dashboard;
use crate::domain::entities::{AnalyticsSummary, DomainCount, KeywordCount};

pub const DEFAULT_TOP_LIMIT: i64 = 10;

/// `?limit=` for top-N endpoints.
#[serde_as]
#[derive(Debug, Default, Deserialize, Validate)]
pub struct TopQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl TopQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_TOP_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct KeywordCountResponse {
    pub keyword: String,
    pub count: i64,
    pub last_seen_at: DateTime<Utc>,
}

impl From<KeywordCount> for KeywordCountResponse {
    fn from(k: KeywordCount) -> Self {
        Self {
            keyword: k.keyword,
            count: k.count,
            last_seen_at: k.last_seen_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DomainCountResponse {
    pub domain: String,
    pub count: i64,
}

impl From<DomainCount> for DomainCountResponse {
    fn from(d: DomainCount) -> Self {
        Self {
            domain: d.domain,
            count: d.count,
        }
    }
}

/// Everything shown on the dashboard.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub top_items: Vec<ItemResponse>,
    pub top_keywords: Vec<KeywordCountResponse>,
    pub top_domains: Vec<DomainCountResponse>,
    pub summary: AnalyticsSummary,
}

impl From<Dashboard> for DashboardResponse {
    fn from(d: Dashboard) -> Self {
        Self {
            top_items: d.top_items.into_iter().map(Into::into).collect(),
            top_keywords: d.top_keywords.into_iter().map(Into::into).collect(),
            top_domains: d.top_domains.into_iter().map(Into::into).collect(),
            summary: d.summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_query_defaults_and_bounds() {
        assert_eq!(TopQuery::default().limit(), 10);
        assert!(TopQuery { limit: Some(100) }.validate().is_ok());
        assert!(TopQuery { limit: Some(0) }.validate().is_err());
        assert!(TopQuery { limit: Some(101) }.validate().is_err());
    }
}
