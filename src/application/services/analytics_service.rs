//! Keyword/domain analytics queries.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::{AnalyticsSummary, DomainCount, Item, ItemFilter, KeywordCount};
use crate::domain::repositories::{AnalyticsRepository, ItemRepository, StorageError};

/// Number of entries in each dashboard list.
pub const DASHBOARD_TOP_N: i64 = 10;

/// Everything the dashboard shows in one read.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub top_items: Vec<Item>,
    pub top_keywords: Vec<KeywordCount>,
    pub top_domains: Vec<DomainCount>,
    pub summary: AnalyticsSummary,
}

/// Summary snapshot produced by the refresh job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct SummaryReport {
    #[serde(flatten)]
    pub summary: AnalyticsSummary,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Read-side service over the aggregate counters.
pub struct AnalyticsService {
    analytics: Arc<dyn AnalyticsRepository>,
    items: Arc<dyn ItemRepository>,
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(analytics: Arc<dyn AnalyticsRepository>, items: Arc<dyn ItemRepository>) -> Self {
        Self { analytics, items }
    }

    /// Most frequent keywords, ties broken alphabetically.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    pub async fn top_keywords(&self, limit: i64) -> Result<Vec<KeywordCount>, StorageError> {
        self.analytics.top_keywords(limit).await
    }

    /// Most frequent domains, ties broken alphabetically.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    pub async fn top_domains(&self, limit: i64) -> Result<Vec<DomainCount>, StorageError> {
        self.analytics.top_domains(limit).await
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    pub async fn summary(&self) -> Result<AnalyticsSummary, StorageError> {
        self.analytics.summary().await
    }

    /// Computes a timestamped summary; the body of the refresh job.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    pub async fn refresh_summary(&self) -> Result<SummaryReport, StorageError> {
        let summary = self.analytics.summary().await?;
        Ok(SummaryReport {
            summary,
            generated_at: chrono::Utc::now(),
        })
    }

    /// Top items, keywords and domains plus the summary.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if any of the reads fails.
    pub async fn dashboard(&self) -> Result<Dashboard, StorageError> {
        let (top_items, top_keywords, top_domains, summary) = tokio::try_join!(
            self.items.list(ItemFilter::new(0, DASHBOARD_TOP_N)),
            self.analytics.top_keywords(DASHBOARD_TOP_N),
            self.analytics.top_domains(DASHBOARD_TOP_N),
            self.analytics.summary(),
        )?;

        Ok(Dashboard {
            top_items,
            top_keywords,
            top_domains,
            summary,
        })
    }

    /// Checks that the store answers.
    pub async fn is_store_healthy(&self) -> bool {
        self.analytics.ping().await.is_ok()
    }
}
