mod common;

use news_analytics::application::services::{BatchProgress, IngestError};
use news_analytics::domain::feed::FeedItem;
use news_analytics::domain::item_event::ItemStoredEvent;
use news_analytics::infrastructure::events::EventChannel;
use std::sync::Mutex;
use std::time::Duration;

#[tokio::test]
async fn test_batch_stores_and_counts_new_items() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(1, "ChatGPT and Claude compared", Some("https://www.openai.com/blog"));
    ctx.feed.push_story(2, "Rust 1.80 released", Some("https://blog.rust-lang.org/x"));
    ctx.feed.push_story(3, "Claude learns Rust", None);

    let result = ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    assert_eq!(result.total_fetched, 3);
    assert_eq!(result.new_count, 3);
    assert_eq!(result.processed_count, 3);
    assert_eq!(ctx.items.len(), 3);

    assert_eq!(ctx.analytics.keyword_count("claude"), 2);
    assert_eq!(ctx.analytics.keyword_count("chatgpt"), 1);
    assert_eq!(ctx.analytics.keyword_count("rust"), 0);
    assert_eq!(ctx.analytics.domain_count("openai.com"), 1);
    assert_eq!(ctx.analytics.domain_count("blog.rust-lang.org"), 1);
}

#[tokio::test]
async fn test_second_batch_is_idempotent() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(10, "OpenAI news", Some("https://openai.com"));
    ctx.feed.push_story(11, "LLM benchmarks", Some("https://arxiv.org/abs/1"));

    let first = ctx.state.ingest_service.ingest_batch(None).await.unwrap();
    let fetches_after_first = ctx.feed.fetch_count();
    let second = ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    assert_eq!(first.processed_count, 2);
    assert_eq!(second.total_fetched, 2);
    assert_eq!(second.new_count, 0);
    assert_eq!(second.processed_count, 0);

    // Known ids are not fetched again
    assert_eq!(ctx.feed.fetch_count(), fetches_after_first);

    assert_eq!(ctx.items.len(), 2);
    assert_eq!(ctx.analytics.keyword_count("openai"), 1);
    assert_eq!(ctx.analytics.keyword_count("llm"), 1);
    assert_eq!(ctx.analytics.domain_count("openai.com"), 1);
}

#[tokio::test]
async fn test_counters_only_grow_across_batches() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(1, "Claude 3", Some("https://anthropic.com"));
    ctx.state.ingest_service.ingest_batch(None).await.unwrap();
    let before = ctx.analytics.keyword_count("claude");

    ctx.feed.push_story(2, "Claude 4", Some("https://anthropic.com/news"));
    ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    assert_eq!(before, 1);
    assert_eq!(ctx.analytics.keyword_count("claude"), 2);
    assert_eq!(ctx.analytics.domain_count("anthropic.com"), 2);
}

#[tokio::test]
async fn test_failed_counter_write_is_retried_without_double_counting() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(1, "ChatGPT meets Claude", Some("https://www.anthropic.com/news"));
    ctx.items.fail_keyword_once("claude");

    let first = ctx.state.ingest_service.ingest_by_id(1).await;
    assert!(matches!(first, Err(IngestError::Storage(_))));
    assert!(ctx.items.get(1).is_none());
    assert_eq!(ctx.analytics.keyword_count("chatgpt"), 0);
    assert_eq!(ctx.analytics.keyword_count("claude"), 0);

    let retry = ctx.state.ingest_service.ingest_by_id(1).await.unwrap();
    assert!(retry.created);
    assert!(ctx.items.get(1).is_some());
    assert_eq!(ctx.analytics.keyword_count("chatgpt"), 1);
    assert_eq!(ctx.analytics.keyword_count("claude"), 1);
    assert_eq!(ctx.analytics.domain_count("anthropic.com"), 1);

    let again = ctx.state.ingest_service.ingest_by_id(1).await.unwrap();
    assert!(!again.created);
    assert_eq!(ctx.analytics.keyword_count("claude"), 1);
}

#[tokio::test]
async fn test_failed_fetches_do_not_abort_batch() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(1, "AI story one", Some("https://a.example"));
    ctx.feed.push_story(2, "AI story two", Some("https://b.example"));
    ctx.feed.push_missing(3);
    ctx.feed.push_story(4, "AI story four", Some("https://c.example"));
    ctx.feed.fail_on(2);

    let result = ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    assert_eq!(result.total_fetched, 4);
    assert_eq!(result.new_count, 4);
    assert_eq!(result.processed_count, 2);
    assert!(ctx.items.get(1).is_some());
    assert!(ctx.items.get(2).is_none());
    assert!(ctx.items.get(4).is_some());
}

#[tokio::test]
async fn test_single_storage_failure_is_contained() {
    let ctx = common::create_test_context();
    for id in 1..=4 {
        ctx.feed.push_story(id, "AI weekly", Some("https://news.example"));
    }
    ctx.items.fail_on(3);

    let result = ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    assert_eq!(result.processed_count, 3);
    assert!(ctx.items.get(3).is_none());
    assert_eq!(ctx.analytics.keyword_count("ai"), 3);
}

#[tokio::test]
async fn test_storage_failing_for_most_items_fails_batch() {
    let ctx = common::create_test_context();
    for id in 1..=3 {
        ctx.feed.push_story(id, "AI weekly", None);
        ctx.items.fail_on(id);
    }

    let err = ctx.state.ingest_service.ingest_batch(None).await.unwrap_err();

    assert!(matches!(
        err,
        IngestError::StorageMajority {
            failed: 3,
            attempted: 3
        }
    ));
}

#[tokio::test]
async fn test_listing_failure_fails_batch() {
    let ctx = common::create_test_context();
    ctx.feed.take_listing_down();

    let err = ctx.state.ingest_service.ingest_batch(None).await.unwrap_err();

    assert!(matches!(err, IngestError::Fetch(_)));
    assert_eq!(ctx.items.len(), 0);
}

#[tokio::test]
async fn test_unknown_domain_is_never_counted() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(1, "Ask HN: favourite LLM?", None);
    ctx.feed.push_story(2, "AI on a toaster", Some("not a url"));

    let result = ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    assert_eq!(result.processed_count, 2);
    assert!(ctx.analytics.domain_keys().is_empty());

    let summary = ctx.state.analytics_service.summary().await.unwrap();
    assert_eq!(summary.total_items, 2);
    assert_eq!(summary.total_domains, 0);
}

#[tokio::test]
async fn test_non_story_entries_are_skipped() {
    let ctx = common::create_test_context();
    ctx.feed.push_raw(FeedItem {
        kind: Some("job".to_string()),
        ..common::story(1, "Hiring AI engineers", None)
    });
    ctx.feed.push_raw(FeedItem {
        deleted: true,
        ..common::story(2, "Gone", None)
    });
    ctx.feed.push_story(3, "Claude in production", None);

    let result = ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    assert_eq!(result.new_count, 3);
    assert_eq!(result.processed_count, 1);
    assert_eq!(ctx.analytics.keyword_count("ai"), 0);
}

#[tokio::test]
async fn test_limit_truncates_listing() {
    let ctx = common::create_test_context();
    for id in 1..=10 {
        ctx.feed.push_story(id, "LLM", None);
    }

    let result = ctx.state.ingest_service.ingest_batch(Some(4)).await.unwrap();

    assert_eq!(result.total_fetched, 4);
    assert_eq!(ctx.items.len(), 4);
}

#[tokio::test]
async fn test_progress_reaches_total() {
    let ctx = common::create_test_context();
    ctx.feed.push_story(1, "AI", None);
    ctx.feed.push_story(2, "AI", None);
    ctx.state.ingest_service.ingest_batch(Some(1)).await.unwrap();
    ctx.feed.push_story(3, "AI", None);

    let seen: Mutex<Vec<BatchProgress>> = Mutex::new(Vec::new());
    ctx.state
        .ingest_service
        .ingest_batch_with_progress(None, |p| seen.lock().unwrap().push(p))
        .await
        .unwrap();

    let seen = seen.into_inner().unwrap();
    // The already-stored id counts as handled up front
    assert_eq!(seen.first().unwrap().handled, 1);
    assert!(seen.windows(2).all(|w| w[0].handled <= w[1].handled));
    assert_eq!(seen.last().unwrap().percent(), 100);
}

#[tokio::test]
async fn test_new_items_are_published_once() {
    let ctx = common::create_test_context();
    let mut rx = ctx.events.subscribe(common::TOPIC).await.unwrap();

    ctx.feed.push_story(42, "Claude writes Rust", Some("https://www.anthropic.com"));
    ctx.state.ingest_service.ingest_batch(None).await.unwrap();
    ctx.state.ingest_service.ingest_batch(None).await.unwrap();

    let payload = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let event: ItemStoredEvent = serde_json::from_str(&payload).unwrap();
    assert_eq!(event.item_id, 42);
    assert_eq!(event.item_fields.title, "Claude writes Rust");

    let next = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(next.is_err(), "duplicate ingestion must not publish");
}

#[tokio::test]
async fn test_ingest_by_id_for_missing_item() {
    let ctx = common::create_test_context();

    let err = ctx.state.ingest_service.ingest_by_id(999).await.unwrap_err();

    assert!(matches!(err, IngestError::Fetch(_)));
}
