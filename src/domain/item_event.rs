//! "Item stored" event published after a new item is persisted.
//!
//! The JSON shape is shared with out-of-process consumers:
//!
//! ```json
//! {
//!   "itemId": 8863,
//!   "itemFields": {
//!     "title": "My YC app: Dropbox",
//!     "link": "http://www.getdropbox.com/u/2/screencast.html",
//!     "publishedAt": "2007-04-04T19:16:40Z",
//!     "score": 111,
//!     "commentCount": 71,
//!     "author": "dhouston"
//!   },
//!   "publishedAt": "2024-05-01T12:00:00.123Z"
//! }
//! ```
//!
//! Timestamps are RFC 3339 text. Unknown fields are ignored on decode.

use crate::domain::entities::NewItem;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Notification that an item was stored for the first time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStoredEvent {
    pub item_id: i64,
    pub item_fields: ItemFields,
    /// When the event was emitted.
    pub published_at: String,
}

/// Item fields carried by [`ItemStoredEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    /// When the item itself was published upstream.
    pub published_at: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub author: Option<String>,
}

/// A decoded event whose fields do not describe a valid item.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventPayloadError {
    #[error("event for item {item_id} has an invalid timestamp '{value}'")]
    InvalidTimestamp { item_id: i64, value: String },

    #[error("event for item {0} has an empty title")]
    EmptyTitle(i64),
}

impl ItemStoredEvent {
    /// Builds the event for a freshly stored item, stamped with `now`.
    pub fn new(item: &NewItem, now: DateTime<Utc>) -> Self {
        Self {
            item_id: item.id,
            item_fields: ItemFields {
                title: item.title.clone(),
                link: item.link.clone(),
                published_at: to_rfc3339(item.published_at),
                score: item.score,
                comment_count: item.comment_count,
                author: item.author.clone(),
            },
            published_at: to_rfc3339(now),
        }
    }

    /// Rebuilds the persisted item shape from the carried fields.
    ///
    /// # Errors
    ///
    /// Returns [`EventPayloadError`] if the item timestamp is not RFC 3339
    /// text or the title is blank.
    pub fn to_new_item(&self) -> Result<NewItem, EventPayloadError> {
        let fields = &self.item_fields;

        if fields.title.trim().is_empty() {
            return Err(EventPayloadError::EmptyTitle(self.item_id));
        }

        let published_at = DateTime::parse_from_rfc3339(&fields.published_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| EventPayloadError::InvalidTimestamp {
                item_id: self.item_id,
                value: fields.published_at.clone(),
            })?;

        Ok(NewItem {
            id: self.item_id,
            title: fields.title.clone(),
            link: fields.link.clone(),
            published_at,
            score: fields.score.max(0),
            comment_count: fields.comment_count.max(0),
            author: fields.author.clone(),
        })
    }
}

fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn sample_item() -> NewItem {
        NewItem {
            id: 8863,
            title: "My YC app: Dropbox".to_string(),
            link: Some("http://www.getdropbox.com/u/2/screencast.html".to_string()),
            published_at: Utc.timestamp_opt(1_175_714_200, 0).unwrap(),
            score: 111,
            comment_count: 71,
            author: Some("dhouston".to_string()),
        }
    }

    #[test]
    fn test_event_wire_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let event = ItemStoredEvent::new(&sample_item(), now);

        let value: Value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["itemId"], 8863);
        assert_eq!(value["itemFields"]["title"], "My YC app: Dropbox");
        assert_eq!(value["itemFields"]["publishedAt"], "2007-04-04T19:16:40.000Z");
        assert_eq!(value["itemFields"]["commentCount"], 71);
        assert_eq!(value["itemFields"]["author"], "dhouston");
        assert_eq!(value["publishedAt"], "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_event_tolerates_unknown_fields() {
        let payload = json!({
            "itemId": 7,
            "itemFields": {
                "title": "Gemini vs GPT-4",
                "publishedAt": "2024-01-02T03:04:05Z",
                "extra": true
            },
            "publishedAt": "2024-01-02T03:05:00Z",
            "producer": "other-service"
        });

        let event: ItemStoredEvent = serde_json::from_value(payload).unwrap();

        assert_eq!(event.item_id, 7);
        assert!(event.item_fields.link.is_none());
        assert_eq!(event.item_fields.score, 0);
    }

    #[test]
    fn test_to_new_item_round_trips_fields() {
        let item = sample_item();
        let event = ItemStoredEvent::new(&item, Utc::now());

        assert_eq!(event.to_new_item().unwrap(), item);
    }

    #[test]
    fn test_to_new_item_rejects_bad_timestamp() {
        let mut event = ItemStoredEvent::new(&sample_item(), Utc::now());
        event.item_fields.published_at = "2007-04-04 19:16:40".to_string();

        assert!(matches!(
            event.to_new_item(),
            Err(EventPayloadError::InvalidTimestamp { item_id: 8863, .. })
        ));
    }

    #[test]
    fn test_to_new_item_rejects_blank_title() {
        let mut event = ItemStoredEvent::new(&sample_item(), Utc::now());
        event.item_fields.title = " ".to_string();

        assert_eq!(event.to_new_item(), Err(EventPayloadError::EmptyTitle(8863)));
    }
}
