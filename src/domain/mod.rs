//! Domain layer containing entities, contracts and pure logic.
//!
//! Nothing here performs I/O. Repository and feed traits define contracts
//! implemented by the infrastructure layer.
//!
//! # Architecture
//!
//! - [`entities`] - Items and aggregate counters
//! - [`repositories`] - Data access trait definitions
//! - [`extraction`] - Keyword and domain extraction
//! - [`feed`] - Feed collaborator contract and item normalization
//! - [`item_event`] - "Item stored" event wire format
//!
//! # Ingestion Flow
//!
//! 1. A [`feed::FeedItem`] is normalized into an [`entities::NewItem`]
//! 2. The item is stored through [`repositories::ItemRepository`]
//! 3. [`extraction`] derives keywords and the link's domain
//! 4. Counters are bumped through [`repositories::AnalyticsRepository`]
//! 5. An [`item_event::ItemStoredEvent`] is published for consumers

pub mod entities;
pub mod extraction;
pub mod feed;
pub mod item_event;
pub mod repositories;
