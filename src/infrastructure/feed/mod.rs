//! Clients for the external top-items feed.

mod hacker_news_client;

pub use hacker_news_client::HackerNewsClient;
