//! CLI administration tool for news-analytics.
//!
//! Provides commands for viewing analytics, running an ingestion batch and
//! performing database operations without requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # View counts and top keywords/domains
//! cargo run --bin admin -- stats
//!
//! # Run one ingestion batch of 30 items without prompting
//! cargo run --bin admin -- ingest --limit 30 -y
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server (see `news_analytics::config`); `DATABASE_URL` or the
//! `DB_*` components are required.

use news_analytics::application::services::{IngestService, IngestSettings};
use news_analytics::config::{self, Config, MAX_TOP_LIMIT, mask_connection_string};
use news_analytics::domain::repositories::AnalyticsRepository;
use news_analytics::infrastructure::feed::HackerNewsClient;
use news_analytics::infrastructure::persistence::{PgAnalyticsRepository, PgItemRepository};
use news_analytics::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

const TOP_N: i64 = 5;

/// CLI tool for managing news-analytics.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Show item counts and top keywords/domains
    Stats,

    /// Run one ingestion batch synchronously
    Ingest {
        /// Number of top ids to consider (default: FEED_TOP_LIMIT)
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=MAX_TOP_LIMIT as i64))]
        limit: Option<u16>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env().context("Failed to load configuration")?;

    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Stats => handle_stats(&pool).await?,
        Commands::Ingest { limit, yes } => {
            handle_ingest(&config, pool, limit.map(usize::from), yes).await?
        }
        Commands::Db { action } => handle_db_action(action, &pool, &config).await?,
    }

    Ok(())
}

/// Displays row totals and the top keywords and domains.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let repo = PgAnalyticsRepository::new(Arc::new(pool.clone()));

    let summary = repo.summary().await.context("Failed to load summary")?;
    let keywords = repo
        .top_keywords(TOP_N)
        .await
        .context("Failed to load keywords")?;
    let domains = repo
        .top_domains(TOP_N)
        .await
        .context("Failed to load domains")?;

    println!(
        "  Items:     {}",
        summary.total_items.to_string().bright_green().bold()
    );
    println!(
        "  Keywords:  {}",
        summary.total_keywords.to_string().bright_green().bold()
    );
    println!(
        "  Domains:   {}",
        summary.total_domains.to_string().bright_green().bold()
    );
    println!();

    println!("{}", "Top keywords".bright_white().bold());
    if keywords.is_empty() {
        println!("  {}", "none yet".bright_black());
    }
    for k in &keywords {
        println!(
            "  {:<28} {}",
            k.keyword.cyan(),
            k.count.to_string().bright_white()
        );
    }
    println!();

    println!("{}", "Top domains".bright_white().bold());
    if domains.is_empty() {
        println!("  {}", "none yet".bright_black());
    }
    for d in &domains {
        println!(
            "  {:<28} {}",
            d.domain.cyan(),
            d.count.to_string().bright_white()
        );
    }
    println!();

    Ok(())
}

/// Runs one batch against the configured feed after confirmation.
///
/// Events go to the configured channel, so a running server with Redis
/// sees them; with the in-process fallback they are dropped.
async fn handle_ingest(config: &Config, pool: PgPool, limit: Option<usize>, yes: bool) -> Result<()> {
    let limit = limit.unwrap_or(config.feed_top_limit);

    println!("{}", "📥 Ingest top items".bright_blue().bold());
    println!();
    println!("  Feed:  {}", config.feed_base_url.cyan());
    println!("  Limit: {}", limit.to_string().cyan());
    println!();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Run this batch now?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let pool = Arc::new(pool);
    let feed = HackerNewsClient::new(
        &config.feed_base_url,
        config.feed_timeout(),
        config.feed_fetch_retries,
    )
    .context("Failed to build feed client")?;
    let events = server::connect_events(config).await;

    let service = IngestService::new(
        Arc::new(PgItemRepository::new(pool)),
        Arc::new(feed),
        events.clone(),
        Arc::new(config.vocabulary()),
        IngestSettings {
            topic: config.event_topic.clone(),
            fetch_concurrency: config.feed_fetch_concurrency,
            default_limit: config.feed_top_limit,
        },
    );

    let result = service
        .ingest_batch(Some(limit))
        .await
        .map_err(|e| anyhow::anyhow!("Batch failed: {}", e))?;

    events.shutdown().await;

    println!("{}", "✅ Batch finished".green().bold());
    println!();
    println!(
        "  Fetched:  {}",
        result.total_fetched.to_string().bright_white()
    );
    println!("  Unseen:   {}", result.new_count.to_string().bright_white());
    println!(
        "  Stored:   {}",
        result.processed_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM _sqlx_migrations WHERE success",
            )
            .fetch_one(pool)
            .await
            .unwrap_or(0);

            println!(
                "  URL:        {}",
                mask_connection_string(&config.database_url).bright_white()
            );
            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
