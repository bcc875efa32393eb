//! GiveLink CLI - donation marketplace search from the terminal

use clap::{Parser, Subcommand};
use givelink_core::config::Config;
use givelink_core::domain::search::{
    FacetField, SearchRequest, SearchService, SuggestionScope,
};
use givelink_core::storage::{Database, DatabaseConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "givelink")]
#[command(author, version, about = "Donation marketplace search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the SQLite database (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Search donations
    Search {
        /// Search term (omit to browse)
        query: Option<String>,
        /// Category filter
        #[arg(short, long)]
        category: Option<String>,
        /// Condition filter
        #[arg(long)]
        condition: Option<String>,
        /// Location substring filter
        #[arg(short, long)]
        location: Option<String>,
        /// Status filter
        #[arg(long)]
        status: Option<String>,
        /// Only available donations
        #[arg(short, long)]
        available: bool,
        /// Inclusive start date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Inclusive end date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        /// Sort field (fallback path only)
        #[arg(long)]
        sort_by: Option<String>,
        /// Sort order: asc or desc
        #[arg(long)]
        sort_order: Option<String>,
        /// Disable the ranked full-text path
        #[arg(long)]
        no_fulltext: bool,
        /// Page number
        #[arg(short, long)]
        page: Option<i64>,
        /// Page size (1-100)
        #[arg(short = 'n', long)]
        limit: Option<i64>,
        /// Log the search under this user id
        #[arg(short, long)]
        user: Option<i64>,
    },

    /// Typeahead suggestions for a partial term
    Suggest {
        /// Partial term (at least 2 characters)
        partial: String,
        /// Source: all, donations, or users
        #[arg(short, long, default_value = "all")]
        r#type: String,
        /// Maximum suggestions
        #[arg(short = 'n', long)]
        limit: Option<i64>,
    },

    /// Show a user's recent search terms
    History {
        /// User id
        user: i64,
        /// Maximum entries
        #[arg(short = 'n', long)]
        limit: Option<i64>,
    },

    /// Delete a user's search history
    ClearHistory {
        /// User id
        user: i64,
    },

    /// Most searched terms
    Popular {
        /// Maximum terms
        #[arg(short = 'n', long)]
        limit: Option<i64>,
        /// Trailing window in days
        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Search analytics (admin)
    Analytics {
        /// Trailing window in days
        #[arg(short, long)]
        days: Option<i64>,
    },

    /// Distinct filter values for the search UI
    Filters,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the active configuration
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("givelink=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let get_db = || async { Database::new(DatabaseConfig::with_path(&db_path)).await };

    match cli.command {
        Commands::Search {
            query,
            category,
            condition,
            location,
            status,
            available,
            start_date,
            end_date,
            sort_by,
            sort_order,
            no_fulltext,
            page,
            limit,
            user,
        } => {
            let request = SearchRequest {
                term: query,
                category,
                condition,
                location,
                status,
                available_only: available.then_some(true),
                start_date,
                end_date,
                sort_by,
                sort_order,
                prefer_full_text: !no_fulltext,
                page,
                limit,
                user_id: user,
            };
            let db = get_db().await?;
            cmd_search(&db, &request, cli.format, cli.quiet).await
        }

        Commands::Suggest { partial, r#type, limit } => {
            let db = get_db().await?;
            cmd_suggest(&db, &partial, &r#type, limit, cli.format).await
        }

        Commands::History { user, limit } => {
            let db = get_db().await?;
            cmd_history(&db, user, limit, cli.format, cli.quiet).await
        }

        Commands::ClearHistory { user } => {
            let db = get_db().await?;
            cmd_clear_history(&db, user, cli.quiet).await
        }

        Commands::Popular { limit, days } => {
            let db = get_db().await?;
            let days = days.or(Some(config.search.popular_window_days));
            cmd_popular(&db, limit, days, cli.format, cli.quiet).await
        }

        Commands::Analytics { days } => {
            let db = get_db().await?;
            cmd_analytics(&db, days, cli.format).await
        }

        Commands::Filters => {
            let db = get_db().await?;
            cmd_filters(&db, cli.format).await
        }

        Commands::Config { action } => cmd_config(&config, action),

        Commands::Doctor => {
            let db = get_db().await?;
            cmd_doctor(&db).await
        }
    }
}

async fn cmd_search(
    db: &Database,
    request: &SearchRequest,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let service = SearchService::with_pool(db.pool().clone());
    let result = service.search(request).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if result.results.is_empty() {
                if !quiet {
                    println!("No donations found.");
                }
                return Ok(());
            }
            if !quiet {
                let path = if result.used_full_text { "ranked" } else { "filtered" };
                println!(
                    "Found {} donation(s) ({} search, page {}/{}):",
                    result.pagination.total,
                    path,
                    result.pagination.page,
                    result.pagination.total_pages.max(1)
                );
            }
            for r in &result.results {
                let score = r
                    .relevance_score
                    .map(|s| format!("  [score {s:.3}]"))
                    .unwrap_or_default();
                println!(
                    "  #{} {} - {} ({}){}",
                    r.item.id, r.item.title, r.item.category, r.item.location, score
                );
            }
        }
    }
    Ok(())
}

async fn cmd_suggest(
    db: &Database,
    partial: &str,
    scope: &str,
    limit: Option<i64>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let scope = SuggestionScope::parse(scope)
        .ok_or_else(|| anyhow::anyhow!("Unknown suggestion type '{}'. Use all, donations, or users.", scope))?;

    let service = SearchService::with_pool(db.pool().clone());
    let suggestions = service.suggest(partial, scope, limit).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&suggestions)?),
        OutputFormat::Text => {
            for s in &suggestions {
                let extra = s
                    .category
                    .as_deref()
                    .or(s.location.as_deref())
                    .map(|v| format!(" ({v})"))
                    .unwrap_or_default();
                println!("  {} [{}]{}", s.text, s.kind, extra);
            }
        }
    }
    Ok(())
}

async fn cmd_history(
    db: &Database,
    user: i64,
    limit: Option<i64>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let service = SearchService::with_pool(db.pool().clone());
    let history = service.user_history(user, limit).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&history)?),
        OutputFormat::Text => {
            if history.is_empty() {
                if !quiet {
                    println!("No search history for user {}.", user);
                }
                return Ok(());
            }
            for entry in &history {
                println!(
                    "  {} - {}",
                    entry.last_searched.format("%Y-%m-%d %H:%M:%S"),
                    entry.term
                );
            }
        }
    }
    Ok(())
}

async fn cmd_clear_history(db: &Database, user: i64, quiet: bool) -> anyhow::Result<()> {
    let service = SearchService::with_pool(db.pool().clone());
    let success = service.clear_history(user).await;

    if !quiet {
        if success {
            println!("Search history cleared for user {}.", user);
        } else {
            println!("Could not clear search history for user {}.", user);
        }
    }
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_popular(
    db: &Database,
    limit: Option<i64>,
    days: Option<i64>,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let service = SearchService::with_pool(db.pool().clone());
    let terms = service.popular_terms(limit, days).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&terms)?),
        OutputFormat::Text => {
            if terms.is_empty() {
                if !quiet {
                    println!("No searches recorded in the window.");
                }
                return Ok(());
            }
            for t in &terms {
                println!("  {:>5}  {}", t.count, t.term);
            }
        }
    }
    Ok(())
}

async fn cmd_analytics(db: &Database, days: Option<i64>, format: OutputFormat) -> anyhow::Result<()> {
    let service = SearchService::with_pool(db.pool().clone());
    let report = service.analytics(days).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("Search analytics:");
            println!("  Total searches: {}", report.total_searches);
            println!("  Unique users: {}", report.unique_users);
            println!("  Avg per user: {}", report.average_searches_per_user);
            if !report.top_terms.is_empty() {
                println!("  Top terms:");
                for t in &report.top_terms {
                    println!("    {:>5}  {}", t.count, t.term);
                }
            }
            if !report.daily_trend.is_empty() {
                println!("  Daily trend:");
                for d in &report.daily_trend {
                    println!("    {}  {} searches, {} users", d.date, d.count, d.unique_users);
                }
            }
        }
    }
    Ok(())
}

async fn cmd_filters(db: &Database, format: OutputFormat) -> anyhow::Result<()> {
    let service = SearchService::with_pool(db.pool().clone());
    let categories = service.facet_values(FacetField::Category).await?;
    let conditions = service.facet_values(FacetField::Condition).await?;
    let locations = service.facet_values(FacetField::Location).await?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "categories": categories,
                "conditions": conditions,
                "locations": locations,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("Categories: {}", categories.join(", "));
            println!("Conditions: {}", conditions.join(", "));
            println!("Locations: {}", locations.join(", "));
        }
    }
    Ok(())
}

fn cmd_config(config: &Config, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(db: &Database) -> anyhow::Result<()> {
    db.health_check().await?;
    println!("Database: ok ({})", db.path().display());

    let status = db.migration_status().await?;
    println!(
        "Schema: v{} (target v{}){}",
        status.current_version,
        status.target_version,
        if status.needs_migration { " - migration needed" } else { "" }
    );
    Ok(())
}
