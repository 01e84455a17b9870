use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use futures_util::TryStreamExt;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sa_thread_scraper::parsing::parse_timestamp;
use sa_thread_scraper::{Config, ForumClient, PostEdit, PostStream};

#[derive(Debug, Parser)]
#[command(name = "sa-scraper", version, about = "Scrape and post to Something Awful threads")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a thread's posts as JSON lines.
    Posts {
        thread_id: String,
        /// Only posts by people (no Adbot, not the configured account).
        #[arg(long, conflicts_with_all = ["bots", "mine_after", "user_id"])]
        users: bool,
        /// Only posts by Adbot or the configured account.
        #[arg(long, conflicts_with_all = ["mine_after", "user_id"])]
        bots: bool,
        /// Only the configured account's posts after this time ("Oct 22, 2025 11:00").
        #[arg(long, value_parser = parse_cli_timestamp, conflicts_with = "user_id")]
        mine_after: Option<NaiveDateTime>,
        /// Only posts by this member id.
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Print one page of a thread and the thread's page count.
    Page { thread_id: String, page_number: u32 },
    /// Reply to a thread.
    Reply { thread_id: String, text: String },
    /// Replace the text of a post.
    Edit { post_id: String, text: String },
    /// Print a member's profile page.
    Profile { user_id: String },
    /// Print the forum list as JSON.
    Forums,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    info!(base_url = %config.base_url, cookies = %config.cookies_file_path.display(), "Configuration loaded");

    match cli.command {
        Command::Posts {
            thread_id,
            users,
            bots,
            mine_after,
            user_id,
        } => {
            let mut client = ForumClient::new(&config, Some(thread_id)).await?;
            let posts = match (users, bots, mine_after, user_id) {
                (true, _, _, _) => client.user_posts(),
                (_, true, _, _) => client.bot_posts(),
                (_, _, Some(after), _) => client.my_posts(after),
                (_, _, _, Some(user_id)) => client.posts_by_user(user_id),
                _ => client.posts(),
            };
            print_posts(posts).await?;
        }
        Command::Page {
            thread_id,
            page_number,
        } => {
            let mut client = ForumClient::new(&config, Some(thread_id)).await?;
            let page = client.page(page_number).await.context("Failed to fetch page")?;
            println!("{}", serde_json::json!({ "page_count": page.page_count, "posts": page.posts }));
        }
        Command::Reply { thread_id, text } => {
            let mut client = ForumClient::new(&config, Some(thread_id)).await?;
            client.reply(&text).await.context("Failed to post reply")?;
            info!("Reply submitted");
        }
        Command::Edit { post_id, text } => {
            let mut client = ForumClient::new(&config, None).await?;
            client
                .edit(PostEdit::new(post_id).text(text))
                .await
                .context("Failed to edit post")?;
            info!("Edit submitted");
        }
        Command::Profile { user_id } => {
            let mut client = ForumClient::new(&config, None).await?;
            println!("{}", client.fetch_profile(&user_id).await?);
        }
        Command::Forums => {
            let mut client = ForumClient::new(&config, None).await?;
            let forums = client.fetch_mods_and_forums().await?;
            println!("{}", serde_json::to_string_pretty(&forums)?);
        }
    }

    Ok(())
}

async fn print_posts(mut posts: PostStream<'_>) -> Result<()> {
    let mut count = 0usize;
    while let Some(post) = posts.try_next().await.context("Failed to crawl thread")? {
        println!("{}", serde_json::to_string(&post)?);
        count += 1;
    }
    info!(count, "Finished crawling thread");
    Ok(())
}

fn parse_cli_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(value).ok_or_else(|| format!("expected a time like \"Oct 22, 2025 11:00\", got {value:?}"))
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sa_thread_scraper=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays machine-readable.
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
