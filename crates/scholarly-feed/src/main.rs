//! Scholarly Feed - Entry Point
//!
//! Terminal front end for the paper feed: one-shot searches, the trending
//! and library lists, and an interactive card browser.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scholarly_feed::chat::ChatSession;
use scholarly_feed::config::Config;
use scholarly_feed::feed::{ChatHandoff, FeedSession};
use scholarly_feed::formatters;
use scholarly_feed::interaction::TracingHaptics;
use scholarly_feed::models::{FeedQuery, ResponseFormat};
use scholarly_feed::{ArxivClient, MemoryStore, PaperSource, RemoteStore, SupabaseStore};

#[derive(Parser, Debug)]
#[command(name = "scholarly-feed")]
#[command(about = "Swipeable arXiv paper feed in the terminal")]
#[command(version)]
struct Cli {
    /// Supabase project URL (enables persistent likes and bookmarks)
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase anonymous key
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    supabase_anon_key: Option<String>,

    /// Account email for signing in
    #[arg(long, env = "SCHOLARLY_EMAIL")]
    email: Option<String>,

    /// Account password for signing in
    #[arg(long, env = "SCHOLARLY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output format
    #[arg(long, default_value = "markdown")]
    format: Format,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one page of papers
    Search {
        /// Free-text search term
        #[arg(default_value = "")]
        text: String,

        /// Category filter (repeatable), e.g. cs.CL
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Result offset
        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Print the query that would be sent to arXiv
    Query {
        /// Free-text search term
        #[arg(default_value = "")]
        text: String,

        /// Category filter (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },

    /// Browse the feed card by card
    Browse {
        /// Initial search term
        #[arg(default_value = "")]
        text: String,

        /// Initial category filter (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },

    /// Most liked papers
    Popular {
        /// Number of papers
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Papers you bookmarked
    Library,

    /// Create an account with --email and --password
    SignUp,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Format {
    /// Human-readable Markdown
    #[default]
    Markdown,
    /// Machine-readable JSON
    Json,
}

impl From<Format> for ResponseFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Markdown => Self::Markdown,
            Format::Json => Self::Json,
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    let mut config = Config::from_env()?;
    if cli.supabase_url.is_some() {
        config.supabase_url = cli.supabase_url.clone();
    }
    if cli.supabase_anon_key.is_some() {
        config.supabase_anon_key = cli.supabase_anon_key.clone();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        remote_store = config.has_remote_store(),
        "Starting scholarly-feed"
    );

    let format = ResponseFormat::from(cli.format);

    match cli.command {
        Command::Query { text, categories } => {
            println!("{}", scholarly_feed::query::build(&text, &categories));
        }
        Command::Search { text, categories, offset } => {
            let client = ArxivClient::new(&config)?;
            let query = FeedQuery::new(text, categories).to_query_string();
            let page = client.search(&query, offset, config.page_size).await?;
            match format {
                ResponseFormat::Markdown => println!("{}", formatters::format_page_markdown(&page)),
                ResponseFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&formatters::compact_page(&page))?);
                }
            }
        }
        Command::Popular { limit } => {
            let store = open_store(&config, cli.email.as_deref(), cli.password.as_deref()).await?;
            let papers = store.popular_papers(limit).await?;
            print_papers(&papers, format)?;
        }
        Command::Library => {
            let store = open_store(&config, cli.email.as_deref(), cli.password.as_deref()).await?;
            if store.current_user().await?.is_none() {
                anyhow::bail!("sign in with --email and --password to see your library");
            }
            let papers = store.bookmarked_papers().await?;
            print_papers(&papers, format)?;
        }
        Command::SignUp => {
            let (Some(email), Some(password)) = (cli.email.as_deref(), cli.password.as_deref())
            else {
                anyhow::bail!("sign-up needs --email and --password");
            };
            let store = open_store(&config, None, None).await?;
            let user = store.sign_up(email, password).await?;
            if store.current_user().await?.is_some() {
                println!("Signed up and signed in as {}", user.email.as_deref().unwrap_or(&user.id));
            } else {
                println!("Check {email} to confirm your account.");
            }
        }
        Command::Browse { text, categories } => {
            let client = Arc::new(ArxivClient::new(&config)?);
            let store = open_store(&config, cli.email.as_deref(), cli.password.as_deref()).await?;
            let session = FeedSession::new(&config, client, store, Arc::new(TracingHaptics));
            browse(&session, &config, &text, &categories).await?;
        }
    }

    Ok(())
}

/// Supabase when configured, otherwise an in-memory store.
async fn open_store(
    config: &Config,
    email: Option<&str>,
    password: Option<&str>,
) -> anyhow::Result<Arc<dyn RemoteStore>> {
    let store: Arc<dyn RemoteStore> = if config.has_remote_store() {
        Arc::new(SupabaseStore::new(config)?)
    } else {
        tracing::warn!("No Supabase project configured; likes and bookmarks last for this run only");
        Arc::new(MemoryStore::new())
    };

    if let (Some(email), Some(password)) = (email, password) {
        store.sign_in_with_password(email, password).await?;
    }
    Ok(store)
}

fn print_papers(papers: &[scholarly_feed::models::Paper], format: ResponseFormat) -> anyhow::Result<()> {
    match format {
        ResponseFormat::Markdown => println!("{}", formatters::format_papers_markdown(papers)),
        ResponseFormat::Json => {
            let compact: Vec<_> = papers.iter().map(formatters::compact_paper).collect();
            println!("{}", serde_json::to_string_pretty(&compact)?);
        }
    }
    Ok(())
}

const BROWSE_HELP: &str = "\
commands:
  n | up        next card            p | down   previous card
  b | right     toggle bookmark      c | left   chat about this paper
  l | like      toggle like          o          print read link
  s <text>      search               t <cat>    toggle category
  r             refresh likes        q          quit";

type Session = FeedSession<ArxivClient, dyn RemoteStore>;

async fn browse(
    session: &Session,
    config: &Config,
    text: &str,
    categories: &[String],
) -> anyhow::Result<()> {
    session.set_query(FeedQuery::new(text, categories.to_vec())).await;

    println!("{BROWSE_HELP}\n");
    print_focused(session).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
        let focused = session.controller().await.focused_paper().map(|p| p.id.clone());

        match (command, focused) {
            ("q" | "quit", _) => break,
            ("s", _) => session.set_search_text(arg).await,
            ("t", _) => session.toggle_category(arg.trim()).await,
            ("r", _) => session.refresh_relationships().await,
            ("n" | "up", Some(id)) => {
                session.handle_release(&id, 0.0, -2.0 * config.gestures.vertical).await;
            }
            ("p" | "down", Some(id)) => {
                session.handle_release(&id, 0.0, 2.0 * config.gestures.vertical).await;
            }
            ("b" | "right", Some(id)) => {
                session.handle_release(&id, 1.5 * config.gestures.horizontal, 0.0).await;
            }
            ("l" | "like", Some(id)) => {
                let now = Instant::now();
                session.handle_tap(&id, now).await;
                session.handle_tap(&id, now + Duration::from_millis(1)).await;
            }
            ("c" | "left", Some(id)) => {
                let handoff =
                    session.handle_release(&id, -1.5 * config.gestures.horizontal, 0.0).await;
                if let Some(handoff) = handoff {
                    chat(&mut lines, &handoff, config).await?;
                }
                session.on_card_visible(&id).await;
            }
            ("o", Some(id)) => {
                let controller = session.controller().await;
                match controller.paper(&id).and_then(|p| p.read_url()) {
                    Some(url) => println!("{url}"),
                    None => println!("No link for this paper."),
                }
                continue;
            }
            ("n" | "up", None) => session.load_more().await,
            ("", _) => continue,
            (_, None) => println!("Feed is empty."),
            _ => {
                println!("{BROWSE_HELP}");
                continue;
            }
        }

        print_focused(session).await;
    }

    Ok(())
}

async fn print_focused(session: &Session) {
    let controller = session.controller().await;
    if let Some(error) = controller.last_error() {
        println!("(last fetch failed: {error})");
    }
    match controller.focused_paper() {
        Some(paper) => {
            println!(
                "{}",
                formatters::format_paper_markdown(paper, controller.focus() + 1)
            );
        }
        None => println!("No papers loaded."),
    }
}

async fn chat<R>(
    lines: &mut tokio::io::Lines<R>,
    handoff: &ChatHandoff,
    config: &Config,
) -> anyhow::Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut chat = ChatSession::new(&handoff.paper_id, &handoff.title, config.chat_reply_delay);
    tracing::debug!(paper_id = chat.paper_id(), "Opened chat");
    println!(
        "## Chat: {}\n\n{}\n\n(type /back to return)",
        chat.title(),
        formatters::format_chat_markdown(chat.messages())
    );

    while let Some(line) = lines.next_line().await? {
        if line.trim() == "/back" {
            break;
        }
        if let Some(reply) = chat.send(&line).await {
            println!("**Assistant**: {}", reply.text);
        }
    }
    Ok(())
}
