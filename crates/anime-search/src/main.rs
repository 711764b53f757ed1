//! Anime search CLI application.
//!
//! Drives a search session from stdin commands and prints the results
//! page, banner and details to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use anime_search::{JikanClient, SearchSession, SearchState, SessionEvent};
use clap::Parser;
use shared::{AnimeDetails, Config, ContentRating, FilterSet, LogConfig, MediaType, TopFilter};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

mod commands;

use commands::{Command, HELP};

const BLURB_CHARS: usize = 130;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initial search text
    #[arg(short, long)]
    query: Option<String>,

    /// Initial page
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Media type filter (tv, movie, ova, ...)
    #[arg(long = "type")]
    media_type: Option<MediaType>,

    /// Top list category (airing, upcoming, bypopularity, favorite)
    #[arg(long)]
    filter: Option<TopFilter>,

    /// Content rating (g, pg, pg13, r17, r, rx)
    #[arg(long)]
    rating: Option<ContentRating>,

    /// Safe-for-work results only
    #[arg(long)]
    sfw: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings("anime-search", &config.logging);
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Anime search starting");

    let client = JikanClient::from_config(&config.catalog)
        .context("Failed to create Jikan client")?;
    let mut session = SearchSession::new(&config.search, Arc::new(client));

    let recommendations = session.load_recommendations().await.len();
    debug!(recommendations, "Recommendations ready");

    // Seed the session from the command line; every change is debounced,
    // so this still results in a single request
    session.set_filters(FilterSet {
        media_type: args.media_type,
        top_filter: args.filter,
        rating: args.rating,
        sfw_only: args.sfw,
    });
    if let Some(query) = args.query {
        session.set_query(query);
    }
    session.set_page(args.page);
    session.start();

    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => run_command(&mut session, command).await,
                    Err(e) => println!("{}", e),
                }
            }
            event = session.next_event() => {
                match event {
                    Some(event) => render_event(&session, &event),
                    None => break,
                }
            }
        }
    }

    session.shutdown();
    let stats = session.reconciler_stats();
    info!(
        applied = stats.applied,
        stale = stats.stale,
        failures = stats.failures,
        rate_limited = stats.rate_limited,
        "Anime search finished"
    );

    Ok(())
}

async fn run_command(session: &mut SearchSession, command: Command) {
    match command {
        Command::Search(text) => session.set_query(text),
        Command::Clear => session.clear_query(),
        Command::Page(page) => session.set_page(page),
        Command::Next => session.next_page(),
        Command::Prev => session.previous_page(),
        Command::Type(value) => session.update_filters(|f| f.media_type = value),
        Command::Filter(value) => session.update_filters(|f| f.top_filter = value),
        Command::Rating(value) => session.update_filters(|f| f.rating = value),
        Command::Sfw(on) => session.update_filters(|f| f.sfw_only = on),
        Command::Detail(id) => match session.fetch_detail(id).await {
            Ok(details) => print_details(&details),
            Err(e) => println!("Could not load anime {}: {}", id, e),
        },
        Command::Recs => {
            let recommendations = session.load_recommendations().await;
            if recommendations.is_empty() {
                println!("No recommendations available.");
            }
            for rec in recommendations {
                if let Some(anime) = rec.primary_entry() {
                    println!("{:>7}  {}", anime.mal_id, anime.title);
                    println!("         {}", rec.blurb(BLURB_CHARS));
                }
            }
        }
        Command::State => print_results(session.state()),
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}

fn render_event(session: &SearchSession, event: &SessionEvent) {
    match event {
        SessionEvent::FetchStarted { .. } => println!("Loading..."),
        SessionEvent::ResultsApplied { .. } => print_results(session.state()),
        SessionEvent::StaleResponseDiscarded { .. } => {}
        SessionEvent::BannerAdvanced { index } => {
            if let Some(title) = banner_title(session, *index) {
                println!("[banner {}] {}", index + 1, title);
            }
        }
    }
}

fn banner_title(session: &SearchSession, index: usize) -> Option<String> {
    let id = *session.banner_ids().get(index)?;

    let from_results = session
        .state()
        .results
        .iter()
        .find(|a| a.mal_id == id)
        .map(|a| a.title.clone());

    from_results.or_else(|| {
        session
            .recommendations()
            .iter()
            .filter_map(|r| r.primary_entry())
            .find(|a| a.mal_id == id)
            .map(|a| a.title.clone())
    })
}

fn print_results(state: &SearchState) {
    if state.loading {
        println!("Loading...");
        return;
    }
    if state.results.is_empty() {
        println!("No results found.");
        return;
    }

    for anime in &state.results {
        let episodes = anime
            .episodes
            .map(|e| e.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "{:>7}  {}  (episodes: {}, status: {})",
            anime.mal_id,
            anime.title,
            episodes,
            anime.status.as_deref().unwrap_or("unknown")
        );
    }
    println!("Page {} of {}", state.page, state.page_count);
}

fn print_details(details: &AnimeDetails) {
    println!("{} [{}]", details.title, details.mal_id);
    if let Some(english) = &details.title_english {
        println!("  English title: {}", english);
    }
    println!(
        "  Score: {} ({} votes)  Rank: {}  Popularity: {}",
        display_or_na(details.score),
        display_or_na(details.scored_by),
        display_or_na(details.rank),
        display_or_na(details.popularity)
    );
    println!(
        "  Episodes: {}  Status: {}  Members: {}",
        display_or_na(details.episodes),
        details.status.as_deref().unwrap_or("N/A"),
        display_or_na(details.members)
    );
    if !details.genres.is_empty() {
        let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        println!("  Genres: {}", genres.join(", "));
    }
    if let Some(synopsis) = &details.synopsis {
        println!();
        println!("{}", synopsis);
    }
}

fn display_or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
