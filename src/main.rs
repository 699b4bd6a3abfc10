use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use luna_stream::{
    CatalogItem, Config, DetailsSession, EmbedPlayer, EpisodeRecord, MediaId, MediaKind,
    MetadataProvider, SessionEvent, TmdbProvider, VidSrcPlayer, prepare_playback,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// LunaStream - find a film or episode and get its player URL
#[derive(Parser)]
#[command(name = "luna-stream")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a config file (defaults to luna-stream.toml or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search films and series
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Show the seasons of a series and the episodes of its first season
    #[command(alias = "i")]
    Info {
        /// Series ID
        series_id: MediaId,
    },

    /// Resolve the player URL for a film or an episode
    #[command(alias = "p")]
    Play {
        #[command(subcommand)]
        target: PlayCommand,
    },

    /// Search and pick a title, season and episode interactively
    #[command(alias = "b")]
    Browse {
        /// Initial search query (prompted for when omitted)
        query: Vec<String>,
    },
}

#[derive(Subcommand)]
enum PlayCommand {
    /// Play a film
    Movie {
        /// Film ID
        id: MediaId,
    },

    /// Play an episode of a series
    Tv {
        /// Series ID
        id: MediaId,
        /// Season number (defaults to the first regular season)
        #[arg(long, short)]
        season: Option<u32>,
        /// Episode number (defaults to 1)
        #[arg(long, short)]
        episode: Option<u32>,
    },
}

/// Logs session progress at debug level; results go to stdout separately
fn handle_session_event(event: SessionEvent) {
    tracing::debug!(?event, "session event");
}

fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_item(index: usize, item: &CatalogItem) {
    let year = item
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    println!(
        "{:>3}. [{}] {} ({}) - {:.1}/10 - id {}",
        index + 1,
        item.kind.label(),
        item.display_title(),
        year,
        item.rating,
        item.id
    );
}

fn print_episode(episode: &EpisodeRecord) {
    println!("  Episode {}: {}", episode.episode_number, episode.name);
    if let Some(air_date) = &episode.air_date {
        println!("  Aired: {air_date}");
    }
    if !episode.overview.is_empty() {
        println!("  {}", episode.overview);
    }
    for credit in episode.crew.iter().filter(|c| c.role == "Director") {
        println!("  Directed by {}", credit.name);
    }
    if !episode.guest_stars.is_empty() {
        let guests: Vec<String> = episode
            .guest_stars
            .iter()
            .map(|g| format!("{} as {}", g.name, g.character))
            .collect();
        println!("  Guest stars: {}", guests.join(", "));
    }
}

async fn cmd_search(provider: &dyn MetadataProvider, query: &str) -> Result<()> {
    let results = match provider.search_catalog(query).await {
        Ok(results) => results,
        Err(e) => {
            tracing::warn!(error = %e, "search failed");
            Vec::new()
        }
    };

    if results.is_empty() {
        println!("No results for '{query}'.");
        return Ok(());
    }

    for (index, item) in results.iter().enumerate() {
        print_item(index, item);
    }
    Ok(())
}

async fn cmd_info(provider: Arc<dyn MetadataProvider>, series_id: MediaId) -> Result<()> {
    let item = CatalogItem::from_id(series_id, MediaKind::Series);
    let mut session = DetailsSession::open(provider, item);
    for event in session.drain().await {
        handle_session_event(event);
    }

    let seasons = session.selection().seasons();
    if seasons.is_empty() {
        println!("No seasons available for series {series_id}.");
        return Ok(());
    }

    println!("=== Seasons ===");
    for season in seasons {
        println!(
            "  Season {:>2}: {} ({} episode(s))",
            season.season_number, season.name, season.episode_count
        );
    }

    if let (Some(season), Some(episodes)) =
        (session.selection().selected_season(), session.episodes())
    {
        println!("\n=== Season {season} ===");
        if episodes.is_empty() {
            println!("  Episode details unavailable.");
        }
        for episode in episodes {
            println!("  {:>2}. {}", episode.episode_number, episode.name);
        }
    }
    Ok(())
}

async fn cmd_play(
    provider: Arc<dyn MetadataProvider>,
    player: &dyn EmbedPlayer,
    command: PlayCommand,
) -> Result<()> {
    let (item, season, episode) = match command {
        PlayCommand::Movie { id } => (CatalogItem::from_id(id, MediaKind::Film), None, None),
        PlayCommand::Tv {
            id,
            season,
            episode,
        } => (CatalogItem::from_id(id, MediaKind::Series), season, episode),
    };

    let plan = prepare_playback(provider, player, item, season, episode, handle_session_event)
        .await
        .context("Could not resolve playback")?;

    println!("Now playing: {}", plan.target.label());
    if let Some(episode) = &plan.episode {
        print_episode(episode);
    }
    println!("{}", plan.url);
    Ok(())
}

async fn cmd_browse(
    provider: Arc<dyn MetadataProvider>,
    player: &dyn EmbedPlayer,
    image_base_url: &str,
    query: Option<String>,
) -> Result<()> {
    let query = match query {
        Some(query) => query,
        None => Input::<String>::new()
            .with_prompt("Search for movies or TV shows")
            .interact_text()?,
    };

    let results = provider.search_catalog(&query).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "search failed");
        Vec::new()
    });
    if results.is_empty() {
        println!("No results for '{query}'.");
        return Ok(());
    }

    let labels: Vec<String> = results
        .iter()
        .map(|item| format!("[{}] {}", item.kind.label(), item.display_title()))
        .collect();
    let choice = Select::new()
        .with_prompt("Pick a title")
        .items(&labels)
        .default(0)
        .interact()?;
    let item = results[choice].clone();

    println!("{}", item.display_title());
    if !item.overview.is_empty() {
        println!("{}", item.overview);
    }
    println!("Poster: {}", item.poster_url(image_base_url));

    let mut session = DetailsSession::open(provider, item);
    for event in session.drain().await {
        handle_session_event(event);
    }

    let seasons = session.selection().seasons().to_vec();
    if !seasons.is_empty() {
        let labels: Vec<String> = seasons
            .iter()
            .map(|s| format!("Season {} - {}", s.season_number, s.name))
            .collect();
        let choice = Select::new()
            .with_prompt("Pick a season")
            .items(&labels)
            .default(0)
            .interact()?;
        session.select_season(seasons[choice].season_number)?;
        for event in session.drain().await {
            handle_session_event(event);
        }

        let count = session.selection().episode_count().unwrap_or(1);
        let labels: Vec<String> = (1..=count)
            .map(|n| match session.resolve_episode(n) {
                Some(episode) => format!("{n}. {}", episode.name),
                None => format!("Episode {n}"),
            })
            .collect();
        let choice = Select::new()
            .with_prompt("Pick an episode")
            .items(&labels)
            .default(0)
            .interact()?;
        session.select_episode(choice as u32 + 1)?;
    }

    let target = session
        .playback_target()
        .context("Nothing playable for this title")?;

    println!("Now playing: {}", target.label());
    if let Some(episode) = session.current_episode() {
        print_episode(episode);
    }
    println!("{}", player.playback_url(&target));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::locate(cli.config.as_deref());
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config);
    match &config_path {
        Some(path) => tracing::info!("Loaded config from: {}", path.display()),
        None => tracing::info!("No config file found, using defaults"),
    }
    config.validate()?;

    let provider: Arc<dyn MetadataProvider> = Arc::new(TmdbProvider::with_base_url(
        config.tmdb.api_key.clone(),
        config.tmdb.base_url.clone(),
    ));
    let player = VidSrcPlayer::new(config.player.embed_base_url.clone());

    match cli.command {
        Commands::Search { query } => cmd_search(provider.as_ref(), &query.join(" ")).await,
        Commands::Info { series_id } => cmd_info(provider, series_id).await,
        Commands::Play { target } => cmd_play(provider, &player, target).await,
        Commands::Browse { query } => {
            let query = (!query.is_empty()).then(|| query.join(" "));
            cmd_browse(provider, &player, &config.tmdb.image_base_url, query).await
        }
    }
}
