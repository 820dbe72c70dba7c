//! CLI entry point for the dine restaurant client.
//!
//! This binary inspects and edits the on-device state the mobile client keeps:
//! the favorites list and the auth session.
//!
//! # Usage
//!
//! ```bash
//! dine [OPTIONS] <COMMAND>
//!
//! # Show favorites
//! dine list
//!
//! # Add or remove a favorite
//! dine toggle '{"_id": "r1", "name": "Casa Lola"}'
//!
//! # Log out
//! dine session clear
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{WrapErr, eyre};
use dine_core::{Config, Restaurant};
use dine_favorites::FavoritesStore;
use dine_store::{FileStore, SessionStore};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Inspect and edit the dine client's local favorites and session.
#[derive(Parser)]
#[command(name = "dine", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file.
    #[arg(short, long, global = true, env = "DINE_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Directory holding the store file (overrides the configuration).
    #[arg(long, global = true, env = "DINE_DATA_DIR")]
    data_dir: Option<Utf8PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List favorite restaurants.
    List {
        /// Print the list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a restaurant to the favorites, or remove it if already there.
    Toggle {
        /// Restaurant as a JSON object.
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        json: Option<String>,

        /// Read the restaurant JSON from a file.
        #[arg(short, long)]
        file: Option<Utf8PathBuf>,
    },

    /// Report whether a restaurant is a favorite.
    Check {
        /// Restaurant id.
        id: String,
    },

    /// Re-read the favorites from disk.
    Reload,

    /// Inspect or clear the stored auth session.
    Session {
        /// Session action.
        #[command(subcommand)]
        action: SessionAction,
    },
}

/// Session subcommands.
#[derive(Subcommand)]
enum SessionAction {
    /// Show the stored token, user, and access flag.
    Show,
    /// Remove the stored session (log out).
    Clear,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default. Logs go
/// to stderr so command output on stdout stays clean.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Builds a [`Config`] from the optional config file and CLI overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be loaded or the result does
/// not validate.
fn build_config(cli: &Cli) -> color_eyre::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .wrap_err_with(|| format!("Failed to load configuration from {path}"))?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir.clone_from(dir);
    }

    config.validate()?;
    Ok(config)
}

fn open_store(config: &Config) -> FileStore {
    let path = config.storage.store_path();
    tracing::debug!(%path, "Opening store");
    FileStore::new(path)
}

fn parse_restaurant(json: Option<&str>, file: Option<&Utf8Path>) -> color_eyre::Result<Restaurant> {
    let contents = match (json, file) {
        (Some(json), _) => json.to_owned(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {path}"))?,
        (None, None) => return Err(eyre!("Provide the restaurant as JSON or with --file")),
    };
    serde_json::from_str(&contents).wrap_err("Invalid restaurant JSON")
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Prints the favorites, one per line or as a JSON array.
async fn run_list(config: &Config, json: bool) -> color_eyre::Result<()> {
    let store = FavoritesStore::with_config(open_store(config), config.favorites.clone());
    let favorites = store.get_favorites().await?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut handle, &*favorites)?;
        writeln!(handle)?;
        return Ok(());
    }

    if favorites.is_empty() {
        writeln!(handle, "No favorites yet.")?;
        return Ok(());
    }

    for restaurant in favorites.iter() {
        write_restaurant_line(&mut handle, restaurant)?;
    }
    writeln!(handle)?;
    writeln!(handle, "{} favorite(s)", favorites.len())?;
    Ok(())
}

/// Toggles a restaurant and reports the resulting membership.
async fn run_toggle(config: &Config, restaurant: Restaurant) -> color_eyre::Result<()> {
    let store = FavoritesStore::with_config(open_store(config), config.favorites.clone());
    let id = restaurant.id.clone();
    let name = restaurant.name.clone();

    let added = store.toggle(restaurant).await?;
    info!(%id, added, "Toggled favorite");

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if added {
        writeln!(handle, "Added {} ({id}) to favorites", display_name(&name))?;
    } else {
        writeln!(handle, "Removed {} ({id}) from favorites", display_name(&name))?;
    }
    Ok(())
}

/// Prints whether `id` is a favorite.
async fn run_check(config: &Config, id: &str) -> color_eyre::Result<()> {
    let store = FavoritesStore::with_config(open_store(config), config.favorites.clone());
    let is_favorite = store.is_favorite(id).await?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    if is_favorite {
        writeln!(handle, "{id} is a favorite")?;
    } else {
        writeln!(handle, "{id} is not a favorite")?;
    }
    Ok(())
}

/// Re-reads the favorites from disk and prints the count.
async fn run_reload(config: &Config) -> color_eyre::Result<()> {
    let store = FavoritesStore::with_config(open_store(config), config.favorites.clone());
    let favorites = store.reload().await?;

    let stdout = std::io::stdout();
    writeln!(stdout.lock(), "Reloaded {} favorite(s)", favorites.len())?;
    Ok(())
}

/// Shows or clears the auth session.
async fn run_session(config: &Config, action: &SessionAction) -> color_eyre::Result<()> {
    let session = SessionStore::new(open_store(config));
    let stdout = std::io::stdout();

    match action {
        SessionAction::Show => {
            let token = session.token().await?;
            let user = session.user().await?;
            let access = session.access().await?;

            let mut handle = stdout.lock();
            writeln!(
                handle,
                "Token:  {}",
                if token.is_some() { "set" } else { "not set" }
            )?;
            match user {
                Some(user) => writeln!(
                    handle,
                    "User:   {} <{}>",
                    user.name.as_deref().unwrap_or(&user.id),
                    user.email
                )?,
                None => writeln!(handle, "User:   none")?,
            }
            writeln!(handle, "Access: {}", access.as_deref().unwrap_or("none"))?;
        }
        SessionAction::Clear => {
            session.clear().await?;
            info!("Session cleared");
            writeln!(stdout.lock(), "Session cleared")?;
        }
    }
    Ok(())
}

// =============================================================================
// OUTPUT FORMATTING
// =============================================================================

fn write_restaurant_line(out: &mut impl Write, restaurant: &Restaurant) -> std::io::Result<()> {
    write!(
        out,
        "{:<32} {:>4.1}  {}",
        display_name(&restaurant.name),
        restaurant.rating(),
        restaurant.id
    )?;
    if let Some(price) = &restaurant.price {
        write!(out, "  {price}")?;
    }
    writeln!(out)
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "(unnamed)" } else { name }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Resolve configuration
    let config = build_config(&cli)?;

    // 5. Route to appropriate command
    match &cli.command {
        Commands::List { json } => run_list(&config, *json).await,
        Commands::Toggle { json, file } => {
            let restaurant = parse_restaurant(json.as_deref(), file.as_deref())?;
            run_toggle(&config, restaurant).await
        }
        Commands::Check { id } => run_check(&config, id).await,
        Commands::Reload => run_reload(&config).await,
        Commands::Session { action } => run_session(&config, action).await,
    }
}
