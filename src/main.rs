mod catalog;
mod config;
mod dashboard;
mod error;
mod http;
mod mock;
mod models;
mod notify;
mod session;
mod store;
mod supabase;
mod views;
mod watchlist;

use anyhow::{Context, Result};
use catalog::MovieFilter;
use clap::{Parser, Subcommand};
use config::Configuration;
use dashboard::Dashboard;
use http::HttpClient;
use notify::Notifier;
use rand::rngs::StdRng;
use rand::SeedableRng;
use session::{Session, SignUp};
use std::path::Path;
use std::sync::Arc;
use store::RemoteStore;
use supabase::SupabaseClient;
use tracing::{debug, info, warn};
use views::{BrowseView, MovieDetail, WatchlistView};
use watchlist::{AddOutcome, MembershipTracker};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Remote(RemoteCommand),
    /// Print a generated demo catalog as JSON
    Mock {
        #[arg(long)]
        count: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Commands that talk to the backend.
#[derive(Subcommand)]
enum RemoteCommand {
    /// List the catalog, marking movies already on your watchlist
    Browse {
        #[arg(long)]
        genre: Option<String>,
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        premium: bool,
    },
    /// List the genres present in the catalog
    Genres,
    /// Show full details for one movie
    Show { movie_id: String },
    /// Print the embeddable trailer link for a movie
    Trailer { movie_id: String },
    /// Manage your watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
    /// Account statistics
    Dashboard,
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    SignOut,
}

#[derive(Subcommand)]
enum WatchlistAction {
    List,
    Add { movie_id: String },
    Remove { movie_id: String },
}

/// Everything a command needs, built once per run.
struct App {
    notifier: Notifier,
    session: Session,
    store: Arc<dyn RemoteStore>,
    tracker: Arc<MembershipTracker>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    debug!("Starting Bingeable v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli.config)?;

    let command = match cli.command {
        Command::Mock { count, seed } => {
            return print_mock_catalog(count.unwrap_or_else(|| config.mock_count()), seed);
        }
        Command::Remote(command) => command,
    };

    let app = build_app(&config).await?;
    let result = run(&app, command).await;

    for notification in app.notifier.drain() {
        println!("{}", notification);
    }
    result
}

fn load_config(path: &str) -> Result<Configuration> {
    if Path::new(path).exists() {
        let config = Configuration::from_file(path)
            .with_context(|| format!("failed to read configuration from {}", path))?;
        info!("Configuration loaded from: {}", path);
        Ok(config)
    } else {
        debug!("No configuration file at {}, using environment only", path);
        let mut config = Configuration::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }
}

async fn build_app(config: &Configuration) -> Result<App> {
    let supabase = config.supabase()?.clone();
    let http = HttpClient::new(config.request_timeout(), &config.user_agent())?;
    let notifier = Notifier::new();

    let auth = Arc::new(SupabaseClient::new(http.clone(), supabase.clone()));
    let session = Session::new(auth, notifier.clone()).with_file(config.session_file());
    if let Err(e) = session.restore().await {
        warn!("Could not restore saved session: {}", e);
    }

    let store: Arc<dyn RemoteStore> =
        Arc::new(SupabaseClient::new(http, supabase).with_access_token(session.access_token()));
    let tracker = Arc::new(MembershipTracker::new(
        store.clone(),
        notifier.clone(),
        session.subscribe(),
    ));

    Ok(App {
        notifier,
        session,
        store,
        tracker,
    })
}

async fn run(app: &App, command: RemoteCommand) -> Result<()> {
    match command {
        RemoteCommand::Browse {
            genre,
            query,
            premium,
        } => {
            let mut view = BrowseView::new(app.store.clone(), app.tracker.clone(), app.notifier.clone());
            view.load().await?;
            let filter = MovieFilter {
                genre,
                query,
                premium_only: premium,
            };
            let cards = view.cards(&filter);
            println!("{} movies available", cards.len());
            if app.session.current_user().is_some() {
                println!("{} on your watchlist", app.tracker.len());
            }
            for card in cards {
                println!("{}", card);
            }
        }
        RemoteCommand::Genres => {
            let movies = app.store.list_movies().await?;
            for genre in catalog::genres(&movies) {
                println!("{}", genre);
            }
        }
        RemoteCommand::Show { movie_id } => {
            if let Err(e) = app.tracker.sync().await {
                warn!("Showing movie without watchlist state: {}", e);
            }
            match MovieDetail::load(app.store.as_ref(), &app.tracker, &movie_id).await? {
                Some(detail) => println!("{}", detail),
                None => anyhow::bail!("no movie with id {}", movie_id),
            }
        }
        RemoteCommand::Trailer { movie_id } => {
            let movie = app
                .store
                .get_movie(&movie_id)
                .await?
                .with_context(|| format!("no movie with id {}", movie_id))?;
            match movie.trailer_url.as_deref().and_then(catalog::trailer_embed_url) {
                Some(url) => println!("{} - Trailer\n{}", movie.title, url),
                None => println!("{} - Trailer not available", movie.title),
            }
        }
        RemoteCommand::Watchlist { action } => run_watchlist(app, action).await?,
        RemoteCommand::Dashboard => {
            let report = Dashboard::new(app.store.clone()).load(&app.session).await?;
            println!("{}", report);
        }
        RemoteCommand::SignIn { email, password } => {
            let user = app.session.sign_in(&email, &password).await?;
            info!(user_id = %user.id, "session saved");
        }
        RemoteCommand::SignUp { email, password } => {
            if let SignUp::Confirmed(session) = app.session.sign_up(&email, &password).await? {
                info!(user_id = %session.user.id, "account confirmed and signed in");
            }
        }
        RemoteCommand::SignOut => {
            app.session.sign_out().await?;
            app.tracker.sync().await?;
        }
    }
    Ok(())
}

async fn run_watchlist(app: &App, action: WatchlistAction) -> Result<()> {
    match action {
        WatchlistAction::List => {
            let mut view = WatchlistView::new(app.store.clone(), app.tracker.clone(), app.notifier.clone());
            view.load(&app.session).await?;
            if view.is_empty() {
                println!("Your watchlist is empty");
                println!("Start adding movies to your watchlist to keep track of what you want to watch.");
            } else {
                println!("{}", view.heading());
                for movie in view.movies() {
                    let card = views::MovieCard {
                        movie,
                        in_watchlist: true,
                    };
                    println!("{}", card);
                }
            }
        }
        WatchlistAction::Add { movie_id } => {
            app.tracker.sync().await?;
            let movie = app
                .store
                .get_movie(&movie_id)
                .await?
                .with_context(|| format!("no movie with id {}", movie_id))?;
            let user = app.session.current_user();
            let outcome = app.tracker.add(user.as_ref().map(|u| u.id.as_str()), &movie).await?;
            if outcome == AddOutcome::AlreadyPresent {
                println!("{} is already on your watchlist", movie.title);
            }
        }
        WatchlistAction::Remove { movie_id } => {
            let mut view = WatchlistView::new(app.store.clone(), app.tracker.clone(), app.notifier.clone());
            view.load(&app.session).await?;
            view.remove(&app.session, &movie_id).await?;
        }
    }
    Ok(())
}

fn print_mock_catalog(count: usize, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let movies = mock::generate_catalog(&mut rng, count);
    println!("{}", serde_json::to_string_pretty(&movies)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_parses_apart_from_backend_commands() {
        let cli = Cli::try_parse_from(["bingeable", "mock", "--count", "5", "--seed", "7"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Mock {
                count: Some(5),
                seed: Some(7)
            }
        ));
    }

    #[test]
    fn backend_commands_stay_top_level() {
        let cli = Cli::try_parse_from(["bingeable", "watchlist", "add", "m1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Remote(RemoteCommand::Watchlist {
                action: WatchlistAction::Add { .. }
            })
        ));

        let cli = Cli::try_parse_from(["bingeable", "sign-out"]).unwrap();
        assert!(matches!(cli.command, Command::Remote(RemoteCommand::SignOut)));
    }
}
