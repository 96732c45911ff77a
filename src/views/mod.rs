//! Page-level state: the browse grid, the user's watchlist and the movie
//! detail panel. Each view is handed the session and the shared tracker by
//! the application shell.

use crate::catalog::{
    filter_movies, format_price, format_rating, format_runtime, trailer_embed_url, MovieFilter,
};
use crate::error::{StoreError, StoreResult};
use crate::models::Movie;
use crate::notify::Notifier;
use crate::session::Session;
use crate::store::RemoteStore;
use crate::watchlist::{AddOutcome, MembershipTracker};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard<'a> {
    pub movie: &'a Movie,
    pub in_watchlist: bool,
}

impl fmt::Display for MovieCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.in_watchlist { "♥" } else { " " };
        let year = self
            .movie
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "----".to_string());
        let genre = self.movie.genre.as_deref().unwrap_or("-");
        let price = self.movie.price_inr.map(format_price).unwrap_or_default();
        write!(
            f,
            "{} {:<8} {:<28} {} {:<12} {}",
            mark, self.movie.id, self.movie.title, year, genre, price
        )
    }
}

pub struct BrowseView {
    store: Arc<dyn RemoteStore>,
    tracker: Arc<MembershipTracker>,
    notifier: Notifier,
    movies: Vec<Movie>,
}

impl BrowseView {
    pub fn new(store: Arc<dyn RemoteStore>, tracker: Arc<MembershipTracker>, notifier: Notifier) -> Self {
        Self {
            store,
            tracker,
            notifier,
            movies: Vec::new(),
        }
    }

    /// Loads the catalog. A failed watchlist fetch only costs the saved
    /// marks; the catalog still renders.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> StoreResult<()> {
        if let Err(e) = self.tracker.sync().await {
            warn!("Browsing without watchlist state: {}", e);
        }

        match self.store.list_movies().await {
            Ok(movies) => {
                info!("{} movies available", movies.len());
                self.movies = movies;
                Ok(())
            }
            Err(e) => {
                self.notifier.failure("Error", "Failed to load movies.");
                Err(e)
            }
        }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn cards(&self, filter: &MovieFilter) -> Vec<MovieCard<'_>> {
        filter_movies(&self.movies, filter)
            .into_iter()
            .map(|movie| MovieCard {
                movie,
                in_watchlist: self.tracker.contains(&movie.id),
            })
            .collect()
    }

    fn find(&self, movie_id: &str) -> StoreResult<&Movie> {
        self.movies
            .iter()
            .find(|m| m.id == movie_id)
            .ok_or_else(|| StoreError::Unknown(format!("movie {} is not in the catalog", movie_id)))
    }

    pub async fn add_to_watchlist(&self, session: &Session, movie_id: &str) -> StoreResult<AddOutcome> {
        let movie = self.find(movie_id)?;
        let user = session.current_user();
        self.tracker.add(user.as_ref().map(|u| u.id.as_str()), movie).await
    }

    pub fn buy_or_rent(&self, movie_id: &str) -> StoreResult<()> {
        let movie = self.find(movie_id)?;
        self.notifier.success(
            "Purchase Required",
            format!("Purchases are not available yet for {}.", movie.title),
        );
        Ok(())
    }
}

pub struct WatchlistView {
    store: Arc<dyn RemoteStore>,
    tracker: Arc<MembershipTracker>,
    notifier: Notifier,
    movies: Vec<Movie>,
}

impl WatchlistView {
    pub fn new(store: Arc<dyn RemoteStore>, tracker: Arc<MembershipTracker>, notifier: Notifier) -> Self {
        Self {
            store,
            tracker,
            notifier,
            movies: Vec::new(),
        }
    }

    #[instrument(skip(self, session))]
    pub async fn load(&mut self, session: &Session) -> StoreResult<()> {
        let Some(user) = session.current_user() else {
            self.movies.clear();
            self.notifier
                .failure("Sign in required", "Please sign in to see your watchlist.");
            return Err(StoreError::AuthRequired);
        };
        match self.store.list_watchlist_movies(&user.id).await {
            Ok(movies) => {
                self.movies = movies;
                Ok(())
            }
            Err(e) => {
                warn!("Error fetching watchlist: {}", e);
                self.notifier.failure("Error", "Failed to load watchlist.");
                Err(e)
            }
        }
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn heading(&self) -> String {
        match self.movies.len() {
            1 => "1 Movie".to_string(),
            n => format!("{} Movies", n),
        }
    }

    /// Removes the movie remotely, then drops it from the list and the
    /// tracker. Movies not shown here are still deleted by id.
    pub async fn remove(&mut self, session: &Session, movie_id: &str) -> StoreResult<()> {
        let movie = self
            .movies
            .iter()
            .find(|m| m.id == movie_id)
            .cloned()
            .unwrap_or_else(|| Movie::new(movie_id, movie_id));
        let user = session.current_user();

        self.tracker
            .remove(user.as_ref().map(|u| u.id.as_str()), &movie)
            .await?;
        self.movies.retain(|m| m.id != movie_id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub movie: Movie,
    pub in_watchlist: bool,
}

impl MovieDetail {
    #[instrument(skip(store, tracker))]
    pub async fn load(
        store: &dyn RemoteStore,
        tracker: &MembershipTracker,
        movie_id: &str,
    ) -> StoreResult<Option<Self>> {
        Ok(store.get_movie(movie_id).await?.map(|movie| Self {
            in_watchlist: tracker.contains(&movie.id),
            movie,
        }))
    }

    pub fn trailer(&self) -> Option<String> {
        self.movie.trailer_url.as_deref().and_then(trailer_embed_url)
    }
}

impl fmt::Display for MovieDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.movie;
        writeln!(f, "{}", m.title)?;
        writeln!(f, "{}", "=".repeat(m.title.chars().count()))?;

        let mut facts = Vec::new();
        if let Some(rating) = m.imdb_rating {
            facts.push(format!("{} IMDb", format_rating(rating)));
        }
        if let Some(minutes) = m.runtime_minutes {
            facts.push(format_runtime(minutes));
        }
        if let Some(year) = m.release_year {
            facts.push(year.to_string());
        }
        if let Some(genre) = &m.genre {
            facts.push(genre.clone());
        }
        if !facts.is_empty() {
            writeln!(f, "{}", facts.join(" | "))?;
        }

        if let Some(description) = &m.description {
            writeln!(f, "\nPlot\n  {}", description)?;
        }
        if let Some(director) = &m.director {
            writeln!(f, "\nDirector\n  {}", director)?;
        }
        if let Some(cast) = m.cast_members.as_ref().filter(|c| !c.is_empty()) {
            writeln!(f, "\nCast\n  {}", cast.join(", "))?;
        }
        if let Some(platforms) = m.streaming_platforms.as_ref().filter(|p| !p.is_empty()) {
            writeln!(f, "\nAvailable On\n  {}", platforms.join(", "))?;
        }
        if let Some(country) = &m.country {
            writeln!(f, "\nCountry: {}", country)?;
        }

        writeln!(f)?;
        if let Some(trailer) = self.trailer() {
            writeln!(f, "Trailer:   {}", trailer)?;
        }
        if let Some(price) = m.price_inr {
            writeln!(f, "Price:     {}", format_price(price))?;
        }
        write!(
            f,
            "Watchlist: {}",
            if self.in_watchlist { "saved" } else { "not saved" }
        )
    }
}
