use super::RemoteStore;
use crate::catalog::sort_by_title;
use crate::error::{StoreError, StoreResult};
use crate::models::{Movie, Purchase, WatchlistEntry};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListWatchlist,
    InsertWatchlistEntry,
    DeleteWatchlistEntry,
    ListMovies,
    GetMovie,
    ListWatchlistMovies,
    ListPurchases,
}

#[derive(Default)]
struct Inner {
    movies: Vec<Movie>,
    entries: Vec<WatchlistEntry>,
    purchases: Vec<Purchase>,
    calls: HashMap<StoreOp, usize>,
    failures: HashMap<StoreOp, VecDeque<StoreError>>,
}

/// In-process store for tests. Keeps the same (user, movie) uniqueness
/// rule as the hosted table.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movies(movies: Vec<Movie>) -> Self {
        let store = Self::new();
        store.lock().movies = movies;
        store
    }

    pub fn add_purchase(&self, purchase: Purchase) {
        self.lock().purchases.push(purchase);
    }

    /// Seeds a watchlist row without counting it as a client call.
    pub fn seed_entry(&self, user_id: &str, movie_id: &str) {
        self.lock().entries.push(WatchlistEntry {
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
        });
    }

    /// The next call of `op` fails with `err`. Queued failures are consumed in order.
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.lock().failures.entry(op).or_default().push_back(err);
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self, op: StoreOp) -> StoreResult<std::sync::MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        *inner.calls.entry(op).or_insert(0) += 1;
        if let Some(err) = inner.failures.get_mut(&op).and_then(|q| q.pop_front()) {
            return Err(err);
        }
        Ok(inner)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_watchlist(&self, user_id: &str) -> StoreResult<Vec<WatchlistEntry>> {
        let inner = self.begin(StoreOp::ListWatchlist)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_watchlist_entry(&self, user_id: &str, movie_id: &str) -> StoreResult<()> {
        let mut inner = self.begin(StoreOp::InsertWatchlistEntry)?;
        if inner
            .entries
            .iter()
            .any(|e| e.user_id == user_id && e.movie_id == movie_id)
        {
            return Err(StoreError::Conflict(format!(
                "watchlist already has {} for {}",
                movie_id, user_id
            )));
        }
        inner.entries.push(WatchlistEntry {
            user_id: user_id.to_string(),
            movie_id: movie_id.to_string(),
        });
        Ok(())
    }

    async fn delete_watchlist_entry(&self, user_id: &str, movie_id: &str) -> StoreResult<()> {
        let mut inner = self.begin(StoreOp::DeleteWatchlistEntry)?;
        inner
            .entries
            .retain(|e| !(e.user_id == user_id && e.movie_id == movie_id));
        Ok(())
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let inner = self.begin(StoreOp::ListMovies)?;
        let mut movies = inner.movies.clone();
        sort_by_title(&mut movies);
        Ok(movies)
    }

    async fn get_movie(&self, movie_id: &str) -> StoreResult<Option<Movie>> {
        let inner = self.begin(StoreOp::GetMovie)?;
        Ok(inner.movies.iter().find(|m| m.id == movie_id).cloned())
    }

    async fn list_watchlist_movies(&self, user_id: &str) -> StoreResult<Vec<Movie>> {
        let inner = self.begin(StoreOp::ListWatchlistMovies)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| inner.movies.iter().find(|m| m.id == e.movie_id).cloned())
            .collect())
    }

    async fn list_purchases(&self, user_id: &str) -> StoreResult<Vec<Purchase>> {
        let inner = self.begin(StoreOp::ListPurchases)?;
        Ok(inner
            .purchases
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_insert_conflicts() {
        let store = MemoryStore::new();
        store.insert_watchlist_entry("u1", "m1").await.unwrap();

        let err = store.insert_watchlist_entry("u1", "m1").await.unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert_eq!(store.list_watchlist("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_of_missing_row_succeeds() {
        let store = MemoryStore::new();
        store.delete_watchlist_entry("u1", "nope").await.unwrap();
        assert_eq!(store.calls(StoreOp::DeleteWatchlistEntry), 1);
    }

    #[tokio::test]
    async fn queued_failure_fires_once() {
        let store = MemoryStore::new();
        store.fail_next(StoreOp::ListMovies, StoreError::Network("down".into()));

        assert!(store.list_movies().await.is_err());
        assert!(store.list_movies().await.is_ok());
        assert_eq!(store.calls(StoreOp::ListMovies), 2);
    }

    #[tokio::test]
    async fn watchlist_movies_skip_missing_catalog_rows() {
        let store = MemoryStore::with_movies(vec![Movie::new("m1", "Binary Moon")]);
        store.seed_entry("u1", "m1");
        store.seed_entry("u1", "gone");
        store.seed_entry("u2", "m1");

        let movies = store.list_watchlist_movies("u1").await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Binary Moon");
    }

    #[tokio::test]
    async fn movies_come_back_sorted() {
        let store = MemoryStore::with_movies(vec![
            Movie::new("2", "Synthwave"),
            Movie::new("1", "Chrome Hearts"),
        ]);
        let titles: Vec<_> = store
            .list_movies()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["Chrome Hearts", "Synthwave"]);
    }
}
