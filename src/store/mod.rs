#[cfg(test)]
mod memory;

#[cfg(test)]
pub use memory::{MemoryStore, StoreOp};

use crate::error::StoreResult;
use crate::models::{Movie, Purchase, WatchlistEntry};
use async_trait::async_trait;

/// The backend collaborator holding the catalog, watchlist rows and
/// purchase records. Implementations must be cheap to share behind an `Arc`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn list_watchlist(&self, user_id: &str) -> StoreResult<Vec<WatchlistEntry>>;

    async fn insert_watchlist_entry(&self, user_id: &str, movie_id: &str) -> StoreResult<()>;

    async fn delete_watchlist_entry(&self, user_id: &str, movie_id: &str) -> StoreResult<()>;

    /// Full catalog, ordered by title.
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;

    async fn get_movie(&self, movie_id: &str) -> StoreResult<Option<Movie>>;

    /// Watchlist rows joined with their movies. Rows whose movie no longer
    /// exists are dropped.
    async fn list_watchlist_movies(&self, user_id: &str) -> StoreResult<Vec<Movie>>;

    async fn count_watchlist(&self, user_id: &str) -> StoreResult<usize> {
        Ok(self.list_watchlist(user_id).await?.len())
    }

    async fn list_purchases(&self, user_id: &str) -> StoreResult<Vec<Purchase>>;
}
