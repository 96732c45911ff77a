//! Watchlist membership tracking.
//!
//! [`MembershipTracker`] caches the ids of the movies the signed-in user has
//! saved so cards can render "saved" vs "add" without a store round-trip.
//! The cache is only ever changed after the store confirms a write, so a
//! failed call leaves the last known-good set in place.
//!
//! Every successful mutation and every identity change bumps a sequence
//! number. A refresh remembers the number it started at and its result is
//! dropped if the number moved while the fetch was in flight.
//!
//! The tracker follows the session's identity channel. A new identity starts
//! from an empty, unloaded set; [`MembershipTracker::sync`] fetches it once.

use crate::error::{StoreError, StoreResult};
use crate::models::{Movie, MovieId, User, UserId};
use crate::notify::Notifier;
use crate::session::AuthSession;
use crate::store::RemoteStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Already saved, or an insert for the same movie is still in flight.
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A write or identity change landed while the fetch was in flight.
    Discarded,
}

#[derive(Debug, Default)]
struct MembershipState {
    user: Option<UserId>,
    membership: HashSet<MovieId>,
    pending_adds: HashSet<MovieId>,
    /// Set once a refresh for `user` has been applied.
    loaded: bool,
    seq: u64,
}

impl MembershipState {
    fn adopt(&mut self, user: Option<&str>) -> bool {
        if self.user.as_deref() == user {
            return false;
        }
        self.user = user.map(str::to_string);
        self.membership.clear();
        self.pending_adds.clear();
        self.loaded = false;
        self.seq += 1;
        true
    }

    fn owned_by(&self, user_id: &str) -> bool {
        self.user.as_deref() == Some(user_id)
    }
}

pub struct MembershipTracker {
    store: Arc<dyn RemoteStore>,
    notifier: Notifier,
    identity: watch::Receiver<Option<AuthSession>>,
    state: Mutex<MembershipState>,
}

impl MembershipTracker {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        notifier: Notifier,
        identity: watch::Receiver<Option<AuthSession>>,
    ) -> Self {
        Self {
            store,
            notifier,
            identity,
            state: Mutex::new(MembershipState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MembershipState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.lock().user.clone()
    }

    /// Scopes the cache to `user`. Any change of identity empties the set;
    /// signing out never touches the store. Returns whether anything changed.
    pub fn set_user(&self, user: Option<&User>) -> bool {
        let changed = self.lock().adopt(user.map(|u| u.id.as_str()));
        if changed {
            debug!(user = ?user.map(|u| &u.id), "watchlist cache reset for new identity");
        }
        changed
    }

    /// Adopts the latest published identity and loads its set if that has
    /// not happened yet. Signed out, this never touches the store.
    pub async fn sync(&self) -> StoreResult<()> {
        let user = self.identity.borrow().as_ref().map(|s| s.user.clone());
        self.set_user(user.as_ref());
        let Some(user) = user else {
            return Ok(());
        };
        if !self.is_loaded() {
            self.refresh(&user.id).await?;
        }
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().loaded
    }

    pub fn contains(&self, movie_id: &str) -> bool {
        self.lock().membership.contains(movie_id)
    }

    pub fn len(&self) -> usize {
        self.lock().membership.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().membership.is_empty()
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: &str) -> StoreResult<RefreshOutcome> {
        let started_at = {
            let mut state = self.lock();
            state.adopt(Some(user_id));
            state.seq
        };

        let entries = match self.store.list_watchlist(user_id).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(kind = e.kind(), "Error fetching watchlist: {}", e);
                self.notifier.failure("Error", "Failed to load watchlist.");
                return Err(e);
            }
        };

        let mut state = self.lock();
        if state.seq != started_at || !state.owned_by(user_id) {
            debug!("discarding stale watchlist refresh");
            return Ok(RefreshOutcome::Discarded);
        }

        state.membership = entries.into_iter().map(|e| e.movie_id).collect();
        state.loaded = true;
        state.seq += 1;
        let count = state.membership.len();
        info!("Loaded {} watchlist entries", count);
        Ok(RefreshOutcome::Applied { count })
    }

    #[instrument(skip(self, movie), fields(movie_id = %movie.id))]
    pub async fn add(&self, user_id: Option<&str>, movie: &Movie) -> StoreResult<AddOutcome> {
        let Some(user_id) = user_id else {
            self.notifier
                .failure("Sign in required", "Please sign in to add movies to your watchlist.");
            return Err(StoreError::AuthRequired);
        };

        {
            let mut state = self.lock();
            state.adopt(Some(user_id));
            if state.membership.contains(&movie.id) || !state.pending_adds.insert(movie.id.clone()) {
                debug!("movie already in watchlist, skipping insert");
                return Ok(AddOutcome::AlreadyPresent);
            }
        }

        let result = self.store.insert_watchlist_entry(user_id, &movie.id).await;

        {
            let mut state = self.lock();
            state.pending_adds.remove(&movie.id);
            if result.is_ok() && state.owned_by(user_id) {
                state.membership.insert(movie.id.clone());
                state.seq += 1;
            }
        }

        match result {
            Ok(()) => {
                self.notifier.success(
                    "Added to Watchlist",
                    format!("{} has been added to your watchlist.", movie.title),
                );
                Ok(AddOutcome::Added)
            }
            Err(e) => {
                warn!(kind = e.kind(), "Error adding to watchlist: {}", e);
                self.notifier.failure("Error", "Failed to add to watchlist.");
                Err(e)
            }
        }
    }

    #[instrument(skip(self, movie), fields(movie_id = %movie.id))]
    pub async fn remove(&self, user_id: Option<&str>, movie: &Movie) -> StoreResult<()> {
        let Some(user_id) = user_id else {
            self.notifier
                .failure("Sign in required", "Please sign in to manage your watchlist.");
            return Err(StoreError::AuthRequired);
        };

        self.lock().adopt(Some(user_id));

        if let Err(e) = self.store.delete_watchlist_entry(user_id, &movie.id).await {
            warn!(kind = e.kind(), "Error removing from watchlist: {}", e);
            self.notifier.failure("Error", "Failed to remove from watchlist.");
            return Err(e);
        }

        {
            let mut state = self.lock();
            if state.owned_by(user_id) {
                state.membership.remove(&movie.id);
                state.seq += 1;
            }
        }

        self.notifier.success(
            "Removed from Watchlist",
            format!("{} has been removed from your watchlist.", movie.title),
        );
        Ok(())
    }
}
