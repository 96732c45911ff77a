use crate::catalog::{format_member_since, format_price, short_account_id};
use crate::error::StoreResult;
use crate::models::{Movie, Purchase, User};
use crate::session::Session;
use crate::store::RemoteStore;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{instrument, warn};

pub const UNKNOWN_GENRE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub watchlist_count: usize,
    pub purchased_count: usize,
    pub total_spent: f64,
    pub favorite_genre: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountInfo {
    pub email: String,
    pub member_since: String,
    pub account_id: String,
}

impl AccountInfo {
    pub fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone().unwrap_or_default(),
            member_since: format_member_since(&user.created_at),
            account_id: short_account_id(&user.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub stats: DashboardStats,
    pub account: AccountInfo,
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Welcome back, {}", self.account.email)?;
        writeln!(f)?;
        writeln!(f, "  Watchlist:    {}", self.stats.watchlist_count)?;
        writeln!(f, "  Purchased:    {}", self.stats.purchased_count)?;
        writeln!(f, "  Total spent:  {}", format_price(self.stats.total_spent))?;
        writeln!(f, "  Fav genre:    {}", self.stats.favorite_genre)?;
        writeln!(f)?;
        writeln!(f, "  Email:        {}", self.account.email)?;
        writeln!(f, "  Member since: {}", self.account.member_since)?;
        write!(f, "  Account ID:   {}", self.account.account_id)
    }
}

/// Sums purchases and picks the most bought genre. Ties go to the
/// alphabetically first genre; purchases of unknown movies are skipped.
pub fn compute_stats(watchlist_count: usize, purchases: &[Purchase], catalog: &[Movie]) -> DashboardStats {
    let total_spent = purchases.iter().map(|p| p.amount_paid.unwrap_or(0.0)).sum();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for purchase in purchases {
        let genre = catalog
            .iter()
            .find(|m| m.id == purchase.movie_id)
            .and_then(|m| m.genre.as_deref());
        if let Some(genre) = genre {
            *counts.entry(genre).or_insert(0) += 1;
        }
    }

    let favorite_genre = counts
        .into_iter()
        .max_by(|(ga, ca), (gb, cb)| ca.cmp(cb).then_with(|| gb.cmp(ga)))
        .map(|(genre, _)| genre.to_string())
        .unwrap_or_else(|| UNKNOWN_GENRE.to_string());

    DashboardStats {
        watchlist_count,
        purchased_count: purchases.len(),
        total_spent,
        favorite_genre,
    }
}

pub struct Dashboard {
    store: Arc<dyn RemoteStore>,
}

impl Dashboard {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, session))]
    pub async fn load(&self, session: &Session) -> StoreResult<DashboardReport> {
        let user = session.require_user()?;

        let watchlist_count = self.store.count_watchlist(&user.id).await?;
        let purchases = self.store.list_purchases(&user.id).await?;
        let catalog = if purchases.is_empty() {
            Vec::new()
        } else {
            match self.store.list_movies().await {
                Ok(movies) => movies,
                Err(e) => {
                    warn!("Could not load catalog for genre stats: {}", e);
                    Vec::new()
                }
            }
        };

        Ok(DashboardReport {
            stats: compute_stats(watchlist_count, &purchases, &catalog),
            account: AccountInfo::from_user(&user),
        })
    }
}
