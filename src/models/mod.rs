use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type MovieId = String;
pub type UserId = String;

/// A catalog entry as stored in the `movies` table. Only `id` and `title`
/// are guaranteed; everything else may be null upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    pub imdb_rating: Option<f64>,
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub cast_members: Option<Vec<String>>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub streaming_platforms: Option<Vec<String>>,
    #[serde(default)]
    pub price_inr: Option<f64>,
    #[serde(default)]
    pub is_premium: Option<bool>,
}

impl Movie {
    /// Bare entry with every optional field unset.
    pub fn new(id: impl Into<MovieId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            release_year: None,
            genre: None,
            poster_url: None,
            trailer_url: None,
            imdb_rating: None,
            runtime_minutes: None,
            director: None,
            cast_members: None,
            country: None,
            streaming_platforms: None,
            price_inr: None,
            is_premium: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn premium(&self) -> bool {
        self.is_premium.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct WatchlistEntry {
    pub user_id: UserId,
    pub movie_id: MovieId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Purchase {
    pub user_id: UserId,
    pub movie_id: MovieId,
    #[serde(default)]
    pub amount_paid: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingPlatform {
    pub name: String,
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_row_with_nulls_deserializes() {
        let row = r#"{
            "id": "6f1c",
            "title": "Neon Dreams",
            "description": null,
            "imdb_rating": 7.4,
            "cast_members": ["A", "B"],
            "is_premium": null
        }"#;

        let movie: Movie = serde_json::from_str(row).unwrap();
        assert_eq!(movie.id, "6f1c");
        assert_eq!(movie.imdb_rating, Some(7.4));
        assert_eq!(movie.cast_members.as_deref().map(|c| c.len()), Some(2));
        assert!(movie.description.is_none());
        assert!(!movie.premium());
    }
}
