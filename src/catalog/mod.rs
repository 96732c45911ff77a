use crate::models::Movie;
use chrono::{DateTime, Utc};

const YOUTUBE_ID_LEN: usize = 11;

/// Markers that precede a video id in the YouTube url shapes we accept.
const YOUTUBE_MARKERS: [&str; 5] = ["youtu.be/", "v/", "embed/", "watch?v=", "&v="];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieFilter {
    pub genre: Option<String>,
    pub query: Option<String>,
    pub premium_only: bool,
}

impl MovieFilter {
    pub fn matches(&self, movie: &Movie) -> bool {
        if self.premium_only && !movie.premium() {
            return false;
        }

        if let Some(ref genre) = self.genre {
            match movie.genre {
                Some(ref g) if g.eq_ignore_ascii_case(genre) => {}
                _ => return false,
            }
        }

        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                movie.title.to_lowercase().contains(&q)
                    || movie
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&q))
            }
            _ => true,
        }
    }
}

/// Orders by title ignoring case; id breaks ties so the order is stable.
pub fn sort_by_title(movies: &mut [Movie]) {
    movies.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub fn filter_movies<'a>(movies: &'a [Movie], filter: &MovieFilter) -> Vec<&'a Movie> {
    movies.iter().filter(|m| filter.matches(m)).collect()
}

pub fn genres(movies: &[Movie]) -> Vec<String> {
    let mut genres: Vec<String> = movies.iter().filter_map(|m| m.genre.clone()).collect();
    genres.sort();
    genres.dedup();
    genres
}

pub fn format_runtime(minutes: u32) -> String {
    format!("{} min", minutes)
}

pub fn format_rating(rating: f64) -> String {
    format!("{}/10", rating)
}

pub fn format_price(amount: f64) -> String {
    format!("₹{:.0}", amount)
}

pub fn format_member_since(created_at: &DateTime<Utc>) -> String {
    created_at.format("%Y-%m-%d").to_string()
}

/// First eight characters of an account id followed by an ellipsis.
pub fn short_account_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("{}...", prefix)
}

/// Extracts the video id from a YouTube link. Only the last marker in the
/// url counts, and the id must be exactly eleven characters.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    let mut best: Option<(usize, usize)> = None;
    let mut consider = |marker_at: usize, id_at: usize| {
        if best.map_or(true, |(at, _)| marker_at > at) {
            best = Some((marker_at, id_at));
        }
    };

    for marker in YOUTUBE_MARKERS {
        if let Some(at) = url.rfind(marker) {
            consider(at, at + marker.len());
        }
    }

    // `u/<word char>/`, the old user-channel form
    let bytes = url.as_bytes();
    for (at, _) in url.match_indices("u/") {
        let word = bytes.get(at + 2);
        let slash = bytes.get(at + 3);
        if matches!(word, Some(c) if c.is_ascii_alphanumeric() || *c == b'_') && slash == Some(&b'/') {
            consider(at, at + 4);
        }
    }

    let (_, id_at) = best?;
    let rest = &url[id_at..];
    let end = rest.find(['#', '&', '?']).unwrap_or(rest.len());
    let id = &rest[..end];
    (id.chars().count() == YOUTUBE_ID_LEN).then_some(id)
}

pub fn trailer_embed_url(trailer_url: &str) -> Option<String> {
    youtube_video_id(trailer_url)
        .map(|id| format!("https://www.youtube.com/embed/{}?autoplay=1&rel=0", id))
}
