use crate::models::{Movie, StreamingPlatform};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

pub const PLACEHOLDER_TRAILER: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

const FIRST_YEAR: i32 = 2015;
const YEAR_SPAN: i32 = 9;
const MIN_PRICE: u32 = 5;
const MAX_PRICE: u32 = 19;
const MAX_PLATFORMS: usize = 3;

const PLATFORMS: [(&str, &str); 6] = [
    ("Netflix", "netflix"),
    ("Prime Video", "prime"),
    ("Disney+", "disney"),
    ("HBO Max", "hbo"),
    ("Hulu", "hulu"),
    ("Apple TV+", "apple"),
];

pub const GENRES: [&str; 16] = [
    "Action", "Adventure", "Animation", "Comedy", "Crime", "Documentary", "Drama", "Family",
    "Fantasy", "Horror", "Mystery", "Romance", "Sci-Fi", "Thriller", "War", "Western",
];

const TITLES: [&str; 100] = [
    "Digital Shadows", "Neon Dreams", "Cyber Pulse", "Retro Future", "Code Warriors",
    "Pixel Paradise", "Electric Nights", "Chrome Hearts", "Binary Love", "Synthwave",
    "Digital Frontier", "Neon Nights", "Cyber Dreams", "Pixel Storm", "Electric Soul",
    "Chrome City", "Binary Stars", "Synth Paradise", "Digital Rain", "Neon Pulse",
    "Cyber Nights", "Pixel Warriors", "Electric Dreams", "Chrome Future", "Binary Moon",
    "Synth City", "Digital Storm", "Neon Paradise", "Cyber Soul", "Pixel Dreams",
    "Electric Rain", "Chrome Nights", "Binary Paradise", "Synth Storm", "Digital Pulse",
    "Neon Warriors", "Cyber Paradise", "Pixel Rain", "Electric Future", "Chrome Dreams",
    "Binary Nights", "Synth Soul", "Digital Paradise", "Neon Storm", "Cyber Rain",
    "Pixel Future", "Electric Paradise", "Chrome Soul", "Binary Dreams", "Synth Rain",
    "Digital Nights", "Neon Future", "Cyber Paradise", "Pixel Soul", "Electric Storm",
    "Chrome Paradise", "Binary Future", "Synth Dreams", "Digital Soul", "Neon Rain",
    "Cyber Storm", "Pixel Paradise", "Electric Nights", "Chrome Rain", "Binary Soul",
    "Synth Future", "Digital Dreams", "Neon Paradise", "Cyber Rain", "Pixel Storm",
    "Electric Soul", "Chrome Paradise", "Binary Rain", "Synth Nights", "Digital Future",
    "Neon Soul", "Cyber Dreams", "Pixel Rain", "Electric Paradise", "Chrome Storm",
    "Binary Paradise", "Synth Soul", "Digital Rain", "Neon Future", "Cyber Paradise",
    "Pixel Dreams", "Electric Rain", "Chrome Soul", "Binary Storm", "Synth Paradise",
    "Digital Soul", "Neon Rain", "Cyber Future", "Pixel Paradise", "Electric Dreams",
    "Chrome Rain", "Binary Soul", "Synth Storm", "Digital Paradise", "Neon Dreams",
];

pub fn streaming_platforms() -> Vec<StreamingPlatform> {
    PLATFORMS
        .iter()
        .map(|(name, icon)| StreamingPlatform {
            name: name.to_string(),
            icon: icon.to_string(),
        })
        .collect()
}

pub fn poster_placeholder(title: &str) -> String {
    format!(
        "/api/placeholder/300/450?text={}&bg=1a1a1a&color=8b5cf6",
        urlencoding::encode(title)
    )
}

/// Builds `count` display movies with ids `1..=count`. Titles cycle through
/// the fixed list once it runs out.
pub fn generate_catalog<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Movie> {
    let platforms = streaming_platforms();

    (0..count)
        .map(|i| {
            let title = TITLES[i % TITLES.len()];
            let genre = GENRES.choose(rng).copied().unwrap_or("Drama");

            let mut picked = platforms.clone();
            picked.shuffle(rng);
            picked.truncate(rng.random_range(1..=MAX_PLATFORMS));

            let mut movie = Movie::new((i + 1).to_string(), title).with_genre(genre);
            movie.description = Some(format!(
                "An epic {} adventure that takes you on a journey through time and space. \
                 Experience stunning visuals and heart-pounding action in this unforgettable \
                 cinematic masterpiece.",
                genre.to_lowercase()
            ));
            movie.release_year = Some(FIRST_YEAR + rng.random_range(0..YEAR_SPAN));
            movie.poster_url = Some(poster_placeholder(title));
            movie.trailer_url = Some(PLACEHOLDER_TRAILER.to_string());
            movie.streaming_platforms = Some(picked.into_iter().map(|p| p.name).collect());
            movie.price_inr = Some(f64::from(rng.random_range(MIN_PRICE..=MAX_PRICE)));
            movie
        })
        .collect()
}
