use crate::config::SupabaseConfig;
use crate::error::{AuthError, StoreError, StoreResult};
use crate::http::HttpClient;
use crate::models::{Movie, Purchase, User, WatchlistEntry};
use crate::session::{AuthProvider, AuthSession, SignUp};
use crate::store::RemoteStore;
use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

const MOVIE_COLUMNS: &str = "id,title,description,release_year,genre,poster_url,trailer_url,\
imdb_rating,runtime_minutes,director,cast_members,country,streaming_platforms,price_inr,is_premium";

/// PostgREST + GoTrue client for a hosted Supabase project.
pub struct SupabaseClient {
    http: HttpClient,
    config: SupabaseConfig,
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct NewWatchlistEntry<'a> {
    user_id: &'a str,
    movie_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct WatchlistMovieRow {
    movies: Option<Movie>,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: User,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Wrapped { user: User },
    Bare(User),
}

#[derive(Debug, Deserialize)]
struct GoTrueError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl SupabaseClient {
    pub fn new(http: HttpClient, config: SupabaseConfig) -> Self {
        Self {
            http,
            config,
            access_token: None,
        }
    }

    /// Row-level security on the watchlist tables keys off the user's JWT.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> StoreResult<Url> {
        let base = self.config.url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| StoreError::Unknown(format!("invalid supabase url: {}", e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn rest(&self, method: Method, table: &str, query: &[(&str, &str)]) -> StoreResult<RequestBuilder> {
        let url = self.endpoint(&format!("rest/v1/{}", table), query)?;
        let bearer = self.access_token.as_deref().unwrap_or(&self.config.anon_key);
        Ok(self
            .http
            .request(method, url.as_str())
            .header("apikey", &self.config.anon_key)
            .bearer_auth(bearer))
    }

    fn auth_request(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<RequestBuilder, AuthError> {
        let url = self.endpoint(&format!("auth/v1/{}", path), query)?;
        Ok(self
            .http
            .request(method, url.as_str())
            .header("apikey", &self.config.anon_key))
    }

    /// GoTrue reports failures as JSON bodies; surface their message verbatim.
    async fn send_auth(&self, request: RequestBuilder) -> Result<reqwest::Response, AuthError> {
        let response = request.send().await.map_err(StoreError::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = gotrue_message(&body).unwrap_or_else(|| status.to_string());
        if status.is_server_error() {
            return Err(AuthError::Store(crate::http::classify_status(status, &body)));
        }
        Err(AuthError::Rejected(message))
    }
}

fn gotrue_message(body: &str) -> Option<String> {
    let err: GoTrueError = serde_json::from_str(body).ok()?;
    err.error_description.or(err.msg).or(err.message)
}

/// `Content-Range: 0-24/25` or `*/0` when nothing matched.
fn parse_content_range_total(header: &str) -> Option<usize> {
    header.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    #[instrument(skip(self))]
    async fn list_watchlist(&self, user_id: &str) -> StoreResult<Vec<WatchlistEntry>> {
        let filter = format!("eq.{}", user_id);
        let request = self.rest(
            Method::GET,
            "watchlist",
            &[("select", "user_id,movie_id"), ("user_id", filter.as_str())],
        )?;
        let entries: Vec<WatchlistEntry> = self.http.execute_json(request).await?;
        debug!("Fetched {} watchlist rows", entries.len());
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn insert_watchlist_entry(&self, user_id: &str, movie_id: &str) -> StoreResult<()> {
        let request = self
            .rest(Method::POST, "watchlist", &[])?
            .header("Prefer", "return=minimal")
            .json(&NewWatchlistEntry { user_id, movie_id });
        self.http.execute(request).await?;
        info!("Inserted watchlist entry");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_watchlist_entry(&self, user_id: &str, movie_id: &str) -> StoreResult<()> {
        let user_filter = format!("eq.{}", user_id);
        let movie_filter = format!("eq.{}", movie_id);
        let request = self.rest(
            Method::DELETE,
            "watchlist",
            &[("user_id", user_filter.as_str()), ("movie_id", movie_filter.as_str())],
        )?;
        self.http.execute(request).await?;
        info!("Deleted watchlist entry");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let request = self.rest(
            Method::GET,
            "movies",
            &[("select", MOVIE_COLUMNS), ("order", "title.asc")],
        )?;
        let movies: Vec<Movie> = self.http.execute_json(request).await?;
        info!("Fetched {} movies", movies.len());
        Ok(movies)
    }

    #[instrument(skip(self))]
    async fn get_movie(&self, movie_id: &str) -> StoreResult<Option<Movie>> {
        let filter = format!("eq.{}", movie_id);
        let request = self.rest(
            Method::GET,
            "movies",
            &[("select", MOVIE_COLUMNS), ("id", filter.as_str()), ("limit", "1")],
        )?;
        let movies: Vec<Movie> = self.http.execute_json(request).await?;
        Ok(movies.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn list_watchlist_movies(&self, user_id: &str) -> StoreResult<Vec<Movie>> {
        let filter = format!("eq.{}", user_id);
        let select = format!("movie_id,movies({})", MOVIE_COLUMNS);
        let request = self.rest(
            Method::GET,
            "watchlist",
            &[("select", select.as_str()), ("user_id", filter.as_str())],
        )?;
        let rows: Vec<WatchlistMovieRow> = self.http.execute_json(request).await?;
        Ok(rows.into_iter().filter_map(|row| row.movies).collect())
    }

    #[instrument(skip(self))]
    async fn count_watchlist(&self, user_id: &str) -> StoreResult<usize> {
        let filter = format!("eq.{}", user_id);
        let request = self
            .rest(Method::HEAD, "watchlist", &[("select", "*"), ("user_id", filter.as_str())])?
            .header("Prefer", "count=exact");
        let response = self.http.execute(request).await?;
        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| StoreError::Unknown("missing Content-Range on count".to_string()))
    }

    #[instrument(skip(self))]
    async fn list_purchases(&self, user_id: &str) -> StoreResult<Vec<Purchase>> {
        let filter = format!("eq.{}", user_id);
        let request = self.rest(
            Method::GET,
            "purchased_movies",
            &[("select", "user_id,movie_id,amount_paid"), ("user_id", filter.as_str())],
        )?;
        self.http.execute_json(request).await
    }
}

#[async_trait]
impl AuthProvider for SupabaseClient {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let request = self
            .auth_request(Method::POST, "token", &[("grant_type", "password")])?
            .json(&Credentials { email, password });
        let response = self.send_auth(request).await?;
        let token: TokenResponse = response.json().await.map_err(StoreError::from)?;
        Ok(AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user: token.user,
        })
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        let request = self
            .auth_request(Method::POST, "signup", &[])?
            .json(&Credentials { email, password });
        let response = self.send_auth(request).await?;
        let body: SignUpResponse = response.json().await.map_err(StoreError::from)?;
        Ok(match body {
            SignUpResponse::Session(token) => SignUp::Confirmed(AuthSession {
                access_token: token.access_token,
                refresh_token: token.refresh_token,
                user: token.user,
            }),
            SignUpResponse::Wrapped { user } | SignUpResponse::Bare(user) => {
                SignUp::PendingVerification(user)
            }
        })
    }

    #[instrument(skip(self, access_token))]
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let request = self
            .auth_request(Method::POST, "logout", &[])?
            .bearer_auth(access_token);
        self.send_auth(request).await?;
        Ok(())
    }

    #[instrument(skip(self, access_token))]
    async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let request = self
            .auth_request(Method::GET, "user", &[])?
            .bearer_auth(access_token);
        let response = self.send_auth(request).await?;
        Ok(response.json().await.map_err(StoreError::from)?)
    }
}
