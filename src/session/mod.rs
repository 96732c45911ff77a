use crate::error::{AuthError, StoreError, StoreResult};
use crate::models::User;
use crate::notify::Notifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Result of a sign-up. Projects with email confirmation enabled hand back
/// no session until the address is verified.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUp {
    Confirmed(AuthSession),
    PendingVerification(User),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    async fn current_user(&self, access_token: &str) -> Result<User, AuthError>;
}

/// Who is signed in. Created once by the application shell and handed to
/// every view; identity changes are published to subscribers.
pub struct Session {
    auth: Arc<dyn AuthProvider>,
    notifier: Notifier,
    state: watch::Sender<Option<AuthSession>>,
    file: Option<PathBuf>,
}

impl Session {
    pub fn new(auth: Arc<dyn AuthProvider>, notifier: Notifier) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            auth,
            notifier,
            state,
            file: None,
        }
    }

    /// Persist the signed-in session to `path` so later runs reuse it.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.access_token.clone())
    }

    pub fn require_user(&self) -> StoreResult<User> {
        self.current_user().ok_or(StoreError::AuthRequired)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.state.subscribe()
    }

    /// Loads a saved session and checks the token is still accepted. A
    /// rejected token removes the file and leaves the session signed out.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<User>, AuthError> {
        let Some(path) = self.file.as_deref() else {
            return Ok(None);
        };
        let Some(saved) = read_session_file(path)? else {
            return Ok(None);
        };

        match self.auth.current_user(&saved.access_token).await {
            Ok(user) => {
                debug!(user_id = %user.id, "restored saved session");
                self.set(Some(AuthSession { user: user.clone(), ..saved }));
                Ok(Some(user))
            }
            Err(e @ AuthError::Store(StoreError::Network(_))) => Err(e),
            Err(e) => {
                warn!("Saved session rejected: {}", e);
                remove_session_file(path)?;
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if let Err(e) = validate_credentials(email, password) {
            self.notifier.failure("Authentication Error", e.to_string());
            return Err(e);
        }

        match self.auth.sign_in(email, password).await {
            Ok(session) => {
                let user = session.user.clone();
                self.persist(&session)?;
                self.set(Some(session));
                info!(user_id = %user.id, "signed in");
                self.notifier.success("Welcome back!", "Successfully signed in.");
                Ok(user)
            }
            Err(e) => {
                self.notifier.failure("Authentication Error", e.to_string());
                Err(e)
            }
        }
    }

    #[instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp, AuthError> {
        if let Err(e) = validate_credentials(email, password) {
            self.notifier.failure("Authentication Error", e.to_string());
            return Err(e);
        }

        match self.auth.sign_up(email, password).await {
            Ok(outcome) => {
                if let SignUp::Confirmed(session) = &outcome {
                    self.persist(session)?;
                    self.set(Some(session.clone()));
                }
                self.notifier.success(
                    "Account Created!",
                    "Please check your email to verify your account.",
                );
                Ok(outcome)
            }
            Err(e) => {
                self.notifier.failure("Authentication Error", e.to_string());
                Err(e)
            }
        }
    }

    /// Always ends signed out locally, even when revoking the token fails.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.access_token();
        self.set(None);
        if let Some(path) = self.file.as_deref() {
            remove_session_file(path)?;
        }

        if let Some(token) = token {
            if let Err(e) = self.auth.sign_out(&token).await {
                warn!("Failed to revoke session token: {}", e);
            }
        }
        info!("signed out");
        Ok(())
    }

    fn set(&self, session: Option<AuthSession>) {
        self.state.send_replace(session);
    }

    fn persist(&self, session: &AuthSession) -> Result<(), AuthError> {
        let Some(path) = self.file.as_deref() else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(session).map_err(StoreError::from)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidCredentials(
            "Please enter a valid email address.".to_string(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidCredentials(format!(
            "Password should be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn read_session_file(path: &Path) -> Result<Option<AuthSession>, AuthError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str(&content) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            warn!("Ignoring unreadable session file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

fn remove_session_file(path: &Path) -> Result<(), AuthError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeAuth;
    use super::*;

    fn session(auth: Arc<FakeAuth>) -> (Session, Notifier) {
        let notifier = Notifier::new();
        (Session::new(auth, notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn sign_in_publishes_identity() {
        let auth = Arc::new(FakeAuth::new("a@b.io", "secret1", "user-a"));
        let (session, notifier) = session(auth);
        let mut identity = session.subscribe();

        let user = session.sign_in("a@b.io", "secret1").await.unwrap();

        assert_eq!(user.id, "user-a");
        assert!(identity.has_changed().unwrap());
        assert_eq!(identity.borrow_and_update().as_ref().unwrap().user.id, "user-a");
        assert_eq!(session.access_token().as_deref(), Some("token-user-a"));
        assert_eq!(notifier.last().unwrap().title, "Welcome back!");
    }

    #[tokio::test]
    async fn bad_password_is_reported() {
        let auth = Arc::new(FakeAuth::new("a@b.io", "secret1", "user-a"));
        let (session, notifier) = session(auth);

        let err = session.sign_in("a@b.io", "wrong-pass").await.unwrap_err();

        assert!(matches!(err, AuthError::Rejected(_)));
        assert!(session.current_user().is_none());
        let last = notifier.last().unwrap();
        assert_eq!(last.title, "Authentication Error");
        assert_eq!(last.description, "Invalid login credentials");
    }

    #[test]
    fn credentials_are_checked_locally() {
        assert!(validate_credentials("nobody", "secret1").is_err());
        assert!(validate_credentials("a@b.io", "123").is_err());
        assert!(validate_credentials(" a@b.io ", "123456").is_ok());
    }

    #[tokio::test]
    async fn sign_out_clears_identity_and_revokes_token() {
        let auth = Arc::new(FakeAuth::new("a@b.io", "secret1", "user-a"));
        let (session, _) = session(auth.clone());
        session.sign_in("a@b.io", "secret1").await.unwrap();

        session.sign_out().await.unwrap();

        assert!(session.current_user().is_none());
        assert_eq!(session.require_user().unwrap_err(), StoreError::AuthRequired);
        assert_eq!(auth.signed_out.lock().unwrap().as_slice(), ["token-user-a"]);
    }

    #[tokio::test]
    async fn saved_session_is_restored_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let auth = Arc::new(FakeAuth::new("a@b.io", "secret1", "user-a"));

        let first = Session::new(auth.clone(), Notifier::new()).with_file(&path);
        first.sign_in("a@b.io", "secret1").await.unwrap();
        assert!(path.exists());

        let second = Session::new(auth, Notifier::new()).with_file(&path);
        let restored = second.restore().await.unwrap();
        assert_eq!(restored.map(|u| u.id).as_deref(), Some("user-a"));
    }

    #[tokio::test]
    async fn rejected_saved_session_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let stale = AuthSession {
            access_token: "expired".to_string(),
            refresh_token: None,
            user: User {
                id: "user-a".to_string(),
                email: None,
                created_at: chrono::Utc::now(),
            },
        };
        std::fs::write(&path, serde_json::to_string(&stale).unwrap()).unwrap();
        let auth = Arc::new(FakeAuth::new("a@b.io", "secret1", "user-a"));

        let session = Session::new(auth, Notifier::new()).with_file(&path);

        assert!(session.restore().await.unwrap().is_none());
        assert!(!path.exists());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn sign_up_pending_verification_stays_signed_out() {
        let auth = Arc::new(FakeAuth::new("a@b.io", "secret1", "user-a"));
        let (session, notifier) = session(auth);

        let outcome = session.sign_up("a@b.io", "secret1").await.unwrap();

        assert!(matches!(outcome, SignUp::PendingVerification(_)));
        assert!(session.current_user().is_none());
        assert_eq!(notifier.last().unwrap().title, "Account Created!");
    }
}
