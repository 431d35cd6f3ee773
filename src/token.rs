//! Access-token lifecycle.
//!
//! The aggregation API hands out partner tokens that live for two hours.
//! [`Authenticator`] trades the long-lived partner [`Credentials`] for a
//! [`Token`], and [`TokenGuard`] keeps one token shared by every operation,
//! refreshing it inline once its local lifetime, shorter than the server's,
//! runs out.
//!
//! Refreshes are single-flight: when several callers notice a stale token at
//! once, only the first one authenticates and the rest pick up its result.

use crate::error::{AuthenticationError, FinicityError};
use crate::models::partner::{PartnerAccess, PartnerCredentials};
use crate::transport::{APP_KEY_HEADER, Request, Transport};
use crate::xml::{from_xml, to_xml};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use reqwest::StatusCode;
use std::env;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Local token lifetime in minutes; the server allows 120.
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 90;

/// A bearer token and the instant after which it is treated as stale.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<token>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Partner credentials issued by Finicity.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_key: String,
    pub partner_id: String,
    pub partner_secret: String,
}

impl Credentials {
    pub fn new(
        app_key: impl Into<String>,
        partner_id: impl Into<String>,
        partner_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_key: app_key.into(),
            partner_id: partner_id.into(),
            partner_secret: partner_secret.into(),
        }
    }

    /// Read `FINICITY_APP_KEY`, `FINICITY_PARTNER_ID` and `FINICITY_PARTNER_SECRET`.
    pub fn from_env() -> Result<Self, FinicityError> {
        let read = |name: &'static str| {
            env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(FinicityError::MissingConfig(name))
        };
        Ok(Self::new(
            read("FINICITY_APP_KEY")?,
            read("FINICITY_PARTNER_ID")?,
            read("FINICITY_PARTNER_SECRET")?,
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("partner_id", &self.partner_id)
            .field("partner_secret", &"<redacted>")
            .finish()
    }
}

/// Exchanges partner credentials for a fresh [`Token`].
pub struct Authenticator {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    lifetime: Duration,
}

impl Authenticator {
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
            lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        }
    }

    /// Override how long a token is trusted before it is considered stale.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Perform one authentication call. Never retries.
    pub async fn authenticate(&self) -> Result<Token, AuthenticationError> {
        let body = to_xml(&PartnerCredentials {
            partner_id: &self.credentials.partner_id,
            partner_secret: &self.credentials.partner_secret,
            new_partner_secret: None,
        })?;
        let request = Request::post(&["v2", "partners", "authentication"])
            .header(APP_KEY_HEADER, self.credentials.app_key.as_str())
            .body(body);

        debug!("Authenticating partner {}", self.credentials.partner_id);
        let issued_at = Utc::now();
        let response = self.transport.execute(request).await?;
        if response.status != StatusCode::OK {
            warn!("Partner authentication rejected with status {}", response.status);
            return Err(AuthenticationError::Rejected {
                status: response.status,
                body: response.body,
            });
        }
        let access: PartnerAccess = from_xml(&response.body)?;
        info!("Obtained new Finicity access token");
        Ok(Token::new(access.token, issued_at + self.lifetime))
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("credentials", &self.credentials)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

#[derive(Debug)]
struct Slot {
    token: Token,
    attempt: u64,
    failure: Option<Failure>,
}

/// Outcome of a failed refresh, replayed to callers that queued behind it.
#[derive(Debug, Clone)]
struct Failure {
    status: Option<StatusCode>,
    message: String,
}

impl Failure {
    fn of(err: &AuthenticationError) -> Self {
        let status = match err {
            AuthenticationError::Rejected { status, .. } => Some(*status),
            AuthenticationError::Concurrent { status, .. } => *status,
            _ => None,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }

    fn replay(&self) -> AuthenticationError {
        AuthenticationError::Concurrent {
            status: self.status,
            message: self.message.clone(),
        }
    }
}

/// Owner of the shared token.
///
/// Readers take the `RwLock`; a refresh additionally holds `flight`, so at
/// most one authentication request is outstanding. `attempt` increments on
/// every refresh, successful or not, so a caller that waited on `flight`
/// takes the outcome of the refresh it queued behind instead of starting
/// another one.
#[derive(Debug)]
pub struct TokenGuard {
    authenticator: Authenticator,
    slot: RwLock<Slot>,
    flight: Mutex<()>,
}

impl TokenGuard {
    /// Authenticate once and guard the resulting token.
    pub async fn authenticate(authenticator: Authenticator) -> Result<Self, FinicityError> {
        let token = authenticator.authenticate().await?;
        Ok(Self::with_token(authenticator, token))
    }

    /// Guard an already issued token without calling the API.
    pub fn with_token(authenticator: Authenticator, token: Token) -> Self {
        Self {
            authenticator,
            slot: RwLock::new(Slot {
                token,
                attempt: 0,
                failure: None,
            }),
            flight: Mutex::new(()),
        }
    }

    /// The current token, refreshed first if it is past its expiry.
    pub async fn current(&self) -> Result<Token, FinicityError> {
        let (token, seen) = {
            let slot = self.slot.read().await;
            (slot.token.clone(), slot.attempt)
        };
        if !token.is_expired() {
            return Ok(token);
        }

        let _flight = self.flight.lock().await;
        {
            let slot = self.slot.read().await;
            if slot.attempt != seen {
                return match &slot.failure {
                    None => {
                        debug!("Token was refreshed by a concurrent caller");
                        Ok(slot.token.clone())
                    }
                    Some(failure) => {
                        debug!("Concurrent token refresh failed, not retrying");
                        Err(failure.replay().into())
                    }
                };
            }
        }
        info!("Access token expired at {}, refreshing", token.expires_at());
        self.replace().await
    }

    /// Authenticate unconditionally and replace the current token.
    pub async fn force_refresh(&self) -> Result<Token, FinicityError> {
        let _flight = self.flight.lock().await;
        self.replace().await
    }

    /// The stored token as-is, without a staleness check.
    pub async fn peek(&self) -> Token {
        self.slot.read().await.token.clone()
    }

    // Caller must hold `flight`. A failure keeps the previous token.
    async fn replace(&self) -> Result<Token, FinicityError> {
        let result = self.authenticator.authenticate().await;
        let mut slot = self.slot.write().await;
        slot.attempt += 1;
        match result {
            Ok(token) => {
                slot.token = token.clone();
                slot.failure = None;
                Ok(token)
            }
            Err(err) => {
                warn!("Token refresh failed: {err}");
                slot.failure = Some(Failure::of(&err));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use reqwest::Method;
    use std::time::Duration as StdDuration;

    const AUTH_PATH: &str = "/v2/partners/authentication";

    fn credentials() -> Credentials {
        Credentials::new("APP_KEY", "PARTNER_ID", "PARTNER_SECRET")
    }

    fn authenticator(transport: &Arc<MockTransport>) -> Authenticator {
        Authenticator::new(transport.clone(), credentials())
    }

    fn expired(value: &str) -> Token {
        Token::new(value, Utc::now() - Duration::minutes(1))
    }

    #[tokio::test]
    async fn authenticate_posts_credentials_with_app_key_only() {
        let transport = Arc::new(MockTransport::authenticating("TOKEN"));
        let before = Utc::now();
        let token = authenticator(&transport).authenticate().await.unwrap();

        assert_eq!(token.value(), "TOKEN");
        assert!(token.expires_at() >= before + Duration::minutes(90));
        assert!(token.expires_at() <= Utc::now() + Duration::minutes(90));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header_value("Finicity-App-Key"), Some("APP_KEY"));
        assert_eq!(request.header_value("Finicity-App-Token"), None);
        let body = request.body.as_deref().unwrap();
        assert!(body.contains("<partnerId>PARTNER_ID</partnerId>"));
        assert!(body.contains("<partnerSecret>PARTNER_SECRET</partnerSecret>"));
    }

    #[tokio::test]
    async fn authenticate_rejects_non_200() {
        let transport = Arc::new(MockTransport::new().respond(
            Method::POST,
            AUTH_PATH,
            401,
            "<error><code>10001</code></error>",
        ));
        let err = authenticator(&transport).authenticate().await.unwrap_err();
        match err {
            AuthenticationError::Rejected { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("10001"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn authenticate_surfaces_transport_and_parse_failures() {
        let transport = Arc::new(MockTransport::new().fail(Method::POST, AUTH_PATH));
        let err = authenticator(&transport).authenticate().await.unwrap_err();
        assert!(matches!(err, AuthenticationError::Transport(_)));

        let transport =
            Arc::new(MockTransport::new().respond(Method::POST, AUTH_PATH, 200, "not xml"));
        let err = authenticator(&transport).authenticate().await.unwrap_err();
        assert!(matches!(err, AuthenticationError::Parse(_)));
    }

    #[tokio::test]
    async fn current_reuses_fresh_token() {
        let transport = Arc::new(MockTransport::authenticating("TOKEN"));
        let guard = TokenGuard::authenticate(authenticator(&transport))
            .await
            .unwrap();

        for _ in 0..5 {
            assert_eq!(guard.current().await.unwrap().value(), "TOKEN");
        }
        assert_eq!(transport.count(Method::POST, AUTH_PATH), 1);
    }

    #[tokio::test]
    async fn current_refreshes_expired_token_once() {
        let transport = Arc::new(MockTransport::authenticating("NEW"));
        let guard = TokenGuard::with_token(authenticator(&transport), expired("OLD"));

        assert_eq!(guard.current().await.unwrap().value(), "NEW");
        assert_eq!(guard.current().await.unwrap().value(), "NEW");
        assert_eq!(transport.count(Method::POST, AUTH_PATH), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_refresh() {
        let transport = Arc::new(
            MockTransport::authenticating("NEW").with_delay(StdDuration::from_millis(50)),
        );
        let guard = Arc::new(TokenGuard::with_token(
            authenticator(&transport),
            expired("OLD"),
        ));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let guard = guard.clone();
                tokio::spawn(async move { guard.current().await })
            })
            .collect();
        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.value(), "NEW");
        }
        assert_eq!(transport.count(Method::POST, AUTH_PATH), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_failed_refresh() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(Method::POST, AUTH_PATH, 500, "maintenance")
                .with_delay(StdDuration::from_millis(50)),
        );
        let guard = Arc::new(TokenGuard::with_token(
            authenticator(&transport),
            expired("OLD"),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                tokio::spawn(async move { guard.current().await })
            })
            .collect();
        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, FinicityError::Authentication(_)));
            assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        }
        assert_eq!(transport.count(Method::POST, AUTH_PATH), 1);
        assert_eq!(guard.peek().await.value(), "OLD");

        // A later caller tries again.
        guard.current().await.unwrap_err();
        assert_eq!(transport.count(Method::POST, AUTH_PATH), 2);
    }

    #[tokio::test]
    async fn force_refresh_always_authenticates() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(Method::POST, AUTH_PATH, 200, "<access><token>T1</token></access>")
                .respond(Method::POST, AUTH_PATH, 200, "<access><token>T2</token></access>"),
        );
        let guard = TokenGuard::authenticate(authenticator(&transport))
            .await
            .unwrap();
        assert_eq!(guard.current().await.unwrap().value(), "T1");
        assert_eq!(guard.force_refresh().await.unwrap().value(), "T2");
        assert_eq!(guard.current().await.unwrap().value(), "T2");
        assert_eq!(transport.count(Method::POST, AUTH_PATH), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_token() {
        let transport = Arc::new(
            MockTransport::new()
                .respond(Method::POST, AUTH_PATH, 200, "<access><token>T1</token></access>")
                .respond(Method::POST, AUTH_PATH, 500, "maintenance"),
        );
        let guard = TokenGuard::authenticate(authenticator(&transport))
            .await
            .unwrap();

        let err = guard.force_refresh().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(guard.peek().await.value(), "T1");
    }

    #[tokio::test]
    async fn short_lifetime_forces_refresh_on_next_use() {
        let transport = Arc::new(MockTransport::authenticating("TOKEN"));
        let guard = TokenGuard::authenticate(
            authenticator(&transport).with_lifetime(Duration::seconds(-1)),
        )
        .await
        .unwrap();
        guard.current().await.unwrap();
        assert_eq!(transport.count(Method::POST, AUTH_PATH), 2);
    }

    #[test]
    fn token_debug_hides_value() {
        let token = Token::new("SECRET_TOKEN", Utc::now());
        assert!(!format!("{token:?}").contains("SECRET_TOKEN"));
        let creds = credentials();
        assert!(!format!("{creds:?}").contains("PARTNER_SECRET"));
    }

    #[test]
    fn expiry_is_strictly_after_deadline() {
        let deadline = Utc::now();
        let token = Token::new("T", deadline);
        assert!(!token.is_expired_at(deadline));
        assert!(token.is_expired_at(deadline + Duration::milliseconds(1)));
    }
}
