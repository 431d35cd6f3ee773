use crate::error::FinicityError;
use crate::operations::{
    AccountOperations, Context, CustomerOperations, InstitutionOperations, PartnerOperations,
    TransactionOperations, TxPushOperations,
};
use crate::token::{Authenticator, Credentials, DEFAULT_TOKEN_LIFETIME_MINUTES, Token, TokenGuard};
use crate::transport::{BASE_URL, DEFAULT_TIMEOUT, HttpTransport, Transport};
use log::info;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configures and authenticates a [`Client`].
pub struct ClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    token_lifetime: chrono::Duration,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_lifetime: chrono::Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
            transport: None,
        }
    }

    /// Override the base URL (useful for tests or proxies).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-request timeout of the HTTP transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long a token is used before it is renewed.
    pub fn token_lifetime(mut self, lifetime: chrono::Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Use a custom transport; `base_url` and `timeout` are then ignored.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Authenticate and assemble the client. Fails if authentication fails.
    pub async fn build(self) -> Result<Client, FinicityError> {
        let endpoint = self.endpoint();
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.base_url, self.timeout)?),
        };
        let app_key = self.credentials.app_key.clone();
        let authenticator = Authenticator::new(transport.clone(), self.credentials.clone())
            .with_lifetime(self.token_lifetime);
        let guard = Arc::new(TokenGuard::authenticate(authenticator).await?);
        let context = Context::new(transport, guard.clone(), app_key);

        info!("Initialized Finicity API client using {endpoint}");
        Ok(Client {
            partner: PartnerOperations::new(context.clone(), self.credentials),
            accounts: AccountOperations::new(context.clone()),
            customers: CustomerOperations::new(context.clone()),
            institutions: InstitutionOperations::new(context.clone()),
            transactions: TransactionOperations::new(context.clone()),
            tx_push: TxPushOperations::new(context),
            guard,
        })
    }

    fn endpoint(&self) -> String {
        match self.transport {
            Some(_) => "a custom transport".to_string(),
            None => format!("base URL {}", self.base_url),
        }
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("credentials", &self.credentials)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("token_lifetime", &self.token_lifetime)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

/// Entry point to the API: one token shared by every resource.
///
/// The accessors check the token before handing out the operations value, so a
/// stale token is renewed on the next access rather than on a timer.
#[derive(Debug)]
pub struct Client {
    guard: Arc<TokenGuard>,
    partner: PartnerOperations,
    accounts: AccountOperations,
    customers: CustomerOperations,
    institutions: InstitutionOperations,
    transactions: TransactionOperations,
    tx_push: TxPushOperations,
}

impl Client {
    /// Authenticate against the production API with default settings.
    pub async fn new(credentials: Credentials) -> Result<Self, FinicityError> {
        ClientBuilder::new(credentials).build().await
    }

    pub fn builder(credentials: Credentials) -> ClientBuilder {
        ClientBuilder::new(credentials)
    }

    pub async fn partner(&self) -> Result<&PartnerOperations, FinicityError> {
        self.guard.current().await?;
        Ok(&self.partner)
    }

    pub async fn accounts(&self) -> Result<&AccountOperations, FinicityError> {
        self.guard.current().await?;
        Ok(&self.accounts)
    }

    pub async fn customers(&self) -> Result<&CustomerOperations, FinicityError> {
        self.guard.current().await?;
        Ok(&self.customers)
    }

    pub async fn institutions(&self) -> Result<&InstitutionOperations, FinicityError> {
        self.guard.current().await?;
        Ok(&self.institutions)
    }

    pub async fn transactions(&self) -> Result<&TransactionOperations, FinicityError> {
        self.guard.current().await?;
        Ok(&self.transactions)
    }

    pub async fn tx_push(&self) -> Result<&TxPushOperations, FinicityError> {
        self.guard.current().await?;
        Ok(&self.tx_push)
    }

    /// The token in use, renewed first if it went stale.
    pub async fn token(&self) -> Result<Token, FinicityError> {
        self.guard.current().await
    }

    /// Authenticate again regardless of the current token's age.
    pub async fn refresh_token(&self) -> Result<Token, FinicityError> {
        self.guard.force_refresh().await
    }
}
