//! Per-resource operations.
//!
//! Every operations type wraps the same [`Context`]: the transport, the shared
//! [`TokenGuard`] and the app key. A call asks the guard for the current token
//! (refreshing it when stale), attaches the identifying headers, and checks the
//! response status against the single status the operation expects.

mod account;
mod customer;
mod institution;
mod partner;
mod transaction;
mod txpush;

pub use account::AccountOperations;
pub use customer::{CustomerOperations, CustomerQuery};
pub use institution::{InstitutionOperations, InstitutionQuery};
pub use partner::PartnerOperations;
pub use transaction::{Sort, TransactionOperations, TransactionQuery};
pub use txpush::TxPushOperations;

use crate::error::{FinicityError, Resource};
use crate::token::TokenGuard;
use crate::transport::{APP_KEY_HEADER, APP_TOKEN_HEADER, Request, Response, Transport};
use crate::xml::from_xml;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct Context {
    transport: Arc<dyn Transport>,
    guard: Arc<TokenGuard>,
    app_key: String,
}

impl Context {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        guard: Arc<TokenGuard>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            guard,
            app_key: app_key.into(),
        }
    }

    /// Send with the app key and the current app token.
    async fn send(&self, request: Request) -> Result<Response, FinicityError> {
        let token = self.guard.current().await?;
        let request = request.header(APP_TOKEN_HEADER, token.value());
        self.send_with_app_key(request).await
    }

    /// Send with the app key only.
    async fn send_with_app_key(&self, request: Request) -> Result<Response, FinicityError> {
        let request = request.header(APP_KEY_HEADER, self.app_key.as_str());
        debug!("{} {}", request.method, request.path());
        Ok(self.transport.execute(request).await?)
    }

    /// Send and insist on `expected`, returning the response body.
    async fn call(
        &self,
        resource: Resource,
        request: Request,
        expected: StatusCode,
    ) -> Result<String, FinicityError> {
        let response = self.send(request).await?;
        expect(resource, response, expected)
    }

    /// Send, insist on `expected` and decode the body.
    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: Resource,
        request: Request,
        expected: StatusCode,
    ) -> Result<T, FinicityError> {
        let body = self.call(resource, request, expected).await?;
        Ok(from_xml(&body)?)
    }

    /// Send a mutation that answers with 204 and no body.
    async fn execute(&self, resource: Resource, request: Request) -> Result<(), FinicityError> {
        self.call(resource, request, StatusCode::NO_CONTENT).await?;
        Ok(())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("app_key", &self.app_key)
            .finish_non_exhaustive()
    }
}

fn expect(
    resource: Resource,
    response: Response,
    expected: StatusCode,
) -> Result<String, FinicityError> {
    if response.status == expected {
        return Ok(response.body);
    }
    Err(unexpected(resource, response))
}

fn unexpected(resource: Resource, response: Response) -> FinicityError {
    warn!(
        "Unexpected status {} from {} operation",
        response.status, resource
    );
    FinicityError::Operation {
        resource,
        status: response.status,
        body: response.body,
    }
}

// Blank search strings are left out of the query entirely.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::token::{Authenticator, Credentials, Token};
    use crate::transport::mock::MockTransport;
    use chrono::{Duration, Utc};

    pub(crate) const TOKEN: &str = "TOKEN";

    /// A context over `transport` holding a fresh token named [`TOKEN`].
    pub(crate) fn context(transport: &Arc<MockTransport>) -> Context {
        let transport: Arc<dyn Transport> = transport.clone();
        let authenticator = Authenticator::new(
            transport.clone(),
            Credentials::new("APP_KEY", "PARTNER_ID", "PARTNER_SECRET"),
        );
        let guard = TokenGuard::with_token(
            authenticator,
            Token::new(TOKEN, Utc::now() + Duration::minutes(90)),
        );
        Context::new(transport, Arc::new(guard), "APP_KEY")
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{TOKEN, context};
    use super::*;
    use crate::transport::mock::MockTransport;
    use reqwest::Method;

    #[tokio::test]
    async fn send_attaches_identity_headers() {
        let transport = Arc::new(MockTransport::new().respond(
            Method::GET,
            "/v1/institutions/1",
            200,
            "<institution><id>1</id></institution>",
        ));
        let ctx = context(&transport);
        ctx.call(
            Resource::Institution,
            Request::get(&["v1", "institutions", "1"]),
            StatusCode::OK,
        )
        .await
        .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.header_value(APP_KEY_HEADER), Some("APP_KEY"));
        assert_eq!(request.header_value(APP_TOKEN_HEADER), Some(TOKEN));
    }

    #[tokio::test]
    async fn unexpected_status_keeps_raw_body() {
        let transport = Arc::new(MockTransport::new().respond(
            Method::DELETE,
            "/v1/customers/9",
            404,
            "<error><code>14001</code><message>Customer not found</message></error>",
        ));
        let ctx = context(&transport);
        let err = ctx
            .execute(Resource::Customer, Request::delete(&["v1", "customers", "9"]))
            .await
            .unwrap_err();
        match err {
            FinicityError::Operation {
                resource,
                status,
                body,
            } => {
                assert_eq!(resource, Resource::Customer);
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert!(body.contains("Customer not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_with_wrong_code_is_an_error() {
        let transport = Arc::new(MockTransport::new().respond(
            Method::PUT,
            "/v1/customers/9",
            200,
            "",
        ));
        let ctx = context(&transport);
        let err = ctx
            .execute(Resource::Customer, Request::put(&["v1", "customers", "9"]))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn transport_failure_is_not_an_operation_error() {
        let transport = Arc::new(MockTransport::new().fail(Method::GET, "/v1/customers"));
        let ctx = context(&transport);
        let err = ctx
            .call(
                Resource::Customer,
                Request::get(&["v1", "customers"]),
                StatusCode::OK,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FinicityError::Transport(_)));
    }

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some("bank")), Some("bank"));
        assert_eq!(non_blank(None), None);
    }
}
