use super::{Context, expect};
use crate::error::{FinicityError, Resource};
use crate::models::partner::PartnerCredentials;
use crate::token::Credentials;
use crate::transport::Request;
use crate::xml::to_xml;
use log::info;
use reqwest::StatusCode;

/// Partner-level account management.
#[derive(Debug, Clone)]
pub struct PartnerOperations {
    context: Context,
    credentials: Credentials,
}

impl PartnerOperations {
    pub(crate) fn new(context: Context, credentials: Credentials) -> Self {
        Self {
            context,
            credentials,
        }
    }

    /// Replace the partner secret.
    ///
    /// The client keeps authenticating with the secret it was built with, so
    /// build a new client with the new secret once this succeeds.
    pub async fn modify_partner_secret(&self, new_secret: &str) -> Result<(), FinicityError> {
        if new_secret.is_empty() {
            return Err(FinicityError::InvalidParameter("new partner secret is empty"));
        }
        info!("Changing secret of partner {}", self.credentials.partner_id);
        let body = to_xml(&PartnerCredentials {
            partner_id: &self.credentials.partner_id,
            partner_secret: &self.credentials.partner_secret,
            new_partner_secret: Some(new_secret),
        })?;
        let request = Request::put(&["v2", "partners", "authentication"]).body(body);
        let response = self.context.send_with_app_key(request).await?;
        expect(Resource::Partner, response, StatusCode::NO_CONTENT)?;
        Ok(())
    }
}
