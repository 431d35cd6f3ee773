use serde::{Deserialize, Serialize};

/// Partner login body for `/v2/partners/authentication`.
#[derive(Clone, Serialize)]
#[serde(rename = "credentials", rename_all = "camelCase")]
pub(crate) struct PartnerCredentials<'a> {
    pub(crate) partner_id: &'a str,
    pub(crate) partner_secret: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) new_partner_secret: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PartnerAccess {
    pub(crate) token: String,
}
