//! XML encoding for request and response bodies.

use crate::error::ParseError;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub(crate) const CONTENT_TYPE: &str = "application/xml";

/// Encode a wire type; the root element comes from the type's serde name.
pub fn to_xml<T: Serialize>(value: &T) -> Result<String, quick_xml::se::SeError> {
    quick_xml::se::to_string(value)
}

/// Decode a response body, keeping the body around for diagnostics on failure.
pub fn from_xml<T: DeserializeOwned>(body: &str) -> Result<T, ParseError> {
    quick_xml::de::from_str(body).map_err(|source| ParseError {
        body: body.to_string(),
        source,
    })
}
