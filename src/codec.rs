//! Canonical encoding of scope requests.
//!
//! Payloads use the [JSON Canonicalization Scheme][jcs], so a request always
//! encodes to the same bytes whatever the field or map order.
//!
//! [jcs]: <https://www.rfc-editor.org/rfc/rfc8785>
use crate::error::Error;
use crate::request::{ReceivedRequest, ScopeRequest};

/// Encodes a request into its signable payload.
pub fn encode(request: &ScopeRequest) -> Result<String, Error> {
    Ok(serde_jcs::to_string(request)?)
}

/// Decodes a payload back into a request.
///
/// The request goes through the checks of a build that do not depend on a
/// registry or a configuration: version, `uniqueId`, identifier syntax,
/// requester and channels. The payload never carries key material, so the
/// decoded request cannot be signed again with [`crate::signing::sign`].
pub fn decode(payload: &str) -> Result<ScopeRequest, Error> {
    serde_json::from_str::<ReceivedRequest>(payload)?.validate()
}
