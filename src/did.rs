//! Shape checks for [Decentralized Identifiers][did-syntax] used as issuer
//! constraints.
//!
//! Syntax is checked by `ssi-dids-core`; on top of it, issuer DIDs must have
//! a method specific identifier long enough to be an actual key or address.
//! Nothing is resolved.
//!
//! [did-syntax]: <https://w3c.github.io/did-core/#did-syntax>
use core::fmt;

use ssi_dids_core::{InvalidDID, DID};

/// Minimum length of the method specific identifier of an issuer DID.
pub const MIN_METHOD_SPECIFIC_ID_LEN: usize = 10;

/// Error raised when a string is not an acceptable issuer DID.
#[derive(Debug, thiserror::Error)]
pub enum InvalidDid {
    #[error(transparent)]
    Syntax(#[from] InvalidDID<String>),

    #[error("method specific identifier is too short ({0} < {MIN_METHOD_SPECIFIC_ID_LEN})")]
    TooShort(usize),
}

/// Borrowed issuer DID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Did<'a>(&'a DID);

impl<'a> Did<'a> {
    /// Parses `data` as a DID with a method specific identifier of at least
    /// [`MIN_METHOD_SPECIFIC_ID_LEN`] bytes.
    pub fn parse(data: &'a str) -> Result<Self, InvalidDid> {
        let did = DID::new(data).map_err(|e| e.map(|data: &str| data.to_owned()))?;

        let len = did.method_specific_id().len();
        if len < MIN_METHOD_SPECIFIC_ID_LEN {
            return Err(InvalidDid::TooShort(len));
        }

        Ok(Self(did))
    }

    /// Returns the DID method name.
    pub fn method_name(&self) -> &'a str {
        self.0.method_name()
    }

    /// Returns the DID method specific identifier.
    pub fn method_specific_id(&self) -> &'a str {
        self.0.method_specific_id()
    }
}

impl fmt::Display for Did<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method_name(), self.method_specific_id())
    }
}

/// Returns `true` if `data` is acceptable as an issuer DID.
pub fn is_valid_did(data: &str) -> bool {
    Did::parse(data).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_issuer_dids() {
        for input in [
            "did:ethr:0xf3beac30c498d9e26865f34fcaa57dbb935b0d74",
            "did:method:foo-bar-baz",
            "did:web:example.com%3A443:u:bob",
            "did:sol:CYsyzuufSP6jXv2EjTqDAeM9S2YNVXpuJ1Li2DoBVhUR",
        ] {
            assert!(is_valid_did(input), "{input}");
        }
    }

    #[test]
    fn reject_malformed_dids() {
        for input in [
            "http:a:bcdefghijkl",
            "did::bcdefghijkl",
            "did:a:",
            "did:ethr:0xf3beac30c498d9e26865f34fcaa57dbb935b0d74 ",
            "",
        ] {
            assert!(
                matches!(Did::parse(input), Err(InvalidDid::Syntax(_))),
                "{input}"
            )
        }
    }

    #[test]
    fn too_short_method_specific_id() {
        match Did::parse("did:ethr:0xf3bea") {
            Err(InvalidDid::TooShort(7)) => (),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn did_parts() {
        let did = Did::parse("did:ethr:0xf3beac30c498d9e26865f34fcaa57dbb935b0d74").unwrap();
        assert_eq!(did.method_name(), "ethr");
        assert_eq!(
            did.method_specific_id(),
            "0xf3beac30c498d9e26865f34fcaa57dbb935b0d74"
        );
        assert_eq!(
            did.to_string(),
            "did:ethr:0xf3beac30c498d9e26865f34fcaa57dbb935b0d74"
        );
    }
}
