//! Identifiers of requestable claims and credentials.
//!
//! Identifiers are namespaced strings:
//! - `claim-<Type>:<Field>-<version>`, e.g. `claim-cvc:Identity:name-1`;
//! - `credential-<Type>-<version>`, e.g. `credential-cvc:Identity-v1`.
use std::fmt;

use crate::error::Error;

const CLAIM_PREFIX: &str = "claim-";
const CREDENTIAL_PREFIX: &str = "credential-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Claim,
    Credential,
}

impl IdentifierKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Claim => CLAIM_PREFIX,
            Self::Credential => CREDENTIAL_PREFIX,
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Claim => f.write_str("claim"),
            Self::Credential => f.write_str("credential"),
        }
    }
}

/// Parsed, borrowed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'a> {
    raw: &'a str,
    kind: IdentifierKind,
    name: &'a str,
    version: &'a str,
}

impl<'a> Identifier<'a> {
    /// Parses an identifier. Only the namespace syntax is checked; whether
    /// the identifier is known is up to the schema registry.
    pub fn parse(raw: &'a str) -> Result<Self, Error> {
        let invalid = || Error::UnknownIdentifier(raw.to_owned());

        let (kind, rest) = if let Some(rest) = raw.strip_prefix(CLAIM_PREFIX) {
            (IdentifierKind::Claim, rest)
        } else if let Some(rest) = raw.strip_prefix(CREDENTIAL_PREFIX) {
            (IdentifierKind::Credential, rest)
        } else {
            return Err(invalid());
        };

        let (name, version) = rest.rsplit_once('-').ok_or_else(invalid)?;
        if name.is_empty() || version.is_empty() {
            return Err(invalid());
        }

        // Claims name a field of their type.
        if kind == IdentifierKind::Claim {
            match name.rsplit_once(':') {
                Some((ty, field)) if !ty.is_empty() && !field.is_empty() => (),
                _ => return Err(invalid()),
            }
        }

        Ok(Self {
            raw,
            kind,
            name,
            version,
        })
    }

    pub fn as_str(&self) -> &'a str {
        self.raw
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// Type name, without the claim field. `cvc:Identity` for both
    /// `claim-cvc:Identity:name-1` and `credential-cvc:Identity-v1`.
    pub fn type_name(&self) -> &'a str {
        match self.kind {
            IdentifierKind::Claim => self.name.rsplit_once(':').map_or(self.name, |(t, _)| t),
            IdentifierKind::Credential => self.name,
        }
    }

    /// Claim field, if this identifies a claim.
    pub fn field(&self) -> Option<&'a str> {
        match self.kind {
            IdentifierKind::Claim => self.name.rsplit_once(':').map(|(_, f)| f),
            IdentifierKind::Credential => None,
        }
    }

    pub fn version(&self) -> &'a str {
        self.version
    }
}

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}
