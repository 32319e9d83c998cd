//! Constraints attached to requested items, and their validation.
//!
//! ```json
//! {
//!   "meta": {
//!     "issuer": { "is": { "$eq": "did:ethr:0xf3beac30c498d9e26865f34fcaa57dbb935b0d74" } },
//!     "issued": { "is": { "$lt": 15999999 } },
//!     "expiry": { "is": { "$gt": 19999999 } }
//!   },
//!   "claims": [
//!     { "path": "email", "is": { "$eq": "jpsantos@gmail.com" } }
//!   ]
//! }
//! ```
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::did::Did;
use crate::error::Error;
use crate::grammar::{Operator, Predicate};
use crate::registry::SchemaRegistry;
use crate::request::RequestedItem;

/// Constraints of a requested item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaConstraints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<Vec<ClaimConstraint>>,
}

/// Constraints on the credential itself rather than on its claims.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_claims: Option<bool>,
}

/// `{ "is": <predicate> }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(
        default,
        deserialize_with = "deserialize_predicate",
        skip_serializing_if = "Option::is_none"
    )]
    pub is: Option<Predicate>,
}

/// Predicate on one field of the credential, addressed by a dotted path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimConstraint {
    #[serde(default)]
    pub path: String,
    #[serde(
        default,
        deserialize_with = "deserialize_predicate",
        skip_serializing_if = "Option::is_none"
    )]
    pub is: Option<Predicate>,
}

fn deserialize_predicate<'de, D>(deserializer: D) -> Result<Option<Predicate>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Predicate>::deserialize(deserializer)
        .map_err(|e| <D::Error as de::Error>::custom(format_args!("invalid `is` predicate: {e}")))
}

impl Constraint {
    pub fn new(operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            is: Some(Predicate::new(operator, value)),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        self.is
            .as_ref()
            .ok_or(Error::EmptyPredicate)?
            .validate()
            .map(|_| ())
    }

    /// Validates an issuer constraint: a well-formed predicate whose value is
    /// a DID, whatever the operator.
    fn validate_issuer(&self) -> Result<(), Error> {
        let predicate = self.is.as_ref().ok_or(Error::EmptyPredicate)?;
        let comparison = predicate.validate()?;
        match comparison.value {
            Value::String(did) if Did::parse(did).is_ok() => Ok(()),
            Value::String(did) => Err(Error::InvalidIssuer(did.clone())),
            other => Err(Error::InvalidIssuer(other.to_string())),
        }
    }
}

impl ClaimConstraint {
    pub fn new(path: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            is: Some(Predicate::new(operator, value)),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.path.is_empty() {
            return Err(Error::MissingClaimPath);
        }

        self.is
            .as_ref()
            .ok_or(Error::MissingClaimConstraint)?
            .validate()
            .map(|_| ())
    }
}

impl MetaConstraints {
    fn validate(&self) -> Result<(), Error> {
        if let Some(issuer) = &self.issuer {
            issuer.validate_issuer()?;
        }
        if let Some(issued) = &self.issued {
            issued.validate()?;
        }
        if let Some(expiry) = &self.expiry {
            expiry.validate()?;
        }
        Ok(())
    }
}

impl Constraints {
    /// Validates the constraint tree, stopping at the first violation.
    pub fn validate(&self) -> Result<(), Error> {
        let claims = self.claims.as_deref().unwrap_or_default();

        if let Some(meta) = &self.meta {
            meta.validate()?;

            if meta.no_claims == Some(true) && !claims.is_empty() {
                return Err(Error::ConflictingNoClaims);
            }
        }

        claims.iter().try_for_each(ClaimConstraint::validate)
    }
}

/// Validates the constraints of each item, in order, stopping at the first
/// invalid item.
///
/// Items without constraints are always valid.
pub fn validate_credential_items(items: &[RequestedItem]) -> Result<(), Error> {
    for item in items {
        if item.identifier().is_empty() {
            return Err(Error::MissingIdentifier);
        }

        if let Some(constraints) = item.constraints() {
            constraints.validate().map_err(|e| {
                log::debug!("invalid constraints on {}: {e}", item.identifier());
                e
            })?;
        }
    }

    Ok(())
}

/// Checks the first segment of every claim path against the fields the
/// registry knows for the item.
///
/// This is stricter than [`validate_credential_items`], which only requires
/// paths to be non-empty.
pub fn validate_claim_paths<R: SchemaRegistry + ?Sized>(
    items: &[RequestedItem],
    registry: &R,
) -> Result<(), Error> {
    for item in items {
        let claims = match item.constraints().and_then(|c| c.claims.as_deref()) {
            Some(claims) if !claims.is_empty() => claims,
            _ => continue,
        };

        let fields = registry
            .fields(item.identifier())
            .ok_or_else(|| Error::UnknownIdentifier(item.identifier().to_owned()))?;

        for claim in claims {
            let root = claim.path.split('.').next().unwrap_or_default();
            if root.is_empty() {
                return Err(Error::MissingClaimPath);
            }

            if !fields.contains(root) {
                return Err(Error::UnknownClaimPath {
                    identifier: item.identifier().to_owned(),
                    path: claim.path.clone(),
                });
            }
        }
    }

    Ok(())
}
