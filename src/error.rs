//! Error types for `ssi-scope-request` crate
use thiserror::Error;

/// Error type for `ssi-scope-request`.
///
/// Every variant is a deterministic input problem: nothing here is worth
/// retrying with the same input.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Request built without a unique id
    #[error("uniqueId is required")]
    MissingUniqueId,
    /// Identifier outside the `claim-`/`credential-` namespaces or unknown to
    /// the schema registry
    #[error("{0} is not valid")]
    UnknownIdentifier(String),
    /// Credential item object without an `identifier`
    #[error("Credential item identifier is required")]
    MissingIdentifier,
    /// Required configuration field missing
    #[error("{0} is required")]
    ConfigIncomplete(&'static str),
    /// URL configured with a scheme other than `https`
    #[error("only HTTPS is supported for {0}")]
    InsecureScheme(&'static str),
    /// Predicate object without any operator
    #[error("Invalid Constraint Object - an operator is required")]
    EmptyPredicate,
    /// Predicate object with more than one operator
    #[error("Invalid Constraint Object - only one operator is allowed")]
    MultipleOperators,
    /// Predicate operator outside the recognized set
    #[error("Invalid Constraint Object - {0} is not a valid operator")]
    UnknownOperator(String),
    /// Issuer predicate value is not a DID
    #[error("{0} is not a valid issuer")]
    InvalidIssuer(String),
    /// `noClaims` set together with claim constraints
    #[error("Cannot ask for claims and also have the noClaims flag set to true")]
    ConflictingNoClaims,
    /// Claim constraint with an empty path
    #[error("Claim path is required")]
    MissingClaimPath,
    /// Claim constraint without a predicate
    #[error("Claim constraint is required")]
    MissingClaimConstraint,
    /// Claim path unknown to the schema of the requested item
    #[error("{path} is not a field of {identifier}")]
    UnknownClaimPath { identifier: String, path: String },
    /// Private signing key missing or malformed
    #[error("Invalid signing key: {0}")]
    SigningKey(String),
    /// Payload written for another version of the request format
    #[error("Unsupported request version {0}")]
    UnsupportedVersion(String),
    /// Signed envelope without one of its fields
    #[error("Request must have a {0}")]
    MalformedEnvelope(&'static str),
    /// Envelope public key differs from the pinned key
    #[error("Envelope public key does not match the pinned public key")]
    KeyMismatch,
    /// Envelope public key cannot be parsed
    #[error("Invalid public key: {0}")]
    InvalidKeyFormat(String),
    /// Signature does not verify against the payload
    #[error("Invalid signature")]
    SignatureInvalid,
    /// Error (de)serializing JSON
    #[error(transparent)]
    SerdeJSON(#[from] serde_json::Error),
}
