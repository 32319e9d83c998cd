//! Signed scope requests.
//!
//! A relying party ("partner") uses this library to ask a credential holder
//! to disclose identity claims or whole credentials, optionally filtered by
//! constraints on the issuer, the validity window, or claim values. The
//! request is signed with the partner key so the receiving side can
//! authenticate its origin before acting on it.
//!
//! # Basic Usage
//!
//! ```
//! use ssi_scope_request::{
//!     signing, Config, ScopeRequestFactory, StaticSchemaRegistry,
//! };
//!
//! let config = Config::from_json_str(r#"{
//!   "partner": {
//!     "id": "TestPartnerId",
//!     "signingKeys": {
//!       "publicKey": "04378df3e480e626541daec66c4bbad532430d28e1ecb6b70a03313fc07fbad5c0d8b26410eac8f0b1a448898cbed9d714fd9cab2a8d1a7885bfbb48bd673da03c",
//!       "privateKey": "f728fed0153f3b46a0fccdd9ed9954ad56fd4e8af016fe59075655aa9feb9a59"
//!     }
//!   },
//!   "app": {
//!     "id": "TestPartnerApp",
//!     "name": "TestPartnerApp",
//!     "logo": "https://example.com/logo.png",
//!     "description": "TestPartnerApp",
//!     "primaryColor": "A80B00",
//!     "secondaryColor": "FFFFFF"
//!   },
//!   "channels": {
//!     "baseEventsURL": "https://example.com/sr/events",
//!     "basePayloadURL": "https://example.com/sr/payload"
//!   }
//! }"#).unwrap();
//!
//! let registry = StaticSchemaRegistry::new()
//!     .with_schema("credential-cvc:Identity-v1", ["name", "email"]);
//!
//! // Build once, share everywhere.
//! let factory = ScopeRequestFactory::new(config, registry);
//!
//! let request = factory.build("abcd", "credential-cvc:Identity-v1").unwrap();
//! let envelope = request.sign().unwrap();
//!
//! // On the receiving side.
//! assert!(signing::verify(&envelope, None).unwrap());
//! ```
pub mod codec;
pub mod config;
pub mod constraints;
pub mod did;
pub mod error;
pub mod grammar;
pub mod identifier;
pub mod registry;
pub mod request;
pub mod signing;

pub use config::{
    App, AppConfig, ChannelConfig, ChannelDefaults, Channels, Config, PartnerConfig,
    RequestOverrides, RequesterInfo, SigningKeys,
};
pub use constraints::{
    validate_claim_paths, validate_credential_items, ClaimConstraint, Constraint, Constraints,
    MetaConstraints,
};
pub use error::Error;
pub use grammar::{Operator, Predicate};
pub use identifier::{Identifier, IdentifierKind};
pub use registry::{SchemaRegistry, StaticSchemaRegistry};
pub use request::{
    CredentialItem, CredentialItemObject, CredentialItems, RequestedItem, ScopeRequest,
    ScopeRequestFactory,
};
pub use signing::{RequestKey, Secp256k1Key, SignedEnvelope};
