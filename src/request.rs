//! Scope requests.
//!
//! A [`ScopeRequest`] asks a credential holder to disclose claims or whole
//! credentials to a partner. It is built once, through
//! [`ScopeRequestFactory::build`], and is immutable afterwards: building
//! either yields a request whose identifiers and requester configuration are
//! valid, or fails and yields nothing.
//!
//! Constraints are not validated while building. Use
//! [`ScopeRequest::validate_credential_items`] for that.
use std::sync::Arc;

use std::fmt;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::config::{AppConfig, ChannelConfig, Config, RequestOverrides, RequesterInfo};
use crate::constraints::{self, Constraints};
use crate::error::Error;
use crate::identifier::Identifier;
use crate::registry::SchemaRegistry;

/// Version of the request payload format.
pub const SCOPE_REQUEST_VERSION: &str = "1";

/// Requested claim or credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItem {
    identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constraints: Option<Constraints>,
}

impl RequestedItem {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            constraints: None,
        }
    }

    pub fn with_constraints(identifier: impl Into<String>, constraints: Constraints) -> Self {
        Self {
            identifier: identifier.into(),
            constraints: Some(constraints),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn constraints(&self) -> Option<&Constraints> {
        self.constraints.as_ref()
    }
}

/// Item as supplied by a caller: a bare identifier, or an object that should
/// carry an `identifier` and may carry `constraints`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CredentialItem {
    Identifier(String),
    Object(CredentialItemObject),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialItemObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl TryFrom<CredentialItem> for RequestedItem {
    type Error = Error;

    fn try_from(item: CredentialItem) -> Result<Self, Self::Error> {
        match item {
            CredentialItem::Identifier(identifier) => Ok(RequestedItem::new(identifier)),
            CredentialItem::Object(CredentialItemObject {
                identifier: Some(identifier),
                constraints,
            }) => Ok(RequestedItem {
                identifier,
                constraints,
            }),
            CredentialItem::Object(_) => Err(Error::MissingIdentifier),
        }
    }
}

impl From<&str> for CredentialItem {
    fn from(identifier: &str) -> Self {
        Self::Identifier(identifier.to_owned())
    }
}

impl From<String> for CredentialItem {
    fn from(identifier: String) -> Self {
        Self::Identifier(identifier)
    }
}

impl From<RequestedItem> for CredentialItem {
    fn from(item: RequestedItem) -> Self {
        Self::Object(CredentialItemObject {
            identifier: Some(item.identifier),
            constraints: item.constraints,
        })
    }
}

impl<'de> Deserialize<'de> for CredentialItem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = CredentialItem;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "an identifier or an item object")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(CredentialItem::Identifier(v.to_owned()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(CredentialItem::Identifier(v))
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                CredentialItemObject::deserialize(MapAccessDeserializer::new(map))
                    .map(CredentialItem::Object)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

/// One item or a list of items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CredentialItems {
    One(CredentialItem),
    Many(Vec<CredentialItem>),
}

impl<'de> Deserialize<'de> for CredentialItems {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = CredentialItems;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "an identifier, an item object or a list of items")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(CredentialItems::One(CredentialItem::Identifier(v.to_owned())))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(CredentialItems::One(CredentialItem::Identifier(v)))
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                CredentialItemObject::deserialize(MapAccessDeserializer::new(map))
                    .map(|item| CredentialItems::One(CredentialItem::Object(item)))
            }

            fn visit_seq<A>(self, seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                <Vec<CredentialItem>>::deserialize(SeqAccessDeserializer::new(seq)).map(CredentialItems::Many)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

impl CredentialItems {
    /// Normalizes into requested items, in input order, dropping exact
    /// duplicates.
    fn normalize(self) -> Result<Vec<RequestedItem>, Error> {
        let items = match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        };

        let mut result: Vec<RequestedItem> = Vec::with_capacity(items.len());
        for item in items {
            let item = RequestedItem::try_from(item)?;
            if result.contains(&item) {
                log::debug!("ignoring duplicate item {}", item.identifier);
                continue;
            }
            result.push(item);
        }

        Ok(result)
    }
}

impl Default for CredentialItems {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<&str> for CredentialItems {
    fn from(identifier: &str) -> Self {
        Self::One(identifier.into())
    }
}

impl From<String> for CredentialItems {
    fn from(identifier: String) -> Self {
        Self::One(identifier.into())
    }
}

impl From<RequestedItem> for CredentialItems {
    fn from(item: RequestedItem) -> Self {
        Self::One(item.into())
    }
}

impl From<CredentialItem> for CredentialItems {
    fn from(item: CredentialItem) -> Self {
        Self::One(item)
    }
}

impl<T: Into<CredentialItem>> From<Vec<T>> for CredentialItems {
    fn from(items: Vec<T>) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<CredentialItem>, const N: usize> From<[T; N]> for CredentialItems {
    fn from(items: [T; N]) -> Self {
        Self::Many(items.into_iter().map(Into::into).collect())
    }
}

/// Request for the disclosure of claims and credentials.
///
/// Only obtained from [`ScopeRequestFactory::build`], or from
/// [`codec::decode`](crate::codec::decode) which runs the same checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRequest {
    version: String,
    #[serde(with = "rfc3339_millis")]
    timestamp: DateTime<Utc>,
    unique_id: String,
    requester_info: RequesterInfo,
    credential_items: Vec<RequestedItem>,
}

impl ScopeRequest {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn requester_info(&self) -> &RequesterInfo {
        &self.requester_info
    }

    pub fn credential_items(&self) -> &[RequestedItem] {
        &self.credential_items
    }

    /// Validates the constraints of `items`, failing on the first invalid
    /// one.
    pub fn validate_credential_items(items: &[RequestedItem]) -> Result<(), Error> {
        constraints::validate_credential_items(items)
    }
}

/// Request as read from a payload, not checked yet.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReceivedRequest {
    version: String,
    #[serde(with = "rfc3339_millis")]
    timestamp: DateTime<Utc>,
    unique_id: String,
    requester_info: ReceivedRequesterInfo,
    credential_items: Vec<RequestedItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceivedRequesterInfo {
    #[serde(default)]
    requester_id: Option<String>,
    #[serde(default)]
    app: AppConfig,
    #[serde(default)]
    channels: ChannelConfig,
}

impl ReceivedRequest {
    /// Applies the checks of [`ScopeRequestFactory::build`] that do not need
    /// a registry or a configuration.
    pub(crate) fn validate(self) -> Result<ScopeRequest, Error> {
        if self.version != SCOPE_REQUEST_VERSION {
            return Err(Error::UnsupportedVersion(self.version));
        }

        if self.unique_id.is_empty() {
            return Err(Error::MissingUniqueId);
        }

        for item in &self.credential_items {
            Identifier::parse(item.identifier())?;
        }

        let info = self.requester_info;
        let requester_info = RequesterInfo::received(info.requester_id, info.app, info.channels)?;

        Ok(ScopeRequest {
            version: self.version,
            timestamp: self.timestamp,
            unique_id: self.unique_id,
            requester_info,
            credential_items: self.credential_items,
        })
    }
}

/// Builds scope requests from a configuration snapshot and a schema
/// registry.
///
/// Both are shared, read-only, for the lifetime of the factory. To change
/// configuration, build a new factory with [`ScopeRequestFactory::with_config`].
#[derive(Clone)]
pub struct ScopeRequestFactory {
    config: Arc<Config>,
    registry: Arc<dyn SchemaRegistry>,
}

impl ScopeRequestFactory {
    pub fn new(config: Config, registry: impl SchemaRegistry + 'static) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    pub fn from_shared(config: Arc<Config>, registry: Arc<dyn SchemaRegistry>) -> Self {
        Self { config, registry }
    }

    /// Returns a factory with the same registry and another configuration.
    pub fn with_config(&self, config: Config) -> Self {
        Self {
            config: Arc::new(config),
            registry: self.registry.clone(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &dyn SchemaRegistry {
        self.registry.as_ref()
    }

    /// Builds a request with the default configuration.
    pub fn build(
        &self,
        unique_id: &str,
        items: impl Into<CredentialItems>,
    ) -> Result<ScopeRequest, Error> {
        self.build_with(unique_id, items, RequestOverrides::default())
    }

    /// Builds a request, replacing configuration sections with `overrides`.
    pub fn build_with(
        &self,
        unique_id: &str,
        items: impl Into<CredentialItems>,
        overrides: RequestOverrides,
    ) -> Result<ScopeRequest, Error> {
        if unique_id.is_empty() {
            return Err(Error::MissingUniqueId);
        }

        let credential_items = items.into().normalize()?;
        for item in &credential_items {
            if !self.registry.exists(item.identifier()) {
                return Err(Error::UnknownIdentifier(item.identifier().to_owned()));
            }
        }

        let requester_info = self.config.resolve(unique_id, overrides)?;

        log::debug!(
            "built scope request {unique_id} for {} with {} item(s)",
            requester_info.requester_id(),
            credential_items.len()
        );

        Ok(ScopeRequest {
            version: SCOPE_REQUEST_VERSION.to_owned(),
            timestamp: Utc::now().trunc_subsecs(3),
            unique_id: unique_id.to_owned(),
            requester_info,
            credential_items,
        })
    }
}

impl std::fmt::Debug for ScopeRequestFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeRequestFactory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Timestamps are serialized with millisecond precision so that a decoded
/// payload re-encodes to the same bytes.
mod rfc3339_millis {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
