//! Requester configuration.
//!
//! A [`Config`] holds the defaults shared by every request a partner builds:
//! partner identity and signing keys, app branding, and the base URLs of the
//! channels the holder answers on. Each request may override whole sections
//! through [`RequestOverrides`]; the merged result is validated into a
//! [`RequesterInfo`].
use iref::UriBuf;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<PartnerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<AppConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<ChannelDefaults>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_keys: Option<SigningKeys>,
}

/// Partner key pair, hex encoded.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningKeys {
    #[serde(default, alias = "xpub", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, alias = "xprv", skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeys")
            .field("public_key", &self.public_key)
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// App branding shown to the holder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
}

/// Base channel URLs. Request channels are `<base>/<uniqueId>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDefaults {
    #[serde(
        rename = "baseEventsURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub base_events_url: Option<String>,
    #[serde(
        rename = "basePayloadURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub base_payload_url: Option<String>,
}

/// Channel URLs of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(rename = "eventsURL", default, skip_serializing_if = "Option::is_none")]
    pub events_url: Option<String>,
    #[serde(rename = "payloadURL", default, skip_serializing_if = "Option::is_none")]
    pub payload_url: Option<String>,
}

/// Per-request configuration overrides.
///
/// A supplied section replaces the default section as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOverrides {
    pub channels: Option<ChannelConfig>,
    pub app: Option<AppConfig>,
    pub partner: Option<PartnerConfig>,
}

impl RequestOverrides {
    pub fn channels(mut self, channels: ChannelConfig) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn app(mut self, app: AppConfig) -> Self {
        self.app = Some(app);
        self
    }

    pub fn partner(mut self, partner: PartnerConfig) -> Self {
        self.partner = Some(partner);
        self
    }
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, Error> {
        Ok(serde_json::from_value(value)?)
    }

    fn default_channels(&self, unique_id: &str) -> ChannelConfig {
        let join = |base: &Option<String>| {
            base.as_deref()
                .map(|base| format!("{}/{}", base.trim_end_matches('/'), unique_id))
        };

        match &self.channels {
            Some(defaults) => ChannelConfig {
                events_url: join(&defaults.base_events_url),
                payload_url: join(&defaults.base_payload_url),
            },
            None => ChannelConfig::default(),
        }
    }

    /// Merges `overrides` onto this configuration and validates the result.
    ///
    /// Fields are checked in a fixed order and the first missing or invalid
    /// one is reported.
    pub fn resolve(
        &self,
        unique_id: &str,
        overrides: RequestOverrides,
    ) -> Result<RequesterInfo, Error> {
        let channels = overrides
            .channels
            .unwrap_or_else(|| self.default_channels(unique_id));
        let app = overrides
            .app
            .or_else(|| self.app.clone())
            .unwrap_or_default();
        let partner = overrides
            .partner
            .or_else(|| self.partner.clone())
            .unwrap_or_default();

        let channels = channels.validate()?;
        let app = app.validate()?;

        let requester_id = required(partner.id, "partner.id")?;
        let signing_keys = match partner.signing_keys {
            Some(SigningKeys {
                public_key: Some(public_key),
                private_key: Some(private_key),
            }) if !public_key.is_empty() && !private_key.is_empty() => SigningKeys {
                public_key: Some(public_key),
                private_key: Some(private_key),
            },
            _ => return Err(Error::ConfigIncomplete("partner.signingKeys")),
        };

        Ok(RequesterInfo {
            requester_id,
            app,
            channels,
            signing_keys,
        })
    }
}

impl ChannelConfig {
    fn validate(self) -> Result<Channels, Error> {
        Ok(Channels {
            events_url: https_url(self.events_url, "eventsURL")?,
            payload_url: https_url(self.payload_url, "payloadURL")?,
        })
    }
}

impl AppConfig {
    fn validate(self) -> Result<App, Error> {
        Ok(App {
            id: required(self.id, "app.id")?,
            name: required(self.name, "app.name")?,
            logo: https_url(self.logo, "app.logo")?,
            description: required(self.description, "app.description")?,
            primary_color: required(self.primary_color, "app.primaryColor")?,
            secondary_color: required(self.secondary_color, "app.secondaryColor")?,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, Error> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::ConfigIncomplete(field)),
    }
}

fn https_url(value: Option<String>, field: &'static str) -> Result<String, Error> {
    let value = required(value, field)?;
    match UriBuf::new(value.into_bytes()) {
        Ok(uri) if uri.scheme().as_str().eq_ignore_ascii_case("https") => {
            Ok(uri.as_str().to_owned())
        }
        _ => Err(Error::InsecureScheme(field)),
    }
}

/// Validated requester identity, branding and channels of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterInfo {
    pub(crate) requester_id: String,
    pub(crate) app: App,
    pub(crate) channels: Channels,
    /// Never part of a payload.
    #[serde(skip)]
    pub(crate) signing_keys: SigningKeys,
}

impl RequesterInfo {
    /// Requester info read back from a payload. It goes through the same
    /// checks as a configured one, and carries no key material.
    pub(crate) fn received(
        requester_id: Option<String>,
        app: AppConfig,
        channels: ChannelConfig,
    ) -> Result<Self, Error> {
        let channels = channels.validate()?;
        let app = app.validate()?;
        let requester_id = required(requester_id, "requesterId")?;

        Ok(Self {
            requester_id,
            app,
            channels,
            signing_keys: SigningKeys::default(),
        })
    }

    pub fn requester_id(&self) -> &str {
        &self.requester_id
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn signing_keys(&self) -> &SigningKeys {
        &self.signing_keys
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub description: String,
    pub primary_color: String,
    pub secondary_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channels {
    #[serde(rename = "eventsURL")]
    pub events_url: String,
    #[serde(rename = "payloadURL")]
    pub payload_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        Config::from_value(json!({
            "partner": {
                "id": "TestPartnerId",
                "signingKeys": { "xpub": "04aa", "xprv": "f7bb" }
            },
            "app": {
                "id": "TestPartnerApp",
                "name": "TestPartnerApp",
                "logo": "https://s-media-cache-ak0.pinimg.com/originals.png",
                "description": "TestPartnerApp",
                "primaryColor": "A80B00",
                "secondaryColor": "FFFFFF"
            },
            "channels": {
                "baseEventsURL": "https://localhost/sr/events",
                "basePayloadURL": "https://localhost/sr/payload/"
            }
        }))
        .unwrap()
    }

    fn https_channels() -> ChannelConfig {
        ChannelConfig {
            events_url: Some("https://localhost/".into()),
            payload_url: Some("https://localhost/".into()),
        }
    }

    fn expect_err(result: Result<RequesterInfo, Error>) -> Error {
        match result {
            Ok(info) => panic!("unexpected success {info:?}"),
            Err(e) => e,
        }
    }

    #[test]
    fn defaults_resolve() {
        let info = config().resolve("abcd", RequestOverrides::default()).unwrap();
        assert_eq!(info.requester_id(), "TestPartnerId");
        assert_eq!(info.channels().events_url, "https://localhost/sr/events/abcd");
        assert_eq!(info.channels().payload_url, "https://localhost/sr/payload/abcd");
        assert_eq!(info.app().primary_color, "A80B00");
        assert_eq!(info.signing_keys().public_key.as_deref(), Some("04aa"));
    }

    #[test]
    fn empty_channel_override_replaces_defaults() {
        let e = expect_err(config().resolve(
            "abcd",
            RequestOverrides::default().channels(ChannelConfig::default()),
        ));
        assert!(matches!(e, Error::ConfigIncomplete("eventsURL")));
        assert_eq!(e.to_string(), "eventsURL is required");
    }

    #[test]
    fn channels_must_be_https() {
        let e = expect_err(config().resolve(
            "abcd",
            RequestOverrides::default().channels(ChannelConfig {
                events_url: Some("http://localhost/".into()),
                payload_url: None,
            }),
        ));
        assert_eq!(e.to_string(), "only HTTPS is supported for eventsURL");

        let e = expect_err(config().resolve(
            "abcd",
            RequestOverrides::default().channels(ChannelConfig {
                events_url: Some("https://localhost/".into()),
                payload_url: Some("http://localhost/".into()),
            }),
        ));
        assert_eq!(e.to_string(), "only HTTPS is supported for payloadURL");
    }

    #[test]
    fn relative_url_is_not_https() {
        let e = expect_err(config().resolve(
            "abcd",
            RequestOverrides::default().channels(ChannelConfig {
                events_url: Some("localhost/events".into()),
                payload_url: Some("https://localhost/".into()),
            }),
        ));
        assert!(matches!(e, Error::InsecureScheme("eventsURL")));
    }

    #[test]
    fn app_fields_checked_in_order() {
        let cases: [(AppConfig, &str); 7] = [
            (AppConfig::default(), "app.id is required"),
            (
                AppConfig {
                    id: Some("test".into()),
                    ..Default::default()
                },
                "app.name is required",
            ),
            (
                AppConfig {
                    id: Some("test".into()),
                    name: Some("test".into()),
                    ..Default::default()
                },
                "app.logo is required",
            ),
            (
                AppConfig {
                    id: Some("test".into()),
                    name: Some("test".into()),
                    logo: Some("http://localhost/".into()),
                    ..Default::default()
                },
                "only HTTPS is supported for app.logo",
            ),
            (
                AppConfig {
                    id: Some("test".into()),
                    name: Some("test".into()),
                    logo: Some("https://localhost/".into()),
                    primary_color: Some("FFF".into()),
                    ..Default::default()
                },
                "app.description is required",
            ),
            (
                AppConfig {
                    id: Some("test".into()),
                    name: Some("test".into()),
                    logo: Some("https://localhost/".into()),
                    description: Some("test".into()),
                    ..Default::default()
                },
                "app.primaryColor is required",
            ),
            (
                AppConfig {
                    id: Some("test".into()),
                    name: Some("test".into()),
                    logo: Some("https://localhost/".into()),
                    description: Some("test".into()),
                    primary_color: Some("FFF".into()),
                    ..Default::default()
                },
                "app.secondaryColor is required",
            ),
        ];

        for (app, message) in cases {
            let e = expect_err(config().resolve(
                "abcd",
                RequestOverrides::default()
                    .channels(https_channels())
                    .app(app),
            ));
            assert_eq!(e.to_string(), message);
        }
    }

    #[test]
    fn partner_checked_last() {
        let app = config().app.unwrap();

        let e = expect_err(config().resolve(
            "abcd",
            RequestOverrides::default()
                .channels(https_channels())
                .app(app.clone())
                .partner(PartnerConfig::default()),
        ));
        assert_eq!(e.to_string(), "partner.id is required");

        let e = expect_err(config().resolve(
            "abcd",
            RequestOverrides::default()
                .channels(https_channels())
                .app(app.clone())
                .partner(PartnerConfig {
                    id: Some("test".into()),
                    signing_keys: Some(SigningKeys {
                        public_key: Some("test".into()),
                        private_key: None,
                    }),
                }),
        ));
        assert!(matches!(e, Error::ConfigIncomplete("partner.signingKeys")));

        let info = config()
            .resolve(
                "abcd",
                RequestOverrides::default()
                    .channels(https_channels())
                    .app(app)
                    .partner(PartnerConfig {
                        id: Some("test".into()),
                        signing_keys: Some(SigningKeys {
                            public_key: Some("test".into()),
                            private_key: Some("test".into()),
                        }),
                    }),
            )
            .unwrap();
        assert_eq!(info.requester_id(), "test");
    }

    #[test]
    fn missing_sections() {
        let e = expect_err(Config::default().resolve("abcd", RequestOverrides::default()));
        assert!(matches!(e, Error::ConfigIncomplete("eventsURL")));
    }

    #[test]
    fn private_key_is_not_serialized_or_printed() {
        let info = config().resolve("abcd", RequestOverrides::default()).unwrap();
        let value = serde_json::to_value(&info).unwrap();
        assert!(value.get("signingKeys").is_none());
        assert!(!format!("{info:?}").contains("f7bb"));
    }
}
