#![allow(dead_code)]
use serde_json::{json, Value};
use ssi_scope_request::{Config, CredentialItems, ScopeRequestFactory, StaticSchemaRegistry};

pub const PUBLIC_KEY: &str = "04378df3e480e626541daec66c4bbad532430d28e1ecb6b70a03313fc07fbad5c0d8b26410eac8f0b1a448898cbed9d714fd9cab2a8d1a7885bfbb48bd673da03c";
pub const PRIVATE_KEY: &str = "f728fed0153f3b46a0fccdd9ed9954ad56fd4e8af016fe59075655aa9feb9a59";
pub const ISSUER: &str = "did:ethr:0xf3beac30c498d9e26865f34fcaa57dbb935b0d74";

pub fn config() -> Config {
    Config::from_value(json!({
        "partner": {
            "id": "TestPartnerId",
            "signingKeys": { "xpub": PUBLIC_KEY, "xprv": PRIVATE_KEY }
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
            "basePayloadURL": "https://localhost/sr/payload"
        }
    }))
    .unwrap()
}

pub fn registry() -> StaticSchemaRegistry {
    StaticSchemaRegistry::from_json_str(
        r#"{
            "credential-cvc:Identity-v1": ["name", "email", "dateOfBirth"],
            "credential-cvc:IDVaaS-v1": ["name", "document"],
            "claim-cvc:Identity:name-1": ["first", "middle", "last"],
            "claim-cvc:Random:node-1": []
        }"#,
    )
    .unwrap()
}

pub fn factory() -> ScopeRequestFactory {
    ScopeRequestFactory::new(config(), registry())
}

pub fn items(value: Value) -> CredentialItems {
    serde_json::from_value(value).unwrap()
}

/// Identity credential with issuer, validity window and one claim constraint.
pub fn constrained_identity(claims: Value) -> CredentialItems {
    items(json!([{
        "identifier": "credential-cvc:Identity-v1",
        "constraints": {
            "meta": {
                "issuer": { "is": { "$eq": ISSUER } },
                "issued": { "is": { "$lt": 15999999 } },
                "expiry": { "is": { "$gt": 19999999 } }
            },
            "claims": claims
        }
    }]))
}
