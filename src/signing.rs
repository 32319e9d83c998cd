//! Signing and verification of scope requests.
//!
//! A signed request travels as a [`SignedEnvelope`]:
//!
//! ```json
//! { "payload": "<canonical request>", "signature": "<hex DER>", "publicKey": "<hex SEC1>" }
//! ```
//!
//! Signatures are secp256k1 ECDSA over the SHA-256 digest of the payload.
use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::Error;
use crate::request::ScopeRequest;

/// Key able to sign request payloads.
pub trait RequestKey {
    /// Signs `payload`, returning the encoded signature.
    fn sign(&self, payload: &[u8]) -> Result<String, Error>;

    /// Encoded public key matching the signatures.
    fn public_key(&self) -> String;
}

/// secp256k1 private key.
#[derive(Clone)]
pub struct Secp256k1Key(SigningKey);

impl Secp256k1Key {
    /// Parses a hex encoded 32 bytes secret scalar.
    pub fn from_hex(private_key: &str) -> Result<Self, Error> {
        let bytes = hex::decode(private_key.trim())
            .map_err(|e| Error::SigningKey(format!("expected hex private key: {e}")))?;
        let key = SigningKey::from_slice(&bytes).map_err(|e| Error::SigningKey(e.to_string()))?;
        Ok(Self(key))
    }

    /// Generates a new random key.
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// Hex encoded secret scalar.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }
}

impl std::fmt::Debug for Secp256k1Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Secp256k1Key")
            .field(&self.public_key())
            .finish()
    }
}

impl RequestKey for Secp256k1Key {
    fn sign(&self, payload: &[u8]) -> Result<String, Error> {
        let signature: Signature = self
            .0
            .try_sign(payload)
            .map_err(|e| Error::SigningKey(e.to_string()))?;
        Ok(hex::encode(signature.to_der().as_bytes()))
    }

    fn public_key(&self) -> String {
        encode_public_key(self.0.verifying_key())
    }
}

fn encode_public_key(key: &VerifyingKey) -> String {
    hex::encode(key.to_encoded_point(false).as_bytes())
}

/// Parses a hex encoded SEC1 public key, compressed or not.
fn parse_public_key(public_key: &str) -> Result<VerifyingKey, Error> {
    let bytes =
        hex::decode(public_key.trim()).map_err(|e| Error::InvalidKeyFormat(e.to_string()))?;
    VerifyingKey::from_sec1_bytes(&bytes).map_err(|e| Error::InvalidKeyFormat(e.to_string()))
}

/// Signed request, as sent over the wire.
///
/// All fields are required for verification; they are optional here so that
/// incomplete envelopes can be received and rejected. Any other field is
/// rejected when parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SignedEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, alias = "xpub", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

impl SignedEnvelope {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes the payload of the envelope.
    ///
    /// This does not authenticate it: call [`verify`] first.
    pub fn request(&self) -> Result<ScopeRequest, Error> {
        codec::decode(
            self.payload
                .as_deref()
                .ok_or(Error::MalformedEnvelope("payload"))?,
        )
    }
}

/// Signs `request` with the key pair of its requester configuration.
///
/// The configured public key must be the one of the private key. It is put
/// in the envelope as configured, so it can be pinned as is.
pub fn sign(request: &ScopeRequest) -> Result<SignedEnvelope, Error> {
    let keys = request.requester_info().signing_keys();
    let private_key = keys
        .private_key
        .as_deref()
        .ok_or_else(|| Error::SigningKey("missing private key".to_owned()))?;
    let public_key = keys
        .public_key
        .as_deref()
        .ok_or_else(|| Error::SigningKey("missing public key".to_owned()))?;

    let key = Secp256k1Key::from_hex(private_key)?;
    let configured = parse_public_key(public_key)
        .map_err(|e| Error::SigningKey(format!("configured public key: {e}")))?;
    if &configured != key.0.verifying_key() {
        return Err(Error::SigningKey(
            "configured public key does not match the private key".to_owned(),
        ));
    }

    let mut envelope = sign_with(request, &key)?;
    envelope.public_key = Some(public_key.to_owned());
    Ok(envelope)
}

/// Signs `request` with `key`, for instance after a key rotation.
pub fn sign_with<K: RequestKey + ?Sized>(
    request: &ScopeRequest,
    key: &K,
) -> Result<SignedEnvelope, Error> {
    let payload = codec::encode(request)?;
    let signature = key.sign(payload.as_bytes())?;
    log::debug!("signed scope request {}", request.unique_id());

    Ok(SignedEnvelope {
        payload: Some(payload),
        signature: Some(signature),
        public_key: Some(key.public_key()),
    })
}

/// Authenticates `envelope`, optionally against a pinned public key.
///
/// Returns `Ok(true)` on success; every failure is an error.
pub fn verify(envelope: &SignedEnvelope, pinned_public_key: Option<&str>) -> Result<bool, Error> {
    let payload = envelope
        .payload
        .as_deref()
        .ok_or(Error::MalformedEnvelope("payload"))?;
    let signature = envelope
        .signature
        .as_deref()
        .ok_or(Error::MalformedEnvelope("signature"))?;
    let public_key = envelope
        .public_key
        .as_deref()
        .ok_or(Error::MalformedEnvelope("public key"))?;

    if let Some(pinned) = pinned_public_key {
        if pinned != public_key {
            return Err(Error::KeyMismatch);
        }
    }

    let verifying_key = parse_public_key(public_key)?;

    let bytes = hex::decode(signature).map_err(|_| Error::SignatureInvalid)?;
    let sig = Signature::from_der(&bytes).map_err(|_| Error::SignatureInvalid)?;
    let sig = match sig.normalize_s() {
        Some(normalized) => {
            log::warn!("non-normalized secp256k1 signature");
            normalized
        }
        None => sig,
    };

    verifying_key
        .verify(payload.as_bytes(), &sig)
        .map_err(|_| Error::SignatureInvalid)?;

    log::debug!("verified envelope signed by {public_key}");
    Ok(true)
}

impl ScopeRequest {
    /// Signs this request. See [`sign`].
    pub fn sign(&self) -> Result<SignedEnvelope, Error> {
        sign(self)
    }
}
