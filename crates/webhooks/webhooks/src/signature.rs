//! HMAC signature generation and verification.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::secrets::WebhookSecret;

type HmacSha256 = Hmac<Sha256>;

/// How the digest is written in the signature header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureEncoding {
    /// Lowercase hexadecimal.
    #[default]
    Hex,
    /// Standard, padded base64.
    Base64,
}

/// Which bytes are covered by the MAC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignedContent {
    /// The raw request body.
    #[default]
    Body,
    /// `"{timestamp}.{body}"`, using the raw timestamp header value.
    TimestampDotBody,
}

/// The platform's signing contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureScheme {
    pub content: SignedContent,
    pub encoding: SignatureEncoding,
}

impl SignatureScheme {
    /// Scheme used by Ghala: base64 HMAC over `"{timestamp}.{body}"`.
    pub fn ghala() -> Self {
        Self {
            content: SignedContent::TimestampDotBody,
            encoding: SignatureEncoding::Base64,
        }
    }
}

/// Webhook signer for generating and verifying signatures.
#[derive(Debug, Clone)]
pub struct WebhookSigner {
    secret: WebhookSecret,
    scheme: SignatureScheme,
}

impl WebhookSigner {
    /// Creates a signer using the default scheme (hex over the body).
    pub fn new(secret: WebhookSecret) -> Self {
        Self::with_scheme(secret, SignatureScheme::default())
    }

    /// Creates a signer with a specific scheme.
    pub fn with_scheme(secret: WebhookSecret, scheme: SignatureScheme) -> Self {
        Self { secret, scheme }
    }

    /// Returns the signing scheme.
    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    /// Generates a signature for the given body.
    ///
    /// `timestamp` is the raw timestamp header value; it is only part of the
    /// signed content for [`SignedContent::TimestampDotBody`].
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        let digest = self.mac(Some(timestamp), body).finalize().into_bytes();

        match self.scheme.encoding {
            SignatureEncoding::Hex => hex::encode(digest),
            SignatureEncoding::Base64 => BASE64.encode(digest),
        }
    }

    /// Verifies a provided signature against the body.
    ///
    /// Returns `false` for any mismatch, including an undecodable signature or
    /// a missing timestamp when the scheme signs it.
    pub fn verify(&self, provided: &str, timestamp: Option<&str>, body: &[u8]) -> bool {
        if self.scheme.content == SignedContent::TimestampDotBody && timestamp.is_none() {
            return false;
        }

        let Some(expected) = decode_signature(provided, self.scheme.encoding) else {
            return false;
        };

        // verify_slice compares in constant time over the full digest.
        self.mac(timestamp, body).verify_slice(&expected).is_ok()
    }

    fn mac(&self, timestamp: Option<&str>, body: &[u8]) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.expose()).expect("HMAC can take key of any size");

        if let (SignedContent::TimestampDotBody, Some(timestamp)) = (self.scheme.content, timestamp) {
            mac.update(timestamp.as_bytes());
            mac.update(b".");
        }
        mac.update(body);

        mac
    }
}

/// Verifies a hex HMAC-SHA256 of the raw body.
pub fn verify(secret: &WebhookSecret, raw_body: &[u8], provided_signature: &str) -> bool {
    WebhookSigner::new(secret.clone()).verify(provided_signature, None, raw_body)
}

/// Decodes a signature header value, tolerating a `sha256=` prefix.
fn decode_signature(provided: &str, encoding: SignatureEncoding) -> Option<Vec<u8>> {
    let provided = provided.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    if provided.is_empty() {
        return None;
    }

    match encoding {
        SignatureEncoding::Hex => hex::decode(provided).ok(),
        SignatureEncoding::Base64 => BASE64.decode(provided).ok(),
    }
}
