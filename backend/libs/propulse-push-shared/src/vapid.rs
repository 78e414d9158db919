/// VAPID application-server identification (RFC 8292)
///
/// Each push request carries `Authorization: vapid t=<jwt>, k=<public key>`.
/// The JWT is ES256-signed with the application server's P-256 key and is
/// scoped to the push service origin (`aud`).
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use p256::{elliptic_curve::sec1::ToEncodedPoint, pkcs8::EncodePrivateKey, SecretKey};
use reqwest::Url;
use serde::Serialize;
use std::fmt;

use crate::errors::PushError;

/// Push services reject tokens valid for more than 24h
const VAPID_TOKEN_TTL_HOURS: i64 = 12;

#[derive(Debug, Serialize)]
struct VapidClaims<'a> {
    aud: String,
    exp: i64,
    sub: &'a str,
}

/// Signs VAPID tokens for outgoing push requests
#[derive(Clone)]
pub struct VapidSigner {
    encoding_key: EncodingKey,
    public_key: String,
    subject: String,
}

impl fmt::Debug for VapidSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VapidSigner")
            .field("public_key", &self.public_key)
            .field("subject", &self.subject)
            .field("encoding_key", &"[REDACTED]")
            .finish()
    }
}

impl VapidSigner {
    /// Build a signer from base64url VAPID keys, the format produced by the
    /// usual `generate-vapid-keys` tooling.
    ///
    /// # Arguments
    /// * `private_key` - 32-byte P-256 private scalar, base64url
    /// * `public_key` - optional 65-byte uncompressed public point, base64url; when
    ///   given it must match the private key
    /// * `subject` - contact URI, `mailto:` or `https:`
    pub fn from_base64(
        private_key: &str,
        public_key: Option<&str>,
        subject: &str,
    ) -> Result<Self, PushError> {
        let scalar = URL_SAFE_NO_PAD
            .decode(private_key.trim().trim_end_matches('='))
            .map_err(|e| PushError::InvalidVapidKey(format!("private key: {e}")))?;
        let secret = SecretKey::from_slice(&scalar)
            .map_err(|_| PushError::InvalidVapidKey("private key is not a P-256 scalar".into()))?;

        let derived_public =
            URL_SAFE_NO_PAD.encode(secret.public_key().to_encoded_point(false).as_bytes());
        if let Some(configured) = public_key {
            if configured.trim().trim_end_matches('=') != derived_public {
                return Err(PushError::InvalidVapidKey(
                    "public key does not match private key".into(),
                ));
            }
        }

        let der = secret
            .to_pkcs8_der()
            .map_err(|e| PushError::InvalidVapidKey(format!("PKCS#8 encoding: {e}")))?;
        let encoding_key = EncodingKey::from_ec_der(der.as_bytes());

        Ok(Self {
            encoding_key,
            public_key: derived_public,
            subject: normalize_subject(subject),
        })
    }

    /// Application server public key, as handed to `pushManager.subscribe()`
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// `Authorization` header value for a request to `endpoint`
    pub fn authorization_header(&self, endpoint: &str) -> Result<String, PushError> {
        let claims = VapidClaims {
            aud: audience(endpoint)?,
            exp: (Utc::now() + Duration::hours(VAPID_TOKEN_TTL_HOURS)).timestamp(),
            sub: &self.subject,
        };

        let token = encode(&Header::new(Algorithm::ES256), &claims, &self.encoding_key)
            .map_err(|e| PushError::JwtEncodeError(e.to_string()))?;

        Ok(format!("vapid t={token}, k={}", self.public_key))
    }
}

/// Origin of the push endpoint, used as the token audience
pub fn audience(endpoint: &str) -> Result<String, PushError> {
    let url = Url::parse(endpoint)
        .map_err(|e| PushError::InvalidSubscription(format!("endpoint: {e}")))?;

    match url.scheme() {
        "https" | "http" => Ok(url.origin().ascii_serialization()),
        other => Err(PushError::InvalidSubscription(format!(
            "endpoint scheme {other} is not supported"
        ))),
    }
}

fn normalize_subject(subject: &str) -> String {
    let subject = subject.trim();
    if subject.starts_with("mailto:") || subject.starts_with("https:") {
        subject.to_string()
    } else {
        format!("mailto:{subject}")
    }
}
