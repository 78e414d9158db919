/// Message encryption for Web Push (RFC 8291, `aes128gcm` content coding)
///
/// Every message uses a fresh ephemeral P-256 key and a random salt. The
/// output is a single record: the RFC 8188 header (salt, record size, key id)
/// followed by the AES-128-GCM ciphertext.
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes128Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hkdf::Hkdf;
use p256::{ecdh::EphemeralSecret, elliptic_curve::sec1::ToEncodedPoint, PublicKey};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use crate::errors::PushError;

/// Record size advertised in the header; the whole message is one record
pub const RECORD_SIZE: u32 = 4096;

const AUTH_SECRET_LEN: usize = 16;
const SALT_LEN: usize = 16;
const TAG_LEN: usize = 16;
/// Delimiter octet that terminates the last (and only) record
const LAST_RECORD_DELIMITER: u8 = 0x02;

/// Largest payload that still fits in one record
pub const MAX_PAYLOAD_LEN: usize = RECORD_SIZE as usize - TAG_LEN - 1;

/// Encrypt `payload` for a subscriber identified by its `p256dh` and `auth` keys
pub fn encrypt(payload: &[u8], p256dh: &str, auth: &str) -> Result<Vec<u8>, PushError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(PushError::PayloadTooLarge(payload.len()));
    }

    let ua_public_bytes = decode_key(p256dh, "p256dh")?;
    let auth_secret = decode_key(auth, "auth")?;
    if auth_secret.len() != AUTH_SECRET_LEN {
        return Err(PushError::InvalidSubscription(format!(
            "auth secret must be {AUTH_SECRET_LEN} bytes, got {}",
            auth_secret.len()
        )));
    }

    let ua_public = PublicKey::from_sec1_bytes(&ua_public_bytes)
        .map_err(|_| PushError::InvalidSubscription("p256dh is not a P-256 point".into()))?;

    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let as_public = ephemeral.public_key().to_encoded_point(false);
    let ua_public_point = ua_public.to_encoded_point(false);
    let shared = ephemeral.diffie_hellman(&ua_public);

    let ikm = derive_ikm(
        shared.raw_secret_bytes().as_slice(),
        &auth_secret,
        ua_public_point.as_bytes(),
        as_public.as_bytes(),
    )?;

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let (cek, nonce) = derive_content_keys(&ikm, &salt)?;

    let mut plaintext = Vec::with_capacity(payload.len() + 1);
    plaintext.extend_from_slice(payload);
    plaintext.push(LAST_RECORD_DELIMITER);

    let cipher = Aes128Gcm::new_from_slice(&cek)
        .map_err(|_| PushError::Encryption("invalid content encryption key".into()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
        .map_err(|_| PushError::Encryption("AES-GCM encryption failed".into()))?;

    let key_id = as_public.as_bytes();
    let mut body = Vec::with_capacity(SALT_LEN + 4 + 1 + key_id.len() + ciphertext.len());
    body.extend_from_slice(&salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(key_id.len() as u8);
    body.extend_from_slice(key_id);
    body.extend_from_slice(&ciphertext);

    Ok(body)
}

/// Input keying material from the ECDH secret and the subscriber's auth secret
pub(crate) fn derive_ikm(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    ua_public: &[u8],
    as_public: &[u8],
) -> Result<[u8; 32], PushError> {
    let mut key_info = Vec::with_capacity(14 + ua_public.len() + as_public.len());
    key_info.extend_from_slice(b"WebPush: info\0");
    key_info.extend_from_slice(ua_public);
    key_info.extend_from_slice(as_public);

    let mut ikm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(auth_secret), ecdh_secret)
        .expand(&key_info, &mut ikm)
        .map_err(|_| PushError::Encryption("IKM expansion failed".into()))?;
    Ok(ikm)
}

/// Content encryption key and nonce for a record
pub(crate) fn derive_content_keys(
    ikm: &[u8],
    salt: &[u8],
) -> Result<([u8; 16], [u8; 12]), PushError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);

    let mut cek = [0u8; 16];
    hk.expand(b"Content-Encoding: aes128gcm\0", &mut cek)
        .map_err(|_| PushError::Encryption("CEK expansion failed".into()))?;

    let mut nonce = [0u8; 12];
    hk.expand(b"Content-Encoding: nonce\0", &mut nonce)
        .map_err(|_| PushError::Encryption("nonce expansion failed".into()))?;

    Ok((cek, nonce))
}

/// Decode a base64url key, tolerating trailing padding
pub(crate) fn decode_key(value: &str, name: &str) -> Result<Vec<u8>, PushError> {
    URL_SAFE_NO_PAD
        .decode(value.trim().trim_end_matches('='))
        .map_err(|e| PushError::InvalidSubscription(format!("{name} is not base64url: {e}")))
}
