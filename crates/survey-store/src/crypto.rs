//! Hashing and at-rest encryption helpers.
//!
//! Every function is total: decryption of malformed, legacy or tampered input
//! yields `None`, and encryption falls back to returning its input.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

/// Lowercase hex SHA-256 digest of `salt` followed by `secret`.
pub fn hash(secret: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Seals `plaintext` as `base64(nonce || ciphertext)`.
pub fn encrypt(plaintext: &str, key: &str) -> String {
    seal(plaintext, key).unwrap_or_else(|| plaintext.to_string())
}

pub fn decrypt(ciphertext: &str, key: &str) -> Option<String> {
    let sealed = STANDARD.decode(ciphertext.trim()).ok()?;
    if sealed.len() <= NONCE_LEN {
        return None;
    }
    let (nonce, body) = sealed.split_at(NONCE_LEN);
    let plain = cipher(key)?
        .decrypt(Nonce::from_slice(nonce), body)
        .ok()?;
    String::from_utf8(plain).ok()
}

pub fn encrypt_json<T: Serialize + ?Sized>(value: &T, key: &str) -> Option<String> {
    let raw = serde_json::to_string(value).ok()?;
    Some(encrypt(&raw, key))
}

pub fn decrypt_json<T: DeserializeOwned>(ciphertext: &str, key: &str) -> Option<T> {
    let raw = decrypt(ciphertext, key)?;
    serde_json::from_str(&raw).ok()
}

fn seal(plaintext: &str, key: &str) -> Option<String> {
    let cipher = cipher(key)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let body = cipher.encrypt(&nonce, plaintext.as_bytes()).ok()?;
    let mut sealed = Vec::with_capacity(NONCE_LEN + body.len());
    sealed.extend_from_slice(nonce.as_slice());
    sealed.extend_from_slice(&body);
    Some(STANDARD.encode(sealed))
}

fn cipher(key: &str) -> Option<Aes256Gcm> {
    let digest = Sha256::digest(key.as_bytes());
    Aes256Gcm::new_from_slice(digest.as_slice()).ok()
}
