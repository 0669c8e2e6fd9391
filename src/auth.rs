//! Password hashing for `requirepass`.
//!
//! A hashed credential is `base64(salt || pbkdf2_hmac_sha256(password, salt))`. Stored values that
//! do not decode to that shape are treated as plaintext passwords.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
const ROUNDS: u32 = 100_000;

pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut encoded = Vec::with_capacity(SALT_LEN + HASH_LEN);
    encoded.extend_from_slice(&salt);
    encoded.extend_from_slice(&derive(password, &salt));

    STANDARD.encode(encoded)
}

/// Checks `input` against a stored credential, hashed or plaintext.
pub fn verify_password(input: &str, stored: &str) -> bool {
    match decode_hash(stored) {
        Some((salt, expected)) => bool::from(derive(input, &salt)[..].ct_eq(&expected[..])),
        None => bool::from(input.as_bytes().ct_eq(stored.as_bytes())),
    }
}

pub fn is_hashed(stored: &str) -> bool {
    decode_hash(stored).is_some()
}

fn derive(password: &str, salt: &[u8]) -> [u8; HASH_LEN] {
    let mut hash = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, ROUNDS, &mut hash);
    hash
}

fn decode_hash(stored: &str) -> Option<([u8; SALT_LEN], [u8; HASH_LEN])> {
    let decoded = STANDARD.decode(stored).ok()?;
    if decoded.len() != SALT_LEN + HASH_LEN {
        return None;
    }

    let (salt, hash) = decoded.split_at(SALT_LEN);
    Some((salt.try_into().ok()?, hash.try_into().ok()?))
}
