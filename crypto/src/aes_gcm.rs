//! Low-level AES-256-GCM primitive. Stateless with respect to key storage —
//! callers own the key's lifetime. See [`crate::envelope`] for the component
//! that holds a key-encryption key and calls into this module.

use crate::error::CryptoError;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

/// Encrypts `plaintext` under `key` with the given 12-byte `nonce`, returning
/// ciphertext with the GCM tag appended.
pub fn encrypt_raw(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::AuthFailure)
}

/// Decrypts `ciphertext` (tag appended) under `key` and `nonce`. Fails with
/// [`CryptoError::AuthFailure`] on any tag mismatch or corruption.
pub fn decrypt_raw(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::InvalidKey)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthFailure)
}

/// Generates a fresh random 12-byte nonce. Callers must use a new nonce per
/// seal under the same key; GCM is not nonce-misuse resistant.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Generates a cryptographically secure random 32-byte key.
pub fn generate_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let key = generate_key();
        let nonce = generate_nonce();
        let ciphertext = encrypt_raw(&key, &nonce, b"hello").unwrap();
        let plaintext = decrypt_raw(&key, &nonce, &ciphertext).unwrap();
        assert_eq!(plaintext, b"hello");
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = generate_key();
        let nonce = generate_nonce();
        let mut ciphertext = encrypt_raw(&key, &nonce, b"hello").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;
        assert!(decrypt_raw(&key, &nonce, &ciphertext).is_err());
    }

    #[test]
    fn wrong_nonce_fails() {
        let key = generate_key();
        let nonce = generate_nonce();
        let ciphertext = encrypt_raw(&key, &nonce, b"hello").unwrap();
        let other_nonce = generate_nonce();
        assert!(decrypt_raw(&key, &other_nonce, &ciphertext).is_err());
    }
}
