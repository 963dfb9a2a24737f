//! Symmetric envelope (component A): authenticated encryption of private
//! key material under a process-wide key-encryption key. This is the only
//! component permitted to hold the KEK in memory.

use crate::aes_gcm::{self, KEY_LEN, NONCE_LEN};
use crate::error::CryptoError;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Holds a 32-byte key-encryption key for the lifetime of the process.
#[derive(ZeroizeOnDrop)]
pub struct Envelope {
    kek: [u8; KEY_LEN],
}

impl Envelope {
    /// Builds an envelope from a KEK of exactly 32 bytes.
    pub fn new(kek: &[u8]) -> Result<Self, CryptoError> {
        if kek.len() != KEY_LEN {
            return Err(CryptoError::KeyLength {
                expected: KEY_LEN,
                got: kek.len(),
            });
        }
        let mut buf = [0u8; KEY_LEN];
        buf.copy_from_slice(kek);
        Ok(Self { kek: buf })
    }

    /// Seals `plaintext` under the KEK with a fresh random 12-byte nonce.
    /// Returns `(ciphertext, nonce)`.
    pub fn seal(&self, plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), CryptoError> {
        let nonce = aes_gcm::generate_nonce();
        let ciphertext = aes_gcm::encrypt_raw(&self.kek, &nonce, plaintext)?;
        Ok((ciphertext, nonce))
    }

    /// Opens `ciphertext` previously produced by [`Envelope::seal`]. Fails
    /// with [`CryptoError::NonceLength`] if `nonce` is not 12 bytes and
    /// [`CryptoError::AuthFailure`] on any tag mismatch.
    pub fn open(&self, ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if nonce.len() != NONCE_LEN {
            return Err(CryptoError::NonceLength {
                expected: NONCE_LEN,
                got: nonce.len(),
            });
        }
        let mut nonce_buf = [0u8; NONCE_LEN];
        nonce_buf.copy_from_slice(nonce);
        aes_gcm::decrypt_raw(&self.kek, &nonce_buf, ciphertext)
    }
}

impl Zeroize for Envelope {
    fn zeroize(&mut self) {
        self.kek.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aes_gcm;

    #[test]
    fn seal_open_roundtrip() {
        let kek = aes_gcm::generate_key();
        let envelope = Envelope::new(&kek).unwrap();
        let (ciphertext, nonce) = envelope.seal(b"a p-384 private key, json encoded").unwrap();
        let plaintext = envelope.open(&ciphertext, &nonce).unwrap();
        assert_eq!(plaintext, b"a p-384 private key, json encoded");
    }

    #[test]
    fn rejects_short_key() {
        let short = [0u8; 16];
        assert!(matches!(
            Envelope::new(&short),
            Err(CryptoError::KeyLength { expected: 32, got: 16 })
        ));
    }

    #[test]
    fn rejects_short_nonce() {
        let kek = aes_gcm::generate_key();
        let envelope = Envelope::new(&kek).unwrap();
        let (ciphertext, _) = envelope.seal(b"data").unwrap();
        assert!(matches!(
            envelope.open(&ciphertext, &[0u8; 4]),
            Err(CryptoError::NonceLength { expected: 12, got: 4 })
        ));
    }

    #[test]
    fn rejects_tampered_nonce() {
        let kek = aes_gcm::generate_key();
        let envelope = Envelope::new(&kek).unwrap();
        let (ciphertext, mut nonce) = envelope.seal(b"data").unwrap();
        nonce[0] ^= 0xFF;
        assert!(matches!(envelope.open(&ciphertext, &nonce), Err(CryptoError::AuthFailure)));
    }

    #[test]
    fn different_seals_use_different_nonces() {
        let kek = aes_gcm::generate_key();
        let envelope = Envelope::new(&kek).unwrap();
        let (_, nonce1) = envelope.seal(b"same plaintext").unwrap();
        let (_, nonce2) = envelope.seal(b"same plaintext").unwrap();
        assert_ne!(nonce1, nonce2);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// For any plaintext and any 32-byte key, `open(seal(p, k), k) == p`.
        #[test]
        fn seal_open_roundtrips_for_any_plaintext_and_key(
            plaintext in proptest::collection::vec(any::<u8>(), 0..512),
            kek in proptest::collection::vec(any::<u8>(), 32..=32),
        ) {
            let envelope = Envelope::new(&kek).unwrap();
            let (ciphertext, nonce) = envelope.seal(&plaintext).unwrap();
            let recovered = envelope.open(&ciphertext, &nonce).unwrap();
            prop_assert_eq!(recovered, plaintext);
        }

        /// A 32-byte key is the only length `Envelope::new` accepts.
        #[test]
        fn rejects_any_non_32_byte_key(len in (0usize..64).prop_filter("not 32", |n| *n != 32)) {
            let key = vec![0u8; len];
            prop_assert!(matches!(Envelope::new(&key), Err(CryptoError::KeyLength { expected: 32, got }) if got == len));
        }
    }
}
