use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use zeroize::{Zeroize, Zeroizing};

const NONCE_LEN: usize = 12;

/// A single symmetric key used to seal and open token payloads. The handler
/// always holds two of these (`current`, `old`); this type only knows how to
/// encrypt and decrypt, not about rotation. The raw key bytes are kept
/// alongside the constructed cipher in a `Zeroizing` buffer so replacing a
/// key (`secure_clear`) actually scrubs the old bytes instead of just
/// dropping them.
pub struct TokenKey {
    #[allow(dead_code)]
    key_bytes: Zeroizing<Vec<u8>>,
    cipher: Aes256Gcm,
}

impl TokenKey {
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        let key_bytes = Zeroizing::new(key.to_vec());
        Self {
            cipher: Aes256Gcm::new(&key),
            key_bytes,
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .expect("AES-GCM encryption does not fail for bounded plaintexts");
        let mut out = nonce.to_vec();
        out.append(&mut ciphertext);
        out
    }

    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, DecryptError> {
        if sealed.len() < NONCE_LEN {
            return Err(DecryptError);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| DecryptError)
    }

    /// Overwrites the in-memory key material with a freshly generated key so
    /// the original key bytes do not linger in the process heap.
    pub fn secure_clear(&mut self) {
        self.key_bytes.zeroize();
        *self = Self::generate();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DecryptError;

impl std::fmt::Display for DecryptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("failed to decrypt token")
    }
}

impl std::error::Error for DecryptError {}

#[allow(dead_code)]
type KeyBytes = Key<Aes256Gcm>;
