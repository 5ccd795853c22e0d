use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use authd_core::model::{TokenType, ValidationResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::clock::MonotonicClock;
use crate::key::TokenKey;
use crate::payload::TokenData;

/// Read-only view the token handler needs of the settings store: how long a
/// key generation stays `current` before rotating. Kept as a narrow trait so
/// this crate never depends on `authd-config`.
pub trait KeyRotationPolicy: Send + Sync {
    fn refresh_token_lifetime_s(&self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateError {
    LifetimeOverflow,
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("token lifetime would overflow the expiration timestamp")
    }
}

impl std::error::Error for GenerateError {}

struct KeyState {
    current: TokenKey,
    old: TokenKey,
    key_expiration: u64,
}

/// Builds, validates, and revokes opaque encrypted tokens. Owns the
/// symmetric key pair (`current`/`old`) and the in-memory revocation
/// blacklist; both are behind their own locks per the fine-grained
/// concurrency model.
pub struct TokenHandler {
    clock: MonotonicClock,
    keys: Mutex<KeyState>,
    blacklist: RwLock<HashMap<String, u64>>,
    policy: Box<dyn KeyRotationPolicy>,
}

impl TokenHandler {
    pub fn new(policy: Box<dyn KeyRotationPolicy>) -> Self {
        let clock = MonotonicClock::new();
        let key_expiration = clock.now_seconds() + policy.refresh_token_lifetime_s() as u64;
        Self {
            clock,
            keys: Mutex::new(KeyState {
                current: TokenKey::generate(),
                old: TokenKey::generate(),
                key_expiration,
            }),
            blacklist: RwLock::new(HashMap::new()),
            policy,
        }
    }

    fn rotate_keys_if_needed(&self) {
        let now = self.clock.now_seconds();
        let mut keys = self.keys.lock().unwrap();
        if now > keys.key_expiration {
            let rotated_out = std::mem::replace(&mut keys.current, TokenKey::generate());
            keys.old = rotated_out;
            keys.key_expiration = now + self.policy.refresh_token_lifetime_s() as u64;
        }
    }

    pub fn generate_auth_code(
        &self,
        lifetime_s: u32,
        client_id: &str,
        scopes: &str,
        user_name: &str,
        code_challenge: &str,
    ) -> Result<String, GenerateError> {
        self.generate_token(
            TokenType::AuthCode,
            lifetime_s,
            client_id,
            scopes,
            user_name,
            code_challenge,
        )
    }

    pub fn generate_access_token(
        &self,
        lifetime_s: u32,
        client_id: &str,
        scopes: &str,
        user_name: &str,
    ) -> Result<String, GenerateError> {
        self.generate_token(TokenType::AccessToken, lifetime_s, client_id, scopes, user_name, "")
    }

    pub fn generate_refresh_token(
        &self,
        lifetime_s: u32,
        client_id: &str,
        scopes: &str,
        user_name: &str,
    ) -> Result<String, GenerateError> {
        self.generate_token(TokenType::RefreshToken, lifetime_s, client_id, scopes, user_name, "")
    }

    fn generate_token(
        &self,
        token_type: TokenType,
        lifetime_s: u32,
        client_id: &str,
        scopes: &str,
        user_name: &str,
        additional_data: &str,
    ) -> Result<String, GenerateError> {
        self.rotate_keys_if_needed();

        let now = self.clock.now_seconds();
        let expiration_s = now
            .checked_add(lifetime_s as u64)
            .ok_or(GenerateError::LifetimeOverflow)?;

        let data = TokenData {
            token_type,
            user_name: user_name.to_string(),
            expiration_s,
            client_id: client_id.to_string(),
            scopes: scopes.to_string(),
            additional_data: additional_data.to_string(),
        };
        let payload = data.to_payload_string();

        let sealed = {
            let keys = self.keys.lock().unwrap();
            keys.current.encrypt(payload.as_bytes())
        };

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    pub fn validate_auth_code(&self, token: &str, code_verifier: &str) -> ValidationResult {
        let expected_additional_data = derive_code_challenge(code_verifier);
        let result = self.validate_token(token, TokenType::AuthCode, &expected_additional_data);
        // One-shot: an auth code is burned the instant it is presented,
        // regardless of whether it actually validated.
        self.revoke_token(token);
        result
    }

    pub fn validate_access_token(&self, token: &str) -> ValidationResult {
        self.validate_token(token, TokenType::AccessToken, "")
    }

    pub fn validate_refresh_token(&self, token: &str) -> ValidationResult {
        self.validate_token(token, TokenType::RefreshToken, "")
    }

    fn validate_token(
        &self,
        token: &str,
        expected_type: TokenType,
        expected_additional_data: &str,
    ) -> ValidationResult {
        if self.blacklist.read().unwrap().contains_key(token) {
            return ValidationResult::invalid();
        }

        let sealed = match URL_SAFE_NO_PAD.decode(token) {
            Ok(sealed) => sealed,
            Err(_) => return ValidationResult::invalid(),
        };

        self.rotate_keys_if_needed();

        let plaintext = {
            let keys = self.keys.lock().unwrap();
            match keys.current.decrypt(&sealed) {
                Ok(plaintext) => plaintext,
                Err(_) => match keys.old.decrypt(&sealed) {
                    Ok(plaintext) => plaintext,
                    Err(_) => return ValidationResult::invalid(),
                },
            }
        };

        let payload = match std::str::from_utf8(&plaintext) {
            Ok(payload) => payload,
            Err(_) => return ValidationResult::invalid(),
        };
        let data = match TokenData::from_payload_string(payload) {
            Ok(data) => data,
            Err(_) => return ValidationResult::invalid(),
        };

        if data.token_type != expected_type || data.additional_data != expected_additional_data {
            return ValidationResult::invalid();
        }

        let now = self.clock.now_seconds();
        let expired = now > data.expiration_s;
        let remaining_time_s = if expired {
            0
        } else {
            (data.expiration_s - now) as u32
        };

        ValidationResult {
            valid: true,
            expired,
            remaining_time_s,
            client_id: data.client_id,
            scopes: data.scopes,
            user_name: data.user_name,
        }
    }

    /// Inserts a token into the blacklist by its own recorded expiration. A
    /// token that cannot even be decoded/decrypted/parsed is already
    /// unusable, so failure here is a no-op, not an error.
    pub fn revoke_token(&self, token: &str) {
        let sealed = match URL_SAFE_NO_PAD.decode(token) {
            Ok(sealed) => sealed,
            Err(_) => {
                warn_broken_token(token);
                return;
            }
        };
        let plaintext = {
            let keys = self.keys.lock().unwrap();
            match keys.current.decrypt(&sealed) {
                Ok(plaintext) => plaintext,
                Err(_) => match keys.old.decrypt(&sealed) {
                    Ok(plaintext) => plaintext,
                    Err(_) => {
                        warn_broken_token(token);
                        return;
                    }
                },
            }
        };
        let payload = match std::str::from_utf8(&plaintext) {
            Ok(payload) => payload,
            Err(_) => {
                warn_broken_token(token);
                return;
            }
        };
        let data = match TokenData::from_payload_string(payload) {
            Ok(data) => data,
            Err(_) => {
                warn_broken_token(token);
                return;
            }
        };

        self.blacklist
            .write()
            .unwrap()
            .insert(token.to_string(), data.expiration_s);
    }

    /// The "strong" revoke-all: a fresh `current` key is generated and `old`
    /// is wiped outright, so no grace window survives (unlike passive
    /// rotation, which keeps `old` decryptable for one rotation period).
    pub fn revoke_all_tokens(&self) {
        let now = self.clock.now_seconds();
        let mut keys = self.keys.lock().unwrap();
        keys.current = TokenKey::generate();
        keys.old.secure_clear();
        keys.key_expiration = now + self.policy.refresh_token_lifetime_s() as u64;
        drop(keys);
        self.blacklist.write().unwrap().clear();
    }

    pub fn cleanup_blacklist(&self) {
        let now = self.clock.now_seconds();
        self.blacklist
            .write()
            .unwrap()
            .retain(|_, expiration| *expiration >= now);
    }
}

fn derive_code_challenge(code_verifier: &str) -> String {
    let digest = Sha256::digest(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn warn_broken_token(token: &str) {
    let tail: String = token.chars().rev().take(8).collect::<Vec<_>>().into_iter().rev().collect();
    warn!(token_tail = %tail, "failed to revoke broken token");
}
