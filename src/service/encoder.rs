use argon2::{
    password_hash::{PasswordHash, SaltString},
    Argon2, PasswordHasher, PasswordVerifier,
};
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha512};
use std::{collections::HashMap, sync::Arc};

use crate::entities::accounts;

pub const SCHEME_ARGON2: &str = "argon2";
pub const SCHEME_SHA512: &str = "sha512";

const SHA512_ITERATIONS: u32 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum EncoderError {
    #[error("invalid salt: {0}")]
    Salt(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Stored form of a password: never the plaintext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub password_hash: String,
    pub salt: String,
    pub encoder: String,
}

pub trait PasswordEncoder: Send + Sync {
    fn scheme(&self) -> &'static str;
    fn encode_password(&self, raw: &str, salt: &str) -> Result<String, EncoderError>;
    fn is_password_valid(&self, encoded: &str, raw: &str, salt: &str) -> bool;
}

pub struct Argon2Encoder;

impl PasswordEncoder for Argon2Encoder {
    fn scheme(&self) -> &'static str {
        SCHEME_ARGON2
    }

    fn encode_password(&self, raw: &str, salt: &str) -> Result<String, EncoderError> {
        let salt = SaltString::from_b64(salt).map_err(|err| EncoderError::Salt(err.to_string()))?;
        Ok(Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|err| EncoderError::Hash(err.to_string()))?
            .to_string())
    }

    fn is_password_valid(&self, encoded: &str, raw: &str, _salt: &str) -> bool {
        // The PHC string embeds its own salt.
        let Ok(parsed) = PasswordHash::new(encoded) else {
            tracing::warn!("stored argon2 hash is malformed");
            return false;
        };
        Argon2::default()
            .verify_password(raw.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Iterated, salted SHA-512 digest kept for accounts imported from older stores.
pub struct MessageDigestEncoder {
    iterations: u32,
}

impl MessageDigestEncoder {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    fn merge_password_and_salt(raw: &str, salt: &str) -> String {
        if salt.is_empty() {
            raw.to_string()
        } else {
            format!("{raw}{{{salt}}}")
        }
    }
}

impl Default for MessageDigestEncoder {
    fn default() -> Self {
        Self::new(SHA512_ITERATIONS)
    }
}

impl PasswordEncoder for MessageDigestEncoder {
    fn scheme(&self) -> &'static str {
        SCHEME_SHA512
    }

    fn encode_password(&self, raw: &str, salt: &str) -> Result<String, EncoderError> {
        let salted = Self::merge_password_and_salt(raw, salt);
        let mut digest = Sha512::digest(salted.as_bytes());
        for _ in 1..self.iterations {
            let mut hasher = Sha512::new();
            hasher.update(digest);
            hasher.update(salted.as_bytes());
            digest = hasher.finalize();
        }
        Ok(base64::engine::general_purpose::STANDARD.encode(digest))
    }

    fn is_password_valid(&self, encoded: &str, raw: &str, salt: &str) -> bool {
        match self.encode_password(raw, salt) {
            Ok(candidate) => constant_time_eq(encoded.as_bytes(), candidate.as_bytes()),
            Err(_) => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn generate_salt() -> Result<String, EncoderError> {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    SaltString::encode_b64(&bytes)
        .map(|salt| salt.as_str().to_string())
        .map_err(|err| EncoderError::Salt(err.to_string()))
}

/// Registry of password encoders keyed by scheme name.
pub struct EncoderFactory {
    encoders: HashMap<&'static str, Arc<dyn PasswordEncoder>>,
    default: Arc<dyn PasswordEncoder>,
}

impl EncoderFactory {
    pub fn new(default: Arc<dyn PasswordEncoder>) -> Self {
        let mut encoders: HashMap<&'static str, Arc<dyn PasswordEncoder>> = HashMap::new();
        encoders.insert(default.scheme(), default.clone());
        Self { encoders, default }
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn PasswordEncoder>) -> Self {
        self.encoders.insert(encoder.scheme(), encoder);
        self
    }

    /// Encoder matching the scheme the account's credential was written with.
    pub fn get_encoder(&self, account: &accounts::Model) -> Option<Arc<dyn PasswordEncoder>> {
        self.encoders.get(account.encoder.as_str()).cloned()
    }

    /// True when the account's credential was written with a non-default scheme.
    pub fn needs_rehash(&self, account: &accounts::Model) -> bool {
        account.encoder != self.default.scheme()
    }

    pub fn derive_credential(&self, raw: &str) -> Result<Credential, EncoderError> {
        let salt = generate_salt()?;
        let password_hash = self.default.encode_password(raw, &salt)?;
        Ok(Credential {
            password_hash,
            salt,
            encoder: self.default.scheme().to_string(),
        })
    }
}

impl Default for EncoderFactory {
    fn default() -> Self {
        Self::new(Arc::new(Argon2Encoder)).with_encoder(Arc::new(MessageDigestEncoder::default()))
    }
}
