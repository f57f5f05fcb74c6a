//! Password hashing and verification.
//!
//! New hashes are Argon2id PHC strings. bcrypt hashes (`$2a$`, `$2b$`, `$2y$`)
//! are accepted for verification so existing credentials keep working.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Argon2 variants a stored hash may use
const ARGON2_ALGORITHMS: &[&str] = &["argon2id", "argon2i", "argon2d"];

/// bcrypt versions accepted for verification
const BCRYPT_VERSIONS: &[&str] = &["2a", "2b", "2y"];

/// Length of the salt plus digest in a bcrypt hash, in bcrypt's base64 alphabet
const BCRYPT_PAYLOAD_LEN: usize = 53;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordHashKind {
    Argon2,
    Bcrypt,
}

impl PasswordHashKind {
    /// Identify the format of a stored hash, or `None` if it is not usable
    pub fn detect(hash: &str) -> Option<Self> {
        if hash.starts_with("$argon2") {
            return is_argon2_hash(hash).then_some(PasswordHashKind::Argon2);
        }
        is_bcrypt_hash(hash).then_some(PasswordHashKind::Bcrypt)
    }
}

/// A PHC string naming an Argon2 variant and carrying both salt and digest
fn is_argon2_hash(hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => {
            ARGON2_ALGORITHMS.contains(&parsed.algorithm.as_str())
                && parsed.salt.is_some()
                && parsed.hash.is_some()
        }
        Err(_) => false,
    }
}

/// `$<version>$<cost>$<22 char salt><31 char digest>`
fn is_bcrypt_hash(hash: &str) -> bool {
    let mut parts = hash.split('$');
    let (Some(""), Some(version), Some(cost), Some(payload), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    if !BCRYPT_VERSIONS.contains(&version) {
        return false;
    }
    let cost_ok = cost.len() == 2
        && cost
            .parse::<u32>()
            .is_ok_and(|c| (4..=31).contains(&c));
    cost_ok
        && payload.len() == BCRYPT_PAYLOAD_LEN
        && payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '/')
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2 or bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHashKind::detect(hash) {
        Some(PasswordHashKind::Argon2) => {
            let parsed_hash = match PasswordHash::new(hash) {
                Ok(h) => h,
                Err(_) => return false,
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
        }
        Some(PasswordHashKind::Bcrypt) => bcrypt::verify(password, hash).unwrap_or(false),
        None => false,
    }
}
