//! Admin authentication gate.
//!
//! A single configured admin identity logs in with username and password and
//! receives a stateless, time-limited session token. There is no server-side
//! session list: a token is valid until it expires.

pub mod password;
pub mod token;

use chrono::Duration;
use rand::Rng;
use tracing::warn;

use crate::config::Config;

pub use password::{hash_password, verify_password, PasswordHashKind};
pub use token::{Claims, TokenSigner, ADMIN_ROLE};

/// Password accepted while no hash is configured and bootstrap login is enabled
pub const BOOTSTRAP_PASSWORD: &str = "admin";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Failed to sign session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone)]
pub struct AuthGate {
    admin_username: String,
    password_hash: Option<String>,
    allow_default_password: bool,
    signer: TokenSigner,
}

impl AuthGate {
    pub fn new(
        admin_username: impl Into<String>,
        password_hash: Option<String>,
        allow_default_password: bool,
        signer: TokenSigner,
    ) -> Self {
        Self {
            admin_username: admin_username.into(),
            password_hash,
            allow_default_password,
            signer,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let secret = match &config.auth.jwt_secret {
            Some(secret) => secret.clone().into_bytes(),
            None => {
                warn!("auth.jwt_secret is not set; using a random key, sessions will not survive a restart");
                generate_secret().into_bytes()
            }
        };

        if config.admin_password_hash().is_none() {
            if config.auth.allow_default_password {
                warn!("No admin password hash configured; bootstrap password login is enabled");
            } else {
                warn!("No admin password hash configured; admin login is disabled");
            }
        }

        let signer = TokenSigner::new(&secret, Duration::hours(config.auth.session_ttl_hours));

        Self::new(
            config.auth.admin_username.clone(),
            config.admin_password_hash().map(str::to_string),
            config.auth.allow_default_password,
            signer,
        )
    }

    /// Check a username/password pair against the configured admin credential
    pub fn validate_credentials(&self, username: &str, password: &str) -> bool {
        if username != self.admin_username {
            return false;
        }

        match &self.password_hash {
            Some(hash) => verify_password(password, hash),
            None if self.allow_default_password => {
                let accepted = password == BOOTSTRAP_PASSWORD;
                if accepted {
                    warn!(username = %username, "Admin logged in with the bootstrap password; configure auth.admin_password_hash");
                }
                accepted
            }
            None => false,
        }
    }

    pub fn generate_token(&self, username: &str) -> Result<String, AuthError> {
        Ok(self.signer.issue(username)?)
    }

    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        self.signer.verify(token)
    }

    /// Lifetime of issued tokens, also used as the cookie max-age
    pub fn session_ttl(&self) -> Duration {
        self.signer.ttl()
    }
}

/// Generate a random 64-character hex secret
pub fn generate_secret() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"0123456789abcdef0123456789abcdef", Duration::hours(24))
    }

    fn gate_with_hash(password: &str) -> AuthGate {
        let hash = hash_password(password).unwrap();
        AuthGate::new("admin", Some(hash), false, signer())
    }

    #[test]
    fn test_valid_credentials() {
        let gate = gate_with_hash("Teak&Brass-2024");
        assert!(gate.validate_credentials("admin", "Teak&Brass-2024"));
    }

    #[test]
    fn test_wrong_username_or_password() {
        let gate = gate_with_hash("Teak&Brass-2024");
        assert!(!gate.validate_credentials("root", "Teak&Brass-2024"));
        assert!(!gate.validate_credentials("admin", "wrong"));
        assert!(!gate.validate_credentials("Admin", "Teak&Brass-2024"));
    }

    #[test]
    fn test_bootstrap_password_never_bypasses_configured_hash() {
        let gate = AuthGate::new(
            "admin",
            Some(hash_password("Teak&Brass-2024").unwrap()),
            true,
            signer(),
        );
        assert!(!gate.validate_credentials("admin", BOOTSTRAP_PASSWORD));
    }

    #[test]
    fn test_bootstrap_password_requires_opt_in() {
        let closed = AuthGate::new("admin", None, false, signer());
        assert!(!closed.validate_credentials("admin", BOOTSTRAP_PASSWORD));

        let open = AuthGate::new("admin", None, true, signer());
        assert!(open.validate_credentials("admin", BOOTSTRAP_PASSWORD));
        assert!(!open.validate_credentials("admin", "something-else"));
    }

    #[test]
    fn test_generated_token_round_trip() {
        let gate = gate_with_hash("pw");
        let token = gate.generate_token("admin").unwrap();
        let claims = gate.verify_token(&token).unwrap();
        assert_eq!(claims.username, "admin");
        assert_eq!(claims.role, "admin");
        assert_eq!(gate.session_ttl(), Duration::hours(24));
    }

    #[test]
    fn test_generate_secret() {
        let a = generate_secret();
        let b = generate_secret();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
