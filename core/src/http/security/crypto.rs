//! Password encoding utilities.
//!
//! # Spring Security Equivalent
//! `org.springframework.security.crypto.password.PasswordEncoder`
//!
//! # Feature Flags
//! - `argon2`: Enables `Argon2PasswordEncoder` and `DelegatingPasswordEncoder` (default)

#[cfg(feature = "argon2")]
use argon2::password_hash::rand_core::OsRng;
#[cfg(feature = "argon2")]
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
#[cfg(feature = "argon2")]
use argon2::Argon2;
use derive_more::{Display, Error};

/// Hashing a password failed.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("password encoding failed: {reason}")]
pub struct EncodeError {
    reason: String,
}

/// Encodes and verifies passwords.
///
/// # Spring Security Equivalent
/// `PasswordEncoder` interface
pub trait PasswordEncoder: Send + Sync {
    /// Encode the raw password.
    fn encode(&self, raw_password: &str) -> Result<String, EncodeError>;

    /// Verify a raw password against an encoded password.
    ///
    /// An encoded password this encoder cannot read never matches.
    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool;

    /// Returns true if the encoded password should be re-encoded.
    fn upgrade_encoding(&self, _encoded_password: &str) -> bool {
        false
    }
}

/// Argon2 password encoder.
///
/// # Spring Security Equivalent
/// `Argon2PasswordEncoder`
///
/// # Example
/// ```
/// use beveiligd_security_core::http::security::crypto::{Argon2PasswordEncoder, PasswordEncoder};
///
/// let encoder = Argon2PasswordEncoder::new();
/// let hash = encoder.encode("theboss").unwrap();
///
/// assert!(encoder.matches("theboss", &hash));
/// assert!(!encoder.matches("hungry", &hash));
/// ```
#[cfg(feature = "argon2")]
#[derive(Clone, Default)]
pub struct Argon2PasswordEncoder {
    argon2: Argon2<'static>,
}

#[cfg(feature = "argon2")]
impl Argon2PasswordEncoder {
    pub fn new() -> Self {
        Argon2PasswordEncoder {
            argon2: Argon2::default(),
        }
    }
}

#[cfg(feature = "argon2")]
impl PasswordEncoder for Argon2PasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, EncodeError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw_password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| EncodeError {
                reason: e.to_string(),
            })
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        match PasswordHash::new(encoded_password) {
            Ok(parsed_hash) => self
                .argon2
                .verify_password(raw_password.as_bytes(), &parsed_hash)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Plain-text "encoder", for development data only.
///
/// # Spring Security Equivalent
/// `NoOpPasswordEncoder`
///
/// # Example
/// ```
/// use beveiligd_security_core::http::security::crypto::{NoOpPasswordEncoder, PasswordEncoder};
///
/// let encoder = NoOpPasswordEncoder;
/// assert_eq!(encoder.encode("hungry").unwrap(), "hungry");
/// assert!(encoder.matches("hungry", "hungry"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPasswordEncoder;

impl PasswordEncoder for NoOpPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, EncodeError> {
        Ok(raw_password.to_string())
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        raw_password == encoded_password
    }
}

/// Picks the encoder from the `{id}` prefix of the stored hash.
///
/// # Spring Security Equivalent
/// `PasswordEncoderFactories.createDelegatingPasswordEncoder()`
///
/// Supported formats:
/// - `{argon2}hash` - Argon2 encoded password, also used for new passwords
/// - `{noop}plain` - plain text
///
/// Hashes without a known prefix never match.
///
/// # Example
/// ```
/// use beveiligd_security_core::http::security::crypto::{DelegatingPasswordEncoder, PasswordEncoder};
///
/// let encoder = DelegatingPasswordEncoder::new();
///
/// let hash = encoder.encode("theboss").unwrap();
/// assert!(hash.starts_with("{argon2}"));
/// assert!(encoder.matches("theboss", &hash));
///
/// assert!(encoder.matches("hungry", "{noop}hungry"));
/// assert!(!encoder.matches("hungry", "hungry"));
/// ```
#[cfg(feature = "argon2")]
#[derive(Clone, Default)]
pub struct DelegatingPasswordEncoder {
    argon2: Argon2PasswordEncoder,
}

#[cfg(feature = "argon2")]
impl DelegatingPasswordEncoder {
    pub const ARGON2_PREFIX: &'static str = "{argon2}";
    pub const NOOP_PREFIX: &'static str = "{noop}";

    pub fn new() -> Self {
        DelegatingPasswordEncoder {
            argon2: Argon2PasswordEncoder::new(),
        }
    }
}

#[cfg(feature = "argon2")]
impl PasswordEncoder for DelegatingPasswordEncoder {
    fn encode(&self, raw_password: &str) -> Result<String, EncodeError> {
        let hash = self.argon2.encode(raw_password)?;
        Ok(format!("{}{}", Self::ARGON2_PREFIX, hash))
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        if let Some(hash) = encoded_password.strip_prefix(Self::ARGON2_PREFIX) {
            self.argon2.matches(raw_password, hash)
        } else if let Some(plain) = encoded_password.strip_prefix(Self::NOOP_PREFIX) {
            NoOpPasswordEncoder.matches(raw_password, plain)
        } else {
            false
        }
    }

    fn upgrade_encoding(&self, encoded_password: &str) -> bool {
        !encoded_password.starts_with(Self::ARGON2_PREFIX)
    }
}
