//! Opaque hashed credential value.
//!
//! # Invariants
//! - Raw secrets are hashed at the boundary and never stored or compared.
//! - Persisted form is a lowercase 64-char SHA-256 hex digest.

use sha2::{Digest, Sha256};
use std::fmt::{Debug, Formatter};

const CREDENTIAL_DOMAIN: &[u8] = b"fyp-portal/credential/v1:";
const DIGEST_HEX_LEN: usize = 64;

/// Hashed credential secret.
///
/// `Debug` is redacted so hashes never leak through log or panic output.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Derives a hash from a raw secret supplied at the boundary.
    pub fn derive(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(CREDENTIAL_DOMAIN);
        hasher.update(secret.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Rehydrates a hash read from storage.
    ///
    /// Returns `None` when the stored value is not a well-formed digest.
    pub fn from_stored(value: &str) -> Option<Self> {
        let well_formed = value.len() == DIGEST_HEX_LEN
            && value
                .bytes()
                .all(|byte| byte.is_ascii_digit() || (b'a'..=b'f').contains(&byte));
        well_formed.then(|| Self(value.to_string()))
    }

    /// Stored representation.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for CredentialHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::CredentialHash;

    #[test]
    fn derive_is_deterministic_and_secret_sensitive() {
        assert_eq!(CredentialHash::derive("admin"), CredentialHash::derive("admin"));
        assert_ne!(CredentialHash::derive("admin"), CredentialHash::derive("Admin"));
    }

    #[test]
    fn stored_value_roundtrips_only_when_well_formed() {
        let hash = CredentialHash::derive("secret");
        let restored = CredentialHash::from_stored(hash.as_str()).expect("valid digest");
        assert_eq!(restored, hash);

        assert!(CredentialHash::from_stored("secret").is_none());
        assert!(CredentialHash::from_stored(&hash.as_str().to_uppercase()).is_none());
    }

    #[test]
    fn debug_output_is_redacted() {
        let rendered = format!("{:?}", CredentialHash::derive("secret"));
        assert!(rendered.contains("redacted"));
    }
}
