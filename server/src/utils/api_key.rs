//! API key generation and hashing utilities
//!
//! Keys are hashed with HMAC-SHA256 when a server secret is configured and
//! with plain SHA-256 otherwise. Both forms are lowercase hex.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use rand::Rng;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::core::constants::{API_KEY_PREFIX, API_KEY_RANDOM_LENGTH};

type HmacSha256 = Hmac<Sha256>;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate opaque API key: ik_{random_40chars}
/// Uses OsRng (CSPRNG) for cryptographic security
pub fn generate_api_key() -> String {
    let random: String = (0..API_KEY_RANDOM_LENGTH)
        .map(|_| CHARSET[OsRng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{}{}", API_KEY_PREFIX, random)
}

/// Deterministic one-way key hasher
///
/// The keyed MAC is built once and cloned per hash.
#[derive(Clone)]
pub struct ApiKeyHasher {
    mac: Option<HmacSha256>,
}

impl ApiKeyHasher {
    pub fn new(secret: Option<&str>) -> Result<Self, InvalidLength> {
        let mac = secret
            .map(|s| HmacSha256::new_from_slice(s.as_bytes()))
            .transpose()?;
        Ok(Self { mac })
    }

    /// Hex-encoded hash of a raw key
    pub fn hash(&self, key: &str) -> String {
        match &self.mac {
            Some(mac) => {
                let mut mac = mac.clone();
                mac.update(key.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
            None => hex::encode(Sha256::digest(key.as_bytes())),
        }
    }

    pub fn is_keyed(&self) -> bool {
        self.mac.is_some()
    }
}

impl std::fmt::Debug for ApiKeyHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyHasher")
            .field("keyed", &self.is_keyed())
            .finish()
    }
}

/// Extract key from the Authorization header value
///
/// `Bearer <key>` yields the token; any other non-empty value is taken as the
/// raw key.
pub fn extract_key_from_header(header: &str) -> Option<String> {
    let key = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_api_key() {
        let key = generate_api_key();
        assert!(key.starts_with(API_KEY_PREFIX));
        assert_eq!(key.len(), API_KEY_PREFIX.len() + API_KEY_RANDOM_LENGTH);
        assert!(
            key[API_KEY_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_generate_api_key_uniqueness() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_plain_hash_is_sha256() {
        let hasher = ApiKeyHasher::new(None).unwrap();
        assert!(!hasher.is_keyed());
        assert_eq!(
            hasher.hash("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_keyed_hash() {
        let hasher = ApiKeyHasher::new(Some("test-secret")).unwrap();
        let hash1 = hasher.hash("ik_abc");
        let hash2 = hasher.hash("ik_abc");

        // Same key + secret = same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));

        // Different secret = different hash
        let other = ApiKeyHasher::new(Some("different-secret")).unwrap();
        assert_ne!(hash1, other.hash("ik_abc"));
        assert_ne!(hash1, ApiKeyHasher::new(None).unwrap().hash("ik_abc"));
    }

    #[test]
    fn test_debug_hides_secret() {
        let hasher = ApiKeyHasher::new(Some("pepper")).unwrap();
        assert!(!format!("{:?}", hasher).contains("pepper"));
    }

    #[test]
    fn test_extract_key_from_header() {
        assert_eq!(
            extract_key_from_header("Bearer ik_abc"),
            Some("ik_abc".to_string())
        );
        assert_eq!(extract_key_from_header("ik_raw"), Some("ik_raw".to_string()));
        assert_eq!(extract_key_from_header("Bearer "), None);
        assert_eq!(extract_key_from_header(""), None);
    }
}
