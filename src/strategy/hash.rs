//! One-way hashing of field values

use crate::error::{Result, SanitizerError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HashAlgorithm {
    Sha224,
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Length of the hex rendering of a digest
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha224 => 56,
            HashAlgorithm::Sha256 => 64,
            HashAlgorithm::Sha384 => 96,
            HashAlgorithm::Sha512 => 128,
        }
    }

    /// Digest `bytes` with a fresh hasher and render lowercase hex
    pub fn digest_hex(&self, bytes: &[u8]) -> String {
        match self {
            HashAlgorithm::Sha224 => hex::encode(Sha224::digest(bytes)),
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashAlgorithm::Sha384 => hex::encode(Sha384::digest(bytes)),
            HashAlgorithm::Sha512 => hex::encode(Sha512::digest(bytes)),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SanitizerError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "SHA224" => Ok(HashAlgorithm::Sha224),
            "SHA256" => Ok(HashAlgorithm::Sha256),
            "SHA384" => Ok(HashAlgorithm::Sha384),
            "SHA512" => Ok(HashAlgorithm::Sha512),
            _ => Err(SanitizerError::configuration(format!(
                "Hash algorithm not available: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for HashAlgorithm {
    type Error = SanitizerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HashAlgorithm> for String {
    fn from(algorithm: HashAlgorithm) -> Self {
        algorithm.as_str().to_string()
    }
}

/// Replaces values with their hex digest
///
/// Holds no digest state; every call hashes with its own hasher, so one
/// instance can be shared freely across threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashStrategy {
    algorithm: HashAlgorithm,
}

impl HashStrategy {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn apply(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }
        self.algorithm.digest_hex(value.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sha256_known_vector() {
        let strategy = HashStrategy::default();
        assert_eq!(
            strategy.apply("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_empty_passes_through() {
        assert_eq!(HashStrategy::default().apply(""), "");
    }

    #[test]
    fn test_output_length_per_algorithm() {
        for algorithm in [
            HashAlgorithm::Sha224,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            let output = HashStrategy::new(algorithm).apply("john@example.com");
            assert_eq!(output.len(), algorithm.hex_len(), "{}", algorithm);
            assert!(output.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert_eq!("Sha_384".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha384);
        assert!("MD5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_concurrent_use_is_consistent() {
        let strategy = HashStrategy::default();
        let expected = strategy.apply("shared value");
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(move || strategy.apply("shared value")))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    proptest! {
        #[test]
        fn prop_hash_is_pure(value in ".{1,64}") {
            let first = HashStrategy::default().apply(&value);
            let second = HashStrategy::new(HashAlgorithm::Sha256).apply(&value);
            prop_assert_eq!(first.len(), 64);
            prop_assert_eq!(first, second);
        }
    }
}
