// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scramble strategies applied to PII values.
//!
//! The only strategy family today is pseudonymization: a value is replaced by the
//! lowercase hex digest of a named one-way hash function. The same input always yields
//! the same output, and there is no inverse.

use serde::{Deserialize, Serialize};
use std::fmt;

use md2::Md2;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// One-way hash functions accepted by `strategy.pseudonymize.hashFunction`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    Md2,
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashFunction {
    pub const ALL: [HashFunction; 6] = [
        HashFunction::Md2,
        HashFunction::Md5,
        HashFunction::Sha1,
        HashFunction::Sha256,
        HashFunction::Sha384,
        HashFunction::Sha512,
    ];

    /// Parse a hash function name (case-insensitive)
    ///
    /// Returns the rejected name on failure so callers can report it verbatim.
    pub fn from_name(name: &str) -> Result<Self, String> {
        match name.to_uppercase().as_str() {
            "MD2" => Ok(HashFunction::Md2),
            "MD5" => Ok(HashFunction::Md5),
            "SHA-1" | "SHA1" => Ok(HashFunction::Sha1),
            "SHA-256" | "SHA256" => Ok(HashFunction::Sha256),
            "SHA-384" | "SHA384" => Ok(HashFunction::Sha384),
            "SHA-512" | "SHA512" => Ok(HashFunction::Sha512),
            _ => Err(name.to_string()),
        }
    }

    /// Canonical name, as written back into audit records
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            HashFunction::Md2 => "MD2",
            HashFunction::Md5 => "MD5",
            HashFunction::Sha1 => "SHA-1",
            HashFunction::Sha256 => "SHA-256",
            HashFunction::Sha384 => "SHA-384",
            HashFunction::Sha512 => "SHA-512",
        }
    }

    /// Digest size in bytes
    #[inline]
    pub const fn digest_len(&self) -> usize {
        match self {
            HashFunction::Md2 | HashFunction::Md5 => 16,
            HashFunction::Sha1 => 20,
            HashFunction::Sha256 => 32,
            HashFunction::Sha384 => 48,
            HashFunction::Sha512 => 64,
        }
    }

    /// Lowercase hex digest of the UTF-8 bytes of `text`
    pub fn hex_digest(&self, text: &str) -> String {
        match self {
            HashFunction::Md2 => hex::encode(Md2::digest(text.as_bytes())),
            HashFunction::Md5 => hex::encode(Md5::digest(text.as_bytes())),
            HashFunction::Sha1 => hex::encode(Sha1::digest(text.as_bytes())),
            HashFunction::Sha256 => hex::encode(Sha256::digest(text.as_bytes())),
            HashFunction::Sha384 => hex::encode(Sha384::digest(text.as_bytes())),
            HashFunction::Sha512 => hex::encode(Sha512::digest(text.as_bytes())),
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy used to scramble every PII value of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiStrategy {
    Pseudonymize { hash_function: HashFunction },
}

impl PiiStrategy {
    pub fn pseudonymize(hash_function: HashFunction) -> Self {
        PiiStrategy::Pseudonymize { hash_function }
    }

    /// Replace a value with its scrambled substitute
    pub fn scramble(&self, text: &str) -> String {
        match self {
            PiiStrategy::Pseudonymize { hash_function } => hash_function.hex_digest(text),
        }
    }

    /// Build the strategy described by a configuration/audit sub-document
    pub fn from_config(config: &StrategyConfig) -> Result<Self, String> {
        match config {
            StrategyConfig::Pseudonymize(p) => {
                HashFunction::from_name(&p.hash_function).map(PiiStrategy::pseudonymize)
            }
        }
    }

    /// Describe this strategy the way it is configured
    pub fn to_config(&self) -> StrategyConfig {
        match self {
            PiiStrategy::Pseudonymize { hash_function } => {
                StrategyConfig::Pseudonymize(PseudonymizeConfig {
                    hash_function: hash_function.as_str().to_string(),
                })
            }
        }
    }
}

/// Serialized strategy description: `{"pseudonymize": {"hashFunction": "SHA-256"}}`
///
/// Shared by the configuration parser and the audit record so the two stay inverses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyConfig {
    #[serde(rename = "pseudonymize")]
    Pseudonymize(PseudonymizeConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PseudonymizeConfig {
    #[serde(rename = "hashFunction")]
    pub hash_function: String,
}
