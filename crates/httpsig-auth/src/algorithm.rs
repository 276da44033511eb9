//! Signature algorithm registry.
//!
//! Algorithms are encoded on the wire as `{keyType}-{hash}` (for example
//! `rsa-sha256` or `hmac-sha1`) or as the literal `hs2019`, which hides the
//! concrete pair from the emitted header.
//!
//! [`validate_algorithm`] is the single place where algorithm strings are
//! decomposed; signing, parsing and verification all go through it.

use std::fmt;
use std::str::FromStr;

use crate::error::HttpSigError;

/// The literal used for the algorithm-hiding sentinel.
pub const HS2019: &str = "hs2019";

/// Key families that may produce an HTTP signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    /// RSA (PKCS#1 v1.5).
    Rsa,
    /// DSA.
    Dsa,
    /// ECDSA.
    Ecdsa,
    /// Ed25519.
    Ed25519,
    /// Shared-secret HMAC.
    Hmac,
}

impl KeyType {
    /// The lowercase wire name of this key type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Dsa => "dsa",
            Self::Ecdsa => "ecdsa",
            Self::Ed25519 => "ed25519",
            Self::Hmac => "hmac",
        }
    }

    /// Whether this key type uses a public/private key pair.
    #[must_use]
    pub fn is_asymmetric(self) -> bool {
        !matches!(self, Self::Hmac)
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "rsa" => Some(Self::Rsa),
            "dsa" => Some(Self::Dsa),
            "ecdsa" => Some(Self::Ecdsa),
            "ed25519" => Some(Self::Ed25519),
            "hmac" => Some(Self::Hmac),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Digest algorithms accepted in an algorithm string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// The lowercase wire name of this hash.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    /// A concrete key type and hash pair, e.g. `rsa-sha256`.
    Pair {
        /// The key family.
        key_type: KeyType,
        /// The digest algorithm.
        hash: HashAlgorithm,
    },
    /// The `hs2019` sentinel; the concrete pair is derived from the key.
    Hs2019,
}

impl Algorithm {
    /// Build a concrete algorithm pair.
    #[must_use]
    pub fn new(key_type: KeyType, hash: HashAlgorithm) -> Self {
        Self::Pair { key_type, hash }
    }

    /// The key type, unless this is the `hs2019` sentinel.
    #[must_use]
    pub fn key_type(&self) -> Option<KeyType> {
        match self {
            Self::Pair { key_type, .. } => Some(*key_type),
            Self::Hs2019 => None,
        }
    }

    /// The hash algorithm, unless this is the `hs2019` sentinel.
    #[must_use]
    pub fn hash(&self) -> Option<HashAlgorithm> {
        match self {
            Self::Pair { hash, .. } => Some(*hash),
            Self::Hs2019 => None,
        }
    }

    /// Whether this algorithm signs with a shared secret.
    #[must_use]
    pub fn is_hmac(&self) -> bool {
        self.key_type() == Some(KeyType::Hmac)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair { key_type, hash } => write!(f, "{key_type}-{hash}"),
            Self::Hs2019 => f.write_str(HS2019),
        }
    }
}

impl FromStr for Algorithm {
    type Err = HttpSigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_algorithm(s, None)
    }
}

impl TryFrom<String> for Algorithm {
    type Error = HttpSigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_algorithm(&value, None)
    }
}

impl From<Algorithm> for String {
    fn from(value: Algorithm) -> Self {
        value.to_string()
    }
}

/// Validate and decompose an algorithm string.
///
/// The comparison is case-insensitive. When `expected_key_type` is given,
/// the key-type segment must equal it. `hs2019` is returned as
/// [`Algorithm::Hs2019`] without consulting `expected_key_type`.
///
/// # Errors
///
/// Returns [`HttpSigError::InvalidAlgorithm`] if the string is not a
/// `{keyType}-{hash}` pair, either segment is unsupported, or the key type
/// disagrees with `expected_key_type`.
///
/// # Examples
///
/// ```
/// use httpsig_auth::algorithm::{validate_algorithm, Algorithm, HashAlgorithm, KeyType};
///
/// let alg = validate_algorithm("RSA-SHA256", None).unwrap();
/// assert_eq!(alg, Algorithm::new(KeyType::Rsa, HashAlgorithm::Sha256));
/// assert!(validate_algorithm("rsa-md5", None).is_err());
/// ```
pub fn validate_algorithm(
    id: &str,
    expected_key_type: Option<KeyType>,
) -> Result<Algorithm, HttpSigError> {
    let lowered = id.to_lowercase();
    if lowered == HS2019 {
        return Ok(Algorithm::Hs2019);
    }

    let segments: Vec<&str> = lowered.split('-').collect();
    let [key_segment, hash_segment] = segments.as_slice() else {
        return Err(HttpSigError::InvalidAlgorithm(format!(
            "{} is not a valid algorithm",
            id.to_uppercase()
        )));
    };

    let key_type = KeyType::from_segment(key_segment).ok_or_else(|| {
        HttpSigError::InvalidAlgorithm(format!(
            "{} type keys are not supported",
            key_segment.to_uppercase()
        ))
    })?;

    let hash = HashAlgorithm::from_segment(hash_segment).ok_or_else(|| {
        HttpSigError::InvalidAlgorithm(format!(
            "{} is not a supported hash algorithm",
            hash_segment.to_uppercase()
        ))
    })?;

    if let Some(expected) = expected_key_type {
        if expected != key_type {
            return Err(HttpSigError::InvalidAlgorithm(format!(
                "algorithm {lowered} does not match a {} key",
                expected.as_str().to_uppercase()
            )));
        }
    }

    Ok(Algorithm::Pair { key_type, hash })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_validate_every_supported_pair() {
        for key in ["rsa", "dsa", "ecdsa", "ed25519", "hmac"] {
            for hash in ["sha1", "sha256", "sha512"] {
                let id = format!("{key}-{hash}");
                let alg = validate_algorithm(&id, None).unwrap();
                assert_eq!(alg.to_string(), id);
            }
        }
    }

    #[test]
    fn test_should_validate_case_insensitively() {
        assert_eq!(
            validate_algorithm("RSA-SHA256", None).unwrap(),
            validate_algorithm("rsa-sha256", None).unwrap()
        );
        assert_eq!(
            validate_algorithm("Hmac-Sha1", None).unwrap(),
            Algorithm::new(KeyType::Hmac, HashAlgorithm::Sha1)
        );
    }

    #[test]
    fn test_should_return_hs2019_unexpanded() {
        assert_eq!(validate_algorithm("hs2019", None).unwrap(), Algorithm::Hs2019);
        assert_eq!(
            validate_algorithm("HS2019", Some(KeyType::Rsa)).unwrap(),
            Algorithm::Hs2019
        );
        assert_eq!(Algorithm::Hs2019.key_type(), None);
    }

    #[test]
    fn test_should_reject_unsupported_key_type() {
        let err = validate_algorithm("foo-sha256", None).unwrap_err();
        assert!(matches!(err, HttpSigError::InvalidAlgorithm(_)));
        assert!(err.to_string().contains("FOO type keys"));
    }

    #[test]
    fn test_should_reject_unsupported_hash() {
        let err = validate_algorithm("rsa-md5", None).unwrap_err();
        assert!(err.to_string().contains("MD5 is not a supported hash"));
    }

    #[test]
    fn test_should_reject_malformed_identifiers() {
        assert!(validate_algorithm("rsa", None).is_err());
        assert!(validate_algorithm("rsa-sha256-extra", None).is_err());
        assert!(validate_algorithm("", None).is_err());
    }

    #[test]
    fn test_should_reject_key_type_mismatch() {
        let result = validate_algorithm("rsa-sha256", Some(KeyType::Ecdsa));
        assert!(matches!(result, Err(HttpSigError::InvalidAlgorithm(_))));
        assert!(validate_algorithm("ecdsa-sha256", Some(KeyType::Ecdsa)).is_ok());
    }

    #[test]
    fn test_should_report_hmac_family() {
        assert!(validate_algorithm("hmac-sha512", None).unwrap().is_hmac());
        assert!(!validate_algorithm("ed25519-sha512", None).unwrap().is_hmac());
        assert!(!KeyType::Hmac.is_asymmetric());
    }

    #[test]
    fn test_should_parse_and_serialize_as_string() {
        let alg: Algorithm = "ecdsa-sha256".parse().unwrap();
        let json = serde_json::to_string(&alg).unwrap();
        assert_eq!(json, "\"ecdsa-sha256\"");
        let back: Algorithm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, alg);
        assert!(serde_json::from_str::<Algorithm>("\"rsa-md5\"").is_err());
    }
}
