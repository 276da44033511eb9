//! RSA keys signing with PKCS#1 v1.5 padding.

use std::sync::Arc;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use super::{KeySignature, PrivateKey, PublicKey, StreamSigner, StreamVerifier, decode_signature};
use crate::algorithm::{HashAlgorithm, KeyType};
use crate::error::KeyError;
use crate::hash::HashContext;

// DER encoded DigestInfo prefixes (RFC 8017, section 9.2). `rsa` builds
// these from its own `digest` 0.10 types, while the hashes here come from
// `sha2` 0.11, so the prefixes are spelled out and the digest is passed in
// pre-computed.
const SHA1_PREFIX: &[u8] = &[
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];
const SHA256_PREFIX: &[u8] = &[
    0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05,
    0x00, 0x04, 0x20,
];
const SHA512_PREFIX: &[u8] = &[
    0x30, 0x51, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03, 0x05,
    0x00, 0x04, 0x40,
];

fn padding(hash: HashAlgorithm) -> Pkcs1v15Sign {
    let (prefix, hash_len) = match hash {
        HashAlgorithm::Sha1 => (SHA1_PREFIX, 20),
        HashAlgorithm::Sha256 => (SHA256_PREFIX, 32),
        HashAlgorithm::Sha512 => (SHA512_PREFIX, 64),
    };
    Pkcs1v15Sign {
        hash_len: Some(hash_len),
        prefix: prefix.into(),
    }
}

/// An RSA private key.
#[derive(Debug, Clone)]
pub struct RsaSigningKey {
    inner: Arc<RsaPrivateKey>,
}

impl RsaSigningKey {
    /// Parse a `BEGIN PRIVATE KEY` (PKCS#8) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not an RSA PKCS#8 key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, KeyError> {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }

    /// Decrypt and parse a `BEGIN ENCRYPTED PRIVATE KEY` (PKCS#8) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the passphrase is wrong or the
    /// document is not an RSA key.
    pub fn from_pkcs8_encrypted_pem(pem: &str, passphrase: &str) -> Result<Self, KeyError> {
        RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }

    /// Parse a `BEGIN RSA PRIVATE KEY` (PKCS#1) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not an RSA PKCS#1 key.
    pub fn from_pkcs1_pem(pem: &str) -> Result<Self, KeyError> {
        RsaPrivateKey::from_pkcs1_pem(pem)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }
}

impl From<RsaPrivateKey> for RsaSigningKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self {
            inner: Arc::new(key),
        }
    }
}

impl PrivateKey for RsaSigningKey {
    fn key_type(&self) -> KeyType {
        KeyType::Rsa
    }

    fn default_hash(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    fn create_sign(&self, hash: HashAlgorithm) -> Result<Box<dyn StreamSigner>, KeyError> {
        Ok(Box::new(RsaStreamSigner {
            key: Arc::clone(&self.inner),
            hash,
            digest: HashContext::new(hash),
        }))
    }
}

struct RsaStreamSigner {
    key: Arc<RsaPrivateKey>,
    hash: HashAlgorithm,
    digest: HashContext,
}

impl StreamSigner for RsaStreamSigner {
    fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    fn sign(self: Box<Self>) -> Result<KeySignature, KeyError> {
        let Self { key, hash, digest } = *self;
        let bytes = key
            .sign(padding(hash), &digest.finalize())
            .map_err(|e| KeyError::SigningFailed(e.to_string()))?;
        Ok(KeySignature::new(hash, bytes))
    }
}

/// An RSA public key.
#[derive(Debug, Clone)]
pub struct RsaVerifyingKey {
    inner: Arc<RsaPublicKey>,
}

impl RsaVerifyingKey {
    /// Parse a `BEGIN PUBLIC KEY` (SPKI) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not an RSA public key.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, KeyError> {
        RsaPublicKey::from_public_key_pem(pem)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }

    /// Parse a `BEGIN RSA PUBLIC KEY` (PKCS#1) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not an RSA public key.
    pub fn from_pkcs1_pem(pem: &str) -> Result<Self, KeyError> {
        RsaPublicKey::from_pkcs1_pem(pem)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }
}

impl From<RsaPublicKey> for RsaVerifyingKey {
    fn from(key: RsaPublicKey) -> Self {
        Self {
            inner: Arc::new(key),
        }
    }
}

impl PublicKey for RsaVerifyingKey {
    fn key_type(&self) -> KeyType {
        KeyType::Rsa
    }

    fn default_hash(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    fn create_verify(&self, hash: HashAlgorithm) -> Box<dyn StreamVerifier> {
        Box::new(RsaStreamVerifier {
            key: Arc::clone(&self.inner),
            hash,
            digest: HashContext::new(hash),
        })
    }
}

struct RsaStreamVerifier {
    key: Arc<RsaPublicKey>,
    hash: HashAlgorithm,
    digest: HashContext,
}

impl StreamVerifier for RsaStreamVerifier {
    fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    fn verify(self: Box<Self>, signature: &str) -> bool {
        let Some(signature) = decode_signature(signature) else {
            return false;
        };
        let Self { key, hash, digest } = *self;
        key.verify(padding(hash), &digest.finalize(), &signature).is_ok()
    }
}
