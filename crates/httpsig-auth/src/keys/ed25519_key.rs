//! Ed25519 keys.
//!
//! Ed25519 signs the message itself rather than a digest of it, so the
//! stream buffers its input and the requested hash is only reported back.

use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::{KeySignature, PrivateKey, PublicKey, StreamSigner, StreamVerifier, decode_signature};
use crate::algorithm::{HashAlgorithm, KeyType};
use crate::error::KeyError;

/// An Ed25519 private key.
#[derive(Debug, Clone)]
pub struct Ed25519SigningKey {
    inner: SigningKey,
}

impl Ed25519SigningKey {
    /// Parse a `BEGIN PRIVATE KEY` (PKCS#8) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not an Ed25519 key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, KeyError> {
        SigningKey::from_pkcs8_pem(pem)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }

    /// Decrypt and parse a `BEGIN ENCRYPTED PRIVATE KEY` (PKCS#8) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the passphrase is wrong or the
    /// document is not an Ed25519 key.
    pub fn from_pkcs8_encrypted_pem(pem: &str, passphrase: &str) -> Result<Self, KeyError> {
        SigningKey::from_pkcs8_encrypted_pem(pem, passphrase)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }

    /// The matching public key.
    #[must_use]
    pub fn verifying_key(&self) -> Ed25519VerifyingKey {
        Ed25519VerifyingKey::from(self.inner.verifying_key())
    }
}

impl From<SigningKey> for Ed25519SigningKey {
    fn from(inner: SigningKey) -> Self {
        Self { inner }
    }
}

impl PrivateKey for Ed25519SigningKey {
    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    fn default_hash(&self) -> HashAlgorithm {
        HashAlgorithm::Sha512
    }

    fn create_sign(&self, hash: HashAlgorithm) -> Result<Box<dyn StreamSigner>, KeyError> {
        Ok(Box::new(Ed25519StreamSigner {
            key: self.inner.clone(),
            hash,
            message: Vec::new(),
        }))
    }
}

struct Ed25519StreamSigner {
    key: SigningKey,
    hash: HashAlgorithm,
    message: Vec<u8>,
}

impl StreamSigner for Ed25519StreamSigner {
    fn update(&mut self, data: &[u8]) {
        self.message.extend_from_slice(data);
    }

    fn sign(self: Box<Self>) -> Result<KeySignature, KeyError> {
        let signature = self.key.sign(&self.message);
        Ok(KeySignature::new(self.hash, signature.to_bytes().to_vec()))
    }
}

/// An Ed25519 public key.
#[derive(Debug, Clone)]
pub struct Ed25519VerifyingKey {
    inner: VerifyingKey,
}

impl Ed25519VerifyingKey {
    /// Parse a `BEGIN PUBLIC KEY` (SPKI) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not an Ed25519 key.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, KeyError> {
        VerifyingKey::from_public_key_pem(pem)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }
}

impl From<VerifyingKey> for Ed25519VerifyingKey {
    fn from(inner: VerifyingKey) -> Self {
        Self { inner }
    }
}

impl PublicKey for Ed25519VerifyingKey {
    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    fn default_hash(&self) -> HashAlgorithm {
        HashAlgorithm::Sha512
    }

    fn create_verify(&self, _hash: HashAlgorithm) -> Box<dyn StreamVerifier> {
        Box::new(Ed25519StreamVerifier {
            key: self.inner,
            message: Vec::new(),
        })
    }
}

struct Ed25519StreamVerifier {
    key: VerifyingKey,
    message: Vec<u8>,
}

impl StreamVerifier for Ed25519StreamVerifier {
    fn update(&mut self, data: &[u8]) {
        self.message.extend_from_slice(data);
    }

    fn verify(self: Box<Self>, signature: &str) -> bool {
        let Some(bytes) = decode_signature(signature) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&bytes) else {
            return false;
        };
        self.key.verify(&self.message, &signature).is_ok()
    }
}
