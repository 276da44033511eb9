//! ECDSA keys on the NIST P-256 curve.
//!
//! The message is digested with the requested hash and the prehash is
//! signed. Signatures travel as ASN.1 DER.

use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePrivateKey, DecodePublicKey};

use super::{KeySignature, PrivateKey, PublicKey, StreamSigner, StreamVerifier, decode_signature};
use crate::algorithm::{HashAlgorithm, KeyType};
use crate::error::KeyError;
use crate::hash::HashContext;

/// A P-256 private key.
#[derive(Debug, Clone)]
pub struct EcdsaSigningKey {
    inner: SigningKey,
}

impl EcdsaSigningKey {
    /// Parse a `BEGIN PRIVATE KEY` (PKCS#8) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not a P-256 key.
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
    /// document is not a P-256 key.
    pub fn from_pkcs8_encrypted_pem(pem: &str, passphrase: &str) -> Result<Self, KeyError> {
        SigningKey::from_pkcs8_encrypted_pem(pem, passphrase)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }

    /// Parse a `BEGIN EC PRIVATE KEY` (SEC1) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not a P-256 key.
    pub fn from_sec1_pem(pem: &str) -> Result<Self, KeyError> {
        p256::SecretKey::from_sec1_pem(pem)
            .map(|secret| Self::from(SigningKey::from(secret)))
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }
}

impl From<SigningKey> for EcdsaSigningKey {
    fn from(inner: SigningKey) -> Self {
        Self { inner }
    }
}

impl PrivateKey for EcdsaSigningKey {
    fn key_type(&self) -> KeyType {
        KeyType::Ecdsa
    }

    fn default_hash(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    fn create_sign(&self, hash: HashAlgorithm) -> Result<Box<dyn StreamSigner>, KeyError> {
        Ok(Box::new(EcdsaStreamSigner {
            key: self.inner.clone(),
            hash,
            digest: HashContext::new(hash),
        }))
    }
}

struct EcdsaStreamSigner {
    key: SigningKey,
    hash: HashAlgorithm,
    digest: HashContext,
}

impl StreamSigner for EcdsaStreamSigner {
    fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    fn sign(self: Box<Self>) -> Result<KeySignature, KeyError> {
        let Self { key, hash, digest } = *self;
        let signature: Signature = key
            .sign_prehash(&digest.finalize())
            .map_err(|e| KeyError::SigningFailed(e.to_string()))?;
        Ok(KeySignature::new(hash, signature.to_der().as_bytes().to_vec()))
    }
}

/// A P-256 public key.
#[derive(Debug, Clone)]
pub struct EcdsaVerifyingKey {
    inner: VerifyingKey,
}

impl EcdsaVerifyingKey {
    /// Parse a `BEGIN PUBLIC KEY` (SPKI) PEM document.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Unsupported`] if the document is not a P-256 key.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, KeyError> {
        VerifyingKey::from_public_key_pem(pem)
            .map(Self::from)
            .map_err(|e| KeyError::Unsupported(e.to_string()))
    }
}

impl From<VerifyingKey> for EcdsaVerifyingKey {
    fn from(inner: VerifyingKey) -> Self {
        Self { inner }
    }
}

impl PublicKey for EcdsaVerifyingKey {
    fn key_type(&self) -> KeyType {
        KeyType::Ecdsa
    }

    fn default_hash(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    fn create_verify(&self, hash: HashAlgorithm) -> Box<dyn StreamVerifier> {
        Box::new(EcdsaStreamVerifier {
            key: self.inner.clone(),
            digest: HashContext::new(hash),
        })
    }
}

struct EcdsaStreamVerifier {
    key: VerifyingKey,
    digest: HashContext,
}

impl StreamVerifier for EcdsaStreamVerifier {
    fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    fn verify(self: Box<Self>, signature: &str) -> bool {
        let Some(der) = decode_signature(signature) else {
            return false;
        };
        let Ok(signature) = Signature::from_der(&der) else {
            return false;
        };
        let Self { key, digest } = *self;
        key.verify_prehash(&digest.finalize(), &signature).is_ok()
    }
}
