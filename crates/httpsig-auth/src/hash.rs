//! Digest and HMAC primitives selected by [`HashAlgorithm`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use digest::Digest;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::algorithm::HashAlgorithm;
use crate::error::HttpSigError;

/// A streaming digest over one of the supported hashes.
pub(crate) enum HashContext {
    Sha1(Sha1),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl HashContext {
    pub(crate) fn new(hash: HashAlgorithm) -> Self {
        match hash {
            HashAlgorithm::Sha1 => Self::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    pub(crate) fn finalize(self) -> Vec<u8> {
        match self {
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

/// Compute `HMAC(key, data)` and return the raw bytes.
pub(crate) fn hmac(hash: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, HttpSigError> {
    macro_rules! mac_with {
        ($digest:ty) => {{
            let mut mac = <Hmac<$digest>>::new_from_slice(key)
                .map_err(|_| HttpSigError::InvalidOption("HMAC secret rejected".to_owned()))?;
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }};
    }

    Ok(match hash {
        HashAlgorithm::Sha1 => mac_with!(Sha1),
        HashAlgorithm::Sha256 => mac_with!(Sha256),
        HashAlgorithm::Sha512 => mac_with!(Sha512),
    })
}

/// Compute `Base64(HMAC(key, data))`.
pub(crate) fn hmac_base64(
    hash: HashAlgorithm,
    key: &[u8],
    data: &[u8],
) -> Result<String, HttpSigError> {
    hmac(hash, key, data).map(|mac| BASE64.encode(mac))
}
