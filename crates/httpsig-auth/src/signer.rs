//! Incremental request signing.
//!
//! A [`RequestSigner`] is fed signing-string lines one at a time and then
//! consumed by [`RequestSigner::sign`] to produce an `Authorization` value.
//! With a private key the lines stream straight into the key's signer. With
//! an [`ExternalSigner`] (or an HMAC secret) they are buffered until `sign`.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::algorithm::{Algorithm, HS2019, HashAlgorithm, KeyType, validate_algorithm};
use crate::canonical::{CREATED, EXPIRES, REQUEST_TARGET};
use crate::clock::{Clock, rfc1123};
use crate::config::SignerOptions;
use crate::error::HttpSigError;
use crate::format::{SIGNATURE_SCHEME_PREFIX, SignatureParams, format_authz};
use crate::hash::hmac_base64;
use crate::keys::StreamSigner;
use crate::sign::resolve_private_key;

/// The result of an [`ExternalSigner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSignature {
    /// Identifier of the key that produced the signature.
    pub key_id: String,
    /// Algorithm string to emit, e.g. `rsa-sha256`.
    pub algorithm: String,
    /// Base64 signature.
    pub signature: String,
}

/// A signing function living outside this crate, e.g. an agent or HSM.
#[async_trait]
pub trait ExternalSigner: Send + Sync {
    /// Sign the complete signing string.
    ///
    /// # Errors
    ///
    /// Implementations should report failures as
    /// [`HttpSigError::ExternalSigner`].
    async fn sign(&self, data: &str) -> Result<ExternalSignature, HttpSigError>;
}

struct HmacSigner {
    key_id: String,
    hash: HashAlgorithm,
    secret: Vec<u8>,
}

#[async_trait]
impl ExternalSigner for HmacSigner {
    async fn sign(&self, data: &str) -> Result<ExternalSignature, HttpSigError> {
        Ok(ExternalSignature {
            key_id: self.key_id.clone(),
            algorithm: Algorithm::new(KeyType::Hmac, self.hash).to_string(),
            signature: hmac_base64(self.hash, &self.secret, data.as_bytes())?,
        })
    }
}

enum Backend {
    Streaming {
        stream: Box<dyn StreamSigner>,
        key_id: String,
        key_type: KeyType,
        hash: HashAlgorithm,
        hide_algorithm: bool,
    },
    Buffered {
        lines: Vec<String>,
        sign: Arc<dyn ExternalSigner>,
        hide_algorithm: bool,
    },
}

/// Builds a signature one header at a time.
///
/// # Examples
///
/// ```
/// use httpsig_auth::config::SignerOptions;
/// use httpsig_auth::signer::RequestSigner;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut signer = RequestSigner::new(
///     SignerOptions::builder()
///         .key("s3cr3t")
///         .key_id("foo")
///         .algorithm("hmac-sha256")
///         .build(),
/// )
/// .unwrap();
/// signer.write_header("date", "Tue, 07 Jun 2014 20:51:35 GMT");
/// assert_eq!(
///     signer.sign().await.unwrap(),
///     r#"Signature keyId="foo",algorithm="hmac-sha256",headers="date",signature="Lx1U92xNQ7NGvBG4kseHaZ4qzFTYMZOcicQzk+/PXPc=""#
/// );
/// # });
/// ```
pub struct RequestSigner {
    backend: Backend,
    headers: Vec<String>,
    created: Option<i64>,
    expires: Option<i64>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match self.backend {
            Backend::Streaming { .. } => "streaming",
            Backend::Buffered { .. } => "buffered",
        };
        f.debug_struct("RequestSigner")
            .field("backend", &backend)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Create a signer from `options`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpSigError::InvalidOption`] unless exactly one of `key` or
    /// `sign` is set, or when `key` is set without `key_id`.
    /// Returns [`HttpSigError::InvalidAlgorithm`] for an unknown algorithm or
    /// a key of the wrong type, and [`HttpSigError::Key`] when the key cannot
    /// be loaded.
    pub fn new(options: SignerOptions) -> Result<Self, HttpSigError> {
        let SignerOptions {
            key,
            key_id,
            algorithm,
            sign,
            key_passphrase,
            hide_algorithm,
            clock,
            key_provider,
        } = options;

        let requested = algorithm
            .as_deref()
            .map(|id| validate_algorithm(id, None))
            .transpose()?;

        let backend = match (key, sign) {
            (Some(_), Some(_)) => {
                return Err(HttpSigError::InvalidOption(
                    "key and sign are mutually exclusive".to_owned(),
                ));
            }
            (None, None) => {
                return Err(HttpSigError::InvalidOption(
                    "either key or sign is required".to_owned(),
                ));
            }
            (None, Some(sign)) => Backend::Buffered {
                lines: Vec::new(),
                sign,
                hide_algorithm: false,
            },
            (Some(key), None) => {
                let key_id = key_id.ok_or_else(|| {
                    HttpSigError::InvalidOption("key_id is required with key".to_owned())
                })?;

                match requested {
                    Some(Algorithm::Pair {
                        key_type: KeyType::Hmac,
                        hash,
                    }) => Backend::Buffered {
                        lines: Vec::new(),
                        sign: Arc::new(HmacSigner {
                            key_id,
                            hash,
                            secret: key.secret()?.to_vec(),
                        }),
                        hide_algorithm,
                    },
                    _ => {
                        let resolved = resolve_private_key(
                            &key,
                            key_provider.as_ref(),
                            key_passphrase.as_deref(),
                            requested,
                        )?;
                        Backend::Streaming {
                            stream: resolved.key.create_sign(resolved.hash)?,
                            key_id,
                            key_type: resolved.key_type,
                            hash: resolved.hash,
                            hide_algorithm: hide_algorithm
                                || requested == Some(Algorithm::Hs2019),
                        }
                    }
                }
            }
        };

        Ok(Self {
            backend,
            headers: Vec::new(),
            created: None,
            expires: None,
            clock,
        })
    }

    /// Append `name: value` to the signing string and return `value`.
    ///
    /// `name` is lowercased. Writing `(created)` or `(expires)` with an
    /// integer value also emits the matching parameter.
    pub fn write_header<'v>(&mut self, name: &str, value: &'v str) -> &'v str {
        let name = name.to_lowercase();
        let line = format!("{name}: {value}");

        match name.as_str() {
            CREATED => self.created = value.trim().parse().ok(),
            EXPIRES => self.expires = value.trim().parse().ok(),
            _ => {}
        }

        match &mut self.backend {
            Backend::Streaming { stream, .. } => {
                if !self.headers.is_empty() {
                    stream.update(b"\n");
                }
                stream.update(line.as_bytes());
            }
            Backend::Buffered { lines, .. } => lines.push(line),
        }
        self.headers.push(name);

        value
    }

    /// Write a `date` header with the current time and return its value.
    pub fn write_date_header(&mut self) -> String {
        let value = rfc1123(self.clock.now());
        self.write_header("date", &value);
        value
    }

    /// Write `(request-target)` for `method` and `path` and return its value.
    pub fn write_target(&mut self, method: &str, path: &str) -> String {
        let value = format!("{} {path}", method.to_lowercase());
        self.write_header(REQUEST_TARGET, &value);
        value
    }

    /// Finish signing and return the `Authorization` value.
    ///
    /// # Errors
    ///
    /// Returns [`HttpSigError::InvalidOption`] if nothing was written,
    /// [`HttpSigError::InvalidAlgorithm`] if an external signer reports an
    /// unknown algorithm, [`HttpSigError::EmptySignature`] for an empty
    /// signature, and whatever the key or external signer fails with.
    pub async fn sign(self) -> Result<String, HttpSigError> {
        if self.headers.is_empty() {
            return Err(HttpSigError::InvalidOption(
                "at least one header must be written before signing".to_owned(),
            ));
        }

        let (key_id, algorithm, signature) = match self.backend {
            Backend::Buffered {
                lines,
                sign,
                hide_algorithm,
            } => {
                let data = lines.join("\n");
                let result = sign.sign(&data).await?;
                validate_algorithm(&result.algorithm, None)?;
                let algorithm = if hide_algorithm {
                    HS2019.to_owned()
                } else {
                    result.algorithm
                };
                (result.key_id, algorithm, result.signature)
            }
            Backend::Streaming {
                stream,
                key_id,
                key_type,
                hash,
                hide_algorithm,
            } => {
                let signature = stream.sign()?;
                if signature.hash_algorithm() != hash {
                    debug!(
                        requested = %hash,
                        actual = %signature.hash_algorithm(),
                        "Key signer substituted hash algorithm"
                    );
                }
                let algorithm = if hide_algorithm {
                    HS2019.to_owned()
                } else {
                    Algorithm::new(key_type, signature.hash_algorithm()).to_string()
                };
                (key_id, algorithm, signature.to_base64())
            }
        };

        if signature.is_empty() {
            return Err(HttpSigError::EmptySignature);
        }

        let params = SignatureParams {
            key_id: Some(key_id),
            algorithm: Some(algorithm),
            created: self.created,
            expires: self.expires,
            headers: Some(self.headers.join(" ")),
            signature: Some(signature),
            ..SignatureParams::default()
        };
        debug!(headers = ?self.headers, "Signed request incrementally");

        Ok(format_authz(SIGNATURE_SCHEME_PREFIX, &params))
    }
}
