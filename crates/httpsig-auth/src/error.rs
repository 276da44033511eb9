//! Error types for HTTP signature construction and parsing.
//!
//! Signing and parsing failures are represented by [`HttpSigError`]. Failures
//! raised by a key provider while loading or using key material are
//! represented by [`KeyError`] and wrapped in [`HttpSigError::Key`].
//!
//! Verification never produces an error: `verify_signature` and `verify_hmac`
//! answer `false` without saying why.

/// Errors that can occur while signing a request or parsing a signature.
#[derive(Debug, thiserror::Error)]
pub enum HttpSigError {
    /// The algorithm is unknown, malformed, or does not match the key type.
    #[error("Invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    /// A header or pseudo-header required for signing was absent or empty.
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// The deprecated `request-line` pseudo-header was used in strict mode.
    #[error("request-line is not a valid header with strict parsing enabled: {0}")]
    StrictParsing(String),

    /// The caller violated an API contract (missing key id, nothing to sign, ...).
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The key provider failed to load or use a key.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// The key signer reported a different hash than the one requested.
    #[error("Key signer used {actual} but {expected} was requested")]
    HashMismatch {
        /// The hash algorithm that was resolved for the request.
        expected: String,
        /// The hash algorithm the signer reported.
        actual: String,
    },

    /// The key signer produced an empty signature.
    #[error("Key signer produced an empty signature")]
    EmptySignature,

    /// The external signing function failed.
    #[error("External signer failed: {0}")]
    ExternalSigner(String),

    /// The formatted signature could not be stored as a header value.
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// The configured header name is not a valid HTTP header name.
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// The request carries no signature header.
    #[error("Missing signature header: {0}")]
    MissingAuthHeader(String),

    /// The signature header could not be parsed.
    #[error("Invalid signature header: {0}")]
    InvalidAuthHeader(String),

    /// The request falls outside the accepted freshness window.
    #[error("Request has expired: {0}")]
    ExpiredRequest(String),
}

/// Errors raised by a key provider.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The key material is not in any supported format.
    #[error("Unsupported or malformed key: {0}")]
    Unsupported(String),

    /// The private key is encrypted and either no passphrase was given or
    /// the encryption format is not supported.
    #[error("Encrypted private key needs a passphrase or uses an unsupported format")]
    EncryptedKeyUnsupported,

    /// The underlying signature primitive failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}
