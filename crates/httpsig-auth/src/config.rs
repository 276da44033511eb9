//! Options for signing and parsing.
//!
//! [`SignOptions`] drives the one-shot [`crate::sign::sign_request`],
//! [`SignerOptions`] the incremental [`crate::signer::RequestSigner`], and
//! [`ParseOptions`] the inbound [`crate::parser::parse_request`]. All three
//! are built with `typed-builder`; unset fields take the defaults of the
//! HTTP Signatures scheme.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::canonical::DEFAULT_EXPIRES_IN;
use crate::clock::{Clock, SystemClock};
use crate::error::HttpSigError;
use crate::keys::{KeyProvider, PemKeyProvider, PrivateKey};
use crate::signer::ExternalSigner;

/// Default header that receives the signature.
pub const DEFAULT_AUTHORIZATION_HEADER: &str = "Authorization";

/// Default tolerance, in seconds, between the request `Date` and local time.
pub const DEFAULT_CLOCK_SKEW: i64 = 300;

/// Key material handed to a signer.
///
/// Bytes are a shared secret for `hmac-*` algorithms and PEM text for
/// everything else. An already parsed key skips the key provider.
#[derive(Clone)]
pub enum KeyMaterial {
    /// A shared secret or serialized private key.
    Bytes(Vec<u8>),
    /// A parsed private key.
    Private(Arc<dyn PrivateKey>),
}

impl KeyMaterial {
    /// The shared secret, for HMAC signing.
    ///
    /// # Errors
    ///
    /// Returns [`HttpSigError::InvalidOption`] if this is a parsed private key.
    pub fn secret(&self) -> Result<&[u8], HttpSigError> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Private(_) => Err(HttpSigError::InvalidOption(
                "HMAC signing requires a shared secret, not a private key".to_owned(),
            )),
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "KeyMaterial::Bytes(<{} bytes>)", bytes.len()),
            Self::Private(key) => f.debug_tuple("KeyMaterial::Private").field(key).finish(),
        }
    }
}

impl From<&str> for KeyMaterial {
    fn from(value: &str) -> Self {
        Self::Bytes(value.as_bytes().to_vec())
    }
}

impl From<String> for KeyMaterial {
    fn from(value: String) -> Self {
        Self::Bytes(value.into_bytes())
    }
}

impl From<&[u8]> for KeyMaterial {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Arc<dyn PrivateKey>> for KeyMaterial {
    fn from(value: Arc<dyn PrivateKey>) -> Self {
        Self::Private(value)
    }
}

fn default_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

fn default_key_provider() -> Arc<dyn KeyProvider> {
    Arc::new(PemKeyProvider)
}

/// Options for signing a whole request at once.
///
/// # Examples
///
/// ```
/// use httpsig_auth::config::SignOptions;
///
/// let options = SignOptions::builder()
///     .key("s3cr3t")
///     .key_id("my-key")
///     .algorithm("hmac-sha256")
///     .build();
/// assert_eq!(options.headers, vec!["date".to_owned()]);
/// assert_eq!(options.http_version, "1.1");
/// assert_eq!(options.authorization_header_name, "Authorization");
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct SignOptions {
    /// Shared secret (HMAC) or private key.
    #[builder(setter(into))]
    pub key: KeyMaterial,

    /// Identifier the verifier uses to find the key.
    #[builder(setter(into))]
    pub key_id: String,

    /// Algorithm such as `rsa-sha256`; derived from the key when unset.
    #[builder(default, setter(strip_option, into))]
    pub algorithm: Option<String>,

    /// Ordered header and pseudo-header names to sign.
    #[builder(default = vec![String::from("date")])]
    pub headers: Vec<String>,

    /// HTTP version rendered by `request-line`.
    #[builder(default = String::from("1.1"), setter(into))]
    pub http_version: String,

    /// Reject the deprecated `request-line` pseudo-header.
    #[builder(default = false)]
    pub strict: bool,

    /// Seconds added to the current time for `(expires)`.
    #[builder(default = DEFAULT_EXPIRES_IN)]
    pub expires_in: i64,

    /// Passphrase for an encrypted private key.
    #[builder(default, setter(strip_option, into))]
    pub key_passphrase: Option<String>,

    /// Emit `hs2019` instead of the concrete algorithm.
    #[builder(default = false)]
    pub hide_algorithm: bool,

    /// Value for the `opaque` parameter and `(opaque)` pseudo-header.
    #[builder(default, setter(strip_option, into))]
    pub opaque: Option<String>,

    /// Header that receives the signature.
    #[builder(default = String::from(DEFAULT_AUTHORIZATION_HEADER), setter(into))]
    pub authorization_header_name: String,

    /// Time source for `date`, `(created)` and `(expires)`.
    #[builder(default = default_clock())]
    pub clock: Arc<dyn Clock>,

    /// Parser for serialized private keys.
    #[builder(default = default_key_provider())]
    pub key_provider: Arc<dyn KeyProvider>,
}

/// Options for an incremental [`crate::signer::RequestSigner`].
///
/// Exactly one of `key` or `sign` must be set.
#[derive(Clone, TypedBuilder)]
pub struct SignerOptions {
    /// Shared secret (with an `hmac-*` algorithm) or private key.
    #[builder(default, setter(strip_option, into))]
    pub key: Option<KeyMaterial>,

    /// Identifier of `key`; required with `key`.
    #[builder(default, setter(strip_option, into))]
    pub key_id: Option<String>,

    /// Algorithm such as `ed25519-sha512`; derived from the key when unset.
    #[builder(default, setter(strip_option, into))]
    pub algorithm: Option<String>,

    /// External signing function used instead of `key`.
    #[builder(default, setter(strip_option))]
    pub sign: Option<Arc<dyn ExternalSigner>>,

    /// Passphrase for an encrypted private key.
    #[builder(default, setter(strip_option, into))]
    pub key_passphrase: Option<String>,

    /// Emit `hs2019` instead of the concrete algorithm.
    #[builder(default = false)]
    pub hide_algorithm: bool,

    /// Time source for `write_date_header`.
    #[builder(default = default_clock())]
    pub clock: Arc<dyn Clock>,

    /// Parser for serialized private keys.
    #[builder(default = default_key_provider())]
    pub key_provider: Arc<dyn KeyProvider>,
}

impl fmt::Debug for SignerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerOptions")
            .field("key", &self.key)
            .field("key_id", &self.key_id)
            .field("algorithm", &self.algorithm)
            .field("sign", &self.sign.is_some())
            .field("hide_algorithm", &self.hide_algorithm)
            .field("clock", &self.clock)
            .field("key_provider", &self.key_provider)
            .finish_non_exhaustive()
    }
}

/// Options for parsing an inbound signature.
///
/// # Examples
///
/// ```
/// use httpsig_auth::config::ParseOptions;
///
/// let options = ParseOptions::default();
/// assert_eq!(options.clock_skew, 300);
/// assert_eq!(options.authorization_header_name, "authorization");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Maximum allowed distance, in seconds, between `Date` and local time.
    #[builder(default = DEFAULT_CLOCK_SKEW)]
    pub clock_skew: i64,

    /// Names that must be covered by the signature. `None` requires `date`
    /// (or `x-date` when the request carries it).
    #[builder(default, setter(strip_option))]
    pub required_headers: Option<Vec<String>>,

    /// Reject the deprecated `request-line` pseudo-header.
    #[builder(default = false)]
    pub strict: bool,

    /// Header that carries the signature.
    #[builder(default = String::from("authorization"), setter(into))]
    pub authorization_header_name: String,

    /// Time source for freshness checks.
    #[serde(skip, default = "default_clock")]
    #[builder(default = default_clock())]
    pub clock: Arc<dyn Clock>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ParseOptions {
    /// Load parser options from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HTTPSIG_CLOCK_SKEW` | `300` |
    /// | `HTTPSIG_REQUIRED_HEADERS` | unset (`date`) |
    /// | `HTTPSIG_STRICT` | `false` |
    /// | `HTTPSIG_AUTHORIZATION_HEADER` | `authorization` |
    ///
    /// `HTTPSIG_REQUIRED_HEADERS` is a space-separated list.
    #[must_use]
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(v) = std::env::var("HTTPSIG_CLOCK_SKEW") {
            if let Ok(n) = v.parse::<i64>() {
                options.clock_skew = n;
            }
        }
        if let Ok(v) = std::env::var("HTTPSIG_REQUIRED_HEADERS") {
            options.required_headers = Some(v.split_whitespace().map(str::to_lowercase).collect());
        }
        if let Ok(v) = std::env::var("HTTPSIG_STRICT") {
            options.strict = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("HTTPSIG_AUTHORIZATION_HEADER") {
            options.authorization_header_name = v;
        }

        options
    }
}

/// Parse a boolean from an environment variable value.
fn parse_bool(s: &str) -> bool {
    s == "1" || s.eq_ignore_ascii_case("true")
}
