//! One-shot request signing.
//!
//! [`sign_request`] adds a `Date` header when the request has none, builds
//! the signing string for the configured header list, signs it and writes
//! the formatted signature into the configured header (`Authorization` by
//! default).

use std::sync::Arc;

use http::header::{DATE, HeaderName, HeaderValue};
use http::request::Parts;
use http::uri::PathAndQuery;
use http::{HeaderMap, Method, Request, Uri};
use tracing::debug;

use crate::algorithm::{Algorithm, HS2019, HashAlgorithm, KeyType, validate_algorithm};
use crate::canonical::{SigningContext, build_signing_string};
use crate::clock::rfc1123;
use crate::config::{KeyMaterial, SignOptions};
use crate::error::HttpSigError;
use crate::format::{SignatureParams, format_authz, scheme_prefix};
use crate::hash::hmac_base64;
use crate::keys::{KeyProvider, PrivateKey};

/// A private key resolved against the requested algorithm.
pub(crate) struct ResolvedKey {
    pub(crate) key: Arc<dyn PrivateKey>,
    pub(crate) key_type: KeyType,
    pub(crate) hash: HashAlgorithm,
}

/// Load `material` as a private key and reconcile it with `algorithm`.
///
/// `hs2019` or no algorithm selects the key's own type and default hash.
pub(crate) fn resolve_private_key(
    material: &KeyMaterial,
    provider: &dyn KeyProvider,
    passphrase: Option<&str>,
    algorithm: Option<Algorithm>,
) -> Result<ResolvedKey, HttpSigError> {
    let key: Arc<dyn PrivateKey> = match material {
        KeyMaterial::Private(key) => Arc::clone(key),
        KeyMaterial::Bytes(bytes) => Arc::from(provider.parse_private_key(bytes, passphrase)?),
    };

    let key_type = key.key_type();
    if !key_type.is_asymmetric() {
        return Err(HttpSigError::InvalidAlgorithm(format!(
            "{} type keys are not supported",
            key_type.as_str().to_uppercase()
        )));
    }

    if let Some(expected) = algorithm.and_then(|a| a.key_type()) {
        if expected != key_type {
            return Err(HttpSigError::InvalidAlgorithm(format!(
                "options.key must be a {} key, was given a {} key instead",
                expected.as_str().to_uppercase(),
                key_type.as_str().to_uppercase()
            )));
        }
    }

    let hash = algorithm
        .and_then(|a| a.hash())
        .unwrap_or_else(|| key.default_hash());

    Ok(ResolvedKey {
        key,
        key_type,
        hash,
    })
}

/// Sign `parts` in place.
///
/// # Errors
///
/// Returns [`HttpSigError::InvalidAlgorithm`] for an unknown algorithm or a
/// key of the wrong type, [`HttpSigError::MissingHeader`] when a signed name
/// has no value, [`HttpSigError::StrictParsing`] for `request-line` in strict
/// mode, and [`HttpSigError::Key`] when the key cannot be loaded or used.
///
/// # Examples
///
/// ```
/// use httpsig_auth::config::SignOptions;
/// use httpsig_auth::sign::sign_request;
///
/// let (mut parts, ()) = http::Request::get("/foo")
///     .header("date", "Tue, 07 Jun 2014 20:51:35 GMT")
///     .body(())
///     .unwrap()
///     .into_parts();
/// let options = SignOptions::builder()
///     .key("s3cr3t")
///     .key_id("foo")
///     .algorithm("hmac-sha256")
///     .build();
/// sign_request(&mut parts, &options).unwrap();
/// assert_eq!(
///     parts.headers["authorization"],
///     r#"Signature keyId="foo",algorithm="hmac-sha256",headers="date",signature="Lx1U92xNQ7NGvBG4kseHaZ4qzFTYMZOcicQzk+/PXPc=""#
/// );
/// ```
pub fn sign_request(parts: &mut Parts, options: &SignOptions) -> Result<(), HttpSigError> {
    sign_components(&parts.method, &parts.uri, &mut parts.headers, options)
}

/// Sign a full [`http::Request`] in place.
///
/// # Errors
///
/// See [`sign_request`].
pub fn sign_http_request<B>(
    request: &mut Request<B>,
    options: &SignOptions,
) -> Result<(), HttpSigError> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    sign_components(&method, &uri, request.headers_mut(), options)
}

fn sign_components(
    method: &Method,
    uri: &Uri,
    headers: &mut HeaderMap,
    options: &SignOptions,
) -> Result<(), HttpSigError> {
    let now = options.clock.now();
    if !headers.contains_key(DATE) {
        headers.insert(DATE, HeaderValue::from_str(&rfc1123(now))?);
    }

    let requested = options
        .algorithm
        .as_deref()
        .map(|id| validate_algorithm(id, None))
        .transpose()?;
    let hide_algorithm = options.hide_algorithm || requested == Some(Algorithm::Hs2019);

    let signer = if requested.is_some_and(|a| a.is_hmac()) {
        Signer::Hmac {
            secret: options.key.secret()?,
            hash: requested.and_then(|a| a.hash()).unwrap_or(HashAlgorithm::Sha256),
        }
    } else {
        Signer::Key(resolve_private_key(
            &options.key,
            options.key_provider.as_ref(),
            options.key_passphrase.as_deref(),
            requested,
        )?)
    };

    let algorithm = if hide_algorithm {
        HS2019.to_owned()
    } else {
        signer.algorithm().to_string()
    };
    let opaque = options.opaque.as_deref().filter(|v| !v.is_empty());

    let created = now.timestamp();
    let expires = created.checked_add(options.expires_in).ok_or_else(|| {
        HttpSigError::InvalidOption(format!(
            "expires_in {} overflows the expiry timestamp",
            options.expires_in
        ))
    })?;
    let ctx = SigningContext {
        method: method.as_str(),
        path: uri.path_and_query().map_or("/", PathAndQuery::as_str),
        http_version: &options.http_version,
        key_id: &options.key_id,
        algorithm: &algorithm,
        opaque,
        created: Some(created),
        expires: Some(expires),
        strict: options.strict,
    };
    let signing = build_signing_string(&options.headers, &*headers, &ctx)?;
    let signature = signer.sign(signing.as_str())?;

    let params = SignatureParams {
        key_id: Some(options.key_id.clone()),
        algorithm: Some(algorithm),
        created: signing.created(),
        expires: signing.expires(),
        opaque: opaque.map(str::to_owned),
        headers: Some(signing.headers_param()),
        signature: Some(signature),
    };

    let header_name = HeaderName::from_bytes(options.authorization_header_name.as_bytes())?;
    let value = format_authz(scheme_prefix(&options.authorization_header_name), &params);
    debug!(
        key_id = %options.key_id,
        header = %header_name,
        headers = ?signing.headers(),
        "Signed request"
    );
    headers.insert(header_name, HeaderValue::from_str(&value)?);

    Ok(())
}

enum Signer<'a> {
    Hmac { secret: &'a [u8], hash: HashAlgorithm },
    Key(ResolvedKey),
}

impl Signer<'_> {
    fn algorithm(&self) -> Algorithm {
        match self {
            Self::Hmac { hash, .. } => Algorithm::new(KeyType::Hmac, *hash),
            Self::Key(resolved) => Algorithm::new(resolved.key_type, resolved.hash),
        }
    }

    fn sign(&self, data: &str) -> Result<String, HttpSigError> {
        match self {
            Self::Hmac { secret, hash } => hmac_base64(*hash, secret, data.as_bytes()),
            Self::Key(resolved) => {
                let mut stream = resolved.key.create_sign(resolved.hash)?;
                stream.update(data.as_bytes());
                let signature = stream.sign()?;
                if signature.hash_algorithm() != resolved.hash {
                    return Err(HttpSigError::HashMismatch {
                        expected: resolved.hash.to_string(),
                        actual: signature.hash_algorithm().to_string(),
                    });
                }
                if signature.is_empty() {
                    return Err(HttpSigError::EmptySignature);
                }
                Ok(signature.to_base64())
            }
        }
    }
}
