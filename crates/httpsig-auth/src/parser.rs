//! Inbound signature parsing.
//!
//! [`parse_request`] reads the signature header of a received request,
//! rebuilds the signing string the sender must have signed and checks the
//! request is fresh. The resulting [`ParsedSignature`] is handed to
//! [`crate::verify::verify_signature`] or [`crate::verify::verify_hmac`]
//! once the caller has looked up the key named by `key_id`.

use std::collections::HashMap;

use http::Version;
use http::request::Parts;
use http::uri::PathAndQuery;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::algorithm::{HS2019, validate_algorithm};
use crate::canonical::{HeaderSource, SigningContext, build_signing_string};
use crate::clock::parse_rfc1123;
use crate::config::ParseOptions;
use crate::error::HttpSigError;
use crate::format::{SIGNATURE_HEADER, SIGNATURE_SCHEME_PREFIX, SignatureParams};

const DATE: &str = "date";
const X_DATE: &str = "x-date";

/// A signature read from a request, ready for verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSignature {
    /// Authentication scheme, `Signature`.
    pub scheme: String,
    /// Algorithm as sent; `hs2019` when the sender omitted it.
    pub algorithm: String,
    /// Identifier of the signing key.
    pub key_id: String,
    /// The reconstructed string the signature covers.
    pub signing_string: String,
    /// Lowercased signed names, in order.
    pub headers: Vec<String>,
    /// All parameters as received.
    pub params: SignatureParams,
}

impl ParsedSignature {
    /// The base64 signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        self.params.signature.as_deref().unwrap_or_default()
    }
}

/// Parse and check the signature carried by `parts`.
///
/// # Errors
///
/// - [`HttpSigError::MissingAuthHeader`] if the signature header is absent.
/// - [`HttpSigError::InvalidAuthHeader`] for a wrong scheme, malformed or
///   duplicate parameters, a missing `keyId` or `signature`, or an
///   unparseable date.
/// - [`HttpSigError::InvalidAlgorithm`] for an unknown algorithm.
/// - [`HttpSigError::MissingHeader`] if a signed header is absent from the
///   request or a required header was not signed.
/// - [`HttpSigError::StrictParsing`] for `request-line` in strict mode.
/// - [`HttpSigError::ExpiredRequest`] when the request is outside the
///   accepted clock skew or past its `expires`.
pub fn parse_request(parts: &Parts, options: &ParseOptions) -> Result<ParsedSignature, HttpSigError> {
    let header_name = options.authorization_header_name.to_lowercase();
    let raw = parts
        .headers
        .get(header_name.as_str())
        .ok_or_else(|| HttpSigError::MissingAuthHeader(header_name.clone()))?
        .to_str()
        .map_err(|_| HttpSigError::InvalidAuthHeader(format!("{header_name} is not valid text")))?;

    let scheme = SIGNATURE_SCHEME_PREFIX.trim_end();
    let param_list = if header_name == SIGNATURE_HEADER {
        raw
    } else {
        let (sent, rest) = raw.trim_start().split_once(' ').ok_or_else(|| {
            HttpSigError::InvalidAuthHeader("missing signature parameters".to_owned())
        })?;
        if !sent.eq_ignore_ascii_case(scheme) {
            return Err(HttpSigError::InvalidAuthHeader(format!(
                "scheme was {sent}, expected {scheme}"
            )));
        }
        rest
    };

    let mut values = parse_params(param_list)?;
    let key_id = values
        .remove("keyId")
        .ok_or_else(|| HttpSigError::InvalidAuthHeader("keyId was not specified".to_owned()))?;
    let signature = values
        .remove("signature")
        .ok_or_else(|| HttpSigError::InvalidAuthHeader("signature was not specified".to_owned()))?;
    let algorithm = values.remove("algorithm").unwrap_or_else(|| HS2019.to_owned());
    validate_algorithm(&algorithm, None)?;

    let created = values
        .remove("created")
        .map(|v| parse_timestamp("created", &v))
        .transpose()?;
    let expires = values
        .remove("expires")
        .map(|v| parse_timestamp("expires", &v))
        .transpose()?;
    let opaque = values.remove("opaque");

    let headers: Vec<String> = match values.remove("headers") {
        Some(list) => list.split_whitespace().map(str::to_lowercase).collect(),
        None => vec![default_date_header(&parts.headers).to_owned()],
    };
    if headers.is_empty() {
        return Err(HttpSigError::InvalidAuthHeader("headers was empty".to_owned()));
    }

    let ctx = SigningContext {
        method: parts.method.as_str(),
        path: parts.uri.path_and_query().map_or("/", PathAndQuery::as_str),
        http_version: http_version(parts.version),
        key_id: &key_id,
        algorithm: &algorithm,
        opaque: opaque.as_deref(),
        created,
        expires,
        strict: options.strict,
    };
    let signing = build_signing_string(&headers, &parts.headers, &ctx)?;

    check_freshness(parts, &headers, created, expires, options)?;

    let required = options
        .required_headers
        .clone()
        .unwrap_or_else(|| vec![default_date_header(&parts.headers).to_owned()]);
    for name in required {
        let name = name.to_lowercase();
        if !headers.contains(&name) {
            return Err(HttpSigError::MissingHeader(name));
        }
    }

    debug!(key_id = %key_id, algorithm = %algorithm, headers = ?headers, "Parsed signature");

    Ok(ParsedSignature {
        scheme: scheme.to_owned(),
        params: SignatureParams {
            key_id: Some(key_id.clone()),
            algorithm: Some(algorithm.clone()),
            created,
            expires,
            opaque,
            headers: Some(headers.join(" ")),
            signature: Some(signature),
        },
        algorithm,
        key_id,
        signing_string: signing.into_string(),
        headers,
    })
}

fn check_freshness(
    parts: &Parts,
    headers: &[String],
    created: Option<i64>,
    expires: Option<i64>,
    options: &ParseOptions,
) -> Result<(), HttpSigError> {
    let now = options.clock.now().timestamp();

    for name in [DATE, X_DATE] {
        if !headers.iter().any(|h| h == name) {
            continue;
        }
        let Some(value) = parts.headers.header_value(name) else {
            continue;
        };
        let date = parse_rfc1123(&value).ok_or_else(|| {
            HttpSigError::InvalidAuthHeader(format!("{name} is not an RFC 1123 date"))
        })?;
        let skew = now.saturating_sub(date.timestamp()).saturating_abs();
        if skew > options.clock_skew {
            return Err(HttpSigError::ExpiredRequest(format!(
                "clock skew of {skew}s exceeds {}s",
                options.clock_skew
            )));
        }
    }

    let signed = |name: &str| headers.iter().any(|h| h == name);
    if let Some(created) = created.filter(|_| signed("(created)")) {
        if created > now.saturating_add(options.clock_skew) {
            return Err(HttpSigError::ExpiredRequest(format!(
                "created {created} is in the future"
            )));
        }
    }
    if let Some(expires) = expires.filter(|_| signed("(expires)")) {
        if expires < now {
            return Err(HttpSigError::ExpiredRequest(format!("expired at {expires}")));
        }
    }

    Ok(())
}

/// `x-date` when the request carries one, `date` otherwise.
fn default_date_header(headers: &http::HeaderMap) -> &'static str {
    if headers.contains_key(X_DATE) { X_DATE } else { DATE }
}

fn http_version(version: Version) -> &'static str {
    [
        (Version::HTTP_09, "0.9"),
        (Version::HTTP_10, "1.0"),
        (Version::HTTP_2, "2.0"),
        (Version::HTTP_3, "3.0"),
    ]
    .into_iter()
    .find_map(|(v, s)| (v == version).then_some(s))
    .unwrap_or("1.1")
}

fn parse_timestamp(name: &str, value: &str) -> Result<i64, HttpSigError> {
    value
        .trim()
        .parse()
        .map_err(|_| HttpSigError::InvalidAuthHeader(format!("{name} must be an integer")))
}

/// Split `name="value"` / `name=value` pairs separated by commas.
fn parse_params(input: &str) -> Result<HashMap<String, String>, HttpSigError> {
    let invalid = |msg: &str| HttpSigError::InvalidAuthHeader(msg.to_owned());
    let mut params = HashMap::new();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let (name, after) = rest
            .split_once('=')
            .ok_or_else(|| invalid("expected name=value"))?;
        let name = name.trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(HttpSigError::InvalidAuthHeader(format!(
                "invalid parameter name {name:?}"
            )));
        }

        let after = after.trim_start();
        let (value, remainder) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted
                .find('"')
                .ok_or_else(|| invalid("unterminated quoted value"))?;
            (&quoted[..end], &quoted[end + 1..])
        } else {
            let end = after.find(',').unwrap_or(after.len());
            (after[..end].trim(), &after[end..])
        };

        if params.insert(name.to_owned(), value.to_owned()).is_some() {
            return Err(HttpSigError::InvalidAuthHeader(format!(
                "duplicate parameter {name}"
            )));
        }

        let remainder = remainder.trim_start();
        rest = match remainder.strip_prefix(',') {
            Some(next) => next.trim_start(),
            None if remainder.is_empty() => remainder,
            None => return Err(invalid("expected ',' between parameters")),
        };
    }

    Ok(params)
}
