//! Signing string construction.
//!
//! The signing string is one line per signed name, in the order the caller
//! listed them, joined by `\n` with no trailing newline:
//!
//! ```text
//! (request-target): post /foo?param=value&pet=dog
//! host: example.com
//! date: Tue, 07 Jun 2014 20:51:35 GMT
//! ```
//!
//! Besides real headers, the following pseudo-headers are understood:
//! `request-line`, `(request-target)`, `(keyid)`, `(algorithm)`, `(opaque)`,
//! `(created)` and `(expires)`.

use std::borrow::Cow;
use std::collections::HashMap;

use tracing::debug;

use crate::error::HttpSigError;

/// The deprecated pseudo-header rendering the whole HTTP request line.
pub const REQUEST_LINE: &str = "request-line";
/// Pseudo-header for the lowercased method and path.
pub const REQUEST_TARGET: &str = "(request-target)";
/// Pseudo-header for the key identifier.
pub const KEY_ID: &str = "(keyid)";
/// Pseudo-header for the emitted algorithm.
pub const ALGORITHM: &str = "(algorithm)";
/// Pseudo-header for the opaque parameter.
pub const OPAQUE: &str = "(opaque)";
/// Pseudo-header for the creation time.
pub const CREATED: &str = "(created)";
/// Pseudo-header for the expiry time.
pub const EXPIRES: &str = "(expires)";

/// Default lifetime, in seconds, of a signature covering `(expires)`.
pub const DEFAULT_EXPIRES_IN: i64 = 60;

/// A lookup of request header values by name.
pub trait HeaderSource {
    /// The value of header `name` (lowercase), if present.
    fn header_value(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// A header sent more than once is combined into one value, joined by `", "`
/// in the order received. A value that is not visible ASCII makes the whole
/// header count as absent.
impl HeaderSource for http::HeaderMap {
    fn header_value(&self, name: &str) -> Option<Cow<'_, str>> {
        let mut values = self.get_all(name).iter();
        let mut joined = Cow::Borrowed(values.next()?.to_str().ok()?);
        for value in values {
            let combined = joined.to_mut();
            combined.push_str(", ");
            combined.push_str(value.to_str().ok()?);
        }
        Some(joined)
    }
}

impl HeaderSource for HashMap<String, String> {
    fn header_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(|v| Cow::Borrowed(v.as_str()))
    }
}

/// Request metadata used to render pseudo-headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigningContext<'a> {
    /// HTTP method as sent (`GET`, `POST`, ...).
    pub method: &'a str,
    /// Path including the query string.
    pub path: &'a str,
    /// HTTP version without the `HTTP/` prefix.
    pub http_version: &'a str,
    /// Key identifier.
    pub key_id: &'a str,
    /// Algorithm string as emitted in the header.
    pub algorithm: &'a str,
    /// Opaque parameter, if any.
    pub opaque: Option<&'a str>,
    /// Value rendered for `(created)`.
    pub created: Option<i64>,
    /// Value rendered for `(expires)`.
    pub expires: Option<i64>,
    /// Reject `request-line`.
    pub strict: bool,
}

/// The result of [`build_signing_string`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningString {
    value: String,
    headers: Vec<String>,
    created: Option<i64>,
    expires: Option<i64>,
}

impl SigningString {
    /// The exact bytes to sign.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The lowercased names that were signed, in order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// The `headers` parameter value: the signed names joined by a space.
    #[must_use]
    pub fn headers_param(&self) -> String {
        self.headers.join(" ")
    }

    /// The `created` parameter, present when `(created)` was signed.
    #[must_use]
    pub fn created(&self) -> Option<i64> {
        self.created
    }

    /// The `expires` parameter, present when `(expires)` was signed.
    #[must_use]
    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    /// Consume and return the string to sign.
    #[must_use]
    pub fn into_string(self) -> String {
        self.value
    }
}

/// Build the signing string for `header_names`.
///
/// Names are lowercased but otherwise kept exactly as given: order is
/// preserved and duplicates are not removed.
///
/// # Errors
///
/// Returns [`HttpSigError::StrictParsing`] for `request-line` in strict mode,
/// and [`HttpSigError::MissingHeader`] when a header, `(opaque)`,
/// `(created)` or `(expires)` has no value.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use std::collections::HashMap;
/// use httpsig_auth::canonical::{build_signing_string, SigningContext};
///
/// let headers = HashMap::from([("date".to_owned(), "Tue, 07 Jun 2014 20:51:35 GMT".to_owned())]);
/// let ctx = SigningContext { method: "GET", path: "/", ..SigningContext::default() };
/// let signing = build_signing_string(&["(request-target)", "Date"], &headers, &ctx).unwrap();
/// assert_eq!(signing.as_str(), "(request-target): get /\ndate: Tue, 07 Jun 2014 20:51:35 GMT");
/// ```
pub fn build_signing_string<S: AsRef<str>>(
    header_names: &[S],
    source: &dyn HeaderSource,
    ctx: &SigningContext<'_>,
) -> Result<SigningString, HttpSigError> {
    let mut lines = Vec::with_capacity(header_names.len());
    let mut headers = Vec::with_capacity(header_names.len());
    let mut created = None;
    let mut expires = None;

    for name in header_names {
        let name = name.as_ref().to_lowercase();
        let line = match name.as_str() {
            REQUEST_LINE => {
                if ctx.strict {
                    return Err(HttpSigError::StrictParsing(name.clone()));
                }
                format!("{} {} HTTP/{}", ctx.method, ctx.path, ctx.http_version)
            }
            REQUEST_TARGET => {
                format!("{name}: {} {}", ctx.method.to_lowercase(), ctx.path)
            }
            KEY_ID => format!("{name}: {}", ctx.key_id),
            ALGORITHM => format!("{name}: {}", ctx.algorithm),
            OPAQUE => match ctx.opaque.filter(|v| !v.is_empty()) {
                Some(opaque) => format!("{name}: {opaque}"),
                None => return Err(HttpSigError::MissingHeader(name.clone())),
            },
            CREATED => {
                let value = ctx
                    .created
                    .ok_or_else(|| HttpSigError::MissingHeader(name.clone()))?;
                created = Some(value);
                format!("{name}: {value}")
            }
            EXPIRES => {
                let value = ctx
                    .expires
                    .ok_or_else(|| HttpSigError::MissingHeader(name.clone()))?;
                expires = Some(value);
                format!("{name}: {value}")
            }
            _ => match source.header_value(&name).filter(|v| !v.is_empty()) {
                Some(value) => format!("{name}: {value}"),
                None => return Err(HttpSigError::MissingHeader(name.clone())),
            },
        };
        lines.push(line);
        headers.push(name);
    }

    let value = lines.join("\n");
    debug!(headers = ?headers, signing_string = %value, "Built signing string");

    Ok(SigningString {
        value,
        headers,
        created,
        expires,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "Tue, 07 Jun 2014 20:51:35 GMT";

    fn test_headers() -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();
        headers.insert("host", "example.com".parse().unwrap());
        headers.insert("date", DATE.parse().unwrap());
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("x-empty", "".parse().unwrap());
        headers
    }

    fn test_context() -> SigningContext<'static> {
        SigningContext {
            method: "POST",
            path: "/foo?param=value&pet=dog",
            http_version: "1.1",
            key_id: "Test",
            algorithm: "rsa-sha256",
            opaque: None,
            created: Some(1_402_170_695),
            expires: Some(1_402_170_755),
            strict: false,
        }
    }

    #[test]
    fn test_should_render_lines_in_caller_order() {
        let result = build_signing_string(
            &["(request-target)", "host", "date"],
            &test_headers(),
            &test_context(),
        )
        .unwrap();
        assert_eq!(
            result.as_str(),
            "(request-target): post /foo?param=value&pet=dog\nhost: example.com\ndate: Tue, 07 Jun 2014 20:51:35 GMT"
        );
        assert_eq!(result.headers_param(), "(request-target) host date");
    }

    #[test]
    fn test_should_lowercase_names() {
        let result =
            build_signing_string(&["Date", "Content-Type"], &test_headers(), &test_context())
                .unwrap();
        assert_eq!(
            result.as_str(),
            "date: Tue, 07 Jun 2014 20:51:35 GMT\ncontent-type: application/json"
        );
        assert_eq!(result.headers(), ["date", "content-type"]);
    }

    #[test]
    fn test_should_join_without_trailing_newline() {
        let names = ["date", "host", "(keyid)", "(algorithm)", "(created)", "(expires)"];
        for n in 1..=names.len() {
            let result =
                build_signing_string(&names[..n], &test_headers(), &test_context()).unwrap();
            assert_eq!(result.as_str().matches('\n').count(), n - 1);
            assert!(!result.as_str().ends_with('\n'));
        }
    }

    #[test]
    fn test_should_keep_duplicate_names() {
        let result = build_signing_string(&["date", "date"], &test_headers(), &test_context())
            .unwrap();
        assert_eq!(result.as_str(), format!("date: {DATE}\ndate: {DATE}"));
        assert_eq!(result.headers_param(), "date date");
    }

    #[test]
    fn test_should_join_repeated_header_values() {
        let mut headers = test_headers();
        headers.append("x-forwarded-for", "10.0.0.1".parse().unwrap());
        headers.append("x-forwarded-for", "10.0.0.2".parse().unwrap());
        let result =
            build_signing_string(&["x-forwarded-for", "host"], &headers, &test_context()).unwrap();
        assert_eq!(
            result.as_str(),
            "x-forwarded-for: 10.0.0.1, 10.0.0.2\nhost: example.com"
        );
    }

    #[test]
    fn test_should_render_request_line() {
        let result =
            build_signing_string(&["request-line"], &test_headers(), &test_context()).unwrap();
        assert_eq!(result.as_str(), "POST /foo?param=value&pet=dog HTTP/1.1");
    }

    #[test]
    fn test_should_reject_request_line_in_strict_mode() {
        let ctx = SigningContext {
            strict: true,
            ..test_context()
        };
        let result = build_signing_string(&["date", "request-line"], &test_headers(), &ctx);
        assert!(matches!(result, Err(HttpSigError::StrictParsing(_))));
    }

    #[test]
    fn test_should_render_identity_pseudo_headers() {
        let ctx = SigningContext {
            opaque: Some("abc"),
            ..test_context()
        };
        let result =
            build_signing_string(&["(keyid)", "(algorithm)", "(opaque)"], &test_headers(), &ctx)
                .unwrap();
        assert_eq!(
            result.as_str(),
            "(keyid): Test\n(algorithm): rsa-sha256\n(opaque): abc"
        );
    }

    #[test]
    fn test_should_require_opaque_value() {
        let result = build_signing_string(&["(opaque)"], &test_headers(), &test_context());
        assert!(matches!(result, Err(HttpSigError::MissingHeader(h)) if h == "(opaque)"));

        let ctx = SigningContext {
            opaque: Some(""),
            ..test_context()
        };
        let result = build_signing_string(&["(opaque)"], &test_headers(), &ctx);
        assert!(matches!(result, Err(HttpSigError::MissingHeader(_))));
    }

    #[test]
    fn test_should_record_created_and_expires() {
        let result = build_signing_string(
            &["(created)", "(expires)"],
            &test_headers(),
            &test_context(),
        )
        .unwrap();
        assert_eq!(result.as_str(), "(created): 1402170695\n(expires): 1402170755");
        assert_eq!(result.created(), Some(1_402_170_695));
        assert_eq!(result.expires(), Some(1_402_170_755));
    }

    #[test]
    fn test_should_not_record_unsigned_timestamps() {
        let result = build_signing_string(&["date"], &test_headers(), &test_context()).unwrap();
        assert_eq!(result.created(), None);
        assert_eq!(result.expires(), None);
    }

    #[test]
    fn test_should_fail_on_missing_or_empty_header() {
        let result = build_signing_string(&["digest"], &test_headers(), &test_context());
        assert!(matches!(result, Err(HttpSigError::MissingHeader(h)) if h == "digest"));

        let result = build_signing_string(&["x-empty"], &test_headers(), &test_context());
        assert!(matches!(result, Err(HttpSigError::MissingHeader(_))));
    }

    #[test]
    fn test_should_look_up_hash_map_case_insensitively() {
        let headers = HashMap::from([("Host".to_owned(), "example.com".to_owned())]);
        let result = build_signing_string(&["host"], &headers, &test_context()).unwrap();
        assert_eq!(result.as_str(), "host: example.com");
    }
}
