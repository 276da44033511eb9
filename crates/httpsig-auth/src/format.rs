//! Rendering of the signature header value.
//!
//! ```text
//! Signature keyId="k",algorithm="rsa-sha256",created=1402170695,headers="(created) date",signature="..."
//! ```
//!
//! Parameters are always emitted in the order `keyId, algorithm, created,
//! expires, opaque, headers, signature`; absent parameters are skipped.

use std::fmt::Write as _;

/// The scheme prefix written in front of the parameters in an `Authorization` header.
pub const SIGNATURE_SCHEME_PREFIX: &str = "Signature ";

/// The bare header name that carries parameters without a scheme prefix.
pub const SIGNATURE_HEADER: &str = "signature";

/// The parameters of an HTTP signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureParams {
    /// Identifier of the key the signature was made with.
    pub key_id: Option<String>,
    /// Algorithm string as emitted (`rsa-sha256`, `hs2019`, ...).
    pub algorithm: Option<String>,
    /// Unix time the signature was created.
    pub created: Option<i64>,
    /// Unix time after which the signature is no longer valid.
    pub expires: Option<i64>,
    /// Opaque value supplied by the signer.
    pub opaque: Option<String>,
    /// Space-separated, ordered list of signed header names.
    pub headers: Option<String>,
    /// Base64 signature.
    pub signature: Option<String>,
}

enum ParamValue<'a> {
    Quoted(&'a str),
    Number(i64),
}

impl SignatureParams {
    fn ordered(&self) -> [(&'static str, Option<ParamValue<'_>>); 7] {
        [
            ("keyId", self.key_id.as_deref().map(ParamValue::Quoted)),
            ("algorithm", self.algorithm.as_deref().map(ParamValue::Quoted)),
            ("created", self.created.map(ParamValue::Number)),
            ("expires", self.expires.map(ParamValue::Number)),
            ("opaque", self.opaque.as_deref().map(ParamValue::Quoted)),
            ("headers", self.headers.as_deref().map(ParamValue::Quoted)),
            ("signature", self.signature.as_deref().map(ParamValue::Quoted)),
        ]
    }
}

/// Render `params` as a signature header value.
///
/// `prefix` is written in front of the first emitted parameter only; later
/// parameters are separated by `,`.
///
/// # Examples
///
/// ```
/// use httpsig_auth::format::{format_authz, SignatureParams};
///
/// let params = SignatureParams {
///     key_id: Some("foo".to_owned()),
///     created: Some(1_402_170_695),
///     signature: Some("c2ln".to_owned()),
///     ..SignatureParams::default()
/// };
/// assert_eq!(
///     format_authz("Signature ", &params),
///     r#"Signature keyId="foo",created=1402170695,signature="c2ln""#
/// );
/// ```
#[must_use]
pub fn format_authz(prefix: &str, params: &SignatureParams) -> String {
    let mut authz = String::new();
    let mut separator = prefix;

    for (name, value) in params.ordered() {
        let Some(value) = value else {
            continue;
        };
        authz.push_str(separator);
        // Writing to a String cannot fail.
        let _ = match value {
            ParamValue::Number(n) => write!(authz, "{name}={n}"),
            ParamValue::Quoted(s) => write!(authz, "{name}=\"{s}\""),
        };
        separator = ",";
    }

    authz
}

/// The prefix to use for a signature stored in `header_name`.
///
/// The bare `Signature` header carries no scheme; every other header gets
/// [`SIGNATURE_SCHEME_PREFIX`].
#[must_use]
pub fn scheme_prefix(header_name: &str) -> &'static str {
    if header_name.eq_ignore_ascii_case(SIGNATURE_HEADER) {
        ""
    } else {
        SIGNATURE_SCHEME_PREFIX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_params() -> SignatureParams {
        SignatureParams {
            key_id: Some("key-1".to_owned()),
            algorithm: Some("rsa-sha256".to_owned()),
            created: Some(1_402_170_695),
            expires: Some(1_402_170_755),
            opaque: Some("blob".to_owned()),
            headers: Some("(created) date".to_owned()),
            signature: Some("c2lnbmF0dXJl".to_owned()),
        }
    }

    #[test]
    fn test_should_emit_fields_in_fixed_order() {
        let authz = format_authz("Signature ", &full_params());
        assert_eq!(
            authz,
            "Signature keyId=\"key-1\",algorithm=\"rsa-sha256\",created=1402170695,\
             expires=1402170755,opaque=\"blob\",headers=\"(created) date\",\
             signature=\"c2lnbmF0dXJl\""
        );
    }

    #[test]
    fn test_should_skip_absent_fields() {
        let params = SignatureParams {
            key_id: Some("k".to_owned()),
            headers: Some("date".to_owned()),
            signature: Some("s".to_owned()),
            ..SignatureParams::default()
        };
        assert_eq!(
            format_authz("", &params),
            "keyId=\"k\",headers=\"date\",signature=\"s\""
        );
    }

    #[test]
    fn test_should_apply_prefix_to_first_emitted_field_only() {
        let params = SignatureParams {
            expires: Some(5),
            signature: Some("s".to_owned()),
            ..SignatureParams::default()
        };
        assert_eq!(format_authz("Signature ", &params), "Signature expires=5,signature=\"s\"");
    }

    #[test]
    fn test_should_render_empty_params_as_empty_string() {
        assert_eq!(format_authz("Signature ", &SignatureParams::default()), "");
    }

    #[test]
    fn test_should_be_deterministic() {
        let params = full_params();
        assert_eq!(format_authz("x ", &params), format_authz("x ", &params.clone()));
    }

    #[test]
    fn test_should_choose_prefix_by_header_name() {
        assert_eq!(scheme_prefix("Authorization"), "Signature ");
        assert_eq!(scheme_prefix("Signature"), "");
        assert_eq!(scheme_prefix("SIGNATURE"), "");
        assert_eq!(scheme_prefix("x-signature"), "Signature ");
    }
}
