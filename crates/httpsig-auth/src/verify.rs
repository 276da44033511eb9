//! Signature verification.
//!
//! Both entry points answer a plain `bool`. Any malformed input, whether an
//! unknown algorithm, bad base64 or a key of the wrong type, is a failed
//! verification rather than an error.

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::algorithm::{Algorithm, KeyType, validate_algorithm};
use crate::hash::hmac;
use crate::keys::{PublicKey, decode_signature};
use crate::parser::ParsedSignature;

/// Check an asymmetric signature with `public_key`.
///
/// `hs2019` uses the key's own type and default hash.
#[must_use]
pub fn verify_signature(parsed: &ParsedSignature, public_key: &dyn PublicKey) -> bool {
    let key_type = public_key.key_type();
    let algorithm = match validate_algorithm(&parsed.algorithm, Some(key_type)) {
        Ok(algorithm) => algorithm,
        Err(e) => {
            debug!(key_id = %parsed.key_id, error = %e, "Rejected signature algorithm");
            return false;
        }
    };

    let hash = match algorithm {
        Algorithm::Pair {
            key_type: KeyType::Hmac,
            ..
        } => return false,
        Algorithm::Pair { hash, .. } => hash,
        Algorithm::Hs2019 if key_type == KeyType::Hmac => return false,
        Algorithm::Hs2019 => public_key.default_hash(),
    };

    let mut verifier = public_key.create_verify(hash);
    verifier.update(parsed.signing_string.as_bytes());
    let verified = verifier.verify(parsed.signature());
    debug!(key_id = %parsed.key_id, algorithm = %parsed.algorithm, verified, "Verified signature");
    verified
}

/// Check an HMAC signature with the shared `secret`.
///
/// The expected and provided MACs are each run through HMAC once more and
/// the results compared in constant time.
#[must_use]
pub fn verify_hmac(parsed: &ParsedSignature, secret: &[u8]) -> bool {
    let Ok(Algorithm::Pair {
        key_type: KeyType::Hmac,
        hash,
    }) = validate_algorithm(&parsed.algorithm, None)
    else {
        return false;
    };
    let Some(provided) = decode_signature(parsed.signature()) else {
        return false;
    };

    let Ok(expected) = hmac(hash, secret, parsed.signing_string.as_bytes()) else {
        return false;
    };
    let (Ok(h1), Ok(h2)) = (hmac(hash, secret, &expected), hmac(hash, secret, &provided)) else {
        return false;
    };

    h1.as_slice().ct_eq(h2.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use http::Request;
    use http::request::Parts;

    use super::*;
    use crate::clock::FixedClock;
    use crate::config::{ParseOptions, SignOptions};
    use crate::format::SignatureParams;
    use crate::keys::fixtures::*;
    use crate::keys::{KeyProvider, PemKeyProvider};
    use crate::parser::parse_request;
    use crate::sign::sign_request;

    const NOW: i64 = 1_402_174_295;

    fn parsed(algorithm: &str, signing_string: &str, signature: &str) -> ParsedSignature {
        ParsedSignature {
            scheme: "Signature".to_owned(),
            algorithm: algorithm.to_owned(),
            key_id: "foo".to_owned(),
            signing_string: signing_string.to_owned(),
            headers: vec!["date".to_owned()],
            params: SignatureParams {
                signature: Some(signature.to_owned()),
                ..SignatureParams::default()
            },
        }
    }

    fn sign_and_parse(key: &str, algorithm: Option<&str>, hide_algorithm: bool) -> ParsedSignature {
        let (mut parts, ()): (Parts, ()) = Request::post("/foo?param=value&pet=dog")
            .header("host", "example.com")
            .body(())
            .unwrap()
            .into_parts();
        let clock = Arc::new(FixedClock::from_unix(NOW));
        let options = SignOptions::builder()
            .key(key)
            .key_id("key-1")
            .headers(vec![
                "(request-target)".into(),
                "host".into(),
                "date".into(),
                "(created)".into(),
            ])
            .hide_algorithm(hide_algorithm)
            .clock(clock.clone())
            .build();
        let options = match algorithm {
            Some(algorithm) => SignOptions {
                algorithm: Some(algorithm.to_owned()),
                ..options
            },
            None => options,
        };
        sign_request(&mut parts, &options).unwrap();
        parse_request(&parts, &ParseOptions::builder().clock(clock).build()).unwrap()
    }

    fn public(pem: &str) -> Box<dyn PublicKey> {
        PemKeyProvider.parse_public_key(pem.as_bytes()).unwrap()
    }

    #[test]
    fn test_should_verify_hmac_with_right_secret_only() {
        let sig = parsed(
            "hmac-sha256",
            "date: Tue, 07 Jun 2014 20:51:35 GMT",
            "Lx1U92xNQ7NGvBG4kseHaZ4qzFTYMZOcicQzk+/PXPc=",
        );
        assert!(verify_hmac(&sig, b"s3cr3t"));
        assert!(!verify_hmac(&sig, b"wrong"));
    }

    #[test]
    fn test_should_verify_hmac_without_base64_padding() {
        let sig = parsed(
            "hmac-sha256",
            "date: Tue, 07 Jun 2014 20:51:35 GMT",
            "Lx1U92xNQ7NGvBG4kseHaZ4qzFTYMZOcicQzk+/PXPc",
        );
        assert!(verify_hmac(&sig, b"s3cr3t"));
    }

    #[test]
    fn test_should_reject_hmac_for_non_hmac_algorithms() {
        let sig = parsed(
            "rsa-sha256",
            "date: Tue, 07 Jun 2014 20:51:35 GMT",
            "Lx1U92xNQ7NGvBG4kseHaZ4qzFTYMZOcicQzk+/PXPc=",
        );
        assert!(!verify_hmac(&sig, b"s3cr3t"));
        assert!(!verify_hmac(&parsed("hs2019", "date: x", "AAAA"), b"s3cr3t"));
    }

    #[test]
    fn test_should_reject_hmac_with_bad_base64() {
        let sig = parsed("hmac-sha256", "date: x", "***");
        assert!(!verify_hmac(&sig, b"s3cr3t"));
    }

    #[test]
    fn test_should_verify_openssl_rsa_signature() {
        let sig = parsed(
            "rsa-sha256",
            "date: Tue, 07 Jun 2014 20:51:35 GMT",
            "Fw3zB9lHdcPn7kfOG3tmlgVs7M25Sy5CU20aL29jd1YdblSm3YPu5cT7xSJoOkfFbiNXt3pR8vKPi5glK7IV4su4SJzNN9xm8bBMqkmptaVH56exzb8DfAuQrh4je8BOXmCQs0wbSM2IkD+eYv/0yFvP4c7RX+lIkcG5xn53pUkujugUF+JMRJJQTbRy2IxuMxwf+7iFWWi+DCX49DrIDiVc+qBomx0HrCChj5qO3cwWKRaSBFg2XOGbLUn4TYmgZBeW0A/jfAGuZZDK+QNA4LgO27ykt0kh+rTHDhfWq5BiaPzdOB9f4cOxFwzH6Zoho1k5nCdqMQsLcrf45lUqDQ==",
        );
        assert!(verify_signature(&sig, public(RSA_PUBLIC).as_ref()));

        let tampered = ParsedSignature {
            signing_string: "date: Tue, 07 Jun 2014 20:51:36 GMT".to_owned(),
            ..sig
        };
        assert!(!verify_signature(&tampered, public(RSA_PUBLIC).as_ref()));
    }

    #[test]
    fn test_should_reject_key_type_mismatch_and_hmac() {
        let sig = parsed("ecdsa-sha256", "date: x", "AAAA");
        assert!(!verify_signature(&sig, public(RSA_PUBLIC).as_ref()));
        let sig = parsed("hmac-sha256", "date: x", "AAAA");
        assert!(!verify_signature(&sig, public(RSA_PUBLIC).as_ref()));
        let sig = parsed("rsa-md5", "date: x", "AAAA");
        assert!(!verify_signature(&sig, public(RSA_PUBLIC).as_ref()));
    }

    #[test]
    fn test_should_round_trip_every_key_type() {
        for (private, public_pem, algorithm) in [
            (RSA_PRIVATE, RSA_PUBLIC, "rsa-sha256"),
            (RSA_PRIVATE, RSA_PUBLIC, "rsa-sha512"),
            (ECDSA_PRIVATE, ECDSA_PUBLIC, "ecdsa-sha256"),
            (ED25519_PRIVATE, ED25519_PUBLIC, "ed25519-sha512"),
        ] {
            let sig = sign_and_parse(private, Some(algorithm), false);
            assert_eq!(sig.algorithm, algorithm);
            assert!(verify_signature(&sig, public(public_pem).as_ref()), "{algorithm}");
        }
    }

    #[test]
    fn test_should_round_trip_hs2019_with_key_defaults() {
        for (private, public_pem) in [
            (RSA_PRIVATE, RSA_PUBLIC),
            (ECDSA_PRIVATE, ECDSA_PUBLIC),
            (ED25519_PRIVATE, ED25519_PUBLIC),
        ] {
            let sig = sign_and_parse(private, None, true);
            assert_eq!(sig.algorithm, "hs2019");
            assert!(verify_signature(&sig, public(public_pem).as_ref()));
            assert!(!verify_signature(&sig, public(if public_pem == RSA_PUBLIC {
                ED25519_PUBLIC
            } else {
                RSA_PUBLIC
            })
            .as_ref()));
        }
    }

    #[test]
    fn test_should_round_trip_hmac() {
        let sig = sign_and_parse("s3cr3t", Some("hmac-sha512"), false);
        assert!(verify_hmac(&sig, b"s3cr3t"));
        assert!(!verify_hmac(&sig, b"s3cr3T"));
    }
}
