//! HTTP Signatures (draft-cavage) request signing and verification.
//!
//! This crate signs outgoing HTTP requests and verifies incoming ones using
//! the `Signature` authentication scheme. A signature covers an ordered list
//! of headers and pseudo-headers such as `(request-target)` and `(created)`,
//! rendered into a newline-separated signing string.
//!
//! # Overview
//!
//! Requests can be signed in one shot with [`sign_request`], which writes the
//! `Authorization` header directly, or incrementally with a
//! [`RequestSigner`], which is fed one header at a time and may delegate the
//! signature itself to an [`ExternalSigner`] such as an agent. On the
//! receiving side [`parse_request`] rebuilds the signing string and checks
//! freshness, after which [`verify_signature`] or [`verify_hmac`] checks the
//! signature against the key named by `keyId`.
//!
//! Supported algorithms are `rsa`, `ecdsa` (P-256), `ed25519` and `hmac`
//! keys combined with `sha1`, `sha256` or `sha512`, plus `hs2019`, which
//! hides the concrete pair.
//!
//! # Usage
//!
//! ```rust
//! use httpsig_auth::config::{ParseOptions, SignOptions};
//! use httpsig_auth::{parse_request, sign_request, verify_hmac};
//!
//! let (mut parts, ()) = http::Request::get("/resource").body(()).unwrap().into_parts();
//!
//! let options = SignOptions::builder()
//!     .key("s3cr3t")
//!     .key_id("client-1")
//!     .algorithm("hmac-sha256")
//!     .headers(vec!["(request-target)".into(), "date".into()])
//!     .build();
//! sign_request(&mut parts, &options).unwrap();
//!
//! let parsed = parse_request(&parts, &ParseOptions::default()).unwrap();
//! assert_eq!(parsed.key_id, "client-1");
//! assert!(verify_hmac(&parsed, b"s3cr3t"));
//! ```
//!
//! # Modules
//!
//! - [`algorithm`] - Algorithm identifiers and validation
//! - [`canonical`] - Signing string construction
//! - [`clock`] - Time source and RFC 1123 dates
//! - [`config`] - Signing and parsing options
//! - [`error`] - Error types
//! - [`format`] - Signature header rendering
//! - [`keys`] - Key provider traits and the built-in PEM provider
//! - [`parser`] - Inbound signature parsing
//! - [`sign`] - One-shot request signing
//! - [`signer`] - Incremental request signing
//! - [`verify`] - Signature verification

pub mod algorithm;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
mod hash;
pub mod keys;
pub mod parser;
pub mod sign;
pub mod signer;
pub mod verify;

pub use algorithm::{Algorithm, HashAlgorithm, KeyType, validate_algorithm};
pub use canonical::{HeaderSource, SigningContext, SigningString, build_signing_string};
pub use config::{KeyMaterial, ParseOptions, SignOptions, SignerOptions};
pub use error::{HttpSigError, KeyError};
pub use format::{SignatureParams, format_authz};
pub use keys::{KeyProvider, PemKeyProvider, PrivateKey, PublicKey};
pub use parser::{ParsedSignature, parse_request};
pub use sign::{sign_http_request, sign_request};
pub use signer::{ExternalSignature, ExternalSigner, RequestSigner};
pub use verify::{verify_hmac, verify_signature};
