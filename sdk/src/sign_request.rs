//! AirX request signature.
use std::borrow::Cow;
use std::fmt::Write;

use airx_core::hash::{base64_hmac_sha1, base64_hmac_sha256};
use airx_core::{Error, Result};
use http::Method;

use crate::config::SignatureMethod;
use crate::{Credential, Params};

/// RequestSigner computes the `Signature` parameter of AirX requests.
///
/// ## Format
///
/// ```text
/// METHOD + HOST + PATH + "?" + CanonicalizedQuery
/// ```
///
/// `CanonicalizedQuery` is every parameter sorted by key, rendered as
/// `key=value` and joined with `&`. Underscores in keys are rendered as
/// periods, see [`decorate_key`]. Nothing is escaped.
///
/// The string is signed with HMAC-SHA1 (or HMAC-SHA256) keyed by the secret
/// key and the digest is base64 encoded.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credential: Credential,
    method: SignatureMethod,
    strict_values: bool,
}

impl RequestSigner {
    /// Create a signer using HMAC-SHA1.
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            method: SignatureMethod::default(),
            strict_values: false,
        }
    }

    /// Set the keyed-hash algorithm.
    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.method = method;
        self
    }

    /// Reject values that contain `&` or `=` instead of signing them as is.
    pub fn with_strict_values(mut self, strict_values: bool) -> Self {
        self.strict_values = strict_values;
        self
    }

    /// The credential used by this signer.
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The keyed-hash algorithm used by this signer.
    pub fn signature_method(&self) -> SignatureMethod {
        self.method
    }

    /// Build the string to sign, checking values first in strict mode.
    pub fn build_string_to_sign(
        &self,
        method: &Method,
        host: &str,
        path: &str,
        params: &Params,
    ) -> Result<String> {
        if self.strict_values {
            if let Some((k, v)) = params
                .iter()
                .find(|(_, v)| v.contains('&') || v.contains('='))
            {
                return Err(Error::request_invalid(format!(
                    "value of {k:?} contains '&' or '=' and can't be signed unambiguously: {v:?}"
                )));
            }
        }

        Ok(string_to_sign(method, host, path, params))
    }

    /// Sign an already built string.
    pub fn sign_string(&self, string_to_sign: &str) -> String {
        let key = self.credential.secret_key.as_bytes();
        match self.method {
            SignatureMethod::HmacSha1 => base64_hmac_sha1(key, string_to_sign.as_bytes()),
            SignatureMethod::HmacSha256 => base64_hmac_sha256(key, string_to_sign.as_bytes()),
        }
    }

    /// Compute the signature for given request.
    ///
    /// `params` must not contain the signature itself.
    pub fn sign(&self, method: &Method, host: &str, path: &str, params: &Params) -> Result<String> {
        let s = self.build_string_to_sign(method, host, path, params)?;
        Ok(self.sign_string(&s))
    }
}

/// Render a key the way it appears in the string to sign.
///
/// Every `_` becomes `.`, unless the key starts with `_`: such keys are kept
/// verbatim.
///
/// ```
/// use airx_sdk::decorate_key;
///
/// assert_eq!(decorate_key("user_id"), "user.id");
/// assert_eq!(decorate_key("_private_x"), "_private_x");
/// assert_eq!(decorate_key("page"), "page");
/// ```
pub fn decorate_key(key: &str) -> Cow<'_, str> {
    match key.find('_') {
        Some(idx) if idx > 0 => Cow::Owned(key.replace('_', ".")),
        _ => Cow::Borrowed(key),
    }
}

/// Join all params as `key=value` pairs in key order.
pub fn canonical_query(params: &Params) -> String {
    let mut s = String::with_capacity(16);

    for (idx, (k, v)) in params.iter().enumerate() {
        if idx != 0 {
            s.push('&');
        }
        s.push_str(&decorate_key(k));
        s.push('=');
        s.push_str(v);
    }

    s
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// {METHOD}{HOST}{PATH}?{CanonicalizedQuery}
/// ```
pub fn string_to_sign(method: &Method, host: &str, path: &str, params: &Params) -> String {
    let mut s = String::new();
    // Writing into a String never fails.
    let _ = write!(s, "{}{host}{path}?{}", method.as_str(), canonical_query(params));
    s
}
