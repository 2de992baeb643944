use std::convert::Infallible;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use airx_core::utils::Redact;
use airx_core::{Context, Error, Result};
use serde::Deserialize;

use crate::constants::*;
use crate::Credential;

/// Keyed-hash algorithm used to sign requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SignatureMethod {
    /// HMAC with SHA1, used unless `HmacSHA256` is asked for.
    #[default]
    HmacSha1,
    /// HMAC with SHA256.
    HmacSha256,
}

impl SignatureMethod {
    /// The name used on the wire and in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMethod::HmacSha1 => "HmacSHA1",
            SignatureMethod::HmacSha256 => "HmacSHA256",
        }
    }
}

/// Parsing never fails: only the exact value `HmacSHA256` selects SHA256,
/// everything else falls back to SHA1.
impl FromStr for SignatureMethod {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "HmacSHA256" => SignatureMethod::HmacSha256,
            _ => SignatureMethod::HmacSha1,
        })
    }
}

impl From<&str> for SignatureMethod {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }
}

impl From<String> for SignatureMethod {
    fn from(s: String) -> Self {
        SignatureMethod::from(s.as_str())
    }
}

impl Display for SignatureMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Config carries all the configuration for an AirX client.
///
/// Unset fields fall back to their defaults when read through the accessors.
/// Field names follow the option names of the AirX API when deserialized:
///
/// ```
/// use airx_sdk::{Config, SignatureMethod};
///
/// let cfg: Config = serde_json::from_str(
///     r#"{"SecretId": "id", "SecretKey": "key", "SignatureMethod": "HmacSHA256"}"#,
/// )
/// .unwrap();
/// assert_eq!(cfg.domain(), "api.airdwing.com");
/// assert_eq!(cfg.signature_method(), SignatureMethod::HmacSha256);
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Config {
    /// `secret_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AIRX_SECRET_ID`]
    pub secret_id: Option<String>,
    /// `secret_key` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AIRX_SECRET_KEY`]
    pub secret_key: Option<String>,
    /// `domain` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AIRX_DOMAIN`]
    /// - [`DEFAULT_DOMAIN`]
    pub domain: Option<String>,
    /// Use `https` when `true` (the default), `http` otherwise.
    ///
    /// Env value: [`AIRX_SECURE`].
    pub secure: Option<bool>,
    /// Env value: [`AIRX_SIGNATURE_METHOD`].
    pub signature_method: Option<SignatureMethod>,
    /// Report every signing step to the client's observer.
    pub verbose: bool,
    /// Reject parameter values containing `&` or `=`.
    ///
    /// Values are never escaped in the string to sign, so such values make
    /// the signature ambiguous. This is off by default to stay compatible
    /// with existing callers.
    pub strict_values: bool,
    /// Cookie sent along with uploads.
    pub cookie: Option<String>,
}

impl Config {
    /// Create a new Config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set secret_id
    pub fn with_secret_id(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = Some(secret_id.into());
        self
    }

    /// Set secret_key
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Set domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set secure
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Set signature_method
    pub fn with_signature_method(mut self, method: impl Into<SignatureMethod>) -> Self {
        self.signature_method = Some(method.into());
        self
    }

    /// Set verbose
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set strict_values
    pub fn with_strict_values(mut self, strict_values: bool) -> Self {
        self.strict_values = strict_values;
        self
    }

    /// Set cookie
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    /// Load config from env.
    ///
    /// Fields that are already set are kept.
    pub fn from_env(mut self, ctx: &Context) -> Result<Self> {
        if let Some(v) = ctx.env_var(AIRX_SECRET_ID) {
            self.secret_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AIRX_SECRET_KEY) {
            self.secret_key.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AIRX_DOMAIN) {
            self.domain.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(AIRX_SIGNATURE_METHOD) {
            self.signature_method.get_or_insert(v.into());
        }
        if self.secure.is_none() {
            if let Some(v) = ctx.env_var(AIRX_SECURE) {
                self.secure = Some(parse_bool(&v).ok_or_else(|| {
                    Error::config_invalid(format!("{AIRX_SECURE} must be a boolean, got {v:?}"))
                })?);
            }
        }

        Ok(self)
    }

    /// The host requests are sent to and signed for.
    pub fn domain(&self) -> &str {
        self.domain.as_deref().unwrap_or(DEFAULT_DOMAIN)
    }

    /// Whether `https` is used.
    pub fn secure(&self) -> bool {
        self.secure.unwrap_or(true)
    }

    /// The keyed-hash algorithm.
    pub fn signature_method(&self) -> SignatureMethod {
        self.signature_method.unwrap_or_default()
    }

    /// `http(s)://{domain}`, without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure() { "https" } else { "http" };
        format!("{scheme}://{}", self.domain())
    }

    /// The credential used for signing, empty values when unset.
    pub fn credential(&self) -> Credential {
        Credential::new(
            self.secret_id.clone().unwrap_or_default(),
            self.secret_key.clone().unwrap_or_default(),
        )
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &self.secret_key.as_ref().map(Redact::from))
            .field("domain", &self.domain)
            .field("secure", &self.secure)
            .field("signature_method", &self.signature_method)
            .field("verbose", &self.verbose)
            .field("strict_values", &self.strict_values)
            .field("cookie", &self.cookie.as_ref().map(Redact::from))
            .finish()
    }
}
