//! Client for the AirX API.
//!
//! Every request carries `SecretId`, `Timestamp`, `Nonce` and a `Signature`
//! computed over the canonicalized parameters, see [`RequestSigner`].
//!
//! # Example
//!
//! ```no_run
//! use airx_sdk::{Client, Config, FormData};
//! use serde_json::json;
//!
//! # async fn example() -> airx_core::Result<()> {
//! let client = Client::with_default_context(
//!     Config::new()
//!         .with_secret_id("AKIDexample")
//!         .with_secret_key("secret")
//!         .with_signature_method("HmacSHA256"),
//! )
//! .with_catch(|err, ctx| {
//!     eprintln!("{} {} failed: {err}", ctx.action, ctx.url);
//!     Err(err)
//! });
//!
//! client.post("/v1/devices", &json!({"name": "hangar one"})).await?;
//! client.delete("/v1/devices", &json!({"device_id": 42})).await?;
//!
//! let form = FormData::new().file("photo", "a.png", "image/png", vec![0u8; 4]);
//! client.upload(form, "https://upload.airdwing.com/files").await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod config;
pub use config::{Config, SignatureMethod};

mod credential;
pub use credential::Credential;

mod params;
pub use params::{to_params, Params};

mod sign_request;
pub use sign_request::{canonical_query, decorate_key, string_to_sign, RequestSigner};

mod form;
pub use form::FormData;

mod observe;
pub use observe::{LogObserver, Observe};

mod client;
pub use client::{
    rethrow, response_body, Action, CallContext, CallData, Catch, Client, Filter, Outcome,
    WithCredentials,
};
