use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use airx_core::time::{now, unix_timestamp};
use airx_core::{Context, Error, Result};
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use http::{HeaderValue, Method};
use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::constants::*;
use crate::form::{generate_boundary, multipart_content_type};
use crate::observe::{LogObserver, Observe};
use crate::params::value_to_params;
use crate::{Config, FormData, Params, RequestSigner};

/// Turns a successful response into the call's result.
pub type Filter = Arc<dyn Fn(http::Response<Bytes>) -> Result<Value> + Send + Sync>;

/// Handles a failed call. Returning `Err` re-raises, returning `Ok` replaces
/// the failure with a value.
pub type Catch = Arc<dyn Fn(Error, &CallContext) -> Result<Value> + Send + Sync>;

/// The kind of call made through a [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Signed `GET`, parameters in the query string.
    Get,
    /// Signed `POST`, parameters in a form body.
    Post,
    /// Signed `PUT`, parameters in a form body.
    Put,
    /// Signed `DELETE`, parameters in a form body.
    Delete,
    /// Unsigned multipart `POST`.
    Upload,
}

impl Action {
    /// Name of the action, the HTTP verb for signed calls.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "GET",
            Action::Post => "POST",
            Action::Put => "PUT",
            Action::Delete => "DELETE",
            Action::Upload => "UPLOAD",
        }
    }

    /// The HTTP method used on the wire.
    pub fn method(&self) -> Method {
        match self {
            Action::Get => Method::GET,
            Action::Post | Action::Upload => Method::POST,
            Action::Put => Method::PUT,
            Action::Delete => Method::DELETE,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data given by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum CallData {
    /// Data of a signed call, as the caller passed it.
    Params(Value),
    /// Form of an upload.
    Form(FormData),
}

/// What the error handler knows about the failed call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallContext {
    /// The action.
    pub action: Action,
    /// The url or path the caller passed.
    pub url: String,
    /// The caller's data, without injected parameters.
    pub data: CallData,
}

/// Result of a dispatched call before the error handler runs.
#[derive(Debug)]
pub enum Outcome {
    /// The response passed the filter.
    Success(Value),
    /// The call failed.
    Failure {
        /// What went wrong.
        error: Error,
        /// The call that failed.
        context: CallContext,
    },
}

impl Outcome {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Drop the context and return a plain result.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure { error, .. } => Err(error),
        }
    }
}

/// Marker extension set on requests that must carry transport credentials
/// such as cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithCredentials;

/// Client signs and sends AirX API requests.
///
/// Every client owns its configuration, hooks and transport. Building a
/// client has no effect on other clients.
///
/// ```no_run
/// use airx_sdk::{Client, Config};
/// use serde_json::json;
///
/// # async fn example() -> airx_core::Result<()> {
/// let client = Client::with_default_context(
///     Config::new().with_secret_id("AKIDexample").with_secret_key("secret"),
/// );
/// let devices = client.get("/v1/devices", &json!({"page": 1})).await?;
/// println!("{devices}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    ctx: Context,
    config: Arc<Config>,
    signer: RequestSigner,
    base_url: String,
    filter: Filter,
    catch: Catch,
    observer: Arc<dyn Observe>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("ctx", &self.ctx)
            .field("config", &self.config)
            .field("base_url", &self.base_url)
            .field("observer", &self.observer)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client sending through the given context.
    pub fn new(ctx: Context, config: Config) -> Self {
        let signer = RequestSigner::new(config.credential())
            .with_signature_method(config.signature_method())
            .with_strict_values(config.strict_values);

        Self {
            ctx,
            base_url: config.base_url(),
            config: Arc::new(config),
            signer,
            filter: Arc::new(response_body),
            catch: Arc::new(rethrow),
            observer: Arc::new(LogObserver),
        }
    }

    /// Create a new client sending through reqwest with the default timeout
    /// and retry policy.
    #[cfg(feature = "default-context")]
    pub fn with_default_context(config: Config) -> Self {
        let ctx = Context::new()
            .with_http_send(airx_http_send_reqwest::ReqwestHttpSend::default())
            .with_env(airx_core::OsEnv);
        Self::new(ctx, config)
    }

    /// Replace the response filter, the default parses the body.
    pub fn with_filter(
        mut self,
        filter: impl Fn(http::Response<Bytes>) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    /// Replace the error handler, the default re-raises.
    pub fn with_catch(
        mut self,
        catch: impl Fn(Error, &CallContext) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.catch = Arc::new(catch);
        self
    }

    /// Replace the observer notified in verbose mode.
    pub fn with_observer(mut self, observer: impl Observe) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// The config of this client.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `http(s)://{domain}` requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signed `GET`.
    pub async fn get<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<Value> {
        self.call(Action::Get, path, data).await
    }

    /// Signed `POST`.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<Value> {
        self.call(Action::Post, path, data).await
    }

    /// Signed `PUT`.
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<Value> {
        self.call(Action::Put, path, data).await
    }

    /// Signed `DELETE`.
    pub async fn delete<T: Serialize + ?Sized>(&self, path: &str, data: &T) -> Result<Value> {
        self.call(Action::Delete, path, data).await
    }

    /// Post a multipart form to `url` without signing it.
    ///
    /// `url` may be absolute or relative to the base url. The request always
    /// carries [`WithCredentials`], plus the configured cookie if any.
    pub async fn upload(&self, form: FormData, url: &str) -> Result<Value> {
        let outcome = self.send_upload(form, url).await;
        self.settle(outcome)
    }

    async fn call<T: Serialize + ?Sized>(
        &self,
        action: Action,
        path: &str,
        data: &T,
    ) -> Result<Value> {
        let outcome = self.send(action, path, data).await;
        self.settle(outcome)
    }

    fn settle(&self, outcome: Outcome) -> Result<Value> {
        match outcome {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure { error, context } => (self.catch)(error, &context),
        }
    }

    /// Sign and send a request, returning the outcome without running the
    /// error handler.
    ///
    /// Uploads are never signed, use [`Client::send_upload`] for them.
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        action: Action,
        path: &str,
        data: &T,
    ) -> Outcome {
        let context = |data| CallContext {
            action,
            url: path.to_string(),
            data: CallData::Params(data),
        };

        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                return Outcome::Failure {
                    error: Error::request_invalid("request data can't be serialized")
                        .with_source(e),
                    context: context(Value::Null),
                };
            }
        };

        let result = self.dispatch(action, path, &data).await;
        self.conclude(result, context(data))
    }

    /// Send an upload, returning the outcome without running the error
    /// handler.
    pub async fn send_upload(&self, form: FormData, url: &str) -> Outcome {
        let result = self.dispatch_upload(&form, url).await;
        self.conclude(
            result,
            CallContext {
                action: Action::Upload,
                url: url.to_string(),
                data: CallData::Form(form),
            },
        )
    }

    fn conclude(&self, result: Result<http::Response<Bytes>>, context: CallContext) -> Outcome {
        match result.and_then(|resp| (self.filter)(resp)) {
            Ok(v) => Outcome::Success(v),
            Err(error) => Outcome::Failure { error, context },
        }
    }

    /// Build the signed parameters for a call.
    ///
    /// Injected values come first so the caller's data wins on collision.
    /// The signature is added last and never signed.
    pub fn build_params(&self, action: Action, path: &str, data: &Value) -> Result<Params> {
        let nonce = rand::thread_rng().gen_range(0..NONCE_UPPER_BOUND);

        let mut params = Params::new();
        params.insert(SECRET_ID.to_string(), self.signer.credential().secret_id.clone());
        params.insert(TIMESTAMP.to_string(), unix_timestamp(now()).to_string());
        params.insert(NONCE.to_string(), nonce.to_string());
        params.extend(value_to_params(data)?);

        let method = action.method();
        let string_to_sign = self
            .signer
            .build_string_to_sign(&method, self.config.domain(), path, &params)?;
        let signature = self.signer.sign_string(&string_to_sign);
        if self.config.verbose {
            self.observer.string_to_sign(action, path, &string_to_sign);
            self.observer.signature(action, path, &signature);
        }

        params.insert(SIGNATURE.to_string(), signature);
        if self.config.verbose {
            self.observer.params(action, path, &params);
        }
        Ok(params)
    }

    async fn dispatch(
        &self,
        action: Action,
        path: &str,
        data: &Value,
    ) -> Result<http::Response<Bytes>> {
        let params = self.build_params(action, path, data)?;
        let encoded = encode_form(&params);
        let url = self.resolve_url(path);

        let req = http::Request::builder()
            .method(action.method())
            .header(ACCEPT, ACCEPT_ANY);
        let req = match action {
            Action::Get => {
                let sep = if url.contains('?') { '&' } else { '?' };
                req.uri(format!("{url}{sep}{encoded}")).body(Bytes::new())?
            }
            // DELETE carries its parameters in the body as well.
            Action::Post | Action::Put | Action::Delete => req
                .uri(url)
                .header(CONTENT_TYPE, FORM_URLENCODED)
                .body(Bytes::from(encoded))?,
            Action::Upload => {
                return Err(Error::request_invalid(
                    "uploads are never signed, use send_upload instead",
                ));
            }
        };

        self.execute(req).await
    }

    async fn dispatch_upload(&self, form: &FormData, url: &str) -> Result<http::Response<Bytes>> {
        let boundary = generate_boundary();
        let mut req = http::Request::builder()
            .method(Method::POST)
            .uri(self.resolve_url(url))
            .header(ACCEPT, ACCEPT_ANY)
            .header(CONTENT_TYPE, multipart_content_type(&boundary))
            .extension(WithCredentials)
            .body(form.encode(&boundary))?;

        if let Some(cookie) = &self.config.cookie {
            let mut value = HeaderValue::from_str(cookie)?;
            value.set_sensitive(true);
            req.headers_mut().insert(COOKIE, value);
        }

        self.execute(req).await
    }

    async fn execute(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let resp = self.ctx.http_send(req).await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(Error::response_status(resp.status(), resp.body()))
        }
    }

    /// Absolute urls are used as is, anything else is appended to the base url.
    fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') || url.is_empty() {
            format!("{}{url}", self.base_url)
        } else {
            format!("{}/{url}", self.base_url)
        }
    }
}

fn encode_form(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// The default error handler: hand the error back to the caller.
pub fn rethrow(err: Error, _: &CallContext) -> Result<Value> {
    Err(err)
}

/// The default filter: the body parsed as JSON.
///
/// Empty bodies give `null`, bodies that are not JSON are returned as a string.
pub fn response_body(resp: http::Response<Bytes>) -> Result<Value> {
    let body = resp.into_body();
    if body.is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_slice(&body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned())))
}
