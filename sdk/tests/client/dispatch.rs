use std::sync::{Arc, Mutex};

use airx_core::time::{now, unix_timestamp};
use airx_core::ErrorKind;
use airx_sdk::{Action, Client, Config, Credential, Observe, Params, RequestSigner, SignatureMethod};
use http::header::CONTENT_TYPE;
use http::Method;
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;

use super::mock::{body_params, query_params, MockHttpSend};

fn config() -> Config {
    Config::new()
        .with_secret_id("AKIDexample")
        .with_secret_key("secret")
}

/// Recompute the signature from what reached the wire.
fn verify(method: Method, path: &str, mut params: Params, signature_method: SignatureMethod) {
    let signature = params.remove("Signature").expect("signature must be sent");
    let expected = RequestSigner::new(Credential::new("AKIDexample", "secret"))
        .with_signature_method(signature_method)
        .sign(&method, "api.airdwing.com", path, &params)
        .unwrap();
    assert_eq!(signature, expected);
}

#[tokio::test]
async fn test_get_sends_query_string() -> anyhow::Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mock = MockHttpSend::ok(r#"{"code":0,"data":[1,2]}"#);
    let client = Client::new(mock.context(), config());

    let before = unix_timestamp(now());
    let resp = client
        .get("/v1/devices", &json!({"page": 1, "user_id": "u-1"}))
        .await?;
    let after = unix_timestamp(now());
    assert_eq!(resp, json!({"code": 0, "data": [1, 2]}));

    let req = mock.last_request();
    assert_eq!(req.method(), Method::GET);
    assert_eq!(req.uri().scheme_str(), Some("https"));
    assert_eq!(req.uri().host(), Some("api.airdwing.com"));
    assert_eq!(req.uri().path(), "/v1/devices");
    assert!(req.body().is_empty());
    assert!(req.headers().get(CONTENT_TYPE).is_none());

    let params = query_params(&req);
    assert_eq!(params["SecretId"], "AKIDexample");
    assert_eq!(params["page"], "1");
    assert_eq!(params["user_id"], "u-1");
    let ts: i64 = params["Timestamp"].parse()?;
    assert!(before <= ts && ts <= after);
    let nonce: u32 = params["Nonce"].parse()?;
    assert!(nonce < 65535);

    verify(Method::GET, "/v1/devices", params, SignatureMethod::HmacSha1);
    Ok(())
}

#[tokio::test]
async fn test_post_and_put_send_form_body() -> anyhow::Result<()> {
    let mock = MockHttpSend::ok("{}");
    let client = Client::new(mock.context(), config());

    client
        .post("/v1/devices", &json!({"name": "hangar one", "q": "a&b=c"}))
        .await?;
    client.put("/v1/devices/1", &json!({"enabled": true})).await?;

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);

    for (req, method, path) in [
        (&requests[0], Method::POST, "/v1/devices"),
        (&requests[1], Method::PUT, "/v1/devices/1"),
    ] {
        assert_eq!(req.method(), method);
        assert_eq!(req.uri().path(), path);
        assert_eq!(req.uri().query(), None);
        assert_eq!(
            req.headers().get(CONTENT_TYPE).unwrap(),
            "application/x-www-form-urlencoded"
        );
        verify(method, path, body_params(req), SignatureMethod::HmacSha1);
    }

    let params = body_params(&requests[0]);
    assert_eq!(params["name"], "hangar one");
    assert_eq!(params["q"], "a&b=c");
    assert_eq!(body_params(&requests[1])["enabled"], "true");
    Ok(())
}

#[tokio::test]
async fn test_delete_sends_form_body_not_query() -> anyhow::Result<()> {
    let mock = MockHttpSend::ok("");
    let client = Client::new(mock.context(), config());

    let resp = client.delete("/v1/devices", &json!({"device_id": 42})).await?;
    assert_eq!(resp, serde_json::Value::Null);

    let req = mock.last_request();
    assert_eq!(req.method(), Method::DELETE);
    assert_eq!(req.uri().query(), None);
    assert_eq!(
        req.headers().get(CONTENT_TYPE).unwrap(),
        "application/x-www-form-urlencoded"
    );

    let params = body_params(&req);
    assert_eq!(params["device_id"], "42");
    verify(Method::DELETE, "/v1/devices", params, SignatureMethod::HmacSha1);
    Ok(())
}

#[tokio::test]
async fn test_sha256_signature() -> anyhow::Result<()> {
    let mock = MockHttpSend::ok("{}");
    let client = Client::new(mock.context(), config().with_signature_method("HmacSHA256"));

    client.get("/v1/ping", &()).await?;

    let params = query_params(&mock.last_request());
    assert_eq!(params["Signature"].len(), 44);
    verify(Method::GET, "/v1/ping", params, SignatureMethod::HmacSha256);
    Ok(())
}

#[tokio::test]
async fn test_struct_data() -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Listing {
        page: u32,
        page_size: u32,
    }

    let mock = MockHttpSend::ok("{}");
    let client = Client::new(mock.context(), config());
    client
        .get("/v1/flights", &Listing { page: 3, page_size: 20 })
        .await?;

    let params = query_params(&mock.last_request());
    assert_eq!(params["page"], "3");
    assert_eq!(params["page_size"], "20");
    Ok(())
}

#[tokio::test]
async fn test_non_scalar_data_is_rejected_before_sending() {
    let mock = MockHttpSend::ok("{}");
    let client = Client::new(mock.context(), config());

    let err = client
        .post("/v1/devices", &json!({"tags": ["a", "b"]}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_strict_values_rejects_ambiguous_values() {
    let mock = MockHttpSend::ok("{}");
    let client = Client::new(mock.context(), config().with_strict_values(true));

    let err = client
        .get("/v1/search", &json!({"q": "a=b"}))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_clients_are_independent() -> anyhow::Result<()> {
    let mock_a = MockHttpSend::ok("{}");
    let mock_b = MockHttpSend::ok("{}");

    let a = Client::new(mock_a.context(), config().with_domain("a.example.com"));
    let b = Client::new(
        mock_b.context(),
        config().with_domain("b.example.com").with_secure(false),
    );

    a.get("/x", &()).await?;
    b.get("/x", &()).await?;
    a.get("/y", &()).await?;

    assert_eq!(mock_a.requests().len(), 2);
    assert_eq!(mock_b.requests().len(), 1);
    assert_eq!(
        mock_a.last_request().uri().authority().unwrap().as_str(),
        "a.example.com"
    );
    let b_req = mock_b.last_request();
    assert_eq!(b_req.uri().scheme_str(), Some("http"));
    assert_eq!(b_req.uri().authority().unwrap().as_str(), "b.example.com");
    assert_eq!(a.base_url(), "https://a.example.com");
    Ok(())
}

#[derive(Debug, Default, Clone)]
struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl Observe for RecordingObserver {
    fn string_to_sign(&self, action: Action, _url: &str, s: &str) {
        self.events.lock().unwrap().push(format!("{action} sts {s}"));
    }

    fn signature(&self, action: Action, _url: &str, _signature: &str) {
        self.events.lock().unwrap().push(format!("{action} signature"));
    }

    fn params(&self, action: Action, _url: &str, params: &Params) {
        assert!(params.contains_key("Signature"));
        self.events.lock().unwrap().push(format!("{action} params"));
    }
}

#[tokio::test]
async fn test_verbose_reports_signing_steps() -> anyhow::Result<()> {
    let mock = MockHttpSend::ok("{}");
    let observer = RecordingObserver::default();
    let client = Client::new(mock.context(), config().with_verbose(true))
        .with_observer(observer.clone());

    client.put("/v1/a", &json!({"b_c": 2})).await?;

    let events = observer.events.lock().unwrap().clone();
    assert_eq!(events.len(), 3);
    assert!(events[0].starts_with("PUT sts PUTapi.airdwing.com/v1/a?Nonce="));
    assert!(events[0].contains("&b.c=2"));
    assert_eq!(events[1], "PUT signature");
    assert_eq!(events[2], "PUT params");
    Ok(())
}

#[tokio::test]
async fn test_quiet_client_reports_nothing() -> anyhow::Result<()> {
    let mock = MockHttpSend::ok("{}");
    let observer = RecordingObserver::default();
    let client = Client::new(mock.context(), config()).with_observer(observer.clone());

    client.get("/v1/a", &()).await?;

    assert!(observer.events.lock().unwrap().is_empty());
    Ok(())
}
