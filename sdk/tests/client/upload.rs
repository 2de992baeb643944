use std::sync::{Arc, Mutex};

use airx_sdk::{Action, CallContext, CallData, Client, Config, FormData, WithCredentials};
use http::header::{CONTENT_TYPE, COOKIE};
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use super::mock::MockHttpSend;

fn form() -> FormData {
    FormData::new()
        .text("album", "hangar")
        .file("photo", "drone.png", "image/png", vec![0x89u8, 0x50, 0x4e, 0x47])
}

#[tokio::test]
async fn test_upload_is_unsigned_and_includes_credentials() -> anyhow::Result<()> {
    let mock = MockHttpSend::ok(r#"{"url":"https://cdn.airdwing.com/a.png"}"#);
    let client = Client::new(
        mock.context(),
        Config::new()
            .with_secret_id("AKIDexample")
            .with_secret_key("secret")
            .with_cookie("session=abc"),
    );

    let resp = client
        .upload(form(), "https://upload.airdwing.com/files")
        .await?;
    assert_eq!(resp, json!({"url": "https://cdn.airdwing.com/a.png"}));

    let req = mock.last_request();
    assert_eq!(req.method(), Method::POST);
    assert_eq!(req.uri().to_string(), "https://upload.airdwing.com/files");
    assert_eq!(req.extensions().get::<WithCredentials>(), Some(&WithCredentials));
    assert_eq!(req.headers().get(COOKIE).unwrap(), "session=abc");

    let content_type = req.headers().get(CONTENT_TYPE).unwrap().to_str()?;
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .expect("multipart content type");

    let body = String::from_utf8_lossy(req.body());
    assert!(body.starts_with(&format!("--{boundary}\r\n")));
    assert!(body.contains("name=\"album\"\r\n\r\nhangar\r\n"));
    assert!(body.contains("filename=\"drone.png\""));
    assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    assert!(!body.contains("Signature"));
    assert!(!body.contains("SecretId"));
    assert_eq!(req.uri().query(), None);
    Ok(())
}

#[tokio::test]
async fn test_upload_without_cookie_still_marks_credentials() -> anyhow::Result<()> {
    let mock = MockHttpSend::ok("{}");
    let client = Client::new(mock.context(), Config::new().with_domain("api.example.com"));

    client.upload(form(), "/v1/files").await?;

    let req = mock.last_request();
    assert_eq!(req.uri().to_string(), "https://api.example.com/v1/files");
    assert!(req.extensions().get::<WithCredentials>().is_some());
    assert!(req.headers().get(COOKIE).is_none());
    Ok(())
}

#[tokio::test]
async fn test_upload_failure_goes_through_catch() {
    let mock = MockHttpSend::status(StatusCode::PAYLOAD_TOO_LARGE, "");
    let seen: Arc<Mutex<Vec<CallContext>>> = Arc::default();

    let slot = seen.clone();
    let client = Client::new(mock.context(), Config::new()).with_catch(move |err, ctx| {
        slot.lock().unwrap().push(ctx.clone());
        Err(err)
    });

    let err = client
        .upload(form(), "https://upload.airdwing.com/files")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::PAYLOAD_TOO_LARGE));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].action, Action::Upload);
    assert_eq!(seen[0].url, "https://upload.airdwing.com/files");
    assert_eq!(seen[0].data, CallData::Form(form()));
}
