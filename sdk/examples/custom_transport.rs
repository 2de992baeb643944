use std::time::Duration;

use airx_core::{Context, OsEnv};
use airx_http_send_reqwest::{ReqwestHttpSend, RetryPolicy};
use airx_sdk::{Client, Config, FormData};
use anyhow::Result;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // Longer timeout and a backoff between retries.
    let http = reqwest::Client::builder()
        .user_agent("airx-sdk-example/0.1")
        .build()?;
    let transport = ReqwestHttpSend::new(http)
        .with_timeout(Some(Duration::from_secs(30)))
        .with_retry_policy(RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(200),
        });

    let ctx = Context::new().with_http_send(transport).with_env(OsEnv);
    // Credentials and domain are read from AIRX_* env vars.
    let config = Config::new().with_verbose(true).from_env(&ctx)?;

    let client = Client::new(ctx, config).with_catch(|err, ctx| {
        eprintln!("{} {} failed: {err}", ctx.action, ctx.url);
        Err(err)
    });

    match client.get("/v1/devices", &json!({"page": 1})).await {
        Ok(devices) => println!("devices: {devices}"),
        Err(err) => println!("listing devices failed: {}", err.kind()),
    }

    let form = FormData::new()
        .text("album", "hangar")
        .file("photo", "drone.png", "image/png", vec![0x89u8, 0x50, 0x4e, 0x47]);
    match client.upload(form, "/v1/files").await {
        Ok(resp) => println!("uploaded: {resp}"),
        Err(err) => println!("upload failed: {}", err.kind()),
    }

    Ok(())
}
