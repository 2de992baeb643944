use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};

use airx_core::{Context, HttpSend, Result};
use airx_sdk::Params;
use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, StatusCode};

type Responder = dyn Fn(&Request<Bytes>) -> Result<Response<Bytes>> + Send + Sync;

/// MockHttpSend records every request and answers with the responder.
#[derive(Clone)]
pub struct MockHttpSend {
    requests: Arc<Mutex<Vec<Request<Bytes>>>>,
    responder: Arc<Responder>,
}

impl Debug for MockHttpSend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpSend").finish_non_exhaustive()
    }
}

impl MockHttpSend {
    pub fn new(
        responder: impl Fn(&Request<Bytes>) -> Result<Response<Bytes>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            requests: Arc::default(),
            responder: Arc::new(responder),
        }
    }

    /// Always answer `200` with given body.
    pub fn ok(body: &'static str) -> Self {
        Self::new(move |_| Ok(Response::new(Bytes::from_static(body.as_bytes()))))
    }

    /// Always answer with given status.
    pub fn status(status: StatusCode, body: &'static str) -> Self {
        Self::new(move |_| {
            let mut resp = Response::new(Bytes::from_static(body.as_bytes()));
            *resp.status_mut() = status;
            Ok(resp)
        })
    }

    pub fn context(&self) -> Context {
        Context::new().with_http_send(self.clone())
    }

    pub fn requests(&self) -> Vec<Request<Bytes>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Request<Bytes> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        let resp = (self.responder)(&req);
        self.requests.lock().unwrap().push(req);
        resp
    }
}

/// Parameters found in the query string.
pub fn query_params(req: &Request<Bytes>) -> Params {
    req.uri()
        .query()
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Parameters found in a form encoded body.
pub fn body_params(req: &Request<Bytes>) -> Params {
    form_urlencoded::parse(req.body()).into_owned().collect()
}
