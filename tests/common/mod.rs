//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lectern::{
    Api, CacheMode, CategoryDescriptor, EndpointDef, Lectern, RetryPolicy, Transport,
    TransportError, TransportRequest, TransportResponse,
};

type Responder =
    dyn Fn(&TransportRequest, u32) -> Result<TransportResponse, TransportError> + Send + Sync;

/// Transport that answers from a closure and records every request.
///
/// The closure gets the request and the 1-based call number.
pub struct ScriptedTransport {
    respond: Box<Responder>,
    delay: Option<Duration>,
    calls: AtomicU32,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        respond: impl Fn(&TransportRequest, u32) -> Result<TransportResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            delay: None,
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Same as [`new`](Self::new) but every response takes `delay`.
    pub fn delayed(
        delay: Duration,
        respond: impl Fn(&TransportRequest, u32) -> Result<TransportResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            delay: Some(delay),
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always answer with the same payload.
    pub fn fixed(data: serde_json::Value) -> Arc<Self> {
        Self::new(move |_, _| Ok(TransportResponse::ok(data.clone())))
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests().pop().expect("no request was sent")
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send_request(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.respond)(&request, n)
    }
}

/// A small course catalogue used across tests.
pub fn courses_catalogue() -> CategoryDescriptor {
    CategoryDescriptor::new()
        .category(
            "courses",
            CategoryDescriptor::new()
                .endpoint("list", EndpointDef::get("list your courses", "/courses"))
                .endpoint(
                    "get",
                    EndpointDef::get("get info on a course", "/courses/{course_id}"),
                )
                .endpoint(
                    "update",
                    EndpointDef::put("update a course", "/courses/{course_id}")
                        .required(["course"])
                        .uncache(["/courses/{course_id}*"]),
                )
                .category(
                    "assignments",
                    CategoryDescriptor::new()
                        .endpoint(
                            "list",
                            EndpointDef::get(
                                "list assignments",
                                "/courses/{course_id}/assignments",
                            ),
                        )
                        .endpoint(
                            "create",
                            EndpointDef::post(
                                "create an assignment",
                                "/courses/{course_id}/assignments",
                            )
                            .required(["assignment"])
                            .uncache(["/courses/{course_id}/assignments*"]),
                        ),
                ),
        )
        .category(
            "widgets",
            CategoryDescriptor::new().endpoint("list", EndpointDef::get("list widgets", "/widgets")),
        )
}

/// Client over `transport` with an immediate retry policy.
pub fn client(
    transport: Arc<ScriptedTransport>,
    catalogue: CategoryDescriptor,
    cache: Option<CacheMode>,
) -> Api {
    let mut builder = Lectern::builder()
        .host("canvas.test")
        .access_token("tok")
        .retry_policy(RetryPolicy::immediate())
        .transport(transport)
        .catalogue(catalogue);
    if let Some(mode) = cache {
        builder = builder.cache("memory").cache_mode(mode);
    }
    builder.build().expect("client should build")
}
