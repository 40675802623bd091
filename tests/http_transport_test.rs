#![cfg(feature = "http")]

use std::time::Duration;

use lectern::{
    CallOptions, CategoryDescriptor, EndpointDef, HttpTransport, Lectern, LecternError, Method,
    RetryPolicy, Transport, TransportError, TransportRequest,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalogue() -> CategoryDescriptor {
    CategoryDescriptor::new().category(
        "courses",
        CategoryDescriptor::new()
            .endpoint("list", EndpointDef::get("list your courses", "/courses"))
            .endpoint(
                "get",
                EndpointDef::get("get info on a course", "/courses/{course_id}"),
            )
            .endpoint(
                "update",
                EndpointDef::put("update a course", "/courses/{course_id}").required(["course"]),
            ),
    )
}

fn api(server: &MockServer) -> lectern::Api {
    Lectern::builder()
        .host(server.uri())
        .access_token("secret")
        .retry_policy(RetryPolicy::immediate())
        .transport(std::sync::Arc::new(HttpTransport::new().unwrap()))
        .catalogue(catalogue())
        .build()
        .unwrap()
}

#[tokio::test]
async fn follows_link_headers() {
    let server = MockServer::start().await;
    let next = format!("{}/api/v1/courses?page=2&per_page=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(query_param("per_page", "2"))
        .and(query_param("access_token", "secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1}, {"id": 2}]))
                .insert_header("Link", format!("<{next}>; rel=\"next\", <{next}>; rel=\"last\"")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let value = api(&server)
        .call("courses.list", CallOptions::new().items_per_page(2))
        .await
        .unwrap();

    assert_eq!(value, json!([{"id": 1}, {"id": 2}, {"id": 3}]));
}

#[tokio::test]
async fn retries_service_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let value = api(&server)
        .call("courses.get", CallOptions::new().param("course_id", 1))
        .await
        .unwrap();
    assert_eq!(value, json!({"id": 1}));
}

#[tokio::test]
async fn not_found_is_permanent_with_canvas_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/9"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"errors": [{"message": "The specified resource does not exist."}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = api(&server)
        .call("courses.get", CallOptions::new().param("course_id", 9))
        .await
        .unwrap_err();

    match err {
        LecternError::RequestFailed {
            attempts: 1,
            source: TransportError::Status { status, message, .. },
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "The specified resource does not exist.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn mutations_send_a_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/courses/5"))
        .and(body_json(json!({"access_token": "secret", "course": {"name": "Chem"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 5, "name": "Chem"})))
        .expect(1)
        .mount(&server)
        .await;

    let value = api(&server)
        .call(
            "courses.update",
            CallOptions::new()
                .param("course_id", 5)
                .param("course", json!({"name": "Chem"})),
        )
        .await
        .unwrap();
    assert_eq!(value["name"], "Chem");
}

#[tokio::test]
async fn query_encoding_uses_bracket_conventions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("include[]", "term"))
        .and(query_param("filter[state]", "available"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let mut params = lectern::Params::new();
    params.insert("include".into(), json!(["term"]));
    params.insert("filter".into(), json!({"state": "available"}));
    params.insert("skip".into(), json!(null));
    let response = transport
        .send_request(
            TransportRequest::new(Method::Get, format!("{}/search", server.uri())).params(params),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert_eq!(response.data, json!(null));
    assert!(response.continuation.is_none());
}

#[tokio::test]
async fn retry_after_header_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "3"))
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .unwrap()
        .send_request(TransportRequest::new(Method::Get, server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    let transport = HttpTransport::with_timeout(Duration::from_secs(2)).unwrap();
    let err = transport
        .send_request(TransportRequest::new(Method::Get, "http://127.0.0.1:9/"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}
