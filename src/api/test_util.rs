use axum::body::{self, Body};
use axum::http::{Method, Request, header};
use serde::de::DeserializeOwned;

/// Reads the whole response body and deserializes it into the requested type. Panics and fails
/// the test if the body can't be read or doesn't parse.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: Body) -> T {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!");

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!("Could not parse response body: {err}. Received body: {bytes:?}")
    })
}

/// Reads the whole response body as UTF-8 text
pub async fn body_text(response_body: Body) -> String {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!");

    String::from_utf8(bytes.to_vec()).expect("Response body was not UTF-8")
}

/// Builds a request carrying the given raw text as a JSON body
pub fn json_request(method: Method, uri: &str, raw_body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(raw_body.into()))
        .expect("Could not build test request")
}

/// Builds a bodyless request
pub fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Could not build test request")
}
