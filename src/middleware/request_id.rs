//! Request correlation ids
//!
//! Every request carries a `RequestId` in its extensions and the
//! `x-request-id` response header. A caller-supplied UUID is reused so a
//! client can follow one request through the logs; anything else is replaced
//! with a fresh v4 id. The middleware must sit outside `TraceLayer` so the
//! span built by `make_span_with_request_id` can read the id.
use axum::{
    body::Body,
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id stored in request extensions
///
/// Handlers can take it with `Extension<RequestId>` to tag their own logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Fresh random (v4) id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuses a caller-supplied id when it is a valid UUID.
    ///
    /// Surrounding whitespace is ignored. Non-UTF-8 or non-UUID values yield
    /// `None`.
    pub fn from_header(value: Option<&HeaderValue>) -> Option<Self> {
        value
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .map(Self)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tags every request with a `RequestId` and echoes it on the response.
///
/// The id is inserted before the inner service runs, so handlers and the
/// trace span both see it. The response header is set even on error
/// responses.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_header(request.headers().get(REQUEST_ID_HEADER))
        .unwrap_or_else(RequestId::generate);

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Span for `TraceLayer` carrying method, URI and request id.
///
/// Falls back to `"unknown"` when the request did not pass through
/// `request_id_middleware`.
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderName, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use axum_test::TestServer;

    async fn echo_id(Extension(id): Extension<RequestId>) -> String {
        id.to_string()
    }

    async fn failing() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn server() -> TestServer {
        let app = Router::new()
            .route("/id", get(echo_id))
            .route("/fail", get(failing))
            .layer(middleware::from_fn(request_id_middleware));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_handler_sees_the_echoed_id() {
        let response = server().get("/id").await;
        let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();

        assert!(Uuid::parse_str(&header).is_ok());
        assert_eq!(response.text(), header);
    }

    #[tokio::test]
    async fn test_supplied_id_survives_error_responses() {
        let id = "0b6f2c8e-51a4-4f0e-9a57-3d2f6e1c9b40";
        let response = server()
            .get("/fail")
            .add_header(
                HeaderName::from_static(REQUEST_ID_HEADER),
                HeaderValue::from_static(id),
            )
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], id);
    }

    #[tokio::test]
    async fn test_malformed_id_is_replaced() {
        let response = server()
            .get("/id")
            .add_header(
                HeaderName::from_static(REQUEST_ID_HEADER),
                HeaderValue::from_static("drop table games"),
            )
            .await;

        let header = response.headers()[REQUEST_ID_HEADER].to_str().unwrap().to_string();
        assert_ne!(header, "drop table games");
        assert!(Uuid::parse_str(&header).is_ok());
    }

    #[test]
    fn test_valid_header_is_reused() {
        let id = Uuid::new_v4();
        let header = HeaderValue::from_str(&id.to_string()).unwrap();
        assert_eq!(RequestId::from_header(Some(&header)), Some(RequestId(id)));
    }

    #[test]
    fn test_invalid_or_missing_header_is_ignored() {
        let header = HeaderValue::from_static("not-a-uuid");
        assert_eq!(RequestId::from_header(Some(&header)), None);
        assert_eq!(RequestId::from_header(None), None);
    }
}
