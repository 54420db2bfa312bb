use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use eduzip_core::UpstageConfig;
use eduzip_core::wire::{ParseBody, ProxyEnvelope};
use reqwest::multipart::{Form, Part};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use crate::ProxyError;

/// Base64 inflates documents by a third; this leaves room for the largest
/// file the parse API accepts.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

const DEFAULT_PARSE_MODEL: &str = "document-parse";

/// Shared state of the proxy route.
pub struct ProxyState {
    client: reqwest::Client,
    api_key: String,
    /// Upstream URLs the proxy will forward to. Anything else is refused so
    /// the held key is never sent to an arbitrary host.
    allowed_endpoints: Vec<String>,
}

impl ProxyState {
    pub fn new(upstage: &UpstageConfig) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder();
        if upstage.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(upstage.request_timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
            api_key: upstage.api_key.trim().to_string(),
            allowed_endpoints: vec![upstage.parse_url.clone(), upstage.chat_url.clone()],
        })
    }

    fn check_endpoint(&self, endpoint: &str) -> Result<(), ProxyError> {
        if self.allowed_endpoints.iter().any(|e| e == endpoint) {
            Ok(())
        } else {
            Err(ProxyError::EndpointNotAllowed(endpoint.to_string()))
        }
    }
}

/// Build the proxy router with a single route at `path`.
///
/// Every response carries permissive CORS headers so a page on any origin
/// can call it.
pub fn router(state: ProxyState, path: &str) -> Router {
    Router::new()
        .route(path, any(forward))
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors_header("access-control-allow-origin", "*"))
        .layer(cors_header("access-control-allow-methods", "POST, OPTIONS"))
        .layer(cors_header("access-control-allow-headers", "Content-Type"))
}

fn cors_header(name: &'static str, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}

async fn forward(
    State(state): State<Arc<ProxyState>>,
    method: Method,
    body: Bytes,
) -> Result<Response, ProxyError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }
    if method != Method::POST {
        return Err(ProxyError::MethodNotAllowed);
    }
    if state.api_key.is_empty() {
        warn!("UPSTAGE_API_KEY is not set");
        return Err(ProxyError::KeyMissing);
    }

    let envelope: ProxyEnvelope = serde_json::from_slice(&body)?;
    state.check_endpoint(&envelope.endpoint)?;
    info!(
        endpoint = %envelope.endpoint,
        form_data = envelope.is_form_data,
        "forwarding request"
    );

    let request = state
        .client
        .post(&envelope.endpoint)
        .bearer_auth(&state.api_key);
    let request = if envelope.is_form_data {
        let parse: ParseBody = serde_json::from_value(envelope.body)?;
        request.multipart(multipart_form(parse)?)
    } else {
        request.json(&envelope.body)
    };

    let upstream = request.send().await?;
    mirror(upstream).await
}

/// Rebuild the multipart form the parse API expects. Empty options are left out.
fn multipart_form(body: ParseBody) -> Result<Form, ProxyError> {
    let model = if body.model.trim().is_empty() {
        DEFAULT_PARSE_MODEL.to_string()
    } else {
        body.model
    };
    let mut form = Form::new().text("model", model);

    let options = [
        ("ocr", body.ocr),
        ("output_formats", body.output_formats),
        ("mode", body.mode),
    ];
    for (name, value) in options {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            form = form.text(name, value);
        }
    }

    if let Some(document) = body.document {
        let bytes = STANDARD.decode(document.data.as_bytes())?;
        let mut part = Part::bytes(bytes).file_name(document.filename);
        if !document.content_type.is_empty() {
            part = part.mime_str(&document.content_type)?;
        }
        form = form.part("document", part);
    }
    Ok(form)
}

/// Pass the upstream status, content type and body through unchanged.
async fn mirror(upstream: reqwest::Response) -> Result<Response, ProxyError> {
    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| HeaderValue::from_str(v).ok())
        .unwrap_or(HeaderValue::from_static("application/json"));
    let bytes = upstream.bytes().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "upstream returned an error");
    }

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::routing::post;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const PATH: &str = "/api/upstage";

    /// Serve `router` on a loopback port and return its base URL.
    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn echo(headers: axum::http::HeaderMap, body: Bytes) -> axum::Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        axum::Json(json!({
            "authorization": header("authorization"),
            "content_type": header("content-type"),
            "body": String::from_utf8_lossy(&body),
        }))
    }

    fn upstage(base: &str, key: &str) -> UpstageConfig {
        UpstageConfig {
            api_key: key.into(),
            parse_url: format!("{base}/parse"),
            chat_url: format!("{base}/chat"),
            ..Default::default()
        }
    }

    fn app(config: &UpstageConfig) -> Router {
        router(ProxyState::new(config).unwrap(), PATH)
    }

    fn post_json(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(PATH)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn preflight_is_ok_with_cors_headers() {
        let req = Request::builder()
            .method("OPTIONS")
            .uri(PATH)
            .body(Body::empty())
            .unwrap();
        let response = app(&upstage("http://unused", "k")).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
        assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    }

    #[tokio::test]
    async fn non_post_is_rejected() {
        let req = Request::builder()
            .method("GET")
            .uri(PATH)
            .body(Body::empty())
            .unwrap();
        let response = app(&upstage("http://unused", "k")).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(body_json(response).await, json!({"error": "Method not allowed"}));
    }

    #[tokio::test]
    async fn missing_key_is_server_error() {
        let config = upstage("http://unused", "");
        let envelope = json!({"endpoint": config.chat_url, "body": {}, "isFormData": false});
        let response = app(&config).oneshot(post_json(&envelope)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"error": "API key not configured"}));
    }

    #[tokio::test]
    async fn unknown_endpoint_is_refused() {
        let config = upstage("http://unused", "k");
        let envelope = json!({"endpoint": "http://evil.example/steal", "body": {}});
        let response = app(&config).oneshot(post_json(&envelope)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("evil.example"));
    }

    #[tokio::test]
    async fn json_body_forwarded_with_bearer() {
        let base = spawn_upstream(Router::new().route("/chat", post(echo))).await;
        let config = upstage(&base, "up_secret");
        let envelope = json!({
            "endpoint": config.chat_url,
            "body": {"model": "solar-pro", "messages": [{"role": "user", "content": "안녕"}]},
            "isFormData": false
        });

        let response = app(&config).oneshot(post_json(&envelope)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let echoed = body_json(response).await;
        assert_eq!(echoed["authorization"], "Bearer up_secret");
        assert_eq!(echoed["content_type"], "application/json");
        let forwarded: Value = serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
        assert_eq!(forwarded["messages"][0]["content"], "안녕");
    }

    #[tokio::test]
    async fn form_data_rebuilt_from_base64() {
        let base = spawn_upstream(Router::new().route("/parse", post(echo))).await;
        let config = upstage(&base, "up_secret");
        let envelope = json!({
            "endpoint": config.parse_url,
            "isFormData": true,
            "body": {
                "ocr": "force",
                "output_formats": "",
                "document": {
                    "data": STANDARD.encode(b"%PDF-1.4 hello"),
                    "filename": "form.pdf",
                    "contentType": "application/pdf"
                }
            }
        });

        let response = app(&config).oneshot(post_json(&envelope)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let echoed = body_json(response).await;
        assert!(echoed["content_type"].as_str().unwrap().starts_with("multipart/form-data"));
        let body = echoed["body"].as_str().unwrap();
        assert!(body.contains("name=\"model\"\r\n\r\ndocument-parse"));
        assert!(body.contains("name=\"ocr\"\r\n\r\nforce"));
        assert!(!body.contains("name=\"output_formats\""));
        assert!(!body.contains("name=\"mode\""));
        assert!(body.contains("filename=\"form.pdf\""));
        assert!(body.contains("%PDF-1.4 hello"));
    }

    #[tokio::test]
    async fn upstream_error_status_and_body_mirrored() {
        let upstream = Router::new().route(
            "/chat",
            post(|| async {
                (
                    StatusCode::PAYMENT_REQUIRED,
                    axum::Json(json!({"error": {"message": "credit exhausted"}})),
                )
            }),
        );
        let base = spawn_upstream(upstream).await;
        let config = upstage(&base, "k");
        let envelope = json!({"endpoint": config.chat_url, "body": {}, "isFormData": false});

        let response = app(&config).oneshot(post_json(&envelope)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        assert_eq!(
            body_json(response).await,
            json!({"error": {"message": "credit exhausted"}})
        );
    }

    #[tokio::test]
    async fn unreachable_upstream_is_server_error() {
        let config = upstage("http://127.0.0.1:1", "k");
        let envelope = json!({"endpoint": config.chat_url, "body": {}, "isFormData": false});

        let response = app(&config).oneshot(post_json(&envelope)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_envelope_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .uri(PATH)
            .body(Body::from("not json"))
            .unwrap();
        let response = app(&upstage("http://unused", "k")).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
