use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use eduzip_core::wire::{ChatRequest, DocumentPayload, ParseBody, ProxyEnvelope};
use eduzip_core::{AnalysisMode, UploadedFile, UpstageConfig};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::{ClientError, DocumentService};

/// Where requests are sent.
#[derive(Debug, Clone)]
enum Transport {
    /// Straight to Upstage, with the bearer key attached here.
    Direct { api_key: String },
    /// Wrapped in a [`ProxyEnvelope`] and posted to the credential proxy,
    /// which attaches the key.
    Proxy { url: String },
}

/// HTTP client for Upstage document parse and chat completion.
pub struct UpstageClient {
    client: reqwest::Client,
    transport: Transport,
    config: UpstageConfig,
}

impl UpstageClient {
    /// Build a client from configuration. A non-empty `proxy_url` selects
    /// the proxy transport; otherwise the API key is sent directly.
    pub fn new(config: &UpstageConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        let transport = if config.uses_proxy() {
            Transport::Proxy {
                url: config.proxy_url.trim().to_string(),
            }
        } else {
            Transport::Direct {
                api_key: config.api_key.trim().to_string(),
            }
        };

        Ok(Self {
            client: builder.build()?,
            transport,
            config: config.clone(),
        })
    }

    pub fn uses_proxy(&self) -> bool {
        matches!(self.transport, Transport::Proxy { .. })
    }

    async fn post_proxy(
        &self,
        url: &str,
        envelope: &ProxyEnvelope,
    ) -> Result<serde_json::Value, ClientError> {
        let resp = self.client.post(url).json(envelope).send().await?;
        read_json(resp).await
    }

    fn parse_body(&self, file: &UploadedFile, mode: AnalysisMode) -> ParseBody {
        ParseBody {
            model: self.config.parse_model.clone(),
            ocr: Some(self.config.ocr.clone()),
            output_formats: Some(mode.output_formats().to_string()),
            mode: Some(self.config.parse_mode.clone()),
            document: Some(DocumentPayload {
                data: STANDARD.encode(&file.bytes),
                filename: file.name.clone(),
                content_type: file.content_type.clone(),
            }),
        }
    }
}

#[async_trait]
impl DocumentService for UpstageClient {
    fn is_configured(&self) -> bool {
        match &self.transport {
            Transport::Direct { api_key } => !api_key.is_empty(),
            Transport::Proxy { .. } => true,
        }
    }

    async fn parse_document(
        &self,
        file: &UploadedFile,
        mode: AnalysisMode,
    ) -> Result<serde_json::Value, ClientError> {
        info!(
            file = %file.name,
            bytes = file.size(),
            proxy = self.uses_proxy(),
            "requesting document parse"
        );

        match &self.transport {
            Transport::Direct { api_key } => {
                let document = Part::bytes(file.bytes.clone())
                    .file_name(file.name.clone())
                    .mime_str(&file.content_type)?;
                let form = Form::new()
                    .text("model", self.config.parse_model.clone())
                    .part("document", document)
                    .text("ocr", self.config.ocr.clone())
                    .text("output_formats", mode.output_formats())
                    .text("mode", self.config.parse_mode.clone());

                let resp = self
                    .client
                    .post(&self.config.parse_url)
                    .bearer_auth(api_key)
                    .multipart(form)
                    .send()
                    .await?;
                read_json(resp).await
            }
            Transport::Proxy { url } => {
                let envelope = ProxyEnvelope {
                    endpoint: self.config.parse_url.clone(),
                    body: serde_json::to_value(self.parse_body(file, mode))?,
                    is_form_data: true,
                };
                self.post_proxy(url, &envelope).await
            }
        }
    }

    async fn chat(&self, request: &ChatRequest) -> Result<serde_json::Value, ClientError> {
        debug!(model = %request.model, proxy = self.uses_proxy(), "requesting chat completion");

        match &self.transport {
            Transport::Direct { api_key } => {
                let resp = self
                    .client
                    .post(&self.config.chat_url)
                    .bearer_auth(api_key)
                    .json(request)
                    .send()
                    .await?;
                read_json(resp).await
            }
            Transport::Proxy { url } => {
                let envelope = ProxyEnvelope {
                    endpoint: self.config.chat_url.clone(),
                    body: serde_json::to_value(request)?,
                    is_form_data: false,
                };
                self.post_proxy(url, &envelope).await
            }
        }
    }
}

/// Success bodies are parsed as JSON; anything else becomes [`ClientError::Upstream`].
async fn read_json(resp: reqwest::Response) -> Result<serde_json::Value, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use eduzip_core::wire::ChatMessage;
    use pretty_assertions::assert_eq;

    /// Serve `router` on a loopback port and return its base URL.
    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn direct_config(base: &str) -> UpstageConfig {
        UpstageConfig {
            api_key: "up_test_key".into(),
            parse_url: format!("{base}/parse"),
            chat_url: format!("{base}/chat"),
            ..Default::default()
        }
    }

    fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "solar-pro".into(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.1,
            max_tokens: 10,
        }
    }

    /// Echo what arrived back as JSON so tests can inspect the request.
    async fn echo(headers: HeaderMap, body: Bytes) -> axum::Json<serde_json::Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        axum::Json(serde_json::json!({
            "authorization": header("authorization"),
            "content_type": header("content-type"),
            "body": String::from_utf8_lossy(&body),
        }))
    }

    #[test]
    fn transport_follows_proxy_url() {
        let direct = UpstageClient::new(&UpstageConfig::default()).unwrap();
        assert!(!direct.uses_proxy());
        assert!(!direct.is_configured());

        let proxied = UpstageClient::new(&UpstageConfig {
            proxy_url: "http://localhost:3000/api/upstage".into(),
            ..Default::default()
        })
        .unwrap();
        assert!(proxied.uses_proxy());
        assert!(proxied.is_configured());
    }

    #[tokio::test]
    async fn direct_parse_sends_multipart_with_bearer() {
        let base = spawn(Router::new().route("/parse", post(echo))).await;
        let client = UpstageClient::new(&direct_config(&base)).unwrap();
        let file = UploadedFile::new("form.pdf", b"%PDF-1.7 body".to_vec());

        let echoed = client.parse_document(&file, AnalysisMode::Table).await.unwrap();

        assert_eq!(echoed["authorization"], "Bearer up_test_key");
        assert!(echoed["content_type"].as_str().unwrap().starts_with("multipart/form-data"));
        let body = echoed["body"].as_str().unwrap();
        assert!(body.contains("document-parse"));
        assert!(body.contains("filename=\"form.pdf\""));
        assert!(body.contains("%PDF-1.7 body"));
        assert!(body.contains("['text', 'markdown', 'html']"));
        assert!(body.contains("force"));
        assert!(body.contains("enhanced"));
    }

    #[tokio::test]
    async fn proxy_parse_wraps_base64_document() {
        let base = spawn(Router::new().route("/api/upstage", post(echo))).await;
        let config = UpstageConfig {
            proxy_url: format!("{base}/api/upstage"),
            ..Default::default()
        };
        let client = UpstageClient::new(&config).unwrap();
        let file = UploadedFile::new("form.hwp", vec![0xd0, 0xcf, 0x11]);

        let echoed = client.parse_document(&file, AnalysisMode::Ai).await.unwrap();

        assert_eq!(echoed["authorization"], "");
        let envelope: ProxyEnvelope =
            serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
        assert!(envelope.is_form_data);
        assert_eq!(envelope.endpoint, config.parse_url);

        let body: ParseBody = serde_json::from_value(envelope.body).unwrap();
        assert_eq!(body.model, "document-parse");
        assert_eq!(body.output_formats.as_deref(), Some("['text', 'markdown']"));
        let document = body.document.unwrap();
        assert_eq!(document.filename, "form.hwp");
        assert_eq!(document.content_type, "application/x-hwp");
        assert_eq!(STANDARD.decode(document.data).unwrap(), vec![0xd0, 0xcf, 0x11]);
    }

    #[tokio::test]
    async fn proxy_chat_is_json_envelope() {
        let base = spawn(Router::new().route("/p", post(echo))).await;
        let client = UpstageClient::new(&UpstageConfig {
            proxy_url: format!("{base}/p"),
            ..Default::default()
        })
        .unwrap();

        let echoed = client.chat(&chat_request()).await.unwrap();
        let envelope: ProxyEnvelope =
            serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
        assert!(!envelope.is_form_data);
        assert_eq!(envelope.body["model"], "solar-pro");
        assert_eq!(envelope.body["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn upstream_error_carries_status_and_body() {
        let router = Router::new().route(
            "/chat",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    r#"{"error":{"message":"Invalid api_key"}}"#,
                )
            }),
        );
        let base = spawn(router).await;
        let client = UpstageClient::new(&direct_config(&base)).unwrap();

        let err = client.chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Upstream { status: 401, .. }));
        assert!(err.is_credential_failure());
        assert_eq!(err.to_string(), "upstream returned 401: Invalid api_key");
    }

    #[tokio::test]
    async fn non_json_success_body_is_json_error() {
        let base = spawn(Router::new().route("/chat", post(|| async { "not json" }))).await;
        let client = UpstageClient::new(&direct_config(&base)).unwrap();
        let err = client.chat(&chat_request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }
}
