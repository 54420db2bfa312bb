//! Request and response bodies exchanged with the upstream APIs and the credential proxy.
//!
//! Field names follow the upstream JSON exactly; the proxy and the client
//! both (de)serialise through these types.

use serde::{Deserialize, Serialize};

/// Body posted to the credential proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyEnvelope {
    pub endpoint: String,
    pub body: serde_json::Value,
    #[serde(rename = "isFormData", default)]
    pub is_form_data: bool,
}

/// Document-parse options plus the base64-encoded document.
///
/// The proxy rebuilds a multipart form from this, skipping empty options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseBody {
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_formats: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// Base64 (standard alphabet) file contents.
    pub data: String,
    pub filename: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Chat-completion response. Only the first choice's text is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatReply>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletion {
    /// Text of the first choice, or `""` when the response has none.
    pub fn reply_text(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_camel_case_flag() {
        let env = ProxyEnvelope {
            endpoint: "https://example.test/v1/chat".into(),
            body: serde_json::json!({"model": "m"}),
            is_form_data: true,
        };
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["isFormData"], true);

        let parsed: ProxyEnvelope =
            serde_json::from_str(r#"{"endpoint": "e", "body": {}}"#).unwrap();
        assert!(!parsed.is_form_data);
    }

    #[test]
    fn parse_body_skips_missing_options() {
        let body = ParseBody {
            model: "document-parse".into(),
            ocr: Some("force".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ocr"], "force");
        assert!(json.get("mode").is_none());
        assert!(json.get("document").is_none());
    }

    #[test]
    fn document_payload_content_type_key() {
        let payload = DocumentPayload {
            data: "AAE=".into(),
            filename: "a.pdf".into(),
            content_type: "application/pdf".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["contentType"], "application/pdf");
    }

    #[test]
    fn reply_text_of_first_choice() {
        let c: ChatCompletion = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"a\": 1}"}}],
                "usage": {"total_tokens": 10}}"#,
        )
        .unwrap();
        assert_eq!(c.reply_text(), r#"{"a": 1}"#);
    }

    #[test]
    fn reply_text_empty_when_missing() {
        let c: ChatCompletion = serde_json::from_str("{}").unwrap();
        assert_eq!(c.reply_text(), "");
        let c: ChatCompletion =
            serde_json::from_str(r#"{"choices": [{"message": null}]}"#).unwrap();
        assert_eq!(c.reply_text(), "");
    }
}
