//! Document-parse service responses and their reduction to plain text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::NormalizeError;

/// Response of the document-parse call.
///
/// Every field is optional: depending on the requested output formats and on
/// what the service could recognise, any of them may be missing or null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub content: Option<DocumentContent>,
    #[serde(default)]
    pub elements: Option<Vec<DocumentElement>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentContent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// A typed layout element (paragraph, table, list, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentElement {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub content: Option<ElementContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementContent {
    #[serde(default)]
    pub html: Option<String>,
}

impl ParseResponse {
    /// Analysable plain text: the `text` field, else `markdown`, else `html`
    /// reduced with [`html_to_text`]. Blank representations are skipped.
    pub fn plain_text(&self) -> Result<String, NormalizeError> {
        let content = self.content.as_ref();

        if let Some(text) = non_blank(content.and_then(|c| c.text.as_deref())) {
            return Ok(text.to_string());
        }
        if let Some(markdown) = non_blank(content.and_then(|c| c.markdown.as_deref())) {
            debug!(source = "markdown", "no plain text in parse response");
            return Ok(markdown.to_string());
        }
        if let Some(html) = non_blank(content.and_then(|c| c.html.as_deref())) {
            let text = html_to_text(html);
            if !text.is_empty() {
                debug!(
                    source = "html",
                    chars = text.chars().count(),
                    "no plain text in parse response"
                );
                return Ok(text);
            }
        }
        debug!("parse response carries no usable text");
        Err(NormalizeError::EmptyDocumentText)
    }

    /// HTML fragments that may hold the checklist table.
    ///
    /// Structured `table`/`list` elements are preferred; the document-wide
    /// HTML is used only when there are none, so rows are not seen twice.
    pub fn table_sources(&self) -> Vec<&str> {
        let from_elements: Vec<&str> = self
            .elements
            .iter()
            .flatten()
            .filter(|e| matches!(e.category.as_str(), "table" | "list"))
            .filter_map(|e| e.content.as_ref()?.html.as_deref())
            .filter(|html| !html.trim().is_empty())
            .collect();
        if !from_elements.is_empty() {
            return from_elements;
        }

        self.content
            .as_ref()
            .and_then(|c| c.html.as_deref())
            .filter(|html| !html.trim().is_empty())
            .into_iter()
            .collect()
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(?:p|div|h[1-6]|li|tr|table)\s*>").expect("valid regex")
});
static CELL_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</t[dh]\s*>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*(?:\n[ \t\r]*)+").expect("valid regex"));

/// Best-effort HTML to text reduction.
///
/// Not an HTML parser: block-closing tags become newlines, table cells are
/// separated by a space, remaining tags are stripped, the four basic
/// entities are decoded and runs of blank lines collapse to one. Malformed
/// markup never fails; whatever survives tag stripping is returned.
pub fn html_to_text(html: &str) -> String {
    let text = LINE_BREAK.replace_all(html, "\n");
    let text = CELL_END.replace_all(&text, " ");
    let text = TAG.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(json: &str) -> ParseResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn text_preferred_over_markdown() {
        let r = response(r##"{"content": {"text": "plain", "markdown": "# md"}}"##);
        assert_eq!(r.plain_text().unwrap(), "plain");
    }

    #[test]
    fn markdown_when_text_blank() {
        let r = response(r##"{"content": {"text": "  ", "markdown": "# md"}}"##);
        assert_eq!(r.plain_text().unwrap(), "# md");
    }

    #[test]
    fn html_reduced_when_only_html() {
        let r = response(r#"{"content": {"html": "<h1>제목</h1><p>본문 &amp; 내용</p>"}}"#);
        assert_eq!(r.plain_text().unwrap(), "제목\n본문 & 내용");
    }

    #[test]
    fn empty_document_is_an_error() {
        let r = response(r#"{"content": {"text": "", "html": "<div> </div>"}}"#);
        assert!(matches!(r.plain_text(), Err(NormalizeError::EmptyDocumentText)));

        let r = response(r#"{"content": null}"#);
        assert!(matches!(r.plain_text(), Err(NormalizeError::EmptyDocumentText)));

        let r = response("{}");
        assert!(matches!(r.plain_text(), Err(NormalizeError::EmptyDocumentText)));
    }

    #[test]
    fn unknown_fields_ignored() {
        let r = response(
            r#"{"api": "2.0", "model": "document-parse", "usage": {"pages": 2},
                "content": {"text": "ok"}}"#,
        );
        assert_eq!(r.plain_text().unwrap(), "ok");
    }

    #[test]
    fn html_to_text_collapses_blank_lines() {
        let html = "<p>a</p>\n\n\n<p>b</p><br><br/><br /><div>c</div>";
        assert_eq!(html_to_text(html), "a\n\nb\n\nc");
    }

    #[test]
    fn html_to_text_decodes_entities() {
        assert_eq!(html_to_text("1&nbsp;&lt;&nbsp;2 &amp;&amp; 3&gt;2"), "1 < 2 && 3>2");
        // &amp; is decoded last so an escaped entity stays literal.
        assert_eq!(html_to_text("&amp;lt;"), "&lt;");
    }

    #[test]
    fn html_to_text_tolerates_malformed_markup() {
        assert_eq!(html_to_text("<p>open <b>bold</p> trailing <div"), "open bold\n trailing <div");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn table_cells_are_separated() {
        let html = "<table><tr><td>1</td><td>앱</td></tr><tr><td>2</td><td>웹</td></tr></table>";
        assert_eq!(html_to_text(html), "1 앱 \n2 웹");
    }

    #[test]
    fn table_sources_prefer_elements() {
        let r = response(
            r#"{"content": {"html": "<table>all</table>"},
                "elements": [
                    {"category": "paragraph", "content": {"html": "<p>x</p>"}},
                    {"category": "table", "content": {"html": "<table>t1</table>"}},
                    {"category": "list", "content": {"html": "<ul>l1</ul>"}},
                    {"category": "table", "content": {"html": null}}
                ]}"#,
        );
        assert_eq!(r.table_sources(), vec!["<table>t1</table>", "<ul>l1</ul>"]);
    }

    #[test]
    fn table_sources_fall_back_to_document_html() {
        let r = response(
            r#"{"content": {"html": "<table>all</table>"},
                "elements": [{"category": "paragraph", "content": {"html": "<p>x</p>"}}]}"#,
        );
        assert_eq!(r.table_sources(), vec!["<table>all</table>"]);
        assert!(ParseResponse::default().table_sources().is_empty());
    }
}
