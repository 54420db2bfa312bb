//! Reading a checklist record out of a chat model's free-form reply.

use eduzip_core::{ChecklistRecord, CriterionId, classify_model_answer};
use serde_json::{Map, Value};
use tracing::debug;

use crate::AnalysisError;

/// Alternate key some replies use for the software name, copied from the form header.
const SOFTWARE_NAME_ALIAS: &str = "학습지원 소프트웨어명";

/// The span from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json_span(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Parse the JSON object embedded in `reply` into a record.
///
/// Free-text fields are taken as given. Criterion answers go through
/// [`classify_model_answer`]; missing criteria stay unset. The sequence
/// number is left empty for the result store to assign.
pub fn parse_reply(reply: &str) -> Result<ChecklistRecord, AnalysisError> {
    let span = extract_json_span(reply)
        .ok_or_else(|| AnalysisError::MalformedModelOutput("no JSON object in reply".into()))?;

    let object: Map<String, Value> = serde_json::from_str(span)
        .map_err(|e| AnalysisError::MalformedModelOutput(e.to_string()))?;

    let mut record = ChecklistRecord {
        software_name: text_field(&object, "소프트웨어명")
            .or_else(|| text_field(&object, SOFTWARE_NAME_ALIAS))
            .unwrap_or_default(),
        provider: text_field(&object, "공급자").unwrap_or_default(),
        category: text_field(&object, "유형").unwrap_or_default(),
        purpose: text_field(&object, "주요용도").unwrap_or_default(),
        ..Default::default()
    };

    for id in CriterionId::ALL {
        if let Some(answer) = text_field(&object, id.as_str()) {
            record.criteria.set(id, classify_model_answer(&answer));
        }
    }

    debug!(software = %record.software_name, "parsed model reply");
    Ok(record)
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
