//! Checklist record types shared by the extractor, the result store and the exporters.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// One of the nine required privacy-compliance checklist items.
///
/// Declaration order is the display and export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CriterionId {
    C1_1,
    C1_2,
    C1_3,
    C2,
    C3,
    C4,
    C5_1,
    C5_2,
    C5_3,
}

impl CriterionId {
    pub const ALL: [CriterionId; 9] = [
        Self::C1_1,
        Self::C1_2,
        Self::C1_3,
        Self::C2,
        Self::C3,
        Self::C4,
        Self::C5_1,
        Self::C5_2,
        Self::C5_3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::C1_1 => "1-1",
            Self::C1_2 => "1-2",
            Self::C1_3 => "1-3",
            Self::C2 => "2",
            Self::C3 => "3",
            Self::C4 => "4",
            Self::C5_1 => "5-1",
            Self::C5_2 => "5-2",
            Self::C5_3 => "5-3",
        }
    }

    /// The checklist question, as printed on the selection-criteria form.
    pub fn question(&self) -> &'static str {
        match self {
            Self::C1_1 => "개인정보가 최소한으로 수집되는가?",
            Self::C1_2 => "개인정보 수집·이용 목적이 기재되어 있는가?",
            Self::C1_3 => "개인정보 수집항목, 보유기간 등이 기재되어 있는가?",
            Self::C2 => "개인정보 안전성 확보에 필요한 조치사항이 기재되어 있는가?",
            Self::C3 => {
                "이용자에게 열람·정정·삭제·처리정지를 요구할 수 있는 절차가 안내되어 있는가?"
            }
            Self::C4 => "만 14세 미만 아동의 개인정보 보호를 위한 절차가 마련되어 있는가?",
            Self::C5_1 => "개인정보 보호책임자 관련 정보가 안내되어 있는가?",
            Self::C5_2 => "개인정보 제3자 제공에 관한 정보가 기재되어 있는가?",
            Self::C5_3 => "개인정보 위·수탁관계에 관한 정보가 기재되어 있는가?",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CriterionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| format!("unknown criterion id: {s}"))
    }
}

/// Compliance outcome for a single criterion.
///
/// Externally serialised as `"O"`, `"X"`, `"-"` and `""`. Tokens the
/// classifier could not place are kept verbatim in `Unrecognized` so a
/// reviewer can still see what the document said.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Pass,
    Fail,
    NotApplicable,
    #[default]
    Unset,
    Unrecognized(String),
}

impl Verdict {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pass => "O",
            Self::Fail => "X",
            Self::NotApplicable => "-",
            Self::Unset => "",
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decodes the canonical wire form only; free text goes through
/// [`classify`](crate::classify) instead.
impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.as_str() {
            "O" => Self::Pass,
            "X" => Self::Fail,
            "-" => Self::NotApplicable,
            "" => Self::Unset,
            _ => Self::Unrecognized(s),
        }
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Unrecognized(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

/// The nine verdicts of a record. Every criterion is always present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Criteria([Verdict; 9]);

impl Criteria {
    pub fn get(&self, id: CriterionId) -> &Verdict {
        &self.0[id.index()]
    }

    pub fn set(&mut self, id: CriterionId, verdict: Verdict) {
        self.0[id.index()] = verdict;
    }

    /// Iterate in checklist order.
    pub fn iter(&self) -> impl Iterator<Item = (CriterionId, &Verdict)> {
        CriterionId::ALL.into_iter().zip(self.0.iter())
    }

    pub fn all_unset(&self) -> bool {
        self.0.iter().all(Verdict::is_unset)
    }
}

impl Serialize for Criteria {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, verdict) in self.iter() {
            map.serialize_entry(id.as_str(), verdict)?;
        }
        map.end()
    }
}

/// One row of analysis output.
///
/// Serialises with the Korean field names used on the checklist form, which
/// is also the key set the chat model is asked to answer with.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChecklistRecord {
    /// Positional display label, reassigned by the result store.
    #[serde(rename = "연번")]
    pub sequence_number: String,
    #[serde(rename = "소프트웨어명")]
    pub software_name: String,
    #[serde(rename = "공급자")]
    pub provider: String,
    #[serde(rename = "유형")]
    pub category: String,
    #[serde(rename = "주요용도")]
    pub purpose: String,
    #[serde(flatten)]
    pub criteria: Criteria,
}

impl ChecklistRecord {
    /// Keys of the four free-text fields, in column order.
    pub const TEXT_FIELDS: [&'static str; 4] = ["소프트웨어명", "공급자", "유형", "주요용도"];

    /// A record with only the software name filled in from the file name.
    ///
    /// Used when a document could not be analysed and must be completed by hand.
    pub fn placeholder(filename: &str) -> Self {
        Self {
            software_name: strip_extension(filename).to_string(),
            ..Self::default()
        }
    }

    /// True when nothing but the sequence number has been filled in.
    pub fn is_blank(&self) -> bool {
        self.software_name.is_empty()
            && self.provider.is_empty()
            && self.category.is_empty()
            && self.purpose.is_empty()
            && self.criteria.all_unset()
    }

    /// Cells in export column order: sequence, four text fields, nine criteria.
    pub fn cells(&self) -> Vec<&str> {
        let mut cells = vec![
            self.sequence_number.as_str(),
            self.software_name.as_str(),
            self.provider.as_str(),
            self.category.as_str(),
            self.purpose.as_str(),
        ];
        cells.extend(self.criteria.iter().map(|(_, v)| v.as_str()));
        cells
    }
}

/// Drop the final `.ext` of a file name, if any.
fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(dot) if dot + 1 < filename.len() && !filename[dot + 1..].contains('/') => {
            &filename[..dot]
        }
        _ => filename,
    }
}

/// A document queued for analysis.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type_for(&name).to_string();
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Lowercased extension including the dot, e.g. `".pdf"`.
    pub fn extension(&self) -> Option<String> {
        let dot = self.name.rfind('.')?;
        Some(self.name[dot..].to_lowercase())
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".hwp") {
        "application/x-hwp"
    } else {
        "application/octet-stream"
    }
}

/// Parse and analysis responses for one processed file, kept verbatim for audit display.
#[derive(Debug, Clone, Serialize)]
pub struct RawExchange {
    pub filename: String,
    pub parse_response: serde_json::Value,
    pub analysis_response: Option<serde_json::Value>,
}
