//! Chat prompt for the AI extraction path.

use std::fmt::Write as _;

use eduzip_core::wire::{ChatMessage, ChatRequest};
use eduzip_core::{ChecklistRecord, CriterionId, UpstageConfig};
use tracing::debug;

pub const SYSTEM_PROMPT: &str = "당신은 학습지원 소프트웨어 선정기준 분석 전문가입니다. \
문서를 분석하여 정확한 정보를 JSON 형식으로 추출합니다.";

const TEXT_FIELD_HINTS: [&str; 4] = [
    "문서에서 언급된 학습지원 소프트웨어 이름",
    "소프트웨어를 제공하는 회사/기관명",
    "소프트웨어 유형 (예: 학습관리, 콘텐츠, 코딩교육 등)",
    "소프트웨어의 주요 사용 목적",
];

/// Build the user turn: the document text (first `max_chars` characters)
/// followed by the field list, checkbox rules and the required reply shape.
pub fn build_user_prompt(document_text: &str, max_chars: usize) -> String {
    let excerpt: String = document_text.chars().take(max_chars).collect();
    let mut prompt = String::with_capacity(excerpt.len() + 2048);

    prompt.push_str(
        "다음은 학습지원 소프트웨어 선정기준 체크리스트 문서입니다. \
         이 문서를 분석하여 아래 정보를 JSON 형식으로 추출해주세요.\n\n",
    );
    let _ = writeln!(prompt, "문서 내용:\n{excerpt}\n");

    prompt.push_str("추출해야 할 정보:\n");
    for (n, (key, hint)) in ChecklistRecord::TEXT_FIELDS
        .iter()
        .zip(TEXT_FIELD_HINTS)
        .enumerate()
    {
        let _ = writeln!(prompt, "{}. {key}: {hint}", n + 1);
    }

    prompt.push_str(
        "\n필수기준 충족 여부 (각 항목별로 \"충족\", \"미충족\", \"해당없음\" 중 하나로 답변):\n",
    );
    for id in CriterionId::ALL {
        let _ = writeln!(prompt, "- {id}: {}", id.question());
    }

    prompt.push_str(
        "\n체크박스 판단 기준:\n\
         - 채워진 표시(■, ☑, ●, ✓, V)가 있는 선택지는 선택된 것입니다.\n\
         - 빈 표시(□, ○)만 있는 선택지는 선택되지 않은 것입니다.\n\
         - '예' 또는 '충족'에 표시되어 있으면 \"충족\", '아니오' 또는 '미충족'에 표시되어 있으면 \"미충족\", \
         '해당없음'에 표시되어 있으면 \"해당없음\"으로 답변하세요.\n",
    );

    prompt.push_str("\n반드시 아래 JSON 형식으로만 응답해주세요:\n{\n");
    for key in ChecklistRecord::TEXT_FIELDS {
        let _ = writeln!(prompt, "  \"{key}\": \"...\",");
    }
    let last = CriterionId::ALL.len() - 1;
    for (i, id) in CriterionId::ALL.into_iter().enumerate() {
        let sep = if i == last { "" } else { "," };
        let _ = writeln!(prompt, "  \"{id}\": \"충족\"{sep}");
    }
    prompt.push('}');

    prompt
}

/// Assemble the chat completion request for one document.
pub fn build_chat_request(
    document_text: &str,
    filename: &str,
    upstage: &UpstageConfig,
    max_chars: usize,
) -> ChatRequest {
    let user = build_user_prompt(document_text, max_chars);
    debug!(
        file = filename,
        text_chars = document_text.chars().count(),
        prompt_chars = user.chars().count(),
        "built analysis prompt"
    );

    ChatRequest {
        model: upstage.chat_model.clone(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)],
        temperature: upstage.temperature,
        max_tokens: upstage.max_tokens,
    }
}
