//! Verdict classification for checklist cells.
//!
//! Scanned forms and model replies express the same three outcomes in many
//! ways: letters, circle and cross glyphs, check marks, English words and
//! Korean terms. [`classify`] folds all of them into a [`Verdict`].
//!
//! # Rules, in priority order
//!
//! 1. Empty or whitespace-only → `Unset`
//! 2. Affirmative token → `Pass`
//! 3. Negative token → `Fail`
//! 4. Not-applicable token → `NotApplicable`
//! 5. Anything else is kept verbatim as `Unrecognized` for manual review
//!
//! Matching is on the whole trimmed token, case-insensitively.

use crate::Verdict;

const AFFIRMATIVE: &[&str] = &[
    "o", "○", "◯", "〇", "●", "◉", "⦿", "✓", "✔", "☑", "✅", "v", "yes", "y", "충족", "적합",
    "해당",
];

const NEGATIVE: &[&str] = &[
    "x", "×", "✗", "✘", "☒", "❌", "no", "n", "미충족", "부적합",
];

const NOT_APPLICABLE: &[&str] = &["-", "n/a", "na", "해당없음", "해당 없음"];

/// Classify a single table cell or form token.
pub fn classify(token: &str) -> Verdict {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Verdict::Unset;
    }

    let lower = trimmed.to_lowercase();
    if AFFIRMATIVE.contains(&lower.as_str()) {
        Verdict::Pass
    } else if NEGATIVE.contains(&lower.as_str()) {
        Verdict::Fail
    } else if NOT_APPLICABLE.contains(&lower.as_str()) {
        Verdict::NotApplicable
    } else {
        Verdict::Unrecognized(trimmed.to_string())
    }
}

/// Classify a chat model's answer for one criterion.
///
/// The model is asked to answer with 충족 / 미충족 / 해당없음 and tends to
/// wrap those words in short phrases, so this runs a substring pass first:
///
/// - contains 충족 but no 미 → `Pass`
/// - contains 미충족 or 부적합 → `Fail`
/// - contains 해당없음 or 해당 없음 → `NotApplicable`
///
/// Any other answer is kept exactly as the model returned it, untrimmed.
/// An empty answer stays unset, and the bare symbols `O`, `X` and `-` are
/// read as the verdicts they already spell.
pub fn classify_model_answer(answer: &str) -> Verdict {
    let lower = answer.to_lowercase();
    if lower.contains("충족") && !lower.contains('미') {
        Verdict::Pass
    } else if lower.contains("미충족") || lower.contains("부적합") {
        Verdict::Fail
    } else if lower.contains("해당없음") || lower.contains("해당 없음") {
        Verdict::NotApplicable
    } else {
        match answer {
            "" => Verdict::Unset,
            "O" => Verdict::Pass,
            "X" => Verdict::Fail,
            "-" => Verdict::NotApplicable,
            _ => Verdict::Unrecognized(answer.to_string()),
        }
    }
}
