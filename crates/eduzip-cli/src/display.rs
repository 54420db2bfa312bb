//! Terminal rendering for queued files and result rows.
//!
//! Rows are shown as short vertical cards rather than a grid: Korean text is
//! double-width in most terminals and does not pad reliably.

use std::fmt::Write as _;

use eduzip_core::{ChecklistRecord, UploadedFile};
use eduzip_ingest::{BatchReport, FileState};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Size with a binary unit and at most two decimals, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

pub fn render_file_list(files: &[UploadedFile]) -> String {
    let mut out = String::new();
    for file in files {
        let _ = writeln!(out, "  {}  ({})", file.name, format_size(file.size() as u64));
    }
    out
}

/// One card per row; rows listed in `review` are marked for manual completion.
pub fn render_results(records: &[ChecklistRecord], review: &[usize]) -> String {
    let mut out = String::new();
    for (index, record) in records.iter().enumerate() {
        let flag = if review.contains(&index) {
            "  [직접 입력 필요]"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{:>3}. {}{flag}",
            record.sequence_number,
            or_dash(&record.software_name)
        );
        let _ = writeln!(
            out,
            "     공급자 {} | 유형 {} | 주요용도 {}",
            or_dash(&record.provider),
            or_dash(&record.category),
            or_dash(&record.purpose)
        );
        let verdicts: Vec<String> = record
            .criteria
            .iter()
            .map(|(id, verdict)| {
                let shown = if verdict.is_unset() { "·" } else { verdict.as_str() };
                format!("{id} {shown}")
            })
            .collect();
        let _ = writeln!(out, "     {}", verdicts.join("  "));
    }
    out
}

pub fn render_summary(report: &BatchReport) -> String {
    let mut out = format!(
        "{} / {} 파일 처리 완료: {}행 추가, {}건 실패",
        report.processed,
        report.total,
        report.appended(),
        report.failed()
    );
    for outcome in report.files.iter().filter(|f| f.state == FileState::Failed) {
        let reason = outcome.error.as_deref().unwrap_or("unknown error");
        let _ = write!(out, "\n  ✗ {}: {reason}", outcome.file);
    }
    out
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduzip_core::{CriterionId, Verdict};
    use eduzip_ingest::FileOutcome;
    use pretty_assertions::assert_eq;

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(500), "500 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1 MB");
        assert_eq!(format_size(1_234_567), "1.18 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn file_list_shows_sizes() {
        let files = vec![UploadedFile::new("a.pdf", vec![0; 2048])];
        assert_eq!(render_file_list(&files), "  a.pdf  (2 KB)\n");
    }

    #[test]
    fn results_card_marks_review_rows() {
        let mut first = ChecklistRecord {
            sequence_number: "1".into(),
            software_name: "클래스팅".into(),
            provider: "㈜클래스팅".into(),
            ..Default::default()
        };
        first.criteria.set(CriterionId::C1_1, Verdict::Pass);
        first.criteria.set(CriterionId::C5_3, Verdict::Fail);
        let second = ChecklistRecord {
            sequence_number: "2".into(),
            ..ChecklistRecord::placeholder("scan.pdf")
        };

        let text = render_results(&[first, second], &[1]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "  1. 클래스팅");
        assert_eq!(lines[1], "     공급자 ㈜클래스팅 | 유형 - | 주요용도 -");
        assert!(lines[2].starts_with("     1-1 O  1-2 ·"));
        assert!(lines[2].ends_with("5-3 X"));
        assert_eq!(lines[3], "  2. scan  [직접 입력 필요]");
    }

    #[test]
    fn summary_lists_failures() {
        let report = BatchReport {
            processed: 2,
            total: 2,
            files: vec![
                FileOutcome {
                    file: "a.pdf".into(),
                    state: FileState::Appended,
                    rows: 1,
                    error: None,
                },
                FileOutcome {
                    file: "b.pdf".into(),
                    state: FileState::Failed,
                    rows: 0,
                    error: Some("upstream returned 500: boom".into()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            render_summary(&report),
            "2 / 2 파일 처리 완료: 1행 추가, 1건 실패\n  ✗ b.pdf: upstream returned 500: boom"
        );
    }
}
