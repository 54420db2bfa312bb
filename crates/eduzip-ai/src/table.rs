//! Schema-driven extraction of checklist rows from parsed HTML tables.
//!
//! The selection-criteria form is a 14-column table: sequence, software
//! name, provider, category, purpose, then one column per criterion in
//! checklist order. Cells are mapped by position. This is a heuristic:
//! tables laid out differently yield no rows (or odd ones), and callers
//! treat zero rows as "needs manual entry", never as an error.

use std::sync::LazyLock;

use eduzip_core::{ChecklistRecord, CriterionId, ParseResponse, classify};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// Fewest cells a row may have and still be mapped.
const MIN_CELLS: usize = 5;

/// First-cell labels of header rows (compared without whitespace, lowercased).
const HEADER_LABELS: &[&str] = &["연번", "번호", "순번", "no", "no."];

static ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));

/// Extract checklist rows from every table source in a parse response.
pub fn extract_from_response(response: &ParseResponse) -> Vec<ChecklistRecord> {
    response
        .table_sources()
        .into_iter()
        .flat_map(extract_rows)
        .collect()
}

/// Extract checklist rows from one HTML fragment.
pub fn extract_rows(html: &str) -> Vec<ChecklistRecord> {
    let fragment = Html::parse_fragment(html);
    let mut records = Vec::new();

    for row in fragment.select(&ROW) {
        let cells = row_cells(&row);

        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        if is_header_label(&cells[0]) || is_criteria_subheader(&cells) {
            continue;
        }
        if cells.len() < MIN_CELLS {
            debug!(cells = cells.len(), "skipping short table row");
            continue;
        }

        records.push(map_row(&cells));
    }

    records
}

/// Text of the row's own `td`/`th` cells, whitespace-collapsed.
fn row_cells(row: &ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| {
            cell.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn is_header_label(cell: &str) -> bool {
    let compact: String = cell
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    HEADER_LABELS.contains(&compact.as_str())
}

/// Second header line of two-level forms, where a spanning "필수기준" cell
/// sits above one cell per criterion id. Data rows numbered `2`..`4` share
/// their first cell with an id, so every non-blank cell must be an id.
fn is_criteria_subheader(cells: &[String]) -> bool {
    let mut filled = cells.iter().filter(|c| !c.is_empty()).peekable();
    filled.peek().is_some() && filled.all(|c| c.parse::<CriterionId>().is_ok())
}

fn map_row(cells: &[String]) -> ChecklistRecord {
    let mut record = ChecklistRecord {
        sequence_number: cells[0].clone(),
        software_name: cells[1].clone(),
        provider: cells[2].clone(),
        category: cells[3].clone(),
        purpose: cells[4].clone(),
        ..Default::default()
    };
    for (offset, id) in CriterionId::ALL.into_iter().enumerate() {
        if let Some(cell) = cells.get(MIN_CELLS + offset) {
            record.criteria.set(id, classify(cell));
        }
    }
    record
}
