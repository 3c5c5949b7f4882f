use regex::Regex;
use std::sync::LazyLock;

use crate::extraction::PageContent;
use crate::fields::extract_fields;
use crate::layout::specs::ALL_TABLES;
use crate::layout::tables::extract_table;
use crate::model::{Record, NOT_ANALYZED};

// A page is worth processing when any of these section markers shows up
// in its plain text.
static RELEVANCE_INDICATORS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)DATOS\s+Y\s+CONDICIONES",
        r"(?i)(MICRONUTRIENTES|Hierro\s*\(Fe\))",
        r"(?i)Nombre del productor",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid indicator pattern"))
    .collect()
});

/// Whether a page looks like a result page of a soil report.
pub fn is_relevant_page(text: &str) -> bool {
    RELEVANCE_INDICATORS.iter().any(|p| p.is_match(text))
}

/// Run the full per-page pipeline: scalar fields over the text, the four
/// tables over the positional tokens, assembled onto a defaulted record.
///
/// Returns `None` for a page whose record carries nothing beyond the
/// sentinel defaults.
pub fn extract_page_record(page: &PageContent) -> Option<Record> {
    let mut record = Record::with_defaults();

    for (key, value) in extract_fields(&page.text) {
        record.set(key, value);
    }

    for spec in ALL_TABLES {
        for row in extract_table(&page.tokens, spec) {
            let value = if row.value == "N/A" {
                NOT_ANALYZED.to_string()
            } else {
                row.value
            };
            record.set(row.key, value);
            if let Some(unit) = row.unit {
                record.set(&format!("unidad_{}", row.key), unit);
            }
            record.set(&format!("interp_{}", row.key), row.interpretation);
        }
    }

    if record.is_useful() {
        Some(record)
    } else {
        tracing::debug!(page = page.page_number, "page produced no useful data");
        None
    }
}
