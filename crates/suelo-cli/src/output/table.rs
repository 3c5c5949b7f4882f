use suelo_core::model::{NOT_AVAILABLE, NOT_FOUND};
use suelo_core::Record;

/// Plain-text rendering of extracted records: one block per record,
/// defaulted keys summarized instead of listed.
pub fn format_records(records: &[Record]) -> String {
    let mut out = String::new();
    let multi = records.len() > 1;

    for (i, record) in records.iter().enumerate() {
        if multi {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("--- Record {} ---\n", i + 1));
        }

        if let Some(message) = record.get("error") {
            out.push_str(&format!("Error: {message}\n"));
            continue;
        }

        let found: Vec<(&str, &str)> = record
            .iter()
            .filter(|(_, v)| *v != NOT_FOUND && *v != NOT_AVAILABLE)
            .collect();
        let defaulted = record.len() - found.len();

        let width = found.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &found {
            out.push_str(&format!("  {key:<width$}  {value}\n"));
        }
        if defaulted > 0 {
            out.push_str(&format!("  ({defaulted} field(s) without data)\n"));
        }
    }

    out
}
