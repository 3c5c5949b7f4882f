use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::NOT_AVAILABLE;

/// Canonical classification labels, ordered longest first so a compound
/// label is never shadowed by a shorter substring ("moderadamente alto"
/// must win over "alto").
const CANONICAL_LABELS: [&str; 7] = [
    "moderadamente alto",
    "moderadamente bajo",
    "muy alto",
    "muy bajo",
    "alto",
    "medio",
    "bajo",
];

static LABEL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    CANONICAL_LABELS
        .iter()
        .map(|label| {
            let pattern = Regex::new(&format!(r"\b{}\b", label)).expect("valid label pattern");
            (*label, pattern)
        })
        .collect()
});

// Split-word artifacts the layout produces inside "bajo", plus the
// abbreviated "mod." prefix used for the moderate labels.
static SPLIT_BAJO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bba\s*j\s*o\b").expect("valid pattern"));
static MOD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bmod\.?\s+").expect("valid pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid pattern"));

/// Strip diacritics, lowercase, and collapse whitespace.
pub(crate) fn fold(raw: &str) -> String {
    let stripped: String = raw
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    WHITESPACE.replace_all(stripped.trim(), " ").into_owned()
}

/// Canonicalize a free-text classification phrase into the fixed ordinal
/// vocabulary, title-cased ("muy  Ba jo" -> "Muy Bajo").
///
/// Returns `No disponible` when no canonical label is contained in the
/// input. Idempotent: normalizing an already-canonical label returns it
/// unchanged.
pub fn normalize_label(raw: &str) -> String {
    let mut text = fold(raw);
    if text.is_empty() {
        return NOT_AVAILABLE.to_string();
    }

    text = SPLIT_BAJO.replace_all(&text, "bajo").into_owned();
    text = MOD_PREFIX.replace_all(&text, "moderadamente ").into_owned();

    for (label, pattern) in LABEL_PATTERNS.iter() {
        if pattern.is_match(&text) {
            return title_case(label);
        }
    }

    NOT_AVAILABLE.to_string()
}

fn title_case(label: &str) -> String {
    label
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
