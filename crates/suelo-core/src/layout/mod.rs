pub mod specs;
pub mod tables;

use regex::Regex;
use std::sync::LazyLock;

use crate::extraction::Token;
use crate::labels::fold;

/// Tokens whose vertical midpoints lie within this distance belong to
/// the same row.
pub const ROW_TOLERANCE: f32 = 3.0;

/// Fallback column grid when no header label is found at all: the
/// positions the reports use in practice.
const GRID_ORIGIN: f32 = 100.0;
const GRID_STEP: f32 = 120.0;

/// One reconstructed text row: tokens ordered left-to-right.
#[derive(Debug, Clone)]
pub struct RowLine<'a> {
    /// Vertical anchor of the row (smallest member ymid).
    pub y: f32,
    pub tokens: Vec<&'a Token>,
}

impl<'a> RowLine<'a> {
    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// Cluster tokens inside the vertical window `(y_lo, y_hi]` into rows.
///
/// Tokens are sorted by ymid and grouped greedily: a token joins the
/// current row while its ymid is within ROW_TOLERANCE of the row's
/// anchor, otherwise it starts a new row. Each row is then ordered by x0.
pub fn cluster_rows(tokens: &[Token], y_lo: f32, y_hi: f32) -> Vec<RowLine<'_>> {
    let mut in_window: Vec<&Token> = tokens
        .iter()
        .filter(|t| t.ymid() > y_lo && t.ymid() <= y_hi)
        .collect();
    in_window.sort_by(|a, b| a.ymid().total_cmp(&b.ymid()));

    let mut rows: Vec<RowLine> = Vec::new();
    for token in in_window {
        match rows.last_mut() {
            Some(row) if token.ymid() - row.y <= ROW_TOLERANCE => row.tokens.push(token),
            _ => rows.push(RowLine {
                y: token.ymid(),
                tokens: vec![token],
            }),
        }
    }

    for row in &mut rows {
        row.tokens.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    }
    rows
}

/// Derive one center x-coordinate per declared column.
///
/// Found header-label centers are kept verbatim; missing ones take the
/// evenly spaced position implied by the known centers' min/max. When
/// nothing was found, a fixed evenly spaced grid applies.
pub fn derive_centers(found: &[Option<f32>]) -> Vec<f32> {
    let n = found.len();
    let known: Vec<f32> = found.iter().flatten().copied().collect();

    if known.is_empty() || n < 2 {
        return (0..n)
            .map(|i| {
                found[i].unwrap_or(GRID_ORIGIN + i as f32 * GRID_STEP)
            })
            .collect();
    }

    let xmin = known.iter().copied().fold(f32::INFINITY, f32::min);
    let xmax = known.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let step = (xmax - xmin) / (n - 1) as f32;

    found
        .iter()
        .enumerate()
        .map(|(i, c)| c.unwrap_or(xmin + i as f32 * step))
        .collect()
}

/// Index of the column whose center is closest to `xmid`. Equidistant
/// ties resolve to the earlier-declared column (strict comparison while
/// scanning in declared order).
pub fn nearest_center(xmid: f32, centers: &[f32]) -> usize {
    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, center) in centers.iter().enumerate() {
        let dist = (xmid - center).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Assign every token of a row to the nearest column center.
pub fn bucket_by_center<'a>(tokens: &[&'a Token], centers: &[f32]) -> Vec<Vec<&'a Token>> {
    let mut buckets: Vec<Vec<&Token>> = vec![Vec::new(); centers.len()];
    for &token in tokens {
        buckets[nearest_center(token.xmid(), centers)].push(token);
    }
    buckets
}

// Optional digits, one decimal separator as comma or dot, more digits.
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d*[.,]?\d+$").expect("valid pattern"));

pub fn is_numeric_token(text: &str) -> bool {
    NUMERIC.is_match(text)
}

/// Normalize a numeric token's decimal separator: comma becomes dot.
pub fn normalize_decimal(text: &str) -> String {
    text.replace(',', ".")
}

/// The value of a result bucket: the last numeric-looking token wins.
pub fn last_numeric_value(tokens: &[&Token]) -> Option<String> {
    tokens
        .iter()
        .rev()
        .find(|t| is_numeric_token(&t.text))
        .map(|t| normalize_decimal(&t.text))
}

static ME_100: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bme\s*/?\s*100\b").expect("valid pattern"));

/// Layout noise that must never reach the label normalizer: unit
/// fragments ("Me/100", a stray "g") and not-applicable markers.
pub fn is_noise_token(text: &str) -> bool {
    let folded = fold(text);
    matches!(folded.as_str(), "g" | "n/a" | "na" | "me" | "me/100" | "me 100")
        || ME_100.is_match(&folded)
}
