use crate::extraction::Token;
use crate::labels::{fold, normalize_label};
use crate::layout::{
    bucket_by_center, cluster_rows, derive_centers, is_noise_token, is_numeric_token,
    last_numeric_value, normalize_decimal, RowLine,
};
use crate::model::{NOT_AVAILABLE, NOT_FOUND};

/// A named column with the header label variants that identify it. An
/// empty label list means the column is never found directly and always
/// takes an interpolated center.
pub struct ColumnSpec {
    pub key: &'static str,
    pub labels: &'static [&'static str],
}

/// How a table section is located on the page.
pub enum Locator {
    /// Any token whose uppercased text contains the keyword.
    TitleContains(&'static str),
    /// The column header labels themselves anchor the section.
    HeaderLabels,
}

/// One target row of a parameter table: the record key and the
/// parameter word that identifies its row.
pub struct ParamTarget {
    pub key: &'static str,
    pub name: &'static str,
}

pub enum LayoutVariant {
    /// One row starts with "Resultado" and carries the values, the next
    /// row starts with "Interpretación" and carries the classifications.
    /// Columns are the table's row keys.
    AttributeHeader,
    /// Header row declares Parámetro/Unidad/Resultado/Interpretación;
    /// body rows are matched against target parameter names until a
    /// terminating section title appears.
    ParameterTable {
        targets: &'static [ParamTarget],
        terminator: &'static str,
        default_unit: &'static str,
    },
    /// Header row declares the ratio names as columns; the first
    /// numeric row carries values, the next textual row interpretations.
    NamedRatio,
}

/// Declarative description of one tabular section.
pub struct TableSpec {
    pub name: &'static str,
    pub locator: Locator,
    pub columns: &'static [ColumnSpec],
    pub variant: LayoutVariant,
}

impl TableSpec {
    /// Target row keys, in declared order.
    pub fn row_keys(&self) -> Vec<&'static str> {
        match &self.variant {
            LayoutVariant::ParameterTable { targets, .. } => {
                targets.iter().map(|t| t.key).collect()
            }
            _ => self.columns.iter().map(|c| c.key).collect(),
        }
    }
}

/// One extracted table row: value, optional unit, raw and normalized
/// interpretation, keyed by the table's row key.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub key: &'static str,
    pub value: String,
    pub unit: Option<String>,
    pub interpretation: String,
}

impl TableRow {
    fn missing(key: &'static str, with_unit: bool) -> Self {
        TableRow {
            key,
            value: NOT_FOUND.to_string(),
            unit: with_unit.then(|| NOT_FOUND.to_string()),
            interpretation: NOT_AVAILABLE.to_string(),
        }
    }
}

// Vertical search windows, in page units. Taken from the report
// geometry: header rows sit close under the section title, table bodies
// never exceed ~180 units.
const HEADER_WINDOW: f32 = 60.0;
const RATIO_HEADER_WINDOW: f32 = 120.0;
const BODY_WINDOW: f32 = 180.0;
const VALUE_WINDOW: f32 = 80.0;
const INTERP_WINDOW: f32 = 40.0;
const RATIO_INTERP_WINDOW: f32 = 60.0;
const EXTENDED_INTERP_WINDOW: f32 = 30.0;

/// Extract one table from a page's tokens.
///
/// Always returns one TableRow per target key, in declared order;
/// rows that could not be recovered carry the default sentinels.
pub fn extract_table(tokens: &[Token], spec: &TableSpec) -> Vec<TableRow> {
    let with_unit = matches!(spec.variant, LayoutVariant::ParameterTable { .. });
    let defaults: Vec<TableRow> = spec
        .row_keys()
        .into_iter()
        .map(|key| TableRow::missing(key, with_unit))
        .collect();

    let extracted = match &spec.variant {
        LayoutVariant::AttributeHeader => extract_attribute_header(tokens, spec),
        LayoutVariant::ParameterTable {
            targets,
            terminator,
            default_unit,
        } => extract_parameter_table(tokens, spec, targets, terminator, default_unit),
        LayoutVariant::NamedRatio => extract_named_ratio(tokens, spec),
    };

    match extracted {
        Some(rows) => rows,
        None => {
            tracing::debug!(table = spec.name, "table section not found on page");
            defaults
        }
    }
}

/// Minimum ymid among tokens matching the section locator.
fn locate_anchor(tokens: &[Token], spec: &TableSpec) -> Option<f32> {
    match spec.locator {
        Locator::TitleContains(keyword) => tokens
            .iter()
            .filter(|t| t.text.to_uppercase().contains(keyword))
            .map(|t| t.ymid())
            .min_by(f32::total_cmp),
        Locator::HeaderLabels => tokens
            .iter()
            .filter(|t| {
                spec.columns
                    .iter()
                    .any(|c| c.labels.contains(&t.text.as_str()))
            })
            .map(|t| t.ymid())
            .min_by(f32::total_cmp),
    }
}

/// Column centers for a header row: found label tokens give their xmid
/// (each token claimed once, so a repeated label can't serve two
/// columns), missing columns are interpolated.
fn header_centers(row: &RowLine<'_>, columns: &[ColumnSpec]) -> Vec<f32> {
    let mut claimed = vec![false; row.tokens.len()];
    let found: Vec<Option<f32>> = columns
        .iter()
        .map(|col| {
            row.tokens.iter().enumerate().find_map(|(i, t)| {
                if !claimed[i] && col.labels.contains(&t.text.as_str()) {
                    claimed[i] = true;
                    Some(t.xmid())
                } else {
                    None
                }
            })
        })
        .collect();
    derive_centers(&found)
}

fn label_hits(row: &RowLine<'_>, columns: &[ColumnSpec]) -> usize {
    columns
        .iter()
        .filter(|col| {
            row.tokens
                .iter()
                .any(|t| col.labels.contains(&t.text.as_str()))
        })
        .count()
}

/// Re-join split classification phrases: a "muy" or "mod." token is
/// concatenated with the token that follows it.
fn stitch_prefixes(tokens: &[&Token]) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let folded = fold(&tokens[i].text);
        if (folded == "muy" || folded == "mod." || folded == "mod") && i + 1 < tokens.len() {
            let (a, b) = (tokens[i], tokens[i + 1]);
            out.push(Token {
                text: format!("{} {}", a.text, b.text),
                x0: a.x0,
                x1: b.x1,
                top: a.top.min(b.top),
                bottom: a.bottom.max(b.bottom),
            });
            i += 2;
        } else {
            out.push(tokens[i].clone());
            i += 1;
        }
    }
    out
}

fn is_na(text: &str) -> bool {
    fold(text) == "n/a"
}

fn join_texts(tokens: &[&Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Attribute-header layout (fertility, chemical parameters)
// ---------------------------------------------------------------------------

fn extract_attribute_header(tokens: &[Token], spec: &TableSpec) -> Option<Vec<TableRow>> {
    locate_anchor(tokens, spec)?;

    // Header row: the row containing the most expected column labels;
    // on a tie the topmost row wins.
    let all_rows = cluster_rows(tokens, f32::NEG_INFINITY, f32::INFINITY);
    let mut header: Option<&RowLine> = None;
    let mut best_hits = 0;
    for row in &all_rows {
        let hits = label_hits(row, spec.columns);
        if hits > best_hits {
            header = Some(row);
            best_hits = hits;
        }
    }
    let header = header?;
    let centers = header_centers(header, spec.columns);
    let y_header = header.y;

    // Value row: first row below the header led by "Resultado".
    let value_row = cluster_rows(tokens, y_header, y_header + VALUE_WINDOW)
        .into_iter()
        .find(|row| {
            row.tokens
                .first()
                .is_some_and(|t| fold(&t.text).starts_with("resultado"))
        })?;

    let candidates: Vec<&Token> = value_row
        .tokens
        .iter()
        .copied()
        .filter(|t| is_numeric_token(&t.text) || is_na(&t.text))
        .collect();
    let value_buckets = bucket_by_center(&candidates, &centers);

    let mut rows: Vec<TableRow> = spec
        .columns
        .iter()
        .zip(&value_buckets)
        .map(|(col, bucket)| {
            let value = match bucket.last() {
                Some(t) if is_na(&t.text) => "N/A".to_string(),
                Some(t) => normalize_decimal(&t.text),
                None => NOT_FOUND.to_string(),
            };
            TableRow {
                key: col.key,
                value,
                unit: None,
                interpretation: NOT_AVAILABLE.to_string(),
            }
        })
        .collect();

    // Interpretation row: first row below the values led by "Interpretación".
    let interp_row = cluster_rows(tokens, value_row.y, value_row.y + INTERP_WINDOW)
        .into_iter()
        .find(|row| {
            row.tokens
                .first()
                .is_some_and(|t| fold(&t.text).starts_with("interpretacion"))
        });

    if let Some(interp_row) = interp_row {
        let tail: Vec<&Token> = interp_row
            .tokens
            .iter()
            .copied()
            .filter(|t| !fold(&t.text).starts_with("interpretacion"))
            .collect();
        let stitched = stitch_prefixes(&tail);
        let usable: Vec<&Token> = stitched
            .iter()
            .filter(|t| !is_numeric_token(&t.text) && !is_noise_token(&t.text))
            .collect();
        let interp_buckets = bucket_by_center(&usable, &centers);
        for (row, bucket) in rows.iter_mut().zip(&interp_buckets) {
            if !bucket.is_empty() {
                row.interpretation = normalize_label(&join_texts(bucket));
            }
        }
    }

    Some(rows)
}

// ---------------------------------------------------------------------------
// Parameter-table layout (micronutrients)
// ---------------------------------------------------------------------------

fn extract_parameter_table(
    tokens: &[Token],
    spec: &TableSpec,
    targets: &[ParamTarget],
    terminator: &str,
    default_unit: &str,
) -> Option<Vec<TableRow>> {
    let y_anchor = locate_anchor(tokens, spec)?;

    // Header row must declare all four named columns.
    let header = cluster_rows(tokens, y_anchor, y_anchor + HEADER_WINDOW)
        .into_iter()
        .find(|row| label_hits(row, spec.columns) == spec.columns.len())?;
    let centers = header_centers(&header, spec.columns);
    let (c_result, c_interp) = (centers[2], centers[3]);

    // Body rows, until the next section title shows up.
    let mut body: Vec<RowLine> = Vec::new();
    for row in cluster_rows(tokens, header.y, header.y + BODY_WINDOW) {
        if row
            .tokens
            .iter()
            .any(|t| t.text.to_uppercase().contains(terminator))
        {
            break;
        }
        body.push(row);
    }

    let mut rows: Vec<TableRow> = targets
        .iter()
        .map(|t| TableRow::missing(t.key, true))
        .collect();
    let mut found = vec![false; targets.len()];

    for row in &body {
        let buckets = bucket_by_center(&row.tokens, &centers);
        let param_text = join_texts(&buckets[0]);

        // First match per target wins; later duplicate rows are ignored.
        let Some(idx) = targets.iter().enumerate().position(|(i, t)| {
            !found[i] && param_text.to_lowercase().contains(&t.name.to_lowercase())
        }) else {
            continue;
        };
        found[idx] = true;
        let target = &targets[idx];

        let value = last_numeric_value(&buckets[2]).unwrap_or_else(|| NOT_FOUND.to_string());

        let unit_tokens: Vec<&Token> = buckets[1]
            .iter()
            .copied()
            .filter(|t| !is_numeric_token(&t.text))
            .collect();
        let unit = match join_texts(&unit_tokens) {
            s if s.is_empty() => default_unit.to_string(),
            s => s,
        };

        let raw_interp = interpretation_fallback(
            tokens,
            row,
            &buckets,
            target.name,
            (c_result + c_interp) / 2.0,
        );
        rows[idx] = TableRow {
            key: target.key,
            value,
            unit: Some(unit),
            interpretation: normalize_label(&raw_interp),
        };
    }

    Some(rows)
}

/// Three-tier fallback for the interpretation text of a parameter row.
/// Each tier is tried in order until one yields text; noise tokens are
/// dropped before concatenation in every tier.
fn interpretation_fallback(
    all_tokens: &[Token],
    row: &RowLine<'_>,
    buckets: &[Vec<&Token>],
    param_name: &str,
    x_split: f32,
) -> String {
    let usable = |t: &Token| !is_numeric_token(&t.text) && !is_noise_token(&t.text);

    // Tier a: the interpretation bucket itself.
    let direct: Vec<&Token> = buckets[3].iter().copied().filter(|t| usable(t)).collect();
    let text = join_texts(&direct);
    if !text.is_empty() {
        return text;
    }

    // Tier b: anything else in the row that is not the parameter name,
    // the unit, or a number.
    let residual: Vec<&Token> = row
        .tokens
        .iter()
        .copied()
        .filter(|t| {
            usable(t)
                && !buckets[1].iter().any(|u| std::ptr::eq(*u, *t))
                && !t.text.to_lowercase().contains(&param_name.to_lowercase())
        })
        .collect();
    let text = join_texts(&residual);
    if !text.is_empty() {
        return text;
    }

    // Tier c: extended spatial search around the row, right of the
    // midpoint between the result and interpretation centers.
    let mut nearby: Vec<&Token> = all_tokens
        .iter()
        .filter(|t| {
            (t.ymid() - row.y).abs() <= EXTENDED_INTERP_WINDOW
                && t.xmid() >= x_split - 10.0
                && usable(t)
        })
        .collect();
    nearby.sort_by(|a, b| a.x0.total_cmp(&b.x0));
    join_texts(&nearby)
}

// ---------------------------------------------------------------------------
// Named-ratio layout (cation relations)
// ---------------------------------------------------------------------------

fn extract_named_ratio(tokens: &[Token], spec: &TableSpec) -> Option<Vec<TableRow>> {
    let y_anchor = locate_anchor(tokens, spec)?;

    // Header row: the first row naming at least 3 of the 5 ratios.
    let header = cluster_rows(tokens, y_anchor, y_anchor + RATIO_HEADER_WINDOW)
        .into_iter()
        .find(|row| label_hits(row, spec.columns) >= 3)?;
    let centers = header_centers(&header, spec.columns);

    // Value row: the first subsequent row containing a numeric token.
    let value_row = cluster_rows(tokens, header.y, header.y + VALUE_WINDOW)
        .into_iter()
        .find(|row| row.tokens.iter().any(|t| is_numeric_token(&t.text)))?;

    let numeric: Vec<&Token> = value_row
        .tokens
        .iter()
        .copied()
        .filter(|t| is_numeric_token(&t.text))
        .collect();
    let value_buckets = bucket_by_center(&numeric, &centers);

    let mut rows: Vec<TableRow> = spec
        .columns
        .iter()
        .zip(&value_buckets)
        .map(|(col, bucket)| TableRow {
            key: col.key,
            value: bucket
                .last()
                .map(|t| normalize_decimal(&t.text))
                .unwrap_or_else(|| NOT_FOUND.to_string()),
            unit: None,
            interpretation: NOT_AVAILABLE.to_string(),
        })
        .collect();

    // Interpretation row: the first row after the values with a token
    // not led by a digit.
    let interp_row = cluster_rows(tokens, value_row.y, value_row.y + RATIO_INTERP_WINDOW)
        .into_iter()
        .find(|row| {
            row.tokens
                .iter()
                .any(|t| !t.text.starts_with(|c: char| c.is_ascii_digit()))
        });

    if let Some(interp_row) = interp_row {
        let usable: Vec<&Token> = interp_row
            .tokens
            .iter()
            .copied()
            .filter(|t| !is_numeric_token(&t.text) && !is_noise_token(&t.text))
            .collect();
        let interp_buckets = bucket_by_center(&usable, &centers);
        for (row, bucket) in rows.iter_mut().zip(&interp_buckets) {
            if !bucket.is_empty() {
                row.interpretation = normalize_label(&join_texts(bucket));
            }
        }
    }

    Some(rows)
}
