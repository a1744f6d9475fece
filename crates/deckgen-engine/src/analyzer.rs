//! Deterministic post-generation analysis of model output.
//!
//! Pure functions over the generated HTML string. Everything here is
//! best-effort pattern matching, not an HTML parser: the structural
//! metrics are informational, so a malformed document degrades to
//! zeroed/empty metrics instead of failing the request.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Average characters per word used to derive a word target from a
/// character budget. Part of the contract: it determines the pass/fail
/// tolerance checks downstream.
pub const AVG_CHARS_PER_WORD: f64 = 5.5;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)").expect("valid regex"));
static TABLE_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("valid regex"));
static HEADER_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<th[^>]*>").expect("valid regex"));
static DATA_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<td[^>]*>").expect("valid regex"));
static NUMERIC_CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="[^"]*numeric[^"]*""#).expect("valid regex"));
static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"class="([^"]+)""#).expect("valid regex"));

/// Estimate a word-count target from a character budget, truncating
/// toward zero (`300 -> 54`).
pub fn estimate_target_words(max_characters: u32) -> u32 {
    (f64::from(max_characters) / AVG_CHARS_PER_WORD) as u32
}

/// Count words in HTML, excluding markup. Tags are treated as whitespace,
/// so a tag boundary never fuses two adjacent words into one.
pub fn count_words(html: &str) -> usize {
    TAG.replace_all(html, " ").split_whitespace().count()
}

/// Deviation of an actual word count from its target.
#[derive(Clone, Copy, Debug)]
pub struct WordCountVariance {
    pub percent: f64,
    pub within_tolerance: bool,
}

/// Percent deviation and tolerance check. `tolerance` is a fraction
/// (0.10 = ±10%). Callers must pass a positive target; zero is outside
/// the contract.
pub fn word_count_variance(actual: usize, target: u32, tolerance: f64) -> WordCountVariance {
    debug_assert!(target > 0, "word count target must be positive");
    let percent = (actual as f64 - f64::from(target)) / f64::from(target) * 100.0;
    WordCountVariance {
        percent,
        within_tolerance: percent.abs() <= tolerance * 100.0,
    }
}

/// Unique tag names present, sorted.
pub fn extract_tags(html: &str) -> Vec<String> {
    let tags: BTreeSet<String> = TAG_NAME
        .captures_iter(html)
        .map(|cap| cap[1].to_ascii_lowercase())
        .collect();
    tags.into_iter().collect()
}

/// Structural statistics for a generated HTML table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    pub rows: usize,
    /// Measured from the first row only (max of header and data cells),
    /// not the widest row. A deliberate simplification.
    pub columns: usize,
    pub data_points: usize,
    pub has_header: bool,
    pub numeric_column_count: usize,
    pub css_classes: Vec<String>,
}

/// Analyze an HTML table with best-effort pattern matching. Input without
/// any recognizable table structure yields zeroed stats.
pub fn analyze_table(html: &str) -> TableStats {
    let mut stats = TableStats::default();

    let mut first_row_body: Option<&str> = None;
    for cap in TABLE_ROW.captures_iter(html) {
        stats.rows += 1;
        if first_row_body.is_none() {
            first_row_body = cap.get(1).map(|m| m.as_str());
        }
    }

    if let Some(first_row) = first_row_body {
        let th = HEADER_CELL.find_iter(first_row).count();
        let td = DATA_CELL.find_iter(first_row).count();
        stats.columns = th.max(td);
    }

    stats.data_points = stats.rows * stats.columns;
    stats.has_header = html.contains("<thead");

    let numeric_attrs: BTreeSet<&str> = NUMERIC_CLASS_ATTR
        .find_iter(html)
        .map(|m| m.as_str())
        .collect();
    stats.numeric_column_count = numeric_attrs.len();

    let classes: BTreeSet<String> = CLASS_ATTR
        .captures_iter(html)
        .flat_map(|cap| {
            cap[1]
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();
    stats.css_classes = classes.into_iter().collect();

    stats
}

/// Strip one leading/trailing markdown code fence from model output, if
/// present, and trim surrounding whitespace. Best-effort normalization;
/// malformed markup is passed through untouched.
pub fn clean_model_output(raw: &str) -> String {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix("```html") {
        content = rest;
    }
    if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }
    content.trim().to_string()
}
