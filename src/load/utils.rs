use once_cell::sync::Lazy;
use regex::Regex;

static UNNAMED_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Unnamed").expect("unnamed-header regex should compile"));

static YEAR_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}$").expect("year-header regex should compile"));

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Empty headers and spreadsheet-generated `Unnamed: N` headers mark flag/annotation columns.
pub fn is_unnamed(header: &str) -> bool {
    let h = clean_str(header);
    h.is_empty() || UNNAMED_HEADER.is_match(&h)
}

/// Returns the year when `header` is a bare four-digit number.
pub fn header_year(header: &str) -> Option<i32> {
    let h = clean_str(header);
    if YEAR_HEADER.is_match(&h) {
        h.parse().ok()
    } else {
        None
    }
}

/// Coerce a cell to a number; anything unparseable or non-finite is missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    clean_str(raw).parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render a float cell the way it reads in the sheet: `2010.0` → `"2010"`.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
