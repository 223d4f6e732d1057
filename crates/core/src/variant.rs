//! Cell-type registry.
//!
//! Every column declares a `CellVariant`. The variant decides:
//! - the empty value a cleared cell takes
//! - which editor surface opens (inline, popover, or a direct toggle)
//! - how values serialize to clipboard text
//! - how pasted text coerces back into a typed value, or gets rejected
//!
//! ## Paste coercion
//!
//! Coercion is strict for typed variants (number, checkbox, date, select,
//! multi-select, file, url): text that does not fit is *rejected* and the
//! caller skips the cell. Text variants never reject; they tidy up
//! ISO dates and JSON-looking literals into display text instead.

use std::sync::OnceLock;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value::{CellValue, FileDescriptor};

/// Default display format for dates pasted into text cells (`3/5/2024`).
pub const DEFAULT_DATE_DISPLAY_FORMAT: &str = "%-m/%-d/%Y";

const CHECKED_WORDS: &[&str] = &["true", "1", "yes", "checked"];
const UNCHECKED_WORDS: &[&str] = &["false", "0", "no", "unchecked"];

// ============================================================================
// Core Types
// ============================================================================

/// One choice of a select or multi-select column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self { label: label.into(), value: value.into() }
    }

    /// Option whose label and value are the same string.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self { label: value.clone(), value }
    }
}

/// Declared type of a column's cells.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "kebab-case")]
pub enum CellVariant {
    #[default]
    ShortText,
    LongText,
    Number,
    Url,
    Checkbox,
    Select {
        options: Vec<SelectOption>,
    },
    MultiSelect {
        options: Vec<SelectOption>,
    },
    Date,
    File {
        #[serde(default)]
        max_files: Option<usize>,
        /// Per-file limit in bytes
        #[serde(default)]
        max_file_size: Option<u64>,
        /// Accepted types: exact mime (`application/pdf`), wildcard
        /// (`image/*`) or extension (`.csv`). Empty accepts everything.
        #[serde(default)]
        accept: Vec<String>,
    },
}

/// Which editor surface a variant uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Text input inside the cell
    Inline,
    /// Dedicated control in a popover (date picker, option list, dropzone)
    Popover,
    /// No editor: activation flips the value directly
    Toggle,
}

/// Result of coercing pasted text into a cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    Accepted(CellValue),
    Rejected,
}

impl Coercion {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Coercion::Accepted(_))
    }
}

/// Settings that influence coercion but don't belong to a column.
#[derive(Debug, Clone, Copy)]
pub struct CoercionContext<'a> {
    /// strftime pattern used when a text cell receives an ISO date
    pub date_display_format: &'a str,
}

impl Default for CoercionContext<'_> {
    fn default() -> Self {
        Self { date_display_format: DEFAULT_DATE_DISPLAY_FORMAT }
    }
}

/// Why a file was refused by a file column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRejection {
    TooLarge { name: String, limit: u64 },
    TypeNotAccepted { name: String },
    TooMany { limit: usize },
}

impl std::fmt::Display for FileRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileRejection::TooLarge { name, limit } => {
                write!(f, "{} exceeds the {} byte limit", name, limit)
            }
            FileRejection::TypeNotAccepted { name } => write!(f, "{} is not an accepted file type", name),
            FileRejection::TooMany { limit } => write!(f, "at most {} files allowed", limit),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

impl CellVariant {
    /// Kebab-case variant name, as used in column definitions.
    pub fn name(&self) -> &'static str {
        match self {
            CellVariant::ShortText => "short-text",
            CellVariant::LongText => "long-text",
            CellVariant::Number => "number",
            CellVariant::Url => "url",
            CellVariant::Checkbox => "checkbox",
            CellVariant::Select { .. } => "select",
            CellVariant::MultiSelect { .. } => "multi-select",
            CellVariant::Date => "date",
            CellVariant::File { .. } => "file",
        }
    }

    /// The value a cleared (or cut) cell takes.
    pub fn empty_value(&self) -> CellValue {
        match self {
            CellVariant::ShortText
            | CellVariant::LongText
            | CellVariant::Url
            | CellVariant::Select { .. } => CellValue::Text(String::new()),
            CellVariant::Number => CellValue::Number(None),
            CellVariant::Checkbox => CellValue::Boolean(false),
            CellVariant::MultiSelect { .. } => CellValue::List(Vec::new()),
            CellVariant::Date => CellValue::Date(None),
            CellVariant::File { .. } => CellValue::Files(Vec::new()),
        }
    }

    pub fn editor(&self) -> EditorKind {
        match self {
            CellVariant::ShortText | CellVariant::Number | CellVariant::Url => EditorKind::Inline,
            CellVariant::Checkbox => EditorKind::Toggle,
            CellVariant::LongText
            | CellVariant::Select { .. }
            | CellVariant::MultiSelect { .. }
            | CellVariant::Date
            | CellVariant::File { .. } => EditorKind::Popover,
        }
    }

    /// Whether typing a printable character on a focused cell starts an
    /// edit seeded with that character.
    pub fn seeds_typed_char(&self) -> bool {
        matches!(self, CellVariant::ShortText | CellVariant::Number | CellVariant::Url)
    }

    pub fn options(&self) -> &[SelectOption] {
        match self {
            CellVariant::Select { options } | CellVariant::MultiSelect { options } => options,
            _ => &[],
        }
    }

    /// Clipboard text for one cell. Lists and files become JSON arrays,
    /// dates their ISO string, blanks an empty string.
    pub fn serialize(&self, value: &CellValue) -> String {
        match (self, value) {
            // A multi-select column holding a bare string still copies as an array
            (CellVariant::MultiSelect { .. }, CellValue::Text(s)) if !s.is_empty() => {
                serde_json::to_string(&[s]).unwrap_or_default()
            }
            _ => value.to_plain_string(),
        }
    }

    /// Coerce pasted text into this variant. See the module docs.
    pub fn coerce_paste(&self, text: &str, cx: &CoercionContext<'_>) -> Coercion {
        let trimmed = text.trim();
        match self {
            CellVariant::Number => {
                if trimmed.is_empty() {
                    return Coercion::Accepted(CellValue::Number(None));
                }
                match parse_float_prefix(trimmed) {
                    Some(n) => Coercion::Accepted(CellValue::number(n)),
                    None => Coercion::Rejected,
                }
            }
            CellVariant::Checkbox => {
                if trimmed.is_empty() {
                    return Coercion::Accepted(CellValue::Boolean(false));
                }
                match parse_checkbox(trimmed) {
                    Some(b) => Coercion::Accepted(CellValue::Boolean(b)),
                    None => Coercion::Rejected,
                }
            }
            CellVariant::Date => {
                if trimmed.is_empty() {
                    return Coercion::Accepted(CellValue::Date(None));
                }
                match parse_date(trimmed) {
                    Some(date) => Coercion::Accepted(CellValue::Date(Some(iso_date(date)))),
                    None => Coercion::Rejected,
                }
            }
            CellVariant::Select { options } => {
                if trimmed.is_empty() {
                    return Coercion::Accepted(CellValue::Text(String::new()));
                }
                match match_option(options, trimmed) {
                    Some(value) => Coercion::Accepted(CellValue::text(value)),
                    None => Coercion::Rejected,
                }
            }
            CellVariant::MultiSelect { options } => coerce_multi_select(options, trimmed),
            CellVariant::File { .. } => coerce_files(trimmed),
            CellVariant::Url => {
                if trimmed.is_empty() {
                    return Coercion::Accepted(CellValue::Text(String::new()));
                }
                if is_valid_url(trimmed) {
                    Coercion::Accepted(CellValue::text(trimmed))
                } else {
                    Coercion::Rejected
                }
            }
            CellVariant::ShortText | CellVariant::LongText => {
                Coercion::Accepted(CellValue::Text(display_text(text, cx)))
            }
        }
    }

    /// Convert an inline editor's text buffer into a value at commit time.
    /// `None` means the text is not a valid value for this variant.
    pub fn value_from_input(&self, text: &str) -> Option<CellValue> {
        match self {
            CellVariant::ShortText | CellVariant::LongText | CellVariant::Url => {
                Some(CellValue::text(text))
            }
            CellVariant::Number => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Some(CellValue::Number(None));
                }
                trimmed.parse::<f64>().ok().filter(|n| n.is_finite()).map(CellValue::number)
            }
            CellVariant::Date => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Some(CellValue::Date(None));
                }
                parse_date(trimmed).map(|d| CellValue::Date(Some(iso_date(d))))
            }
            CellVariant::Select { options } => {
                if text.trim().is_empty() {
                    return Some(CellValue::Text(String::new()));
                }
                match_option(options, text.trim()).map(CellValue::text)
            }
            CellVariant::Checkbox | CellVariant::MultiSelect { .. } | CellVariant::File { .. } => None,
        }
    }

    /// Check one incoming file against the column's constraints.
    /// `existing` is the number of files already in the cell.
    pub fn accepts_file(
        &self,
        name: &str,
        size: u64,
        mime_type: &str,
        existing: usize,
    ) -> Result<(), FileRejection> {
        let CellVariant::File { max_files, max_file_size, accept } = self else {
            return Err(FileRejection::TypeNotAccepted { name: name.to_string() });
        };
        if let Some(limit) = *max_files {
            if existing >= limit {
                return Err(FileRejection::TooMany { limit });
            }
        }
        if let Some(limit) = *max_file_size {
            if size > limit {
                return Err(FileRejection::TooLarge { name: name.to_string(), limit });
            }
        }
        if !accept.is_empty() && !accept.iter().any(|pattern| accept_matches(pattern, name, mime_type)) {
            return Err(FileRejection::TypeNotAccepted { name: name.to_string() });
        }
        Ok(())
    }
}

// ============================================================================
// Coercion helpers
// ============================================================================

fn float_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid float regex")
    })
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$")
            .expect("valid iso date regex")
    })
}

fn bare_domain_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z]{2,}(?::\d{1,5})?(?:[/?#]\S*)?$")
            .expect("valid domain regex")
    })
}

/// `parseFloat` semantics: the longest numeric prefix wins, so `"5kg"` is 5.
/// Non-finite results are refused.
pub fn parse_float_prefix(text: &str) -> Option<f64> {
    let m = float_prefix_re().find(text.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn parse_checkbox(text: &str) -> Option<bool> {
    let lower = text.trim().to_lowercase();
    if CHECKED_WORDS.contains(&lower.as_str()) {
        Some(true)
    } else if UNCHECKED_WORDS.contains(&lower.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Parse the date formats people actually paste. Datetimes with an offset
/// resolve to their UTC calendar date.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let t = text.trim();
    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in ["%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    None
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date with a user-supplied strftime pattern, falling back to the
/// default pattern when the supplied one is malformed.
pub fn format_date_display(date: NaiveDate, pattern: &str) -> String {
    let valid = !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error));
    let pattern = if valid { pattern } else { DEFAULT_DATE_DISPLAY_FORMAT };
    date.format(pattern).to_string()
}

/// Case-insensitive match against option values, then labels.
/// Returns the option's value.
pub fn match_option<'a>(options: &'a [SelectOption], text: &str) -> Option<&'a str> {
    let needle = text.trim().to_lowercase();
    options
        .iter()
        .find(|o| o.value.to_lowercase() == needle)
        .or_else(|| options.iter().find(|o| o.label.to_lowercase() == needle))
        .map(|o| o.value.as_str())
}

fn coerce_multi_select(options: &[SelectOption], trimmed: &str) -> Coercion {
    if trimmed.is_empty() {
        return Coercion::Accepted(CellValue::List(Vec::new()));
    }
    let raw: Vec<String> = if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(trimmed) {
            Ok(items) => items,
            Err(_) => return Coercion::Rejected,
        }
    } else {
        trimmed.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    };

    let mut values: Vec<String> = Vec::with_capacity(raw.len());
    for item in &raw {
        match match_option(options, item) {
            Some(value) => {
                if !values.iter().any(|v| v == value) {
                    values.push(value.to_string());
                }
            }
            None => return Coercion::Rejected,
        }
    }
    Coercion::Accepted(CellValue::List(values))
}

fn coerce_files(trimmed: &str) -> Coercion {
    if trimmed.is_empty() {
        return Coercion::Accepted(CellValue::Files(Vec::new()));
    }
    match serde_json::from_str::<Vec<FileDescriptor>>(trimmed) {
        Ok(files) if files.iter().all(|f| !f.id.is_empty() && !f.name.is_empty()) => {
            Coercion::Accepted(CellValue::Files(files))
        }
        _ => Coercion::Rejected,
    }
}

/// URL cells take absolute URLs with a host (or `mailto:`/`tel:`), or a bare
/// domain like `example.com/path`. JSON-looking text is never a URL.
pub fn is_valid_url(text: &str) -> bool {
    if text.starts_with('[') || text.starts_with('{') || text.chars().any(char::is_whitespace) {
        return false;
    }
    if let Ok(parsed) = url::Url::parse(text) {
        if parsed.has_host() || matches!(parsed.scheme(), "mailto" | "tel") {
            return true;
        }
    }
    bare_domain_re().is_match(text)
}

/// Text-cell paste: ISO dates become display dates, JSON booleans and
/// arrays become friendly text, everything else is kept verbatim.
fn display_text(text: &str, cx: &CoercionContext<'_>) -> String {
    let trimmed = text.trim();
    if iso_date_re().is_match(trimmed) {
        if let Some(date) = parse_date(trimmed) {
            return format_date_display(date, cx.date_display_format);
        }
    }
    match trimmed {
        "true" => return "Checked".to_string(),
        "false" => return "Unchecked".to_string(),
        _ => {}
    }
    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
            if let Some(joined) = join_json_items(&items) {
                return joined;
            }
        }
    }
    text.to_string()
}

fn join_json_items(items: &[serde_json::Value]) -> Option<String> {
    let parts: Option<Vec<&str>> = items
        .iter()
        .map(|item| match item {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map.get("name").and_then(|n| n.as_str()),
            _ => None,
        })
        .collect();
    parts.map(|p| p.join(", "))
}

fn accept_matches(pattern: &str, name: &str, mime_type: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    if let Some(ext) = pattern.strip_prefix('.') {
        return name.to_lowercase().ends_with(&format!(".{}", ext));
    }
    let mime = mime_type.to_lowercase();
    if let Some(family) = pattern.strip_suffix("/*") {
        return mime.split('/').next() == Some(family);
    }
    mime == pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cx() -> CoercionContext<'static> {
        CoercionContext::default()
    }

    fn status_options() -> Vec<SelectOption> {
        vec![
            SelectOption::new("To do", "todo"),
            SelectOption::new("In progress", "in-progress"),
            SelectOption::new("Done", "done"),
        ]
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(CellVariant::Number.empty_value(), CellValue::Number(None));
        assert_eq!(CellVariant::Checkbox.empty_value(), CellValue::Boolean(false));
        assert_eq!(CellVariant::ShortText.empty_value(), CellValue::text(""));
        assert_eq!(
            CellVariant::MultiSelect { options: vec![] }.empty_value(),
            CellValue::List(vec![])
        );
        assert_eq!(CellVariant::Date.empty_value(), CellValue::Date(None));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(CellVariant::Number.coerce_paste("5", &cx()), Coercion::Accepted(CellValue::number(5.0)));
        assert_eq!(CellVariant::Number.coerce_paste(" 12.5kg", &cx()), Coercion::Accepted(CellValue::number(12.5)));
        assert_eq!(CellVariant::Number.coerce_paste("", &cx()), Coercion::Accepted(CellValue::Number(None)));
        assert_eq!(CellVariant::Number.coerce_paste("weak", &cx()), Coercion::Rejected);
        assert_eq!(CellVariant::Number.coerce_paste("-.5e2", &cx()), Coercion::Accepted(CellValue::number(-50.0)));
    }

    #[test]
    fn test_checkbox_coercion() {
        for word in ["TRUE", "1", "Yes", "checked"] {
            assert_eq!(CellVariant::Checkbox.coerce_paste(word, &cx()), Coercion::Accepted(CellValue::Boolean(true)));
        }
        for word in ["false", "0", "NO", "Unchecked"] {
            assert_eq!(CellVariant::Checkbox.coerce_paste(word, &cx()), Coercion::Accepted(CellValue::Boolean(false)));
        }
        assert_eq!(CellVariant::Checkbox.coerce_paste("", &cx()), Coercion::Accepted(CellValue::Boolean(false)));
        assert_eq!(CellVariant::Checkbox.coerce_paste("weak", &cx()), Coercion::Rejected);
    }

    #[test]
    fn test_date_coercion() {
        let iso = |s: &str| Coercion::Accepted(CellValue::Date(Some(s.to_string())));
        assert_eq!(CellVariant::Date.coerce_paste("2024-03-05", &cx()), iso("2024-03-05"));
        assert_eq!(CellVariant::Date.coerce_paste("2024-03-05T23:30:00-02:00", &cx()), iso("2024-03-06"));
        assert_eq!(CellVariant::Date.coerce_paste("03/05/2024", &cx()), iso("2024-03-05"));
        assert_eq!(CellVariant::Date.coerce_paste("March 5, 2024", &cx()), iso("2024-03-05"));
        assert_eq!(CellVariant::Date.coerce_paste("", &cx()), Coercion::Accepted(CellValue::Date(None)));
        assert_eq!(CellVariant::Date.coerce_paste("2024-02-30", &cx()), Coercion::Rejected);
        assert_eq!(CellVariant::Date.coerce_paste("soon", &cx()), Coercion::Rejected);
    }

    #[test]
    fn test_select_matches_value_or_label() {
        let variant = CellVariant::Select { options: status_options() };
        assert_eq!(variant.coerce_paste("DONE", &cx()), Coercion::Accepted(CellValue::text("done")));
        assert_eq!(variant.coerce_paste("in progress", &cx()), Coercion::Accepted(CellValue::text("in-progress")));
        assert_eq!(variant.coerce_paste("", &cx()), Coercion::Accepted(CellValue::text("")));
        assert_eq!(variant.coerce_paste("blocked", &cx()), Coercion::Rejected);
    }

    #[test]
    fn test_multi_select_coercion() {
        let variant = CellVariant::MultiSelect { options: status_options() };
        assert_eq!(
            variant.coerce_paste(r#"["todo","Done"]"#, &cx()),
            Coercion::Accepted(CellValue::list(["todo", "done"]))
        );
        assert_eq!(
            variant.coerce_paste("to do, done, todo", &cx()),
            Coercion::Accepted(CellValue::list(["todo", "done"]))
        );
        assert_eq!(variant.coerce_paste("", &cx()), Coercion::Accepted(CellValue::List(vec![])));
        assert_eq!(variant.coerce_paste(r#"["todo","blocked"]"#, &cx()), Coercion::Rejected);
        assert_eq!(variant.coerce_paste("[broken", &cx()), Coercion::Rejected);
    }

    #[test]
    fn test_file_coercion() {
        let variant = CellVariant::File { max_files: None, max_file_size: None, accept: vec![] };
        let json = r#"[{"id":"f1","name":"a.png","size":10,"type":"image/png","url":"https://cdn/a.png"}]"#;
        match variant.coerce_paste(json, &cx()) {
            Coercion::Accepted(CellValue::Files(files)) => {
                assert_eq!(files.len(), 1);
                assert_eq!(files[0].url.as_deref(), Some("https://cdn/a.png"));
            }
            other => panic!("expected files, got {:?}", other),
        }
        assert_eq!(variant.coerce_paste(r#"[{"id":"f1"}]"#, &cx()), Coercion::Rejected);
        assert_eq!(variant.coerce_paste("a.png", &cx()), Coercion::Rejected);
        assert_eq!(variant.coerce_paste("", &cx()), Coercion::Accepted(CellValue::Files(vec![])));
    }

    #[test]
    fn test_url_coercion() {
        assert!(CellVariant::Url.coerce_paste("https://example.com/a?b=1", &cx()).is_accepted());
        assert!(CellVariant::Url.coerce_paste("example.com", &cx()).is_accepted());
        assert!(CellVariant::Url.coerce_paste("mailto:hi@example.com", &cx()).is_accepted());
        assert!(CellVariant::Url.coerce_paste("", &cx()).is_accepted());
        assert_eq!(CellVariant::Url.coerce_paste("[\"x\"]", &cx()), Coercion::Rejected);
        assert_eq!(CellVariant::Url.coerce_paste("{}", &cx()), Coercion::Rejected);
        assert_eq!(CellVariant::Url.coerce_paste("not a url", &cx()), Coercion::Rejected);
        assert_eq!(CellVariant::Url.coerce_paste("localhost", &cx()), Coercion::Rejected);
    }

    #[test]
    fn test_text_display_coercion() {
        let text = |s: &str| CellVariant::ShortText.coerce_paste(s, &cx());
        assert_eq!(text("2024-03-05"), Coercion::Accepted(CellValue::text("3/5/2024")));
        assert_eq!(text("true"), Coercion::Accepted(CellValue::text("Checked")));
        assert_eq!(text("false"), Coercion::Accepted(CellValue::text("Unchecked")));
        assert_eq!(text(r#"["a","b"]"#), Coercion::Accepted(CellValue::text("a, b")));
        assert_eq!(
            text(r#"[{"id":"1","name":"x.pdf","size":1,"type":"application/pdf"}]"#),
            Coercion::Accepted(CellValue::text("x.pdf"))
        );
        assert_eq!(text("hello world"), Coercion::Accepted(CellValue::text("hello world")));
        assert_eq!(text(""), Coercion::Accepted(CellValue::text("")));
    }

    #[test]
    fn test_custom_date_display_format() {
        let cx = CoercionContext { date_display_format: "%d.%m.%Y" };
        assert_eq!(
            CellVariant::LongText.coerce_paste("2024-03-05", &cx),
            Coercion::Accepted(CellValue::text("05.03.2024"))
        );
        let broken = CoercionContext { date_display_format: "%Q" };
        assert_eq!(
            CellVariant::LongText.coerce_paste("2024-03-05", &broken),
            Coercion::Accepted(CellValue::text("3/5/2024"))
        );
    }

    #[test]
    fn test_serialize() {
        let multi = CellVariant::MultiSelect { options: status_options() };
        assert_eq!(multi.serialize(&CellValue::list(["todo"])), r#"["todo"]"#);
        assert_eq!(multi.serialize(&CellValue::text("done")), r#"["done"]"#);
        assert_eq!(CellVariant::Number.serialize(&CellValue::Number(None)), "");
        assert_eq!(CellVariant::Number.serialize(&CellValue::Empty), "");
    }

    #[test]
    fn test_value_from_input() {
        assert_eq!(CellVariant::Number.value_from_input(" 42 "), Some(CellValue::number(42.0)));
        assert_eq!(CellVariant::Number.value_from_input(""), Some(CellValue::Number(None)));
        assert_eq!(CellVariant::Number.value_from_input("4x"), None);
        assert_eq!(CellVariant::ShortText.value_from_input("a"), Some(CellValue::text("a")));
        assert_eq!(CellVariant::Checkbox.value_from_input("true"), None);
    }

    #[test]
    fn test_file_constraints() {
        let variant = CellVariant::File {
            max_files: Some(2),
            max_file_size: Some(1_000),
            accept: vec!["image/*".into(), ".pdf".into()],
        };
        assert!(variant.accepts_file("a.png", 10, "image/png", 0).is_ok());
        assert!(variant.accepts_file("b.PDF", 10, "application/octet-stream", 1).is_ok());
        assert_eq!(
            variant.accepts_file("c.csv", 10, "text/csv", 0),
            Err(FileRejection::TypeNotAccepted { name: "c.csv".into() })
        );
        assert_eq!(
            variant.accepts_file("big.png", 5_000, "image/png", 0),
            Err(FileRejection::TooLarge { name: "big.png".into(), limit: 1_000 })
        );
        assert_eq!(variant.accepts_file("a.png", 10, "image/png", 2), Err(FileRejection::TooMany { limit: 2 }));
    }

    #[test]
    fn test_editor_kinds() {
        assert_eq!(CellVariant::ShortText.editor(), EditorKind::Inline);
        assert_eq!(CellVariant::Checkbox.editor(), EditorKind::Toggle);
        assert_eq!(CellVariant::Date.editor(), EditorKind::Popover);
        assert!(CellVariant::Url.seeds_typed_char());
        assert!(!CellVariant::LongText.seeds_typed_char());
    }

    #[test]
    fn test_variant_serde_tag() {
        let variant: CellVariant =
            serde_json::from_str(r#"{"variant":"select","options":[{"label":"A","value":"a"}]}"#).unwrap();
        assert_eq!(variant.name(), "select");
        assert_eq!(variant.options().len(), 1);
    }
}
