//! Client-side filtering and pagination of list rows.

use serde_json::Value;
use utils::tokenize::Record;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub filter: String,
    /// Zero-based page index.
    pub page: usize,
    pub page_size: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            filter: String::new(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<'a> {
    pub rows: Vec<&'a Record>,
    /// Clamped page index actually shown.
    pub page: usize,
    pub page_count: usize,
    /// Rows matching the filter, across all pages.
    pub total: usize,
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_lowercase()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Case-insensitive substring match over `columns`. An empty needle matches.
pub fn matches_filter(row: &Record, columns: &[&str], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    columns
        .iter()
        .filter_map(|field| row.get(*field).and_then(cell_text))
        .any(|text| text.contains(&needle))
}

pub fn render<'a>(rows: &'a [Record], columns: &[&str], state: &TableState) -> TablePage<'a> {
    let page_size = if state.page_size == 0 {
        DEFAULT_PAGE_SIZE
    } else {
        state.page_size
    };
    let matching: Vec<&Record> = rows
        .iter()
        .filter(|row| matches_filter(row, columns, &state.filter))
        .collect();
    let total = matching.len();
    let page_count = total.div_ceil(page_size).max(1);
    let page = state.page.min(page_count - 1);

    TablePage {
        rows: matching
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .collect(),
        page,
        page_count,
        total,
    }
}
