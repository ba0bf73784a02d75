use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use calamine::{open_workbook_auto, Data, Reader};
use inspect_core::RawRecord;
use inspect_logging::{inspect_debug, inspect_info};
use regex::Regex;
use thiserror::Error;

use crate::decode::{decode_text, DecodeError};

/// Number of non-empty cells sampled per column when looking for URLs.
pub const URL_SAMPLE_SIZE: usize = 10;

const OUTCOME_COLUMNS: &[&str] = &["status", "outcome"];
const VERDICT_COLUMN: &str = "verdict";
const LAST_CRAWL_COLUMN: &str = "last_crawl_time";
const TEXT_COLUMN: &str = "url";

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://").expect("url pattern compiles"));

#[derive(Debug, Error)]
pub enum InputError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to read spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("no URL column detected")]
    NoUrlColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Csv,
    Text,
    Spreadsheet,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self, InputError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(InputKind::Csv),
            "txt" => Ok(InputKind::Text),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(InputKind::Spreadsheet),
            _ => Err(InputError::UnsupportedFileType(path.display().to_string())),
        }
    }
}

/// Rows of an input file with named columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Records read from an input file, plus what was detected about its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedInput {
    pub records: Vec<RawRecord>,
    pub url_column: String,
    /// The file carries results of an earlier run.
    pub has_outcome_column: bool,
}

impl Table {
    /// Builds a table whose first row is the header, unless that row already
    /// contains a URL, in which case every row is data.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let header_is_data = rows[0].iter().any(|value| is_url(value));
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let columns = if header_is_data {
            (1..=width).map(|i| format!("column_{i}")).collect()
        } else {
            let header = rows.remove(0);
            (0..width)
                .map(|i| {
                    header
                        .get(i)
                        .map(|name| name.trim().to_string())
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| format!("column_{}", i + 1))
                })
                .collect()
        };
        Self { columns, rows }
    }

    /// Case-insensitive, whitespace-trimmed column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.columns
            .iter()
            .position(|column| column.trim().eq_ignore_ascii_case(wanted))
    }

    /// First column with a URL among its first non-empty cells.
    pub fn detect_url_column(&self) -> Option<usize> {
        (0..self.columns.len()).find(|&index| {
            self.rows
                .iter()
                .map(|row| cell(row, index))
                .filter(|value| !value.is_empty())
                .take(URL_SAMPLE_SIZE)
                .any(is_url)
        })
    }

    pub fn into_input(self) -> Result<LoadedInput, InputError> {
        let url_index = self.detect_url_column().ok_or(InputError::NoUrlColumn)?;
        let outcome_index = OUTCOME_COLUMNS
            .iter()
            .find_map(|name| self.column_index(name))
            .filter(|&index| index != url_index);
        let verdict_index = self.column_index(VERDICT_COLUMN);
        let crawl_index = self.column_index(LAST_CRAWL_COLUMN);

        let records = self
            .rows
            .iter()
            .filter_map(|row| {
                let identifier = cell(row, url_index);
                if identifier.is_empty() {
                    return None;
                }
                Some(RawRecord {
                    identifier: identifier.to_string(),
                    outcome: optional_cell(row, outcome_index),
                    verdict: optional_cell(row, verdict_index),
                    last_crawl_time: optional_cell(row, crawl_index),
                })
            })
            .collect();

        Ok(LoadedInput {
            records,
            url_column: self.columns[url_index].clone(),
            has_outcome_column: outcome_index.is_some(),
        })
    }
}

/// Reads a CSV, TXT or spreadsheet file into raw records.
pub fn load_records(path: &Path) -> Result<LoadedInput, InputError> {
    let kind = InputKind::from_path(path)?;
    let table = match kind {
        InputKind::Csv => parse_csv(&read_text(path)?)?,
        InputKind::Text => parse_text(&read_text(path)?),
        InputKind::Spreadsheet => read_spreadsheet(path)?,
    };
    inspect_debug!(
        "Read {:?} as {:?}: {} columns, {} rows",
        path,
        kind,
        table.columns.len(),
        table.rows.len()
    );

    let input = table.into_input()?;
    inspect_info!(
        "Loaded {} URLs from {:?} (url column {:?}, prior results: {})",
        input.records.len(),
        path,
        input.url_column,
        input.has_outcome_column
    );
    Ok(input)
}

pub fn parse_csv(text: &str) -> Result<Table, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(ToOwned::to_owned).collect());
    }
    Ok(Table::from_rows(rows))
}

/// One URL per line, no header.
pub fn parse_text(text: &str) -> Table {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| vec![line.to_string()])
        .collect();
    Table {
        columns: vec![TEXT_COLUMN.to_string()],
        rows,
    }
}

fn read_text(path: &Path) -> Result<String, InputError> {
    let bytes = fs::read(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = decode_text(&bytes)?;
    inspect_debug!("Decoded {:?} as {}", path, decoded.encoding_label);
    Ok(decoded.text)
}

fn read_spreadsheet(path: &Path) -> Result<Table, InputError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| InputError::Spreadsheet(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InputError::Spreadsheet("workbook has no sheets".into()))?
        .map_err(|err| InputError::Spreadsheet(err.to_string()))?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(data_to_text).collect())
        .collect();
    Ok(Table::from_rows(rows))
}

fn data_to_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|value| value.trim()).unwrap_or("")
}

fn optional_cell(row: &[String], index: Option<usize>) -> Option<String> {
    let value = cell(row, index?);
    (!value.is_empty()).then(|| value.to_string())
}

fn is_url(value: &str) -> bool {
    URL_PATTERN.is_match(value.trim())
}
