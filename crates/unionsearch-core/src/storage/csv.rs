//! CSV table loading.
//!
//! Supports RFC 4180 style quoting: quoted fields may contain commas,
//! newlines and doubled quotes. Both `\n` and `\r\n` line endings are
//! accepted. Tables are truncated to [`MAX_TABLE_ROWS`] data rows.

use crate::config::MAX_TABLE_ROWS;
use crate::error::StorageError;
use crate::types::Table;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Loads a CSV table with a header row.
pub fn load_table(path: &Path) -> Result<Table, StorageError> {
    let text = read_text(path)?;
    let mut records = Records::new(&text);

    let columns = records.next().ok_or_else(|| StorageError::InvalidTable {
        path: path.to_path_buf(),
        reason: "no header row".to_string(),
    })?;
    let rows = records.take(MAX_TABLE_ROWS).collect();

    Ok(Table { columns, rows })
}

/// Loads only the header names of a CSV table, in column order.
pub fn load_table_columns(path: &Path) -> Result<Vec<String>, StorageError> {
    let text = read_text(path)?;
    Records::new(&text)
        .next()
        .ok_or_else(|| StorageError::InvalidTable {
            path: path.to_path_buf(),
            reason: "no header row".to_string(),
        })
}

/// Loads every `*.csv` file in `dir`, sorted by file name.
///
/// Files that cannot be read or parsed are skipped with a warning.
pub fn load_tables_in_dir(dir: &Path) -> Result<Vec<(String, Table)>, StorageError> {
    if !dir.is_dir() {
        return Err(StorageError::MissingArtifact(dir.to_path_buf()));
    }
    let entries = fs::read_dir(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        match load_table(&path) {
            Ok(table) => tables.push((name, table)),
            Err(e) => warn!("Skipping problematic file {}: {}", path.display(), e),
        }
    }

    if tables.is_empty() {
        warn!("No valid CSV files were found in {}", dir.display());
    }
    Ok(tables)
}

fn read_text(path: &Path) -> Result<String, StorageError> {
    if !path.exists() {
        return Err(StorageError::MissingArtifact(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Iterator over CSV records. Blank lines are skipped.
struct Records<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Records<'a> {
    fn new(text: &'a str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn read_record(&mut self) -> Option<Vec<String>> {
        self.chars.peek()?;

        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut touched = false;

        while let Some(c) = self.chars.next() {
            if in_quotes {
                match c {
                    '"' if self.chars.peek() == Some(&'"') => {
                        self.chars.next();
                        field.push('"');
                    }
                    '"' => in_quotes = false,
                    _ => field.push(c),
                }
                continue;
            }
            match c {
                '"' => {
                    in_quotes = true;
                    touched = true;
                }
                ',' => {
                    fields.push(std::mem::take(&mut field));
                    touched = true;
                }
                '\r' if self.chars.peek() == Some(&'\n') => {}
                '\n' => break,
                _ => {
                    field.push(c);
                    touched = true;
                }
            }
        }

        if !touched {
            return Some(Vec::new());
        }
        fields.push(field);
        Some(fields)
    }
}

impl Iterator for Records<'_> {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = self.read_record()?;
            if !record.is_empty() {
                return Some(record);
            }
        }
    }
}
