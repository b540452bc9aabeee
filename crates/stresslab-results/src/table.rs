//! In-memory results table and its CSV file form.
//!
//! A results file is produced wholesale by a simulation run and read
//! wholesale by the web layer. Writes go to a sibling temp file that is then
//! renamed over the target, so a reader sees either the previous run or the
//! new one, never a partial file.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::cell::{format_cell, parse_cell};
use crate::{Error, Result};

/// One CSV row as a JSON object keyed by column header.
pub type Record = Map<String, Value>;

/// A typed CSV table: a header row and rows of JSON cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultsTable {
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResultsTable {
    /// Build a table, checking that every row matches the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(Error::Shape {
                    row: i,
                    expected: headers.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    /// Column headers, in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if every named column is present.
    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.headers.iter().any(|h| h == n))
    }

    /// All values of one column, or `None` if the column is absent.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Headers of columns that hold at least one number and nothing but
    /// numbers or nulls.
    pub fn numeric_headers(&self) -> Vec<&str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mut any_number = false;
                for row in &self.rows {
                    match &row[*idx] {
                        Value::Number(_) => any_number = true,
                        Value::Null => {}
                        _ => return false,
                    }
                }
                any_number
            })
            .map(|(_, h)| h.as_str())
            .collect()
    }

    /// Rows as JSON objects, column order preserved.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<Record>()
            })
            .collect()
    }

    /// Parse CSV from any reader. The first row is the header.
    ///
    /// Header names are kept verbatim; a repeated name gets a `.N` suffix
    /// (`SX`, `SX.1`, ...). Cell values are trimmed before typing. Input
    /// without a header row is [`Error::NoHeader`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Fields)
            .from_reader(reader);

        let raw = csv_reader.headers()?;
        if raw.iter().all(|h| h.trim().is_empty()) {
            return Err(Error::NoHeader);
        }
        let headers = dedupe_headers(raw.iter());

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(parse_cell).collect());
        }

        Ok(Self { headers, rows })
    }

    /// Read a results file.
    ///
    /// Returns [`Error::NotFound`] when the file is absent so callers can
    /// distinguish "no results yet" from a malformed file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        let table = Self::from_reader(file)?;
        tracing::debug!(
            path = %path.display(),
            columns = table.headers.len(),
            rows = table.rows.len(),
            "Loaded results table"
        );
        Ok(table)
    }

    /// Serialize to CSV bytes.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(format_cell))?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::Csv(e.into_error().into()))
    }

    /// Overwrite `path` with this table, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let bytes = self.to_csv_bytes()?;
        let tmp = temp_sibling(path);
        std::fs::write(&tmp, bytes).map_err(|e| Error::io(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::io(path, e));
        }

        tracing::info!(
            path = %path.display(),
            rows = self.rows.len(),
            "Results written"
        );
        Ok(())
    }
}

/// Read a results file straight into JSON records.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    ResultsTable::read(path).map(|t| t.to_records())
}

/// Suffix repeated names `.1`, `.2`, ... skipping names already taken.
fn dedupe_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<&'a str, usize> = HashMap::new();
    let mut out = Vec::new();

    for name in names {
        let unique = if taken.contains(name) {
            let n = next_suffix.entry(name).or_insert(0);
            loop {
                *n += 1;
                let candidate = format!("{name}.{n}");
                if !taken.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            name.to_string()
        };
        taken.insert(unique.clone());
        out.push(unique);
    }
    out
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

// ============================================================================
// Tests
// ============================================================================
