//! Line decoding for user input files.
//!
//! Two formats are supported:
//!
//! - **JSON lines** (default): every line is a JSON object deserialized into a
//!   [`UserRecord`]. The `username` field is required.
//! - **Column-mapped CSV**: headerless comma-separated lines paired with an
//!   externally supplied column list such as `username,password,email`.
//!   `username` and `password` are reserved; an empty column name drops that
//!   field; any other name becomes an attribute.
//!
//! Blank lines and lines starting with `#` (after leading whitespace) are
//! ignored and never produce a record.

use super::UserRecord;
use crate::error::{Result, UserPoolError};
use serde_json::Value;
use std::io::BufRead;

/// Destination of one CSV field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Username,
    Password,
    Attribute(String),
    Ignore,
}

/// Ordered column list for CSV input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: Vec<Column>,
}

impl ColumnMapping {
    /// Parse a comma-separated column list, e.g. `"username,,age"`.
    ///
    /// Names are taken as written: `" password"` is an attribute, not the
    /// reserved password column.
    pub fn parse(spec: &str) -> Self {
        let columns = spec
            .split(',')
            .map(|name| match name {
                "username" => Column::Username,
                "password" => Column::Password,
                "" => Column::Ignore,
                other => Column::Attribute(other.to_string()),
            })
            .collect();
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn len(&self) -> usize {
        self.columns.len()
    }
}

/// A record together with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub line: usize,
    pub record: UserRecord,
}

/// Decodes input lines into user records.
#[derive(Debug, Clone, Default)]
pub struct RecordDecoder {
    columns: Option<ColumnMapping>,
}

impl RecordDecoder {
    /// Decoder for JSON-lines input
    pub fn json_lines() -> Self {
        Self { columns: None }
    }

    /// Decoder for headerless CSV input with the given column mapping
    pub fn csv(columns: ColumnMapping) -> Self {
        Self {
            columns: Some(columns),
        }
    }

    /// Picks the format from an optional `--columns` value.
    pub fn from_columns(columns: Option<&str>) -> Self {
        match columns {
            Some(spec) if !spec.is_empty() => Self::csv(ColumnMapping::parse(spec)),
            _ => Self::json_lines(),
        }
    }

    /// Whether a raw line is blank or a comment.
    pub fn is_ignored(line: &str) -> bool {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with('#')
    }

    /// Decode a single non-ignored line.
    pub fn decode(&self, line_number: usize, line: &str) -> Result<UserRecord> {
        let line = line.trim();
        match &self.columns {
            None => decode_json(line_number, line),
            Some(mapping) => decode_csv(mapping, line_number, line),
        }
    }

    /// Iterate over every record in `reader`, skipping blank and comment lines.
    ///
    /// Iteration yields an error for the first malformed line; callers are
    /// expected to stop there.
    pub fn records<R: BufRead>(&self, reader: R) -> Records<'_, R> {
        Records {
            decoder: self,
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

/// Iterator returned by [`RecordDecoder::records`].
pub struct Records<'a, R> {
    decoder: &'a RecordDecoder,
    lines: std::io::Lines<R>,
    line_number: usize,
}

impl<R: BufRead> Iterator for Records<'_, R> {
    type Item = Result<DecodedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_number += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(UserPoolError::at_line(self.line_number, e.into()))),
            };
            if RecordDecoder::is_ignored(&line) {
                continue;
            }
            return Some(
                self.decoder
                    .decode(self.line_number, &line)
                    .map(|record| DecodedRecord {
                        line: self.line_number,
                        record,
                    }),
            );
        }
    }
}

fn decode_json(line_number: usize, line: &str) -> Result<UserRecord> {
    serde_json::from_str(line).map_err(|e| UserPoolError::Decode {
        line: line_number,
        message: e.to_string(),
    })
}

fn decode_csv(mapping: &ColumnMapping, line_number: usize, line: &str) -> Result<UserRecord> {
    // Quotes are ordinary characters: the field count is the number of
    // comma-separated pieces on the line.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(line.as_bytes());

    let fields = match reader.records().next() {
        Some(Ok(fields)) => fields,
        Some(Err(e)) => {
            return Err(UserPoolError::Decode {
                line: line_number,
                message: e.to_string(),
            })
        }
        None => csv::StringRecord::new(),
    };

    if fields.len() != mapping.len() {
        return Err(UserPoolError::Decode {
            line: line_number,
            message: format!(
                "invalid format: expected {} fields, found {}",
                mapping.len(),
                fields.len()
            ),
        });
    }

    let mut record = UserRecord::default();
    for (column, value) in mapping.columns().iter().zip(fields.iter()) {
        match column {
            Column::Username => record.username = value.to_string(),
            Column::Password if value.is_empty() => record.password = None,
            Column::Password => record.password = Some(value.to_string()),
            Column::Attribute(name) => {
                record
                    .attributes
                    .insert(name.clone(), Value::String(value.to_string()));
            }
            Column::Ignore => {}
        }
    }

    Ok(record)
}
