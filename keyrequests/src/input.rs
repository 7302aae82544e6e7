//! Reads the `|` separated input file. Rows are returned as-is, including the
//! header row, and are validated later by the aggregator.

use crate::types::RawRow;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub const DELIMITER: u8 = b'|';

#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("could not open input file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not read input: {0}")]
    Parse(#[from] csv::Error),
}

pub fn read_rows_from_path(path: &Path) -> Result<Vec<RawRow>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    read_rows(io::BufReader::new(file))
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, InputError> {
    // Records end at `\n` only, so a CRLF row does not leave its `\n` behind as
    // the start of the next record and line numbers stay exact.
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(index as u64 + 1);

        let mut fields: Vec<String> = record.iter().map(String::from).collect();
        if let Some(last) = fields.last_mut() {
            if last.ends_with('\r') {
                last.pop();
            }
        }

        // Blank CRLF lines, skipped like blank LF lines
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }

        rows.push(RawRow { line, fields });
    }

    Ok(rows)
}
