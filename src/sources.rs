// src/sources.rs
//! Delimited extract reading shared by the hierarchy builder and the fusion passes.

use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Records of one extract with the header row removed.
#[derive(Debug, Default)]
pub struct SourceRows {
    pub rows: Vec<Vec<String>>,
    /// Records the csv reader could not decode at all.
    pub unreadable: usize,
}

impl SourceRows {
    /// Splits records into those with at least `min_columns` fields and a count of the rest.
    pub fn with_min_columns(self, min_columns: usize) -> (Vec<Vec<String>>, usize) {
        let mut malformed = self.unreadable;
        let mut kept = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            if row.len() >= min_columns {
                kept.push(row);
            } else {
                malformed += 1;
            }
        }
        (kept, malformed)
    }
}

/// Opens an extract. A missing or unreadable file is the caller's `SourceUnavailable`.
pub fn read_delimited(path: &Path, delimiter: u8) -> std::io::Result<SourceRows> {
    let file = File::open(path)?;
    Ok(parse_delimited(BufReader::new(file), delimiter))
}

pub fn parse_delimited<R: Read>(reader: R, delimiter: u8) -> SourceRows {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut out = SourceRows::default();
    for (line, record) in csv_reader.records().enumerate() {
        match record {
            Ok(record) => out.rows.push(record.iter().map(str::to_string).collect()),
            Err(e) => {
                debug!("Skipping unreadable record {}: {}", line + 2, e);
                out.unreadable += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_is_skipped_and_short_rows_counted() {
        let data = "ico;nazev;okres\n231401;Obec Lhota;Kladno\n12345;Broken\n";
        let (rows, malformed) = parse_delimited(data.as_bytes(), b';').with_min_columns(3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], vec!["231401", "Obec Lhota", "Kladno"]);
        assert_eq!(malformed, 1);
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() {
        let data = "a,b\n\"Praha, hlavní\",1\n";
        let rows = parse_delimited(data.as_bytes(), b',').rows;
        assert_eq!(rows[0][0], "Praha, hlavní");
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = read_delimited(Path::new("/nonexistent/extract.csv"), b';').unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
