//! CSV file adapter.
//!
//! A sheet file holds exactly one header row and one data row. Cells are
//! quoted only when they contain a comma, a quote or a line break, with
//! quotes doubled inside.

use crate::mapping::{ColumnSet, Row};
use crate::{Error, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Maximum sheet file size (16MB).
pub const MAX_CSV_SIZE: u64 = 16 * 1024 * 1024;

/// Reads a header row and a data row into a [`Row`].
///
/// Records after the data row are ignored.
///
/// # Errors
///
/// Returns [`Error::MalformedFile`] if the input is not UTF-8 CSV, has fewer
/// than two records, or its header and data rows differ in length.
pub fn read_row<R: Read>(reader: R) -> Result<Row> {
    let mut text = String::new();
    reader
        .take(MAX_CSV_SIZE + 1)
        .read_to_string(&mut text)
        .map_err(|e| Error::MalformedFile(e.to_string()))?;
    if text.len() as u64 > MAX_CSV_SIZE {
        return Err(Error::MalformedFile(format!(
            "file exceeds {MAX_CSV_SIZE} bytes"
        )));
    }
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::with_capacity(2);
    for record in csv_reader.records() {
        let record = record.map_err(|e| Error::MalformedFile(e.to_string()))?;
        records.push(record);
        if records.len() == 2 {
            break;
        }
    }

    let [header, values] = <[csv::StringRecord; 2]>::try_from(records).map_err(|found| {
        Error::MalformedFile(format!(
            "expected a header row and a data row, found {} row(s)",
            found.len()
        ))
    })?;
    if header.len() != values.len() {
        return Err(Error::MalformedFile(format!(
            "header has {} columns but data row has {}",
            header.len(),
            values.len()
        )));
    }

    let row = Row::from_pairs(header.iter(), values.iter());
    if row.len() < header.len() {
        tracing::warn!(
            columns = header.len(),
            unique = row.len(),
            "Duplicate column names, last value wins"
        );
    }
    Ok(row)
}

/// Reads a sheet file.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the file cannot be opened or is too
/// large, and [`Error::MalformedFile`] as for [`read_row`].
pub fn read_row_from_file(path: &Path) -> Result<Row> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::OperationFailed {
        operation: "read_sheet".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    if metadata.len() > MAX_CSV_SIZE {
        return Err(Error::OperationFailed {
            operation: "read_sheet".to_string(),
            cause: format!(
                "{} is {} bytes, limit is {MAX_CSV_SIZE}",
                path.display(),
                metadata.len()
            ),
        });
    }
    let file = File::open(path).map_err(|e| Error::OperationFailed {
        operation: "read_sheet".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    read_row(file)
}

/// Writes the header row and the data row of `columns`.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if writing fails.
pub fn write_row<W: Write>(writer: W, columns: &ColumnSet) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer
        .write_record(columns.names())
        .map_err(|e| Error::operation("write_csv_header", e))?;
    csv_writer
        .write_record(columns.values())
        .map_err(|e| Error::operation("write_csv_row", e))?;
    csv_writer
        .flush()
        .map_err(|e| Error::operation("flush_csv", e))?;
    Ok(())
}

/// Renders `columns` as sheet text.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if encoding fails.
pub fn row_to_string(columns: &ColumnSet) -> Result<String> {
    let mut buf = Vec::new();
    write_row(&mut buf, columns)?;
    String::from_utf8(buf).map_err(|e| Error::operation("write_csv", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn columns(pairs: &[(&str, &str)]) -> ColumnSet {
        let mut set = ColumnSet::new();
        for (name, value) in pairs {
            set.insert((*name).to_string(), (*value).to_string());
        }
        set
    }

    #[test]
    fn test_write_quotes_only_when_needed() {
        let text = row_to_string(&columns(&[
            ("Name", "Sword"),
            ("Quote", "He said \"hi\", bye"),
            ("Lines", "a\nb"),
        ]))
        .unwrap();
        assert_eq!(
            text,
            "Name,Quote,Lines\nSword,\"He said \"\"hi\"\", bye\",\"a\nb\"\n"
        );
    }

    #[test]
    fn test_read_back_escaped_cells() {
        let row = read_row("Name,Quote\nSword,\"He said \"\"hi\"\", bye\"\n".as_bytes()).unwrap();
        assert_eq!(row.get("Name"), Some("Sword"));
        assert_eq!(row.get("Quote"), Some("He said \"hi\", bye"));
    }

    #[test_case("a,b\r\n1,2\r\n" ; "crlf")]
    #[test_case("a,b\n1,2" ; "no trailing newline")]
    #[test_case("\u{feff}a,b\n1,2\n" ; "byte order mark")]
    #[test_case("a,b\n1,2\n3,4\n" ; "extra rows ignored")]
    fn test_read_variants(input: &str) {
        let row = read_row(input.as_bytes()).unwrap();
        assert_eq!(row.get("a"), Some("1"));
        assert_eq!(row.get("b"), Some("2"));
    }

    #[test_case("" ; "empty")]
    #[test_case("a,b\n" ; "header only")]
    #[test_case("a,b\n1\n" ; "short data row")]
    #[test_case("a\n1,2\n" ; "long data row")]
    fn test_read_malformed(input: &str) {
        assert!(matches!(
            read_row(input.as_bytes()),
            Err(Error::MalformedFile(_))
        ));
    }

    #[test]
    fn test_empty_cells_survive() {
        let text = row_to_string(&columns(&[("a", ""), ("b", "")])).unwrap();
        let row = read_row(text.as_bytes()).unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("a"), Some(""));
    }

    #[test]
    fn test_read_from_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            read_row_from_file(&dir.path().join("missing.csv")),
            Err(Error::OperationFailed { .. })
        ));
    }
}
