//! File format adapters.

pub mod csv;

pub use self::csv::{MAX_CSV_SIZE, read_row, read_row_from_file, row_to_string, write_row};
