//! Record parser trait
//!
//! This module defines the common interface that all format parsers
//! implement to feed the table synchronizer.

use crate::types::{FileFormat, Record};

use super::ParseResult;

/// Common interface for all file format parsers.
///
/// Parsers are pure: they receive the full file contents and return every
/// data row as a [`Record`]. All records returned for one input share the
/// same key set, in header order. Values keep the typing the format carries
/// natively; no textual coercion happens here.
pub trait RecordParser: Send + Sync {
    /// The format this parser reads.
    fn format(&self) -> FileFormat;

    /// Parse file contents into records.
    fn parse(&self, contents: &[u8]) -> ParseResult<Vec<Record>>;
}
