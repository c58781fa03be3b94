//! Parser factory for creating format-specific parsers
//!
//! Maps a [`FileFormat`] (usually detected from a file extension) to the
//! parser that reads it.

use std::path::Path;

use crate::types::{FileFormat, Record};

use super::{
    DelimitedParser, ParseResult, RecordParser, SpreadsheetParser, StructuredParser,
};

/// Factory for creating record parsers.
#[derive(Debug, Clone)]
pub struct ParserFactory {
    delimiter: u8,
}

impl ParserFactory {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Delimiter used by parsers created for [`FileFormat::Delimited`].
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Create a parser for the specified format.
    pub fn create_parser(&self, format: FileFormat) -> Box<dyn RecordParser> {
        match format {
            FileFormat::Spreadsheet => Box::new(SpreadsheetParser::new()),
            FileFormat::Delimited => Box::new(DelimitedParser::with_delimiter(self.delimiter)),
            FileFormat::Structured => Box::new(StructuredParser::new()),
        }
    }

    /// Create a parser based on a file's extension.
    ///
    /// Returns `None` for unrecognized extensions.
    pub fn parser_for_path(&self, path: &Path) -> Option<Box<dyn RecordParser>> {
        FileFormat::from_path(path).map(|format| self.create_parser(format))
    }

    /// Parse contents in the given format.
    pub fn parse(&self, format: FileFormat, contents: &[u8]) -> ParseResult<Vec<Record>> {
        self.create_parser(format).parse(contents)
    }
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}
