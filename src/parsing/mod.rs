//! Format parsers turning file contents into records.
//!
//! One parser per supported format, all behind the [`RecordParser`] trait:
//!
//! | format          | extension | typing                     |
//! |-----------------|-----------|----------------------------|
//! | spreadsheet     | `.xlsx`   | native cell types          |
//! | delimited text  | `.csv`    | everything is text         |
//! | structured text | `.json`   | JSON scalars               |

mod delimited;
mod error;
pub mod factory;
mod parser;
mod spreadsheet;
mod structured;

pub use delimited::DelimitedParser;
pub use error::{ParseError, ParseResult};
pub use factory::ParserFactory;
pub use parser::RecordParser;
pub use spreadsheet::SpreadsheetParser;
pub use structured::StructuredParser;
