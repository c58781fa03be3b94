mod value;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use value::{DATE_FORMAT, Value, excel_serial};

/// One row: column name to value, in source header order.
pub type Record = IndexMap<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid table name '{name}': {reason}")]
pub struct InvalidTableName {
    pub name: String,
    pub reason: &'static str,
}

/// Validated name of a storage table.
///
/// Table names are derived from file stems, so they must be usable both as
/// a file name and as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidTableName> {
        let name = name.into();
        let reason = if name.is_empty() {
            Some("name is empty")
        } else if name == "." || name == ".." {
            Some("name is a relative path component")
        } else if name.contains(['/', '\\']) {
            Some("name contains a path separator")
        } else if name.chars().any(char::is_control) {
            Some("name contains control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidTableName { name, reason }),
            None => Ok(Self(name)),
        }
    }

    /// Derive the table name from a file path (file name without extension).
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        Self::new(stem).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableName {
    type Error = InvalidTableName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TableName> for String {
    fn from(name: TableName) -> Self {
        name.0
    }
}

impl FromStr for TableName {
    type Err = InvalidTableName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The three tabular file formats understood on both the import and the
/// export side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// `.xlsx` workbooks.
    Spreadsheet,
    /// `.csv` files.
    Delimited,
    /// `.json` arrays of flat objects.
    Structured,
}

impl FileFormat {
    pub const ALL: [FileFormat; 3] = [
        FileFormat::Spreadsheet,
        FileFormat::Delimited,
        FileFormat::Structured,
    ];

    /// Match a file extension, case-insensitively and without the dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| ext.eq_ignore_ascii_case(format.extension()))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Spreadsheet => "xlsx",
            FileFormat::Delimited => "csv",
            FileFormat::Structured => "json",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FileFormat::Spreadsheet => "spreadsheet",
            FileFormat::Delimited => "delimited-text",
            FileFormat::Structured => "structured-text",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
#[error("Unknown format '{0}' (expected xlsx, csv or json)")]
pub struct UnknownFormat(String);

impl FromStr for FileFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(format) = Self::from_extension(s) {
            return Ok(format);
        }
        Self::ALL
            .into_iter()
            .find(|format| s.eq_ignore_ascii_case(format.name()))
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_table_name_from_path() {
        let name = TableName::from_path(&PathBuf::from("/data/equipment.csv")).unwrap();
        assert_eq!(name.as_str(), "equipment");

        let name = TableName::from_path(&PathBuf::from("/data/work orders.XLSX")).unwrap();
        assert_eq!(name.as_str(), "work orders");
    }

    #[test]
    fn test_table_name_rejects_bad_names() {
        assert!(TableName::new("").is_err());
        assert!(TableName::new("..").is_err());
        assert!(TableName::new("a/b").is_err());
        assert!(TableName::new("tab\u{7}").is_err());
        assert!(TableName::new("maintenance_data").is_ok());
    }

    #[test]
    fn test_format_detection_is_case_insensitive() {
        assert_eq!(
            FileFormat::from_path(&PathBuf::from("a.XLSX")),
            Some(FileFormat::Spreadsheet)
        );
        assert_eq!(
            FileFormat::from_path(&PathBuf::from("a.csv")),
            Some(FileFormat::Delimited)
        );
        assert_eq!(
            FileFormat::from_path(&PathBuf::from("a.Json")),
            Some(FileFormat::Structured)
        );
        assert_eq!(FileFormat::from_path(&PathBuf::from("a.txt")), None);
        assert_eq!(FileFormat::from_path(&PathBuf::from("Makefile")), None);
    }

    #[test]
    fn test_format_from_str_accepts_names_and_extensions() {
        assert_eq!("csv".parse::<FileFormat>().unwrap(), FileFormat::Delimited);
        assert_eq!(
            "structured-text".parse::<FileFormat>().unwrap(),
            FileFormat::Structured
        );
        assert!("pdf".parse::<FileFormat>().is_err());
    }
}
