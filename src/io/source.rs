use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto_from_rs};

use crate::error::{Result, ToolError};
use crate::model::format_number;

/// Tabular formats accepted as price exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.xlsx` or `.xls` workbook; the first worksheet is read.
    Excel,
    /// Comma separated UTF-8 text with a header row.
    Csv,
}

impl SourceFormat {
    /// Detects the format from a file name's extension, ignoring case.
    pub fn detect(file_name: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()?
            .to_str()?
            .to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" | "xls" => Some(SourceFormat::Excel),
            "csv" => Some(SourceFormat::Csv),
            _ => None,
        }
    }
}

/// An uploaded source file: a display name plus its raw content, independent
/// of how the caller obtained it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    name: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Loads a file from disk, using its base name as the display name.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The file's tabular format, or [`ToolError::UnsupportedFormat`].
    pub fn format(&self) -> Result<SourceFormat> {
        SourceFormat::detect(&self.name).ok_or_else(|| ToolError::UnsupportedFormat {
            file: self.name.clone(),
        })
    }
}

/// A scalar read from a source table.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(value) => value.is_empty(),
            _ => false,
        }
    }

    /// String form of the cell; numbers drop an integral fraction.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => format_number(*value),
            Cell::Bool(value) => value.to_string(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(value) => Cell::Text(value.clone()),
            Data::Float(value) => Cell::Number(*value),
            Data::Int(value) => Cell::Number(*value as f64),
            Data::Bool(value) => Cell::Bool(*value),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// One source table: trimmed header names and every data row below them, in
/// file order. Rows whose cells are all empty are kept.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SourceTable {
    /// Position of the column with the given header, if present.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|candidate| candidate == header)
    }
}

/// Reads a source file according to its detected format.
pub fn read_source(file: &SourceFile) -> Result<SourceTable> {
    match file.format()? {
        SourceFormat::Excel => read_excel(file.bytes()),
        SourceFormat::Csv => read_csv(file.bytes()),
    }
}

fn read_excel(bytes: &[u8]) -> Result<SourceTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ToolError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let mut table = SourceTable {
        headers: rows
            .next()
            .map(|header| header.iter().map(header_name).collect())
            .unwrap_or_default(),
        rows: Vec::new(),
    };
    for row in rows {
        table.rows.push(row.iter().map(Cell::from).collect());
    }
    Ok(table)
}

fn header_name(data: &Data) -> String {
    Cell::from(data).to_text().trim().to_string()
}

fn read_csv(bytes: &[u8]) -> Result<SourceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let mut table = SourceTable {
        headers: reader
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
            .collect(),
        rows: Vec::new(),
    };
    for record in reader.records() {
        let record = record?;
        table.rows.push(
            record
                .iter()
                .map(|value| {
                    if value.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats_case_insensitively() {
        assert_eq!(SourceFormat::detect("a.XLSX"), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::detect("a.xls"), Some(SourceFormat::Excel));
        assert_eq!(SourceFormat::detect("prices.Csv"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::detect("notes.txt"), None);
        assert_eq!(SourceFormat::detect("no_extension"), None);
    }

    #[test]
    fn unsupported_extension_names_the_file() {
        let file = SourceFile::new("notes.txt", b"a,b".to_vec());
        let error = read_source(&file).unwrap_err();
        assert!(
            matches!(error, ToolError::UnsupportedFormat { ref file } if file == "notes.txt"),
            "unexpected error: {error:?}"
        );
    }

    #[test]
    fn csv_headers_are_trimmed_and_blank_rows_kept() {
        let content = "\u{feff}Mã sản phẩm , Giá đã giảm\n123,45000\n,\n456,\n";
        let file = SourceFile::new("export.csv", content.as_bytes().to_vec());
        let table = read_source(&file).expect("csv parsed");

        assert_eq!(table.headers, vec!["Mã sản phẩm", "Giá đã giảm"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][0], Cell::Text("123".into()));
        assert!(table.rows[1].iter().all(Cell::is_empty));
        assert_eq!(table.rows[2][1], Cell::Empty);
        assert_eq!(table.column_index("Giá đã giảm"), Some(1));
        assert_eq!(table.column_index("Giá gốc (Tùy chọn)"), None);
    }

    #[test]
    fn cell_text_drops_integral_fraction() {
        assert_eq!(Cell::Number(123456.0).to_text(), "123456");
        assert_eq!(Cell::Number(1.5).to_text(), "1.5");
        assert_eq!(Cell::Empty.to_text(), "");
    }
}
