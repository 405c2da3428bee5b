use thiserror::Error;

use crate::remote::SheetsError;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur when the
/// tool validates its input, reads source exports, or delivers the template.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::Error),

    /// Errors bubbled up from the CSV reader.
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    /// The caller did not provide a shop identifier.
    #[error("please enter a Shop ID")]
    MissingShopId,

    /// The caller did not provide any source file.
    #[error("please upload at least one source data file")]
    MissingSourceFiles,

    /// The remote destination was selected without a spreadsheet link.
    #[error("please enter the Google Sheet link")]
    MissingSheetUrl,

    /// The shop identifier contains something other than digits.
    #[error("Shop ID '{0}' is invalid, please enter digits only")]
    InvalidShopId(String),

    /// A source file has an extension outside the supported tabular formats.
    #[error("file {file} has an unsupported format")]
    UnsupportedFormat { file: String },

    /// A source file could not be read or mapped onto the template.
    #[error("failed to read or process file {file}: {reason}")]
    SourceFile { file: String, reason: String },

    /// A source workbook contains no worksheet to read from.
    #[error("workbook has no worksheets")]
    EmptyWorkbook,

    /// Failures talking to the remote spreadsheet service.
    #[error(transparent)]
    Sheets(#[from] SheetsError),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    /// Returns `true` for failures caused by the caller's input rather than
    /// by the files or the destination.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ToolError::MissingShopId
                | ToolError::MissingSourceFiles
                | ToolError::MissingSheetUrl
                | ToolError::InvalidShopId(_)
        )
    }
}
