use tracing::{info, instrument};

use super::SheetsError;
use super::client::{Spreadsheet, SpreadsheetService};
use crate::model::NormalizedTable;
use crate::progress::Progress;

/// Worksheet used when the caller does not name one.
pub const DEFAULT_WORKSHEET: &str = "Sheet1";
/// Grid size of worksheets created by the upload.
pub const NEW_WORKSHEET_ROWS: u32 = 1;
pub const NEW_WORKSHEET_COLS: u32 = 20;

/// A worksheet is truly empty when it has no rows or every cell is the empty
/// string.
pub fn is_truly_empty(values: &[Vec<String>]) -> bool {
    values.iter().all(|row| row.iter().all(String::is_empty))
}

/// The worksheet the upload targets: the caller's name when it has any
/// non-blank content, otherwise [`DEFAULT_WORKSHEET`].
pub fn target_name(requested: Option<&str>) -> &str {
    requested
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_WORKSHEET)
}

/// What the spreadsheet holds under the target name before the upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorksheetState {
    Missing,
    Empty,
    HasContent,
}

/// Outcome of the resolution procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub worksheet: String,
    pub create: bool,
    pub write_header: bool,
}

/// Decides the target worksheet and whether it must be created and given a
/// header row. A worksheet created here is empty by construction.
pub fn resolve(requested: Option<&str>, state: WorksheetState) -> Resolution {
    Resolution {
        worksheet: target_name(requested).to_string(),
        create: state == WorksheetState::Missing,
        write_header: state != WorksheetState::HasContent,
    }
}

/// How the rows landed in the worksheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Header row written first, then the data.
    WithHeader,
    /// Data appended below existing content, no header.
    Appended,
}

/// Summary of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub worksheet: String,
    pub mode: WriteMode,
    pub rows: usize,
}

impl UploadReport {
    pub fn status_message(&self) -> String {
        match self.mode {
            WriteMode::WithHeader => format!(
                "Success! Created and wrote data to worksheet '{}'.",
                self.worksheet
            ),
            WriteMode::Appended => format!(
                "Success! Appended {} new rows to worksheet '{}'.",
                self.rows, self.worksheet
            ),
        }
    }
}

/// Opens the spreadsheet at `locator`, resolves the target worksheet, and
/// writes the table to it.
///
/// The emptiness check and the append are separate calls with no locking, so
/// concurrent uploads to the same worksheet may both write a header.
#[instrument(level = "info", skip_all, fields(rows = table.len()))]
pub fn upload<S: SpreadsheetService>(
    service: &S,
    locator: &str,
    requested: Option<&str>,
    table: &NormalizedTable,
    progress: &mut dyn Progress,
) -> Result<UploadReport, SheetsError> {
    let spreadsheet = service.open_by_url(locator)?;
    let name = target_name(requested);

    let existing = spreadsheet.worksheet(name)?;
    let state = match &existing {
        Some(worksheet) => {
            progress.report(0.92, &format!("Found worksheet '{name}'."));
            if is_truly_empty(&spreadsheet.get_all_values(worksheet)?) {
                WorksheetState::Empty
            } else {
                WorksheetState::HasContent
            }
        }
        None => WorksheetState::Missing,
    };
    let resolution = resolve(requested, state);
    info!(
        worksheet = %resolution.worksheet,
        ?state,
        create = resolution.create,
        header = resolution.write_header,
        "worksheet resolved"
    );

    let worksheet = match existing {
        Some(worksheet) => worksheet,
        None => {
            progress.report(
                0.92,
                &format!("Worksheet '{name}' not found, creating it..."),
            );
            spreadsheet.add_worksheet(&resolution.worksheet, NEW_WORKSHEET_ROWS, NEW_WORKSHEET_COLS)?
        }
    };

    progress.report(
        0.95,
        &format!("Writing data to worksheet '{}'...", resolution.worksheet),
    );
    let rows = table.literal_rows();
    let row_count = rows.len();

    if resolution.write_header {
        let mut payload: Vec<Vec<String>> = Vec::with_capacity(row_count + 1);
        payload.push(table.columns().iter().map(|c| c.to_string()).collect());
        payload.extend(rows);
        spreadsheet.append_rows(&worksheet, &payload)?;
        spreadsheet.bold_header(&worksheet, table.columns().len())?;
        Ok(UploadReport {
            worksheet: resolution.worksheet,
            mode: WriteMode::WithHeader,
            rows: row_count,
        })
    } else {
        if !rows.is_empty() {
            spreadsheet.append_rows(&worksheet, &rows)?;
        }
        Ok(UploadReport {
            worksheet: resolution.worksheet,
            mode: WriteMode::Appended,
            rows: row_count,
        })
    }
}
