use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::error::{Result, ToolError};
use crate::form::{self, Destination};
use crate::io::excel_write::{self, SheetStyle, TextStyle};
use crate::io::source::SourceFile;
use crate::model::NormalizedTable;
use crate::normalize::normalize_files;
use crate::progress::Progress;
use crate::remote::{self, SheetsError, SpreadsheetService};

/// Everything one run needs, as selected by the caller.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub shop_id: String,
    pub files: Vec<SourceFile>,
    pub destination: Destination,
    pub text_style: TextStyle,
    pub sheet_style: SheetStyle,
    /// Directory receiving the generated file (local destination).
    pub output_dir: PathBuf,
    /// Spreadsheet link (remote destination).
    pub sheet_url: String,
    /// Desired worksheet name (remote destination).
    pub sheet_name: Option<String>,
}

/// Result of a run: a status line for the caller and, for the local
/// destination, the generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub success: bool,
    pub status: String,
    pub artifact: Option<PathBuf>,
}

impl RunOutcome {
    fn succeeded(status: String, artifact: Option<PathBuf>) -> Self {
        Self {
            success: true,
            status,
            artifact,
        }
    }

    fn failed(status: String) -> Self {
        Self {
            success: false,
            status,
            artifact: None,
        }
    }
}

/// File name of the generated template for a shop.
pub fn output_path(dir: &Path, shop_id: &str) -> PathBuf {
    dir.join(format!("template_final_{shop_id}.xlsx"))
}

/// Runs one batch: validate, normalize every file, deliver to the selected
/// destination. `connect` is only invoked for the remote destination.
///
/// Failures never escape; they become a failed [`RunOutcome`] with no
/// artifact.
#[instrument(
    level = "info",
    skip_all,
    fields(destination = ?request.destination, files = request.files.len())
)]
pub fn run<S, C>(request: &RunRequest, connect: C, progress: &mut dyn Progress) -> RunOutcome
where
    S: SpreadsheetService,
    C: FnOnce() -> std::result::Result<S, SheetsError>,
{
    progress.report(0.0, "Checking input...");
    let table = match prepare(request, progress) {
        Ok(table) => table,
        Err(error) => {
            if error.is_validation() {
                warn!(%error, "input rejected");
            } else {
                warn!(%error, "source files could not be processed");
            }
            return error.into();
        }
    };
    info!(rows = table.len(), "template table built");

    let outcome = match request.destination {
        Destination::LocalFile => deliver_file(request, &table, progress),
        Destination::RemoteSheet => deliver_sheet(request, &table, connect, progress),
    };
    progress.report(1.0, "Done!");
    outcome
}

fn prepare(request: &RunRequest, progress: &mut dyn Progress) -> Result<NormalizedTable> {
    let shop_id = form::validate(
        &request.shop_id,
        request.files.len(),
        request.destination,
        &request.sheet_url,
    )?;
    progress.report(0.1, "Validating Shop ID...");
    normalize_files(&request.files, &shop_id, progress)
}

fn deliver_file(
    request: &RunRequest,
    table: &NormalizedTable,
    progress: &mut dyn Progress,
) -> RunOutcome {
    progress.report(0.8, "Formatting and saving the Excel file...");
    let path = output_path(&request.output_dir, request.shop_id.trim());
    match save_file(&path, request, table) {
        Ok(()) => RunOutcome::succeeded(
            "Success! The Excel file has been created.".to_string(),
            Some(path),
        ),
        Err(error) => {
            warn!(%error, output = %path.display(), "saving the template failed");
            RunOutcome::failed(format!("Error while saving the Excel file: {error}"))
        }
    }
}

fn save_file(path: &Path, request: &RunRequest, table: &NormalizedTable) -> Result<()> {
    if !request.output_dir.as_os_str().is_empty() {
        fs::create_dir_all(&request.output_dir)?;
    }
    excel_write::write_template(path, table, &request.text_style, &request.sheet_style)
}

fn deliver_sheet<S, C>(
    request: &RunRequest,
    table: &NormalizedTable,
    connect: C,
    progress: &mut dyn Progress,
) -> RunOutcome
where
    S: SpreadsheetService,
    C: FnOnce() -> std::result::Result<S, SheetsError>,
{
    progress.report(0.9, "Connecting to Google Sheets...");
    let uploaded = connect().and_then(|service| {
        remote::upload(
            &service,
            request.sheet_url.trim(),
            request.sheet_name.as_deref(),
            table,
            progress,
        )
    });
    match uploaded {
        Ok(report) => RunOutcome::succeeded(report.status_message(), None),
        Err(error) => {
            warn!(%error, "upload failed");
            RunOutcome::failed(error.user_message())
        }
    }
}

impl From<ToolError> for RunOutcome {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::Sheets(error) => RunOutcome::failed(error.user_message()),
            other => RunOutcome::failed(format!("Error: {other}")),
        }
    }
}
