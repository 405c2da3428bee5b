//! Caller-facing input handling: which fields a front end should show for the
//! current selection, and validation of what was entered.

use crate::error::{Result, ToolError};

/// Where a run delivers its table. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    /// A styled spreadsheet file on disk.
    #[default]
    LocalFile,
    /// Rows appended to a worksheet of a shared Google spreadsheet.
    RemoteSheet,
}

/// Field visibility derived from the current destination selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    /// Spreadsheet link and worksheet name inputs.
    pub remote_fields_visible: bool,
    /// Font family and size inputs.
    pub formatting_visible: bool,
}

impl ViewState {
    pub fn for_destination(destination: Destination) -> Self {
        let remote = destination == Destination::RemoteSheet;
        Self {
            remote_fields_visible: remote,
            formatting_visible: !remote,
        }
    }
}

/// Validates the run's input and returns the trimmed shop identifier.
///
/// Checks run in form order: shop id present, files present, spreadsheet
/// link present when it is visible, then shop id made of digits only.
pub fn validate(
    shop_id: &str,
    file_count: usize,
    destination: Destination,
    sheet_url: &str,
) -> Result<String> {
    if shop_id.trim().is_empty() {
        return Err(ToolError::MissingShopId);
    }
    if file_count == 0 {
        return Err(ToolError::MissingSourceFiles);
    }
    if ViewState::for_destination(destination).remote_fields_visible && sheet_url.trim().is_empty()
    {
        return Err(ToolError::MissingSheetUrl);
    }
    validate_shop_id(shop_id)
}

/// Trims the shop identifier and requires it to be ASCII digits only.
pub fn validate_shop_id(raw: &str) -> Result<String> {
    let shop_id = raw.trim();
    if shop_id.is_empty() {
        return Err(ToolError::MissingShopId);
    }
    if !shop_id.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(ToolError::InvalidShopId(shop_id.to_string()));
    }
    Ok(shop_id.to_string())
}
