//! Delivery of the template to a worksheet inside a shared Google spreadsheet.
//!
//! [`client`] holds the service abstraction and its REST implementation,
//! [`credentials`] the environment driven configuration, and [`resolve`] the
//! policy deciding which worksheet receives the rows and whether a header is
//! written first.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod resolve;

use thiserror::Error;

pub use client::{SheetsClient, Spreadsheet, SpreadsheetService, WorksheetRef};
pub use credentials::{RemoteConfig, ServiceAccountKey, load_remote_config};
pub use resolve::{UploadReport, WriteMode, upload};

/// Failures of the remote destination. None of them is retried.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// The credential environment variable is unset or empty.
    #[error("environment variable '{0}' was not found on the server")]
    MissingCredentials(String),

    /// The credential blob is not a usable service account key.
    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// A configuration value could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidConfig { var: String, reason: String },

    /// The locator has no spreadsheet key, or the service reports no such
    /// spreadsheet.
    #[error("spreadsheet not found: {0}")]
    SpreadsheetNotFound(String),

    /// Signing the token request failed.
    #[error("failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// The token endpoint or the API answered with an error status.
    #[error("Google Sheets API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Network level failure.
    #[error("request to Google Sheets failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl SheetsError {
    /// The status line shown to the caller, distinct per failure cause.
    pub fn user_message(&self) -> String {
        match self {
            SheetsError::MissingCredentials(var) => {
                format!("Error: environment variable '{var}' was not found on the server.")
            }
            SheetsError::SpreadsheetNotFound(_) => {
                "Error: Google Sheet not found. Please check the link or its sharing permissions."
                    .to_string()
            }
            other => format!("Error while uploading to Google Sheets: {other}"),
        }
    }
}
