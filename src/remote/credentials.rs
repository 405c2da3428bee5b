use std::env::VarError;
use std::fmt;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use super::SheetsError;

/// Environment variable holding the service account JSON.
pub const CREDENTIALS_ENV: &str = "GOOGLE_CREDENTIALS_JSON";
/// Environment variable overriding the Sheets API base URL.
pub const API_BASE_ENV: &str = "SHEETS_API_BASE";
/// Environment variable overriding the HTTP timeout in seconds.
pub const TIMEOUT_ENV: &str = "SHEETS_TIMEOUT_SECS";

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a Google service account key this tool needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parses the JSON blob downloaded from the cloud console.
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        serde_json::from_str(json).map_err(|e| SheetsError::InvalidCredentials(e.to_string()))
    }
}

/// Everything the remote destination needs besides the spreadsheet locator.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub credentials: ServiceAccountKey,
    pub api_base: Url,
    pub timeout: Duration,
}

/// Loads the remote configuration from the process environment.
pub fn load_remote_config() -> Result<RemoteConfig, SheetsError> {
    build_remote_config(|key| std::env::var(key))
}

/// Builds the remote configuration from an arbitrary variable lookup.
pub fn build_remote_config<F>(lookup: F) -> Result<RemoteConfig, SheetsError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let credentials_json = lookup(CREDENTIALS_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SheetsError::MissingCredentials(CREDENTIALS_ENV.to_string()))?;
    let credentials = ServiceAccountKey::from_json(&credentials_json)?;

    let or_default = |var: &str, default: &str| lookup(var).unwrap_or_else(|_| default.to_string());

    let raw_base = or_default(API_BASE_ENV, DEFAULT_API_BASE);
    let api_base = Url::parse(&raw_base)
        .ok()
        .filter(|url| !url.cannot_be_a_base())
        .ok_or_else(|| SheetsError::InvalidConfig {
            var: API_BASE_ENV.to_string(),
            reason: format!("'{raw_base}' is not a base URL"),
        })?;

    let timeout_secs = or_default(TIMEOUT_ENV, DEFAULT_TIMEOUT_SECS)
        .parse::<u64>()
        .map_err(|e| SheetsError::InvalidConfig {
            var: TIMEOUT_ENV.to_string(),
            reason: e.to_string(),
        })?;

    Ok(RemoteConfig {
        credentials,
        api_base,
        timeout: Duration::from_secs(timeout_secs),
    })
}
