use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::SheetsError;
use super::auth::fetch_access_token;
use super::credentials::RemoteConfig;

static SPREADSHEET_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)|[?&#]key=([a-zA-Z0-9_-]+)")
        .expect("spreadsheet key pattern is valid")
});

/// Extracts the spreadsheet key from a share or edit URL.
pub fn spreadsheet_key(url: &str) -> Option<&str> {
    let captures = SPREADSHEET_KEY.captures(url)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|key| key.as_str())
}

/// A worksheet (tab) inside a spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorksheetRef {
    pub id: i64,
    pub title: String,
}

/// Opens spreadsheets by locator.
pub trait SpreadsheetService {
    type Spreadsheet: Spreadsheet;

    fn open_by_url(&self, url: &str) -> Result<Self::Spreadsheet, SheetsError>;
}

/// The worksheet operations the upload path relies on.
pub trait Spreadsheet {
    /// Looks up a worksheet by exact title.
    fn worksheet(&self, title: &str) -> Result<Option<WorksheetRef>, SheetsError>;

    fn add_worksheet(&self, title: &str, rows: u32, cols: u32)
    -> Result<WorksheetRef, SheetsError>;

    /// Every row of the worksheet as displayed strings.
    fn get_all_values(&self, worksheet: &WorksheetRef) -> Result<Vec<Vec<String>>, SheetsError>;

    /// Appends rows after the last non-empty row, letting the service parse
    /// numbers and formulas from the literal strings.
    fn append_rows(&self, worksheet: &WorksheetRef, rows: &[Vec<String>])
    -> Result<(), SheetsError>;

    /// Makes the first `columns` cells of row 1 bold.
    fn bold_header(&self, worksheet: &WorksheetRef, columns: usize) -> Result<(), SheetsError>;
}

/// Google Sheets v4 REST client authenticated with a bearer token.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    base: Url,
    token: String,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("base", &self.base.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SheetsClient {
    /// Builds the HTTP client and obtains an access token for the configured
    /// service account.
    #[instrument(level = "info", skip_all, fields(api_base = %config.api_base))]
    pub fn connect(config: &RemoteConfig) -> Result<Self, SheetsError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let token = fetch_access_token(&http, &config.credentials)?;
        Ok(Self::with_token(http, config.api_base.clone(), token))
    }

    pub fn with_token(http: Client, base: Url, token: impl Into<String>) -> Self {
        Self {
            http,
            base,
            token: token.into(),
        }
    }
}

impl SpreadsheetService for SheetsClient {
    type Spreadsheet = RemoteSpreadsheet;

    #[instrument(level = "debug", skip(self))]
    fn open_by_url(&self, url: &str) -> Result<RemoteSpreadsheet, SheetsError> {
        let key = spreadsheet_key(url)
            .ok_or_else(|| SheetsError::SpreadsheetNotFound(url.to_string()))?;
        let spreadsheet = RemoteSpreadsheet {
            client: self.clone(),
            key: key.to_string(),
        };
        match spreadsheet.list_worksheets() {
            Err(SheetsError::Api { status: 404, .. }) => {
                Err(SheetsError::SpreadsheetNotFound(url.to_string()))
            }
            Err(error) => Err(error),
            Ok(sheets) => {
                debug!(worksheets = sheets.len(), "spreadsheet opened");
                Ok(spreadsheet)
            }
        }
    }
}

/// A spreadsheet opened through [`SheetsClient`].
#[derive(Debug, Clone)]
pub struct RemoteSpreadsheet {
    client: SheetsClient,
    key: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

impl From<SheetProperties> for WorksheetRef {
    fn from(properties: SheetProperties) -> Self {
        WorksheetRef {
            id: properties.sheet_id,
            title: properties.title,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl RemoteSpreadsheet {
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = self.client.base.clone();
        url.path_segments_mut()
            .map_err(|()| SheetsError::InvalidConfig {
                var: super::credentials::API_BASE_ENV.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets"])
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, SheetsError> {
        let response = request.bearer_auth(&self.client.token).send()?;
        check_status(response)
    }

    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, SheetsError> {
        let url = self.endpoint(&[self.key.as_str()])?;
        let request = self
            .client
            .http
            .get(url)
            .query(&[("fields", "sheets.properties(sheetId,title)")]);
        let metadata: SpreadsheetMetadata = self.send(request)?.json()?;
        Ok(metadata
            .sheets
            .into_iter()
            .map(|entry| entry.properties.into())
            .collect())
    }

    fn batch_update(&self, requests: Value) -> Result<BatchUpdateResponse, SheetsError> {
        let url = self.endpoint(&[format!("{}:batchUpdate", self.key).as_str()])?;
        let request = self
            .client
            .http
            .post(url)
            .json(&json!({ "requests": requests }));
        Ok(self.send(request)?.json()?)
    }
}

impl Spreadsheet for RemoteSpreadsheet {
    fn worksheet(&self, title: &str) -> Result<Option<WorksheetRef>, SheetsError> {
        Ok(self
            .list_worksheets()?
            .into_iter()
            .find(|sheet| sheet.title == title))
    }

    #[instrument(level = "debug", skip(self))]
    fn add_worksheet(
        &self,
        title: &str,
        rows: u32,
        cols: u32,
    ) -> Result<WorksheetRef, SheetsError> {
        let response = self.batch_update(json!([{
            "addSheet": {
                "properties": {
                    "title": title,
                    "gridProperties": { "rowCount": rows, "columnCount": cols }
                }
            }
        }]))?;
        let properties = response
            .replies
            .into_iter()
            .next()
            .and_then(|reply| reply.pointer("/addSheet/properties").cloned())
            .ok_or_else(|| SheetsError::Api {
                status: 200,
                message: "addSheet reply is missing sheet properties".to_string(),
            })?;
        let properties: SheetProperties =
            serde_json::from_value(properties).map_err(|e| SheetsError::Api {
                status: 200,
                message: e.to_string(),
            })?;
        Ok(properties.into())
    }

    fn get_all_values(&self, worksheet: &WorksheetRef) -> Result<Vec<Vec<String>>, SheetsError> {
        let range = a1_sheet_range(&worksheet.title);
        let url = self.endpoint(&[self.key.as_str(), "values", range.as_str()])?;
        let range: ValueRange = self.send(self.client.http.get(url))?.json()?;
        Ok(range.values)
    }

    #[instrument(level = "debug", skip(self, rows), fields(worksheet = %worksheet.title, rows = rows.len()))]
    fn append_rows(
        &self,
        worksheet: &WorksheetRef,
        rows: &[Vec<String>],
    ) -> Result<(), SheetsError> {
        let range = format!("{}:append", a1_sheet_range(&worksheet.title));
        let url = self.endpoint(&[self.key.as_str(), "values", range.as_str()])?;
        let request = self
            .client
            .http
            .post(url)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "majorDimension": "ROWS", "values": rows }));
        self.send(request)?;
        Ok(())
    }

    fn bold_header(&self, worksheet: &WorksheetRef, columns: usize) -> Result<(), SheetsError> {
        self.batch_update(json!([{
            "repeatCell": {
                "range": {
                    "sheetId": worksheet.id,
                    "startRowIndex": 0,
                    "endRowIndex": 1,
                    "startColumnIndex": 0,
                    "endColumnIndex": columns
                },
                "cell": { "userEnteredFormat": { "textFormat": { "bold": true } } },
                "fields": "userEnteredFormat.textFormat.bold"
            }
        }]))?;
        Ok(())
    }
}

/// A1 range covering a whole worksheet: the quoted title.
fn a1_sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Turns non-success statuses into [`SheetsError::Api`], keeping the
/// service's own message when the body carries one.
pub(crate) fn check_status(response: Response) -> Result<Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|parsed| parsed.error.message)
        .unwrap_or(body);
    Err(SheetsError::Api {
        status: status.as_u16(),
        message,
    })
}
