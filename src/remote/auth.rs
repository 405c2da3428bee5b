use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::SheetsError;
use super::client::check_status;
use super::credentials::ServiceAccountKey;

/// OAuth scopes requested for the service account.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Signs the JWT-bearer assertion for `key`, issued at `issued_at` (unix seconds).
pub fn sign_assertion(key: &ServiceAccountKey, issued_at: i64) -> Result<String, SheetsError> {
    let claims = Claims {
        iss: &key.client_email,
        scope: SCOPES.join(" "),
        aud: &key.token_uri,
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SheetsError::InvalidCredentials(e.to_string()))?;
    Ok(jsonwebtoken::encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &encoding_key,
    )?)
}

/// Exchanges a signed assertion for an access token at the key's token URI.
#[instrument(level = "debug", skip_all, fields(client_email = %key.client_email))]
pub fn fetch_access_token(http: &Client, key: &ServiceAccountKey) -> Result<String, SheetsError> {
    let assertion = sign_assertion(key, Utc::now().timestamp())?;
    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()?;
    let token: TokenResponse = check_status(response)?.json()?;
    debug!("access token obtained");
    Ok(token.access_token)
}
