use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::api::{ApiErrorClass, classify_api_status};

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("base url cannot hold path segments")]
    BaseUrl,
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

impl SheetsError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            SheetsError::Api { status, .. } => Some(classify_api_status(*status)),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.classification(),
            Some(ApiErrorClass::RateLimit | ApiErrorClass::Transient)
        )
    }
}

#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl SheetsClient {
    pub fn new(token: impl Into<String>) -> Result<Self, SheetsError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, SheetsError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    /// Fetches the full contents of a range. The range may be a bare
    /// worksheet title; it is percent-encoded as a single path segment.
    pub async fn get_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<ValueRange, SheetsError> {
        let url = self.values_endpoint(spreadsheet_id, range)?;
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn append_row(
        &self,
        spreadsheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<AppendResponse, SheetsError> {
        let mut url = self.values_endpoint(spreadsheet_id, &format!("{range}:append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW");
        let body = AppendBody {
            values: vec![row.to_vec()],
        };
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .json(&body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn values_endpoint(&self, spreadsheet_id: &str, segment: &str) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::BaseUrl)?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", segment]);
        Ok(url)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SheetsError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SheetsError::Api { status, body })
        }
    }
}

#[derive(Debug, Serialize)]
struct AppendBody {
    values: Vec<Vec<String>>,
}

/// The API omits `values` entirely for an empty range.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default)]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResponse {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub table_range: Option<String>,
    pub updates: UpdateSummary,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub updated_range: String,
    #[serde(default)]
    pub updated_rows: u32,
    #[serde(default)]
    pub updated_columns: u32,
    #[serde(default)]
    pub updated_cells: u32,
}
