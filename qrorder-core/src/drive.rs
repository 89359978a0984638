use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::api::{ApiErrorClass, classify_api_status};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const LIST_FIELDS: &str = "files(id, name, mimeType), nextPageToken";
const FILE_FIELDS: &str = "id, name, mimeType";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

impl DriveError {
    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            DriveError::Api { status, .. } => Some(classify_api_status(*status)),
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
pub struct DriveClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl DriveClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DriveError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, DriveError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    pub async fn about(&self) -> Result<AboutInfo, DriveError> {
        let mut url = self.endpoint("/drive/v3/about")?;
        url.query_pairs_mut().append_pair("fields", "user");
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn list_folder(
        &self,
        folder_id: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<FileList, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("q", &folder_query(folder_id));
            query.append_pair("fields", LIST_FIELDS);
            if let Some(page_size) = page_size {
                query.append_pair("pageSize", &page_size.to_string());
            }
            if let Some(page_token) = page_token {
                query.append_pair("pageToken", page_token);
            }
        }
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn list_folder_all(
        &self,
        folder_id: &str,
        page_size: u32,
    ) -> Result<Vec<DriveFile>, DriveError> {
        let page_size = page_size.max(1);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_folder(folder_id, Some(page_size), page_token.as_deref())
                .await?;
            files.extend(page.files);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(files)
    }

    pub async fn get_file(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        let mut url = self.endpoint(&format!("/drive/v3/files/{file_id}"))?;
        url.query_pairs_mut().append_pair("fields", FILE_FIELDS);
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        let mut url = self.endpoint(&format!("/drive/v3/files/{file_id}"))?;
        url.query_pairs_mut().append_pair("alt", "media");
        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DriveError::Api { status, body })
        }
    }

    pub async fn delete_file(&self, file_id: &str) -> Result<(), DriveError> {
        let url = self.endpoint(&format!("/drive/v3/files/{file_id}"))?;
        let response = self
            .http
            .delete(url)
            .header("Authorization", self.auth_header_value())
            .send()
            .await?;
        // The API answers 204 with an empty body on success.
        if response.status().is_success() {
            return Ok(());
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(DriveError::Api { status, body })
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DriveError> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DriveError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DriveError::Api { status, body })
        }
    }
}

fn folder_query(folder_id: &str) -> String {
    format!("'{folder_id}' in parents and trashed = false")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutInfo {
    #[serde(default)]
    pub user: Option<AboutUser>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutUser {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}
