// [crates/providers/src/storage/id_addressed.rs]
use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use snapforge_models::FileReference;
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::storage::{StorageProvider, StorageUserInfo};

const TOKEN_ENDPOINT: &str = "https://oauth2.id-addressed.example.com/token";
const API_BASE: &str = "https://www.id-addressed.example.com/v3";
const UPLOAD_BASE: &str = "https://upload.id-addressed.example.com/v3/files";
const TOKEN_EXCHANGE_TIMEOUT_SECONDS: u64 = 30;
const LIST_TIMEOUT_SECONDS: u64 = 30;

const STANDARD_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/tiff", "image/heic"];
const DEFAULT_RAW_EXTENSIONS: &[&str] = &[
    ".dng", ".raw", ".cr2", ".cr3", ".nef", ".arw", ".orf", ".rw2",
];

/// Backend B: id-addressed storage over OAuth2. `list_files` queries by
/// MIME type and then re-filters results by extension to catch RAW
/// formats the backend reports generically as `application/octet-stream`
/// (§4.2). Tracks whether the access token was refreshed mid-invocation
/// so the caller can persist the refreshed bundle.
pub struct IdAddressedProvider {
    client: Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    access_token: RwLock<Option<String>>,
    token_was_refreshed: RwLock<bool>,
}

impl IdAddressedProvider {
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        Self {
            client: Client::new(),
            client_id,
            client_secret,
            refresh_token,
            access_token: RwLock::new(None),
            token_was_refreshed: RwLock::new(false),
        }
    }

    /// True once `access_token` has minted a new token this invocation.
    pub fn token_was_refreshed(&self) -> bool {
        *self.token_was_refreshed.read().unwrap()
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        if let Some(token) = self.access_token.read().unwrap().clone() {
            return Ok(token);
        }
        let response = self
            .client
            .post(TOKEN_ENDPOINT)
            .timeout(std::time::Duration::from_secs(TOKEN_EXCHANGE_TIMEOUT_SECONDS))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", &self.refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Auth(format!(
                "token refresh rejected with status {}",
                response.status()
            )));
        }
        let body: serde_json::Value = response.json().await?;
        let token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Protocol("token response missing access_token".into()))?
            .to_string();
        *self.access_token.write().unwrap() = Some(token.clone());
        *self.token_was_refreshed.write().unwrap() = true;
        Ok(token)
    }
}

#[async_trait]
impl StorageProvider for IdAddressedProvider {
    #[instrument(skip(self))]
    async fn connect(&mut self) -> Result<StorageUserInfo, ProviderError> {
        self.get_user_info().await
    }

    async fn list_files(
        &self,
        folder: &str,
        extensions: Option<&[&str]>,
        recursive: bool,
        max_files: Option<usize>,
    ) -> Result<Vec<FileReference>, ProviderError> {
        let token = self.access_token().await?;
        let mime_clause = STANDARD_MIME_TYPES
            .iter()
            .chain(std::iter::once(&"application/octet-stream"))
            .map(|mime| format!("mimeType = '{mime}'"))
            .collect::<Vec<_>>()
            .join(" or ");
        let query = if recursive {
            format!("'{folder}' in parents and trashed = false and ({mime_clause})")
        } else {
            format!("'{folder}' in parents and trashed = false and ({mime_clause})")
        };

        let response = self
            .client
            .get(format!("{API_BASE}/files"))
            .bearer_auth(token)
            .timeout(std::time::Duration::from_secs(LIST_TIMEOUT_SECONDS))
            .query(&[("q", query.as_str()), ("fields", "files(id,name,size)")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Network(response.error_for_status().unwrap_err()));
        }
        let body: serde_json::Value = response.json().await?;
        let entries = body
            .get("files")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::Protocol("file list response missing files".into()))?;

        let allowed_extensions: Vec<String> = extensions
            .map(|exts| exts.iter().map(|e| e.to_ascii_lowercase()).collect())
            .unwrap_or_else(|| DEFAULT_RAW_EXTENSIONS.iter().map(|e| e.to_string()).collect());

        let mut files = Vec::new();
        for entry in entries {
            let name = match entry.get("name").and_then(|v| v.as_str()) {
                Some(name) => name,
                None => continue,
            };
            let lower = name.to_ascii_lowercase();
            let matches_known_type = allowed_extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
                || entry
                    .get("mimeType")
                    .and_then(|v| v.as_str())
                    .map(|mime| STANDARD_MIME_TYPES.contains(&mime))
                    .unwrap_or(false);
            if !matches_known_type {
                continue;
            }
            let id = match entry.get("id").and_then(|v| v.as_str()) {
                Some(id) => id,
                None => continue,
            };
            let size = entry.get("size").and_then(|v| v.as_str()).and_then(|s| s.parse().ok());
            let mut reference = FileReference::new(id, name);
            if let Some(size) = size {
                reference = reference.with_size(size);
            }
            files.push(reference);
            if let Some(max) = max_files {
                if files.len() >= max {
                    break;
                }
            }
        }
        debug!(count = files.len(), "listed id-addressed files");
        Ok(files)
    }

    async fn download_file(&self, logical_id: &str) -> Result<Vec<u8>, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{API_BASE}/files/{logical_id}"))
            .bearer_auth(token)
            .query(&[("alt", "media")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::NotFound(logical_id.to_string()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Unsupported natively: downloads the whole object and slices in
    /// memory (§4.2).
    async fn download_file_partial(
        &self,
        logical_id: &str,
        start: u64,
        end: Option<u64>,
    ) -> Result<Vec<u8>, ProviderError> {
        let full = self.download_file(logical_id).await?;
        let start = start as usize;
        let end = end.map(|e| (e as usize + 1).min(full.len())).unwrap_or(full.len());
        Ok(full.get(start..end).map(<[u8]>::to_vec).unwrap_or_default())
    }

    async fn upload_file(
        &self,
        destination: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), ProviderError> {
        let (folder_id, filename) = destination.split_once('/').ok_or_else(|| {
            ProviderError::Validation(format!(
                "destination {destination} is not of the form <folder_id>/<filename>"
            ))
        })?;
        let token = self.access_token().await?;

        let existing_id = if overwrite {
            self.find_existing_file(&token, folder_id, filename).await?
        } else {
            None
        };

        let mime_type = mime_guess::from_path(filename).first_or_octet_stream();
        match existing_id {
            Some(file_id) => {
                let response = self
                    .client
                    .patch(format!("{UPLOAD_BASE}/{file_id}"))
                    .bearer_auth(token)
                    .query(&[("uploadType", "media")])
                    .header("Content-Type", mime_type.as_ref())
                    .body(bytes)
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(ProviderError::Permission(destination.to_string()));
                }
            }
            None => {
                let metadata = json!({ "name": filename, "parents": [folder_id] });
                let response = self
                    .client
                    .post(format!("{UPLOAD_BASE}?uploadType=multipart"))
                    .bearer_auth(token)
                    .multipart(
                        reqwest::multipart::Form::new()
                            .part(
                                "metadata",
                                reqwest::multipart::Part::text(metadata.to_string())
                                    .mime_str("application/json")
                                    .expect("static mime string is valid"),
                            )
                            .part(
                                "file",
                                reqwest::multipart::Part::bytes(bytes)
                                    .mime_str(mime_type.as_ref())
                                    .expect("guessed mime type is valid"),
                            ),
                    )
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(ProviderError::Permission(destination.to_string()));
                }
            }
        }
        Ok(())
    }

    async fn get_user_info(&self) -> Result<StorageUserInfo, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(format!("{API_BASE}/about"))
            .bearer_auth(token)
            .query(&[("fields", "user")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Auth("failed to fetch account info".into()));
        }
        let body: serde_json::Value = response.json().await?;
        Ok(StorageUserInfo {
            display_name: body
                .pointer("/user/displayName")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            email: body
                .pointer("/user/emailAddress")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            account_type: "standard".to_string(),
            namespace_id: None,
        })
    }
}

impl IdAddressedProvider {
    async fn find_existing_file(
        &self,
        token: &str,
        folder_id: &str,
        filename: &str,
    ) -> Result<Option<String>, ProviderError> {
        let query = format!("name = '{filename}' and '{folder_id}' in parents and trashed = false");
        let response = self
            .client
            .get(format!("{API_BASE}/files"))
            .bearer_auth(token)
            .query(&[("q", query.as_str()), ("fields", "files(id)")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::Network(response.error_for_status().unwrap_err()));
        }
        let body: serde_json::Value = response.json().await?;
        Ok(body
            .pointer("/files/0/id")
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }
}
