// [crates/providers/src/storage/path_addressed.rs]
use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use snapforge_models::FileReference;
use tracing::{debug, instrument};

use crate::error::ProviderError;
use crate::storage::{normalize_path, StorageProvider, StorageUserInfo};

const TOKEN_ENDPOINT: &str = "https://api.path-addressed.example.com/oauth2/token";
const API_BASE: &str = "https://api.path-addressed.example.com/2";
const CONTENT_BASE: &str = "https://content.path-addressed.example.com/2";
const SINGLE_SHOT_UPLOAD_LIMIT_BYTES: usize = 8 * 1024 * 1024;
const UPLOAD_CHUNK_BYTES: usize = 8 * 1024 * 1024;
const TOKEN_EXCHANGE_TIMEOUT_SECONDS: u64 = 30;
const LIST_TIMEOUT_SECONDS: u64 = 30;

/// Backend A: path-addressed storage with short-lived access tokens
/// minted from a refresh token, optional team-member impersonation, and a
/// chunked upload session protocol for files over 8 MiB (§4.2).
pub struct PathAddressedProvider {
    client: Client,
    refresh_token: String,
    app_key: String,
    app_secret: String,
    team_member_id: Option<String>,
    access_token: RwLock<Option<String>>,
    namespace_id: RwLock<Option<String>>,
}

impl PathAddressedProvider {
    pub fn new(
        refresh_token: String,
        app_key: String,
        app_secret: String,
        team_member_id: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            refresh_token,
            app_key,
            app_secret,
            team_member_id,
            access_token: RwLock::new(None),
            namespace_id: RwLock::new(None),
        }
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
                ("client_id", &self.app_key),
                ("client_secret", &self.app_secret),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Auth(format!(
                "token exchange rejected with status {}",
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
        Ok(token)
    }

    fn impersonation_headers(&self) -> serde_json::Value {
        match (&self.team_member_id, self.namespace_id.read().unwrap().clone()) {
            (Some(member_id), Some(namespace_id)) => json!({
                ".tag": "path_root",
                "member_id": member_id,
                "root": { ".tag": "namespace_id", "namespace_id": namespace_id },
            }),
            (Some(member_id), None) => json!({ ".tag": "user_id", "user_id": member_id }),
            (None, _) => json!(null),
        }
    }
}

#[async_trait]
impl StorageProvider for PathAddressedProvider {
    #[instrument(skip(self))]
    async fn connect(&mut self) -> Result<StorageUserInfo, ProviderError> {
        let info = self.get_user_info().await?;
        if let Some(namespace_id) = &info.namespace_id {
            *self.namespace_id.write().unwrap() = Some(namespace_id.clone());
        }
        Ok(info)
    }

    async fn list_files(
        &self,
        folder: &str,
        extensions: Option<&[&str]>,
        recursive: bool,
        max_files: Option<usize>,
    ) -> Result<Vec<FileReference>, ProviderError> {
        let token = self.access_token().await?;
        let path = normalize_path(folder);
        let response = self
            .client
            .post(format!("{API_BASE}/files/list_folder"))
            .bearer_auth(token)
            .timeout(std::time::Duration::from_secs(LIST_TIMEOUT_SECONDS))
            .json(&json!({ "path": path, "recursive": recursive }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(response.error_for_status().unwrap_err()));
        }

        let body: serde_json::Value = response.json().await?;
        let entries = body
            .get("entries")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::Protocol("list_folder response missing entries".into()))?;

        let mut files = Vec::new();
        for entry in entries {
            let name = match entry.get("name").and_then(|v| v.as_str()) {
                Some(name) => name,
                None => continue,
            };
            if let Some(allowed) = extensions {
                let lower = name.to_ascii_lowercase();
                if !allowed.iter().any(|ext| lower.ends_with(&ext.to_ascii_lowercase())) {
                    continue;
                }
            }
            let path_lower = entry
                .get("path_lower")
                .and_then(|v| v.as_str())
                .unwrap_or(name)
                .to_string();
            let size = entry.get("size").and_then(|v| v.as_u64());
            let mut reference = FileReference::new(path_lower, name);
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
        debug!(count = files.len(), "listed path-addressed files");
        Ok(files)
    }

    async fn download_file(&self, logical_id: &str) -> Result<Vec<u8>, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .post(format!("{CONTENT_BASE}/files/download"))
            .bearer_auth(token)
            .header("Dropbox-API-Arg", json!({ "path": logical_id }).to_string())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::NotFound(logical_id.to_string()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn download_file_partial(
        &self,
        logical_id: &str,
        start: u64,
        end: Option<u64>,
    ) -> Result<Vec<u8>, ProviderError> {
        let token = self.access_token().await?;
        let range = match end {
            Some(end) => format!("bytes={start}-{end}"),
            None => format!("bytes={start}-"),
        };
        let response = self
            .client
            .post(format!("{CONTENT_BASE}/files/download"))
            .bearer_auth(token)
            .header("Range", range)
            .header("Dropbox-API-Arg", json!({ "path": logical_id }).to_string())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::NotFound(logical_id.to_string()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn upload_file(
        &self,
        destination: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), ProviderError> {
        let destination = normalize_path(destination);
        let token = self.access_token().await?;
        let mode = if overwrite { "overwrite" } else { "add" };

        if bytes.len() <= SINGLE_SHOT_UPLOAD_LIMIT_BYTES {
            let response = self
                .client
                .post(format!("{CONTENT_BASE}/files/upload"))
                .bearer_auth(token)
                .header(
                    "Dropbox-API-Arg",
                    json!({ "path": destination, "mode": mode }).to_string(),
                )
                .header("Content-Type", "application/octet-stream")
                .body(bytes)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(ProviderError::Permission(destination));
            }
            return Ok(());
        }

        self.upload_chunked(&destination, bytes, mode, &token).await
    }

    async fn get_user_info(&self) -> Result<StorageUserInfo, ProviderError> {
        let token = self.access_token().await?;
        let mut request = self.client.post(format!("{API_BASE}/users/get_current_account"));
        let impersonation = self.impersonation_headers();
        if !impersonation.is_null() {
            request = request.header("Dropbox-API-Select-User", impersonation.to_string());
        }
        let response = request.bearer_auth(token).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Auth("failed to fetch account info".into()));
        }
        let body: serde_json::Value = response.json().await?;
        Ok(StorageUserInfo {
            display_name: body
                .pointer("/name/display_name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            email: body.get("email").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            account_type: body
                .pointer("/account_type/.tag")
                .and_then(|v| v.as_str())
                .unwrap_or("basic")
                .to_string(),
            namespace_id: body
                .pointer("/root_info/root_namespace_id")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

impl PathAddressedProvider {
    async fn upload_chunked(
        &self,
        destination: &str,
        bytes: Vec<u8>,
        mode: &str,
        token: &str,
    ) -> Result<(), ProviderError> {
        let chunks: Vec<&[u8]> = bytes.chunks(UPLOAD_CHUNK_BYTES).collect();
        let (first, rest) = chunks.split_first().ok_or_else(|| {
            ProviderError::Validation("cannot start an upload session for an empty file".into())
        })?;

        let start_response = self
            .client
            .post(format!("{CONTENT_BASE}/files/upload_session/start"))
            .bearer_auth(token)
            .header("Dropbox-API-Arg", json!({ "close": false }).to_string())
            .header("Content-Type", "application/octet-stream")
            .body(first.to_vec())
            .send()
            .await?;
        if !start_response.status().is_success() {
            return Err(ProviderError::Permission(destination.to_string()));
        }
        let session_body: serde_json::Value = start_response.json().await?;
        let session_id = session_body
            .get("session_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::Protocol("upload session missing session_id".into()))?
            .to_string();

        let mut offset = first.len() as u64;
        let last_index = rest.len().saturating_sub(1);
        for (index, chunk) in rest.iter().enumerate() {
            let is_last = index == last_index;
            if !is_last {
                let cursor = json!({ "session_id": session_id, "offset": offset });
                let response = self
                    .client
                    .post(format!("{CONTENT_BASE}/files/upload_session/append_v2"))
                    .bearer_auth(token)
                    .header(
                        "Dropbox-API-Arg",
                        json!({ "cursor": cursor, "close": false }).to_string(),
                    )
                    .header("Content-Type", "application/octet-stream")
                    .body(chunk.to_vec())
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(ProviderError::Permission(destination.to_string()));
                }
                offset += chunk.len() as u64;
            } else {
                let cursor = json!({ "session_id": session_id, "offset": offset });
                let commit = json!({ "path": destination, "mode": mode });
                let response = self
                    .client
                    .post(format!("{CONTENT_BASE}/files/upload_session/finish"))
                    .bearer_auth(token)
                    .header(
                        "Dropbox-API-Arg",
                        json!({ "cursor": cursor, "commit": commit }).to_string(),
                    )
                    .header("Content-Type", "application/octet-stream")
                    .body(chunk.to_vec())
                    .send()
                    .await?;
                if !response.status().is_success() {
                    return Err(ProviderError::Permission(destination.to_string()));
                }
            }
        }
        Ok(())
    }
}
