// [crates/providers/src/storage/mod.rs]
pub mod id_addressed;
pub mod path_addressed;

use async_trait::async_trait;
use snapforge_models::{FileReference, StorageCredentials, StorageProviderKind};

use crate::error::ProviderError;

/// Account metadata returned by `connect` (§4.2).
#[derive(Debug, Clone)]
pub struct StorageUserInfo {
    pub display_name: String,
    pub email: String,
    pub account_type: String,
    pub namespace_id: Option<String>,
}

/// The uniform contract both storage backend families implement (§4.2).
/// A single provider instance owns its session/client for the lifetime of
/// one invocation; it is never shared across invocations.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Idempotent: establishes a session and records user info.
    async fn connect(&mut self) -> Result<StorageUserInfo, ProviderError>;

    /// `extensions` filters case-insensitively; `max_files` caps the
    /// result length.
    async fn list_files(
        &self,
        folder: &str,
        extensions: Option<&[&str]>,
        recursive: bool,
        max_files: Option<usize>,
    ) -> Result<Vec<FileReference>, ProviderError>;

    async fn download_file(&self, logical_id: &str) -> Result<Vec<u8>, ProviderError>;

    /// `end` is inclusive; `None` means "to end of file". Providers
    /// without native range support fall back to a full download.
    async fn download_file_partial(
        &self,
        logical_id: &str,
        start: u64,
        end: Option<u64>,
    ) -> Result<Vec<u8>, ProviderError>;

    async fn upload_file(
        &self,
        destination: &str,
        bytes: Vec<u8>,
        overwrite: bool,
    ) -> Result<(), ProviderError>;

    async fn get_user_info(&self) -> Result<StorageUserInfo, ProviderError>;
}

/// Instantiates the storage backend a credential bundle selects. New
/// backends are expected to be rare (§9); this is a fixed, compile-time
/// registry, not a runtime plugin loader.
pub fn create_storage_provider(
    kind: StorageProviderKind,
    credentials: StorageCredentials,
) -> Result<Box<dyn StorageProvider>, ProviderError> {
    match (kind, credentials) {
        (
            StorageProviderKind::PathAddressed,
            StorageCredentials::PathAddressed {
                refresh_token,
                app_key,
                app_secret,
                team_member_id,
            },
        ) => Ok(Box::new(path_addressed::PathAddressedProvider::new(
            refresh_token,
            app_key,
            app_secret,
            team_member_id,
        ))),
        (
            StorageProviderKind::IdAddressed,
            StorageCredentials::IdAddressed {
                client_id,
                client_secret,
                refresh_token,
            },
        ) => Ok(Box::new(id_addressed::IdAddressedProvider::new(
            client_id,
            client_secret,
            refresh_token,
        ))),
        _ => Err(ProviderError::Validation(
            "storage provider selector does not match the supplied credential shape".to_string(),
        )),
    }
}

/// Normalizes a destination or source path the way both backends agree on
/// (§9 Open Questions): backslashes to forward slashes, a single leading
/// slash, collapsed duplicate slashes, no trailing slash (unless root),
/// lowercased. Idempotent: `normalize(normalize(p)) == normalize(p)`.
pub fn normalize_path(path: &str) -> String {
    let forward_slashes = path.replace('\\', "/");
    let mut collapsed = String::with_capacity(forward_slashes.len() + 1);
    collapsed.push('/');
    let mut previous_was_slash = true;
    for ch in forward_slashes.trim_start_matches('/').chars() {
        if ch == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        collapsed.push(ch);
    }
    if collapsed.len() > 1 && collapsed.ends_with('/') {
        collapsed.pop();
    }
    collapsed.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_is_idempotent() {
        let inputs = [
            "Listings\\123\\Photos//",
            "/already/normalized",
            "//double//slash///root",
            "/",
        ];
        for input in inputs {
            let once = normalize_path(input);
            let twice = normalize_path(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn normalize_path_lowercases_and_strips_trailing_slash() {
        assert_eq!(normalize_path("Listings/ABC/"), "/listings/abc");
    }
}
