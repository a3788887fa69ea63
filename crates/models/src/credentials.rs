// [crates/models/src/credentials.rs]
use serde::{Deserialize, Serialize};

use crate::{EnhancementProviderKind, StorageProviderKind};

/// A fully decrypted, ready-to-use credential bundle. Owned exclusively by
/// the invocation that decrypted it (§3 Ownership) and never logged in
/// this shape — only through `snapforge_credentials::mask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialBundle {
    pub tenant_id: String,
    pub storage_provider: StorageProviderKind,
    pub storage_credentials: StorageCredentials,
    pub enhancement_provider: EnhancementProviderKind,
    pub enhancement_credentials: EnhancementCredentials,
}

/// Decrypted storage credentials, one variant per backend family (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageCredentials {
    PathAddressed {
        refresh_token: String,
        app_key: String,
        app_secret: String,
        /// Plain, never encrypted (§4.5): scopes the session to a team
        /// member when an admin-impersonation account is used.
        #[serde(skip_serializing_if = "Option::is_none")]
        team_member_id: Option<String>,
    },
    IdAddressed {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

/// Decrypted enhancement credentials, one variant per backend family (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnhancementCredentials {
    PollPresigned { api_key: String },
    WebhookS3 {
        api_key: String,
        /// Plain, never encrypted (§9 Open Questions: email is not a
        /// secret, preserved as a deliberate spec choice).
        email: String,
    },
}
