// [crates/credentials/src/mask.rs]
use serde_json::{json, Value};
use snapforge_models::{CredentialBundle, EnhancementCredentials, StorageCredentials};

/// Safe-log projection for one secret value (§4.5): `"<first4>...<last4>"`,
/// or `"***"` when the value is too short to mask without revealing most
/// of it.
pub fn mask_field(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "***".to_string()
    } else {
        let first: String = chars[..4].iter().collect();
        let last: String = chars[chars.len() - 4..].iter().collect();
        format!("{first}...{last}")
    }
}

/// A masked JSON projection of a credential bundle, safe to pass to a log
/// line. Plain (never-encrypted) fields such as `team_member_id` and
/// `email` are preserved verbatim, matching the envelope's own distinction
/// between secret and non-secret fields.
pub fn masked_bundle(bundle: &CredentialBundle) -> Value {
    json!({
        "tenant_id": bundle.tenant_id,
        "storage_provider": bundle.storage_provider,
        "storage_credentials": masked_storage(&bundle.storage_credentials),
        "enhancement_provider": bundle.enhancement_provider,
        "enhancement_credentials": masked_enhancement(&bundle.enhancement_credentials),
    })
}

fn masked_storage(credentials: &StorageCredentials) -> Value {
    match credentials {
        StorageCredentials::PathAddressed {
            refresh_token,
            app_key,
            app_secret,
            team_member_id,
        } => json!({
            "kind": "path_addressed",
            "refresh_token": mask_field(refresh_token),
            "app_key": mask_field(app_key),
            "app_secret": mask_field(app_secret),
            "team_member_id": team_member_id,
        }),
        StorageCredentials::IdAddressed {
            client_id,
            client_secret,
            refresh_token,
        } => json!({
            "kind": "id_addressed",
            "client_id": mask_field(client_id),
            "client_secret": mask_field(client_secret),
            "refresh_token": mask_field(refresh_token),
        }),
    }
}

fn masked_enhancement(credentials: &EnhancementCredentials) -> Value {
    match credentials {
        EnhancementCredentials::PollPresigned { api_key } => json!({
            "kind": "poll_presigned",
            "api_key": mask_field(api_key),
        }),
        EnhancementCredentials::WebhookS3 { api_key, email } => json!({
            "kind": "webhook_s3",
            "api_key": mask_field(api_key),
            "email": email,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_values_are_fully_masked() {
        assert_eq!(mask_field("short"), "***");
        assert_eq!(mask_field("12345678"), "***");
    }

    #[test]
    fn long_values_keep_only_the_edges() {
        assert_eq!(mask_field("abcdefghij"), "abcd...ghij");
    }

    #[test]
    fn masked_bundle_never_contains_the_plaintext_secret() {
        let bundle = CredentialBundle {
            tenant_id: "acme".to_string(),
            storage_provider: snapforge_models::StorageProviderKind::PathAddressed,
            storage_credentials: StorageCredentials::PathAddressed {
                refresh_token: "refresh-token-value-0001".to_string(),
                app_key: "app-key-value-0001".to_string(),
                app_secret: "app-secret-value-0001".to_string(),
                team_member_id: Some("dbmid:abc".to_string()),
            },
            enhancement_provider: snapforge_models::EnhancementProviderKind::PollPresigned,
            enhancement_credentials: EnhancementCredentials::PollPresigned {
                api_key: "fotello-api-key-0001".to_string(),
            },
        };
        let masked = masked_bundle(&bundle).to_string();
        assert!(!masked.contains("refresh-token-value-0001"));
        assert!(!masked.contains("app-secret-value-0001"));
        assert!(!masked.contains("fotello-api-key-0001"));
    }
}
