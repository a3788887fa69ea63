// [crates/credentials/src/envelope.rs]
use serde_json::Value;
use snapforge_models::{
    CredentialBundle, EnhancementCredentials, EnhancementProviderKind, StorageCredentials,
    StorageProviderKind,
};

use crate::cipher::TenantCipher;
use crate::error::CredentialError;

/// Decrypts a gateway request payload into a ready-to-use credential
/// bundle (§4.5). Accepts both accepted payload shapes without requiring
/// the caller to know which one was used: legacy flat fields named
/// `<service>_<field>_encrypted`, or a nested `storage_credentials` /
/// `enhancement_credentials` object whose keys are `<field>_encrypted`.
pub fn decrypt_credentials(
    tenant_id: &str,
    payload: &Value,
    explicit_storage_provider: Option<&str>,
    explicit_enhancement_provider: Option<&str>,
) -> Result<CredentialBundle, CredentialError> {
    let cipher = TenantCipher::for_tenant(tenant_id)?;

    let storage_provider = resolve_storage_provider(payload, explicit_storage_provider)?;
    let enhancement_provider = resolve_enhancement_provider(payload, explicit_enhancement_provider)?;

    let storage_credentials =
        decrypt_storage_credentials(&cipher, payload, storage_provider)?;
    let enhancement_credentials =
        decrypt_enhancement_credentials(&cipher, payload, enhancement_provider)?;

    Ok(CredentialBundle {
        tenant_id: tenant_id.to_string(),
        storage_provider,
        storage_credentials,
        enhancement_provider,
        enhancement_credentials,
    })
}

/// Decrypts only the storage half of a credential envelope (§6): the
/// discovery stage never receives enhancement credentials, so it cannot
/// go through `decrypt_credentials`, which requires both halves.
pub fn decrypt_storage_only(
    tenant_id: &str,
    payload: &Value,
    explicit_storage_provider: Option<&str>,
) -> Result<(StorageProviderKind, StorageCredentials), CredentialError> {
    let cipher = TenantCipher::for_tenant(tenant_id)?;
    let provider = resolve_storage_provider(payload, explicit_storage_provider)?;
    let credentials = decrypt_storage_credentials(&cipher, payload, provider)?;
    Ok((provider, credentials))
}

fn resolve_storage_provider(
    payload: &Value,
    explicit: Option<&str>,
) -> Result<StorageProviderKind, CredentialError> {
    if let Some(selector) = explicit {
        return match selector.to_ascii_lowercase().as_str() {
            "dropbox" | "path_addressed" => Ok(StorageProviderKind::PathAddressed),
            "google_drive" | "id_addressed" => Ok(StorageProviderKind::IdAddressed),
            _ => Err(CredentialError::UnknownStorageProvider),
        };
    }

    if has_key(payload, "dropbox_refresh_token_encrypted")
        || has_key(payload, "dropbox_app_key_encrypted")
    {
        return Ok(StorageProviderKind::PathAddressed);
    }
    if has_key(payload, "google_drive_client_id_encrypted") {
        return Ok(StorageProviderKind::IdAddressed);
    }

    if let Some(nested) = payload.get("storage_credentials") {
        if has_key(nested, "app_key_encrypted") {
            return Ok(StorageProviderKind::PathAddressed);
        }
        if has_key(nested, "client_id_encrypted") {
            return Ok(StorageProviderKind::IdAddressed);
        }
    }

    Err(CredentialError::UnknownStorageProvider)
}

fn resolve_enhancement_provider(
    payload: &Value,
    explicit: Option<&str>,
) -> Result<EnhancementProviderKind, CredentialError> {
    if let Some(selector) = explicit {
        return match selector.to_ascii_lowercase().as_str() {
            "fotello" | "poll_presigned" => Ok(EnhancementProviderKind::PollPresigned),
            "autohdr" | "webhook_s3" => Ok(EnhancementProviderKind::WebhookS3),
            _ => Err(CredentialError::UnknownEnhancementProvider),
        };
    }

    if has_key(payload, "autohdr_api_key_encrypted") || has_key(payload, "autohdr_email") {
        return Ok(EnhancementProviderKind::WebhookS3);
    }
    if has_key(payload, "fotello_api_key_encrypted") {
        return Ok(EnhancementProviderKind::PollPresigned);
    }

    if let Some(nested) = payload.get("enhancement_credentials") {
        if has_key(nested, "email") {
            return Ok(EnhancementProviderKind::WebhookS3);
        }
        if has_key(nested, "api_key_encrypted") {
            return Ok(EnhancementProviderKind::PollPresigned);
        }
    }

    Err(CredentialError::UnknownEnhancementProvider)
}

fn decrypt_storage_credentials(
    cipher: &TenantCipher,
    payload: &Value,
    provider: StorageProviderKind,
) -> Result<StorageCredentials, CredentialError> {
    match provider {
        StorageProviderKind::PathAddressed => {
            let refresh_token = decrypt_required(
                cipher,
                payload,
                "storage_credentials",
                "dropbox",
                "refresh_token",
            )?;
            let app_key =
                decrypt_required(cipher, payload, "storage_credentials", "dropbox", "app_key")?;
            let app_secret = decrypt_required(
                cipher,
                payload,
                "storage_credentials",
                "dropbox",
                "app_secret",
            )?;
            let team_member_id = plain_field(payload, "storage_credentials", "dropbox", "team_member_id");
            Ok(StorageCredentials::PathAddressed {
                refresh_token,
                app_key,
                app_secret,
                team_member_id,
            })
        }
        StorageProviderKind::IdAddressed => {
            let client_id = decrypt_required(
                cipher,
                payload,
                "storage_credentials",
                "google_drive",
                "client_id",
            )?;
            let client_secret = decrypt_required(
                cipher,
                payload,
                "storage_credentials",
                "google_drive",
                "client_secret",
            )?;
            let refresh_token = decrypt_required(
                cipher,
                payload,
                "storage_credentials",
                "google_drive",
                "refresh_token",
            )?;
            Ok(StorageCredentials::IdAddressed {
                client_id,
                client_secret,
                refresh_token,
            })
        }
    }
}

fn decrypt_enhancement_credentials(
    cipher: &TenantCipher,
    payload: &Value,
    provider: EnhancementProviderKind,
) -> Result<EnhancementCredentials, CredentialError> {
    match provider {
        EnhancementProviderKind::PollPresigned => {
            let api_key = decrypt_required(
                cipher,
                payload,
                "enhancement_credentials",
                "fotello",
                "api_key",
            )?;
            Ok(EnhancementCredentials::PollPresigned { api_key })
        }
        EnhancementProviderKind::WebhookS3 => {
            let api_key = decrypt_required(
                cipher,
                payload,
                "enhancement_credentials",
                "autohdr",
                "api_key",
            )?;
            let email = plain_field(payload, "enhancement_credentials", "autohdr", "email")
                .ok_or_else(|| CredentialError::MissingField("autohdr_email".to_string()))?;
            Ok(EnhancementCredentials::WebhookS3 { api_key, email })
        }
    }
}

/// Reads and decrypts one field, trying the nested shape first, then the
/// legacy flat shape. Fails with `MissingField` if neither is present.
fn decrypt_required(
    cipher: &TenantCipher,
    payload: &Value,
    nested_object_key: &str,
    flat_prefix: &str,
    field_name: &str,
) -> Result<String, CredentialError> {
    let token = nested_str(payload, nested_object_key, &format!("{field_name}_encrypted"))
        .or_else(|| flat_str(payload, &format!("{flat_prefix}_{field_name}_encrypted")))
        .ok_or_else(|| CredentialError::MissingField(format!("{flat_prefix}_{field_name}")))?;
    cipher.decrypt_field(&format!("{flat_prefix}_{field_name}"), token)
}

/// Reads a plain (never-encrypted) field, nested shape first, then flat.
fn plain_field(
    payload: &Value,
    nested_object_key: &str,
    flat_prefix: &str,
    field_name: &str,
) -> Option<String> {
    nested_str(payload, nested_object_key, field_name)
        .or_else(|| flat_str(payload, &format!("{flat_prefix}_{field_name}")))
        .map(str::to_string)
}

fn nested_str<'a>(payload: &'a Value, object_key: &str, field_key: &str) -> Option<&'a str> {
    payload.get(object_key)?.get(field_key)?.as_str()
}

fn flat_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key)?.as_str()
}

fn has_key(value: &Value, key: &str) -> bool {
    value.get(key).map(|v| !v.is_null()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fernet::Fernet;
    use serde_json::json;

    fn set_tenant_key(tenant: &str, key: &str) {
        std::env::set_var(
            format!("CLIENT_{}_ENCRYPTION_KEY", tenant.to_ascii_uppercase()),
            key,
        );
    }

    #[test]
    fn decrypts_legacy_flat_path_addressed_and_fotello() {
        let key = Fernet::generate_key();
        set_tenant_key("acme", &key);
        let fernet = Fernet::new(&key).unwrap();

        let payload = json!({
            "dropbox_refresh_token_encrypted": fernet.encrypt(b"refresh-1"),
            "dropbox_app_key_encrypted": fernet.encrypt(b"app-key-1"),
            "dropbox_app_secret_encrypted": fernet.encrypt(b"app-secret-1"),
            "dropbox_team_member_id": "dbmid:xyz",
            "fotello_api_key_encrypted": fernet.encrypt(b"fotello-key-1"),
        });

        let bundle = decrypt_credentials("acme", &payload, None, None).unwrap();
        match bundle.storage_credentials {
            StorageCredentials::PathAddressed {
                refresh_token,
                team_member_id,
                ..
            } => {
                assert_eq!(refresh_token, "refresh-1");
                assert_eq!(team_member_id.as_deref(), Some("dbmid:xyz"));
            }
            _ => panic!("expected path-addressed credentials"),
        }
        assert_eq!(bundle.storage_provider, StorageProviderKind::PathAddressed);
        assert_eq!(
            bundle.enhancement_provider,
            EnhancementProviderKind::PollPresigned
        );
    }

    #[test]
    fn decrypts_nested_id_addressed_and_webhook_s3() {
        let key = Fernet::generate_key();
        set_tenant_key("beta", &key);
        let fernet = Fernet::new(&key).unwrap();

        let payload = json!({
            "storage_credentials": {
                "client_id_encrypted": fernet.encrypt(b"client-id-1"),
                "client_secret_encrypted": fernet.encrypt(b"client-secret-1"),
                "refresh_token_encrypted": fernet.encrypt(b"refresh-token-1"),
            },
            "enhancement_credentials": {
                "api_key_encrypted": fernet.encrypt(b"autohdr-key-1"),
                "email": "ops@beta.example",
            },
        });

        let bundle = decrypt_credentials("beta", &payload, None, None).unwrap();
        assert_eq!(bundle.storage_provider, StorageProviderKind::IdAddressed);
        match bundle.enhancement_credentials {
            EnhancementCredentials::WebhookS3 { api_key, email } => {
                assert_eq!(api_key, "autohdr-key-1");
                assert_eq!(email, "ops@beta.example");
            }
            _ => panic!("expected webhook s3 credentials"),
        }
    }

    #[test]
    fn missing_provider_signal_is_reported() {
        let key = Fernet::generate_key();
        set_tenant_key("gamma", &key);
        let payload = json!({});
        let err = decrypt_credentials("gamma", &payload, None, None).unwrap_err();
        assert!(matches!(err, CredentialError::UnknownStorageProvider));
    }
}
