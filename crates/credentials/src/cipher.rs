// [crates/credentials/src/cipher.rs]
use fernet::Fernet;
use tracing::warn;

use crate::error::CredentialError;

/// Resolves and holds the symmetric key for one tenant (§4.5). The lookup
/// key is `CLIENT_<TENANT_UPPER>_ENCRYPTION_KEY`; the value is the
/// URL-safe base64 key a Fernet token was sealed with.
pub struct TenantCipher {
    fernet: Fernet,
}

impl TenantCipher {
    pub fn for_tenant(tenant_id: &str) -> Result<Self, CredentialError> {
        let env_key = format!(
            "CLIENT_{}_ENCRYPTION_KEY",
            tenant_id.to_ascii_uppercase().replace('-', "_")
        );
        let raw = std::env::var(&env_key)
            .map_err(|_| CredentialError::MissingTenantKey(tenant_id.to_string()))?;
        let fernet = Fernet::new(&raw)
            .ok_or_else(|| CredentialError::InvalidKeyEncoding(tenant_id.to_string()))?;
        Ok(Self { fernet })
    }

    /// Decrypts a single Fernet token into its plaintext field value.
    /// Never logs the token or the plaintext; a failure only names the
    /// field, never the value.
    pub fn decrypt_field(&self, field_name: &str, token: &str) -> Result<String, CredentialError> {
        let plaintext = self.fernet.decrypt(token).map_err(|_| {
            warn!(field = field_name, "credential field failed to decrypt");
            CredentialError::DecryptionFailed(field_name.to_string())
        })?;
        String::from_utf8(plaintext)
            .map_err(|_| CredentialError::DecryptionFailed(field_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_generated_key() {
        let key = Fernet::generate_key();
        let fernet = Fernet::new(&key).unwrap();
        let token = fernet.encrypt(b"super-secret-refresh-token");
        let cipher = TenantCipher { fernet };
        let plaintext = cipher.decrypt_field("refresh_token", &token).unwrap();
        assert_eq!(plaintext, "super-secret-refresh-token");
    }

    #[test]
    fn missing_env_var_is_reported_by_tenant() {
        let err = TenantCipher::for_tenant("no-such-tenant-xyz").unwrap_err();
        assert!(matches!(err, CredentialError::MissingTenantKey(_)));
    }
}
