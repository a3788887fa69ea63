// [crates/credentials/src/error.rs]
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no encryption key configured for tenant {0}")]
    MissingTenantKey(String),

    #[error("encryption key for tenant {0} is not valid base64 or is the wrong length")]
    InvalidKeyEncoding(String),

    #[error("failed to decrypt field {0}")]
    DecryptionFailed(String),

    #[error("required credential field {0} is missing")]
    MissingField(String),

    #[error("could not determine storage provider from payload")]
    UnknownStorageProvider,

    #[error("could not determine enhancement provider from payload")]
    UnknownEnhancementProvider,

    #[error("payload value for field {0} is not a string")]
    NotAString(String),
}
