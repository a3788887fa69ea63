// [tests/providers/factory.test.rs]
use snapforge_models::{
    EnhancementCredentials, EnhancementProviderKind, StorageCredentials, StorageProviderKind,
};
use snapforge_providers::{create_enhancement_provider, create_storage_provider, normalize_path, FileKind};

#[test]
fn creates_path_addressed_provider_from_matching_credentials() {
    let credentials = StorageCredentials::PathAddressed {
        refresh_token: "rt".to_string(),
        app_key: "ak".to_string(),
        app_secret: "as".to_string(),
        team_member_id: None,
    };
    let provider = create_storage_provider(StorageProviderKind::PathAddressed, credentials);
    assert!(provider.is_ok());
}

#[test]
fn rejects_mismatched_storage_selector_and_credential_shape() {
    let credentials = StorageCredentials::IdAddressed {
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: "rt".to_string(),
    };
    let provider = create_storage_provider(StorageProviderKind::PathAddressed, credentials);
    assert!(provider.is_err());
}

#[test]
fn creates_webhook_s3_enhancement_provider() {
    let credentials = EnhancementCredentials::WebhookS3 {
        api_key: "key".to_string(),
        email: "ops@example.com".to_string(),
    };
    let provider = create_enhancement_provider(EnhancementProviderKind::WebhookS3, credentials);
    assert!(provider.is_ok());
    assert!(provider.unwrap().is_connected());
}

#[test]
fn jpeg_fifty_mib_boundary_matches_the_spec_example() {
    let fifty_mib = 50 * 1024 * 1024;
    assert!(FileKind::Jpeg.is_within_size_limit(fifty_mib));
    assert!(!FileKind::Jpeg.is_within_size_limit(fifty_mib + 1));
}

#[test]
fn normalize_path_handles_mixed_separators() {
    assert_eq!(normalize_path("Listings\\42\\Enhanced\\"), "/listings/42/enhanced");
}
