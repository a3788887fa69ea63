// [tests/credentials/envelope.test.rs]
use fernet::Fernet;
use serde_json::json;
use snapforge_credentials::{decrypt_credentials, mask_field, masked_bundle};

fn set_tenant_key(tenant: &str) -> String {
    let key = Fernet::generate_key();
    std::env::set_var(
        format!("CLIENT_{}_ENCRYPTION_KEY", tenant.to_ascii_uppercase()),
        &key,
    );
    key
}

#[test]
fn round_trip_encrypt_then_decrypt_returns_original_bytes() {
    let key = Fernet::generate_key();
    let fernet = Fernet::new(&key).unwrap();
    let token = fernet.encrypt(b"arbitrary credential bytes \x00\x01\x02");
    let plaintext = fernet.decrypt(&token).unwrap();
    assert_eq!(plaintext, b"arbitrary credential bytes \x00\x01\x02");
}

#[test]
fn full_envelope_decrypt_then_mask_never_exposes_plaintext() {
    let key = set_tenant_key("acme-envelope-test");
    let fernet = Fernet::new(&key).unwrap();

    let payload = json!({
        "dropbox_refresh_token_encrypted": fernet.encrypt(b"super-secret-refresh-0001"),
        "dropbox_app_key_encrypted": fernet.encrypt(b"super-secret-appkey-0001"),
        "dropbox_app_secret_encrypted": fernet.encrypt(b"super-secret-appsec-0001"),
        "fotello_api_key_encrypted": fernet.encrypt(b"super-secret-fotello-0001"),
    });

    let bundle = decrypt_credentials("acme-envelope-test", &payload, None, None).unwrap();
    let masked = masked_bundle(&bundle).to_string();

    assert!(!masked.contains("super-secret-refresh-0001"));
    assert!(!masked.contains("super-secret-appkey-0001"));
    assert!(!masked.contains("super-secret-appsec-0001"));
    assert!(!masked.contains("super-secret-fotello-0001"));
}

#[test]
fn mask_field_short_values_are_fully_redacted() {
    assert_eq!(mask_field("tiny"), "***");
}

#[test]
fn explicit_provider_selectors_override_field_sniffing() {
    let key = set_tenant_key("explicit-selector-test");
    let fernet = Fernet::new(&key).unwrap();

    let payload = json!({
        "storage_credentials": {
            "refresh_token_encrypted": fernet.encrypt(b"refresh-1"),
            "app_key_encrypted": fernet.encrypt(b"app-key-1"),
            "app_secret_encrypted": fernet.encrypt(b"app-secret-1"),
        },
        "enhancement_credentials": {
            "api_key_encrypted": fernet.encrypt(b"api-key-1"),
        },
    });

    let bundle = decrypt_credentials(
        "explicit-selector-test",
        &payload,
        Some("dropbox"),
        Some("fotello"),
    )
    .unwrap();

    assert_eq!(
        bundle.storage_provider,
        snapforge_models::StorageProviderKind::PathAddressed
    );
    assert_eq!(
        bundle.enhancement_provider,
        snapforge_models::EnhancementProviderKind::PollPresigned
    );
}
