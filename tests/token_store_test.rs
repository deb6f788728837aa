use chrono::{Duration, TimeZone, Utc};
use std::fs;
use tempfile::TempDir;

use mymails::gmail_api::{Credential, FileTokenStore, PersistedToken, TokenStore};

fn credential() -> Credential {
    Credential {
        access_token: "ya29.access".to_string(),
        refresh_token: Some("1//refresh".to_string()),
        expiry: Utc.with_ymd_and_hms(2031, 5, 17, 8, 30, 0).unwrap(),
        scopes: vec![
            "https://www.googleapis.com/auth/gmail.send".to_string(),
            "https://www.googleapis.com/auth/gmail.readonly".to_string(),
        ],
        client_id: "client-id.apps.googleusercontent.com".to_string(),
        client_secret: "client-secret".to_string(),
        token_uri: "https://oauth2.googleapis.com/token".to_string(),
    }
}

#[test]
fn test_saved_credential_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let store = FileTokenStore::new(dir.path().join("Tokens").join("token.json"));
    let original = credential();

    store.save(&PersistedToken::from(&original)).unwrap();
    let reloaded = Credential::from(store.load().unwrap().expect("token should be on disk"));

    assert_eq!(reloaded.access_token, original.access_token);
    assert_eq!(reloaded.refresh_token, original.refresh_token);
    assert_eq!(reloaded.expiry, original.expiry);
    assert_eq!(reloaded.scopes, original.scopes);
    assert_eq!(reloaded, original);
}

#[test]
fn test_file_uses_authorized_user_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    let store = FileTokenStore::new(&path);

    store.save(&PersistedToken::from(&credential())).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["token"], "ya29.access");
    assert_eq!(value["refresh_token"], "1//refresh");
    assert_eq!(value["client_id"], "client-id.apps.googleusercontent.com");
    assert!(value["scopes"].is_array());
    assert!(value["expiry"].is_string());
}

#[test]
fn test_file_written_by_other_tools_is_accepted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    fs::write(
        &path,
        r#"{
            "token": "abc",
            "refresh_token": "def",
            "client_id": "id",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/gmail.send"],
            "universe_domain": "googleapis.com",
            "account": ""
        }"#,
    )
    .unwrap();

    let loaded = Credential::from(FileTokenStore::new(&path).load().unwrap().unwrap());

    assert_eq!(loaded.access_token, "abc");
    assert_eq!(loaded.token_uri, "https://oauth2.googleapis.com/token");
    // No expiry recorded means the token must be treated as stale
    assert!(loaded.is_expired());
    assert!(loaded.can_refresh());
}

#[test]
fn test_clear_removes_the_file() {
    let dir = TempDir::new().unwrap();
    let store = FileTokenStore::new(dir.path().join("token.json"));
    store.save(&PersistedToken::from(&credential())).unwrap();

    store.clear().unwrap();

    assert!(store.load().unwrap().is_none());
    // Clearing twice is fine
    store.clear().unwrap();
}

#[test]
fn test_persisted_token_round_trip_preserves_fresh_expiry() {
    let mut original = credential();
    original.expiry = Utc::now() + Duration::minutes(30);

    let back = Credential::from(PersistedToken::from(&original));

    assert_eq!(back.expiry, original.expiry);
    assert!(!back.is_expired());
}
