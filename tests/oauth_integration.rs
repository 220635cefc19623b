// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Integration tests for the credential store refresh protocol
//!
//! These tests drive the refresh-token exchange against a mocked token
//! endpoint and verify the persistence-sink contract.

use anyhow::Result;
use async_trait::async_trait;
use mockito::Server;
use oura_mcp_server::errors::ApiError;
use oura_mcp_server::oauth::{CredentialStore, Credentials, TokenSink};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Records every `save` call so tests can assert on the persisted pairs.
#[derive(Clone, Default)]
struct RecordingSink {
    saved: Arc<Mutex<Vec<(String, Option<String>)>>>,
}

#[async_trait]
impl TokenSink for RecordingSink {
    async fn save(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        self.saved
            .lock()
            .unwrap()
            .push((access_token.to_string(), refresh_token.map(String::from)));
        Ok(())
    }
}

/// A sink whose storage is broken; refresh must still succeed in memory.
struct FailingSink;

#[async_trait]
impl TokenSink for FailingSink {
    async fn save(&self, _access_token: &str, _refresh_token: Option<&str>) -> Result<()> {
        anyhow::bail!("disk full")
    }
}

fn refreshable_credentials() -> Credentials {
    Credentials {
        access_token: "old_access".to_string(),
        refresh_token: Some("old_refresh".to_string()),
        client_id: Some("client_id".to_string()),
        client_secret: Some("client_secret".to_string()),
    }
}

#[tokio::test]
async fn test_refresh_rotates_tokens_and_persists_once() -> Result<()> {
    let mut server = Server::new_async().await;

    let token_endpoint = server
        .mock("POST", "/oauth/token")
        .match_body(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            mockito::Matcher::UrlEncoded("refresh_token".into(), "old_refresh".into()),
            mockito::Matcher::UrlEncoded("client_id".into(), "client_id".into()),
            mockito::Matcher::UrlEncoded("client_secret".into(), "client_secret".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "access_token": "new_access",
                "token_type": "Bearer",
                "expires_in": 86400,
                "refresh_token": "new_refresh"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let sink = RecordingSink::default();
    let store = CredentialStore::new(refreshable_credentials(), Some(Box::new(sink.clone())))?
        .with_token_url(format!("{}/oauth/token", server.url()));

    store
        .refresh("old_access")
        .await
        .expect("refresh should succeed");

    assert_eq!(store.current_access_token().await, "new_access");

    let saved = sink.saved.lock().unwrap();
    assert_eq!(
        *saved,
        vec![("new_access".to_string(), Some("new_refresh".to_string()))]
    );

    token_endpoint.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_refresh_keeps_old_refresh_token_when_not_rotated() -> Result<()> {
    let mut server = Server::new_async().await;

    // Some authorization servers omit refresh_token when it is unchanged
    let _token_endpoint = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_body(json!({"access_token": "new_access", "token_type": "Bearer"}).to_string())
        .create_async()
        .await;

    let sink = RecordingSink::default();
    let store = CredentialStore::new(refreshable_credentials(), Some(Box::new(sink.clone())))?
        .with_token_url(format!("{}/oauth/token", server.url()));

    store.refresh("old_access").await?;

    let saved = sink.saved.lock().unwrap();
    assert_eq!(
        *saved,
        vec![("new_access".to_string(), Some("old_refresh".to_string()))]
    );
    Ok(())
}

#[tokio::test]
async fn test_rejected_refresh_leaves_credentials_untouched() -> Result<()> {
    let mut server = Server::new_async().await;

    let token_endpoint = server
        .mock("POST", "/oauth/token")
        .with_status(400)
        .with_body(
            json!({
                "error": "invalid_grant",
                "error_description": "refresh token already used"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let sink = RecordingSink::default();
    let store = CredentialStore::new(refreshable_credentials(), Some(Box::new(sink.clone())))?
        .with_token_url(format!("{}/oauth/token", server.url()));

    let result = store.refresh("old_access").await;
    match result {
        Err(ApiError::Auth { detail }) => {
            assert!(detail.contains("token refresh rejected"));
            assert!(detail.contains("refresh token already used"));
        }
        other => panic!("expected Auth error, got {other:?}"),
    }

    assert_eq!(store.current_access_token().await, "old_access");
    assert!(sink.saved.lock().unwrap().is_empty());

    token_endpoint.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_malformed_token_response_leaves_credentials_untouched() -> Result<()> {
    let mut server = Server::new_async().await;

    let _token_endpoint = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_body("<html>gateway error</html>")
        .create_async()
        .await;

    let sink = RecordingSink::default();
    let store = CredentialStore::new(refreshable_credentials(), Some(Box::new(sink.clone())))?
        .with_token_url(format!("{}/oauth/token", server.url()));

    let result = store.refresh("old_access").await;
    match result {
        Err(ApiError::Auth { detail }) => {
            assert!(detail.contains("malformed token response"));
        }
        other => panic!("expected Auth error, got {other:?}"),
    }

    assert_eq!(store.current_access_token().await, "old_access");
    assert!(sink.saved.lock().unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sink_failure_does_not_fail_the_refresh() -> Result<()> {
    let mut server = Server::new_async().await;

    let _token_endpoint = server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_body(json!({"access_token": "new_access", "token_type": "Bearer"}).to_string())
        .create_async()
        .await;

    let store = CredentialStore::new(refreshable_credentials(), Some(Box::new(FailingSink)))?
        .with_token_url(format!("{}/oauth/token", server.url()));

    store
        .refresh("old_access")
        .await
        .expect("refresh should survive a failing sink");
    assert_eq!(store.current_access_token().await, "new_access");
    Ok(())
}
