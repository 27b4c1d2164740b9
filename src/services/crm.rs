// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Zoho CRM API client.
//!
//! Handles:
//! - Refresh-token exchange for a short-lived access token
//! - Setting the check-in flag on a deal record

use crate::config::Config;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Short-lived CRM access token. Never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Errors from a single CRM call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CrmError {
    /// The CRM answered with a non-success status.
    #[error("{status} - {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body was not what the CRM documents.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl CrmError {
    /// Whether repeating the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CrmError::Status { status, .. } => *status == 429 || *status >= 500,
            CrmError::Transport(_) => true,
            CrmError::Decode(_) => false,
        }
    }
}

/// The two CRM operations a check-in needs.
#[async_trait]
pub trait CrmApi: Send + Sync {
    /// Exchange the configured refresh token for an access token.
    async fn exchange_refresh_token(&self) -> Result<AccessToken, CrmError>;

    /// Set the check-in flag on a deal; returns the CRM response body.
    async fn update_deal(
        &self,
        token: &AccessToken,
        deal_id: &str,
    ) -> Result<serde_json::Value, CrmError>;
}

/// Token response from the Zoho accounts server.
///
/// Zoho reports some failures (e.g. `invalid_code`) with a 200 status and an
/// `error` field instead of a token.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[allow(dead_code)]
    expires_in: Option<u64>,
    error: Option<String>,
}

/// Zoho CRM client.
#[derive(Clone)]
pub struct ZohoClient {
    http: reqwest::Client,
    accounts_url: String,
    api_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    checkin_field: String,
}

impl ZohoClient {
    /// Create a client from the loaded configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.crm_timeout)
            .build()?;

        Ok(Self {
            http,
            accounts_url: config.crm_accounts_url.clone(),
            api_url: config.crm_api_url.clone(),
            client_id: config.crm_client_id.clone(),
            client_secret: config.crm_client_secret.clone(),
            refresh_token: config.crm_refresh_token.clone(),
            checkin_field: config.crm_checkin_field.clone(),
        })
    }

    /// JSON body for the deal update: `{"data":[{<field>: true}]}`.
    fn checkin_body(&self) -> serde_json::Value {
        let mut record = serde_json::Map::new();
        record.insert(self.checkin_field.clone(), serde_json::Value::Bool(true));
        serde_json::json!({ "data": [record] })
    }

    /// Turn a non-success response into `CrmError::Status`.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, CrmError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("CRM rate limit hit (429)");
        }

        Err(CrmError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl CrmApi for ZohoClient {
    async fn exchange_refresh_token(&self) -> Result<AccessToken, CrmError> {
        let url = format!("{}/oauth/v2/token", self.accounts_url);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        let response = Self::check_response(response).await?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CrmError::Decode(format!("token response: {}", e)))?;

        match (token.access_token, token.error) {
            (Some(access_token), _) if !access_token.is_empty() => {
                Ok(AccessToken::new(access_token))
            }
            (_, Some(error)) => Err(CrmError::Decode(format!("token endpoint error: {}", error))),
            _ => Err(CrmError::Decode(
                "token response has no access_token".to_string(),
            )),
        }
    }

    async fn update_deal(
        &self,
        token: &AccessToken,
        deal_id: &str,
    ) -> Result<serde_json::Value, CrmError> {
        let url = format!("{}/Deals/{}", self.api_url, deal_id);

        let response = self
            .http
            .put(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Zoho-oauthtoken {}", token.as_str()),
            )
            .json(&self.checkin_body())
            .send()
            .await
            .map_err(|e| CrmError::Transport(e.to_string()))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .map_err(|e| CrmError::Decode(format!("deal response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Form, Path};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{post, put};
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Serve `router` on an ephemeral local port; returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{}", addr)
    }

    fn client_for(base: &str) -> ZohoClient {
        let mut config = Config::test_default();
        config.crm_accounts_url = format!("{}/accounts", base);
        config.crm_api_url = format!("{}/crm/v8", base);
        ZohoClient::new(&config).unwrap()
    }

    fn token_route(status: StatusCode, body: &'static str) -> Router {
        Router::new().route(
            "/accounts/oauth/v2/token",
            post(move || async move { (status, body) }),
        )
    }

    #[tokio::test]
    async fn token_exchange_posts_refresh_grant_form() {
        let seen: Arc<Mutex<Option<HashMap<String, String>>>> = Arc::default();
        let router = Router::new().route(
            "/accounts/oauth/v2/token",
            post({
                let seen = seen.clone();
                move |Form(form): Form<HashMap<String, String>>| async move {
                    *seen.lock().unwrap() = Some(form);
                    Json(serde_json::json!({
                        "access_token": "1000.fresh",
                        "expires_in": 3600,
                        "token_type": "Bearer"
                    }))
                }
            }),
        );
        let client = client_for(&serve(router).await);

        let token = client.exchange_refresh_token().await.unwrap();

        assert_eq!(token.as_str(), "1000.fresh");
        let form = seen.lock().unwrap().clone().unwrap();
        assert_eq!(form["grant_type"], "refresh_token");
        assert_eq!(form["refresh_token"], "test_refresh_token");
        assert_eq!(form["client_id"], "test_client_id");
        assert_eq!(form["client_secret"], "test_client_secret");
    }

    #[tokio::test]
    async fn token_error_status_keeps_body() {
        let router = token_route(StatusCode::UNAUTHORIZED, r#"{"error":"invalid_client"}"#);
        let client = client_for(&serve(router).await);

        let err = client.exchange_refresh_token().await.unwrap_err();

        match err {
            CrmError::Status { status, ref body } => {
                assert_eq!(status, 401);
                assert_eq!(body, r#"{"error":"invalid_client"}"#);
            }
            ref other => panic!("expected status error, got {:?}", other),
        }
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn token_error_in_ok_response_is_decode_error() {
        let router = Router::new().route(
            "/accounts/oauth/v2/token",
            post(|| async { Json(serde_json::json!({ "error": "invalid_code" })) }),
        );
        let client = client_for(&serve(router).await);

        let err = client.exchange_refresh_token().await.unwrap_err();

        assert!(matches!(err, CrmError::Decode(ref msg) if msg.contains("invalid_code")));
    }

    #[tokio::test]
    async fn deal_update_puts_flag_with_oauth_header() {
        let seen: Arc<Mutex<Option<(String, String, serde_json::Value)>>> = Arc::default();
        let router = Router::new().route(
            "/crm/v8/Deals/{id}",
            put({
                let seen = seen.clone();
                move |Path(id): Path<String>,
                      headers: HeaderMap,
                      Json(body): Json<serde_json::Value>| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *seen.lock().unwrap() = Some((id.clone(), auth, body));
                    Json(serde_json::json!({
                        "data": [{ "code": "SUCCESS", "details": { "id": id } }]
                    }))
                }
            }),
        );
        let client = client_for(&serve(router).await);

        let response = client
            .update_deal(&AccessToken::new("1000.fresh"), "3250887001176218862")
            .await
            .unwrap();

        assert_eq!(response["data"][0]["code"], "SUCCESS");
        let (id, auth, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(id, "3250887001176218862");
        assert_eq!(auth, "Zoho-oauthtoken 1000.fresh");
        assert_eq!(body, serde_json::json!({ "data": [{ "checked_in": true }] }));
    }

    #[tokio::test]
    async fn deal_update_error_keeps_body() {
        let router = Router::new().route(
            "/crm/v8/Deals/{id}",
            put(|| async { (StatusCode::NOT_FOUND, "INVALID_DATA") }),
        );
        let client = client_for(&serve(router).await);

        let err = client
            .update_deal(&AccessToken::new("t"), "42")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "404 - INVALID_DATA");
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let router = token_route(StatusCode::SERVICE_UNAVAILABLE, "busy");
        let client = client_for(&serve(router).await);

        let err = client.exchange_refresh_token().await.unwrap_err();

        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn unreachable_crm_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(&format!("http://{}", addr));

        let err = client.exchange_refresh_token().await.unwrap_err();

        assert!(matches!(err, CrmError::Transport(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn checkin_body_uses_configured_field() {
        let mut config = Config::test_default();
        config.crm_checkin_field = "Visitor_Check_in".to_string();
        let client = ZohoClient::new(&config).unwrap();

        assert_eq!(
            client.checkin_body(),
            serde_json::json!({ "data": [{ "Visitor_Check_in": true }] })
        );
    }

    #[test]
    fn transient_classification() {
        let status = |status| CrmError::Status {
            status,
            body: String::new(),
        };

        assert!(status(500).is_transient());
        assert!(status(503).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(400).is_transient());
        assert!(!status(401).is_transient());
        assert!(CrmError::Transport("timeout".into()).is_transient());
        assert!(!CrmError::Decode("bad json".into()).is_transient());
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("1000.secret");
        assert!(!format!("{:?}", token).contains("secret"));
    }
}
