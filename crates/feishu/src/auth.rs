use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::debug,
};

use crate::{
    config::FeishuAccountConfig,
    error::{Error, Result},
};

/// Tenant access tokens keyed by app id.
pub type TokenCache = tokio::sync::Mutex<HashMap<String, CachedAccessToken>>;

#[derive(Clone)]
pub struct CachedAccessToken {
    pub token: Secret<String>,
    pub expires_at: Instant,
}

impl CachedAccessToken {
    fn is_valid(&self) -> bool {
        let refresh_skew = Duration::from_secs(60);
        self.expires_at > Instant::now() + refresh_skew
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
    /// Seconds until expiry.
    expire: Option<u64>,
}

/// Return a cached tenant access token for the app, fetching a new one when
/// the cached token is missing or about to expire.
pub async fn get_tenant_access_token(
    client: &reqwest::Client,
    config: &FeishuAccountConfig,
    cache: &TokenCache,
) -> Result<Secret<String>> {
    {
        let guard = cache.lock().await;
        if let Some(token) = guard.get(&config.app_id)
            && token.is_valid()
        {
            return Ok(token.token.clone());
        }
    }

    let url = format!(
        "{}/open-apis/auth/v3/tenant_access_token/internal",
        config.api_base()
    );
    let body = serde_json::json!({
        "app_id": config.app_id,
        "app_secret": config.app_secret.expose_secret(),
    });

    let resp = client.post(url).json(&body).send().await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::message(format!(
            "feishu token request failed ({status}): {body}"
        )));
    }

    let body: TokenResponse = resp.json().await?;
    if body.code != 0 {
        return Err(Error::Api {
            code: body.code,
            msg: body.msg,
        });
    }
    let token = body
        .tenant_access_token
        .ok_or_else(|| Error::message("feishu token response missing tenant_access_token"))?;

    let ttl = body.expire.unwrap_or(7200).max(120);
    debug!(app_id = %config.app_id, ttl_secs = ttl, "feishu tenant token refreshed");
    let cached = CachedAccessToken {
        token: Secret::new(token),
        expires_at: Instant::now() + Duration::from_secs(ttl),
    };
    let token = cached.token.clone();

    let mut guard = cache.lock().await;
    guard.insert(config.app_id.clone(), cached);
    Ok(token)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: String) -> FeishuAccountConfig {
        FeishuAccountConfig {
            app_id: "cli_test".into(),
            app_secret: Secret::new("shh".into()),
            base_url: Some(base_url),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn token_is_fetched_once_and_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "app_id": "cli_test",
                "app_secret": "shh",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":0,"msg":"ok","tenant_access_token":"t-abc","expire":7200}"#)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let cfg = config(server.url());
        let cache = TokenCache::default();

        let first = get_tenant_access_token(&client, &cfg, &cache).await.unwrap();
        let second = get_tenant_access_token(&client, &cfg, &cache).await.unwrap();

        assert_eq!(first.expose_secret(), "t-abc");
        assert_eq!(second.expose_secret(), "t-abc");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn expiring_token_is_refreshed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .with_status(200)
            .with_body(r#"{"code":0,"msg":"ok","tenant_access_token":"t-new","expire":7200}"#)
            .expect(1)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let cfg = config(server.url());
        let cache = TokenCache::default();
        cache.lock().await.insert("cli_test".into(), CachedAccessToken {
            token: Secret::new("t-old".into()),
            expires_at: Instant::now() + Duration::from_secs(30),
        });

        let token = get_tenant_access_token(&client, &cfg, &cache).await.unwrap();
        assert_eq!(token.expose_secret(), "t-new");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_code_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .with_status(200)
            .with_body(r#"{"code":10003,"msg":"invalid param"}"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let err = get_tenant_access_token(&client, &config(server.url()), &TokenCache::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api { code: 10003, .. }));
    }

    #[tokio::test]
    async fn http_failure_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/open-apis/auth/v3/tenant_access_token/internal")
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let err = get_tenant_access_token(&client, &config(server.url()), &TokenCache::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
