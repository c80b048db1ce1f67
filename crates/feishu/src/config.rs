use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::error::{Error, Result};

/// Account id that maps to the top-level `[channels.feishu]` section.
pub const DEFAULT_ACCOUNT_ID: &str = "default";

/// Which Open Platform deployment an app lives on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeishuDomain {
    /// open.feishu.cn (mainland China).
    #[default]
    Feishu,
    /// open.larksuite.com (international).
    Lark,
}

impl FeishuDomain {
    #[must_use]
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Feishu => "https://open.feishu.cn",
            Self::Lark => "https://open.larksuite.com",
        }
    }
}

/// Configuration for a single Feishu app account.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeishuAccountConfig {
    /// App ID from the developer console (`cli_...`).
    pub app_id: String,

    /// App secret.
    #[serde(serialize_with = "serialize_secret")]
    pub app_secret: Secret<String>,

    pub domain: FeishuDomain,

    /// Overrides the domain's API host (private deployments, tests).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl FeishuAccountConfig {
    /// API host without a trailing slash.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(self.domain.base_url())
            .trim_end_matches('/')
    }
}

impl std::fmt::Debug for FeishuAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuAccountConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for FeishuAccountConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: Secret::new(String::new()),
            domain: FeishuDomain::default(),
            base_url: None,
        }
    }
}

/// Resolve an account from the host configuration.
///
/// Reads `channels.feishu`; a named account under `channels.feishu.accounts`
/// overrides the top-level fields it sets and inherits the rest.
pub fn resolve_account(cfg: &Value, account_id: Option<&str>) -> Result<FeishuAccountConfig> {
    let Some(section) = cfg
        .get("channels")
        .and_then(|channels| channels.get("feishu"))
        .and_then(Value::as_object)
    else {
        return Err(Error::message("missing channels.feishu config section"));
    };

    let mut merged = section.clone();
    let accounts = merged.remove("accounts");

    if let Some(account_id) = account_id {
        let account = accounts
            .as_ref()
            .and_then(|accounts| accounts.get(account_id))
            .and_then(Value::as_object);
        match account {
            Some(overrides) => {
                for (key, value) in overrides {
                    merged.insert(key.clone(), value.clone());
                }
            },
            None if account_id == DEFAULT_ACCOUNT_ID => {},
            None => return Err(Error::unknown_account(account_id)),
        }
    }

    let config: FeishuAccountConfig = serde_json::from_value(Value::Object(merged))?;
    if config.app_id.is_empty() {
        return Err(Error::message("feishu app_id is not configured"));
    }
    Ok(config)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn host_config() -> Value {
        serde_json::json!({
            "channels": {
                "feishu": {
                    "app_id": "cli_main",
                    "app_secret": "main-secret",
                    "accounts": {
                        "intl": { "app_id": "cli_intl", "domain": "lark" }
                    }
                }
            }
        })
    }

    #[test]
    fn default_config() {
        let cfg = FeishuAccountConfig::default();
        assert_eq!(cfg.domain, FeishuDomain::Feishu);
        assert_eq!(cfg.api_base(), "https://open.feishu.cn");
        assert!(cfg.base_url.is_none());
    }

    #[test]
    fn resolves_top_level_section_without_account() {
        let cfg = resolve_account(&host_config(), None).unwrap();
        assert_eq!(cfg.app_id, "cli_main");
        assert_eq!(cfg.app_secret.expose_secret(), "main-secret");
        assert_eq!(cfg.domain, FeishuDomain::Feishu);
    }

    #[test]
    fn named_account_inherits_missing_fields() {
        let cfg = resolve_account(&host_config(), Some("intl")).unwrap();
        assert_eq!(cfg.app_id, "cli_intl");
        assert_eq!(cfg.app_secret.expose_secret(), "main-secret");
        assert_eq!(cfg.api_base(), "https://open.larksuite.com");
    }

    #[test]
    fn default_account_id_maps_to_top_level() {
        let cfg = resolve_account(&host_config(), Some(DEFAULT_ACCOUNT_ID)).unwrap();
        assert_eq!(cfg.app_id, "cli_main");
    }

    #[test]
    fn unknown_account_is_rejected() {
        let err = resolve_account(&host_config(), Some("nope")).unwrap_err();
        assert!(matches!(err, Error::UnknownAccount { ref account_id } if account_id == "nope"));
    }

    #[test]
    fn missing_section_is_rejected() {
        let err = resolve_account(&serde_json::json!({}), None).unwrap_err();
        assert!(err.to_string().contains("channels.feishu"));
    }

    #[test]
    fn missing_app_id_is_rejected() {
        let cfg = serde_json::json!({ "channels": { "feishu": { "app_secret": "s" } } });
        let err = resolve_account(&cfg, None).unwrap_err();
        assert!(err.to_string().contains("app_id"));
    }

    #[test]
    fn base_url_override_trims_trailing_slash() {
        let cfg = FeishuAccountConfig {
            base_url: Some("http://127.0.0.1:9000/".into()),
            ..Default::default()
        };
        assert_eq!(cfg.api_base(), "http://127.0.0.1:9000");
    }

    #[test]
    fn debug_redacts_secret() {
        let cfg = resolve_account(&host_config(), None).unwrap();
        let debug = format!("{cfg:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("main-secret"));
    }
}
