use std::time::Duration;

use anyhow::Context as _;
use tracing::{info, warn};

use crate::schedule::HosConfig;

pub const DEFAULT_ORS_URL: &str = "https://api.openrouteservice.org";

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Without a key the binary plans against the offline mock router.
    pub ors_api_key: Option<String>,
    pub ors_url: String,
    pub http_timeout: Duration,
    pub rules: HosConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!("ignoring unreadable .env file: {err}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let ors_api_key = lookup("OPENROUTESERVICE_API_KEY").filter(|key| !key.trim().is_empty());
        let ors_url = lookup("OPENROUTESERVICE_URL").unwrap_or_else(|| DEFAULT_ORS_URL.to_string());
        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .with_context(|| format!("HTTP_TIMEOUT_SECS must be whole seconds, got {secs:?}"))?,
            ),
            None => Duration::from_secs(30),
        };
        let rules = match lookup("HOS_RULES_PATH") {
            Some(path) => {
                info!("loading HOS rules from {path}");
                HosConfig::load(&path)?
            }
            None => HosConfig::default(),
        };

        Ok(Self {
            ors_api_key,
            ors_url,
            http_timeout,
            rules,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::schedule::Enforcement;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.ors_api_key.is_none());
        assert_eq!(config.ors_url, DEFAULT_ORS_URL);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.rules, HosConfig::default());
    }

    #[test]
    fn test_overrides() {
        let path = std::env::temp_dir().join(format!("hos_rules_{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "avg_speed_mph": 55.0, "enforcement": "StopCadence" }"#).unwrap();
        let path_str = path.to_string_lossy().to_string();

        let config = AppConfig::from_lookup(lookup(&[
            ("OPENROUTESERVICE_API_KEY", "secret"),
            ("OPENROUTESERVICE_URL", "http://localhost:8080/ors"),
            ("HTTP_TIMEOUT_SECS", "5"),
            ("HOS_RULES_PATH", path_str.as_str()),
        ]))
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.ors_api_key.as_deref(), Some("secret"));
        assert_eq!(config.ors_url, "http://localhost:8080/ors");
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.rules.avg_speed_mph, 55.0);
        assert_eq!(config.rules.enforcement, Enforcement::StopCadence);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(AppConfig::from_lookup(lookup(&[("HTTP_TIMEOUT_SECS", "soon")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("HOS_RULES_PATH", "/nonexistent/rules.json")])).is_err());
        let blank = AppConfig::from_lookup(lookup(&[("OPENROUTESERVICE_API_KEY", " ")])).unwrap();
        assert!(blank.ors_api_key.is_none());
    }
}
