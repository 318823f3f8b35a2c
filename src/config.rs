//! Environment-driven configuration.
//!
//! Every section has a `Default` that reads environment variables, so a bare
//! `AppConfig::from_env()` is enough for local runs and tests.

use std::time::Duration;

pub use crate::database::DatabaseConfig;

const PLACEHOLDER_API_KEYS: &[&str] = &["your-eds-api-key", "your-actual-eds-api-key-here"];

/// EDS Open API access configuration.
#[derive(Debug, Clone)]
pub struct EdsConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Token-bucket refill rate, calls per second, shared process-wide.
    pub rate_per_sec: u32,
}

impl Default for EdsConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("EDS_API_BASE_URL")
                .unwrap_or_else(|_| "https://opendart.fss.or.kr".to_string()),
            api_key: std::env::var("EDS_API_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(
                std::env::var("EDS_API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            rate_per_sec: std::env::var("EDS_API_RATE_PER_SEC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl EdsConfig {
    /// Whether the client should answer with deterministic offline fixtures
    /// instead of calling EDS. Active when no real key is configured.
    pub fn mock_mode(&self) -> bool {
        let key = self.api_key.trim();
        key.is_empty() || PLACEHOLDER_API_KEYS.contains(&key)
    }

    /// API key with everything but the first and last four characters
    /// replaced, for log output.
    pub fn masked_api_key(&self) -> String {
        let key = self.api_key.trim();
        if key.len() > 8 {
            format!("{}****{}", &key[..4], &key[key.len() - 4..])
        } else {
            "unset-or-too-short".to_string()
        }
    }
}

/// Event bus topology: topic names, consumer group and partition count.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Inbound partner registration events, keyed by corp_code.
    pub partner_company_topic: String,
    /// Outbound restore notifications, keyed by partner UUID.
    pub partner_restore_topic: String,
    /// Legacy topics consumed no-op; kept so deployments can keep routing
    /// them here.
    pub company_profile_topic: String,
    pub disclosure_topic: String,
    pub consumer_group_id: String,
    pub partitions: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            partner_company_topic: std::env::var("BUS_TOPIC_PARTNER_COMPANY")
                .unwrap_or_else(|_| "partner-company-events".to_string()),
            partner_restore_topic: std::env::var("BUS_TOPIC_PARTNER_RESTORE")
                .unwrap_or_else(|_| "partner-company-restored".to_string()),
            company_profile_topic: std::env::var("BUS_TOPIC_COMPANY_PROFILE")
                .unwrap_or_else(|_| "company-profile-events".to_string()),
            disclosure_topic: std::env::var("BUS_TOPIC_DISCLOSURE")
                .unwrap_or_else(|_| "disclosure-events".to_string()),
            consumer_group_id: std::env::var("BUS_CONSUMER_GROUP_ID")
                .unwrap_or_else(|_| "eds-sync".to_string()),
            partitions: std::env::var("BUS_PARTITIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub eds: EdsConfig,
    pub bus: BusConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_key_enables_mock_mode() {
        let cfg = EdsConfig {
            api_key: "your-eds-api-key".to_string(),
            ..EdsConfig::default()
        };
        assert!(cfg.mock_mode());

        let cfg = EdsConfig {
            api_key: "   ".to_string(),
            ..EdsConfig::default()
        };
        assert!(cfg.mock_mode());

        let cfg = EdsConfig {
            api_key: "abcd1234efgh5678".to_string(),
            ..EdsConfig::default()
        };
        assert!(!cfg.mock_mode());
    }

    #[test]
    fn api_key_is_masked_in_logs() {
        let cfg = EdsConfig {
            api_key: "abcd1234efgh5678".to_string(),
            ..EdsConfig::default()
        };
        assert_eq!(cfg.masked_api_key(), "abcd****5678");

        let cfg = EdsConfig {
            api_key: "short".to_string(),
            ..EdsConfig::default()
        };
        assert_eq!(cfg.masked_api_key(), "unset-or-too-short");
    }
}
