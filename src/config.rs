//! Configuration for the spam radar
//!
//! Everything comes from the environment (or a `.env` file), with a TOML
//! file as an alternative. The two RPC endpoints are the only required
//! settings; startup aborts without them.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::assets::{reference_asset, ReferenceAsset};
use crate::error::{DetectorError, Result};
use crate::intel::{DEFAULT_FEED_URL, DEFAULT_PAGE_LIMIT};
use crate::state::JsonStateStore;

/// Scam-token detector whose alerts we consume
pub const DEFAULT_PEER_SOURCE_ID: &str =
    "0xd45f7183783f5893f4b8e187746eaf7294f73a3bb966500d237bd0d5978673fa";

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========== Network Settings ==========
    /// Ethereum mainnet RPC (balance checks)
    pub rpc_mainnet: String,

    /// Polygon RPC (balance checks)
    pub rpc_polygon: String,

    /// Timeout for feed and RPC HTTP calls
    pub http_timeout_secs: u64,

    // ========== State ==========
    /// Directory holding the state file
    pub state_dir: String,

    /// State file name
    pub state_file: String,

    // ========== Alert Feed ==========
    /// GraphQL endpoint of the alert explorer
    pub feed_api_url: String,

    /// Free-text queries run at initialization
    pub feed_queries: Vec<String>,

    /// Page size for the feed (a shorter page ends paging)
    pub feed_page_limit: usize,

    /// Detector whose alerts announce new scam tokens
    pub peer_source_id: String,

    // ========== Detection ==========
    /// Symbol of the asset whose holders we protect
    pub reference_asset: String,

    // ========== Runner ==========
    /// Seconds between polls in watch mode
    pub scan_interval_secs: u64,

    /// tracing filter directive
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            rpc_mainnet: env::var("JSON_RPC_MAINNET").unwrap_or_default(),
            rpc_polygon: env::var("JSON_RPC_MATIC").unwrap_or_default(),
            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),

            state_dir: env::var("STATE_DIR").unwrap_or(defaults.state_dir),
            state_file: env::var("STATE_FILE").unwrap_or(defaults.state_file),

            feed_api_url: env::var("FEED_API_URL").unwrap_or(defaults.feed_api_url),
            feed_queries: env::var("FEED_QUERIES")
                .map(|s| split_list(&s))
                .unwrap_or(defaults.feed_queries),
            feed_page_limit: env::var("FEED_PAGE_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.feed_page_limit),
            peer_source_id: env::var("PEER_SOURCE_ID").unwrap_or(defaults.peer_source_id),

            reference_asset: env::var("REFERENCE_ASSET").unwrap_or(defaults.reference_asset),

            scan_interval_secs: env::var("SCAN_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.scan_interval_secs),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| DetectorError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| DetectorError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Fails on anything that would make detection impossible
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("JSON_RPC_MAINNET", &self.rpc_mainnet),
            ("JSON_RPC_MATIC", &self.rpc_polygon),
        ] {
            if url.trim().is_empty() {
                return Err(DetectorError::Config(format!("{} not set", name)));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DetectorError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }

        if self.asset().is_none() {
            return Err(DetectorError::Config(format!(
                "Unknown REFERENCE_ASSET '{}' (expected SAND or LAND)",
                self.reference_asset
            )));
        }

        if self.feed_page_limit == 0 {
            return Err(DetectorError::Config(
                "FEED_PAGE_LIMIT must be positive".to_string(),
            ));
        }

        if self.peer_source_id.trim().is_empty() {
            return Err(DetectorError::Config("PEER_SOURCE_ID is empty".to_string()));
        }

        Ok(())
    }

    pub fn asset(&self) -> Option<ReferenceAsset> {
        reference_asset(&self.reference_asset)
    }

    pub fn state_store(&self) -> JsonStateStore {
        JsonStateStore::new(&self.state_dir, self.state_file.clone())
    }

    /// `RUST_LOG` when it parses, otherwise `log_level`, otherwise info
    pub fn log_filter(&self, rust_log: Option<&str>) -> EnvFilter {
        rust_log
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .or_else(|| EnvFilter::try_new(&self.log_level).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              SPAM RADAR - CONFIGURATION                    ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ NETWORK                                                    ║");
        println!("║ • Mainnet RPC:     {:^40} ║", configured(&self.rpc_mainnet));
        println!("║ • Polygon RPC:     {:^40} ║", configured(&self.rpc_polygon));
        println!("║ • HTTP Timeout:    {:>38} s ║", self.http_timeout_secs);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ DETECTION                                                  ║");
        println!("║ • Reference Asset: {:^40} ║", self.reference_asset);
        println!("║ • State File:      {:^40} ║", truncate(&format!("{}/{}", self.state_dir, self.state_file), 40));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ ALERT FEED                                                 ║");
        println!("║ • Queries:         {:^40} ║", truncate(&self.feed_queries.join(", "), 40));
        println!("║ • Page Limit:      {:^40} ║", self.feed_page_limit);
        println!("║ • Peer Source:     {:^40} ║", truncate(&self.peer_source_id, 40));
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_mainnet: String::new(),
            rpc_polygon: String::new(),
            http_timeout_secs: 10,
            state_dir: "./data".to_string(),
            state_file: "state.json".to_string(),
            feed_api_url: DEFAULT_FEED_URL.to_string(),
            feed_queries: vec!["sandbox".to_string(), "sand".to_string()],
            feed_page_limit: DEFAULT_PAGE_LIMIT,
            peer_source_id: DEFAULT_PEER_SOURCE_ID.to_string(),
            reference_asset: "SAND".to_string(),
            scan_interval_secs: 12,
            log_level: "info".to_string(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn configured(value: &str) -> &'static str {
    if value.is_empty() {
        "✗ Not Set"
    } else {
        "✓ Configured"
    }
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let head: String = value.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            rpc_mainnet: "https://eth.llamarpc.com".to_string(),
            rpc_polygon: "https://polygon-rpc.com".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed_page_limit, 100);
        assert_eq!(config.feed_queries, vec!["sandbox", "sand"]);
        assert_eq!(config.state_store().path(), Path::new("./data").join("state.json"));
    }

    #[test]
    fn test_missing_rpc_is_fatal() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("JSON_RPC_MAINNET"));

        let config = Config {
            rpc_polygon: String::new(),
            ..valid()
        };
        assert!(config.validate().unwrap_err().to_string().contains("JSON_RPC_MATIC"));
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid().validate().is_ok());

        let config = Config {
            reference_asset: "MANA".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radar.toml");

        valid().save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();

        assert_eq!(loaded.rpc_mainnet, "https://eth.llamarpc.com");
        assert_eq!(loaded.feed_queries, valid().feed_queries);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("radar.toml");
        fs::write(&path, "rpc_mainnet = \"https://a\"\nrpc_polygon = \"https://b\"\n").unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.state_file, "state.json");
        assert!(loaded.validate().is_ok());
    }

    fn debug_enabled(filter: EnvFilter) -> bool {
        use tracing_subscriber::layer::SubscriberExt;

        let subscriber = tracing_subscriber::registry().with(filter);
        tracing::subscriber::with_default(subscriber, || {
            tracing::enabled!(target: "spam_radar::detector", tracing::Level::DEBUG)
        })
    }

    #[test]
    fn test_log_level_debug_reaches_crate() {
        let config = Config {
            log_level: "debug".to_string(),
            ..valid()
        };
        assert!(debug_enabled(config.log_filter(None)));
        assert!(!debug_enabled(valid().log_filter(None)));
    }

    #[test]
    fn test_rust_log_wins_over_log_level() {
        let config = Config {
            log_level: "warn".to_string(),
            ..valid()
        };
        assert!(debug_enabled(config.log_filter(Some("spam_radar=debug"))));
        assert!(!debug_enabled(config.log_filter(Some("spam_radar=notalevel"))));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" sand, ,sandbox "), vec!["sand", "sandbox"]);
    }
}
