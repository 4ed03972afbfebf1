//! Prodibot configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProdibotConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl Default for ProdibotConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            gateway: GatewayConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl ProdibotConfig {
    /// Load config from the default path (~/.prodibot/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::ProdibotError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::ProdibotError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::ProdibotError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Prodibot home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".prodibot")
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path. Empty means ~/.prodibot/prodibot.db.
    #[serde(default)]
    pub path: String,
}

impl DatabaseConfig {
    /// Resolve the database path, falling back to the home-dir default.
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.is_empty() {
            ProdibotConfig::home_dir().join("prodibot.db")
        } else {
            PathBuf::from(&self.path)
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: String::new() }
    }
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 3000 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Chat behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Reply used when no knowledge entry scores above the threshold.
    #[serde(default = "default_response")]
    pub default_response: String,
    /// Minimum raw score for a knowledge entry to count as a match.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
    /// Label prepended to a matched entry's related link.
    #[serde(default = "default_link_label")]
    pub link_label: String,
    /// Whether sessions' messages are written to the database. Deployments
    /// that must not retain visitor text set this to false; the bot still
    /// answers, but history and feedback are unavailable.
    #[serde(default = "bool_true")]
    pub persist_history: bool,
}

fn bool_true() -> bool { true }
fn default_score_threshold() -> f64 { 2.0 }
fn default_link_label() -> String { "Info lebih lanjut".into() }
fn default_response() -> String {
    "Terima kasih atas pertanyaannya. Untuk informasi lebih lanjut, silakan \
     hubungi kami melalui halaman Kontak atau email ke prodi@universitas.ac.id"
        .into()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_response: default_response(),
            score_threshold: default_score_threshold(),
            link_label: default_link_label(),
            persist_history: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProdibotConfig::default();
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert!((config.chat.score_threshold - 2.0).abs() < f64::EPSILON);
        assert!(config.chat.persist_history);
        assert!(config.chat.default_response.contains("Kontak"));
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [gateway]
            port = 8080

            [chat]
            score_threshold = 3.5
            persist_history = false
            default_response = "Silakan hubungi kami."
        "#;

        let config: ProdibotConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert!((config.chat.score_threshold - 3.5).abs() < f64::EPSILON);
        assert!(!config.chat.persist_history);
        assert_eq!(config.chat.default_response, "Silakan hubungi kami.");
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: ProdibotConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.chat.link_label, "Info lebih lanjut");
    }

    #[test]
    fn test_database_path_fallback() {
        let config = ProdibotConfig::default();
        let path = config.database.resolved_path();
        assert!(path.to_string_lossy().contains("prodibot"));

        let explicit = DatabaseConfig { path: "/tmp/chat.db".into() };
        assert_eq!(explicit.resolved_path(), PathBuf::from("/tmp/chat.db"));
    }
}
