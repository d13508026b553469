//! Server configuration.
//!
//! Configuration comes from an optional YAML file; every field has a default
//! so an empty file (or no file) yields a working local server. Command-line
//! flags are applied on top by the binary.
//!
//! ```yaml
//! bind: 0.0.0.0:8080
//! max-sessions: 64
//! default-mode: directed
//! narrative:
//!   model: gemini-pro
//!   api-key-env: GEMINI_API_KEY
//!   timeout-secs: 20
//! ```

use crate::error::{Error, Result};
use grafo::domain::GraphMode;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default number of session graphs kept in memory.
pub const DEFAULT_MAX_SESSIONS: usize = 32;

/// Default narrative service base URL.
pub const DEFAULT_NARRATIVE_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default narrative model.
pub const DEFAULT_NARRATIVE_MODEL: &str = "gemini-pro";

/// Environment variable holding the narrative API key, unless overridden.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default narrative request timeout in seconds.
pub const DEFAULT_NARRATIVE_TIMEOUT_SECS: u64 = 30;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,

    /// Maximum number of session graphs cached before the oldest is evicted.
    pub max_sessions: usize,

    /// Mode given to newly created session graphs.
    pub default_mode: GraphMode,

    /// Narrative generation settings.
    pub narrative: NarrativeConfig,
}

/// Narrative generation section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct NarrativeConfig {
    /// Whether to call the narrative service at all.
    pub enabled: bool,

    /// Service base URL (without the `/models/...` suffix).
    pub endpoint: String,

    /// Model name.
    pub model: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            max_sessions: DEFAULT_MAX_SESSIONS,
            default_mode: GraphMode::Undirected,
            narrative: NarrativeConfig::default(),
        }
    }
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_NARRATIVE_ENDPOINT.to_string(),
            model: DEFAULT_NARRATIVE_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_NARRATIVE_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid YAML for this
    /// structure, or fails [`ServerConfig::validate`].
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config = Self::from_yaml(&content)?;
        tracing::debug!(path = %path.display(), bind = %config.bind, "Loaded config");
        Ok(config)
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on malformed YAML or invalid values.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document parses as null, not as an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == 0 {
            return Err(Error::Config("max-sessions must be at least 1".to_string()));
        }
        if self.narrative.timeout_secs == 0 {
            return Err(Error::Config(
                "narrative.timeout-secs must be at least 1".to_string(),
            ));
        }
        if self.narrative.enabled && self.narrative.endpoint.trim().is_empty() {
            return Err(Error::Config(
                "narrative.endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl NarrativeConfig {
    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API key through `lookup` (normally an environment read).
    ///
    /// Blank values count as unset.
    pub fn api_key_from(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        lookup(&self.api_key_env).filter(|key| !key.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ServerConfig::from_yaml("").unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ServerConfig::from_yaml("max-sessions: 4\ndefault-mode: directed\n").unwrap();
        assert_eq!(config.max_sessions, 4);
        assert_eq!(config.default_mode, GraphMode::Directed);
        assert_eq!(config.bind.port(), DEFAULT_PORT);
        assert_eq!(config.narrative.model, DEFAULT_NARRATIVE_MODEL);
    }

    #[test]
    fn test_nested_narrative_section() {
        let config = ServerConfig::from_yaml(
            "narrative:\n  enabled: false\n  timeout-secs: 5\n  api-key-env: MY_KEY\n",
        )
        .unwrap();
        assert!(!config.narrative.enabled);
        assert_eq!(config.narrative.timeout(), Duration::from_secs(5));
        assert_eq!(config.narrative.api_key_env, "MY_KEY");
    }

    #[test]
    fn test_zero_sessions_rejected() {
        let result = ServerConfig::from_yaml("max-sessions: 0\n");
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("max-sessions")));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            ServerConfig::from_yaml("colour: blue\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_api_key_lookup_ignores_blank_values() {
        let config = NarrativeConfig::default();
        assert_eq!(config.api_key_from(|_| Some("  ".to_string())), None);
        assert_eq!(
            config.api_key_from(|name| (name == DEFAULT_API_KEY_ENV).then(|| "k".to_string())),
            Some("k".to_string())
        );
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bind: 0.0.0.0:8080").unwrap();

        let config = ServerConfig::load(file.path()).await.unwrap();
        assert_eq!(config.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = ServerConfig::load(Path::new("/nonexistent/grafo.yaml")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
