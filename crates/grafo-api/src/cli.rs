//! Command-line arguments for the `grafo-api` binary.
//!
//! Flags override values from the optional YAML configuration file.
//!
//! ```bash
//! grafo-api --config grafo.yaml --bind 0.0.0.0:8080
//! ```

use crate::config::ServerConfig;
use crate::error::Result;
use clap::Parser;
use grafo::domain::GraphMode;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Grafo - HTTP service for shortest paths, max-flow, MST and sensitivity analysis
///
/// Graphs live in memory, one per session (`x-session-id` header).
/// Set GEMINI_API_KEY (or the variable named in the config file) to enable
/// narrative interpretations of sensitivity results.
#[derive(Parser, Debug, Clone)]
#[command(name = "grafo-api")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on (default 127.0.0.1:5000)
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Maximum number of session graphs kept in memory
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_sessions: Option<u32>,

    /// Start new session graphs in directed mode
    #[arg(long)]
    pub directed: bool,

    /// Never call the narrative service
    #[arg(long)]
    pub no_narrative: bool,
}

impl Args {
    /// Load the configuration file (if any) and apply flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub async fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path).await?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(max_sessions) = self.max_sessions {
            config.max_sessions = max_sessions as usize;
        }
        if self.directed {
            config.default_mode = GraphMode::Directed;
        }
        if self.no_narrative {
            config.narrative.enabled = false;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_defaults_without_flags() {
        let args = Args::try_parse_from(["grafo-api"]).unwrap();
        assert_eq!(args.into_config().await.unwrap(), ServerConfig::default());
    }

    #[tokio::test]
    async fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "bind: 0.0.0.0:9000\nmax-sessions: 4").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = Args::try_parse_from([
            "grafo-api",
            "--config",
            &path,
            "--bind",
            "127.0.0.1:7000",
            "--directed",
            "--no-narrative",
        ])
        .unwrap();
        let config = args.into_config().await.unwrap();

        assert_eq!(config.bind.port(), 7000);
        assert_eq!(config.max_sessions, 4);
        assert_eq!(config.default_mode, GraphMode::Directed);
        assert!(!config.narrative.enabled);
    }

    #[test]
    fn test_zero_sessions_flag_rejected() {
        assert!(Args::try_parse_from(["grafo-api", "--max-sessions", "0"]).is_err());
    }
}
