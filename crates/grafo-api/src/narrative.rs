//! Narrative interpretation of sensitivity results.
//!
//! The interpretation is produced by an external text-generation service
//! behind the [`Narrator`] trait. It is an optional enrichment: callers treat
//! any error as "no interpretation" and keep the numeric results.

use crate::config::NarrativeConfig;
use crate::error::{Error, Result};
use crate::models::SensitivityRow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Produces a free-text reading of sensitivity results.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Interpret `results` (baseline first, then one row per perturbation).
    async fn interpret(&self, results: &[SensitivityRow]) -> Result<String>;
}

/// Narrator used when no service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNarrator;

#[async_trait]
impl Narrator for DisabledNarrator {
    async fn interpret(&self, _results: &[SensitivityRow]) -> Result<String> {
        Err(Error::NarrativeDisabled)
    }
}

/// Client for a Gemini-style `generateContent` endpoint.
///
/// Requests are blocking `ureq` calls moved onto tokio's blocking pool. The
/// API key travels in the `x-goog-api-key` header, never in the URL, so it
/// cannot leak into logged error messages.
pub struct GeminiNarrator {
    agent: ureq::Agent,
    url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiNarrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiNarrator")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiNarrator {
    /// Create a client for the configured endpoint and model.
    #[must_use]
    pub fn new(config: &NarrativeConfig, api_key: String) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        Self {
            agent,
            url,
            api_key,
        }
    }

    /// Full `generateContent` URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Narrator for GeminiNarrator {
    async fn interpret(&self, results: &[SensitivityRow]) -> Result<String> {
        let prompt = build_prompt(results)?;
        let agent = self.agent.clone();
        let url = self.url.clone();
        let api_key = self.api_key.clone();

        debug!(url = %url, rows = results.len(), "Requesting narrative");
        tokio::task::spawn_blocking(move || generate(&agent, &url, &api_key, prompt))
            .await
            .map_err(|e| Error::Narrative(format!("narrative task failed: {e}")))?
    }
}

/// Pick the narrator for `config`, reading the API key from the environment.
pub fn from_config(config: &NarrativeConfig) -> Arc<dyn Narrator> {
    if !config.enabled {
        info!("Narrative generation disabled by configuration");
        return Arc::new(DisabledNarrator);
    }

    match config.api_key_from(|name| std::env::var(name).ok()) {
        Some(api_key) => {
            let narrator = GeminiNarrator::new(config, api_key);
            info!(url = %narrator.url(), "Narrative generation enabled");
            Arc::new(narrator)
        }
        None => {
            info!(
                variable = %config.api_key_env,
                "No narrative API key set; interpretations will be null"
            );
            Arc::new(DisabledNarrator)
        }
    }
}

/// Prompt sent to the text-generation service.
///
/// # Errors
///
/// Returns `Error::Json` if the rows cannot be rendered.
pub fn build_prompt(results: &[SensitivityRow]) -> Result<String> {
    let rendered = serde_json::to_string_pretty(results)?;
    Ok(format!(
        "A continuación se presentan los resultados de un análisis de sensibilidad sobre un grafo \
         (la primera fila es el costo mínimo base, las demás modifican una arista cada una):\n\
         {rendered}\n\
         Interpreta estos resultados y explica con claridad cómo los cambios en los costos de las \
         aristas afectan el costo mínimo entre los nodos."
    ))
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any.
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .parts
            .iter()
            .map(|part| part.text.as_str())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

fn generate(agent: &ureq::Agent, url: &str, api_key: &str, prompt: String) -> Result<String> {
    let body = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
    };

    let response: GenerateResponse = agent
        .post(url)
        .set("x-goog-api-key", api_key)
        .send_json(&body)
        .map_err(|e| Error::Narrative(format!("request failed: {e}")))?
        .into_json()
        .map_err(|e| Error::Narrative(format!("undecodable response: {e}")))?;

    response
        .text()
        .ok_or_else(|| Error::Narrative("response contained no text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<SensitivityRow> {
        vec![
            SensitivityRow::Baseline {
                origen: "A".into(),
                destino: "C".into(),
                costo_minimo: 6,
            },
            SensitivityRow::Perturbed {
                arista: ("A".into(), "B".into()),
                costo_original: 4,
                nuevo_costo: 10,
                costo_minimo: 12,
            },
        ]
    }

    #[test]
    fn test_prompt_embeds_results() {
        let prompt = build_prompt(&rows()).unwrap();
        assert!(prompt.contains("\"escenario\": \"base\""));
        assert!(prompt.contains("\"nuevo_costo\": 10"));
        assert!(prompt.contains("costo mínimo"));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Sube "},{"text":"el costo."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("Sube el costo."));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_url_joins_endpoint_and_model() {
        let config = NarrativeConfig {
            endpoint: "https://example.test/v1/".to_string(),
            model: "m1".to_string(),
            ..NarrativeConfig::default()
        };
        let narrator = GeminiNarrator::new(&config, "secret".to_string());
        assert_eq!(narrator.url(), "https://example.test/v1/models/m1:generateContent");
        assert!(!format!("{narrator:?}").contains("secret"));
    }

    #[tokio::test]
    async fn test_disabled_config_yields_disabled_narrator() {
        let config = NarrativeConfig {
            enabled: false,
            ..NarrativeConfig::default()
        };
        let narrator = from_config(&config);
        let result = narrator.interpret(&rows()).await;
        assert!(matches!(result, Err(Error::NarrativeDisabled)));
    }
}
