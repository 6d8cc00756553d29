use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// Default Ollama generate endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";
/// Default model name.
pub const DEFAULT_MODEL: &str = "phi4";
/// Bound on the whole request, connection included.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Generate endpoint URL
    pub endpoint: String,
    /// Model to use (e.g. "phi4")
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OllamaConfig {
    /// Create config from persisted settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.ollama_url.clone(),
            model: settings.model_name.clone(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Ollama API client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Send a prompt and return the generated text.
    ///
    /// Never fails: any transport, HTTP, or parse failure is returned as
    /// an inline `[Ollama error: ...]` string so the conversation log
    /// always has something displayable.
    pub async fn generate(&self, prompt: &str) -> String {
        match self.try_generate(prompt).await {
            Ok(text) => text,
            Err(err) => format!("[Ollama error: {err:#}]"),
        }
    }

    async fn try_generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama API error: {} - {}", status, body);
        }

        let raw = response
            .text()
            .await
            .context("Failed to read Ollama response body")?;
        Ok(collect_stream(&raw))
    }
}

/// Reassemble a streamed generate response.
///
/// Ollama streams multiple JSON objects separated by newlines, each
/// carrying a `response` fragment and a `done` flag. Fragments are
/// concatenated until the flag is seen; unparsable lines are skipped.
pub fn collect_stream(raw: &str) -> String {
    let mut parts = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(chunk) = serde_json::from_str::<GenerateChunk>(line) else {
            continue;
        };
        if let Some(fragment) = chunk.response {
            parts.push(fragment);
        }
        if chunk.done {
            break;
        }
    }
    parts.concat()
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_stream_concatenates_fragments() {
        let raw = concat!(
            "{\"response\":\"Lab\",\"done\":false}\n",
            "{\"response\":\"as\",\"done\":false}\n",
            "{\"response\":\"!\",\"done\":true}\n",
        );
        assert_eq!(collect_stream(raw), "Labas!");
    }

    #[test]
    fn test_collect_stream_stops_at_done_flag() {
        let raw = concat!(
            "{\"response\":\"taip\",\"done\":true}\n",
            "{\"response\":\" ne\",\"done\":false}\n",
        );
        assert_eq!(collect_stream(raw), "taip");
    }

    #[test]
    fn test_collect_stream_skips_garbage_lines() {
        let raw = concat!(
            "not json at all\n",
            "\n",
            "{\"response\":\"atsakymas\",\"done\":false}\n",
            "{\"done\":true}\n",
        );
        assert_eq!(collect_stream(raw), "atsakymas");
    }

    #[test]
    fn test_collect_stream_empty_body() {
        assert_eq!(collect_stream(""), "");
    }
}
