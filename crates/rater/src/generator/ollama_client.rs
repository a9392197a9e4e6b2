use crate::error::{RaterError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct OllamaGenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: &'a str,
    pub stream: bool,
    pub format: &'static str,
    pub options: &'a OllamaOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct OllamaGenerateResponse {
    pub model: String,
    pub response: String,
    pub done: bool,
    pub total_duration: Option<i64>,
    pub eval_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    pub size: i64,
    pub modified_at: String,
}

#[derive(Debug, Deserialize)]
pub struct OllamaModelsResponse {
    pub models: Vec<OllamaModel>,
}

/// Client for interacting with Ollama API
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    default_options: OllamaOptions,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of Ollama API (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "qwen2.5:7b")
    /// * `timeout` - Upper bound for a single HTTP request
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        // A little randomness keeps explanations from reading like templates
        let default_options = OllamaOptions {
            temperature: Some(0.4),
            top_p: Some(0.9),
            seed: None,
            num_predict: Some(1024),
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            default_options,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a JSON document from a system and a user prompt
    pub async fn generate_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        custom_options: Option<&OllamaOptions>,
    ) -> Result<String> {
        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt: user_prompt,
            system: system_prompt,
            stream: false,
            format: "json",
            options: custom_options.unwrap_or(&self.default_options),
        };

        tracing::debug!(
            "Sending request to Ollama (model: {}, prompt length: {} chars)",
            self.model,
            user_prompt.len()
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| RaterError::GenerationError(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RaterError::GenerationError(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        let ollama_response: OllamaGenerateResponse = response.json().await.map_err(|e| {
            RaterError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        if !ollama_response.done {
            return Err(RaterError::InvalidResponse(
                "Ollama returned an incomplete generation".to_string(),
            ));
        }

        if let Some(total) = ollama_response.total_duration {
            tracing::debug!(
                "Ollama generation complete: {:.2}s total, {} tokens, {} chars output",
                total as f64 / 1_000_000_000.0,
                ollama_response.eval_count.unwrap_or_default(),
                ollama_response.response.len()
            );
        }

        Ok(ollama_response.response)
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<OllamaModel>> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| RaterError::GenerationError(format!("Failed to list models: {}", e)))?;

        let models_response: OllamaModelsResponse = response.json().await.map_err(|e| {
            RaterError::InvalidResponse(format!("Failed to parse models response: {}", e))
        })?;

        Ok(models_response.models)
    }

    /// Check if Ollama service is available
    pub async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| RaterError::GenerationError(format!("Health check failed: {}", e)))?;

        Ok(response.status().is_success())
    }

    /// Verify the configured model is available
    pub async fn verify_model(&self) -> Result<bool> {
        let models = self.list_models().await?;
        Ok(models.iter().any(|m| m.name.starts_with(&self.model)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OllamaClient {
        OllamaClient::new(
            "http://localhost:11434/".to_string(),
            "qwen2.5:7b".to_string(),
            Duration::from_secs(60),
        )
        .unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let client = client();
        let request = OllamaGenerateRequest {
            model: client.model(),
            prompt: "rate this",
            system: "you rate games",
            stream: false,
            format: "json",
            options: &client.default_options,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);
        assert!(value["options"].get("seed").is_none());
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    #[ignore] // Only run when Ollama is running
    async fn test_ollama_health_check() {
        let result = client().health_check().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore] // Only run when Ollama is running
    async fn test_simple_json_generation() {
        let system = "Return JSON: {\"score\": <0-100>}";
        let user = "The game ended 42-41 in double overtime.";

        let json_str = client().generate_json(system, user, None).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.get("score").is_some());
    }
}
