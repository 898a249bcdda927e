use super::Generator;
use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Ollama-compatible generation backend with bounded-backoff retry
pub struct HttpGenerator {
    client: Client,
    base_url: Url,
    model: String,
    temperature: f32,
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl HttpGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let base_url = Url::parse(&config.backend_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_millis(250 * 2u64.pow(attempt));
                        tracing::warn!(
                            "Generation request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::GenerationService("Unknown error".to_string())))
    }

    /// Check whether the backend is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let url = self
            .base_url
            .join("/api/tags")
            .map_err(|e| Error::Config(format!("Invalid generation backend URL: {}", e)))?;

        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self
            .base_url
            .join("/api/generate")
            .map_err(|e| Error::Config(format!("Invalid generation backend URL: {}", e)))?;

        self.retry_request(|| {
            let url = url.clone();
            let request = GenerateRequest {
                model: self.model.clone(),
                prompt: prompt.to_string(),
                stream: false,
                options: GenerateOptions {
                    temperature: self.temperature,
                },
            };
            let client = self.client.clone();

            async move {
                let response = client
                    .post(url)
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| {
                        Error::GenerationService(format!("Generation request failed: {}", e))
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::GenerationService(format!(
                        "Generation failed: HTTP {} - {}",
                        status, body
                    )));
                }

                let parsed: GenerateResponse = response.json().await.map_err(|e| {
                    Error::GenerationService(format!("Failed to parse generation response: {}", e))
                })?;

                Ok(parsed.response.trim().to_string())
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> GenerationConfig {
        GenerationConfig {
            backend_url: url.to_string(),
            model: "test-llm".to_string(),
            temperature: 0.2,
            context_budget: 2048,
            timeout_secs: 5,
            max_retries: 1,
        }
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-llm",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "  Resit exams begin on 2 September 2025 [Exam Regulations, page 12].  "
            })))
            .mount(&server)
            .await;

        let generator = HttpGenerator::new(&test_config(&server.uri())).unwrap();
        let answer = generator.generate("prompt text").await.unwrap();

        assert!(answer.starts_with("Resit exams"));
        assert!(answer.ends_with("page 12]."));
    }

    #[tokio::test]
    async fn test_generate_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "recovered"
            })))
            .mount(&server)
            .await;

        let generator = HttpGenerator::new(&test_config(&server.uri())).unwrap();
        let answer = generator.generate("prompt").await.unwrap();
        assert_eq!(answer, "recovered");
    }

    #[tokio::test]
    async fn test_generate_surfaces_service_error_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let generator = HttpGenerator::new(&test_config(&server.uri())).unwrap();
        let err = generator.generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::GenerationService(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let generator = HttpGenerator::new(&test_config(&server.uri())).unwrap();
        assert!(generator.health_check().await.unwrap());
    }
}
