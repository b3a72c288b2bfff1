use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{DocEnhancerError, Result};
use super::generator::TextGenerator;

/// Default Ollama endpoint
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default OpenAI-compatible endpoint
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Requests to the local HTTP backend are abandoned after this long
pub const LOCAL_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature for chat completions
pub const CLOUD_TEMPERATURE: f32 = 0.2;

/// Which backend family serves generation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completion API
    Cloud,

    /// Ollama server on the local machine
    LocalHttp,

    /// Model loaded into this process
    LocalModel,
}

impl ProviderKind {
    /// Resolve a configured provider name; `model` disambiguates legacy "local"
    pub fn resolve(provider: &str, model: &str) -> Result<Self> {
        match provider.trim().to_ascii_lowercase().as_str() {
            "cloud" | "openai" => Ok(ProviderKind::Cloud),
            "local-http" | "ollama" => Ok(ProviderKind::LocalHttp),
            "local-model" => Ok(ProviderKind::LocalModel),
            "local" if model.to_ascii_lowercase().contains("ollama") => Ok(ProviderKind::LocalHttp),
            "local" => Ok(ProviderKind::LocalModel),
            "" => Err(DocEnhancerError::Configuration(
                "No LLM provider selected".to_string()
            )),
            "mock" => Err(DocEnhancerError::Configuration(
                "The mock provider is a placeholder and cannot generate documentation".to_string()
            )),
            other => Err(DocEnhancerError::Configuration(
                format!("Unsupported LLM provider: {}", other)
            )),
        }
    }
}

/// A model already loaded into this process (e.g. a llama.cpp binding)
pub trait LocalModel: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Factory function to create the configured text generator
pub fn create_generator(
    config: &BackendConfig,
    local_model: Option<Arc<dyn LocalModel>>,
) -> Result<Box<dyn TextGenerator>> {
    match ProviderKind::resolve(&config.provider, &config.model)? {
        ProviderKind::Cloud => Ok(Box::new(OpenAiProvider::new(config)?)),
        ProviderKind::LocalHttp => Ok(Box::new(OllamaProvider::new(config)?)),
        ProviderKind::LocalModel => Ok(Box::new(LocalModelProvider::new(config, local_model))),
    }
}

/// Local HTTP backend talking to an Ollama server
pub struct OllamaProvider {
    model: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaProvider {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        // The server is local; never route it through a system proxy
        let client = reqwest::Client::builder()
            .timeout(LOCAL_HTTP_TIMEOUT)
            .no_proxy()
            .build()
            .map_err(|e| DocEnhancerError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.as_deref().unwrap_or(OLLAMA_BASE_URL);

        Ok(Self {
            // "ollama/llama3.2" names the model "llama3.2" on the server
            model: config.model.split_once('/').map_or(config.model.as_str(), |(_, m)| m).to_string(),
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("POST {} (model {})", self.endpoint, self.model);

        let payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        });

        let response = self.client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DocEnhancerError::generation_with("Ollama request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocEnhancerError::generation(
                format!("Ollama API error {}: {}", status, error_text.trim())
            ));
        }

        let body: OllamaResponse = response.json().await
            .map_err(|e| DocEnhancerError::generation_with("Failed to parse Ollama response", e))?;

        Ok(body.response)
    }

    fn provider_name(&self) -> &str {
        "Ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Cloud backend speaking the OpenAI chat completion protocol
pub struct OpenAiProvider {
    model: String,
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = config.api_key.clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DocEnhancerError::Configuration(
                "API key required for the cloud provider".to_string()
            ))?;

        let base_url = config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL);

        Ok(Self {
            model: config.model.clone(),
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("POST {} (model {})", self.endpoint, self.model);

        let payload = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ],
            "temperature": CLOUD_TEMPERATURE
        });

        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DocEnhancerError::generation_with("OpenAI API request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocEnhancerError::generation(
                format!("OpenAI API error {}: {}", status, error_text.trim())
            ));
        }

        let completion: ChatCompletion = response.json().await
            .map_err(|e| DocEnhancerError::generation_with("Failed to parse OpenAI response", e))?;

        completion.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DocEnhancerError::generation("OpenAI response contained no message content"))
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Backend that hands prompts to an in-process model
pub struct LocalModelProvider {
    model_name: String,
    model: Option<Arc<dyn LocalModel>>,
}

impl LocalModelProvider {
    pub fn new(config: &BackendConfig, model: Option<Arc<dyn LocalModel>>) -> Self {
        Self {
            model_name: config.model.clone(),
            model,
        }
    }
}

#[async_trait]
impl TextGenerator for LocalModelProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let model = self.model.as_ref()
            .ok_or_else(|| DocEnhancerError::generation("no local model is loaded"))?;

        model.generate(prompt).map_err(|e| DocEnhancerError::Generation {
            message: format!("local model {} failed", self.model_name),
            source: Some(e.into()),
        })
    }

    fn provider_name(&self) -> &str {
        "Local model"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::Task;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn backend(provider: &str, model: &str) -> BackendConfig {
        BackendConfig {
            provider: provider.to_string(),
            model: model.to_string(),
            ..BackendConfig::default()
        }
    }

    struct Shout;

    impl LocalModel for Shout {
        fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            Ok(prompt.to_uppercase())
        }
    }

    struct Broken;

    impl LocalModel for Broken {
        fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("out of memory")
        }
    }

    #[test]
    fn test_resolve_provider_names() {
        assert_eq!(ProviderKind::resolve("openai", "gpt-4o").unwrap(), ProviderKind::Cloud);
        assert_eq!(ProviderKind::resolve("cloud", "gpt-4o").unwrap(), ProviderKind::Cloud);
        assert_eq!(ProviderKind::resolve("local-http", "llama3.2").unwrap(), ProviderKind::LocalHttp);
        assert_eq!(ProviderKind::resolve("Ollama", "llama3.2").unwrap(), ProviderKind::LocalHttp);
        assert_eq!(ProviderKind::resolve("local", "ollama/llama3.2").unwrap(), ProviderKind::LocalHttp);
        assert_eq!(ProviderKind::resolve("local", "models/7b.gguf").unwrap(), ProviderKind::LocalModel);
        assert_eq!(ProviderKind::resolve("local-model", "x").unwrap(), ProviderKind::LocalModel);
    }

    #[test]
    fn test_placeholder_and_unknown_providers_are_rejected() {
        for provider in ["", "mock", "anthropic"] {
            let err = ProviderKind::resolve(provider, "m").unwrap_err();
            assert!(matches!(err, DocEnhancerError::Configuration(_)), "{provider}");
        }
    }

    #[test]
    fn test_cloud_requires_api_key() {
        let err = create_generator(&backend("openai", "gpt-4o-mini"), None).err().unwrap();
        assert!(matches!(err, DocEnhancerError::Configuration(_)));

        let mut config = backend("openai", "gpt-4o-mini");
        config.api_key = Some("sk-test".to_string());
        let generator = create_generator(&config, None).unwrap();
        assert_eq!(generator.provider_name(), "OpenAI");
        assert_eq!(generator.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_ollama_model_prefix_is_stripped() {
        let provider = OllamaProvider::new(&backend("local", "ollama/llama3.2")).unwrap();
        assert_eq!(provider.model_name(), "llama3.2");
        assert_eq!(provider.endpoint, "http://localhost:11434/api/generate");
    }

    #[tokio::test]
    async fn test_unreachable_ollama_is_generation_error() {
        let mut config = backend("local-http", "llama3.2");
        config.base_url = Some("http://127.0.0.1:1".to_string());
        let provider = OllamaProvider::new(&config).unwrap();

        let err = provider.generate("def f(): pass", Task::Summarize, "en").await.unwrap_err();
        match err {
            DocEnhancerError::Generation { message, source } => {
                assert_eq!(message, "Ollama request failed");
                assert!(source.is_some());
            }
            other => panic!("expected generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_cloud_is_generation_error() {
        let mut config = backend("cloud", "gpt-4o-mini");
        config.api_key = Some("sk-test".to_string());
        config.base_url = Some("http://127.0.0.1:1/v1".to_string());
        let provider = OpenAiProvider::new(&config).unwrap();

        let err = provider.complete("hello").await.unwrap_err();
        assert!(matches!(err, DocEnhancerError::Generation { .. }));
    }

    /// Serve one canned HTTP response on a loopback port and return its base URL
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        });

        format!("http://{}", addr)
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(header_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]);
        let length = headers
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        request.len() >= header_end + 4 + length
    }

    fn cloud_at(base_url: String) -> OpenAiProvider {
        let mut config = backend("cloud", "gpt-4o-mini");
        config.api_key = Some("sk-test".to_string());
        config.base_url = Some(base_url);
        OpenAiProvider::new(&config).unwrap()
    }

    fn ollama_at(base_url: String) -> OllamaProvider {
        let mut config = backend("local-http", "llama3.2");
        config.base_url = Some(base_url);
        OllamaProvider::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_ollama_returns_response_text() {
        let provider = ollama_at(serve_once("200 OK", r#"{"response":"  Doubles x.\n"}"#).await);
        let text = provider.generate("def f(): pass", Task::Summarize, "en").await.unwrap();
        assert_eq!(text, "Doubles x.");
    }

    #[tokio::test]
    async fn test_error_status_carries_status_and_body() {
        let provider = ollama_at(serve_once("500 Internal Server Error", "model not found").await);
        let err = provider.complete("hi").await.unwrap_err();
        match err {
            DocEnhancerError::Generation { message, .. } => {
                assert!(message.contains("500"), "{message}");
                assert!(message.contains("model not found"), "{message}");
            }
            other => panic!("expected generation error, got {other:?}"),
        }

        let provider = cloud_at(serve_once("429 Too Many Requests", r#"{"error":"rate limited"}"#).await);
        let err = provider.complete("hi").await.unwrap_err();
        match err {
            DocEnhancerError::Generation { message, .. } => {
                assert!(message.contains("429"), "{message}");
                assert!(message.contains("rate limited"), "{message}");
            }
            other => panic!("expected generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cloud_without_choices_is_generation_error() {
        let provider = cloud_at(serve_once("200 OK", r#"{"choices":[]}"#).await);
        let err = provider.complete("hi").await.unwrap_err();
        match err {
            DocEnhancerError::Generation { message, source } => {
                assert_eq!(message, "OpenAI response contained no message content");
                assert!(source.is_none());
            }
            other => panic!("expected generation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cloud_returns_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Bonjour"}}]}"#;
        let provider = cloud_at(serve_once("200 OK", body).await);
        assert_eq!(provider.complete("hi").await.unwrap(), "Bonjour");
    }

    #[tokio::test]
    async fn test_malformed_body_is_generation_error() {
        let provider = cloud_at(serve_once("200 OK", "<html>gateway</html>").await);
        let err = provider.complete("hi").await.unwrap_err();
        assert!(
            matches!(&err, DocEnhancerError::Generation { message, source: Some(_) } if message == "Failed to parse OpenAI response"),
            "{err:?}"
        );

        let provider = ollama_at(serve_once("200 OK", "not json").await);
        let err = provider.complete("hi").await.unwrap_err();
        assert!(
            matches!(&err, DocEnhancerError::Generation { message, source: Some(_) } if message == "Failed to parse Ollama response"),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn test_local_model_generates() {
        let provider = LocalModelProvider::new(&backend("local-model", "tiny"), Some(Arc::new(Shout)));
        let text = provider.generate("doubles x", Task::Translate, "fr").await.unwrap();
        assert_eq!(text, "TRANSLATE THE FOLLOWING DOCUMENTATION TO FR:\nDOUBLES X");
    }

    #[tokio::test]
    async fn test_local_model_failures_are_generation_errors() {
        let unloaded = LocalModelProvider::new(&backend("local-model", "tiny"), None);
        let err = unloaded.complete("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Generation error: no local model is loaded");

        let broken = LocalModelProvider::new(&backend("local-model", "tiny"), Some(Arc::new(Broken)));
        let err = broken.complete("hi").await.unwrap_err();
        assert!(matches!(err, DocEnhancerError::Generation { source: Some(_), .. }));
    }
}
