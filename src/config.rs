use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DocEnhancerError, Result};

/// Text-generation backend selection, bound once when the enhancer is built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Provider (cloud/openai, local-http/ollama, local-model, or legacy "local")
    pub provider: String,

    /// Model identifier (e.g., "gpt-4o-mini", "llama3.2", "ollama/llama3.2")
    pub model: String,

    /// API key (cloud provider only)
    pub api_key: Option<String>,

    /// Endpoint override for the HTTP backends
    pub base_url: Option<String>,

    /// Output language code for generated text
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Maximum module size to parse (in bytes)
    pub max_file_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExampleConfig {
    /// Python interpreter used to execute docstring examples
    pub interpreter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default report directory
    pub docs_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub parsing: ParsingConfig,
    pub examples: ExampleConfig,
    pub output: OutputConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            provider: "local-http".to_string(),
            model: "llama3.2".to_string(),
            api_key: None,
            base_url: None,
            language: "en".to_string(),
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for ExampleConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DocEnhancerError::from_io(path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| DocEnhancerError::Configuration(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                let candidates = [
                    "DocEnhancer.toml",
                    "docenhancer.toml",
                    ".docenhancer.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nprovider = \"cloud\"\nmodel = \"gpt-4o-mini\"\nlanguage = \"fr\"\n\n[examples]\ninterpreter = \"python3.12\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.backend.provider, "cloud");
        assert_eq!(config.backend.language, "fr");
        assert_eq!(config.backend.api_key, None);
        assert_eq!(config.examples.interpreter, "python3.12");
        assert_eq!(config.parsing.max_file_size, 1024 * 1024);
        assert_eq!(config.output.docs_dir, PathBuf::from("docs"));
    }

    #[test]
    fn test_malformed_file_is_configuration_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend\nprovider = ").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, DocEnhancerError::Configuration(_)));
    }

    #[test]
    fn test_missing_explicit_path_falls_back_to_default() {
        let config = Config::load_or_default(Some("/nonexistent/docenhancer.toml")).unwrap();
        assert_eq!(config.backend.provider, "local-http");
        assert_eq!(config.backend.language, "en");
    }
}
