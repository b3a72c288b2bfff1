use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::{Context, Result};

use docenhancer::core::ProviderKind;
use docenhancer::{Config, DocEnhancer};

#[derive(Parser)]
#[command(name = "docenhancer")]
#[command(about = "LLM-enhanced documentation for Python modules, with example testing")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate enhanced documentation for a Python module
    Enhance {
        /// Path to the Python module
        #[arg(short, long)]
        module: PathBuf,

        /// Output directory for documentation
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Provider (cloud/openai, local-http/ollama); in-process models are library-only
        #[arg(long)]
        provider: Option<String>,

        /// Model name (e.g., llama3.2, gpt-4o-mini)
        #[arg(long)]
        model: Option<String>,

        /// API key for the cloud provider
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Endpoint override for the HTTP providers
        #[arg(long)]
        base_url: Option<String>,

        /// Language code for documentation (e.g., en, fr, es, zh)
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Search documentation with a natural language query
    Search {
        /// Search query
        #[arg(short, long)]
        query: String,

        /// Directory with documentation
        #[arg(long)]
        docs_dir: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let mut config = Config::load_or_default(self.config.as_deref())
            .context("Failed to load configuration")?;

        match self.command {
            Commands::Enhance { module, output, provider, model, api_key, base_url, language } => {
                if let Some(provider) = provider {
                    config.backend.provider = provider;
                }
                if let Some(model) = model {
                    config.backend.model = model;
                }
                if api_key.is_some() {
                    config.backend.api_key = api_key;
                }
                if base_url.is_some() {
                    config.backend.base_url = base_url;
                }
                if let Some(language) = language {
                    config.backend.language = language;
                }
                let output_dir = output.unwrap_or_else(|| config.output.docs_dir.clone());

                ensure_cli_backend(&config)?;
                let mut enhancer = DocEnhancer::new(&config)?;
                let report = enhancer
                    .generate_docs(&module, &output_dir, None)
                    .await
                    .with_context(|| format!("Failed to document {}", module.display()))?;

                println!(
                    "Documentation generated in {} (language: {})",
                    report.display(),
                    enhancer.language()
                );
                Ok(())
            }
            Commands::Search { query, docs_dir } => {
                let docs_dir = docs_dir.unwrap_or_else(|| config.output.docs_dir.clone());
                for result in DocEnhancer::search_docs(&query, &docs_dir) {
                    println!("{}", result);
                }
                Ok(())
            }
        }
    }
}

/// The binary has no way to load an in-process model
fn ensure_cli_backend(config: &Config) -> Result<()> {
    if ProviderKind::resolve(&config.backend.provider, &config.backend.model)? == ProviderKind::LocalModel {
        anyhow::bail!(
            "Provider '{}' needs an in-process model, which is only available through the library \
             (DocEnhancer::with_local_model); use local-http or cloud from the command line",
            config.backend.provider
        );
    }
    Ok(())
}
