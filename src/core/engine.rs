use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{BackendConfig, Config};
use crate::error::{DocEnhancerError, Result};
use super::{
    create_generator, detect_example, DocAssembler, ExampleRunner, FunctionRecord, LocalModel,
    ModuleParser, RawFunction, Task, TextGenerator,
};

/// Prefix of report fields whose generation failed
pub const LLM_ERROR_PREFIX: &str = "Error from LLM:";

/// Drives extraction, generation, example runs and report writing.
///
/// Configuration is bound once at construction. Runs are sequential and
/// independent; two runs must not target the same report file at once.
pub struct DocEnhancer {
    backend: BackendConfig,
    parser: ModuleParser,
    generator: Box<dyn TextGenerator>,
    runner: ExampleRunner,
    assembler: DocAssembler,
}

impl DocEnhancer {
    /// Build an enhancer; fails fast on a missing or unsupported provider
    pub fn new(config: &Config) -> Result<Self> {
        Self::build(config, None)
    }

    /// Build an enhancer whose local-model provider uses `model`
    pub fn with_local_model(config: &Config, model: Arc<dyn LocalModel>) -> Result<Self> {
        Self::build(config, Some(model))
    }

    fn build(config: &Config, local_model: Option<Arc<dyn LocalModel>>) -> Result<Self> {
        let generator = create_generator(&config.backend, local_model)?;
        info!(
            "✅ Text generation via {} ({})",
            generator.provider_name(),
            generator.model_name()
        );

        Ok(Self {
            backend: config.backend.clone(),
            parser: ModuleParser::new(&config.parsing)?,
            generator,
            runner: ExampleRunner::new(&config.examples),
            assembler: DocAssembler::new()?,
        })
    }

    /// Language used when a run does not ask for one
    pub fn language(&self) -> &str {
        &self.backend.language
    }

    /// Document one module and return the path of the written report.
    ///
    /// Extraction failures abort before anything is written. Generation
    /// failures only degrade the affected field.
    pub async fn generate_docs(
        &mut self,
        module_path: &Path,
        output_dir: &Path,
        language: Option<&str>,
    ) -> Result<PathBuf> {
        let language = language.unwrap_or(&self.backend.language).to_string();

        info!("🔍 Extracting functions from {}", module_path.display());
        let module = self.parser.parse_file(module_path)?;
        let base_name = module.base_name();

        let mut records = Vec::with_capacity(module.functions.len());
        for function in &module.functions {
            records.push(self.enhance_function(function, &language).await);
        }

        let markdown = self.assembler.assemble(&base_name, &language, &records)?;
        let report = self.assembler.write(&markdown, output_dir, &base_name, &language)?;

        info!("🎉 Documented {} functions from {}", records.len(), base_name);
        Ok(report)
    }

    /// Build the record for one function; never fails
    pub async fn enhance_function(&self, function: &RawFunction, language: &str) -> FunctionRecord {
        debug!(
            "Enhancing {} (lines {}-{})",
            function.name, function.line_range.0, function.line_range.1
        );

        let docstring = self.generate_field(&function.docstring, Task::Translate, language, &function.name).await;
        let summary = self.generate_field(&function.docstring, Task::Summarize, language, &function.name).await;
        let explanation = self.generate_field(&function.source, Task::Explain, language, &function.name).await;
        let generated = self.generate_field(&function.source, Task::Example, language, &function.name).await;

        let example = Some(generated).filter(|text| !text.trim().is_empty());
        let example_test_result = match example {
            Some(_) => {
                let detected = detect_example(&function.docstring);
                Some(self.runner.test_example(detected.as_deref()).await)
            }
            None => None,
        };

        FunctionRecord {
            name: function.name.clone(),
            docstring,
            source: function.source.clone(),
            summary,
            explanation,
            example,
            example_test_result,
        }
    }

    /// One backend call; a failure is rendered into the field instead of raised
    async fn generate_field(&self, text: &str, task: Task, language: &str, function: &str) -> String {
        match self.generator.generate(text, task, language).await {
            Ok(content) => content,
            Err(err) => {
                warn!("⚠️ {} for {} degraded: {}", task, function, err);
                format!("{} {}", LLM_ERROR_PREFIX, describe_error(&err))
            }
        }
    }

    /// Placeholder search: always reports one synthesized match. Needs no backend.
    pub fn search_docs(query: &str, docs_dir: &Path) -> Vec<String> {
        vec![format!(
            "Found match for '{}' in {} (mock result)",
            query,
            docs_dir.display()
        )]
    }
}

/// Error message followed by its chain of causes
fn describe_error(err: &DocEnhancerError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
