use async_trait::async_trait;
use std::fmt;

use crate::error::Result;

/// What the backend is asked to do with a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Summarize code or documentation
    Summarize,

    /// Explain what a piece of code does
    Explain,

    /// Translate documentation into the target language
    Translate,

    /// Write a usage example for a function
    Example,
}

impl Task {
    /// Build the instruction sent to the backend
    pub fn prompt(&self, text: &str, language: &str) -> String {
        match self {
            Task::Summarize => format!("Summarize the following Python code in {}:\n{}", language, text),
            Task::Explain => format!("Explain what the following Python code does in {}:\n{}", language, text),
            Task::Translate => format!("Translate the following documentation to {}:\n{}", language, text),
            Task::Example => format!(
                "Generate a usage example for the following Python function in {}:\n{}",
                language, text
            ),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Task::Summarize => "summarize",
            Task::Explain => "explain",
            Task::Translate => "translate",
            Task::Example => "example",
        };
        f.write_str(name)
    }
}

/// A text-generation backend.
///
/// Implementations only turn a prompt into text; prompt construction is
/// shared through [`TextGenerator::generate`]. Every failure is reported as
/// `DocEnhancerError::Generation`, never as placeholder text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a finished prompt to the backend
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Get the provider name (e.g., "Ollama", "OpenAI")
    fn provider_name(&self) -> &str;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Run `task` over `text`, answering in `language`
    async fn generate(&self, text: &str, task: Task, language: &str) -> Result<String> {
        let prompt = task.prompt(text, language);
        let response = self.complete(&prompt).await?;
        Ok(response.trim().to_string())
    }
}
