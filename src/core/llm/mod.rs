//! Text-generation backends
//!
//! One capability, `generate(text, task, language)`, served by
//! interchangeable providers: a local Ollama server, an OpenAI-compatible
//! cloud API, or a model loaded into this process. The provider is chosen
//! once from configuration; callers only ever see `dyn TextGenerator`.

mod generator;
mod providers;

pub use generator::{Task, TextGenerator};
pub use providers::{
    create_generator, LocalModel, LocalModelProvider, OllamaProvider, OpenAiProvider, ProviderKind,
};
