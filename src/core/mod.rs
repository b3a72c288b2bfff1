mod engine;
mod parser;
mod assembler;
mod example_detector;
mod example_runner;
mod llm;

// Language-specific parsers
mod languages;

pub use parser::{module_base_name, ModuleParser, ParsedModule, RawFunction, NO_DOCSTRING};
pub use assembler::{report_path, DocAssembler, FunctionRecord};
pub use example_detector::detect_example;
pub use example_runner::{ExampleOutcome, ExampleRunner, NO_EXAMPLE};
pub use llm::{
    create_generator, LocalModel, LocalModelProvider, OllamaProvider, OpenAiProvider, ProviderKind,
    Task, TextGenerator,
};

// Export the main orchestrator
pub use engine::{DocEnhancer, LLM_ERROR_PREFIX};
