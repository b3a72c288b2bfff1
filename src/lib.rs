//! DocEnhancer - LLM-enhanced documentation for Python modules
//!
//! Extracts every function of a module with tree-sitter, asks a pluggable
//! text-generation backend to translate, summarize, explain and exemplify
//! it, runs any usage example found in its docstring, and writes the result
//! as a markdown report per language.

pub mod config;
pub mod core;
pub mod error;

pub use crate::config::{BackendConfig, Config, ExampleConfig, OutputConfig, ParsingConfig};
pub use crate::core::{DocEnhancer, LocalModel, Task, TextGenerator};
pub use crate::error::{DocEnhancerError, Result};
