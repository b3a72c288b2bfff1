use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::ParsingConfig;
use crate::error::{DocEnhancerError, Result};
use super::languages::PythonParser;

/// Docstring recorded for functions that do not declare one
pub const NO_DOCSTRING: &str = "No docstring";

/// One function definition extracted from a module
#[derive(Debug, Clone, PartialEq)]
pub struct RawFunction {
    /// Declared function name
    pub name: String,

    /// Cleaned docstring, or `NO_DOCSTRING`
    pub docstring: String,

    /// Reconstructed source, decorators included
    pub source: String,

    /// Line range in source file
    pub line_range: (usize, usize),
}

/// Result of a single extraction pass over one module
#[derive(Debug, Clone)]
pub struct ParsedModule {
    /// Path the module was read from
    pub path: PathBuf,

    /// Functions in pre-order traversal order
    pub functions: Vec<RawFunction>,
}

impl ParsedModule {
    /// File name of the module, used to name its report
    pub fn base_name(&self) -> String {
        module_base_name(&self.path)
    }
}

pub fn module_base_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Reads Python modules and turns them into function records.
///
/// Extraction is all-or-nothing: any read or parse failure aborts the call
/// and nothing is returned for the module.
pub struct ModuleParser {
    config: ParsingConfig,
    python: PythonParser,
}

impl ModuleParser {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            python: PythonParser::new()?,
        })
    }

    /// Read and parse a module from disk
    pub fn parse_file<P: AsRef<Path>>(&mut self, module_path: P) -> Result<ParsedModule> {
        let path = module_path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| DocEnhancerError::from_io(path, e))?;

        if bytes.len() > self.config.max_file_size {
            return Err(DocEnhancerError::Internal(
                format!("File {} exceeds maximum size limit", path.display())
            ));
        }

        let content = String::from_utf8(bytes).map_err(|e| {
            DocEnhancerError::Internal(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;

        let functions = self.extract(&content).map_err(|err| match err {
            DocEnhancerError::Parse { diagnostic, .. } => DocEnhancerError::Parse {
                path: path.to_path_buf(),
                diagnostic,
            },
            other => other,
        })?;

        debug!("Extracted {} functions from {}", functions.len(), path.display());

        Ok(ParsedModule {
            path: path.to_path_buf(),
            functions,
        })
    }

    /// Extract function records from module source text
    pub fn extract(&mut self, content: &str) -> Result<Vec<RawFunction>> {
        let nodes = self.python.extract_functions(content).map_err(|diagnostic| {
            DocEnhancerError::Parse {
                path: PathBuf::from("<source>"),
                diagnostic,
            }
        })?;

        Ok(nodes
            .into_iter()
            .map(|node| RawFunction {
                name: node.name,
                docstring: node.docstring.unwrap_or_else(|| NO_DOCSTRING.to_string()),
                source: node.source,
                line_range: node.line_range,
            })
            .collect())
    }
}
