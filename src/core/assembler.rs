use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::info;

use crate::error::{DocEnhancerError, Result};

/// Everything the report shows for one function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,

    /// Docstring as rendered in the target language
    pub docstring: String,

    /// Reconstructed source, never empty
    pub source: String,

    pub summary: String,

    pub explanation: String,

    /// Generated usage example
    pub example: Option<String>,

    /// Present exactly when `example` is
    pub example_test_result: Option<String>,
}

const REPORT_TEMPLATE_NAME: &str = "report.md";

const REPORT_TEMPLATE: &str = r#"# Documentation for {{ module }} [{{ language }}]

{% for func in functions -%}
## Function: {{ func.name }}
**Docstring**: {{ func.docstring }}

**Summary**: {{ func.summary }}

**Explanation**: {{ func.explanation }}

{% if func.example -%}
**Example**:
```python
{{ func.example }}
```

**Example Test Result**: {{ func.example_test_result }}

{% endif -%}
```python
{{ func.source }}
```

{% endfor -%}
"#;

/// Renders function records into a markdown report
pub struct DocAssembler {
    tera: Tera,
}

impl DocAssembler {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.add_raw_template(REPORT_TEMPLATE_NAME, REPORT_TEMPLATE)
            .map_err(|e| DocEnhancerError::Internal(format!("Invalid report template: {}", e)))?;

        Ok(Self { tera })
    }

    /// Render the report; output depends only on the arguments
    pub fn assemble(&self, module_base_name: &str, language: &str, records: &[FunctionRecord]) -> Result<String> {
        let mut context = Context::new();
        context.insert("module", module_base_name);
        context.insert("language", language);
        context.insert("functions", records);

        self.tera.render(REPORT_TEMPLATE_NAME, &context)
            .map_err(|e| DocEnhancerError::Internal(format!("Failed to render report: {}", e)))
    }

    /// Write a rendered report to `{output_dir}/{module_base_name}.{language}.md`
    pub fn write(&self, markdown: &str, output_dir: &Path, module_base_name: &str, language: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            DocEnhancerError::Internal(format!("Failed to create {}: {}", output_dir.display(), e))
        })?;

        let output_file = report_path(output_dir, module_base_name, language);
        std::fs::write(&output_file, markdown).map_err(|e| {
            DocEnhancerError::Internal(format!("Failed to write {}: {}", output_file.display(), e))
        })?;

        info!("📝 Wrote {}", output_file.display());
        Ok(output_file)
    }
}

/// Deterministic report location for a module
pub fn report_path(output_dir: &Path, module_base_name: &str, language: &str) -> PathBuf {
    output_dir.join(format!("{}.{}.md", module_base_name, language))
}
