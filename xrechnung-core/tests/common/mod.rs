use std::path::{Path, PathBuf};

use xrechnung_core::validation::{CompiledTransform, RuleEngine, ValidationError};

#[allow(dead_code)]
pub fn fixture(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

#[allow(dead_code)]
pub fn invoice(name: &str) -> PathBuf {
    fixture("invoices").join(name)
}

#[allow(dead_code)]
pub fn mini_xsd() -> PathBuf {
    fixture("schemas/mini-invoice.xsd")
}

#[allow(dead_code)]
pub fn toy_rules() -> PathBuf {
    fixture("rules/toy-en16931.xslt")
}

#[allow(dead_code)]
pub fn svrl(name: &str) -> String {
    std::fs::read_to_string(fixture("svrl").join(name)).expect("read SVRL fixture")
}

/// Engine that answers every document with a canned SVRL report.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct CannedEngine {
    pub available: bool,
    pub output: String,
}

#[allow(dead_code)]
impl CannedEngine {
    pub fn returning(output: impl Into<String>) -> Self {
        Self {
            available: true,
            output: output.into(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            output: String::new(),
        }
    }
}

impl RuleEngine for CannedEngine {
    fn name(&self) -> &str {
        "canned"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn compile(&self, transform: &Path) -> Result<CompiledTransform, ValidationError> {
        if !transform.is_file() {
            return Err(ValidationError::NotFound {
                resource: xrechnung_core::validation::Resource::RuleTransform,
                path: transform.to_path_buf(),
            });
        }
        Ok(CompiledTransform::new(transform))
    }

    fn execute(
        &self,
        _transform: &CompiledTransform,
        _document: &Path,
    ) -> Result<String, ValidationError> {
        Ok(self.output.clone())
    }
}
