//! Structural and semantic invoice validation.
//!
//! Both validators produce the same [`ValidationResult`]: an ordered list of
//! errors and an ordered list of warnings. A non-conformant document is a
//! normal result; only missing resources and engine failures are returned as
//! [`ValidationError`].
pub mod engine;
pub mod rules;
pub mod schema;
pub mod svrl;

use libxml::{
    error::XmlErrorLevel,
    parser::{Parser, ParserOptions, XmlParseFailure},
    tree::Document,
};
use serde::Serialize;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub use engine::{CompiledTransform, RuleEngine, XsltCommand};
pub use rules::{Assertion, ReclassificationPolicy, RuleValidator, Severity};
pub use schema::SchemaValidator;

/// Uniform outcome of a validation pass.
///
/// # Examples
/// ```rust
/// use xrechnung_core::validation::ValidationResult;
///
/// let result = ValidationResult::new(vec!["missing ID".into()], Vec::new());
/// assert!(result.has_errors());
/// assert!(!result.is_clean());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self { errors, warnings }
    }

    /// A result carrying only errors, as produced by schema validation.
    pub fn errors_only(errors: Vec<String>) -> Self {
        Self {
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when there are neither errors nor warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Files a validator depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Document,
    Schema,
    RuleTransform,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Document => "XML document",
            Resource::Schema => "XSD schema",
            Resource::RuleTransform => "rule transform",
        };
        f.write_str(name)
    }
}

/// Hard failures. Findings about the document itself never end up here.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{resource} not found: {}", path.display())]
    NotFound { resource: Resource, path: PathBuf },
    #[error("rule engine unavailable: {engine}")]
    EngineUnavailable { engine: String },
    #[error("failed to compile rule transform {}: {message}", path.display())]
    Compile { path: PathBuf, message: String },
    #[error("rule transform failed: {0}")]
    Transform(String),
    #[error("schema engine error: {0}")]
    SchemaEngine(String),
}

/// A validation phase that can contribute a section to the report.
pub trait Validator {
    /// Section title used when the result is written to a report.
    fn report_title(&self) -> &'static str;

    fn validate(&self, document: &Path) -> Result<ValidationResult, ValidationError>;
}

/// Resolve `path` to a canonical path of an existing file.
pub(crate) fn resolve_existing(path: &Path, resource: Resource) -> Result<PathBuf, ValidationError> {
    let not_found = || ValidationError::NotFound {
        resource,
        path: path.to_path_buf(),
    };
    let resolved = path.canonicalize().map_err(|_| not_found())?;
    if !resolved.is_file() {
        return Err(not_found());
    }
    Ok(resolved)
}

/// libxml only takes UTF-8 paths.
pub(crate) fn path_str(path: &Path) -> Result<&str, ValidationError> {
    path.to_str().ok_or_else(|| {
        ValidationError::SchemaEngine(format!("path is not valid UTF-8: {}", path.display()))
    })
}

/// Parse `xml` with libxml's recovery mode off. On failure, returns every
/// error diagnostic, trimmed, in emission order.
pub(crate) fn parse_well_formed(xml: &str) -> Result<Document, Vec<String>> {
    let options = ParserOptions {
        recover: false,
        ..ParserOptions::default()
    };
    let (document, diagnostics) = match Parser::default().parse_string_with_diagnostics(xml, options)
    {
        Ok(parsed) => parsed,
        Err(XmlParseFailure::ParseFailed(diagnostics)) => {
            let messages: Vec<String> = diagnostics
                .iter()
                .filter_map(|d| d.message.as_deref())
                .map(|m| m.trim().to_string())
                .collect();
            if messages.is_empty() {
                return Err(vec!["parser returned no document".to_string()]);
            }
            return Err(messages);
        }
        Err(other) => return Err(vec![other.to_string()]),
    };

    // namespace errors leave a document behind even without recovery
    let errors: Vec<String> = diagnostics
        .iter()
        .filter(|d| matches!(d.level, XmlErrorLevel::Error | XmlErrorLevel::Fatal))
        .map(|d| d.message.as_deref().unwrap_or_default().trim().to_string())
        .collect();
    if !errors.is_empty() {
        return Err(errors);
    }
    if document.get_root_element().is_none() {
        return Err(vec!["no root element".to_string()]);
    }
    Ok(document)
}
