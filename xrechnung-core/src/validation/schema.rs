use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::validation::{
    Resource, ValidationError, ValidationResult, Validator, parse_well_formed, path_str,
    resolve_existing,
};
use libxml::{
    error::StructuredError,
    schemas::{SchemaParserContext, SchemaValidationContext},
};

/// Report section title for structural validation results.
pub const REPORT_TITLE: &str = "UBL Structure Validation";

/// Structural validation of invoices against an XSD (UBL 2.1 `Invoice` by default).
///
/// # Examples
/// ```rust,no_run
/// use std::path::Path;
/// use xrechnung_core::validation::SchemaValidator;
///
/// let validator = SchemaValidator::new("resources/ubl/2.1/xsd/maindoc/UBL-Invoice-2.1.xsd");
/// let result = validator.validate(Path::new("invoice.xml"))?;
/// for error in result.errors() {
///     println!("{error}");
/// }
/// # Ok::<(), xrechnung_core::validation::ValidationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    xsd_path: PathBuf,
}

impl SchemaValidator {
    pub fn new(xsd_path: impl Into<PathBuf>) -> Self {
        Self {
            xsd_path: xsd_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.xsd_path())
    }

    pub fn xsd_path(&self) -> &Path {
        &self.xsd_path
    }

    /// Validate the document at `path`. Every diagnostic of a failed
    /// validation is returned as an error, trimmed, in emission order.
    pub fn validate(&self, path: &Path) -> Result<ValidationResult, ValidationError> {
        // libxml reports a missing file as yet another validation error, so check first
        let document = resolve_existing(path, Resource::Document)?;
        let mut validation_ctx = self.build_validation_context()?;
        tracing::debug!(document = %document.display(), xsd = %self.xsd_path.display(), "validating against schema");

        let result = match validation_ctx.validate_file(path_str(&document)?) {
            Ok(()) => ValidationResult::default(),
            Err(errors) => ValidationResult::errors_only(format_validation_errors(errors)),
        };
        tracing::info!(errors = result.errors().len(), "schema validation finished");
        Ok(result)
    }

    /// Validate an in-memory document. A string that is not well-formed XML
    /// yields a single `Failed to parse XML` finding carrying the parser
    /// diagnostics.
    pub fn validate_str(&self, xml: &str) -> Result<ValidationResult, ValidationError> {
        let mut validation_ctx = self.build_validation_context()?;
        let document = match parse_well_formed(xml) {
            Ok(document) => document,
            Err(errors) => {
                return Ok(ValidationResult::errors_only(vec![format!(
                    "Failed to parse XML: {}",
                    errors.join("; ")
                )]));
            }
        };

        Ok(match validation_ctx.validate_document(&document) {
            Ok(()) => ValidationResult::default(),
            Err(errors) => ValidationResult::errors_only(format_validation_errors(errors)),
        })
    }

    fn build_validation_context(&self) -> Result<SchemaValidationContext, ValidationError> {
        let xsd_path = resolve_existing(&self.xsd_path, Resource::Schema)?;
        let mut parser_ctx = SchemaParserContext::from_file(path_str(&xsd_path)?);
        SchemaValidationContext::from_parser(&mut parser_ctx).map_err(|errors| {
            ValidationError::SchemaEngine(format!(
                "failed to load schema {}: {}",
                xsd_path.display(),
                format_validation_errors(errors).join("; ")
            ))
        })
    }
}

impl Validator for SchemaValidator {
    fn report_title(&self) -> &'static str {
        REPORT_TITLE
    }

    fn validate(&self, document: &Path) -> Result<ValidationResult, ValidationError> {
        SchemaValidator::validate(self, document)
    }
}

fn format_validation_errors(errors: Vec<StructuredError>) -> Vec<String> {
    if errors.is_empty() {
        return vec!["Schema validation failed without diagnostics".to_string()];
    }
    errors
        .into_iter()
        .map(|se| se.message.as_deref().unwrap_or_default().trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_schema_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let document = dir.path().join("invoice.xml");
        std::fs::write(&document, "<Invoice/>").expect("write document");

        let validator = SchemaValidator::new(dir.path().join("missing.xsd"));
        let err = validator.validate(&document).expect_err("schema missing");
        assert!(matches!(
            err,
            ValidationError::NotFound {
                resource: Resource::Schema,
                ..
            }
        ));
    }

    #[test]
    fn missing_document_is_checked_before_schema() {
        let validator = SchemaValidator::new("also-missing.xsd");
        let err = validator
            .validate(Path::new("missing-invoice.xml"))
            .expect_err("document missing");
        assert!(matches!(
            err,
            ValidationError::NotFound {
                resource: Resource::Document,
                ..
            }
        ));
    }

    #[test]
    fn broken_schema_is_engine_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let xsd = dir.path().join("broken.xsd");
        std::fs::write(&xsd, "<xs:schema xmlns:xs='http://www.w3.org/2001/XMLSchema'><xs:element/></xs:schema>")
            .expect("write xsd");
        let document = dir.path().join("invoice.xml");
        std::fs::write(&document, "<Invoice/>").expect("write document");

        let err = SchemaValidator::new(&xsd)
            .validate(&document)
            .expect_err("broken schema");
        assert!(matches!(err, ValidationError::SchemaEngine(_)));
    }

    #[test]
    fn empty_diagnostics_still_report_failure() {
        assert_eq!(format_validation_errors(Vec::new()).len(), 1);
    }

    #[test]
    fn unclosed_tag_in_string_is_parse_finding() {
        let dir = tempfile::tempdir().expect("tempdir");
        let xsd = dir.path().join("any.xsd");
        std::fs::write(
            &xsd,
            "<xs:schema xmlns:xs='http://www.w3.org/2001/XMLSchema'><xs:element name='Invoice'/></xs:schema>",
        )
        .expect("write xsd");

        let validator = SchemaValidator::new(&xsd);
        assert!(validator.validate_str("<Invoice/>").expect("validate").is_clean());

        let result = validator
            .validate_str("<Invoice><Note>")
            .expect("validate");
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].starts_with("Failed to parse XML: "));
    }
}
