//! Validation toolkit for UBL XRechnung invoices: XSD structure checks,
//! EN16931 business rules through a Schematron transform, and an HTML report.
//!
//! # Examples
//! ```rust,no_run
//! use std::path::Path;
//! use xrechnung_core::config::Config;
//! use xrechnung_core::report::ValidationReport;
//! use xrechnung_core::validation::{RuleValidator, SchemaValidator, Validator};
//!
//! let config = Config::default();
//! let invoice = Path::new("invoice.xml");
//! let report = ValidationReport::from_config(&config)?;
//!
//! let schema = SchemaValidator::from_config(&config);
//! report.write_section(schema.report_title(), &schema.validate(invoice)?)?;
//!
//! let rules = RuleValidator::from_config(&config);
//! report.write_section(rules.report_title(), &rules.validate(invoice)?)?;
//!
//! report.close()?;
//! # Ok::<(), xrechnung_core::Error>(())
//! ```
pub mod config;
pub mod report;
pub mod validation;

use thiserror::Error;

pub use config::{Config, EngineKind, EngineParseError};
pub use report::{ReportError, ValidationReport};
pub use validation::{ValidationError, ValidationResult};

/// Top-level error wrapper for core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] validation::ValidationError),
    #[error(transparent)]
    Report(#[from] report::ReportError),
    #[error(transparent)]
    Config(#[from] config::EngineParseError),
}

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::config::EngineParseError;
    use crate::report::ReportError;
    use crate::validation::ValidationError;
    use std::path::PathBuf;

    #[test]
    fn error_conversions_cover_variants() {
        let err: Error = ValidationError::Transform("svrl".into()).into();
        assert!(matches!(err, Error::Validation(_)));

        let err: Error = ReportError::Closed {
            path: PathBuf::from("results.html"),
        }
        .into();
        assert!(matches!(err, Error::Report(_)));

        let err: Error = EngineParseError::Invalid {
            input: "xalan".into(),
        }
        .into();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn transparent_errors_keep_message() {
        let err: Error = ValidationError::EngineUnavailable {
            engine: "saxon-he".into(),
        }
        .into();
        assert_eq!(err.to_string(), "rule engine unavailable: saxon-he");
    }
}
