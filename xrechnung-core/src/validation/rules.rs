//! EN16931 business-rule validation and result classification.
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::validation::engine::{RuleEngine, XsltCommand};
use crate::validation::{
    Resource, ValidationError, ValidationResult, Validator, resolve_existing, svrl,
};

/// Report section title for semantic validation results.
pub const REPORT_TITLE: &str = "EN16931 Semantic Validation";

/// Message of the PEPPOL empty-elements rule, reported as a warning by default.
pub const EMPTY_ELEMENTS_MESSAGE: &str = "Document MUST not contain empty elements.";

/// Severity carried by the `flag` attribute of a failed assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Unknown(String),
}

impl Severity {
    /// A missing or empty flag counts as `Error`.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            None | Some("") => Severity::Error,
            Some("fatal") => Severity::Fatal,
            Some("error") => Severity::Error,
            Some("warning") => Severity::Warning,
            Some(other) => Severity::Unknown(other.to_string()),
        }
    }
}

/// One failed rule from the SVRL report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub severity: Severity,
    pub message: String,
    pub id: Option<String>,
    pub location: Option<String>,
}

impl Assertion {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            id: None,
            location: None,
        }
    }
}

/// Messages that are always reported as warnings, whatever their flag says.
///
/// # Examples
/// ```rust
/// use xrechnung_core::validation::ReclassificationPolicy;
///
/// let policy = ReclassificationPolicy::default();
/// assert!(policy.downgrades("Document MUST not contain empty elements."));
/// assert!(!ReclassificationPolicy::none().downgrades("Document MUST not contain empty elements."));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclassificationPolicy {
    warnings: Vec<String>,
}

impl ReclassificationPolicy {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            warnings: messages.into_iter().map(Into::into).collect(),
        }
    }

    /// A policy that leaves every flag as reported.
    pub fn none() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    /// Exact match against the trimmed assertion text.
    pub fn downgrades(&self, message: &str) -> bool {
        self.warnings.iter().any(|m| m == message)
    }

    pub fn messages(&self) -> &[String] {
        &self.warnings
    }
}

impl Default for ReclassificationPolicy {
    fn default() -> Self {
        Self::new([EMPTY_ELEMENTS_MESSAGE])
    }
}

/// Sort assertions into errors and warnings, keeping their order.
pub fn classify<I>(assertions: I, policy: &ReclassificationPolicy) -> ValidationResult
where
    I: IntoIterator<Item = Assertion>,
{
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for assertion in assertions {
        tracing::debug!(
            id = assertion.id.as_deref().unwrap_or("-"),
            location = assertion.location.as_deref().unwrap_or("-"),
            severity = ?assertion.severity,
            "failed assertion"
        );
        if policy.downgrades(&assertion.message) {
            warnings.push(assertion.message);
            continue;
        }
        match assertion.severity {
            Severity::Fatal | Severity::Error => errors.push(assertion.message),
            Severity::Warning => warnings.push(assertion.message),
            Severity::Unknown(flag) => {
                tracing::warn!(%flag, "unknown assertion flag, reporting as warning");
                warnings.push(format!("[Unknown flag: {flag}] {}", assertion.message));
            }
        }
    }

    ValidationResult::new(errors, warnings)
}

/// Semantic validation through a compiled Schematron transform.
///
/// # Examples
/// ```rust,no_run
/// use std::path::Path;
/// use xrechnung_core::validation::{RuleValidator, XsltCommand};
///
/// let validator = RuleValidator::with_engine(
///     "resources/peppol/billing-bis/3.0.18/PEPPOL-EN16931-UBL.xslt",
///     XsltCommand::saxon("resources/saxon/saxon-he.jar"),
/// );
/// let result = validator.validate(Path::new("invoice.xml"))?;
/// println!("{} errors, {} warnings", result.errors().len(), result.warnings().len());
/// # Ok::<(), xrechnung_core::validation::ValidationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RuleValidator<E: RuleEngine = XsltCommand> {
    transform_path: PathBuf,
    engine: E,
    policy: ReclassificationPolicy,
}

impl RuleValidator<XsltCommand> {
    /// Validator using the default Saxon-HE engine.
    pub fn new(transform_path: impl Into<PathBuf>) -> Self {
        Self::with_engine(transform_path, XsltCommand::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_engine(config.rule_transform_path(), config.rule_engine().clone())
            .with_policy(config.reclassification().clone())
    }
}

impl<E: RuleEngine> RuleValidator<E> {
    pub fn with_engine(transform_path: impl Into<PathBuf>, engine: E) -> Self {
        Self {
            transform_path: transform_path.into(),
            engine,
            policy: ReclassificationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReclassificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ReclassificationPolicy {
        &self.policy
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn transform_path(&self) -> &Path {
        &self.transform_path
    }

    pub fn validate(&self, path: &Path) -> Result<ValidationResult, ValidationError> {
        let document = resolve_existing(path, Resource::Document)?;
        if !self.engine.is_available() {
            return Err(ValidationError::EngineUnavailable {
                engine: self.engine.name().to_string(),
            });
        }

        let compiled = self.engine.compile(&self.transform_path)?;
        tracing::debug!(
            document = %document.display(),
            transform = %compiled.path().display(),
            engine = self.engine.name(),
            "running rule transform"
        );
        let output = self.engine.execute(&compiled, &document)?;
        let result = self.classify_svrl(&output)?;
        tracing::info!(
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "rule validation finished"
        );
        Ok(result)
    }

    /// Classify an SVRL report produced elsewhere.
    pub fn classify_svrl(&self, svrl: &str) -> Result<ValidationResult, ValidationError> {
        let assertions = svrl::parse_failed_asserts(svrl)?;
        Ok(classify(assertions, &self.policy))
    }
}

impl<E: RuleEngine> Validator for RuleValidator<E> {
    fn report_title(&self) -> &'static str {
        REPORT_TITLE
    }

    fn validate(&self, document: &Path) -> Result<ValidationResult, ValidationError> {
        RuleValidator::validate(self, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assertion(flag: Option<&str>, message: &str) -> Assertion {
        Assertion::new(Severity::from_flag(flag), message)
    }

    #[test]
    fn parses_known_and_unknown_flags() {
        assert_eq!(Severity::from_flag(Some("fatal")), Severity::Fatal);
        assert_eq!(Severity::from_flag(Some("error")), Severity::Error);
        assert_eq!(Severity::from_flag(Some("warning")), Severity::Warning);
        assert_eq!(Severity::from_flag(None), Severity::Error);
        assert_eq!(Severity::from_flag(Some("")), Severity::Error);
        assert_eq!(
            Severity::from_flag(Some("information")),
            Severity::Unknown("information".into())
        );
    }

    #[test]
    fn flags_are_case_sensitive() {
        assert_eq!(
            Severity::from_flag(Some("FATAL")),
            Severity::Unknown("FATAL".into())
        );
    }

    #[test]
    fn classifies_by_flag_in_order() {
        let result = classify(
            vec![
                assertion(Some("fatal"), "f1"),
                assertion(Some("warning"), "w1"),
                assertion(Some("error"), "e1"),
                assertion(None, "e2"),
                assertion(Some("warning"), "w2"),
            ],
            &ReclassificationPolicy::default(),
        );
        assert_eq!(result.errors(), ["f1", "e1", "e2"]);
        assert_eq!(result.warnings(), ["w1", "w2"]);
    }

    #[test]
    fn unknown_flag_is_prefixed_warning() {
        let result = classify(
            vec![assertion(Some("info"), "Note this")],
            &ReclassificationPolicy::default(),
        );
        assert!(result.errors().is_empty());
        assert_eq!(result.warnings(), ["[Unknown flag: info] Note this"]);
    }

    #[test]
    fn empty_elements_message_is_always_a_warning() {
        for flag in [Some("fatal"), Some("error"), None, Some("odd")] {
            let result = classify(
                vec![assertion(flag, EMPTY_ELEMENTS_MESSAGE)],
                &ReclassificationPolicy::default(),
            );
            assert!(result.errors().is_empty(), "flag {flag:?}");
            assert_eq!(result.warnings(), [EMPTY_ELEMENTS_MESSAGE], "flag {flag:?}");
        }
    }

    #[test]
    fn policy_is_configurable() {
        let policy = ReclassificationPolicy::none().with_warning("[BR-CL-10] noisy");
        let result = classify(
            vec![
                assertion(Some("fatal"), EMPTY_ELEMENTS_MESSAGE),
                assertion(Some("fatal"), "[BR-CL-10] noisy"),
            ],
            &policy,
        );
        assert_eq!(result.errors(), [EMPTY_ELEMENTS_MESSAGE]);
        assert_eq!(result.warnings(), ["[BR-CL-10] noisy"]);
    }

    #[test]
    fn policy_requires_exact_match() {
        let policy = ReclassificationPolicy::default();
        assert!(!policy.downgrades("Document MUST not contain empty elements"));
        assert!(!policy.downgrades("document must not contain empty elements."));
        assert_eq!(policy.messages(), [EMPTY_ELEMENTS_MESSAGE]);
    }

    #[test]
    fn no_assertions_is_clean() {
        assert!(classify(Vec::new(), &ReclassificationPolicy::default()).is_clean());
    }
}
