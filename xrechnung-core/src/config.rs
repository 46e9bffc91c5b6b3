//! Configuration: schema, rule transform, rule engine and report locations.
use crate::report::DEFAULT_REPORT_FILE;
use crate::validation::{ReclassificationPolicy, XsltCommand};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;

pub const DEFAULT_XSD_PATH: &str = "./resources/ubl/2.1/xsd/maindoc/UBL-Invoice-2.1.xsd";
pub const DEFAULT_RULE_TRANSFORM_PATH: &str =
    "./resources/peppol/billing-bis/3.0.18/PEPPOL-EN16931-UBL.xslt";

/// Which external XSLT processor runs the business rules.
/// - Saxon: Saxon-HE via `java -jar`, handles the XSLT 2.0 rule sets.
/// - Xsltproc: libxslt's command line tool, XSLT 1.0 only.
///
/// # Examples
/// ```rust
/// use std::str::FromStr;
/// use xrechnung_core::config::EngineKind;
///
/// let kind = EngineKind::from_str("xsltproc")?;
/// assert_eq!(kind, EngineKind::Xsltproc);
/// # Ok::<(), xrechnung_core::config::EngineParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Saxon,
    Xsltproc,
}

/// Error returned when parsing an [`EngineKind`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineParseError {
    #[error("invalid rule engine: {input} (expected saxon or xsltproc)")]
    Invalid { input: String },
}

impl FromStr for EngineKind {
    type Err = EngineParseError;
    fn from_str(engine: &str) -> Result<EngineKind, EngineParseError> {
        match engine.to_ascii_lowercase().as_str() {
            "saxon" => Ok(EngineKind::Saxon),
            "xsltproc" => Ok(EngineKind::Xsltproc),
            _ => Err(EngineParseError::Invalid {
                input: engine.to_string(),
            }),
        }
    }
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Saxon => "saxon",
            EngineKind::Xsltproc => "xsltproc",
        }
    }

    /// Build the engine command. `saxon_jar` is ignored for `xsltproc`.
    pub fn command(&self, saxon_jar: impl Into<PathBuf>) -> XsltCommand {
        match self {
            EngineKind::Saxon => XsltCommand::saxon(saxon_jar),
            EngineKind::Xsltproc => XsltCommand::xsltproc(),
        }
    }
}

/// Configuration shared by the validators and the report.
///
/// # Examples
/// ```rust
/// use xrechnung_core::config::Config;
/// use xrechnung_core::validation::XsltCommand;
///
/// let config = Config::new("schemas/UBL-Invoice-2.1.xsd", "rules/PEPPOL-EN16931-UBL.xslt")
///     .with_rule_engine(XsltCommand::xsltproc());
/// assert_eq!(config.rule_engine().program(), "xsltproc");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    xsd_path: PathBuf,
    rule_transform_path: PathBuf,
    rule_engine: XsltCommand,
    reclassification: ReclassificationPolicy,
    report_path: PathBuf,
}

impl Config {
    pub fn new(xsd_path: impl Into<PathBuf>, rule_transform_path: impl Into<PathBuf>) -> Self {
        Self {
            xsd_path: xsd_path.into(),
            rule_transform_path: rule_transform_path.into(),
            ..Self::default()
        }
    }

    pub fn with_xsd_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.xsd_path = path.into();
        self
    }

    pub fn with_rule_transform_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rule_transform_path = path.into();
        self
    }

    pub fn with_rule_engine(mut self, engine: XsltCommand) -> Self {
        self.rule_engine = engine;
        self
    }

    pub fn with_reclassification(mut self, policy: ReclassificationPolicy) -> Self {
        self.reclassification = policy;
        self
    }

    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    pub fn xsd_path(&self) -> &Path {
        &self.xsd_path
    }

    pub fn rule_transform_path(&self) -> &Path {
        &self.rule_transform_path
    }

    pub fn rule_engine(&self) -> &XsltCommand {
        &self.rule_engine
    }

    pub fn reclassification(&self) -> &ReclassificationPolicy {
        &self.reclassification
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }
}

// bundled resource layout relative to the working directory
impl Default for Config {
    fn default() -> Self {
        Config {
            xsd_path: PathBuf::from(DEFAULT_XSD_PATH),
            rule_transform_path: PathBuf::from(DEFAULT_RULE_TRANSFORM_PATH),
            rule_engine: XsltCommand::default(),
            reclassification: ReclassificationPolicy::default(),
            report_path: PathBuf::from(DEFAULT_REPORT_FILE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::RuleEngine;
    use crate::validation::rules::EMPTY_ELEMENTS_MESSAGE;

    #[test]
    fn parses_engine_kind_case_insensitively() {
        assert_eq!(EngineKind::from_str("SAXON"), Ok(EngineKind::Saxon));
        assert_eq!(EngineKind::from_str("xsltproc"), Ok(EngineKind::Xsltproc));
        assert_eq!(
            EngineKind::from_str("xalan"),
            Err(EngineParseError::Invalid {
                input: "xalan".into()
            })
        );
    }

    #[test]
    fn engine_kind_round_trips_name() {
        for kind in [EngineKind::Saxon, EngineKind::Xsltproc] {
            assert_eq!(EngineKind::from_str(kind.as_str()), Ok(kind));
        }
    }

    #[test]
    fn defaults_point_at_bundled_resources() {
        let config = Config::default();
        assert_eq!(config.xsd_path(), Path::new(DEFAULT_XSD_PATH));
        assert_eq!(config.rule_transform_path(), Path::new(DEFAULT_RULE_TRANSFORM_PATH));
        assert_eq!(config.rule_engine(), &XsltCommand::default());
        assert_eq!(config.reclassification().messages(), [EMPTY_ELEMENTS_MESSAGE]);
        assert_eq!(config.report_path(), Path::new("results.html"));
    }

    #[test]
    fn new_keeps_other_defaults() {
        let config = Config::new("a.xsd", "b.xslt").with_report_path("out/report.html");
        assert_eq!(config.xsd_path(), Path::new("a.xsd"));
        assert_eq!(config.rule_transform_path(), Path::new("b.xslt"));
        assert_eq!(config.report_path(), Path::new("out/report.html"));
        assert_eq!(config.rule_engine().name(), "saxon-he");
    }

    #[test]
    fn path_setters_override_defaults() {
        let config = Config::default()
            .with_xsd_path("custom.xsd")
            .with_rule_transform_path("custom.xslt");
        assert_eq!(config.xsd_path(), Path::new("custom.xsd"));
        assert_eq!(config.rule_transform_path(), Path::new("custom.xslt"));
        assert_eq!(config.report_path(), Path::new("results.html"));
    }
}
