//! Cumulative HTML report over several validation passes.
//!
//! A [`ValidationReport`] creates its file on the first section written,
//! appends one section per call and writes the closing tags on
//! [`ValidationReport::close`].
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::config::Config;
use crate::validation::ValidationResult;
use quick_xml::escape::escape;
use thiserror::Error;

pub const DEFAULT_REPORT_FILE: &str = "results.html";

const HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>XRechnung Validation Report</title>
    <style>
        body { font-family: Arial, sans-serif; margin: 2em; background: #f9f9f9; }
        h1 { color: #333; }
        .error { color: red; }
        .warning { color: orange; }
        .section { margin-bottom: 2em; }
        ul { padding-left: 1.5em; }
    </style>
</head>
<body>
    <h1>XRechnung Validation Report</h1>

"#;

const FOOTER: &str = "</body></html>\n";

const NO_ISSUES: &str = "✅ No issues found.";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("report {} is already closed", path.display())]
    Closed { path: PathBuf },
}

/// Lifecycle of the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Uninitialized,
    Open,
    Closed,
}

#[derive(Debug)]
enum ReportState {
    Uninitialized,
    Open(File),
    Closed,
}

impl ReportState {
    fn status(&self) -> ReportStatus {
        match self {
            ReportState::Uninitialized => ReportStatus::Uninitialized,
            ReportState::Open(_) => ReportStatus::Open,
            ReportState::Closed => ReportStatus::Closed,
        }
    }
}

/// HTML report owned by the caller and shared by reference between passes.
///
/// Section writes and `close` are serialized, so the report can be used from
/// several threads.
///
/// # Examples
/// ```rust,no_run
/// use xrechnung_core::report::ValidationReport;
/// use xrechnung_core::validation::ValidationResult;
///
/// let report = ValidationReport::in_current_dir()?;
/// report.write_section("UBL Structure Validation", &ValidationResult::default())?;
/// report.close()?;
/// # Ok::<(), xrechnung_core::report::ReportError>(())
/// ```
#[derive(Debug)]
pub struct ValidationReport {
    path: PathBuf,
    state: Mutex<ReportState>,
}

impl ValidationReport {
    /// The file is not touched until the first section is written.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(ReportState::Uninitialized),
        }
    }

    /// `results.html` in the current working directory, resolved now.
    pub fn in_current_dir() -> Result<Self, ReportError> {
        let cwd = std::env::current_dir()?;
        Ok(Self::new(cwd.join(DEFAULT_REPORT_FILE)))
    }

    /// The report at [`Config::report_path`]. A relative path is resolved
    /// against the current working directory now.
    pub fn from_config(config: &Config) -> Result<Self, ReportError> {
        let cwd = std::env::current_dir()?;
        Ok(Self::new(cwd.join(config.report_path())))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn status(&self) -> ReportStatus {
        self.lock().status()
    }

    /// Append one section. The first call creates (or truncates) the file
    /// and writes the header. Fails with [`ReportError::Closed`] after
    /// [`close`](Self::close).
    pub fn write_section(&self, title: &str, result: &ValidationResult) -> Result<(), ReportError> {
        let mut state = self.lock();
        if let ReportState::Uninitialized = *state {
            let mut file = File::create(&self.path)?;
            file.write_all(HEADER.as_bytes())?;
            tracing::debug!(path = %self.path.display(), "report created");
            *state = ReportState::Open(file);
        }

        let ReportState::Open(file) = &mut *state else {
            return Err(ReportError::Closed {
                path: self.path.clone(),
            });
        };
        file.write_all(render_section(title, result).as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Write the closing tags. Does nothing if no section was ever written
    /// or the report is already closed.
    pub fn close(&self) -> Result<(), ReportError> {
        let mut state = self.lock();
        if let ReportState::Open(file) = &mut *state {
            file.write_all(FOOTER.as_bytes())?;
            file.flush()?;
            *state = ReportState::Closed;
            tracing::info!(path = %self.path.display(), "report written");
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReportState> {
        // a panic mid-write leaves at worst a truncated section; keep going
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Render one report section as an HTML fragment.
pub fn render_section(title: &str, result: &ValidationResult) -> String {
    let mut section = format!("<div class='section'>\n<h2>{}</h2>\n", escape(title));

    if result.is_clean() {
        section.push_str(&format!("<p>{NO_ISSUES}</p>\n"));
    } else {
        render_list(&mut section, "error", "Errors", result.errors());
        render_list(&mut section, "warning", "Warnings", result.warnings());
    }

    section.push_str("</div>\n");
    section
}

fn render_list(out: &mut String, class: &str, heading: &str, messages: &[String]) {
    if messages.is_empty() {
        return;
    }
    out.push_str(&format!(
        "<h3 class='{class}'>{heading}</h3>\n<ul class='{class}'>\n"
    ));
    for message in messages {
        out.push_str(&format!("<li>{}</li>\n", escape(message.as_str())));
    }
    out.push_str("</ul>\n");
}
