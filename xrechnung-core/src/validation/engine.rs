//! Rule engines that run a compiled Schematron (XSLT) transform over a document.
use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::validation::{Resource, ValidationError, parse_well_formed, resolve_existing};

const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";
const XSL_PLACEHOLDER: &str = "{xsl}";
const XML_PLACEHOLDER: &str = "{xml}";

pub const DEFAULT_SAXON_JAR: &str = "./resources/saxon/saxon-he.jar";

/// A rule transform that was checked by the engine and is ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTransform {
    path: PathBuf,
}

impl CompiledTransform {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Evaluates business rules and returns the SVRL results document.
pub trait RuleEngine {
    fn name(&self) -> &str;

    /// Whether the engine can run in the current environment.
    fn is_available(&self) -> bool;

    fn compile(&self, transform: &Path) -> Result<CompiledTransform, ValidationError>;

    fn execute(
        &self,
        transform: &CompiledTransform,
        document: &Path,
    ) -> Result<String, ValidationError>;
}

/// An external XSLT processor driven through its command line.
///
/// Arguments may contain `{xsl}` and `{xml}`, replaced by the stylesheet and
/// document paths. The SVRL report is read from standard output.
///
/// # Examples
/// ```rust
/// use xrechnung_core::validation::XsltCommand;
///
/// let saxon = XsltCommand::saxon("saxon-he.jar");
/// assert_eq!(saxon.program(), "java");
/// assert_eq!(saxon.args(), ["-jar", "saxon-he.jar", "-s:{xml}", "-xsl:{xsl}"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XsltCommand {
    name: String,
    program: String,
    args: Vec<String>,
    runtime_files: Vec<PathBuf>,
}

impl XsltCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        Self {
            name: program.clone(),
            program,
            args: args.into_iter().map(Into::into).collect(),
            runtime_files: Vec::new(),
        }
    }

    /// Saxon-HE run from its jar; needed for the XSLT 2.0 PEPPOL/XRechnung rules.
    pub fn saxon(jar: impl Into<PathBuf>) -> Self {
        let jar = jar.into();
        let mut command = Self::new(
            "java",
            [
                "-jar".to_string(),
                jar.display().to_string(),
                format!("-s:{XML_PLACEHOLDER}"),
                format!("-xsl:{XSL_PLACEHOLDER}"),
            ],
        )
        .requires_file(jar);
        command.name = "saxon-he".to_string();
        command
    }

    /// libxslt's `xsltproc`. Only handles XSLT 1.0 stylesheets.
    pub fn xsltproc() -> Self {
        Self::new("xsltproc", [XSL_PLACEHOLDER, XML_PLACEHOLDER])
    }

    /// A file that must exist for the engine to be available.
    pub fn requires_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.runtime_files.push(path.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn runtime_files(&self) -> &[PathBuf] {
        &self.runtime_files
    }

    fn render_args(&self, xsl: &Path, xml: &Path) -> Vec<String> {
        let xsl = xsl.display().to_string();
        let xml = xml.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(XSL_PLACEHOLDER, &xsl)
                    .replace(XML_PLACEHOLDER, &xml)
            })
            .collect()
    }
}

impl Default for XsltCommand {
    fn default() -> Self {
        Self::saxon(DEFAULT_SAXON_JAR)
    }
}

impl RuleEngine for XsltCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        if !program_on_path(&self.program) {
            tracing::debug!(program = %self.program, "rule engine program not found");
            return false;
        }
        self.runtime_files.iter().all(|file| {
            let exists = file.is_file();
            if !exists {
                tracing::debug!(file = %file.display(), "rule engine runtime file missing");
            }
            exists
        })
    }

    fn compile(&self, transform: &Path) -> Result<CompiledTransform, ValidationError> {
        let path = resolve_existing(transform, Resource::RuleTransform)?;
        let compile_error = |message: String| ValidationError::Compile {
            path: path.clone(),
            message,
        };
        let source = std::fs::read_to_string(&path)
            .map_err(|e| compile_error(format!("cannot read stylesheet: {e}")))?;
        let doc = parse_well_formed(&source)
            .map_err(|errors| compile_error(format!("not well-formed XML: {}", errors.join("; "))))?;
        let Some(root) = doc.get_root_element() else {
            return Err(compile_error("empty document".into()));
        };

        let is_xslt = root
            .get_namespace()
            .is_some_and(|ns| ns.get_href() == XSLT_NS);
        let name = root.get_name();
        if !is_xslt || !matches!(name.as_str(), "stylesheet" | "transform") {
            return Err(compile_error(format!(
                "root element <{name}> is not an XSLT stylesheet"
            )));
        }
        Ok(CompiledTransform::new(path))
    }

    fn execute(
        &self,
        transform: &CompiledTransform,
        document: &Path,
    ) -> Result<String, ValidationError> {
        let args = self.render_args(transform.path(), document);
        tracing::debug!(program = %self.program, ?args, "spawning XSLT processor");

        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ValidationError::EngineUnavailable {
                        engine: self.name.clone(),
                    }
                } else {
                    ValidationError::Transform(format!("failed to run {}: {e}", self.program))
                }
            })?;

        if !output.status.success() {
            return Err(ValidationError::Transform(format!(
                "{} exited with {}: {}",
                self.name,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| ValidationError::Transform(format!("output is not UTF-8: {e}")))
    }
}

fn program_on_path(program: &str) -> bool {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| {
        dir.join(program).is_file()
            || (cfg!(windows) && dir.join(format!("{program}.exe")).is_file())
    })
}
