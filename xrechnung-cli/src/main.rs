use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use xrechnung_core::config::{Config, EngineKind};
use xrechnung_core::report::ValidationReport;
use xrechnung_core::validation::{
    ReclassificationPolicy, RuleValidator, SchemaValidator, ValidationResult, Validator, rules,
    svrl,
};

/// Exit code when at least one validation error was found.
const EXIT_INVALID: u8 = 2;

#[derive(Parser)]
#[command(name = "xrechnung")]
#[command(about = "Validate UBL XRechnung invoices against the UBL schema and EN16931 rules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run structure and business-rule validation on an invoice.
    Validate {
        #[arg(long)]
        invoice: PathBuf,
        #[arg(long, env = "XRECHNUNG_XSD")]
        xsd: Option<PathBuf>,
        #[arg(long, env = "XRECHNUNG_RULES")]
        rules: Option<PathBuf>,
        #[arg(long, default_value = "saxon")]
        engine: EngineKind,
        #[arg(long, env = "XRECHNUNG_SAXON_JAR")]
        saxon_jar: Option<PathBuf>,
        /// Additional assertion messages to report as warnings.
        #[arg(long = "downgrade", value_name = "MESSAGE")]
        downgrade: Vec<String>,
        #[arg(long)]
        skip_rules: bool,
        /// Write an HTML report (default: results.html in the working directory).
        #[arg(long, value_name = "PATH")]
        report: Option<Option<PathBuf>>,
        #[arg(long)]
        json: bool,
    },
    /// Classify an SVRL report produced by another tool.
    Classify {
        #[arg(long)]
        svrl: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            invoice,
            xsd,
            rules,
            engine,
            saxon_jar,
            downgrade,
            skip_rules,
            report,
            json,
        } => {
            let policy = downgrade
                .into_iter()
                .fold(ReclassificationPolicy::default(), |policy, message| {
                    policy.with_warning(message)
                });
            let mut config = Config::default().with_reclassification(policy);
            if let Some(xsd) = xsd {
                config = config.with_xsd_path(xsd);
            }
            if let Some(rules) = rules {
                config = config.with_rule_transform_path(rules);
            }
            // saxon without a jar keeps the bundled default
            if engine != EngineKind::Saxon || saxon_jar.is_some() {
                config = config.with_rule_engine(engine.command(saxon_jar.unwrap_or_default()));
            }
            if let Some(Some(path)) = &report {
                config = config.with_report_path(path);
            }

            let report = report
                .is_some()
                .then(|| ValidationReport::from_config(&config))
                .transpose()
                .context("resolve report path")?;

            let schema = SchemaValidator::from_config(&config);
            let rules = RuleValidator::from_config(&config);
            let mut validators: Vec<&dyn Validator> = vec![&schema];
            if !skip_rules {
                validators.push(&rules);
            }

            let mut passes = Vec::new();
            let mut failure = None;
            for validator in validators {
                match run_pass(validator, &invoice, report.as_ref()) {
                    Ok(pass) => passes.push(pass),
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }

            // completed passes reach stdout and the report before a hard failure
            let closed = report
                .as_ref()
                .map(|report| {
                    report
                        .close()
                        .with_context(|| format!("finalize report {}", report.path().display()))
                })
                .transpose();
            print_passes(&passes, json)?;
            if let Some(err) = failure {
                return Err(err);
            }
            closed?;
            if let Some(report) = &report {
                eprintln!("Report written to {}", report.path().display());
            }
            Ok(exit_code(&passes))
        }
        Commands::Classify { svrl, json } => {
            let output = std::fs::read_to_string(&svrl)
                .with_context(|| format!("read SVRL report {}", svrl.display()))?;
            let assertions = svrl::parse_failed_asserts(&output)
                .with_context(|| format!("parse SVRL report {}", svrl.display()))?;
            let result = rules::classify(assertions, &ReclassificationPolicy::default());

            let passes = vec![(rules::REPORT_TITLE, result)];
            print_passes(&passes, json)?;
            Ok(exit_code(&passes))
        }
    }
}

fn run_pass(
    validator: &dyn Validator,
    invoice: &Path,
    report: Option<&ValidationReport>,
) -> Result<(&'static str, ValidationResult)> {
    let title = validator.report_title();
    let result = validator
        .validate(invoice)
        .with_context(|| format!("{title} of {}", invoice.display()))?;
    if let Some(report) = report {
        report
            .write_section(title, &result)
            .with_context(|| format!("write report {}", report.path().display()))?;
    }
    Ok((title, result))
}

fn print_passes(passes: &[(&'static str, ValidationResult)], json: bool) -> Result<()> {
    if json {
        let map: serde_json::Map<String, serde_json::Value> = passes
            .iter()
            .map(|(title, result)| Ok(((*title).to_string(), serde_json::to_value(result)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for (title, result) in passes {
        println!("▶ {title}");
        if result.is_clean() {
            println!("  OK: no issues found");
            continue;
        }
        for error in result.errors() {
            println!("  error: {error}");
        }
        for warning in result.warnings() {
            println!("  warning: {warning}");
        }
    }
    Ok(())
}

fn exit_code(passes: &[(&'static str, ValidationResult)]) -> ExitCode {
    if passes.iter().any(|(_, result)| result.has_errors()) {
        ExitCode::from(EXIT_INVALID)
    } else {
        ExitCode::SUCCESS
    }
}
