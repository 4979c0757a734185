//! The `strata check` command: analyze the whole project.

use strata_diagnostics::{Diagnostic, Severity};

use crate::pipeline::{load_project, resolve_project_root};
use crate::{CheckArgs, Cli, ReportFormat};

/// Runs a full check; exit code 1 when any error diagnostic was found.
pub fn run(cli: &Cli, args: &CheckArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_project_root(cli)?;
    let (config, model) = load_project(&root)?;

    let diagnostics = model.check_all();
    render(&diagnostics, args.format, cli.quiet)?;

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let warnings = diagnostics.len() - errors;
    if !cli.quiet && args.format == ReportFormat::Text {
        println!(
            "{}: {} module(s), {} error(s), {} warning(s)",
            config.project.name,
            model.modules().len(),
            errors,
            warnings
        );
    }
    Ok(if errors > 0 { 1 } else { 0 })
}

/// Renders diagnostics to stdout in the requested format.
pub fn render(
    diagnostics: &[Diagnostic],
    format: ReportFormat,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        ReportFormat::Text => {
            for diag in diagnostics {
                if quiet && diag.severity != Severity::Error {
                    continue;
                }
                println!("{diag}");
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(diagnostics)?);
        }
    }
    Ok(())
}
