//! The `strata session` command: speculative re-analysis in an overlay.

use std::io::Read;
use std::path::PathBuf;

use strata_cache::CodeUpdate;
use strata_source::module_stem;

use crate::check::render;
use crate::pipeline::{load_project, resolve_project_root};
use crate::{Cli, ReportFormat, SessionArgs};

/// Replaces one file's content inside an overlay and reports the overlay's
/// diagnostics next to the untouched shared ones.
pub fn run(cli: &Cli, args: &SessionArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_project_root(cli)?;
    let (_config, model) = load_project(&root)?;

    let path = PathBuf::from(&args.path);
    let module = module_stem(&path)
        .ok_or_else(|| format!("cannot derive a module name from `{}`", path.display()))?
        .to_string();
    let replacement = read_replacement(&args.with)?;

    let session = model.create_overlay("cli");
    session.update_with_code(&[(path, CodeUpdate::Set(replacement))]);

    let overlay_diags = session.query_errors(&module);
    let root_diags = model.query_errors(&module);

    match args.format {
        ReportFormat::Text => {
            println!("--- shared state ({} diagnostics)", root_diags.len());
            render(&root_diags, args.format, cli.quiet)?;
            println!("--- session ({} diagnostics)", overlay_diags.len());
            render(&overlay_diags, args.format, cli.quiet)?;
        }
        ReportFormat::Json => {
            let payload = serde_json::json!({
                "module": module,
                "root": root_diags,
                "session": overlay_diags,
            });
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    model.remove_overlay("cli");
    Ok(0)
}

fn read_replacement(source: &str) -> Result<String, Box<dyn std::error::Error>> {
    if source == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}
