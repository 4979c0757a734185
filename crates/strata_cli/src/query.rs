//! The `strata query` command: ask for a single fact.

use strata_analysis::{ExportDecl, SemanticModel, TypeInfo};

use crate::pipeline::{load_project, resolve_project_root};
use crate::{Cli, QueryArgs};

/// Runs a single query against the shared (root) state.
pub fn run(cli: &Cli, args: &QueryArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_project_root(cli)?;
    let (_config, model) = load_project(&root)?;

    match args.target.split_once('.') {
        Some((module, name)) => {
            let info = model.query_type(module, name);
            println!("{}.{}: {}", module, name, render_type(&model, info));
        }
        None => {
            let module = &args.target;
            print_module(&model, module);
        }
    }
    Ok(0)
}

fn print_module(model: &SemanticModel, module: &str) {
    let summary = model.query_exports(module);
    let Some(summary) = summary.as_module().cloned() else {
        println!("{module}: no such module");
        return;
    };
    let interner = model.interner();
    for (name, decl) in &summary.exports {
        let rendered = match decl {
            ExportDecl::Declared(token) => interner.resolve(*token).to_string(),
            ExportDecl::Alias { module, name } => {
                format!("= {}.{}", interner.resolve(*module), interner.resolve(*name))
            }
        };
        println!("{}.{}: {}", module, interner.resolve(*name), rendered);
    }
    for diag in model.query_errors(module) {
        println!("{diag}");
    }
}

/// Renders a resolved type for display.
pub fn render_type(model: &SemanticModel, info: TypeInfo) -> String {
    match info {
        TypeInfo::Builtin(builtin) => builtin.to_string(),
        TypeInfo::Absent => "<unresolved>".to_string(),
        TypeInfo::Cycle => "<alias cycle>".to_string(),
        TypeInfo::Untracked(token) => {
            format!("<untracked `{}`>", model.interner().resolve(token))
        }
    }
}
