//! The `strata init` command: scaffold a new project.

use std::path::{Path, PathBuf};

/// Template for the generated `strata.toml`.
fn config_template(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"
version = "0.1.0"

[analysis]
source_dir = "src"
workers = 0

[layers]
# exports is eager and types lazy by default; `errors` is always eager.
# lazy = ["types"]
"#
    )
}

const GREETING_MODULE: &str = "# A module exports named, typed values.\ngreeting: str\ncount: int\n";
const MAIN_MODULE: &str = "use greeting\nmessage = greeting.greeting\n";

/// Creates a project skeleton in `name` (or the current directory).
pub fn run(name: Option<&str>) -> Result<i32, Box<dyn std::error::Error>> {
    let root = match name {
        Some(name) => {
            let dir = PathBuf::from(name);
            std::fs::create_dir_all(&dir)?;
            dir
        }
        None => std::env::current_dir()?,
    };
    if root.join("strata.toml").exists() {
        return Err(format!("{} already has a strata.toml", root.display()).into());
    }

    let project_name = project_name_of(&root);
    std::fs::write(root.join("strata.toml"), config_template(&project_name))?;
    let src = root.join("src");
    std::fs::create_dir_all(&src)?;
    std::fs::write(src.join("greeting.st"), GREETING_MODULE)?;
    std::fs::write(src.join("main.st"), MAIN_MODULE)?;

    println!("created project `{project_name}` at {}", root.display());
    Ok(0)
}

fn project_name_of(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("strata-project")
        .to_string()
}
