//! Shared helpers for CLI commands: project discovery and model loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use strata_analysis::{ModelOptions, SemanticModel};
use strata_cache::RefreshMode;
use strata_config::{load_config, LayerRefresh, ProjectConfig};
use strata_source::{ChangeEvent, FsProvider};

use crate::Cli;

/// The extension of Strata module files.
pub const MODULE_EXT: &str = "st";

/// Walks up from `start` looking for the nearest directory containing
/// `strata.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join("strata.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find strata.toml in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root from global CLI args.
///
/// If `--config` is given, uses that path (file → parent dir, dir →
/// itself). Otherwise walks up from the current directory.
pub fn resolve_project_root(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = cli.config {
        let path = PathBuf::from(config_path);
        if path.is_file() {
            Ok(path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(path)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Discovers `.st` module files under `dir`, recursively, sorted by path.
pub fn discover_source_files(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_dir(&path, files)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXT) {
            files.push(path);
        }
    }
    Ok(())
}

fn refresh_mode(config: &ProjectConfig, layer: &str, default: RefreshMode) -> RefreshMode {
    match config.layers.refresh_of(layer) {
        Some(LayerRefresh::Lazy) => RefreshMode::Lazy,
        Some(LayerRefresh::Eager) => RefreshMode::Eager,
        None => default,
    }
}

/// Loads the project at `root`: reads its configuration, assembles a
/// model over the source directory, and ingests every module file.
pub fn load_project(root: &Path) -> Result<(ProjectConfig, SemanticModel), Box<dyn std::error::Error>> {
    let config = load_config(root)?;
    let source_dir = root.join(&config.analysis.source_dir);

    let options = ModelOptions {
        workers: config.analysis.workers,
        exports_refresh: refresh_mode(&config, "exports", RefreshMode::Eager),
        types_refresh: refresh_mode(&config, "types", RefreshMode::Lazy),
    };
    let model = SemanticModel::new(Arc::new(FsProvider::new(&source_dir)), options)?;

    let files = if source_dir.is_dir() {
        discover_source_files(&source_dir)?
    } else {
        Vec::new()
    };
    let events: Vec<ChangeEvent> = files.into_iter().map(ChangeEvent::created).collect();
    model.update(&events);
    Ok((config, model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn scaffold(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("strata.toml"), "[project]\nname = \"t\"").unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        for (name, content) in files {
            fs::write(src.join(name), content).unwrap();
        }
        tmp
    }

    #[test]
    fn find_project_root_walks_up() {
        let tmp = scaffold(&[]);
        let nested = tmp.path().join("src");
        assert_eq!(find_project_root(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(find_project_root(tmp.path()).is_err());
    }

    #[test]
    fn discover_is_sorted_and_filtered() {
        let tmp = scaffold(&[("b.st", ""), ("a.st", ""), ("notes.txt", "")]);
        let files = discover_source_files(&tmp.path().join("src")).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.st", "b.st"]);
    }

    #[test]
    fn load_project_ingests_sources() {
        let tmp = scaffold(&[("a.st", "foo: int")]);
        let (_config, model) = load_project(tmp.path()).unwrap();
        assert_eq!(model.modules(), vec!["a".to_string()]);
    }

    #[test]
    fn load_project_without_config_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(load_project(tmp.path()).is_err());
    }
}
