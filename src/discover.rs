//! Project discovery
//!
//! Walks the project tree (honoring `.gitignore`), groups Rust source files
//! into packages (one package per directory that directly contains `.rs`
//! files), and builds the read-only [`StrategyParameter`] bundle every
//! strategy consumes. Discovery failure is the one fatal error of a run:
//! nothing useful can happen without the package maps.

use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Fatal discovery failures; surfaced to the caller before any strategy runs.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("project path {0:?} does not exist")]
    MissingRoot(PathBuf),
    #[error("project path {0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("no Rust source files found under {0:?}")]
    NoSources(PathBuf),
}

/// Read-only input bundle shared by every strategy in one run.
#[derive(Debug, Clone, Default)]
pub struct StrategyParameter {
    /// package name -> directory, for every package with source files
    pub all_dirs: BTreeMap<String, PathBuf>,
    /// subset of `all_dirs` whose packages carry test code
    pub unit_test_dirs: BTreeMap<String, PathBuf>,
    pub project_path: PathBuf,
    /// comma-separated substrings; matching packages were dropped during
    /// discovery and the raw spec is kept for display
    pub except_packages: String,
}

impl StrategyParameter {
    /// Whether a package name matches the exclusion spec.
    pub fn excluded(&self, package: &str) -> bool {
        excluded_by(&self.except_packages, package)
    }
}

fn excluded_by(except: &str, package: &str) -> bool {
    except
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .any(|needle| package.contains(needle))
}

/// Source files directly inside a package directory (non-recursive; nested
/// directories are their own packages).
pub fn rust_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    files.sort();
    files
}

/// Whether file content carries unit tests.
fn has_test_code(content: &str) -> bool {
    content.contains("#[test]") || content.contains("#[cfg(test)]")
}

/// Resolve the project root and build the parameter bundle.
///
/// `except` is a comma-separated list of package-name substrings to drop.
pub fn discover(project_path: &Path, except: &str) -> Result<StrategyParameter, DiscoveryError> {
    if !project_path.exists() {
        return Err(DiscoveryError::MissingRoot(project_path.to_path_buf()));
    }
    if !project_path.is_dir() {
        return Err(DiscoveryError::NotADirectory(project_path.to_path_buf()));
    }

    let mut all_dirs: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut unit_test_dirs: BTreeMap<String, PathBuf> = BTreeMap::new();

    let walker = WalkBuilder::new(project_path)
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .build();

    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }
        let Some(dir) = path.parent() else { continue };
        let name = package_name(project_path, dir);
        if excluded_by(except, &name) {
            continue;
        }

        all_dirs.entry(name.clone()).or_insert_with(|| dir.to_path_buf());

        if !unit_test_dirs.contains_key(&name) {
            let tested = std::fs::read_to_string(path)
                .map(|content| has_test_code(&content))
                .unwrap_or(false);
            if tested {
                unit_test_dirs.insert(name, dir.to_path_buf());
            }
        }
    }

    if all_dirs.is_empty() {
        return Err(DiscoveryError::NoSources(project_path.to_path_buf()));
    }

    debug!(
        "discovered {} packages ({} with tests)",
        all_dirs.len(),
        unit_test_dirs.len()
    );

    Ok(StrategyParameter {
        all_dirs,
        unit_test_dirs,
        project_path: project_path.to_path_buf(),
        except_packages: except.to_string(),
    })
}

/// Package name: the directory path relative to the project root, `.` for
/// the root itself.
fn package_name(root: &Path, dir: &Path) -> String {
    match dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => dir.to_string_lossy().replace('\\', "/"),
    }
}
