//! Project-level configuration support
//!
//! Loads per-project configuration from an `appraise.toml` file in the
//! project root. CLI flags always win over config values.
//!
//! # Configuration Format
//!
//! ```toml
//! # appraise.toml
//!
//! [exclude]
//! packages = ["vendor", "generated"]
//!
//! [defaults]
//! format = "text"
//!
//! [strategies]
//! disabled = ["SpellCheck"]
//! timeout_secs = 60
//! ```

use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Config file name searched for in the project root
const CONFIG_FILE: &str = "appraise.toml";

/// Default timeout for tool-wrapping strategies
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub exclude: ExcludeConfig,
    pub defaults: Defaults,
    pub strategies: StrategiesConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExcludeConfig {
    /// Package-name substrings to drop during discovery
    pub packages: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Output format when --format is not given
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    /// Strategy names to skip (case-insensitive)
    pub disabled: Vec<String>,
    /// Per-invocation timeout for tool-wrapping strategies
    pub timeout_secs: u64,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProjectConfig {
    /// Merge the config's exclusions with a CLI-supplied comma-separated
    /// spec; both contribute.
    pub fn except_spec(&self, cli_except: &str) -> String {
        let mut parts: Vec<&str> = cli_except
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        for pkg in &self.exclude.packages {
            let pkg = pkg.trim();
            if !pkg.is_empty() && !parts.contains(&pkg) {
                parts.push(pkg);
            }
        }
        parts.join(",")
    }
}

/// Load `appraise.toml` from the project root.
///
/// A missing file yields defaults; a malformed file warns and yields
/// defaults, because a broken config should never block an analysis run.
pub fn load_project_config(project_path: &Path) -> ProjectConfig {
    let path = project_path.join(CONFIG_FILE);
    let Ok(content) = std::fs::read_to_string(&path) else {
        debug!("no {CONFIG_FILE} found, using defaults");
        return ProjectConfig::default();
    };
    match toml::from_str(&content) {
        Ok(config) => {
            debug!("loaded config from {path:?}");
            config
        }
        Err(e) => {
            warn!("failed to parse {path:?}: {e}; using defaults");
            ProjectConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_full_config() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
[exclude]
packages = ["vendor"]

[defaults]
format = "json"

[strategies]
disabled = ["SpellCheck"]
timeout_secs = 10
"#,
        )
        .expect("write");

        let config = load_project_config(tmp.path());
        assert_eq!(config.exclude.packages, vec!["vendor"]);
        assert_eq!(config.defaults.format.as_deref(), Some("json"));
        assert_eq!(config.strategies.disabled, vec!["SpellCheck"]);
        assert_eq!(config.strategies.timeout_secs, 10);
    }

    #[test]
    fn test_missing_config_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = load_project_config(tmp.path());
        assert!(config.exclude.packages.is_empty());
        assert_eq!(config.strategies.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_malformed_config_degrades_to_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join(CONFIG_FILE), "not [valid toml").expect("write");
        let config = load_project_config(tmp.path());
        assert!(config.strategies.disabled.is_empty());
    }

    #[test]
    fn test_except_spec_merges_cli_and_config() {
        let config = ProjectConfig {
            exclude: ExcludeConfig {
                packages: vec!["vendor".into(), "bench".into()],
            },
            ..Default::default()
        };
        let spec = config.except_spec("target, vendor");
        assert_eq!(spec, "target,vendor,bench");
        assert_eq!(ProjectConfig::default().except_spec(""), "");
    }
}
