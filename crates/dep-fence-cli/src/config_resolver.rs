//! Locating the rule configuration for a run.
//!
//! Lookup order:
//!
//! 1. `--config <path>`
//! 2. `dep-fence.toml` or `.dep-fence.toml` in the project directory or the
//!    nearest ancestor, stopping at the repository root (a `.git` entry)
//! 3. `$DEP_FENCE_CONFIG_DIR/config.toml`, else `~/.dep-fence/config.toml`
//! 4. the built-in `base` preset
//!
//! Without `--project`, the search starts in the directory holding the
//! graph file, so `dep-fence check packages/web/graph.json` picks up
//! `packages/web/dep-fence.toml` from anywhere.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dep_fence_core::Config;

/// Project-level config file names, checked in order in each directory.
pub const PROJECT_CONFIG_NAMES: &[&str] = &["dep-fence.toml", ".dep-fence.toml"];

/// Preset used when no configuration file exists.
pub const BUILTIN_PRESET: &str = "base";

const GLOBAL_CONFIG_NAME: &str = "config.toml";
const CONFIG_DIR_ENV: &str = "DEP_FENCE_CONFIG_DIR";

/// Where the rule configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the project directory or one of its ancestors.
    Project(PathBuf),
    /// The per-user file in the global config directory.
    Global(PathBuf),
    /// No file anywhere: only [`BUILTIN_PRESET`].
    Builtin,
}

impl ConfigSource {
    /// The configuration file, unless the built-in preset is used.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Builtin => None,
        }
    }

    /// Loads the configuration this source points at.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not validate.
    pub fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            tracing::debug!("No config found, using the {BUILTIN_PRESET} preset");
            return Ok(Config {
                extends: vec![BUILTIN_PRESET.to_string()],
                ..Config::default()
            });
        };
        if matches!(self, Self::Global(_)) {
            tracing::info!("Using global config: {}", path.display());
        }
        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(p) => write!(f, "{} (--config)", p.display()),
            Self::Project(p) => write!(f, "{}", p.display()),
            Self::Global(p) => write!(f, "{} (global)", p.display()),
            Self::Builtin => write!(f, "built-in `{BUILTIN_PRESET}` preset"),
        }
    }
}

/// Picks the directory the project config search starts from.
///
/// `--project` wins; otherwise the graph file's directory; otherwise the
/// working directory (also for a graph read from stdin).
#[must_use]
pub fn project_dir(project: Option<&Path>, graph: Option<&Path>) -> PathBuf {
    if let Some(dir) = project {
        return dir.to_path_buf();
    }
    graph
        .filter(|g| *g != Path::new("-"))
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Resolves the configuration source for a run rooted at `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_with(project_dir, explicit, global_config_dir())
}

fn resolve_with(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    if let Some(path) = find_project_config(project_dir) {
        tracing::debug!("Found project config: {}", path.display());
        return ConfigSource::Project(path);
    }
    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|path| path.is_file())
        .map_or(ConfigSource::Builtin, ConfigSource::Global)
}

/// Searches `start` and its ancestors, nearest first. The directory that
/// holds `.git` is the last one searched.
fn find_project_config(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    for dir in start.ancestors() {
        let found = PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file());
        if found.is_some() {
            return found;
        }
        if dir.join(".git").exists() {
            break;
        }
    }
    None
}

/// The global config directory: `$DEP_FENCE_CONFIG_DIR`, else
/// `~/.dep-fence/`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|home| home.join(".dep-fence")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dep_fence_core::Severity;
    use std::fs;
    use tempfile::TempDir;

    /// A repository root (with `.git`) holding a nested package directory.
    fn repo() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("packages/web/src")).unwrap();
        (tmp, root)
    }

    // -- Project directory --

    #[test]
    fn project_dir_prefers_flag_then_graph_location() {
        let graph = Path::new("packages/web/graph.json");
        assert_eq!(
            project_dir(Some(Path::new("elsewhere")), Some(graph)),
            PathBuf::from("elsewhere")
        );
        assert_eq!(project_dir(None, Some(graph)), PathBuf::from("packages/web"));
        assert_eq!(project_dir(None, Some(Path::new("graph.json"))), PathBuf::from("."));
        assert_eq!(project_dir(None, Some(Path::new("-"))), PathBuf::from("."));
        assert_eq!(project_dir(None, None), PathBuf::from("."));
    }

    // -- Lookup order --

    #[test]
    fn nearest_package_config_wins() {
        let (_tmp, root) = repo();
        fs::write(root.join("dep-fence.toml"), "").unwrap();
        fs::write(root.join("packages/web/.dep-fence.toml"), "").unwrap();

        let source = resolve_with(&root.join("packages/web/src"), None, None);
        assert_eq!(
            source,
            ConfigSource::Project(root.join("packages/web/.dep-fence.toml"))
        );
    }

    #[test]
    fn repository_root_config_found_from_subdirectory() {
        let (_tmp, root) = repo();
        fs::write(root.join("dep-fence.toml"), "").unwrap();
        fs::write(root.join(".dep-fence.toml"), "").unwrap();

        let source = resolve_with(&root.join("packages/web"), None, None);
        assert_eq!(source, ConfigSource::Project(root.join("dep-fence.toml")));
    }

    #[test]
    fn search_stops_at_repository_root() {
        let tmp = TempDir::new().unwrap();
        let outer = tmp.path().canonicalize().unwrap();
        fs::write(outer.join("dep-fence.toml"), "").unwrap();
        let repo = outer.join("checkout");
        fs::create_dir_all(repo.join(".git")).unwrap();

        assert_eq!(resolve_with(&repo, None, None), ConfigSource::Builtin);
    }

    #[test]
    fn explicit_path_is_taken_unchecked() {
        let (_tmp, root) = repo();
        fs::write(root.join("dep-fence.toml"), "").unwrap();

        let source = resolve_with(&root, Some(Path::new("/nonexistent.toml")), None);
        assert_eq!(source, ConfigSource::Explicit("/nonexistent.toml".into()));
    }

    #[test]
    fn global_file_used_only_without_project_config() {
        let (_tmp, root) = repo();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join("config.toml"), "").unwrap();
        let global_dir = Some(global.path().to_path_buf());

        let source = resolve_with(&root, None, global_dir.clone());
        assert_eq!(source, ConfigSource::Global(global.path().join("config.toml")));

        fs::write(root.join("dep-fence.toml"), "").unwrap();
        assert!(matches!(
            resolve_with(&root, None, global_dir),
            ConfigSource::Project(_)
        ));
    }

    // -- Loading --

    #[test]
    fn builtin_source_extends_base_preset() {
        let (_tmp, root) = repo();
        let source = resolve_with(&root, None, None);
        assert_eq!(source.to_string(), "built-in `base` preset");

        let config = source.load().unwrap();
        assert_eq!(config.extends, vec![BUILTIN_PRESET]);
        assert_eq!(dep_fence_presets::resolve(&config).unwrap().len(), 6);
    }

    #[test]
    fn project_source_loads_file() {
        let (_tmp, root) = repo();
        fs::write(
            root.join("dep-fence.toml"),
            "extends = [\"ddd\"]\nfail_on = \"warn\"\n",
        )
        .unwrap();

        let source = resolve_with(&root.join("packages/web"), None, None);
        let config = source.load().unwrap();
        assert_eq!(config.extends, vec!["ddd"]);
        assert_eq!(config.fail_on, Severity::Warn);
    }

    #[test]
    fn missing_explicit_file_fails_to_load() {
        let source = ConfigSource::Explicit("/nonexistent/dep-fence.toml".into());
        assert_eq!(source.to_string(), "/nonexistent/dep-fence.toml (--config)");
        let err = source.load().unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
