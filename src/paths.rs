//! Centralized path resolution for furnace
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `--config-dir` flag (or `FURNACE_CONFIG_DIR`, wired through clap)
//! 2. `XDG_CONFIG_HOME/furnace` (if set)
//! 3. Platform default:
//!    - Windows: `%APPDATA%\furnace`
//!    - macOS/Linux: `~/.config/furnace`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "FURNACE_CONFIG_DIR";

/// Name of the main settings file inside the config directory
pub const SETTINGS_FILE: &str = "furnace.toml";

/// Name of the EC2 settings file inside the config directory
pub const EC2_CONFIG_FILE: &str = "ec2_conf.json";

/// Get the furnace config directory path
pub fn config_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    resolve_config_dir(
        explicit,
        std::env::var("XDG_CONFIG_HOME").ok().as_deref(),
        dirs::home_dir(),
    )
}

fn resolve_config_dir(
    explicit: Option<&Path>,
    xdg_config_home: Option<&str>,
    home: Option<PathBuf>,
) -> Result<PathBuf> {
    // 1. Explicit override
    if let Some(dir) = explicit {
        let path = expand(&dir.to_string_lossy());
        log::debug!("Using config dir from flag/{}: {}", ENV_CONFIG_DIR, path.display());
        return Ok(path);
    }

    // 2. Check XDG_CONFIG_HOME
    if let Some(xdg_config) = xdg_config_home.filter(|s| !s.is_empty()) {
        let path = PathBuf::from(xdg_config).join("furnace");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    // 3. Platform default
    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("furnace");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = home.context("Could not determine home directory")?;
    let path = home.join(".config").join("furnace");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

/// Resolve a configured path: expanded, and relative to `base` unless
/// already absolute.
pub fn resolve_in(base: &Path, path: &str) -> PathBuf {
    let expanded = expand(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let result = resolve_config_dir(
            Some(Path::new("/custom/config/path")),
            Some("/xdg"),
            Some(PathBuf::from("/home/ops")),
        )
        .unwrap();
        assert_eq!(result, PathBuf::from("/custom/config/path"));
    }

    #[test]
    fn test_xdg_config_home() {
        let result =
            resolve_config_dir(None, Some("/tmp/xdg-config-test"), Some(PathBuf::from("/home/ops")))
                .unwrap();
        assert_eq!(result, PathBuf::from("/tmp/xdg-config-test/furnace"));
    }

    #[cfg(unix)]
    #[test]
    fn test_default_config_dir_unix() {
        let result = resolve_config_dir(None, Some(""), Some(PathBuf::from("/home/ops"))).unwrap();
        assert_eq!(result, PathBuf::from("/home/ops/.config/furnace"));
    }

    #[cfg(unix)]
    #[test]
    fn test_no_home_is_an_error() {
        assert!(resolve_config_dir(None, None, None).is_err());
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$NONEXISTENT_VAR_12345/file");
        assert_eq!(result, PathBuf::from("/path/$NONEXISTENT_VAR_12345/file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_in() {
        let base = Path::new("/etc/furnace");
        assert_eq!(
            resolve_in(base, "stack.template"),
            PathBuf::from("/etc/furnace/stack.template")
        );
        assert_eq!(resolve_in(base, "/srv/t.json"), PathBuf::from("/srv/t.json"));
    }
}
