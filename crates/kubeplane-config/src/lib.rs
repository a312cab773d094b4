pub mod error;
pub mod settings;

pub use error::*;
pub use settings::*;

use std::path::{Path, PathBuf};

/// Environment variable naming a settings file directly
pub const CONFIG_ENV: &str = "KUBEPLANE_CONFIG";

/// Per-user kubeplane config directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("kubeplane");

    Ok(config_dir)
}

/// Finds the settings file
///
/// Search order:
/// 1. `KUBEPLANE_CONFIG` (direct path)
/// 2. `./kubeplane.yaml`
/// 3. `./.kubeplane/config.yaml`
/// 4. `<config dir>/kubeplane/config.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points to missing file {}", CONFIG_ENV, path.display());
    }

    let current_dir = std::env::current_dir()?;

    let path = current_dir.join("kubeplane.yaml");
    if path.exists() {
        return Ok(path);
    }

    let path = current_dir.join(".kubeplane").join("config.yaml");
    if path.exists() {
        return Ok(path);
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Loads settings from a specific file
pub fn load_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the discovered settings file, or defaults when there is none
pub fn load() -> Result<Settings> {
    match find_config_file() {
        Ok(path) => {
            tracing::debug!("Loading settings from {}", path.display());
            load_from(&path)
        }
        Err(ConfigError::ConfigFileNotFound) => {
            tracing::debug!("No settings file found, using defaults");
            Ok(Settings::default())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    /// Runs `f` inside `dir` with no env override and an empty user config dir
    fn in_dir<R>(dir: &Path, f: impl FnOnce() -> R) -> R {
        let xdg = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = temp_env::with_vars(
            [
                (CONFIG_ENV, None),
                ("XDG_CONFIG_HOME", Some(xdg.path().as_os_str())),
            ],
            f,
        );
        std::env::set_current_dir(original_dir).unwrap();
        result
    }

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("kubeplane"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("kubeplane.yaml"), "{}").unwrap();

        let result = in_dir(temp_dir.path(), find_config_file).unwrap();
        assert!(result.ends_with("kubeplane.yaml"));
    }

    #[test]
    #[serial]
    fn test_current_dir_beats_dot_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join(".kubeplane")).unwrap();
        fs::write(temp_dir.path().join(".kubeplane/config.yaml"), "{}").unwrap();
        fs::write(temp_dir.path().join("kubeplane.yaml"), "{}").unwrap();

        let result = in_dir(temp_dir.path(), find_config_file).unwrap();
        assert!(result.ends_with("kubeplane.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_dot_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::create_dir(temp_dir.path().join(".kubeplane")).unwrap();
        fs::write(temp_dir.path().join(".kubeplane/config.yaml"), "{}").unwrap();

        let result = in_dir(temp_dir.path(), find_config_file).unwrap();
        assert!(result.ends_with(".kubeplane/config.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "{}").unwrap();
        fs::write(temp_dir.path().join("kubeplane.yaml"), "{}").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();
        let result = temp_env::with_var(CONFIG_ENV, Some(&config_path), find_config_file);
        std::env::set_current_dir(original_dir).unwrap();

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    #[serial]
    fn test_not_found_loads_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();

        let found = in_dir(temp_dir.path(), find_config_file);
        assert!(matches!(found, Err(ConfigError::ConfigFileNotFound)));

        let settings = in_dir(temp_dir.path(), load).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    #[serial]
    fn test_load_discovered_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("kubeplane.yaml"),
            "timeouts:\n  operation_secs: 60\ncredentials:\n  key_env: MY_KEY\n",
        )
        .unwrap();

        let settings = in_dir(temp_dir.path(), load).unwrap();
        assert_eq!(settings.timeouts.operation_secs, 60);
        assert_eq!(settings.credentials.key_env, "MY_KEY");
        assert_eq!(settings.aws.default_region, DEFAULT_AWS_REGION);
    }

    #[test]
    fn test_load_from_rejects_bad_yaml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.yaml");
        fs::write(&path, "probe: [unclosed").unwrap();

        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_empty_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(load_from(&path).unwrap(), Settings::default());
    }
}
