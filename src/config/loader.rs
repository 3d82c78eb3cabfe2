use crate::config::schema::{BridgeConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked up in the project root when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "spotlight-bridge.toml";

/// Where a config document came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Inline,
    File(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Inline => f.write_str("inline config"),
            ConfigOrigin::File(path) => write!(f, "config {}", path.display()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {source}")]
    Toml {
        origin: ConfigOrigin,
        source: toml_edit::de::Error,
    },

    #[error("invalid {origin}: {source}")]
    Validation {
        origin: ConfigOrigin,
        source: ValidationError,
    },
}

fn parse(input: &str, origin: ConfigOrigin) -> Result<BridgeConfig, ConfigError> {
    let config: BridgeConfig = match toml_edit::de::from_str(input) {
        Ok(config) => config,
        Err(source) => return Err(ConfigError::Toml { origin, source }),
    };
    match config.validate() {
        Ok(()) => Ok(config),
        Err(source) => Err(ConfigError::Validation { origin, source }),
    }
}

pub fn load_from_str(input: &str) -> Result<BridgeConfig, ConfigError> {
    parse(input, ConfigOrigin::Inline)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<BridgeConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, ConfigOrigin::File(path.to_path_buf()))
}

/// Config for an Expo project.
///
/// An explicit `path` must exist. Without one, `spotlight-bridge.toml` in
/// the project root is used when present, and defaults otherwise.
pub fn load_for_project(
    project_root: &Path,
    path: Option<&Path>,
) -> Result<BridgeConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = project_root.join(DEFAULT_CONFIG_FILE);
            if !candidate.is_file() {
                tracing::debug!(project = %project_root.display(), "no project config, using defaults");
                return Ok(BridgeConfig::default());
            }
            candidate
        }
    };
    tracing::debug!(config = %path.display(), "loading config");
    load_from_path(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appdelegate::{AnchorStrategy, PatchMode};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_parses_modes() {
        let config = load_from_str(
            r#"
[patch]
mode = "strict"
anchors = "marker-comments"
"#,
        )
        .unwrap();
        assert_eq!(config.patch.mode, PatchMode::Strict);
        assert_eq!(config.patch.anchors, AnchorStrategy::MarkerComments);
        assert_eq!(config.template.class_name, "AppDelegate");
    }

    #[test]
    fn test_unknown_mode_is_toml_error() {
        let err = load_from_str("[patch]\nmode = \"loud\"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Toml {
                origin: ConfigOrigin::Inline,
                ..
            }
        ));
        assert!(err.to_string().starts_with("failed to parse inline config"));
    }

    #[test]
    fn test_file_origin_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[template]\nclass_name = \"\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        match &err {
            ConfigError::Validation {
                origin: ConfigOrigin::File(p),
                ..
            } => assert_eq!(p, &path),
            other => panic!("expected validation error from file, got {other:?}"),
        }
        assert!(err.to_string().contains(DEFAULT_CONFIG_FILE));
        assert!(err.to_string().contains("template.class_name"));
    }

    #[test]
    fn test_project_config_lookup() {
        let dir = tempfile::tempdir().unwrap();

        // No file in the project root: defaults
        let config = load_for_project(dir.path(), None).unwrap();
        assert_eq!(config, BridgeConfig::default());

        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[patch]\nmode = \"strict\"\n",
        )
        .unwrap();
        let config = load_for_project(dir.path(), None).unwrap();
        assert_eq!(config.patch.mode, PatchMode::Strict);

        // An explicit path wins and must exist
        let other = dir.path().join("other.toml");
        let err = load_for_project(dir.path(), Some(other.as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
