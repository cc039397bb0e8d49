use crate::config::schema::{PipelineConfig, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "func-views.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config from {}: {}", path.display(), source)
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse config TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse config TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid config ({}): {}", path.display(), source),
                None => write!(f, "invalid config: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<PipelineConfig, ConfigError> {
    let config: PipelineConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PipelineConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load the explicit config if given, else `func-views.toml` in `dir` if it
/// exists, else the defaults.
pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<PipelineConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }

    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        return load_from_path(candidate);
    }

    Ok(PipelineConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ts::LocatorStrategy;

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_from_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.input.source_field, "whole_func_string");
        assert!(config.extraction.strip_comment_lines);
        assert_eq!(config.run.batch_size, 512);
    }

    #[test]
    fn full_config_parses() {
        let config = load_from_str(
            r#"
[input]
source_field = "code"

[extraction]
strategy = "query"
strip_comment_lines = false

[run]
jobs = 4
batch_size = 64
"#,
        )
        .unwrap();

        assert_eq!(config.input.source_field, "code");
        assert_eq!(config.extraction.strategy, LocatorStrategy::Query);
        assert!(!config.extraction.strip_comment_lines);
        assert_eq!(config.run.jobs, 4);

        let options = config.pipeline_options();
        assert_eq!(options.batch_size, 64);
        assert_eq!(options.view.strategy, LocatorStrategy::Query);
    }

    #[test]
    fn unknown_strategy_is_a_toml_error() {
        let result = load_from_str("[extraction]\nstrategy = \"regex\"\n");
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn unknown_key_is_a_toml_error() {
        let result = load_from_str("[run]\nthreads = 2\n");
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn validation_collects_every_issue() {
        let result = load_from_str("[input]\nsource_field = \" \"\n[run]\nbatch_size = 0\n");
        match result {
            Err(ConfigError::Validation { source, .. }) => assert_eq!(source.issues.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn path_is_attached_to_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[run]\nbatch_size = 0\n").unwrap();

        let message = load_from_path(&path).unwrap_err().to_string();
        assert!(message.contains("bad.toml"));
        assert!(message.contains("run.batch_size"));
    }

    #[test]
    fn discover_prefers_explicit_then_local_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            discover(None, dir.path()).unwrap(),
            PipelineConfig::default()
        );

        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "[input]\nsource_field = \"local\"\n",
        )
        .unwrap();
        assert_eq!(discover(None, dir.path()).unwrap().input.source_field, "local");

        let explicit = dir.path().join("other.toml");
        fs::write(&explicit, "[input]\nsource_field = \"explicit\"\n").unwrap();
        assert_eq!(
            discover(Some(&explicit), dir.path()).unwrap().input.source_field,
            "explicit"
        );
    }
}
