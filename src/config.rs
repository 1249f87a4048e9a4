//! Configuration: an optional TOML file in the application data directory,
//! overridden by command-line flags, resolved into [`Settings`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, UserDirs};
use serde::Deserialize;
use thiserror::Error;

use crate::catalog::DEFAULT_DEBOUNCE;
use crate::gabc::TransformOptions;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".chant-catalog";
const CONFIG_FILE_NAME: &str = "config.toml";
const CATALOG_FILE_NAME: &str = "chants.json";
const LOCALES_DIR_NAME: &str = "locales";
const CACHE_DIR_NAME: &str = "cache";
const LOG_FILE_NAME: &str = "chant-catalog.log";
/// Width handed to the notation engine when wrapping lines.
pub const DEFAULT_RENDER_WIDTH_PX: u32 = 800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not locate home directory")]
    NoHome,
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Raw file contents. Every field is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub catalog_path: Option<PathBuf>,
    pub locales_dir: Option<PathBuf>,
    pub language: Option<String>,
    pub download_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub debounce_ms: Option<u64>,
    pub render_width_px: Option<u32>,
    pub log_level: Option<String>,
    pub pipeline: Option<PipelineConfig>,
}

/// Initial state of the detail view toggles.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct PipelineConfig {
    pub clean: bool,
    pub heavy_clean: bool,
    pub line_breaks: bool,
    pub live_render: bool,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    /// Load the file if it exists; a missing file means defaults.
    pub fn load_optional(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values supplied on the command line. They win over the file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub catalog_path: Option<PathBuf>,
    pub locales_dir: Option<PathBuf>,
    pub language: Option<String>,
    pub download_dir: Option<PathBuf>,
}

/// Fully resolved settings used by the rest of the application.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub locales_dir: PathBuf,
    pub language: Option<String>,
    pub download_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub debounce: Duration,
    pub render_width_px: u32,
    pub log_level: Option<String>,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Merge file values and CLI overrides on top of defaults rooted at
    /// `data_dir`.
    pub fn resolve(data_dir: PathBuf, file: FileConfig, cli: CliOverrides) -> Self {
        let download_dir = cli
            .download_dir
            .or(file.download_dir)
            .or_else(default_download_dir)
            .unwrap_or_else(|| data_dir.clone());

        Self {
            catalog_path: cli
                .catalog_path
                .or(file.catalog_path)
                .unwrap_or_else(|| data_dir.join(CATALOG_FILE_NAME)),
            locales_dir: cli
                .locales_dir
                .or(file.locales_dir)
                .unwrap_or_else(|| data_dir.join(LOCALES_DIR_NAME)),
            language: cli.language.or(file.language),
            download_dir,
            cache_dir: file
                .cache_dir
                .unwrap_or_else(|| data_dir.join(CACHE_DIR_NAME)),
            debounce: file
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DEBOUNCE),
            render_width_px: file.render_width_px.unwrap_or(DEFAULT_RENDER_WIDTH_PX),
            log_level: file.log_level,
            pipeline: file.pipeline.unwrap_or_default(),
            data_dir,
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            clean: self.pipeline.clean,
            heavy_clean: self.pipeline.heavy_clean,
            line_breaks: self.pipeline.line_breaks,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

/// Resolve `~/.chant-catalog`.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHome)?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

fn default_download_dir() -> Option<PathBuf> {
    UserDirs::new().and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let file = FileConfig::parse(
            r#"
            language = "pt"
            debounce_ms = 150

            [pipeline]
            clean = true
            live_render = true
            "#,
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(file.language.as_deref(), Some("pt"));
        let pipeline = file.pipeline.unwrap();
        assert!(pipeline.clean);
        assert!(!pipeline.heavy_clean);
        assert!(pipeline.live_render);
    }

    #[test]
    fn rejects_malformed_file() {
        let err = FileConfig::parse("language = ", Path::new("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn cli_overrides_file_values() {
        let file = FileConfig {
            catalog_path: Some(PathBuf::from("/from/file.json")),
            language: Some("pt".to_string()),
            download_dir: Some(PathBuf::from("/downloads")),
            ..FileConfig::default()
        };
        let cli = CliOverrides {
            catalog_path: Some(PathBuf::from("/from/cli.json")),
            ..CliOverrides::default()
        };
        let settings = Settings::resolve(PathBuf::from("/data"), file, cli);
        assert_eq!(settings.catalog_path, PathBuf::from("/from/cli.json"));
        assert_eq!(settings.language.as_deref(), Some("pt"));
        assert_eq!(settings.download_dir, PathBuf::from("/downloads"));
        assert_eq!(settings.locales_dir, PathBuf::from("/data/locales"));
        assert_eq!(settings.debounce, DEFAULT_DEBOUNCE);
        assert_eq!(settings.render_width_px, DEFAULT_RENDER_WIDTH_PX);
    }

    #[test]
    fn missing_file_means_defaults() {
        let file = FileConfig::load_optional(Path::new("/no/such/config.toml")).unwrap();
        assert!(file.catalog_path.is_none());
        assert!(file.pipeline.is_none());
    }
}
