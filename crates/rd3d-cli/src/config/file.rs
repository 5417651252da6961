use crate::error::{CliError, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilePathsConfig {
    pub bin_dir: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub template: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSimulatorConfig {
    /// Java executable.
    pub program: Option<PathBuf>,
    /// Simulator jar; relative paths are taken from the binary directory.
    pub jar: Option<PathBuf>,
    pub angular_resolution: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileStructureConfig {
    pub fallback: Option<String>,
    pub registry_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub offline: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileFluxConfig {
    pub live_source: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub paths: Option<FilePathsConfig>,
    pub simulator: Option<FileSimulatorConfig>,
    pub structure: Option<FileStructureConfig>,
    pub flux: Option<FileFluxConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// `config.toml` in the per-user configuration directory.
    pub fn default_location() -> Option<PathBuf> {
        ProjectDirs::from("org", "fmx", "rd3d").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the explicit file if given, else the per-user file if it exists.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_location() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found; using defaults.");
                Ok(Self::default())
            }
        }
    }
}
