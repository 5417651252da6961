use crate::core::derive::DEFAULT_ANGULAR_RESOLUTION;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TEMPLATE_NAME: &str = "rd3d_input_template.txt";
pub const DEFAULT_FALLBACK_STRUCTURE: &str = "2vb1.pdb";
pub const DEFAULT_REGISTRY_URL: &str = "https://files.rcsb.org/view/{code}.pdb";
pub const DEFAULT_REGISTRY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// The external simulator executable and the arguments preceding `-i`/`-p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SimulatorCommand {
    /// `java -jar <jar>`, the way RADDOSE-3D is distributed.
    pub fn java_jar(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        Self {
            program: java.into(),
            args: vec!["-jar".to_string(), jar.into().display().to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    pub bin_dir: PathBuf,
    pub work_dir: PathBuf,
    pub template_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureConfig {
    pub reference: String,
    pub fallback_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub paths: PathConfig,
    pub simulator: SimulatorCommand,
    pub structure: StructureConfig,
    pub angular_resolution: f64,
}

#[derive(Default)]
pub struct RunConfigBuilder {
    bin_dir: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    template_name: Option<String>,
    simulator: Option<SimulatorCommand>,
    structure_reference: Option<String>,
    fallback_structure: Option<String>,
    angular_resolution: Option<f64>,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bin_dir(mut self, path: PathBuf) -> Self {
        self.bin_dir = Some(path);
        self
    }
    pub fn work_dir(mut self, path: PathBuf) -> Self {
        self.work_dir = Some(path);
        self
    }
    pub fn template_name(mut self, name: impl Into<String>) -> Self {
        self.template_name = Some(name.into());
        self
    }
    pub fn simulator(mut self, command: SimulatorCommand) -> Self {
        self.simulator = Some(command);
        self
    }
    pub fn structure_reference(mut self, reference: impl Into<String>) -> Self {
        self.structure_reference = Some(reference.into());
        self
    }
    pub fn fallback_structure(mut self, name: impl Into<String>) -> Self {
        self.fallback_structure = Some(name.into());
        self
    }
    pub fn angular_resolution(mut self, degrees: f64) -> Self {
        self.angular_resolution = Some(degrees);
        self
    }

    pub fn build(self) -> Result<RunConfig, ConfigError> {
        let angular_resolution = self
            .angular_resolution
            .unwrap_or(DEFAULT_ANGULAR_RESOLUTION);
        if !angular_resolution.is_finite() || angular_resolution <= 0.0 {
            return Err(ConfigError::InvalidValue {
                name: "angular_resolution",
                reason: format!("must be positive, got {}", angular_resolution),
            });
        }

        let fallback_name = self
            .fallback_structure
            .unwrap_or_else(|| DEFAULT_FALLBACK_STRUCTURE.to_string());

        Ok(RunConfig {
            paths: PathConfig {
                bin_dir: self.bin_dir.ok_or(ConfigError::MissingParameter("bin_dir"))?,
                work_dir: self
                    .work_dir
                    .ok_or(ConfigError::MissingParameter("work_dir"))?,
                template_name: self
                    .template_name
                    .unwrap_or_else(|| DEFAULT_TEMPLATE_NAME.to_string()),
            },
            simulator: self
                .simulator
                .ok_or(ConfigError::MissingParameter("simulator"))?,
            structure: StructureConfig {
                reference: self
                    .structure_reference
                    .unwrap_or_else(|| fallback_name.clone()),
                fallback_name,
            },
            angular_resolution,
        })
    }
}
