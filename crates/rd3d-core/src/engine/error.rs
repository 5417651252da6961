use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use super::paths::PathError;
use super::runner::RunError;
use crate::core::io::results::ResultError;
use crate::core::io::template::TemplateError;
use crate::core::models::collection::InputError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid collection parameters: {0}")]
    Input(#[from] InputError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Paths(#[from] PathError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Cannot copy template '{template}' to '{input}': {source}", template = .template.display(), input = .input.display())]
    TemplateCopy {
        template: PathBuf,
        input: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Simulation(#[from] RunError),

    #[error("Failed to read simulation results: {0}")]
    Results(#[from] ResultError),
}

impl EngineError {
    /// Whether the run was refused because another run holds the working
    /// directory.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Paths(PathError::Busy { .. }))
    }
}
