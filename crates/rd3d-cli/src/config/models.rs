use rd3d::engine::config::RunConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    /// URL with a `{code}` placeholder.
    pub url_template: String,
    pub timeout: Duration,
    pub offline: bool,
}

pub struct AppConfig {
    pub run: RunConfig,
    pub registry: RegistrySettings,
    /// File holding the current flux at the sample, if a live source exists.
    pub live_flux_source: Option<PathBuf>,
}
