use rd3d::core::derive::DEFAULT_ANGULAR_RESOLUTION;
use rd3d::engine::config::{
    DEFAULT_FALLBACK_STRUCTURE, DEFAULT_REGISTRY_TIMEOUT, DEFAULT_REGISTRY_URL,
    DEFAULT_TEMPLATE_NAME,
};
use rd3d::engine::paths::{DEFAULT_BIN_DIR, DEFAULT_WORK_DIR};

pub struct DefaultsConfig {
    pub bin_dir: String,
    pub work_dir: String,
    pub template: String,
    pub java: String,
    pub jar: String,
    pub angular_resolution: f64,
    pub fallback_structure: String,
    pub registry_url: String,
    pub timeout_secs: u64,
    pub offline: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            bin_dir: DEFAULT_BIN_DIR.to_string(),
            work_dir: DEFAULT_WORK_DIR.to_string(),
            template: DEFAULT_TEMPLATE_NAME.to_string(),
            java: "java".to_string(),
            jar: "raddose3d_4.jar".to_string(),
            angular_resolution: DEFAULT_ANGULAR_RESOLUTION,
            fallback_structure: DEFAULT_FALLBACK_STRUCTURE.to_string(),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            timeout_secs: DEFAULT_REGISTRY_TIMEOUT.as_secs(),
            offline: false,
        }
    }
}
