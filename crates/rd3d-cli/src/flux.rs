use rd3d::engine::flux::{FluxReader, LiveFlux};
use std::fs;
use std::path::PathBuf;

/// Reads the current flux from a file kept up to date by the beamline.
///
/// The file holds a single number in photons per second.
#[derive(Debug, Clone)]
pub struct FileFluxReader {
    path: PathBuf,
}

impl FileFluxReader {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FluxReader for FileFluxReader {
    fn read_flux(&self) -> Result<f64, String> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| format!("cannot read {}: {}", self.path.display(), e))?;
        let value = content.trim();
        value
            .parse()
            .map_err(|_| format!("'{}' in {} is not a number", value, self.path.display()))
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

pub fn live_flux(source: Option<PathBuf>) -> LiveFlux {
    match source {
        Some(path) => LiveFlux::Available(Box::new(FileFluxReader::new(path))),
        None => LiveFlux::Unavailable,
    }
}
