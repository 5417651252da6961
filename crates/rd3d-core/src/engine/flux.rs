use crate::core::models::collection::FluxSetting;
use tracing::{info, warn};

/// Flux used when the live value cannot be read [ph/s].
///
/// Deliberately tiny so that a dose computed with it is obviously wrong.
pub const FALLBACK_FLUX: f64 = 1e-3;

/// A source of the current flux at the sample position.
pub trait FluxReader: Send + Sync {
    fn read_flux(&self) -> Result<f64, String>;

    fn describe(&self) -> String;
}

/// The live-flux capability, decided once at start-up.
pub enum LiveFlux {
    Available(Box<dyn FluxReader>),
    Unavailable,
}

impl std::fmt::Debug for LiveFlux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(reader) => write!(f, "LiveFlux::Available({})", reader.describe()),
            Self::Unavailable => f.write_str("LiveFlux::Unavailable"),
        }
    }
}

impl LiveFlux {
    /// The current flux, or [`FALLBACK_FLUX`] if it cannot be obtained.
    pub fn current(&self) -> f64 {
        match self {
            Self::Available(reader) => match reader.read_flux() {
                Ok(flux) if flux.is_finite() && flux > 0.0 => {
                    info!("Flux at sample = {:.4e} ph/s ({})", flux, reader.describe());
                    flux
                }
                Ok(flux) => {
                    warn!(
                        "Live flux source returned an unusable value {}. Set flux to {:e}",
                        flux, FALLBACK_FLUX
                    );
                    FALLBACK_FLUX
                }
                Err(e) => {
                    warn!("Error reading live flux: {}. Set flux to {:e}", e, FALLBACK_FLUX);
                    FALLBACK_FLUX
                }
            },
            Self::Unavailable => {
                warn!(
                    "No live flux source is available. Set flux to {:e}",
                    FALLBACK_FLUX
                );
                FALLBACK_FLUX
            }
        }
    }
}

impl FluxSetting {
    pub fn resolve(self, live: &LiveFlux) -> f64 {
        match self {
            Self::Explicit(flux) => flux,
            Self::Live => live.current(),
        }
    }
}
