use thiserror::Error;

/// Value a user enters to request a substitution instead of a literal value.
const SENTINEL: f64 = -1.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum InputError {
    #[error("{field} field is empty")]
    Empty { field: &'static str },
    #[error("Invalid input in {field} field: '{value}'")]
    NotNumeric { field: &'static str, value: String },
    #[error("{field} must be {requirement} (got {value})")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: String,
    },
}

/// How the photon flux for a run is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FluxSetting {
    /// Flux in photons per second, as entered.
    Explicit(f64),
    /// Read the current flux at the sample position from the live source.
    Live,
}

/// A crystal dimension that is either given or inherited from another size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrystalSize {
    Explicit(f64),
    /// Match the reference size (the beam, or another crystal axis).
    Match,
}

impl CrystalSize {
    pub fn or(self, reference: f64) -> f64 {
        match self {
            Self::Explicit(value) => value,
            Self::Match => reference,
        }
    }
}

/// The experiment as a user describes it at the beamline.
///
/// All lengths are in micrometres, angles in degrees and times in seconds.
/// A `vector_length` of zero describes a standard (static) collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionParameters {
    pub flux: FluxSetting,
    pub energy_kev: f64,
    pub beam_size_v: f64,
    pub beam_size_h: f64,
    pub crystal_size_v: CrystalSize,
    pub crystal_size_beam: CrystalSize,
    pub osc_range: f64,
    pub osc_width: f64,
    pub exposure_per_frame: f64,
    pub vector_length: f64,
}

/// Raw text field values, exactly as typed.
///
/// Parsing happens in one place so that a bad field is reported before any
/// file, network or process work starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInput {
    pub flux: String,
    pub energy: String,
    pub beam_size_v: String,
    pub beam_size_h: String,
    pub crystal_size_v: String,
    pub crystal_size_beam: String,
    pub osc_range: String,
    pub osc_width: String,
    pub exposure_per_frame: String,
    pub vector_length: String,
}

impl Default for CollectionInput {
    fn default() -> Self {
        Self {
            flux: "1e12".to_string(),
            energy: "12.66".to_string(),
            beam_size_v: "3.0".to_string(),
            beam_size_h: "5.0".to_string(),
            crystal_size_v: "-1".to_string(),
            crystal_size_beam: "-1".to_string(),
            osc_range: "180".to_string(),
            osc_width: "0.1".to_string(),
            exposure_per_frame: "0.02".to_string(),
            vector_length: "50".to_string(),
        }
    }
}

impl CollectionInput {
    pub fn parse(&self) -> Result<CollectionParameters, InputError> {
        let flux = parse_number("flux", &self.flux)?;
        let energy_kev = parse_number("energy", &self.energy)?;
        let beam_size_v = parse_number("beamsizeV", &self.beam_size_v)?;
        let beam_size_h = parse_number("beamsizeH", &self.beam_size_h)?;
        let crystal_size_v = parse_number("xtalSizeV", &self.crystal_size_v)?;
        let crystal_size_beam = parse_number("xtalSizeB", &self.crystal_size_beam)?;
        let osc_range = parse_number("oscRange", &self.osc_range)?;
        let osc_width = parse_number("oscWidth", &self.osc_width)?;
        let exposure_per_frame = parse_number("exposureTimeFrame", &self.exposure_per_frame)?;
        let vector_length = parse_number("vectorL", &self.vector_length)?;

        let flux = if flux == SENTINEL {
            FluxSetting::Live
        } else {
            require("flux", flux, flux > 0.0, "positive or -1")?;
            FluxSetting::Explicit(flux)
        };

        require("energy", energy_kev, energy_kev > 0.0, "positive")?;
        require("beamsizeV", beam_size_v, beam_size_v > 0.0, "positive")?;
        require("beamsizeH", beam_size_h, beam_size_h > 0.0, "positive")?;
        require("oscRange", osc_range, osc_range > 0.0, "positive")?;
        require("oscWidth", osc_width, osc_width > 0.0, "positive")?;
        require(
            "exposureTimeFrame",
            exposure_per_frame,
            exposure_per_frame > 0.0,
            "positive",
        )?;
        require(
            "vectorL",
            vector_length,
            vector_length >= 0.0,
            "zero or positive",
        )?;

        Ok(CollectionParameters {
            flux,
            energy_kev,
            beam_size_v,
            beam_size_h,
            crystal_size_v: crystal_size("xtalSizeV", crystal_size_v)?,
            crystal_size_beam: crystal_size("xtalSizeB", crystal_size_beam)?,
            osc_range,
            osc_width,
            exposure_per_frame,
            vector_length,
        })
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty { field });
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::NotNumeric {
            field,
            value: trimmed.to_string(),
        }),
    }
}

fn require(
    field: &'static str,
    value: f64,
    condition: bool,
    requirement: &'static str,
) -> Result<(), InputError> {
    if condition {
        Ok(())
    } else {
        Err(InputError::OutOfRange {
            field,
            requirement,
            value: value.to_string(),
        })
    }
}

fn crystal_size(field: &'static str, value: f64) -> Result<CrystalSize, InputError> {
    if value == SENTINEL {
        return Ok(CrystalSize::Match);
    }
    require(field, value, value > 0.0, "positive or -1")?;
    Ok(CrystalSize::Explicit(value))
}
