use std::collections::BTreeMap;
use std::fmt;

/// The single-row summary table written by the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    /// Average diffraction-weighted dose [MGy].
    pub average_dwd: f64,
    /// Maximum dose anywhere in the crystal [MGy].
    pub max_dose: f64,
    /// Every numeric column of the row, keyed by normalized header name.
    pub columns: BTreeMap<String, f64>,
}

impl SimulationSummary {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns.get(column).copied()
    }
}

/// Dose interval covered by one histogram bin [MGy].
#[derive(Debug, Clone, PartialEq)]
pub enum DoseRange {
    Closed { from: String, to: String },
    Upwards { from: String },
}

impl fmt::Display for DoseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed { from, to } => write!(f, "{} to {}", from, to),
            Self::Upwards { from } => write!(f, "{} upwards", from),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub index: u32,
    pub range: DoseRange,
    /// Share of the crystal volume in this bin [%].
    pub percentage: f64,
}

impl HistogramBin {
    pub fn label(&self) -> String {
        self.range.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dose: f64,
}

/// Per-voxel dose on a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseVolume {
    pub samples: Vec<DoseSample>,
    /// Number of distinct coordinates along (x, y, z).
    pub shape: [usize; 3],
}

impl DoseVolume {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn max_dose(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.dose).reduce(f64::max)
    }

    pub fn mean_dose(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().map(|s| s.dose).sum::<f64>() / self.samples.len() as f64)
    }

    /// Fraction of voxels whose dose is at or above `threshold`.
    pub fn fraction_above(&self, threshold: f64) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let count = self.samples.iter().filter(|s| s.dose >= threshold).count();
        count as f64 / self.samples.len() as f64
    }
}
