use clap::{Args, Parser, Subcommand};
use rd3d::core::models::collection::CollectionInput;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "FMX Beamline Staff",
    version,
    about = "rd3d-calc - Prepare, run and read back RADDOSE-3D dose simulations for a crystallography experiment.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the simulator input, run RADDOSE-3D and report the dose.
    Dose(DoseArgs),
    /// Print the simulator parameters derived from the collection parameters.
    Derive(DeriveArgs),
    /// Re-read the results left in a working directory by an earlier run.
    Report(ReportArgs),
}

/// Collection parameters as typed at the beamline.
///
/// Values are kept as text and validated together before anything is run.
#[derive(Args, Debug, Clone)]
pub struct CollectionArgs {
    /// Flux at the sample [ph/s], or -1 to use the live flux.
    #[arg(long, default_value = "1e12", allow_hyphen_values = true, value_name = "PH/S")]
    pub flux: String,

    /// Photon energy [keV].
    #[arg(long, default_value = "12.66", value_name = "KEV")]
    pub energy: String,

    /// Vertical beam size (FWHM) [µm].
    #[arg(long = "beam-v", default_value = "3.0", value_name = "UM")]
    pub beam_size_v: String,

    /// Horizontal beam size (FWHM) [µm].
    #[arg(long = "beam-h", default_value = "5.0", value_name = "UM")]
    pub beam_size_h: String,

    /// Vertical crystal size [µm], or -1 to match the beam.
    #[arg(
        long = "crystal-v",
        default_value = "-1",
        allow_hyphen_values = true,
        value_name = "UM"
    )]
    pub crystal_size_v: String,

    /// Crystal size along the beam [µm], or -1 to match the vertical size.
    #[arg(
        long = "crystal-beam",
        default_value = "-1",
        allow_hyphen_values = true,
        value_name = "UM"
    )]
    pub crystal_size_beam: String,

    /// Total oscillation range [deg].
    #[arg(long = "osc-range", default_value = "180", value_name = "DEG")]
    pub osc_range: String,

    /// Oscillation width per frame [deg].
    #[arg(long = "osc-width", default_value = "0.1", value_name = "DEG")]
    pub osc_width: String,

    /// Exposure time per frame [s].
    #[arg(long, default_value = "0.02", value_name = "S")]
    pub exposure: String,

    /// Length of the collection vector [µm]; 0 for a standard collection.
    #[arg(long = "vector", default_value = "50", value_name = "UM")]
    pub vector_length: String,
}

impl CollectionArgs {
    pub fn to_input(&self) -> CollectionInput {
        CollectionInput {
            flux: self.flux.clone(),
            energy: self.energy.clone(),
            beam_size_v: self.beam_size_v.clone(),
            beam_size_h: self.beam_size_h.clone(),
            crystal_size_v: self.crystal_size_v.clone(),
            crystal_size_beam: self.crystal_size_beam.clone(),
            osc_range: self.osc_range.clone(),
            osc_width: self.osc_width.clone(),
            exposure_per_frame: self.exposure.clone(),
            vector_length: self.vector_length.clone(),
        }
    }
}

/// Arguments for the `dose` subcommand.
#[derive(Args, Debug)]
pub struct DoseArgs {
    #[command(flatten)]
    pub collection: CollectionArgs,

    // --- Structure ---
    /// Structure model: a .pdb file in the binary directory or a 4-character PDB code.
    #[arg(long, value_name = "FILE_OR_CODE")]
    pub pdb: Option<String>,

    /// Never query the PDB registry; unknown codes use the default model.
    #[arg(long)]
    pub offline: bool,

    // --- Locations ---
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the simulator, template and bundled structures.
    #[arg(long, value_name = "DIR")]
    pub bin_dir: Option<PathBuf>,

    /// Directory for the generated input, results and run log.
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Template file name inside the binary directory.
    #[arg(short, long, value_name = "NAME")]
    pub template: Option<String>,

    /// Print the simulator's own output after the dose summary.
    #[arg(long)]
    pub show_output: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S structure.timeout-secs=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `derive` subcommand.
#[derive(Args, Debug)]
pub struct DeriveArgs {
    #[command(flatten)]
    pub collection: CollectionArgs,

    /// Rotation step used by the simulator [deg].
    #[arg(long, value_name = "DEG")]
    pub angular_resolution: Option<f64>,
}

/// Arguments for the `report` subcommand.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Working directory of an earlier run.
    #[arg(short, long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Dose limit used for the volume fraction above it [MGy].
    #[arg(long, default_value_t = 30.0, value_name = "MGY")]
    pub dose_limit: f64,
}
