use crate::cli::ReportArgs;
use crate::error::{CliError, Result};
use rd3d::core::io::results::{read_dose_volume, read_histogram, read_summary};
use rd3d::core::models::dose::{HistogramBin, SimulationSummary};
use rd3d::engine::error::EngineError;
use rd3d::engine::paths::{DEFAULT_WORK_DIR, RunPaths};
use std::path::PathBuf;
use tracing::warn;

pub async fn run(args: ReportArgs) -> Result<()> {
    if args.dose_limit.is_nan() || args.dose_limit < 0.0 {
        return Err(CliError::Argument(format!(
            "--dose-limit must be zero or positive, got {}",
            args.dose_limit
        )));
    }
    let work_dir = args
        .work_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR));
    let paths = RunPaths::existing(&work_dir).map_err(EngineError::from)?;
    println!("Results in {}", work_dir.display());
    println!();

    match read_summary(&paths.summary_csv) {
        Ok(summary) => print_summary(&summary),
        Err(e) => {
            warn!("Summary unavailable: {}", e);
            println!("Summary: unavailable ({})", e);
        }
    }
    println!();

    match read_histogram(&paths.summary_text) {
        Ok(bins) => print_histogram(&bins),
        Err(e) => {
            warn!("Histogram unavailable: {}", e);
            println!("Dose histogram: unavailable ({})", e);
        }
    }
    println!();

    match read_dose_volume(&paths.dose_state) {
        Ok(volume) => {
            let [nx, ny, nz] = volume.shape;
            println!("Dose state: {} voxels on a {} x {} x {} grid", volume.len(), nx, ny, nz);
            if let (Some(max), Some(mean)) = (volume.max_dose(), volume.mean_dose()) {
                println!("  Max voxel dose:   {:.3} MGy", max);
                println!("  Mean voxel dose:  {:.3} MGy", mean);
            }
            println!(
                "  Above {:.1} MGy:   {:.1} %",
                args.dose_limit,
                100.0 * volume.fraction_above(args.dose_limit)
            );
        }
        Err(e) => {
            warn!("Dose state unavailable: {}", e);
            println!("Dose state: unavailable ({})", e);
        }
    }
    Ok(())
}

pub fn print_summary(summary: &SimulationSummary) {
    println!(
        "Average Diffraction Weighted Dose:  {:.3} MGy",
        summary.average_dwd
    );
    println!("Max Dose:                           {:.3} MGy", summary.max_dose);
}

pub fn print_histogram(bins: &[HistogramBin]) {
    if bins.is_empty() {
        println!("Dose histogram: no bins found");
        return;
    }
    println!("Final dose histogram:");
    for bin in bins {
        println!(
            "  Bin {:>2}  {:<22} {:>6.1} %",
            bin.index,
            format!("{} MGy", bin.label()),
            bin.percentage
        );
    }
}
