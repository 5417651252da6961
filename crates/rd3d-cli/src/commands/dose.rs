use crate::cli::DoseArgs;
use crate::commands::report::{print_histogram, print_summary};
use crate::config;
use crate::error::Result;
use crate::flux::live_flux;
use crate::registry::RcsbRegistry;
use crate::utils::progress::CliProgressHandler;
use rd3d::core::models::collection::CollectionInput;
use rd3d::core::models::simulation::scientific;
use rd3d::core::structure::{NoRegistry, RegistryProbe};
use rd3d::engine::config::RunConfig;
use rd3d::engine::error::EngineError;
use rd3d::engine::flux::LiveFlux;
use rd3d::engine::paths::RunPaths;
use rd3d::engine::progress::ProgressReporter;
use rd3d::engine::runner::RunError;
use rd3d::workflows::{self, dose::DoseReport};
use tokio::runtime::Handle;
use tracing::info;

pub async fn run(args: DoseArgs) -> Result<()> {
    let app = config::build_config(&args)?;

    let probe: Box<dyn RegistryProbe> = if app.registry.offline {
        info!("Offline mode: PDB codes will not be looked up.");
        Box::new(NoRegistry)
    } else {
        Box::new(RcsbRegistry::new(&app.registry, Handle::current())?)
    };
    let live = live_flux(app.live_flux_source.clone());

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let input = args.collection.to_input();

    println!(
        "Starting dose calculation in {}...",
        app.run.paths.work_dir.display()
    );
    info!("Invoking the core dose workflow...");

    let result = run_blocking(&input, &app.run, probe.as_ref(), &live, &reporter);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            progress_handler.clear();
            if let EngineError::Simulation(RunError::NonZeroExit { output, .. }) = &e {
                if args.show_output {
                    print_output("Simulator output", &output.stdout);
                    print_output("Simulator errors", &output.stderr);
                }
                if let Ok(paths) = RunPaths::existing(&app.run.paths.work_dir) {
                    println!("The simulator failed; see {} for details.", paths.log.display());
                }
            }
            return Err(e.into());
        }
    };

    print_report(&report);
    if args.show_output {
        print_output("Simulator output", &report.output.stdout);
        print_output("Simulator errors", &report.output.stderr);
    }
    Ok(())
}

/// Runs the blocking workflow on the current worker thread; the registry
/// probe re-enters the runtime from inside it.
fn run_blocking(
    input: &CollectionInput,
    config: &RunConfig,
    probe: &dyn RegistryProbe,
    live: &LiveFlux,
    reporter: &ProgressReporter,
) -> std::result::Result<DoseReport, EngineError> {
    tokio::task::block_in_place(|| workflows::dose::run(input, config, probe, live, reporter))
}

fn print_report(report: &DoseReport) {
    println!();
    println!("Structure model:   {}", report.structure);
    println!(
        "Flux at sample:    {} ph/s",
        scientific(report.parameters.flux, 2)
    );
    println!(
        "Exposure time:     {:.3} s",
        report.parameters.exposure_time
    );
    println!("Generated input:   {}", report.paths.input.display());
    println!();
    print_summary(&report.summary);
    println!();
    match &report.histogram {
        Ok(bins) => print_histogram(bins),
        Err(e) => println!("Dose histogram: unavailable ({})", e),
    }
}

fn print_output(title: &str, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    println!();
    println!("--- {} ---", title);
    println!("{}", text.trim_end());
}
