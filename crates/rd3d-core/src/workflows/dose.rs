use crate::core::derive::derive_native_parameters;
use crate::core::io::results::{read_histogram, read_summary};
use crate::core::io::template::{apply_directives, patch};
use crate::core::models::collection::CollectionInput;
use crate::core::models::dose::{HistogramBin, SimulationSummary};
use crate::core::models::simulation::SimulationParameters;
use crate::core::structure::{self, RegistryProbe, StructureReference};
use crate::engine::config::RunConfig;
use crate::engine::error::EngineError;
use crate::engine::flux::LiveFlux;
use crate::engine::paths::{RunLock, RunPaths, fresh_input};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::{CapturedOutput, RunLog, Simulator};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

const STRUCTURE_KEYWORD: &str = "PDB";

/// Outcome of one complete dose calculation.
#[derive(Debug, Clone)]
pub struct DoseReport {
    pub parameters: SimulationParameters,
    pub structure: StructureReference,
    pub paths: RunPaths,
    pub output: CapturedOutput,
    pub summary: SimulationSummary,
    /// The histogram is read independently of the summary; a failure here is
    /// kept as a message rather than failing the run.
    pub histogram: Result<Vec<HistogramBin>, String>,
}

#[instrument(skip_all, name = "dose_workflow")]
pub fn run(
    input: &CollectionInput,
    config: &RunConfig,
    probe: &dyn RegistryProbe,
    live_flux: &LiveFlux,
    reporter: &ProgressReporter,
) -> Result<DoseReport, EngineError> {
    // === Phase 1: Validation and derivation, before any I/O ===
    reporter.report(Progress::PhaseStart {
        name: "Validation",
    });
    let collection = input.parse()?;
    let flux = collection.flux.resolve(live_flux);
    let parameters = derive_native_parameters(&collection, flux, config.angular_resolution);
    debug!("Derived simulation parameters: {:?}", parameters);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Working directory and input file ===
    reporter.report(Progress::PhaseStart {
        name: "Preparing input",
    });
    let paths = RunPaths::resolve(
        &config.paths.bin_dir,
        &config.paths.work_dir,
        &config.paths.template_name,
    )?;
    let _lock = RunLock::acquire(&paths)?;
    let mut log = RunLog::create(&paths.log)?;
    log.info(&format!("Flux at sample = {:.4e} ph/s", flux))?;

    fresh_input(&paths).map_err(|source| EngineError::TemplateCopy {
        template: paths.template.clone(),
        input: paths.input.clone(),
        source,
    })?;
    apply_directives(&paths.input, &parameters.directives())?;
    log.info(&format!(
        "Total exposure time = {:.3} s",
        parameters.exposure_time
    ))?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Structure model ===
    reporter.report(Progress::PhaseStart {
        name: "Resolving structure",
    });
    let structure = structure::resolve(
        &config.structure.reference,
        &paths.bin_dir,
        &config.structure.fallback_name,
        probe,
    );
    if structure.is_fallback() {
        log.warn(&format!(
            "Cannot verify PDB model '{}'. Using {}",
            config.structure.reference, structure
        ))?;
    } else {
        log.info(&format!("Using {}", structure))?;
    }
    patch(&paths.input, STRUCTURE_KEYWORD, &structure.directive_line())?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Simulation ===
    reporter.report(Progress::PhaseStart {
        name: "Running simulation",
    });
    remove_stale_outputs(&paths);
    let simulator = Simulator::new(config.simulator.clone());
    let output = simulator.run(&paths.input, &paths.output_prefix, &mut log)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 5: Results ===
    reporter.report(Progress::PhaseStart {
        name: "Reading results",
    });
    let summary = read_summary(&paths.summary_csv)?;
    log.info(&format!(
        "Average Diffraction Weighted Dose = {:.3} MGy, Max Dose = {:.3} MGy",
        summary.average_dwd, summary.max_dose
    ))?;
    info!(
        "Average DWD {:.3} MGy, max dose {:.3} MGy.",
        summary.average_dwd, summary.max_dose
    );

    let histogram = read_histogram(&paths.summary_text).map_err(|e| e.to_string());
    match &histogram {
        Ok(bins) if bins.is_empty() => {
            reporter.report(Progress::Message("No dose histogram found.".to_string()));
        }
        Ok(bins) => debug!("Read {} histogram bins.", bins.len()),
        Err(e) => {
            warn!("Cannot read dose histogram: {}", e);
            log.warn(&format!("Cannot read dose histogram: {}", e))?;
        }
    }
    reporter.report(Progress::PhaseFinish);

    Ok(DoseReport {
        parameters,
        structure,
        paths,
        output,
        summary,
        histogram,
    })
}

/// Deletes result files of an earlier run so they cannot be mistaken for
/// output of this one.
fn remove_stale_outputs(paths: &RunPaths) {
    for path in [&paths.summary_csv, &paths.summary_text, &paths.dose_state] {
        remove_if_present(path);
    }
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed stale output {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Cannot remove stale output {:?}: {}", path, e),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::models::dose::DoseRange;
    use crate::core::structure::NoRegistry;
    use crate::engine::config::{RunConfigBuilder, SimulatorCommand};
    use crate::engine::flux::FALLBACK_FLUX;
    use crate::engine::paths::PathError;
    use crate::engine::runner::RunError;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};

    const TEMPLATE: &str = "\
##### Crystal
Crystal
Type Cuboid
DIMENSION 20 20 20
PIXELSPERMICRON 0.5
ANGULARRESOLUTION 2
PDB 2VB1
Beam
TYPE GAUSSIAN
FLUX 3.5e12
FWHM 10 10
ENERGY 12.66
COLLIMATION RECTANGULAR 30 30
##### Wedge
WEDGE 0 360
EXPOSURETIME 36
TRANSLATEPERDEGREE 0 0 0
STARTOFFSET 0 0 0
";

    const WRITE_RESULTS: &str = r#"
printf 'Average DWD,Last DWD,Max Dose\n1.234,2.0,5.678\n' > "${4}Summary.csv"
printf 'Final Dose Histogram:\nBin  1,  0.0 to  0.1 MGy:  12.5 %%\nBin  2,  0.1 MGy upwards:  87.5 %%\n' > "${4}Summary.txt"
echo "RADDOSE-3D finished"
"#;

    struct Fixture {
        _dir: TempDir,
        bin: PathBuf,
        work: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("bin");
        let work = dir.path().join("work");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("rd3d_input_template.txt"), TEMPLATE).unwrap();
        Fixture {
            _dir: dir,
            bin,
            work,
        }
    }

    fn config(fixture: &Fixture, script: &str) -> RunConfig {
        RunConfigBuilder::new()
            .bin_dir(fixture.bin.clone())
            .work_dir(fixture.work.clone())
            .simulator(SimulatorCommand {
                program: PathBuf::from("sh"),
                args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            })
            .build()
            .unwrap()
    }

    fn input_lines(report_paths: &RunPaths) -> Vec<String> {
        fs::read_to_string(&report_paths.input)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn full_run_patches_input_and_reads_results() {
        let fixture = fixture();
        let config = config(&fixture, WRITE_RESULTS);
        let input = CollectionInput {
            flux: "4e12".to_string(),
            ..CollectionInput::default()
        };

        let report = run(
            &input,
            &config,
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.summary.average_dwd, 1.234);
        assert_eq!(report.summary.max_dose, 5.678);
        assert_eq!(report.summary.get("Last_DWD"), Some(2.0));
        assert!(report.output.stdout.contains("RADDOSE-3D finished"));

        let bins = report.histogram.unwrap();
        assert_eq!(bins.len(), 2);
        assert_eq!(
            bins[1].range,
            DoseRange::Upwards {
                from: "0.1".to_string()
            }
        );

        let lines = input_lines(&report.paths);
        assert_eq!(lines.len(), TEMPLATE.lines().count());
        assert!(lines.contains(&"FLUX 4.00e+12".to_string()));
        assert!(lines.contains(&"EXPOSURETIME 36.000".to_string()));
        assert!(lines.contains(&"DIMENSION 3.0 55.0 3.0".to_string()));
        assert!(lines.contains(&"Type Cuboid".to_string()));
        assert!(lines.contains(&"##### Wedge".to_string()));

        let fallback = fixture.bin.join("2vb1.pdb");
        assert_eq!(report.structure, StructureReference::Fallback(fallback.clone()));
        assert!(lines.contains(&format!("PDB {}", fallback.display())));

        assert!(!report.paths.lock_file().exists());
        let log = fs::read_to_string(&report.paths.log).unwrap();
        assert!(log.contains("RADDOSE-3D finished"));
    }

    #[test]
    fn live_flux_without_source_uses_fallback() {
        let fixture = fixture();
        let config = config(&fixture, WRITE_RESULTS);
        let input = CollectionInput {
            flux: "-1".to_string(),
            ..CollectionInput::default()
        };

        let report = run(
            &input,
            &config,
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.parameters.flux, FALLBACK_FLUX);
        assert!(input_lines(&report.paths).contains(&"FLUX 1.00e-03".to_string()));
    }

    #[test]
    fn invalid_input_is_rejected_before_the_work_dir_exists() {
        let fixture = fixture();
        let config = config(&fixture, WRITE_RESULTS);
        let input = CollectionInput {
            osc_width: "abc".to_string(),
            ..CollectionInput::default()
        };

        let result = run(
            &input,
            &config,
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Input(_))));
        assert!(!fixture.work.exists());
    }

    #[test]
    fn failing_simulator_does_not_parse_stale_results() {
        let fixture = fixture();
        fs::create_dir_all(&fixture.work).unwrap();
        fs::write(
            fixture.work.join("rd3d_Summary.csv"),
            "Average DWD,Max Dose\n9.9,9.9\n",
        )
        .unwrap();
        let config = config(&fixture, "echo 'Exception in thread main' >&2; exit 1");

        let result = run(
            &CollectionInput::default(),
            &config,
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        );
        assert!(matches!(
            result,
            Err(EngineError::Simulation(RunError::NonZeroExit { .. }))
        ));

        let log = fs::read_to_string(fixture.work.join("rd3d_calc.log")).unwrap();
        assert!(log.contains("Exception in thread main"));
        let paths = RunPaths::resolve(&fixture.bin, &fixture.work, "rd3d_input_template.txt")
            .unwrap();
        assert!(RunLock::acquire(&paths).is_ok());
    }

    #[test]
    fn missing_summary_is_fatal_but_missing_histogram_is_not() {
        let fixture = fixture();
        let only_summary = r#"printf 'Average DWD,Max Dose\n0.5,1.0\n' > "${4}Summary.csv""#;
        let report = run(
            &CollectionInput::default(),
            &config(&fixture, only_summary),
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(report.histogram.is_err());

        let result = run(
            &CollectionInput::default(),
            &config(&fixture, "exit 0"),
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Results(_))));
    }

    #[test]
    fn template_without_keyword_is_a_config_error() {
        let fixture = fixture();
        fs::write(
            fixture.bin.join("rd3d_input_template.txt"),
            TEMPLATE.replace("STARTOFFSET 0 0 0\n", ""),
        )
        .unwrap();

        let result = run(
            &CollectionInput::default(),
            &config(&fixture, WRITE_RESULTS),
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Template(_))));
    }

    #[test]
    fn concurrent_run_on_same_work_dir_is_refused() {
        let fixture = fixture();
        let config = config(&fixture, WRITE_RESULTS);
        let paths = RunPaths::resolve(&fixture.bin, &fixture.work, "rd3d_input_template.txt")
            .unwrap();
        let _held = RunLock::acquire(&paths).unwrap();

        let err = run(
            &CollectionInput::default(),
            &config,
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        )
        .unwrap_err();
        assert!(err.is_busy());
        assert!(matches!(err, EngineError::Paths(PathError::Busy { .. })));
    }

    #[test]
    fn lock_left_by_killed_run_does_not_block_the_next_run() {
        let fixture = fixture();
        fs::create_dir_all(&fixture.work).unwrap();
        let mut killed = std::process::Command::new("sh")
            .arg("-c")
            .arg("echo $$ > \"$1/.rd3d.lock\"; exec sleep 30")
            .arg("sh")
            .arg(&fixture.work)
            .spawn()
            .unwrap();
        while !fixture.work.join(".rd3d.lock").exists() {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        killed.kill().unwrap();
        killed.wait().unwrap();

        let report = run(
            &CollectionInput::default(),
            &config(&fixture, WRITE_RESULTS),
            &NoRegistry,
            &LiveFlux::Unavailable,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.summary.max_dose, 5.678);
    }

    #[test]
    fn reporter_sees_every_phase() {
        let fixture = fixture();
        let config = config(&fixture, WRITE_RESULTS);
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));

        run(
            &CollectionInput::default(),
            &config,
            &NoRegistry,
            &LiveFlux::Unavailable,
            &reporter,
        )
        .unwrap();
        drop(reporter);
        assert_eq!(
            phases.into_inner().unwrap(),
            vec![
                "Validation",
                "Preparing input",
                "Resolving structure",
                "Running simulation",
                "Reading results"
            ]
        );
    }
}
