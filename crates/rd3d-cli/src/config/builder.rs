use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, RegistrySettings};
use crate::cli::DoseArgs;
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use rd3d::engine::config::{RunConfigBuilder, SimulatorCommand};
use rd3d::engine::paths::install_relative;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub fn build_config(args: &DoseArgs) -> Result<AppConfig> {
    let file_config = FileConfig::discover(args.config.as_deref())?;
    merge(args, file_config)
}

/// Precedence: command-line flags, then `--set` values, then the file, then
/// built-in defaults.
fn merge(args: &DoseArgs, file_config: FileConfig) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let paths_file = file_config.paths.take().unwrap_or_default();
    let bin_dir = args
        .bin_dir
        .clone()
        .or(paths_file.bin_dir)
        .unwrap_or_else(|| install_relative(&defaults.bin_dir));
    let work_dir = args
        .work_dir
        .clone()
        .or(paths_file.work_dir)
        .unwrap_or_else(|| PathBuf::from(&defaults.work_dir));
    let template = args
        .template
        .clone()
        .or(paths_file.template)
        .unwrap_or(defaults.template);

    let simulator_file = file_config.simulator.take().unwrap_or_default();
    let program = simulator_file
        .program
        .unwrap_or_else(|| PathBuf::from(&defaults.java));
    let jar = bin_dir.join(simulator_file.jar.unwrap_or_else(|| PathBuf::from(&defaults.jar)));
    let angular_resolution = simulator_file
        .angular_resolution
        .unwrap_or(defaults.angular_resolution);

    let structure_file = file_config.structure.take().unwrap_or_default();
    let fallback = structure_file
        .fallback
        .unwrap_or(defaults.fallback_structure);
    let registry = RegistrySettings {
        url_template: structure_file
            .registry_url
            .unwrap_or(defaults.registry_url),
        timeout: Duration::from_secs(
            structure_file.timeout_secs.unwrap_or(defaults.timeout_secs),
        ),
        offline: args.offline || structure_file.offline.unwrap_or(defaults.offline),
    };
    if !registry.url_template.contains("{code}") {
        return Err(CliError::Config(format!(
            "`structure.registry-url` must contain a {{code}} placeholder: '{}'",
            registry.url_template
        )));
    }

    let live_flux_source = file_config.flux.take().and_then(|flux| flux.live_source);

    let mut builder = RunConfigBuilder::new()
        .bin_dir(bin_dir)
        .work_dir(work_dir)
        .template_name(template)
        .simulator(SimulatorCommand::java_jar(program, jar))
        .fallback_structure(fallback)
        .angular_resolution(angular_resolution);
    if let Some(reference) = &args.pdb {
        builder = builder.structure_reference(reference.clone());
    }
    let run = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!("Final run configuration: {:?}", run);

    Ok(AppConfig {
        run,
        registry,
        live_flux_source,
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    let config_error = |e: ParseError| CliError::Config(e.to_string());

    for kv_pair in set_values {
        let (key, value) = parser::split_assignment(kv_pair).map_err(config_error)?;

        match key {
            "paths.bin-dir" => {
                config.paths.get_or_insert_with(Default::default).bin_dir =
                    Some(PathBuf::from(value));
            }
            "paths.work-dir" => {
                config.paths.get_or_insert_with(Default::default).work_dir =
                    Some(PathBuf::from(value));
            }
            "paths.template" => {
                config.paths.get_or_insert_with(Default::default).template =
                    Some(value.to_string());
            }
            "simulator.program" => {
                config.simulator.get_or_insert_with(Default::default).program =
                    Some(PathBuf::from(value));
            }
            "simulator.jar" => {
                config.simulator.get_or_insert_with(Default::default).jar =
                    Some(PathBuf::from(value));
            }
            "simulator.angular-resolution" => {
                config
                    .simulator
                    .get_or_insert_with(Default::default)
                    .angular_resolution =
                    Some(parser::parse_value(key, value, "float").map_err(config_error)?);
            }
            "structure.fallback" => {
                config.structure.get_or_insert_with(Default::default).fallback =
                    Some(value.to_string());
            }
            "structure.registry-url" => {
                config
                    .structure
                    .get_or_insert_with(Default::default)
                    .registry_url = Some(value.to_string());
            }
            "structure.timeout-secs" => {
                config
                    .structure
                    .get_or_insert_with(Default::default)
                    .timeout_secs =
                    Some(parser::parse_value(key, value, "integer").map_err(config_error)?);
            }
            "structure.offline" => {
                config.structure.get_or_insert_with(Default::default).offline =
                    Some(parser::parse_value(key, value, "boolean").map_err(config_error)?);
            }
            "flux.live-source" => {
                config.flux.get_or_insert_with(Default::default).live_source =
                    Some(PathBuf::from(value));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
