use crate::cli::DeriveArgs;
use crate::error::Result;
use rd3d::core::derive::{DEFAULT_ANGULAR_RESOLUTION, derive_native_parameters};
use rd3d::core::models::collection::FluxSetting;
use rd3d::core::models::simulation::scientific;
use rd3d::engine::error::EngineError;
use rd3d::engine::flux::FALLBACK_FLUX;
use tracing::info;

pub async fn run(args: DeriveArgs) -> Result<()> {
    let collection = args.collection.to_input().parse().map_err(EngineError::from)?;

    let flux = match collection.flux {
        FluxSetting::Explicit(flux) => flux,
        FluxSetting::Live => {
            println!(
                "Note: live flux is read at run time; showing the fallback value {}.",
                scientific(FALLBACK_FLUX, 2)
            );
            FALLBACK_FLUX
        }
    };
    let angular_resolution = args
        .angular_resolution
        .unwrap_or(DEFAULT_ANGULAR_RESOLUTION);
    let parameters = derive_native_parameters(&collection, flux, angular_resolution);
    info!("Derived parameters without running the simulator.");

    let [dx, dy, dz] = parameters.dimensions;
    println!("Crystal dimensions:   {:.1} x {:.1} x {:.1} µm", dx, dy, dz);
    println!("Pixels per micron:    {:.1}", parameters.pixels_per_micron);
    println!("Total exposure time:  {:.3} s", parameters.exposure_time);
    println!(
        "Translation:          {:.4} µm/deg",
        parameters.translate_per_degree[1]
    );
    println!();
    println!("Simulator input lines:");
    for directive in parameters.directives() {
        println!("  {}", directive.line);
    }
    Ok(())
}
