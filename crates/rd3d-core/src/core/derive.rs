//! Translation of beamline collection parameters into simulator parameters.
//!
//! The simulator describes a vector collection as a crystal that translates
//! at a constant rate per degree of rotation, while users think in terms of a
//! vector length, an oscillation range and a per-frame exposure. Everything
//! here is a pure function of its inputs; flux is resolved by the caller.

use super::models::collection::CollectionParameters;
use super::models::simulation::{BeamType, SimulationParameters};

/// Collimation aperture as a multiple of the beam FWHM on each axis.
pub const COLLIMATION_FACTOR: f64 = 3.0;

pub const DEFAULT_ANGULAR_RESOLUTION: f64 = 2.0;

/// Voxel density for the simulator's crystal model.
///
/// Small beams need a finer grid. Each tier tests *either* axis against the
/// threshold, so a 1 x 10 µm beam gets the finest sampling.
pub fn pixels_per_micron(beam_size_v: f64, beam_size_h: f64) -> f64 {
    if beam_size_v < 1.5 || beam_size_h < 1.5 {
        2.0
    } else if beam_size_v < 3.0 || beam_size_h < 3.0 {
        1.0
    } else {
        0.5
    }
}

/// Derives the native parameter set for one run.
///
/// # Arguments
///
/// * `params` - The validated collection parameters.
/// * `flux` - Photon flux at the sample [ph/s], already resolved from the
///   user's flux setting.
/// * `angular_resolution` - Rotation step used by the simulator [deg].
///
/// # Return
///
/// Returns the simulator parameters. Crystal dimensions follow the beam when
/// the user asked to match it; the horizontal dimension always spans the
/// vector plus one beam width so the translated beam stays inside the model.
pub fn derive_native_parameters(
    params: &CollectionParameters,
    flux: f64,
    angular_resolution: f64,
) -> SimulationParameters {
    let beam_v = params.beam_size_v;
    let beam_h = params.beam_size_h;

    let translate_y = params.vector_length / params.osc_range;
    let offset_y = -params.vector_length / 2.0;
    let frames = params.osc_range / params.osc_width;
    let exposure_time = params.exposure_per_frame * frames;

    let dim_x = params.crystal_size_v.or(beam_v);
    let dim_z = params.crystal_size_beam.or(dim_x);
    let dim_y = params.vector_length + beam_h;

    SimulationParameters {
        flux,
        energy_kev: params.energy_kev,
        beam_type: BeamType::Gaussian,
        fwhm: [beam_v, beam_h],
        collimation: [COLLIMATION_FACTOR * beam_v, COLLIMATION_FACTOR * beam_h],
        wedge_end: params.osc_range,
        exposure_time,
        translate_per_degree: [0.0, translate_y, 0.0],
        start_offset: [0.0, offset_y, 0.0],
        dimensions: [dim_x, dim_y, dim_z],
        pixels_per_micron: pixels_per_micron(beam_v, beam_h),
        angular_resolution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::collection::{CollectionParameters, CrystalSize, FluxSetting};
    use approx::assert_relative_eq;

    fn fmx_defaults() -> CollectionParameters {
        CollectionParameters {
            flux: FluxSetting::Explicit(4e12),
            energy_kev: 12.66,
            beam_size_v: 1.0,
            beam_size_h: 2.0,
            crystal_size_v: CrystalSize::Match,
            crystal_size_beam: CrystalSize::Match,
            osc_range: 180.0,
            osc_width: 0.1,
            exposure_per_frame: 0.01,
            vector_length: 50.0,
        }
    }

    #[test]
    fn vector_collection_derives_expected_parameters() {
        let native = derive_native_parameters(&fmx_defaults(), 4e12, 2.0);

        assert_eq!(native.flux, 4e12);
        assert_eq!(native.beam_type, BeamType::Gaussian);
        assert_eq!(native.fwhm, [1.0, 2.0]);
        assert_eq!(native.collimation, [3.0, 6.0]);
        assert_eq!(native.pixels_per_micron, 2.0);
        assert_eq!(native.wedge_end, 180.0);
        assert_relative_eq!(native.translate_per_degree[1], 0.2778, epsilon = 1e-4);
        assert_eq!(native.translate_per_degree[0], 0.0);
        assert_eq!(native.translate_per_degree[2], 0.0);
        assert_eq!(native.start_offset, [0.0, -25.0, 0.0]);
        assert_relative_eq!(native.exposure_time, 18.0, epsilon = 1e-9);
        assert_eq!(native.dimensions, [1.0, 52.0, 1.0]);
        assert_eq!(native.angular_resolution, 2.0);
    }

    #[test]
    fn translation_times_range_recovers_vector_length() {
        for (range, length) in [(180.0, 50.0), (90.0, 12.5), (360.0, 0.0), (7.3, 101.0)] {
            let params = CollectionParameters {
                osc_range: range,
                vector_length: length,
                ..fmx_defaults()
            };
            let native = derive_native_parameters(&params, 1e12, 2.0);
            assert_relative_eq!(
                native.translate_per_degree[1] * range,
                length,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let params = fmx_defaults();
        let first = derive_native_parameters(&params, 4e12, 2.0);
        let second = derive_native_parameters(&params, 4e12, 2.0);
        assert_eq!(first, second);
        assert_eq!(
            first.exposure_time.to_bits(),
            second.exposure_time.to_bits()
        );
    }

    #[test]
    fn explicit_crystal_sizes_override_beam() {
        let params = CollectionParameters {
            crystal_size_v: CrystalSize::Explicit(4.0),
            crystal_size_beam: CrystalSize::Explicit(6.0),
            ..fmx_defaults()
        };
        let native = derive_native_parameters(&params, 4e12, 2.0);
        assert_eq!(native.dimensions, [4.0, 52.0, 6.0]);
    }

    #[test]
    fn beam_axis_matches_explicit_vertical_crystal_size() {
        let params = CollectionParameters {
            crystal_size_v: CrystalSize::Explicit(4.0),
            ..fmx_defaults()
        };
        let native = derive_native_parameters(&params, 4e12, 2.0);
        assert_eq!(native.dimensions[2], 4.0);
    }

    #[test]
    fn pixel_density_tiers_use_either_axis() {
        assert_eq!(pixels_per_micron(1.0, 10.0), 2.0);
        assert_eq!(pixels_per_micron(10.0, 1.4), 2.0);
        assert_eq!(pixels_per_micron(1.5, 1.5), 1.0);
        assert_eq!(pixels_per_micron(2.9, 10.0), 1.0);
        assert_eq!(pixels_per_micron(3.0, 5.0), 0.5);
        assert_eq!(pixels_per_micron(3.0, 3.0), 0.5);
    }

    #[test]
    fn standard_collection_has_no_translation() {
        let params = CollectionParameters {
            vector_length: 0.0,
            ..fmx_defaults()
        };
        let native = derive_native_parameters(&params, 4e12, 2.0);
        assert_eq!(native.translate_per_degree, [0.0, 0.0, 0.0]);
        assert_eq!(native.dimensions[1], 2.0);
    }
}
