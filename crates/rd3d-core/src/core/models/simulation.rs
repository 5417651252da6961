use std::fmt;

/// Keyword for the beam profile line.
///
/// The crystal block of the template carries its own `Type` line, so the beam
/// directive is matched on its full default text rather than on `TYPE` alone.
pub const BEAM_TYPE_KEYWORD: &str = "TYPE GAUSSIAN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamType {
    Gaussian,
    TopHat,
}

impl BeamType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gaussian => "GAUSSIAN",
            Self::TopHat => "TOPHAT",
        }
    }
}

impl fmt::Display for BeamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The simulator's native parameter set for one run.
///
/// Vectors are ordered (x, y, z): x is vertical, y horizontal (the rotation
/// axis and the direction of a vector collection), z along the beam.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    /// Photon flux at the sample [ph/s].
    pub flux: f64,
    /// Photon energy [keV].
    pub energy_kev: f64,
    pub beam_type: BeamType,
    /// Beam FWHM (vertical, horizontal) [µm].
    pub fwhm: [f64; 2],
    /// Rectangular collimation (vertical, horizontal) [µm].
    pub collimation: [f64; 2],
    /// End angle of the wedge, which always starts at 0 [deg].
    pub wedge_end: f64,
    /// Exposure time for the complete wedge [s].
    pub exposure_time: f64,
    /// Crystal translation per degree of rotation [µm/deg].
    pub translate_per_degree: [f64; 3],
    /// Crystal position offset at the start of the wedge [µm].
    pub start_offset: [f64; 3],
    /// Cuboid crystal dimensions [µm].
    pub dimensions: [f64; 3],
    pub pixels_per_micron: f64,
    pub angular_resolution: f64,
}

/// One line of the generated input and the keyword of the line it replaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub keyword: &'static str,
    pub line: String,
}

impl Directive {
    pub fn new(keyword: &'static str, line: impl Into<String>) -> Self {
        Self {
            keyword,
            line: line.into(),
        }
    }
}

impl SimulationParameters {
    /// Renders every parameter into its template line, in template order.
    ///
    /// The structure reference (`PDB`) is resolved separately and is not part
    /// of this list.
    pub fn directives(&self) -> Vec<Directive> {
        let [fwhm_x, fwhm_y] = self.fwhm;
        let [col_x, col_y] = self.collimation;
        let [tx, ty, tz] = self.translate_per_degree;
        let [ox, oy, oz] = self.start_offset;
        let [dx, dy, dz] = self.dimensions;

        vec![
            Directive::new("FLUX", format!("FLUX {}", scientific(self.flux, 2))),
            Directive::new("ENERGY", format!("ENERGY {:.2}", self.energy_kev)),
            Directive::new(BEAM_TYPE_KEYWORD, format!("TYPE {}", self.beam_type)),
            Directive::new("FWHM", format!("FWHM {:.1} {:.1}", fwhm_x, fwhm_y)),
            Directive::new(
                "COLLIMATION",
                format!("COLLIMATION RECTANGULAR {:.1} {:.1}", col_x, col_y),
            ),
            Directive::new("WEDGE", format!("WEDGE 0 {:.1}", self.wedge_end)),
            Directive::new(
                "EXPOSURETIME",
                format!("EXPOSURETIME {:.3}", self.exposure_time),
            ),
            Directive::new(
                "TRANSLATEPERDEGREE",
                format!("TRANSLATEPERDEGREE {:.4} {:.4} {:.4}", tx, ty, tz),
            ),
            Directive::new(
                "DIMENSION",
                format!("DIMENSION {:.1} {:.1} {:.1}", dx, dy, dz),
            ),
            Directive::new(
                "PIXELSPERMICRON",
                format!("PIXELSPERMICRON {:.1}", self.pixels_per_micron),
            ),
            Directive::new(
                "ANGULARRESOLUTION",
                format!("ANGULARRESOLUTION {:.1}", self.angular_resolution),
            ),
            Directive::new(
                "STARTOFFSET",
                format!("STARTOFFSET {:.6} {:.6} {:.6}", ox, oy, oz),
            ),
        ]
    }
}

/// Formats `value` in scientific notation with a signed, two-digit exponent
/// (`4.00e+12`), the form the simulator's own examples use.
pub fn scientific(value: f64, precision: usize) -> String {
    let rendered = format!("{:.*e}", precision, value);
    match rendered.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => rendered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimulationParameters {
        SimulationParameters {
            flux: 4e12,
            energy_kev: 12.66,
            beam_type: BeamType::Gaussian,
            fwhm: [1.0, 2.0],
            collimation: [3.0, 6.0],
            wedge_end: 180.0,
            exposure_time: 18.0,
            translate_per_degree: [0.0, 50.0 / 180.0, 0.0],
            start_offset: [0.0, -25.0, 0.0],
            dimensions: [1.0, 52.0, 1.0],
            pixels_per_micron: 2.0,
            angular_resolution: 2.0,
        }
    }

    #[test]
    fn scientific_uses_signed_two_digit_exponent() {
        assert_eq!(scientific(4e12, 2), "4.00e+12");
        assert_eq!(scientific(1.35e12, 2), "1.35e+12");
        assert_eq!(scientific(1e-3, 2), "1.00e-03");
        assert_eq!(scientific(0.0, 2), "0.00e+00");
    }

    #[test]
    fn directives_render_fixed_precision_lines() {
        let lines: Vec<String> = sample().directives().into_iter().map(|d| d.line).collect();
        assert_eq!(
            lines,
            vec![
                "FLUX 4.00e+12",
                "ENERGY 12.66",
                "TYPE GAUSSIAN",
                "FWHM 1.0 2.0",
                "COLLIMATION RECTANGULAR 3.0 6.0",
                "WEDGE 0 180.0",
                "EXPOSURETIME 18.000",
                "TRANSLATEPERDEGREE 0.0000 0.2778 0.0000",
                "DIMENSION 1.0 52.0 1.0",
                "PIXELSPERMICRON 2.0",
                "ANGULARRESOLUTION 2.0",
                "STARTOFFSET 0.000000 -25.000000 0.000000",
            ]
        );
    }

    #[test]
    fn beam_directive_targets_the_default_beam_line() {
        let directives = sample().directives();
        let beam = directives
            .iter()
            .find(|d| d.line.starts_with("TYPE"))
            .unwrap();
        assert_eq!(beam.keyword, BEAM_TYPE_KEYWORD);
    }
}
