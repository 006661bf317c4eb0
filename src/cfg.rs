use serde::Deserialize;

use crate::prelude::Error;

fn default_kepler_tolerance() -> f64 {
    1.0E-8
}

fn default_kepler_iterations() -> usize {
    10
}

fn default_lsq_tolerance() -> f64 {
    1.0E-3
}

fn default_lsq_iterations() -> usize {
    50
}

fn default_min_rcond() -> f64 {
    1.0E-12
}

fn default_gap_ms() -> f64 {
    200.0
}

fn default_max_pseudorange_s() -> f64 {
    0.1
}

fn default_min_sv() -> usize {
    5
}

fn default_warm_start() -> bool {
    true
}

/// Kepler's equation fixed point iteration settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeplerOpts {
    /// Stop iterating once |E(k+1) - E(k)| drops below this value [rad]
    #[serde(default = "default_kepler_tolerance")]
    pub tolerance: f64,
    /// Iteration cap. Reaching it is reported but not treated as an error.
    #[serde(default = "default_kepler_iterations")]
    pub max_iterations: usize,
}

impl Default for KeplerOpts {
    fn default() -> Self {
        Self {
            tolerance: default_kepler_tolerance(),
            max_iterations: default_kepler_iterations(),
        }
    }
}

/// Measurement weighting strategy
#[derive(Default, Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum Weighting {
    /// Every pseudo range contributes equally
    #[default]
    Uniform,
    /// Weight each pseudo range by its linear C/N0 (10^(cn0/10))
    Cn0,
}

/// Least squares (Gauss-Newton) solver settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LsqOpts {
    /// Stop iterating once the position update norm drops below this value [m]
    #[serde(default = "default_lsq_tolerance")]
    pub tolerance_m: f64,
    /// Iteration cap, exceeding it is a convergence failure
    #[serde(default = "default_lsq_iterations")]
    pub max_iterations: usize,
    /// Reciprocal condition number (smallest / largest singular value)
    /// of the normal matrix below which geometry is declared singular
    #[serde(default = "default_min_rcond")]
    pub min_rcond: f64,
    #[serde(default)]
    pub weighting: Weighting,
    /// Solutions with a GDOP past this value are rejected
    #[serde(default)]
    pub max_gdop: Option<f64>,
}

impl Default for LsqOpts {
    fn default() -> Self {
        Self {
            tolerance_m: default_lsq_tolerance(),
            max_iterations: default_lsq_iterations(),
            min_rcond: default_min_rcond(),
            weighting: Weighting::default(),
            max_gdop: None,
        }
    }
}

/// Physical modeling options. Both default to off, which
/// reproduces the historical outputs exactly.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
pub struct Modeling {
    /// Add the relativistic term F.e.sqrt(A).sin(Ek) to the satellite clock bias
    #[serde(default)]
    pub relativistic_clock_correction: bool,
    /// Reduce (t_tx - t_oe) to ±half a week before propagating
    #[serde(default)]
    pub tk_week_rollover: bool,
}

/// Epoch segmentation and selection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EpochOpts {
    /// Time gap (ms) above which a new epoch starts
    #[serde(default = "default_gap_ms")]
    pub gap_ms: f64,
    /// Observations with a pseudo range (in seconds) past this value are dropped
    #[serde(default = "default_max_pseudorange_s")]
    pub max_pseudorange_s: f64,
    /// Minimal number of satellites for an epoch to be solved
    #[serde(default = "default_min_sv")]
    pub min_sv: usize,
}

impl Default for EpochOpts {
    fn default() -> Self {
        Self {
            gap_ms: default_gap_ms(),
            max_pseudorange_s: default_max_pseudorange_s(),
            min_sv: default_min_sv(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub kepler: KeplerOpts,
    #[serde(default)]
    pub lsq: LsqOpts,
    #[serde(default)]
    pub modeling: Modeling,
    #[serde(default)]
    pub epoch: EpochOpts,
    /// Seed each epoch with the previous solution. When disabled,
    /// every epoch starts from the origin with a null bias.
    #[serde(default = "default_warm_start")]
    pub warm_start: bool,
    /// Elevation mask (degrees). Only applied once a receiver
    /// position is known (previous epoch).
    #[serde(default)]
    pub min_elevation_deg: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kepler: KeplerOpts::default(),
            lsq: LsqOpts::default(),
            modeling: Modeling::default(),
            epoch: EpochOpts::default(),
            warm_start: default_warm_start(),
            min_elevation_deg: None,
        }
    }
}

impl Config {
    /// Parses [Config] from JSON content. Omitted fields take their default value.
    pub fn from_json(content: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(content)?)
    }
    /// Copies and returns [Config] with desired [Modeling]
    pub fn with_modeling(&self, modeling: Modeling) -> Self {
        let mut s = self.clone();
        s.modeling = modeling;
        s
    }
    /// Copies and returns [Config] with warm start preference
    pub fn with_warm_start(&self, warm_start: bool) -> Self {
        let mut s = self.clone();
        s.warm_start = warm_start;
        s
    }
}
