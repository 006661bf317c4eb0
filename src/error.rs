use thiserror::Error;

use crate::prelude::SV;

#[derive(Debug, Error)]
pub enum Error {
    /// [EphemerisRecord](crate::prelude::EphemerisRecord) is invalidated as soon as
    /// one of its fields is not provided: we never zero-fill.
    #[error("missing ephemeris field \"{0}\"")]
    MissingField(&'static str),

    /// Orbit propagation requires at least one satellite.
    #[error("empty input: no satellite to propagate")]
    EmptyInput,

    /// Satellite positions and pseudo ranges must be paired one to one.
    #[error("dimension mismatch: {positions} positions for {pseudoranges} pseudo ranges")]
    DimensionMismatch {
        positions: usize,
        pseudoranges: usize,
    },

    /// Measurement weights must be paired one to one with pseudo ranges.
    #[error("dimension mismatch: {weights} weights for {pseudoranges} pseudo ranges")]
    WeightMismatch { pseudoranges: usize, weights: usize },

    /// Position and clock bias (4 unknowns) require at least 4 satellites.
    #[error("underdetermined system: {0} satellites (4 required)")]
    UnderdeterminedSystem(usize),

    /// Coincident or co-linear satellites will cause the normal matrix to
    /// be singular (or too ill conditioned to be inverted safely).
    #[error("singular geometry: failed to invert normal matrix")]
    SingularGeometry,

    /// Gauss-Newton iteration did not settle within the iteration cap.
    #[error("no convergence after {0} iterations")]
    ConvergenceFailure(usize),

    /// Each satellite may only contribute once per epoch.
    #[error("duplicate satellite {0} in epoch")]
    DuplicateSatellite(SV),

    /// No ephemeris could be selected for this satellite.
    #[error("no ephemeris available for {0}")]
    MissingEphemeris(SV),

    /// [ReceiverSolution](crate::prelude::ReceiverSolution) rejected by the validator.
    #[error("invalid solution: {0}")]
    InvalidSolution(#[from] crate::navigation::solutions::validator::Error),

    #[error("missing column \"{0}\"")]
    MissingColumn(String),

    #[error("invalid record (line {line}): {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("unknown constellation type {0}")]
    UnknownConstellation(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("kml error: {0}")]
    Kml(#[from] kml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
