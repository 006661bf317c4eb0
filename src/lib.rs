//! GNSS raw measurements to receiver trajectory.
//!
//! GPS satellites are located from their broadcast (Keplerian) ephemeris at
//! signal transmission time, and receiver position and clock bias are then
//! resolved epoch by epoch by iterative least squares multilateration.
//!
//! ```no_run
//! use gnss_lsq::prelude::*;
//! use std::fs::File;
//!
//! let log = parse_log(File::open("gnss_log.txt")?)?;
//! let store = EphemerisStore::from_csv(File::open("ephemeris.csv")?)?;
//!
//! let cfg = Config::default();
//! let measurements = convert(&log.raw, Constellation::GPS);
//! let epochs = segment(&measurements, &cfg.epoch)?;
//!
//! let mut solver = Solver::new(cfg);
//! for solution in solver.resolve(&epochs, &store) {
//!     println!("{:?}", solution.geodetic_ddeg());
//! }
//! # Ok::<(), gnss_lsq::Error>(())
//! ```
#![cfg_attr(docrs, feature(doc_cfg))]

extern crate gnss_rs as gnss;

// private modules
mod clock;
mod constants;
mod error;
mod kepler;
mod utils;

pub mod cfg;
pub mod ephemeris;
pub mod epoch;
pub mod export;
pub mod logfile;
pub mod measurement;
pub mod navigation;
pub mod observation;
pub mod orbit;
pub mod solver;

// pub export
pub use error::Error;

#[cfg(test)]
mod tests;

// prelude
pub mod prelude {
    pub use crate::cfg::{Config, EpochOpts, KeplerOpts, LsqOpts, Modeling, Weighting};
    pub use crate::clock::ClockModel;
    pub use crate::ephemeris::{EphemerisFields, EphemerisRecord, EphemerisSource, EphemerisStore};
    pub use crate::epoch::segment;
    pub use crate::error::Error;
    pub use crate::export::{write_kml, write_satellites, write_trajectory};
    pub use crate::kepler::{EccentricAnomaly, Keplerian, Perturbations};
    pub use crate::logfile::{parse_log, Fix, GnssLog, RawMeasurement};
    pub use crate::measurement::{convert, Measurement};
    pub use crate::navigation::{
        lsq::{solve, solve_weighted, LsqSolution},
        solutions::{ReceiverSolution, DOP},
    };
    pub use crate::observation::{Observation, ObservationEpoch};
    pub use crate::orbit::{elevation_azimuth, propagate, propagate_batch, SatelliteState};
    pub use crate::solver::Solver;
    // re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
    pub use nalgebra::Vector3;
}
