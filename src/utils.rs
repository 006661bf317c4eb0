//! Small numeric helpers shared by orbit and navigation modules.
use std::f64::consts::TAU;

use crate::constants::{HALF_WEEK_SECONDS, WEEK_SECONDS};

/// Reduces angle (rad) to [0, 2π[
pub fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid may round up to TAU itself
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Brings a time difference (s) back within ±half a week,
/// which compensates one GPS week crossover.
pub fn week_crossover(dt: f64) -> f64 {
    if dt > HALF_WEEK_SECONDS {
        dt - WEEK_SECONDS
    } else if dt < -HALF_WEEK_SECONDS {
        dt + WEEK_SECONDS
    } else {
        dt
    }
}
