use crate::constants::RELATIVISTIC_F;

/// Satellite Vehicle onboard clock model, as broadcast
/// along the orbital parameters.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ClockModel {
    /// Clock offset at reference time [s]
    pub bias: f64,
    /// Clock drift [s/s]
    pub drift: f64,
    /// Clock drift rate [s/s^2]
    pub drift_rate: f64,
    /// Clock reference time (t_oc), GPS time of week [s]
    pub t_oc: f64,
}

impl ClockModel {
    /// Builds new [ClockModel] from (Clock Offset [s],
    /// Clock drift [s/s] and Clock drift rate [s/s^2]) estimates.
    pub fn new(bias: f64, drift: f64, drift_rate: f64, t_oc: f64) -> Self {
        Self {
            bias,
            drift,
            drift_rate,
            t_oc,
        }
    }
    /// Clock offset [s] at given GPS time of week [s]
    pub fn offset(&self, t: f64) -> f64 {
        let dt = t - self.t_oc;
        self.bias + self.drift * dt + self.drift_rate * dt.powi(2)
    }
}

/// Relativistic clock correction [s] due to orbit eccentricity
pub fn relativistic_correction(e: f64, sqrt_a: f64, e_k: f64) -> f64 {
    RELATIVISTIC_F * e * sqrt_a * e_k.sin()
}
