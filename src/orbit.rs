//! Broadcast orbit propagation
use log::{debug, warn};
use map_3d::{ecef2geodetic, rad2deg, Ellipsoid};
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::{
    cfg::Config,
    clock::relativistic_correction,
    constants::{EARTH_ANGULAR_VEL_RAD, SPEED_OF_LIGHT_M_S},
    ephemeris::{EphemerisFields, EphemerisRecord},
    kepler::{eccentric_anomaly, EccentricAnomaly},
    observation::Observation,
    prelude::{Error, Vector3, SV},
    utils::{week_crossover, wrap_two_pi},
};

/// Satellite state at signal transmission time
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SatelliteState {
    /// Satellite Vehicle
    pub sv: SV,
    /// Time elapsed since reference time of ephemeris t_oe [s]
    pub gps_time: f64,
    /// Satellite clock bias [s]
    pub clock_bias_s: f64,
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// Pseudo range, corrected for satellite clock bias [m]
    pub pseudorange_m: f64,
    /// Carrier to noise density ratio [dB-Hz]
    pub cn0_dbhz: f64,
    /// Kepler's equation resolution
    pub eccentric_anomaly: EccentricAnomaly,
}

/// Orbital position resolved from one [EphemerisRecord]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Propagation {
    /// t - t_oe [s]
    pub t_k: f64,
    /// Corrected mean anomaly [rad]
    pub m_k: f64,
    pub eccentric_anomaly: EccentricAnomaly,
    /// True anomaly [rad]
    pub nu_k: f64,
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// Satellite clock bias [s]
    pub clock_bias_s: f64,
}

impl EphemerisRecord {
    /// Resolves satellite position and clock bias at transmission
    /// time `t` (GPS time of week, in seconds).
    pub fn propagate(&self, t: f64, cfg: &Config) -> Propagation {
        let (kepler, perturbations) = (&self.keplerian, &self.perturbations);

        let a = kepler.a();
        let n = kepler.mean_motion() + perturbations.dn;

        let t_k = match cfg.modeling.tk_week_rollover {
            true => week_crossover(t - self.t_oe),
            false => t - self.t_oe,
        };

        let m_k = kepler.m_0 + n * t_k;

        let ea = eccentric_anomaly(m_k, kepler.e, &cfg.kepler);
        if !ea.converged {
            warn!(
                "({}) - kepler: no convergence after {} iterations (|dE|={:.3E})",
                self.sv, ea.iterations, ea.residual
            );
        }

        let (sin_e_k, cos_e_k) = ea.value.sin_cos();

        let nu_k = ((1.0 - kepler.e.powi(2)).sqrt() * sin_e_k).atan2(cos_e_k - kepler.e);
        let phi_k = nu_k + kepler.omega;

        let (sin_2phi_k, cos_2phi_k) = (2.0 * phi_k).sin_cos();

        let du_k = perturbations.cus * sin_2phi_k + perturbations.cuc * cos_2phi_k;
        let dr_k = perturbations.crs * sin_2phi_k + perturbations.crc * cos_2phi_k;
        let di_k = perturbations.cis * sin_2phi_k + perturbations.cic * cos_2phi_k;

        let u_k = phi_k + du_k;
        let r_k = a * (1.0 - kepler.e * cos_e_k) + dr_k;
        let i_k = kepler.i_0 + di_k + perturbations.i_dot * t_k;

        let xp_k = r_k * u_k.cos();
        let yp_k = r_k * u_k.sin();

        let omega_k = kepler.omega_0 + (perturbations.omega_dot - EARTH_ANGULAR_VEL_RAD) * t_k
            - EARTH_ANGULAR_VEL_RAD * self.t_oe;

        let (sin_omega_k, cos_omega_k) = omega_k.sin_cos();
        let (sin_i_k, cos_i_k) = i_k.sin_cos();

        let position = Vector3::new(
            xp_k * cos_omega_k - yp_k * cos_i_k * sin_omega_k,
            xp_k * sin_omega_k + yp_k * cos_i_k * cos_omega_k,
            yp_k * sin_i_k,
        );

        let mut clock_bias_s = self.clock.offset(t);
        if cfg.modeling.relativistic_clock_correction {
            clock_bias_s += relativistic_correction(kepler.e, kepler.sqrt_a, ea.value);
        }

        Propagation {
            t_k,
            m_k,
            eccentric_anomaly: ea,
            nu_k,
            position,
            clock_bias_s,
        }
    }
}

/// Resolves [SatelliteState] of one satellite, from its broadcast ephemeris and
/// [Observation]. Ephemeris is fully validated prior any calculation.
pub fn propagate(
    ephemeris: &EphemerisFields,
    observation: &Observation,
    cfg: &Config,
) -> Result<SatelliteState, Error> {
    let record = EphemerisRecord::try_from(ephemeris)?;
    let propagation = record.propagate(observation.transmit_time_s, cfg);

    let pseudorange_m =
        observation.pseudorange_m + SPEED_OF_LIGHT_M_S * propagation.clock_bias_s;

    debug!(
        "({}) - t_k={:.3} dt={:.6E}s x={:.3} y={:.3} z={:.3} pr={:.3}",
        observation.sv,
        propagation.t_k,
        propagation.clock_bias_s,
        propagation.position[0],
        propagation.position[1],
        propagation.position[2],
        pseudorange_m,
    );

    Ok(SatelliteState {
        sv: observation.sv,
        gps_time: propagation.t_k,
        clock_bias_s: propagation.clock_bias_s,
        position: propagation.position,
        pseudorange_m,
        cn0_dbhz: observation.cn0_dbhz,
        eccentric_anomaly: propagation.eccentric_anomaly,
    })
}

/// Resolves [SatelliteState] of every observed satellite, in order of observation.
/// Every satellite must be described in `ephemerides`.
pub fn propagate_batch(
    ephemerides: &HashMap<SV, EphemerisFields>,
    observations: &[Observation],
    cfg: &Config,
) -> Result<Vec<SatelliteState>, Error> {
    if observations.is_empty() || ephemerides.is_empty() {
        return Err(Error::EmptyInput);
    }
    observations
        .iter()
        .map(|obs| {
            let ephemeris = ephemerides
                .get(&obs.sv)
                .ok_or(Error::MissingEphemeris(obs.sv))?;
            propagate(ephemeris, obs, cfg)
        })
        .collect()
}

/// Computes (elevation, azimuth) angles in degrees, of given satellite position
/// as seen from given receiver position. Both expressed in ECEF [m].
pub fn elevation_azimuth(sv: &Vector3<f64>, receiver: &Vector3<f64>) -> (f64, f64) {
    let (ref_lat, ref_lon, _) =
        ecef2geodetic(receiver[0], receiver[1], receiver[2], Ellipsoid::WGS84);

    // unit line of sight
    let los = (sv - receiver).normalize();

    // ECEF to VEN 3X3 transform
    let ven = (
        ref_lat.cos() * ref_lon.cos() * los[0]
            + ref_lat.cos() * ref_lon.sin() * los[1]
            + ref_lat.sin() * los[2],
        -ref_lon.sin() * los[0] + ref_lon.cos() * los[1],
        -ref_lat.sin() * ref_lon.cos() * los[0] - ref_lat.sin() * ref_lon.sin() * los[1]
            + ref_lat.cos() * los[2],
    );

    let el = rad2deg(PI / 2.0 - ven.0.clamp(-1.0, 1.0).acos());
    let az = rad2deg(wrap_two_pi(ven.1.atan2(ven.2)));
    (el, az)
}
