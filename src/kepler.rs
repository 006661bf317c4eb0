use crate::{cfg::KeplerOpts, constants::EARTH_GRAVITATION_MU_M3_S2};

/// Keplerian parameters
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Keplerian {
    /// Square root of the semi major axis (m^1/2)
    pub sqrt_a: f64,
    /// Eccentricity (n.a)
    pub e: f64,
    /// Inclination angle at reference time (rad)
    pub i_0: f64,
    /// Longitude of ascending node at reference time (rad)
    pub omega_0: f64,
    /// Mean anomaly at reference time (rad)
    pub m_0: f64,
    /// Argument of perigee (rad)
    pub omega: f64,
}

impl Keplerian {
    /// Semi major axis (m)
    pub fn a(&self) -> f64 {
        self.sqrt_a.powi(2)
    }
    /// Computed mean motion n0 = sqrt(mu / A^3) (rad.s-1)
    pub fn mean_motion(&self) -> f64 {
        (EARTH_GRAVITATION_MU_M3_S2 / self.a().powi(3)).sqrt()
    }
}

/// Keplerian perturbations
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Perturbations {
    /// Mean motion difference from computed value [rad.s-1]
    pub dn: f64,
    /// Inclination rate of change [rad.s-1]
    pub i_dot: f64,
    /// Right ascension rate of change [rad.s^-1]
    pub omega_dot: f64,
    /// Amplitude of sine harmonic correction term of the argument
    /// of latitude [rad]
    pub cus: f64,
    /// Amplitude of cosine harmonic correction term of the argument
    /// of latitude [rad]
    pub cuc: f64,
    /// Amplitude of sine harmonic correction term of the angle of inclination [rad]
    pub cis: f64,
    /// Amplitude of cosine harmonic correction term of the angle of inclination [rad]
    pub cic: f64,
    /// Amplitude of sine harmonic correction term of the orbit radius [m]
    pub crs: f64,
    /// Amplitude of cosine harmonic correction term of the orbit radius [m]
    pub crc: f64,
}

/// Eccentric anomaly, resolved from Kepler's equation
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EccentricAnomaly {
    /// Ek (rad)
    pub value: f64,
    /// Number of fixed point iterations performed
    pub iterations: usize,
    /// Last |E(k+1) - E(k)| step
    pub residual: f64,
    /// True when residual dropped below tolerance before the cap
    pub converged: bool,
}

/// Solves Kepler's equation Ek = Mk + e.sin(Ek) by fixed point iteration,
/// seeded with Ek = Mk. Iteration stops when the step drops below tolerance
/// or when the iteration cap is reached, whichever comes first.
pub fn eccentric_anomaly(m_k: f64, e: f64, opts: &KeplerOpts) -> EccentricAnomaly {
    let mut e_k = m_k;
    let mut residual = 1.0_f64;
    let mut iterations = 0;

    while residual.abs() > opts.tolerance && iterations < opts.max_iterations {
        let next = m_k + e * e_k.sin();
        residual = next - e_k;
        e_k = next;
        iterations += 1;
    }

    EccentricAnomaly {
        value: e_k,
        iterations,
        residual: residual.abs(),
        converged: residual.abs() <= opts.tolerance,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn circular_orbit() {
        let opts = KeplerOpts::default();
        for m_k in [0.0, 0.5, 1.0, 2.5, -3.0] {
            let ea = eccentric_anomaly(m_k, 0.0, &opts);
            assert_eq!(ea.value, m_k);
            assert_eq!(ea.iterations, 1);
            assert!(ea.converged);
        }
    }

    #[test]
    fn gps_eccentricities() {
        let opts = KeplerOpts::default();
        let mut rng = SmallRng::seed_from_u64(0x4b45504c);
        for _ in 0..1000 {
            let m_k = rng.random_range(-std::f64::consts::PI..std::f64::consts::PI);
            let e = rng.random_range(0.0..0.02);
            let ea = eccentric_anomaly(m_k, e, &opts);
            assert!(ea.converged, "M={} e={} did not converge", m_k, e);
            assert!(ea.iterations <= 10);
            let kepler = (m_k - (ea.value - e * ea.value.sin())).abs();
            assert!(kepler < 1.0E-8, "M={} e={} |residual|={}", m_k, e, kepler);
        }
    }

    #[test]
    fn capped_iterations() {
        // highly eccentric orbits converge slowly: the cap applies, no error
        let ea = eccentric_anomaly(199649819.8321739, 0.7, &KeplerOpts::default());
        assert_eq!(ea.iterations, 10);
        assert!(!ea.converged);
    }

    #[test]
    fn keplerian() {
        let kepler = Keplerian {
            sqrt_a: 5153.7,
            ..Default::default()
        };
        assert!((kepler.a() - 5153.7_f64 * 5153.7).abs() < 1.0E-6);
        // ~12h orbital period
        let period = 2.0 * std::f64::consts::PI / kepler.mean_motion();
        assert!((period - 43077.0).abs() < 100.0, "period {}", period);
    }
}
