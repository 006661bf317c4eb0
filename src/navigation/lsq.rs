//! Iterative (Gauss-Newton) least squares multilateration
use log::{debug, trace};
use nalgebra::Matrix4;

use crate::{
    cfg::LsqOpts,
    navigation::Navigation,
    prelude::{Error, Vector3},
};

/// Converged least squares estimate
#[derive(Debug, Clone, PartialEq)]
pub struct LsqSolution {
    /// Receiver ECEF position [m]
    pub position: Vector3<f64>,
    /// Receiver clock bias, expressed in meters (divide by c for seconds)
    pub bias_m: f64,
    /// Norm of the pseudo range residual vector, at the last iteration [m]
    pub residual_norm: f64,
    /// Number of iterations performed
    pub iterations: usize,
    /// Geometric cofactor matrix (G'G)^-1, at the last iteration
    pub q: Matrix4<f64>,
}

/// Solves receiver position and clock bias from satellite ECEF positions and
/// their (clock corrected) pseudo ranges, starting from given seed.
pub fn solve(
    satellites: &[Vector3<f64>],
    pseudoranges: &[f64],
    initial_position: Vector3<f64>,
    initial_bias: f64,
    opts: &LsqOpts,
) -> Result<LsqSolution, Error> {
    solve_weighted(
        satellites,
        pseudoranges,
        None,
        initial_position,
        initial_bias,
        opts,
    )
}

/// [solve] with optional per satellite measurement weights.
pub fn solve_weighted(
    satellites: &[Vector3<f64>],
    pseudoranges: &[f64],
    weights: Option<&[f64]>,
    initial_position: Vector3<f64>,
    initial_bias: f64,
    opts: &LsqOpts,
) -> Result<LsqSolution, Error> {
    let n = satellites.len();

    if pseudoranges.len() != n {
        return Err(Error::DimensionMismatch {
            positions: n,
            pseudoranges: pseudoranges.len(),
        });
    }
    if let Some(weights) = weights {
        if weights.len() != n {
            return Err(Error::WeightMismatch {
                pseudoranges: n,
                weights: weights.len(),
            });
        }
    }
    if n < 4 {
        return Err(Error::UnderdeterminedSystem(n));
    }

    let mut position = initial_position;
    let mut bias_m = initial_bias;
    let mut nav = Navigation::new(n);

    for iteration in 1..=opts.max_iterations {
        for (i, (sv, pr)) in satellites.iter().zip(pseudoranges.iter()).enumerate() {
            let delta = sv - position;
            let rho = delta.norm();
            let weight = weights.map(|w| w[i]).unwrap_or(1.0);
            nav.load(i, -delta / rho, pr - (rho + bias_m), weight);
        }

        let dx = nav.resolve(opts.min_rcond)?;
        let dp = Vector3::new(dx[0], dx[1], dx[2]);

        position += dp;
        bias_m += dx[3];

        trace!(
            "lsq({}) - dx={:.6E} db={:.6E} |y|={:.6E}",
            iteration,
            dp.norm(),
            dx[3],
            nav.y.norm()
        );

        if dp.norm() < opts.tolerance_m {
            let q = nav.cofactor(opts.min_rcond)?;
            let residual_norm = nav.y.norm();
            debug!(
                "lsq - converged after {} iterations: x={:.3} y={:.3} z={:.3} b={:.3} |y|={:.3}",
                iteration, position[0], position[1], position[2], bias_m, residual_norm
            );
            return Ok(LsqSolution {
                position,
                bias_m,
                residual_norm,
                iterations: iteration,
                q,
            });
        }
    }

    Err(Error::ConvergenceFailure(opts.max_iterations))
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};
    use rstest::*;

    fn scenario() -> (Vec<Vector3<f64>>, Vec<f64>) {
        (
            vec![
                Vector3::new(25023639.62, 4783845.80, 8137692.35),
                Vector3::new(-1620081.77, 17327678.89, 20172485.06),
                Vector3::new(15757452.41, 1890975.96, 21856363.72),
                Vector3::new(23098436.98, 13303367.39, -3014966.44),
                Vector3::new(7810468.75, 17849813.84, 18350828.84),
            ],
            vec![
                21196005.88,
                22839528.10,
                21704707.75,
                22215117.69,
                21298089.88,
            ],
        )
    }

    /// Synthetic sky seen from `receiver`: satellites ~20000 km above
    /// the local horizon plane
    fn synthetic_sky(
        rng: &mut SmallRng,
        receiver: &Vector3<f64>,
        n: usize,
    ) -> Vec<Vector3<f64>> {
        let up = receiver.normalize();
        let mut satellites = Vec::with_capacity(n);
        while satellites.len() < n {
            let dir = Vector3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if dir.norm() < 0.1 {
                continue;
            }
            let dir = dir.normalize();
            if dir.dot(&up) < 0.2 {
                continue;
            }
            satellites.push(receiver + dir * 2.0E7);
        }
        satellites
    }

    #[test]
    fn reference_scenario() {
        let (satellites, pseudoranges) = scenario();
        let solution = solve(
            &satellites,
            &pseudoranges,
            Vector3::zeros(),
            0.0,
            &LsqOpts::default(),
        )
        .unwrap();

        let expected = Vector3::new(4438536.94, 3085403.90, 3376938.44);
        assert!(
            (solution.position - expected).norm() < 0.05,
            "position: {}",
            solution.position
        );
        assert!((solution.bias_m - 590.66).abs() < 0.05, "bias: {}", solution.bias_m);
        assert!(
            (solution.residual_norm - 1673.96).abs() < 0.05,
            "residual: {}",
            solution.residual_norm
        );
        assert!(solution.iterations <= 10);
    }

    #[test]
    fn fixed_point() {
        let opts = LsqOpts::default();
        let (satellites, pseudoranges) = scenario();
        let first = solve(&satellites, &pseudoranges, Vector3::zeros(), 0.0, &opts).unwrap();
        let second = solve(
            &satellites,
            &pseudoranges,
            first.position,
            first.bias_m,
            &opts,
        )
        .unwrap();

        assert_eq!(second.iterations, 1);
        assert!((second.position - first.position).norm() < opts.tolerance_m);
        assert!((second.bias_m - first.bias_m).abs() < opts.tolerance_m);
        assert!((second.residual_norm - first.residual_norm).abs() < 1.0E-3);
    }

    #[rstest]
    #[case(4, 0x01, 1.0E-5)]
    #[case(5, 0x02, 1.0E-6)]
    #[case(8, 0x03, 1.0E-6)]
    #[case(12, 0x04, 1.0E-6)]
    fn noiseless_recovery(#[case] n: usize, #[case] seed: u64, #[case] tolerance: f64) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let opts = LsqOpts::default();

        for _ in 0..10 {
            let receiver = Vector3::new(
                rng.random_range(-6.0E6..6.0E6),
                rng.random_range(-6.0E6..6.0E6),
                rng.random_range(-6.0E6..6.0E6),
            )
            .normalize()
                * 6.371E6;

            let bias_m = rng.random_range(-1.0E5..1.0E5);

            let satellites = synthetic_sky(&mut rng, &receiver, n);
            let pseudoranges = satellites
                .iter()
                .map(|sv| (sv - receiver).norm() + bias_m)
                .collect::<Vec<_>>();

            let solution =
                solve(&satellites, &pseudoranges, Vector3::zeros(), 0.0, &opts).unwrap();

            let err = (solution.position - receiver).norm();
            assert!(err < tolerance, "position error {} (n={})", err, n);
            assert!(
                (solution.bias_m - bias_m).abs() < tolerance,
                "bias error {}",
                solution.bias_m - bias_m
            );

            // last residual is evaluated prior to the last (sub millimetric) update
            assert!(solution.residual_norm < 1.0E-2, "residual {}", solution.residual_norm);

            let postfit = satellites
                .iter()
                .zip(pseudoranges.iter())
                .map(|(sv, pr)| pr - (sv - solution.position).norm() - solution.bias_m)
                .map(|res| res * res)
                .sum::<f64>()
                .sqrt();
            assert!(postfit < 1.0E-5, "postfit residual {} (n={})", postfit, n);
        }
    }

    #[test]
    fn underdetermined() {
        let (satellites, pseudoranges) = scenario();
        let opts = LsqOpts::default();

        match solve(
            &satellites[..3],
            &pseudoranges[..3],
            Vector3::zeros(),
            0.0,
            &opts,
        ) {
            Err(Error::UnderdeterminedSystem(n)) => assert_eq!(n, 3),
            other => panic!("should have failed, got {:?}", other),
        }

        assert!(solve(
            &satellites[..4],
            &pseudoranges[..4],
            Vector3::zeros(),
            0.0,
            &opts
        )
        .is_ok());
    }

    #[test]
    fn dimension_mismatch() {
        let (satellites, pseudoranges) = scenario();
        match solve(
            &satellites,
            &pseudoranges[..4],
            Vector3::zeros(),
            0.0,
            &LsqOpts::default(),
        ) {
            Err(Error::DimensionMismatch {
                positions,
                pseudoranges,
            }) => {
                assert_eq!(positions, 5);
                assert_eq!(pseudoranges, 4);
            },
            other => panic!("should have failed, got {:?}", other),
        }

        // checked before the satellite count
        assert!(matches!(
            solve(
                &satellites[..2],
                &pseudoranges[..3],
                Vector3::zeros(),
                0.0,
                &LsqOpts::default()
            ),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn coincident_satellites() {
        let sv = Vector3::new(15757452.41, 1890975.96, 21856363.72);
        let satellites = vec![sv; 5];
        let pseudoranges = vec![21704707.75; 5];
        assert!(matches!(
            solve(
                &satellites,
                &pseudoranges,
                Vector3::zeros(),
                0.0,
                &LsqOpts::default()
            ),
            Err(Error::SingularGeometry)
        ));
    }

    #[test]
    fn colinear_satellites() {
        // all satellites aligned with the seed: identical lines of sight
        let dir = Vector3::new(1.0, 2.0, 3.0).normalize();
        let satellites = (1..=5)
            .map(|k| dir * (2.0E7 + k as f64 * 1.0E6))
            .collect::<Vec<_>>();
        let pseudoranges = satellites.iter().map(|sv| sv.norm()).collect::<Vec<_>>();
        assert!(matches!(
            solve(
                &satellites,
                &pseudoranges,
                Vector3::zeros(),
                0.0,
                &LsqOpts::default()
            ),
            Err(Error::SingularGeometry)
        ));
    }

    #[test]
    fn iteration_cap() {
        let (satellites, pseudoranges) = scenario();
        let opts = LsqOpts {
            max_iterations: 2,
            ..Default::default()
        };
        match solve(&satellites, &pseudoranges, Vector3::zeros(), 0.0, &opts) {
            Err(Error::ConvergenceFailure(n)) => assert_eq!(n, 2),
            other => panic!("should have failed, got {:?}", other),
        }
    }

    #[test]
    fn weighted() {
        let (satellites, pseudoranges) = scenario();
        let opts = LsqOpts::default();

        // uniform weights are equivalent to unweighted
        let uniform = solve_weighted(
            &satellites,
            &pseudoranges,
            Some(&[2.0; 5][..]),
            Vector3::zeros(),
            0.0,
            &opts,
        )
        .unwrap();
        let reference = solve(&satellites, &pseudoranges, Vector3::zeros(), 0.0, &opts).unwrap();
        assert!((uniform.position - reference.position).norm() < 1.0E-3);

        let weighted = solve_weighted(
            &satellites,
            &pseudoranges,
            Some(&[1.0, 1.0, 1.0, 1.0, 100.0][..]),
            Vector3::zeros(),
            0.0,
            &opts,
        )
        .unwrap();
        assert!((weighted.position - reference.position).norm() > 1.0);

        assert!(matches!(
            solve_weighted(
                &satellites,
                &pseudoranges,
                Some(&[1.0; 4][..]),
                Vector3::zeros(),
                0.0,
                &opts
            ),
            Err(Error::WeightMismatch {
                pseudoranges: 5,
                weights: 4
            })
        ));
    }
}
