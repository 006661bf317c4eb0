pub mod lsq;
pub mod solutions;

use log::trace;
use nalgebra::{DVector, Matrix4, MatrixXx4, Vector4};

use crate::prelude::{Error, Vector3};

/// Linearized pseudo range model, around the current position estimate:
/// one row per satellite, 4 unknowns (position update + clock bias update).
#[derive(Debug, Clone)]
pub struct Navigation {
    /// Design matrix: line of sight (3) and clock (1) partials
    pub g: MatrixXx4<f64>,
    /// Pseudo range residuals [m]
    pub y: DVector<f64>,
    /// Measurement weights (diagonal)
    pub w: DVector<f64>,
}

impl Navigation {
    /// Allocates a system for `n` satellites, uniformly weighted
    pub fn new(n: usize) -> Self {
        Self {
            g: MatrixXx4::<f64>::from_element(n, 1.0),
            y: DVector::<f64>::zeros(n),
            w: DVector::<f64>::from_element(n, 1.0),
        }
    }
    /// Number of equations
    pub fn rows(&self) -> usize {
        self.y.len()
    }
    /// Loads one equation: unit line of sight (receiver minus satellite,
    /// normalized), pseudo range residual and weight.
    pub fn load(&mut self, row: usize, los: Vector3<f64>, residual: f64, weight: f64) {
        self.y[row] = residual;
        self.w[row] = weight;
        self.g[(row, 0)] = los[0];
        self.g[(row, 1)] = los[1];
        self.g[(row, 2)] = los[2];
        self.g[(row, 3)] = 1.0_f64;
    }
    /// Forms and checks normal matrix G'WG. Geometry is declared singular
    /// when its reciprocal condition number drops below `min_rcond`.
    fn normal_matrix(&self, weighted: bool, min_rcond: f64) -> Result<Matrix4<f64>, Error> {
        let mut g_prime = self.g.transpose();
        if weighted {
            for (j, w) in self.w.iter().enumerate() {
                g_prime.column_mut(j).scale_mut(*w);
            }
        }
        let normal = g_prime * &self.g;

        let singular_values = normal.singular_values();
        let rcond = singular_values.min() / singular_values.max();
        if !(rcond >= min_rcond) {
            trace!("normal matrix: {} rcond={:.3E}", normal, rcond);
            return Err(Error::SingularGeometry);
        }
        Ok(normal)
    }
    /// Resolves weighted normal equations dx = (G'WG)^-1 G'W y
    pub fn resolve(&self, min_rcond: f64) -> Result<Vector4<f64>, Error> {
        let normal = self.normal_matrix(true, min_rcond)?;
        let p = normal.try_inverse().ok_or(Error::SingularGeometry)?;

        let mut g_prime = self.g.transpose();
        for (j, w) in self.w.iter().enumerate() {
            g_prime.column_mut(j).scale_mut(*w);
        }
        let dx = p * (g_prime * &self.y);

        if dx.iter().any(|x| !x.is_finite()) {
            return Err(Error::SingularGeometry);
        }
        Ok(dx)
    }
    /// Geometric cofactor matrix Q = (G'G)^-1
    pub fn cofactor(&self, min_rcond: f64) -> Result<Matrix4<f64>, Error> {
        self.normal_matrix(false, min_rcond)?
            .try_inverse()
            .ok_or(Error::SingularGeometry)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn linear_system() {
        // 4 orthogonal-ish directions, exact solution
        let dirs = [
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(-1.0, -1.0, -1.0).normalize(),
        ];
        let truth = Vector4::new(1.0, -2.0, 3.0, 10.0);

        let mut nav = Navigation::new(4);
        for (i, los) in dirs.iter().enumerate() {
            let y = los.dot(&Vector3::new(truth[0], truth[1], truth[2])) + truth[3];
            nav.load(i, *los, y, 1.0);
        }

        assert_eq!(nav.rows(), 4);
        let dx = nav.resolve(1.0E-12).unwrap();
        assert!((dx - truth).norm() < 1.0E-9, "dx={}", dx);

        let q = nav.cofactor(1.0E-12).unwrap();
        assert!(q[(3, 3)] > 0.0);
    }

    #[test]
    fn coincident_rows() {
        let mut nav = Navigation::new(4);
        for i in 0..4 {
            nav.load(i, Vector3::new(0.0, 0.6, 0.8), 100.0, 1.0);
        }
        assert!(matches!(nav.resolve(1.0E-12), Err(Error::SingularGeometry)));
        assert!(matches!(nav.cofactor(1.0E-12), Err(Error::SingularGeometry)));
    }
}
