//! Receiver solutions
use map_3d::{ecef2geodetic, rad2deg, Ellipsoid};
use nalgebra::{Matrix3, Matrix4};

use crate::{
    constants::SPEED_OF_LIGHT_M_S,
    navigation::lsq::LsqSolution,
    prelude::{Epoch, Vector3, SV},
};

pub mod validator;

/// Dilution of Precision
#[derive(Debug, Clone, PartialEq)]
pub struct DOP {
    /// Geometric Dilution of Precision
    pub gdop: f64,
    /// Position Dilution of Precision
    pub pdop: f64,
    /// Time Dilution of Precision
    pub tdop: f64,
    /// 4x4 cofactor matrix
    q: Matrix4<f64>,
}

impl DOP {
    /// Builds new [DOP] from geometric cofactor matrix (G'G)^-1
    pub fn new(q: Matrix4<f64>) -> Self {
        let pdop = (q[(0, 0)] + q[(1, 1)] + q[(2, 2)]).sqrt();
        let tdop = q[(3, 3)].sqrt();
        let gdop = (pdop.powi(2) + tdop.powi(2)).sqrt();
        Self {
            q,
            gdop,
            pdop,
            tdop,
        }
    }
    /// Position cofactor, rotated to local East North Up frame
    fn q_enu(&self, lat: f64, lon: f64) -> Matrix3<f64> {
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let r = Matrix3::<f64>::new(
            -sin_lon,
            cos_lon,
            0.0_f64,
            -sin_lat * cos_lon,
            -sin_lat * sin_lon,
            cos_lat,
            cos_lat * cos_lon,
            cos_lat * sin_lon,
            sin_lat,
        );
        let q_xyz = self.q.fixed_view::<3, 3>(0, 0).into_owned();
        r * q_xyz * r.transpose()
    }
    /// Horizontal Dilution of Precision, at given location (rad)
    pub fn hdop(&self, lat: f64, lon: f64) -> f64 {
        let q = self.q_enu(lat, lon);
        (q[(0, 0)] + q[(1, 1)]).sqrt()
    }
    /// Vertical Dilution of Precision, at given location (rad)
    pub fn vdop(&self, lat: f64, lon: f64) -> f64 {
        self.q_enu(lat, lon)[(2, 2)].sqrt()
    }
}

/// Receiver position and clock solution for one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverSolution {
    /// Sampling instant, when known
    pub epoch: Option<Epoch>,
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// Receiver clock bias, expressed in meters
    pub bias_m: f64,
    /// Post fit pseudo range residual norm [m]
    pub residual_norm: f64,
    /// Number of least squares iterations
    pub iterations: usize,
    /// Satellites that helped form this solution
    pub sv: Vec<SV>,
    /// Dilution of Precision
    pub dop: DOP,
}

impl ReceiverSolution {
    /// Builds new [ReceiverSolution] from converged least squares estimate
    pub fn new(epoch: Option<Epoch>, sv: Vec<SV>, lsq: LsqSolution) -> Self {
        Self {
            epoch,
            sv,
            position: lsq.position,
            bias_m: lsq.bias_m,
            residual_norm: lsq.residual_norm,
            iterations: lsq.iterations,
            dop: DOP::new(lsq.q),
        }
    }
    /// Receiver clock bias [s]
    pub fn dt(&self) -> f64 {
        self.bias_m / SPEED_OF_LIGHT_M_S
    }
    /// Geodetic coordinates (WGS84): latitude [rad], longitude [rad], altitude [m]
    pub fn geodetic_rad(&self) -> (f64, f64, f64) {
        ecef2geodetic(
            self.position[0],
            self.position[1],
            self.position[2],
            Ellipsoid::WGS84,
        )
    }
    /// Geodetic coordinates (WGS84): latitude [ddeg], longitude [ddeg], altitude [m]
    pub fn geodetic_ddeg(&self) -> (f64, f64, f64) {
        let (lat, lon, alt) = self.geodetic_rad();
        (rad2deg(lat), rad2deg(lon), alt)
    }
    /// Horizontal Dilution of Precision
    pub fn hdop(&self) -> f64 {
        let (lat, lon, _) = self.geodetic_rad();
        self.dop.hdop(lat, lon)
    }
    /// Vertical Dilution of Precision
    pub fn vdop(&self) -> f64 {
        let (lat, lon, _) = self.geodetic_rad();
        self.dop.vdop(lat, lon)
    }
    /// (position, bias) seed for the next epoch
    pub fn seed(&self) -> (Vector3<f64>, f64) {
        (self.position, self.bias_m)
    }
}
