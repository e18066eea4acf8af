mod error;

use nalgebra::{Matrix4, MatrixXx4};
use serde::Serialize;

use crate::geodesy::{line_of_sight, Ecef};

pub use error::DopError;

const MIN_SATELLITES: usize = 4;

/// Dilution of precision factors for one receiver/constellation geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dop {
    pub gdop: f64,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
    pub tdop: f64,
}

/// Computes DOP from satellite and receiver ECEF positions.
///
/// Rows of the geometry matrix are `[ux, uy, uz, 1]`, the receiver-to-satellite
/// unit vectors, and the factors come from the diagonal of `(GᵗG)⁻¹`.
///
/// Singularity is decided by the inversion itself, not by a determinant
/// cutoff: tight clusters have a tiny determinant yet a usable (large) DOP.
/// Geometry is rejected only when `try_inverse` fails or the inverse has a
/// non-finite or negative diagonal.
pub fn compute_dop(satellites: &[Ecef], receiver: Ecef) -> Result<Dop, DopError> {
    if satellites.len() < MIN_SATELLITES {
        return Err(DopError::InsufficientSatellites {
            found: satellites.len(),
        });
    }

    let mut rows = Vec::with_capacity(satellites.len());
    for (index, satellite) in satellites.iter().enumerate() {
        let (unit, _) = line_of_sight(receiver, *satellite)
            .ok_or(DopError::CoincidentPosition { index })?;
        rows.push(unit);
    }

    let g = MatrixXx4::from_fn(rows.len(), |i, j| if j < 3 { rows[i][j] } else { 1.0 });
    let normal: Matrix4<f64> = g.tr_mul(&g);

    let q = normal.try_inverse().ok_or(DopError::SingularGeometry)?;

    let diagonal = q.diagonal();
    if diagonal.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(DopError::SingularGeometry);
    }

    Ok(Dop {
        gdop: q.trace().sqrt(),
        pdop: (q[(0, 0)] + q[(1, 1)] + q[(2, 2)]).sqrt(),
        hdop: (q[(0, 0)] + q[(1, 1)]).sqrt(),
        vdop: q[(2, 2)].sqrt(),
        tdop: q[(3, 3)].sqrt(),
    })
}
