use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

/// A rigid-body transform (rotation followed by translation) mapping one
/// coordinate set onto another.
#[derive(Debug, Clone, Copy)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    #[inline]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Computes the least-squares rigid transform that superposes `moving` onto
/// `fixed` (Kabsch algorithm via SVD of the cross-covariance matrix).
///
/// The determinant correction guards against reflections, so the result is a
/// proper rotation. Returns `None` when the point sets are empty, of unequal
/// length, or when the SVD fails to produce the factor matrices.
pub fn kabsch_fit(fixed: &[Point3<f64>], moving: &[Point3<f64>]) -> Option<RigidTransform> {
    if fixed.len() != moving.len() || fixed.is_empty() {
        return None;
    }

    let fixed_centroid = centroid(fixed)?;
    let moving_centroid = centroid(moving)?;

    let mut covariance = Matrix3::zeros();
    for (f, m) in fixed.iter().zip(moving.iter()) {
        let fv = f - fixed_centroid;
        let mv = m - moving_centroid;
        covariance += fv * mv.transpose();
    }

    let svd = covariance.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let mut correction = Matrix3::identity();
    if (u.determinant() * v_t.determinant()) < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation_matrix = u * correction * v_t;
    let rotation = Rotation3::from_matrix_unchecked(rotation_matrix);
    let translation = fixed_centroid.coords - rotation * moving_centroid.coords;

    Some(RigidTransform {
        rotation,
        translation,
    })
}

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}
