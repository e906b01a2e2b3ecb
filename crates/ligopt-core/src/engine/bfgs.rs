use super::change::StepVector;
use super::device::Device;
use super::error::EngineError;
use crate::core::matrix::SymmetricMatrix;
use tracing::{debug, instrument, trace};

/// Smallest accepted `alpha * y·p`; below it the pair carries no usable curvature.
pub const EPSILON_FL: f64 = f64::EPSILON;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOutcome {
    Applied,
    /// The matrix was left unchanged because `alpha * y·p` fell below [`EPSILON_FL`].
    CurvatureRejected { curvature: f64 },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied)
    }
}

/// Folds the step `p` (taken with line-search scale `alpha`) and gradient difference `y`
/// into the approximate inverse Hessian `h`.
///
/// With `s = alpha * p` and `r = 1 / (s·y)`, every upper-triangle cell receives
/// `-r (Hy s^T + s y^T H) + (r² y^T H y + r) s s^T`. Symmetry is preserved because only the
/// upper triangle is ever written.
#[instrument(skip_all, name = "bfgs_update", fields(n = p.len(), alpha = alpha))]
pub fn bfgs_update<D, M>(
    h: &mut M,
    p: &StepVector<D>,
    y: &StepVector<D>,
    alpha: f64,
) -> Result<UpdateOutcome, EngineError>
where
    D: Device,
    M: SymmetricMatrix,
{
    let n = p.len();
    if y.len() != n {
        return Err(EngineError::LengthMismatch {
            operation: "bfgs_update",
            expected: n,
            found: y.len(),
        });
    }
    if h.dim() != n {
        return Err(EngineError::MatrixDimension {
            expected: n,
            found: h.dim(),
        });
    }

    let yp = y.dot(p)?;
    let curvature = alpha * yp;
    if curvature < EPSILON_FL {
        debug!(curvature, "Curvature condition violated; skipping update.");
        return Ok(UpdateOutcome::CurvatureRejected { curvature });
    }

    let mut minus_hy = y.try_clone()?;
    y.minus_mat_vec_product(h, &mut minus_hy)?;

    let yhy = -y.dot(&minus_hy)?;
    let r = 1.0 / curvature;
    trace!(yp, yhy, r, "Applying rank-2 update.");

    let pvec: Vec<f64> = p.get_data()?.into_iter().map(f64::from).collect();
    let minus_hyvec: Vec<f64> = minus_hy.get_data()?.into_iter().map(f64::from).collect();

    let cross = alpha * r;
    let outer = alpha * alpha * (r * r * yhy + r);
    for i in 0..n {
        for j in i..n {
            *h.upper_mut(i, j) += cross * (minus_hyvec[i] * pvec[j] + minus_hyvec[j] * pvec[i])
                + outer * pvec[i] * pvec[j];
        }
    }
    Ok(UpdateOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matrix::TriangularMatrix;
    use crate::core::models::size::ConfSize;
    use crate::engine::device::HostDevice;

    fn step_from(device: &HostDevice, values: &[f32]) -> StepVector<HostDevice> {
        let size = ConfSize::single_ligand(values.len() - 6, vec![]);
        let mut step = StepVector::from_change(device, &size.zero_change()).unwrap();
        step.set_data(values).unwrap();
        step
    }

    fn mat_vec(h: &TriangularMatrix, v: &[f32]) -> Vec<f64> {
        (0..h.dim())
            .map(|i| (0..h.dim()).map(|j| h.get(i, j) * f64::from(v[j])).sum())
            .collect()
    }

    #[test]
    fn zero_curvature_is_rejected_and_matrix_untouched() {
        let device = HostDevice::new();
        let p = step_from(&device, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let y = step_from(&device, &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mut h = TriangularMatrix::identity(7);
        let before = h.clone();

        let outcome = bfgs_update(&mut h, &p, &y, 1.0).unwrap();

        assert_eq!(outcome, UpdateOutcome::CurvatureRejected { curvature: 0.0 });
        assert!(!outcome.is_applied());
        assert_eq!(h, before);
    }

    #[test]
    fn negative_curvature_is_rejected() {
        let device = HostDevice::new();
        let p = step_from(&device, &[1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let y = step_from(&device, &[-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let mut h = TriangularMatrix::identity(7);

        let outcome = bfgs_update(&mut h, &p, &y, 0.5).unwrap();
        assert!(matches!(outcome, UpdateOutcome::CurvatureRejected { .. }));
        assert_eq!(h, TriangularMatrix::identity(7));
    }

    #[test]
    fn accepted_update_satisfies_secant_condition() {
        let device = HostDevice::new();
        let pv = [0.5, -0.25, 1.0, 0.1, 0.2, -0.3, 0.75, -1.5];
        let yv = [1.0, 0.5, 0.75, -0.2, 0.4, 0.1, 0.5, -1.0];
        let p = step_from(&device, &pv);
        let y = step_from(&device, &yv);
        let alpha = 0.8;
        let mut h = TriangularMatrix::identity(8);

        let outcome = bfgs_update(&mut h, &p, &y, alpha).unwrap();
        assert!(outcome.is_applied());

        let hy = mat_vec(&h, &yv);
        for (hy_i, p_i) in hy.iter().zip(pv) {
            assert!((hy_i - alpha * f64::from(p_i)).abs() < 1e-5);
        }
    }

    #[test]
    fn repeated_updates_keep_matrix_symmetric() {
        let device = HostDevice::new();
        let mut h = TriangularMatrix::identity(7);
        let pairs = [
            ([1.0, 0.5, -0.5, 0.2, 0.0, 0.1, 0.3], [0.8, 0.4, -0.2, 0.1, 0.1, 0.0, 0.5]),
            ([0.1, -1.0, 0.3, 0.0, 0.6, -0.2, 0.2], [0.3, -0.9, 0.1, 0.2, 0.4, -0.1, 0.0]),
            ([0.0, 0.2, 1.2, -0.4, 0.1, 0.5, -0.7], [0.1, 0.1, 0.9, -0.5, 0.0, 0.6, -0.3]),
        ];

        for (pv, yv) in pairs {
            let p = step_from(&device, &pv);
            let y = step_from(&device, &yv);
            assert!(bfgs_update(&mut h, &p, &y, 1.0).unwrap().is_applied());
        }

        for i in 0..7 {
            for j in 0..7 {
                assert_eq!(h.get(i, j), h.get(j, i));
            }
        }
    }

    #[test]
    fn update_matches_dense_reference_formula() {
        let device = HostDevice::new();
        let pv = [0.3f32, 0.1, -0.2, 0.4, 0.0, 0.25, -0.6];
        let yv = [0.5f32, 0.2, -0.1, 0.3, 0.1, 0.2, -0.4];
        let alpha = 1.5;
        let p = step_from(&device, &pv);
        let y = step_from(&device, &yv);
        let mut h = TriangularMatrix::new(7, 0.0);
        h.set_diagonal(2.0);

        bfgs_update(&mut h, &p, &y, alpha).unwrap();

        // H0 = 2I, so Hy = 2y and y^T H y = 2 |y|^2.
        let s: Vec<f64> = pv.iter().map(|&v| alpha * f64::from(v)).collect();
        let yd: Vec<f64> = yv.iter().map(|&v| f64::from(v)).collect();
        let sy: f64 = s.iter().zip(&yd).map(|(a, b)| a * b).sum();
        let yhy: f64 = 2.0 * yd.iter().map(|v| v * v).sum::<f64>();
        for i in 0..7 {
            for j in 0..7 {
                let h0 = if i == j { 2.0 } else { 0.0 };
                let expected = h0 - (2.0 * yd[i] * s[j] + s[i] * 2.0 * yd[j]) / sy
                    + (sy + yhy) * s[i] * s[j] / (sy * sy);
                assert!((h.get(i, j) - expected).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn mismatched_dimensions_are_errors() {
        let device = HostDevice::new();
        let p = step_from(&device, &[1.0; 7]);
        let y = step_from(&device, &[1.0; 8]);
        let mut h = TriangularMatrix::identity(7);
        assert!(matches!(
            bfgs_update(&mut h, &p, &y, 1.0),
            Err(EngineError::LengthMismatch { .. })
        ));

        let mut wrong = TriangularMatrix::identity(6);
        assert!(matches!(
            bfgs_update(&mut wrong, &p, &p, 1.0),
            Err(EngineError::MatrixDimension {
                expected: 7,
                found: 6
            })
        ));
    }
}
