use super::buffer::{DeviceVector, single_ligand};
use super::device::Device;
use super::error::EngineError;
use crate::core::matrix::SymmetricMatrix;
use crate::core::models::change::Change;
use std::fmt;
use tracing::debug;

/// Number of leading rigid-body entries: translation then rotation vector.
pub const RIGID_DOF: usize = 6;

/// A step or gradient as one flat device array of length `6 + T`.
///
/// Layout: `[0, 3)` translation, `[3, 6)` rotation vector, `[6, len)` torsion deltas in
/// canonical order (ligand torsions, then each flexible residue's torsions).
///
/// Dot products, subtraction and the matrix-vector product read the (short) vectors back to
/// the host and compute there; only negation runs as a device kernel.
#[derive(Debug)]
pub struct StepVector<D: Device> {
    values: DeviceVector<D>,
}

impl<D: Device> StepVector<D> {
    pub fn from_change(device: &D, src: &Change) -> Result<Self, EngineError> {
        let ligand = single_ligand(&src.ligands)?;
        let mut data = Vec::with_capacity(src.size().num_degrees_of_freedom());

        data.extend(ligand.rigid.position.iter().map(|&v| v as f32));
        data.extend(ligand.rigid.orientation.iter().map(|&v| v as f32));
        data.extend(src.torsions().map(|v| v as f32));

        debug!(
            len = data.len(),
            ligand_torsions = ligand.torsions.len(),
            flex_residues = src.flex.len(),
            "Building step vector."
        );
        Ok(Self {
            values: DeviceVector::from_host(device, &data)?,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn num_torsions(&self) -> usize {
        self.len().saturating_sub(RIGID_DOF)
    }

    pub fn device(&self) -> &D {
        self.values.device()
    }

    pub fn try_clone(&self) -> Result<Self, EngineError> {
        Ok(Self {
            values: self.values.try_clone()?,
        })
    }

    pub fn assign_from(&mut self, src: &Self) -> Result<&mut Self, EngineError> {
        self.values.assign_from(&src.values)?;
        Ok(self)
    }

    /// Zeroes every element.
    pub fn clear(&mut self) -> Result<(), EngineError> {
        self.values.clear()
    }

    /// Negates every element in place.
    pub fn invert(&mut self) -> Result<(), EngineError> {
        self.values.scale(-1.0)
    }

    pub fn dot(&self, rhs: &Self) -> Result<f64, EngineError> {
        self.check_same_len("dot", rhs.len())?;
        let a = self.values.get_data()?;
        let b = rhs.values.get_data()?;
        Ok(a.iter()
            .zip(&b)
            .map(|(&x, &y)| f64::from(x) * f64::from(y))
            .sum())
    }

    /// `self -= rhs`.
    pub fn sub(&mut self, rhs: &Self) -> Result<(), EngineError> {
        self.check_same_len("sub", rhs.len())?;
        let mut a = self.values.get_data()?;
        let b = rhs.values.get_data()?;
        for (x, y) in a.iter_mut().zip(&b) {
            *x -= y;
        }
        self.values.set_data(&a)
    }

    /// Writes `-M * self` into `out`.
    pub fn minus_mat_vec_product<M: SymmetricMatrix>(
        &self,
        m: &M,
        out: &mut Self,
    ) -> Result<(), EngineError> {
        let n = self.len();
        if m.dim() != n {
            return Err(EngineError::MatrixDimension {
                expected: n,
                found: m.dim(),
            });
        }
        self.check_same_len("minus_mat_vec_product", out.len())?;

        let a = self.values.get_data()?;
        let b: Vec<f32> = (0..n)
            .map(|i| {
                let sum: f64 = (0..n).map(|j| m.get(i, j) * f64::from(a[j])).sum();
                -sum as f32
            })
            .collect();
        out.values.set_data(&b)
    }

    pub fn get_data(&self) -> Result<Vec<f32>, EngineError> {
        self.values.get_data()
    }

    pub fn set_data(&mut self, data: &[f32]) -> Result<(), EngineError> {
        self.values.set_data(data)
    }

    fn check_same_len(&self, operation: &'static str, found: usize) -> Result<(), EngineError> {
        if found != self.len() {
            return Err(EngineError::LengthMismatch {
                operation,
                expected: self.len(),
                found,
            });
        }
        Ok(())
    }
}

impl<D: Device> fmt::Display for StepVector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.values, f)
    }
}
