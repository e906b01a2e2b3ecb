use super::buffer::{DeviceVector, single_ligand};
use super::change::StepVector;
use super::device::Device;
use super::error::EngineError;
use crate::core::models::conf::Conf;
use crate::core::utils::angle::{normalize_angle, normalized_angle};
use crate::core::utils::quaternion::{from_components, quaternion_increment, to_components};
use nalgebra::Vector3;
use std::fmt;
use tracing::{debug, instrument};

/// Number of leading rigid-body entries: position then scalar-first quaternion.
pub const RIGID_CONF_LEN: usize = 7;

/// Largest `f32` not exceeding π; `std::f32::consts::PI` itself rounds up past π.
const MAX_STORED_TORSION: f32 = f32::from_bits(0x4049_0FDA);

/// A pose as one flat device array of length `7 + T`.
///
/// Layout: `[0, 3)` position, `[3, 7)` unit quaternion `(w, x, y, z)`, `[7, len)` torsion
/// angles in the same canonical order as [`StepVector`]. Torsion `i` of this layout pairs with
/// element `i - 1` of a step.
#[derive(Debug)]
pub struct ConfVector<D: Device> {
    values: DeviceVector<D>,
}

impl<D: Device> ConfVector<D> {
    pub fn from_conf(device: &D, src: &Conf) -> Result<Self, EngineError> {
        let ligand = single_ligand(&src.ligands)?;
        let mut data = Vec::with_capacity(RIGID_CONF_LEN + src.size().num_torsions());

        data.extend(ligand.rigid.position.iter().map(|&v| v as f32));
        data.extend(
            to_components(&ligand.rigid.orientation)
                .iter()
                .map(|&v| v as f32),
        );
        data.extend(src.torsions().map(|v| v as f32));

        debug!(
            len = data.len(),
            ligand_torsions = ligand.torsions.len(),
            flex_residues = src.flex.len(),
            "Building configuration vector."
        );
        Ok(Self {
            values: DeviceVector::from_host(device, &data)?,
        })
    }

    /// Scatters the device values into `dst`, whose torsion containers must already be sized.
    ///
    /// Surplus device torsions are dropped once every host slot has been filled.
    pub fn set_cpu(&self, dst: &mut Conf) -> Result<(), EngineError> {
        if dst.ligands.len() != 1 {
            return Err(EngineError::LigandCount {
                found: dst.ligands.len(),
            });
        }
        let d = self.values.get_data()?;
        let n = d.len();
        let mut pos = 0;

        if n >= RIGID_CONF_LEN {
            let ligand = &mut dst.ligands[0];
            ligand.rigid.position =
                Vector3::new(f64::from(d[0]), f64::from(d[1]), f64::from(d[2]));
            ligand.rigid.orientation = from_components([
                f64::from(d[3]),
                f64::from(d[4]),
                f64::from(d[5]),
                f64::from(d[6]),
            ]);
            pos = RIGID_CONF_LEN;
            for torsion in ligand.torsions.iter_mut() {
                if pos >= n {
                    break;
                }
                *torsion = f64::from(d[pos]);
                pos += 1;
            }
        }

        for residue in dst.flex.iter_mut() {
            for torsion in residue.torsions.iter_mut() {
                if pos >= n {
                    break;
                }
                *torsion = f64::from(d[pos]);
                pos += 1;
            }
        }
        Ok(())
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
        self.len().saturating_sub(RIGID_CONF_LEN)
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

    /// Advances the pose by `factor * c`.
    ///
    /// Position is translated, orientation is composed with the rotation vector and
    /// renormalized, and every torsion is incremented and wrapped into [-π, π].
    #[instrument(skip_all, name = "conf_increment", fields(len = self.len(), factor = factor))]
    pub fn increment(&mut self, c: &StepVector<D>, factor: f64) -> Result<(), EngineError> {
        let n = self.len();
        if c.len() + 1 != n {
            return Err(EngineError::LengthMismatch {
                operation: "increment",
                expected: n.saturating_sub(1),
                found: c.len(),
            });
        }
        let change = c.get_data()?;
        let mut conf = self.values.get_data()?;

        for k in 0..3 {
            conf[k] = (f64::from(conf[k]) + f64::from(change[k]) * factor) as f32;
        }

        let mut orientation = from_components([
            f64::from(conf[3]),
            f64::from(conf[4]),
            f64::from(conf[5]),
            f64::from(conf[6]),
        ]);
        let rotation = Vector3::new(
            factor * f64::from(change[3]),
            factor * f64::from(change[4]),
            factor * f64::from(change[5]),
        );
        quaternion_increment(&mut orientation, &rotation);
        for (slot, component) in conf[3..RIGID_CONF_LEN]
            .iter_mut()
            .zip(to_components(&orientation))
        {
            *slot = component as f32;
        }

        for i in RIGID_CONF_LEN..n {
            let mut torsion =
                f64::from(conf[i]) + normalized_angle(factor * f64::from(change[i - 1]));
            normalize_angle(&mut torsion);
            conf[i] = (torsion as f32).clamp(-MAX_STORED_TORSION, MAX_STORED_TORSION);
        }

        self.values.set_data(&conf)
    }

    pub fn get_data(&self) -> Result<Vec<f32>, EngineError> {
        self.values.get_data()
    }

    pub fn set_data(&mut self, data: &[f32]) -> Result<(), EngineError> {
        self.values.set_data(data)
    }
}

impl<D: Device> fmt::Display for ConfVector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.values, f)
    }
}
