use super::size::ConfSize;
use nalgebra::Vector3;

/// Rigid-body part of a step or gradient. `orientation` is a rotation vector, not a quaternion.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidChange {
    pub position: Vector3<f64>,
    pub orientation: Vector3<f64>,
}

impl RigidChange {
    pub fn new(position: Vector3<f64>, orientation: Vector3<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn zero() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: Vector3::zeros(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LigandChange {
    pub rigid: RigidChange,
    pub torsions: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResidueChange {
    pub torsions: Vec<f64>,
}

/// A displacement (or gradient) over the same degrees of freedom as a [`Conf`](super::conf::Conf).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Change {
    pub ligands: Vec<LigandChange>,
    pub flex: Vec<ResidueChange>,
}

impl Change {
    pub fn new(ligands: Vec<LigandChange>, flex: Vec<ResidueChange>) -> Self {
        Self { ligands, flex }
    }

    pub fn size(&self) -> ConfSize {
        ConfSize {
            ligands: self.ligands.iter().map(|l| l.torsions.len()).collect(),
            flex: self.flex.iter().map(|r| r.torsions.len()).collect(),
        }
    }

    pub fn torsions(&self) -> impl Iterator<Item = f64> + '_ {
        self.ligands
            .iter()
            .flat_map(|l| l.torsions.iter())
            .chain(self.flex.iter().flat_map(|r| r.torsions.iter()))
            .copied()
    }
}
