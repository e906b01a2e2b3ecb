use super::size::ConfSize;
use nalgebra::{UnitQuaternion, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct RigidConf {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl RigidConf {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LigandConf {
    pub rigid: RigidConf,
    pub torsions: Vec<f64>, // Torsion angles in radians, torsion-tree order
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResidueConf {
    pub torsions: Vec<f64>,
}

/// Absolute pose of a ligand together with the side-chain torsions of flexible residues.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conf {
    pub ligands: Vec<LigandConf>,
    pub flex: Vec<ResidueConf>,
}

impl Conf {
    pub fn new(ligands: Vec<LigandConf>, flex: Vec<ResidueConf>) -> Self {
        Self { ligands, flex }
    }

    pub fn size(&self) -> ConfSize {
        ConfSize {
            ligands: self.ligands.iter().map(|l| l.torsions.len()).collect(),
            flex: self.flex.iter().map(|r| r.torsions.len()).collect(),
        }
    }

    /// All torsions in canonical order: ligand torsions first, then each residue in turn.
    pub fn torsions(&self) -> impl Iterator<Item = f64> + '_ {
        self.ligands
            .iter()
            .flat_map(|l| l.torsions.iter())
            .chain(self.flex.iter().flat_map(|r| r.torsions.iter()))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torsions_iterates_ligand_before_flexible_residues() {
        let conf = Conf::new(
            vec![LigandConf {
                rigid: RigidConf::identity(),
                torsions: vec![0.1, 0.2],
            }],
            vec![
                ResidueConf {
                    torsions: vec![0.3],
                },
                ResidueConf {
                    torsions: vec![0.4, 0.5],
                },
            ],
        );
        let all: Vec<f64> = conf.torsions().collect();
        assert_eq!(all, vec![0.1, 0.2, 0.3, 0.4, 0.5]);
    }

    #[test]
    fn default_conf_has_no_ligands() {
        let conf = Conf::default();
        assert!(conf.ligands.is_empty());
        assert_eq!(conf.size().num_torsions(), 0);
    }
}
