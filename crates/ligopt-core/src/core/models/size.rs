use super::change::{Change, LigandChange, ResidueChange, RigidChange};
use super::conf::{Conf, LigandConf, ResidueConf, RigidConf};

/// Torsion counts of every movable part of a model, in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfSize {
    pub ligands: Vec<usize>,
    pub flex: Vec<usize>,
}

impl ConfSize {
    pub fn new(ligands: Vec<usize>, flex: Vec<usize>) -> Self {
        Self { ligands, flex }
    }

    /// A model with exactly one ligand, the only shape the device vectors accept.
    pub fn single_ligand(ligand_torsions: usize, flex: Vec<usize>) -> Self {
        Self {
            ligands: vec![ligand_torsions],
            flex,
        }
    }

    pub fn num_torsions(&self) -> usize {
        self.ligands.iter().sum::<usize>() + self.flex.iter().sum::<usize>()
    }

    /// Length of a step or gradient over this model: 6 rigid-body terms per ligand plus torsions.
    pub fn num_degrees_of_freedom(&self) -> usize {
        6 * self.ligands.len() + self.num_torsions()
    }

    /// Origin position, identity orientation, all torsions zero.
    pub fn identity_conf(&self) -> Conf {
        Conf {
            ligands: self
                .ligands
                .iter()
                .map(|&n| LigandConf {
                    rigid: RigidConf::identity(),
                    torsions: vec![0.0; n],
                })
                .collect(),
            flex: self
                .flex
                .iter()
                .map(|&n| ResidueConf {
                    torsions: vec![0.0; n],
                })
                .collect(),
        }
    }

    pub fn zero_change(&self) -> Change {
        Change {
            ligands: self
                .ligands
                .iter()
                .map(|&n| LigandChange {
                    rigid: RigidChange::zero(),
                    torsions: vec![0.0; n],
                })
                .collect(),
            flex: self
                .flex
                .iter()
                .map(|&n| ResidueChange {
                    torsions: vec![0.0; n],
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_degrees_of_freedom_counts_rigid_body_and_all_torsions() {
        let size = ConfSize::single_ligand(3, vec![2, 1]);
        assert_eq!(size.num_torsions(), 6);
        assert_eq!(size.num_degrees_of_freedom(), 12);
    }

    #[test]
    fn identity_conf_has_requested_torsion_slots() {
        let size = ConfSize::single_ligand(2, vec![4]);
        let conf = size.identity_conf();
        assert_eq!(conf.ligands.len(), 1);
        assert_eq!(conf.ligands[0].torsions.len(), 2);
        assert_eq!(conf.flex[0].torsions.len(), 4);
        assert_eq!(conf.size(), size);
    }

    #[test]
    fn zero_change_round_trips_its_size() {
        let size = ConfSize::new(vec![1], vec![0, 3]);
        assert_eq!(size.zero_change().size(), size);
    }
}
