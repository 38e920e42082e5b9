use super::align::{all_pairs, PairwiseResult};
use super::error::EngineError;
use super::selection::ActiveMask;
use crate::core::models::ensemble::Ensemble;
use tracing::info;

/// The outcome of representative-model selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepresentativeSummary {
    /// Index of the model closest on average to every other model.
    pub index: usize,
    /// Mean pairwise RMSD of the chosen model against the rest.
    pub avg_rmsd: f64,
    /// Mean RMSD over every unordered model pair in the ensemble.
    pub ensemble_avg_rmsd: f64,
}

/// Picks the model with the lowest mean pairwise RMSD against all other
/// models. Ties resolve to the lowest model index. A single-model ensemble
/// is its own representative with zero RMSD.
pub fn select_representative(
    ensemble: &Ensemble,
    mask: &ActiveMask,
) -> Result<RepresentativeSummary, EngineError> {
    match ensemble.len() {
        0 => Err(EngineError::EmptyEnsemble),
        1 => Ok(RepresentativeSummary {
            index: 0,
            avg_rmsd: 0.0,
            ensemble_avg_rmsd: 0.0,
        }),
        n => {
            let pairs = all_pairs(ensemble, mask)?;
            Ok(summarize(&pairs, n))
        }
    }
}

fn summarize(pairs: &[PairwiseResult], n: usize) -> RepresentativeSummary {
    let mut totals = vec![0.0; n];
    let mut grand_total = 0.0;
    for pair in pairs {
        totals[pair.fixed] += pair.rmsd;
        totals[pair.moving] += pair.rmsd;
        grand_total += pair.rmsd;
    }

    let mut index = 0;
    let mut best = f64::INFINITY;
    for (model, total) in totals.iter().enumerate() {
        let avg = total / (n - 1) as f64;
        if avg < best {
            best = avg;
            index = model;
        }
    }

    let summary = RepresentativeSummary {
        index,
        avg_rmsd: best,
        ensemble_avg_rmsd: grand_total / pairs.len() as f64,
    };
    info!(
        model = summary.index,
        avg_rmsd = summary.avg_rmsd,
        ensemble_avg_rmsd = summary.ensemble_avg_rmsd,
        "selected representative model"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use crate::core::models::ensemble::Structure;
    use crate::core::models::system::MolecularSystem;
    use crate::engine::selection::{build_active_mask, AtomSpec, BaseAtomSet, ResidueSpec};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    /// Builds an ensemble where each model displaces every atom of a base
    /// chain by the given offset.
    fn offset_ensemble(offsets: &[Vector3<f64>]) -> Ensemble {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Protein);
        let mut serial = 1;
        let mut base = Vec::new();
        for residue_number in 1..=4 {
            let residue = system.add_residue(chain, residue_number, "GLY").unwrap();
            for (name, position) in [
                ("N", Point3::new(0.0, 0.0, 0.0)),
                ("CA", Point3::new(1.5, 0.3, 0.0)),
                ("C", Point3::new(2.4, 1.2, 0.9)),
            ] {
                let atom_id = system
                    .add_atom_to_residue(residue, Atom::new(name, residue, serial))
                    .unwrap();
                base.push((
                    atom_id,
                    position + Vector3::new(3.8 * residue_number as f64, 0.0, 0.0),
                ));
                serial += 1;
            }
        }

        let structures = offsets
            .iter()
            .enumerate()
            .map(|(model_id, offset)| {
                let mut structure = Structure::new(model_id);
                for (atom_id, position) in &base {
                    structure.set_position(*atom_id, position + offset);
                }
                structure
            })
            .collect();
        Ensemble::new(system, structures)
    }

    /// Same topology, but one model gets a single atom perturbed so it is an
    /// outlier to every other model.
    fn perturb_atom(ensemble: &mut Ensemble, model: usize, shift: f64) {
        let atom_id = ensemble.system().atoms_in_order()[0];
        let structure = ensemble.structure_mut(model).unwrap();
        let position = *structure.position(atom_id).unwrap();
        structure.set_position(atom_id, position + Vector3::new(0.0, shift, 0.0));
    }

    fn full_mask(ensemble: &Ensemble) -> ActiveMask {
        build_active_mask(
            ensemble.system(),
            &ResidueSpec::All.resolve(ensemble.system()),
            &ResidueSpec::empty().resolve(ensemble.system()),
            &AtomSpec::any(),
            &AtomSpec::default(),
            BaseAtomSet::Backbone,
        )
    }

    #[test]
    fn empty_ensemble_is_rejected() {
        let ensemble = offset_ensemble(&[]);
        let mask = full_mask(&ensemble);
        assert_eq!(
            select_representative(&ensemble, &mask),
            Err(EngineError::EmptyEnsemble)
        );
    }

    #[test]
    fn single_model_is_its_own_representative() {
        let ensemble = offset_ensemble(&[Vector3::zeros()]);
        let mask = full_mask(&ensemble);
        let summary = select_representative(&ensemble, &mask).unwrap();
        assert_eq!(summary.index, 0);
        assert_relative_eq!(summary.avg_rmsd, 0.0);
        assert_relative_eq!(summary.ensemble_avg_rmsd, 0.0);
    }

    #[test]
    fn outlier_model_is_never_the_representative() {
        // Pure translations superpose exactly, so without perturbation every
        // model ties; shifting one atom of model 2 makes it the outlier and
        // raises every other model's average equally.
        let mut ensemble = offset_ensemble(&[
            Vector3::zeros(),
            Vector3::new(4.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 9.0),
            Vector3::new(-2.0, 5.0, 1.0),
        ]);
        perturb_atom(&mut ensemble, 2, 8.0);

        let mask = full_mask(&ensemble);
        let summary = select_representative(&ensemble, &mask).unwrap();
        assert_ne!(summary.index, 2);
        assert!(summary.avg_rmsd < summary.ensemble_avg_rmsd);
    }

    #[test]
    fn ties_resolve_to_the_lowest_model_index() {
        // Four rigidly-translated copies: every pairwise RMSD is zero, so
        // every model ties and the first must win.
        let ensemble = offset_ensemble(&[
            Vector3::zeros(),
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(-4.0, 0.0, 0.5),
            Vector3::new(0.0, 7.0, 0.0),
        ]);
        let mask = full_mask(&ensemble);
        let summary = select_representative(&ensemble, &mask).unwrap();
        assert_eq!(summary.index, 0);
        assert_relative_eq!(summary.avg_rmsd, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn averages_match_hand_computed_pair_table() {
        let pairs = vec![
            PairwiseResult { fixed: 0, moving: 1, rmsd: 1.0 },
            PairwiseResult { fixed: 0, moving: 2, rmsd: 3.0 },
            PairwiseResult { fixed: 1, moving: 2, rmsd: 2.0 },
        ];
        let summary = summarize(&pairs, 3);
        // Model averages: 0 -> 2.0, 1 -> 1.5, 2 -> 2.5.
        assert_eq!(summary.index, 1);
        assert_relative_eq!(summary.avg_rmsd, 1.5);
        assert_relative_eq!(summary.ensemble_avg_rmsd, 2.0);
    }
}
