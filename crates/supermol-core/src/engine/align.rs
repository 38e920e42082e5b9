use super::error::EngineError;
use super::selection::ActiveMask;
use crate::core::models::ensemble::{Ensemble, Structure};
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::geometry::{calculate_rmsd, kabsch_fit, RigidTransform};
use itertools::Itertools;
use nalgebra::Point3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

/// The RMSD between one ordered pair of models after an optimal rigid fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairwiseResult {
    pub fixed: usize,
    pub moving: usize,
    pub rmsd: f64,
}

/// Collects the active atoms in file order. Every alignment in a pass gathers
/// coordinates through the same ordered list, so paired coordinate vectors
/// always correspond atom-for-atom.
pub fn active_atoms(system: &MolecularSystem, mask: &ActiveMask) -> Vec<AtomId> {
    system
        .atoms_in_order()
        .into_iter()
        .filter(|&id| mask.is_active(id))
        .collect()
}

fn gather(structure: &Structure, atoms: &[AtomId]) -> Vec<Point3<f64>> {
    atoms
        .iter()
        .filter_map(|&id| structure.position(id).copied())
        .collect()
}

/// Fits `moving` onto `fixed` over the given atoms and returns the post-fit
/// RMSD. Neither structure is modified.
pub fn superpose_rmsd(
    fixed: &Structure,
    moving: &Structure,
    atoms: &[AtomId],
) -> Result<f64, EngineError> {
    let fixed_coords = gather(fixed, atoms);
    let moving_coords = gather(moving, atoms);

    let fit = kabsch_fit(&fixed_coords, &moving_coords).ok_or_else(|| {
        EngineError::Alignment(format!(
            "cannot fit models {} and {}: degenerate atom set ({} atoms)",
            fixed.model_id,
            moving.model_id,
            atoms.len()
        ))
    })?;

    let mapped: Vec<_> = moving_coords.iter().map(|p| fit.apply(p)).collect();
    calculate_rmsd(&fixed_coords, &mapped).ok_or_else(|| {
        EngineError::Alignment(format!(
            "cannot score models {} and {}: empty coordinate set",
            fixed.model_id, moving.model_id
        ))
    })
}

/// Superposes every unordered model pair and returns one result per pair
/// (`fixed < moving`). Pairs are independent, so scoring runs in parallel
/// when the `parallel` feature is enabled.
pub fn all_pairs(ensemble: &Ensemble, mask: &ActiveMask) -> Result<Vec<PairwiseResult>, EngineError> {
    let atoms = active_atoms(ensemble.system(), mask);
    if atoms.is_empty() {
        return Err(EngineError::Alignment(
            "no active atoms to superpose".to_string(),
        ));
    }
    debug!(
        models = ensemble.len(),
        atoms = atoms.len(),
        "scoring all model pairs"
    );

    let pairs: Vec<(usize, usize)> = (0..ensemble.len()).tuple_combinations().collect();

    #[cfg(feature = "parallel")]
    let iterator = pairs.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iterator = pairs.iter();

    iterator
        .map(|&(fixed, moving)| {
            let rmsd = superpose_rmsd(
                &ensemble.structures()[fixed],
                &ensemble.structures()[moving],
                &atoms,
            )?;
            Ok(PairwiseResult {
                fixed,
                moving,
                rmsd,
            })
        })
        .collect()
}

/// Superposes every other model onto the model at `fixed_index`, rewriting
/// the moving models' coordinates in place.
///
/// Each moving model's deviation slots are cleared and then filled for the
/// active atoms with the post-fit distance to the reference position. The
/// fits are computed in parallel; coordinates are rewritten serially.
pub fn superpose_onto(
    ensemble: &mut Ensemble,
    fixed_index: usize,
    mask: &ActiveMask,
) -> Result<Vec<PairwiseResult>, EngineError> {
    if fixed_index >= ensemble.len() {
        return Err(EngineError::Internal(format!(
            "reference model index {} out of range for {} models",
            fixed_index,
            ensemble.len()
        )));
    }

    let atoms = active_atoms(ensemble.system(), mask);
    if atoms.is_empty() {
        return Err(EngineError::Alignment(
            "no active atoms to superpose".to_string(),
        ));
    }

    let fixed_coords = gather(&ensemble.structures()[fixed_index], &atoms);
    let targets: Vec<usize> = (0..ensemble.len()).filter(|&i| i != fixed_index).collect();

    #[cfg(feature = "parallel")]
    let iterator = targets.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iterator = targets.iter();

    let fits: Vec<(usize, RigidTransform)> = iterator
        .map(|&index| {
            let moving_coords = gather(&ensemble.structures()[index], &atoms);
            let fit = kabsch_fit(&fixed_coords, &moving_coords).ok_or_else(|| {
                EngineError::Alignment(format!(
                    "cannot fit model {} onto model {}: degenerate atom set",
                    index, fixed_index
                ))
            })?;
            Ok((index, fit))
        })
        .collect::<Result<_, EngineError>>()?;

    let all_atoms = ensemble.system().atoms_in_order();
    if let Some(reference) = ensemble.structure_mut(fixed_index) {
        reference.clear_deviations();
    }

    let mut results = Vec::with_capacity(fits.len());
    for (index, fit) in fits {
        let Some(structure) = ensemble.structure_mut(index) else {
            continue;
        };
        for &atom_id in &all_atoms {
            if let Some(position) = structure.position(atom_id).copied() {
                structure.set_position(atom_id, fit.apply(&position));
            }
        }

        structure.clear_deviations();
        let mut squared_sum = 0.0;
        for (&atom_id, fixed_position) in atoms.iter().zip(&fixed_coords) {
            if let Some(position) = structure.position(atom_id) {
                let deviation = (position - fixed_position).norm();
                structure.set_deviation(atom_id, deviation);
                squared_sum += deviation * deviation;
            }
        }
        results.push(PairwiseResult {
            fixed: fixed_index,
            moving: index,
            rmsd: (squared_sum / atoms.len() as f64).sqrt(),
        });
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;
    use crate::engine::selection::{build_active_mask, AtomSpec, BaseAtomSet, ResidueSpec};
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3};

    fn backbone_template() -> Vec<(&'static str, Point3<f64>)> {
        vec![
            ("N", Point3::new(0.0, 0.0, 0.0)),
            ("CA", Point3::new(1.46, 0.0, 0.0)),
            ("C", Point3::new(2.0, 1.4, 0.2)),
            ("O", Point3::new(1.7, 2.3, 1.0)),
        ]
    }

    fn build_ensemble(transforms: &[RigidTransform]) -> Ensemble {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Protein);
        let mut serial = 1;
        let mut template = Vec::new();
        for residue_number in 1..=3 {
            let residue = system.add_residue(chain, residue_number, "ALA").unwrap();
            for (name, base) in backbone_template() {
                let offset = Vector3::new(3.8 * residue_number as f64, 0.0, 0.0);
                let atom_id = system
                    .add_atom_to_residue(residue, Atom::new(name, residue, serial))
                    .unwrap();
                template.push((atom_id, base + offset));
                serial += 1;
            }
        }

        let structures = transforms
            .iter()
            .enumerate()
            .map(|(model_id, transform)| {
                let mut structure = Structure::new(model_id);
                for (atom_id, position) in &template {
                    structure.set_position(*atom_id, transform.apply(position));
                }
                structure
            })
            .collect();
        Ensemble::new(system, structures)
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

    fn rotated(roll: f64, pitch: f64, yaw: f64, shift: Vector3<f64>) -> RigidTransform {
        RigidTransform {
            rotation: Rotation3::from_euler_angles(roll, pitch, yaw),
            translation: shift,
        }
    }

    #[test]
    fn rigidly_moved_copies_score_zero_rmsd() {
        let ensemble = build_ensemble(&[
            RigidTransform::identity(),
            rotated(0.4, -1.1, 0.7, Vector3::new(5.0, -3.0, 2.0)),
        ]);
        let results = all_pairs(&ensemble, &full_mask(&ensemble)).unwrap();
        assert_eq!(results.len(), 1);
        assert_relative_eq!(results[0].rmsd, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn all_pairs_yields_one_result_per_unordered_pair() {
        let ensemble = build_ensemble(&[
            RigidTransform::identity(),
            RigidTransform::identity(),
            RigidTransform::identity(),
            RigidTransform::identity(),
        ]);
        let results = all_pairs(&ensemble, &full_mask(&ensemble)).unwrap();
        assert_eq!(results.len(), 6);
        for result in &results {
            assert!(result.fixed < result.moving);
        }
    }

    #[test]
    fn superpose_onto_moves_coordinates_and_writes_deviations() {
        let mut ensemble = build_ensemble(&[
            RigidTransform::identity(),
            rotated(1.0, 0.2, -0.5, Vector3::new(10.0, 0.0, -4.0)),
        ]);
        let mask = full_mask(&ensemble);
        let results = superpose_onto(&mut ensemble, 0, &mask).unwrap();

        assert_eq!(results.len(), 1);
        assert_relative_eq!(results[0].rmsd, 0.0, epsilon = 1e-9);

        let atoms = active_atoms(ensemble.system(), &mask);
        let reference = ensemble.structure(0).unwrap();
        let moved = ensemble.structure(1).unwrap();
        for &atom_id in &atoms {
            let a = reference.position(atom_id).unwrap();
            let b = moved.position(atom_id).unwrap();
            assert_relative_eq!((a - b).norm(), 0.0, epsilon = 1e-9);
            assert_relative_eq!(moved.deviation(atom_id).unwrap(), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn superpose_onto_rejects_out_of_range_reference() {
        let mut ensemble = build_ensemble(&[RigidTransform::identity()]);
        let mask = full_mask(&ensemble);
        assert!(matches!(
            superpose_onto(&mut ensemble, 5, &mask),
            Err(EngineError::Internal(_))
        ));
    }

    #[test]
    fn empty_mask_is_an_alignment_error() {
        let ensemble = build_ensemble(&[RigidTransform::identity(), RigidTransform::identity()]);
        let empty = build_active_mask(
            ensemble.system(),
            &ResidueSpec::empty().resolve(ensemble.system()),
            &ResidueSpec::empty().resolve(ensemble.system()),
            &AtomSpec::any(),
            &AtomSpec::default(),
            BaseAtomSet::Backbone,
        );
        assert!(matches!(
            all_pairs(&ensemble, &empty),
            Err(EngineError::Alignment(_))
        ));
    }
}
