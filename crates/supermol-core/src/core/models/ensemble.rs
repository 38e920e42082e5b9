use super::ids::AtomId;
use super::system::MolecularSystem;
use nalgebra::Point3;
use slotmap::SecondaryMap;

/// One model of an ensemble: a coordinate set layered over the shared
/// topology, plus a per-atom deviation slot.
///
/// The deviation slot mirrors the B-factor column of a structural file. After
/// a one-vs-all superposition it holds each atom's positional deviation from
/// the reference model, so it is a computation scratch value, not ground-truth
/// experimental data. It is written to the B-factor column when the model is
/// saved.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Model index within the ensemble; insertion order is the stable
    /// identifier reported to callers.
    pub model_id: usize,
    coords: SecondaryMap<AtomId, Point3<f64>>,
    deviations: SecondaryMap<AtomId, f64>,
}

impl Structure {
    pub fn new(model_id: usize) -> Self {
        Self {
            model_id,
            coords: SecondaryMap::new(),
            deviations: SecondaryMap::new(),
        }
    }

    pub fn position(&self, id: AtomId) -> Option<&Point3<f64>> {
        self.coords.get(id)
    }

    pub fn set_position(&mut self, id: AtomId, position: Point3<f64>) {
        self.coords.insert(id, position);
    }

    pub fn deviation(&self, id: AtomId) -> Option<f64> {
        self.deviations.get(id).copied()
    }

    pub fn set_deviation(&mut self, id: AtomId, deviation: f64) {
        self.deviations.insert(id, deviation);
    }

    /// Clears every stored deviation value. Deviations are rebuilt from
    /// scratch by each superposition pass, never accumulated.
    pub fn clear_deviations(&mut self) {
        self.deviations.clear();
    }
}

/// An ordered set of alternative models of one molecule sharing a single
/// topology.
///
/// Invariant: every [`Structure`] stores a coordinate for exactly the atoms
/// of the shared [`MolecularSystem`]; the loader rejects files that disagree
/// on topology.
#[derive(Debug, Clone)]
pub struct Ensemble {
    system: MolecularSystem,
    structures: Vec<Structure>,
}

impl Ensemble {
    pub fn new(system: MolecularSystem, structures: Vec<Structure>) -> Self {
        Self { system, structures }
    }

    pub fn system(&self) -> &MolecularSystem {
        &self.system
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn structure(&self, index: usize) -> Option<&Structure> {
        self.structures.get(index)
    }

    pub fn structure_mut(&mut self, index: usize) -> Option<&mut Structure> {
        self.structures.get_mut(index)
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;

    fn single_atom_ensemble() -> (Ensemble, AtomId) {
        let mut system = MolecularSystem::new();
        let chain = system.add_chain('A', ChainType::Protein);
        let residue = system.add_residue(chain, 1, "ALA").unwrap();
        let atom_id = system
            .add_atom_to_residue(residue, Atom::new("CA", residue, 1))
            .unwrap();

        let mut model = Structure::new(0);
        model.set_position(atom_id, Point3::new(1.0, 2.0, 3.0));
        (Ensemble::new(system, vec![model]), atom_id)
    }

    #[test]
    fn structure_stores_positions_and_deviations() {
        let (mut ensemble, atom_id) = single_atom_ensemble();
        let model = ensemble.structure_mut(0).unwrap();

        assert_eq!(model.position(atom_id), Some(&Point3::new(1.0, 2.0, 3.0)));
        assert_eq!(model.deviation(atom_id), None);

        model.set_deviation(atom_id, 0.5);
        assert_eq!(model.deviation(atom_id), Some(0.5));

        model.clear_deviations();
        assert_eq!(model.deviation(atom_id), None);
    }

    #[test]
    fn ensemble_indexing_is_ordered() {
        let (ensemble, _) = single_atom_ensemble();
        assert_eq!(ensemble.len(), 1);
        assert!(!ensemble.is_empty());
        assert_eq!(ensemble.structure(0).unwrap().model_id, 0);
        assert!(ensemble.structure(1).is_none());
    }
}
