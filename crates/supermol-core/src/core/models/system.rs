use super::atom::Atom;
use super::chain::{Chain, ChainType};
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use slotmap::SlotMap;
use std::collections::HashMap;

/// The topology shared by every model of an ensemble: chains, residues, and
/// atoms, with lookup maps for identifier-based access.
///
/// The system stores identity only; per-model coordinates live in
/// [`Structure`](super::ensemble::Structure) overlays. Chains, residues, and
/// atoms are append-only, so slot-map iteration order equals insertion
/// (file) order.
#[derive(Debug, Clone, Default)]
pub struct MolecularSystem {
    atoms: SlotMap<AtomId, Atom>,
    residues: SlotMap<ResidueId, Residue>,
    chains: SlotMap<ChainId, Chain>,
    /// Lookup map for finding residues by chain ID and residue number.
    residue_id_map: HashMap<(ChainId, isize), ResidueId>,
    /// Lookup map for finding chains by their single-character identifier.
    chain_id_map: HashMap<char, ChainId>,
}

impl MolecularSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.residues.iter()
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn chain_mut(&mut self, id: ChainId) -> Option<&mut Chain> {
        self.chains.get_mut(id)
    }

    pub fn chains_iter(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chains.iter()
    }

    pub fn find_chain_by_id(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    pub fn find_residue_by_id(
        &self,
        chain_id: ChainId,
        residue_number: isize,
    ) -> Option<ResidueId> {
        self.residue_id_map
            .get(&(chain_id, residue_number))
            .copied()
    }

    /// Adds a new chain to the system or returns the existing one.
    ///
    /// Idempotent: if a chain with the given identifier already exists, its
    /// ID is returned without creating a duplicate.
    pub fn add_chain(&mut self, id: char, chain_type: ChainType) -> ChainId {
        *self.chain_id_map.entry(id).or_insert_with(|| {
            let chain = Chain::new(id, chain_type);
            self.chains.insert(chain)
        })
    }

    /// Adds a new residue to the given chain or returns the existing one.
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        residue_number: isize,
        name: &str,
    ) -> Option<ResidueId> {
        let chain = self.chains.get_mut(chain_id)?;
        let key = (chain_id, residue_number);

        let residue_id = *self.residue_id_map.entry(key).or_insert_with(|| {
            let residue = Residue::new(residue_number, name, chain_id);
            self.residues.insert(residue)
        });

        if !chain.residues.contains(&residue_id) {
            chain.residues.push(residue_id);
        }
        Some(residue_id)
    }

    /// Adds an atom to an existing residue.
    ///
    /// Returns `None` if the residue does not exist.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;
        let atom_id = self.atoms.insert(atom);
        residue.add_atom(atom_id);
        Some(atom_id)
    }

    /// Returns every atom ID in file/topological order: chains in insertion
    /// order, residues in chain order, atoms in residue order.
    ///
    /// This is the canonical ordering used for per-pair coordinate gathering
    /// and for writing models back out.
    pub fn atoms_in_order(&self) -> Vec<AtomId> {
        let mut ordered = Vec::with_capacity(self.atoms.len());
        for (_, chain) in self.chains.iter() {
            for &residue_id in chain.residues() {
                if let Some(residue) = self.residues.get(residue_id) {
                    ordered.extend_from_slice(residue.atoms());
                }
            }
        }
        ordered
    }

    /// Returns every residue ID in file/topological order (chain, then
    /// residue position within the chain), paired with its chain identifier.
    pub fn residues_in_order(&self) -> Vec<(char, ResidueId)> {
        let mut ordered = Vec::with_capacity(self.residues.len());
        for (_, chain) in self.chains.iter() {
            for &residue_id in chain.residues() {
                ordered.push((chain.id, residue_id));
            }
        }
        ordered
    }

    /// Whether any chain in the system is a polymer (protein or nucleic
    /// acid). Non-polymeric ensembles skip core-region detection.
    pub fn has_polymer_chain(&self) -> bool {
        self.chains
            .iter()
            .any(|(_, chain)| chain.chain_type.is_polymer())
    }
}
