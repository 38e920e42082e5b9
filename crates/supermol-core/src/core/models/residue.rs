use super::ids::{AtomId, ChainId};

/// A residue within the shared topology, identified by its chain and its
/// sequence number from the source file. It owns its atoms in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    /// Residue sequence number from the source file.
    pub id: isize,
    /// Name of the residue (e.g., "ALA", "GUA").
    pub name: String,
    /// ID of the parent chain.
    pub chain_id: ChainId,
    /// IDs of atoms belonging to this residue, in insertion (file) order.
    pub(crate) atoms: Vec<AtomId>,
}

impl Residue {
    pub(crate) fn new(id: isize, name: &str, chain_id: ChainId) -> Self {
        Self {
            id,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_id: AtomId) {
        self.atoms.push(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }
}
