use super::ids::ResidueId;

/// Represents an atom's identity within the shared ensemble topology.
///
/// An atom is identified by its name and its parent residue; it carries no
/// coordinates of its own. Per-model positions and deviation values live in
/// each [`Structure`](super::ensemble::Structure), keyed by the atom's ID, so
/// that a single topology can be shared by every model in an ensemble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "N", "O3'").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The atom serial number from the source file, kept for stable output
    /// ordering when models are written back out.
    pub serial: usize,
    /// The element symbol (e.g., "C", "N"), empty when the source file did
    /// not carry one.
    pub element: String,
}

impl Atom {
    /// Creates a new `Atom` belonging to the given residue.
    pub fn new(name: &str, residue_id: ResidueId, serial: usize) -> Self {
        Self {
            name: name.to_string(),
            residue_id,
            serial,
            element: String::new(),
        }
    }

    /// Returns the atom name lower-cased, the normalization used throughout
    /// selection matching.
    pub fn name_lower(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}
