use super::ids::ResidueId;
use std::fmt;

/// The broad classification of a chain, derived from its residue names.
///
/// Core-region segmentation only runs over polymer chains; non-polymeric
/// entities (ligands, ions, isolated small molecules) are superposed with a
/// widened heavy-atom selection instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainType {
    Protein,
    NucleicAcid,
    Other,
}

impl ChainType {
    pub fn is_polymer(&self) -> bool {
        matches!(self, ChainType::Protein | ChainType::NucleicAcid)
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ChainType::Protein => "Protein",
                ChainType::NucleicAcid => "NucleicAcid",
                ChainType::Other => "Other",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    pub id: char,                        // Chain identifier (e.g., 'A', 'B')
    pub chain_type: ChainType,           // Type of the chain
    pub(crate) residues: Vec<ResidueId>, // Ordered list of residue IDs belonging to this chain
}

impl Chain {
    pub(crate) fn new(id: char, chain_type: ChainType) -> Self {
        Self {
            id,
            chain_type,
            residues: Vec::new(),
        }
    }

    pub fn residues(&self) -> &[ResidueId] {
        &self.residues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polymer_classification() {
        assert!(ChainType::Protein.is_polymer());
        assert!(ChainType::NucleicAcid.is_polymer());
        assert!(!ChainType::Other.is_polymer());
    }

    #[test]
    fn display_names() {
        assert_eq!(ChainType::Protein.to_string(), "Protein");
        assert_eq!(ChainType::Other.to_string(), "Other");
    }
}
