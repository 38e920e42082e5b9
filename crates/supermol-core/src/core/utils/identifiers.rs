use phf::{Set, phf_set};

/// Default atom set for superposition: protein backbone plus the nucleic-acid
/// sugar-phosphate backbone. Names are stored lower-cased; compare with
/// [`is_default_superpose_atom`].
static DEFAULT_SUPERPOSE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "ca", "c", "n", "o", "p", "o5'", "c5'", "c4'", "c3'", "o3'",
};

static AMINO_ACID_NAMES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "HSD", "HSE", "HSP", "MSE",
};

static NUCLEOTIDE_NAMES: Set<&'static str> = phf_set! {
    "A", "C", "G", "U", "T", "DA", "DC", "DG", "DT",
    "ADE", "CYT", "GUA", "URA", "THY", "RA", "RC", "RG", "RU",
};

/// The broad classification of a residue name, used to type chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidueClass {
    AminoAcid,
    Nucleotide,
    Other,
}

pub fn residue_class(residue_name: &str) -> ResidueClass {
    let name = residue_name.trim().to_ascii_uppercase();
    if AMINO_ACID_NAMES.contains(name.as_str()) {
        ResidueClass::AminoAcid
    } else if NUCLEOTIDE_NAMES.contains(name.as_str()) {
        ResidueClass::Nucleotide
    } else {
        ResidueClass::Other
    }
}

pub fn is_default_superpose_atom(atom_name: &str) -> bool {
    DEFAULT_SUPERPOSE_ATOM_NAMES.contains(atom_name.trim().to_ascii_lowercase().as_str())
}

pub fn is_heavy_atom(atom_name: &str) -> bool {
    let first_char = atom_name
        .trim()
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase());
    !matches!(first_char, None | Some('H') | Some('D'))
}
