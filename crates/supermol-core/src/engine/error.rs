use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Residues cannot be both included and excluded in comparison: {residues:?}")]
    ConflictingSelection { residues: Vec<String> },

    #[error("Atoms cannot be both included and excluded in comparison: {atoms:?}")]
    ConflictingAtomSelection { atoms: Vec<String> },

    #[error("Malformed selection syntax at '{token}': {reason}")]
    MalformedSelection { token: String, reason: String },

    #[error("Ensemble contains no structures")]
    EmptyEnsemble,

    #[error("No residues carry scorable atoms; cannot segment core regions")]
    NoScorableResidues,

    #[error("Superposition failed: {0}")]
    Alignment(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
