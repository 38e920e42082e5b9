use super::error::EngineError;
use super::selection::{AtomSpec, ResidueSpec};

/// The caller-facing configuration for an ensemble superposition run.
///
/// All four selections are held in parsed form; raw strings are validated
/// once by the [`SuperposeConfigBuilder`] and never re-inspected downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperposeConfig {
    pub include_residues: ResidueSpec,
    pub exclude_residues: ResidueSpec,
    pub include_atoms: AtomSpec,
    pub exclude_atoms: AtomSpec,
}

impl Default for SuperposeConfig {
    fn default() -> Self {
        Self {
            include_residues: ResidueSpec::All,
            exclude_residues: ResidueSpec::empty(),
            include_atoms: AtomSpec::any(),
            exclude_atoms: AtomSpec::default(),
        }
    }
}

impl SuperposeConfig {
    pub fn builder() -> SuperposeConfigBuilder {
        SuperposeConfigBuilder::default()
    }
}

/// Assembles a [`SuperposeConfig`] from raw selection strings.
///
/// Unset fields keep their defaults: include everything, exclude nothing.
#[derive(Debug, Clone, Default)]
pub struct SuperposeConfigBuilder {
    include_residues: Option<String>,
    exclude_residues: Option<String>,
    include_atoms: Option<String>,
    exclude_atoms: Option<String>,
}

impl SuperposeConfigBuilder {
    pub fn include_residues(mut self, selection: &str) -> Self {
        self.include_residues = Some(selection.to_string());
        self
    }

    pub fn exclude_residues(mut self, selection: &str) -> Self {
        self.exclude_residues = Some(selection.to_string());
        self
    }

    pub fn include_atoms(mut self, selection: &str) -> Self {
        self.include_atoms = Some(selection.to_string());
        self
    }

    pub fn exclude_atoms(mut self, selection: &str) -> Self {
        self.exclude_atoms = Some(selection.to_string());
        self
    }

    pub fn build(self) -> Result<SuperposeConfig, EngineError> {
        let include_residues = match self.include_residues.as_deref() {
            Some(raw) => ResidueSpec::parse(raw)?,
            None => ResidueSpec::All,
        };
        let exclude_residues = match self.exclude_residues.as_deref() {
            Some(raw) => ResidueSpec::parse(raw)?,
            None => ResidueSpec::empty(),
        };
        let include_atoms = match self.include_atoms.as_deref() {
            Some(raw) => AtomSpec::parse(raw)?,
            None => AtomSpec::any(),
        };
        let exclude_atoms = match self.exclude_atoms.as_deref() {
            Some(raw) => AtomSpec::parse(raw)?,
            None => AtomSpec::default(),
        };

        Ok(SuperposeConfig {
            include_residues,
            exclude_residues,
            include_atoms,
            exclude_atoms,
        })
    }
}
