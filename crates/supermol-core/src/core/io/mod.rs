//! Provides input/output functionality for structural ensembles.
//!
//! Ensembles are read from lists of single-model PDB files: the first file
//! defines the shared topology and every subsequent file must agree with it
//! exactly. Superposed models are written back out one file per model, with
//! the per-atom deviation slot occupying the B-factor column.

pub mod pdb;
