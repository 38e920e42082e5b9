//! # Core Models Module
//!
//! Data structures for representing a structural ensemble: a single shared
//! topology (chains, residues, atoms) plus one coordinate set per model.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom identity within the shared topology
//! - [`residue`] - Residue structure and ordered atom ownership
//! - [`chain`] - Chain organization and polymer classification
//! - [`system`] - The shared topology with lookup maps
//! - [`ensemble`] - The ordered collection of models layered over one topology
//! - [`ids`] - Unique identifier types for atoms, residues, and chains
//!
//! The central invariant is that every model in an [`ensemble::Ensemble`]
//! references the same [`system::MolecularSystem`] topology; per-model data
//! (coordinates, per-atom deviation) lives in secondary maps keyed by
//! [`ids::AtomId`].

pub mod atom;
pub mod chain;
pub mod ensemble;
pub mod ids;
pub mod residue;
pub mod system;
