//! # Core Module
//!
//! This module provides the fundamental building blocks for ensemble
//! superposition: molecular data structures, PDB file I/O, and geometry
//! utilities.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, residues, chains, the
//!   shared topology, and the multi-model ensemble
//! - **File I/O** ([`io`]) - Reading multi-model PDB ensembles and writing
//!   superposed models back out
//! - **Utilities** ([`utils`]) - Rigid-body fitting, RMSD computation, and
//!   atom-name classification

pub mod io;
pub mod models;
pub mod utils;
