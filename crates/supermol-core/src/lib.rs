//! # SUPERMOL Core Library
//!
//! A library for superposing structural ensembles: given a set of alternative
//! 3-D models of the same molecule (for example, the output of an NMR
//! structure calculation), it selects the most representative model, detects
//! the well-ordered "core" residues, and rigidly superposes every model onto
//! the representative over that core.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the stateless data models
//!   (`MolecularSystem`, `Ensemble`), PDB I/O, and pure geometry utilities
//!   (Kabsch superposition, RMSD).
//!
//! - **[`engine`]: The Logic Core.** This layer implements the algorithmic
//!   pieces: selection parsing and resolution, pairwise rigid alignment,
//!   representative selection, and core-region segmentation.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `core` together to execute the complete
//!   two-pass refinement procedure. It provides a simple entry point for
//!   end-users of the library.

pub mod core;
pub mod engine;
pub mod workflows;
