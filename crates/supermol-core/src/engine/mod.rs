//! # Engine Module
//!
//! This module implements the algorithmic layer of the ensemble-superposition
//! pipeline: selection parsing and resolution, pairwise rigid alignment,
//! representative-model selection, and core-region segmentation.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The caller's include/exclude selections
//!   with a builder for assembling them from raw strings
//! - **Selection Filtering** ([`selection`]) - The typed selection grammar and
//!   per-atom active masks
//! - **Alignment** ([`align`]) - Pairwise and one-vs-all rigid superposition
//!   built on the Kabsch fit
//! - **Representative Selection** ([`representative`]) - Minimal mean-RMSD
//!   model selection over all pairs
//! - **Core Segmentation** ([`segment`]) - Median-thresholded per-residue
//!   scoring and contiguous-range extraction
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! All state is threaded explicitly: the ensemble, the configuration, and the
//! progress reporter are passed through every call, with no module-level
//! mutable bookkeeping.

pub mod align;
pub mod config;
pub mod error;
pub mod progress;
pub mod representative;
pub mod segment;
pub mod selection;
