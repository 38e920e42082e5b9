//! # Workflows Module
//!
//! High-level orchestration over the engine layer. A workflow owns the
//! sequencing of a multi-phase computation, reports progress through the
//! engine's callback type, and returns a structured report; it performs no
//! file I/O of its own.

pub mod superpose;
