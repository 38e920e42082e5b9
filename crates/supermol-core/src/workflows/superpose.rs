//! The two-pass ensemble superposition workflow.
//!
//! Pass one scores every model pair over the caller's selection, picks the
//! representative model, and superposes the ensemble onto it. The resulting
//! per-atom deviations drive core segmentation; pass two then re-selects the
//! representative over the core residues only and superposes the ensemble
//! onto it. Non-polymeric ensembles skip segmentation and run a single pass
//! over a widened heavy-atom selection.

use crate::core::models::ensemble::Ensemble;
use crate::engine::align::superpose_onto;
use crate::engine::config::SuperposeConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::representative::{select_representative, RepresentativeSummary};
use crate::engine::segment::{segment_core, CoreSegmentation};
use crate::engine::selection::{
    build_active_mask, validate_atoms_disjoint, validate_disjoint, BaseAtomSet, ResidueSpec,
    WIDE_HEAVY_PREFIXES,
};
use tracing::{info, instrument, warn};

/// One superposition pass: the model chosen as reference (with its RMSD
/// statistics over the pass's selection) and the number of atoms the fits
/// were computed over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassSummary {
    pub representative: RepresentativeSummary,
    pub active_atoms: usize,
}

/// The full report of a superposition run.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperposeReport {
    pub initial: PassSummary,
    /// `None` for single-model or non-polymeric ensembles, where
    /// segmentation is skipped.
    pub core: Option<CoreSegmentation>,
    /// The pass the ensemble finally rests on. Equals `initial` when no
    /// refinement pass ran.
    pub final_pass: PassSummary,
}

/// Runs the complete workflow, rewriting the ensemble's coordinates in place
/// so that every model ends up superposed onto the final representative.
#[instrument(skip_all, fields(models = ensemble.len()))]
pub fn run(
    ensemble: &mut Ensemble,
    config: &SuperposeConfig,
    reporter: &ProgressReporter,
) -> Result<SuperposeReport, EngineError> {
    if ensemble.is_empty() {
        return Err(EngineError::EmptyEnsemble);
    }

    let include = config.include_residues.resolve(ensemble.system());
    let exclude = config.exclude_residues.resolve(ensemble.system());
    validate_disjoint(&include, &exclude)?;
    validate_atoms_disjoint(&config.include_atoms, &config.exclude_atoms)?;

    let polymeric = ensemble.system().has_polymer_chain();
    let base = if polymeric {
        BaseAtomSet::Backbone
    } else {
        warn!("no polymeric chain found; selecting atoms by heavy-element name prefixes");
        BaseAtomSet::Prefixes(WIDE_HEAVY_PREFIXES)
    };

    let mask = build_active_mask(
        ensemble.system(),
        &include,
        &exclude,
        &config.include_atoms,
        &config.exclude_atoms,
        base,
    );

    reporter.report(Progress::PhaseStart {
        name: "Selecting representative model",
    });
    let representative = select_representative(ensemble, &mask)?;
    reporter.report(Progress::StatusUpdate {
        text: format!("representative model {}", representative.index),
    });
    reporter.report(Progress::PhaseFinish);

    let initial = PassSummary {
        representative,
        active_atoms: mask.len(),
    };

    if ensemble.len() == 1 {
        info!("single-model ensemble; nothing to superpose");
        return Ok(SuperposeReport {
            initial,
            core: None,
            final_pass: initial,
        });
    }

    reporter.report(Progress::PhaseStart {
        name: "Initial superposition",
    });
    superpose_onto(ensemble, representative.index, &mask)?;
    reporter.report(Progress::PhaseFinish);

    if !polymeric {
        info!("non-polymeric ensemble; skipping core segmentation");
        return Ok(SuperposeReport {
            initial,
            core: None,
            final_pass: initial,
        });
    }

    reporter.report(Progress::PhaseStart {
        name: "Segmenting core regions",
    });
    let core = segment_core(ensemble)?;
    reporter.report(Progress::PhaseFinish);

    if core.ranges.is_empty() {
        warn!("no core ranges below threshold; keeping initial superposition");
        return Ok(SuperposeReport {
            initial,
            core: Some(core),
            final_pass: initial,
        });
    }

    // The refinement mask restricts residues to the detected core while the
    // caller's exclusions and atom filters stay in force.
    let core_include = ResidueSpec::from_ranges(
        core.ranges
            .iter()
            .map(|range| (range.chain, range.start, range.end)),
    )
    .resolve(ensemble.system());
    let refined_mask = build_active_mask(
        ensemble.system(),
        &core_include,
        &exclude,
        &config.include_atoms,
        &config.exclude_atoms,
        base,
    );

    // The representative is re-selected over the core-only atoms; the
    // ensemble may rest on a different model than pass one chose.
    reporter.report(Progress::PhaseStart {
        name: "Core superposition",
    });
    let core_representative = select_representative(ensemble, &refined_mask)?;
    reporter.report(Progress::StatusUpdate {
        text: format!("core representative model {}", core_representative.index),
    });
    superpose_onto(ensemble, core_representative.index, &refined_mask)?;
    reporter.report(Progress::PhaseFinish);

    let final_pass = PassSummary {
        representative: core_representative,
        active_atoms: refined_mask.len(),
    };
    info!(
        initial_representative = initial.representative.index,
        final_representative = final_pass.representative.index,
        initial_rmsd = initial.representative.avg_rmsd,
        final_rmsd = final_pass.representative.avg_rmsd,
        core_ranges = core.ranges.len(),
        "superposition complete"
    );

    Ok(SuperposeReport {
        initial,
        core: Some(core),
        final_pass,
    })
}
