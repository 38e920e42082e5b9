use super::error::EngineError;
use crate::core::models::ensemble::Ensemble;
use crate::core::utils::identifiers::is_default_superpose_atom;
use tracing::{info, warn};

/// A maximal run of consecutive low-variance residues within one chain.
/// Bounds are inclusive residue numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreRange {
    pub chain: char,
    pub start: isize,
    pub end: isize,
}

/// The outcome of core segmentation: the well-ordered ranges plus the
/// statistics that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreSegmentation {
    pub ranges: Vec<CoreRange>,
    pub median_score: f64,
    pub threshold: f64,
}

/// One scored residue: the mean positional deviation of its scorable atoms
/// across every model that carries deviation values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidueScore {
    pub chain: char,
    pub residue: isize,
    pub score: f64,
}

/// Median of a sample. Averages the two middle values for even-length input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Splits scored residues into maximal runs whose score stays strictly below
/// the threshold. Runs never cross a chain boundary; residues that carry no
/// score are simply absent and do not break a run.
pub fn scan_ranges(scores: &[ResidueScore], threshold: f64) -> Vec<CoreRange> {
    let mut ranges = Vec::new();
    let mut open: Option<CoreRange> = None;

    for entry in scores {
        if let Some(run) = open
            && run.chain != entry.chain
        {
            ranges.push(run);
            open = None;
        }

        if entry.score < threshold {
            match &mut open {
                Some(run) => run.end = entry.residue,
                None => {
                    open = Some(CoreRange {
                        chain: entry.chain,
                        start: entry.residue,
                        end: entry.residue,
                    });
                }
            }
        } else if let Some(run) = open.take() {
            ranges.push(run);
        }
    }
    if let Some(run) = open {
        ranges.push(run);
    }
    ranges
}

fn residue_scores(ensemble: &Ensemble, backbone_only: bool) -> Vec<ResidueScore> {
    let system = ensemble.system();
    let mut scores = Vec::new();

    for (chain, residue_id) in system.residues_in_order() {
        let Some(residue) = system.residue(residue_id) else {
            continue;
        };

        let mut sum = 0.0;
        let mut count = 0usize;
        for &atom_id in residue.atoms() {
            if backbone_only {
                let Some(atom) = system.atom(atom_id) else {
                    continue;
                };
                if !is_default_superpose_atom(&atom.name) {
                    continue;
                }
            }
            for structure in ensemble.structures() {
                if let Some(deviation) = structure.deviation(atom_id) {
                    sum += deviation;
                    count += 1;
                }
            }
        }

        if count > 0 {
            scores.push(ResidueScore {
                chain,
                residue: residue.id,
                score: sum / count as f64,
            });
        }
    }
    scores
}

/// Segments the ensemble into low-variance core ranges.
///
/// Residues are scored by the mean deviation of their backbone atoms, as
/// written by the preceding one-vs-all superposition. The threshold is twice
/// the median residue score. When no backbone atom carries a deviation (as
/// with non-polymeric systems aligned over name prefixes), scoring falls
/// back to every deviated atom.
pub fn segment_core(ensemble: &Ensemble) -> Result<CoreSegmentation, EngineError> {
    let mut scores = residue_scores(ensemble, true);
    if scores.is_empty() {
        warn!("no backbone atoms carry deviations; scoring over all deviated atoms");
        scores = residue_scores(ensemble, false);
    }
    if scores.is_empty() {
        return Err(EngineError::NoScorableResidues);
    }

    let values: Vec<f64> = scores.iter().map(|s| s.score).collect();
    let median_score = median(&values).ok_or(EngineError::NoScorableResidues)?;
    let threshold = 2.0 * median_score;
    let ranges = scan_ranges(&scores, threshold);
    info!(
        residues = scores.len(),
        median = median_score,
        threshold,
        ranges = ranges.len(),
        "segmented core regions"
    );

    Ok(CoreSegmentation {
        ranges,
        median_score,
        threshold,
    })
}
