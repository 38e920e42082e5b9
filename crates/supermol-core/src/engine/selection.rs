use super::error::EngineError;
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::identifiers::{is_default_superpose_atom, is_heavy_atom};
use std::collections::HashSet;

/// Chain bound to a residue sub-expression when no `chain:` prefix is given.
pub const DEFAULT_CHAIN: char = 'A';

/// Atom-name prefixes used for non-polymeric ensembles, where the fixed
/// backbone set would select nothing.
pub const WIDE_HEAVY_PREFIXES: &[&str] = &["c", "n", "o", "p"];

/// A single residue pick within one chain, resolved at parse time. Downstream
/// code never re-inspects raw selection strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResiduePick {
    Single(isize),
    Range(isize, isize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainPicks {
    /// Chain-wide wildcard (`A: *`).
    All,
    Picks(Vec<ResiduePick>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSelection {
    pub chain: char,
    pub picks: ChainPicks,
}

/// A parsed residue selection: either the bare wildcard `*` (every residue in
/// every chain) or a list of per-chain picks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResidueSpec {
    All,
    Chains(Vec<ChainSelection>),
}

impl ResidueSpec {
    pub fn empty() -> Self {
        ResidueSpec::Chains(Vec::new())
    }

    /// Parses a residue selection string.
    ///
    /// Grammar: `;`-separated chain groups, each optionally prefixed with
    /// `chain:`; within a group, `,`-separated tokens that are either single
    /// residue numbers or `-`-separated inclusive ranges; `*` as a group
    /// matches every residue of that chain; a bare `*` matches everything.
    ///
    /// ```
    /// use supermol::engine::selection::ResidueSpec;
    ///
    /// let spec = ResidueSpec::parse("B: 2, 3; A: 5-6").unwrap();
    /// assert!(matches!(spec, ResidueSpec::Chains(ref chains) if chains.len() == 2));
    /// ```
    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(ResidueSpec::empty());
        }
        if trimmed == "*" {
            return Ok(ResidueSpec::All);
        }

        let mut chains = Vec::new();
        for group in trimmed.split(';') {
            let group = group.trim();
            if group.is_empty() {
                continue;
            }
            let (chain, expr) = match group.split_once(':') {
                Some((chain_str, expr)) => {
                    let chain_str = chain_str.trim();
                    let mut chars = chain_str.chars();
                    let chain = chars.next().ok_or_else(|| EngineError::MalformedSelection {
                        token: group.to_string(),
                        reason: "empty chain code before ':'".to_string(),
                    })?;
                    if chars.next().is_some() {
                        return Err(EngineError::MalformedSelection {
                            token: chain_str.to_string(),
                            reason: "chain code must be a single character".to_string(),
                        });
                    }
                    (chain, expr.trim())
                }
                None => (DEFAULT_CHAIN, group),
            };
            chains.push(ChainSelection {
                chain,
                picks: parse_picks(expr)?,
            });
        }
        Ok(ResidueSpec::Chains(chains))
    }

    /// Builds a selection from contiguous (chain, start, end) ranges, the
    /// form the core segmenter emits for the refinement pass.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = (char, isize, isize)>,
    {
        let mut chains: Vec<ChainSelection> = Vec::new();
        for (chain, start, end) in ranges {
            let pick = if start == end {
                ResiduePick::Single(start)
            } else {
                ResiduePick::Range(start, end)
            };
            match chains.iter_mut().find(|c| c.chain == chain) {
                Some(existing) => {
                    if let ChainPicks::Picks(picks) = &mut existing.picks {
                        picks.push(pick);
                    }
                }
                None => chains.push(ChainSelection {
                    chain,
                    picks: ChainPicks::Picks(vec![pick]),
                }),
            }
        }
        ResidueSpec::Chains(chains)
    }

    /// Resolves the selection to concrete (chain, residue-number) pairs over
    /// the given topology. The bare wildcard resolves to an all-marker rather
    /// than an enumerated set, so it never participates in conflict checks.
    pub fn resolve(&self, system: &MolecularSystem) -> ResolvedResidues {
        match self {
            ResidueSpec::All => ResolvedResidues {
                all: true,
                set: HashSet::new(),
            },
            ResidueSpec::Chains(chains) => {
                let mut set = HashSet::new();
                for chain_sel in chains {
                    match &chain_sel.picks {
                        ChainPicks::All => {
                            let residues = system
                                .find_chain_by_id(chain_sel.chain)
                                .and_then(|id| system.chain(id))
                                .map(|chain| chain.residues().to_vec())
                                .unwrap_or_default();
                            for residue_id in residues {
                                if let Some(residue) = system.residue(residue_id) {
                                    set.insert((chain_sel.chain, residue.id));
                                }
                            }
                        }
                        ChainPicks::Picks(picks) => {
                            for pick in picks {
                                match *pick {
                                    ResiduePick::Single(number) => {
                                        set.insert((chain_sel.chain, number));
                                    }
                                    ResiduePick::Range(first, last) => {
                                        for number in first..=last {
                                            set.insert((chain_sel.chain, number));
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                ResolvedResidues { all: false, set }
            }
        }
    }
}

fn parse_picks(expr: &str) -> Result<ChainPicks, EngineError> {
    if expr.is_empty() {
        return Ok(ChainPicks::Picks(Vec::new()));
    }
    if expr == "*" {
        return Ok(ChainPicks::All);
    }

    let mut picks = Vec::new();
    for token in expr.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token.split_once('-') {
            Some((first_str, last_str)) => {
                let first = parse_residue_number(first_str.trim(), token)?;
                let last = parse_residue_number(last_str.trim(), token)?;
                if last < first {
                    return Err(EngineError::MalformedSelection {
                        token: token.to_string(),
                        reason: "range end precedes range start".to_string(),
                    });
                }
                picks.push(ResiduePick::Range(first, last));
            }
            None => picks.push(ResiduePick::Single(parse_residue_number(token, token)?)),
        }
    }
    Ok(ChainPicks::Picks(picks))
}

fn parse_residue_number(value: &str, token: &str) -> Result<isize, EngineError> {
    value.parse().map_err(|_| EngineError::MalformedSelection {
        token: token.to_string(),
        reason: format!("'{}' is not a residue number", value),
    })
}

/// The concrete result of resolving a [`ResidueSpec`] over a topology.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedResidues {
    all: bool,
    set: HashSet<(char, isize)>,
}

impl ResolvedResidues {
    pub fn contains(&self, chain: char, residue: isize) -> bool {
        self.all || self.set.contains(&(chain, residue))
    }

    pub fn pairs(&self) -> &HashSet<(char, isize)> {
        &self.set
    }

    pub fn is_all(&self) -> bool {
        self.all
    }
}

/// Fails with [`EngineError::ConflictingSelection`] when the resolved include
/// and exclude sets share any (chain, residue) pair.
pub fn validate_disjoint(
    include: &ResolvedResidues,
    exclude: &ResolvedResidues,
) -> Result<(), EngineError> {
    let mut overlap: Vec<String> = include
        .pairs()
        .intersection(exclude.pairs())
        .map(|(chain, residue)| format!("{}.{}", chain, residue))
        .collect();
    if overlap.is_empty() {
        Ok(())
    } else {
        overlap.sort();
        Err(EngineError::ConflictingSelection { residues: overlap })
    }
}

/// A single atom-name pattern, lower-cased at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomPattern {
    Any,
    Exact(String),
    Prefix(String),
}

/// A comma-separated list of atom-name patterns. An empty list matches no
/// atom, mirroring the source semantics where an empty include list selects
/// nothing and an empty exclude list excludes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomSpec {
    patterns: Vec<AtomPattern>,
}

impl AtomSpec {
    pub fn any() -> Self {
        Self {
            patterns: vec![AtomPattern::Any],
        }
    }

    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let mut patterns = Vec::new();
        for token in input.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let lower = token.to_ascii_lowercase();
            if lower == "*" {
                patterns.push(AtomPattern::Any);
            } else if let Some(stem) = lower.strip_suffix('*') {
                if stem.contains('*') {
                    return Err(EngineError::MalformedSelection {
                        token: token.to_string(),
                        reason: "wildcard may only appear at the end of an atom name".to_string(),
                    });
                }
                patterns.push(AtomPattern::Prefix(stem.to_string()));
            } else if lower.contains('*') {
                return Err(EngineError::MalformedSelection {
                    token: token.to_string(),
                    reason: "wildcard may only appear at the end of an atom name".to_string(),
                });
            } else {
                patterns.push(AtomPattern::Exact(lower));
            }
        }
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Matches a lower-cased atom name against the pattern list.
    pub fn matches(&self, lower_name: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            AtomPattern::Any => true,
            AtomPattern::Exact(name) => name == lower_name,
            AtomPattern::Prefix(stem) => lower_name.starts_with(stem.as_str()),
        })
    }

    fn rendered_tokens(&self) -> Vec<String> {
        self.patterns
            .iter()
            .map(|pattern| match pattern {
                AtomPattern::Any => "*".to_string(),
                AtomPattern::Exact(name) => name.clone(),
                AtomPattern::Prefix(stem) => format!("{}*", stem),
            })
            .collect()
    }
}

/// Fails when the same atom token appears in both the include and exclude
/// lists. Patterns are compared as tokens, not by overlap of the names they
/// could match.
pub fn validate_atoms_disjoint(include: &AtomSpec, exclude: &AtomSpec) -> Result<(), EngineError> {
    let exclude_tokens: HashSet<String> = exclude.rendered_tokens().into_iter().collect();
    let mut overlap: Vec<String> = include
        .rendered_tokens()
        .into_iter()
        .filter(|token| exclude_tokens.contains(token))
        .collect();
    if overlap.is_empty() {
        Ok(())
    } else {
        overlap.sort();
        overlap.dedup();
        Err(EngineError::ConflictingAtomSelection { atoms: overlap })
    }
}

/// The base atom set a superposition or scoring pass draws from, before the
/// caller's include/exclude atom filters are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseAtomSet {
    /// The default backbone set (`ca, c, n, o, p, o5', c5', c4', c3', o3'`).
    Backbone,
    /// Every non-hydrogen atom; the fallback when backbone scoring selects
    /// nothing.
    Heavy,
    /// Name-prefix wildcards, used for non-polymeric ensembles.
    Prefixes(&'static [&'static str]),
}

impl BaseAtomSet {
    pub fn matches(&self, atom_name: &str) -> bool {
        match self {
            BaseAtomSet::Backbone => is_default_superpose_atom(atom_name),
            BaseAtomSet::Heavy => is_heavy_atom(atom_name),
            BaseAtomSet::Prefixes(prefixes) => {
                let lower = atom_name.trim().to_ascii_lowercase();
                prefixes.iter().any(|prefix| lower.starts_with(prefix))
            }
        }
    }
}

/// The set of atoms eligible for superposition. Rebuilt from scratch by every
/// call to [`build_active_mask`]; activity is never cumulative across calls.
#[derive(Debug, Clone, Default)]
pub struct ActiveMask {
    active: HashSet<AtomId>,
}

impl ActiveMask {
    pub fn is_active(&self, id: AtomId) -> bool {
        self.active.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Marks every atom that passes the residue include/exclude sets, the base
/// atom set, and the caller's atom include/exclude filters.
pub fn build_active_mask(
    system: &MolecularSystem,
    include: &ResolvedResidues,
    exclude: &ResolvedResidues,
    include_atoms: &AtomSpec,
    exclude_atoms: &AtomSpec,
    base: BaseAtomSet,
) -> ActiveMask {
    let mut active = HashSet::new();
    for (chain, residue_id) in system.residues_in_order() {
        let Some(residue) = system.residue(residue_id) else {
            continue;
        };
        if !include.contains(chain, residue.id) || exclude.contains(chain, residue.id) {
            continue;
        }
        for &atom_id in residue.atoms() {
            let Some(atom) = system.atom(atom_id) else {
                continue;
            };
            if !base.matches(&atom.name) {
                continue;
            }
            let lower = atom.name_lower();
            if exclude_atoms.matches(&lower) || !include_atoms.matches(&lower) {
                continue;
            }
            active.insert(atom_id);
        }
    }
    ActiveMask { active }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::chain::ChainType;

    fn system_with_residues(chain: char, numbers: &[isize]) -> MolecularSystem {
        let mut system = MolecularSystem::new();
        let chain_id = system.add_chain(chain, ChainType::Protein);
        let mut serial = 1;
        for &number in numbers {
            let residue_id = system.add_residue(chain_id, number, "ALA").unwrap();
            for name in ["N", "CA", "C", "O", "CB"] {
                system.add_atom_to_residue(residue_id, Atom::new(name, residue_id, serial));
                serial += 1;
            }
        }
        system
    }

    fn resolved_pairs(spec: &str, system: &MolecularSystem) -> Vec<(char, isize)> {
        let mut pairs: Vec<_> = ResidueSpec::parse(spec)
            .unwrap()
            .resolve(system)
            .pairs()
            .iter()
            .copied()
            .collect();
        pairs.sort();
        pairs
    }

    #[test]
    fn mixed_ranges_and_singles_resolve_to_expected_residues() {
        let system = system_with_residues('A', &(1..=12).collect::<Vec<_>>());
        assert_eq!(
            resolved_pairs("2-5,10", &system),
            vec![('A', 2), ('A', 3), ('A', 4), ('A', 5), ('A', 10)]
        );
    }

    #[test]
    fn single_range_and_plain_list_forms_parse() {
        let system = system_with_residues('A', &[1, 2, 3, 4, 5]);
        assert_eq!(
            resolved_pairs("2-4", &system),
            vec![('A', 2), ('A', 3), ('A', 4)]
        );
        assert_eq!(
            resolved_pairs("1, 3, 5", &system),
            vec![('A', 1), ('A', 3), ('A', 5)]
        );
    }

    #[test]
    fn bare_wildcard_matches_every_residue() {
        let system = system_with_residues('A', &[1, 2, 3]);
        let resolved = ResidueSpec::parse("*").unwrap().resolve(&system);
        assert!(resolved.is_all());
        assert!(resolved.contains('A', 1));
        assert!(resolved.contains('B', 99));
    }

    #[test]
    fn chain_wide_wildcard_enumerates_only_that_chain() {
        let mut system = system_with_residues('A', &[1, 2]);
        let chain_b = system.add_chain('B', ChainType::Protein);
        system.add_residue(chain_b, 7, "GLY").unwrap();

        let resolved = ResidueSpec::parse("B: *").unwrap().resolve(&system);
        assert!(!resolved.is_all());
        assert!(resolved.contains('B', 7));
        assert!(!resolved.contains('A', 1));
    }

    #[test]
    fn semicolon_groups_attribute_residues_to_their_chains() {
        let mut system = system_with_residues('A', &[5, 6]);
        let chain_b = system.add_chain('B', ChainType::Protein);
        system.add_residue(chain_b, 2, "GLY").unwrap();
        system.add_residue(chain_b, 3, "GLY").unwrap();

        assert_eq!(
            resolved_pairs("B: 2, 3; A: 5-6", &system),
            vec![('A', 5), ('A', 6), ('B', 2), ('B', 3)]
        );
    }

    #[test]
    fn missing_chain_prefix_defaults_to_chain_a() {
        let system = system_with_residues('A', &[1, 2, 3]);
        assert_eq!(resolved_pairs("2", &system), vec![('A', 2)]);
    }

    #[test]
    fn empty_string_resolves_to_empty_set() {
        let system = system_with_residues('A', &[1]);
        let resolved = ResidueSpec::parse("").unwrap().resolve(&system);
        assert!(!resolved.is_all());
        assert!(resolved.pairs().is_empty());
    }

    #[test]
    fn malformed_tokens_name_the_offender() {
        let err = ResidueSpec::parse("2-x").unwrap_err();
        assert!(matches!(
            err,
            EngineError::MalformedSelection { ref token, .. } if token == "2-x"
        ));

        let err = ResidueSpec::parse("AB: 2").unwrap_err();
        assert!(matches!(err, EngineError::MalformedSelection { .. }));

        let err = ResidueSpec::parse("9-2").unwrap_err();
        assert!(matches!(
            err,
            EngineError::MalformedSelection { ref token, .. } if token == "9-2"
        ));
    }

    #[test]
    fn overlapping_include_and_exclude_is_a_hard_failure() {
        let system = system_with_residues('A', &(1..=10).collect::<Vec<_>>());
        let include = ResidueSpec::parse("2-6").unwrap().resolve(&system);
        let exclude = ResidueSpec::parse("5, 9").unwrap().resolve(&system);

        let err = validate_disjoint(&include, &exclude).unwrap_err();
        assert_eq!(
            err,
            EngineError::ConflictingSelection {
                residues: vec!["A.5".to_string()]
            }
        );
    }

    #[test]
    fn overlap_shapes_all_conflict() {
        let mut system = system_with_residues('A', &(1..=10).collect::<Vec<_>>());
        let chain_b = system.add_chain('B', ChainType::Protein);
        for n in 1..=5 {
            system.add_residue(chain_b, n, "GLY").unwrap();
        }

        // Exclude range nested inside the include range.
        let include = ResidueSpec::parse("1-10").unwrap().resolve(&system);
        let exclude = ResidueSpec::parse("3-5").unwrap().resolve(&system);
        let err = validate_disjoint(&include, &exclude).unwrap_err();
        assert_eq!(
            err,
            EngineError::ConflictingSelection {
                residues: vec!["A.3".to_string(), "A.4".to_string(), "A.5".to_string()]
            }
        );

        // Overlap confined to one of several chains.
        let include = ResidueSpec::parse("A: 1-3; B: 2").unwrap().resolve(&system);
        let exclude = ResidueSpec::parse("B: 2, 4").unwrap().resolve(&system);
        let err = validate_disjoint(&include, &exclude).unwrap_err();
        assert_eq!(
            err,
            EngineError::ConflictingSelection {
                residues: vec!["B.2".to_string()]
            }
        );

        // A single residue both included and excluded.
        let include = ResidueSpec::parse("7").unwrap().resolve(&system);
        let exclude = ResidueSpec::parse("7").unwrap().resolve(&system);
        assert!(validate_disjoint(&include, &exclude).is_err());

        // Same residue number on different chains is no overlap.
        let include = ResidueSpec::parse("A: 2").unwrap().resolve(&system);
        let exclude = ResidueSpec::parse("B: 2").unwrap().resolve(&system);
        assert!(validate_disjoint(&include, &exclude).is_ok());
    }

    #[test]
    fn wildcard_include_does_not_conflict_with_explicit_excludes() {
        let system = system_with_residues('A', &[1, 2, 3]);
        let include = ResidueSpec::parse("*").unwrap().resolve(&system);
        let exclude = ResidueSpec::parse("2").unwrap().resolve(&system);
        assert!(validate_disjoint(&include, &exclude).is_ok());
    }

    #[test]
    fn atom_spec_patterns_match_case_insensitively() {
        let spec = AtomSpec::parse("CA, c5', h*").unwrap();
        assert!(spec.matches("ca"));
        assert!(spec.matches("c5'"));
        assert!(spec.matches("hb2"));
        assert!(!spec.matches("n"));
    }

    #[test]
    fn empty_atom_spec_matches_nothing() {
        let spec = AtomSpec::parse("").unwrap();
        assert!(spec.is_empty());
        assert!(!spec.matches("ca"));
    }

    #[test]
    fn interior_wildcard_in_atom_name_is_malformed() {
        assert!(matches!(
            AtomSpec::parse("c*a"),
            Err(EngineError::MalformedSelection { .. })
        ));
    }

    #[test]
    fn duplicate_atom_tokens_across_include_and_exclude_conflict() {
        let include = AtomSpec::parse("ca, cb").unwrap();
        let exclude = AtomSpec::parse("CB").unwrap();
        let err = validate_atoms_disjoint(&include, &exclude).unwrap_err();
        assert_eq!(
            err,
            EngineError::ConflictingAtomSelection {
                atoms: vec!["cb".to_string()]
            }
        );
    }

    #[test]
    fn active_mask_honors_residue_and_atom_filters() {
        let system = system_with_residues('A', &[1, 2, 3]);
        let include = ResidueSpec::parse("1-2").unwrap().resolve(&system);
        let exclude = ResidueSpec::parse("2").unwrap().resolve(&system);

        let mask = build_active_mask(
            &system,
            &include,
            &exclude,
            &AtomSpec::any(),
            &AtomSpec::parse("o").unwrap(),
            BaseAtomSet::Backbone,
        );

        // Residue 1 only; backbone minus the excluded O: n, ca, c.
        assert_eq!(mask.len(), 3);
    }

    #[test]
    fn active_mask_is_rebuilt_not_accumulated() {
        let system = system_with_residues('A', &[1, 2]);
        let all = ResidueSpec::All.resolve(&system);
        let none = ResidueSpec::empty().resolve(&system);

        let full = build_active_mask(
            &system,
            &all,
            &none,
            &AtomSpec::any(),
            &AtomSpec::default(),
            BaseAtomSet::Backbone,
        );
        let restricted = build_active_mask(
            &system,
            &ResidueSpec::parse("1").unwrap().resolve(&system),
            &none,
            &AtomSpec::any(),
            &AtomSpec::default(),
            BaseAtomSet::Backbone,
        );
        assert_eq!(full.len(), 8);
        assert_eq!(restricted.len(), 4);
    }

    #[test]
    fn wide_prefix_set_matches_heavy_names_only() {
        let base = BaseAtomSet::Prefixes(WIDE_HEAVY_PREFIXES);
        assert!(base.matches("C1"));
        assert!(base.matches("O5'"));
        assert!(base.matches("P"));
        assert!(!base.matches("H12"));

        assert!(BaseAtomSet::Heavy.matches("SG"));
        assert!(!BaseAtomSet::Heavy.matches("HA"));
    }

    #[test]
    fn from_ranges_builds_singles_and_ranges_per_chain() {
        let spec = ResidueSpec::from_ranges(vec![('A', 1, 3), ('A', 6, 6), ('B', 2, 4)]);
        let system = {
            let mut system = system_with_residues('A', &[1, 2, 3, 4, 5, 6]);
            let chain_b = system.add_chain('B', ChainType::Protein);
            for n in 2..=4 {
                system.add_residue(chain_b, n, "GLY").unwrap();
            }
            system
        };
        let resolved = spec.resolve(&system);
        for (chain, number) in [('A', 1), ('A', 2), ('A', 3), ('A', 6), ('B', 3)] {
            assert!(resolved.contains(chain, number), "{}.{}", chain, number);
        }
        assert!(!resolved.contains('A', 4));
        assert!(!resolved.contains('A', 5));
    }
}
