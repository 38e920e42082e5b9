use crate::core::models::atom::Atom;
use crate::core::models::chain::ChainType;
use crate::core::models::ensemble::{Ensemble, Structure};
use crate::core::models::ids::AtomId;
use crate::core::models::system::MolecularSystem;
use crate::core::utils::identifiers::{ResidueClass, residue_class};
use nalgebra::Point3;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Ensemble file list is empty")]
    EmptyFileList,
    #[error("Topology mismatch in '{path}': {detail}", path = path.display())]
    TopologyMismatch { path: PathBuf, detail: String },
    #[error("Model index {0} out of range")]
    ModelOutOfRange(usize),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must reach column 54)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

/// One parsed ATOM/HETATM record; the unit of topology comparison between
/// ensemble members.
#[derive(Debug, Clone, PartialEq)]
struct AtomRecord {
    serial: usize,
    name: String,
    res_name: String,
    chain_id: char,
    res_seq: isize,
    position: Point3<f64>,
    element: String,
}

/// Reader/writer for ensembles stored as plain-text PDB files.
pub struct PdbFile;

impl PdbFile {
    /// Loads an ensemble from an ordered list of single-model PDB files.
    ///
    /// The first file defines the shared topology; every other file
    /// contributes coordinates only and must agree on atom count and
    /// (chain, residue, atom-name) identity.
    ///
    /// # Errors
    ///
    /// Returns [`PdbError::EmptyFileList`] for an empty list and
    /// [`PdbError::TopologyMismatch`] when a later model disagrees with the
    /// first file's topology.
    pub fn load_ensemble<P: AsRef<Path>>(paths: &[P]) -> Result<Ensemble, PdbError> {
        if paths.is_empty() {
            return Err(PdbError::EmptyFileList);
        }

        let first_records = Self::read_records_from_path(&paths[0])?;
        if first_records.is_empty() {
            return Err(PdbError::Inconsistency(format!(
                "No ATOM/HETATM records in '{}'",
                paths[0].as_ref().display()
            )));
        }

        let (system, atom_order, first_model) = build_topology(&first_records);
        let mut structures = vec![first_model];

        for (model_id, path) in paths.iter().enumerate().skip(1) {
            let records = Self::read_records_from_path(path)?;
            let structure =
                overlay_model(&system, &atom_order, &records, model_id, path.as_ref())?;
            structures.push(structure);
        }

        Ok(Ensemble::new(system, structures))
    }

    /// Writes one model of the ensemble as a PDB file. The per-atom deviation
    /// slot is emitted in the B-factor column (zero when never written).
    pub fn save_structure<P: AsRef<Path>>(
        ensemble: &Ensemble,
        model_index: usize,
        path: P,
    ) -> Result<(), PdbError> {
        let file = std::fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_structure_to(ensemble, model_index, &mut writer)
    }

    /// Writes one model of the ensemble to an arbitrary writer.
    pub fn write_structure_to(
        ensemble: &Ensemble,
        model_index: usize,
        writer: &mut impl Write,
    ) -> Result<(), PdbError> {
        let structure = ensemble
            .structure(model_index)
            .ok_or(PdbError::ModelOutOfRange(model_index))?;
        let system = ensemble.system();

        let mut last_chain = None;
        for atom_id in system.atoms_in_order() {
            let atom = system
                .atom(atom_id)
                .ok_or_else(|| PdbError::Inconsistency("Dangling atom ID".into()))?;
            let residue = system
                .residue(atom.residue_id)
                .ok_or_else(|| PdbError::Inconsistency("Dangling residue ID".into()))?;
            let chain = system
                .chain(residue.chain_id)
                .ok_or_else(|| PdbError::Inconsistency("Dangling chain ID".into()))?;
            let position = structure.position(atom_id).ok_or_else(|| {
                PdbError::Inconsistency(format!(
                    "Model {} is missing coordinates for atom '{}'",
                    model_index, atom.name
                ))
            })?;

            if let Some(prev) = last_chain
                && prev != chain.id
            {
                writeln!(writer, "TER")?;
            }
            last_chain = Some(chain.id);

            // Names shorter than four characters start at column 14.
            let name_field = if atom.name.len() >= 4 {
                atom.name.clone()
            } else {
                format!(" {}", atom.name)
            };
            let deviation = structure.deviation(atom_id).unwrap_or(0.0);
            writeln!(
                writer,
                "ATOM  {:>5} {:<4} {:<3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                atom.serial,
                name_field,
                residue.name,
                chain.id,
                residue.id,
                position.x,
                position.y,
                position.z,
                1.0,
                deviation,
                atom.element,
            )?;
        }
        writeln!(writer, "TER")?;
        writeln!(writer, "END")?;
        Ok(())
    }

    fn read_records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<AtomRecord>, PdbError> {
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_records(&mut reader)
    }

    /// Parses ATOM/HETATM records up to the first END/ENDMDL. Each file
    /// carries exactly one model; trailing models are ignored.
    fn read_records(reader: &mut impl BufRead) -> Result<Vec<AtomRecord>, PdbError> {
        let mut records = Vec::new();

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "ATOM" | "HETATM" => records.push(parse_atom_record(&line, line_num)?),
                "END" | "ENDMDL" => break,
                _ => {}
            }
        }

        Ok(records)
    }
}

fn parse_atom_record(line: &str, line_num: usize) -> Result<AtomRecord, PdbError> {
    if line.len() < 54 {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::LineTooShort,
        });
    }

    let serial_str = slice_and_trim(line, 6, 11);
    let name_str = slice_and_trim(line, 12, 16);
    let res_name_str = slice_and_trim(line, 17, 20);
    let chain_id_str = slice_and_trim(line, 21, 22);
    let res_seq_str = slice_and_trim(line, 22, 26);
    let x_str = slice_and_trim(line, 30, 38);
    let y_str = slice_and_trim(line, 38, 46);
    let z_str = slice_and_trim(line, 46, 54);
    let element_str = slice_and_trim(line, 76, 78);

    if name_str.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "13-16".into(),
            },
        });
    }
    if res_name_str.is_empty() {
        return Err(PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::MissingRequiredField {
                columns: "18-20".into(),
            },
        });
    }

    let serial: usize = serial_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "7-11".into(),
            value: serial_str.into(),
        },
    })?;
    let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: "23-26".into(),
            value: res_seq_str.into(),
        },
    })?;

    let parse_coord = |value: &str, columns: &str| -> Result<f64, PdbError> {
        value.parse().map_err(|_| PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::InvalidFloat {
                columns: columns.into(),
                value: value.into(),
            },
        })
    };
    let x = parse_coord(x_str, "31-38")?;
    let y = parse_coord(y_str, "39-46")?;
    let z = parse_coord(z_str, "47-54")?;

    // Blank chain column binds the atom to the default chain 'A', the same
    // default the selection grammar uses.
    let chain_id = chain_id_str.chars().next().unwrap_or('A');

    Ok(AtomRecord {
        serial,
        name: name_str.to_string(),
        res_name: res_name_str.to_string(),
        chain_id,
        res_seq,
        position: Point3::new(x, y, z),
        element: element_str.to_string(),
    })
}

/// Builds the shared topology and model 0 from the first file's records,
/// returning atom IDs in record order for overlaying later models.
fn build_topology(records: &[AtomRecord]) -> (MolecularSystem, Vec<AtomId>, Structure) {
    let mut system = MolecularSystem::new();
    let mut atom_order = Vec::with_capacity(records.len());
    let mut model = Structure::new(0);

    for record in records {
        let chain_id = system.add_chain(record.chain_id, ChainType::Other);
        // add_residue only fails for a dangling chain ID, which add_chain
        // just produced.
        let residue_id = system
            .add_residue(chain_id, record.res_seq, &record.res_name)
            .unwrap_or_default();
        let mut atom = Atom::new(&record.name, residue_id, record.serial);
        atom.element = record.element.clone();
        if let Some(atom_id) = system.add_atom_to_residue(residue_id, atom) {
            atom_order.push(atom_id);
            model.set_position(atom_id, record.position);
        }
    }

    classify_chains(&mut system);
    (system, atom_order, model)
}

/// Assigns chain types from residue names: any amino acid makes the chain a
/// protein, otherwise any nucleotide makes it a nucleic acid.
fn classify_chains(system: &mut MolecularSystem) {
    let assignments: Vec<_> = system
        .chains_iter()
        .map(|(chain_id, chain)| {
            let mut chain_type = ChainType::Other;
            for &residue_id in chain.residues() {
                if let Some(residue) = system.residue(residue_id) {
                    match residue_class(&residue.name) {
                        ResidueClass::AminoAcid => {
                            chain_type = ChainType::Protein;
                            break;
                        }
                        ResidueClass::Nucleotide => chain_type = ChainType::NucleicAcid,
                        ResidueClass::Other => {}
                    }
                }
            }
            (chain_id, chain_type)
        })
        .collect();

    for (chain_id, chain_type) in assignments {
        if let Some(chain) = system.chain_mut(chain_id) {
            chain.chain_type = chain_type;
        }
    }
}

fn overlay_model(
    system: &MolecularSystem,
    atom_order: &[AtomId],
    records: &[AtomRecord],
    model_id: usize,
    path: &Path,
) -> Result<Structure, PdbError> {
    if records.len() != atom_order.len() {
        return Err(PdbError::TopologyMismatch {
            path: path.to_path_buf(),
            detail: format!(
                "expected {} atoms, found {}",
                atom_order.len(),
                records.len()
            ),
        });
    }

    let mut structure = Structure::new(model_id);
    for (record, &atom_id) in records.iter().zip(atom_order) {
        let atom = system
            .atom(atom_id)
            .ok_or_else(|| PdbError::Inconsistency("Dangling atom ID".into()))?;
        let residue = system
            .residue(atom.residue_id)
            .ok_or_else(|| PdbError::Inconsistency("Dangling residue ID".into()))?;
        let chain = system
            .chain(residue.chain_id)
            .ok_or_else(|| PdbError::Inconsistency("Dangling chain ID".into()))?;

        if atom.name != record.name
            || residue.id != record.res_seq
            || residue.name != record.res_name
            || chain.id != record.chain_id
        {
            return Err(PdbError::TopologyMismatch {
                path: path.to_path_buf(),
                detail: format!(
                    "atom {} is {}:{}{}/{}, expected {}:{}{}/{}",
                    record.serial,
                    record.chain_id,
                    record.res_name,
                    record.res_seq,
                    record.name,
                    chain.id,
                    residue.name,
                    residue.id,
                    atom.name,
                ),
            });
        }

        structure.set_position(atom_id, record.position);
    }

    Ok(structure)
}
