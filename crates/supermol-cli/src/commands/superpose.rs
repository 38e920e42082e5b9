use crate::cli::SuperposeArgs;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use std::ffi::OsString;
use std::path::PathBuf;
use supermol::core::io::pdb::PdbFile;
use supermol::engine::config::SuperposeConfig;
use supermol::engine::progress::ProgressReporter;
use supermol::workflows;
use tracing::info;

pub fn run(args: SuperposeArgs) -> Result<()> {
    let config = SuperposeConfig::builder()
        .include_residues(&args.include_residues)
        .exclude_residues(&args.exclude_residues)
        .include_atoms(&args.include_atoms)
        .exclude_atoms(&args.exclude_atoms)
        .build()?;

    info!("Loading ensemble from {} file(s)...", args.files.len());
    let mut ensemble = PdbFile::load_ensemble(&args.files)?;
    info!(
        "Loaded {} model(s) over {} atoms.",
        ensemble.len(),
        ensemble.system().atom_count()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = workflows::superpose::run(&mut ensemble, &config, &reporter)?;

    // Model numbers are 1-based in user-facing output, matching the order of
    // the input files.
    println!(
        "repModel {} rms {:.3} avgrms {:.3}",
        report.initial.representative.index + 1,
        report.initial.representative.avg_rmsd,
        report.initial.representative.ensemble_avg_rmsd
    );
    if let Some(core) = &report.core {
        let ranges: Vec<String> = core
            .ranges
            .iter()
            .map(|r| format!("{}:{}-{}", r.chain, r.start, r.end))
            .collect();
        println!("coreResidues {}", ranges.join(" "));
        println!(
            "coreRepModel {} rms {:.3} avgrms {:.3}",
            report.final_pass.representative.index + 1,
            report.final_pass.representative.avg_rmsd,
            report.final_pass.representative.ensemble_avg_rmsd
        );
    }

    if args.dry_run {
        info!("Dry run requested; skipping output files.");
        return Ok(());
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    for (index, input) in args.files.iter().enumerate() {
        let output_path = generate_output_path(input, args.output_dir.as_deref(), &args.prefix)?;
        info!("Writing model {} to {:?}", index + 1, &output_path);
        PdbFile::save_structure(&ensemble, index, &output_path).map_err(|source| {
            CliError::FileWriting {
                path: output_path.clone(),
                source,
            }
        })?;
    }
    println!("✓ Wrote {} superposed model(s)", args.files.len());

    Ok(())
}

fn generate_output_path(
    input: &std::path::Path,
    output_dir: Option<&std::path::Path>,
    prefix: &str,
) -> Result<PathBuf> {
    let file_name = input.file_name().ok_or_else(|| {
        CliError::Argument(format!("input path '{}' has no file name", input.display()))
    })?;

    let mut prefixed = OsString::from(prefix);
    prefixed.push(file_name);

    Ok(match output_dir {
        Some(dir) => dir.join(prefixed),
        None => input.with_file_name(prefixed),
    })
}
