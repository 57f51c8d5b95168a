use crate::core::io::mol2::read_net_charge_from_path;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::RecordType;
use crate::core::models::structure::Structure;
use crate::core::utils::identifiers::unit_name_from_prefix;
use crate::core::utils::paths::{base_name, derived_path, extension, free_path, remove_if_exists};
use crate::engine::assembler::{PreparedStructure, assemble_system};
use crate::engine::classifier::classify;
use crate::engine::config::{ConfigError, PrepConfig};
use crate::engine::derivation::{DerivationRequest, DerivedLibrary, derive};
use crate::engine::error::EngineError;
use crate::engine::leap::{LeapScript, Solvation};
use crate::engine::matcher::{LibraryMatcher, MatchRecord, ResolvedLibraries};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::review::{ReviewDecision, ReviewGate};
use crate::engine::stages::{DeckParameters, Stage, StagePlan, write_control_deck};
use crate::engine::tools::{Collaborators, ToolError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Name of the tLEaP unit holding the assembled system.
const SYSTEM_UNIT: &str = "complex";

/// A unit parameterized by the derivation fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedUnit {
    pub unit: String,
    pub net_charge: i32,
    pub library: DerivedLibrary,
}

/// What happened to one input structure.
#[derive(Debug, Clone)]
pub struct StructureReport {
    pub input: PathBuf,
    /// The file that represents the structure in the assembled system.
    pub prepared: PathBuf,
    pub is_protein: bool,
    pub nonstandard: BTreeSet<String>,
    pub matches: Vec<MatchRecord>,
    pub derived: Option<DerivedUnit>,
}

#[derive(Debug, Clone)]
pub struct PreparationResult {
    pub structures: Vec<StructureReport>,
    pub libraries: ResolvedLibraries,
    pub system: PathBuf,
    pub topology: PathBuf,
    pub coordinates: PathBuf,
    pub stages_run: Vec<Stage>,
    /// Rendered control decks, including the production deck when it was not run.
    pub control_decks: Vec<PathBuf>,
}

fn run_tool<T>(
    reporter: &ProgressReporter,
    tool: &'static str,
    f: impl FnOnce() -> Result<T, ToolError>,
) -> Result<T, EngineError> {
    reporter.report(Progress::ToolStart { tool });
    let result = f();
    reporter.report(Progress::ToolFinish);
    Ok(result?)
}

fn read_pdb(path: &Path) -> Result<Structure, EngineError> {
    PdbFile::read_from_path(path)
        .map(|(structure, _)| structure)
        .map_err(EngineError::pdb(path))
}

fn write_pdb(structure: &Structure, path: &Path) -> Result<(), EngineError> {
    PdbFile::write_structure_to_path(structure, path).map_err(EngineError::pdb(path))
}

fn output_path(path: PathBuf, overwrite: bool) -> PathBuf {
    if overwrite { path } else { free_path(&path) }
}

/// Runs the complete preparation pipeline.
///
/// Structures are processed strictly in input order and every external tool call blocks
/// until it finishes; the first failure aborts the run.
///
/// # Errors
///
/// Returns [`EngineError`] for missing inputs, unresolvable units, external tool failures,
/// an aborted review, or I/O and parse failures of intermediate files.
#[instrument(skip_all, name = "prepare_workflow")]
pub fn run(
    config: &PrepConfig,
    tools: Collaborators<'_>,
    review: &ReviewGate,
    reporter: &ProgressReporter,
) -> Result<PreparationResult, EngineError> {
    let work_dir =
        std::path::absolute(&config.pipeline.work_dir).map_err(EngineError::io(&config.pipeline.work_dir))?;

    // === Phase 1: Read inputs ===
    reporter.report(Progress::PhaseStart { name: "Reading" });
    let mut inputs = Vec::with_capacity(config.structures.len());
    for input in &config.structures {
        let (path, structure) = load_input(input, &work_dir, config, tools, reporter)?;
        inputs.push((input.clone(), path, structure));
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Resolve libraries and derive missing parameters ===
    reporter.report(Progress::PhaseStart {
        name: "Resolving",
    });
    let matcher = LibraryMatcher::new(&config.libraries, &work_dir);
    let mut unit_labels = config.libraries.user_prefixes.iter();
    let mut resolved = ResolvedLibraries::new();
    let mut prepared = Vec::with_capacity(inputs.len());
    let mut reports = Vec::with_capacity(inputs.len());

    for (input, mut path, mut structure) in inputs {
        let base = base_name(&path);
        let nonstandard = classify(&structure, &config.force_field.vocabulary);
        let (state, matches) = matcher.resolve_structure(&structure, &nonstandard, resolved)?;
        resolved = state.resolved;
        let orphaned = state.orphaned;
        let is_protein = structure.is_protein();

        if is_protein && !orphaned.is_empty() {
            return Err(EngineError::UnresolvedProteinUnits {
                structure: base,
                units: orphaned.into_iter().collect(),
            });
        }

        if is_protein && !config.pipeline.keep_hydrogens {
            let normalized = derived_path(&work_dir, &base, "_amber.pdb");
            let diagnostics = run_tool(reporter, "pdb4amber", || {
                tools.normalizer.normalize(&path, &normalized)
            })?;
            for line in &diagnostics {
                reporter.report(Progress::Message(line.clone()));
            }
            if review.confirm(&base, &diagnostics) == ReviewDecision::Abort {
                return Err(EngineError::ReviewAborted { structure: base });
            }
            structure = read_pdb(&normalized)?;
            path = normalized;
        }

        if orphaned.len() > 1 {
            return Err(EngineError::MultipleLigands {
                structure: base,
                units: orphaned.into_iter().collect(),
            });
        }

        let mut derived = None;
        if let Some(orphan) = orphaned.into_iter().next() {
            let unit = unit_labels
                .next()
                .map(|prefix| unit_name_from_prefix(prefix))
                .unwrap_or(orphan);
            let (ligand_path, ligand) =
                prepare_ligand(structure, &unit, &base, &work_dir, config, tools, reporter)?;

            let mol2 = derived_path(&work_dir, &base, "_amber.mol2");
            run_tool(reporter, "obabel", || tools.converter.convert(&ligand_path, &mol2))?;
            let net_charge = read_net_charge_from_path(&mol2).map_err(|source| EngineError::Mol2 {
                path: mol2.clone(),
                source,
            })?;

            let request = DerivationRequest {
                structure: &ligand_path,
                net_charge,
                unit_name: &unit,
                force_field: &config.force_field.leaprc(),
                work_dir: &work_dir,
                base: &base,
            };
            reporter.report(Progress::ToolStart { tool: "antechamber" });
            let library = derive(&request, tools.deriver, tools.topology);
            reporter.report(Progress::ToolFinish);
            let library = library?;
            for lib in library.paths() {
                resolved.insert(lib.to_path_buf());
            }

            structure = ligand;
            path = ligand_path;
            derived = Some(DerivedUnit {
                unit,
                net_charge,
                library,
            });
        }

        reports.push(StructureReport {
            input,
            prepared: path.clone(),
            is_protein,
            nonstandard,
            matches,
            derived,
        });
        prepared.push(PreparedStructure { path, structure });
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Assemble and build the topology ===
    reporter.report(Progress::PhaseStart {
        name: "Building topology",
    });
    let system = assemble_system(&prepared, &work_dir, &config.pipeline.out_name)?
        .ok_or(EngineError::Config(ConfigError::MissingParameter("structures")))?;
    let base = base_name(&system);
    let plan = StagePlan::new(&work_dir, &base);

    let mut script = LeapScript::new(&config.force_field.leaprc())
        .load_libraries(resolved.iter())?
        .load_unit(SYSTEM_UNIT, &system)?;
    if let Some(solvent) = &config.solvent {
        script = script.solvate(
            SYSTEM_UNIT,
            &Solvation {
                water_model: solvent.water_model.clone(),
                distance: solvent.distance,
            },
        );
    }
    let script = script.save_amber_parm(SYSTEM_UNIT, &plan.topology(), &plan.coordinates());
    let script_path = derived_path(&work_dir, &base, ".tleap");
    run_tool(reporter, "tleap", || tools.topology.build(&script, &script_path))?;
    info!(topology = %plan.topology().display(), "Topology and coordinates written");
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Staged MD ===
    let mut stages_run = Vec::new();
    let mut control_decks = Vec::new();
    if !config.pipeline.parm_only {
        reporter.report(Progress::PhaseStart { name: "Simulating" });
        let deck_dir = config
            .simulation
            .control_deck_dir
            .clone()
            .unwrap_or_else(|| work_dir.clone());
        let params = DeckParameters {
            temperature: config.simulation.temperature,
            restrained_residues: prepared
                .iter()
                .map(|p| p.structure.polymer_residue_count())
                .sum(),
            production_length_ns: config.simulation.production_length_ns,
            keep_velocities: config.simulation.keep_velocities,
            coord_dump_freq: config.simulation.coord_dump_freq,
        };

        let stages: Vec<_> = Stage::ALL.iter().map(|&stage| plan.files(stage)).collect();
        for files in &stages {
            write_control_deck(&deck_dir, &plan, files, &params)?;
            control_decks.push(files.control.clone());
        }
        for files in &stages {
            if files.stage.is_production() && !config.pipeline.run_production {
                continue;
            }
            info!(stage = %files.stage, "Running MD stage");
            run_tool(reporter, "pmemd", || tools.stages.run_stage(files))?;
            stages_run.push(files.stage);
        }
        reporter.report(Progress::PhaseFinish);
    }

    Ok(PreparationResult {
        structures: reports,
        libraries: resolved,
        system,
        topology: plan.topology(),
        coordinates: plan.coordinates(),
        stages_run,
        control_decks,
    })
}

/// Checks that `input` exists, converts it to PDB when needed, and parses it.
fn load_input(
    input: &Path,
    work_dir: &Path,
    config: &PrepConfig,
    tools: Collaborators<'_>,
    reporter: &ProgressReporter,
) -> Result<(PathBuf, Structure), EngineError> {
    let input = std::path::absolute(input).map_err(EngineError::io(input))?;
    if !input.is_file() {
        return Err(EngineError::MissingInput { path: input });
    }

    let path = if extension(&input).as_deref() == Some("pdb") {
        input
    } else {
        let converted = output_path(
            derived_path(work_dir, &base_name(&input), ".pdb"),
            config.pipeline.overwrite,
        );
        info!(input = %input.display(), output = %converted.display(), "Converting input to PDB");
        run_tool(reporter, "obabel", || tools.converter.convert(&input, &converted))?;
        converted
    };

    let mut structure = read_pdb(&path)?;
    if !structure.is_protein() && !structure.has_unique_atom_names() {
        warn!(structure = %path.display(), "Atom names are not unique; renaming atoms");
        structure.rename_atoms();
    }
    Ok((path, structure))
}

/// Normalizes a single-unit ligand and writes the PDB handed to antechamber.
fn prepare_ligand(
    mut structure: Structure,
    unit: &str,
    base: &str,
    work_dir: &Path,
    config: &PrepConfig,
    tools: Collaborators<'_>,
    reporter: &ProgressReporter,
) -> Result<(PathBuf, Structure), EngineError> {
    let overwrite = config.pipeline.overwrite;
    structure.sanitize();
    structure.set_residue_name(unit);

    let temp = output_path(derived_path(work_dir, base, "_temp.pdb"), overwrite);
    let ligand = output_path(derived_path(work_dir, base, "_amber.pdb"), overwrite);
    remove_if_exists(&ligand).map_err(EngineError::io(&ligand))?;

    if config.pipeline.keep_hydrogens {
        write_pdb(&structure, &ligand)?;
        return Ok((ligand, structure));
    }

    write_pdb(&structure, &temp)?;
    run_tool(reporter, "obabel", || tools.converter.add_hydrogens(&temp, &ligand))?;
    remove_if_exists(&temp).map_err(EngineError::io(&temp))?;

    let mut protonated = read_pdb(&ligand)?;
    protonated.sanitize();
    protonated.set_record_type(RecordType::Hetatm);
    remove_if_exists(&ligand).map_err(EngineError::io(&ligand))?;
    write_pdb(&protonated, &ligand)?;
    Ok((ligand, protonated))
}
