use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::utils::identifiers::unit_name_from_prefix;
use crate::core::utils::paths::extension;
use crate::engine::classifier::classify;
use crate::engine::config::PrepConfig;
use crate::engine::error::EngineError;
use crate::engine::matcher::{LibraryMatcher, MatchRecord, ResolvedLibraries};
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, instrument};

/// What the preparation workflow would do with one structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every non-standard unit is covered by a library.
    Ready,
    /// The single orphaned unit would be parameterized under `unit`.
    NeedsDerivation { unit: String },
    UnresolvedProteinUnits { units: Vec<String> },
    MultipleLigands { units: Vec<String> },
    /// The input is not PDB; it cannot be inspected without running a converter.
    NeedsConversion,
}

impl Verdict {
    /// Whether the preparation workflow would get past this structure.
    pub fn is_preparable(&self) -> bool {
        matches!(
            self,
            Verdict::Ready | Verdict::NeedsDerivation { .. } | Verdict::NeedsConversion
        )
    }
}

#[derive(Debug, Clone)]
pub struct SurveyEntry {
    pub input: PathBuf,
    pub is_protein: bool,
    pub nonstandard: BTreeSet<String>,
    pub matches: Vec<MatchRecord>,
    pub orphaned: BTreeSet<String>,
    pub verdict: Verdict,
}

#[derive(Debug, Clone)]
pub struct SurveyReport {
    pub entries: Vec<SurveyEntry>,
    /// Libraries the matcher resolved across all structures, in load order.
    pub libraries: ResolvedLibraries,
}

impl SurveyReport {
    pub fn is_preparable(&self) -> bool {
        self.entries.iter().all(|e| e.verdict.is_preparable())
    }
}

/// Classifies every structure and matches its non-standard units against the available
/// libraries, stopping short of any external program.
///
/// Unlike the preparation workflow, an unresolvable structure does not stop the survey;
/// its problem is recorded in its [`Verdict`].
#[instrument(skip_all, name = "survey_workflow")]
pub fn run(config: &PrepConfig, reporter: &ProgressReporter) -> Result<SurveyReport, EngineError> {
    reporter.report(Progress::PhaseStart { name: "Surveying" });
    let work_dir = std::path::absolute(&config.pipeline.work_dir)
        .map_err(EngineError::io(&config.pipeline.work_dir))?;
    let matcher = LibraryMatcher::new(&config.libraries, &work_dir);
    let mut unit_labels = config.libraries.user_prefixes.iter();
    let mut resolved = ResolvedLibraries::new();
    let mut entries = Vec::with_capacity(config.structures.len());

    for input in &config.structures {
        if !input.is_file() {
            return Err(EngineError::MissingInput {
                path: input.clone(),
            });
        }
        if extension(input).as_deref() != Some("pdb") {
            entries.push(SurveyEntry {
                input: input.clone(),
                is_protein: false,
                nonstandard: BTreeSet::new(),
                matches: Vec::new(),
                orphaned: BTreeSet::new(),
                verdict: Verdict::NeedsConversion,
            });
            continue;
        }

        let (mut structure, _) = PdbFile::read_from_path(input).map_err(EngineError::pdb(input))?;
        if !structure.is_protein() && !structure.has_unique_atom_names() {
            structure.rename_atoms();
        }
        let nonstandard = classify(&structure, &config.force_field.vocabulary);
        let (state, matches) = matcher.resolve_structure(&structure, &nonstandard, resolved)?;
        resolved = state.resolved;
        let orphaned = state.orphaned;
        let is_protein = structure.is_protein();

        let verdict = if is_protein && !orphaned.is_empty() {
            Verdict::UnresolvedProteinUnits {
                units: orphaned.iter().cloned().collect(),
            }
        } else if orphaned.len() > 1 {
            Verdict::MultipleLigands {
                units: orphaned.iter().cloned().collect(),
            }
        } else if let Some(orphan) = orphaned.first() {
            let unit = unit_labels
                .next()
                .map(|prefix| unit_name_from_prefix(prefix))
                .unwrap_or_else(|| orphan.clone());
            Verdict::NeedsDerivation { unit }
        } else {
            Verdict::Ready
        };
        info!(structure = %input.display(), verdict = ?verdict, "Surveyed structure");

        entries.push(SurveyEntry {
            input: input.clone(),
            is_protein,
            nonstandard,
            matches,
            orphaned,
            verdict,
        });
    }

    reporter.report(Progress::PhaseFinish);
    Ok(SurveyReport {
        entries,
        libraries: resolved,
    })
}
