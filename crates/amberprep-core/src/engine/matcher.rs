//! Library matching: which parameter libraries supply the non-standard units of a structure.
//!
//! Matching is a sequence of explicit state transitions. [`resolve`] takes the current
//! [`MatchState`] and one candidate library and returns the next state together with a
//! [`MatchOutcome`] describing what happened. Candidates are tried in priority order
//! (user-provided prefixes before libraries found in the working directory, and in the
//! order found within each tier), so the first library to claim a unit keeps it unless a
//! later candidate is forced.

use super::config::LibraryConfig;
use super::error::EngineError;
use crate::core::library::contents::LibrarySource;
use crate::core::library::format::UNIT_LIBRARY_EXTENSIONS;
use crate::core::models::structure::Structure;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Library files chosen for the system, in the order they were accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLibraries {
    paths: Vec<PathBuf>,
}

impl ResolvedLibraries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path` unless it is already present; returns whether it was added.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchState {
    pub resolved: ResolvedLibraries,
    pub orphaned: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The candidate defines none of the target units.
    NoMatch,
    /// A matched unit's atom names differ from the structure's; all matches were discarded.
    AtomMismatch { units: BTreeSet<String> },
    /// The candidate cannot be checked at atom level and was not forced.
    Unverified { units: BTreeSet<String> },
    /// Every matched unit was already resolved by an earlier candidate.
    SkippedRedefinition { units: BTreeSet<String> },
    /// The candidate was added to the resolved set.
    Accepted {
        units: BTreeSet<String>,
        redefinition: bool,
        companion: Option<PathBuf>,
    },
}

/// Tries one candidate library against the target units of `structure`.
///
/// `targets` are the structure's non-standard units; `state.orphaned` is the subset not yet
/// claimed by a library. With `force`, a candidate lacking atom-level detail is trusted and
/// a candidate redefining already-resolved units is accepted anyway.
pub fn resolve(
    candidate: &LibrarySource,
    mut state: MatchState,
    targets: &BTreeSet<String>,
    structure: &Structure,
    force: bool,
) -> (MatchState, MatchOutcome) {
    let matches: BTreeSet<String> = targets
        .iter()
        .filter(|unit| candidate.contents.defines(unit))
        .cloned()
        .collect();
    if matches.is_empty() {
        return (state, MatchOutcome::NoMatch);
    }

    for unit in &matches {
        match candidate.contents.atom_names(unit) {
            Some(library_atoms) => {
                if *library_atoms != structure.atom_names_of(unit) {
                    return (state, MatchOutcome::AtomMismatch { units: matches });
                }
            }
            None if !force => return (state, MatchOutcome::Unverified { units: matches }),
            None => {}
        }
    }

    let redefinition = matches.is_disjoint(&state.orphaned);
    if redefinition && !force {
        return (state, MatchOutcome::SkippedRedefinition { units: matches });
    }

    state.resolved.insert(candidate.path.clone());
    let frcmod = candidate.companion_frcmod();
    let companion = frcmod.is_file().then(|| {
        state.resolved.insert(frcmod.clone());
        frcmod
    });
    state.orphaned.retain(|unit| !matches.contains(unit));

    (
        state,
        MatchOutcome::Accepted {
            units: matches,
            redefinition,
            companion,
        },
    )
}

fn with_appended_extension(prefix: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// `P.lib`, `P.off` and `P.prep` for every prefix `P`, where they exist.
pub fn user_candidates(prefixes: &[PathBuf]) -> Vec<PathBuf> {
    prefixes
        .iter()
        .flat_map(|prefix| {
            UNIT_LIBRARY_EXTENSIONS
                .iter()
                .map(move |ext| with_appended_extension(prefix, ext))
        })
        .filter(|path| path.is_file())
        .collect()
}

/// Unit-defining libraries in `dir`, grouped by extension priority and sorted by name.
pub fn local_candidates(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(EngineError::io(dir))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    Ok(UNIT_LIBRARY_EXTENSIONS
        .iter()
        .flat_map(|ext| {
            files
                .iter()
                .filter(move |path| {
                    path.extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e == *ext)
                })
                .cloned()
        })
        .collect())
}

fn log_outcome(path: &Path, outcome: &MatchOutcome) {
    let join = |units: &BTreeSet<String>| units.iter().cloned().collect::<Vec<_>>().join(" ");
    match outcome {
        MatchOutcome::NoMatch => {}
        MatchOutcome::AtomMismatch { units } => debug!(
            library = %path.display(),
            units = %join(units),
            "Library atom names do not match the structure; ignoring"
        ),
        MatchOutcome::Unverified { units } => debug!(
            library = %path.display(),
            units = %join(units),
            "Library lacks atom names and is not forced; ignoring"
        ),
        MatchOutcome::SkippedRedefinition { units } => warn!(
            library = %path.display(),
            units = %join(units),
            "Units defined previously; skipping to avoid redefinition"
        ),
        MatchOutcome::Accepted {
            units,
            redefinition: true,
            ..
        } => warn!(
            library = %path.display(),
            units = %join(units),
            "Units defined previously; adding user-provided library but redefinition may cause problems"
        ),
        MatchOutcome::Accepted { units, .. } => info!(
            library = %path.display(),
            units = %join(units),
            "Resolved units from library"
        ),
    }
}

/// One candidate library and what matching it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub library: PathBuf,
    pub outcome: MatchOutcome,
}

/// Runs both candidate tiers for one structure.
pub struct LibraryMatcher<'a> {
    config: &'a LibraryConfig,
    work_dir: &'a Path,
}

impl<'a> LibraryMatcher<'a> {
    pub fn new(config: &'a LibraryConfig, work_dir: &'a Path) -> Self {
        Self { config, work_dir }
    }

    /// Matches the non-standard units `targets` of `structure`, starting from the libraries
    /// already resolved for earlier structures.
    ///
    /// # Errors
    ///
    /// Returns an error if a user-provided library cannot be parsed or the working directory
    /// cannot be listed. Malformed files found by the directory scan are skipped.
    pub fn resolve_structure(
        &self,
        structure: &Structure,
        targets: &BTreeSet<String>,
        resolved: ResolvedLibraries,
    ) -> Result<(MatchState, Vec<MatchRecord>), EngineError> {
        let mut state = MatchState {
            resolved,
            orphaned: targets.clone(),
        };
        let mut records = Vec::new();
        if targets.is_empty() {
            return Ok((state, records));
        }

        for path in user_candidates(&self.config.user_prefixes) {
            let source = LibrarySource::load(&path)?;
            let (next, outcome) = resolve(
                &source,
                state,
                targets,
                structure,
                self.config.force_user_libraries,
            );
            state = next;
            log_outcome(&path, &outcome);
            records.push(MatchRecord {
                library: path,
                outcome,
            });
        }

        if self.config.search_local {
            for path in local_candidates(self.work_dir)? {
                if state.orphaned.is_empty() {
                    break;
                }
                let source = match LibrarySource::load(&path) {
                    Ok(source) => source,
                    Err(e) => {
                        warn!(library = %path.display(), error = %e, "Skipping unreadable local library");
                        continue;
                    }
                };
                let (next, outcome) = resolve(&source, state, targets, structure, false);
                state = next;
                log_outcome(&path, &outcome);
                records.push(MatchRecord {
                    library: path,
                    outcome,
                });
            }
        }

        Ok((state, records))
    }
}
