use crate::core::library::contents::{LibraryContents, LibraryLoadError};
use crate::core::library::format::LibraryFormat;
use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("Failed to read force field definition '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse library '{path}' loaded by the force field: {source}")]
    Library {
        path: PathBuf,
        #[source]
        source: LibraryLoadError,
    },
}

/// Residue names with built-in parameters in the selected force field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardVocabulary {
    names: BTreeSet<String>,
}

impl StandardVocabulary {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Collects every unit loaded by a tLEaP force field definition.
    ///
    /// `loadOff` and `loadAmberPrep` directives are resolved against `<leap_dir>/lib` and
    /// `<leap_dir>/prep`; `source` directives are followed recursively through
    /// `<leap_dir>/cmd`. Referenced files that cannot be found are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`VocabularyError::Io`] if the top-level definition cannot be read and
    /// [`VocabularyError::Library`] if a referenced library exists but is malformed.
    pub fn from_leaprc(definition: &Path, leap_dir: &Path) -> Result<Self, VocabularyError> {
        let mut vocabulary = Self::default();
        let mut visited = HashSet::new();
        vocabulary.collect_leaprc(definition, leap_dir, &mut visited)?;
        Ok(vocabulary)
    }

    fn collect_leaprc(
        &mut self,
        definition: &Path,
        leap_dir: &Path,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<(), VocabularyError> {
        if !visited.insert(definition.to_path_buf()) {
            return Ok(());
        }
        let file = File::open(definition).map_err(|source| VocabularyError::Io {
            path: definition.to_path_buf(),
            source,
        })?;

        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| VocabularyError::Io {
                path: definition.to_path_buf(),
                source,
            })?;
            let Some((command, argument)) = parse_directive(&line) else {
                continue;
            };
            match command.as_str() {
                "source" => match resolve(argument, &leap_dir.join("cmd")) {
                    Some(nested) => self.collect_leaprc(&nested, leap_dir, visited)?,
                    None => warn!(file = argument, "Sourced force field file not found"),
                },
                "loadoff" | "loadamberprep" => {
                    let subdir = if command == "loadoff" { "lib" } else { "prep" };
                    match resolve(argument, &leap_dir.join(subdir)) {
                        Some(path) => self.collect_library(&path)?,
                        None => warn!(file = argument, "Force field library not found"),
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn collect_library(&mut self, path: &Path) -> Result<(), VocabularyError> {
        let format = LibraryFormat::from_path(path).unwrap_or(LibraryFormat::ObjectFile);
        let file = File::open(path).map_err(|source| VocabularyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let contents = LibraryContents::read(format, &mut BufReader::new(file)).map_err(
            |source| VocabularyError::Library {
                path: path.to_path_buf(),
                source,
            },
        )?;
        debug!(
            library = %path.display(),
            units = contents.units.len(),
            "Collected standard units"
        );
        self.names.extend(contents.unit_names());
        Ok(())
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Splits a leaprc line into a lower-cased command and its first argument, skipping
/// comments and an optional `name =` assignment prefix.
fn parse_directive(line: &str) -> Option<(String, &str)> {
    let line = line.split('#').next().unwrap_or("").trim();
    let line = match line.split_once('=') {
        Some((_, rhs)) => rhs.trim(),
        None => line,
    };
    let mut tokens = line.split_whitespace();
    let command = tokens.next()?.to_ascii_lowercase();
    let argument = tokens.next()?.trim_matches('"');
    Some((command, argument))
}

fn resolve(argument: &str, search_dir: &Path) -> Option<PathBuf> {
    let direct = PathBuf::from(argument);
    if direct.is_file() {
        return Some(direct);
    }
    let candidate = search_dir.join(argument);
    candidate.is_file().then_some(candidate)
}
