use super::format::LibraryFormat;
use super::off::OffReader;
use super::prep::PrepReader;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unit name to its atom-name set; `None` when the format does not enumerate atoms.
pub type UnitTable = BTreeMap<String, Option<BTreeSet<String>>>;

#[derive(Debug, Error)]
pub enum LibraryLoadError {
    #[error("Failed to read library '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed library on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("'{0}' is not a unit-defining library (expected .lib, .off or .prep)")]
    UnsupportedFormat(PathBuf),
}

/// Parses the unit definitions of one library format.
pub trait UnitTableReader {
    fn read_units(reader: &mut impl BufRead) -> Result<UnitTable, LibraryLoadError>;
}

/// Structured view of what a library file defines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryContents {
    pub format: LibraryFormat,
    pub units: UnitTable,
}

impl LibraryContents {
    pub fn read(
        format: LibraryFormat,
        reader: &mut impl BufRead,
    ) -> Result<Self, LibraryLoadError> {
        let units = match format {
            LibraryFormat::ObjectFile => OffReader::read_units(reader)?,
            LibraryFormat::Prep => PrepReader::read_units(reader)?,
            LibraryFormat::Frcmod | LibraryFormat::Mol2 | LibraryFormat::Pdb => UnitTable::new(),
        };
        Ok(Self { format, units })
    }

    pub fn unit_names(&self) -> BTreeSet<String> {
        self.units.keys().cloned().collect()
    }

    pub fn defines(&self, unit: &str) -> bool {
        self.units.contains_key(unit)
    }

    /// Atom names of `unit`; `None` if the unit is undefined or the format has no atom detail.
    pub fn atom_names(&self, unit: &str) -> Option<&BTreeSet<String>> {
        self.units.get(unit).and_then(|atoms| atoms.as_ref())
    }
}

/// A library file on disk together with its parsed contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySource {
    pub path: PathBuf,
    pub contents: LibraryContents,
}

impl LibrarySource {
    pub fn load(path: &Path) -> Result<Self, LibraryLoadError> {
        let format = LibraryFormat::from_path(path)
            .filter(|f| f.defines_units())
            .ok_or_else(|| LibraryLoadError::UnsupportedFormat(path.to_path_buf()))?;
        let file = File::open(path).map_err(|source| LibraryLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let contents = LibraryContents::read(format, &mut reader).map_err(|e| match e {
            LibraryLoadError::Io { source, .. } => LibraryLoadError::Io {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            contents,
        })
    }

    /// The parameter modification file that accompanies this library, by naming convention.
    pub fn companion_frcmod(&self) -> PathBuf {
        self.path.with_extension("frcmod")
    }
}

pub(crate) fn read_line_error(error: io::Error) -> LibraryLoadError {
    LibraryLoadError::Io {
        path: PathBuf::new(),
        source: error,
    }
}
