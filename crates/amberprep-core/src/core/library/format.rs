use phf::{Map, phf_map};
use std::fmt;
use std::path::Path;

/// File formats tLEaP can load, determined by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LibraryFormat {
    /// Object file library (`.lib` or `.off`); names units and enumerates their atoms.
    ObjectFile,
    /// Residue topology file (`.prep`); names units only, as far as matching is concerned.
    Prep,
    /// Parameter modification file (`.frcmod`).
    Frcmod,
    /// Tripos MOL2 unit template.
    Mol2,
    /// Coordinate file.
    Pdb,
}

static EXTENSION_FORMATS: Map<&'static str, LibraryFormat> = phf_map! {
    "lib" => LibraryFormat::ObjectFile,
    "off" => LibraryFormat::ObjectFile,
    "prep" => LibraryFormat::Prep,
    "frcmod" => LibraryFormat::Frcmod,
    "mol2" => LibraryFormat::Mol2,
    "pdb" => LibraryFormat::Pdb,
};

/// Extensions searched for unit-defining libraries, in priority order.
pub const UNIT_LIBRARY_EXTENSIONS: [&str; 3] = ["lib", "off", "prep"];

impl LibraryFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        EXTENSION_FORMATS
            .get(extension.to_ascii_lowercase().as_str())
            .copied()
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// The tLEaP command that loads a file of this format.
    pub fn load_directive(&self) -> &'static str {
        match self {
            LibraryFormat::ObjectFile => "loadoff",
            LibraryFormat::Prep => "loadAmberPrep",
            LibraryFormat::Frcmod => "loadamberparams",
            LibraryFormat::Mol2 => "loadmol2",
            LibraryFormat::Pdb => "loadpdb",
        }
    }

    pub fn defines_units(&self) -> bool {
        matches!(self, LibraryFormat::ObjectFile | LibraryFormat::Prep)
    }

    pub fn enumerates_atoms(&self) -> bool {
        matches!(self, LibraryFormat::ObjectFile)
    }
}

impl fmt::Display for LibraryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LibraryFormat::ObjectFile => "object file",
            LibraryFormat::Prep => "prep",
            LibraryFormat::Frcmod => "frcmod",
            LibraryFormat::Mol2 => "mol2",
            LibraryFormat::Pdb => "pdb",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_is_determined_by_extension() {
        assert_eq!(
            LibraryFormat::from_path(Path::new("lig.lib")),
            Some(LibraryFormat::ObjectFile)
        );
        assert_eq!(
            LibraryFormat::from_path(Path::new("lig.OFF")),
            Some(LibraryFormat::ObjectFile)
        );
        assert_eq!(
            LibraryFormat::from_path(Path::new("dir/lig.prep")),
            Some(LibraryFormat::Prep)
        );
        assert_eq!(
            LibraryFormat::from_path(Path::new("lig.frcmod")),
            Some(LibraryFormat::Frcmod)
        );
        assert_eq!(LibraryFormat::from_path(Path::new("lig.xyz")), None);
        assert_eq!(LibraryFormat::from_path(Path::new("lig")), None);
    }

    #[test]
    fn every_format_maps_to_a_distinct_load_directive() {
        assert_eq!(LibraryFormat::Frcmod.load_directive(), "loadamberparams");
        assert_eq!(LibraryFormat::ObjectFile.load_directive(), "loadoff");
        assert_eq!(LibraryFormat::Prep.load_directive(), "loadAmberPrep");
        assert_eq!(LibraryFormat::Mol2.load_directive(), "loadmol2");
        assert_eq!(LibraryFormat::Pdb.load_directive(), "loadpdb");
    }

    #[test]
    fn only_object_files_enumerate_atoms() {
        assert!(LibraryFormat::ObjectFile.enumerates_atoms());
        assert!(!LibraryFormat::Prep.enumerates_atoms());
        assert!(LibraryFormat::Prep.defines_units());
        assert!(!LibraryFormat::Frcmod.defines_units());
    }
}
