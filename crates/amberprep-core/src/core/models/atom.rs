use super::ids::ResidueId;
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The PDB record type an atom is written with.
///
/// Polymer atoms are conventionally `ATOM` records while ligands, ions and other
/// non-polymer units use `HETATM`. tLEaP and antechamber both look at this field, so the
/// preparation pipeline rewrites it for units it parameterizes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RecordType {
    /// Standard polymer record (`ATOM`).
    #[default]
    Atom,
    /// Heteroatom record (`HETATM`).
    Hetatm,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid record type '{0}'; expected ATOM or HETATM")]
pub struct ParseRecordTypeError(pub String);

impl FromStr for RecordType {
    type Err = ParseRecordTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ATOM" => Ok(RecordType::Atom),
            "HETATM" => Ok(RecordType::Hetatm),
            _ => Err(ParseRecordTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecordType::Atom => "ATOM",
            RecordType::Hetatm => "HETATM",
        })
    }
}

/// A single atom record of a structure.
///
/// The fields mirror what a PDB coordinate record carries and what the preparation
/// pipeline needs when it renames atoms, rewrites record types, or composes several
/// structures into one system.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number from the source file (columns 7-11 in PDB).
    pub serial: usize,
    /// The atom name (e.g., "CA", "C1", "H12").
    pub name: String,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// Element symbol, empty when the source file did not provide one.
    pub element: String,
    /// Cartesian coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Record type the atom is written with.
    pub record_type: RecordType,
    /// Occupancy (PDB columns 55-60).
    pub occupancy: f64,
    /// Temperature factor (PDB columns 61-66).
    pub temp_factor: f64,
}

impl Atom {
    /// Creates a new `Atom` with unit occupancy and a zero temperature factor.
    ///
    /// # Arguments
    ///
    /// * `serial` - The serial number of the atom.
    /// * `name` - The name of the atom.
    /// * `residue_id` - The ID of the residue this atom belongs to.
    /// * `position` - The 3D coordinates of the atom.
    pub fn new(serial: usize, name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            residue_id,
            element: String::new(),
            position,
            record_type: RecordType::default(),
            occupancy: 1.0,
            temp_factor: 0.0,
        }
    }

    /// Returns the element symbol, falling back to the one implied by the atom name.
    ///
    /// Names such as `C12` or `1HB` carry the element as their first alphabetic character;
    /// two-letter halogens are recognized explicitly since they are common in ligands.
    pub fn element_or_inferred(&self) -> String {
        if !self.element.is_empty() {
            return self.element.clone();
        }
        infer_element(&self.name)
    }
}

pub(crate) fn infer_element(atom_name: &str) -> String {
    let letters: String = atom_name
        .trim()
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let upper = letters.to_ascii_uppercase();
    for two_letter in ["CL", "BR"] {
        if upper.starts_with(two_letter) {
            return format!("{}{}", &two_letter[..1], &two_letter[1..].to_ascii_lowercase());
        }
    }
    upper.chars().next().map(String::from).unwrap_or_default()
}
