//! Reads partial charges back out of Tripos MOL2 files.
//!
//! After Open Babel has assigned Gasteiger charges to a ligand, the net formal charge that
//! antechamber needs is the rounded sum of the per-atom partial charges in the
//! `@<TRIPOS>ATOM` section. Nothing else in the file is interpreted.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Mol2Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("MOL2 file has no @<TRIPOS>ATOM records")]
    MissingAtoms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Atom,
}

/// Collects the partial charge column of every `@<TRIPOS>ATOM` record.
///
/// # Errors
///
/// Returns [`Mol2Error::Parse`] when an atom record has fewer than nine columns or a
/// non-numeric charge, and [`Mol2Error::MissingAtoms`] when no atom record is present.
pub fn read_partial_charges<R: BufRead>(reader: R) -> Result<Vec<f64>, Mol2Error> {
    let mut section = Section::None;
    let mut charges = Vec::new();

    for (idx, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        let line_number = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(header) = trimmed.strip_prefix("@<TRIPOS>") {
            section = if header == "ATOM" {
                Section::Atom
            } else {
                Section::None
            };
            continue;
        }
        if section != Section::Atom {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let charge_token = tokens.get(8).ok_or_else(|| Mol2Error::Parse {
            line: line_number,
            message: format!(
                "atom record has {} columns, expected at least 9",
                tokens.len()
            ),
        })?;
        let charge: f64 = charge_token.parse().map_err(|_| Mol2Error::Parse {
            line: line_number,
            message: format!("invalid partial charge '{}'", charge_token),
        })?;
        charges.push(charge);
    }

    if charges.is_empty() {
        return Err(Mol2Error::MissingAtoms);
    }
    Ok(charges)
}

/// Net formal charge of a MOL2 file: the sum of all partial charges, rounded to the
/// nearest integer.
pub fn read_net_charge<R: BufRead>(reader: R) -> Result<i32, Mol2Error> {
    let total: f64 = read_partial_charges(reader)?.iter().sum();
    Ok(total.round() as i32)
}

pub fn read_net_charge_from_path<P: AsRef<Path>>(path: P) -> Result<i32, Mol2Error> {
    let file = File::open(path)?;
    read_net_charge(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ACETATE: &str = "\
@<TRIPOS>MOLECULE
ACT
4 3 1 0 0
SMALL
GASTEIGER

@<TRIPOS>ATOM
      1 C1          0.0000    0.0000    0.0000 C.3     1  ACT1       -0.0420
      2 C2          1.5000    0.0000    0.0000 C.2     1  ACT1        0.2870
      3 O1          2.1000    1.0000    0.0000 O.co2   1  ACT1       -0.6225
      4 O2          2.1000   -1.0000    0.0000 O.co2   1  ACT1       -0.6225
@<TRIPOS>BOND
     1     1     2    1
     2     2     3   ar
     3     2     4   ar
";

    #[test]
    fn reads_every_atom_charge() {
        let charges = read_partial_charges(Cursor::new(ACETATE)).unwrap();
        assert_eq!(charges.len(), 4);
        assert_eq!(charges[1], 0.287);
    }

    #[test]
    fn net_charge_is_rounded_sum() {
        assert_eq!(read_net_charge(Cursor::new(ACETATE)).unwrap(), -1);
    }

    #[test]
    fn neutral_molecule_rounds_to_zero() {
        let content = "\
@<TRIPOS>ATOM
 1 C1 0.0 0.0 0.0 C.3 1 LIG -0.12
 2 H1 1.0 0.0 0.0 H   1 LIG  0.13
";
        assert_eq!(read_net_charge(Cursor::new(content)).unwrap(), 0);
    }

    #[test]
    fn atom_record_without_charge_column_is_rejected() {
        let content = "@<TRIPOS>ATOM\n 1 C1 0.0 0.0 0.0 C.3\n";
        let err = read_net_charge(Cursor::new(content)).unwrap_err();
        assert!(matches!(err, Mol2Error::Parse { line: 2, .. }));
    }

    #[test]
    fn file_without_atom_section_is_rejected() {
        let content = "@<TRIPOS>MOLECULE\nEMPTY\n";
        assert!(matches!(
            read_net_charge(Cursor::new(content)),
            Err(Mol2Error::MissingAtoms)
        ));
    }
}
