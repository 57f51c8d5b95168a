use crate::core::io::traits::MolecularFile;
use crate::core::models::atom::RecordType;
use crate::core::models::structure::{Structure, StructureBuilder};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Non-coordinate records preserved across a read/write cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdbMetadata {
    pub header_lines: Vec<String>,
    pub conect_lines: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: PdbParseErrorKind,
    },
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn parse_int(line: &str, line_num: usize, start: usize, end: usize) -> Result<isize, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidInt {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_optional_float(line: &str, start: usize, end: usize, default: f64) -> f64 {
    slice_and_trim(line, start, end).parse().unwrap_or(default)
}

/// Pads an atom name into the 4-column PDB name field.
///
/// Names shorter than four characters of single-letter elements start in column 14.
fn format_atom_name(name: &str, element: &str) -> String {
    if name.len() >= 4 || element.len() == 2 {
        format!("{:<4}", name)
    } else {
        format!(" {:<3}", name)
    }
}

fn format_residue_name(name: &str) -> String {
    if name.len() > 3 {
        format!("{:<4}", name)
    } else {
        format!("{:>3} ", name)
    }
}

/// Fixed-column PDB reader and writer.
///
/// A new chain begins whenever the chain identifier changes or a `TER` record is seen;
/// a new residue begins whenever the sequence number, insertion code, or residue name
/// changes. The writer terminates each chain with a bare `TER` and the file with `END`.
pub struct PdbFile;

impl MolecularFile for PdbFile {
    type Metadata = PdbMetadata;
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Structure, Self::Metadata), Self::Error> {
        let mut builder = StructureBuilder::new();
        let mut metadata = PdbMetadata::default();
        let mut atom_count = 0usize;

        let mut current_chain: Option<char> = None;
        let mut current_residue: Option<(isize, char, String)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record = slice_and_trim(&line, 0, line.len().min(6));
            match record {
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let name = slice_and_trim(&line, 12, 16);
                    if name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    let serial = parse_int(&line, line_num, 6, 11)?.max(0) as usize;
                    let res_name = slice_and_trim(&line, 17, 21);
                    let chain_id = line.get(21..22).and_then(|s| s.chars().next()).unwrap_or(' ');
                    let seq = parse_int(&line, line_num, 22, 26)?;
                    let icode = line.get(26..27).and_then(|s| s.chars().next()).unwrap_or(' ');
                    let x = parse_float(&line, line_num, 30, 38)?;
                    let y = parse_float(&line, line_num, 38, 46)?;
                    let z = parse_float(&line, line_num, 46, 54)?;
                    let occupancy = parse_optional_float(&line, 54, 60, 1.0);
                    let temp_factor = parse_optional_float(&line, 60, 66, 0.0);
                    let element = slice_and_trim(&line, 76, 78);
                    let record_type = if record == "HETATM" {
                        RecordType::Hetatm
                    } else {
                        RecordType::Atom
                    };

                    if current_chain != Some(chain_id) {
                        builder.start_chain(chain_id);
                        current_chain = Some(chain_id);
                        current_residue = None;
                    }
                    let residue_key = (seq, icode, res_name.to_string());
                    if current_residue.as_ref() != Some(&residue_key) {
                        builder.start_residue(seq, res_name);
                        current_residue = Some(residue_key);
                    }
                    if let Some(atom_id) =
                        builder.add_atom(serial, name, element, Point3::new(x, y, z), record_type)
                    {
                        if let Some(atom) = builder.atom_mut(atom_id) {
                            atom.occupancy = occupancy;
                            atom.temp_factor = temp_factor;
                        }
                    }
                    atom_count += 1;
                }
                "TER" => {
                    current_chain = None;
                    current_residue = None;
                }
                "CONECT" => metadata.conect_lines.push(line.clone()),
                "END" | "ENDMDL" => break,
                "MASTER" | "MODEL" | "ANISOU" => {}
                _ => {
                    if !line.trim().is_empty() {
                        metadata.header_lines.push(line.clone());
                    }
                }
            }
        }

        if atom_count == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok((builder.build(), metadata))
    }

    fn write_to(
        structure: &Structure,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for line in &metadata.header_lines {
            writeln!(writer, "{}", line)?;
        }

        for (_, chain) in structure.chains() {
            let mut wrote_atoms = false;
            for residue in chain.residues().iter().filter_map(|&id| structure.residue(id)) {
                for atom in residue.atoms().iter().filter_map(|&id| structure.atom(id)) {
                    let element = atom.element_or_inferred();
                    writeln!(
                        writer,
                        "{:<6}{:>5} {}{}{}{:1}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                        atom.record_type.to_string(),
                        atom.serial,
                        format_atom_name(&atom.name, &element),
                        ' ',
                        format_residue_name(&residue.name),
                        chain.id,
                        residue.seq,
                        atom.position.x,
                        atom.position.y,
                        atom.position.z,
                        atom.occupancy,
                        atom.temp_factor,
                        element.to_ascii_uppercase(),
                    )?;
                    wrote_atoms = true;
                }
            }
            if wrote_atoms {
                writeln!(writer, "TER")?;
            }
        }

        for line in &metadata.conect_lines {
            writeln!(writer, "{}", line)?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }

    fn write_structure_to(
        structure: &Structure,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let default_metadata = PdbMetadata {
            header_lines: vec!["REMARK   1 Generated by amberprep".to_string()],
            ..Default::default()
        };
        Self::write_to(structure, &default_metadata, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const DIPEPTIDE: &str = "\
REMARK   1 TEST STRUCTURE
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  N   GLY A   2      12.000   7.000  -4.000  1.00  0.00           N
TER       4      GLY A   2
HETATM    5  C1  LIG B 101       1.000   2.000   3.000  0.50 10.00           C
HETATM    6 CL1  LIG B 101       1.500   2.500   3.500  1.00  0.00          CL
CONECT    5    6
END
";

    fn read(content: &str) -> (Structure, PdbMetadata) {
        PdbFile::read_from(&mut Cursor::new(content)).unwrap()
    }

    #[test]
    fn reads_chains_residues_and_atoms_in_file_order() {
        let (structure, metadata) = read(DIPEPTIDE);

        let chains: Vec<char> = structure.chains().map(|(_, c)| c.id).collect();
        assert_eq!(chains, vec!['A', 'B']);
        let residues: Vec<(isize, String)> = structure
            .residues()
            .map(|(_, r)| (r.seq, r.name.clone()))
            .collect();
        assert_eq!(
            residues,
            vec![
                (1, "ALA".to_string()),
                (2, "GLY".to_string()),
                (101, "LIG".to_string())
            ]
        );
        assert_eq!(structure.atom_count(), 5);
        assert_eq!(metadata.header_lines, vec!["REMARK   1 TEST STRUCTURE"]);
        assert_eq!(metadata.conect_lines.len(), 1);
    }

    #[test]
    fn reads_record_type_occupancy_and_element() {
        let (structure, _) = read(DIPEPTIDE);
        let c1 = structure.atoms().map(|(_, a)| a).find(|a| a.name == "C1").unwrap();
        assert_eq!(c1.record_type, RecordType::Hetatm);
        assert_eq!(c1.occupancy, 0.5);
        assert_eq!(c1.temp_factor, 10.0);
        assert_eq!(c1.position, Point3::new(1.0, 2.0, 3.0));

        let cl = structure.atoms().map(|(_, a)| a).find(|a| a.name == "CL1").unwrap();
        assert_eq!(cl.element, "CL");
    }

    #[test]
    fn ter_record_starts_new_chain_even_with_same_identifier() {
        let content = "\
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
TER
ATOM      2  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C
END
";
        let (structure, _) = read(content);
        assert_eq!(structure.chains().count(), 2);
        assert_eq!(structure.residue_count(), 2);
    }

    #[test]
    fn bare_end_stops_reading_and_is_not_kept_as_header() {
        let content = "\
CRYST1    0.000    0.000    0.000  90.00  90.00  90.00 P 1           1
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
TER
ATOM      2  CA  GLY B   2       1.000   0.000   0.000  1.00  0.00           C
TER
END
ATOM      3  CA  SER C   3       2.000   0.000   0.000  1.00  0.00           C
";
        let (structure, metadata) = read(content);
        assert_eq!(structure.atom_count(), 2);
        assert_eq!(structure.chains().count(), 2);
        assert_eq!(metadata.header_lines.len(), 1);
        assert!(metadata.header_lines[0].starts_with("CRYST1"));
    }

    #[test]
    fn residue_name_change_starts_new_residue_at_same_sequence_number() {
        let content = "\
HETATM    1  C1  LIG     1       0.000   0.000   0.000
HETATM    2 NA   NA      1       1.000   0.000   0.000
";
        let (structure, _) = read(content);
        assert_eq!(structure.residue_count(), 2);
        assert_eq!(structure.chains().next().unwrap().1.id, ' ');
    }

    #[test]
    fn short_coordinate_line_is_rejected() {
        let err = PdbFile::read_from(&mut Cursor::new("ATOM      1  CA  ALA A   1\n")).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort
            }
        ));
    }

    #[test]
    fn invalid_coordinate_reports_columns() {
        let content =
            "ATOM      1  CA  ALA A   1      abcdefgh   0.000   0.000  1.00  0.00           C\n";
        let err = PdbFile::read_from(&mut Cursor::new(content)).unwrap_err();
        match err {
            PdbError::Parse {
                kind: PdbParseErrorKind::InvalidFloat { columns, .. },
                ..
            } => assert_eq!(columns, "31-38"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn file_without_atoms_is_rejected() {
        let err = PdbFile::read_from(&mut Cursor::new("REMARK nothing\nEND\n")).unwrap_err();
        assert!(matches!(err, PdbError::MissingRecord(_)));
    }

    #[test]
    fn written_file_reads_back_to_same_layout() {
        let (structure, metadata) = read(DIPEPTIDE);
        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &metadata, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();

        assert!(text.starts_with("REMARK   1 TEST STRUCTURE\n"));
        assert!(text.contains(
            "ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C"
        ));
        assert!(text.contains(
            "HETATM    6 CL1  LIG B 101       1.500   2.500   3.500  1.00  0.00          CL"
        ));
        assert_eq!(text.matches("\nTER\n").count(), 2);
        assert!(text.trim_end().ends_with("END"));

        let (reread, _) = read(&text);
        assert_eq!(reread.atom_count(), structure.atom_count());
        assert_eq!(reread.residue_count(), structure.residue_count());
        assert_eq!(reread.chains().count(), 2);
    }

    #[test]
    fn write_structure_to_adds_generated_remark() {
        let (structure, _) = read(DIPEPTIDE);
        let mut buffer = Vec::new();
        PdbFile::write_structure_to(&structure, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("REMARK   1 Generated by amberprep"));
        assert!(!text.contains("CONECT"));
    }
}
