use super::contents::{LibraryLoadError, UnitTable, UnitTableReader, read_line_error};
use std::io::BufRead;

/// Reader for AMBER residue topology (`.prep`) files.
///
/// After two control lines, each residue block is a title line, a file-name line and the
/// `NAMRES INTX KFORM` line naming the unit, followed by the body up to `DONE`. `STOP`
/// ends the file. Atom names are not extracted, so every unit maps to `None`.
pub struct PrepReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Control(usize),
    Title,
    FileName,
    UnitName,
    Body,
}

impl UnitTableReader for PrepReader {
    fn read_units(reader: &mut impl BufRead) -> Result<UnitTable, LibraryLoadError> {
        let mut units = UnitTable::new();
        let mut state = State::Control(0);

        for (idx, line_res) in reader.lines().enumerate() {
            let line = line_res.map_err(read_line_error)?;
            let trimmed = line.trim();

            state = match state {
                State::Control(n) if n < 1 => State::Control(n + 1),
                State::Control(_) => State::Title,
                State::Title if trimmed.is_empty() => State::Title,
                State::Title if trimmed == "STOP" => break,
                State::Title => State::FileName,
                State::FileName => State::UnitName,
                State::UnitName => {
                    let unit = trimmed.split_whitespace().next().ok_or_else(|| {
                        LibraryLoadError::Parse {
                            line: idx + 1,
                            message: "residue block has no unit name line".into(),
                        }
                    })?;
                    units.insert(unit.to_string(), None);
                    State::Body
                }
                State::Body if trimmed == "DONE" => State::Title,
                State::Body if trimmed == "STOP" => break,
                State::Body => State::Body,
            };
        }

        if state == State::UnitName {
            return Err(LibraryLoadError::Parse {
                line: 0,
                message: "file ended before the unit name of the last residue".into(),
            });
        }
        Ok(units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_RESIDUES: &str = "\
    0    0    2

Ligand one
lig.res
LIG   INT  0
CORRECT     OMIT DU   BEG
  0.0000
   1  DUMM  DU    M    0  -1  -2     0.000      .0        .0      .00000
   4  C1    c3    M    3   2   1     1.540   111.208   180.000   -0.1000

LOOP

DONE
Cofactor
cof.res
COF   INT  0
CORRECT     OMIT DU   BEG
  0.0000
   4  N1    n     M    3   2   1     1.540   111.208   180.000   -0.1000

DONE
STOP
";

    #[test]
    fn collects_unit_names_without_atom_detail() {
        let units = PrepReader::read_units(&mut Cursor::new(TWO_RESIDUES)).unwrap();
        let names: Vec<&str> = units.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["COF", "LIG"]);
        assert!(units.values().all(Option::is_none));
    }

    #[test]
    fn truncated_block_is_rejected() {
        let content = "    0    0    2\n\nTitle\nlig.res\n";
        assert!(matches!(
            PrepReader::read_units(&mut Cursor::new(content)),
            Err(LibraryLoadError::Parse { .. })
        ));
    }

    #[test]
    fn file_with_only_control_lines_defines_nothing() {
        let units = PrepReader::read_units(&mut Cursor::new("    0    0    2\n\nSTOP\n")).unwrap();
        assert!(units.is_empty());
    }
}
