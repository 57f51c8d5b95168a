use super::contents::{LibraryLoadError, UnitTable, UnitTableReader, read_line_error};
use std::collections::BTreeSet;
use std::io::BufRead;

/// Reader for tLEaP object file libraries (`.lib`/`.off`).
///
/// Unit names come from the `!!index array str` block. The atom names of a unit are the
/// first quoted column of its `!entry.<UNIT>.unit.atoms table` block; any other `!` line
/// closes the block.
pub struct OffReader;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    None,
    Index,
    Atoms(String),
}

fn unquote(token: &str) -> &str {
    token.trim().trim_matches('"')
}

impl UnitTableReader for OffReader {
    fn read_units(reader: &mut impl BufRead) -> Result<UnitTable, LibraryLoadError> {
        let mut units = UnitTable::new();
        let mut section = Section::None;

        for (idx, line_res) in reader.lines().enumerate() {
            let line = line_res.map_err(read_line_error)?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with('!') {
                let keyword = trimmed.split_whitespace().next().unwrap_or("");
                section = if keyword == "!!index" {
                    Section::Index
                } else if let Some(entry) = keyword.strip_prefix("!entry.") {
                    match entry.rsplit_once('.') {
                        Some((unit_path, "atoms")) => {
                            let unit = unit_path.split('.').next().unwrap_or("");
                            if unit.is_empty() {
                                return Err(LibraryLoadError::Parse {
                                    line: idx + 1,
                                    message: format!("entry without unit name: '{}'", keyword),
                                });
                            }
                            units
                                .entry(unit.to_string())
                                .or_insert_with(|| Some(BTreeSet::new()));
                            Section::Atoms(unit.to_string())
                        }
                        _ => Section::None,
                    }
                } else {
                    Section::None
                };
                continue;
            }

            match &section {
                Section::Index => {
                    let unit = unquote(trimmed);
                    if !unit.is_empty() {
                        units
                            .entry(unit.to_string())
                            .or_insert_with(|| Some(BTreeSet::new()));
                    }
                }
                Section::Atoms(unit) => {
                    let atom = trimmed.split_whitespace().next().map(unquote).unwrap_or("");
                    if atom.is_empty() {
                        return Err(LibraryLoadError::Parse {
                            line: idx + 1,
                            message: format!("atom record of unit {} has no name", unit),
                        });
                    }
                    if let Some(Some(atoms)) = units.get_mut(unit) {
                        atoms.insert(atom.to_string());
                    }
                }
                Section::None => {}
            }
        }
        Ok(units)
    }
}
