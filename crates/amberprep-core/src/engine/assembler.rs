use super::error::EngineError;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::MolecularFile;
use crate::core::models::structure::Structure;
use crate::core::utils::paths::remove_if_exists;
use std::path::{Path, PathBuf};
use tracing::info;

/// Concatenates `structures` in order; the first structure's numbering anchors the result.
///
/// Returns `None` for an empty slice.
pub fn assemble(structures: &[&Structure]) -> Option<Structure> {
    let (first, rest) = structures.split_first()?;
    let mut composite = (*first).clone();
    for structure in rest {
        composite.append(structure);
    }
    Some(composite)
}

/// Writes `composite` to `path`, removing any previous file of that name first.
pub fn write_composite(composite: &Structure, path: &Path) -> Result<(), EngineError> {
    remove_if_exists(path).map_err(EngineError::io(path))?;
    PdbFile::write_structure_to_path(composite, path).map_err(EngineError::pdb(path))
}

/// A prepared structure: the file downstream tools read and its parsed contents.
#[derive(Debug, Clone)]
pub struct PreparedStructure {
    pub path: PathBuf,
    pub structure: Structure,
}

/// Produces the single coordinate file handed to topology generation.
///
/// A single structure is used as-is from its own file; several are assembled into
/// `<work_dir>/<out_name>.pdb`.
pub fn assemble_system(
    prepared: &[PreparedStructure],
    work_dir: &Path,
    out_name: &str,
) -> Result<Option<PathBuf>, EngineError> {
    match prepared {
        [] => Ok(None),
        [single] => Ok(Some(single.path.clone())),
        many => {
            let structures: Vec<&Structure> = many.iter().map(|p| &p.structure).collect();
            let Some(composite) = assemble(&structures) else {
                return Ok(None);
            };
            let path = work_dir.join(format!("{}.pdb", out_name));
            write_composite(&composite, &path)?;
            info!(
                path = %path.display(),
                structures = many.len(),
                atoms = composite.atom_count(),
                "Assembled composite system"
            );
            Ok(Some(path))
        }
    }
}
