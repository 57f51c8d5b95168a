use super::error::EngineError;
use super::leap::LeapScript;
use super::tools::{DerivedParameters, ParameterDeriver, TopologyBuilder};
use crate::core::utils::paths::{derived_path, remove_if_exists};
use std::path::{Path, PathBuf};
use tracing::info;

/// Inputs of one parameter derivation for a single-unit ligand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationRequest<'a> {
    /// Sanitized ligand PDB with hydrogens and the final unit name.
    pub structure: &'a Path,
    pub net_charge: i32,
    pub unit_name: &'a str,
    /// Argument of the force field `source` directive.
    pub force_field: &'a str,
    pub work_dir: &'a Path,
    /// Base name all derived files are named after.
    pub base: &'a str,
}

/// The library pair produced for a derived unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedLibrary {
    pub library: PathBuf,
    pub frcmod: PathBuf,
}

impl DerivedLibrary {
    pub fn paths(&self) -> [&Path; 2] {
        [&self.library, &self.frcmod]
    }
}

/// Derives charges, atom types and missing parameters for one unit and saves it as an
/// object file library.
///
/// Produces `<base>_amber.mol2` and `<base>.frcmod` through the deriver, then a tLEaP run
/// loads both and writes `<base>.lib` (plus a standalone `<base>.prmtop`/`<base>.inpcrd`).
/// Stale outputs are removed first. Any tool failure aborts the derivation.
pub fn derive(
    request: &DerivationRequest<'_>,
    deriver: &dyn ParameterDeriver,
    topology: &dyn TopologyBuilder,
) -> Result<DerivedLibrary, EngineError> {
    let outputs = DerivedParameters {
        charged_structure: derived_path(request.work_dir, request.base, "_amber.mol2"),
        frcmod: derived_path(request.work_dir, request.base, ".frcmod"),
    };
    let library = derived_path(request.work_dir, request.base, ".lib");
    for stale in [&outputs.frcmod, &library] {
        remove_if_exists(stale).map_err(EngineError::io(stale.as_path()))?;
    }

    info!(
        unit = request.unit_name,
        net_charge = request.net_charge,
        "Parameterizing unit with antechamber"
    );
    deriver.derive_params(request.structure, request.net_charge, &outputs)?;

    let script = LeapScript::new(request.force_field)
        .load_unit(request.unit_name, &outputs.charged_structure)?
        .load_library(&outputs.frcmod)?
        .save_off(request.unit_name, &library)
        .save_amber_parm(
            request.unit_name,
            &derived_path(request.work_dir, request.base, ".prmtop"),
            &derived_path(request.work_dir, request.base, ".inpcrd"),
        );
    topology.build(&script, &derived_path(request.work_dir, request.base, ".tleap"))?;

    Ok(DerivedLibrary {
        library,
        frcmod: outputs.frcmod,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tools::ToolError;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingTools {
        derive_calls: RefCell<Vec<(PathBuf, i32)>>,
        scripts: RefCell<Vec<String>>,
        fail_derivation: bool,
    }

    impl ParameterDeriver for RecordingTools {
        fn derive_params(
            &self,
            structure: &Path,
            net_charge: i32,
            outputs: &DerivedParameters,
        ) -> Result<(), ToolError> {
            self.derive_calls
                .borrow_mut()
                .push((structure.to_path_buf(), net_charge));
            if self.fail_derivation {
                return Err(ToolError::Failed {
                    tool: "antechamber",
                    status: "exit status: 1".into(),
                    stderr: "bad structure".into(),
                });
            }
            fs::write(&outputs.charged_structure, "mol2").unwrap();
            fs::write(&outputs.frcmod, "frcmod").unwrap();
            Ok(())
        }
    }

    impl TopologyBuilder for RecordingTools {
        fn build(&self, script: &LeapScript, _script_path: &Path) -> Result<(), ToolError> {
            self.scripts.borrow_mut().push(script.render());
            for output in script.outputs() {
                fs::write(output, "").unwrap();
            }
            Ok(())
        }
    }

    #[test]
    fn derive_produces_library_pair_and_saveoff_script() {
        let dir = tempdir().unwrap();
        let ligand = dir.path().join("lig_amber.pdb");
        let tools = RecordingTools::default();
        let request = DerivationRequest {
            structure: &ligand,
            net_charge: -1,
            unit_name: "LIG",
            force_field: "leaprc.protein.ff15ipq",
            work_dir: dir.path(),
            base: "lig",
        };

        let derived = derive(&request, &tools, &tools).unwrap();

        assert_eq!(derived.library, dir.path().join("lig.lib"));
        assert_eq!(derived.frcmod, dir.path().join("lig.frcmod"));
        assert!(derived.library.is_file());
        assert_eq!(*tools.derive_calls.borrow(), vec![(ligand.clone(), -1)]);
        let scripts = tools.scripts.borrow();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains(&format!(
            "LIG=loadmol2 {}",
            dir.path().join("lig_amber.mol2").display()
        )));
        assert!(scripts[0].contains(&format!("saveoff LIG {}", derived.library.display())));
    }

    #[test]
    fn deriver_failure_aborts_before_topology_build() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("lig.lib"), "stale").unwrap();
        let tools = RecordingTools {
            fail_derivation: true,
            ..Default::default()
        };
        let ligand = dir.path().join("lig_amber.pdb");
        let request = DerivationRequest {
            structure: &ligand,
            net_charge: 0,
            unit_name: "LIG",
            force_field: "ff",
            work_dir: dir.path(),
            base: "lig",
        };

        let err = derive(&request, &tools, &tools).unwrap_err();

        assert!(matches!(err, EngineError::Tool(ToolError::Failed { .. })));
        assert!(tools.scripts.borrow().is_empty());
        assert!(!dir.path().join("lig.lib").exists());
    }
}
