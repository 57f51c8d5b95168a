use super::{
    DerivedParameters, FormatConverter, ParameterDeriver, StageRunner, StructureNormalizer,
    SystemRunner, ToolError, ToolInvocation, ToolRunner, TopologyBuilder, clear_outputs,
    require_output,
};
use crate::engine::config::ToolPaths;
use crate::engine::leap::LeapScript;
use crate::engine::stages::StageFiles;
use std::fs;
use std::path::{Path, PathBuf};

/// Open Babel and AmberTools behind the collaborator traits.
///
/// Every tool runs inside the working directory, where antechamber and tLEaP leave their
/// scratch files and logs. Files a tool is expected to write are deleted before it starts.
#[derive(Debug, Clone)]
pub struct AmberToolchain<R: ToolRunner = SystemRunner> {
    paths: ToolPaths,
    work_dir: PathBuf,
    runner: R,
}

impl AmberToolchain<SystemRunner> {
    pub fn new(paths: ToolPaths, work_dir: &Path) -> Self {
        Self::with_runner(paths, work_dir, SystemRunner)
    }
}

impl<R: ToolRunner> AmberToolchain<R> {
    pub fn with_runner(paths: ToolPaths, work_dir: &Path, runner: R) -> Self {
        Self {
            paths,
            work_dir: work_dir.to_path_buf(),
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn invocation(&self, tool: &'static str, program: &Path) -> ToolInvocation {
        ToolInvocation::new(tool, program).current_dir(&self.work_dir)
    }
}

impl<R: ToolRunner> FormatConverter for AmberToolchain<R> {
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let invocation = self
            .invocation("obabel", &self.paths.obabel)
            .arg(input)
            .arg("-O")
            .arg(output);
        clear_outputs("obabel", [output])?;
        self.runner.run(&invocation)?;
        require_output("obabel", output)
    }

    fn add_hydrogens(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let invocation = self
            .invocation("obabel", &self.paths.obabel)
            .arg(input)
            .arg("-O")
            .arg(output)
            .arg("-h");
        clear_outputs("obabel", [output])?;
        self.runner.run(&invocation)?;
        require_output("obabel", output)
    }
}

impl<R: ToolRunner> StructureNormalizer for AmberToolchain<R> {
    fn normalize(&self, input: &Path, output: &Path) -> Result<Vec<String>, ToolError> {
        let invocation = self
            .invocation("pdb4amber", &self.paths.pdb4amber)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output);
        clear_outputs("pdb4amber", [output])?;
        let result = self.runner.run(&invocation)?;
        require_output("pdb4amber", output)?;
        Ok(result.lines())
    }
}

impl<R: ToolRunner> ParameterDeriver for AmberToolchain<R> {
    fn derive_params(
        &self,
        structure: &Path,
        net_charge: i32,
        outputs: &DerivedParameters,
    ) -> Result<(), ToolError> {
        let antechamber = self
            .invocation("antechamber", &self.paths.antechamber)
            .arg("-i")
            .arg(structure)
            .args(["-fi", "pdb", "-o"])
            .arg(&outputs.charged_structure)
            .args(["-fo", "mol2", "-c", "bcc", "-nc"])
            .arg(net_charge.to_string())
            .args(["-s", "2"]);
        clear_outputs("antechamber", [outputs.charged_structure.as_path()])?;
        self.runner.run(&antechamber)?;
        require_output("antechamber", &outputs.charged_structure)?;

        let parmchk = self
            .invocation("parmchk", &self.paths.parmchk)
            .arg("-i")
            .arg(&outputs.charged_structure)
            .args(["-f", "mol2", "-o"])
            .arg(&outputs.frcmod);
        clear_outputs("parmchk", [outputs.frcmod.as_path()])?;
        self.runner.run(&parmchk)?;
        require_output("parmchk", &outputs.frcmod)
    }
}

impl<R: ToolRunner> TopologyBuilder for AmberToolchain<R> {
    fn build(&self, script: &LeapScript, script_path: &Path) -> Result<(), ToolError> {
        clear_outputs("tleap", script.outputs().iter().map(PathBuf::as_path))?;
        fs::write(script_path, script.render()).map_err(|source| ToolError::Input {
            tool: "tleap",
            path: script_path.to_path_buf(),
            source,
        })?;
        let invocation = self
            .invocation("tleap", &self.paths.tleap)
            .arg("-f")
            .arg(script_path);
        self.runner.run(&invocation)?;
        script
            .outputs()
            .iter()
            .try_for_each(|output| require_output("tleap", output))
    }
}

impl<R: ToolRunner> StageRunner for AmberToolchain<R> {
    fn run_stage(&self, files: &StageFiles) -> Result<(), ToolError> {
        let mut invocation = self
            .invocation("pmemd", &self.paths.pmemd)
            .args(["-O", "-i"])
            .arg(&files.control)
            .arg("-o")
            .arg(&files.output)
            .arg("-p")
            .arg(&files.topology)
            .arg("-c")
            .arg(&files.input_coordinates)
            .arg("-r")
            .arg(&files.restart);
        if let Some(reference) = &files.reference {
            invocation = invocation.arg("-ref").arg(reference);
        }
        if let Some(trajectory) = &files.trajectory {
            invocation = invocation.arg("-x").arg(trajectory);
        }
        clear_outputs(
            "pmemd",
            [&files.output, &files.restart]
                .into_iter()
                .chain(files.trajectory.as_ref())
                .map(PathBuf::as_path),
        )?;
        self.runner.run(&invocation)?;
        require_output("pmemd", &files.restart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stages::{Stage, StagePlan};
    use crate::engine::tools::ToolOutput;
    use std::cell::RefCell;
    use tempfile::tempdir;

    /// Records command lines and creates the files named after the given flags, plus any
    /// files listed in `creates`.
    #[derive(Default)]
    struct ScriptedRunner {
        calls: RefCell<Vec<String>>,
        output_flags: Vec<&'static str>,
        creates: Vec<PathBuf>,
        stdout: String,
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
            self.calls.borrow_mut().push(invocation.command_line());
            let args: Vec<String> = invocation
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            for (i, arg) in args.iter().enumerate() {
                if self.output_flags.contains(&arg.as_str()) {
                    if let Some(path) = args.get(i + 1) {
                        fs::write(path, "").unwrap();
                    }
                }
            }
            for path in &self.creates {
                fs::write(path, "").unwrap();
            }
            Ok(ToolOutput {
                stdout: self.stdout.clone(),
                stderr: String::new(),
            })
        }
    }

    fn toolchain(dir: &Path, output_flags: Vec<&'static str>) -> AmberToolchain<ScriptedRunner> {
        AmberToolchain::with_runner(
            ToolPaths::default(),
            dir,
            ScriptedRunner {
                output_flags,
                ..Default::default()
            },
        )
    }

    #[test]
    fn add_hydrogens_passes_h_flag() {
        let dir = tempdir().unwrap();
        let tools = toolchain(dir.path(), vec!["-O"]);
        let input = dir.path().join("lig_temp.pdb");
        let output = dir.path().join("lig_amber.pdb");

        tools.add_hydrogens(&input, &output).unwrap();

        let calls = tools.runner().calls.borrow();
        assert_eq!(
            calls[0],
            format!("obabel {} -O {} -h", input.display(), output.display())
        );
    }

    #[test]
    fn missing_converter_output_is_an_error() {
        let dir = tempdir().unwrap();
        let tools = toolchain(dir.path(), vec![]);
        let err = tools
            .convert(&dir.path().join("lig.sdf"), &dir.path().join("lig.pdb"))
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingOutput { tool: "obabel", .. }));
    }

    #[test]
    fn normalizer_returns_tool_messages_as_diagnostics() {
        let dir = tempdir().unwrap();
        let mut tools = toolchain(dir.path(), vec!["-o"]);
        tools.runner.stdout = "==================================================\nSummary of pdb4amber\n\ngap of 4.2 A between ALA 10 and GLY 11\n".into();
        let diagnostics = tools
            .normalize(&dir.path().join("rec.pdb"), &dir.path().join("rec_amber.pdb"))
            .unwrap();
        assert_eq!(diagnostics.len(), 3);
        assert_eq!(diagnostics[2], "gap of 4.2 A between ALA 10 and GLY 11");
        assert!(tools.runner().calls.borrow()[0].starts_with("pdb4amber -y -i "));
    }

    #[test]
    fn derive_params_runs_antechamber_then_parmchk() {
        let dir = tempdir().unwrap();
        let tools = toolchain(dir.path(), vec!["-o"]);
        let outputs = DerivedParameters {
            charged_structure: dir.path().join("lig_amber.mol2"),
            frcmod: dir.path().join("lig.frcmod"),
        };

        tools
            .derive_params(&dir.path().join("lig_amber.pdb"), -2, &outputs)
            .unwrap();

        let calls = tools.runner().calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("antechamber -i "));
        assert!(calls[0].ends_with("-fo mol2 -c bcc -nc -2 -s 2"));
        assert!(calls[1].starts_with("parmchk2 -i "));
        assert!(calls[1].ends_with(&format!("-f mol2 -o {}", outputs.frcmod.display())));
    }

    #[test]
    fn topology_build_writes_script_and_checks_outputs() {
        let dir = tempdir().unwrap();
        let prmtop = dir.path().join("complex.prmtop");
        let inpcrd = dir.path().join("complex.inpcrd");
        let script = LeapScript::new("ff").save_amber_parm("complex", &prmtop, &inpcrd);
        let script_path = dir.path().join("complex.tleap");

        let err = toolchain(dir.path(), vec![])
            .build(&script, &script_path)
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingOutput { tool: "tleap", .. }));
        assert_eq!(fs::read_to_string(&script_path).unwrap(), script.render());

        let mut tools = toolchain(dir.path(), vec![]);
        tools.runner.creates = vec![prmtop.clone(), inpcrd.clone()];
        tools.build(&script, &script_path).unwrap();
        assert_eq!(
            tools.runner().calls.borrow()[0],
            format!("tleap -f {}", script_path.display())
        );
    }

    #[test]
    fn topology_from_an_earlier_run_is_not_accepted() {
        let dir = tempdir().unwrap();
        let prmtop = dir.path().join("receptor.prmtop");
        let inpcrd = dir.path().join("receptor.inpcrd");
        fs::write(&prmtop, "STALE").unwrap();
        fs::write(&inpcrd, "STALE").unwrap();
        let script = LeapScript::new("ff").save_amber_parm("complex", &prmtop, &inpcrd);

        let err = toolchain(dir.path(), vec![])
            .build(&script, &dir.path().join("receptor.tleap"))
            .unwrap_err();

        assert!(matches!(err, ToolError::MissingOutput { tool: "tleap", .. }));
        assert!(!prmtop.exists());
        assert!(!inpcrd.exists());
    }

    #[test]
    fn stage_outputs_from_an_earlier_run_are_removed_before_pmemd() {
        let dir = tempdir().unwrap();
        let plan = StagePlan::new(dir.path(), "complex");
        let files = plan.files(Stage::Md1);
        let trajectory = files.trajectory.clone().unwrap();
        for path in [&files.output, &files.restart, &trajectory] {
            fs::write(path, "STALE").unwrap();
        }

        let err = toolchain(dir.path(), vec![]).run_stage(&files).unwrap_err();

        assert!(matches!(err, ToolError::MissingOutput { tool: "pmemd", .. }));
        assert!(!files.output.exists());
        assert!(!files.restart.exists());
        assert!(!trajectory.exists());
    }

    #[test]
    fn stale_derivation_outputs_are_replaced() {
        let dir = tempdir().unwrap();
        let outputs = DerivedParameters {
            charged_structure: dir.path().join("lig_amber.mol2"),
            frcmod: dir.path().join("lig.frcmod"),
        };
        fs::write(&outputs.charged_structure, "STALE").unwrap();
        fs::write(&outputs.frcmod, "STALE").unwrap();

        let err = toolchain(dir.path(), vec![])
            .derive_params(&dir.path().join("lig_amber.pdb"), 0, &outputs)
            .unwrap_err();

        assert!(matches!(err, ToolError::MissingOutput { tool: "antechamber", .. }));
        assert!(!outputs.charged_structure.exists());
    }

    #[test]
    fn stage_runner_passes_reference_and_trajectory_when_present() {
        let dir = tempdir().unwrap();
        let tools = toolchain(dir.path(), vec!["-r"]);
        let plan = StagePlan::new(dir.path(), "complex");

        tools.run_stage(&plan.files(Stage::Md1)).unwrap();
        tools.run_stage(&plan.files(Stage::Min2)).unwrap();

        let calls = tools.runner().calls.borrow();
        assert!(calls[0].starts_with("pmemd.cuda -O -i "));
        assert!(calls[0].contains(" -ref "));
        assert!(calls[0].ends_with(&format!("-x {}", dir.path().join("complex_md1.nc").display())));
        assert!(!calls[1].contains(" -ref "));
        assert!(!calls[1].contains(" -x "));
    }
}
