//! External collaborators of the preparation pipeline.
//!
//! Every external program is reached through one of the narrow traits below, so the
//! decision logic in the engine never spawns a process directly. [`amber::AmberToolchain`]
//! implements all of them on top of a [`ToolRunner`]; tests substitute recording fakes.

pub mod amber;

use crate::core::utils::paths::remove_if_exists;
use crate::engine::leap::LeapScript;
use crate::engine::stages::StageFiles;
use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to launch {tool} ({program}): {source}")]
    Launch {
        tool: &'static str,
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },
    #[error("{tool} did not produce expected output '{path}'")]
    MissingOutput { tool: &'static str, path: PathBuf },
    #[error("Failed to remove previous {tool} output '{path}': {source}")]
    StaleOutput {
        tool: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write input for {tool} to '{path}': {source}")]
    Input {
        tool: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A fully specified external program call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub tool: &'static str,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub working_dir: Option<PathBuf>,
}

impl ToolInvocation {
    pub fn new(tool: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            tool,
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Shell-like rendering used in log messages.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Non-empty lines of both output streams, stdout first.
    pub fn lines(&self) -> Vec<String> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .map(String::from)
            .collect()
    }
}

/// Executes tool invocations, blocking until each one completes.
pub trait ToolRunner {
    /// Runs `invocation` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Launch`] if the program cannot be started and
    /// [`ToolError::Failed`] if it exits unsuccessfully.
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError>;
}

/// Runs tools as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, ToolError> {
        debug!(tool = invocation.tool, command = %invocation.command_line(), "Running external tool");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }
        let output = command.output().map_err(|source| ToolError::Launch {
            tool: invocation.tool,
            program: invocation.program.display().to_string(),
            source,
        })?;

        let result = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        trace!(tool = invocation.tool, stdout = %result.stdout, "Tool output");
        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: invocation.tool,
                status: output.status.to_string(),
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }
}

/// Deletes leftovers from an earlier run so [`require_output`] only sees fresh files.
pub(crate) fn clear_outputs<'p>(
    tool: &'static str,
    paths: impl IntoIterator<Item = &'p Path>,
) -> Result<(), ToolError> {
    paths.into_iter().try_for_each(|path| {
        remove_if_exists(path).map_err(|source| ToolError::StaleOutput {
            tool,
            path: path.to_path_buf(),
            source,
        })
    })
}

pub(crate) fn require_output(tool: &'static str, path: &Path) -> Result<(), ToolError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ToolError::MissingOutput {
            tool,
            path: path.to_path_buf(),
        })
    }
}

/// Converts structures between file formats.
pub trait FormatConverter {
    /// Converts `input` to the format implied by the extension of `output`.
    fn convert(&self, input: &Path, output: &Path) -> Result<(), ToolError>;

    /// Writes `input` to `output` with hydrogens added.
    fn add_hydrogens(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Flags and repairs structural problems of a polymer before parameterization.
pub trait StructureNormalizer {
    /// Writes the normalized structure to `output` and returns the tool's diagnostics.
    fn normalize(&self, input: &Path, output: &Path) -> Result<Vec<String>, ToolError>;
}

/// Output files of a semi-empirical parameter derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedParameters {
    pub charged_structure: PathBuf,
    pub frcmod: PathBuf,
}

/// Assigns semi-empirical charges and atom types and derives missing parameters.
pub trait ParameterDeriver {
    /// Derives parameters for the PDB `structure` carrying `net_charge`, writing
    /// `outputs.charged_structure` (MOL2) and `outputs.frcmod`.
    fn derive_params(
        &self,
        structure: &Path,
        net_charge: i32,
        outputs: &DerivedParameters,
    ) -> Result<(), ToolError>;
}

/// Runs tLEaP command scripts.
pub trait TopologyBuilder {
    /// Writes `script` to `script_path`, runs it, and checks every file it saves exists.
    fn build(&self, script: &LeapScript, script_path: &Path) -> Result<(), ToolError>;
}

/// Runs one MD stage.
pub trait StageRunner {
    fn run_stage(&self, files: &StageFiles) -> Result<(), ToolError>;
}

/// The set of collaborators one pipeline run uses.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub converter: &'a dyn FormatConverter,
    pub normalizer: &'a dyn StructureNormalizer,
    pub deriver: &'a dyn ParameterDeriver,
    pub topology: &'a dyn TopologyBuilder,
    pub stages: &'a dyn StageRunner,
}

impl<'a> Collaborators<'a> {
    /// Uses one value for every collaborator role.
    pub fn uniform<T>(tools: &'a T) -> Self
    where
        T: FormatConverter + StructureNormalizer + ParameterDeriver + TopologyBuilder + StageRunner,
    {
        Self {
            converter: tools,
            normalizer: tools,
            deriver: tools,
            topology: tools,
            stages: tools,
        }
    }
}
