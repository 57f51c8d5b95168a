use crate::core::library::format::LibraryFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeapScriptError {
    #[error("tLEaP cannot load '{0}': unknown file extension")]
    UnknownExtension(PathBuf),
}

/// Solvation of the assembled unit in a truncated octahedral water box.
#[derive(Debug, Clone, PartialEq)]
pub struct Solvation {
    pub water_model: String,
    pub distance: f64,
}

/// A tLEaP command script, built directive by directive.
///
/// Every `saveoff`/`saveamberparm` target is recorded so the caller can verify the files
/// were actually written; tLEaP reports many failures only in its log while exiting 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeapScript {
    lines: Vec<String>,
    outputs: Vec<PathBuf>,
}

fn load_directive(path: &Path) -> Result<&'static str, LeapScriptError> {
    LibraryFormat::from_path(path)
        .map(|f| f.load_directive())
        .ok_or_else(|| LeapScriptError::UnknownExtension(path.to_path_buf()))
}

impl LeapScript {
    /// Starts a script that sources `force_field` and GAFF.
    pub fn new(force_field: &str) -> Self {
        Self {
            lines: vec![
                format!("source {}", force_field),
                "source leaprc.gaff".to_string(),
            ],
            outputs: Vec::new(),
        }
    }

    pub fn load_library(mut self, path: &Path) -> Result<Self, LeapScriptError> {
        let directive = load_directive(path)?;
        self.lines
            .push(format!("{} {}", directive, path.display()));
        Ok(self)
    }

    pub fn load_libraries<'p>(
        self,
        paths: impl IntoIterator<Item = &'p Path>,
    ) -> Result<Self, LeapScriptError> {
        paths
            .into_iter()
            .try_fold(self, |script, path| script.load_library(path))
    }

    /// Loads `path` into the variable `unit`.
    pub fn load_unit(mut self, unit: &str, path: &Path) -> Result<Self, LeapScriptError> {
        let directive = load_directive(path)?;
        self.lines
            .push(format!("{}={} {}", unit, directive, path.display()));
        Ok(self)
    }

    /// Sources the water model, solvates `unit` and neutralizes it with sodium and chloride.
    pub fn solvate(mut self, unit: &str, solvation: &Solvation) -> Self {
        self.lines.push(format!("source {}", solvation.water_model));
        self.lines
            .push(format!("solvateoct {} TIP3PBOX {}", unit, solvation.distance));
        self.lines.push(format!("addions {} Na+ 0", unit));
        self.lines.push(format!("addions {} Cl- 0", unit));
        self
    }

    pub fn save_off(mut self, unit: &str, path: &Path) -> Self {
        self.lines
            .push(format!("saveoff {} {}", unit, path.display()));
        self.outputs.push(path.to_path_buf());
        self
    }

    pub fn save_amber_parm(mut self, unit: &str, prmtop: &Path, inpcrd: &Path) -> Self {
        self.lines.push(format!(
            "saveamberparm {} {} {}",
            unit,
            prmtop.display(),
            inpcrd.display()
        ));
        self.outputs.push(prmtop.to_path_buf());
        self.outputs.push(inpcrd.to_path_buf());
        self
    }

    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// The script text, terminated by `quit`.
    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push_str("\nquit\n");
        text
    }
}
