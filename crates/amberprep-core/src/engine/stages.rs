//! The staged MD protocol that follows topology generation.
//!
//! Every file of a stage is named `<base>_<suffix>.<ext>` next to the topology, so a stage
//! finds its predecessor's restart file purely by name. Control decks are site-specific
//! templates read from a deck directory; only `{{key}}` placeholders are filled in here.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Integration time step in nanoseconds (2 fs).
const TIME_STEP_NS: f64 = 0.000002;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Control deck template for stage {stage} not found at '{path}'")]
    Missing { stage: Stage, path: PathBuf },
    #[error("Failed to write control deck '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Minimization with the solute restrained to its initial coordinates.
    Min1,
    /// Unrestrained minimization of the whole system.
    Min2,
    /// Heating to the target temperature with weak solute restraints.
    Md1,
    /// Constant-pressure equilibration.
    Md2,
    /// Production run.
    Md3,
}

impl Stage {
    pub const ALL: [Stage; 5] = [Stage::Min1, Stage::Min2, Stage::Md1, Stage::Md2, Stage::Md3];

    pub fn suffix(&self) -> &'static str {
        match self {
            Stage::Min1 => "min1",
            Stage::Min2 => "min2",
            Stage::Md1 => "md1",
            Stage::Md2 => "md2",
            Stage::Md3 => "md3",
        }
    }

    pub fn previous(&self) -> Option<Stage> {
        match self {
            Stage::Min1 => None,
            Stage::Min2 => Some(Stage::Min1),
            Stage::Md1 => Some(Stage::Min2),
            Stage::Md2 => Some(Stage::Md1),
            Stage::Md3 => Some(Stage::Md2),
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Stage::Md3
    }

    fn writes_trajectory(&self) -> bool {
        matches!(self, Stage::Md1 | Stage::Md2 | Stage::Md3)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Files read and written by one stage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFiles {
    pub stage: Stage,
    pub control: PathBuf,
    pub output: PathBuf,
    pub topology: PathBuf,
    pub input_coordinates: PathBuf,
    pub restart: PathBuf,
    pub reference: Option<PathBuf>,
    pub trajectory: Option<PathBuf>,
}

/// Names the files of every stage from a shared base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    dir: PathBuf,
    base: String,
}

impl StagePlan {
    pub fn new(dir: &Path, base: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            base: base.to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn topology(&self) -> PathBuf {
        self.dir.join(format!("{}.prmtop", self.base))
    }

    pub fn coordinates(&self) -> PathBuf {
        self.dir.join(format!("{}.inpcrd", self.base))
    }

    fn stage_file(&self, stage: Stage, ext: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}.{}", self.base, stage.suffix(), ext))
    }

    pub fn files(&self, stage: Stage) -> StageFiles {
        let input_coordinates = match stage.previous() {
            Some(prev) => self.stage_file(prev, "rst"),
            None => self.coordinates(),
        };
        let reference = match stage {
            Stage::Min1 => Some(self.coordinates()),
            Stage::Md1 => Some(self.stage_file(Stage::Min2, "rst")),
            _ => None,
        };
        StageFiles {
            stage,
            control: self.stage_file(stage, "in"),
            output: self.stage_file(stage, "out"),
            topology: self.topology(),
            input_coordinates,
            restart: self.stage_file(stage, "rst"),
            reference,
            trajectory: stage
                .writes_trajectory()
                .then(|| self.stage_file(stage, "nc")),
        }
    }
}

/// Values substituted into control deck templates.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckParameters {
    pub temperature: f64,
    pub restrained_residues: usize,
    pub production_length_ns: f64,
    pub keep_velocities: bool,
    pub coord_dump_freq: u64,
}

impl DeckParameters {
    /// Number of integration steps of the production run.
    pub fn nstlim(&self) -> u64 {
        (self.production_length_ns / TIME_STEP_NS).round() as u64
    }

    fn substitutions(&self, base: &str) -> [(&'static str, String); 8] {
        [
            ("base", base.to_string()),
            ("temperature", self.temperature.to_string()),
            ("restrained_residues", self.restrained_residues.to_string()),
            ("nstlim", self.nstlim().to_string()),
            ("irest", u8::from(self.keep_velocities).to_string()),
            ("ntx", if self.keep_velocities { "7" } else { "1" }.to_string()),
            ("coord_dump_freq", self.coord_dump_freq.to_string()),
            ("length_ns", self.production_length_ns.to_string()),
        ]
    }
}

/// Fills the `{{key}}` placeholders of `template`; unknown placeholders are left intact.
pub fn render_deck(template: &str, base: &str, params: &DeckParameters) -> String {
    params
        .substitutions(base)
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{{{}}}}}", key), value)
        })
}

/// Renders `<deck_dir>/<suffix>.in` into the stage's control file, replacing any old one.
pub fn write_control_deck(
    deck_dir: &Path,
    plan: &StagePlan,
    files: &StageFiles,
    params: &DeckParameters,
) -> Result<(), DeckError> {
    let template_path = deck_dir.join(format!("{}.in", files.stage.suffix()));
    let template = fs::read_to_string(&template_path).map_err(|_| DeckError::Missing {
        stage: files.stage,
        path: template_path.clone(),
    })?;
    let deck = render_deck(&template, plan.base(), params);
    fs::write(&files.control, deck).map_err(|source| DeckError::Write {
        path: files.control.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params(keep_velocities: bool) -> DeckParameters {
        DeckParameters {
            temperature: 310.0,
            restrained_residues: 152,
            production_length_ns: 100.0,
            keep_velocities,
            coord_dump_freq: 5000,
        }
    }

    #[test]
    fn stages_chain_through_restart_files() {
        let plan = StagePlan::new(Path::new("run"), "complex");

        let min1 = plan.files(Stage::Min1);
        assert_eq!(min1.input_coordinates, Path::new("run/complex.inpcrd"));
        assert_eq!(min1.reference, Some(PathBuf::from("run/complex.inpcrd")));
        assert_eq!(min1.trajectory, None);
        assert_eq!(min1.control, Path::new("run/complex_min1.in"));

        let md1 = plan.files(Stage::Md1);
        assert_eq!(md1.input_coordinates, Path::new("run/complex_min2.rst"));
        assert_eq!(md1.reference, Some(PathBuf::from("run/complex_min2.rst")));
        assert_eq!(md1.trajectory, Some(PathBuf::from("run/complex_md1.nc")));

        let md3 = plan.files(Stage::Md3);
        assert_eq!(md3.input_coordinates, Path::new("run/complex_md2.rst"));
        assert_eq!(md3.restart, Path::new("run/complex_md3.rst"));
        assert_eq!(md3.output, Path::new("run/complex_md3.out"));
        assert_eq!(md3.topology, Path::new("run/complex.prmtop"));
        assert!(md3.reference.is_none());
    }

    #[test]
    fn production_steps_use_two_femtosecond_time_step() {
        assert_eq!(params(false).nstlim(), 50_000_000);
    }

    #[test]
    fn render_deck_substitutes_known_placeholders() {
        let template = "{{base}}: {{length_ns}}ns MD\n irest = {{irest}}, ntx = {{ntx}},\n nstlim = {{nstlim}}, ntwx = {{coord_dump_freq}},\n temp0 = {{temperature}}\nRES 1 {{restrained_residues}}\n{{unknown}}\n";
        let deck = render_deck(template, "complex", &params(true));
        assert_eq!(
            deck,
            "complex: 100ns MD\n irest = 1, ntx = 7,\n nstlim = 50000000, ntwx = 5000,\n temp0 = 310\nRES 1 152\n{{unknown}}\n"
        );
    }

    #[test]
    fn fresh_velocities_set_irest_zero_and_ntx_one() {
        let deck = render_deck("{{irest}} {{ntx}}", "b", &params(false));
        assert_eq!(deck, "0 1");
    }

    #[test]
    fn write_control_deck_reads_template_by_stage_suffix() {
        let decks = tempdir().unwrap();
        let work = tempdir().unwrap();
        fs::write(decks.path().join("md2.in"), "{{base}} at {{temperature}} K\n").unwrap();
        let plan = StagePlan::new(work.path(), "lig");
        let files = plan.files(Stage::Md2);

        write_control_deck(decks.path(), &plan, &files, &params(false)).unwrap();

        assert_eq!(
            fs::read_to_string(work.path().join("lig_md2.in")).unwrap(),
            "lig at 310 K\n"
        );
    }

    #[test]
    fn missing_template_is_reported_with_stage() {
        let decks = tempdir().unwrap();
        let plan = StagePlan::new(decks.path(), "lig");
        let err = write_control_deck(decks.path(), &plan, &plan.files(Stage::Min1), &params(false))
            .unwrap_err();
        assert!(matches!(err, DeckError::Missing { stage: Stage::Min1, .. }));
    }
}
