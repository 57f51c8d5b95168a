use crate::core::forcefield::vocabulary::StandardVocabulary;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceFieldConfig {
    pub definition: String,               // Name tLEaP sources when no resolved path exists
    pub definition_path: Option<PathBuf>, // Resolved leaprc file, if it was found
    pub vocabulary: StandardVocabulary,   // Residue names the force field parameterizes
}

impl ForceFieldConfig {
    /// The argument of the `source` directive that loads this force field.
    pub fn leaprc(&self) -> String {
        self.definition_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| self.definition.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolventConfig {
    pub water_model: String,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryConfig {
    pub user_prefixes: Vec<PathBuf>,
    pub force_user_libraries: bool,
    pub search_local: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            user_prefixes: Vec::new(),
            force_user_libraries: true,
            search_local: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub work_dir: PathBuf,
    pub out_name: String,
    pub overwrite: bool,
    pub keep_hydrogens: bool,
    pub parm_only: bool,
    pub run_production: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub temperature: f64,
    pub production_length_ns: f64,
    pub keep_velocities: bool,
    pub coord_dump_freq: u64,
    pub control_deck_dir: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            temperature: 300.0,
            production_length_ns: 100.0,
            keep_velocities: false,
            coord_dump_freq: 5000,
            control_deck_dir: None,
        }
    }
}

/// Executables of the external collaborators, looked up on `PATH` unless absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub obabel: PathBuf,
    pub pdb4amber: PathBuf,
    pub antechamber: PathBuf,
    pub parmchk: PathBuf,
    pub tleap: PathBuf,
    pub pmemd: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            obabel: PathBuf::from("obabel"),
            pdb4amber: PathBuf::from("pdb4amber"),
            antechamber: PathBuf::from("antechamber"),
            parmchk: PathBuf::from("parmchk2"),
            tleap: PathBuf::from("tleap"),
            pmemd: PathBuf::from("pmemd.cuda"),
        }
    }
}

/// Immutable configuration of one preparation run, validated once by
/// [`PrepConfigBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrepConfig {
    pub structures: Vec<PathBuf>,
    pub force_field: ForceFieldConfig,
    pub solvent: Option<SolventConfig>,
    pub libraries: LibraryConfig,
    pub pipeline: PipelineConfig,
    pub simulation: SimulationConfig,
    pub tools: ToolPaths,
}

#[derive(Default)]
pub struct PrepConfigBuilder {
    structures: Vec<PathBuf>,
    force_field: Option<String>,
    force_field_path: Option<PathBuf>,
    vocabulary: Option<StandardVocabulary>,
    solvent: Option<SolventConfig>,
    libraries: LibraryConfig,
    work_dir: Option<PathBuf>,
    out_name: Option<String>,
    overwrite: Option<bool>,
    keep_hydrogens: bool,
    parm_only: bool,
    run_production: bool,
    simulation: SimulationConfig,
    tools: ToolPaths,
}

impl PrepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structures(mut self, paths: Vec<PathBuf>) -> Self {
        self.structures = paths;
        self
    }
    pub fn structure(mut self, path: PathBuf) -> Self {
        self.structures.push(path);
        self
    }
    pub fn force_field(mut self, definition: impl Into<String>) -> Self {
        self.force_field = Some(definition.into());
        self
    }
    pub fn force_field_path(mut self, path: Option<PathBuf>) -> Self {
        self.force_field_path = path;
        self
    }
    pub fn vocabulary(mut self, vocabulary: StandardVocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }
    pub fn solvent(mut self, solvent: Option<SolventConfig>) -> Self {
        self.solvent = solvent;
        self
    }
    pub fn user_library_prefixes(mut self, prefixes: Vec<PathBuf>) -> Self {
        self.libraries.user_prefixes = prefixes;
        self
    }
    pub fn force_user_libraries(mut self, force: bool) -> Self {
        self.libraries.force_user_libraries = force;
        self
    }
    pub fn search_local_libraries(mut self, search: bool) -> Self {
        self.libraries.search_local = search;
        self
    }
    pub fn work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }
    pub fn out_name(mut self, name: impl Into<String>) -> Self {
        self.out_name = Some(name.into());
        self
    }
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }
    pub fn keep_hydrogens(mut self, keep: bool) -> Self {
        self.keep_hydrogens = keep;
        self
    }
    pub fn parm_only(mut self, parm_only: bool) -> Self {
        self.parm_only = parm_only;
        self
    }
    pub fn run_production(mut self, run: bool) -> Self {
        self.run_production = run;
        self
    }
    pub fn simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }
    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn build(self) -> Result<PrepConfig, ConfigError> {
        if self.structures.is_empty() {
            return Err(ConfigError::MissingParameter("structures"));
        }
        if let Some(solvent) = &self.solvent {
            if solvent.distance.is_nan() || solvent.distance <= 0.0 {
                return Err(ConfigError::InvalidParameter {
                    name: "water_distance",
                    reason: format!("must be positive, got {}", solvent.distance),
                });
            }
        }
        let length = self.simulation.production_length_ns;
        if length.is_nan() || length <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "production_length_ns",
                reason: format!("must be positive, got {}", length),
            });
        }
        if self.simulation.coord_dump_freq == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "coord_dump_freq",
                reason: "must be at least 1".to_string(),
            });
        }

        let force_field = ForceFieldConfig {
            definition: self
                .force_field
                .ok_or(ConfigError::MissingParameter("force_field"))?,
            definition_path: self.force_field_path,
            vocabulary: self
                .vocabulary
                .ok_or(ConfigError::MissingParameter("vocabulary"))?,
        };
        let pipeline = PipelineConfig {
            work_dir: self
                .work_dir
                .ok_or(ConfigError::MissingParameter("work_dir"))?,
            out_name: self.out_name.unwrap_or_else(|| "complex".to_string()),
            overwrite: self.overwrite.unwrap_or(true),
            keep_hydrogens: self.keep_hydrogens,
            parm_only: self.parm_only,
            run_production: self.run_production,
        };
        Ok(PrepConfig {
            structures: self.structures,
            force_field,
            solvent: self.solvent,
            libraries: self.libraries,
            pipeline,
            simulation: self.simulation,
            tools: self.tools,
        })
    }
}
