use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileSolventConfig};
use super::models::AppConfig;
use crate::cli::{InputArgs, RunArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use amberprep::core::forcefield::vocabulary::StandardVocabulary;
use amberprep::engine::config as core_config;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Process environment consulted while building the configuration.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub amberhome: Option<PathBuf>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            amberhome: std::env::var_os("AMBERHOME")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    fn leap_dir(&self) -> Option<PathBuf> {
        self.amberhome.as_ref().map(|home| home.join("dat").join("leap"))
    }
}

/// Merges command-line flags, `--set` overrides, the config file and the defaults, in that
/// order of priority. `run` is `None` for commands that never simulate.
pub fn build_config(
    input: &InputArgs,
    run: Option<&RunArgs>,
    env: &Environment,
) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let no_run = RunArgs::default();
    let run_args = run.unwrap_or(&no_run);

    let file_config = match &input.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let mut file_config = apply_set_values(file_config, &input.set_values)?;

    let ff_file = file_config.force_field.take().unwrap_or_default();
    let solvent_file = file_config.solvent.take().unwrap_or_default();
    let libraries_file = file_config.libraries.take().unwrap_or_default();
    let pipeline_file = file_config.pipeline.take().unwrap_or_default();
    let sim_file = file_config.simulation.take().unwrap_or_default();
    let tools_file = file_config.tools.take().unwrap_or_default();

    if env.amberhome.is_none() {
        warn!("AMBERHOME is not set; force field files cannot be located.");
    }

    let force_field_name = input
        .force_field
        .clone()
        .or(ff_file.definition)
        .unwrap_or_else(|| defaults.force_field.clone());
    let force_field_path = resolve_force_field(&force_field_name, env);
    let mut vocabulary = load_vocabulary(force_field_path.as_deref(), env);
    vocabulary.extend(ff_file.extra_standard_residues);
    if vocabulary.is_empty() {
        warn!("The standard residue vocabulary is empty; every residue will be treated as non-standard.");
    } else {
        info!(units = vocabulary.len(), "Standard residue vocabulary loaded");
    }

    let solvent = merge_solvent(run_args, solvent_file, &defaults);

    let user_prefixes = if input.libs.is_empty() {
        libraries_file.prefixes
    } else {
        input.libs.clone()
    };

    let overwrite = !input.no_overwrite
        && pipeline_file.overwrite.unwrap_or(defaults.overwrite);
    let simulation = core_config::SimulationConfig {
        temperature: run_args
            .temperature
            .or(sim_file.temperature)
            .unwrap_or(defaults.temperature),
        production_length_ns: run_args
            .prod_length
            .or(sim_file.production_length_ns)
            .unwrap_or(defaults.production_length_ns),
        keep_velocities: run_args.keep_velocities || sim_file.keep_velocities.unwrap_or(false),
        coord_dump_freq: run_args
            .coord_dump_freq
            .or(sim_file.coord_dump_freq)
            .unwrap_or(defaults.coord_dump_freq),
        control_deck_dir: run_args
            .control_decks
            .clone()
            .or(sim_file.control_deck_dir),
    };

    let tool_defaults = core_config::ToolPaths::default();
    let tools = core_config::ToolPaths {
        obabel: tools_file.obabel.unwrap_or(tool_defaults.obabel),
        pdb4amber: tools_file.pdb4amber.unwrap_or(tool_defaults.pdb4amber),
        antechamber: tools_file.antechamber.unwrap_or(tool_defaults.antechamber),
        parmchk: tools_file.parmchk.unwrap_or(tool_defaults.parmchk),
        tleap: tools_file.tleap.unwrap_or(tool_defaults.tleap),
        pmemd: tools_file.pmemd.unwrap_or(tool_defaults.pmemd),
    };

    let interactive =
        run.is_some() && !run_args.uninteractive && pipeline_file.interactive.unwrap_or(true);

    let core_config = core_config::PrepConfigBuilder::new()
        .structures(input.structures.clone())
        .force_field(force_field_name)
        .force_field_path(force_field_path)
        .vocabulary(vocabulary)
        .solvent(solvent)
        .user_library_prefixes(user_prefixes)
        .force_user_libraries(
            libraries_file
                .force_user_libraries
                .unwrap_or(defaults.force_user_libraries),
        )
        .search_local_libraries(
            libraries_file
                .search_local
                .unwrap_or(defaults.search_local_libraries),
        )
        .work_dir(
            input
                .work_dir
                .clone()
                .or(pipeline_file.work_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
        )
        .out_name(
            input
                .out_name
                .clone()
                .or(pipeline_file.out_name)
                .unwrap_or_else(|| defaults.out_name.clone()),
        )
        .overwrite(overwrite)
        .keep_hydrogens(input.keep_hydrogens || pipeline_file.keep_hydrogens.unwrap_or(false))
        .parm_only(run_args.parm_only || pipeline_file.parm_only.unwrap_or(false))
        .run_production(run_args.run_production || pipeline_file.run_production.unwrap_or(false))
        .simulation(simulation)
        .tools(tools)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!("Final configuration: {:?}", core_config);
    Ok(AppConfig {
        core_config,
        interactive,
    })
}

/// Locates the leaprc for `name`: an existing path as given, otherwise
/// `<AMBERHOME>/dat/leap/cmd/<name>`.
fn resolve_force_field(name: &str, env: &Environment) -> Option<PathBuf> {
    let direct = Path::new(name);
    if direct.is_file() {
        return Some(direct.to_path_buf());
    }
    let candidate = env.leap_dir()?.join("cmd").join(name);
    if candidate.is_file() {
        Some(candidate)
    } else {
        warn!(
            force_field = name,
            "Force field definition not found under AMBERHOME; tLEaP will have to resolve it."
        );
        None
    }
}

fn load_vocabulary(definition: Option<&Path>, env: &Environment) -> StandardVocabulary {
    let Some(definition) = definition else {
        return StandardVocabulary::default();
    };
    let leap_dir = env.leap_dir().or_else(|| {
        definition
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    });
    let Some(leap_dir) = leap_dir else {
        return StandardVocabulary::default();
    };
    match StandardVocabulary::from_leaprc(definition, &leap_dir) {
        Ok(vocabulary) => vocabulary,
        Err(e) => {
            warn!("Could not read the standard residues of the force field: {}", e);
            StandardVocabulary::default()
        }
    }
}

fn merge_solvent(
    run: &RunArgs,
    file: FileSolventConfig,
    defaults: &DefaultsConfig,
) -> Option<core_config::SolventConfig> {
    if run.no_solvent || !file.enabled.unwrap_or(defaults.solvate) {
        return None;
    }
    let water_model = run
        .water_model
        .clone()
        .or(file.water_model)
        .unwrap_or_else(|| defaults.water_model.clone());
    Some(core_config::SolventConfig {
        water_model: parser::resolve_water_model(&water_model),
        distance: run
            .water_dist
            .or(file.distance)
            .unwrap_or(defaults.water_distance),
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        apply_set_value(&mut config, kv_pair).map_err(|e| CliError::Config(e.to_string()))?;
    }
    Ok(config)
}

fn apply_set_value(config: &mut FileConfig, kv_pair: &str) -> std::result::Result<(), ParseError> {
    let (key, value) = parser::parse_key_value(kv_pair)?;
    let path = || Some(PathBuf::from(value));

    match key {
        "force-field.definition" => {
            config.force_field.get_or_insert_with(Default::default).definition =
                Some(value.to_string());
        }
        "solvent.enabled" => {
            config.solvent.get_or_insert_with(Default::default).enabled =
                Some(parser::parse_value(key, value)?);
        }
        "solvent.water-model" => {
            config.solvent.get_or_insert_with(Default::default).water_model =
                Some(value.to_string());
        }
        "solvent.distance" => {
            config.solvent.get_or_insert_with(Default::default).distance =
                Some(parser::parse_value(key, value)?);
        }
        "libraries.force-user-libraries" => {
            config
                .libraries
                .get_or_insert_with(Default::default)
                .force_user_libraries = Some(parser::parse_value(key, value)?);
        }
        "libraries.search-local" => {
            config.libraries.get_or_insert_with(Default::default).search_local =
                Some(parser::parse_value(key, value)?);
        }
        "pipeline.work-dir" => {
            config.pipeline.get_or_insert_with(Default::default).work_dir = path();
        }
        "pipeline.out-name" => {
            config.pipeline.get_or_insert_with(Default::default).out_name =
                Some(value.to_string());
        }
        "pipeline.overwrite" => {
            config.pipeline.get_or_insert_with(Default::default).overwrite =
                Some(parser::parse_value(key, value)?);
        }
        "pipeline.keep-hydrogens" => {
            config.pipeline.get_or_insert_with(Default::default).keep_hydrogens =
                Some(parser::parse_value(key, value)?);
        }
        "pipeline.parm-only" => {
            config.pipeline.get_or_insert_with(Default::default).parm_only =
                Some(parser::parse_value(key, value)?);
        }
        "pipeline.run-production" => {
            config.pipeline.get_or_insert_with(Default::default).run_production =
                Some(parser::parse_value(key, value)?);
        }
        "pipeline.interactive" => {
            config.pipeline.get_or_insert_with(Default::default).interactive =
                Some(parser::parse_value(key, value)?);
        }
        "simulation.temperature" => {
            config.simulation.get_or_insert_with(Default::default).temperature =
                Some(parser::parse_value(key, value)?);
        }
        "simulation.production-length-ns" => {
            config
                .simulation
                .get_or_insert_with(Default::default)
                .production_length_ns = Some(parser::parse_value(key, value)?);
        }
        "simulation.keep-velocities" => {
            config
                .simulation
                .get_or_insert_with(Default::default)
                .keep_velocities = Some(parser::parse_value(key, value)?);
        }
        "simulation.coord-dump-freq" => {
            config
                .simulation
                .get_or_insert_with(Default::default)
                .coord_dump_freq = Some(parser::parse_value(key, value)?);
        }
        "simulation.control-deck-dir" => {
            config
                .simulation
                .get_or_insert_with(Default::default)
                .control_deck_dir = path();
        }
        _ => {
            let tools = config.tools.get_or_insert_with(Default::default);
            let slot = match key {
                "tools.obabel" => &mut tools.obabel,
                "tools.pdb4amber" => &mut tools.pdb4amber,
                "tools.antechamber" => &mut tools.antechamber,
                "tools.parmchk" => &mut tools.parmchk,
                "tools.tleap" => &mut tools.tleap,
                "tools.pmemd" => &mut tools.pmemd,
                _ => return Err(ParseError::UnsupportedKey(key.to_string())),
            };
            *slot = path();
        }
    }
    Ok(())
}
