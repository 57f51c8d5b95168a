use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileForceFieldConfig {
    pub definition: Option<String>,
    #[serde(default)]
    pub extra_standard_residues: Vec<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSolventConfig {
    pub enabled: Option<bool>,
    pub water_model: Option<String>,
    pub distance: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileLibraryConfig {
    #[serde(default)]
    pub prefixes: Vec<PathBuf>,
    pub force_user_libraries: Option<bool>,
    pub search_local: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePipelineConfig {
    pub work_dir: Option<PathBuf>,
    pub out_name: Option<String>,
    pub overwrite: Option<bool>,
    pub keep_hydrogens: Option<bool>,
    pub parm_only: Option<bool>,
    pub run_production: Option<bool>,
    pub interactive: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSimulationConfig {
    pub temperature: Option<f64>,
    pub production_length_ns: Option<f64>,
    pub keep_velocities: Option<bool>,
    pub coord_dump_freq: Option<u64>,
    pub control_deck_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileToolConfig {
    pub obabel: Option<PathBuf>,
    pub pdb4amber: Option<PathBuf>,
    pub antechamber: Option<PathBuf>,
    pub parmchk: Option<PathBuf>,
    pub tleap: Option<PathBuf>,
    pub pmemd: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub force_field: Option<FileForceFieldConfig>,
    pub solvent: Option<FileSolventConfig>,
    pub libraries: Option<FileLibraryConfig>,
    pub pipeline: Option<FilePipelineConfig>,
    pub simulation: Option<FileSimulationConfig>,
    pub tools: Option<FileToolConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn full_file_is_parsed_with_kebab_case_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("amberprep.toml");
        fs::write(
            &path,
            r#"
            [force-field]
            definition = "leaprc.protein.ff14SB"
            extra-standard-residues = ["HOH"]

            [solvent]
            water-model = "opc"
            distance = 10.0

            [libraries]
            prefixes = ["params/lig"]
            force-user-libraries = false

            [pipeline]
            out-name = "system"
            keep-hydrogens = true

            [simulation]
            production-length-ns = 50.0
            coord-dump-freq = 1000

            [tools]
            pmemd = "pmemd"
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();

        let ff = config.force_field.unwrap();
        assert_eq!(ff.definition.as_deref(), Some("leaprc.protein.ff14SB"));
        assert_eq!(ff.extra_standard_residues, vec!["HOH"]);
        assert_eq!(config.solvent.unwrap().distance, Some(10.0));
        let libraries = config.libraries.unwrap();
        assert_eq!(libraries.prefixes, vec![PathBuf::from("params/lig")]);
        assert_eq!(libraries.force_user_libraries, Some(false));
        assert_eq!(config.pipeline.unwrap().keep_hydrogens, Some(true));
        assert_eq!(config.simulation.unwrap().coord_dump_freq, Some(1000));
        assert_eq!(config.tools.unwrap().pmemd, Some(PathBuf::from("pmemd")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("amberprep.toml");
        fs::write(&path, "[solvent]\nwater-dist = 10.0\n").unwrap();

        let err = FileConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = FileConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
