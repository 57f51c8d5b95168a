use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::config::ConfigError;
use super::leap::LeapScriptError;
use super::stages::{DeckError, Stage};
use super::tools::ToolError;
use crate::core::forcefield::vocabulary::VocabularyError;
use crate::core::io::mol2::Mol2Error;
use crate::core::io::pdb::PdbError;
use crate::core::library::contents::LibraryLoadError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Input structure '{path}' does not exist")]
    MissingInput { path: PathBuf },

    #[error(
        "Undefined units {} in protein '{structure}'; check for modified residues, ions, or cofactors and provide a library for them",
        units.join(" ")
    )]
    UnresolvedProteinUnits {
        structure: String,
        units: Vec<String>,
    },

    #[error(
        "'{structure}' has multiple ligands ({}); split them into separate files",
        units.join(" ")
    )]
    MultipleLigands {
        structure: String,
        units: Vec<String>,
    },

    #[error("External tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("Preparation aborted during review of '{structure}'")]
    ReviewAborted { structure: String },

    #[error("Control deck for stage {stage} not found at '{path}'")]
    MissingControlDeck { stage: Stage, path: PathBuf },

    #[error("PDB error in '{path}': {source}")]
    Pdb {
        path: PathBuf,
        #[source]
        source: PdbError,
    },

    #[error("MOL2 error in '{path}': {source}")]
    Mol2 {
        path: PathBuf,
        #[source]
        source: Mol2Error,
    },

    #[error("Library error: {0}")]
    Library(#[from] LibraryLoadError),

    #[error("Force field vocabulary error: {0}")]
    Vocabulary(#[from] VocabularyError),

    #[error("tLEaP script error: {0}")]
    LeapScript(#[from] LeapScriptError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| EngineError::Io { path, source }
    }

    pub(crate) fn pdb(path: impl Into<PathBuf>) -> impl FnOnce(PdbError) -> Self {
        let path = path.into();
        move |source| EngineError::Pdb { path, source }
    }
}

impl From<DeckError> for EngineError {
    fn from(error: DeckError) -> Self {
        match error {
            DeckError::Missing { stage, path } => EngineError::MissingControlDeck { stage, path },
            DeckError::Write { path, source } => EngineError::Io { path, source },
        }
    }
}
