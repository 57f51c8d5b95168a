//! # Engine Module
//!
//! This module implements the decision logic of AMBER input preparation: which residues
//! need parameters, which libraries supply them, when to derive new ones, and how several
//! structures become one system.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The immutable run configuration and its builder
//! - **Error Handling** ([`error`]) - The error taxonomy shared by all pipeline steps
//! - **Progress Monitoring** ([`progress`]) - Phase and tool events for front ends
//! - **Review Gate** ([`review`]) - Injectable operator confirmation after normalization
//! - **Residue Classifier** ([`classifier`]) - Non-standard residues by vocabulary difference
//! - **Library Matcher** ([`matcher`]) - Prioritized, value-returning library resolution
//! - **Parameter Derivation** ([`derivation`]) - Fallback parameterization of one ligand unit
//! - **System Assembler** ([`assembler`]) - Composition of prepared structures
//! - **tLEaP Scripts** ([`leap`]) - Command scripts for topology generation
//! - **MD Stages** ([`stages`]) - File naming and control decks of the staged MD protocol
//! - **External Tools** ([`tools`]) - Collaborator traits and their AmberTools implementation
//!
//! Everything that touches an external program goes through [`tools`]; the remaining
//! modules only read and write files.

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod derivation;
pub mod error;
pub mod leap;
pub mod matcher;
pub mod progress;
pub mod review;
pub mod stages;
pub mod tools;
