//! # AmberPrep Core Library
//!
//! Resolution of residue parameter libraries and derivation of missing parameters for
//! preparing AMBER molecular dynamics inputs from one or more molecular structures.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture so that the decision logic can be
//! tested without any of the external AMBER programs being installed.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`), PDB and MOL2 I/O,
//!   parsers for residue library files (OFF/LIB and PREP), and the standard-residue
//!   vocabulary of a force field.
//!
//! - **[`engine`]: The Logic Core.** Residue classification, library matching with its
//!   priority and redefinition rules, the semi-empirical derivation fallback, system
//!   assembly, tLEaP script generation, the MD stage plan, and the traits through which
//!   external tools are invoked.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into the complete
//!   preparation pipeline and a read-only survey of what the pipeline would do.

pub mod core;
pub mod engine;
pub mod workflows;
