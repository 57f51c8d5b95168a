//! # Workflows Module
//!
//! High-level entry points that turn one or more molecular structures into AMBER
//! topology and coordinate files, optionally followed by the staged MD protocol.
//!
//! ## Architecture
//!
//! - **Preparation Workflow** ([`prepare`]) - The complete pipeline: input conversion,
//!   residue classification, library matching, parameter derivation for a single
//!   unresolved ligand, system assembly, tLEaP topology generation and the MD stages.
//!   External programs are reached only through [`crate::engine::tools::Collaborators`].
//! - **Survey Workflow** ([`survey`]) - A read-only dry run of classification and library
//!   matching that reports what the preparation workflow would have to do, without
//!   invoking any external program.

pub mod prepare;
pub mod survey;
