//! # Core Module
//!
//! This module provides the fundamental building blocks used by the preparation engine:
//! the in-memory structure model, file I/O, and the knowledge of which residue units a
//! force field or a parameter library defines.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Atoms, residues, chains and whole structures
//! - **File I/O** ([`io`]) - Reading and writing PDB files, net charges from MOL2 files
//! - **Library Files** ([`library`]) - Unit definitions found in OFF/LIB and PREP files
//! - **Force Field Vocabulary** ([`forcefield`]) - Residue names a force field already knows
//! - **Utilities** ([`utils`]) - Residue identifiers and output path helpers
//!
//! Nothing in this module invokes an external program; every type here is either a pure
//! value or a reader/writer over `std::io` streams.

pub mod forcefield;
pub mod io;
pub mod library;
pub mod models;
pub mod utils;
