//! # Core Models Module
//!
//! This module contains the data structures used to represent a molecular structure as it
//! moves through the preparation pipeline.
//!
//! ## Key Components
//!
//! - [`atom`] - Individual atom records with coordinates, element and record type
//! - [`residue`] - Residues grouping atoms under a unit name and sequence number
//! - [`chain`] - Chains grouping residues in file order
//! - [`structure`] - A complete structure with inspection, renaming and composition
//! - [`ids`] - Stable identifiers for atoms, residues, and chains
//!
//! ## Usage
//!
//! ```ignore
//! use amberprep::core::models::structure::StructureBuilder;
//! use amberprep::core::models::atom::RecordType;
//!
//! let mut builder = StructureBuilder::new();
//! builder.start_chain('A');
//! builder.start_residue(1, "LIG");
//! builder.add_atom(1, "C1", "C", Point3::new(0.0, 0.0, 0.0), RecordType::Hetatm);
//! let structure = builder.build();
//! assert!(structure.residue_names().contains("LIG"));
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
