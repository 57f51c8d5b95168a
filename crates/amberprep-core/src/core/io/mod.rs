//! Provides input/output functionality for molecular file formats.
//!
//! Structures travel between the pipeline and the external AMBER tools as PDB files, so
//! [`pdb`] implements both directions through the [`traits::MolecularFile`] interface.
//! MOL2 files are only ever read back to obtain the net formal charge of a ligand after
//! partial charges were assigned, which is what [`mol2`] provides.

pub mod mol2;
pub mod pdb;
pub mod traits;
