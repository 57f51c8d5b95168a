//! Force field knowledge needed for residue classification.
//!
//! [`vocabulary::StandardVocabulary`] holds the residue names a tLEaP force field
//! definition already provides parameters for.

pub mod vocabulary;
