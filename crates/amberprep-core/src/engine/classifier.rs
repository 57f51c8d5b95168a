use crate::core::forcefield::vocabulary::StandardVocabulary;
use crate::core::models::structure::Structure;
use std::collections::BTreeSet;

/// Residue names of `structure` the force field has no parameters for.
pub fn classify(structure: &Structure, vocabulary: &StandardVocabulary) -> BTreeSet<String> {
    orphaned_names(&structure.residue_names(), vocabulary)
}

/// Set difference of `residues` and the standard vocabulary.
pub fn orphaned_names(
    residues: &BTreeSet<String>,
    vocabulary: &StandardVocabulary,
) -> BTreeSet<String> {
    residues
        .iter()
        .filter(|name| !vocabulary.contains(name))
        .cloned()
        .collect()
}
