use super::ids::{AtomId, ChainId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub seq: isize,                         // Residue sequence number from source file
    pub name: String,                       // Unit name of the residue (e.g., "ALA", "LIG")
    pub chain_id: ChainId,                  // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>,          // Atoms of this residue in file order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its stable ID
    duplicate_names: usize,                 // Number of atoms whose name was already taken
}

impl Residue {
    pub(crate) fn new(seq: isize, name: &str, chain_id: ChainId) -> Self {
        Self {
            seq,
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
            duplicate_names: 0,
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        if self
            .atom_name_map
            .insert(atom_name.to_string(), atom_id)
            .is_some()
        {
            self.duplicate_names += 1;
        }
    }

    pub(crate) fn reindex_names<'a>(&mut self, names: impl Iterator<Item = (&'a str, AtomId)>) {
        self.atom_name_map.clear();
        self.duplicate_names = 0;
        for (name, atom_id) in names {
            if self.atom_name_map.insert(name.to_string(), atom_id).is_some() {
                self.duplicate_names += 1;
            }
        }
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }

    pub fn has_unique_atom_names(&self) -> bool {
        self.duplicate_names == 0
    }
}
