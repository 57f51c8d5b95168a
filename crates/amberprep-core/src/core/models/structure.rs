use super::atom::{Atom, RecordType};
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::Residue;
use crate::core::utils::identifiers::is_amino_acid;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::{BTreeMap, BTreeSet};

/// Longest atom name that still fits the PDB atom-name field.
const MAX_ATOM_NAME_LEN: usize = 4;

/// An in-memory molecular structure: ordered chains of residues of atoms.
///
/// Records keep the order in which they were read, which is also the order in which they
/// are written back. Chains are not merged by identifier, so composing a receptor and a
/// ligand that both use chain `A` still writes every receptor record before the first
/// ligand record.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Primary storage for atoms.
    atoms: SlotMap<AtomId, Atom>,
    /// Primary storage for residues.
    residues: SlotMap<ResidueId, Residue>,
    /// Primary storage for chains.
    chains: SlotMap<ChainId, Chain>,
    /// Chain order as read from the source file.
    chain_order: Vec<ChainId>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an atom by its ID.
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Retrieves a mutable atom by its ID.
    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.atoms.get_mut(id)
    }

    /// Retrieves a residue by its ID.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    /// Retrieves a chain by its ID.
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Returns the chains in file order.
    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order.iter().map(|&id| (id, &self.chains[id]))
    }

    /// Returns the residues in file order.
    pub fn residues(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains()
            .flat_map(|(_, chain)| chain.residues.iter())
            .map(|&id| (id, &self.residues[id]))
    }

    /// Returns the atoms in file order.
    pub fn atoms(&self) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residues()
            .flat_map(|(_, residue)| residue.atoms.iter())
            .map(|&id| (id, &self.atoms[id]))
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Appends a new chain after all existing chains.
    pub fn add_chain(&mut self, id: char) -> ChainId {
        let chain_id = self.chains.insert(Chain::new(id));
        self.chain_order.push(chain_id);
        chain_id
    }

    /// Appends a new residue to the end of a chain.
    ///
    /// # Return
    ///
    /// Returns `None` if the chain does not exist.
    pub fn add_residue(&mut self, chain_id: ChainId, seq: isize, name: &str) -> Option<ResidueId> {
        if !self.chains.contains_key(chain_id) {
            return None;
        }
        let residue_id = self.residues.insert(Residue::new(seq, name, chain_id));
        self.chains[chain_id].residues.push(residue_id);
        Some(residue_id)
    }

    /// Appends an atom to the end of a residue.
    ///
    /// The atom's `residue_id` is overwritten with `residue_id`.
    ///
    /// # Return
    ///
    /// Returns `None` if the residue does not exist.
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        if !self.residues.contains_key(residue_id) {
            return None;
        }
        atom.residue_id = residue_id;
        let name = atom.name.clone();
        let atom_id = self.atoms.insert(atom);
        self.residues[residue_id].add_atom(&name, atom_id);
        Some(atom_id)
    }

    /// The set of distinct residue names in the structure.
    ///
    /// This is derived on every call, so it always reflects the current state after
    /// renaming operations.
    pub fn residue_names(&self) -> BTreeSet<String> {
        self.residues.values().map(|r| r.name.clone()).collect()
    }

    /// The set of atom names carried by all residues named `unit`.
    pub fn atom_names_of(&self, unit: &str) -> BTreeSet<String> {
        self.residues
            .values()
            .filter(|r| r.name == unit)
            .flat_map(|r| r.atoms.iter())
            .map(|&id| self.atoms[id].name.clone())
            .collect()
    }

    /// Whether every residue has unique atom names.
    pub fn has_unique_atom_names(&self) -> bool {
        self.residues.values().all(Residue::has_unique_atom_names)
    }

    /// Whether the structure contains at least one standard amino-acid residue.
    pub fn is_protein(&self) -> bool {
        self.residues.values().any(|r| is_amino_acid(&r.name))
    }

    /// Number of distinct residues that carry at least one `ATOM` record.
    pub fn polymer_residue_count(&self) -> usize {
        self.residues
            .values()
            .filter(|r| {
                r.atoms
                    .iter()
                    .any(|&id| self.atoms[id].record_type == RecordType::Atom)
            })
            .count()
    }

    /// Highest atom serial in the structure, or zero when it is empty.
    pub fn max_serial(&self) -> usize {
        self.atoms.values().map(|a| a.serial).max().unwrap_or(0)
    }

    /// Highest residue sequence number in the structure, or zero when it is empty.
    pub fn max_residue_seq(&self) -> isize {
        self.residues.values().map(|r| r.seq).max().unwrap_or(0)
    }

    /// Renames every atom to its element symbol followed by a per-residue, per-element
    /// running index (`C1`, `C2`, `O1`, ...).
    pub fn rename_atoms(&mut self) {
        let residue_ids: Vec<ResidueId> = self.residues().map(|(id, _)| id).collect();
        for residue_id in residue_ids {
            let atom_ids = self.residues[residue_id].atoms.clone();
            let mut counters: BTreeMap<String, usize> = BTreeMap::new();
            for &atom_id in &atom_ids {
                let atom = &mut self.atoms[atom_id];
                let element = atom.element_or_inferred();
                let symbol = if element.is_empty() { "X".to_string() } else { element };
                let counter = counters.entry(symbol.clone()).or_insert(0);
                *counter += 1;
                let mut name = format!("{}{}", symbol.to_ascii_uppercase(), counter);
                name.truncate(MAX_ATOM_NAME_LEN);
                atom.name = name;
            }
            self.reindex_residue(residue_id);
        }
    }

    /// Sets the residue name of every residue.
    pub fn set_residue_name(&mut self, name: &str) {
        for residue in self.residues.values_mut() {
            residue.name = name.to_string();
        }
    }

    /// Sets the record type of every atom.
    pub fn set_record_type(&mut self, record_type: RecordType) {
        for atom in self.atoms.values_mut() {
            atom.record_type = record_type;
        }
    }

    /// Normalizes a structure before it is handed to a parameterization tool.
    ///
    /// Missing element symbols are filled in from the atom names, atoms are renamed when
    /// any residue repeats an atom name, and atoms of residues that are not standard amino
    /// acids become `HETATM` records.
    pub fn sanitize(&mut self) {
        for atom in self.atoms.values_mut() {
            if atom.element.is_empty() {
                atom.element = atom.element_or_inferred();
            }
        }
        if !self.has_unique_atom_names() {
            self.rename_atoms();
        }
        for residue in self.residues.values() {
            if is_amino_acid(&residue.name) {
                continue;
            }
            for &atom_id in &residue.atoms {
                self.atoms[atom_id].record_type = RecordType::Hetatm;
            }
        }
    }

    /// Appends all chains, residues and atoms of `other` after the records of `self`.
    ///
    /// Appended atoms are numbered consecutively after the current highest serial, and
    /// residue sequence numbers are shifted to continue after the current maximum. The
    /// existing records keep their numbering.
    pub fn append(&mut self, other: &Structure) {
        let mut next_serial = self.max_serial() + 1;
        let first_other_seq = other.residues().map(|(_, r)| r.seq).next().unwrap_or(1);
        let seq_offset = self.max_residue_seq() + 1 - first_other_seq;
        let shift_seq = !self.is_empty();

        for (_, chain) in other.chains() {
            let chain_id = self.add_chain(chain.id);
            for &residue_id in &chain.residues {
                let residue = &other.residues[residue_id];
                let seq = if shift_seq { residue.seq + seq_offset } else { residue.seq };
                let Some(new_residue_id) = self.add_residue(chain_id, seq, &residue.name) else {
                    continue;
                };
                for &atom_id in &residue.atoms {
                    let mut atom = other.atoms[atom_id].clone();
                    atom.serial = next_serial;
                    next_serial += 1;
                    self.add_atom_to_residue(new_residue_id, atom);
                }
            }
        }
    }

    fn reindex_residue(&mut self, residue_id: ResidueId) {
        let atoms = &self.atoms;
        let residue = &mut self.residues[residue_id];
        let ids = residue.atoms.clone();
        residue.reindex_names(ids.iter().map(|&id| (atoms[id].name.as_str(), id)));
    }
}

/// Incremental builder used by file readers to construct a [`Structure`] record by record.
#[derive(Debug, Default)]
pub struct StructureBuilder {
    structure: Structure,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_chain(&mut self, id: char) {
        self.current_chain = Some(self.structure.add_chain(id));
        self.current_residue = None;
    }

    pub fn start_residue(&mut self, seq: isize, name: &str) {
        let chain_id = match self.current_chain {
            Some(id) => id,
            None => {
                let id = self.structure.add_chain(' ');
                self.current_chain = Some(id);
                id
            }
        };
        self.current_residue = self.structure.add_residue(chain_id, seq, name);
    }

    pub fn add_atom(
        &mut self,
        serial: usize,
        name: &str,
        element: &str,
        position: Point3<f64>,
        record_type: RecordType,
    ) -> Option<AtomId> {
        let residue_id = self.current_residue?;
        let mut atom = Atom::new(serial, name, residue_id, position);
        atom.element = element.to_string();
        atom.record_type = record_type;
        self.structure.add_atom_to_residue(residue_id, atom)
    }

    pub fn atom_mut(&mut self, id: AtomId) -> Option<&mut Atom> {
        self.structure.atom_mut(id)
    }

    pub fn build(self) -> Structure {
        self.structure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ligand_with_duplicate_names() -> Structure {
        let mut builder = StructureBuilder::new();
        builder.start_chain('A');
        builder.start_residue(1, "UNL");
        builder.add_atom(1, "C", "C", Point3::new(0.0, 0.0, 0.0), RecordType::Atom);
        builder.add_atom(2, "C", "C", Point3::new(1.5, 0.0, 0.0), RecordType::Atom);
        builder.add_atom(3, "O", "", Point3::new(2.0, 1.0, 0.0), RecordType::Atom);
        builder.build()
    }

    fn dipeptide() -> Structure {
        let mut builder = StructureBuilder::new();
        builder.start_chain('A');
        builder.start_residue(1, "ALA");
        builder.add_atom(1, "N", "N", Point3::origin(), RecordType::Atom);
        builder.add_atom(2, "CA", "C", Point3::origin(), RecordType::Atom);
        builder.start_residue(2, "GLY");
        builder.add_atom(3, "N", "N", Point3::origin(), RecordType::Atom);
        builder.add_atom(4, "CA", "C", Point3::origin(), RecordType::Atom);
        builder.build()
    }

    #[test]
    fn builder_preserves_file_order() {
        let structure = dipeptide();
        let serials: Vec<usize> = structure.atoms().map(|(_, a)| a.serial).collect();
        assert_eq!(serials, vec![1, 2, 3, 4]);
        let names: Vec<&str> = structure.residues().map(|(_, r)| r.name.as_str()).collect();
        assert_eq!(names, vec!["ALA", "GLY"]);
    }

    #[test]
    fn builder_without_chain_uses_blank_chain() {
        let mut builder = StructureBuilder::new();
        builder.start_residue(1, "LIG");
        builder.add_atom(1, "C1", "C", Point3::origin(), RecordType::Hetatm);
        let structure = builder.build();
        let (_, chain) = structure.chains().next().unwrap();
        assert_eq!(chain.id, ' ');
    }

    #[test]
    fn add_atom_without_residue_returns_none() {
        let mut builder = StructureBuilder::new();
        builder.start_chain('A');
        assert!(
            builder
                .add_atom(1, "C1", "C", Point3::origin(), RecordType::Atom)
                .is_none()
        );
    }

    #[test]
    fn residue_names_reflect_current_state() {
        let mut structure = dipeptide();
        assert_eq!(
            structure.residue_names(),
            BTreeSet::from(["ALA".to_string(), "GLY".to_string()])
        );
        structure.set_residue_name("LIG");
        assert_eq!(structure.residue_names(), BTreeSet::from(["LIG".to_string()]));
    }

    #[test]
    fn atom_names_of_collects_names_across_residues_with_same_name() {
        let structure = dipeptide();
        assert_eq!(
            structure.atom_names_of("ALA"),
            BTreeSet::from(["N".to_string(), "CA".to_string()])
        );
        assert!(structure.atom_names_of("TRP").is_empty());
    }

    #[test]
    fn is_protein_detects_amino_acids() {
        assert!(dipeptide().is_protein());
        assert!(!ligand_with_duplicate_names().is_protein());
    }

    #[test]
    fn rename_atoms_produces_unique_element_indexed_names() {
        let mut structure = ligand_with_duplicate_names();
        assert!(!structure.has_unique_atom_names());

        structure.rename_atoms();

        let names: Vec<String> = structure.atoms().map(|(_, a)| a.name.clone()).collect();
        assert_eq!(names, vec!["C1", "C2", "O1"]);
        assert!(structure.has_unique_atom_names());
    }

    #[test]
    fn sanitize_fills_elements_renames_and_marks_hetatm() {
        let mut structure = ligand_with_duplicate_names();
        structure.sanitize();

        assert!(structure.has_unique_atom_names());
        for (_, atom) in structure.atoms() {
            assert_eq!(atom.record_type, RecordType::Hetatm);
            assert!(!atom.element.is_empty());
        }
    }

    #[test]
    fn sanitize_keeps_amino_acid_records_and_unique_names() {
        let mut structure = dipeptide();
        structure.sanitize();
        let names: Vec<String> = structure.atoms().map(|(_, a)| a.name.clone()).collect();
        assert_eq!(names, vec!["N", "CA", "N", "CA"]);
        assert!(
            structure
                .atoms()
                .all(|(_, a)| a.record_type == RecordType::Atom)
        );
    }

    #[test]
    fn set_record_type_rewrites_every_atom() {
        let mut structure = dipeptide();
        structure.set_record_type(RecordType::Hetatm);
        assert_eq!(structure.polymer_residue_count(), 0);
    }

    #[test]
    fn append_continues_numbering_after_existing_records() {
        let mut receptor = dipeptide();
        let mut ligand = ligand_with_duplicate_names();
        ligand.sanitize();

        receptor.append(&ligand);

        let serials: Vec<usize> = receptor.atoms().map(|(_, a)| a.serial).collect();
        assert_eq!(serials, vec![1, 2, 3, 4, 5, 6, 7]);
        let seqs: Vec<(String, isize)> = receptor
            .residues()
            .map(|(_, r)| (r.name.clone(), r.seq))
            .collect();
        assert_eq!(
            seqs,
            vec![
                ("ALA".to_string(), 1),
                ("GLY".to_string(), 2),
                ("UNL".to_string(), 3)
            ]
        );
        assert_eq!(receptor.chains().count(), 2);
    }

    #[test]
    fn append_renumbers_atoms_cut_from_a_larger_file() {
        let mut receptor = dipeptide();
        let mut builder = StructureBuilder::new();
        builder.start_chain('X');
        builder.start_residue(412, "LIG");
        builder.add_atom(2345, "C1", "C", Point3::origin(), RecordType::Hetatm);
        builder.add_atom(2346, "O1", "O", Point3::origin(), RecordType::Hetatm);
        let ligand = builder.build();

        receptor.append(&ligand);

        let serials: Vec<usize> = receptor.atoms().map(|(_, a)| a.serial).collect();
        assert_eq!(serials, vec![1, 2, 3, 4, 5, 6]);
        let seqs: Vec<isize> = receptor.residues().map(|(_, r)| r.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn append_into_empty_structure_keeps_numbering() {
        let mut composite = Structure::new();
        composite.append(&dipeptide());
        let seqs: Vec<isize> = composite.residues().map(|(_, r)| r.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(composite.max_serial(), 4);
    }

    #[test]
    fn polymer_residue_count_ignores_hetatm_residues() {
        let mut receptor = dipeptide();
        let mut ligand = ligand_with_duplicate_names();
        ligand.set_record_type(RecordType::Hetatm);
        receptor.append(&ligand);
        assert_eq!(receptor.polymer_residue_count(), 2);
    }
}
