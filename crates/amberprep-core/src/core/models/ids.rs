use slotmap::new_key_type;

new_key_type! {
    /// Stable handle of an atom inside one [`Structure`](super::structure::Structure).
    pub struct AtomId;
    /// Stable handle of a residue inside one structure.
    pub struct ResidueId;
    /// Stable handle of a chain inside one structure.
    pub struct ChainId;
}
