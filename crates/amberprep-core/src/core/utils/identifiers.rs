use phf::{Set, phf_set};
use std::path::Path;

/// Residue names treated as amino acids when deciding whether a structure is a protein.
///
/// Besides the twenty canonical residues this includes the protonation and disulfide
/// variants used by the AMBER protein force fields, and their N-/C-terminal forms.
static AMINO_ACID_NAMES: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
    "ASH", "CYM", "CYX", "GLH", "HID", "HIE", "HIP", "HYP", "LYN", "MSE",
    "NALA", "NARG", "NASN", "NASP", "NCYS", "NGLN", "NGLU", "NGLY", "NHIS", "NILE",
    "NLEU", "NLYS", "NMET", "NPHE", "NPRO", "NSER", "NTHR", "NTRP", "NTYR", "NVAL",
    "CALA", "CARG", "CASN", "CASP", "CCYS", "CGLN", "CGLU", "CGLY", "CHIS", "CILE",
    "CLEU", "CLYS", "CMET", "CPHE", "CPRO", "CSER", "CTHR", "CTRP", "CTYR", "CVAL",
};

pub fn is_amino_acid(residue_name: &str) -> bool {
    AMINO_ACID_NAMES.contains(residue_name.trim())
}

/// Derives a unit name from a free-form label: the first three characters, upper-cased.
pub fn unit_name_from_label(label: &str) -> String {
    label.trim().chars().take(3).collect::<String>().to_ascii_uppercase()
}

/// Unit name for a library prefix, taken from its file-name part as written.
pub fn unit_name_from_prefix(prefix: &Path) -> String {
    prefix
        .file_name()
        .map(|name| unit_name_from_label(&name.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_unit_name_ignores_directories_but_keeps_dots() {
        assert_eq!(unit_name_from_prefix(Path::new("params/mol_params")), "MOL");
        assert_eq!(unit_name_from_prefix(Path::new("my.lig")), "MY.");
        assert_eq!(unit_name_from_prefix(Path::new("/work/lg")), "LG");
    }

    #[test]
    fn is_amino_acid_recognizes_standard_and_variant_residues() {
        assert!(is_amino_acid("ALA"));
        assert!(is_amino_acid("HIE"));
        assert!(is_amino_acid("CYX"));
        assert!(is_amino_acid("NMET"));
    }

    #[test]
    fn is_amino_acid_trims_and_is_case_sensitive() {
        assert!(is_amino_acid(" GLY "));
        assert!(!is_amino_acid("gly"));
        assert!(!is_amino_acid("LIG"));
        assert!(!is_amino_acid(""));
    }

    #[test]
    fn unit_name_from_label_truncates_and_uppercases() {
        assert_eq!(unit_name_from_label("benzamidine"), "BEN");
        assert_eq!(unit_name_from_label("lg"), "LG");
        assert_eq!(unit_name_from_label(" atp "), "ATP");
    }
}
