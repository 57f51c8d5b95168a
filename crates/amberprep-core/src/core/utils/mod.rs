pub mod identifiers;
pub mod paths;
