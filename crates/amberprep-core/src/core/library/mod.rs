//! Parameter library files and the units they define.
//!
//! A library source is any file tLEaP can load. Only the object-file (`.lib`/`.off`) and
//! residue-topology (`.prep`) formats define units; object files additionally enumerate the
//! atom names of each unit, which the library matcher compares against the structure before
//! accepting a match. Parsing is isolated behind [`contents::UnitTableReader`], with one
//! implementation per unit-defining format.

pub mod contents;
pub mod format;
pub mod off;
pub mod prep;
