//! Format I/O utilities.

pub mod pdb;
