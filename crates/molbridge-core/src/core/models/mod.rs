//! Data models shared across the facade.

pub mod mol;
pub mod pathfile;
pub mod structure;
