//! Stateless foundation: data models and format I/O utilities.

pub mod io;
pub mod models;
