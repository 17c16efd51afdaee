//! Residue removal from PDB structures.

use tracing::info;

use crate::core::io::pdb::{parse_pdb, write_pdb};
use crate::toolkits::ToolkitResult;

/// Deletes every residue named in `residues` (case-insensitive) from the
/// structure text and re-serializes it. Chains left without residues are
/// dropped.
pub fn remove_residues(input: &str, residues: &[String]) -> ToolkitResult<String> {
    let mut structure = parse_pdb(input)?;
    let removed = structure.remove_residues(residues);
    if !removed.is_empty() {
        info!("Removed residues: {}", removed.join(", "));
    }
    Ok(write_pdb(&structure))
}
