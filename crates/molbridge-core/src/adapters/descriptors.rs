//! Descriptor calculation over a structure set.

use std::collections::BTreeMap;

use tracing::debug;

use crate::adapters::read::mol_read;
use crate::toolkits::registry;
use crate::toolkits::ToolkitResult;

/// Computes the backend descriptor map for every structure, keyed by the
/// structure title.
pub fn mol_descriptors(
    toolkit_name: &str,
    structures: &[String],
    mol_format: &str,
) -> ToolkitResult<BTreeMap<String, BTreeMap<String, f64>>> {
    let toolkit = registry::get(toolkit_name)?;
    let mut out = BTreeMap::new();
    for input in structures {
        let handle = mol_read(input, Some(mol_format), false, toolkit_name)?;
        let title = toolkit.title(&handle.mol);
        out.insert(title, toolkit.descriptors(&handle.mol)?);
    }
    debug!("Computed descriptors for {} structures", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_are_keyed_by_title() {
        let out = mol_descriptors(
            "graphene",
            &["CCO ethanol".to_string(), "c1ccccc1 benzene".to_string()],
            "smi",
        )
        .unwrap();
        assert!(out.contains_key("ethanol"));
        assert!(out.contains_key("benzene"));
        assert_eq!(out["benzene"]["aromatic_atoms"], 6.0);
    }

    #[test]
    fn untitled_structures_fall_back_to_ligand() {
        let out = mol_descriptors("graphene", &["CCO".to_string()], "smi").unwrap();
        assert!(out.contains_key("ligand"));
    }

    #[test]
    fn structure_backend_has_no_descriptors() {
        let pdb =
            "ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N\nEND\n"
                .to_string();
        assert!(mol_descriptors("pdblite", &[pdb], "pdb").is_err());
    }
}
