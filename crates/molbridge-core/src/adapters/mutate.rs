//! In-place structure mutations: hydrogen handling, 3D embedding,
//! rotation, and batch rotation.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::models::mol::MolHandle;
use crate::toolkits::registry;
use crate::toolkits::{AddHydrogens, Embed, ToolkitResult};

/// Step budget of the post-embedding local optimization pass.
const LOCALOPT_STEPS: usize = 500;

/// Fixed name of the batch-rotation scratch file.
const COMBINED_FILE: &str = "multiple.sdf";

/// Adds hydrogens to the structure in place.
///
/// The full-capability family honours `polar_only`/`correct_for_ph`/`ph`;
/// every other backend is invoked with the defaults, and a backend without
/// hydrogen support reports unsupported-operation.
pub fn mol_addh(
    handle: &mut MolHandle,
    polar_only: bool,
    correct_for_ph: bool,
    ph: f64,
) -> ToolkitResult<()> {
    let toolkit = registry::get(handle.toolkit)?;
    let opts = if handle.toolkit == crate::toolkits::graphene::NAME {
        debug!(
            "Adding hydrogens (polar_only={}, correct_for_ph={}, pH={})",
            polar_only, correct_for_ph, ph
        );
        AddHydrogens { polar_only, correct_for_ph, ph }
    } else {
        AddHydrogens::default()
    };
    toolkit.add_hydrogens(&mut handle.mol, &opts)
}

/// Removes explicit hydrogens in place.
pub fn mol_removeh(handle: &mut MolHandle) -> ToolkitResult<()> {
    let toolkit = registry::get(handle.toolkit)?;
    debug!(
        "Removing hydrogens from structure {}",
        toolkit.title(&handle.mol)
    );
    toolkit.remove_hydrogens(&mut handle.mol)
}

/// Generates 3D coordinates unless the structure already has them.
///
/// A structure counts as 3D when the backend reports dimension 3 and the
/// per-axis sums of absolute coordinate values are all strictly positive;
/// such input is returned untouched with no backend call. Otherwise the
/// backend embeds with the named force field, followed by a local
/// optimization pass when `local_opt` is set.
pub fn mol_make3d(
    handle: &mut MolHandle,
    forcefield: &str,
    local_opt: bool,
    steps: usize,
) -> ToolkitResult<()> {
    let toolkit = registry::get(handle.toolkit)?;

    if toolkit.dimension(&handle.mol) == 3 {
        let coords = toolkit.coordinates(&handle.mol);
        let mut sums = [0.0f64; 3];
        for point in &coords {
            for (sum, value) in sums.iter_mut().zip(point.iter()) {
                *sum += value.abs();
            }
        }
        if sums.iter().all(|&s| s > 0.0) {
            info!("Structure already in 3D, skipping coordinate generation");
            return Ok(());
        }
    }

    toolkit.embed_3d(
        &mut handle.mol,
        &Embed { forcefield: forcefield.to_string(), steps },
    )?;
    if local_opt {
        toolkit.embed_3d(
            &mut handle.mol,
            &Embed {
                forcefield: forcefield.to_string(),
                steps: LOCALOPT_STEPS,
            },
        )?;
    }
    Ok(())
}

/// Rotates the conformer about an axis, `[x, y, z, angle_degrees]`, in place.
pub fn mol_rotate(handle: &mut MolHandle, rotation: [f64; 4]) -> ToolkitResult<()> {
    let toolkit = registry::get(handle.toolkit)?;
    let [x, y, z, angle] = rotation;
    toolkit.rotate(&mut handle.mol, [x, y, z], angle).map_err(|err| {
        warn!("Structure rotation failed: {}", err);
        err
    })
}

/// Deep copy via a write/read round trip through the recorded format.
pub fn mol_copy(handle: &MolHandle) -> ToolkitResult<MolHandle> {
    let toolkit = registry::get(handle.toolkit)?;
    let text = toolkit.write(&handle.mol, &handle.format)?;
    let mol = toolkit.read(&handle.format, &text)?;
    Ok(MolHandle::new(mol, handle.format.clone(), handle.toolkit))
}

/// Applies each rotation to a fresh copy and serializes the original plus
/// every rotated copy as one multi-record SD file.
///
/// The records go through a fixed scratch file `multiple.sdf` inside
/// `dir`, which is read back and deleted. The fixed name means concurrent
/// calls sharing a directory race on the same file. Returns `None` only
/// when the combined file was never created.
pub fn mol_combine_rotations(
    handle: &MolHandle,
    rotations: &[[f64; 4]],
    dir: &Path,
) -> ToolkitResult<Option<String>> {
    let toolkit = registry::get(handle.toolkit)?;

    let mut mols = vec![handle.mol.clone()];
    for &rotation in rotations {
        let mut copy = mol_copy(handle)?;
        mol_rotate(&mut copy, rotation)?;
        mols.push(copy.mol);
    }

    let text = toolkit.write_many(&mols, "sdf")?;
    let scratch = dir.join(COMBINED_FILE);
    fs::write(&scratch, text)?;

    if !scratch.exists() {
        return Ok(None);
    }
    let combined = fs::read_to_string(&scratch)?;
    fs::remove_file(&scratch)?;
    debug!("Combined {} rotated structures", rotations.len() + 1);
    Ok(Some(combined))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::read::mol_read;
    use crate::toolkits::ToolkitError;

    fn ethanol() -> MolHandle {
        mol_read("CCO ethanol", Some("smi"), false, "graphene").unwrap()
    }

    #[test]
    fn addh_then_removeh_restores_heavy_graph() {
        let mut handle = ethanol();
        mol_addh(&mut handle, false, false, 7.4).unwrap();
        let toolkit = registry::get("graphene").unwrap();
        assert_eq!(toolkit.descriptors(&handle.mol).unwrap()["atoms"], 9.0);
        mol_removeh(&mut handle).unwrap();
        assert_eq!(toolkit.descriptors(&handle.mol).unwrap()["atoms"], 3.0);
    }

    #[test]
    fn make3d_gives_coordinates() {
        let mut handle = ethanol();
        mol_make3d(&mut handle, "mmff94", true, 50).unwrap();
        let toolkit = registry::get("graphene").unwrap();
        assert_eq!(toolkit.dimension(&handle.mol), 3);
        assert_eq!(toolkit.coordinates(&handle.mol).len(), 3);
    }

    #[test]
    fn make3d_skips_structures_already_in_3d() {
        let mut handle = ethanol();
        mol_make3d(&mut handle, "mmff94", false, 50).unwrap();
        let toolkit = registry::get("graphene").unwrap();
        let before = toolkit.coordinates(&handle.mol);
        mol_make3d(&mut handle, "mmff94", false, 50).unwrap();
        assert_eq!(toolkit.coordinates(&handle.mol), before);
    }

    #[test]
    fn unknown_forcefield_is_rejected() {
        let mut handle = ethanol();
        let err = mol_make3d(&mut handle, "amber", false, 50).unwrap_err();
        assert!(matches!(err, ToolkitError::InvalidParameter(_)));
    }

    #[test]
    fn rotate_requires_coordinates() {
        let mut handle = ethanol();
        assert!(mol_rotate(&mut handle, [0.0, 0.0, 1.0, 90.0]).is_err());
        mol_make3d(&mut handle, "uff", false, 50).unwrap();
        assert!(mol_rotate(&mut handle, [0.0, 0.0, 1.0, 90.0]).is_ok());
    }

    #[test]
    fn copy_is_independent() {
        let mut handle = ethanol();
        let copy = mol_copy(&handle).unwrap();
        mol_addh(&mut handle, false, false, 7.4).unwrap();
        let toolkit = registry::get("graphene").unwrap();
        assert_eq!(toolkit.descriptors(&copy.mol).unwrap()["atoms"], 3.0);
        assert_eq!(toolkit.title(&copy.mol), "ethanol");
    }

    // Copies round-trip through the handle's recorded format, so batch
    // rotation needs a coordinate-carrying format such as SDF.
    fn ethanol_3d_sdf() -> MolHandle {
        let mut handle = ethanol();
        mol_make3d(&mut handle, "uff", false, 50).unwrap();
        let toolkit = registry::get("graphene").unwrap();
        let sdf = toolkit.write(&handle.mol, "sdf").unwrap();
        mol_read(&sdf, Some("sdf"), false, "graphene").unwrap()
    }

    #[test]
    fn combine_rotations_yields_n_plus_one_records_and_cleans_up() {
        let handle = ethanol_3d_sdf();
        let dir = tempfile::tempdir().unwrap();
        let combined = mol_combine_rotations(
            &handle,
            &[[0.0, 0.0, 1.0, 90.0], [1.0, 0.0, 0.0, 180.0]],
            dir.path(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(combined.matches("$$$$").count(), 3);
        assert!(!dir.path().join(COMBINED_FILE).exists());
    }

    #[test]
    fn combine_rotations_fails_for_a_conformerless_copy_format() {
        let mut handle = ethanol();
        mol_make3d(&mut handle, "uff", false, 50).unwrap();
        let dir = tempfile::tempdir().unwrap();
        // The handle was read as SMILES, so each copy loses its conformer.
        assert!(mol_combine_rotations(&handle, &[[0.0, 0.0, 1.0, 90.0]], dir.path()).is_err());
    }

    #[test]
    fn removeh_on_pdblite_structure_works() {
        let pdb = "ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N\n\
ATOM      2  H   ALA A   1      10.684   5.282  -6.852  1.00  0.00           H\nEND\n";
        let mut handle = mol_read(pdb, Some("pdb"), false, "pdblite").unwrap();
        mol_removeh(&mut handle).unwrap();
        let toolkit = registry::get("pdblite").unwrap();
        assert_eq!(toolkit.coordinates(&handle.mol).len(), 1);
    }

    #[test]
    fn addh_on_pdblite_is_unsupported() {
        let pdb = "ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N\nEND\n";
        let mut handle = mol_read(pdb, Some("pdb"), false, "pdblite").unwrap();
        let err = mol_addh(&mut handle, true, false, 7.4).unwrap_err();
        assert!(matches!(err, ToolkitError::UnsupportedOperation { .. }));
    }
}
