use crate::toolkits::BackendMol;

/// Default title given to structures that parse without a usable name.
pub const DEFAULT_MOL_NAME: &str = "ligand";

/// A parsed molecular structure plus its round-tripping metadata.
///
/// The inner [`BackendMol`] is the backend-native object; `format` and
/// `toolkit` record how it was read so later write/mutation calls can resolve
/// the same backend and serialization without re-asking the caller. The
/// handle is owned exclusively by the caller that created it, passed by
/// reference into adapters that mutate the native object in place, and
/// discarded afterwards; no persistence layer owns it.
#[derive(Debug, Clone)]
pub struct MolHandle {
    pub mol: BackendMol,
    /// Originating file format (e.g. `smi`, `sdf`, `pdb`).
    pub format: String,
    /// Name of the backend that produced `mol`.
    pub toolkit: &'static str,
}

impl MolHandle {
    pub fn new(mol: BackendMol, format: impl Into<String>, toolkit: &'static str) -> Self {
        MolHandle {
            mol,
            format: format.into(),
            toolkit,
        }
    }
}
