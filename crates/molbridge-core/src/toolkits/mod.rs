//! The backend capability layer.
//!
//! Every cheminformatics engine compiled into this crate is normalized behind
//! the [`Toolkit`] trait: declared input/output format sets, read/write,
//! hydrogen handling, 3D embedding, rotation, fingerprints and descriptors.
//! A capability a backend does not implement is an explicit
//! [`ToolkitError::UnsupportedOperation`] result, never a runtime
//! attribute-absence failure. Backends are registered once at process start
//! in a read-only [`registry`].

pub mod graphene;
pub mod pdblite;
pub mod registry;

use crate::core::io::pdb::PdbError;
use crate::core::models::structure::Structure;
use graphene::molecule::GraphMol;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure taxonomy of the capability layer, mirrored one-to-one by the
/// conditions the service reports: unavailable-toolkit, unsupported-format,
/// unsupported-operation, parse failure and I/O failure.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("cheminformatics toolkit '{0}' not active")]
    UnavailableToolkit(String),

    #[error("molecular {direction} file format '{format}' not supported by {toolkit}")]
    UnsupportedFormat {
        toolkit: String,
        format: String,
        direction: &'static str,
    },

    #[error("operation '{operation}' not supported by {toolkit}")]
    UnsupportedOperation {
        toolkit: &'static str,
        operation: &'static str,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Pdb(#[from] PdbError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type ToolkitResult<T> = Result<T, ToolkitError>;

/// Capability-tagged native molecule object.
///
/// Each backend works on its own representation; a backend handed a foreign
/// variant reports [`ToolkitError::UnsupportedOperation`].
#[derive(Debug, Clone)]
pub enum BackendMol {
    /// Molecular graph, native to the `graphene` backend.
    Graph(GraphMol),
    /// PDB structure hierarchy, native to the `pdblite` backend.
    Structure(Structure),
}

/// Parameters for hydrogen addition.
#[derive(Debug, Clone, Copy)]
pub struct AddHydrogens {
    /// Only add hydrogens to polar atoms (N, O, S).
    pub polar_only: bool,
    /// Adjust protonation states for the given pH before adding.
    pub correct_for_ph: bool,
    pub ph: f64,
}

impl Default for AddHydrogens {
    fn default() -> Self {
        AddHydrogens {
            polar_only: false,
            correct_for_ph: false,
            ph: 7.4,
        }
    }
}

/// Parameters for 3D coordinate embedding.
#[derive(Debug, Clone)]
pub struct Embed {
    /// Named force field driving the embedding (`uff`, `mmff94`).
    pub forcefield: String,
    /// Step budget for the embedding pass.
    pub steps: usize,
}

impl Default for Embed {
    fn default() -> Self {
        Embed {
            forcefield: "mmff94".to_string(),
            steps: 50,
        }
    }
}

/// A fixed-size bit vector fingerprint, backend-produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Fingerprint {
    words: Vec<u64>,
    nbits: usize,
}

impl Fingerprint {
    pub fn new(nbits: usize) -> Self {
        Fingerprint {
            words: vec![0u64; nbits.div_ceil(64)],
            nbits,
        }
    }

    pub fn set_bit(&mut self, pos: usize) {
        let pos = pos % self.nbits;
        self.words[pos / 64] |= 1u64 << (pos % 64);
    }

    pub fn get_bit(&self, pos: usize) -> bool {
        let pos = pos % self.nbits;
        (self.words[pos / 64] >> (pos % 64)) & 1 == 1
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// Popcounts of intersection and union, the ingredients of every
    /// bit-vector similarity metric.
    pub fn overlap(&self, other: &Fingerprint) -> (u32, u32) {
        let mut and_count = 0;
        let mut or_count = 0;
        for (a, b) in self.words.iter().zip(other.words.iter()) {
            and_count += (a & b).count_ones();
            or_count += (a | b).count_ones();
        }
        (and_count, or_count)
    }
}

/// Uniform interface over heterogeneous cheminformatics backends.
///
/// Molecule-mutating operations act in place; the caller keeps ownership of
/// the [`BackendMol`] throughout.
pub trait Toolkit: Send + Sync {
    /// Registry name of the backend.
    fn name(&self) -> &'static str;

    /// Declared set of readable file formats.
    fn input_formats(&self) -> &'static phf::Set<&'static str>;

    /// Declared set of writable file formats.
    fn output_formats(&self) -> &'static phf::Set<&'static str>;

    /// Parses structure text in the given format. Multi-record input yields
    /// only the first structure.
    fn read(&self, format: &str, input: &str) -> ToolkitResult<BackendMol>;

    /// Serializes a molecule to text in the given format.
    fn write(&self, mol: &BackendMol, format: &str) -> ToolkitResult<String>;

    /// Serializes several molecules into one multi-record document.
    fn write_many(&self, mols: &[BackendMol], format: &str) -> ToolkitResult<String>;

    fn title(&self, mol: &BackendMol) -> String;

    fn set_title(&self, mol: &mut BackendMol, title: &str);

    /// Coordinate dimensionality: 0 for connectivity-only, 2 or 3 when a
    /// conformer is present. Backends without a native dimensionality
    /// attribute infer it from the first atom's coordinates, defaulting to 0.
    fn dimension(&self, mol: &BackendMol) -> u8;

    /// Conformer coordinates, one `[x, y, z]` triple per atom; empty when no
    /// conformer exists.
    fn coordinates(&self, mol: &BackendMol) -> Vec<[f64; 3]>;

    fn add_hydrogens(&self, mol: &mut BackendMol, opts: &AddHydrogens) -> ToolkitResult<()>;

    fn remove_hydrogens(&self, mol: &mut BackendMol) -> ToolkitResult<()>;

    /// Embeds a 3D conformer using the named force field and step budget.
    fn embed_3d(&self, mol: &mut BackendMol, opts: &Embed) -> ToolkitResult<()>;

    /// Rotates the conformer in place around `axis` by `angle_degrees`.
    fn rotate(&self, mol: &mut BackendMol, axis: [f64; 3], angle_degrees: f64)
    -> ToolkitResult<()>;

    /// Computes a named fingerprint kind (e.g. `morgan`, `ecfp4`).
    fn fingerprint(&self, mol: &BackendMol, kind: &str) -> ToolkitResult<Fingerprint>;

    /// Pairwise similarity of two fingerprints under a named metric.
    fn similarity(&self, a: &Fingerprint, b: &Fingerprint, metric: &str) -> ToolkitResult<f64>;

    /// Numeric descriptor map for one molecule.
    fn descriptors(&self, mol: &BackendMol) -> ToolkitResult<BTreeMap<String, f64>>;

    /// Common structure attributes (formula, molwt, title, charge, dim,
    /// exactmass, energy) as loosely typed values.
    fn attributes(&self, mol: &BackendMol) -> BTreeMap<String, serde_json::Value>;
}
