//! Typed request envelopes for every endpoint.
//!
//! Field names follow the wire schemas (`correctForPH`, `fp_format`,
//! `ci_cutoff`, ...); optional parameters carry their schema defaults so a
//! minimal request deserializes to the documented behaviour.

use serde::Deserialize;
use std::path::PathBuf;

use crate::core::models::pathfile::PathFile;

fn default_ph() -> f64 {
    7.4
}

fn default_forcefield() -> String {
    "mmff94".to_string()
}

fn default_true() -> bool {
    true
}

fn default_steps() -> usize {
    50
}

fn default_rcsb_format() -> String {
    "pdb".to_string()
}

/// Shared shape of the structure-in, structure-out endpoints (`convert`,
/// `removeh`, `info`).
#[derive(Debug, Deserialize)]
pub struct MolRequest {
    pub mol: PathFile,
    pub toolkit: String,
    #[serde(default)]
    pub output_format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddhRequest {
    pub mol: PathFile,
    pub toolkit: String,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub polaronly: bool,
    #[serde(rename = "correctForPH", default)]
    pub correct_for_ph: bool,
    #[serde(rename = "pH", default = "default_ph")]
    pub ph: f64,
}

#[derive(Debug, Deserialize)]
pub struct Make3dRequest {
    pub mol: PathFile,
    pub toolkit: String,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default = "default_forcefield")]
    pub forcefield: String,
    #[serde(default = "default_true")]
    pub localopt: bool,
    #[serde(default = "default_steps")]
    pub steps: usize,
}

#[derive(Debug, Deserialize)]
pub struct RotateRequest {
    pub mol: PathFile,
    pub toolkit: String,
    #[serde(default)]
    pub output_format: Option<String>,
    pub rotations: Vec<[f64; 4]>,
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct DescriptorsRequest {
    pub mol: PathFile,
    pub toolkit: String,
}

#[derive(Debug, Deserialize)]
pub struct ChemicalSimilarityRequest {
    pub toolkit: String,
    pub metric: String,
    pub fp_format: String,
    #[serde(default)]
    pub ci_cutoff: Option<f64>,
    pub test_set: Vec<PathFile>,
    pub reference_set: Vec<PathFile>,
    pub workdir: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct RemoveResiduesRequest {
    /// Inline PDB-format structure text.
    pub mol: String,
    #[serde(default)]
    pub residues: Vec<String>,
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveRcsbRequest {
    pub pdb_id: String,
    #[serde(default = "default_rcsb_format")]
    pub rcsb_file_format: String,
    #[serde(default)]
    pub workdir: Option<PathBuf>,
}
