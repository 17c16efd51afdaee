//! The `graphene` backend: a native molecular-graph engine.
//!
//! Full-capability family. Reads and writes SMILES and MDL mol/SDF, supports
//! parameterized hydrogen addition, hydrogen removal, force-field driven 3D
//! embedding, axis-angle rotation, Morgan fingerprints with Tanimoto/Dice
//! similarity, and graph descriptors.

pub mod descriptors;
pub mod element;
pub mod embed;
pub mod fingerprint;
pub mod hydrogens;
pub mod molecule;
pub mod sdf;
pub mod smiles;

use super::{AddHydrogens, BackendMol, Embed, Fingerprint, Toolkit, ToolkitError, ToolkitResult};
use molecule::GraphMol;
use nalgebra::{Rotation3, Unit, Vector3};
use phf::{Set, phf_set};
use std::collections::BTreeMap;

pub const NAME: &str = "graphene";

static INPUT_FORMATS: Set<&'static str> = phf_set! { "smi", "smiles", "mol", "sdf" };
static OUTPUT_FORMATS: Set<&'static str> = phf_set! { "smi", "smiles", "mol", "sdf" };

/// Marker type implementing [`Toolkit`] for the graph engine.
#[derive(Debug, Default)]
pub struct Graphene;

/// One `.smi` record: the SMILES string, then the title after a tab when
/// the molecule has one.
fn smiles_line(graph: &GraphMol) -> String {
    let text = smiles::write_smiles(graph);
    if graph.title.is_empty() {
        text
    } else {
        format!("{text}\t{}", graph.title)
    }
}

impl Graphene {
    fn graph<'a>(
        &self,
        mol: &'a BackendMol,
        operation: &'static str,
    ) -> ToolkitResult<&'a GraphMol> {
        match mol {
            BackendMol::Graph(g) => Ok(g),
            _ => Err(ToolkitError::UnsupportedOperation {
                toolkit: NAME,
                operation,
            }),
        }
    }

    fn graph_mut<'a>(
        &self,
        mol: &'a mut BackendMol,
        operation: &'static str,
    ) -> ToolkitResult<&'a mut GraphMol> {
        match mol {
            BackendMol::Graph(g) => Ok(g),
            _ => Err(ToolkitError::UnsupportedOperation {
                toolkit: NAME,
                operation,
            }),
        }
    }
}

impl Toolkit for Graphene {
    fn name(&self) -> &'static str {
        NAME
    }

    fn input_formats(&self) -> &'static Set<&'static str> {
        &INPUT_FORMATS
    }

    fn output_formats(&self) -> &'static Set<&'static str> {
        &OUTPUT_FORMATS
    }

    fn read(&self, format: &str, input: &str) -> ToolkitResult<BackendMol> {
        let mol = match format {
            "smi" | "smiles" => smiles::parse_smiles(input.trim())?,
            "mol" | "sdf" => sdf::parse_first_record(input)?,
            other => {
                return Err(ToolkitError::UnsupportedFormat {
                    toolkit: NAME.to_string(),
                    format: other.to_string(),
                    direction: "input",
                });
            }
        };
        Ok(BackendMol::Graph(mol))
    }

    fn write(&self, mol: &BackendMol, format: &str) -> ToolkitResult<String> {
        let graph = self.graph(mol, "write")?;
        match format {
            "smi" | "smiles" => Ok(smiles_line(graph)),
            "mol" | "sdf" => Ok(sdf::write_record(graph)),
            other => Err(ToolkitError::UnsupportedFormat {
                toolkit: NAME.to_string(),
                format: other.to_string(),
                direction: "output",
            }),
        }
    }

    fn write_many(&self, mols: &[BackendMol], format: &str) -> ToolkitResult<String> {
        match format {
            // SMILES is line-oriented, SDF concatenates records with $$$$.
            "smi" | "smiles" => {
                let mut out = String::new();
                for mol in mols {
                    out.push_str(&smiles_line(self.graph(mol, "write_many")?));
                    out.push('\n');
                }
                Ok(out)
            }
            "mol" | "sdf" => {
                let mut out = String::new();
                for mol in mols {
                    out.push_str(&sdf::write_record(self.graph(mol, "write_many")?));
                }
                Ok(out)
            }
            other => Err(ToolkitError::UnsupportedFormat {
                toolkit: NAME.to_string(),
                format: other.to_string(),
                direction: "output",
            }),
        }
    }

    fn title(&self, mol: &BackendMol) -> String {
        match mol {
            BackendMol::Graph(g) => g.title.clone(),
            BackendMol::Structure(s) => s.id.clone(),
        }
    }

    fn set_title(&self, mol: &mut BackendMol, title: &str) {
        if let BackendMol::Graph(g) = mol {
            g.title = title.to_string();
        }
    }

    fn dimension(&self, mol: &BackendMol) -> u8 {
        // No native dimensionality attribute: infer from the first atom's
        // coordinates, defaulting to zero.
        match mol {
            BackendMol::Graph(g) => match &g.coords {
                Some(coords) if !coords.is_empty() => g.dim,
                _ => 0,
            },
            BackendMol::Structure(_) => 0,
        }
    }

    fn coordinates(&self, mol: &BackendMol) -> Vec<[f64; 3]> {
        match mol {
            BackendMol::Graph(g) => g
                .coords
                .as_deref()
                .unwrap_or(&[])
                .iter()
                .map(|p| [p.x, p.y, p.z])
                .collect(),
            BackendMol::Structure(_) => Vec::new(),
        }
    }

    fn add_hydrogens(&self, mol: &mut BackendMol, opts: &AddHydrogens) -> ToolkitResult<()> {
        let graph = self.graph_mut(mol, "add_hydrogens")?;
        hydrogens::add_hydrogens(graph, opts);
        Ok(())
    }

    fn remove_hydrogens(&self, mol: &mut BackendMol) -> ToolkitResult<()> {
        let graph = self.graph_mut(mol, "remove_hydrogens")?;
        hydrogens::remove_hydrogens(graph);
        Ok(())
    }

    fn embed_3d(&self, mol: &mut BackendMol, opts: &Embed) -> ToolkitResult<()> {
        let graph = self.graph_mut(mol, "embed_3d")?;
        let forcefield = embed::ForceField::from_name(&opts.forcefield)?;
        embed::embed_3d(graph, forcefield, opts.steps);
        Ok(())
    }

    fn rotate(
        &self,
        mol: &mut BackendMol,
        axis: [f64; 3],
        angle_degrees: f64,
    ) -> ToolkitResult<()> {
        let graph = self.graph_mut(mol, "rotate")?;
        let Some(coords) = graph.coords.as_mut() else {
            return Err(ToolkitError::InvalidParameter(
                "rotation requires a conformer; embed the molecule first".to_string(),
            ));
        };

        let axis = Vector3::new(axis[0], axis[1], axis[2]);
        if axis.norm_squared() == 0.0 {
            return Err(ToolkitError::InvalidParameter(
                "rotation axis must be non-zero".to_string(),
            ));
        }
        let rotation =
            Rotation3::from_axis_angle(&Unit::new_normalize(axis), angle_degrees.to_radians());
        for point in coords.iter_mut() {
            *point = rotation * *point;
        }
        Ok(())
    }

    fn fingerprint(&self, mol: &BackendMol, kind: &str) -> ToolkitResult<Fingerprint> {
        let graph = self.graph(mol, "fingerprint")?;
        let radius = match kind {
            "morgan" | "ecfp4" => 2,
            "ecfp6" => 3,
            other => {
                return Err(ToolkitError::InvalidParameter(format!(
                    "unknown fingerprint kind '{other}'"
                )));
            }
        };
        Ok(fingerprint::morgan_fingerprint(
            graph,
            radius,
            fingerprint::DEFAULT_NBITS,
        ))
    }

    fn similarity(&self, a: &Fingerprint, b: &Fingerprint, metric: &str) -> ToolkitResult<f64> {
        match metric {
            "tanimoto" => Ok(fingerprint::tanimoto(a, b)),
            "dice" => Ok(fingerprint::dice(a, b)),
            other => Err(ToolkitError::InvalidParameter(format!(
                "unknown similarity metric '{other}'"
            ))),
        }
    }

    fn descriptors(&self, mol: &BackendMol) -> ToolkitResult<BTreeMap<String, f64>> {
        let graph = self.graph(mol, "descriptors")?;
        Ok(descriptors::compute(graph))
    }

    fn attributes(&self, mol: &BackendMol) -> BTreeMap<String, serde_json::Value> {
        let mut attributes = BTreeMap::new();
        if let BackendMol::Graph(g) = mol {
            attributes.insert("formula".to_string(), descriptors::formula(g).into());
            attributes.insert(
                "molwt".to_string(),
                descriptors::molecular_weight(g).into(),
            );
            attributes.insert(
                "exactmass".to_string(),
                descriptors::molecular_weight(g).into(),
            );
            attributes.insert("title".to_string(), g.title.clone().into());
            attributes.insert("charge".to_string(), i64::from(g.total_charge()).into());
            let dim = if g.coords.as_deref().is_some_and(|c| !c.is_empty()) {
                g.dim
            } else {
                0
            };
            attributes.insert("dim".to_string(), u64::from(dim).into());
            attributes.insert("energy".to_string(), serde_json::Value::Null);
        }
        attributes
    }
}
