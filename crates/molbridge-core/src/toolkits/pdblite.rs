//! The `pdblite` backend: a structure-only engine.
//!
//! Reads and writes PDB files and can strip hydrogens; every graph-level
//! capability (embedding, fingerprints, descriptors, rotation) is reported
//! as unsupported so callers can fall back to another backend.

use std::collections::BTreeMap;

use phf::phf_set;

use crate::core::io::pdb::{parse_pdb, write_pdb};
use crate::core::models::structure::Structure;
use crate::toolkits::{
    AddHydrogens, BackendMol, Embed, Fingerprint, Toolkit, ToolkitError, ToolkitResult,
};

pub const NAME: &str = "pdblite";

static INPUT_FORMATS: phf::Set<&'static str> = phf_set! { "pdb", "ent" };
static OUTPUT_FORMATS: phf::Set<&'static str> = phf_set! { "pdb" };

#[derive(Debug, Default)]
pub struct PdbLite;

impl PdbLite {
    fn structure<'m>(&self, mol: &'m BackendMol, operation: &'static str) -> ToolkitResult<&'m Structure> {
        match mol {
            BackendMol::Structure(s) => Ok(s),
            BackendMol::Graph(_) => Err(ToolkitError::UnsupportedOperation {
                toolkit: NAME,
                operation,
            }),
        }
    }

    fn structure_mut<'m>(
        &self,
        mol: &'m mut BackendMol,
        operation: &'static str,
    ) -> ToolkitResult<&'m mut Structure> {
        match mol {
            BackendMol::Structure(s) => Ok(s),
            BackendMol::Graph(_) => Err(ToolkitError::UnsupportedOperation {
                toolkit: NAME,
                operation,
            }),
        }
    }

    fn unsupported<T>(&self, operation: &'static str) -> ToolkitResult<T> {
        Err(ToolkitError::UnsupportedOperation {
            toolkit: NAME,
            operation,
        })
    }
}

impl Toolkit for PdbLite {
    fn name(&self) -> &'static str {
        NAME
    }

    fn input_formats(&self) -> &'static phf::Set<&'static str> {
        &INPUT_FORMATS
    }

    fn output_formats(&self) -> &'static phf::Set<&'static str> {
        &OUTPUT_FORMATS
    }

    fn read(&self, format: &str, input: &str) -> ToolkitResult<BackendMol> {
        if !INPUT_FORMATS.contains(format) {
            return Err(ToolkitError::UnsupportedFormat {
                toolkit: NAME.to_string(),
                format: format.to_string(),
                direction: "input",
            });
        }
        Ok(BackendMol::Structure(parse_pdb(input)?))
    }

    fn write(&self, mol: &BackendMol, format: &str) -> ToolkitResult<String> {
        if !OUTPUT_FORMATS.contains(format) {
            return Err(ToolkitError::UnsupportedFormat {
                toolkit: NAME.to_string(),
                format: format.to_string(),
                direction: "output",
            });
        }
        let structure = self.structure(mol, "write")?;
        Ok(write_pdb(structure))
    }

    fn write_many(&self, mols: &[BackendMol], format: &str) -> ToolkitResult<String> {
        let mut out = String::new();
        for mol in mols {
            out.push_str(&self.write(mol, format)?);
        }
        Ok(out)
    }

    fn title(&self, mol: &BackendMol) -> String {
        match mol {
            BackendMol::Structure(s) => s.id.clone(),
            BackendMol::Graph(_) => String::new(),
        }
    }

    fn set_title(&self, mol: &mut BackendMol, title: &str) {
        if let BackendMol::Structure(s) = mol {
            s.id = title.to_string();
        }
    }

    fn dimension(&self, mol: &BackendMol) -> u8 {
        // deposited structures always carry spatial coordinates
        match mol {
            BackendMol::Structure(s) if s.atom_count() > 0 => 3,
            _ => 0,
        }
    }

    fn coordinates(&self, mol: &BackendMol) -> Vec<[f64; 3]> {
        match mol {
            BackendMol::Structure(s) => s
                .atoms()
                .map(|a| [a.coords.x, a.coords.y, a.coords.z])
                .collect(),
            BackendMol::Graph(_) => Vec::new(),
        }
    }

    fn add_hydrogens(&self, _mol: &mut BackendMol, _opts: &AddHydrogens) -> ToolkitResult<()> {
        self.unsupported("add_hydrogens")
    }

    fn remove_hydrogens(&self, mol: &mut BackendMol) -> ToolkitResult<()> {
        let structure = self.structure_mut(mol, "remove_hydrogens")?;
        for model in &mut structure.models {
            for chain in &mut model.chains {
                for residue in &mut chain.residues {
                    residue.atoms.retain(|a| !Structure::is_hydrogen(a));
                }
                chain.residues.retain(|r| !r.atoms.is_empty());
            }
            model.chains.retain(|c| !c.residues.is_empty());
        }
        Ok(())
    }

    fn embed_3d(&self, _mol: &mut BackendMol, _opts: &Embed) -> ToolkitResult<()> {
        self.unsupported("embed_3d")
    }

    fn rotate(
        &self,
        _mol: &mut BackendMol,
        _axis: [f64; 3],
        _angle_degrees: f64,
    ) -> ToolkitResult<()> {
        self.unsupported("rotate")
    }

    fn fingerprint(&self, _mol: &BackendMol, _kind: &str) -> ToolkitResult<Fingerprint> {
        self.unsupported("fingerprint")
    }

    fn similarity(&self, _a: &Fingerprint, _b: &Fingerprint, _metric: &str) -> ToolkitResult<f64> {
        self.unsupported("similarity")
    }

    fn descriptors(&self, mol: &BackendMol) -> ToolkitResult<BTreeMap<String, f64>> {
        let _ = self.structure(mol, "descriptors")?;
        self.unsupported("descriptors")
    }

    fn attributes(&self, mol: &BackendMol) -> BTreeMap<String, serde_json::Value> {
        let mut attributes = BTreeMap::new();
        if let BackendMol::Structure(s) = mol {
            attributes.insert("title".to_string(), s.id.clone().into());
            attributes.insert("atoms".to_string(), (s.atom_count() as i64).into());
            attributes.insert("models".to_string(), (s.models.len() as i64).into());
        }
        attributes
    }
}
