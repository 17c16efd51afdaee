//! Endpoint handlers.
//!
//! Each handler consumes a typed request, drives the adapter layer and shapes
//! the response envelope. Adapter errors are logged and flattened to a
//! `status: "failed"` envelope with a null payload; nothing propagates past
//! this layer.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::error;

use crate::adapters::{descriptors, mutate, rcsb, read, residues, similarity, write};
use crate::core::models::mol::MolHandle;
use crate::core::models::pathfile::PathFile;
use crate::service::envelope::{self, STATUS_COMPLETED, STATUS_FAILED};
use crate::service::requests::{
    AddhRequest, ChemicalSimilarityRequest, DescriptorsRequest, Make3dRequest, MolRequest,
    RemoveResiduesRequest, RetrieveRcsbRequest, RotateRequest,
};
use crate::toolkits::{ToolkitError, ToolkitResult, registry};

/// Name of the PDB file written by the residue-removal endpoint.
const RESIDUES_FILE: &str = "structure.pdb";

fn flatten(endpoint: &str, payload_key: &str, result: ToolkitResult<Value>) -> Value {
    match result {
        Ok(response) => response,
        Err(err) => {
            error!("{} request failed: {}", endpoint, err);
            envelope::failed(payload_key)
        }
    }
}

/// Validates a path-file object and parses it into a backend handle.
///
/// The (possibly sniffed) extension doubles as the parse format and as the
/// default output format, so it is returned alongside the handle.
fn read_request_mol(mol: PathFile, toolkit: &str) -> ToolkitResult<(MolHandle, String)> {
    let mol = mol.validate();
    let extension = mol
        .extension
        .as_deref()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .ok_or_else(|| {
            ToolkitError::InvalidParameter(
                "structure object carries no format extension".to_string(),
            )
        })?;
    let content = mol.content.ok_or_else(|| {
        ToolkitError::InvalidParameter("structure object carries no content".to_string())
    })?;
    let handle = read::mol_read(&content, Some(&extension), false, toolkit)?;
    Ok((handle, extension))
}

fn mol_response(handle: &MolHandle, output_format: &str) -> ToolkitResult<Value> {
    let output = write::mol_write(handle, Some(output_format), None)?;
    Ok(envelope::completed_mol(envelope::path_file(
        None,
        Some(output),
        Some(output_format),
    )))
}

fn absolute(dir: &Path) -> ToolkitResult<PathBuf> {
    Ok(std::path::absolute(dir)?)
}

pub fn convert(request: MolRequest) -> Value {
    flatten("convert", "mol", (|| {
        let (handle, extension) = read_request_mol(request.mol, &request.toolkit)?;
        let output_format = request.output_format.as_deref().unwrap_or(&extension);
        mol_response(&handle, output_format)
    })())
}

pub fn addh(request: AddhRequest) -> Value {
    flatten("addh", "mol", (|| {
        let (mut handle, extension) = read_request_mol(request.mol, &request.toolkit)?;
        mutate::mol_addh(
            &mut handle,
            request.polaronly,
            request.correct_for_ph,
            request.ph,
        )?;
        let output_format = request.output_format.as_deref().unwrap_or(&extension);
        mol_response(&handle, output_format)
    })())
}

pub fn removeh(request: MolRequest) -> Value {
    flatten("removeh", "mol", (|| {
        let (mut handle, extension) = read_request_mol(request.mol, &request.toolkit)?;
        mutate::mol_removeh(&mut handle)?;
        let output_format = request.output_format.as_deref().unwrap_or(&extension);
        mol_response(&handle, output_format)
    })())
}

pub fn make3d(request: Make3dRequest) -> Value {
    flatten("make3d", "mol", (|| {
        let (mut handle, extension) = read_request_mol(request.mol, &request.toolkit)?;
        mutate::mol_make3d(
            &mut handle,
            &request.forcefield,
            request.localopt,
            request.steps,
        )?;
        let output_format = request.output_format.as_deref().unwrap_or(&extension);
        mol_response(&handle, output_format)
    })())
}

pub fn info(request: MolRequest) -> Value {
    flatten("info", "attributes", (|| {
        let (handle, _) = read_request_mol(request.mol, &request.toolkit)?;
        let toolkit = registry::get(handle.toolkit)?;
        let mut attributes = toolkit.attributes(&handle.mol);
        // Round-tripping metadata recorded on the handle at read time.
        attributes.insert("mol_format".to_string(), handle.format.clone().into());
        attributes.insert("toolkit".to_string(), handle.toolkit.into());
        Ok(json!({ "status": STATUS_COMPLETED, "attributes": attributes }))
    })())
}

/// Rotates the structure around each requested axis/angle and returns the
/// combined multi-record output.
///
/// A rotation batch that produces no combined file answers `status:
/// "failed"` with a null-content path-file object rather than an error.
pub fn rotate(request: RotateRequest) -> Value {
    flatten("rotate", "mol", (|| {
        let (handle, extension) = read_request_mol(request.mol, &request.toolkit)?;
        let scratch_dir = match request.workdir.as_deref() {
            Some(dir) => absolute(dir)?,
            None => env::temp_dir(),
        };
        let output = mutate::mol_combine_rotations(&handle, &request.rotations, &scratch_dir)?;
        let output_format = request.output_format.as_deref().unwrap_or(&extension);
        let status = if output.is_some() {
            STATUS_COMPLETED
        } else {
            STATUS_FAILED
        };
        Ok(json!({
            "status": status,
            "mol": envelope::path_file(None, output, Some(output_format)),
        }))
    })())
}

pub fn get_descriptors(request: DescriptorsRequest) -> Value {
    flatten("descriptors", "descriptors", (|| {
        let mol = request.mol.validate();
        let extension = mol
            .extension
            .as_deref()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .ok_or_else(|| {
                ToolkitError::InvalidParameter(
                    "structure object carries no format extension".to_string(),
                )
            })?;
        let content = mol.content.ok_or_else(|| {
            ToolkitError::InvalidParameter("structure object carries no content".to_string())
        })?;
        let table = descriptors::mol_descriptors(
            &request.toolkit,
            std::slice::from_ref(&content),
            &extension,
        )?;
        Ok(json!({ "status": STATUS_COMPLETED, "descriptors": table }))
    })())
}

/// Validates every set member and collects inline contents plus the format
/// shared by the set (taken from its first classified member).
fn validated_contents(set: Vec<PathFile>) -> ToolkitResult<(Vec<String>, Option<String>)> {
    let mut contents = Vec::with_capacity(set.len());
    let mut format = None;
    for obj in set {
        let obj = obj.validate();
        if format.is_none() {
            format = obj
                .extension
                .as_deref()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase());
        }
        let content = obj.content.ok_or_else(|| {
            ToolkitError::InvalidParameter("structure object carries no content".to_string())
        })?;
        contents.push(content);
    }
    Ok((contents, format))
}

pub fn chemical_similarity(request: ChemicalSimilarityRequest) -> Value {
    flatten("chemical_similarity", "results", (|| {
        let (test_set, test_format) = validated_contents(request.test_set)?;
        let (reference_set, reference_format) = validated_contents(request.reference_set)?;
        // Both sets must share one structure format.
        let mol_format = test_format.or(reference_format).ok_or_else(|| {
            ToolkitError::InvalidParameter(
                "structure sets carry no format extension".to_string(),
            )
        })?;

        let workdir = absolute(&request.workdir)?;
        let table = similarity::chemical_similarity(
            &request.toolkit,
            &test_set,
            &reference_set,
            &mol_format,
            &request.fp_format,
            &request.metric,
            request.ci_cutoff,
            &workdir,
        )?;
        Ok(json!({ "status": STATUS_COMPLETED, "results": table }))
    })())
}

pub fn supported_toolkits() -> Value {
    json!({ "status": STATUS_COMPLETED, "toolkits": registry::names() })
}

/// Strips the named residues from an inline PDB structure.
///
/// With a working directory the stripped structure is written to
/// `structure.pdb` inside it and the path is returned under `mol`; without
/// one the structure text itself is returned.
pub fn remove_residues(request: RemoveResiduesRequest) -> Value {
    flatten("remove_residues", "mol", (|| {
        let stripped = residues::remove_residues(&request.mol, &request.residues)?;

        let result = match request.workdir.as_deref() {
            Some(dir) => {
                let dir = absolute(dir)?;
                if !dir.is_dir() {
                    fs::create_dir_all(&dir)?;
                }
                let path = dir.join(RESIDUES_FILE);
                fs::write(&path, stripped)?;
                path.to_string_lossy().into_owned()
            }
            None => stripped,
        };

        Ok(json!({ "status": STATUS_COMPLETED, "mol": result }))
    })())
}

/// Downloads a structure from the RCSB archive by PDB identifier.
///
/// The response wraps a path-file object whose `content` slot carries the
/// stored file path when a working directory was given, or the structure
/// text inline otherwise; the `extension` reports the archive's own file
/// extension, before any local rename.
pub fn retrieve_rcsb_structure(request: RetrieveRcsbRequest) -> Value {
    flatten("retrieve_rcsb_structure", "mol", (|| {
        let workdir = match request.workdir.as_deref() {
            Some(dir) => Some(absolute(dir)?),
            None => None,
        };
        let retrieved = rcsb::retrieve_rcsb_structure(
            &request.pdb_id,
            &request.rcsb_file_format,
            workdir.as_deref(),
        )?;

        let content = match retrieved.path {
            Some(path) => Some(path.to_string_lossy().into_owned()),
            None => retrieved.content,
        };
        Ok(envelope::completed_mol(envelope::path_file(
            None,
            content,
            Some(&retrieved.extension),
        )))
    })())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smi(content: &str) -> PathFile {
        PathFile::from_content(content, "smi")
    }

    #[test]
    fn convert_smiles_to_sdf() {
        let response = convert(MolRequest {
            mol: smi("CCO"),
            toolkit: "graphene".to_string(),
            output_format: Some("sdf".to_string()),
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        let content = response["mol"]["content"].as_str().unwrap();
        assert!(content.contains("V2000"));
        assert_eq!(response["mol"]["extension"], "sdf");
        assert!(response["mol"]["path"].is_null());
    }

    #[test]
    fn convert_defaults_to_input_format() {
        let response = convert(MolRequest {
            mol: smi("CCO"),
            toolkit: "graphene".to_string(),
            output_format: None,
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        assert_eq!(response["mol"]["extension"], "smi");
    }

    #[test]
    fn unknown_toolkit_flattens_to_failed() {
        let response = convert(MolRequest {
            mol: smi("CCO"),
            toolkit: "openeye".to_string(),
            output_format: None,
        });
        assert_eq!(response["status"], STATUS_FAILED);
        assert!(response["mol"].is_null());
    }

    #[test]
    fn sniffed_smiles_needs_no_extension() {
        let response = convert(MolRequest {
            mol: PathFile {
                content: Some("CC(Oc1ccccc1C(O)=O)=O".to_string()),
                path: None,
                extension: None,
            },
            toolkit: "graphene".to_string(),
            output_format: None,
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        assert_eq!(response["mol"]["extension"], "smi");
    }

    #[test]
    fn info_reports_formula_and_charge() {
        let response = info(MolRequest {
            mol: smi("CCO"),
            toolkit: "graphene".to_string(),
            output_format: None,
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        assert_eq!(response["attributes"]["formula"], "C2H6O");
        assert_eq!(response["attributes"]["charge"], 0);
        assert_eq!(response["attributes"]["mol_format"], "smi");
        assert_eq!(response["attributes"]["toolkit"], "graphene");
    }

    #[test]
    fn addh_makes_hydrogens_explicit() {
        let added = addh(AddhRequest {
            mol: smi("CCO"),
            toolkit: "graphene".to_string(),
            output_format: Some("sdf".to_string()),
            polaronly: false,
            correct_for_ph: false,
            ph: 7.4,
        });
        assert_eq!(added["status"], STATUS_COMPLETED);
        let hydrogenated = get_descriptors(DescriptorsRequest {
            mol: PathFile::from_content(
                added["mol"]["content"].as_str().unwrap(),
                "sdf",
            ),
            toolkit: "graphene".to_string(),
        });
        let (_, table) = hydrogenated["descriptors"]
            .as_object()
            .unwrap()
            .iter()
            .next()
            .unwrap();
        assert_eq!(table["atoms"], 9.0);
    }

    #[test]
    fn make3d_yields_v3_coordinates() {
        let response = make3d(Make3dRequest {
            mol: smi("CCO"),
            toolkit: "graphene".to_string(),
            output_format: Some("sdf".to_string()),
            forcefield: "mmff94".to_string(),
            localopt: false,
            steps: 20,
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        let content = response["mol"]["content"].as_str().unwrap();
        assert!(content.contains("3D"));
    }

    #[test]
    fn rotate_emits_one_record_per_rotation_plus_base() {
        // Rotation needs a conformer that survives the copy round trip, so
        // feed it an embedded SDF rather than a SMILES string.
        let embedded = make3d(Make3dRequest {
            mol: smi("CCO"),
            toolkit: "graphene".to_string(),
            output_format: Some("sdf".to_string()),
            forcefield: "uff".to_string(),
            localopt: false,
            steps: 50,
        });
        assert_eq!(embedded["status"], STATUS_COMPLETED);

        let dir = tempfile::tempdir().unwrap();
        let response = rotate(RotateRequest {
            mol: PathFile::from_content(
                embedded["mol"]["content"].as_str().unwrap(),
                "sdf",
            ),
            toolkit: "graphene".to_string(),
            output_format: Some("sdf".to_string()),
            rotations: vec![[1.0, 0.0, 0.0, 90.0], [0.0, 1.0, 0.0, 180.0]],
            workdir: Some(dir.path().to_path_buf()),
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        let combined = response["mol"]["content"].as_str().unwrap();
        assert_eq!(combined.matches("$$$$").count(), 3);
    }

    #[test]
    fn descriptors_keyed_by_structure_title() {
        let response = get_descriptors(DescriptorsRequest {
            mol: PathFile::from_content("CCO ethanol", "smi"),
            toolkit: "graphene".to_string(),
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        let ethanol = &response["descriptors"]["ethanol"];
        assert_eq!(ethanol["atoms"], 3.0);
    }

    #[test]
    fn similarity_writes_results_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().join("sim");
        let response = chemical_similarity(ChemicalSimilarityRequest {
            toolkit: "graphene".to_string(),
            metric: "tanimoto".to_string(),
            fp_format: "morgan".to_string(),
            ci_cutoff: None,
            test_set: vec![smi("CCO")],
            reference_set: vec![smi("CCO"), smi("c1ccccc1")],
            workdir: workdir.clone(),
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        assert_eq!(response["results"]["max_sim"]["0"], 1.0);
        assert!(workdir.join("adan_chemical_similarity.csv").exists());
    }

    #[test]
    fn supported_toolkits_lists_backends() {
        let response = supported_toolkits();
        assert_eq!(response["status"], STATUS_COMPLETED);
        let names: Vec<&str> = response["toolkits"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(names, vec!["graphene", "pdblite"]);
    }

    const HOH_PDB: &str = "\
HEADER    TEST STRUCTURE                          01-JAN-20   1ABC
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
HETATM    3  O   HOH B   1       4.502   3.231   1.190  1.00  0.00           O
END
";

    #[test]
    fn remove_residues_inline_strips_water() {
        let response = remove_residues(RemoveResiduesRequest {
            mol: HOH_PDB.to_string(),
            residues: vec!["hoh".to_string()],
            workdir: None,
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        let text = response["mol"].as_str().unwrap();
        assert!(!text.contains("HOH"));
        assert!(text.contains("ALA"));
    }

    #[test]
    fn remove_residues_with_workdir_returns_a_path() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().join("out");
        let response = remove_residues(RemoveResiduesRequest {
            mol: HOH_PDB.to_string(),
            residues: vec!["HOH".to_string()],
            workdir: Some(workdir.clone()),
        });
        assert_eq!(response["status"], STATUS_COMPLETED);
        let path = PathBuf::from(response["mol"].as_str().unwrap());
        assert_eq!(path, workdir.join(RESIDUES_FILE));
        assert!(path.exists());
    }
}
