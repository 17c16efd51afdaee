//! Structure reading.

use std::fs;
use std::path::Path;

use tracing::{debug, error};

use crate::core::models::mol::{DEFAULT_MOL_NAME, MolHandle};
use crate::toolkits::registry;
use crate::toolkits::{ToolkitError, ToolkitResult};

/// Reads a molecular structure into a backend-tagged handle.
///
/// `input` is inline structure data, or a filesystem path when `from_file`
/// is set. The format is the explicit `format` argument when given,
/// otherwise the file extension of a path input. The resolved format is
/// checked against the backend's declared input formats before the backend
/// is invoked. Multi-record input yields the first structure only.
pub fn mol_read(
    input: &str,
    format: Option<&str>,
    from_file: bool,
    toolkit_name: &str,
) -> ToolkitResult<MolHandle> {
    let toolkit = registry::get(toolkit_name).map_err(|err| {
        error!("Failed to import toolkit '{}'", toolkit_name);
        err
    })?;

    let extension = from_file.then(|| extension_of(input)).flatten();
    let format = format
        .map(str::to_ascii_lowercase)
        .or(extension)
        .ok_or_else(|| {
            ToolkitError::InvalidParameter(
                "input format not specified and not derivable from a path".to_string(),
            )
        })?;

    if !toolkit.input_formats().contains(format.as_str()) {
        error!(
            "Unsupported input file format {} for toolkit {}",
            format,
            toolkit.name()
        );
        return Err(ToolkitError::UnsupportedFormat {
            toolkit: toolkit.name().to_string(),
            format,
            direction: "input",
        });
    }

    let data = if from_file {
        fs::read_to_string(input).map_err(|err| {
            error!("Failed to read structure file {}: {}", input, err);
            ToolkitError::from(err)
        })?
    } else {
        input.to_string()
    };

    let mut mol = toolkit.read(&format, &data)?;

    // Structures need a sane title downstream; replace anything that is
    // empty or not purely alphanumeric.
    let title = toolkit.title(&mol);
    if title.is_empty() || !title.chars().all(char::is_alphanumeric) {
        toolkit.set_title(&mut mol, DEFAULT_MOL_NAME);
    }

    debug!(
        "Read {} structure with toolkit {}",
        format,
        toolkit.name()
    );
    Ok(MolHandle::new(mol, format, toolkit.name()))
}

fn extension_of(input: &str) -> Option<String> {
    Path::new(input)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_inline_smiles() {
        let handle = mol_read("CCO", Some("smi"), false, "graphene").unwrap();
        assert_eq!(handle.format, "smi");
        assert_eq!(handle.toolkit, "graphene");
    }

    #[test]
    fn title_defaults_to_ligand() {
        let handle = mol_read("CCO", Some("smi"), false, "graphene").unwrap();
        let toolkit = registry::get("graphene").unwrap();
        assert_eq!(toolkit.title(&handle.mol), "ligand");
    }

    #[test]
    fn alphanumeric_title_is_kept() {
        let handle = mol_read("CCO ethanol", Some("smi"), false, "graphene").unwrap();
        let toolkit = registry::get("graphene").unwrap();
        assert_eq!(toolkit.title(&handle.mol), "ethanol");
    }

    #[test]
    fn format_gating_precedes_backend_call() {
        // pdb is not a graphene format; garbage content must never be parsed
        let err = mol_read("garbage that is not pdb", Some("pdb"), false, "graphene").unwrap_err();
        assert!(matches!(err, ToolkitError::UnsupportedFormat { .. }));
    }

    #[test]
    fn unknown_toolkit_is_unavailable() {
        let err = mol_read("CCO", Some("smi"), false, "rdkit").unwrap_err();
        assert!(matches!(err, ToolkitError::UnavailableToolkit(_)));
    }

    #[test]
    fn format_from_file_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ethanol.smi");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "CCO ethanol").unwrap();

        let handle = mol_read(path.to_str().unwrap(), None, true, "graphene").unwrap();
        assert_eq!(handle.format, "smi");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = mol_read("/nonexistent/x.smi", None, true, "graphene").unwrap_err();
        assert!(matches!(err, ToolkitError::Io(_)));
    }

    #[test]
    fn first_record_only_from_multi_record_sdf() {
        // concat! keeps the leading spaces the fixed-column format requires
        let record = concat!(
            "first\n",
            " molbridge\n",
            "\n",
            "  1  0  0  0  0  0  0  0  0  0999 V2000\n",
            "    0.0000    0.0000    0.5000 C   0  0  0  0  0  0  0  0  0  0  0  0\n",
            "M  END\n",
            "$$$$\n",
        );
        let second = concat!(
            "second\n",
            " molbridge\n",
            "\n",
            "  2  1  0  0  0  0  0  0  0  0999 V2000\n",
            "    0.0000    0.0000    0.5000 C   0  0  0  0  0  0  0  0  0  0  0  0\n",
            "    1.5000    0.0000    0.5000 C   0  0  0  0  0  0  0  0  0  0  0  0\n",
            "  1  2  1  0\n",
            "M  END\n",
            "$$$$\n",
        );
        let two = format!("{record}{second}");
        let handle = mol_read(&two, Some("sdf"), false, "graphene").unwrap();
        let toolkit = registry::get("graphene").unwrap();
        assert_eq!(toolkit.title(&handle.mol), "first");
    }
}
