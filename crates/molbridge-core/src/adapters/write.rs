//! Structure writing.

use std::fs;
use std::path::Path;

use tracing::{debug, error};

use crate::core::models::mol::MolHandle;
use crate::toolkits::registry;
use crate::toolkits::{ToolkitError, ToolkitResult};

/// Serializes a handle, optionally to a file.
///
/// The output format defaults to the format the handle was read with. When
/// `path` is given the serialized text is written there (always
/// overwriting) and, if the file exists afterwards, the path itself is the
/// returned value; otherwise the trimmed serialized text is returned.
pub fn mol_write(
    handle: &MolHandle,
    format: Option<&str>,
    path: Option<&Path>,
) -> ToolkitResult<String> {
    let toolkit = registry::get(handle.toolkit)?;
    let format = format
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| handle.format.clone());

    if !toolkit.output_formats().contains(format.as_str()) {
        error!(
            "Unsupported output file format {} for toolkit {}",
            format,
            toolkit.name()
        );
        return Err(ToolkitError::UnsupportedFormat {
            toolkit: toolkit.name().to_string(),
            format,
            direction: "output",
        });
    }

    let text = toolkit.write(&handle.mol, &format)?;

    if let Some(path) = path {
        fs::write(path, &text)?;
        if path.exists() {
            debug!("Wrote {} structure to {}", format, path.display());
            return Ok(path.to_string_lossy().into_owned());
        }
    }

    Ok(text.trim().to_string())
}
