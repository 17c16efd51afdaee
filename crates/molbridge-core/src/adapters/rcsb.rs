//! Structure retrieval from the RCSB archive.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::toolkits::ToolkitResult;

const DOWNLOAD_URL: &str = "https://files.rcsb.org/download";

/// Outcome of a retrieval: a file path when a working directory was given,
/// inline content otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedStructure {
    pub path: Option<PathBuf>,
    pub content: Option<String>,
    pub extension: String,
}

/// Downloads `pdb_id` in `file_format` from RCSB.
///
/// PDB-format files keep the archive's legacy local naming `pdb<id>.ent`
/// during the download and are renamed to `.pdb` afterwards; the reported
/// extension stays at the pre-rename value. With a working directory the
/// file is stored there (directory created if absent) and the path is
/// reported; without one the structure text is returned inline.
pub fn retrieve_rcsb_structure(
    pdb_id: &str,
    file_format: &str,
    workdir: Option<&Path>,
) -> ToolkitResult<RetrievedStructure> {
    let url = download_url(pdb_id, file_format);
    debug!("Fetching {} from RCSB", url);

    let text = reqwest::blocking::get(&url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|err| {
            error!("RCSB retrieval of {} failed: {}", pdb_id, err);
            err
        })?;

    let extension = reported_extension(file_format).to_string();

    let Some(workdir) = workdir else {
        return Ok(RetrievedStructure {
            path: None,
            content: Some(text),
            extension,
        });
    };

    if !workdir.is_dir() {
        fs::create_dir_all(workdir)?;
    }
    let download_path = workdir.join(download_filename(pdb_id, file_format));
    fs::write(&download_path, text)?;

    let final_path = match stored_filename(pdb_id, file_format) {
        name if name != download_filename(pdb_id, file_format) => {
            let renamed = workdir.join(name);
            fs::rename(&download_path, &renamed)?;
            renamed
        }
        _ => download_path,
    };

    Ok(RetrievedStructure {
        path: Some(final_path),
        content: None,
        extension,
    })
}

fn download_url(pdb_id: &str, file_format: &str) -> String {
    format!(
        "{DOWNLOAD_URL}/{}.{}",
        pdb_id.to_ascii_uppercase(),
        file_format
    )
}

/// Local name the archive convention gives a fresh download.
fn download_filename(pdb_id: &str, file_format: &str) -> String {
    match file_format {
        "pdb" => format!("pdb{}.ent", pdb_id.to_ascii_lowercase()),
        other => format!("{}.{}", pdb_id.to_ascii_lowercase(), other),
    }
}

/// Name the file ends up with after the legacy `.ent` rename.
fn stored_filename(pdb_id: &str, file_format: &str) -> String {
    match file_format {
        "pdb" => format!("pdb{}.pdb", pdb_id.to_ascii_lowercase()),
        other => format!("{}.{}", pdb_id.to_ascii_lowercase(), other),
    }
}

/// The extension reported to the caller; for PDB retrievals this is the
/// pre-rename `ent`, matching the legacy download naming.
fn reported_extension(file_format: &str) -> &str {
    match file_format {
        "pdb" => "ent",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_uppercases_the_id() {
        assert_eq!(
            download_url("1abc", "pdb"),
            "https://files.rcsb.org/download/1ABC.pdb"
        );
    }

    #[test]
    fn pdb_downloads_use_legacy_ent_naming() {
        assert_eq!(download_filename("1ABC", "pdb"), "pdb1abc.ent");
        assert_eq!(stored_filename("1ABC", "pdb"), "pdb1abc.pdb");
        assert_eq!(reported_extension("pdb"), "ent");
    }

    #[test]
    fn other_formats_keep_their_extension() {
        assert_eq!(download_filename("1abc", "cif"), "1abc.cif");
        assert_eq!(stored_filename("1abc", "cif"), "1abc.cif");
        assert_eq!(reported_extension("cif"), "cif");
    }
}
