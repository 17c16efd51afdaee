use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::warn;

/// Permissive SMILES character-class pattern.
///
/// Matches a single-line string of atom symbols, digits, bond, charge and
/// bracket characters, rejecting strings starting with `J` (no element and no
/// SMILES token starts with it).
const SMILES_PATTERN: &str = r"^([^J][A-Za-z0-9@+\-\[\]\(\)\\/%=#$]+)$";

fn smiles_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SMILES_PATTERN).expect("SMILES pattern is valid"))
}

/// A tagged union describing either inline molecular structure data or a
/// filesystem reference.
///
/// At most one of `content`/`path` is the authoritative source. Validation
/// fills `extension` from content sniffing, or leaves whatever it was
/// initialized to when no classification rule matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathFile {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub extension: Option<String>,
}

impl PathFile {
    /// Wraps inline content with a format extension, no path.
    pub fn from_content(content: impl Into<String>, extension: impl Into<String>) -> Self {
        PathFile {
            content: Some(content.into()),
            path: None,
            extension: Some(extension.into()),
        }
    }

    /// Validates the object in place and returns it.
    ///
    /// Single-line inline content is classified by literal prefix first
    /// (`InChI=` → `inchi`); only content without that prefix is matched
    /// against the permissive SMILES character class (→ `smi`). Multi-line
    /// content is left unclassified. When there is no content but `path`
    /// names an existing file, the content is loaded from disk with no
    /// extension inference. Classification failure is not an error.
    pub fn validate(mut self) -> Self {
        if let Some(content) = self.content.as_deref() {
            // SMILES and InChI are single-line strings; a trailing newline
            // already disqualifies the content, as does any embedded one.
            if content.split('\n').count() == 1 {
                if content.starts_with("InChI=") {
                    self.extension = Some("inchi".to_string());
                } else if smiles_regex().is_match(content) {
                    self.extension = Some("smi".to_string());
                }
            }
        } else if let Some(path) = self.path.as_deref() {
            if path.exists() {
                match fs::read_to_string(path) {
                    Ok(content) => self.content = Some(content),
                    Err(err) => warn!("Unable to read structure file {}: {}", path.display(), err),
                }
            }
        }

        self
    }
}
