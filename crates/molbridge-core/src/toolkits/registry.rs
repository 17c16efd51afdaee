//! Static backend registry.
//!
//! Backends are constructed once on first access and live for the rest of
//! the process. Lookup is by the lowercase backend name.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::graphene::Graphene;
use super::pdblite::PdbLite;
use super::{Toolkit, ToolkitError, ToolkitResult};

static REGISTRY: OnceLock<BTreeMap<&'static str, Box<dyn Toolkit>>> = OnceLock::new();

fn registry() -> &'static BTreeMap<&'static str, Box<dyn Toolkit>> {
    REGISTRY.get_or_init(|| {
        let backends: Vec<Box<dyn Toolkit>> =
            vec![Box::new(Graphene::default()), Box::new(PdbLite)];
        backends.into_iter().map(|b| (b.name(), b)).collect()
    })
}

/// Looks up a backend by name.
pub fn get(name: &str) -> ToolkitResult<&'static dyn Toolkit> {
    registry()
        .get(name)
        .map(|b| b.as_ref())
        .ok_or_else(|| ToolkitError::UnavailableToolkit(name.to_string()))
}

/// Names of all active backends, sorted.
pub fn names() -> Vec<&'static str> {
    registry().keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_backends_are_registered() {
        assert_eq!(names(), vec!["graphene", "pdblite"]);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(get("graphene").unwrap().name(), "graphene");
        assert_eq!(get("pdblite").unwrap().name(), "pdblite");
    }

    #[test]
    fn unknown_backend_is_unavailable() {
        assert!(matches!(
            get("openbabel"),
            Err(ToolkitError::UnavailableToolkit(_))
        ));
    }
}
