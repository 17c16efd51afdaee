//! Named endpoints with a uniform JSON request/response contract.
//!
//! [`dispatch`] resolves an endpoint name, deserializes the request into its
//! typed envelope, and runs the handler. Malformed requests and handler
//! failures both come back as a `status: "failed"` envelope, so callers only
//! ever inspect response bodies.

pub mod envelope;
pub mod handlers;
pub mod requests;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

/// Every remote procedure exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChemicalSimilarity,
    Descriptors,
    Convert,
    Addh,
    Removeh,
    Make3d,
    Info,
    Rotate,
    SupportedToolkits,
    RemoveResidues,
    RetrieveRcsbStructure,
}

impl Endpoint {
    pub const ALL: [Endpoint; 11] = [
        Endpoint::ChemicalSimilarity,
        Endpoint::Descriptors,
        Endpoint::Convert,
        Endpoint::Addh,
        Endpoint::Removeh,
        Endpoint::Make3d,
        Endpoint::Info,
        Endpoint::Rotate,
        Endpoint::SupportedToolkits,
        Endpoint::RemoveResidues,
        Endpoint::RetrieveRcsbStructure,
    ];

    pub fn from_name(name: &str) -> Option<Endpoint> {
        Endpoint::ALL.iter().copied().find(|e| e.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::ChemicalSimilarity => "chemical_similarity",
            Endpoint::Descriptors => "descriptors",
            Endpoint::Convert => "convert",
            Endpoint::Addh => "addh",
            Endpoint::Removeh => "removeh",
            Endpoint::Make3d => "make3d",
            Endpoint::Info => "info",
            Endpoint::Rotate => "rotate",
            Endpoint::SupportedToolkits => "supported_toolkits",
            Endpoint::RemoveResidues => "remove_residues",
            Endpoint::RetrieveRcsbStructure => "retrieve_rcsb_structure",
        }
    }

    /// JSON key the endpoint's payload lives under.
    fn payload_key(self) -> &'static str {
        match self {
            Endpoint::ChemicalSimilarity => "results",
            Endpoint::Descriptors => "descriptors",
            Endpoint::Info => "attributes",
            Endpoint::SupportedToolkits => "toolkits",
            _ => "mol",
        }
    }
}

fn with_request<R, F>(endpoint: Endpoint, request: Value, handler: F) -> Value
where
    R: DeserializeOwned,
    F: FnOnce(R) -> Value,
{
    match serde_json::from_value(request) {
        Ok(request) => handler(request),
        Err(err) => {
            error!("Malformed {} request: {}", endpoint.name(), err);
            envelope::failed(endpoint.payload_key())
        }
    }
}

/// Runs the named endpoint against a JSON request body.
pub fn dispatch(endpoint: Endpoint, request: Value) -> Value {
    match endpoint {
        Endpoint::ChemicalSimilarity => {
            with_request(endpoint, request, handlers::chemical_similarity)
        }
        Endpoint::Descriptors => with_request(endpoint, request, handlers::get_descriptors),
        Endpoint::Convert => with_request(endpoint, request, handlers::convert),
        Endpoint::Addh => with_request(endpoint, request, handlers::addh),
        Endpoint::Removeh => with_request(endpoint, request, handlers::removeh),
        Endpoint::Make3d => with_request(endpoint, request, handlers::make3d),
        Endpoint::Info => with_request(endpoint, request, handlers::info),
        Endpoint::Rotate => with_request(endpoint, request, handlers::rotate),
        Endpoint::SupportedToolkits => handlers::supported_toolkits(),
        Endpoint::RemoveResidues => with_request(endpoint, request, handlers::remove_residues),
        Endpoint::RetrieveRcsbStructure => {
            with_request(endpoint, request, handlers::retrieve_rcsb_structure)
        }
    }
}
