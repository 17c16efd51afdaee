//! Operation adapters bridging the service surface to the backend layer.
//!
//! Each adapter resolves the backend, gates the requested formats against
//! the backend's declared capabilities before any engine call, and shapes
//! the result for the endpoint that invoked it.

pub mod descriptors;
pub mod mutate;
pub mod rcsb;
pub mod read;
pub mod residues;
pub mod similarity;
pub mod write;
