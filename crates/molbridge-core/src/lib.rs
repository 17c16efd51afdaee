//! # Molbridge Core Library
//!
//! A service facade that exposes cheminformatics toolkit operations (structure
//! read/write/convert, hydrogen addition and removal, 3D coordinate embedding,
//! fingerprint similarity, residue stripping and RCSB structure retrieval) as
//! named endpoints with a uniform JSON request/response contract.
//!
//! ## Architectural Philosophy
//!
//! The library is layered so that each concern stays replaceable:
//!
//! - **[`core`]: The Foundation.** Stateless data models (the path-file input
//!   union, the molecule handle wrapper, the PDB `Structure` hierarchy) and
//!   format I/O utilities.
//!
//! - **[`toolkits`]: The Capability Layer.** The `Toolkit` trait normalizes
//!   heterogeneous cheminformatics backends behind one interface; a read-only
//!   registry, populated once at startup from the compiled-in backends,
//!   dispatches by name. Unsupported capabilities are explicit results, never
//!   runtime absence failures.
//!
//! - **[`adapters`]: The Operation Layer.** Thin request handlers that resolve
//!   a backend, validate formats against its declared capability sets, invoke
//!   it, and shape the result. All chemistry happens inside the backends; this
//!   layer contributes dispatch, validation and response shaping only.
//!
//! - **[`service`]: The Public Surface.** Named endpoints (`convert`, `addh`,
//!   `make3d`, `chemical_similarity`, ...) with typed serde envelopes. Every
//!   failure is flattened to a `status: "failed"` response; the hosting RPC
//!   bus never sees a transport-level error from this crate.

pub mod adapters;
pub mod core;
pub mod service;
pub mod toolkits;
