//! Wire types for the Nebula workspace backends.
//!
//! This crate contains the serde-serializable types exchanged with the
//! external collaborators of the workspace shell: the identity provider's
//! token endpoint, the code service's repository and IDE endpoints, and the
//! entry manifests published by remote feature modules.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * 1:1 with the wire: field names match the JSON the services emit
//! * Stable: Changes only when a backend contract changes
//!
//! Behavior (auth injection, caching, error mapping) lives in `nebula-runtime`.

pub mod auth_exchange;
pub mod error;
pub mod launch;
pub mod manifest;
pub mod resource;

pub use auth_exchange::*;
pub use error::*;
pub use launch::*;
pub use manifest::*;
pub use resource::*;
