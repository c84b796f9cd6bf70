//! Typed models of the declarative input variable trees.
//!
//! Five independently authored YAML files describe the fabric: base naming
//! and addressing, fabric size and increments, tenant/VLAN services,
//! service interfaces and routing policy. Parsing applies unconditional
//! defaults once; fields whose absence must surface as an accumulated
//! validation message (rather than a parse failure) stay `Option` and are
//! checked by the validators.

pub mod base;
pub mod fabric;
pub mod interface;
pub mod loader;
pub mod route;
pub mod tenant;

pub use base::BaseVars;
pub use fabric::FabricVars;
pub use interface::InterfaceVars;
pub use loader::{load_all, AllVars};
pub use route::RouteVars;
pub use tenant::TenantVars;

/// Errors raised while reading and parsing the variable files.
#[derive(Debug, thiserror::Error)]
pub enum VarsError {
    #[error("failed to read variable file '{file}': {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse variable file '{file}': {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_yaml::Error,
    },
}
