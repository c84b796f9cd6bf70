//! Deterministic data-model generator for leaf and spine VXLAN EVPN
//! fabrics.
//!
//! Five YAML variable trees describe the whole fabric. The pipeline
//! validates them, derives every address and interface of the device
//! inventory, resolves the tenant, interface and routing services into
//! per-device data models and writes the lot out for a templating
//! engine to render.

pub mod addressing;
pub mod cli;
pub mod inventory;
pub mod orchestrator;
pub mod report;
pub mod services;
pub mod utils;
pub mod validate;
pub mod vars;
