//! Fabric inventory: derives every device with its management, loopback
//! and MLAG addressing plus the fabric facing interfaces.

pub mod builder;
pub mod types;

pub use builder::{build, group_name};
pub use types::{Device, Inventory, Loopback};
