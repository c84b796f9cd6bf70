//! Small shared helpers.

pub mod vlan;
