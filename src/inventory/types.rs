//! Inventory output types: devices, their loopbacks and group membership.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::vars::fabric::Role;

/// One loopback interface on a device. The VTEP loopback also carries
/// the MLAG anycast address shared with the pair device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loopback {
    pub name: String,
    pub ip: String,
    pub descr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mlag_lp_addr: Option<String>,
}

/// A fabric device with every address and interface the generator
/// derived for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub role: Role,
    /// Position within the role, starting at 1.
    pub seq: u16,
    pub mgmt_ip: String,
    pub loopbacks: Vec<Loopback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mlag_peer_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mlag_kalive_ip: Option<String>,
    /// Fabric uplinks, interface name to description.
    pub fabric_intf: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub mlag_peer_intf: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub mlag_kalive_intf: BTreeMap<String, String>,
}

impl Device {
    /// Devices are paired odd with the following even sequence number.
    pub fn is_odd(&self) -> bool {
        self.seq % 2 == 1
    }

    /// Name of this device's MLAG pair, odd pairs with odd + 1.
    pub fn pair_name(&self, stem: &str) -> String {
        let pair_seq = if self.is_odd() { self.seq + 1 } else { self.seq - 1 };
        format!("{stem}{pair_seq:02}")
    }

    /// All loopback interface names on the device.
    pub fn loopback_names(&self) -> Vec<String> {
        self.loopbacks.iter().map(|lp| lp.name.clone()).collect()
    }
}

/// The whole generated inventory: devices in role then sequence order,
/// plus role groups and the per-group physical interface range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub devices: Vec<Device>,
    pub groups: BTreeMap<String, Vec<String>>,
    /// `num_intf` range string per group.
    pub group_num_intf: BTreeMap<String, String>,
}

impl Inventory {
    pub fn device(&self, name: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.name == name)
    }

    pub fn devices_by_role(&self, role: Role) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(move |d| d.role == role)
    }
}
