//! Model of the interface service tree: single and dual homed access
//! port declarations plus the reserved allocation ranges.

use serde::{Deserialize, Serialize};

/// Top level of the interface service file (`svc_intf` in the variable file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceVars {
    pub intf: HomedInterfaces,
    pub adv: InterfaceAdvanced,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomedInterfaces {
    #[serde(default)]
    pub single_homed: Vec<IntfDecl>,
    #[serde(default)]
    pub dual_homed: Vec<IntfDecl>,
}

/// The seven kinds of access interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntfType {
    Access,
    StpTrunk,
    StpTrunkNonBa,
    NonStpTrunk,
    Layer3,
    Loopback,
    Svi,
}

impl IntfType {
    pub fn is_trunk(self) -> bool {
        matches!(
            self,
            IntfType::StpTrunk | IntfType::StpTrunkNonBa | IntfType::NonStpTrunk
        )
    }
}

/// Port-channel mode for dual homed interfaces. A bare YAML `True` is the
/// LACP-less `on` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoMode {
    Active,
    Passive,
    On,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoModeDecl {
    Mode(PoMode),
    /// `po_mode: True` in YAML.
    Flag(bool),
}

impl PoModeDecl {
    pub fn resolve(&self) -> PoMode {
        match self {
            PoModeDecl::Mode(m) => *m,
            PoModeDecl::Flag(_) => PoMode::On,
        }
    }
}

/// Either a VLAN number (access, svi), a VLAN range string (trunks) or
/// an address (layer3, loopback).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpVlan {
    Vlan(u16),
    Text(String),
}

impl IpVlan {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            IpVlan::Text(s) => Some(s),
            IpVlan::Vlan(_) => None,
        }
    }
}

/// One declared interface, on every switch it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntfDecl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub intf_type: Option<IntfType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_vlan: Option<IpVlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Pins the interface to a port rather than taking one from the pool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intf_num: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_num: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_mode: Option<PoModeDecl>,
    /// Per-member descriptions, odd switch first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_mbr_descr: Option<Vec<String>>,
}

/// Reserved ranges the automatic allocator draws from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceAdvanced {
    pub single_homed: SingleHomedRanges,
    pub dual_homed: DualHomedRanges,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleHomedRanges {
    pub first_intf: u16,
    pub last_intf: u16,
    pub first_lp: u16,
    pub last_lp: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualHomedRanges {
    pub first_intf: u16,
    pub last_intf: u16,
    pub first_po: u16,
    pub last_po: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interface_tree() {
        let yaml = r#"
intf:
  single_homed:
    - descr: "UPLINK > FW01"
      type: layer3
      ip_vlan: 10.255.99.1/30
      switch: [DC1-N9K-BORDER01]
      tenant: RED
  dual_homed:
    - descr: "ACCESS > ESX01"
      type: stp_trunk
      ip_vlan: "110,120"
      switch: [DC1-N9K-LEAF01]
      po_mode: True
adv:
  single_homed:
    first_intf: 33
    last_intf: 40
    first_lp: 11
    last_lp: 20
  dual_homed:
    first_intf: 41
    last_intf: 48
    first_po: 41
    last_po: 48
"#;
        let svc: InterfaceVars = serde_yaml::from_str(yaml).unwrap();
        let sh = &svc.intf.single_homed[0];
        assert_eq!(sh.intf_type, Some(IntfType::Layer3));
        assert_eq!(sh.ip_vlan.as_ref().unwrap().as_text(), Some("10.255.99.1/30"));
        let dh = &svc.intf.dual_homed[0];
        assert_eq!(dh.po_mode.as_ref().unwrap().resolve(), PoMode::On);
        assert!(dh.intf_type.unwrap().is_trunk());
        assert_eq!(svc.adv.dual_homed.first_po, 41);
    }

    #[test]
    fn test_po_mode_names() {
        let m: PoModeDecl = serde_yaml::from_str("passive").unwrap();
        assert_eq!(m.resolve(), PoMode::Passive);
    }
}
