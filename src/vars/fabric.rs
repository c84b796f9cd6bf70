//! Model of the fabric variable tree: dimensions, underlay routing,
//! interface layout, loopbacks, MLAG settings and address increments.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Device roles in the leaf and spine architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Spine,
    Leaf,
    Border,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Spine, Role::Leaf, Role::Border];

    /// Roles that terminate VXLAN tunnels and run MLAG.
    pub fn is_vtep(self) -> bool {
        matches!(self, Role::Leaf | Role::Border)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Spine => write!(f, "spine"),
            Role::Leaf => write!(f, "leaf"),
            Role::Border => write!(f, "border"),
        }
    }
}

/// Top level of the fabric tree (`fbc` in the variable file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricVars {
    pub network_size: NetworkSize,
    pub num_intf: NumIntf,
    pub route: UnderlayRoute,
    pub acast_gw_mac: String,
    pub adv: FabricAdvanced,
}

/// How many devices of each role the fabric has. Leaf and border counts
/// must be even as those roles are deployed in MLAG pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSize {
    pub num_spine: u16,
    pub num_leaf: u16,
    pub num_border: u16,
}

impl NetworkSize {
    pub fn for_role(&self, role: Role) -> u16 {
        match role {
            Role::Spine => self.num_spine,
            Role::Leaf => self.num_leaf,
            Role::Border => self.num_border,
        }
    }
}

/// Physical interface range per role as `first,last`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumIntf {
    pub spine: String,
    pub leaf: String,
    pub border: String,
}

impl NumIntf {
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Spine => &self.spine,
            Role::Leaf => &self.leaf,
            Role::Border => &self.border,
        }
    }
}

/// Underlay and overlay routing protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlayRoute {
    pub ospf: UnderlayOspf,
    pub bgp: UnderlayBgp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlayOspf {
    pub pro: serde_yaml::Value,
    pub area: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlayBgp {
    pub as_num: serde_yaml::Value,
}

/// Settings most deployments never touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricAdvanced {
    pub nve_hold_time: u32,
    pub route: AdvancedRoute,
    pub bse_intf: BaseInterfaces,
    pub lp: Loopbacks,
    pub mlag: MlagSettings,
    pub addr_incre: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedRoute {
    pub ospf_hello: u32,
    pub bgp_timers: Vec<u32>,
}

/// Interface naming and the fixed ports fabric links start at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseInterfaces {
    pub intf_fmt: String,
    pub intf_short: String,
    pub mlag_fmt: String,
    pub mlag_short: String,
    pub lp_fmt: String,
    pub sp_to_lf: u16,
    pub sp_to_bdr: u16,
    pub lf_to_sp: u16,
    pub bdr_to_sp: u16,
    /// Peer-link member ports as `first-last`.
    pub mlag_peer: String,
    /// Keepalive port number; anything non numeric means the keepalive
    /// runs over the management interface instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mlag_kalive: Option<serde_yaml::Value>,
}

impl BaseInterfaces {
    /// Keepalive port when it is a dedicated fabric interface.
    pub fn kalive_port(&self) -> Option<u16> {
        match self.mlag_kalive.as_ref()? {
            serde_yaml::Value::Number(n) => n.as_u64().map(|n| n as u16),
            _ => None,
        }
    }
}

/// Loopback numbers and descriptions per purpose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loopbacks {
    pub rtr: LoopbackDef,
    pub vtep: LoopbackDef,
    pub bgw: LoopbackDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopbackDef {
    pub num: u16,
    pub descr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlagSettings {
    pub domain: u32,
    pub peer_po: u16,
    pub peer_vlan: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kalive_vrf: Option<String>,
}
