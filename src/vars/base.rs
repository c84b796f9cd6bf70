//! Model of the base variable tree: device naming, base networks,
//! address increments, local users and management services.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top level of the base tree (`bse` in the variable file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseVars {
    pub device_name: DeviceNames,
    pub addr: BaseAddr,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub services: Services,
    #[serde(default)]
    pub mgmt_acl: Vec<MgmtAcl>,
    #[serde(default)]
    pub adv: BaseAdvanced,
}

/// OS image and session settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseAdvanced {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub image_version: String,
    #[serde(default)]
    pub exec_timeout: ExecTimeout,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecTimeout {
    pub console: u32,
    pub vty: u32,
}

/// Per-role device name stems. Everything after the last `-` becomes the
/// inventory group name, so it is restricted to letters, digits and
/// underscore (checked by the base validator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceNames {
    pub spine: String,
    pub leaf: String,
    pub border: String,
}

impl DeviceNames {
    pub fn for_role(&self, role: super::fabric::Role) -> &str {
        match role {
            super::fabric::Role::Spine => &self.spine,
            super::fabric::Role::Leaf => &self.leaf,
            super::fabric::Role::Border => &self.border,
        }
    }
}

/// Base networks that every fabric address is carved out of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseAddr {
    /// Loopback addresses, must cover every router/VTEP/BGW loopback (/26).
    pub lp_net: String,
    /// Management addresses (/27 or larger).
    pub mgmt_net: String,
    /// MLAG peer-link /30s; must be /26 when it also carries keepalives.
    pub mlag_peer_net: String,
    /// Optional dedicated keepalive network (/27 or larger).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mlag_kalive_net: Option<String>,
    pub mgmt_gw: String,
}

/// Local user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Management-plane services. All server addresses are validated as IPv4.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Services {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsServers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmp: Option<SnmpService>,
    #[serde(flatten, default)]
    pub server_lists: BTreeMap<String, ServerList>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsServers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sec: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comm: Option<String>,
}

/// Service described only by a list of servers (ntp, log, tacacs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub server: Vec<String>,
}

/// Management ACL entry; sources are prefixes or the keyword `any`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MgmtAcl {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub source: Vec<String>,
}
