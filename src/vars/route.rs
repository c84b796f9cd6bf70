//! Model of the route service tree: BGP peerings, OSPF processes,
//! static routes and the policy object naming templates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top level of the route service file (`svc_rte` in the variable file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteVars {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp: Option<BgpVars>,
    #[serde(default)]
    pub ospf: Vec<OspfProcess>,
    #[serde(default)]
    pub static_route: Vec<StaticRouteGroup>,
    pub adv: RouteAdvanced,
}

/// A filter value: the keywords `any`/`default` or an explicit prefix list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterEntry {
    Keyword(String),
    Prefixes(Vec<String>),
}

/// BGP attribute values keyed by the attribute amount, for example
/// `50: [10.0.0.0/8]` to set weight 50 on matching prefixes.
pub type AttrMap = BTreeMap<u32, FilterEntry>;

// ---------------------------------------------------------------- BGP

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BgpVars {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<BgpGroup>>,
    #[serde(default)]
    pub tnt_advertise: Vec<TenantAdvertise>,
}

/// Settings shared by a group of peers; any of them can be overridden
/// per peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BgpGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub session: BgpSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<Vec<BgpPeer>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BgpPeer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_ip: Option<String>,
    #[serde(flatten)]
    pub session: BgpSession,
}

/// Session attributes valid at either group or peer level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BgpSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_as: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timers: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bfd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebgp_multihop: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop_self: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound: Option<InboundFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound: Option<OutboundFilters>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<AttrMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pref: Option<AttrMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<FilterEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny: Option<FilterEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub med: Option<AttrMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_prepend: Option<AttrMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<FilterEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny: Option<FilterEntry>,
}

/// What each tenant advertises into BGP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantAdvertise {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    #[serde(default)]
    pub network: Vec<NetworkAdvert>,
    #[serde(default)]
    pub summary: Vec<SummaryAdvert>,
    #[serde(default)]
    pub redist: Vec<Redistribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkAdvert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryAdvert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    /// `summary-only` for BGP, `not-advertise` for OSPF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// OSPF only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

/// Redistribution of one source protocol into the enclosing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redistribution {
    /// `bgp <as>`, `ospf <proc>`, `static` or `connected`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub redist_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<AttrMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<FilterEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
}

// --------------------------------------------------------------- OSPF

/// `default_orig: True` or `default_orig: always`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultOriginate {
    Enabled(bool),
    Mode(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OspfProcess {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<serde_yaml::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bfd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_orig: Option<DefaultOriginate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<Vec<OspfInterface>>,
    #[serde(default)]
    pub summary: Vec<SummaryAdvert>,
    #[serde(default)]
    pub redist: Vec<Redistribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OspfInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hello: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub intf_type: Option<String>,
}

// ------------------------------------------------------- Static routes

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticRouteGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    #[serde(default)]
    pub route: Vec<StaticRoute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticRoute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<Vec<String>>,
    /// Administrative distance, 1 to 255.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop_vrf: Option<String>,
}

// --------------------------------------------------------- Naming adv

/// Policy object naming templates. `name` and `val` tokens in the BGP
/// templates and `src`/`dst` tokens in the redistribute templates are
/// substituted at synthesis time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteAdvanced {
    pub bgp_naming: BTreeMap<String, String>,
    pub redist: BTreeMap<String, String>,
    pub dflt_pl: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bgp_group_and_peer() {
        let yaml = r#"
bgp:
  group:
    - name: INET
      switch: [DC1-N9K-BORDER01]
      remote_as: 65100
      inbound:
        weight:
          50: [10.0.0.0/8]
        deny: any
      peer:
        - name: GTT
          descr: "GTT peering"
          peer_ip: 10.255.99.2
          tenant: [RED]
adv:
  bgp_naming:
    rm_in: RM_name_IN
    rm_out: RM_name_OUT
    pl_in: PL_name_IN
    pl_out: PL_name_OUT
    pl_wght_in: PL_name_WGHTval_IN
    pl_pref_in: PL_name_PREFval_IN
    pl_med_out: PL_name_MEDval_OUT
    pl_aspath_out: PL_name_AS+val_OUT
  redist:
    rm_name: RM_src_to_dst
    pl_name: PL_src_to_dst
    pl_metric_name: PL_src_to_dst_MEval
  dflt_pl:
    pl_deny: PL_DENY_ALL
    pl_allow: PL_ALLOW_ALL
    pl_default: PL_DEFAULT
"#;
        let rte: RouteVars = serde_yaml::from_str(yaml).unwrap();
        let grp = &rte.bgp.as_ref().unwrap().group.as_ref().unwrap()[0];
        assert_eq!(grp.name.as_deref(), Some("INET"));
        let inbound = grp.session.inbound.as_ref().unwrap();
        assert_eq!(
            inbound.deny,
            Some(FilterEntry::Keyword("any".to_string()))
        );
        assert_eq!(
            inbound.weight.as_ref().unwrap()[&50],
            FilterEntry::Prefixes(vec!["10.0.0.0/8".to_string()])
        );
        let peer = &grp.peer.as_ref().unwrap()[0];
        assert_eq!(peer.peer_ip.as_deref(), Some("10.255.99.2"));
        assert_eq!(rte.adv.dflt_pl["pl_deny"], "PL_DENY_ALL");
    }

    #[test]
    fn test_parse_ospf_and_static() {
        let yaml = r#"
ospf:
  - process: 10
    tenant: BLU
    switch: [DC1-N9K-LEAF01, DC1-N9K-LEAF02]
    rid: [1.1.1.1, 2.2.2.2]
    interface:
      - name: [Vlan110]
        area: 0.0.0.0
static_route:
  - tenant: [BLU]
    switch: [DC1-N9K-LEAF01]
    route:
      - prefix: [10.99.0.0/16]
        gateway: 10.10.110.100
        ad: 30
adv:
  bgp_naming: {rm_in: RM_name_IN}
  redist: {rm_name: RM_src_to_dst}
  dflt_pl: {pl_default: PL_DEFAULT}
"#;
        let rte: RouteVars = serde_yaml::from_str(yaml).unwrap();
        assert!(rte.bgp.is_none());
        let proc = &rte.ospf[0];
        assert_eq!(proc.rid.as_ref().unwrap().len(), 2);
        assert_eq!(
            proc.interface.as_ref().unwrap()[0].name.as_ref().unwrap()[0],
            "Vlan110"
        );
        assert_eq!(rte.static_route[0].route[0].ad, Some(30));
    }
}
