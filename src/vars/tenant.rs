//! Model of the tenant service tree: VRFs and the VLANs inside them.

use serde::{Deserialize, Serialize};

/// Top level of the tenant service file (`svc_tnt` in the variable file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantVars {
    #[serde(rename = "tnt", default)]
    pub tenants: Vec<Tenant>,
    pub adv: TenantAdvanced,
}

/// One tenant. A layer 3 tenant becomes a VRF with an L3VNI; a layer 2
/// tenant only carries its VLANs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Mandatory; its absence aborts validation of the whole file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l3_tenant: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp_redist_tag: Option<u32>,
    /// Mandatory, same fail-fast treatment as the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlans: Option<Vec<Vlan>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_bgp_redist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_on_leaf: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_on_border: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vxlan: Option<bool>,
}

/// VNI seeds and increments plus redistribution naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantAdvanced {
    pub bse_vni: BaseVni,
    pub vni_incre: VniIncrements,
    pub redist: TenantRedist,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseVni {
    pub tnt_vlan: u16,
    pub l3vni: u32,
    pub l2vni: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VniIncrements {
    pub tnt_vlan: u16,
    pub l3vni: u32,
    pub l2vni: u32,
}

/// Route-map naming template; must contain `src` and `dst` tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRedist {
    pub rm_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tenant_tree() {
        let yaml = r#"
tnt:
  - tenant_name: BLU
    l3_tenant: true
    vlans:
      - num: 110
        name: blu_web
        ip_addr: 10.10.110.1/24
      - num: 111
        name: blu_l2only
adv:
  bse_vni:
    tnt_vlan: 3001
    l3vni: 1003001
    l2vni: 10000
  vni_incre:
    tnt_vlan: 1
    l3vni: 1
    l2vni: 10000
  redist:
    rm_name: RM_src_to_dst
"#;
        let tnt: TenantVars = serde_yaml::from_str(yaml).unwrap();
        let vlans = tnt.tenants[0].vlans.as_ref().unwrap();
        assert_eq!(vlans[0].num, Some(110));
        assert!(vlans[1].ip_addr.is_none());
        assert_eq!(tnt.adv.bse_vni.l2vni, 10000);
        assert_eq!(tnt.adv.redist.rm_name, "RM_src_to_dst");
    }
}
