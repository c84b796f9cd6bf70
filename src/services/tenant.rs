//! Resolves tenant declarations into per-role tenant and VLAN plans with
//! every VNI assigned.

use serde::{Deserialize, Serialize};

use crate::utils::vlan;
use crate::vars::tenant::{TenantVars, Vlan};

/// A VLAN with its L2VNI assigned and defaults resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVlan {
    pub num: u16,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_addr: Option<String>,
    pub ipv4_bgp_redist: bool,
    pub vni: u32,
    pub vxlan: bool,
    /// True only for the synthetic VLAN that carries the tenant L3VNI.
    #[serde(default)]
    pub l3vni_carrier: bool,
}

/// A tenant as deployed on one device role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTenant {
    pub tnt_name: String,
    pub l3_tnt: bool,
    pub l3vni: u32,
    pub tnt_vlan: u16,
    /// Whether any VLAN in the tenant redistributes its SVI into BGP.
    pub tnt_redist: bool,
    pub rm_name: String,
    pub bgp_redist_tag: u32,
    pub vlans: Vec<ResolvedVlan>,
}

/// The per-role outcome of tenant resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantPlan {
    pub leaf_tenants: Vec<ResolvedTenant>,
    pub border_tenants: Vec<ResolvedTenant>,
    /// Compacted `trunk allowed vlan` style range per role, always
    /// including VLAN 1 and the MLAG peer VLAN.
    pub leaf_vlan_range: String,
    pub border_vlan_range: String,
}

/// Running VNI and VLAN counters folded over the tenant list in
/// declaration order.
#[derive(Debug, Clone, Copy)]
struct VniCarry {
    l2vni: u32,
    l3vni: u32,
    tnt_vlan: u16,
}

/// Builds the tenant plan. Declaration order drives every increment, so
/// reordering tenants renumbers them.
pub fn resolve(svc_tnt: &TenantVars, peer_vlan: u16) -> TenantPlan {
    let mut carry = VniCarry {
        l2vni: svc_tnt.adv.bse_vni.l2vni,
        l3vni: svc_tnt.adv.bse_vni.l3vni,
        tnt_vlan: svc_tnt.adv.bse_vni.tnt_vlan,
    };
    let rm_tmpl = &svc_tnt.adv.redist.rm_name;

    let mut plan = TenantPlan::default();
    let mut leaf_nums: Vec<u16> = vec![1, peer_vlan];
    let mut border_nums: Vec<u16> = vec![1, peer_vlan];

    for tnt in &svc_tnt.tenants {
        let tnt_name = tnt.tenant_name.clone().unwrap_or_default();
        let l3_tnt = tnt.l3_tenant.unwrap_or_default();
        let bgp_redist_tag =
            tnt.bgp_redist_tag.unwrap_or(u32::from(carry.tnt_vlan));

        let mut leaf_vlans = Vec::new();
        let mut border_vlans = Vec::new();
        let mut tnt_redist = false;
        for vl in tnt.vlans.as_deref().unwrap_or(&[]) {
            let resolved = resolve_vlan(vl, carry.l2vni, &mut tnt_redist);
            if vl.create_on_border.unwrap_or(false) {
                border_vlans.push(resolved.clone());
            }
            if vl.create_on_leaf.unwrap_or(true) {
                leaf_vlans.push(resolved);
            }
        }
        carry.l2vni += svc_tnt.adv.vni_incre.l2vni;

        let rm_name = rm_tmpl
            .replace("src", "CONN")
            .replace("dst", &format!("BGP_{tnt_name}"));

        for (vlans, tenants, nums) in [
            (leaf_vlans, &mut plan.leaf_tenants, &mut leaf_nums),
            (border_vlans, &mut plan.border_tenants, &mut border_nums),
        ] {
            if vlans.is_empty() {
                continue;
            }
            let mut vlans = vlans;
            nums.extend(vlans.iter().map(|vl| vl.num));
            if l3_tnt {
                nums.push(carry.tnt_vlan);
            }
            vlans.push(ResolvedVlan {
                num: carry.tnt_vlan,
                name: format!("{tnt_name}_L3VNI"),
                ip_addr: None,
                ipv4_bgp_redist: false,
                vni: carry.l3vni,
                vxlan: true,
                l3vni_carrier: true,
            });
            tenants.push(ResolvedTenant {
                tnt_name: tnt_name.clone(),
                l3_tnt,
                l3vni: carry.l3vni,
                tnt_vlan: carry.tnt_vlan,
                tnt_redist,
                rm_name: rm_name.clone(),
                bgp_redist_tag,
                vlans,
            });
        }

        carry.l3vni += svc_tnt.adv.vni_incre.l3vni;
        carry.tnt_vlan += svc_tnt.adv.vni_incre.tnt_vlan;
    }

    plan.leaf_vlan_range = vlan::compact(&leaf_nums);
    plan.border_vlan_range = vlan::compact(&border_nums);
    plan
}

fn resolve_vlan(vl: &Vlan, l2vni_base: u32, tnt_redist: &mut bool) -> ResolvedVlan {
    let num = vl.num.unwrap_or_default();
    let ip_addr = vl.ip_addr.clone();
    let ipv4_bgp_redist = match &ip_addr {
        None => false,
        Some(_) => vl.ipv4_bgp_redist.unwrap_or(true),
    };
    if ipv4_bgp_redist {
        *tnt_redist = true;
    }
    ResolvedVlan {
        num,
        name: vl.name.clone().unwrap_or_default(),
        ip_addr,
        ipv4_bgp_redist,
        vni: l2vni_base + u32::from(num),
        vxlan: vl.vxlan.unwrap_or(true),
        l3vni_carrier: false,
    }
}
