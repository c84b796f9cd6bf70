//! Resolves interface declarations into the full per-device interface
//! list, allocating port, loopback and port-channel numbers from the
//! reserved ranges.

use serde::{Deserialize, Serialize};

use crate::addressing;
use crate::inventory::Device;
use crate::utils::vlan;
use crate::vars::fabric::BaseInterfaces;
use crate::vars::interface::{
    IntfDecl, IntfType, InterfaceVars, IpVlan, PoMode,
};

/// Spanning tree port behaviour derived from the interface type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StpMode {
    Edge,
    Network,
    Normal,
}

fn stp_for(intf_type: IntfType) -> Option<StpMode> {
    match intf_type {
        IntfType::Access | IntfType::NonStpTrunk => Some(StpMode::Edge),
        IntfType::StpTrunk => Some(StpMode::Network),
        IntfType::StpTrunkNonBa => Some(StpMode::Normal),
        IntfType::Layer3 | IntfType::Loopback | IntfType::Svi => None,
    }
}

/// One interface as it will be configured on a device. Port-channels
/// synthesized for dual homed members carry `vpc_num`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedInterface {
    pub name: String,
    pub descr: String,
    #[serde(rename = "type")]
    pub intf_type: IntfType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_vlan: Option<IpVlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub dual_homed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp: Option<StpMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_num: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_mode: Option<PoMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_num: Option<u16>,
}

/// Last two digits of a device name, its position within the role.
fn host_seq(hostname: &str) -> u16 {
    hostname
        .get(hostname.len().saturating_sub(2)..)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

/// Dual homed declarations name only the odd pair member, so an even
/// device also matches its predecessor's name.
fn matches_dual(hostname: &str, switches: &[String]) -> bool {
    if switches.iter().any(|sw| sw == hostname) {
        return true;
    }
    let seq = host_seq(hostname);
    if seq < 2 {
        return false;
    }
    let stem = &hostname[..hostname.len() - 2];
    let odd = format!("{stem}{:02}", seq - 1);
    switches.iter().any(|sw| *sw == odd)
}

struct Pending<'a> {
    decl: &'a IntfDecl,
    dual_homed: bool,
}

impl Pending<'_> {
    fn intf_type(&self) -> IntfType {
        // Mandatory field, validated before resolution.
        self.decl.intf_type.unwrap_or(IntfType::Access)
    }

    fn resolve(&self, name: String) -> ResolvedInterface {
        let intf_type = self.intf_type();
        let tenant = match (self.dual_homed, self.decl.tenant.as_deref()) {
            // An explicit global tenant means the same as no tenant.
            (false, Some(t)) if t.eq_ignore_ascii_case("global") => None,
            (_, t) => t.map(str::to_string),
        };
        let mut ip_vlan = self.decl.ip_vlan.clone();
        // Trunk allowed VLANs are normalised into compacted ranges.
        if intf_type.is_trunk() {
            if let Some(IpVlan::Text(raw)) = &ip_vlan {
                if let Ok(nums) = vlan::expand(raw) {
                    ip_vlan = Some(IpVlan::Text(vlan::compact(&nums)));
                }
            }
        }
        let po_mode = if self.dual_homed {
            Some(
                self.decl
                    .po_mode
                    .as_ref()
                    .map(|m| m.resolve())
                    .unwrap_or(PoMode::Active),
            )
        } else {
            None
        };
        ResolvedInterface {
            name,
            descr: self.decl.descr.clone().unwrap_or_default(),
            intf_type,
            ip_vlan,
            tenant,
            dual_homed: self.dual_homed,
            stp: stp_for(intf_type),
            po_num: self.decl.po_num,
            po_mode,
            vpc_num: None,
        }
    }
}

/// Builds the interface list for one device. Declarations without a
/// pinned number take the lowest free number in their reserved range,
/// in declaration order.
pub fn resolve(
    svc_intf: &InterfaceVars,
    hostname: &str,
    bse: &BaseInterfaces,
) -> Vec<ResolvedInterface> {
    let adv = &svc_intf.adv;
    // Resolved interface plus its per-member descriptions, which are
    // only applied after the shared description has been copied onto
    // the synthesized port-channel.
    let mut have: Vec<(ResolvedInterface, Option<Vec<String>>)> = Vec::new();
    let mut need_lp: Vec<Pending> = Vec::new();
    let mut need_sh: Vec<Pending> = Vec::new();
    let mut need_dh: Vec<Pending> = Vec::new();
    let mut used_intf: Vec<u16> = Vec::new();
    let mut used_lp: Vec<u16> = Vec::new();

    let declared = svc_intf
        .intf
        .single_homed
        .iter()
        .map(|decl| Pending { decl, dual_homed: false })
        .chain(
            svc_intf
                .intf
                .dual_homed
                .iter()
                .map(|decl| Pending { decl, dual_homed: true }),
        );
    for pending in declared {
        let switches = pending.decl.switch.as_deref().unwrap_or(&[]);
        let matched = if pending.dual_homed {
            matches_dual(hostname, switches)
        } else {
            switches.iter().any(|sw| sw == hostname)
        };
        if !matched {
            continue;
        }
        let mbr = pending.decl.po_mbr_descr.clone();
        match (pending.intf_type(), pending.decl.intf_num) {
            (IntfType::Loopback, Some(num)) => {
                used_lp.push(num);
                let name = format!("{}{num}", bse.lp_fmt);
                have.push((pending.resolve(name), mbr));
            }
            (IntfType::Loopback, None) => need_lp.push(pending),
            // The SVI number is the VLAN itself, nothing to allocate.
            (IntfType::Svi, num) => {
                let name = format!("Vlan{}", num.unwrap_or_default());
                have.push((pending.resolve(name), mbr));
            }
            (_, Some(num)) => {
                used_intf.push(num);
                let name = format!("{}{num}", bse.intf_fmt);
                have.push((pending.resolve(name), mbr));
            }
            (_, None) if pending.dual_homed => need_dh.push(pending),
            (_, None) => need_sh.push(pending),
        }
    }

    let lp_pool =
        addressing::available_numbers(adv.single_homed.first_lp, adv.single_homed.last_lp, &used_lp);
    let sh_pool = addressing::available_numbers(
        adv.single_homed.first_intf,
        adv.single_homed.last_intf,
        &used_intf,
    );
    let dh_pool = addressing::available_numbers(
        adv.dual_homed.first_intf,
        adv.dual_homed.last_intf,
        &used_intf,
    );
    for (pending, num) in need_lp.iter().zip(&lp_pool) {
        let mbr = pending.decl.po_mbr_descr.clone();
        have.push((pending.resolve(format!("{}{num}", bse.lp_fmt)), mbr));
    }
    for (pending, num) in need_sh.iter().zip(&sh_pool) {
        let mbr = pending.decl.po_mbr_descr.clone();
        have.push((pending.resolve(format!("{}{num}", bse.intf_fmt)), mbr));
    }
    for (pending, num) in need_dh.iter().zip(&dh_pool) {
        let mbr = pending.decl.po_mbr_descr.clone();
        have.push((pending.resolve(format!("{}{num}", bse.intf_fmt)), mbr));
    }

    // Dual homed members get a matching port-channel straight after the
    // member; ones without a pinned number are allocated at the end. The
    // odd pair member takes the first per-member description.
    let odd = host_seq(hostname) % 2 == 1;
    let member_descr = |intf: &mut ResolvedInterface, mbr: Option<Vec<String>>| {
        if let Some(descr) = mbr.and_then(|m| {
            m.get(usize::from(!odd)).cloned()
        }) {
            intf.descr = descr;
        }
    };
    let mut all: Vec<ResolvedInterface> = Vec::new();
    let mut need_po: Vec<(ResolvedInterface, Option<Vec<String>>)> = Vec::new();
    let mut used_po: Vec<u16> = Vec::new();
    for (mut intf, mbr) in have {
        if !intf.dual_homed {
            all.push(intf);
        } else if let Some(po) = intf.po_num {
            used_po.push(po);
            let po_intf = port_channel(&intf, po, bse);
            member_descr(&mut intf, mbr);
            all.push(intf);
            all.push(po_intf);
        } else {
            need_po.push((intf, mbr));
        }
    }
    let po_pool = addressing::available_numbers(
        adv.dual_homed.first_po,
        adv.dual_homed.last_po,
        &used_po,
    );
    for ((mut intf, mbr), po) in need_po.into_iter().zip(po_pool) {
        intf.po_num = Some(po);
        let po_intf = port_channel(&intf, po, bse);
        member_descr(&mut intf, mbr);
        all.push(intf);
        all.push(po_intf);
    }
    all
}

/// Port-channel synthesized above a dual homed member; vpc_num mirrors
/// the port-channel number.
fn port_channel(
    member: &ResolvedInterface,
    po: u16,
    bse: &BaseInterfaces,
) -> ResolvedInterface {
    ResolvedInterface {
        name: format!("{}{po}", bse.mlag_fmt),
        descr: member.descr.clone(),
        intf_type: member.intf_type,
        ip_vlan: member.ip_vlan.clone(),
        tenant: member.tenant.clone(),
        dual_homed: true,
        stp: member.stp,
        po_num: None,
        po_mode: None,
        vpc_num: Some(po),
    }
}

/// Physical interfaces on the device with no fabric, MLAG or service
/// role, in port order. These get reset to their defaults.
pub fn unused_interfaces(
    device: &Device,
    num_intf: &str,
    bse: &BaseInterfaces,
    resolved: &[ResolvedInterface],
) -> Result<Vec<String>, String> {
    let (first, last) = addressing::parse_range(num_intf)?;
    let mut used: Vec<&str> = Vec::new();
    for intf in device
        .fabric_intf
        .keys()
        .chain(device.mlag_peer_intf.keys())
        .chain(device.mlag_kalive_intf.keys())
    {
        if intf.starts_with(&bse.intf_fmt) {
            used.push(intf);
        }
    }
    for intf in resolved {
        if intf.name.starts_with(&bse.intf_fmt) {
            used.push(&intf.name);
        }
    }
    Ok((first..=last)
        .map(|n| format!("{}{n}", bse.intf_fmt))
        .filter(|name| !used.contains(&name.as_str()))
        .collect())
}
