//! Checks of the tenant service file: tenant and VLAN uniqueness plus
//! the reserved VLAN ranges.

use regex::Regex;

use crate::vars::TenantVars;

use super::{duplicates, Report, Validation};

pub fn validate(svc_tnt: &TenantVars, peer_vlan: u16) -> Validation {
    let mut report = Report::new("service_tenant.yml");

    // Every later check dereferences these fields, so their absence
    // aborts this file's validation.
    for tnt in &svc_tnt.tenants {
        let name = tnt.tenant_name.as_deref().unwrap_or("unknown");
        if tnt.tenant_name.is_none() {
            report.err("-svc_tnt.tnt a tenant is missing its tenant_name".to_string());
        }
        if tnt.l3_tenant.is_none() {
            report.err(format!(
                "-svc_tnt.tnt '{name}' is missing the l3_tenant setting"
            ));
        }
        match &tnt.vlans {
            None => report.err(format!("-svc_tnt.tnt '{name}' has no VLANs defined")),
            Some(vlans) => {
                for vl in vlans {
                    if vl.num.is_none() {
                        report.err(format!(
                            "-svc_tnt.tnt '{name}' has a VLAN with no number"
                        ));
                    }
                    if vl.name.is_none() {
                        report.err(format!(
                            "-svc_tnt.tnt '{name}' has a VLAN with no name"
                        ));
                    }
                }
            }
        }
    }
    if report.has_errors() {
        return report.finish();
    }

    let tnt_names: Vec<&str> = svc_tnt
        .tenants
        .iter()
        .filter_map(|tnt| tnt.tenant_name.as_deref())
        .collect();
    for dup in duplicates(&tnt_names) {
        report.err(format!(
            "-svc_tnt.tnt '{dup}' is defined more than once, tenant names must be unique"
        ));
    }

    let mut vlan_nums: Vec<u16> = Vec::new();
    let mut vlan_names: Vec<&str> = Vec::new();
    for tnt in &svc_tnt.tenants {
        for vl in tnt.vlans.as_deref().unwrap_or(&[]) {
            if let Some(num) = vl.num {
                vlan_nums.push(num);
            }
            if let Some(name) = vl.name.as_deref() {
                vlan_names.push(name);
            }
            if let Some(ip) = vl.ip_addr.as_deref() {
                if ip.parse::<ipnet::Ipv4Net>().is_err() {
                    report.err(format!(
                        "-svc_tnt.tnt.vlans.ip_addr '{ip}' is not a valid IPv4 address and mask"
                    ));
                }
            }
        }
    }
    for dup in duplicates(&vlan_nums) {
        report.err(format!(
            "-svc_tnt.tnt.vlans.num '{dup}' is used more than once, VLAN numbers must be \
             unique fabric wide"
        ));
    }
    for dup in duplicates(&vlan_names) {
        report.err(format!(
            "-svc_tnt.tnt.vlans.name '{dup}' is used more than once, VLAN names must be \
             unique fabric wide"
        ));
    }
    if vlan_nums.contains(&peer_vlan) {
        report.err(format!(
            "-svc_tnt.tnt.vlans.num '{peer_vlan}' is reserved for the MLAG peer link SVI"
        ));
    }

    // Each tenant claims one VLAN out of the L3VNI carrier range, in
    // declaration order, whether or not it ends up a VRF.
    let adv = &svc_tnt.adv;
    let mut clashes: Vec<u16> = Vec::new();
    for n in 0..svc_tnt.tenants.len() as u16 {
        let carrier = adv.bse_vni.tnt_vlan + n * adv.vni_incre.tnt_vlan;
        if vlan_nums.contains(&carrier) {
            clashes.push(carrier);
        }
    }
    clashes.sort_unstable();
    if !clashes.is_empty() {
        report.err(format!(
            "-svc_tnt.tnt.vlans.num {clashes:?} are reserved for tenant L3VNI carrier VLANs"
        ));
    }

    let rm_name = Regex::new(r"src\S*dst|dst\S*src").unwrap();
    if !rm_name.is_match(&adv.redist.rm_name) {
        report.err(format!(
            "-svc_tnt.adv.redist.rm_name '{}' must contain both 'src' and 'dst'",
            adv.redist.rm_name
        ));
    }

    report.finish()
}
