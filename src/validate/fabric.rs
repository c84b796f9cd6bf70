//! Checks of the fabric variable file: fabric dimensions, underlay
//! routing settings and the advanced addressing knobs.

use regex::Regex;

use crate::vars::fabric::{FabricVars, Role};

use super::{duplicates, is_ipv4, Report, Validation};

struct Patterns {
    num_intf: Regex,
    acast_gw_mac: Regex,
    mlag_peer: Regex,
    word: Regex,
}

impl Patterns {
    fn new() -> Self {
        Patterns {
            num_intf: Regex::new(r"^\d+,\d{1,3}$").unwrap(),
            acast_gw_mac: Regex::new(r"^([0-9A-Fa-f]{4}\.){2}[0-9A-Fa-f]{4}$").unwrap(),
            mlag_peer: Regex::new(r"^[0-9]{1,3}-[0-9]{1,3}$").unwrap(),
            word: Regex::new(r"^\S+$").unwrap(),
        }
    }
}

pub fn validate(fabric: &FabricVars) -> Validation {
    let mut report = Report::new("fabric.yml");
    let patterns = Patterns::new();

    check_network_size(fabric, &mut report);

    for role in Role::ALL {
        let intf = fabric.num_intf.for_role(role);
        if !patterns.num_intf.is_match(intf) {
            report.err(format!(
                "-fbc.num_intf.{role} '{intf}' is not a valid range of interfaces ('first,last')"
            ));
        }
    }

    if let Some(auth) = &fabric.route.authentication {
        if !patterns.word.is_match(auth) {
            report.err(format!(
                "-fbc.route.authentication '{auth}' must be a single word with no whitespace"
            ));
        }
    }
    if !is_ipv4(&fabric.route.ospf.area) {
        report.err(format!(
            "-fbc.route.ospf.area '{}' must be an area in dotted decimal format",
            fabric.route.ospf.area
        ));
    }
    if !patterns.acast_gw_mac.is_match(&fabric.acast_gw_mac) {
        report.err(format!(
            "-fbc.acast_gw_mac '{}' is not a valid dotted MAC address",
            fabric.acast_gw_mac
        ));
    }

    let adv = &fabric.adv;
    if adv.route.bgp_timers.len() != 2 {
        report.err(format!(
            "-fbc.adv.route.bgp_timers '{:?}' must be a list of 2 timers, keepalive and holdtime",
            adv.route.bgp_timers
        ));
    }
    if !patterns.mlag_peer.is_match(&adv.bse_intf.mlag_peer) {
        report.err(format!(
            "-fbc.adv.bse_intf.mlag_peer '{}' is not a valid range of interfaces ('first-last')",
            adv.bse_intf.mlag_peer
        ));
    }

    let lp_nums = [adv.lp.rtr.num, adv.lp.vtep.num, adv.lp.bgw.num];
    for num in duplicates(&lp_nums) {
        report.err(format!(
            "-fbc.adv.lp 'loopback{num}' is used by more than one loopback type"
        ));
    }

    if !(1..=4096).contains(&adv.mlag.peer_vlan) {
        report.err(format!(
            "-fbc.adv.mlag.peer_vlan '{}' is not a valid VLAN number, must be 1 to 4096",
            adv.mlag.peer_vlan
        ));
    }

    check_addr_incre(fabric, &mut report);

    report.finish()
}

fn check_network_size(fabric: &FabricVars, report: &mut Report) {
    let size = &fabric.network_size;
    if !(1..=4).contains(&size.num_spine) {
        report.err(format!(
            "-fbc.network_size.num_spine '{}' is not valid, must be between 1 and 4",
            size.num_spine
        ));
    }
    if size.num_leaf % 2 != 0 || !(2..=10).contains(&size.num_leaf) {
        report.err(format!(
            "-fbc.network_size.num_leaf '{}' is not valid, must be an even number between 2 and 10",
            size.num_leaf
        ));
    }
    if size.num_border % 2 != 0 || size.num_border > 4 {
        report.err(format!(
            "-fbc.network_size.num_border '{}' is not valid, must be an even number between 0 and 4",
            size.num_border
        ));
    }
}

/// Each increment carves a different slice out of a shared network, so
/// no two increments of the same address class may collide. The MLAG
/// peering increments count /30 subnets rather than single addresses
/// and form their own class; the keepalive offset is relative and
/// exempt.
fn check_addr_incre(fabric: &FabricVars, report: &mut Report) {
    let mut loopback_incre: Vec<u32> = Vec::new();
    let mut mlag_incre: Vec<u32> = Vec::new();
    for (key, value) in &fabric.adv.addr_incre {
        if key == "mlag_kalive_incre" {
            continue;
        } else if key.starts_with("mlag_") {
            mlag_incre.push(*value);
        } else {
            loopback_incre.push(*value);
        }
    }
    for dup in duplicates(&loopback_incre) {
        report.err(format!(
            "-fbc.adv.addr_incre '{dup}' is used by more than one loopback or management increment"
        ));
    }
    for dup in duplicates(&mlag_incre) {
        report.err(format!(
            "-fbc.adv.addr_incre '{dup}' is used by more than one MLAG peering increment"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fabric() -> FabricVars {
        serde_yaml::from_str(
            r#"
network_size: {num_spine: 2, num_leaf: 4, num_border: 2}
num_intf: {spine: "1,64", leaf: "1,64", border: "1,64"}
route:
  ospf: {pro: 1, area: 0.0.0.0}
  bgp: {as_num: 65001}
acast_gw_mac: 0000.2222.3333
adv:
  nve_hold_time: 120
  route: {ospf_hello: 2, bgp_timers: [3, 9]}
  bse_intf:
    intf_fmt: Ethernet1/
    intf_short: Eth1/
    mlag_fmt: port-channel
    mlag_short: Po
    lp_fmt: loopback
    sp_to_lf: 1
    sp_to_bdr: 5
    lf_to_sp: 1
    bdr_to_sp: 1
    mlag_peer: 11-12
  lp:
    rtr: {num: 1, descr: "LP > RID"}
    vtep: {num: 2, descr: "LP > VTEP"}
    bgw: {num: 3, descr: "LP > BGW"}
  mlag: {domain: 1, peer_po: 1, peer_vlan: 2}
  addr_incre:
    spine_ip: 11
    border_ip: 16
    leaf_ip: 21
    border_vtep_lp: 36
    leaf_vtep_lp: 41
    border_mlag_lp: 56
    leaf_mlag_lp: 51
    border_bgw_lp: 58
    mlag_leaf_ip: 0
    mlag_border_ip: 20
    mlag_kalive_incre: 28
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_valid_fabric_passes() {
        assert!(validate(&fabric()).is_pass());
    }

    #[test]
    fn test_odd_leaf_count_rejected() {
        let mut fbc = fabric();
        fbc.network_size.num_leaf = 3;
        match validate(&fbc) {
            Validation::Fail(lines) => assert!(lines[1].contains("num_leaf")),
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_format_checks() {
        let mut fbc = fabric();
        fbc.num_intf.spine = "1-64".to_string();
        fbc.acast_gw_mac = "00:00:22:22:33:33".to_string();
        fbc.adv.bse_intf.mlag_peer = "11,12".to_string();
        match validate(&fbc) {
            Validation::Fail(lines) => assert_eq!(lines.len(), 4),
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_duplicate_increments_per_class() {
        let mut fbc = fabric();
        // Clashing loopback increments are an error even though the
        // MLAG class already holds a 20.
        fbc.adv.addr_incre.insert("leaf_bgw_lp".to_string(), 21);
        match validate(&fbc) {
            Validation::Fail(lines) => {
                assert_eq!(lines.len(), 2);
                assert!(lines[1].contains("'21'"));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }

        // The keepalive offset is relative, colliding with it is fine.
        let mut fbc = fabric();
        fbc.adv.addr_incre.insert("spine_vtep_lp".to_string(), 28);
        assert!(validate(&fbc).is_pass());
    }
}
