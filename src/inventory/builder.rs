//! Derives every device, address and fabric interface from the base and
//! fabric trees. All addressing is pure arithmetic over the base
//! networks, so the same input always yields the same inventory.

use std::collections::BTreeMap;

use ipnet::Ipv4Net;
use log::debug;

use crate::addressing;
use crate::vars::fabric::Role;
use crate::vars::{BaseVars, FabricVars};

use super::types::{Device, Inventory, Loopback};

/// Builds the full inventory. Capacity of the base networks is checked
/// by the base validator beforehand, so an addressing failure here
/// means the caller skipped validation.
pub fn build(base: &BaseVars, fabric: &FabricVars) -> Result<Inventory, String> {
    let lp_net: Ipv4Net = base
        .addr
        .lp_net
        .parse()
        .map_err(|e| format!("lp_net '{}': {e}", base.addr.lp_net))?;
    let mgmt_net = parse_net(&base.addr.mgmt_net)?;
    let mlag_peer_net = parse_net(&base.addr.mlag_peer_net)?;
    let mlag_kalive_net = match &base.addr.mlag_kalive_net {
        Some(net) => Some(parse_net(net)?),
        None => None,
    };

    let mut inv = Inventory::default();
    for role in Role::ALL {
        let stem = base.device_name.for_role(role);
        let count = fabric.network_size.for_role(role);
        let incre = &fabric.adv.addr_incre;
        let bse_intf = &fabric.adv.bse_intf;
        let lp = &fabric.adv.lp;

        // Shared by both members of an MLAG pair, refreshed on each odd
        // sequence number.
        let mut pair_mlag_lp = String::new();
        let mut pair_bgw_lp = String::new();

        for seq in 1..=count {
            let name = format!("{stem}{seq:02}");
            let ip_incre = incre_for(incre, &format!("{role}_ip"))?;
            let mgmt_ip =
                addressing::host_addr(mgmt_net, ip_incre + u32::from(seq) - 1)?
                    .to_string();
            let rtr_ip = addressing::host_with_prefix(
                lp_net,
                ip_incre + u32::from(seq) - 1,
                32,
            )?;
            let mut loopbacks = vec![Loopback {
                name: format!("{}{}", bse_intf.lp_fmt, lp.rtr.num),
                ip: rtr_ip,
                descr: lp.rtr.descr.clone(),
                mlag_lp_addr: None,
            }];

            let mut mlag_peer_ip = None;
            let mut mlag_kalive_ip = None;
            if role.is_vtep() {
                let odd_idx = u32::from((seq + 1) / 2);
                if seq % 2 == 1 {
                    pair_mlag_lp = addressing::host_with_prefix(
                        lp_net,
                        incre_for(incre, &format!("{role}_mlag_lp"))? + odd_idx - 1,
                        32,
                    )?;
                    if role == Role::Border {
                        pair_bgw_lp = addressing::host_with_prefix(
                            lp_net,
                            incre_for(incre, "border_bgw_lp")? + odd_idx - 1,
                            32,
                        )?;
                    }
                }
                let vtep_ip = addressing::host_with_prefix(
                    lp_net,
                    incre_for(incre, &format!("{role}_vtep_lp"))? + u32::from(seq) - 1,
                    32,
                )?;
                loopbacks.push(Loopback {
                    name: format!("{}{}", bse_intf.lp_fmt, lp.vtep.num),
                    ip: vtep_ip,
                    descr: lp.vtep.descr.clone(),
                    mlag_lp_addr: Some(pair_mlag_lp.clone()),
                });
                if role == Role::Border {
                    loopbacks.push(Loopback {
                        name: format!("{}{}", bse_intf.lp_fmt, lp.bgw.num),
                        ip: pair_bgw_lp.clone(),
                        descr: lp.bgw.descr.clone(),
                        mlag_lp_addr: None,
                    });
                }

                // Each pair takes a /30 out of the peer link range, so the
                // index jumps by two between pairs.
                let mlag_incr = incre_for(incre, &format!("mlag_{role}_ip"))?
                    + u32::from(seq)
                    - 1
                    + 2 * u32::from((seq - 1) / 2);
                mlag_peer_ip = Some(format!(
                    "{}/30",
                    addressing::host_addr(mlag_peer_net, mlag_incr)?
                ));
                mlag_kalive_ip = Some(match bse_intf.kalive_port() {
                    // Keepalive over the management interface.
                    None => mgmt_ip.clone(),
                    Some(_) => {
                        let net = mlag_kalive_net.unwrap_or(mlag_peer_net);
                        format!(
                            "{}/30",
                            addressing::host_addr(
                                net,
                                mlag_incr + incre_for(incre, "mlag_kalive_incre")?,
                            )?
                        )
                    }
                });
            }

            inv.devices.push(Device {
                name,
                role,
                seq,
                mgmt_ip,
                loopbacks,
                mlag_peer_ip,
                mlag_kalive_ip,
                fabric_intf: BTreeMap::new(),
                mlag_peer_intf: BTreeMap::new(),
                mlag_kalive_intf: BTreeMap::new(),
            });
        }
    }

    add_fabric_intf(&mut inv, base, fabric);
    add_mlag_intf(&mut inv, base, fabric)?;

    for role in Role::ALL {
        let group = group_name(base.device_name.for_role(role));
        let members: Vec<String> = inv
            .devices_by_role(role)
            .map(|d| d.name.clone())
            .collect();
        inv.group_num_intf
            .insert(group.clone(), fabric.num_intf.for_role(role).to_string());
        inv.groups.insert(group, members);
    }

    debug!("built inventory with {} devices", inv.devices.len());
    Ok(inv)
}

fn incre_for(map: &BTreeMap<String, u32>, key: &str) -> Result<u32, String> {
    map.get(key)
        .copied()
        .ok_or_else(|| format!("address increment '{key}' is not defined"))
}

fn parse_net(net: &str) -> Result<Ipv4Net, String> {
    // Base networks may be written host-style, the prefix length is what
    // matters for indexing.
    net.parse::<Ipv4Net>()
        .map(|n| n.trunc())
        .map_err(|e| format!("'{net}': {e}"))
}

/// Group names come from the last hyphenated part of the role name stem.
pub fn group_name(stem: &str) -> String {
    stem.rsplit('-')
        .next()
        .unwrap_or(stem)
        .to_ascii_lowercase()
}

/// Uplink descriptions name the remote device and its port, for example
/// `UPLINK > DC1-N9K-SPINE01 - Eth1/3`.
fn uplink_descr(stem: &str, remote_seq: u16, short: &str, port: u16) -> String {
    format!("UPLINK > {stem}{remote_seq:02} - {short}{port}")
}

fn add_fabric_intf(inv: &mut Inventory, base: &BaseVars, fabric: &FabricVars) {
    let bse = &fabric.adv.bse_intf;
    let size = &fabric.network_size;
    let names = &base.device_name;

    for dev in &mut inv.devices {
        match dev.role {
            Role::Spine => {
                for lf in 0..size.num_leaf {
                    dev.fabric_intf.insert(
                        format!("{}{}", bse.intf_fmt, bse.sp_to_lf + lf),
                        uplink_descr(
                            &names.leaf,
                            lf + 1,
                            &bse.intf_short,
                            dev.seq + bse.lf_to_sp - 1,
                        ),
                    );
                }
                for bdr in 0..size.num_border {
                    dev.fabric_intf.insert(
                        format!("{}{}", bse.intf_fmt, bse.sp_to_bdr + bdr),
                        uplink_descr(
                            &names.border,
                            bdr + 1,
                            &bse.intf_short,
                            dev.seq + bse.bdr_to_sp - 1,
                        ),
                    );
                }
            }
            Role::Leaf => {
                for sp in 0..size.num_spine {
                    dev.fabric_intf.insert(
                        format!("{}{}", bse.intf_fmt, bse.lf_to_sp + sp),
                        uplink_descr(
                            &names.spine,
                            sp + 1,
                            &bse.intf_short,
                            dev.seq + bse.sp_to_lf - 1,
                        ),
                    );
                }
            }
            Role::Border => {
                for sp in 0..size.num_spine {
                    dev.fabric_intf.insert(
                        format!("{}{}", bse.intf_fmt, bse.bdr_to_sp + sp),
                        uplink_descr(
                            &names.spine,
                            sp + 1,
                            &bse.intf_short,
                            dev.seq + bse.sp_to_bdr - 1,
                        ),
                    );
                }
            }
        }
    }
}

fn add_mlag_intf(
    inv: &mut Inventory,
    base: &BaseVars,
    fabric: &FabricVars,
) -> Result<(), String> {
    let bse = &fabric.adv.bse_intf;
    let mlag = &fabric.adv.mlag;
    let (first, last) = addressing::parse_member_range(&bse.mlag_peer)?;

    // Short-form descriptions shared by every pair member.
    let mut ports: Vec<(String, String)> = vec![(
        format!("{}{}", bse.mlag_fmt, mlag.peer_po),
        format!("{}{} < MLAG Peer-link", bse.mlag_short, mlag.peer_po),
    )];
    for n in first..=last {
        ports.push((
            format!("{}{n}", bse.intf_fmt),
            format!("{}{n} < Peer-link", bse.intf_short),
        ));
    }
    let kalive = bse.kalive_port().map(|n| {
        (
            format!("{}{n}", bse.intf_fmt),
            format!("{}{n} < MLAG Keepalive", bse.intf_short),
        )
    });

    for dev in &mut inv.devices {
        if !dev.role.is_vtep() {
            continue;
        }
        let stem = base.device_name.for_role(dev.role);
        let pair = dev.pair_name(stem);
        for (intf, short) in &ports {
            dev.mlag_peer_intf
                .insert(intf.clone(), format!("UPLINK > {pair} - {short}"));
        }
        if let Some((intf, short)) = &kalive {
            dev.mlag_kalive_intf
                .insert(intf.clone(), format!("UPLINK > {pair} - {short}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::{BaseVars, FabricVars};

    fn base() -> BaseVars {
        serde_yaml::from_str(
            r#"
device_name: {spine: DC1-N9K-SPINE, leaf: DC1-N9K-LEAF, border: DC1-N9K-BORDER}
addr:
  lp_net: "192.168.101.0/26"
  mgmt_net: "10.10.108.0/24"
  mlag_peer_net: "192.168.202.0/26"
  mgmt_gw: "10.10.108.1"
"#,
        )
        .unwrap()
    }

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
    mlag_kalive: 10
  lp:
    rtr: {num: 1, descr: "LP > Routing protocol RID and peerings"}
    vtep: {num: 2, descr: "LP > VTEP Tunnels (PIP) and MLAG (VIP)"}
    bgw: {num: 3, descr: "LP > BGW anycast address"}
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
    fn test_device_names_and_mgmt() {
        let inv = build(&base(), &fabric()).unwrap();
        assert_eq!(inv.devices.len(), 8);
        let sp1 = inv.device("DC1-N9K-SPINE01").unwrap();
        assert_eq!(sp1.mgmt_ip, "10.10.108.11");
        let lf3 = inv.device("DC1-N9K-LEAF03").unwrap();
        assert_eq!(lf3.mgmt_ip, "10.10.108.23");
    }

    #[test]
    fn test_loopbacks_and_pair_shared_addresses() {
        let inv = build(&base(), &fabric()).unwrap();
        let lf1 = inv.device("DC1-N9K-LEAF01").unwrap();
        assert_eq!(lf1.loopbacks[0].ip, "192.168.101.21/32");
        assert_eq!(lf1.loopbacks[1].name, "loopback2");
        assert_eq!(lf1.loopbacks[1].ip, "192.168.101.41/32");
        // MLAG anycast address is shared across the pair.
        let lf2 = inv.device("DC1-N9K-LEAF02").unwrap();
        assert_eq!(
            lf1.loopbacks[1].mlag_lp_addr.as_deref(),
            Some("192.168.101.51/32")
        );
        assert_eq!(lf1.loopbacks[1].mlag_lp_addr, lf2.loopbacks[1].mlag_lp_addr);
        let lf3 = inv.device("DC1-N9K-LEAF03").unwrap();
        assert_eq!(
            lf3.loopbacks[1].mlag_lp_addr.as_deref(),
            Some("192.168.101.52/32")
        );
        // Borders additionally get a pair-shared BGW loopback.
        let bdr1 = inv.device("DC1-N9K-BORDER01").unwrap();
        let bdr2 = inv.device("DC1-N9K-BORDER02").unwrap();
        assert_eq!(bdr1.loopbacks[2].ip, "192.168.101.58/32");
        assert_eq!(bdr1.loopbacks[2].ip, bdr2.loopbacks[2].ip);
        // Spines only have the routing loopback.
        let sp1 = inv.device("DC1-N9K-SPINE01").unwrap();
        assert_eq!(sp1.loopbacks.len(), 1);
        assert!(sp1.mlag_peer_ip.is_none());
    }

    #[test]
    fn test_mlag_peer_and_keepalive_addressing() {
        let inv = build(&base(), &fabric()).unwrap();
        // Pairs consume consecutive /30s: (1,2) -> .0/.1, (3,4) -> .4/.5.
        let peers: Vec<&str> = (1..=4)
            .map(|n| {
                inv.device(&format!("DC1-N9K-LEAF{n:02}"))
                    .unwrap()
                    .mlag_peer_ip
                    .as_deref()
                    .unwrap()
            })
            .collect();
        assert_eq!(
            peers,
            vec![
                "192.168.202.0/30",
                "192.168.202.1/30",
                "192.168.202.4/30",
                "192.168.202.5/30",
            ]
        );
        // No dedicated keepalive network, so it comes from the peer range
        // offset by the keepalive increment.
        let lf1 = inv.device("DC1-N9K-LEAF01").unwrap();
        assert_eq!(lf1.mlag_kalive_ip.as_deref(), Some("192.168.202.28/30"));
    }

    #[test]
    fn test_keepalive_over_mgmt_when_port_not_numeric() {
        let mut fbc = fabric();
        fbc.adv.bse_intf.mlag_kalive =
            Some(serde_yaml::Value::String("mgmt".into()));
        let inv = build(&base(), &fbc).unwrap();
        let lf1 = inv.device("DC1-N9K-LEAF01").unwrap();
        assert_eq!(lf1.mlag_kalive_ip.as_deref(), Some(&*lf1.mgmt_ip));
        assert!(lf1.mlag_kalive_intf.is_empty());
    }

    #[test]
    fn test_fabric_uplinks() {
        let inv = build(&base(), &fabric()).unwrap();
        let sp1 = inv.device("DC1-N9K-SPINE01").unwrap();
        assert_eq!(
            sp1.fabric_intf["Ethernet1/1"],
            "UPLINK > DC1-N9K-LEAF01 - Eth1/1"
        );
        assert_eq!(
            sp1.fabric_intf["Ethernet1/5"],
            "UPLINK > DC1-N9K-BORDER01 - Eth1/1"
        );
        let lf2 = inv.device("DC1-N9K-LEAF02").unwrap();
        assert_eq!(
            lf2.fabric_intf["Ethernet1/1"],
            "UPLINK > DC1-N9K-SPINE01 - Eth1/2"
        );
        assert_eq!(
            lf2.fabric_intf["Ethernet1/2"],
            "UPLINK > DC1-N9K-SPINE02 - Eth1/2"
        );
    }

    #[test]
    fn test_mlag_interfaces_and_groups() {
        let inv = build(&base(), &fabric()).unwrap();
        let lf1 = inv.device("DC1-N9K-LEAF01").unwrap();
        assert_eq!(
            lf1.mlag_peer_intf["port-channel1"],
            "UPLINK > DC1-N9K-LEAF02 - Po1 < MLAG Peer-link"
        );
        assert_eq!(
            lf1.mlag_peer_intf["Ethernet1/11"],
            "UPLINK > DC1-N9K-LEAF02 - Eth1/11 < Peer-link"
        );
        assert_eq!(
            lf1.mlag_kalive_intf["Ethernet1/10"],
            "UPLINK > DC1-N9K-LEAF02 - Eth1/10 < MLAG Keepalive"
        );
        let lf2 = inv.device("DC1-N9K-LEAF02").unwrap();
        assert_eq!(
            lf2.mlag_peer_intf["Ethernet1/12"],
            "UPLINK > DC1-N9K-LEAF01 - Eth1/12 < Peer-link"
        );
        assert_eq!(
            inv.groups["leaf"],
            vec![
                "DC1-N9K-LEAF01",
                "DC1-N9K-LEAF02",
                "DC1-N9K-LEAF03",
                "DC1-N9K-LEAF04",
            ]
        );
        assert_eq!(inv.group_num_intf["spine"], "1,64");
    }
}
