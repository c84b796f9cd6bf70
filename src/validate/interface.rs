//! Checks of the interface service file: declaration sanity, VRF
//! membership and whether the reserved ranges can hold everything that
//! has been declared.

use crate::addressing;
use crate::utils::vlan;
use crate::vars::fabric::{FabricVars, Role};
use crate::vars::interface::{IntfDecl, IntfType, InterfaceVars, IpVlan};

use super::{duplicates, FabricContext, Report, Validation};

pub fn validate(svc_intf: &InterfaceVars, fabric: &FabricVars, ctx: &FabricContext) -> Validation {
    let mut report = Report::new("service_interface.yml");

    // Every later check dereferences these fields, so their absence
    // aborts this file's validation.
    for (decl, _) in declarations(svc_intf) {
        let descr = decl.descr.as_deref().unwrap_or("unknown");
        if decl.descr.is_none() {
            report.err("-svc_intf.intf an interface is missing its description".to_string());
        }
        if decl.intf_type.is_none() {
            report.err(format!("-svc_intf.intf '{descr}' is missing its type"));
        }
        if decl.ip_vlan.is_none() {
            report.err(format!("-svc_intf.intf '{descr}' is missing its ip_vlan"));
        }
        if decl.switch.is_none() {
            report.err(format!("-svc_intf.intf '{descr}' is missing its switch list"));
        }
    }
    if report.has_errors() {
        return report.finish();
    }

    for (decl, dual_homed) in declarations(svc_intf) {
        check_declaration(decl, dual_homed, ctx, &mut report);
    }
    // The capacity arithmetic assumes ordered ranges, so inverted ones
    // stop here with their own error lines.
    if check_ranges(svc_intf, &mut report) {
        for dev_name in ctx.inventory.devices.iter().filter_map(|dev| {
            dev.role.is_vtep().then_some(&dev.name)
        }) {
            check_device(svc_intf, fabric, ctx, dev_name, &mut report);
        }
    }

    report.finish()
}

fn declarations(svc_intf: &InterfaceVars) -> impl Iterator<Item = (&IntfDecl, bool)> {
    svc_intf
        .intf
        .single_homed
        .iter()
        .map(|decl| (decl, false))
        .chain(svc_intf.intf.dual_homed.iter().map(|decl| (decl, true)))
}

fn check_declaration(
    decl: &IntfDecl,
    dual_homed: bool,
    ctx: &FabricContext,
    report: &mut Report,
) {
    let descr = decl.descr.as_deref().unwrap_or_default();
    let intf_type = decl.intf_type.unwrap_or(IntfType::Access);
    let switches = decl.switch.as_deref().unwrap_or(&[]);

    for sw in switches {
        match ctx.inventory.device(sw) {
            None => report.err(format!(
                "-svc_intf.intf.switch '{sw}' is not a valid device name"
            )),
            Some(dev) if dev.role == Role::Spine => report.err(format!(
                "-svc_intf.intf.switch '{sw}' is a spine, access interfaces only exist on \
                 leaf and border switches"
            )),
            Some(dev) if dual_homed && !dev.is_odd() => report.err(format!(
                "-svc_intf.intf.switch '{sw}' is not valid, dual homed interfaces name the \
                 odd member of the MLAG pair"
            )),
            Some(dev) => {
                if let Some(tenant) = decl.tenant.as_deref() {
                    if !tenant.eq_ignore_ascii_case("global")
                        && !ctx.vrfs_for(dev.role).contains(tenant)
                    {
                        report.err(format!(
                            "-svc_intf.intf.tenant '{tenant}' is not a VRF on {sw}"
                        ));
                    }
                }
            }
        }
    }

    if dual_homed
        && matches!(
            intf_type,
            IntfType::Layer3 | IntfType::Loopback | IntfType::Svi
        )
    {
        report.err(format!(
            "-svc_intf.intf '{descr}' is not valid, layer3, loopback and svi interfaces \
             cannot be dual homed"
        ));
    }

    match (intf_type, decl.ip_vlan.as_ref()) {
        (IntfType::Layer3 | IntfType::Svi, Some(ip_vlan)) => {
            let ok = ip_vlan
                .as_text()
                .map(|ip| ip.parse::<ipnet::Ipv4Net>().is_ok())
                .unwrap_or(false);
            if !ok {
                report.err(format!(
                    "-svc_intf.intf '{descr}' needs a valid IPv4 address and mask"
                ));
            }
        }
        (IntfType::Loopback, Some(ip_vlan)) => {
            let ok = ip_vlan
                .as_text()
                .and_then(|ip| ip.parse::<ipnet::Ipv4Net>().ok())
                .map(|net| net.prefix_len() == 32)
                .unwrap_or(false);
            if !ok {
                report.err(format!(
                    "-svc_intf.intf '{descr}' needs a valid /32 IPv4 address"
                ));
            }
        }
        (IntfType::Access, Some(ip_vlan)) => {
            let ok = matches!(ip_vlan, IpVlan::Vlan(num) if (1..=4096).contains(num));
            if !ok {
                report.err(format!(
                    "-svc_intf.intf '{descr}' needs a single VLAN number from 1 to 4096"
                ));
            }
        }
        (_, Some(ip_vlan)) => {
            // Trunks take a VLAN range string.
            let ok = ip_vlan
                .as_text()
                .map(|raw| vlan::expand(raw).is_ok())
                .unwrap_or(matches!(ip_vlan, IpVlan::Vlan(_)));
            if !ok {
                report.err(format!(
                    "-svc_intf.intf '{descr}' needs a valid list of allowed VLANs"
                ));
            }
        }
        (_, None) => {}
    }

    if intf_type == IntfType::Svi && decl.intf_num.is_none() {
        report.err(format!(
            "-svc_intf.intf '{descr}' needs intf_num set to the SVI VLAN number"
        ));
    }
    if let Some(mbr) = &decl.po_mbr_descr {
        if mbr.len() != 2 {
            report.err(format!(
                "-svc_intf.intf '{descr}' po_mbr_descr must be a list of 2 descriptions, \
                 odd switch first"
            ));
        }
    }
}

/// Ports on a device the fabric itself claims: uplinks, MLAG peer link
/// members and the keepalive link.
fn check_ranges(svc_intf: &InterfaceVars, report: &mut Report) -> bool {
    let adv = &svc_intf.adv;
    let mut ok = true;
    for (name, first, last) in [
        ("single_homed.first_intf", adv.single_homed.first_intf, adv.single_homed.last_intf),
        ("single_homed.first_lp", adv.single_homed.first_lp, adv.single_homed.last_lp),
        ("dual_homed.first_intf", adv.dual_homed.first_intf, adv.dual_homed.last_intf),
        ("dual_homed.first_po", adv.dual_homed.first_po, adv.dual_homed.last_po),
    ] {
        if first > last {
            report.err(format!(
                "-svc_intf.adv.{name} '{first}' must not be greater than the end of \
                 its range ({last})"
            ));
            ok = false;
        }
    }
    ok
}

fn reserved_ports(fabric: &FabricVars, role: Role) -> Vec<u16> {
    let bse = &fabric.adv.bse_intf;
    let num_spine = fabric.network_size.num_spine;
    let first = match role {
        Role::Leaf => bse.lf_to_sp,
        Role::Border => bse.bdr_to_sp,
        Role::Spine => return Vec::new(),
    };
    let mut ports: Vec<u16> = (first..first + num_spine).collect();
    if let Ok((first, last)) = addressing::parse_member_range(&bse.mlag_peer) {
        ports.extend(first..=last);
    }
    if let Some(port) = bse.kalive_port() {
        ports.push(port);
    }
    ports
}

/// Checks one device can actually hold everything declared on it: the
/// pinned numbers sit inside their reserved ranges and off the fabric
/// ports, and no range needs more numbers than it has.
fn check_device(
    svc_intf: &InterfaceVars,
    fabric: &FabricVars,
    ctx: &FabricContext,
    hostname: &str,
    report: &mut Report,
) {
    let adv = &svc_intf.adv;
    let Some(dev) = ctx.inventory.device(hostname) else {
        return;
    };
    let reserved = reserved_ports(fabric, dev.role);

    let mut sh_count: u16 = 0;
    let mut lp_count: u16 = 0;
    let mut dh_count: u16 = 0;
    let mut pinned_ports: Vec<u16> = Vec::new();
    let mut pinned_pos: Vec<u16> = Vec::new();
    let mut svi_nums: Vec<u16> = Vec::new();

    for (decl, dual_homed) in declarations(svc_intf) {
        let switches = decl.switch.as_deref().unwrap_or(&[]);
        if !switches.iter().any(|sw| sw == hostname) {
            continue;
        }
        let descr = decl.descr.as_deref().unwrap_or_default();
        let intf_type = decl.intf_type.unwrap_or(IntfType::Access);
        let (range_name, first, last) = if dual_homed {
            dh_count += 1;
            ("dual_homed", adv.dual_homed.first_intf, adv.dual_homed.last_intf)
        } else if intf_type == IntfType::Loopback {
            lp_count += 1;
            ("single_homed loopback", adv.single_homed.first_lp, adv.single_homed.last_lp)
        } else if intf_type == IntfType::Svi {
            if let Some(num) = decl.intf_num {
                svi_nums.push(num);
            }
            continue;
        } else {
            sh_count += 1;
            ("single_homed", adv.single_homed.first_intf, adv.single_homed.last_intf)
        };

        if let Some(num) = decl.intf_num {
            if !(first..=last).contains(&num) {
                report.err(format!(
                    "-svc_intf.intf '{descr}' on {hostname} pins interface {num} outside \
                     the {range_name} range {first} to {last}"
                ));
            }
            if intf_type != IntfType::Loopback {
                if reserved.contains(&num) {
                    report.err(format!(
                        "-svc_intf.intf '{descr}' on {hostname} pins interface {num} which \
                         is reserved for fabric or MLAG links"
                    ));
                }
                pinned_ports.push(num);
            }
        }
        if dual_homed {
            if let Some(po) = decl.po_num {
                if !(adv.dual_homed.first_po..=adv.dual_homed.last_po).contains(&po) {
                    report.err(format!(
                        "-svc_intf.intf '{descr}' on {hostname} pins port-channel {po} \
                         outside the range {} to {}",
                        adv.dual_homed.first_po, adv.dual_homed.last_po
                    ));
                }
                pinned_pos.push(po);
            }
        }
    }

    for dup in duplicates(&pinned_ports) {
        report.err(format!(
            "-svc_intf.intf interface {dup} is pinned more than once on {hostname}"
        ));
    }
    for dup in duplicates(&pinned_pos) {
        report.err(format!(
            "-svc_intf.intf port-channel {dup} is pinned more than once on {hostname}"
        ));
    }
    for dup in duplicates(&svi_nums) {
        report.err(format!(
            "-svc_intf.intf SVI {dup} is declared more than once on {hostname}"
        ));
    }

    let sh_size = adv.single_homed.last_intf - adv.single_homed.first_intf + 1;
    let lp_size = adv.single_homed.last_lp - adv.single_homed.first_lp + 1;
    let dh_size = adv.dual_homed.last_intf - adv.dual_homed.first_intf + 1;
    let po_size = adv.dual_homed.last_po - adv.dual_homed.first_po + 1;
    for (what, count, size) in [
        ("single homed interfaces", sh_count, sh_size),
        ("loopbacks", lp_count, lp_size),
        ("dual homed interfaces", dh_count, dh_size),
        ("port-channels", dh_count, po_size),
    ] {
        if count > size {
            report.err(format!(
                "-svc_intf.intf {hostname} needs {count} {what} but the reserved range \
                 only holds {size}"
            ));
        }
    }

    if let Ok((_, max_port)) = addressing::parse_range(fabric.num_intf.for_role(dev.role)) {
        let total = sh_count + dh_count + reserved.len() as u16;
        if total > max_port {
            report.err(format!(
                "-svc_intf.intf {hostname} needs {total} physical interfaces but only \
                 has {max_port}"
            ));
        }
    }
}
