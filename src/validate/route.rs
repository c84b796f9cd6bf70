//! Checks of the route service file: BGP peerings, OSPF processes,
//! static routes and the policy naming templates.
//!
//! Most of these checks need to know what the fabric will actually
//! build, so they run against a [`FabricContext`] holding the device
//! inventory plus the per-device VRF and interface allocations.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::inventory::{self, Inventory};
use crate::services;
use crate::vars::fabric::{FabricVars, Role};
use crate::vars::route::{AttrMap, FilterEntry, Redistribution, RouteVars, DefaultOriginate};
use crate::vars::{BaseVars, InterfaceVars, TenantVars};

use super::{duplicates, is_ipv4, is_ipv4_network, Report, Validation};

/// What the variable files resolve to on each device, used to check
/// the route file's references against real allocations.
pub struct FabricContext {
    pub inventory: Inventory,
    leaf_vrfs: BTreeSet<String>,
    border_vrfs: BTreeSet<String>,
    global_only: BTreeSet<String>,
    /// Per device, every allocated interface and the VRF it lives in.
    device_intf: BTreeMap<String, BTreeMap<String, String>>,
}

impl FabricContext {
    pub fn new(
        base: &BaseVars,
        fabric: &FabricVars,
        svc_tnt: &TenantVars,
        svc_intf: &InterfaceVars,
    ) -> Result<Self, String> {
        let inventory = inventory::build(base, fabric)?;
        let plan = services::tenant::resolve(svc_tnt, fabric.adv.mlag.peer_vlan);

        let global_only: BTreeSet<String> = ["global".to_string()].into();
        let mut leaf_vrfs = global_only.clone();
        let mut border_vrfs = global_only.clone();
        for (vrfs, tenants) in [
            (&mut leaf_vrfs, &plan.leaf_tenants),
            (&mut border_vrfs, &plan.border_tenants),
        ] {
            vrfs.extend(
                tenants
                    .iter()
                    .filter(|tnt| tnt.l3_tnt)
                    .map(|tnt| tnt.tnt_name.clone()),
            );
        }

        let mut device_intf = BTreeMap::new();
        for dev in &inventory.devices {
            let mut intf: BTreeMap<String, String> = BTreeMap::new();
            for lp in dev.loopback_names() {
                intf.insert(lp, "global".to_string());
            }
            if dev.role.is_vtep() {
                for svc in services::interface::resolve(svc_intf, &dev.name, &fabric.adv.bse_intf)
                {
                    intf.insert(svc.name, svc.tenant.unwrap_or_else(|| "global".to_string()));
                }
                let tenants = match dev.role {
                    Role::Border => &plan.border_tenants,
                    _ => &plan.leaf_tenants,
                };
                for tnt in tenants {
                    for vl in &tnt.vlans {
                        if vl.ip_addr.is_some() && !vl.l3vni_carrier {
                            let vrf = if tnt.l3_tnt {
                                tnt.tnt_name.clone()
                            } else {
                                "global".to_string()
                            };
                            intf.insert(format!("Vlan{}", vl.num), vrf);
                        }
                    }
                }
            }
            device_intf.insert(dev.name.clone(), intf);
        }

        Ok(FabricContext {
            inventory,
            leaf_vrfs,
            border_vrfs,
            global_only,
            device_intf,
        })
    }

    pub fn has_device(&self, name: &str) -> bool {
        self.inventory.device(name).is_some()
    }

    /// VRFs that exist on devices of the role. Spines carry no tenants.
    pub fn vrfs_for(&self, role: Role) -> &BTreeSet<String> {
        match role {
            Role::Leaf => &self.leaf_vrfs,
            Role::Border => &self.border_vrfs,
            Role::Spine => &self.global_only,
        }
    }

    fn interface_vrf(&self, hostname: &str, intf: &str) -> Option<&str> {
        self.device_intf
            .get(hostname)?
            .get(intf)
            .map(String::as_str)
    }
}

struct Patterns {
    word: Regex,
    redist_type: Regex,
    area_type: Regex,
    /// `le`/`ge` length qualifiers after a prefix list entry.
    pl_suffix: Regex,
}

impl Patterns {
    fn new() -> Self {
        Patterns {
            word: Regex::new(r"^\S+$").unwrap(),
            redist_type: Regex::new(r"^bgp\s\S+$|^ospf\s\S+$|^static$|^connected$").unwrap(),
            area_type: Regex::new(r"^(stub|nssa)").unwrap(),
            pl_suffix: Regex::new(r"^([gl]e ([0-9]|[1-2][0-9]|3[0-2])\s?){1,2}$").unwrap(),
        }
    }
}

/// `10.0.0.0/8`, optionally followed by `ge`/`le` length qualifiers.
fn valid_pl_entry(patterns: &Patterns, entry: &str) -> bool {
    let (net, suffix) = match entry.split_once(' ') {
        Some((net, suffix)) => (net, Some(suffix)),
        None => (entry, None),
    };
    if !is_ipv4_network(net) {
        return false;
    }
    match suffix {
        Some(suffix) => patterns.pl_suffix.is_match(suffix),
        None => true,
    }
}

pub fn validate(svc_rte: &RouteVars, fabric: &FabricVars, ctx: &FabricContext) -> Validation {
    let mut report = Report::new("service_route.yml");
    let patterns = Patterns::new();

    if !mandatory_fields(svc_rte, &mut report) {
        return report.finish();
    }

    check_bgp(svc_rte, fabric, ctx, &patterns, &mut report);
    check_ospf(svc_rte, fabric, ctx, &patterns, &mut report);
    check_static(svc_rte, ctx, &mut report);
    check_naming(svc_rte, &mut report);

    report.finish()
}

/// Fields every later check dereferences. Their absence aborts this
/// file's validation.
fn mandatory_fields(svc_rte: &RouteVars, report: &mut Report) -> bool {
    if let Some(bgp) = &svc_rte.bgp {
        for grp in bgp.group.as_deref().unwrap_or(&[]) {
            let grp_name = grp.name.as_deref().unwrap_or("unknown");
            if grp.name.is_none() {
                report.err("-svc_rte.bgp.group a group is missing its name".to_string());
            }
            let peers = grp.peer.as_deref().unwrap_or(&[]);
            if peers.is_empty() {
                report.err(format!(
                    "-svc_rte.bgp.group '{grp_name}' has no peers defined"
                ));
            }
            for peer in peers {
                let peer_name = peer.name.as_deref().unwrap_or("unknown");
                if peer.name.is_none() {
                    report.err(format!(
                        "-svc_rte.bgp.group '{grp_name}' has a peer with no name"
                    ));
                }
                if peer.descr.is_none() {
                    report.err(format!(
                        "-svc_rte.bgp.peer '{peer_name}' is missing its description"
                    ));
                }
                if peer.peer_ip.is_none() {
                    report.err(format!(
                        "-svc_rte.bgp.peer '{peer_name}' is missing its peer_ip"
                    ));
                }
            }
            // Settings that must exist somewhere, either on the group
            // or on every peer under it.
            if grp.session.switch.is_none()
                && peers.iter().any(|p| p.session.switch.is_none())
            {
                report.err(format!(
                    "-svc_rte.bgp.group '{grp_name}' needs switch set on the group or every peer"
                ));
            }
            if grp.session.remote_as.is_none()
                && peers.iter().any(|p| p.session.remote_as.is_none())
            {
                report.err(format!(
                    "-svc_rte.bgp.group '{grp_name}' needs remote_as set on the group or every peer"
                ));
            }
        }
        for adv in &bgp.tnt_advertise {
            if adv.name.is_none() {
                report.err(
                    "-svc_rte.bgp.tnt_advertise an advertisement is missing its tenant name"
                        .to_string(),
                );
            }
        }
    }
    for proc in &svc_rte.ospf {
        if proc.process.is_none() {
            report.err("-svc_rte.ospf a process is missing its process number".to_string());
        }
        if proc.switch.is_none() {
            report.err("-svc_rte.ospf a process is missing its switch list".to_string());
        }
        let interfaces = proc.interface.as_deref().unwrap_or(&[]);
        if interfaces.is_empty() {
            report.err("-svc_rte.ospf a process has no interfaces defined".to_string());
        }
        for intf in interfaces {
            if intf.name.is_none() {
                report.err("-svc_rte.ospf.interface an interface is missing its name".to_string());
            }
            if intf.area.is_none() {
                report.err("-svc_rte.ospf.interface an interface is missing its area".to_string());
            }
        }
    }
    for grp in &svc_rte.static_route {
        if grp.tenant.is_none() {
            report.err("-svc_rte.static_route a group is missing its tenant list".to_string());
        }
        for route in &grp.route {
            if route.prefix.is_none() {
                report.err("-svc_rte.static_route a route is missing its prefix list".to_string());
            }
        }
    }
    !report.has_errors()
}

fn check_switches(switches: &[String], path: &str, ctx: &FabricContext, report: &mut Report) {
    for sw in switches {
        if !ctx.has_device(sw) {
            report.err(format!("-{path} '{sw}' is not a valid device name"));
        }
    }
}

fn check_tenants(
    tenants: &[String],
    switches: &[String],
    path: &str,
    ctx: &FabricContext,
    report: &mut Report,
) {
    for sw in switches {
        let Some(dev) = ctx.inventory.device(sw) else {
            continue;
        };
        for tnt in tenants {
            if !ctx.vrfs_for(dev.role).contains(tnt) {
                report.err(format!("-{path} '{tnt}' is not a VRF on {sw}"));
            }
        }
    }
}

fn check_filter(
    entry: &FilterEntry,
    path: &str,
    patterns: &Patterns,
    report: &mut Report,
) {
    match entry {
        FilterEntry::Keyword(kw) => {
            if kw != "any" && kw != "default" {
                report.err(format!(
                    "-{path} '{kw}' is not valid, must be 'any', 'default' or a list of prefixes"
                ));
            }
        }
        FilterEntry::Prefixes(prefixes) => {
            for pfx in prefixes {
                if !valid_pl_entry(patterns, pfx) {
                    report.err(format!(
                        "-{path} '{pfx}' is not a valid prefix, optionally with 'ge'/'le' 0 to 32"
                    ));
                }
            }
            for dup in duplicates(prefixes) {
                report.err(format!("-{path} '{dup}' is a duplicate prefix"));
            }
        }
    }
}

fn check_attrs(attrs: &AttrMap, path: &str, patterns: &Patterns, report: &mut Report) {
    for entry in attrs.values() {
        check_filter(entry, path, patterns, report);
    }
}

fn check_bgp(
    svc_rte: &RouteVars,
    fabric: &FabricVars,
    ctx: &FabricContext,
    patterns: &Patterns,
    report: &mut Report,
) {
    let Some(bgp) = &svc_rte.bgp else {
        return;
    };

    let mut names: Vec<&str> = Vec::new();
    for grp in bgp.group.as_deref().unwrap_or(&[]) {
        let grp_name = grp.name.as_deref().unwrap_or_default();
        names.push(grp_name);
        let grp_switches = grp.session.switch.as_deref().unwrap_or(&[]);
        check_switches(grp_switches, "svc_rte.bgp.group.switch", ctx, report);
        check_session(
            &grp.session,
            grp_switches,
            &format!("svc_rte.bgp.group '{grp_name}'"),
            ctx,
            patterns,
            report,
        );
        for peer in grp.peer.as_deref().unwrap_or(&[]) {
            let peer_name = peer.name.as_deref().unwrap_or_default();
            names.push(peer_name);
            let switches = peer.session.switch.as_deref().unwrap_or(grp_switches);
            if peer.session.switch.is_some() {
                check_switches(switches, "svc_rte.bgp.peer.switch", ctx, report);
            }
            if let Some(ip) = &peer.peer_ip {
                if !is_ipv4(ip) {
                    report.err(format!(
                        "-svc_rte.bgp.peer '{ip}' is not a valid IPv4 address"
                    ));
                }
            }
            let tenants = peer
                .session
                .tenant
                .as_deref()
                .or(grp.session.tenant.as_deref())
                .unwrap_or(&[]);
            check_tenants(tenants, switches, "svc_rte.bgp.peer.tenant", ctx, report);
            check_session(
                &peer.session,
                switches,
                &format!("svc_rte.bgp.peer '{peer_name}'"),
                ctx,
                patterns,
                report,
            );
        }
    }
    for dup in duplicates(&names) {
        report.err(format!(
            "-svc_rte.bgp '{dup}' is used more than once, group and peer names must all be unique"
        ));
    }

    for adv in &bgp.tnt_advertise {
        let tnt = adv.name.as_deref().unwrap_or_default();
        let switches = adv.switch.as_deref().unwrap_or(&[]);
        check_switches(switches, "svc_rte.bgp.tnt_advertise.switch", ctx, report);
        check_tenants(
            &[tnt.to_string()],
            switches,
            "svc_rte.bgp.tnt_advertise.name",
            ctx,
            report,
        );
        for net in &adv.network {
            for pfx in net.prefix.as_deref().unwrap_or(&[]) {
                if pfx.parse::<ipnet::Ipv4Net>().is_err() {
                    report.err(format!(
                        "-svc_rte.bgp.tnt_advertise.network '{pfx}' is not a valid prefix"
                    ));
                }
            }
        }
        for summ in &adv.summary {
            for pfx in summ.prefix.as_deref().unwrap_or(&[]) {
                if pfx.parse::<ipnet::Ipv4Net>().is_err() {
                    report.err(format!(
                        "-svc_rte.bgp.tnt_advertise.summary '{pfx}' is not a valid prefix"
                    ));
                }
            }
            if let Some(filter) = &summ.filter {
                if filter != "summary-only" {
                    report.err(format!(
                        "-svc_rte.bgp.tnt_advertise.summary '{filter}' is not valid, only \
                         'summary-only' can filter BGP summaries"
                    ));
                }
            }
        }
        check_redist(
            &adv.redist,
            switches,
            tnt,
            "svc_rte.bgp.tnt_advertise.redist",
            svc_rte,
            fabric,
            ctx,
            patterns,
            report,
        );
    }
}

fn check_session(
    session: &crate::vars::route::BgpSession,
    switches: &[String],
    who: &str,
    ctx: &FabricContext,
    patterns: &Patterns,
    report: &mut Report,
) {
    if let Some(timers) = &session.timers {
        if timers.len() != 2 {
            report.err(format!(
                "-{who} timers '{timers:?}' must be a list of 2 timers, keepalive and holdtime"
            ));
        }
    }
    if let Some(hops) = session.ebgp_multihop {
        if !(2..=255).contains(&hops) {
            report.err(format!(
                "-{who} ebgp_multihop '{hops}' is not valid, must be between 2 and 255"
            ));
        }
    }
    for (flag, value) in [
        ("bfd", session.bfd),
        ("default", session.default),
        ("next_hop_self", session.next_hop_self),
    ] {
        if value == Some(false) {
            report.err(format!(
                "-{who} {flag} can only be set to 'True', hash it out to disable"
            ));
        }
    }
    if let Some(password) = &session.password {
        if !patterns.word.is_match(password) {
            report.err(format!(
                "-{who} the password must be a single word with no whitespace"
            ));
        }
    }
    if let Some(source) = &session.update_source {
        for sw in switches {
            if ctx.interface_vrf(sw, source).is_none() {
                report.err(format!(
                    "-{who} update_source '{source}' is not a loopback on {sw}"
                ));
            }
        }
    }
    if let Some(inbound) = &session.inbound {
        if let Some(weight) = &inbound.weight {
            check_attrs(weight, &format!("{who} inbound.weight"), patterns, report);
        }
        if let Some(pref) = &inbound.pref {
            check_attrs(pref, &format!("{who} inbound.pref"), patterns, report);
        }
        if let Some(allow) = &inbound.allow {
            check_filter(allow, &format!("{who} inbound.allow"), patterns, report);
        }
        if let Some(deny) = &inbound.deny {
            check_filter(deny, &format!("{who} inbound.deny"), patterns, report);
        }
    }
    if let Some(outbound) = &session.outbound {
        if let Some(med) = &outbound.med {
            check_attrs(med, &format!("{who} outbound.med"), patterns, report);
        }
        if let Some(prepend) = &outbound.as_prepend {
            check_attrs(prepend, &format!("{who} outbound.as_prepend"), patterns, report);
        }
        if let Some(allow) = &outbound.allow {
            check_filter(allow, &format!("{who} outbound.allow"), patterns, report);
        }
        if let Some(deny) = &outbound.deny {
            check_filter(deny, &format!("{who} outbound.deny"), patterns, report);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn check_redist(
    redists: &[Redistribution],
    host_switches: &[String],
    tenant: &str,
    path: &str,
    svc_rte: &RouteVars,
    fabric: &FabricVars,
    ctx: &FabricContext,
    patterns: &Patterns,
    report: &mut Report,
) {
    for redist in redists {
        let Some(rtype) = redist.redist_type.as_deref() else {
            report.err(format!("-{path} an entry is missing its type"));
            continue;
        };
        if !patterns.redist_type.is_match(rtype) {
            report.err(format!(
                "-{path} '{rtype}' is not valid, must be 'bgp <as>', 'ospf <process>', \
                 'static' or 'connected'"
            ));
            continue;
        }
        let switches = redist.switch.as_deref().unwrap_or(host_switches);
        if redist.switch.is_some() {
            check_switches(switches, path, ctx, report);
        }
        if let Some(proc) = rtype.strip_prefix("ospf ") {
            match svc_rte.ospf.iter().find(|p| {
                p.process.as_ref().map(value_text).as_deref() == Some(proc)
            }) {
                None => report.err(format!(
                    "-{path} '{rtype}' is not valid, OSPF process '{proc}' does not exist"
                )),
                Some(ospf) => {
                    let proc_switches = ospf.switch.as_deref().unwrap_or(&[]);
                    for sw in switches {
                        if !proc_switches.contains(sw) {
                            report.err(format!(
                                "-{path} '{rtype}' does not run on {sw} so cannot be \
                                 redistributed there"
                            ));
                        }
                    }
                }
            }
        } else if let Some(as_num) = rtype.strip_prefix("bgp ") {
            if as_num != value_text(&fabric.route.bgp.as_num) {
                report.err(format!(
                    "-{path} '{rtype}' is not valid, the fabric BGP AS is {}",
                    value_text(&fabric.route.bgp.as_num)
                ));
            }
        }
        if rtype == "connected" {
            if let Some(FilterEntry::Prefixes(interfaces)) = &redist.allow {
                for intf in interfaces {
                    for sw in switches {
                        if ctx.interface_vrf(sw, intf) != Some(tenant) {
                            report.err(format!(
                                "-{path} '{intf}' is not an interface in VRF {tenant} on {sw}"
                            ));
                        }
                    }
                }
            }
        } else {
            if let Some(allow) = &redist.allow {
                check_filter(allow, path, patterns, report);
            }
            if let Some(metric) = &redist.metric {
                check_attrs(metric, path, patterns, report);
            }
        }
    }
}

fn check_ospf(
    svc_rte: &RouteVars,
    fabric: &FabricVars,
    ctx: &FabricContext,
    patterns: &Patterns,
    report: &mut Report,
) {
    for proc in &svc_rte.ospf {
        let proc_name = proc.process.as_ref().map(value_text).unwrap_or_default();
        let proc_switches = proc.switch.as_deref().unwrap_or(&[]);
        check_switches(proc_switches, "svc_rte.ospf.switch", ctx, report);
        let tenant = proc.tenant.as_deref().unwrap_or("global");
        check_tenants(
            &[tenant.to_string()],
            proc_switches,
            "svc_rte.ospf.tenant",
            ctx,
            report,
        );

        // RIDs are matched to switches by list position.
        if let Some(rids) = &proc.rid {
            if rids.len() != proc_switches.len() {
                report.err(format!(
                    "-svc_rte.ospf '{proc_name}' has {} RIDs for {} switches, the lists \
                     must be the same length",
                    rids.len(),
                    proc_switches.len()
                ));
            }
            for rid in rids {
                if !is_ipv4(rid) {
                    report.err(format!(
                        "-svc_rte.ospf.rid '{rid}' is not a valid IPv4 address"
                    ));
                }
            }
        }
        if let Some(DefaultOriginate::Mode(mode)) = &proc.default_orig {
            if mode != "always" {
                report.err(format!(
                    "-svc_rte.ospf.default_orig '{mode}' is not valid, must be 'True' or 'always'"
                ));
            }
        }

        for intf in proc.interface.as_deref().unwrap_or(&[]) {
            let switches = intf.switch.as_deref().unwrap_or(proc_switches);
            if intf.switch.is_some() {
                check_switches(switches, "svc_rte.ospf.interface.switch", ctx, report);
                for sw in switches {
                    if !proc_switches.contains(sw) {
                        report.err(format!(
                            "-svc_rte.ospf.interface.switch '{sw}' does not run OSPF \
                             process '{proc_name}'"
                        ));
                    }
                }
            }
            if let Some(area) = &intf.area {
                if !is_ipv4(area) {
                    report.err(format!(
                        "-svc_rte.ospf.interface.area '{area}' must be an area in dotted \
                         decimal format"
                    ));
                }
            }
            if let Some(cost) = intf.cost {
                if !(1..=65535).contains(&cost) {
                    report.err(format!(
                        "-svc_rte.ospf.interface.cost '{cost}' is not valid, must be \
                         between 1 and 65535"
                    ));
                }
            }
            if let Some(area_type) = &intf.area_type {
                if !patterns.area_type.is_match(area_type) {
                    report.err(format!(
                        "-svc_rte.ospf.interface.area_type '{area_type}' is not valid, \
                         must be 'stub' or 'nssa'"
                    ));
                }
            }
            if let Some(auth) = &intf.authentication {
                if !patterns.word.is_match(auth) {
                    report.err(format!(
                        "-svc_rte.ospf.interface.authentication '{auth}' must be a single \
                         word with no whitespace"
                    ));
                }
            }
            if let Some(intf_type) = &intf.intf_type {
                if intf_type != "point-to-point" {
                    report.err(format!(
                        "-svc_rte.ospf.interface.type '{intf_type}' is not valid, only \
                         'point-to-point' changes the network type"
                    ));
                }
            }
            for name in intf.name.as_deref().unwrap_or(&[]) {
                for sw in switches {
                    if ctx.interface_vrf(sw, name) != Some(tenant) {
                        report.err(format!(
                            "-svc_rte.ospf.interface '{name}' is not an interface in VRF \
                             {tenant} on {sw}"
                        ));
                    }
                }
            }
        }

        for summ in &proc.summary {
            for pfx in summ.prefix.as_deref().unwrap_or(&[]) {
                if pfx.parse::<ipnet::Ipv4Net>().is_err() {
                    report.err(format!(
                        "-svc_rte.ospf.summary '{pfx}' is not a valid prefix"
                    ));
                }
            }
            if let Some(filter) = &summ.filter {
                if filter != "not-advertise" {
                    report.err(format!(
                        "-svc_rte.ospf.summary '{filter}' is not valid, only 'not-advertise' \
                         can filter OSPF summaries"
                    ));
                }
            }
            if let Some(area) = &summ.area {
                if !is_ipv4(area) {
                    report.err(format!(
                        "-svc_rte.ospf.summary.area '{area}' must be an area in dotted \
                         decimal format"
                    ));
                }
            }
        }
        check_redist(
            &proc.redist,
            proc_switches,
            tenant,
            "svc_rte.ospf.redist",
            svc_rte,
            fabric,
            ctx,
            patterns,
            report,
        );
    }
}

fn check_static(svc_rte: &RouteVars, ctx: &FabricContext, report: &mut Report) {
    for grp in &svc_rte.static_route {
        let grp_switches = grp.switch.as_deref().unwrap_or(&[]);
        check_switches(grp_switches, "svc_rte.static_route.switch", ctx, report);
        let tenants: Vec<String> = grp.tenant.clone().unwrap_or_default();
        check_tenants(
            &tenants,
            grp_switches,
            "svc_rte.static_route.tenant",
            ctx,
            report,
        );
        for route in &grp.route {
            for pfx in route.prefix.as_deref().unwrap_or(&[]) {
                if pfx.parse::<ipnet::Ipv4Net>().is_err() {
                    report.err(format!(
                        "-svc_rte.static_route.route '{pfx}' is not a valid prefix"
                    ));
                }
            }
            match (&route.gateway, &route.interface) {
                (None, None) => report.err(
                    "-svc_rte.static_route.route a route needs a gateway or an interface"
                        .to_string(),
                ),
                (Some(gw), _) if !is_ipv4(gw) => report.err(format!(
                    "-svc_rte.static_route.route '{gw}' is not a valid gateway address"
                )),
                _ => {}
            }
            if let Some(intf) = &route.interface {
                if intf == "null0" {
                    report.err(
                        "-svc_rte.static_route.route 'null0' is not valid, the interface \
                         is named 'Null0'"
                            .to_string(),
                    );
                }
            }
            if route.ad == Some(0) {
                report.err(
                    "-svc_rte.static_route.route the administrative distance must be \
                     between 1 and 255"
                        .to_string(),
                );
            }
            if let Some(vrf) = &route.next_hop_vrf {
                let switches = route.switch.as_deref().unwrap_or(grp_switches);
                if route.switch.is_some() {
                    check_switches(switches, "svc_rte.static_route.route.switch", ctx, report);
                }
                check_tenants(
                    &[vrf.clone()],
                    switches,
                    "svc_rte.static_route.route.next_hop_vrf",
                    ctx,
                    report,
                );
            }
        }
    }
}

/// Every template must keep the token the synthesis substitutes, a
/// renamed token would silently produce colliding object names.
fn check_naming(svc_rte: &RouteVars, report: &mut Report) {
    for (key, tmpl) in &svc_rte.adv.bgp_naming {
        if !tmpl.contains("name") {
            report.err(format!(
                "-svc_rte.adv.bgp_naming.{key} '{tmpl}' must contain the 'name' token"
            ));
        }
        let is_attr = ["wght", "pref", "med", "aspath"]
            .iter()
            .any(|token| key.contains(token));
        if is_attr && !tmpl.contains("val") {
            report.err(format!(
                "-svc_rte.adv.bgp_naming.{key} '{tmpl}' must contain the 'val' token"
            ));
        }
    }
    let src_dst = Regex::new(r"src\S*dst|dst\S*src").unwrap();
    for (key, tmpl) in &svc_rte.adv.redist {
        if !src_dst.is_match(tmpl) {
            report.err(format!(
                "-svc_rte.adv.redist.{key} '{tmpl}' must contain both 'src' and 'dst'"
            ));
        }
        if key == "pl_metric_name" && !tmpl.contains("val") {
            report.err(format!(
                "-svc_rte.adv.redist.{key} '{tmpl}' must contain the 'val' token"
            ));
        }
    }
}

fn value_text(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::fixtures::{context, fabric};

    fn routes(yaml: &str) -> RouteVars {
        let adv = r#"
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
        serde_yaml::from_str(&format!("{yaml}\n{adv}")).unwrap()
    }

    #[test]
    fn test_valid_route_file_passes() {
        let rte = routes(
            r#"
bgp:
  group:
    - name: INET
      switch: [DC1-N9K-BORDER01]
      remote_as: 65100
      peer:
        - name: GTT
          descr: "GTT peering"
          peer_ip: 10.255.99.2
          tenant: [RED]
  tnt_advertise:
    - name: RED
      switch: [DC1-N9K-BORDER01]
      network:
        - prefix: [10.30.10.0/24]
static_route:
  - tenant: [RED]
    switch: [DC1-N9K-BORDER01]
    route:
      - prefix: [10.99.0.0/16]
        gateway: 10.255.99.2
"#,
        );
        let outcome = validate(&rte, &fabric(), &context());
        assert!(outcome.is_pass(), "{outcome}");
    }

    #[test]
    fn test_missing_mandatory_fields_abort_early() {
        let rte = routes(
            r#"
bgp:
  group:
    - name: INET
      peer:
        - name: GTT
          descr: "GTT peering"
"#,
        );
        match validate(&rte, &fabric(), &context()) {
            Validation::Fail(lines) => {
                assert_eq!(lines.len(), 4);
                assert!(lines[1].contains("'GTT' is missing its peer_ip"));
                assert!(lines[2].contains("needs switch set"));
                assert!(lines[3].contains("needs remote_as set"));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_session_and_reference_checks() {
        let rte = routes(
            r#"
bgp:
  group:
    - name: INET
      switch: [DC1-N9K-BORDER09]
      remote_as: 65100
      timers: [3]
      ebgp_multihop: 1
      bfd: False
      peer:
        - name: INET
          descr: "GTT peering"
          peer_ip: 10.255.99.299
"#,
        );
        match validate(&rte, &fabric(), &context()) {
            Validation::Fail(lines) => {
                assert!(lines.iter().any(|l| l.contains("'DC1-N9K-BORDER09' is not a valid device name")));
                assert!(lines.iter().any(|l| l.contains("timers")));
                assert!(lines.iter().any(|l| l.contains("ebgp_multihop")));
                assert!(lines.iter().any(|l| l.contains("bfd can only be set to 'True'")));
                assert!(lines.iter().any(|l| l.contains("'10.255.99.299' is not a valid IPv4")));
                assert!(lines.iter().any(|l| l.contains("'INET' is used more than once")));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_update_source_and_tenant_membership() {
        let rte = routes(
            r#"
bgp:
  group:
    - name: INET
      switch: [DC1-N9K-BORDER01]
      remote_as: 65100
      update_source: loopback9
      peer:
        - name: GTT
          descr: "GTT peering"
          peer_ip: 10.255.99.2
          tenant: [BLU]
"#,
        );
        match validate(&rte, &fabric(), &context()) {
            Validation::Fail(lines) => {
                assert!(lines
                    .iter()
                    .any(|l| l.contains("update_source 'loopback9' is not a loopback")));
                assert!(lines.iter().any(|l| l.contains("'BLU' is not a VRF")));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_ospf_positional_rid_and_interface_allocation() {
        let rte = routes(
            r#"
ospf:
  - process: 99
    tenant: RED
    switch: [DC1-N9K-BORDER01, DC1-N9K-BORDER02]
    rid: [1.1.1.1]
    interface:
      - name: [Ethernet1/33, Vlan310]
        area: 0.0.0.0
      - name: [Ethernet1/34]
        area: 0.0.0.0
"#,
        );
        match validate(&rte, &fabric(), &context()) {
            Validation::Fail(lines) => {
                assert!(lines
                    .iter()
                    .any(|l| l.contains("1 RIDs for 2 switches")));
                // Ethernet1/33 only exists on BORDER01, Ethernet1/34 nowhere.
                assert!(lines.iter().any(|l| {
                    l.contains("'Ethernet1/33' is not an interface in VRF RED on DC1-N9K-BORDER02")
                }));
                assert!(lines.iter().any(|l| {
                    l.contains("'Ethernet1/34' is not an interface in VRF RED on DC1-N9K-BORDER01")
                }));
                assert!(!lines.iter().any(|l| l.contains("'Vlan310'")));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_redistribution_references() {
        let rte = routes(
            r#"
ospf:
  - process: 99
    tenant: RED
    switch: [DC1-N9K-BORDER01]
    interface:
      - name: [Vlan310]
        area: 0.0.0.0
bgp:
  group:
    - name: INET
      switch: [DC1-N9K-BORDER01]
      remote_as: 65100
      peer:
        - name: GTT
          descr: "GTT peering"
          peer_ip: 10.255.99.2
  tnt_advertise:
    - name: RED
      switch: [DC1-N9K-BORDER01]
      redist:
        - type: ospf 98
        - type: bgp 65002
        - type: rip
        - type: connected
          allow: [Ethernet1/40]
"#,
        );
        match validate(&rte, &fabric(), &context()) {
            Validation::Fail(lines) => {
                assert!(lines
                    .iter()
                    .any(|l| l.contains("OSPF process '98' does not exist")));
                assert!(lines.iter().any(|l| l.contains("the fabric BGP AS is 65001")));
                assert!(lines.iter().any(|l| l.contains("'rip' is not valid")));
                assert!(lines.iter().any(|l| {
                    l.contains("'Ethernet1/40' is not an interface in VRF RED")
                }));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_static_route_checks() {
        let rte = routes(
            r#"
static_route:
  - tenant: [RED]
    switch: [DC1-N9K-BORDER01]
    route:
      - prefix: [10.99.0.0/16]
        interface: null0
        ad: 0
      - prefix: [10.98.0.0/16]
"#,
        );
        match validate(&rte, &fabric(), &context()) {
            Validation::Fail(lines) => {
                assert!(lines.iter().any(|l| l.contains("'null0' is not valid")));
                assert!(lines
                    .iter()
                    .any(|l| l.contains("administrative distance")));
                assert!(lines
                    .iter()
                    .any(|l| l.contains("needs a gateway or an interface")));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_naming_templates_keep_their_tokens() {
        let mut rte = routes("bgp:\n  tnt_advertise: []");
        rte.adv
            .bgp_naming
            .insert("pl_wght_in".to_string(), "PL_name_WGHT_IN".to_string());
        rte.adv
            .redist
            .insert("pl_name".to_string(), "PL_source_to_dest".to_string());
        match validate(&rte, &fabric(), &context()) {
            Validation::Fail(lines) => {
                assert!(lines
                    .iter()
                    .any(|l| l.contains("pl_wght_in") && l.contains("'val' token")));
                assert!(lines
                    .iter()
                    .any(|l| l.contains("pl_name") && l.contains("'src' and 'dst'")));
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }
}
