//! Resolves the route service tree into per-device BGP, OSPF and static
//! route plans, synthesizing every prefix-list and route-map they need.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::vars::fabric::FabricVars;
use crate::vars::route::{
    AttrMap, BgpSession, DefaultOriginate, FilterEntry, OspfProcess,
    Redistribution, RouteVars,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Permit,
    Deny,
}

/// One `ip prefix-list` line.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrefixListEntry {
    pub name: String,
    pub seq: u32,
    pub action: Action,
    pub matcher: String,
}

/// What a route-map entry matches on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RmMatch {
    PrefixList(String),
    /// Space separated interface names, used when redistributing
    /// connected routes.
    Interface(String),
}

/// One route-map entry; `set_attr` carries the attribute it sets, for
/// example `("weight", 50)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteMapEntry {
    pub name: String,
    pub seq: u32,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<RmMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_attr: Option<(String, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRouteEntry {
    pub prefix: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop_vrf: Option<String>,
}

/// A summary advertisement with its prefixes expanded into a map of
/// prefix to optional filter keyword.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryPlan {
    pub prefixes: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
}

/// One redistribution with its synthesized route-map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedistPlan {
    #[serde(rename = "type")]
    pub redist_type: String,
    pub rm_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OspfProcPlan {
    pub tenant: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    pub bfd: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_orig: Option<DefaultOriginate>,
    /// Area number to stub/nssa type.
    pub area_type: BTreeMap<String, String>,
    /// Areas with at least one authenticated interface, sorted.
    pub auth_areas: Vec<String>,
    pub summary: Vec<SummaryPlan>,
    pub redist: Vec<RedistPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OspfIntfPlan {
    pub proc: String,
    pub area: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub passive: bool,
    pub hello: u32,
    /// BFD is disabled on interfaces with hand-set hello timers.
    pub bfd_disable: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub intf_type: Option<String>,
}

/// BGP session attributes after group/peer inheritance, plus the names
/// of the synthesized filtering route-maps.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_as: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timers: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub bfd: bool,
    pub default_originate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ebgp_multihop: Option<u8>,
    pub next_hop_self: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound_rm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outbound_rm: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpGroupPlan {
    pub timers: Vec<u32>,
    #[serde(flatten)]
    pub session: SessionPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpPeerPlan {
    pub name: String,
    pub grp: String,
    pub descr: String,
    pub peer_ip: String,
    #[serde(flatten)]
    pub session: SessionPlan,
}

/// Per-tenant BGP state: the peers in that VRF plus what the VRF
/// advertises.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BgpTenantPlan {
    pub peers: Vec<BgpPeerPlan>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub network: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub summary: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub redist: Vec<RedistPlan>,
}

/// Everything the route service resolves to on one device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutePlan {
    pub pfx_lists: Vec<PrefixListEntry>,
    pub route_maps: Vec<RouteMapEntry>,
    /// Static routes keyed by VRF.
    pub static_routes: BTreeMap<String, Vec<StaticRouteEntry>>,
    pub ospf_proc: BTreeMap<String, OspfProcPlan>,
    /// OSPF interface settings keyed by full interface name.
    pub ospf_intf: BTreeMap<String, OspfIntfPlan>,
    pub bgp_groups: BTreeMap<String, BgpGroupPlan>,
    pub bgp_tenants: BTreeMap<String, BgpTenantPlan>,
}

/// Accumulates prefix-lists and route-maps while a group, peer or
/// redistribution is being synthesized. Route-map sequence numbers step
/// by 10, prefix-list entries by 5.
#[derive(Debug, Default)]
struct PolicyAccum {
    pfx_lists: Vec<PrefixListEntry>,
    route_maps: Vec<RouteMapEntry>,
    rm_seq: u32,
}

impl PolicyAccum {
    fn pfx(&mut self, name: &str, seq: u32, action: Action, matcher: &str) {
        self.pfx_lists.push(PrefixListEntry {
            name: name.to_string(),
            seq,
            action,
            matcher: matcher.to_string(),
        });
    }

    fn rm(
        &mut self,
        name: &str,
        seq: u32,
        action: Action,
        matcher: Option<RmMatch>,
        set_attr: Option<(String, u32)>,
    ) {
        self.route_maps.push(RouteMapEntry {
            name: name.to_string(),
            seq,
            action,
            matcher,
            set_attr,
        });
    }

    /// Keyword or prefix-list entries under one name. `pl_seq` carries
    /// on across calls that share a prefix-list.
    fn pfx_entries(&mut self, name: &str, action: Action, entry: &FilterEntry, pl_seq: &mut u32) {
        match entry {
            FilterEntry::Keyword(kw) if kw == "default" => {
                self.pfx(name, *pl_seq + 5, Action::Permit, "0.0.0.0/0");
            }
            FilterEntry::Keyword(kw) if kw == "any" => {
                self.pfx(name, *pl_seq + 5, Action::Permit, "0.0.0.0/0 le 32");
            }
            FilterEntry::Keyword(_) => {}
            FilterEntry::Prefixes(prefixes) => {
                for pfx in prefixes {
                    *pl_seq += 5;
                    self.pfx(name, *pl_seq, action, pfx);
                }
            }
        }
    }

    /// Attribute setting entries (weight, pref, med, as_prepend). One
    /// route-map entry and prefix-list per attribute value.
    fn push_attrs(&mut self, attrs: &AttrMap, pl_tmpl: &str, rm_name: &str, attr: &str) -> bool {
        for (value, entry) in attrs {
            self.rm_seq += 10;
            let mut pl_seq = 0;
            let pl_name = pl_tmpl.replace("val", &value.to_string());
            self.pfx_entries(&pl_name, Action::Permit, entry, &mut pl_seq);
            self.rm(
                rm_name,
                self.rm_seq,
                Action::Permit,
                Some(RmMatch::PrefixList(pl_name)),
                Some((attr.to_string(), *value)),
            );
        }
        !attrs.is_empty()
    }

    /// Allow/deny entries in fixed precedence: specific denies, default
    /// deny, allows, then a trailing deny-any.
    fn push_allow_deny(
        &mut self,
        allow: Option<&FilterEntry>,
        deny: Option<&FilterEntry>,
        pl_name: &str,
        rm_name: &str,
        dflt_pl: &BTreeMap<String, String>,
    ) -> bool {
        if allow.is_none() && deny.is_none() {
            return false;
        }
        let mut pl_seq = 0;
        if let Some(FilterEntry::Prefixes(prefixes)) = deny {
            self.rm_seq += 10;
            for pfx in prefixes {
                pl_seq += 5;
                self.pfx(pl_name, pl_seq, Action::Deny, pfx);
            }
            self.rm(
                rm_name,
                self.rm_seq,
                Action::Permit,
                Some(RmMatch::PrefixList(pl_name.to_string())),
                None,
            );
        }
        if let Some(FilterEntry::Keyword(kw)) = deny {
            if kw == "default" {
                self.rm_seq += 10;
                self.rm(
                    rm_name,
                    self.rm_seq,
                    Action::Deny,
                    Some(RmMatch::PrefixList(tmpl(dflt_pl, "pl_default"))),
                    None,
                );
            }
        }
        match allow {
            Some(FilterEntry::Prefixes(prefixes)) => {
                // Shares the prefix-list (and route-map entry) with the
                // specific denies when both are present.
                if pl_seq == 0 {
                    self.rm_seq += 10;
                    self.rm(
                        rm_name,
                        self.rm_seq,
                        Action::Permit,
                        Some(RmMatch::PrefixList(pl_name.to_string())),
                        None,
                    );
                }
                for pfx in prefixes {
                    pl_seq += 5;
                    self.pfx(pl_name, pl_seq, Action::Permit, pfx);
                }
            }
            Some(FilterEntry::Keyword(kw)) if kw == "default" => {
                self.rm_seq += 10;
                self.rm(
                    rm_name,
                    self.rm_seq,
                    Action::Permit,
                    Some(RmMatch::PrefixList(tmpl(dflt_pl, "pl_default"))),
                    None,
                );
            }
            Some(FilterEntry::Keyword(kw)) if kw == "any" => {
                self.rm_seq += 10;
                self.rm(
                    rm_name,
                    self.rm_seq,
                    Action::Permit,
                    Some(RmMatch::PrefixList(tmpl(dflt_pl, "pl_allow"))),
                    None,
                );
            }
            _ => {}
        }
        if let Some(FilterEntry::Keyword(kw)) = deny {
            // Always the last route-map entry.
            if kw == "any" {
                self.rm_seq += 10;
                self.rm(
                    rm_name,
                    self.rm_seq,
                    Action::Permit,
                    Some(RmMatch::PrefixList(tmpl(dflt_pl, "pl_deny"))),
                    None,
                );
            }
        }
        true
    }

    /// Both filtering directions for one group or peer. Attribute
    /// setting entries come before allow/deny in the route-map.
    fn push_session_filters(
        &mut self,
        obj_name: &str,
        session: &BgpSession,
        naming: &BTreeMap<String, String>,
        dflt_pl: &BTreeMap<String, String>,
    ) -> (Option<String>, Option<String>) {
        let sub = |key: &str| tmpl(naming, key).replace("name", obj_name);

        self.rm_seq = 0;
        let rm_in = sub("rm_in");
        let mut fired = false;
        if let Some(inbound) = &session.inbound {
            if let Some(weight) = &inbound.weight {
                fired |= self.push_attrs(weight, &sub("pl_wght_in"), &rm_in, "weight");
            }
            if let Some(pref) = &inbound.pref {
                fired |= self.push_attrs(pref, &sub("pl_pref_in"), &rm_in, "pref");
            }
            fired |= self.push_allow_deny(
                inbound.allow.as_ref(),
                inbound.deny.as_ref(),
                &sub("pl_in"),
                &rm_in,
                dflt_pl,
            );
        }
        let inbound_rm = fired.then_some(rm_in);

        self.rm_seq = 0;
        let rm_out = sub("rm_out");
        let mut fired = false;
        if let Some(outbound) = &session.outbound {
            if let Some(med) = &outbound.med {
                fired |= self.push_attrs(med, &sub("pl_med_out"), &rm_out, "med");
            }
            if let Some(prepend) = &outbound.as_prepend {
                fired |= self.push_attrs(prepend, &sub("pl_aspath_out"), &rm_out, "as_prepend");
            }
            fired |= self.push_allow_deny(
                outbound.allow.as_ref(),
                outbound.deny.as_ref(),
                &sub("pl_out"),
                &rm_out,
                dflt_pl,
            );
        }
        let outbound_rm = fired.then_some(rm_out);

        (inbound_rm, outbound_rm)
    }

    /// Redistribution of one protocol into another, returns the name of
    /// the route-map the redistribute statement references.
    fn push_redist(
        &mut self,
        redist_type: &str,
        destination: &str,
        allow: Option<&FilterEntry>,
        metric: Option<&AttrMap>,
        tenant: &str,
        naming: &BTreeMap<String, String>,
        dflt_pl: &BTreeMap<String, String>,
    ) -> String {
        let mut source = redist_type.to_uppercase();
        if source.starts_with("BGP ") {
            source = format!("BGP_{}", tenant.to_uppercase());
        } else if source.contains("OSPF ") {
            source = source.replace(' ', "_");
        } else if source == "CONNECTED" {
            source = "CONN".to_string();
        }
        let mut destination = destination.to_string();
        // VRF qualifies the BGP destination or every tenant would share
        // one name.
        if destination.contains("BGP_") {
            destination.push_str(&tenant.to_uppercase());
        }
        let sub = |key: &str| {
            tmpl(naming, key)
                .replace("src", &source)
                .replace("dst", &destination)
        };
        let pl_name = sub("pl_name");
        let rm_name = sub("rm_name");
        let pl_metric_name = sub("pl_metric_name");
        let mut rm_seq = 0;

        if allow.is_none() && metric.is_none() {
            // Redistribute everything, a bare permit entry.
            rm_seq += 10;
            self.rm(&rm_name, rm_seq, Action::Permit, None, None);
        } else if let Some(metric) = metric {
            for (value, entry) in metric {
                rm_seq += 10;
                let mut pl_seq = 0;
                let name = pl_metric_name.replace("val", &value.to_string());
                self.pfx_entries(&name, Action::Permit, entry, &mut pl_seq);
                self.rm(
                    &rm_name,
                    rm_seq,
                    Action::Permit,
                    Some(RmMatch::PrefixList(name)),
                    Some(("metric".to_string(), *value)),
                );
            }
        }

        match allow {
            Some(FilterEntry::Keyword(kw)) if kw == "default" => {
                rm_seq += 10;
                self.rm(
                    &rm_name,
                    rm_seq,
                    Action::Permit,
                    Some(RmMatch::PrefixList(tmpl(dflt_pl, "pl_default"))),
                    None,
                );
            }
            Some(FilterEntry::Keyword(kw)) if kw == "any" => {
                rm_seq += 10;
                self.rm(
                    &rm_name,
                    rm_seq,
                    Action::Permit,
                    Some(RmMatch::PrefixList(tmpl(dflt_pl, "pl_allow"))),
                    None,
                );
            }
            Some(FilterEntry::Prefixes(items)) if source == "CONN" => {
                // Matches on interfaces, and entry 10 already tags the
                // tenant SVIs so this starts at 20.
                rm_seq += 20;
                self.rm(
                    &rm_name,
                    rm_seq,
                    Action::Permit,
                    Some(RmMatch::Interface(items.join(" "))),
                    None,
                );
            }
            Some(FilterEntry::Prefixes(prefixes)) => {
                let mut pl_seq = 0;
                for pfx in prefixes {
                    pl_seq += 5;
                    self.pfx(&pl_name, pl_seq, Action::Permit, pfx);
                }
                rm_seq += 10;
                self.rm(
                    &rm_name,
                    rm_seq,
                    Action::Permit,
                    Some(RmMatch::PrefixList(pl_name.clone())),
                    None,
                );
            }
            _ => {}
        }
        rm_name
    }
}

fn tmpl(map: &BTreeMap<String, String>, key: &str) -> String {
    map.get(key).cloned().unwrap_or_default()
}

fn value_str(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn session_plan(session: &BgpSession) -> SessionPlan {
    SessionPlan {
        remote_as: session.remote_as,
        timers: session.timers.clone(),
        password: session.password.clone(),
        bfd: session.bfd.unwrap_or(false),
        default_originate: session.default.unwrap_or(false),
        ebgp_multihop: session.ebgp_multihop,
        next_hop_self: session.next_hop_self.unwrap_or(false),
        update_source: session.update_source.clone(),
        inbound_rm: None,
        outbound_rm: None,
    }
}

/// Redistribution entries for one advertise scope, honouring the
/// one-entry-per-type rule. Entries with their own switch list beat
/// entries inheriting the parent's.
fn collect_redist(
    accum: &mut PolicyAccum,
    redist: &[Redistribution],
    hostname: &str,
    parent_switch: &[String],
    destination: &str,
    tenant: &str,
    naming: &BTreeMap<String, String>,
    dflt_pl: &BTreeMap<String, String>,
) -> Vec<RedistPlan> {
    let mut seen: Vec<String> = Vec::new();
    let mut plans = Vec::new();
    let explicit = redist.iter().map(|r| (r, true));
    let inherited = redist.iter().map(|r| (r, false));
    for (entry, explicit) in explicit.chain(inherited) {
        let matched = if explicit {
            entry
                .switch
                .as_deref()
                .map(|sw| sw.iter().any(|s| s == hostname))
                .unwrap_or(false)
        } else {
            entry.switch.is_none() && parent_switch.iter().any(|s| s == hostname)
        };
        if !matched {
            continue;
        }
        let redist_type = entry.redist_type.clone().unwrap_or_default();
        if seen.contains(&redist_type) {
            warn!("{hostname}: dropping duplicate '{redist_type}' redistribution into {destination}");
            continue;
        }
        seen.push(redist_type.clone());
        let rm_name = accum.push_redist(
            &redist_type,
            destination,
            entry.allow.as_ref(),
            entry.metric.as_ref(),
            tenant,
            naming,
            dflt_pl,
        );
        plans.push(RedistPlan { redist_type, rm_name });
    }
    plans
}

/// Builds the route plan for one device.
pub fn resolve(svc_rte: &RouteVars, hostname: &str, fabric: &FabricVars) -> RoutePlan {
    let mut plan = RoutePlan::default();
    let mut accum = PolicyAccum::default();
    let naming = &svc_rte.adv.bgp_naming;
    let redist_naming = &svc_rte.adv.redist;
    let dflt_pl = &svc_rte.adv.dflt_pl;
    let bse_intf = &fabric.adv.bse_intf;

    // Static routes grouped per VRF.
    for grp in &svc_rte.static_route {
        let grp_switch = grp.switch.as_deref().unwrap_or(&[]);
        for tenant in grp.tenant.as_deref().unwrap_or(&[]) {
            let mut routes = Vec::new();
            for route in &grp.route {
                let on_host = route
                    .switch
                    .as_deref()
                    .unwrap_or(grp_switch)
                    .iter()
                    .any(|sw| sw == hostname);
                if !on_host {
                    continue;
                }
                routes.push(StaticRouteEntry {
                    prefix: route.prefix.clone().unwrap_or_default(),
                    gateway: route.gateway.clone(),
                    interface: route
                        .interface
                        .as_ref()
                        .map(|i| i.replace(&bse_intf.intf_short, &bse_intf.intf_fmt)),
                    ad: route.ad,
                    next_hop_vrf: route.next_hop_vrf.clone(),
                });
            }
            if !routes.is_empty() {
                plan.static_routes
                    .entry(tenant.clone())
                    .or_default()
                    .extend(routes);
            }
        }
    }

    // OSPF processes and interfaces.
    for proc in &svc_rte.ospf {
        resolve_ospf(&mut plan, &mut accum, proc, hostname, svc_rte, fabric);
    }

    // BGP groups and peers; a group only exists on devices with at
    // least one of its peers.
    if let Some(bgp) = &svc_rte.bgp {
        for grp in bgp.group.as_deref().unwrap_or(&[]) {
            let grp_name = grp.name.clone().unwrap_or_default();
            let grp_switch = grp.session.switch.as_deref().unwrap_or(&[]);
            let grp_tenant: Vec<String> = grp
                .session
                .tenant
                .clone()
                .unwrap_or_else(|| vec!["global".to_string()]);
            let mut on_host = false;
            for peer in grp.peer.as_deref().unwrap_or(&[]) {
                let peer_switch = peer.session.switch.as_deref().unwrap_or(grp_switch);
                if !peer_switch.iter().any(|sw| sw == hostname) {
                    continue;
                }
                on_host = true;
                let peer_name = peer.name.clone().unwrap_or_default();
                let mut session = session_plan(&peer.session);
                let (in_rm, out_rm) =
                    accum.push_session_filters(&peer_name, &peer.session, naming, dflt_pl);
                session.inbound_rm = in_rm;
                session.outbound_rm = out_rm;
                let peer_plan = BgpPeerPlan {
                    name: peer_name,
                    grp: grp_name.clone(),
                    descr: peer.descr.clone().unwrap_or_default(),
                    peer_ip: peer.peer_ip.clone().unwrap_or_default(),
                    session,
                };
                let tenants = peer.session.tenant.as_ref().unwrap_or(&grp_tenant);
                for tenant in tenants {
                    plan.bgp_tenants
                        .entry(tenant.clone())
                        .or_default()
                        .peers
                        .push(peer_plan.clone());
                }
            }
            if on_host {
                let mut session = session_plan(&grp.session);
                let (in_rm, out_rm) =
                    accum.push_session_filters(&grp_name, &grp.session, naming, dflt_pl);
                session.inbound_rm = in_rm;
                session.outbound_rm = out_rm;
                plan.bgp_groups.insert(
                    grp_name,
                    BgpGroupPlan {
                        timers: grp
                            .session
                            .timers
                            .clone()
                            .unwrap_or_else(|| fabric.adv.route.bgp_timers.clone()),
                        session,
                    },
                );
            }
        }

        // Advertisements are per tenant and only attach where the
        // tenant already has peers.
        for tnt in &bgp.tnt_advertise {
            let tnt_name = tnt.name.clone().unwrap_or_default();
            let tnt_switch = tnt.switch.as_deref().unwrap_or(&[]);
            let mut network = Vec::new();
            for pfx in &tnt.network {
                let on_host = pfx
                    .switch
                    .as_deref()
                    .unwrap_or(tnt_switch)
                    .iter()
                    .any(|sw| sw == hostname);
                if on_host {
                    network.extend(pfx.prefix.clone().unwrap_or_default());
                }
            }
            let mut summary = BTreeMap::new();
            for pfx in &tnt.summary {
                let on_host = pfx
                    .switch
                    .as_deref()
                    .unwrap_or(tnt_switch)
                    .iter()
                    .any(|sw| sw == hostname);
                if on_host {
                    for each_pfx in pfx.prefix.as_deref().unwrap_or(&[]) {
                        summary.insert(each_pfx.clone(), pfx.filter.clone());
                    }
                }
            }
            let redist = collect_redist(
                &mut accum,
                &tnt.redist,
                hostname,
                tnt_switch,
                "BGP_",
                &tnt_name,
                redist_naming,
                dflt_pl,
            );
            if let Some(tenant_plan) = plan.bgp_tenants.get_mut(&tnt_name) {
                tenant_plan.network = network;
                tenant_plan.summary = summary;
                tenant_plan.redist = redist;
            }
        }
    }

    accum.pfx_lists.sort();
    accum.pfx_lists.dedup();
    accum.route_maps.sort();
    accum.route_maps.dedup();
    plan.pfx_lists = accum.pfx_lists;
    plan.route_maps = accum.route_maps;
    plan
}

fn resolve_ospf(
    plan: &mut RoutePlan,
    accum: &mut PolicyAccum,
    proc: &OspfProcess,
    hostname: &str,
    svc_rte: &RouteVars,
    fabric: &FabricVars,
) {
    let bse_intf = &fabric.adv.bse_intf;
    let proc_switch = proc.switch.as_deref().unwrap_or(&[]);
    if !proc_switch.iter().any(|sw| sw == hostname) {
        return;
    }
    let process = value_str(proc.process.as_ref().unwrap_or(&serde_yaml::Value::Null));
    let tenant = proc.tenant.clone().unwrap_or_else(|| "global".to_string());

    // RID assignment is positional, first switch takes the first RID.
    let rid = proc.rid.as_ref().and_then(|rids| {
        rids.iter()
            .zip(proc_switch)
            .find(|(_, sw)| *sw == hostname)
            .map(|(rid, _)| rid.clone())
    });

    let mut area_type = BTreeMap::new();
    let mut auth_areas = Vec::new();
    for intf in proc.interface.as_deref().unwrap_or(&[]) {
        let intf_switch = intf.switch.as_deref().unwrap_or(proc_switch);
        if !intf_switch.iter().any(|sw| sw == hostname) {
            continue;
        }
        let area = intf.area.clone().unwrap_or_default();
        if let Some(kind) = &intf.area_type {
            area_type.insert(area.clone(), kind.clone());
        }
        if intf.authentication.is_some() {
            auth_areas.push(area.clone());
        }
        let (hello, bfd_disable) = match intf.hello {
            None => (fabric.adv.route.ospf_hello, false),
            Some(hello) => (hello, true),
        };
        let settings = OspfIntfPlan {
            proc: process.clone(),
            area,
            cost: intf.cost,
            authentication: intf.authentication.clone(),
            passive: intf.passive.unwrap_or(false),
            hello,
            bfd_disable,
            intf_type: intf.intf_type.clone(),
        };
        for name in intf.name.as_deref().unwrap_or(&[]) {
            let full = name.replace(&bse_intf.intf_short, &bse_intf.intf_fmt);
            plan.ospf_intf.insert(full, settings.clone());
        }
    }
    auth_areas.sort();
    auth_areas.dedup();

    let mut summary = Vec::new();
    for smry in &proc.summary {
        let on_host = smry
            .switch
            .as_deref()
            .unwrap_or(proc_switch)
            .iter()
            .any(|sw| sw == hostname);
        if !on_host {
            continue;
        }
        let mut prefixes = BTreeMap::new();
        for pfx in smry.prefix.as_deref().unwrap_or(&[]) {
            prefixes.insert(pfx.clone(), smry.filter.clone());
        }
        summary.push(SummaryPlan {
            prefixes,
            area: smry.area.clone(),
        });
    }

    let redist = collect_redist(
        accum,
        &proc.redist,
        hostname,
        proc_switch,
        &format!("OSPF_{process}"),
        &tenant,
        &svc_rte.adv.redist,
        &svc_rte.adv.dflt_pl,
    );

    plan.ospf_proc.insert(
        process,
        OspfProcPlan {
            tenant,
            rid,
            bfd: proc.bfd.unwrap_or(false),
            default_orig: proc.default_orig.clone(),
            area_type,
            auth_areas,
            summary,
            redist,
        },
    );
}
