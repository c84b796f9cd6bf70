//! Checks of the base variable file: naming, base network sizing and
//! management services.

use ipnet::Ipv4Net;
use regex::Regex;

use crate::addressing;
use crate::vars::BaseVars;

use super::{is_ipv4, is_ipv4_network, Report, Validation};

struct Patterns {
    /// Name stem must end in a hyphenated group token.
    device_name: Regex,
}

impl Patterns {
    fn new() -> Self {
        Patterns {
            device_name: Regex::new(r"-[a-zA-Z0-9_]+$").unwrap(),
        }
    }
}

pub fn validate(base: &BaseVars) -> Validation {
    let mut report = Report::new("base.yml");
    let patterns = Patterns::new();

    for (role, name) in [
        ("spine", &base.device_name.spine),
        ("leaf", &base.device_name.leaf),
        ("border", &base.device_name.border),
    ] {
        if !patterns.device_name.is_match(name) {
            report.err(format!(
                "-bse.device_name.{role} '{name}' must end in '-<group>' using only letters, \
                 digits and underscore"
            ));
        }
    }

    check_addr(base, &mut report);

    for user in &base.users {
        if user.username.is_none() {
            report.err("-bse.users username is missing".to_string());
        }
        if user.password.is_none() {
            report.err(format!(
                "-bse.users password is missing for user '{}'",
                user.username.as_deref().unwrap_or("unknown")
            ));
        }
    }

    check_services(base, &mut report);

    if base.mgmt_acl.is_empty() {
        report.err(
            "-bse.mgmt_acl must have at least one entry, if unused hash the feature out"
                .to_string(),
        );
    }
    for acl in &base.mgmt_acl {
        if acl.source.is_empty() {
            report.err(format!(
                "-bse.mgmt_acl '{}' does not have a valid list of source prefixes",
                acl.name.as_deref().unwrap_or("unknown")
            ));
        }
        for src in &acl.source {
            if src != "any" && !is_ipv4_network(src) {
                report.err(format!(
                    "-bse.mgmt_acl source '{src}' must be a valid IPv4 network address or 'any'"
                ));
            }
        }
    }

    if base.adv.image.is_empty() {
        report.err("-bse.adv.image the OS image file name is missing".to_string());
    }
    if base.adv.image_version.is_empty() {
        report.err("-bse.adv.image_version the OS version is missing".to_string());
    }

    report.finish()
}

/// Base networks must be valid and large enough for every address the
/// inventory carves out of them.
fn check_addr(base: &BaseVars, report: &mut Report) {
    let mut capacity = |name: &str, addr: &str, min: u32| {
        match addr.parse::<Ipv4Net>() {
            Ok(net) => {
                let have = addressing::network_capacity(net.trunc());
                if have < min {
                    report.err(format!(
                        "-bse.addr.{name} '{addr}' is too small, must hold at least {min} addresses"
                    ));
                }
            }
            Err(_) => report.err(format!(
                "-bse.addr.{name} '{addr}' is not a valid IPv4 network address"
            )),
        }
    };

    capacity("lp_net", &base.addr.lp_net, 64);
    match &base.addr.mlag_kalive_net {
        // With a dedicated keepalive network the peer and keepalive
        // ranges each only hold their own /30s.
        Some(kalive) => {
            capacity("mgmt_net", &base.addr.mgmt_net, 32);
            capacity("mlag_peer_net", &base.addr.mlag_peer_net, 32);
            capacity("mlag_kalive_net", kalive, 32);
        }
        None => {
            capacity("mgmt_net", &base.addr.mgmt_net, 32);
            capacity("mlag_peer_net", &base.addr.mlag_peer_net, 64);
        }
    }
    if !is_ipv4(&base.addr.mgmt_gw) {
        report.err(format!(
            "-bse.addr.mgmt_gw '{}' is not a valid IPv4 address",
            base.addr.mgmt_gw
        ));
    }
}

fn check_services(base: &BaseVars, report: &mut Report) {
    let mut addr = |name: &str, value: &str| {
        if !is_ipv4(value) {
            report.err(format!(
                "-bse.services.{name} '{value}' is not a valid IPv4 address"
            ));
        }
    };
    if let Some(dns) = &base.services.dns {
        if let Some(prim) = &dns.prim {
            addr("dns.prim", prim);
        }
        if let Some(sec) = &dns.sec {
            addr("dns.sec", sec);
        }
    }
    if let Some(snmp) = &base.services.snmp {
        if let Some(host) = &snmp.host {
            addr("snmp.host", host);
        }
    }
    for (svc, servers) in &base.services.server_lists {
        for server in &servers.server {
            addr(&format!("{svc}.server"), server);
        }
    }
}
