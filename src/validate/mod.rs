//! Pre-build validation of the variable files.
//!
//! Each file's validator accumulates every problem it can find rather
//! than stopping at the first, so one run reports everything a user has
//! to fix. Checks whose failure would make later checks meaningless
//! (missing mandatory fields) abort the file's validation early.

use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

pub mod base;
pub mod fabric;
pub mod interface;
pub mod route;
pub mod tenant;

pub use route::FabricContext;

/// Outcome of validating one file.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The file's pass sentinel.
    Pass(String),
    /// Banner line followed by one line per problem.
    Fail(Vec<String>),
}

impl Validation {
    pub fn is_pass(&self) -> bool {
        matches!(self, Validation::Pass(_))
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Pass(msg) => write!(f, "{msg}"),
            Validation::Fail(lines) => {
                for (n, line) in lines.iter().enumerate() {
                    if n > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{line}")?;
                }
                Ok(())
            }
        }
    }
}

/// Collects problems for one file, banner first.
pub(crate) struct Report {
    file: &'static str,
    lines: Vec<String>,
}

impl Report {
    pub(crate) fn new(file: &'static str) -> Self {
        Report {
            file,
            lines: vec![format!(
                "Check the contents of {file} for the following issues:"
            )],
        }
    }

    pub(crate) fn err(&mut self, msg: String) {
        self.lines.push(msg);
    }

    pub(crate) fn has_errors(&self) -> bool {
        self.lines.len() > 1
    }

    pub(crate) fn finish(self) -> Validation {
        if self.has_errors() {
            Validation::Fail(self.lines)
        } else {
            Validation::Pass(format!("'{} unittest pass'", self.file))
        }
    }
}

pub(crate) fn is_ipv4(addr: &str) -> bool {
    addr.parse::<Ipv4Addr>().is_ok()
}

/// A network in `addr/len` form with no host bits set.
pub(crate) fn is_ipv4_network(pfx: &str) -> bool {
    match pfx.parse::<Ipv4Net>() {
        Ok(net) => net.addr() == net.network(),
        Err(_) => false,
    }
}

/// Members occurring more than once, each reported once, sorted.
pub(crate) fn duplicates<T: Ord + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort();
    let mut dups: Vec<T> = sorted
        .windows(2)
        .filter(|w| w[0] == w[1])
        .map(|w| w[0].clone())
        .collect();
    dups.dedup();
    dups
}

/// Items in `used` that are not in `declared`, deduped and sorted.
pub(crate) fn missing_from<'a>(
    used: impl IntoIterator<Item = &'a String>,
    declared: &BTreeSet<String>,
) -> Vec<String> {
    let missing: BTreeSet<String> = used
        .into_iter()
        .filter(|item| !declared.contains(*item))
        .cloned()
        .collect();
    missing.into_iter().collect()
}

/// Parsed variable fixtures shared by the per-file validator tests, a
/// 2 spine / 2 leaf / 2 border fabric with one tenant.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::FabricContext;
    use crate::vars::{BaseVars, FabricVars, InterfaceVars, TenantVars};

    pub(crate) fn base() -> BaseVars {
        serde_yaml::from_str(
            r#"
device_name: {spine: DC1-N9K-SPINE, leaf: DC1-N9K-LEAF, border: DC1-N9K-BORDER}
addr:
  lp_net: "192.168.101.0/26"
  mgmt_net: "10.10.108.0/24"
  mlag_peer_net: "192.168.202.0/26"
  mgmt_gw: "10.10.108.1"
users:
  - {username: admin, password: secret}
services: {}
mgmt_acl: []
"#,
        )
        .unwrap()
    }

    pub(crate) fn fabric() -> FabricVars {
        serde_yaml::from_str(
            r#"
network_size: {num_spine: 2, num_leaf: 2, num_border: 2}
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

    pub(crate) fn tenants() -> TenantVars {
        serde_yaml::from_str(
            r#"
tnt:
  - tenant_name: RED
    l3_tenant: true
    vlans:
      - {num: 310, name: red_app, ip_addr: 10.30.10.1/24, create_on_border: true}
adv:
  bse_vni: {tnt_vlan: 3001, l3vni: 1003001, l2vni: 10000}
  vni_incre: {tnt_vlan: 1, l3vni: 1, l2vni: 10000}
  redist: {rm_name: RM_src_to_dst}
"#,
        )
        .unwrap()
    }

    pub(crate) fn interfaces() -> InterfaceVars {
        serde_yaml::from_str(
            r#"
intf:
  single_homed:
    - descr: "UPLINK > GTT"
      type: layer3
      ip_vlan: 10.255.99.1/30
      switch: [DC1-N9K-BORDER01]
      tenant: RED
adv:
  single_homed: {first_intf: 33, last_intf: 40, first_lp: 11, last_lp: 20}
  dual_homed: {first_intf: 41, last_intf: 48, first_po: 41, last_po: 48}
"#,
        )
        .unwrap()
    }

    pub(crate) fn context() -> FabricContext {
        FabricContext::new(&base(), &fabric(), &tenants(), &interfaces()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_pass_and_fail() {
        let report = Report::new("base.yml");
        assert_eq!(
            report.finish(),
            Validation::Pass("'base.yml unittest pass'".to_string())
        );

        let mut report = Report::new("base.yml");
        report.err("-bse.addr.lp_net 'junk' is not a valid IPv4 network address".to_string());
        match report.finish() {
            Validation::Fail(lines) => {
                assert_eq!(
                    lines[0],
                    "Check the contents of base.yml for the following issues:"
                );
                assert_eq!(lines.len(), 2);
            }
            Validation::Pass(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn test_network_checks() {
        assert!(is_ipv4("10.1.1.1"));
        assert!(!is_ipv4("10.1.1.256"));
        assert!(is_ipv4_network("10.10.10.0/24"));
        assert!(!is_ipv4_network("10.10.10.1/24"));
        assert!(!is_ipv4_network("10.10.10.0"));
    }

    #[test]
    fn test_duplicates() {
        assert_eq!(duplicates(&[3, 1, 2, 3, 1, 3]), vec![1, 3]);
        assert!(duplicates(&[1, 2, 3]).is_empty());
    }
}
