//! End-to-end pipeline run over a 2 spine / 4 leaf / 2 border fabric:
//! writes the five variable files, runs the full pipeline and checks
//! the emitted inventory and device models.

use std::fs;
use std::path::Path;

use serde_yaml::Value;

use fabricgen::cli::{Args, OutputFormat};
use fabricgen::orchestrator;

const BASE: &str = r#"
device_name:
  spine: DC1-N9K-SPINE
  leaf: DC1-N9K-LEAF
  border: DC1-N9K-BORDER
addr:
  lp_net: "192.168.101.0/26"
  mgmt_net: "10.10.108.0/24"
  mlag_peer_net: "192.168.202.0/26"
  mgmt_gw: "10.10.108.1"
users:
  - username: admin
    password: $9$kTReDlbdZmfsdf
    role: network-admin
services:
  dns:
    prim: 10.10.10.41
    sec: 10.10.10.42
mgmt_acl:
  - name: SNMP_ACCESS
    source: [10.17.10.0/24]
adv:
  image: nxos.9.3.5.bin
  image_version: 9.3(5)
  exec_timeout:
    console: 0
    vty: 15
"#;

const FABRIC: &str = r#"
network_size:
  num_spine: 2
  num_leaf: 4
  num_border: 2
num_intf:
  spine: "1,64"
  leaf: "1,64"
  border: "1,64"
route:
  ospf:
    pro: 1
    area: 0.0.0.0
  bgp:
    as_num: 65001
acast_gw_mac: 0000.2222.3333
adv:
  nve_hold_time: 120
  route:
    ospf_hello: 2
    bgp_timers: [3, 9]
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
    rtr: {num: 1, descr: "LP > Routing protocol RID and peerings"}
    vtep: {num: 2, descr: "LP > VTEP Tunnels (PIP) and MLAG (VIP)"}
    bgw: {num: 3, descr: "LP > BGW anycast address"}
  mlag:
    domain: 1
    peer_po: 1
    peer_vlan: 2
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
"#;

const TENANT: &str = r#"
tnt:
  - tenant_name: BLU
    l3_tenant: True
    vlans:
      - num: 110
        name: blu_web
        ip_addr: 10.10.110.1/24
  - tenant_name: RED
    l3_tenant: True
    vlans:
      - num: 310
        name: red_dmz
        ip_addr: 10.30.10.1/24
        create_on_leaf: True
        create_on_border: True
adv:
  bse_vni:
    tnt_vlan: 3001
    l3vni: 1003001
    l2vni: 10000
  vni_incre:
    tnt_vlan: 1
    l3vni: 1
    l2vni: 10000
  redist:
    rm_name: RM_src_to_dst
"#;

const INTERFACE: &str = r#"
intf:
  single_homed:
    - descr: "UPLINK > GTT Internet"
      type: layer3
      ip_vlan: 10.255.99.1/30
      switch: [DC1-N9K-BORDER01]
      tenant: RED
  dual_homed:
    - descr: "ACCESS > ESX01"
      type: stp_trunk
      ip_vlan: "110"
      switch: [DC1-N9K-LEAF01]
adv:
  single_homed:
    first_intf: 33
    last_intf: 40
    first_lp: 11
    last_lp: 20
  dual_homed:
    first_intf: 41
    last_intf: 48
    first_po: 41
    last_po: 48
"#;

const ROUTE: &str = r#"
bgp:
  group:
    - name: INET
      switch: [DC1-N9K-BORDER01]
      remote_as: 65100
      update_source: loopback1
      peer:
        - name: GTT
          descr: "GTT Internet peering"
          peer_ip: 10.255.99.2
          tenant: [RED]
  tnt_advertise:
    - name: RED
      switch: [DC1-N9K-BORDER01]
      network:
        - prefix: [10.30.10.0/24]
ospf:
  - process: 99
    tenant: RED
    switch: [DC1-N9K-BORDER01, DC1-N9K-BORDER02]
    rid: [192.168.1.1, 192.168.1.2]
    interface:
      - name: [Vlan310]
        area: 0.0.0.0
static_route:
  - tenant: [RED]
    switch: [DC1-N9K-BORDER01]
    route:
      - prefix: [10.99.0.0/16]
        gateway: 10.255.99.2
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

fn write_vars(dir: &Path) {
    for (file, content) in [
        ("base.yml", BASE),
        ("fabric.yml", FABRIC),
        ("service_tenant.yml", TENANT),
        ("service_interface.yml", INTERFACE),
        ("service_route.yml", ROUTE),
    ] {
        fs::write(dir.join(file), content).unwrap();
    }
}

fn run_pipeline(vars_dir: &Path, output_dir: &Path) {
    let args = Args {
        vars_dir: vars_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        format: OutputFormat::Yaml,
        check: false,
        skip_validate: false,
    };
    orchestrator::run(&args).unwrap();
}

fn load_yaml(path: &Path) -> Value {
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_pipeline_emits_inventory_and_models() {
    let tmp = tempfile::tempdir().unwrap();
    let vars_dir = tmp.path().join("vars");
    let output_dir = tmp.path().join("output");
    fs::create_dir(&vars_dir).unwrap();
    write_vars(&vars_dir);

    run_pipeline(&vars_dir, &output_dir);

    let inventory = load_yaml(&output_dir.join("inventory.yml"));
    let devices = inventory["devices"].as_sequence().unwrap();
    assert_eq!(devices.len(), 8);
    let names: Vec<&str> = devices
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"DC1-N9K-SPINE01"));
    assert!(names.contains(&"DC1-N9K-LEAF04"));
    assert!(names.contains(&"DC1-N9K-BORDER02"));
    assert_eq!(
        inventory["groups"]["leaf"].as_sequence().unwrap().len(),
        4
    );

    for name in &names {
        assert!(output_dir.join(format!("host_vars/{name}.yml")).exists());
    }
}

#[test]
fn test_leaf_model_addresses_and_services() {
    let tmp = tempfile::tempdir().unwrap();
    let vars_dir = tmp.path().join("vars");
    let output_dir = tmp.path().join("output");
    fs::create_dir(&vars_dir).unwrap();
    write_vars(&vars_dir);

    run_pipeline(&vars_dir, &output_dir);

    let leaf = load_yaml(&output_dir.join("host_vars/DC1-N9K-LEAF01.yml"));
    assert_eq!(leaf["mgmt_ip"].as_str(), Some("10.10.108.21"));
    assert_eq!(leaf["vlan_range"].as_str(), Some("1-2,110,310,3001-3002"));
    assert_eq!(leaf["tenants"].as_sequence().unwrap().len(), 2);

    // The dual homed trunk lands on the first dual homed port with a
    // matching port-channel.
    let intf_names: Vec<&str> = leaf["interfaces"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(intf_names, vec!["Ethernet1/41", "port-channel41"]);

    // Unused ports skip fabric uplinks, peer-link members and the
    // allocated service port.
    let unused: Vec<&str> = leaf["unused_interfaces"]
        .as_sequence()
        .unwrap()
        .iter()
        .map(|i| i.as_str().unwrap())
        .collect();
    assert_eq!(unused[0], "Ethernet1/3");
    assert!(!unused.contains(&"Ethernet1/1"));
    assert!(!unused.contains(&"Ethernet1/11"));
    assert!(!unused.contains(&"Ethernet1/41"));
    assert!(unused.contains(&"Ethernet1/64"));
}

#[test]
fn test_border_model_routing() {
    let tmp = tempfile::tempdir().unwrap();
    let vars_dir = tmp.path().join("vars");
    let output_dir = tmp.path().join("output");
    fs::create_dir(&vars_dir).unwrap();
    write_vars(&vars_dir);

    run_pipeline(&vars_dir, &output_dir);

    let border = load_yaml(&output_dir.join("host_vars/DC1-N9K-BORDER01.yml"));
    let routing = &border["routing"];
    let procs = routing["ospf_proc"].as_mapping().unwrap();
    assert_eq!(procs.len(), 1);
    assert_eq!(routing["ospf_proc"]["99"]["rid"].as_str(), Some("192.168.1.1"));
    assert!(routing["bgp_groups"]
        .as_mapping()
        .unwrap()
        .contains_key(Value::String("INET".to_string())));
    let statics = routing["static_routes"].as_mapping().unwrap();
    assert!(statics.contains_key(Value::String("RED".to_string())));

    // The other MLAG member gets the second RID and no BGP group.
    let border2 = load_yaml(&output_dir.join("host_vars/DC1-N9K-BORDER02.yml"));
    assert_eq!(
        border2["routing"]["ospf_proc"]["99"]["rid"].as_str(),
        Some("192.168.1.2")
    );
    assert!(border2["routing"]["bgp_groups"]
        .as_mapping()
        .unwrap()
        .is_empty());
}

#[test]
fn test_runs_are_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    let vars_dir = tmp.path().join("vars");
    fs::create_dir(&vars_dir).unwrap();
    write_vars(&vars_dir);

    let out_a = tmp.path().join("out_a");
    let out_b = tmp.path().join("out_b");
    run_pipeline(&vars_dir, &out_a);
    run_pipeline(&vars_dir, &out_b);

    for file in ["inventory.yml", "host_vars/DC1-N9K-LEAF03.yml"] {
        let a = fs::read_to_string(out_a.join(file)).unwrap();
        let b = fs::read_to_string(out_b.join(file)).unwrap();
        assert_eq!(a, b, "{file} differs between runs");
    }
}

#[test]
fn test_invalid_input_aborts_before_writing() {
    let tmp = tempfile::tempdir().unwrap();
    let vars_dir = tmp.path().join("vars");
    let output_dir = tmp.path().join("output");
    fs::create_dir(&vars_dir).unwrap();
    write_vars(&vars_dir);
    // Clashing VLAN number across tenants.
    fs::write(
        vars_dir.join("service_tenant.yml"),
        TENANT.replace("num: 310", "num: 110"),
    )
    .unwrap();

    let args = Args {
        vars_dir,
        output_dir: output_dir.clone(),
        format: OutputFormat::Yaml,
        check: false,
        skip_validate: false,
    };
    let err = orchestrator::run(&args).unwrap_err();
    assert!(err.to_string().contains("Input validation failed"));
    assert!(!output_dir.exists());
}
