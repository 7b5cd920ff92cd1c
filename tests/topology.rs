//! End-to-end resolution of the lab topology fixtures under demos/.

use pretty_assertions::assert_eq;
use std::path::PathBuf;
use topology_resolver::render::{render_ini_inventory, render_json_report};
use topology_resolver::spec::{load_inventories, select_policy};
use topology_resolver::{
    Declaration, DiagnosticKind, GroupTable, PolicySpec, Severity, TopologyReport, resolve_group,
    resolve_topology,
};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos").join(name)
}

fn report_for(files: &[&str], policy: Option<&str>) -> TopologyReport {
    let paths: Vec<PathBuf> = files.iter().map(|f| demo(f)).collect();
    let loaded = load_inventories(&paths).unwrap();
    let policy = select_policy(loaded.policy, policy.map(demo).as_deref()).unwrap();
    resolve_topology(&loaded.declarations, &policy).unwrap()
}

fn members(report: &TopologyReport, group: &str) -> Vec<String> {
    report
        .members(group)
        .unwrap_or_else(|| panic!("group {} missing", group))
        .iter()
        .map(|h| h.to_string())
        .collect()
}

fn kinds(report: &TopologyReport) -> Vec<DiagnosticKind> {
    report.diagnostics.iter().map(|d| d.kind).collect()
}

#[test]
fn lab_topology_flattens_every_group() {
    let report = report_for(&["lab_topology.json"], None);

    assert_eq!(members(&report, "private_network_clients"), vec!["client-1", "client-2"]);
    assert_eq!(
        members(&report, "simulated_internet"),
        vec!["client-router", "company-router-public"]
    );
    assert_eq!(
        members(&report, "company_public_network"),
        vec![
            "agent-node-1",
            "agent-node-2",
            "company-router-private",
            "company-router-public",
        ]
    );
    assert_eq!(
        members(&report, "clients"),
        vec![
            "agent-node-1",
            "agent-node-2",
            "client-1",
            "client-2",
            "control-node-ansible",
            "control-node-k8s",
        ]
    );
    assert_eq!(
        members(&report, "gateways"),
        vec!["client-router", "company-router-private", "company-router-public"]
    );
    assert_eq!(
        members(&report, "k8s-members"),
        vec!["agent-node-1", "agent-node-2", "control-node-k8s"]
    );

    assert_eq!(report.summary.hosts, 9);
    assert_eq!(members(&report, "all").len(), 9);
    // 13 declared groups plus the implicit one.
    assert_eq!(report.summary.groups, 14);

    assert_eq!(
        kinds(&report),
        vec![DiagnosticKind::InvalidGroupName, DiagnosticKind::InvalidGroupName]
    );
    assert_eq!(report.worst_severity(), Some(Severity::Warning));
}

#[test]
fn lab_policy_finds_unrouted_private_clients() {
    let report = report_for(&["lab_topology.json"], Some("lab_policy.json"));

    let orphans: Vec<String> = report
        .diagnostics_of(DiagnosticKind::Orphan)
        .map(|d| d.hosts[0].to_string())
        .collect();
    assert_eq!(orphans, vec!["client-1", "client-2"]);
    assert_eq!(report.diagnostics_of(DiagnosticKind::DuplicateConflict).count(), 0);
    assert!(!report.fails(Some(Severity::Error)));
}

#[test]
fn stray_token_is_one_dangling_reference() {
    let report = report_for(&["lab_topology_drift.json"], None);

    let dangling: Vec<_> = report
        .diagnostics_of(DiagnosticKind::DanglingReference)
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].groups, vec!["gateways", "company-router-private"]);

    assert_eq!(
        members(&report, "gateways"),
        vec!["client-router", "company-router-public"]
    );
    assert_eq!(members(&report, "company_private_network").len(), 3);
    assert!(report.members("simulated_internet").is_none());
    assert!(report.fails(Some(Severity::Error)));
}

#[test]
fn concatenated_drifting_copies_flag_the_redeclared_group() {
    let report = report_for(&["lab_topology.json", "lab_topology_drift.json"], None);

    let redeclared: Vec<_> = report
        .diagnostics_of(DiagnosticKind::RedeclarationConflict)
        .collect();
    assert_eq!(redeclared.len(), 1);
    assert_eq!(redeclared[0].groups, vec!["gateways"]);
    assert_eq!(report.diagnostics_of(DiagnosticKind::DanglingReference).count(), 1);

    // Contents are unioned, not replaced.
    assert_eq!(
        members(&report, "gateways"),
        vec!["client-router", "company-router-private", "company-router-public"]
    );
    assert!(report.members("simulated_internet").is_some());
}

#[test]
fn exclusive_leaf_roles_conflict() {
    let decls = [
        Declaration::members("lan_clients", &["client-[1:3]"]),
        Declaration::members("lan_gateway", &["client-3"]),
        Declaration::children("clients", &["lan_clients"]),
        Declaration::children("gateways", &["lan_gateway"]),
    ];
    let policy = PolicySpec {
        exclusive: vec![vec!["lan_clients".into(), "lan_gateway".into()]],
        ..PolicySpec::default()
    };
    let report = resolve_topology(&decls, &policy).unwrap();

    assert_eq!(kinds(&report), vec![DiagnosticKind::DuplicateConflict]);
    assert_eq!(report.diagnostics[0].hosts[0].as_str(), "client-3");
}

#[test]
fn chain_scenario_with_undeclared_child() {
    let decls = [
        Declaration::members("A", &["h-[1:2]"]),
        Declaration::children("B", &["A"]),
        Declaration::children("C", &["B", "Z"]),
    ];
    let report = resolve_topology(&decls, &PolicySpec::default()).unwrap();

    for g in ["A", "B", "C"] {
        assert_eq!(members(&report, g), vec!["h-1", "h-2"]);
    }
    assert_eq!(kinds(&report), vec![DiagnosticKind::DanglingReference]);
    assert!(report.diagnostics[0].message.contains("'Z'"));
}

#[test]
fn cycle_leaves_unrelated_groups_intact() {
    let decls = [
        Declaration::children("A", &["B"]),
        Declaration::children("B", &["A"]),
        Declaration::members("leaf", &["n-[1:3]"]),
        Declaration::children("top", &["leaf"]),
    ];
    let report = resolve_topology(&decls, &PolicySpec::default()).unwrap();

    assert!(members(&report, "A").is_empty());
    assert!(members(&report, "B").is_empty());
    assert_eq!(members(&report, "top"), vec!["n-1", "n-2", "n-3"]);
    assert_eq!(kinds(&report), vec![DiagnosticKind::Cycle]);
}

#[test]
fn oversized_range_is_malformed_and_siblings_resolve() {
    let decls = [
        Declaration::members("huge", &["h-[0:18446744073709551615]"]),
        Declaration::members("small", &["n-[1:2]"]),
    ];
    let report = resolve_topology(&decls, &PolicySpec::default()).unwrap();

    assert_eq!(kinds(&report), vec![DiagnosticKind::MalformedPattern]);
    assert_eq!(report.diagnostics[0].groups, vec!["huge"]);
    assert_eq!(members(&report, "small"), vec!["n-1", "n-2"]);
    assert!(members(&report, "huge").is_empty());
}

#[test]
fn single_group_lookup_on_lab_inventories() {
    let loaded = load_inventories(&[demo("lab_topology.json")]).unwrap();
    let table = GroupTable::load(&loaded.declarations).unwrap();

    let k8s = resolve_group(&table, "k8s-members").unwrap();
    let hosts: Vec<&str> = k8s.hosts.iter().map(|h| h.as_str()).collect();
    assert_eq!(hosts, vec!["agent-node-1", "agent-node-2", "control-node-k8s"]);
    assert!(k8s.diagnostics.is_empty());
    assert!(resolve_group(&table, "no_such_group").is_none());

    let drifted = load_inventories(&[demo("lab_topology_drift.json")]).unwrap();
    let table = GroupTable::load(&drifted.declarations).unwrap();
    let gateways = resolve_group(&table, "gateways").unwrap();
    let hosts: Vec<&str> = gateways.hosts.iter().map(|h| h.as_str()).collect();
    assert_eq!(hosts, vec!["client-router", "company-router-public"]);
    assert_eq!(gateways.diagnostics.len(), 1);
    assert_eq!(gateways.diagnostics[0].kind, DiagnosticKind::DanglingReference);
}

#[test]
fn rendering_is_byte_stable() {
    let a = report_for(&["lab_topology.json"], Some("lab_policy.json"));
    let b = report_for(&["lab_topology.json"], Some("lab_policy.json"));

    assert_eq!(render_json_report(&a).unwrap(), render_json_report(&b).unwrap());
    assert_eq!(render_ini_inventory(&a), render_ini_inventory(&b));
    assert!(render_ini_inventory(&a).starts_with("[clients]\nagent-node-1\n"));
}
