//! Structural checks over a resolved topology.
//!
//! Only reads the table and the resolution; findings are returned as one
//! normalized diagnostic list that also carries the resolver's own findings.

use crate::diagnostics::{self, Diagnostic};
use crate::resolve::Resolution;
use crate::spec::{GroupName, GroupTable, HostName, ValidationPolicy};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

static GROUP_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("group name regex is valid")
});

pub fn validate(
    table: &GroupTable,
    resolution: &Resolution,
    policy: &ValidationPolicy,
) -> Vec<Diagnostic> {
    let mut out = resolution.diagnostics.clone();
    out.extend(check_references(table));
    out.extend(check_exclusive(resolution, policy));
    out.extend(check_orphans(resolution, policy));
    out.extend(
        table
            .redeclarations()
            .iter()
            .map(Diagnostic::redeclaration),
    );
    if policy.check_group_names {
        out.extend(check_group_names(table));
    }
    diagnostics::normalize(out)
}

/// Every child reference must name a declared group.
fn check_references(table: &GroupTable) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for (name, def) in table.iter() {
        for child in def.children() {
            if !table.contains(child) {
                out.push(Diagnostic::dangling_reference(name, child));
            }
        }
    }
    out
}

/// A host may appear as a literal member of at most one group per exclusive
/// set.
fn check_exclusive(resolution: &Resolution, policy: &ValidationPolicy) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for set in &policy.exclusive {
        let mut owner: BTreeMap<&HostName, &GroupName> = BTreeMap::new();
        for group in set {
            let Some(hosts) = resolution.literals.get(group) else {
                continue;
            };
            for host in hosts {
                if let Some(prev) = owner.insert(host, group) {
                    out.push(Diagnostic::duplicate_conflict(host, prev, group));
                    owner.insert(host, prev);
                }
            }
        }
    }
    out
}

/// Hosts of the orphan scope must be reachable from at least one root.
fn check_orphans(resolution: &Resolution, policy: &ValidationPolicy) -> Vec<Diagnostic> {
    if policy.orphan_scope.is_empty() {
        return Vec::new();
    }

    let reachable: BTreeSet<&HostName> = policy
        .roots
        .iter()
        .filter_map(|r| resolution.groups.get(r))
        .flatten()
        .collect();

    let scoped: BTreeSet<&HostName> = policy
        .orphan_scope
        .iter()
        .filter_map(|g| resolution.groups.get(g))
        .flatten()
        .collect();

    scoped
        .into_iter()
        .filter(|h| !reachable.contains(h))
        .map(|h| Diagnostic::orphan(h, &policy.orphan_scope))
        .collect()
}

fn check_group_names(table: &GroupTable) -> Vec<Diagnostic> {
    table
        .names()
        .filter(|n| !GROUP_NAME_RE.is_match(n))
        .map(|n| Diagnostic::invalid_group_name(n))
        .collect()
}
