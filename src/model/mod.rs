//! Report model: resolved membership + diagnostics for one table snapshot.

pub mod store;

pub use store::TopologyStore;

use crate::diagnostics::{self, Diagnostic, DiagnosticKind, Severity};
use crate::resolve;
use crate::spec::{GroupName, GroupTable, HostName, ValidationPolicy};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Name of the implicit group holding every declared host.
pub const ALL_GROUP: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologyReport {
    pub groups: BTreeMap<GroupName, Vec<HostName>>,
    pub diagnostics: Vec<Diagnostic>,
    pub summary: SummaryView,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub groups: usize,
    pub hosts: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl TopologyReport {
    pub fn members(&self, group: &str) -> Option<&[HostName]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn worst_severity(&self) -> Option<Severity> {
        diagnostics::worst_severity(&self.diagnostics)
    }

    /// True when a diagnostic at or above `threshold` is present.
    pub fn fails(&self, threshold: Option<Severity>) -> bool {
        match (threshold, self.worst_severity()) {
            (Some(t), Some(worst)) => worst >= t,
            _ => false,
        }
    }
}

/// Resolve, validate and assemble the report for one table.
pub fn build_report(table: &GroupTable, policy: &ValidationPolicy) -> TopologyReport {
    let resolution = resolve::resolve(table);
    let diagnostics = crate::validate::validate(table, &resolution, policy);

    let all_hosts: BTreeSet<&HostName> = resolution.literals.values().flatten().collect();
    let hosts = all_hosts.len();

    let mut groups = resolution.groups;
    if !table.contains(ALL_GROUP) {
        groups.insert(
            ALL_GROUP.to_string(),
            all_hosts.into_iter().cloned().collect(),
        );
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    let summary = SummaryView {
        groups: groups.len(),
        hosts,
        errors,
        warnings: diagnostics.len() - errors,
    };
    info!(
        "topology: {} groups, {} hosts, {} errors, {} warnings",
        summary.groups, summary.hosts, summary.errors, summary.warnings
    );

    TopologyReport {
        groups,
        diagnostics,
        summary,
    }
}
