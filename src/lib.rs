//! Resolve declared host-group topologies into concrete group membership.
//!
//! Pipeline: inventory declarations -> [`spec::GroupTable`] ->
//! [`resolve::resolve`] -> [`validate::validate`] -> [`model::TopologyReport`].

pub mod diagnostics;
pub mod model;
pub mod render;
pub mod resolve;
pub mod spec;
pub mod validate;

pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use model::{TopologyReport, TopologyStore, build_report};
pub use resolve::{GroupResolution, Resolution, resolve, resolve_group};
pub use spec::{Declaration, GroupTable, HostName, PolicySpec};
pub use validate::validate;

pub type Result<T> = anyhow::Result<T>;

/// Load a table from declarations and build its report under `policy`.
pub fn resolve_topology(declarations: &[Declaration], policy: &PolicySpec) -> Result<TopologyReport> {
    let table = GroupTable::load(declarations)?;
    let policy = policy.validate_and_build(&table)?;
    Ok(build_report(&table, &policy))
}
