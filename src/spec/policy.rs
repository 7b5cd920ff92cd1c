//! Validation policy: topology-specific rules that are not structural.
//!
//! JSON shape:
//! {
//!   "exclusive": [["private_network_clients", "private_network_gateway"]],
//!   "roots": ["simulated_internet", "company_public_network"],   // optional
//!   "orphan_scope": ["clients", "gateways"],                     // default
//!   "check_group_names": true                                    // default
//! }
//!
//! `roots` left empty means: every composite group that no other composite
//! lists as a child.

use crate::Result;
use crate::spec::{GroupName, GroupTable};
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySpec {
    /// Sets of leaf groups whose literal members must not overlap.
    #[serde(default)]
    pub exclusive: Vec<Vec<GroupName>>,

    #[serde(default)]
    pub roots: Vec<GroupName>,

    #[serde(default = "default_orphan_scope")]
    pub orphan_scope: Vec<GroupName>,

    #[serde(default = "default_true")]
    pub check_group_names: bool,
}

impl Default for PolicySpec {
    fn default() -> Self {
        Self {
            exclusive: Vec::new(),
            roots: Vec::new(),
            orphan_scope: default_orphan_scope(),
            check_group_names: true,
        }
    }
}

fn default_orphan_scope() -> Vec<GroupName> {
    vec!["clients".to_string(), "gateways".to_string()]
}

fn default_true() -> bool {
    true
}

/// Policy checked against a concrete table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub exclusive: Vec<BTreeSet<GroupName>>,
    pub roots: Vec<GroupName>,
    pub orphan_scope: Vec<GroupName>,
    pub check_group_names: bool,
}

impl PolicySpec {
    /// Resolve policy entries against the table:
    /// - explicit roots must be declared groups
    /// - exclusive sets need at least two distinct groups
    /// - undeclared groups in exclusive sets or the orphan scope are dropped
    ///   with a warning
    pub fn validate_and_build(&self, table: &GroupTable) -> Result<ValidationPolicy> {
        let roots = if self.roots.is_empty() {
            table.inferred_roots()
        } else {
            for r in &self.roots {
                if !table.contains(r) {
                    bail!("policy roots references undeclared group: {}", r);
                }
            }
            let mut roots = self.roots.clone();
            roots.sort();
            roots.dedup();
            roots
        };

        let mut exclusive = Vec::new();
        for set in &self.exclusive {
            let distinct: BTreeSet<GroupName> = set.iter().cloned().collect();
            if distinct.len() < 2 {
                bail!(
                    "policy exclusive set needs at least two distinct groups: {:?}",
                    set
                );
            }
            let declared: BTreeSet<GroupName> = distinct
                .into_iter()
                .filter(|g| {
                    let known = table.contains(g);
                    if !known {
                        warn!("policy exclusive set names undeclared group '{}'", g);
                    }
                    known
                })
                .collect();
            if declared.len() >= 2 {
                exclusive.push(declared);
            }
        }

        let orphan_scope = self
            .orphan_scope
            .iter()
            .filter(|g| {
                let known = table.contains(g);
                if !known {
                    warn!("policy orphan_scope names undeclared group '{}'", g);
                }
                known
            })
            .cloned()
            .collect();

        Ok(ValidationPolicy {
            exclusive,
            roots,
            orphan_scope,
            check_group_names: self.check_group_names,
        })
    }
}

pub fn load_policy_file(path: &Path) -> Result<PolicySpec> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read policy file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse policy file {}", path.display()))
}

/// A policy file replaces any policy embedded in the inventories; with
/// neither, the defaults apply.
pub fn select_policy(embedded: Option<PolicySpec>, file: Option<&Path>) -> Result<PolicySpec> {
    match file {
        Some(path) => {
            if embedded.is_some() {
                debug!("policy file {} replaces embedded policy", path.display());
            }
            load_policy_file(path)
        }
        None => Ok(embedded.unwrap_or_default()),
    }
}
