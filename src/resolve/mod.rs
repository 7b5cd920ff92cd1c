//! Topology resolution: flatten every group to its concrete hosts.
//!
//! Depth-first walk over an index of the table (one slot per group, children
//! referenced by slot id). Each slot is resolved at most once and memoized.
//! A child that is already on the active path is a cycle: it is recorded and
//! skipped, so the walk always terminates and groups on the cycle keep a
//! partial membership.
//!
//! All walk state lives in a per-call `Resolver`; the table is only read.

use crate::diagnostics::{self, Diagnostic};
use crate::spec::{GroupName, GroupTable, HostName, HostPattern, PatternError};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info};

/// Output of a full resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Flattened membership, hosts in ascending order.
    pub groups: BTreeMap<GroupName, Vec<HostName>>,
    /// Hosts each group declares directly through its own member patterns.
    pub literals: BTreeMap<GroupName, Vec<HostName>>,
    /// Groups lying on at least one detected cycle.
    pub cyclic: BTreeSet<GroupName>,
    /// MalformedPattern, DanglingReference and Cycle findings.
    pub diagnostics: Vec<Diagnostic>,
}

/// Output of a single-group query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResolution {
    pub hosts: Vec<HostName>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

struct Resolver<'t> {
    table: &'t GroupTable,
    names: Vec<&'t GroupName>,
    ids: HashMap<&'t str, usize>,
    marks: Vec<Mark>,
    resolved: Vec<BTreeSet<HostName>>,
    literals: Vec<BTreeSet<HostName>>,
    stack: Vec<usize>,
    cyclic: BTreeSet<usize>,
    expansions: HashMap<&'t str, Result<Vec<HostName>, PatternError>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'t> Resolver<'t> {
    fn new(table: &'t GroupTable) -> Self {
        let names: Vec<&GroupName> = table.names().collect();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();
        let n = names.len();
        Self {
            table,
            names,
            ids,
            marks: vec![Mark::Unvisited; n],
            resolved: vec![BTreeSet::new(); n],
            literals: vec![BTreeSet::new(); n],
            stack: Vec::new(),
            cyclic: BTreeSet::new(),
            expansions: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    fn expand_token(&mut self, token: &'t str) -> Result<Vec<HostName>, PatternError> {
        self.expansions
            .entry(token)
            .or_insert_with(|| HostPattern::parse(token).map(|p| p.expand()))
            .clone()
    }

    fn resolve_id(&mut self, g: usize) {
        if self.marks[g] != Mark::Unvisited {
            return;
        }
        self.marks[g] = Mark::Active;
        self.stack.push(g);

        let table = self.table;
        let name = self.names[g];
        let Some(def) = table.get(name) else {
            // Every indexed name comes from the table.
            self.stack.pop();
            self.marks[g] = Mark::Done;
            return;
        };

        let mut acc: BTreeSet<HostName> = BTreeSet::new();

        for token in def.members() {
            match self.expand_token(token) {
                Ok(hosts) => {
                    self.literals[g].extend(hosts.iter().cloned());
                    acc.extend(hosts);
                }
                Err(err) => {
                    self.diagnostics
                        .push(Diagnostic::malformed_pattern(name, token, &err));
                }
            }
        }

        for child in def.children() {
            let Some(&c) = self.ids.get(child.as_str()) else {
                self.diagnostics
                    .push(Diagnostic::dangling_reference(name, child));
                continue;
            };
            match self.marks[c] {
                Mark::Active => self.record_cycle(c),
                Mark::Unvisited => {
                    self.resolve_id(c);
                    acc.extend(self.resolved[c].iter().cloned());
                }
                Mark::Done => acc.extend(self.resolved[c].iter().cloned()),
            }
        }

        debug!("resolved group '{}' ({} hosts)", name, acc.len());
        self.stack.pop();
        self.resolved[g] = acc;
        self.marks[g] = Mark::Done;
    }

    /// `c` is on the active path; the cycle is the stack suffix starting at it.
    fn record_cycle(&mut self, c: usize) {
        let start = self.stack.iter().rposition(|&id| id == c).unwrap_or(0);
        let mut path: Vec<GroupName> = Vec::new();
        for &id in &self.stack[start..] {
            self.cyclic.insert(id);
            path.push(self.names[id].clone());
        }
        path.push(self.names[c].clone());
        self.diagnostics.push(Diagnostic::cycle(path));
    }

    fn sorted(set: &BTreeSet<HostName>) -> Vec<HostName> {
        set.iter().cloned().collect()
    }
}

/// Resolve every group in the table.
pub fn resolve(table: &GroupTable) -> Resolution {
    let mut r = Resolver::new(table);
    for g in 0..r.names.len() {
        r.resolve_id(g);
    }

    let mut groups = BTreeMap::new();
    let mut literals = BTreeMap::new();
    for (g, name) in r.names.iter().enumerate() {
        groups.insert((*name).clone(), Resolver::sorted(&r.resolved[g]));
        literals.insert((*name).clone(), Resolver::sorted(&r.literals[g]));
    }
    let cyclic = r.cyclic.iter().map(|&g| r.names[g].clone()).collect();
    let diagnostics = diagnostics::normalize(r.diagnostics);

    info!(
        "resolved {} groups ({} findings)",
        groups.len(),
        diagnostics.len()
    );

    Resolution {
        groups,
        literals,
        cyclic,
        diagnostics,
    }
}

/// Resolve one group on a fresh pass. A group that lies on a cycle through
/// itself is reported with no hosts. Returns `None` for undeclared names.
pub fn resolve_group(table: &GroupTable, name: &str) -> Option<GroupResolution> {
    let mut r = Resolver::new(table);
    let &g = r.ids.get(name)?;
    r.resolve_id(g);

    let hosts = if r.cyclic.contains(&g) {
        Vec::new()
    } else {
        Resolver::sorted(&r.resolved[g])
    };
    Some(GroupResolution {
        hosts,
        diagnostics: diagnostics::normalize(r.diagnostics),
    })
}
