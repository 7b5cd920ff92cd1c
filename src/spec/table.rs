//! Group table: declarations normalized into one definition per group.
//!
//! A trailing `:children` marker (or the explicit composite flag) turns a
//! declaration into a child list. Members and children declared under the
//! same base name merge into a hybrid definition. Later declarations append
//! to earlier ones; first-seen order is kept.

use crate::spec::{Declaration, GroupName};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

pub const CHILDREN_SUFFIX: &str = ":children";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("declaration #{index} has an empty group name")]
    EmptyName { index: usize },

    #[error("group name '{0}' contains whitespace")]
    Whitespace(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Members,
    Children,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupDefinition {
    /// Literal host patterns, not yet expanded.
    Members(Vec<String>),
    Children(Vec<GroupName>),
    Hybrid {
        members: Vec<String>,
        children: Vec<GroupName>,
    },
}

impl GroupDefinition {
    pub fn members(&self) -> &[String] {
        match self {
            GroupDefinition::Members(m) | GroupDefinition::Hybrid { members: m, .. } => m,
            GroupDefinition::Children(_) => &[],
        }
    }

    pub fn children(&self) -> &[GroupName] {
        match self {
            GroupDefinition::Children(c) | GroupDefinition::Hybrid { children: c, .. } => c,
            GroupDefinition::Members(_) => &[],
        }
    }

    pub fn is_composite(&self) -> bool {
        !matches!(self, GroupDefinition::Members(_))
    }

    fn new(kind: DeclarationKind, tokens: &[String]) -> Self {
        let tokens = dedup_in_order(Vec::new(), tokens);
        match kind {
            DeclarationKind::Members => GroupDefinition::Members(tokens),
            DeclarationKind::Children => GroupDefinition::Children(tokens),
        }
    }

    fn append(self, kind: DeclarationKind, tokens: &[String]) -> Self {
        let (members, children) = match self {
            GroupDefinition::Members(m) => (Some(m), None),
            GroupDefinition::Children(c) => (None, Some(c)),
            GroupDefinition::Hybrid { members, children } => (Some(members), Some(children)),
        };
        let (members, children) = match kind {
            DeclarationKind::Members => (
                Some(dedup_in_order(members.unwrap_or_default(), tokens)),
                children,
            ),
            DeclarationKind::Children => (
                members,
                Some(dedup_in_order(children.unwrap_or_default(), tokens)),
            ),
        };
        match (members, children) {
            (Some(members), Some(children)) => GroupDefinition::Hybrid { members, children },
            (Some(members), None) => GroupDefinition::Members(members),
            (None, Some(children)) => GroupDefinition::Children(children),
            (None, None) => GroupDefinition::Members(Vec::new()),
        }
    }
}

fn dedup_in_order(mut existing: Vec<String>, tokens: &[String]) -> Vec<String> {
    for t in tokens {
        if !existing.contains(t) {
            existing.push(t.clone());
        }
    }
    existing
}

/// A group declared more than once (same kind) with different contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeclaration {
    pub group: GroupName,
    pub kind: DeclarationKind,
    pub first: Vec<String>,
    pub conflicting: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupTable {
    groups: BTreeMap<GroupName, GroupDefinition>,
    redeclarations: Vec<Redeclaration>,
}

impl GroupTable {
    pub fn load(declarations: &[Declaration]) -> Result<Self, TableError> {
        let mut groups: BTreeMap<GroupName, GroupDefinition> = BTreeMap::new();
        let mut first_seen: BTreeMap<(GroupName, DeclarationKind), Vec<String>> = BTreeMap::new();
        let mut redeclarations = Vec::new();
        let mut flagged: BTreeSet<(GroupName, DeclarationKind)> = BTreeSet::new();

        for (index, decl) in declarations.iter().enumerate() {
            let (base, kind) = match decl.name.strip_suffix(CHILDREN_SUFFIX) {
                Some(base) => (base, DeclarationKind::Children),
                None if decl.composite => (decl.name.as_str(), DeclarationKind::Children),
                None => (decl.name.as_str(), DeclarationKind::Members),
            };
            let base = base.trim();
            if base.is_empty() {
                return Err(TableError::EmptyName { index });
            }
            if base.chars().any(char::is_whitespace) {
                return Err(TableError::Whitespace(base.to_string()));
            }

            let key = (base.to_string(), kind);
            match first_seen.get(&key) {
                None => {
                    first_seen.insert(key, decl.tokens.clone());
                }
                Some(first) => {
                    if !same_multiset(first, &decl.tokens) && flagged.insert(key.clone()) {
                        redeclarations.push(Redeclaration {
                            group: base.to_string(),
                            kind,
                            first: first.clone(),
                            conflicting: decl.tokens.clone(),
                        });
                    } else {
                        debug!("group '{}' redeclared ({:?})", base, kind);
                    }
                }
            }

            let def = match groups.remove(base) {
                Some(existing) => existing.append(kind, &decl.tokens),
                None => GroupDefinition::new(kind, &decl.tokens),
            };
            groups.insert(base.to_string(), def);
        }

        Ok(Self {
            groups,
            redeclarations,
        })
    }

    pub fn get(&self, name: &str) -> Option<&GroupDefinition> {
        self.groups.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Groups in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&GroupName, &GroupDefinition)> {
        self.groups.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &GroupName> {
        self.groups.keys()
    }

    pub fn redeclarations(&self) -> &[Redeclaration] {
        &self.redeclarations
    }

    /// Composite groups that no other composite lists as a child.
    pub fn inferred_roots(&self) -> Vec<GroupName> {
        let referenced: BTreeSet<&str> = self
            .groups
            .iter()
            .filter(|(_, def)| def.is_composite())
            .flat_map(|(name, def)| {
                def.children()
                    .iter()
                    .filter(move |c| c.as_str() != name.as_str())
                    .map(String::as_str)
            })
            .collect();

        self.groups
            .iter()
            .filter(|(name, def)| def.is_composite() && !referenced.contains(name.as_str()))
            .map(|(name, _)| name.clone())
            .collect()
    }
}

fn same_multiset(a: &[String], b: &[String]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}
