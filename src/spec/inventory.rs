//! Inventory document (inventory.json).
//!
//! JSON shape, mirroring the provisioning tool's groups map:
//! {
//!   "groups": {
//!     "private_network_clients": ["client-[1:2]"],
//!     "clients:children": ["private_network_clients", "company_public_network_nodes"],
//!     "k8s-members": ["control-node-k8s"],
//!     "k8s-members:children": ["k8s-workers"]
//!   },
//!   "declarations": [                       // optional explicit form
//!     { "name": "lab", "tokens": ["gateways"], "composite": true }
//!   ],
//!   "policy": { ... }                       // optional, see policy.rs
//! }
//!
//! Keys in `groups` are kept in document order, duplicates included, so a
//! group declared twice can be reported instead of silently overwritten.

use crate::Result;
use crate::spec::PolicySpec;
use anyhow::Context;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// One declaration as written: a key (possibly carrying `:children`) and
/// its tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub tokens: Vec<String>,
    /// Explicit composite flag. A `:children` suffix on `name` implies it.
    pub composite: bool,
}

impl Declaration {
    pub fn members(name: impl Into<String>, tokens: &[&str]) -> Self {
        Self {
            name: name.into(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            composite: false,
        }
    }

    pub fn children(name: impl Into<String>, tokens: &[&str]) -> Self {
        Self {
            composite: true,
            ..Self::members(name, tokens)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventorySpec {
    #[serde(default, deserialize_with = "deserialize_group_map")]
    pub groups: Vec<Declaration>,

    #[serde(default)]
    pub declarations: Vec<RawDeclaration>,

    #[serde(default)]
    pub policy: Option<PolicySpec>,
}

/// Explicit declaration shape.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDeclaration {
    pub name: String,

    #[serde(default, alias = "hosts")]
    pub tokens: TokenList,

    #[serde(default)]
    pub composite: bool,
}

/// Tokens may be written as a list or, for a single entry, a bare string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenList {
    Many(Vec<String>),
    One(String),
}

impl Default for TokenList {
    fn default() -> Self {
        TokenList::Many(Vec::new())
    }
}

impl TokenList {
    fn into_vec(self) -> Vec<String> {
        match self {
            TokenList::Many(v) => v,
            TokenList::One(s) => vec![s],
        }
    }
}

impl InventorySpec {
    /// All declarations in document order: the `groups` map first, then the
    /// explicit list.
    pub fn into_declarations(self) -> Vec<Declaration> {
        let mut out = self.groups;
        out.extend(self.declarations.into_iter().map(|raw| Declaration {
            name: raw.name,
            tokens: raw.tokens.into_vec(),
            composite: raw.composite,
        }));
        out
    }
}

/// Declarations and policy gathered from one or more inventory files.
#[derive(Debug, Clone, Default)]
pub struct LoadedInventory {
    pub declarations: Vec<Declaration>,
    pub policy: Option<PolicySpec>,
}

pub fn parse_inventory(text: &str) -> Result<InventorySpec> {
    serde_json::from_str(text).context("invalid inventory document")
}

pub fn load_inventory_file(path: &Path) -> Result<InventorySpec> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read inventory file {}", path.display()))?;
    parse_inventory(&text).with_context(|| format!("parse inventory file {}", path.display()))
}

/// Concatenate declarations from several files in the order given. A policy
/// embedded in a later file replaces one from an earlier file.
pub fn load_inventories<P: AsRef<Path>>(paths: &[P]) -> Result<LoadedInventory> {
    let mut loaded = LoadedInventory::default();
    for path in paths {
        let path = path.as_ref();
        let mut spec = load_inventory_file(path)?;
        if let Some(policy) = spec.policy.take() {
            if loaded.policy.is_some() {
                warn!("policy in {} replaces an earlier embedded policy", path.display());
            }
            loaded.policy = Some(policy);
        }
        let decls = spec.into_declarations();
        debug!("{}: {} declarations", path.display(), decls.len());
        loaded.declarations.extend(decls);
    }
    Ok(loaded)
}

fn deserialize_group_map<'de, D>(deserializer: D) -> std::result::Result<Vec<Declaration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupMapVisitor;

    impl<'de> Visitor<'de> for GroupMapVisitor {
        type Value = Vec<Declaration>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of group name to a list of host patterns or group names")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::new();
            while let Some((name, tokens)) = map.next_entry::<String, TokenList>()? {
                out.push(Declaration {
                    name,
                    tokens: tokens.into_vec(),
                    composite: false,
                });
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(GroupMapVisitor)
}
