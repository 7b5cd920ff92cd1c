//! Spec layer: JSON schemas + validated in-memory structures.
//!
//! This module is intentionally separate from resolution and rendering.
//! It owns:
//! - HostName / GroupName identifiers
//! - Host pattern parsing and range expansion
//! - Inventory and policy documents
//! - The normalized group table

pub mod host;
pub mod inventory;
pub mod pattern;
pub mod policy;
pub mod table;

pub use host::{GroupName, HostName};
pub use inventory::{
    Declaration, InventorySpec, LoadedInventory, load_inventories, load_inventory_file,
    parse_inventory,
};
pub use pattern::{HostPattern, PatternError, expand};
pub use policy::{PolicySpec, ValidationPolicy, load_policy_file, select_policy};
pub use table::{
    CHILDREN_SUFFIX, DeclarationKind, GroupDefinition, GroupTable, Redeclaration, TableError,
};
