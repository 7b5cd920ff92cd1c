//! INI inventory in the provisioning tool's format: one section per group
//! holding its flattened hosts.
//!
//!   [clients]
//!   agent-node-1
//!   client-1
//!
//! The implicit `all` group is left out; the tool derives it.

use crate::model::{ALL_GROUP, TopologyReport};

pub fn render_ini_inventory(report: &TopologyReport) -> String {
    let mut out = String::new();
    for (group, hosts) in &report.groups {
        if group == ALL_GROUP {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", group));
        for host in hosts {
            out.push_str(host.as_str());
            out.push('\n');
        }
    }
    out
}
