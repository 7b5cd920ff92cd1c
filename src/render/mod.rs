//! Report renderers. All of them are pure: they return the text and leave
//! writing it to the caller.

pub mod ini;
pub mod text;

pub use ini::render_ini_inventory;
pub use text::render_diagnostics;

use crate::model::TopologyReport;

/// Render the report as pretty-printed JSON.
pub fn render_json_report(report: &TopologyReport) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::build_report;
    use crate::spec::{Declaration, GroupTable, PolicySpec};
    use serde_json::Value;

    #[test]
    fn json_report_shape() {
        let table = GroupTable::load(&[
            Declaration::members("a", &["h-[1:2]"]),
            Declaration::children("b", &["a", "missing"]),
        ])
        .unwrap();
        let policy = PolicySpec::default().validate_and_build(&table).unwrap();
        let json = render_json_report(&build_report(&table, &policy)).unwrap();

        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["groups"]["b"], serde_json::json!(["h-1", "h-2"]));
        assert_eq!(v["diagnostics"][0]["kind"], "DanglingReference");
        assert_eq!(v["diagnostics"][0]["severity"], "error");
        assert_eq!(v["summary"]["errors"], 1);
    }
}
