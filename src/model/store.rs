//! Published report snapshots.
//!
//! Readers always see a complete report: a new one is built on an owned
//! table snapshot and swapped in only after the pass finishes. A failed
//! reload leaves the previous report in place.

use crate::Result;
use crate::model::{TopologyReport, build_report};
use crate::spec::{Declaration, GroupTable, PolicySpec};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
pub struct TopologyStore {
    policy: PolicySpec,
    current: RwLock<Arc<TopologyReport>>,
}

impl TopologyStore {
    pub fn new(policy: PolicySpec) -> Self {
        Self {
            policy,
            current: RwLock::new(Arc::new(TopologyReport::default())),
        }
    }

    pub fn current(&self) -> Arc<TopologyReport> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve `table` to completion, then publish the result.
    pub fn publish(&self, table: GroupTable) -> Result<Arc<TopologyReport>> {
        let policy = self.policy.validate_and_build(&table)?;
        let report = Arc::new(build_report(&table, &policy));
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&report);
        debug!("published report with {} groups", report.groups.len());
        Ok(report)
    }

    pub fn reload(&self, declarations: &[Declaration]) -> Result<Arc<TopologyReport>> {
        let table = GroupTable::load(declarations)?;
        self.publish(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn decls(n: usize) -> Vec<Declaration> {
        let range = format!("node-[1:{}]", n);
        vec![
            Declaration::members("nodes", &[range.as_str()]),
            Declaration::children("cluster", &["nodes"]),
        ]
    }

    #[test]
    fn starts_empty_and_publishes() {
        let store = TopologyStore::new(PolicySpec::default());
        assert!(store.current().groups.is_empty());

        let published = store.reload(&decls(3)).unwrap();
        assert_eq!(published.members("cluster").unwrap().len(), 3);
        assert!(Arc::ptr_eq(&published, &store.current()));
    }

    #[test]
    fn failed_reload_keeps_previous_report() {
        let store = TopologyStore::new(PolicySpec {
            roots: vec!["cluster".into()],
            ..PolicySpec::default()
        });
        let first = store.reload(&decls(2)).unwrap();

        assert!(store.reload(&[Declaration::members("", &["x"])]).is_err());
        assert!(
            store
                .reload(&[Declaration::members("nodes", &["n"])])
                .is_err()
        );
        assert!(Arc::ptr_eq(&first, &store.current()));
    }

    #[test]
    fn concurrent_reloads_do_not_interfere() {
        let store = Arc::new(TopologyStore::new(PolicySpec::default()));
        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let report = store.reload(&decls(n)).unwrap();
                    assert_eq!(report.members("cluster").unwrap().len(), n);
                    assert!(report.diagnostics.is_empty());
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let last = store.current();
        let n = last.members("nodes").unwrap().len();
        assert_eq!(last.members("cluster").unwrap().len(), n);
    }
}
