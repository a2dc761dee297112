use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde_json::Value;

use crate::issue::{DataIssue, FileKind};
use crate::record::record_id;

/// An interpreted result file: every executed test's full record,
/// keyed by identifier.
#[derive(Debug, Clone)]
pub struct ResultFile {
    pub records: BTreeMap<String, Value>,
    pub issues: Vec<DataIssue>,
}

impl ResultFile {
    pub fn from_records(records: Vec<Value>) -> Result<Self> {
        let mut map: BTreeMap<String, Value> = BTreeMap::new();
        let mut issues = Vec::new();
        for (idx, raw) in records.into_iter().enumerate() {
            let Some(id) = record_id(&raw).map(str::to_string) else {
                issues.push(DataIssue::MissingId {
                    file: FileKind::Result,
                    line: idx + 1,
                });
                continue;
            };
            if map.contains_key(&id) {
                issues.push(DataIssue::DuplicateId {
                    file: FileKind::Result,
                    id,
                });
                continue;
            }
            map.insert(id, raw);
        }
        Ok(ResultFile {
            records: map,
            issues,
        })
    }

    /// The set of all executed test identifiers.
    pub fn ids(&self) -> BTreeSet<String> {
        self.records.keys().cloned().collect()
    }
}
