//! YAML file-backed rule store.
//!
//! The file is re-read on every fetch, so edits are picked up by the next
//! refresh without restarting the process:
//!
//! ```yaml
//! - id: 1
//!   enabled: true
//!   rule:
//!     action: delete_project
//!     periodic: random(5,10)
//!     args: { projectId: 42 }
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::StoreError;

use super::{GlobalRuleRow, GlobalRuleStore};

#[derive(Debug, Deserialize)]
struct FileRow {
    id: u64,
    #[serde(default = "default_enabled")]
    enabled: bool,
    rule: serde_json::Value,
}

fn default_enabled() -> bool {
    true
}

/// Global rules read from a YAML file.
#[derive(Debug, Clone)]
pub struct FileRuleStore {
    path: PathBuf,
}

impl FileRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse YAML content into rows, keeping file order and disabled rows.
    pub fn parse(content: &str) -> Result<Vec<GlobalRuleRow>, StoreError> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let rows: Option<Vec<FileRow>> = serde_yaml::from_str(content)?;
        rows.unwrap_or_default()
            .into_iter()
            .map(|row| {
                Ok(GlobalRuleRow {
                    id: row.id,
                    enabled: row.enabled,
                    descriptor: serde_json::to_vec(&row.rule)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl GlobalRuleStore for FileRuleStore {
    async fn all_enabled(&self) -> Result<Vec<GlobalRuleRow>, StoreError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let rows: Vec<GlobalRuleRow> = Self::parse(&content)?
            .into_iter()
            .filter(|r| r.enabled)
            .collect();
        debug!(path = %self.path.display(), count = rows.len(), "read global rules file");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ActionKind, RuleDescriptor};
    use std::io::Write;

    const RULES_YAML: &str = r#"
- id: 1
  rule:
    action: delete_project
    periodic: random(5,10)
    args:
      projectId: 42
- id: 2
  enabled: false
  rule:
    action: create_project
- id: 3
  enabled: true
  rule:
    action: create_project
    minInterval: 1m
"#;

    #[test]
    fn parse_keeps_order_and_encodes_descriptors() {
        let rows = FileRuleStore::parse(RULES_YAML).unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(rows[0].enabled);
        assert!(!rows[1].enabled);

        let desc = RuleDescriptor::from_json(&rows[0].descriptor).unwrap();
        assert_eq!(desc.action, ActionKind::DeleteProject);
        assert_eq!(desc.periodic, "random(5,10)");
        assert_eq!(desc.args["projectId"], 42);
    }

    #[test]
    fn parse_empty_content_is_empty() {
        assert!(FileRuleStore::parse("").unwrap().is_empty());
        assert!(FileRuleStore::parse("\n  \n").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_rows_without_rule() {
        assert!(matches!(
            FileRuleStore::parse("- id: 1\n  enabled: true\n"),
            Err(StoreError::Yaml(_))
        ));
    }

    #[tokio::test]
    async fn all_enabled_filters_disabled_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(RULES_YAML.as_bytes()).unwrap();

        let store = FileRuleStore::new(file.path());
        let rows = store.all_enabled().await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test]
    async fn all_enabled_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRuleStore::new(dir.path().join("missing.yml"));
        assert!(matches!(store.all_enabled().await, Err(StoreError::Io(_))));
    }
}
