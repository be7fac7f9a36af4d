use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names owned by the store; caller extras never shadow these.
const RESERVED_KEYS: [&str; 10] = [
    "params",
    "seed",
    "code_version",
    "env",
    "timestamp",
    "tags",
    "run_id",
    "arrays_format",
    "arrays_path",
    "plot_config",
];

/// Per-run metadata record, persisted as pretty-printed key-sorted JSON.
///
/// Immutable after the first save; a forced re-save replaces the whole
/// document. The store fills `run_id`, `arrays_format`, and `arrays_path`
/// during [`crate::RunStore::save`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub params: BTreeMap<String, Value>,
    pub seed: u64,
    #[serde(default)]
    pub code_version: Option<String>,
    #[serde(default)]
    pub env: BTreeMap<String, Value>,
    pub timestamp: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrays_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrays_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_config: Option<Value>,
    /// Caller-supplied fields, flattened into the document.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RunMetadata {
    /// Starts a record stamped with the current UTC instant.
    pub fn new(
        params: BTreeMap<String, Value>,
        seed: u64,
        code_version: Option<String>,
        env: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            params,
            seed,
            code_version,
            env,
            timestamp: Utc::now().to_rfc3339(),
            tags: Vec::new(),
            run_id: None,
            arrays_format: None,
            arrays_path: None,
            plot_config: None,
            extra: BTreeMap::new(),
        }
    }

    /// Replaces the tag set, deduplicated and sorted.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        self.tags = unique.into_iter().collect();
        self
    }

    pub fn with_plot_config(mut self, plot_config: Value) -> Self {
        self.plot_config = Some(plot_config);
        self
    }

    /// Merges caller-supplied fields, dropping keys the store owns.
    pub fn with_extra(mut self, extra: BTreeMap<String, Value>) -> Self {
        for (key, value) in extra {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                self.extra.insert(key, value);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_are_deduplicated_and_sorted() {
        let meta = RunMetadata::new(BTreeMap::new(), 0, None, BTreeMap::new())
            .with_tags(["zeta", "alpha", "zeta"]);
        assert_eq!(meta.tags, vec!["alpha", "zeta"]);
    }

    #[test]
    fn reserved_extra_keys_are_dropped() {
        let mut extra = BTreeMap::new();
        extra.insert("seed".to_string(), json!(99));
        extra.insert("notes".to_string(), json!("kept"));
        let meta = RunMetadata::new(BTreeMap::new(), 3, None, BTreeMap::new()).with_extra(extra);
        assert_eq!(meta.seed, 3);
        assert_eq!(meta.extra.get("notes"), Some(&json!("kept")));
        assert!(!meta.extra.contains_key("seed"));
    }
}
