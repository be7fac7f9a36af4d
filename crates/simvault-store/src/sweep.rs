//! Declarative parameter grids and their deterministic enumeration.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Grid document driving a sweep: independent parameter axes plus the seeds
/// to try for every combination, with optional run bookkeeping defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SweepGrid {
    #[serde(default)]
    pub params: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    pub seeds: Option<Vec<u64>>,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Tags applied to every run; accepts a single string or a sequence.
    #[serde(default, deserialize_with = "tags_from_string_or_seq")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub plot_config: Option<Value>,
    #[serde(default)]
    pub format: Option<String>,
}

fn tags_from_string_or_seq<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(tag)) => vec![tag],
        Some(OneOrMany::Many(tags)) => tags,
    })
}

impl SweepGrid {
    /// The seed list in effect: `seeds`, else `[seed]`, else `[0]`.
    pub fn effective_seeds(&self) -> Vec<u64> {
        if let Some(seeds) = &self.seeds {
            return seeds.clone();
        }
        vec![self.seed.unwrap_or(0)]
    }

    /// Number of (params, seed) pairs the grid enumerates.
    pub fn job_count(&self) -> usize {
        let combos: usize = self.params.values().map(Vec::len).product();
        combos * self.effective_seeds().len()
    }

    /// Lazy, restartable enumeration of the full Cartesian product.
    ///
    /// Axes iterate in sorted-name order with later axes varying faster and
    /// the seed varying fastest, so repeated calls replay the identical
    /// sequence.
    pub fn iter(&self) -> SweepIter<'_> {
        SweepIter {
            axes: self.params.iter().collect(),
            seeds: self.effective_seeds(),
            total: self.job_count(),
            cursor: 0,
        }
    }
}

/// Iterator over `(params, seed)` pairs; see [`SweepGrid::iter`].
#[derive(Debug, Clone)]
pub struct SweepIter<'a> {
    axes: Vec<(&'a String, &'a Vec<Value>)>,
    seeds: Vec<u64>,
    total: usize,
    cursor: usize,
}

impl Iterator for SweepIter<'_> {
    type Item = (BTreeMap<String, Value>, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.total {
            return None;
        }
        let mut index = self.cursor;
        self.cursor += 1;

        let seed = self.seeds[index % self.seeds.len()];
        index /= self.seeds.len();

        let mut params = BTreeMap::new();
        for (name, values) in self.axes.iter().rev() {
            params.insert((*name).clone(), values[index % values.len()].clone());
            index /= values.len();
        }
        Some((params, seed))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SweepIter<'_> {}
