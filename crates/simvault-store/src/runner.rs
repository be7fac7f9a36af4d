//! The cached-run cycle: derive id, check, compute on miss, save.

use std::collections::BTreeMap;

use serde_json::Value;
use simvault_core::{ErrorDetail, VaultError};

use crate::array::ArtifactSet;
use crate::metadata::RunMetadata;
use crate::store::RunStore;
use crate::sweep::SweepGrid;

/// What a simulation hands back: named arrays plus free-form extra metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimOutput {
    pub arrays: ArtifactSet,
    pub extra: BTreeMap<String, Value>,
}

impl SimOutput {
    pub fn new(arrays: ArtifactSet) -> Self {
        Self {
            arrays,
            extra: BTreeMap::new(),
        }
    }

    /// Attaches extra metadata, validating the mapping contract before any
    /// write can happen. `Null` counts as empty.
    pub fn with_extra(arrays: ArtifactSet, extra: Value) -> Result<Self, VaultError> {
        let extra = match extra {
            Value::Null => BTreeMap::new(),
            Value::Object(fields) => fields.into_iter().collect(),
            other => {
                return Err(VaultError::Validation(
                    ErrorDetail::new("result-metadata", "simulation metadata must be a mapping")
                        .with_context("got", json_kind(&other)),
                ))
            }
        };
        Ok(Self { arrays, extra })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Caller policy for one cached run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub tags: Vec<String>,
    pub plot_config: Option<Value>,
    pub format: String,
    /// Recompute and fully replace the run even when it exists.
    pub force: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            plot_config: None,
            format: "npz".to_string(),
            force: false,
        }
    }
}

/// Result of driving one run through the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: String,
    /// True when the store already held the run and no compute happened.
    pub cached: bool,
}

/// Runs the simulation closure unless the derived id is already present.
pub fn run_cached<F>(
    store: &RunStore,
    params: &BTreeMap<String, Value>,
    seed: u64,
    code_version: Option<&str>,
    env: &BTreeMap<String, Value>,
    options: &RunOptions,
    sim: F,
) -> Result<RunOutcome, VaultError>
where
    F: FnOnce(&BTreeMap<String, Value>, u64) -> Result<SimOutput, VaultError>,
{
    let run_id = store.compute_run_id(params, seed, code_version, env)?;
    if store.exists(&run_id) && !options.force {
        return Ok(RunOutcome {
            run_id,
            cached: true,
        });
    }
    let output = sim(params, seed)?;
    let mut metadata = RunMetadata::new(
        params.clone(),
        seed,
        code_version.map(str::to_string),
        env.clone(),
    )
    .with_tags(options.tags.iter().cloned())
    .with_extra(output.extra);
    if let Some(plot_config) = &options.plot_config {
        metadata = metadata.with_plot_config(plot_config.clone());
    }
    store.save(&run_id, &output.arrays, metadata, &options.format)?;
    Ok(RunOutcome {
        run_id,
        cached: false,
    })
}

/// Tally of a sweep driven through the cache.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    pub executed: usize,
    pub skipped: usize,
    /// Every id the sweep touched, in enumeration order.
    pub run_ids: Vec<String>,
}

/// Drives the full grid enumeration through the cached-run cycle with
/// skip-if-exists semantics.
pub fn run_sweep<F>(
    store: &RunStore,
    grid: &SweepGrid,
    code_version: Option<&str>,
    env: &BTreeMap<String, Value>,
    default_format: &str,
    mut sim: F,
) -> Result<SweepOutcome, VaultError>
where
    F: FnMut(&BTreeMap<String, Value>, u64) -> Result<SimOutput, VaultError>,
{
    let options = RunOptions {
        tags: grid.tags.clone(),
        plot_config: grid.plot_config.clone(),
        format: grid
            .format
            .clone()
            .unwrap_or_else(|| default_format.to_string()),
        force: false,
    };
    let mut outcome = SweepOutcome::default();
    for (params, seed) in grid.iter() {
        let result = run_cached(store, &params, seed, code_version, env, &options, &mut sim)?;
        if result.cached {
            outcome.skipped += 1;
        } else {
            outcome.executed += 1;
        }
        outcome.run_ids.push(result.run_id);
    }
    Ok(outcome)
}
