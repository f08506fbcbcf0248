use crate::error::HistoryError;
use crate::model::RunResult;
use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const COMBINED_RESULTS: &str = "combined_results.json";

/// Writes a run under `name`, or under a timestamped name when none is given.
pub fn save_results(
    result: &RunResult,
    dir: &Path,
    name: Option<&str>,
) -> Result<PathBuf, HistoryError> {
    fs::create_dir_all(dir).map_err(|source| io_error(dir, source))?;
    let file_name = match name {
        Some(name) if !name.trim().is_empty() => format!("{}.json", name.trim()),
        _ => format!("results_{}.json", Utc::now().timestamp_millis()),
    };
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(result).map_err(|source| HistoryError::Json {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, json).map_err(|source| io_error(&path, source))?;
    Ok(path)
}

/// Merges every saved run in `dir` into `combined_results.json`, keyed by
/// file stem.
pub fn combine_results(dir: &Path) -> Result<PathBuf, HistoryError> {
    let output = dir.join(COMBINED_RESULTS);
    if output.exists() {
        fs::remove_file(&output).map_err(|source| io_error(&output, source))?;
        info!(path = %output.display(), "Existing combined results deleted");
    }

    let mut files = fs::read_dir(dir)
        .map_err(|source| io_error(dir, source))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| is_saved_run(path))
        .collect::<Vec<_>>();
    files.sort();

    let mut combined = IndexMap::new();
    for path in files {
        let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
            continue;
        };
        let content = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        let value: Value = serde_json::from_str(&content).map_err(|source| HistoryError::Json {
            path: path.clone(),
            source,
        })?;
        debug!(file = %path.display(), "Combining results");
        combined.insert(stem, value);
    }

    let json = serde_json::to_string_pretty(&combined).map_err(|source| HistoryError::Json {
        path: output.clone(),
        source,
    })?;
    fs::write(&output, json).map_err(|source| io_error(&output, source))?;
    Ok(output)
}

fn is_saved_run(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    path.is_file()
        && name != COMBINED_RESULTS
        && !name.to_lowercase().contains(".ds_store")
        && name.ends_with(".json")
}

fn io_error(path: &Path, source: std::io::Error) -> HistoryError {
    HistoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}
