use std::path::Path;

use anyhow::{Context, Result};
use bfcl_results_core::{read_jsonl, CategoryRun, ResultFile, ScoreFile};

fn read_records(path: &Path) -> Result<Vec<serde_json::Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    read_jsonl(&text).with_context(|| format!("parse {}", path.display()))
}

/// Load and interpret one complete (result, score) pair.
pub fn load_pair(result_path: &Path, score_path: &Path) -> Result<CategoryRun> {
    CategoryRun::from_records(read_records(result_path)?, read_records(score_path)?)
        .with_context(|| format!("interpret {}", score_path.display()))
}

/// Load a result file on its own (for incomplete pairs).
pub fn load_result_file(path: &Path) -> Result<ResultFile> {
    ResultFile::from_records(read_records(path)?)
}

/// Load a score file on its own.
pub fn load_score_file(path: &Path) -> Result<ScoreFile> {
    ScoreFile::from_records(read_records(path)?)
        .with_context(|| format!("interpret {}", path.display()))
}
