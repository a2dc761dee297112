//! Run/category discovery: the only component that inspects the
//! directory tree. Everything downstream works on loaded records.
//!
//! Layout convention: run directories are named `result-<run>` and
//! `score-<run>`; inside, nested at any depth (commonly under a model
//! subdirectory), files are named
//! `BFCL_v<version>_<category>_result.json` and
//! `BFCL_v<version>_<category>_score.json`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Serialize;
use walkdir::WalkDir;

pub const RESULT_DIR_PREFIX: &str = "result-";
pub const SCORE_DIR_PREFIX: &str = "score-";

const RESULT_FILE_SUFFIX: &str = "_result.json";
const SCORE_FILE_SUFFIX: &str = "_score.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairFileKind {
    Result,
    Score,
}

/// Parse a `BFCL_v<version>_<category>_{result,score}.json` file name
/// into its category. Returns `None` for files outside the convention.
pub fn parse_bfcl_file_name(name: &str) -> Option<(String, PairFileKind)> {
    let rest = name.strip_prefix("BFCL_v")?;
    let (version, rest) = rest.split_once('_')?;
    if version.is_empty() || !version.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if let Some(category) = rest.strip_suffix(RESULT_FILE_SUFFIX) {
        if !category.is_empty() {
            return Some((category.to_string(), PairFileKind::Result));
        }
    }
    if let Some(category) = rest.strip_suffix(SCORE_FILE_SUFFIX) {
        if !category.is_empty() {
            return Some((category.to_string(), PairFileKind::Score));
        }
    }
    None
}

/// The result/score directory pair for one run.
#[derive(Debug, Clone)]
pub struct RunDirs {
    pub run: String,
    pub result_dir: PathBuf,
    pub score_dir: PathBuf,
}

/// Normalize a user-supplied run directory (`result-<run>`,
/// `score-<run>`, or a bare run name next to such directories) into
/// both directories. The result directory must exist.
pub fn run_dirs_from_arg(dir: &Path) -> Result<RunDirs> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_default();
    if name.is_empty() {
        bail!("cannot interpret {} as a run directory", dir.display());
    }
    let parent = dir.parent().map(Path::to_path_buf).unwrap_or_default();

    let run = name
        .strip_prefix(RESULT_DIR_PREFIX)
        .or_else(|| name.strip_prefix(SCORE_DIR_PREFIX))
        .unwrap_or(&name)
        .to_string();
    let dirs = RunDirs {
        result_dir: parent.join(format!("{RESULT_DIR_PREFIX}{run}")),
        score_dir: parent.join(format!("{SCORE_DIR_PREFIX}{run}")),
        run,
    };
    if !dirs.result_dir.is_dir() {
        bail!(
            "result directory {} does not exist",
            dirs.result_dir.display()
        );
    }
    Ok(dirs)
}

/// One category's files within a run. `score_path` is `None` when the
/// pair is incomplete.
#[derive(Debug, Clone)]
pub struct CategoryFiles {
    pub category: String,
    pub result_path: PathBuf,
    pub score_path: Option<PathBuf>,
}

/// List every category result file in a run (recursively), with its
/// score counterpart when present. `model` restricts the walk to paths
/// containing that directory component. Sorted by (category, path).
pub fn category_files_in_run(dirs: &RunDirs, model: Option<&str>) -> Result<Vec<CategoryFiles>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(&dirs.result_dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let Some((category, PairFileKind::Result)) = parse_bfcl_file_name(name) else {
            continue;
        };
        let rel = entry
            .path()
            .strip_prefix(&dirs.result_dir)
            .unwrap_or_else(|_| entry.path());
        if let Some(model) = model {
            let in_model = rel
                .components()
                .any(|c| c.as_os_str().to_str() == Some(model));
            if !in_model {
                continue;
            }
        }
        let score_name = name.replace(RESULT_FILE_SUFFIX, SCORE_FILE_SUFFIX);
        let score_path = match rel.parent() {
            Some(rel_parent) => dirs.score_dir.join(rel_parent).join(&score_name),
            None => dirs.score_dir.join(&score_name),
        };
        files.push(CategoryFiles {
            category,
            result_path: entry.path().to_path_buf(),
            score_path: score_path.is_file().then_some(score_path),
        });
    }
    files.sort_by(|a, b| {
        (&a.category, &a.result_path).cmp(&(&b.category, &b.result_path))
    });
    Ok(files)
}

/// A complete (result, score) file pair for one run and category.
#[derive(Debug, Clone)]
pub struct RunPair {
    pub run: String,
    pub category: String,
    pub result_path: PathBuf,
    pub score_path: PathBuf,
}

/// A run/category with only one of the two files present.
#[derive(Debug, Clone, Serialize)]
pub struct IncompletePair {
    pub run: String,
    pub category: String,
    pub missing: &'static str,
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub pairs: Vec<RunPair>,
    pub incomplete: Vec<IncompletePair>,
}

/// Find every (run, category) pair under `root` for which both files
/// exist. One-sided pairs are reported as incomplete, not fatal.
pub fn discover_runs(root: &Path) -> Result<Discovery> {
    let mut runs: BTreeSet<String> = BTreeSet::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if let Some(run) = name
            .strip_prefix(RESULT_DIR_PREFIX)
            .or_else(|| name.strip_prefix(SCORE_DIR_PREFIX))
        {
            if !run.is_empty() {
                runs.insert(run.to_string());
            }
        }
    }

    let mut discovery = Discovery::default();
    for run in runs {
        let dirs = RunDirs {
            result_dir: root.join(format!("{RESULT_DIR_PREFIX}{run}")),
            score_dir: root.join(format!("{SCORE_DIR_PREFIX}{run}")),
            run: run.clone(),
        };
        if dirs.result_dir.is_dir() {
            for files in category_files_in_run(&dirs, None)? {
                match files.score_path {
                    Some(score_path) => discovery.pairs.push(RunPair {
                        run: run.clone(),
                        category: files.category,
                        result_path: files.result_path,
                        score_path,
                    }),
                    None => discovery.incomplete.push(IncompletePair {
                        run: run.clone(),
                        category: files.category,
                        missing: "score",
                    }),
                }
            }
        }
        // Score files whose result counterpart is missing.
        if dirs.score_dir.is_dir() {
            for entry in WalkDir::new(&dirs.score_dir).follow_links(false) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let Some(name) = entry.file_name().to_str() else {
                    continue;
                };
                let Some((category, PairFileKind::Score)) = parse_bfcl_file_name(name) else {
                    continue;
                };
                let rel = entry
                    .path()
                    .strip_prefix(&dirs.score_dir)
                    .unwrap_or_else(|_| entry.path());
                let result_name = name.replace(SCORE_FILE_SUFFIX, RESULT_FILE_SUFFIX);
                let result_path = match rel.parent() {
                    Some(rel_parent) => dirs.result_dir.join(rel_parent).join(&result_name),
                    None => dirs.result_dir.join(&result_name),
                };
                if !result_path.is_file() {
                    discovery.incomplete.push(IncompletePair {
                        run: run.clone(),
                        category,
                        missing: "result",
                    });
                }
            }
        }
    }
    discovery
        .pairs
        .sort_by(|a, b| (&a.run, &a.category, &a.result_path).cmp(&(&b.run, &b.category, &b.result_path)));
    Ok(discovery)
}
