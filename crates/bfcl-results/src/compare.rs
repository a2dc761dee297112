use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bfcl_results_core::compare::{compare_runs, RunComparison, SideSummary};
use bfcl_results_core::CategoryRun;
use clap::Args;

use crate::discover::{category_files_in_run, run_dirs_from_arg};
use crate::load;

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Baseline run directory (result-<run> or score-<run>).
    pub baseline_dir: PathBuf,

    /// Modified run directory.
    pub modified_dir: PathBuf,

    /// Test category to compare (e.g. multi_turn).
    pub category: String,

    /// Restrict the file search to one model subdirectory.
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Emit the comparison as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

fn load_side(dir: &Path, category: &str, model: Option<&str>) -> Result<(String, CategoryRun)> {
    let dirs = run_dirs_from_arg(dir)?;
    let files = category_files_in_run(&dirs, model)?
        .into_iter()
        .find(|f| f.category == category);
    let Some(files) = files else {
        bail!(
            "no {category} result file found under {}",
            dirs.result_dir.display()
        );
    };
    let Some(score_path) = files.score_path else {
        bail!(
            "score file for {category} is missing in run {} (incomplete pair)",
            dirs.run
        );
    };
    let run = load::load_pair(&files.result_path, &score_path)
        .with_context(|| format!("load run {}", dirs.run))?;
    Ok((dirs.run, run))
}

pub fn cmd_compare(args: CompareArgs) -> Result<std::process::ExitCode> {
    let model = args.model.as_deref();
    let (baseline_name, baseline) = load_side(&args.baseline_dir, &args.category, model)?;
    let (modified_name, modified) = load_side(&args.modified_dir, &args.category, model)?;

    for (name, run) in [(&baseline_name, &baseline), (&modified_name, &modified)] {
        for issue in run.issues() {
            eprintln!("{name}/{}: {issue}", args.category);
        }
    }

    let comparison = compare_runs(&baseline_name, &baseline, &modified_name, &modified);
    if args.json {
        let mut bytes = serde_json::to_vec(&comparison)?;
        bytes.push(b'\n');
        std::io::Write::write_all(&mut std::io::stdout(), &bytes).context("write stdout")?;
    } else {
        render_console(&args.category, &comparison);
    }
    Ok(std::process::ExitCode::SUCCESS)
}

fn render_side(label: &str, side: &SideSummary) {
    println!(
        "{label}: {} passed / {} total ({:.1}%)  [summary: {}/{} @ {:.1}%]",
        side.passed,
        side.total,
        if side.total == 0 {
            0.0
        } else {
            side.passed as f64 / side.total as f64 * 100.0
        },
        side.summary.correct_count,
        side.summary.total_count,
        side.summary.accuracy * 100.0
    );
}

fn render_console(category: &str, cmp: &RunComparison) {
    let rule = "=".repeat(80);
    println!("Comparison: {} -> {}", cmp.baseline.run, cmp.modified.run);
    println!("Category: {category}");
    println!("{rule}");
    println!();
    render_side("Baseline", &cmp.baseline);
    render_side("Modified", &cmp.modified);
    println!();
    println!("Regressions (passed -> failed): {}", cmp.regressions.len());
    println!("Improvements (failed -> passed): {}", cmp.improvements.len());
    println!("Net change: {:+} tests", cmp.net_change());

    if !cmp.regressions.is_empty() {
        println!();
        println!("Regressed test IDs:");
        for id in &cmp.regressions {
            println!("  - {id}");
        }
    }
    if !cmp.improvements.is_empty() {
        println!();
        println!("Improved test IDs:");
        for id in &cmp.improvements {
            println!("  - {id}");
        }
    }
    if !cmp.only_in_baseline.is_empty() || !cmp.only_in_modified.is_empty() {
        println!();
        println!(
            "Only in baseline: {} tests, only in modified: {} tests (excluded from the diff)",
            cmp.only_in_baseline.len(),
            cmp.only_in_modified.len()
        );
        for id in &cmp.only_in_baseline {
            println!("  (baseline only) {id}");
        }
        for id in &cmp.only_in_modified {
            println!("  (modified only) {id}");
        }
    }

    if !cmp.regressions_by_error.is_empty() {
        println!();
        println!("Regressions by error type:");
        println!("{rule}");
        for (error_type, ids) in &cmp.regressions_by_error {
            println!(
                "\n{error_type}: {} regressions ({:.1}%)",
                ids.len(),
                ids.len() as f64 / cmp.regressions.len() as f64 * 100.0
            );
            for id in ids {
                println!("  - {id}");
            }
        }
    }
}
