use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bfcl_results_core::stability::{StabilityReport, StabilityTally};
use bfcl_results_core::DataIssue;
use clap::Args;
use serde::Serialize;

use crate::discover::{discover_runs, IncompletePair};
use crate::load;

#[derive(Debug, Args)]
pub struct CategorizeArgs {
    /// Root directory containing result-<run>/ and score-<run>/ directories.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Where to write the three listing files (defaults to --root).
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Emit the full report as JSON on stdout instead of the console summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct SkippedPair {
    run: String,
    category: String,
    reason: String,
}

#[derive(Debug, Serialize)]
struct PairIssues {
    run: String,
    category: String,
    issues: Vec<DataIssue>,
}

#[derive(Debug, Serialize)]
struct CategorizeReport {
    ok: bool,
    root: String,
    stability: StabilityReport,
    most_flaky_category: Option<String>,
    most_stable_category: Option<String>,
    skipped: Vec<SkippedPair>,
    incomplete: Vec<IncompletePair>,
    issues: Vec<PairIssues>,
    output_files: Vec<String>,
}

pub fn cmd_categorize(args: CategorizeArgs) -> Result<std::process::ExitCode> {
    let discovery = discover_runs(&args.root)
        .with_context(|| format!("discover runs under {}", args.root.display()))?;

    let mut tally = StabilityTally::default();
    let mut skipped = Vec::new();
    let mut issues = Vec::new();
    for pair in &discovery.pairs {
        match load::load_pair(&pair.result_path, &pair.score_path) {
            Ok(run) => {
                let pair_issues: Vec<DataIssue> = run.issues().cloned().collect();
                if !pair_issues.is_empty() {
                    issues.push(PairIssues {
                        run: pair.run.clone(),
                        category: pair.category.clone(),
                        issues: pair_issues,
                    });
                }
                tally.record_run(&pair.category, &pair.run, &run.outcome);
            }
            Err(err) => {
                eprintln!("skipping {}/{}: {err:#}", pair.run, pair.category);
                skipped.push(SkippedPair {
                    run: pair.run.clone(),
                    category: pair.category.clone(),
                    reason: format!("{err:#}"),
                });
            }
        }
    }

    for inc in &discovery.incomplete {
        eprintln!(
            "incomplete pair {}/{}: missing {} file",
            inc.run, inc.category, inc.missing
        );
    }
    if !args.json {
        for pair in &issues {
            for issue in &pair.issues {
                eprintln!("{}/{}: {issue}", pair.run, pair.category);
            }
        }
    }

    let no_data = tally.is_empty();
    let stability = tally.into_report();
    let most_flaky = stability.most_flaky_category().map(str::to_string);
    let most_stable = stability.most_stable_category().map(str::to_string);

    let mut report = CategorizeReport {
        ok: !no_data,
        root: args.root.display().to_string(),
        stability,
        most_flaky_category: most_flaky,
        most_stable_category: most_stable,
        skipped,
        incomplete: discovery.incomplete,
        issues,
        output_files: Vec::new(),
    };

    if no_data {
        if args.json {
            print_json(&report)?;
        } else {
            eprintln!("no complete run pairs found under {}", args.root.display());
        }
        return Ok(std::process::ExitCode::from(1));
    }

    let out_dir = args.out_dir.as_deref().unwrap_or(&args.root);
    let listings: [(&str, &BTreeMap<String, Vec<String>>); 3] = [
        ("stable_tests.json", &report.stability.stable),
        ("flaky_tests.json", &report.stability.flaky),
        ("failing_tests.json", &report.stability.failing),
    ];
    let mut written = Vec::new();
    for (name, listing) in listings {
        let path = out_dir.join(name);
        write_json_atomic(&path, listing)?;
        written.push(path.display().to_string());
    }
    report.output_files = written;

    if args.json {
        print_json(&report)?;
    } else {
        render_console(&report);
    }
    Ok(std::process::ExitCode::SUCCESS)
}

fn print_json(report: &CategorizeReport) -> Result<()> {
    let mut bytes = serde_json::to_vec(report)?;
    bytes.push(b'\n');
    std::io::Write::write_all(&mut std::io::stdout(), &bytes).context("write stdout")?;
    Ok(())
}

/// Whole-file replacement: write a sibling temp file, then rename over
/// the target.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &bytes).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} into place", tmp.display()))?;
    Ok(())
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn render_console(report: &CategorizeReport) {
    let rule = "=".repeat(80);
    println!("{rule}");
    println!("BFCL test stability");
    println!("{rule}");

    for (category, stats) in &report.stability.categories {
        println!();
        println!("{category}");
        println!(
            "  Runs analyzed: {} ({})",
            stats.runs.len(),
            stats.runs.join(", ")
        );
        println!("  Total tests: {}", stats.total);
        println!(
            "  Stable passes: {:4} ({:5.1}%)",
            stats.stable,
            pct(stats.stable, stats.total)
        );
        println!(
            "  Flaky tests:   {:4} ({:5.1}%)",
            stats.flaky,
            pct(stats.flaky, stats.total)
        );
        println!(
            "  Stable fails:  {:4} ({:5.1}%)",
            stats.failing,
            pct(stats.failing, stats.total)
        );
    }

    let totals = &report.stability.totals;
    println!();
    println!("{rule}");
    println!("Overall: {} unique tests", totals.total);
    println!(
        "  Stable passes: {:4} ({:5.1}%)",
        totals.stable,
        pct(totals.stable, totals.total)
    );
    println!(
        "  Flaky tests:   {:4} ({:5.1}%)",
        totals.flaky,
        pct(totals.flaky, totals.total)
    );
    println!(
        "  Stable fails:  {:4} ({:5.1}%)",
        totals.failing,
        pct(totals.failing, totals.total)
    );

    if let Some(category) = &report.most_flaky_category {
        println!("Most flaky category:  {category}");
    }
    if let Some(category) = &report.most_stable_category {
        println!("Most stable category: {category}");
    }
    if !report.skipped.is_empty() {
        println!("Skipped pairs: {}", report.skipped.len());
    }
    if !report.incomplete.is_empty() {
        println!("Incomplete pairs: {}", report.incomplete.len());
    }

    println!();
    println!("Listings written:");
    for file in &report.output_files {
        println!("  - {file}");
    }
}
