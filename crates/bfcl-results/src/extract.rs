use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bfcl_results_core::extract::{extract_test, ExtractedTest, TestStatus};
use clap::Args;
use serde::Serialize;

use crate::discover::{category_files_in_run, run_dirs_from_arg};
use crate::load;

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Run directory (result-<run> or score-<run>).
    pub run_dir: PathBuf,

    /// Test identifier (e.g. multi_turn_base_104).
    pub test_id: String,

    /// Restrict the file search to one model subdirectory.
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Emit the extracted record as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ExtractReport {
    run: String,
    found_in: String,
    test: ExtractedTest,
}

pub fn cmd_extract(args: ExtractArgs) -> Result<std::process::ExitCode> {
    let dirs = run_dirs_from_arg(&args.run_dir)?;
    let files = category_files_in_run(&dirs, args.model.as_deref())?;
    if files.is_empty() {
        bail!(
            "no result files found under {}",
            dirs.result_dir.display()
        );
    }

    let mut report = None;
    for category_files in &files {
        let result = load::load_result_file(&category_files.result_path)?;
        let score = match &category_files.score_path {
            Some(path) => Some(load::load_score_file(path)?),
            None => None,
        };
        if let Some(test) =
            extract_test(&category_files.category, &result, score.as_ref(), &args.test_id)
        {
            if category_files.score_path.is_none() {
                eprintln!(
                    "note: no score file for {} in run {}; pass/fail status may be incomplete",
                    category_files.category, dirs.run
                );
            }
            report = Some(ExtractReport {
                run: dirs.run.clone(),
                found_in: category_files.result_path.display().to_string(),
                test,
            });
            break;
        }
    }

    let Some(report) = report else {
        bail!("test {:?} not found in run {}", args.test_id, dirs.run);
    };

    if args.json {
        let mut bytes = serde_json::to_vec(&report)?;
        bytes.push(b'\n');
        std::io::Write::write_all(&mut std::io::stdout(), &bytes).context("write stdout")?;
    } else {
        render_console(&report);
    }
    Ok(std::process::ExitCode::SUCCESS)
}

fn render_console(report: &ExtractReport) {
    let rule = "=".repeat(80);
    println!("Test ID: {}", report.test.id);
    println!("Category: {}", report.test.category);
    println!("Found in: {}", report.found_in);
    println!("{rule}");
    println!();
    println!("Status: {}", report.test.status.as_str());

    if let Some(error) = &report.test.error {
        println!();
        println!("Error Type: {}", error.error_type);
        println!("Error Message: {}", error.error_message);
    } else if report.test.status == TestStatus::Failed {
        println!();
        println!("Error: (no error detail on the failure record)");
    }

    for (label, field) in [
        ("Prompt", "prompt"),
        ("Model Result (decoded)", "model_result_decoded"),
        ("Expected Answer", "possible_answer"),
    ] {
        if let Some(value) = report.test.record.get(field) {
            println!();
            println!("{label}:");
            match serde_json::to_string_pretty(value) {
                Ok(pretty) => println!("{pretty}"),
                Err(_) => println!("{value}"),
            }
        }
    }
}
