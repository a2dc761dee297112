use anyhow::Result;
use clap::Parser;

mod categorize;
mod compare;
mod discover;
mod extract;
mod load;

#[derive(Parser, Debug)]
#[command(name = "bfcl-results")]
#[command(about = "Interpret BFCL benchmark result/score files.", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Classify tests as stable-pass, flaky, or stable-fail across all
    /// discovered runs.
    Categorize(categorize::CategorizeArgs),
    /// Diff two runs of one category: regressions and improvements.
    Compare(compare::CompareArgs),
    /// Show one test's full record, status, and error detail.
    Extract(extract::ExtractArgs),
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            std::process::ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<std::process::ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Categorize(args) => categorize::cmd_categorize(args),
        Command::Compare(args) => compare::cmd_compare(args),
        Command::Extract(args) => extract::cmd_extract(args),
    }
}
