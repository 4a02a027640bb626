use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod report;
mod runner;

#[derive(Parser)]
#[command(name = "lung-runner")]
#[command(version, about = "Candidate generation and evaluation for lung microscopy images", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a batch of images and generate structure candidates
    Segment(runner::SegmentArgs),

    /// Match predictions against ground truth and report ROC / PR metrics
    Evaluate {
        /// Evaluation data file ({"truth": ..., "predictions": ...});
        /// defaults to $LUNGMAP_EVAL_FILE or ~/dataset/lungmap/eval.json
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Also write the full report as JSON
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()
    {
        eprintln!("cannot install logger: {e}");
    }

    let ans = match cli.command {
        Commands::Segment(args) => runner::segment(&args),
        Commands::Evaluate { file, json } => runner::evaluate(file, json),
    };
    match ans {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
