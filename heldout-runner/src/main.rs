use std::path::PathBuf;

use clap::Parser;
use heldout_core::io::{build_output_path, read_lines, write_rows};
use heldout_core::model::Rankings;
use heldout_core::{HeldOutPipeline, PipelineOptions};

/// Held-out trigram estimator over n-gram corpus files.
///
/// Input lines: `w1 w2 w3 \t year \t count \t pages \t books`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Corpus files, read in order.
	#[arg(required = true)]
	inputs: Vec<PathBuf>,

	/// Where to write the ranked `w1 w2 w3 \t probability` lines.
	/// Defaults to `<first input>.ranked`.
	#[arg(long)]
	output: Option<PathBuf>,

	/// Also write every intermediate stage next to the first input
	/// (`.step1`, `.step2`, `.step3`). Implies `--rebuild`.
	#[arg(long)]
	stages: bool,

	/// Worker threads. Defaults to the number of CPUs.
	#[arg(long)]
	workers: Option<usize>,

	/// Disable pre-aggregation after each map chunk.
	#[arg(long)]
	no_combine: bool,

	/// Seed for a reproducible corpus split.
	#[arg(long)]
	seed: Option<u64>,

	/// Ignore an existing `.bin` rankings snapshot and recompute.
	#[arg(long)]
	rebuild: bool,

	/// Print the completions of a two-word prefix, e.g. `--prefix "old man"`.
	#[arg(long)]
	prefix: Option<String>,

	/// Turn debugging information on (-v, -vv, -vvv).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn setup_logging(verbose: u8) {
	let level = match verbose {
		0 => log::LevelFilter::Info,
		1 => log::LevelFilter::Debug,
		_ => log::LevelFilter::Trace,
	};
	env_logger::Builder::new().filter_level(level).parse_default_env().init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	setup_logging(args.verbose);

	let first_input = &args.inputs[0];
	let snapshot_path = build_output_path(first_input, "bin")?;

	let rankings = if reuse_snapshot(&args, snapshot_path.exists()) {
		log::info!("loading snapshot {}", snapshot_path.display());
		Rankings::load(&snapshot_path)?
	} else {
		let rankings = compute(&args)?;
		rankings.save(&snapshot_path)?;
		log::info!("snapshot written to {}", snapshot_path.display());
		rankings
	};

	let output = match &args.output {
		Some(path) => path.clone(),
		None => build_output_path(first_input, "ranked")?,
	};
	write_rows(&output, &rankings.to_lines())?;
	log::info!("{} ranked trigrams written to {}", rankings.len(), output.display());

	if let Some(prefix) = &args.prefix {
		let words: Vec<&str> = prefix.split_whitespace().collect();
		match words.as_slice() {
			[w1, w2] => {
				for completion in rankings.completions(w1, w2) {
					println!("{w1} {w2} {}\t{}", completion.word, completion.probability);
				}
			}
			_ => return Err(format!("prefix must be two words, got {prefix:?}").into()),
		}
	}

	Ok(())
}

/// Whether an existing snapshot stands in for running the stages.
///
/// Stage files only exist after a full run, so `--stages` always recomputes.
fn reuse_snapshot(args: &Args, snapshot_exists: bool) -> bool {
	if !snapshot_exists || args.rebuild {
		return false;
	}
	if args.stages {
		log::info!("--stages given, ignoring the existing snapshot");
		return false;
	}
	true
}

/// Reads every input and runs the four stages.
fn compute(args: &Args) -> Result<Rankings, Box<dyn std::error::Error>> {
	let mut options = PipelineOptions::default();
	if let Some(workers) = args.workers {
		options.set_workers(workers)?;
	}
	options.set_combine(!args.no_combine);
	options.set_seed(args.seed);
	log::debug!("{options:?}");

	let mut lines = Vec::new();
	for input in &args.inputs {
		let mut file_lines = read_lines(input)?;
		log::info!("{}: {} lines", input.display(), file_lines.len());
		lines.append(&mut file_lines);
	}

	let pipeline = HeldOutPipeline::new(&options)?;
	let run = pipeline.run(lines)?;

	if args.stages {
		let first_input = &args.inputs[0];
		write_rows(build_output_path(first_input, "step1")?, &run.half_counts)?;
		write_rows(build_output_path(first_input, "step2")?, &run.class_stats)?;
		write_rows(build_output_path(first_input, "step3")?, &run.estimates)?;
	}

	println!("{}", run.summary());
	Ok(run.rankings)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn args(extra: &[&str]) -> Args {
		let mut argv = vec!["heldout-runner", "corpus.txt"];
		argv.extend_from_slice(extra);
		Args::parse_from(argv)
	}

	#[test]
	fn snapshot_is_reused_by_default() {
		assert!(reuse_snapshot(&args(&[]), true));
		assert!(!reuse_snapshot(&args(&[]), false));
	}

	#[test]
	fn rebuild_and_stages_recompute() {
		assert!(!reuse_snapshot(&args(&["--rebuild"]), true));
		assert!(!reuse_snapshot(&args(&["--stages"]), true));
	}
}
