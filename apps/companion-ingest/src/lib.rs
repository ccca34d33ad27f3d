pub mod manifest;
pub mod pipeline;

use std::path::PathBuf;

use clap::Parser;

use crate::pipeline::Pipeline;

#[derive(Debug, Parser)]
#[command(
	version = companion_cli::VERSION,
	rename_all = "kebab",
	styles = companion_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Directory of raw `.txt` transcripts, one episode per file.
	#[arg(long, value_name = "DIR")]
	pub raw_dir: PathBuf,
	/// Re-segment every transcript even when its fingerprint is unchanged.
	#[arg(long)]
	pub force: bool,
}

pub fn run(args: Args) -> color_eyre::Result<()> {
	let config = companion_config::load(&args.config)?;

	companion_cli::init_tracing(&config.service.log_level);

	let pipeline = Pipeline::new(args.raw_dir, config.storage.artifacts_dir)?;
	let report = pipeline.run(args.force)?;

	tracing::info!(
		scanned = report.scanned,
		segmented = report.segmented,
		unchanged = report.unchanged,
		removed = report.removed,
		chunks = report.chunks,
		"Ingestion finished."
	);

	Ok(())
}
