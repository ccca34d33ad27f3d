use clap::Parser;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = companion_ingest::Args::parse();

	companion_ingest::run(args)
}
