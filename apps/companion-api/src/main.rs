use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = companion_api::Args::parse();

	companion_api::run(args).await
}
