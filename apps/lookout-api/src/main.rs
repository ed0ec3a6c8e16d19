use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = lookout_api::Args::parse();
	lookout_api::run(args).await
}
