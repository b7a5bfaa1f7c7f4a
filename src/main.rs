use anyhow::Result;
use clap::Parser;
use fintrack::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;
    let filter = if cli.verbose {
        "fintrack=debug"
    } else {
        settings.log_filter.as_str()
    };
    fintrack::logging::init(filter);
    cli.run(settings).await
}
