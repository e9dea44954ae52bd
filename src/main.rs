use anyhow::Result;
use clap::Parser;

mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    idcard::logging::init();
    let cli = cli::Cli::parse();
    cli::run(cli).await
}
