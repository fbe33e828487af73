//! Hivemind CLI - lifecycle manager for generated agent workers

use clap::Parser;

use hivemind_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
