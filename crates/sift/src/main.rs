use clap::Parser;
use sift::cli::{run, Cli};

const ENV_LOG: &str = "SIFT_LOG";

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed arguments");
    run(cli, &mut std::io::stdout().lock())
}
