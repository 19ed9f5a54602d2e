use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Check a motor configuration offline and print the controller programming it produces
#[derive(Parser, Debug)]
#[command(name = "smart-motor", version, about)]
struct Args {
    /// JSON motor configuration
    config: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(LevelFilter::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = smart_motor::audit::run(&args.config, args.json) {
        eprintln!("Audit error: {}", e);
        std::process::exit(1);
    }
}
