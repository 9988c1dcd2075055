mod attribute;
mod candidate;
mod candidates;
mod cli;
mod config;
mod review;
mod schema;
mod types;
mod util;
mod validator;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Init(args) => review::orchestrator::run_init(&args.config, args.r#override),
        Commands::Validate(args) => {
            review::orchestrator::run_validate(
                &args.files,
                &args.base,
                &args.config,
                &args.root,
                args.schema_dir.as_deref(),
                args.output.as_deref(),
            )
            .await
        }
    }
}
