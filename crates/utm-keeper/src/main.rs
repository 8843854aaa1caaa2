mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;

fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Version = cli.command {
        return commands::version::run();
    }

    let ctx = Context::load(cli.dir.as_deref(), cli.overrides())?;

    match cli.command {
        Commands::Capture { url } => commands::capture::run(&ctx, &url),
        Commands::Show => commands::show::run(&ctx),
        Commands::Params => commands::params::run(&ctx),
        Commands::Object => commands::params::run_object(&ctx),
        Commands::Append { url } => commands::append::run(&ctx, &url),
        Commands::Clear => commands::clear::run(&ctx),
        Commands::Fetch {
            url,
            method,
            skip_utm,
        } => commands::fetch::run(&ctx, &url, &method, skip_utm),
        Commands::Config => commands::config::run(&ctx),
        Commands::Version => commands::version::run(),
    }
}
