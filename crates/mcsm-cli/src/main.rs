//! CLI entry point - the composition root.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcsm_cli::handlers::serve::ServeOverrides;
use mcsm_cli::{Cli, Commands, handlers};
use mcsm_runtime::SetupRequest;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve {
            host,
            http_port,
            ws_port,
        } => {
            let overrides = ServeOverrides {
                host,
                http_port,
                ws_port,
            };
            handlers::serve::execute(&cli.config, overrides).await
        }
        Commands::Setup {
            dir,
            version,
            min_memory,
            max_memory,
            accept_eula,
            force,
        } => {
            let mut request = SetupRequest::new(dir);
            request.version = version;
            request.min_memory = min_memory;
            request.max_memory = max_memory;
            request.accept_eula = accept_eula;
            request.force_download = force;
            handlers::setup::execute(request).await
        }
        Commands::Properties { dir, set } => handlers::properties::execute(&dir, set),
    }
}
