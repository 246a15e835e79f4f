use anyhow::Context;
use clap::Parser;
use propago_nn::ModelKind;
use propago_server::cli::{Cli, Commands, ServeArgs};
use propago_server::config::ServiceConfig;
use propago_server::server::{self, AppState};
use propago_server::types::AdvancedRequest;
use propago_server::{service, telemetry};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format)?;

    let cmd = cli
        .command
        .unwrap_or_else(|| Commands::Serve(ServeArgs::parse_from(["propago"])));

    match cmd {
        Commands::Serve(args) => {
            let addr: SocketAddr = format!("{}:{}", args.host, args.port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", args.host, args.port))?;
            let config = ServiceConfig::from(args.service);
            config.validate()?;
            tracing::info!(
                importance_epochs = config.importance_epochs,
                compare_correlation_threshold = config.compare_correlation_threshold,
                "starting propago"
            );
            server::serve(addr, AppState::new(config)).await?;
        }
        Commands::Score { path, pretty } => {
            let body = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading {}", path.display()))?;
            let req: AdvancedRequest = serde_json::from_str(&body)
                .with_context(|| format!("parsing {}", path.display()))?;
            let resp = tokio::task::spawn_blocking(move || service::advanced(&req)).await??;
            let out = if pretty {
                serde_json::to_string_pretty(&resp)?
            } else {
                serde_json::to_string(&resp)?
            };
            println!("{out}");
        }
        Commands::Models => {
            for kind in ModelKind::ALL {
                println!("{:<10}{}", kind.as_str(), kind.description());
            }
        }
    }

    Ok(())
}
