use crate::config::ServiceConfig;
use crate::telemetry::LogFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "propago", version, about = "Graph neural network node scoring")]
pub struct Cli {
    /// Log output format.
    #[arg(long, global = true, env = "PROPAGO_LOG_FORMAT", value_enum, default_value = "json")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default if no subcommand given).
    Serve(ServeArgs),

    /// Score a request file offline with the `/gcn/advanced` pipeline.
    Score {
        /// Path to a JSON request body.
        path: PathBuf,

        /// Pretty-print the response.
        #[arg(long)]
        pretty: bool,
    },

    /// List the available model types.
    Models,
}

#[derive(Debug, Clone, Parser)]
pub struct ServeArgs {
    #[arg(long, env = "PROPAGO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PROPAGO_PORT", default_value = "8000")]
    pub port: u16,

    #[command(flatten)]
    pub service: ServiceArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ServiceArgs {
    /// Training epochs used by `/gcn/importance`.
    #[arg(long, env = "PROPAGO_IMPORTANCE_EPOCHS", default_value = "100")]
    pub importance_epochs: usize,

    /// Correlation threshold used when `/gcn/compare` builds a graph from returns.
    #[arg(long, default_value = "0.3")]
    pub compare_correlation_threshold: f64,
}

impl From<ServiceArgs> for ServiceConfig {
    fn from(args: ServiceArgs) -> Self {
        ServiceConfig::default()
            .with_importance_epochs(args.importance_epochs)
            .with_compare_correlation_threshold(args.compare_correlation_threshold)
    }
}
