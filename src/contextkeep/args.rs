use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "contextkeep")]
#[command(about = "Local-first memory keeper with tool-call and HTTP front-ends", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the storage directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve memory tools over stdio (for MCP clients)
    Stdio,

    /// Serve the HTTP API
    Http {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind
        #[arg(long, default_value_t = 5000)]
        port: u16,
    },

    /// Print MCP client configuration JSON
    GenerateConfig,
}
