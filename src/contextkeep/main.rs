use clap::Parser;
use contextkeep::args::{Cli, Commands};
use contextkeep::error::Result;
use contextkeep::mcp::McpServer;
use contextkeep::{http, init};
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout belongs to the stdio transport
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Stdio => {
            let store = Arc::new(init::open_store(cli.data_dir)?);
            McpServer::new(store).run()
        }
        Commands::Http { host, port } => {
            let store = Arc::new(init::open_store(cli.data_dir)?);
            http::serve(store, &host, port).await
        }
        Commands::GenerateConfig => {
            let exe = std::env::current_exe()?;
            let config = json!({
                "mcpServers": {
                    "context-keep": {
                        "command": exe.display().to_string(),
                        "args": ["stdio"],
                    }
                }
            });
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
