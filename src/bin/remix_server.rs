//! Stdio MCP server exposing the remix tool to upload-capable clients.

use clap::{ArgAction, Parser};
use nanoremix::mcp::McpServer;
use nanoremix::GeminiModel;

#[derive(Parser)]
#[command(name = "remix_server")]
#[command(about = "Serve the image remix tool over MCP (JSON-RPC on stdin/stdout)")]
#[command(version)]
struct Cli {
    /// Model variant (nano-banana, nano-banana-pro)
    #[arg(short, long, default_value = "nano-banana")]
    model: GeminiModel,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    nanoremix::logging::init(cli.verbose)?;

    tracing::info!(model = cli.model.as_str(), "starting MCP server");
    let mut server = McpServer::new(cli.model);
    server.run().await?;
    Ok(())
}
