// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use oura_mcp_server::client::OuraClient;
use oura_mcp_server::config::Config;
use oura_mcp_server::constants::env_config;
use oura_mcp_server::logging;
use oura_mcp_server::mcp::McpServer;
use oura_mcp_server::oauth::CredentialStore;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let args = Args::parse();
    let port = args.port.unwrap_or_else(env_config::mcp_port);

    let config = Config::load(args.config)?;
    config.validate()?;

    let store = Arc::new(CredentialStore::new(
        config.credentials()?,
        Some(Box::new(config.token_sink())),
    )?);
    let client = Arc::new(OuraClient::new(store)?);

    info!("Starting Oura MCP Server on port {}", port);

    let server = McpServer::new(client);
    server.run(port).await?;

    Ok(())
}
