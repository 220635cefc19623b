// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.

/// Protocol-related constants
pub mod protocol {
    use std::env;

    /// Get MCP Protocol version from environment or default
    pub fn mcp_protocol_version() -> String {
        env::var("MCP_PROTOCOL_VERSION").unwrap_or_else(|_| MCP_PROTOCOL_VERSION.to_string())
    }

    /// JSON-RPC version (standard, not configurable)
    pub const JSONRPC_VERSION: &str = "2.0";

    /// Get server name from environment or default
    pub fn server_name() -> String {
        env::var("SERVER_NAME").unwrap_or_else(|_| SERVER_NAME.to_string())
    }

    /// Server version from Cargo.toml
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

    pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
    pub const SERVER_NAME: &str = "oura-mcp-server";
}

/// Environment-based configuration
pub mod env_config {
    use std::env;

    /// Get MCP server port from environment or default
    pub fn mcp_port() -> u16 {
        env::var("MCP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080)
    }

    /// Get Oura OAuth client ID from environment
    pub fn oura_client_id() -> Option<String> {
        env::var("OURA_CLIENT_ID").ok()
    }

    /// Get Oura OAuth client secret from environment
    pub fn oura_client_secret() -> Option<String> {
        env::var("OURA_CLIENT_SECRET").ok()
    }

    /// Get Oura API base URL from environment or default
    pub fn oura_api_base() -> String {
        env::var("OURA_API_BASE").unwrap_or_else(|_| super::endpoints::OURA_API_BASE.to_string())
    }

    /// Get Oura token endpoint URL from environment or default
    pub fn oura_token_url() -> String {
        env::var("OURA_TOKEN_URL").unwrap_or_else(|_| super::endpoints::OURA_TOKEN_URL.to_string())
    }

    /// Get log level from environment or default
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}

/// API endpoints and URLs
pub mod endpoints {
    /// Oura API v2
    pub const OURA_API_BASE: &str = "https://api.ouraring.com";
    pub const OURA_AUTH_URL: &str = "https://cloud.ouraring.com/oauth/authorize";
    pub const OURA_TOKEN_URL: &str = "https://api.ouraring.com/oauth/token";
}

/// JSON-RPC and MCP error codes
pub mod errors {
    /// Method not found
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;

    /// Invalid parameters
    pub const ERROR_INVALID_PARAMS: i32 = -32602;

    /// Internal error
    pub const ERROR_INTERNAL_ERROR: i32 = -32603;

    /// Unauthorized (custom error code)
    pub const ERROR_UNAUTHORIZED: i32 = -32000;

    /// Common error messages
    pub const MSG_METHOD_NOT_FOUND: &str = "Method not found";
    pub const MSG_UNKNOWN_TOOL: &str = "Unknown tool";
    pub const MSG_UNKNOWN_RESOURCE: &str = "Unknown resource";
}

/// Numeric limits and thresholds
pub mod limits {
    /// Bounded timeout for a single HTTP call to the Oura API
    pub const HTTP_TIMEOUT_SECS: u64 = 30;
}

/// OAuth scopes
pub mod oauth {
    /// Scopes required to read every endpoint family this server exposes
    pub const OURA_DEFAULT_SCOPES: &str =
        "email personal daily heartrate workout session tag spo2Daily";
}
