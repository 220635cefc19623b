// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Oura MCP Server
//!
//! A Model Context Protocol (MCP) server exposing Oura Ring health data
//! to Claude and other AI assistants. The heart of the crate is a typed,
//! authenticated client for the Oura API v2 that handles the bearer-token
//! lifecycle, transparent `next_token` pagination, and a fixed taxonomy
//! of failure kinds.
//!
//! ## Features
//!
//! - **OAuth2 token lifecycle**: automatic single refresh-and-retry on
//!   401, with rotated tokens persisted to a local token file
//! - **Transparent pagination**: collection endpoints aggregate every
//!   page into one result, preserving server order
//! - **Typed responses**: per-endpoint record shapes validated at the
//!   parse boundary
//! - **Typed errors**: auth, forbidden, not-found, invalid-request,
//!   rate-limited, server, transport and protocol kinds, each carrying
//!   status and server-provided detail
//! - **MCP protocol**: standard tool interface for AI assistants
//!
//! ## Quick Start
//!
//! 1. Set `OURA_ACCESS_TOKEN` (and optionally `OURA_REFRESH_TOKEN`,
//!    `OURA_CLIENT_ID`, `OURA_CLIENT_SECRET` for refresh support)
//! 2. Start the server with `oura-mcp-server`
//! 3. Connect from Claude or another MCP client
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use oura_mcp_server::client::{DateRange, OuraClient};
//! use oura_mcp_server::config::Config;
//! use oura_mcp_server::oauth::CredentialStore;
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let store = Arc::new(CredentialStore::new(
//!         config.credentials()?,
//!         Some(Box::new(config.token_sink())),
//!     )?);
//!     let client = OuraClient::new(store)?;
//!
//!     let range = DateRange::new(
//!         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 1, 7),
//!     );
//!     let summaries = client.get_daily_sleep(&range).await?;
//!     for summary in summaries {
//!         println!("{}: {:?}", summary.day, summary.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Authenticated Oura API client with pagination and retry
pub mod client;

/// Configuration management and token persistence
pub mod config;

/// Application constants and environment-based configuration values
pub mod constants;

/// Natural-language date resolution for tool arguments
pub mod dates;

/// Error taxonomy for upstream API failures
pub mod errors;

/// Production logging and structured output
pub mod logging;

/// Model Context Protocol server implementation
pub mod mcp;

/// Typed Oura API v2 response models
pub mod models;

/// Credential store and OAuth2 token refresh
pub mod oauth;
