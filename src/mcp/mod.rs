// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! MCP server: JSON-RPC dispatch from tool names to Oura client calls.
//!
//! This layer is deliberately thin: it resolves natural-language dates,
//! calls the typed client, and renders each [`ApiError`] kind as an
//! actionable JSON-RPC error. All protocol-with-Oura logic lives in
//! [`crate::client`].

pub mod schema;

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::client::{DateRange, OuraClient};
use crate::constants::{errors, protocol};
use crate::dates::{resolve_datetime_range, resolve_range};
use crate::errors::ApiError;
use crate::logging::AppLogger;
use crate::mcp::schema::InitializeResponse;

pub struct McpServer {
    client: Arc<OuraClient>,
}

impl McpServer {
    pub fn new(client: Arc<OuraClient>) -> Self {
        Self { client }
    }

    pub async fn run(self, port: u16) -> Result<()> {
        use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
        info!("MCP server listening on port {}", port);

        loop {
            let (socket, addr) = listener.accept().await?;
            info!("New connection from {}", addr);

            let client = self.client.clone();

            tokio::spawn(async move {
                let (reader, mut writer) = socket.into_split();
                let mut reader = BufReader::new(reader);
                let mut line = String::new();

                while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
                    if let Ok(request) = serde_json::from_str::<McpRequest>(&line) {
                        let response = handle_request(request, &client).await;
                        if let Ok(mut response_str) = serde_json::to_string(&response) {
                            response_str.push('\n');
                            if let Err(e) = writer.write_all(response_str.as_bytes()).await {
                                debug!("Dropping connection, reply write failed: {e}");
                                break;
                            }
                        }
                    }
                    line.clear();
                }
            });
        }
    }
}

#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct McpError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

fn success(result: Value, id: Value) -> McpResponse {
    McpResponse {
        jsonrpc: protocol::JSONRPC_VERSION.to_string(),
        result: Some(result),
        error: None,
        id,
    }
}

fn failure(error: McpError, id: Value) -> McpResponse {
    McpResponse {
        jsonrpc: protocol::JSONRPC_VERSION.to_string(),
        result: None,
        error: Some(error),
        id,
    }
}

async fn handle_request(request: McpRequest, client: &OuraClient) -> McpResponse {
    match request.method.as_str() {
        "initialize" => {
            let init_response = InitializeResponse::new(
                protocol::mcp_protocol_version(),
                protocol::server_name(),
                protocol::SERVER_VERSION.to_string(),
            );

            match serde_json::to_value(&init_response) {
                Ok(value) => success(value, request.id),
                Err(e) => failure(
                    McpError {
                        code: errors::ERROR_INTERNAL_ERROR,
                        message: format!("Failed to build initialize response: {e}"),
                        data: None,
                    },
                    request.id,
                ),
            }
        }
        "tools/list" => {
            let tools = schema::create_oura_tools();
            match serde_json::to_value(&tools) {
                Ok(value) => success(json!({ "tools": value }), request.id),
                Err(e) => failure(
                    McpError {
                        code: errors::ERROR_INTERNAL_ERROR,
                        message: format!("Failed to list tools: {e}"),
                        data: None,
                    },
                    request.id,
                ),
            }
        }
        "resources/list" => {
            let resources = schema::create_oura_resources();
            match serde_json::to_value(&resources) {
                Ok(value) => success(json!({ "resources": value }), request.id),
                Err(e) => failure(
                    McpError {
                        code: errors::ERROR_INTERNAL_ERROR,
                        message: format!("Failed to list resources: {e}"),
                        data: None,
                    },
                    request.id,
                ),
            }
        }
        "resources/read" => {
            let params = request.params.unwrap_or_default();
            let uri = params["uri"].as_str().unwrap_or("").to_string();

            match read_resource(&uri, client).await {
                Ok(value) => success(value, request.id),
                Err(error) => failure(error, request.id),
            }
        }
        "tools/call" => {
            let params = request.params.unwrap_or_default();
            let tool_name = params["name"].as_str().unwrap_or("").to_string();
            let args = params["arguments"].clone();

            let started = Instant::now();
            let result = call_tool(&tool_name, &args, client).await;
            AppLogger::log_mcp_tool_call(
                &tool_name,
                result.is_ok(),
                started.elapsed().as_millis() as u64,
            );

            match result {
                Ok(value) => success(value, request.id),
                Err(error) => failure(error, request.id),
            }
        }
        _ => failure(
            McpError {
                code: errors::ERROR_METHOD_NOT_FOUND,
                message: errors::MSG_METHOD_NOT_FOUND.to_string(),
                data: None,
            },
            request.id,
        ),
    }
}

async fn call_tool(tool_name: &str, args: &Value, client: &OuraClient) -> Result<Value, McpError> {
    match tool_name {
        "get_personal_info" => to_result(client.get_personal_info().await),
        "get_ring_configuration" => to_result(client.get_ring_configuration().await),
        "get_heartrate" => {
            let start = args["start_datetime"]
                .as_str()
                .ok_or_else(|| invalid_params("start_datetime is required"))?;
            let range = resolve_datetime_range(start, args["end_datetime"].as_str())
                .map_err(|e| invalid_params(&e.to_string()))?;
            to_result(client.get_heartrate(&range).await)
        }
        "get_sleep_document" | "get_workout_document" | "get_session_document" => {
            let id = args["id"]
                .as_str()
                .ok_or_else(|| invalid_params("id is required"))?;
            let result = match tool_name {
                "get_sleep_document" => to_result(client.get_sleep_period(id).await),
                "get_workout_document" => to_result(client.get_workout(id).await),
                _ => to_result(client.get_session(id).await),
            };
            // A missing document reads as "no data", not a hard failure
            match result {
                Err(ref error) if error.data_kind() == Some("not_found") => Ok(Value::Null),
                other => other,
            }
        }
        "get_daily_sleep"
        | "get_daily_activity"
        | "get_daily_readiness"
        | "get_daily_stress"
        | "get_daily_spo2"
        | "get_daily_resilience"
        | "get_daily_cardiovascular_age"
        | "get_sleep_periods"
        | "get_sleep_time"
        | "get_workouts"
        | "get_sessions"
        | "get_enhanced_tags"
        | "get_rest_mode_periods"
        | "get_vo2_max" => {
            let range = resolve_range(args["start_date"].as_str(), args["end_date"].as_str())
                .map_err(|e| invalid_params(&e.to_string()))?;

            match tool_name {
                "get_daily_sleep" => to_result(client.get_daily_sleep(&range).await),
                "get_daily_activity" => to_result(client.get_daily_activity(&range).await),
                "get_daily_readiness" => to_result(client.get_daily_readiness(&range).await),
                "get_daily_stress" => to_result(client.get_daily_stress(&range).await),
                "get_daily_spo2" => to_result(client.get_daily_spo2(&range).await),
                "get_daily_resilience" => to_result(client.get_daily_resilience(&range).await),
                "get_daily_cardiovascular_age" => {
                    to_result(client.get_daily_cardiovascular_age(&range).await)
                }
                "get_sleep_periods" => to_result(client.get_sleep_periods(&range).await),
                "get_sleep_time" => to_result(client.get_sleep_time(&range).await),
                "get_workouts" => to_result(client.get_workouts(&range).await),
                "get_sessions" => to_result(client.get_sessions(&range).await),
                "get_enhanced_tags" => to_result(client.get_enhanced_tags(&range).await),
                "get_rest_mode_periods" => to_result(client.get_rest_mode_periods(&range).await),
                _ => to_result(client.get_vo2_max(&range).await),
            }
        }
        _ => Err(McpError {
            code: errors::ERROR_METHOD_NOT_FOUND,
            message: format!("{}: {}", errors::MSG_UNKNOWN_TOOL, tool_name),
            data: None,
        }),
    }
}

/// Read one of the parameterless `oura://` resources: pre-built summaries
/// composed from the same client calls the tools use.
async fn read_resource(uri: &str, client: &OuraClient) -> Result<Value, McpError> {
    let body = match uri {
        "oura://summary/today" => daily_summary(client, Local::now().date_naive()).await?,
        "oura://summary/yesterday" => {
            daily_summary(client, Local::now().date_naive() - Duration::days(1)).await?
        }
        "oura://personal/info" => {
            let personal = to_result(client.get_personal_info().await)?;
            let rings = client.get_ring_configuration().await.map_err(|e| render_api_error(&e))?;
            json!({
                "personal_info": personal,
                "ring_configuration": rings.first(),
            })
        }
        "oura://recent/sleep" => to_result(client.get_daily_sleep(&last_week_range()).await)?,
        "oura://recent/activity" => {
            to_result(client.get_daily_activity(&last_week_range()).await)?
        }
        _ => {
            return Err(McpError {
                code: errors::ERROR_INVALID_PARAMS,
                message: format!("{}: {}", errors::MSG_UNKNOWN_RESOURCE, uri),
                data: None,
            })
        }
    };

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "application/json",
            "text": body.to_string(),
        }]
    }))
}

/// One day's readiness, sleep, and activity scores side by side.
async fn daily_summary(client: &OuraClient, day: NaiveDate) -> Result<Value, McpError> {
    let range = DateRange::new(day, Some(day));

    let readiness = client.get_daily_readiness(&range).await.map_err(|e| render_api_error(&e))?;
    let sleep = client.get_daily_sleep(&range).await.map_err(|e| render_api_error(&e))?;
    let activity = client.get_daily_activity(&range).await.map_err(|e| render_api_error(&e))?;

    Ok(json!({
        "date": day.format("%Y-%m-%d").to_string(),
        "readiness": readiness.first(),
        "sleep": sleep.first(),
        "activity": activity.first(),
    }))
}

fn last_week_range() -> DateRange {
    let today = Local::now().date_naive();
    DateRange::new(today - Duration::days(7), Some(today))
}

fn to_result<T: Serialize>(result: Result<T, ApiError>) -> Result<Value, McpError> {
    match result {
        Ok(value) => serde_json::to_value(value).map_err(|e| McpError {
            code: errors::ERROR_INTERNAL_ERROR,
            message: format!("Failed to serialize result: {e}"),
            data: None,
        }),
        Err(error) => Err(render_api_error(&error)),
    }
}

fn invalid_params(message: &str) -> McpError {
    McpError {
        code: errors::ERROR_INVALID_PARAMS,
        message: message.to_string(),
        data: None,
    }
}

/// Map an [`ApiError`] kind to an actionable JSON-RPC error. The kind,
/// status and detail ride along in `data` so programmatic callers do not
/// have to parse the message text.
fn render_api_error(error: &ApiError) -> McpError {
    let (code, guidance) = match error {
        ApiError::Auth { .. } => (
            errors::ERROR_UNAUTHORIZED,
            "Re-authorize with Oura or update OURA_ACCESS_TOKEN.",
        ),
        ApiError::Forbidden { .. } => (
            errors::ERROR_UNAUTHORIZED,
            "Grant the required scope or renew the Oura subscription.",
        ),
        ApiError::InvalidRequest { .. } => (errors::ERROR_INVALID_PARAMS, ""),
        ApiError::RateLimited { .. } => (
            errors::ERROR_INTERNAL_ERROR,
            "Oura API quota exceeded; wait before retrying.",
        ),
        _ => (errors::ERROR_INTERNAL_ERROR, ""),
    };

    let message = if guidance.is_empty() {
        error.to_string()
    } else {
        format!("{error}. {guidance}")
    };

    McpError {
        code,
        message,
        data: Some(json!({
            "kind": error.kind(),
            "status": error.status(),
            "detail": error.to_string(),
        })),
    }
}

impl McpError {
    fn data_kind(&self) -> Option<&str> {
        self.data.as_ref()?.get("kind")?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::OuraClient;
    use crate::oauth::{CredentialStore, Credentials};
    use mockito::{Matcher, Server};

    fn test_client(base_url: &str) -> OuraClient {
        let store = Arc::new(
            CredentialStore::new(Credentials::static_token("test_token"), None)
                .expect("store should build"),
        );
        OuraClient::with_base_url(store, base_url).expect("client should build")
    }

    #[tokio::test]
    async fn test_read_recent_sleep_resource() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v2/usercollection/daily_sleep")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "data": [{"id": "a1", "day": "2024-01-01", "score": 90}],
                    "next_token": null
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = read_resource("oura://recent/sleep", &client)
            .await
            .expect("resource should read");

        let content = &result["contents"][0];
        assert_eq!(content["uri"], "oura://recent/sleep");
        assert_eq!(content["mimeType"], "application/json");

        let body: Value =
            serde_json::from_str(content["text"].as_str().unwrap()).expect("text should parse");
        assert_eq!(body[0]["score"], 90);
    }

    #[tokio::test]
    async fn test_today_summary_composes_three_endpoints() {
        let mut server = Server::new_async().await;

        let page = |id: &str, score: u32| {
            json!({
                "data": [{"id": id, "day": "2024-01-01", "score": score}],
                "next_token": null
            })
            .to_string()
        };

        let readiness = server
            .mock("GET", "/v2/usercollection/daily_readiness")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(page("r1", 80))
            .expect(1)
            .create_async()
            .await;
        let sleep = server
            .mock("GET", "/v2/usercollection/daily_sleep")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(page("s1", 90))
            .expect(1)
            .create_async()
            .await;
        let activity = server
            .mock("GET", "/v2/usercollection/daily_activity")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(page("a1", 70))
            .expect(1)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = read_resource("oura://summary/today", &client)
            .await
            .expect("resource should read");

        let body: Value =
            serde_json::from_str(result["contents"][0]["text"].as_str().unwrap())
                .expect("text should parse");
        assert_eq!(body["readiness"]["score"], 80);
        assert_eq!(body["sleep"]["score"], 90);
        assert_eq!(body["activity"]["score"], 70);
        assert_eq!(
            body["date"],
            Local::now().date_naive().format("%Y-%m-%d").to_string()
        );

        readiness.assert_async().await;
        sleep.assert_async().await;
        activity.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_resource_uri_is_rejected() {
        // No HTTP server; an unknown URI must fail before any request
        let client = test_client("http://127.0.0.1:1");
        let result = read_resource("oura://nope", &client).await;

        match result {
            Err(error) => {
                assert_eq!(error.code, errors::ERROR_INVALID_PARAMS);
                assert!(error.message.contains("Unknown resource"));
            }
            Ok(other) => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_render_auth_error_suggests_reauthorization() {
        let error = ApiError::Auth {
            detail: "token revoked".to_string(),
        };
        let rendered = render_api_error(&error);

        assert_eq!(rendered.code, errors::ERROR_UNAUTHORIZED);
        assert!(rendered.message.contains("Re-authorize"));
        assert_eq!(rendered.data_kind(), Some("auth"));
    }

    #[test]
    fn test_render_rate_limited_suggests_backoff() {
        let error = ApiError::RateLimited {
            status: 429,
            detail: "quota exceeded".to_string(),
        };
        let rendered = render_api_error(&error);

        assert!(rendered.message.contains("wait before retrying"));
        let data = rendered.data.unwrap();
        assert_eq!(data["status"], 429);
        assert_eq!(data["kind"], "rate_limited");
    }

    #[test]
    fn test_render_invalid_request_maps_to_invalid_params() {
        let error = ApiError::InvalidRequest {
            status: 422,
            detail: "start_date must precede end_date".to_string(),
        };
        let rendered = render_api_error(&error);

        assert_eq!(rendered.code, errors::ERROR_INVALID_PARAMS);
        assert!(rendered.message.contains("start_date must precede end_date"));
    }
}
