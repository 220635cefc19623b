// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! MCP Protocol Schema Definitions
//!
//! Type-safe definitions for MCP protocol messages and tool schemas.
//! Most Oura tools share one of three parameter shapes (date range,
//! datetime range, no parameters), so the schemas are built from shared
//! constructors instead of one hand-rolled function per tool.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server Information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// MCP Tool Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonSchema,
}

/// JSON Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, PropertySchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

/// JSON Schema Property Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// MCP Resource Schema Definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSchema {
    pub uri: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// MCP Server Capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: Vec<ToolSchema>,
    pub resources: Vec<ResourceSchema>,
}

/// Complete MCP Initialize Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
    pub capabilities: ServerCapabilities,
}

impl InitializeResponse {
    /// Create a new initialize response with current server configuration
    pub fn new(protocol_version: String, server_name: String, server_version: String) -> Self {
        Self {
            protocol_version,
            server_info: ServerInfo {
                name: server_name,
                version: server_version,
            },
            capabilities: ServerCapabilities {
                tools: create_oura_tools(),
                resources: create_oura_resources(),
            },
        }
    }
}

/// All tool schemas exposed by this server
pub fn create_oura_tools() -> Vec<ToolSchema> {
    vec![
        date_range_tool(
            "get_daily_sleep",
            "Get daily sleep summaries including sleep score and contributors",
        ),
        date_range_tool("get_daily_activity", "Get daily activity summaries"),
        date_range_tool("get_daily_readiness", "Get daily readiness summaries"),
        date_range_tool("get_daily_stress", "Get daily stress summaries"),
        date_range_tool("get_daily_spo2", "Get daily SpO2 summaries (Gen 3 ring only)"),
        date_range_tool("get_daily_resilience", "Get daily resilience summaries"),
        date_range_tool(
            "get_daily_cardiovascular_age",
            "Get daily cardiovascular age predictions",
        ),
        date_range_tool("get_sleep_periods", "Get detailed sleep periods"),
        date_range_tool("get_sleep_time", "Get optimal bedtime recommendations"),
        date_range_tool("get_workouts", "Get workout summaries"),
        date_range_tool(
            "get_sessions",
            "Get session data (meditation, breathing, relaxation)",
        ),
        date_range_tool("get_enhanced_tags", "Get user-entered enhanced tags"),
        date_range_tool("get_rest_mode_periods", "Get rest mode periods"),
        date_range_tool("get_vo2_max", "Get VO2 max estimates"),
        datetime_range_tool(
            "get_heartrate",
            "Get heart rate time-series data (5-minute intervals)",
        ),
        no_param_tool("get_personal_info", "Get the user's personal information"),
        no_param_tool(
            "get_ring_configuration",
            "Get ring configuration and device information",
        ),
        document_tool("get_sleep_document", "Get one detailed sleep period by id"),
        document_tool("get_workout_document", "Get one workout by id"),
        document_tool("get_session_document", "Get one session by id"),
    ]
}

/// Parameterless resources giving quick access to recent summaries.
pub fn create_oura_resources() -> Vec<ResourceSchema> {
    vec![
        resource(
            "oura://summary/today",
            "Today's summary",
            "Today's readiness, sleep, and activity scores",
        ),
        resource(
            "oura://summary/yesterday",
            "Yesterday's summary",
            "Yesterday's readiness, sleep, and activity scores",
        ),
        resource(
            "oura://personal/info",
            "Personal info",
            "Personal information and ring configuration",
        ),
        resource(
            "oura://recent/sleep",
            "Recent sleep",
            "Last 7 days of sleep scores",
        ),
        resource(
            "oura://recent/activity",
            "Recent activity",
            "Last 7 days of activity scores",
        ),
    ]
}

fn resource(uri: &str, name: &str, description: &str) -> ResourceSchema {
    ResourceSchema {
        uri: uri.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        mime_type: "application/json".to_string(),
    }
}

fn date_range_tool(name: &str, description: &str) -> ToolSchema {
    let mut properties = HashMap::new();

    properties.insert(
        "start_date".to_string(),
        PropertySchema {
            property_type: "string".to_string(),
            description: Some(
                "Start date (YYYY-MM-DD or 'today', 'yesterday', 'last week', \
                 'last month'; defaults to 'last week')"
                    .to_string(),
            ),
        },
    );
    properties.insert(
        "end_date".to_string(),
        PropertySchema {
            property_type: "string".to_string(),
            description: Some("End date (YYYY-MM-DD, optional)".to_string()),
        },
    );

    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: JsonSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: None,
        },
    }
}

fn datetime_range_tool(name: &str, description: &str) -> ToolSchema {
    let mut properties = HashMap::new();

    properties.insert(
        "start_datetime".to_string(),
        PropertySchema {
            property_type: "string".to_string(),
            description: Some("Start datetime in RFC 3339 format with offset".to_string()),
        },
    );
    properties.insert(
        "end_datetime".to_string(),
        PropertySchema {
            property_type: "string".to_string(),
            description: Some("End datetime in RFC 3339 format with offset (optional)".to_string()),
        },
    );

    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: JsonSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: Some(vec!["start_datetime".to_string()]),
        },
    }
}

fn no_param_tool(name: &str, description: &str) -> ToolSchema {
    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: JsonSchema {
            schema_type: "object".to_string(),
            properties: None,
            required: None,
        },
    }
}

fn document_tool(name: &str, description: &str) -> ToolSchema {
    let mut properties = HashMap::new();

    properties.insert(
        "id".to_string(),
        PropertySchema {
            property_type: "string".to_string(),
            description: Some("Document identifier".to_string()),
        },
    );

    ToolSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: JsonSchema {
            schema_type: "object".to_string(),
            properties: Some(properties),
            required: Some(vec!["id".to_string()]),
        },
    }
}
