//! MCP protocol integration tests.
//!
//! These tests spawn the actual `drft mcp` process and communicate via
//! JSON-RPC over stdio, testing the complete MCP protocol flow.
//!
//! The rmcp library uses line-delimited JSON (each message is one line):
//! ```
//! {"jsonrpc":"2.0","id":1,"method":"initialize",...}\n
//! {"jsonrpc":"2.0","id":1,"result":{...}}\n
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// JSON-RPC 2.0 response
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct JsonRpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// MCP test client that spawns and communicates with the server
struct McpTestClient {
    child: Child,
    request_id: u64,
    reader: BufReader<std::process::ChildStdout>,
}

impl McpTestClient {
    /// Spawn a new MCP server process with an isolated database and no model
    fn spawn() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut child = Command::new(env!("CARGO_BIN_EXE_drft"))
            .arg("mcp")
            .env("DRAFTER_DATABASE_PATH", temp_dir.path().join("drafter.db"))
            .env("DRAFTER_GENERATOR_ENABLED", "false")
            .env("DRAFTER_EMBEDDINGS_ENABLED", "false")
            .env_remove("DRAFTER_CONFIG")
            .env("XDG_CONFIG_HOME", temp_dir.path())
            .env("HOME", temp_dir.path()) // For macOS directories crate
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn drft mcp");

        let stdout = child.stdout.take().expect("Failed to get stdout");
        let reader = BufReader::new(stdout);

        // Keep temp_dir alive by leaking it (tests are short-lived anyway)
        std::mem::forget(temp_dir);

        Self {
            child,
            request_id: 0,
            reader,
        }
    }

    /// Send a message as line-delimited JSON
    fn send_message(&mut self, content: &str) {
        let stdin = self.child.stdin.as_mut().expect("Failed to get stdin");
        writeln!(stdin, "{}", content).expect("Failed to write message");
        stdin.flush().expect("Failed to flush stdin");
    }

    /// Read a message as line-delimited JSON
    fn read_message(&mut self) -> String {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .expect("Failed to read line");
        line.trim().to_string()
    }

    /// Send a JSON-RPC request and get the response
    fn request(&mut self, method: &str, params: Option<Value>) -> JsonRpcResponse {
        self.request_id += 1;
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.request_id,
            method: method.to_string(),
            params,
        };

        let request_json = serde_json::to_string(&request).expect("Failed to serialize request");
        self.send_message(&request_json);

        let response_json = self.read_message();
        serde_json::from_str(&response_json).expect("Failed to parse response")
    }

    /// Send initialize request and initialized notification (required first messages)
    fn initialize(&mut self) -> JsonRpcResponse {
        let response = self.request(
            "initialize",
            Some(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {
                    "name": "test-client",
                    "version": "1.0.0"
                }
            })),
        );

        // Send initialized notification (required by MCP protocol)
        let notification = json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        });
        self.send_message(&notification.to_string());

        response
    }

    /// List available tools
    fn list_tools(&mut self) -> JsonRpcResponse {
        self.request("tools/list", None)
    }

    /// Call a tool with parameters
    fn call_tool(&mut self, name: &str, arguments: Value) -> JsonRpcResponse {
        self.request(
            "tools/call",
            Some(json!({
                "name": name,
                "arguments": arguments
            })),
        )
    }
}

impl Drop for McpTestClient {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ============================================================
// Protocol Tests
// ============================================================

mod protocol {
    use super::*;

    #[test]
    fn initialize_returns_server_info() {
        let mut client = McpTestClient::spawn();
        let response = client.initialize();

        assert!(response.error.is_none(), "Expected success, got error");
        let result = response.result.expect("Expected result");

        let server_info = result.get("serverInfo").expect("Expected serverInfo");
        assert_eq!(server_info.get("name").and_then(|n| n.as_str()), Some("drafter"));
        assert!(result.get("capabilities").is_some());
    }

    #[test]
    fn tools_list_returns_all_tools() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        assert!(response.error.is_none(), "Expected success, got error");

        let result = response.result.expect("Expected result");
        let tools = result.get("tools").expect("Expected tools array");
        let tools_array = tools.as_array().expect("Tools should be array");

        assert_eq!(
            tools_array.len(),
            7,
            "Expected 7 tools, got {}",
            tools_array.len()
        );

        let tool_names: Vec<&str> = tools_array
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();

        for name in [
            "assistant_turn",
            "get_conversation",
            "run_outline_command",
            "render_outline",
            "list_reports",
            "get_report",
            "search_reports",
        ] {
            assert!(tool_names.contains(&name), "Missing tool {}", name);
        }
    }

    #[test]
    fn tools_have_descriptions_and_schemas() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.list_tools();
        let result = response.result.expect("Expected result");
        let tools = result
            .get("tools")
            .expect("Expected tools")
            .as_array()
            .expect("Tools should be array");

        for tool in tools {
            let name = tool.get("name").and_then(|n| n.as_str()).unwrap_or("?");
            assert!(
                tool.get("description").is_some(),
                "Tool {} missing description",
                name
            );
            assert!(
                tool.get("inputSchema").is_some(),
                "Tool {} missing inputSchema",
                name
            );
        }
    }
}

// ============================================================
// Tool Call Tests
// ============================================================

mod tool_calls {
    use super::*;

    #[test]
    fn assistant_turn_opens_and_advances_a_conversation() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool(
            "assistant_turn",
            json!({ "session_id": "proto", "message": "hi" }),
        );
        assert!(response.error.is_none(), "Expected success, got error");
        let reply: Value =
            serde_json::from_str(&extract_text_content(&response)).expect("Reply is JSON");
        assert_eq!(reply["step"], 0);
        assert_eq!(reply["reply"], "What do you need this report for?");

        client.call_tool(
            "assistant_turn",
            json!({ "session_id": "proto", "message": "To brief the board" }),
        );

        let response = client.call_tool("get_conversation", json!({ "session_id": "proto" }));
        let state: Value =
            serde_json::from_str(&extract_text_content(&response)).expect("State is JSON");
        assert_eq!(state["step"], 1);
        assert_eq!(state["purpose"], "To brief the board");
    }

    #[test]
    fn list_reports_starts_empty() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("list_reports", json!({}));

        assert!(response.error.is_none(), "Expected success, got error");
        let reports: Value =
            serde_json::from_str(&extract_text_content(&response)).expect("List is JSON");
        assert_eq!(reports, json!([]));
    }

    #[test]
    fn search_without_embeddings_returns_no_hits() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("search_reports", json!({ "query": "sales" }));

        assert!(response.error.is_none(), "Expected success, got error");
        let hits: Value =
            serde_json::from_str(&extract_text_content(&response)).expect("Hits are JSON");
        assert_eq!(hits, json!([]));
    }

    /// Helper to extract text content from MCP tool response
    fn extract_text_content(response: &JsonRpcResponse) -> String {
        response
            .result
            .as_ref()
            .and_then(|r| r.get("content"))
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .expect("Expected text content in response")
            .to_string()
    }
}

// ============================================================
// Error Handling Tests
// ============================================================

mod errors {
    use super::*;

    fn is_error(response: &JsonRpcResponse) -> bool {
        response.error.is_some()
            || response
                .result
                .as_ref()
                .and_then(|r| r.get("isError"))
                .and_then(|e| e.as_bool())
                .unwrap_or(false)
    }

    #[test]
    fn invalid_tool_name_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("nonexistent_tool", json!({}));

        assert!(response.error.is_some(), "Expected error for invalid tool");
    }

    #[test]
    fn invalid_uuid_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool("get_report", json!({ "report_id": "not-a-uuid" }));

        assert!(is_error(&response));
    }

    #[test]
    fn unknown_outline_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        let response = client.call_tool(
            "render_outline",
            json!({ "outline_id": "00000000-0000-0000-0000-000000000000" }),
        );

        assert!(is_error(&response));
    }

    #[test]
    fn missing_required_param_returns_error() {
        let mut client = McpTestClient::spawn();
        client.initialize();

        // assistant_turn requires 'session_id' and 'message'
        let response = client.call_tool("assistant_turn", json!({}));

        assert!(is_error(&response));
    }
}
