//! The tool-call server: four memory tools behind JSON-RPC.
//!
//! Tool responses are plain text aimed at a model or a human reading a chat
//! transcript, so they carry titles, keys and timestamps rather than raw
//! JSON. The edit-history lines appended to content before storing are a
//! front-end convention shared with the HTTP API; the store itself treats
//! them as opaque body text.

use super::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams, PROTOCOL_VERSION,
};
use super::transport::StdioTransport;
use crate::error::Result;
use crate::model::Memory;
use crate::store::MemoryStore;
use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;

const SERVER_NAME: &str = "context-keep";
const RECENT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct StoreMemoryArgs {
    key: String,
    content: String,
    #[serde(default)]
    tags: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct KeyArgs {
    key: String,
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
}

pub struct McpServer {
    store: Arc<MemoryStore>,
}

impl McpServer {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Serve requests from stdin until EOF.
    pub fn run(&self) -> Result<()> {
        let mut transport = StdioTransport::new();
        log::info!("tool-call server ready on stdio");

        loop {
            match transport.read_request() {
                Ok(Some(request)) => {
                    if let Some(response) = self.handle(request) {
                        transport.write_response(&response)?;
                    }
                }
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    let response =
                        JsonRpcResponse::failure(None, JsonRpcError::parse_error(e.to_string()));
                    transport.write_response(&response)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Dispatch one request. Notifications produce no response.
    pub fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            log::debug!("notification: {}", request.method);
            return None;
        }

        let id = request.id.clone();
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, tools_list()),
            "tools/call" => match self.tools_call(request.params) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(error) => JsonRpcResponse::failure(id, error),
            },
            other => JsonRpcResponse::failure(id, JsonRpcError::method_not_found(other)),
        };
        Some(response)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    fn tools_call(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: ToolCallParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        let outcome = match params.name.as_str() {
            "store_memory" => self.store_memory(arguments),
            "retrieve_memory" => self.retrieve_memory(arguments),
            "search_memories" => self.search_memories(arguments),
            "list_recent_memories" => self.list_recent_memories(),
            unknown => {
                return Ok(tool_result(
                    format!("Unknown tool: {}", unknown),
                    true,
                ))
            }
        };

        match outcome {
            Ok(text) => Ok(tool_result(text, false)),
            Err(ToolError::BadArguments(msg)) => Err(JsonRpcError::invalid_params(msg)),
            Err(ToolError::Store(e)) => Err(JsonRpcError::internal_error(e.to_string())),
        }
    }

    fn store_memory(&self, arguments: Value) -> std::result::Result<String, ToolError> {
        let args: StoreMemoryArgs = parse_args(arguments)?;
        let tags = split_tags(&args.tags);
        let title = non_empty(args.title);

        // Edit-history line: a front-end convention, opaque to the store
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S %:z");
        let exists = self.store.retrieve(&args.key)?.is_some();
        let content = if exists {
            format!("{}\n\n---\n**{} | AI Update via MCP**", args.content, stamp)
        } else {
            format!("{}\n\n---\n**{} | Created via MCP**", args.content, stamp)
        };

        let memory = self.store.store(&args.key, &content, tags, title)?;
        Ok(format!(
            "✅ Memory stored: '{}' (Key: {}) ({} chars)",
            memory.title, memory.key, memory.chars
        ))
    }

    fn retrieve_memory(&self, arguments: Value) -> std::result::Result<String, ToolError> {
        let args: KeyArgs = parse_args(arguments)?;
        match self.store.retrieve(&args.key)? {
            Some(memory) => Ok(format!(
                "📦 Memory: {}\n🔑 Key: {}\n📅 Updated: {}\n\n{}",
                if memory.title.is_empty() {
                    &memory.key
                } else {
                    &memory.title
                },
                memory.key,
                full_stamp(memory.updated_at),
                memory.content
            )),
            None => Ok(format!("❌ Memory not found: '{}'", args.key)),
        }
    }

    fn search_memories(&self, arguments: Value) -> std::result::Result<String, ToolError> {
        let args: QueryArgs = parse_args(arguments)?;
        let results = self.store.search(&args.query)?;
        if results.is_empty() {
            return Ok(format!("🔍 No memories found for '{}'", args.query));
        }

        let mut output = format!(
            "🔍 Found {} memories for '{}':\n\n",
            results.len(),
            args.query
        );
        for lm in &results {
            output.push_str(&format!(
                "- **{}** (Key: {}) ({}): {}\n",
                lm.memory.title,
                lm.memory.key,
                short_stamp(&lm.memory),
                lm.snippet
            ));
        }
        Ok(output)
    }

    fn list_recent_memories(&self) -> std::result::Result<String, ToolError> {
        let memories = self.store.list()?;
        if memories.is_empty() {
            return Ok("📭 No memories found.".to_string());
        }

        let mut output = "📚 Recent Memories:\n".to_string();
        for lm in memories.iter().take(RECENT_LIMIT) {
            output.push_str(&format!(
                "- {} (Key: {}) - {}\n",
                lm.memory.title,
                lm.memory.key,
                short_stamp(&lm.memory)
            ));
        }
        Ok(output)
    }
}

enum ToolError {
    BadArguments(String),
    Store(crate::error::KeepError),
}

impl From<crate::error::KeepError> for ToolError {
    fn from(e: crate::error::KeepError) -> Self {
        ToolError::Store(e)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(
    arguments: Value,
) -> std::result::Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::BadArguments(e.to_string()))
}

fn tool_result(text: String, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn full_stamp(ts: Option<DateTime<Local>>) -> String {
    ts.map(|t| t.to_rfc3339()).unwrap_or_else(|| "unknown".into())
}

fn short_stamp(memory: &Memory) -> String {
    memory
        .updated_at
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".into())
}

fn tools_list() -> Value {
    json!({
        "tools": [
            {
                "name": "store_memory",
                "description": "Store a new memory or update an existing one",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "key": { "type": "string", "description": "Unique identifier for the memory" },
                        "content": { "type": "string", "description": "The content of the memory" },
                        "tags": { "type": "string", "description": "Comma-separated list of tags (optional)" },
                        "title": { "type": "string", "description": "Human-readable title (optional)" }
                    },
                    "required": ["key", "content"]
                }
            },
            {
                "name": "retrieve_memory",
                "description": "Retrieve a memory by its key",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "key": { "type": "string", "description": "The unique identifier of the memory" }
                    },
                    "required": ["key"]
                }
            },
            {
                "name": "search_memories",
                "description": "Search for memories by key, title, or content",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "The search term" }
                    },
                    "required": ["query"]
                }
            },
            {
                "name": "list_recent_memories",
                "description": "List the 10 most recently updated memories",
                "inputSchema": {
                    "type": "object",
                    "properties": {}
                }
            }
        ]
    })
}
