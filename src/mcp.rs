//! MCP (Model Context Protocol) server exposing the remix operation.
//!
//! This is the upload surface for non-terminal clients: images arrive as
//! base64 payloads or file paths, results come back as saved paths, model
//! messages and inline image content.

use crate::error::RemixError;
use crate::image::providers::{resolve_api_key_with, GeminiClient, GeminiModel};
use crate::image::{load_bytes, load_image, ImageRef, RemixModel, MAX_REMIX_IMAGES};
use crate::output::{OutputWriter, DEFAULT_OUTPUT_DIR};
use crate::remix::remix_images;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Decodes a base64 string that may be imperfectly formatted.
///
/// Accepts a data URI prefix (`data:image/png;base64,...`), missing padding
/// and embedded whitespace.
fn decode_base64_lenient(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    use base64::Engine;

    let b64 = match input.find(";base64,") {
        Some(pos) => &input[pos + 8..],
        None => input,
    };

    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if let Ok(data) = base64::engine::general_purpose::STANDARD.decode(&cleaned) {
        return Ok(data);
    }
    base64::engine::general_purpose::STANDARD_NO_PAD.decode(&cleaned)
}

/// Rejects output directories containing `..` components.
fn validate_output_path(path: &str) -> std::result::Result<(), String> {
    let path = std::path::Path::new(path);
    for component in path.components() {
        if matches!(component, std::path::Component::ParentDir) {
            return Err("Path must not contain '..' components".into());
        }
    }
    Ok(())
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// MCP tool definition.
#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    #[serde(rename = "inputSchema")]
    input_schema: Value,
}

/// Remix tool parameters.
#[derive(Debug, Clone, Deserialize)]
struct RemixParams {
    /// Uploaded images, base64 encoded.
    #[serde(default)]
    images: Vec<String>,
    /// Images already on disk.
    #[serde(default)]
    image_paths: Vec<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    output_dir: Option<String>,
}

/// MCP server for image remixing.
pub struct McpServer {
    initialized: bool,
    model_variant: GeminiModel,
    model: Option<Arc<dyn RemixModel>>,
    env: fn(&str) -> Option<String>,
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

impl McpServer {
    /// Creates a server that builds a Gemini client on first use.
    pub fn new(model_variant: GeminiModel) -> Self {
        Self {
            initialized: false,
            model_variant,
            model: None,
            env: process_env,
        }
    }

    /// Creates a server bound to an existing model.
    pub fn with_model(model: Arc<dyn RemixModel>) -> Self {
        Self {
            initialized: false,
            model_variant: GeminiModel::default(),
            model: Some(model),
            env: process_env,
        }
    }

    /// Run the MCP server, reading from stdin and writing to stdout.
    pub async fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            if let Some(resp) = self.handle_message(&line).await {
                let json = serde_json::to_string(&resp).unwrap_or_else(|e| {
                    json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32603, "message": e.to_string()}}).to_string()
                });
                writeln!(stdout, "{}", json)?;
                stdout.flush()?;
            }
        }

        Ok(())
    }

    async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    -32700,
                    format!("Parse error: {}", e),
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                -32600,
                "Invalid JSON-RPC version",
            ));
        }

        let id = request.id.clone().unwrap_or(Value::Null);

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(id, &request.params)),
            // Notifications, no response
            "initialized" | "notifications/initialized" => None,
            "tools/list" => Some(self.handle_tools_list(id)),
            "tools/call" => Some(self.handle_tools_call(id, &request.params).await),
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            _ => Some(JsonRpcResponse::error(
                id,
                -32601,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    fn handle_initialize(&mut self, id: Value, params: &Value) -> JsonRpcResponse {
        self.initialized = true;

        if let Some(client_info) = params.get("clientInfo") {
            tracing::info!(
                client_name = client_info.get("name").and_then(|v| v.as_str()).unwrap_or("unknown"),
                client_version = client_info
                    .get("version")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown"),
                "MCP client connected"
            );
        }

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "nanoremix",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let tools = vec![Tool {
            name: "remix_images",
            description: "Remix 1-5 images with Gemini (Nano Banana). Leave the prompt empty for a default based on the number of images.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "images": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Uploaded PNG, JPEG or WebP images, base64 encoded (data URIs accepted)"
                    },
                    "image_paths": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Paths of images on the server's filesystem"
                    },
                    "prompt": {
                        "type": "string",
                        "description": "Optional instruction for the model"
                    },
                    "output_dir": {
                        "type": "string",
                        "description": "Directory to save results in (default: output)"
                    }
                },
                "required": []
            }),
        }];

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        match tool_name {
            "remix_images" => self.remix(id, arguments).await,
            _ => JsonRpcResponse::error(id, -32602, format!("Unknown tool: {}", tool_name)),
        }
    }

    async fn remix(&self, id: Value, arguments: Value) -> JsonRpcResponse {
        let params: RemixParams = match serde_json::from_value(arguments) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(id, -32602, format!("Invalid parameters: {}", e));
            }
        };

        let total = params.images.len() + params.image_paths.len();
        if total == 0 {
            return JsonRpcResponse::error(id, -32602, "Upload at least one image to begin.");
        }
        if total > MAX_REMIX_IMAGES {
            return JsonRpcResponse::error(
                id,
                -32602,
                format!("Please upload no more than {} images.", MAX_REMIX_IMAGES),
            );
        }

        let output_dir = params.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR);
        if let Err(msg) = validate_output_path(output_dir) {
            return JsonRpcResponse::error(id, -32602, msg);
        }

        // Pre-flight API key check before decoding anything
        let model = match self.model() {
            Ok(model) => model,
            Err(e) => return JsonRpcResponse::error(id, -32602, e.to_string()),
        };

        let images = match collect_images(&params) {
            Ok(images) => images,
            Err(e) => return JsonRpcResponse::error(id, -32602, e.to_string()),
        };

        let writer = OutputWriter::new(output_dir);
        let outcome =
            match remix_images(model.as_ref(), &images, params.prompt.as_deref(), &writer).await {
                Ok(outcome) => outcome,
                Err(e) => return JsonRpcResponse::error(id, -32603, e.to_string()),
            };

        let summary = json!({
            "success": true,
            "prompt": outcome.prompt,
            "files": outcome.files,
            "messages": outcome.messages,
            "model": outcome.metadata.model,
            "duration_ms": outcome.metadata.duration_ms,
        });

        let mut content = vec![json!({
            "type": "text",
            "text": serde_json::to_string_pretty(&summary).unwrap_or_default()
        })];
        for image in &outcome.images {
            content.push(json!({
                "type": "image",
                "data": image.to_base64(),
                "mimeType": image.format.mime_type(),
            }));
        }

        JsonRpcResponse::success(id, json!({ "content": content }))
    }

    fn model(&self) -> crate::Result<Arc<dyn RemixModel>> {
        if let Some(model) = &self.model {
            return Ok(Arc::clone(model));
        }
        let api_key = resolve_api_key_with(None, self.env)?;
        let client = GeminiClient::builder()
            .api_key(api_key)
            .model(self.model_variant)
            .build()?;
        Ok(Arc::new(client))
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new(GeminiModel::default())
    }
}

/// Uploads first (named `upload_<n>`), then paths.
fn collect_images(params: &RemixParams) -> crate::Result<Vec<ImageRef>> {
    let mut images = Vec::with_capacity(params.images.len() + params.image_paths.len());
    for (i, encoded) in params.images.iter().enumerate() {
        let name = PathBuf::from(format!("upload_{}", i + 1));
        let data = decode_base64_lenient(encoded).map_err(|e| RemixError::UnsupportedFormat {
            path: name.clone(),
            reason: format!("invalid base64: {}", e),
        })?;
        images.push(load_bytes(name, data)?);
    }
    for path in &params.image_paths {
        images.push(load_image(path)?);
    }
    Ok(images)
}
