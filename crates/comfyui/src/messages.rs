//! ComfyUI WebSocket message types and parser.
//!
//! ComfyUI sends JSON messages over WebSocket with the shape
//! `{"type": "<kind>", "data": {...}}`. Only a handful of kinds matter to
//! the job client; the rest are parsed so they can be logged and skipped.

use serde::Deserialize;

/// Known ComfyUI WebSocket message types.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ComfyUIMessage {
    /// Server status broadcast (queue depth).
    #[serde(rename = "status")]
    Status(StatusData),

    #[serde(rename = "execution_start")]
    ExecutionStart(PromptRef),

    #[serde(rename = "execution_cached")]
    ExecutionCached(ExecutionCachedData),

    /// A node is running, or the prompt finished when `node` is `None`.
    #[serde(rename = "executing")]
    Executing(ExecutingData),

    #[serde(rename = "progress")]
    Progress(ProgressData),

    /// An output node finished and wrote its results. This is the
    /// execution-completion signal the job client waits for.
    #[serde(rename = "executed")]
    Executed(ExecutedData),

    #[serde(rename = "execution_error")]
    ExecutionError(ErrorData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusData {
    pub status: QueueStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueStatus {
    pub exec_info: ExecInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecInfo {
    pub queue_remaining: i32,
}

/// Payload carrying only the prompt the event belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptRef {
    #[serde(default)]
    pub prompt_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionCachedData {
    #[serde(default)]
    pub prompt_id: Option<String>,
    /// Node IDs whose outputs were served from cache.
    #[serde(default)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutingData {
    pub node: Option<String>,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

/// Step-level progress within a node.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressData {
    pub value: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutedData {
    /// The output node that finished.
    pub node: String,
    /// Raw output description (images, gifs, filenames). Not trusted for
    /// locating artifacts; the filesystem is.
    #[serde(default)]
    pub output: serde_json::Value,
    #[serde(default)]
    pub prompt_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub prompt_id: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub exception_message: String,
    #[serde(default)]
    pub exception_type: String,
}

impl ComfyUIMessage {
    /// Wire name of the message type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::ExecutionStart(_) => "execution_start",
            Self::ExecutionCached(_) => "execution_cached",
            Self::Executing(_) => "executing",
            Self::Progress(_) => "progress",
            Self::Executed(_) => "executed",
            Self::ExecutionError(_) => "execution_error",
        }
    }

    /// Whether this message tells the client that its submitted graph
    /// produced output.
    pub fn is_completion_signal(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    /// The prompt id the message refers to, when the server included one.
    pub fn prompt_id(&self) -> Option<&str> {
        match self {
            Self::ExecutionStart(d) => d.prompt_id.as_deref(),
            Self::ExecutionCached(d) => d.prompt_id.as_deref(),
            Self::Executing(d) => d.prompt_id.as_deref(),
            Self::Executed(d) => d.prompt_id.as_deref(),
            Self::ExecutionError(d) => d.prompt_id.as_deref(),
            Self::Status(_) | Self::Progress(_) => None,
        }
    }
}

/// Parse a ComfyUI WebSocket text message into a typed enum.
///
/// Returns `Err` for malformed JSON or unknown `type` values. Callers
/// log those and keep reading.
pub fn parse_message(text: &str) -> Result<ComfyUIMessage, serde_json::Error> {
    serde_json::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_message() {
        let json = r#"{"type":"status","data":{"status":{"exec_info":{"queue_remaining":3}},"sid":"abc"}}"#;
        match parse_message(json).unwrap() {
            ComfyUIMessage::Status(data) => {
                assert_eq!(data.status.exec_info.queue_remaining, 3);
            }
            other => panic!("Expected Status, got {other:?}"),
        }
    }

    #[test]
    fn executed_is_the_completion_signal() {
        let json = r#"{"type":"executed","data":{"node":"9","output":{"images":[{"filename":"example_00001_.png"}]},"prompt_id":"abc"}}"#;
        let msg = parse_message(json).unwrap();
        assert!(msg.is_completion_signal());
        assert_eq!(msg.kind(), "executed");
        assert_eq!(msg.prompt_id(), Some("abc"));
        match msg {
            ComfyUIMessage::Executed(data) => {
                assert_eq!(data.node, "9");
                assert!(data.output.is_object());
            }
            other => panic!("Expected Executed, got {other:?}"),
        }
    }

    #[test]
    fn executed_without_prompt_id_still_parses() {
        let json = r#"{"type":"executed","data":{"node":"75"}}"#;
        let msg = parse_message(json).unwrap();
        assert!(msg.is_completion_signal());
        assert_eq!(msg.prompt_id(), None);
    }

    #[test]
    fn executing_finished_is_not_the_completion_signal() {
        let json = r#"{"type":"executing","data":{"node":null,"prompt_id":"xyz"}}"#;
        let msg = parse_message(json).unwrap();
        assert!(!msg.is_completion_signal());
        match msg {
            ComfyUIMessage::Executing(data) => assert!(data.node.is_none()),
            other => panic!("Expected Executing, got {other:?}"),
        }
    }

    #[test]
    fn progress_and_errors_are_not_completion_signals() {
        let progress = parse_message(r#"{"type":"progress","data":{"value":5,"max":20}}"#).unwrap();
        assert!(!progress.is_completion_signal());
        assert_eq!(progress.kind(), "progress");

        let error = parse_message(
            r#"{"type":"execution_error","data":{"prompt_id":"abc","node_id":"5","exception_message":"out of memory","exception_type":"RuntimeError"}}"#,
        )
        .unwrap();
        assert!(!error.is_completion_signal());
        match error {
            ComfyUIMessage::ExecutionError(data) => {
                assert_eq!(data.node_id.as_deref(), Some("5"));
                assert_eq!(data.exception_message, "out of memory");
            }
            other => panic!("Expected ExecutionError, got {other:?}"),
        }
    }

    #[test]
    fn parse_execution_cached_without_nodes() {
        let json = r#"{"type":"execution_cached","data":{"prompt_id":"abc"}}"#;
        match parse_message(json).unwrap() {
            ComfyUIMessage::ExecutionCached(data) => assert!(data.nodes.is_empty()),
            other => panic!("Expected ExecutionCached, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_returns_error() {
        let json = r#"{"type":"crystools.monitor","data":{"cpu_utilization":12}}"#;
        assert!(parse_message(json).is_err());
    }

    #[test]
    fn invalid_json_returns_error() {
        assert!(parse_message("not json at all").is_err());
    }
}
