use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct MessageRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EchoResponse {
    #[serde(default)]
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RagMatch {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RagMatch {
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RagResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub matches: Vec<RagMatch>,
    #[serde(default)]
    pub sources: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
