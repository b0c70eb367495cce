use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Token {
        content: String,
    },
    Sources {
        #[serde(default)]
        sources: Vec<Source>,
    },
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}

/// One retrieved reference attached to an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    pub document_id: Option<String>,
    pub filename: Option<String>,
    pub chunk_index: Option<u64>,
}

impl Source {
    pub fn label(&self) -> &str {
        self.filename
            .as_deref()
            .or(self.document_id.as_deref())
            .unwrap_or("Unknown")
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub document_id: String,
    pub question: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearRequest {
    pub session_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
}

/// Body of a successful upload. Servers disagree on the id key.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub document_id: Option<Value>,
    #[serde(rename = "documentId")]
    pub document_id_camel: Option<Value>,
    pub doc_id: Option<Value>,
}

impl UploadResponse {
    /// Checks `document_id`, `documentId`, `doc_id` in that order; empty
    /// strings, nulls and non-scalar values are skipped.
    pub fn document_id(&self) -> Option<String> {
        [&self.document_id, &self.document_id_camel, &self.doc_id]
            .into_iter()
            .flatten()
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Non-streamed reply the chat endpoint sends when retrieval finds nothing.
#[derive(Debug, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl AnswerResponse {
    pub fn into_events(self) -> Vec<StreamEvent> {
        vec![
            StreamEvent::Sources {
                sources: self.sources,
            },
            StreamEvent::Token {
                content: self.answer,
            },
            StreamEvent::Done { session_id: None },
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerDocument {
    pub document_id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub total_chunks: u64,
}

#[derive(Debug, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<ServerDocument>,
    #[serde(default)]
    pub total: usize,
}
