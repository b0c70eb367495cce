use crate::documents::{self, Document};
use crate::error::{Error, Result};
use crate::protocol::{
    AnswerResponse, ChatRequest, ClearRequest, DocumentList, ErrorBody, StreamEvent,
    UploadResponse,
};
use crate::stream::StreamAssembler;
use futures::StreamExt;
use reqwest::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use std::future::Future;
use std::path::Path;

pub struct ClientConfig {
    pub base_url: String,
    pub session_id: String,
}

#[derive(Clone)]
pub struct Client {
    base_url: String,
    session_id: String,
    http: HttpClient,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            base_url: normalize_base_url(&config.base_url),
            session_id: config.session_id,
            http: HttpClient::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Validates and uploads a file. Unsupported files are rejected before
    /// any request is made.
    pub async fn upload(&self, path: &Path) -> Result<Document> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let media_type = documents::media_type(path);
        documents::validate_upload(&name, &media_type)?;

        let bytes = tokio::fs::read(path).await?;
        let size = bytes.len() as u64;
        let part = Part::bytes(bytes)
            .file_name(name.clone())
            .mime_str(&media_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error);
            tracing::warn!(%status, ?message, "upload rejected");
            return Err(Error::server("Upload", status, message));
        }

        let parsed: UploadResponse = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(%err, "upload response is not JSON");
                UploadResponse::default()
            }
        };
        let backend_id = parsed.document_id().ok_or_else(|| {
            tracing::warn!(
                body = %String::from_utf8_lossy(&body),
                "upload succeeded without a document id"
            );
            Error::MissingDocumentId
        })?;

        tracing::info!(%name, %backend_id, size, "uploaded document");
        Ok(Document::new(name, size, path.to_path_buf(), backend_id))
    }

    pub async fn delete(&self, document_id: &str) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/api/upload/{}", self.base_url, document_id))
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            tracing::warn!(%status, ?message, document_id, "delete rejected");
            return Err(Error::server("Delete", status, message));
        }

        tracing::info!(document_id, "deleted document");
        Ok(())
    }

    /// Asks a question about a document and hands every decoded event to
    /// `on_event` in arrival order. The callback is awaited before the next
    /// chunk is read.
    pub async fn ask<F, Fut>(&self, document_id: &str, question: &str, mut on_event: F) -> Result<()>
    where
        F: FnMut(StreamEvent) -> Fut,
        Fut: Future<Output = ()>,
    {
        let request = ChatRequest {
            document_id: document_id.to_string(),
            question: question.to_string(),
            session_id: self.session_id.clone(),
        };
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            tracing::warn!(%status, ?message, "chat request rejected");
            return Err(Error::server("Chat", status, message));
        }

        if is_json(&response) {
            let answer: AnswerResponse = serde_json::from_slice(&response.bytes().await?)?;
            tracing::info!("chat returned a direct answer");
            for event in answer.into_events() {
                log_event(&event);
                on_event(event).await;
            }
            return Ok(());
        }

        let mut stream = response.bytes_stream();
        let mut assembler = StreamAssembler::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in assembler.feed(&chunk) {
                log_event(&event);
                on_event(event).await;
            }
        }
        assembler.finish();

        Ok(())
    }

    pub async fn clear_history(&self) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/api/chat/clear", self.base_url))
            .json(&ClearRequest {
                session_id: self.session_id.clone(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::server("Clear", status, error_message(response).await));
        }

        tracing::info!(session_id = %self.session_id, "cleared chat memory");
        Ok(())
    }

    pub async fn list_documents(&self) -> Result<DocumentList> {
        let response = self
            .http
            .get(format!("{}/api/chat/documents", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::server(
                "Listing documents",
                status,
                error_message(response).await,
            ));
        }

        Ok(response.json().await?)
    }
}

fn normalize_base_url(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

async fn error_message(response: Response) -> Option<String> {
    let body = response.bytes().await.ok()?;
    serde_json::from_slice::<ErrorBody>(&body).ok()?.error
}

fn is_json(response: &Response) -> bool {
    response.status() == StatusCode::OK
        && response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"))
}

fn log_event(event: &StreamEvent) {
    match event {
        StreamEvent::Token { content } => tracing::trace!(len = content.len(), "token"),
        StreamEvent::Sources { sources } => {
            let names: Vec<&str> = sources.iter().map(|s| s.label()).collect();
            tracing::info!(?names, "sources");
        }
        StreamEvent::Done { .. } => tracing::debug!("streaming complete"),
    }
}
