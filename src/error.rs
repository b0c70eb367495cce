use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Please upload a supported file type ({name}).")]
    UnsupportedFileType { name: String },

    #[error("{message}")]
    Server { status: StatusCode, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upload completed but server did not return a document id.")]
    MissingDocumentId,

    #[error("{0}")]
    Preview(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Server-reported failure. The body's `error` field wins when present.
    pub(crate) fn server(operation: &str, status: StatusCode, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("{} failed: {}", operation, status));
        Self::Server { status, message }
    }
}
