use crate::error::{Error, Result};
use crate::preview::Preview;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "text/plain",
    "text/csv",
    "application/json",
];

pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "csv", "json", "md", "log", "xml", "html", "css", "js", "py", "java", "cpp", "c", "h",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Spreadsheet,
    Csv,
    Text,
    Unsupported,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("pdf") => Self::Pdf,
            Some("doc" | "docx") => Self::Word,
            Some("xls" | "xlsx") => Self::Spreadsheet,
            Some("csv") => Self::Csv,
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => Self::Text,
            _ => Self::Unsupported,
        }
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

pub fn media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Accepts a file when either its media type or its extension is allowed.
pub fn validate_upload(name: &str, media_type: &str) -> Result<()> {
    let by_type = ALLOWED_MEDIA_TYPES.contains(&media_type);
    let by_extension = extension(name).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()));

    if by_type || by_extension {
        Ok(())
    } else {
        Err(Error::UnsupportedFileType {
            name: name.to_string(),
        })
    }
}

pub fn size_label(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

#[derive(Debug)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
    pub backend_id: String,
    preview: Option<Preview>,
}

impl Document {
    pub fn new(name: String, size: u64, path: PathBuf, backend_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            size,
            path,
            backend_id,
            preview: None,
        }
    }

    pub fn size_label(&self) -> String {
        size_label(self.size)
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }
}

/// Documents uploaded during this session plus the current selection.
#[derive(Debug, Default)]
pub struct Library {
    documents: Vec<Document>,
    selected: Option<Uuid>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly uploaded document and selects it.
    pub fn add(&mut self, document: Document) -> Uuid {
        let id = document.id;
        self.documents.push(document);
        self.selected = Some(id);
        id
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Document at a 1-based position, as listed to the user.
    pub fn nth(&self, position: usize) -> Option<&Document> {
        position
            .checked_sub(1)
            .and_then(|index| self.documents.get(index))
    }

    pub fn select(&mut self, id: Uuid) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&Document> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Stores a loaded preview. Ignored if the document was removed meanwhile.
    pub fn set_preview(&mut self, id: Uuid, preview: Preview) {
        if let Some(document) = self.documents.iter_mut().find(|d| d.id == id) {
            document.preview = Some(preview);
        }
    }

    /// Drops a document after the server confirmed deletion. Its loaded
    /// preview is released here and nowhere else.
    pub fn remove(&mut self, id: Uuid) -> Option<Document> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        let mut document = self.documents.remove(index);
        if document.preview.take().is_some() {
            tracing::debug!(name = %document.name, "released document preview");
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Document {
        Document::new(
            name.to_string(),
            1536,
            PathBuf::from(name),
            format!("backend-{}", name),
        )
    }

    #[test]
    fn accepts_allowed_media_types() {
        assert!(validate_upload("report.pdf", "application/pdf").is_ok());
        assert!(validate_upload("sheet.xls", "application/vnd.ms-excel").is_ok());
        assert!(validate_upload("blob", "application/json").is_ok());
    }

    #[test]
    fn accepts_text_extensions_by_fallback() {
        for name in ["main.PY", "notes.md", "lib.h", "page.html", "trace.log"] {
            assert!(
                validate_upload(name, "application/octet-stream").is_ok(),
                "{} should be accepted",
                name
            );
        }
    }

    #[test]
    fn rejects_everything_else() {
        let err = validate_upload("photo.png", "image/png").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFileType { .. }));
        assert!(validate_upload("archive.zip", "application/zip").is_err());
        assert!(validate_upload("c", "application/octet-stream").is_err());
    }

    #[test]
    fn media_type_is_guessed_from_extension() {
        assert_eq!(media_type(Path::new("a.pdf")), "application/pdf");
        assert_eq!(media_type(Path::new("no_extension")), "application/octet-stream");
    }

    #[test]
    fn kinds_follow_extension() {
        assert_eq!(DocumentKind::from_name("A.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_name("a.doc"), DocumentKind::Word);
        assert_eq!(DocumentKind::from_name("a.docx"), DocumentKind::Word);
        assert_eq!(DocumentKind::from_name("a.xlsx"), DocumentKind::Spreadsheet);
        assert_eq!(DocumentKind::from_name("a.csv"), DocumentKind::Csv);
        assert_eq!(DocumentKind::from_name("a.cpp"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_name("a.png"), DocumentKind::Unsupported);
        assert_eq!(DocumentKind::from_name("Makefile"), DocumentKind::Unsupported);
    }

    #[test]
    fn size_label_is_kib_with_two_decimals() {
        assert_eq!(size_label(0), "0.00 KB");
        assert_eq!(size_label(1536), "1.50 KB");
        assert_eq!(doc("x.txt").size_label(), "1.50 KB");
    }

    #[test]
    fn added_document_becomes_selected() {
        let mut library = Library::new();
        let first = library.add(doc("a.txt"));
        assert_eq!(library.selected().map(|d| d.id), Some(first));
        let second = library.add(doc("b.txt"));
        assert_eq!(library.selected().map(|d| d.id), Some(second));
        assert!(library.select(first));
        assert_eq!(library.selected().map(|d| d.name.as_str()), Some("a.txt"));
        assert!(!library.select(Uuid::new_v4()));
    }

    #[test]
    fn nth_is_one_based() {
        let mut library = Library::new();
        library.add(doc("a.txt"));
        library.add(doc("b.txt"));
        assert!(library.nth(0).is_none());
        assert_eq!(library.nth(2).map(|d| d.name.as_str()), Some("b.txt"));
        assert!(library.nth(3).is_none());
    }

    #[test]
    fn removal_releases_preview_and_clears_selection() {
        let mut library = Library::new();
        let keep = library.add(doc("keep.txt"));
        let gone = library.add(doc("gone.txt"));
        library.set_preview(gone, Preview::Unsupported);
        assert!(library.get(gone).unwrap().preview().is_some());

        let removed = library.remove(gone).unwrap();
        assert!(removed.preview().is_none());
        assert!(library.selected().is_none());
        assert_eq!(library.documents().len(), 1);

        library.select(keep);
        library.remove(Uuid::new_v4());
        assert_eq!(library.selected().map(|d| d.id), Some(keep));
    }

    #[test]
    fn preview_for_removed_document_is_ignored() {
        let mut library = Library::new();
        let id = library.add(doc("a.txt"));
        library.remove(id);
        library.set_preview(id, Preview::Unsupported);
        assert!(library.is_empty());
    }
}
