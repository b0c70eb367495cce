use crate::documents::{DocumentKind, size_label};
use crate::error::{Error, Result};
use crate::markup::{Block, Inline};
use crate::theme::{self, Palette};
use calamine::{DataType, Reader, open_workbook_auto};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use std::path::Path;

mod docx;

#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// The terminal cannot embed a PDF viewer; only a summary is shown.
    Pdf { name: String, size: u64 },
    /// `body` is the extracted text of `.docx` files; legacy `.doc` files
    /// only get a summary.
    Word {
        name: String,
        size: u64,
        body: Option<Vec<Block>>,
    },
    Sheets(Vec<Sheet>),
    Text { content: String, markup: bool },
    Unsupported,
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// First row, with blank cells named by position.
    pub fn header(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        if cell.is_empty() {
                            format!("Column {}", i + 1)
                        } else {
                            cell.clone()
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Remaining rows cut or padded to the header width.
    pub fn body(&self) -> Vec<Vec<String>> {
        let width = self.rows.first().map(Vec::len).unwrap_or(0);
        self.rows
            .iter()
            .skip(1)
            .map(|row| {
                (0..width)
                    .map(|i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    fn to_block(&self) -> Block {
        Block::Table {
            header: self.header().into_iter().map(cell_content).collect(),
            rows: self
                .body()
                .into_iter()
                .map(|row| row.into_iter().map(cell_content).collect())
                .collect(),
        }
    }
}

fn cell_content(value: String) -> Vec<Inline> {
    if value.is_empty() {
        Vec::new()
    } else {
        vec![Inline::Plain(value)]
    }
}

/// Loads the preview for a local file. Decode failures become
/// [`Preview::Error`] rather than an `Err`.
pub fn load(path: &Path) -> Preview {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let kind = DocumentKind::from_name(&name);

    match load_kind(path, &name, kind) {
        Ok(preview) => preview,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to load document preview");
            Preview::Error(err.to_string())
        }
    }
}

fn load_kind(path: &Path, name: &str, kind: DocumentKind) -> Result<Preview> {
    match kind {
        DocumentKind::Pdf => Ok(Preview::Pdf {
            name: name.to_string(),
            size: std::fs::metadata(path)?.len(),
        }),
        DocumentKind::Word => {
            let size = std::fs::metadata(path)?.len();
            let body = if name.to_lowercase().ends_with(".docx") {
                Some(docx::read_blocks(path)?)
            } else {
                None
            };
            Ok(Preview::Word {
                name: name.to_string(),
                size,
                body,
            })
        }
        DocumentKind::Spreadsheet => read_workbook(path).map(Preview::Sheets),
        DocumentKind::Text => {
            let bytes = std::fs::read(path)?;
            Ok(Preview::Text {
                content: String::from_utf8_lossy(&bytes).into_owned(),
                markup: name.to_lowercase().ends_with(".md"),
            })
        }
        DocumentKind::Csv => {
            let bytes = std::fs::read(path)?;
            Ok(Preview::Sheets(vec![Sheet {
                name: "CSV Data".to_string(),
                rows: parse_csv(&String::from_utf8_lossy(&bytes)),
            }]))
        }
        DocumentKind::Unsupported => Ok(Preview::Unsupported),
    }
}

fn read_workbook(path: &Path) -> Result<Vec<Sheet>> {
    let mut workbook = open_workbook_auto(path).map_err(|err| Error::Preview(err.to_string()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names().to_owned() {
        let rows = match workbook.worksheet_range(&name) {
            Some(Ok(range)) => range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .collect(),
            Some(Err(err)) => return Err(Error::Preview(err.to_string())),
            None => Vec::new(),
        };
        sheets.push(Sheet { name, rows });
    }
    Ok(sheets)
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::Int(val) => val.to_string(),
        DataType::Float(val) => val.to_string(),
        DataType::String(val) => val.clone(),
        DataType::Bool(val) => val.to_string(),
        DataType::DateTime(val) => val.to_string(),
        DataType::Error(error) => {
            tracing::debug!(?error, "cell error");
            String::new()
        }
        DataType::Empty => String::new(),
    }
}

/// Comma separated rows with double-quoted fields (`""` escapes a quote).
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => quoted = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

impl Preview {
    pub fn to_text(&self, palette: &Palette) -> Text<'static> {
        let muted = Style::default()
            .fg(palette.muted)
            .add_modifier(Modifier::ITALIC);
        match self {
            Preview::Pdf { name, size } => Text::from(vec![
                Line::from(Span::styled(
                    name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("PDF document, {}", size_label(*size)),
                    muted,
                )),
            ]),
            Preview::Word { name, size, body } => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!("Word document, {}", size_label(*size)),
                        muted,
                    )),
                ];
                match body {
                    Some(blocks) if !blocks.is_empty() => {
                        lines.push(Line::default());
                        lines.extend(theme::block_lines(blocks, palette));
                    }
                    Some(_) => {
                        lines.push(Line::from(Span::styled("No text in this document", muted)))
                    }
                    None => {}
                }
                Text::from(lines)
            }
            Preview::Sheets(sheets) => {
                let mut lines = Vec::new();
                for sheet in sheets {
                    lines.push(Line::from(Span::styled(
                        sheet.name.clone(),
                        Style::default()
                            .fg(palette.heading)
                            .add_modifier(Modifier::BOLD),
                    )));
                    if sheet.rows.is_empty() {
                        lines.push(Line::from(Span::styled("No data in this sheet", muted)));
                    } else {
                        lines.extend(theme::block_lines(&[sheet.to_block()], palette));
                    }
                    lines.push(Line::default());
                }
                Text::from(lines)
            }
            Preview::Text { content, markup } => {
                if *markup {
                    theme::render_text(content, palette)
                } else {
                    Text::from(content.clone())
                }
            }
            Preview::Unsupported => Text::from(Span::styled(
                "Preview not available for this file type",
                muted,
            )),
            Preview::Error(message) => Text::from(Span::styled(
                format!("Error: {}", message),
                Style::default().fg(palette.error),
            )),
        }
    }
}
