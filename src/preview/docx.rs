//! Body text of `.docx` files.
//!
//! Walks `word/document.xml` in document order. Top-level paragraphs become
//! paragraph blocks (empty ones become line breaks) and tables become table
//! blocks whose first row is the header. Formatting is dropped.

use super::cell_content;
use crate::error::{Error, Result};
use crate::markup::{Block, Inline};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use std::io::Read;
use std::path::Path;

const DOCUMENT_XML: &str = "word/document.xml";

pub(super) fn read_blocks(path: &Path) -> Result<Vec<Block>> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(preview_error)?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_XML)
        .map_err(preview_error)?
        .read_to_string(&mut xml)?;
    parse_document(&xml)
}

fn preview_error(err: impl std::fmt::Display) -> Error {
    Error::Preview(err.to_string())
}

fn parse_document(xml: &str) -> Result<Vec<Block>> {
    let mut reader = Reader::from_str(xml);
    let mut body = Body::default();

    loop {
        match reader.read_event().map_err(preview_error)? {
            Event::Start(e) => body.open(e.local_name().as_ref()),
            Event::Empty(e) => body.empty(e.local_name().as_ref()),
            Event::End(e) => body.close(e.local_name().as_ref()),
            Event::Text(text) if body.in_text => {
                body.push_text(&text.decode().map_err(preview_error)?);
            }
            Event::GeneralRef(entity) if body.in_text => {
                if let Some(c) = entity.resolve_char_ref().map_err(preview_error)? {
                    body.push_text(c.encode_utf8(&mut [0; 4]));
                } else {
                    let name = entity.decode().map_err(preview_error)?;
                    match resolve_predefined_entity(&name) {
                        Some(value) => body.push_text(value),
                        None => tracing::debug!(%name, "unknown entity in docx"),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(body.blocks)
}

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct Body {
    blocks: Vec<Block>,
    paragraph: Option<String>,
    tables: Vec<Table>,
    in_text: bool,
}

impl Body {
    fn open(&mut self, name: &[u8]) {
        match name {
            b"p" => self.paragraph = Some(String::new()),
            b"t" => self.in_text = true,
            b"tbl" => self.tables.push(Table::default()),
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    table.rows.push(Vec::new());
                }
            }
            b"tc" => {
                if let Some(row) = self.tables.last_mut().and_then(|t| t.rows.last_mut()) {
                    row.push(String::new());
                }
            }
            _ => {}
        }
    }

    fn empty(&mut self, name: &[u8]) {
        match name {
            b"p" | b"tc" => {
                self.open(name);
                self.close(name);
            }
            b"tab" | b"br" | b"cr" => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.push(' ');
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"t" => self.in_text = false,
            b"p" => {
                if let Some(text) = self.paragraph.take() {
                    self.finish_paragraph(text);
                }
            }
            b"tbl" => {
                if let Some(table) = self.tables.pop() {
                    self.finish_table(table);
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push_str(text);
        }
    }

    fn current_cell(&mut self) -> Option<&mut String> {
        self.tables.last_mut()?.rows.last_mut()?.last_mut()
    }

    fn finish_paragraph(&mut self, text: String) {
        if let Some(cell) = self.current_cell() {
            append_words(cell, &text);
        } else if text.trim().is_empty() {
            self.blocks.push(Block::LineBreak);
        } else {
            self.blocks.push(Block::Paragraph(vec![Inline::Plain(text)]));
        }
    }

    fn finish_table(&mut self, table: Table) {
        // Nested tables collapse into the enclosing cell.
        if let Some(cell) = self.current_cell() {
            for text in table.rows.iter().flatten() {
                append_words(cell, text);
            }
            return;
        }

        let mut rows = table
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(cell_content).collect::<Vec<_>>());
        if let Some(header) = rows.next() {
            self.blocks.push(Block::Table {
                header,
                rows: rows.collect(),
            });
        }
    }
}

fn append_words(cell: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !cell.is_empty() {
        cell.push(' ');
    }
    cell.push_str(text);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Vec<Inline> {
        vec![Inline::Plain(text.to_string())]
    }

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
    }

    #[test]
    fn paragraphs_keep_order_and_entities() {
        let xml = document(
            r#"<w:p><w:r><w:t>Quarterly </w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">report &amp; notes</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>End</w:t><w:tab/><w:t>note</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            parse_document(&xml).unwrap(),
            vec![
                Block::Paragraph(plain("Quarterly report & notes")),
                Block::LineBreak,
                Block::Paragraph(plain("End note")),
            ]
        );
    }

    #[test]
    fn tables_use_first_row_as_header() {
        let xml = document(
            r#"<w:tbl>
                <w:tr><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Score</w:t></w:r></w:p></w:tc></w:tr>
                <w:tr><w:tc><w:p><w:r><w:t>Ann</w:t></w:r></w:p><w:p><w:r><w:t>Lee</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr>
            </w:tbl>"#,
        );
        assert_eq!(
            parse_document(&xml).unwrap(),
            vec![Block::Table {
                header: vec![plain("Name"), plain("Score")],
                rows: vec![vec![plain("Ann Lee"), vec![]]],
            }]
        );
    }

    #[test]
    fn nested_table_text_joins_outer_cell() {
        let xml = document(
            r#"<w:tbl><w:tr><w:tc>
                <w:p><w:r><w:t>outer</w:t></w:r></w:p>
                <w:tbl><w:tr><w:tc><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
            </w:tc></w:tr></w:tbl>"#,
        );
        assert_eq!(
            parse_document(&xml).unwrap(),
            vec![Block::Table {
                header: vec![plain("outer inner")],
                rows: vec![],
            }]
        );
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let xml = document("<w:p><w:r><w:t>open</w:r></w:p>");
        assert!(matches!(parse_document(&xml), Err(Error::Preview(_))));
    }
}
