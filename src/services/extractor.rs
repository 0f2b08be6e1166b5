//! Raw text extraction per document format.

use std::panic::{AssertUnwindSafe, catch_unwind};

use pulldown_cmark::{Event, Parser, TagEnd};

use crate::error::ExtractError;
use crate::models::{DocumentFormat, SourceFile};

/// Turns the bytes of a source file into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, file: &SourceFile) -> Result<String, ExtractError>;
}

/// Dispatches on [`DocumentFormat`] to the matching parser library.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatExtractor;

impl TextExtractor for FormatExtractor {
    fn extract(&self, file: &SourceFile) -> Result<String, ExtractError> {
        match file.format {
            DocumentFormat::Pdf => extract_pdf(&file.bytes),
            DocumentFormat::Docx => extract_docx(&file.bytes),
            DocumentFormat::Markdown => Ok(extract_markdown(&String::from_utf8_lossy(
                &file.bytes,
            ))),
            DocumentFormat::PlainText => Ok(String::from_utf8_lossy(&file.bytes).into_owned()),
        }
    }
}

fn extract_pdf(data: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed fonts and streams
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data))) {
        Ok(Ok(text)) => Ok(text.replace('\0', "")),
        Ok(Err(e)) => Err(ExtractError::Pdf(e.to_string())),
        Err(_) => Err(ExtractError::Pdf("parser panicked".to_string())),
    }
}

/// Paragraph text, one paragraph per line. Tables are not read.
fn extract_docx(data: &[u8]) -> Result<String, ExtractError> {
    let doc = docx_rs::read_docx(data).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut text = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }

    Ok(text)
}

/// Rendered text of a Markdown document with markup and raw HTML removed.
pub fn extract_markdown(source: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(source) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(end) if ends_block(&end) => text.push('\n'),
            Event::End(TagEnd::TableCell) => text.push(' '),
            _ => {}
        }
    }

    text
}

fn ends_block(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::Item
            | TagEnd::CodeBlock
            | TagEnd::TableRow
            | TagEnd::TableHead
    )
}
