use crate::models::*;
use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

const CHUNK_SIZE: usize = 500; // characters
const CHUNK_OVERLAP: usize = 50; // characters shared between neighbouring chunks

pub struct DocumentProcessor;

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Loads every input file as `kind`. A file whose extension does not match
    /// the requested kind is rejected before anything is read.
    pub async fn process_files(&self, kind: DocumentKind, input_files: &[PathBuf]) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(input_files.len());

        for file_path in input_files {
            if DocumentKind::from_path(file_path) != Some(kind) {
                bail!("{} is not a {} file", file_path.display(), kind);
            }
            let doc = self.process_file(kind, file_path).await?;
            documents.push(doc);
        }

        log::info!("Processed {} documents", documents.len());
        Ok(documents)
    }

    async fn process_file(&self, kind: DocumentKind, file_path: &Path) -> Result<Document> {
        let filename = file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.display().to_string());

        log::info!("Processing {}: {}", kind, filename);

        // pdf-extract is synchronous and may panic on hostile input, so it runs
        // on the blocking pool where a panic surfaces as a JoinError.
        let path = file_path.to_path_buf();
        let content = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => extract_pdf_text(&path),
            DocumentKind::Docx => extract_docx_text(&path),
        })
        .await
        .map_err(|e| anyhow!("Text extraction for {} aborted: {}", filename, e))??;

        if content.trim().is_empty() {
            bail!("No extractable text found in {}", filename);
        }

        let chunks = self.create_chunks(&content);

        Ok(Document {
            id: Uuid::new_v4().to_string(),
            filename,
            kind,
            content,
            chunks,
        })
    }

    pub fn create_chunks(&self, content: &str) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();

        let cleaned_content = clean_text(content);
        let sentences = split_into_sentences(&cleaned_content);

        let mut current_chunk = String::new();
        let mut start_pos = 0;

        for sentence in sentences {
            if current_chunk.chars().count() + sentence.chars().count() > CHUNK_SIZE && !current_chunk.is_empty() {
                chunks.push(new_chunk(&current_chunk, start_pos));

                let chunk_len = current_chunk.chars().count();
                let overlap_text = if chunk_len > CHUNK_OVERLAP {
                    current_chunk.chars().skip(chunk_len - CHUNK_OVERLAP).collect::<String>()
                } else {
                    current_chunk.clone()
                };

                start_pos = start_pos + chunk_len - overlap_text.chars().count();
                current_chunk = overlap_text + " " + &sentence;
            } else {
                if !current_chunk.is_empty() {
                    current_chunk.push(' ');
                }
                current_chunk.push_str(&sentence);
            }
        }

        if !current_chunk.trim().is_empty() {
            chunks.push(new_chunk(&current_chunk, start_pos));
        }

        log::info!("Created {} chunks", chunks.len());
        chunks
    }
}

fn new_chunk(text: &str, start_pos: usize) -> DocumentChunk {
    DocumentChunk {
        id: Uuid::new_v4().to_string(),
        content: text.trim().to_string(),
        start_position: start_pos,
        end_position: start_pos + text.chars().count(),
        embedding: None,
    }
}

fn extract_pdf_text(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path).with_context(|| format!("Failed to read PDF {}", path.display()))
}

fn extract_docx_text(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .with_context(|| format!("{} is not a valid DOCX container", path.display()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .with_context(|| format!("{} has no word/document.xml part", path.display()))?
        .read_to_string(&mut xml)?;

    docx_xml_to_text(&xml)
}

/// Flattens WordprocessingML into plain text, one line per paragraph.
///
/// Paragraphs nested in text boxes end their own line; text of the outer
/// paragraph after the box continues on the next one.
pub(crate) fn docx_xml_to_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event().context("Malformed word/document.xml")? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => lines.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push(' '),
                _ => {}
            },
            Event::Text(text) if in_text_run => {
                current.push_str(&text.unescape().context("Bad entity in word/document.xml")?);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    lines.push(current);

    Ok(lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn clean_text(text: &str) -> String {
    static SPECIAL: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let re_special = SPECIAL.get_or_init(|| Regex::new(r"[^\w\s.,!?;:()&'/%@\-\[\]{}]").expect("special regex"));
    let re_whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));

    let cleaned = re_special.replace_all(text, " ");
    let cleaned = re_whitespace.replace_all(&cleaned, " ");

    cleaned.trim().to_string()
}

fn split_into_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
