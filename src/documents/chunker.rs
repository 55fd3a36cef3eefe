//! Document chunking strategies.
//!
//! Provides the `Chunker` trait and implementations for splitting documents
//! into chunks suitable for embedding.

use super::config::{ChunkingConfig, ChunkingStrategy};

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Split document content into trimmed, non-empty chunks.
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<String>;
}

/// Get the chunker for a strategy.
pub fn chunker_for(strategy: ChunkingStrategy) -> Box<dyn Chunker> {
    match strategy {
        ChunkingStrategy::Window => Box::new(WindowChunker),
        ChunkingStrategy::Sections => Box::new(SectionChunker),
    }
}

/// Fixed-size sliding window over the characters of the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowChunker;

impl Chunker for WindowChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<String> {
        sliding_window(content, config.chunk_size, config.overlap)
    }
}

/// Section-aware chunker for markdown-ish content.
///
/// Algorithm:
/// 1. Split at `##` / `###` headings so a section stays together
/// 2. Sections within the size limit become one chunk
/// 3. Larger sections are packed paragraph by paragraph up to the limit
/// 4. A single paragraph over the limit falls back to the sliding window
#[derive(Debug, Default, Clone, Copy)]
pub struct SectionChunker;

impl Chunker for SectionChunker {
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Vec<String> {
        let max_chars = config.chunk_size.max(1);
        let mut chunks = Vec::new();

        for section in split_sections(content) {
            if char_len(&section) <= max_chars {
                chunks.push(section);
            } else {
                pack_paragraphs(&section, max_chars, config.overlap, &mut chunks);
            }
        }

        chunks
    }
}

/// Split text with a sliding window of `size` characters.
///
/// Consecutive windows share `overlap` characters (clamped to `size - 1`) and
/// every step advances by at least one character. Windows are trimmed and
/// empty ones dropped.
pub fn sliding_window(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);
    let overlap = overlap.min(size - 1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let piece = window.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= chars.len() {
            break;
        }
        start = (end - overlap).max(start + 1);
    }

    chunks
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// `## Title` or `### Title`; deeper and shallower headings do not start a section.
fn is_section_heading(line: &str) -> bool {
    let rest = line
        .strip_prefix("###")
        .or_else(|| line.strip_prefix("##"));
    matches!(rest.and_then(|r| r.chars().next()), Some(c) if c.is_whitespace())
}

/// Split content into trimmed, non-empty sections at section headings.
fn split_sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if is_section_heading(line) {
            flush_section(&mut current, &mut sections);
        }
        current.push(line);
    }
    flush_section(&mut current, &mut sections);

    sections
}

fn flush_section(current: &mut Vec<&str>, sections: &mut Vec<String>) {
    let section = current.join("\n");
    let section = section.trim();
    if !section.is_empty() {
        sections.push(section.to_string());
    }
    current.clear();
}

/// Pack blank-line separated paragraphs into chunks of at most `max_chars`.
fn pack_paragraphs(section: &str, max_chars: usize, overlap: usize, out: &mut Vec<String>) {
    let mut buf = String::new();

    for paragraph in section.split("\n\n") {
        let block = paragraph.trim();
        if block.is_empty() {
            continue;
        }

        let candidate_len = if buf.is_empty() {
            char_len(block)
        } else {
            char_len(&buf) + 2 + char_len(block)
        };

        if candidate_len <= max_chars {
            if !buf.is_empty() {
                buf.push_str("\n\n");
            }
            buf.push_str(block);
            continue;
        }

        flush_buffer(&mut buf, out);

        if char_len(block) <= max_chars {
            buf.push_str(block);
        } else {
            out.extend(sliding_window(block, max_chars, overlap));
        }
    }

    flush_buffer(&mut buf, out);
}

fn flush_buffer(buf: &mut String, out: &mut Vec<String>) {
    let text = buf.trim();
    if !text.is_empty() {
        out.push(text.to_string());
    }
    buf.clear();
}
