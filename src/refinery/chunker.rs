// * Heading-Aware Chunker
// * Splits cleaned markdown at level 1-3 headings, then packs oversized sections
// * paragraph by paragraph under a token budget, carrying a character-sliced overlap.
// * Token counts are a fixed chars/4 approximation, not a tokenizer.

use crate::config::constants::{
    CHARS_PER_TOKEN, CHUNK_MAX_TOKENS, CHUNK_OVERLAP_TOKENS, CHUNK_TARGET_TOKENS,
};
use serde::{Deserialize, Serialize};

/// A heading-tagged slice of cleaned markdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub source_url: String,
    pub page_title: String,
    /// Nearest enclosing heading, or the page title before the first heading
    pub section_heading: String,
    pub token_estimate: usize,
    /// Position of the chunk within its page
    pub chunk_index: usize,
}

/// Token budgets for the chunker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Packing target for split sections
    pub target_tokens: usize,
    /// Sections at or under this size are emitted whole
    pub max_tokens: usize,
    /// Tokens of trailing context carried into the next chunk
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_tokens: CHUNK_TARGET_TOKENS,
            max_tokens: CHUNK_MAX_TOKENS,
            overlap_tokens: CHUNK_OVERLAP_TOKENS,
        }
    }
}

impl ChunkerConfig {
    pub fn new(target_tokens: usize, max_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            target_tokens,
            max_tokens,
            overlap_tokens,
        }
    }

    fn overlap_chars(&self) -> usize {
        self.overlap_tokens * CHARS_PER_TOKEN
    }
}

/// Crude token estimate: character count divided by four
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Heading line of level 1-3: one to three '#' followed by whitespace
fn is_section_heading(line: &str) -> bool {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    (1..=3).contains(&hashes)
        && line[hashes..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace)
}

/// Splits before every level 1-3 heading line. Text ahead of the first heading
/// becomes its own leading section.
fn split_sections(markdown: &str) -> Vec<&str> {
    let mut boundaries = Vec::new();
    let mut offset = 0;

    for line in markdown.split_inclusive('\n') {
        if offset > 0 && is_section_heading(line) {
            boundaries.push(offset);
        }
        offset += line.len();
    }

    let mut sections = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for end in boundaries {
        sections.push(&markdown[start..end]);
        start = end;
    }
    sections.push(&markdown[start..]);
    sections
}

/// Heading text of a section's first line, when that line is a heading
fn section_heading(section: &str) -> Option<&str> {
    let first_line = section.split('\n').next().unwrap_or_default();
    if !is_section_heading(first_line) {
        return None;
    }
    let text = first_line.trim_start_matches('#').trim();
    (!text.is_empty()).then_some(text)
}

/// Last `n` characters of `text`, respecting char boundaries
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// Greedy paragraph packer for sections over the max budget
pub struct HeadingChunker {
    config: ChunkerConfig,
}

impl HeadingChunker {
    pub fn new() -> Self {
        Self::with_config(ChunkerConfig::default())
    }

    pub fn with_config(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunks cleaned markdown in document order
    pub fn chunk(&self, markdown: &str, source_url: &str, page_title: &str) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut current_heading = page_title.to_string();

        let emit = |chunks: &mut Vec<Chunk>, text: &str, heading: &str| {
            let text = text.trim();
            if text.is_empty() {
                return;
            }
            let chunk_index = chunks.len();
            chunks.push(Chunk {
                text: text.to_string(),
                source_url: source_url.to_string(),
                page_title: page_title.to_string(),
                section_heading: heading.to_string(),
                token_estimate: estimate_tokens(text),
                chunk_index,
            });
        };

        for section in split_sections(markdown) {
            if section.trim().is_empty() {
                continue;
            }

            if let Some(heading) = section_heading(section) {
                current_heading = heading.to_string();
            }

            if estimate_tokens(section) <= self.config.max_tokens {
                emit(&mut chunks, section, &current_heading);
                continue;
            }

            for piece in self.pack_paragraphs(section) {
                emit(&mut chunks, &piece, &current_heading);
            }
        }

        chunks
    }

    /// Packs a section's paragraphs into buffers of roughly `target_tokens`.
    /// Each buffer after the first is seeded with the tail of its predecessor.
    fn pack_paragraphs(&self, section: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut buffer = String::new();
        let mut buffer_tokens = 0;

        for para in section.split("\n\n") {
            let para_tokens = estimate_tokens(para);

            if buffer_tokens + para_tokens > self.config.target_tokens && !buffer.trim().is_empty()
            {
                let carried = tail_chars(&buffer, self.config.overlap_chars()).to_string();
                pieces.push(std::mem::take(&mut buffer));

                buffer.push_str(&carried);
                buffer.push_str("\n\n");
                buffer.push_str(para);
                buffer_tokens = estimate_tokens(&buffer);
            } else {
                buffer.push_str("\n\n");
                buffer.push_str(para);
                buffer_tokens += para_tokens;
            }
        }

        if !buffer.trim().is_empty() {
            pieces.push(buffer);
        }

        pieces
    }
}

impl Default for HeadingChunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Chunks with the default 900/1200/100 budgets
pub fn chunk_markdown(markdown: &str, source_url: &str, page_title: &str) -> Vec<Chunk> {
    HeadingChunker::new().chunk(markdown, source_url, page_title)
}
