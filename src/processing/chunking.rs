//! Fixed-size character windows with overlap.
//!
//! The splitter ignores sentences and paragraphs. It measures text in
//! characters (Unicode scalar values), emits windows of `chunk_size` characters and starts each
//! window `chunk_size - overlap` characters after the previous one. Offsets on [`Chunk`] are
//! character offsets, so a window never cuts a multi-byte sequence in half.

use super::types::ChunkingError;

/// Overlap applied between consecutive windows.
pub const DEFAULT_OVERLAP: usize = 500;

/// A contiguous slice of a document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in document order.
    pub index: usize,
    /// Character offset of the first character (inclusive).
    pub start: usize,
    /// Character offset one past the last character (exclusive).
    pub end: usize,
    /// Chunk contents.
    pub text: String,
}

impl Chunk {
    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Reject chunk geometries that cannot make forward progress.
pub fn validate_chunking(chunk_size: usize, overlap: usize) -> Result<(), ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            overlap,
            chunk_size,
        });
    }
    Ok(())
}

/// Split `text` into overlapping windows.
///
/// - Text no longer than `chunk_size` comes back as a single chunk with no overlap.
/// - Otherwise windows start at `0, step, 2*step, ...` with `step = chunk_size - overlap` until
///   the start reaches the end of the text; the last window may be short.
///
/// Fails with [`ChunkingError`] when `chunk_size` is zero or `overlap >= chunk_size`.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<Chunk>, ChunkingError> {
    validate_chunking(chunk_size, overlap)?;

    // Byte position of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = boundaries.len() - 1;

    if total <= chunk_size {
        return Ok(vec![Chunk {
            index: 0,
            start: 0,
            end: total,
            text: text.to_string(),
        }]);
    }

    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(total.div_ceil(step));
    let mut start = 0;
    while start < total {
        let end = (start + chunk_size).min(total);
        chunks.push(Chunk {
            index: chunks.len(),
            start,
            end,
            text: text[boundaries[start]..boundaries[end]].to_string(),
        });
        start += step;
    }

    tracing::trace!(
        chars = total,
        chunk_size,
        overlap,
        chunks = chunks.len(),
        "Split document into chunks"
    );
    Ok(chunks)
}

/// Truncate `text` to at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}
