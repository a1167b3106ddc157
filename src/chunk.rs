//! Fixed-size overlapping text windowing.
//!
//! Splits extracted document text into windows of `size` characters that
//! overlap their successor by `overlap` characters. Windowing is measured in
//! characters (not bytes), so multi-byte UTF-8 text never splits mid-scalar.
//!
//! Degenerate parameters (`overlap >= size`, `size == 0`) would make the
//! cursor advance non-positive and the loop non-terminating, so they are a
//! hard configuration error rather than a silent clamp.

use crate::error::PipelineError;

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default overlap between consecutive windows, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Split `text` into overlapping windows of `size` characters.
///
/// Returns `[text]` unchanged when the text fits in a single window.
/// Otherwise every window except possibly the last has exactly `size`
/// characters, and consecutive windows overlap by exactly `overlap`
/// characters. Concatenating the windows while dropping the first `overlap`
/// characters of every window after the first reconstructs `text`.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>, PipelineError> {
    if size == 0 || overlap >= size {
        return Err(PipelineError::InvalidChunkParameters { size, overlap });
    }

    // Byte offset of every char boundary, with the end as a sentinel, so
    // windows measured in chars can slice the source directly.
    let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    bounds.push(text.len());
    let char_count = bounds.len() - 1;

    if char_count <= size {
        return Ok(vec![text.to_string()]);
    }

    let step = size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + size).min(char_count);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        start += step;
    }

    Ok(chunks)
}
