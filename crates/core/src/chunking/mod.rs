pub mod splitter;

pub use splitter::RecursiveSplitter;

use crate::models::Chunk;

/// Rebuild a document's content from its chunks, dropping the overlapped
/// prefix of each chunk.
///
/// Chunks must belong to one document and be in ordinal order. Returns `None`
/// when the chunks leave a gap or their offsets disagree with their text.
pub fn reconstruct(chunks: &[Chunk]) -> Option<String> {
    let mut out = String::new();
    let mut covered = 0usize;

    for chunk in chunks {
        if chunk.start_offset > covered
            || chunk.end_offset.checked_sub(chunk.start_offset) != Some(chunk.text.len())
        {
            return None;
        }
        if chunk.end_offset > covered {
            out.push_str(chunk.text.get(covered - chunk.start_offset..)?);
            covered = chunk.end_offset;
        }
    }

    Some(out)
}
